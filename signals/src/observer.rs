use std::future::Future;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use futures::FutureExt;
use futures::future::BoxFuture;

use crate::error::ObserverFailure;

type Callback<T> = dyn Fn(T) -> Invocation + Send + Sync + 'static;

/// The result of handing one value to an observer.
pub enum Invocation {
    /// The observer finished synchronously
    Done(Result<(), ObserverFailure>),
    /// The observer started asynchronous work which completes with this future
    Pending(BoxFuture<'static, Result<(), ObserverFailure>>),
}

/// A shareable callback that receives dispatched values.
///
/// Observers compare by identity: clones of one observer are the same observer, two observers built
/// from identical closures are not. Unsubscribing removes every channel entry for the observer.
pub struct Observer<T>(Arc<Callback<T>>);

impl<T> Clone for Observer<T> {
    fn clone(&self) -> Self { Self(self.0.clone()) }
}

impl<T> std::fmt::Debug for Observer<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { write!(f, "Observer({:p})", Arc::as_ptr(&self.0)) }
}

impl<T: 'static> Observer<T> {
    /// An observer that cannot fail
    pub fn new<F>(f: F) -> Self
    where F: Fn(T) + Send + Sync + 'static {
        Self(Arc::new(move |value| {
            f(value);
            Invocation::Done(Ok(()))
        }))
    }

    /// An observer whose errors are reported to the channel's diagnostic sink
    pub fn fallible<F>(f: F) -> Self
    where F: Fn(T) -> anyhow::Result<()> + Send + Sync + 'static {
        Self(Arc::new(move |value| Invocation::Done(f(value).map_err(ObserverFailure::Rejected))))
    }

    /// An observer doing asynchronous work.
    ///
    /// `f` itself runs synchronously when the value is delivered; the future it returns is awaited
    /// by a serialized channel and spawned by an immediate one.
    pub fn future<F, Fut>(f: F) -> Self
    where
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        Self(Arc::new(move |value| Invocation::Pending(f(value).map(Ok).boxed())))
    }

    /// Like [`Observer::future`], with errors reported to the channel's diagnostic sink
    pub fn try_future<F, Fut>(f: F) -> Self
    where
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        Self(Arc::new(move |value| Invocation::Pending(f(value).map(|r| r.map_err(ObserverFailure::Rejected)).boxed())))
    }

    /// Hand `value` to the observer. Panics in the synchronous part are caught and returned as failures.
    pub(crate) fn invoke(&self, value: T) -> Invocation {
        match catch_unwind(AssertUnwindSafe(|| (self.0)(value))) {
            Ok(Invocation::Pending(future)) => Invocation::Pending(
                AssertUnwindSafe(future)
                    .catch_unwind()
                    .map(|outcome| match outcome {
                        Ok(result) => result,
                        Err(payload) => Err(ObserverFailure::from_panic(payload)),
                    })
                    .boxed(),
            ),
            Ok(done) => done,
            Err(payload) => Invocation::Done(Err(ObserverFailure::from_panic(payload))),
        }
    }
}

impl<T> Observer<T> {
    /// Whether both handles refer to the same observer
    pub fn ptr_eq(&self, other: &Observer<T>) -> bool { Arc::ptr_eq(&self.0, &other.0) }
}

impl<T> PartialEq for Observer<T> {
    fn eq(&self, other: &Self) -> bool { self.ptr_eq(other) }
}

impl<T> Eq for Observer<T> {}

/// Trait for types that can be converted into observers
pub trait IntoObserver<T> {
    fn into_observer(self) -> Observer<T>;
}

impl<T> IntoObserver<T> for Observer<T> {
    fn into_observer(self) -> Observer<T> { self }
}

impl<T> IntoObserver<T> for &Observer<T> {
    fn into_observer(self) -> Observer<T> { self.clone() }
}

impl<F, T> IntoObserver<T> for F
where
    F: Fn(T) + Send + Sync + 'static,
    T: 'static,
{
    fn into_observer(self) -> Observer<T> { Observer::new(self) }
}

impl<T: Send + 'static> IntoObserver<T> for std::sync::mpsc::Sender<T> {
    fn into_observer(self) -> Observer<T> {
        Observer::new(move |value| {
            let _ = self.send(value); // Ignore send errors
        })
    }
}

impl<T: Send + 'static> IntoObserver<T> for tokio::sync::mpsc::UnboundedSender<T> {
    fn into_observer(self) -> Observer<T> {
        Observer::new(move |value| {
            let _ = self.send(value); // Ignore send errors
        })
    }
}
