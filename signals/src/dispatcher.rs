use std::sync::{Arc, Mutex};

use futures::future::BoxFuture;
use tokio::runtime::Handle;
use tracing::trace;

use crate::{
    diagnostics::DiagnosticSink,
    error::ObserverFailure,
    observer::{Invocation, Observer},
    task,
};

/// How a channel hands values to its observers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Delivery {
    /// Call each observer as soon as a value is dispatched
    #[default]
    Immediate,
    /// Never run two invocations of one observer at the same time. Values dispatched while the
    /// observer is busy are coalesced and only the latest is delivered once it finishes.
    Serialized,
}

impl Delivery {
    pub(crate) fn dispatcher<T>(self, observer: Observer<T>, context: DispatchContext) -> Arc<dyn Dispatcher<T>>
    where T: Send + 'static {
        match self {
            Delivery::Immediate => Arc::new(Immediate { observer, context }),
            Delivery::Serialized => {
                Arc::new(Serialized(Arc::new(SerializedInner { observer, context, mailbox: Mutex::new(Mailbox::default()) })))
            }
        }
    }
}

/// Per-observer delivery strategy
pub(crate) trait Dispatcher<T>: Send + Sync {
    fn dispatch(&self, value: T);

    /// Whether this dispatcher delivers to `observer`
    fn observes(&self, observer: &Observer<T>) -> bool;
}

/// Where dispatchers send failures and spawn asynchronous observer work
#[derive(Clone)]
pub(crate) struct DispatchContext {
    pub(crate) sink: Arc<dyn DiagnosticSink>,
    pub(crate) runtime: Option<Handle>,
}

impl DispatchContext {
    fn report(&self, result: Result<(), ObserverFailure>) {
        if let Err(failure) = result {
            self.sink.observer_failed(&failure);
        }
    }

    /// Run an observer's future to completion without waiting for it
    fn detach(&self, future: BoxFuture<'static, Result<(), ObserverFailure>>) {
        match &self.runtime {
            Some(runtime) => {
                let sink = self.sink.clone();
                task::spawn(runtime, async move {
                    if let Err(failure) = future.await {
                        sink.observer_failed(&failure);
                    }
                });
            }
            None => self.report(Err(ObserverFailure::NoRuntime)),
        }
    }
}

struct Immediate<T> {
    observer: Observer<T>,
    context: DispatchContext,
}

impl<T: Send + 'static> Dispatcher<T> for Immediate<T> {
    fn dispatch(&self, value: T) {
        match self.observer.invoke(value) {
            Invocation::Done(result) => self.context.report(result),
            Invocation::Pending(future) => self.context.detach(future),
        }
    }

    fn observes(&self, observer: &Observer<T>) -> bool { self.observer.ptr_eq(observer) }
}

struct Serialized<T>(Arc<SerializedInner<T>>);

struct SerializedInner<T> {
    observer: Observer<T>,
    context: DispatchContext,
    mailbox: Mutex<Mailbox<T>>,
}

/// Single-slot mailbox. Idle: `!active`. Running: `active` with no pending value.
/// RunningWithPending: `active` with a pending value.
struct Mailbox<T> {
    pending: Option<T>,
    active: bool,
}

impl<T> Default for Mailbox<T> {
    fn default() -> Self { Self { pending: None, active: false } }
}

impl<T: Send + 'static> Dispatcher<T> for Serialized<T> {
    fn dispatch(&self, value: T) {
        {
            let mut mailbox = self.0.mailbox.lock().expect("mailbox lock poisoned");
            mailbox.pending = Some(value);
            if mailbox.active {
                return;
            }
            mailbox.active = true;
        }
        trace!("starting serialized delivery loop");
        self.0.clone().run();
    }

    fn observes(&self, observer: &Observer<T>) -> bool { self.0.observer.ptr_eq(observer) }
}

impl<T: Send + 'static> SerializedInner<T> {
    /// Take the pending value, or go idle if there is none
    fn next(&self) -> Option<T> {
        let mut mailbox = self.mailbox.lock().expect("mailbox lock poisoned");
        let next = mailbox.pending.take();
        if next.is_none() {
            mailbox.active = false;
        }
        next
    }

    /// Deliver synchronously until an invocation suspends, then continue on a task
    fn run(self: Arc<Self>) {
        while let Some(value) = self.next() {
            match self.observer.invoke(value) {
                Invocation::Done(result) => self.context.report(result),
                Invocation::Pending(future) => match self.context.runtime.clone() {
                    Some(runtime) => {
                        // created outside the task so it is dropped even if the task never runs
                        let idle = IdleOnDrop(Some(self.clone()));
                        task::spawn(&runtime, async move {
                            let result = future.await;
                            self.context.report(result);
                            self.drain().await;
                            idle.disarm();
                        });
                        return;
                    }
                    None => self.context.report(Err(ObserverFailure::NoRuntime)),
                },
            }
        }
    }

    async fn drain(self: Arc<Self>) {
        while let Some(value) = self.next() {
            let result = match self.observer.invoke(value) {
                Invocation::Done(result) => result,
                Invocation::Pending(future) => future.await,
            };
            self.context.report(result);
        }
    }
}

/// Returns the mailbox to idle when a delivery task is dropped before finishing, as happens to
/// tasks spawned on or still running in a runtime that has shut down
struct IdleOnDrop<T>(Option<Arc<SerializedInner<T>>>);

impl<T> IdleOnDrop<T> {
    fn disarm(mut self) { self.0 = None; }
}

impl<T> Drop for IdleOnDrop<T> {
    fn drop(&mut self) {
        if let Some(inner) = self.0.take() {
            if let Ok(mut mailbox) = inner.mailbox.lock() {
                mailbox.active = false;
            }
            inner.context.report(Err(ObserverFailure::NoRuntime));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn context(failures: Arc<AtomicUsize>) -> DispatchContext {
        DispatchContext {
            sink: Arc::new(move |_: &ObserverFailure| {
                failures.fetch_add(1, Ordering::SeqCst);
            }),
            runtime: Handle::try_current().ok(),
        }
    }

    #[test]
    fn test_immediate_isolates_failure() {
        let failures = Arc::new(AtomicUsize::new(0));
        let dispatcher = Delivery::Immediate.dispatcher(Observer::fallible(|_: ()| anyhow::bail!("banana")), context(failures.clone()));
        dispatcher.dispatch(());
        dispatcher.dispatch(());
        assert_eq!(failures.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_immediate_future_without_runtime_is_reported() {
        let failures = Arc::new(AtomicUsize::new(0));
        let dispatcher = Delivery::Immediate.dispatcher(Observer::future(|_: ()| async {}), context(failures.clone()));
        dispatcher.dispatch(());
        assert_eq!(failures.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_observes_by_identity() {
        let observer = Observer::new(|_: u8| {});
        let other = Observer::new(|_: u8| {});
        let dispatcher = Delivery::Serialized.dispatcher(observer.clone(), context(Arc::new(AtomicUsize::new(0))));
        assert!(dispatcher.observes(&observer));
        assert!(!dispatcher.observes(&other));
    }

    #[test]
    fn test_serialized_sync_observer_runs_inline() {
        let received = Arc::new(Mutex::new(Vec::new()));
        let observer = {
            let received = received.clone();
            Observer::new(move |value: u32| received.lock().unwrap().push(value))
        };
        let dispatcher = Delivery::Serialized.dispatcher(observer, context(Arc::new(AtomicUsize::new(0))));
        dispatcher.dispatch(1);
        dispatcher.dispatch(2);
        assert_eq!(*received.lock().unwrap(), vec![1, 2]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_serialized_coalesces_while_busy() {
        let received = Arc::new(Mutex::new(Vec::new()));
        let observer = {
            let received = received.clone();
            Observer::future(move |value: u32| {
                let received = received.clone();
                async move {
                    tokio::time::sleep(Duration::from_millis(100)).await;
                    received.lock().unwrap().push(value);
                }
            })
        };
        let dispatcher = Delivery::Serialized.dispatcher(observer, context(Arc::new(AtomicUsize::new(0))));
        dispatcher.dispatch(1);
        dispatcher.dispatch(2);
        dispatcher.dispatch(3);

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(*received.lock().unwrap(), vec![1]);

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(*received.lock().unwrap(), vec![1, 3]);
    }

    #[test]
    fn test_serialized_recovers_from_a_shut_down_runtime() {
        let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
        let handle = runtime.handle().clone();
        drop(runtime);

        let failures = Arc::new(AtomicUsize::new(0));
        let invoked = Arc::new(AtomicUsize::new(0));
        let observer = {
            let invoked = invoked.clone();
            Observer::future(move |_: u32| {
                invoked.fetch_add(1, Ordering::SeqCst);
                async {}
            })
        };
        let sink = {
            let failures = failures.clone();
            Arc::new(move |_: &ObserverFailure| {
                failures.fetch_add(1, Ordering::SeqCst);
            })
        };
        let dispatcher = Delivery::Serialized.dispatcher(observer, DispatchContext { sink, runtime: Some(handle) });

        dispatcher.dispatch(1);
        dispatcher.dispatch(2);
        assert_eq!(invoked.load(Ordering::SeqCst), 2);
        assert_eq!(failures.load(Ordering::SeqCst), 2);
    }
}
