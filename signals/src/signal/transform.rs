use std::marker::PhantomData;
use std::sync::Arc;

use crate::{
    observer::Observer,
    subscription::Subscription,
    traits::{Observable, Signal},
};

/// Maps every update through a function before it reaches the wrapped signal.
///
/// The function runs before the wrapped cell's equality check, so the cell compares and stores
/// transformed values. Reads and subscriptions pass straight through.
pub struct Transform<Inner, F, X> {
    inner: Inner,
    transform: F,
    _phantom: PhantomData<fn(X)>,
}

impl<Inner, F, X> Transform<Inner, F, X>
where Inner: Signal<X>
{
    pub fn new(inner: Inner, transform: F) -> Self { Self { inner, transform, _phantom: PhantomData } }

    pub fn inner(&self) -> &Inner { &self.inner }
}

impl<Inner, F, X> Clone for Transform<Inner, F, X>
where
    Inner: Clone,
    F: Clone,
{
    fn clone(&self) -> Self { Self { inner: self.inner.clone(), transform: self.transform.clone(), _phantom: PhantomData } }
}

impl<Inner, F, X> Observable for Transform<Inner, F, X>
where
    Inner: Observable,
    F: Send + Sync,
{
    type Value = Inner::Value;

    fn read(&self) -> Arc<Self::Value> { self.inner.read() }

    fn subscribe(&self, observer: Observer<Arc<Self::Value>>) -> Subscription { self.inner.subscribe(observer) }
}

impl<I, Inner, F, X> Signal<I> for Transform<Inner, F, X>
where
    Inner: Signal<X>,
    F: Fn(I) -> X + Send + Sync,
{
    fn update(&self, input: I) { self.inner.update((self.transform)(input)) }
}
