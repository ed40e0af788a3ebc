use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crate::{
    observer::Observer,
    subscription::Subscription,
    traits::{Observable, Signal},
};

/// Links a signal to one upstream signal.
///
/// The link is lazy: nothing subscribes to the upstream until the first [`Observable::subscribe`],
/// which also pulls the upstream's current value before the new observer is added. From then on
/// every upstream change is routed into the wrapped signal. Until then each
/// [`Observable::read`] pulls the upstream's current value first, so reads are never stale.
///
/// A linked signal has a single writer, its upstream: [`Signal::update`] discards the written value
/// and resynchronizes from the upstream instead.
pub struct Input<Inner, U> {
    inner: Arc<Inner>,
    upstream: Arc<dyn Observable<Value = U>>,
    activated: AtomicBool,
    subscription: Mutex<Option<Subscription>>,
}

impl<Inner, U> Input<Inner, U>
where
    Inner: Signal<U> + 'static,
    U: Clone + Send + Sync + 'static,
{
    pub fn new<Up>(inner: Inner, upstream: Up) -> Self
    where Up: Observable<Value = U> + 'static {
        Self { inner: Arc::new(inner), upstream: Arc::new(upstream), activated: AtomicBool::new(false), subscription: Mutex::new(None) }
    }

    /// Whether the upstream subscription has been made
    pub fn is_active(&self) -> bool { self.activated.load(Ordering::Acquire) }

    /// Pull the upstream's current value into the wrapped signal
    fn sync(&self) { self.inner.update((*self.upstream.read()).clone()) }

    fn activate(&self) {
        if self.activated.swap(true, Ordering::AcqRel) {
            return;
        }
        // Hold only a weak reference so the upstream does not keep this signal alive
        let inner = Arc::downgrade(&self.inner);
        let subscription = self.upstream.subscribe(Observer::new(move |value: Arc<U>| {
            if let Some(inner) = inner.upgrade() {
                inner.update((*value).clone());
            }
        }));
        *self.subscription.lock().expect("subscription lock poisoned") = Some(subscription);
        // catch up with changes made while nothing was pulling
        self.sync();
    }
}

impl<Inner, U> Observable for Input<Inner, U>
where
    Inner: Signal<U> + 'static,
    U: Clone + Send + Sync + 'static,
{
    type Value = Inner::Value;

    fn read(&self) -> Arc<Self::Value> {
        if !self.is_active() {
            self.sync();
        }
        self.inner.read()
    }

    fn subscribe(&self, observer: Observer<Arc<Self::Value>>) -> Subscription {
        self.activate();
        self.inner.subscribe(observer)
    }
}

impl<I, Inner, U> Signal<I> for Input<Inner, U>
where
    Inner: Signal<U> + 'static,
    U: Clone + Send + Sync + 'static,
{
    fn update(&self, _: I) { self.sync() }
}

impl<Inner, U> Drop for Input<Inner, U> {
    fn drop(&mut self) {
        if let Ok(mut subscription) = self.subscription.lock() {
            if let Some(subscription) = subscription.take() {
                subscription.cancel();
            }
        }
    }
}
