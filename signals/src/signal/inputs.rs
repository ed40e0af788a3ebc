use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crate::{
    observer::Observer,
    subscription::Subscription,
    traits::{Observable, Signal},
};

/// Links a signal to an ordered list of upstream signals.
///
/// Works like [`Input`](crate::Input), but what reaches the wrapped signal is a `Vec` holding the
/// current value of every upstream, in the order given. A change in any one upstream re-reads all
/// of them and produces a single update. Like `Input`, the first subscribe pulls every upstream
/// before the new observer is added.
pub struct Inputs<Inner, U> {
    shared: Arc<Shared<Inner, U>>,
    activated: AtomicBool,
    subscriptions: Mutex<Vec<Subscription>>,
}

struct Shared<Inner, U> {
    inner: Inner,
    upstreams: Vec<Arc<dyn Observable<Value = U>>>,
}

impl<Inner, U> Shared<Inner, U>
where
    Inner: Signal<Vec<U>>,
    U: Clone,
{
    fn sync(&self) {
        let values: Vec<U> = self.upstreams.iter().map(|upstream| (*upstream.read()).clone()).collect();
        self.inner.update(values);
    }
}

impl<Inner, U> Inputs<Inner, U>
where
    Inner: Signal<Vec<U>> + 'static,
    U: Clone + Send + Sync + 'static,
{
    pub fn new<Up, It>(inner: Inner, upstreams: It) -> Self
    where
        Up: Observable<Value = U> + 'static,
        It: IntoIterator<Item = Up>,
    {
        let upstreams = upstreams.into_iter().map(|upstream| Arc::new(upstream) as Arc<dyn Observable<Value = U>>).collect();
        Self { shared: Arc::new(Shared { inner, upstreams }), activated: AtomicBool::new(false), subscriptions: Mutex::new(Vec::new()) }
    }

    /// Whether the upstream subscriptions have been made
    pub fn is_active(&self) -> bool { self.activated.load(Ordering::Acquire) }

    pub fn len(&self) -> usize { self.shared.upstreams.len() }

    pub fn is_empty(&self) -> bool { self.shared.upstreams.is_empty() }

    fn activate(&self) {
        if self.activated.swap(true, Ordering::AcqRel) {
            return;
        }
        let subscriptions: Vec<Subscription> = self
            .shared
            .upstreams
            .iter()
            .map(|upstream| {
                let shared = Arc::downgrade(&self.shared);
                upstream.subscribe(Observer::new(move |_: Arc<U>| {
                    if let Some(shared) = shared.upgrade() {
                        shared.sync();
                    }
                }))
            })
            .collect();
        self.subscriptions.lock().expect("subscriptions lock poisoned").extend(subscriptions);
        self.shared.sync();
    }
}

impl<Inner, U> Observable for Inputs<Inner, U>
where
    Inner: Signal<Vec<U>> + 'static,
    U: Clone + Send + Sync + 'static,
{
    type Value = Inner::Value;

    fn read(&self) -> Arc<Self::Value> {
        if !self.is_active() {
            self.shared.sync();
        }
        self.shared.inner.read()
    }

    fn subscribe(&self, observer: Observer<Arc<Self::Value>>) -> Subscription {
        self.activate();
        self.shared.inner.subscribe(observer)
    }
}

impl<I, Inner, U> Signal<I> for Inputs<Inner, U>
where
    Inner: Signal<Vec<U>> + 'static,
    U: Clone + Send + Sync + 'static,
{
    fn update(&self, _: I) { self.shared.sync() }
}

impl<Inner, U> Drop for Inputs<Inner, U> {
    fn drop(&mut self) {
        if let Ok(mut subscriptions) = self.subscriptions.lock() {
            for subscription in subscriptions.drain(..) {
                subscription.cancel();
            }
        }
    }
}
