use std::sync::{Arc, Mutex, RwLock, Weak};

use tokio::runtime::Handle;

use crate::{
    diagnostics::{DiagnosticSink, default_sink},
    dispatcher::{Delivery, DispatchContext, Dispatcher},
    error::ConfigError,
    observer::{IntoObserver, Observer},
    subscription::Subscription,
    task,
};

/// Called with the raw observer when somebody subscribes
pub type SubscribeHook<T> = Arc<dyn Fn(&Observer<T>) + Send + Sync + 'static>;

/// Configuration for a [`Channel`]
pub struct ChannelOptions<T> {
    pub(crate) delivery: Delivery,
    pub(crate) on_subscribe: Option<SubscribeHook<T>>,
    pub(crate) on_first_subscribe: Option<SubscribeHook<T>>,
    pub(crate) diagnostics: Option<Arc<dyn DiagnosticSink>>,
    pub(crate) runtime: Option<Handle>,
}

impl<T> Default for ChannelOptions<T> {
    fn default() -> Self { Self { delivery: Delivery::Immediate, on_subscribe: None, on_first_subscribe: None, diagnostics: None, runtime: None } }
}

impl<T> ChannelOptions<T> {
    pub fn new() -> Self { Self::default() }

    /// `true` selects [`Delivery::Serialized`], `false` [`Delivery::Immediate`]
    pub fn await_listeners(self, await_listeners: bool) -> Self {
        self.delivery(if await_listeners { Delivery::Serialized } else { Delivery::Immediate })
    }

    pub fn delivery(mut self, delivery: Delivery) -> Self {
        self.delivery = delivery;
        self
    }

    /// Called after every successful subscribe
    pub fn on_subscribe<F>(mut self, hook: F) -> Self
    where F: Fn(&Observer<T>) + Send + Sync + 'static {
        self.on_subscribe = Some(Arc::new(hook));
        self
    }

    /// Called after the first subscribe ever made on the channel, and never again
    pub fn on_first_subscribe<F>(mut self, hook: F) -> Self
    where F: Fn(&Observer<T>) + Send + Sync + 'static {
        self.on_first_subscribe = Some(Arc::new(hook));
        self
    }

    /// Where observer failures are reported. Defaults to [`TracingSink`](crate::TracingSink).
    pub fn diagnostics<D>(mut self, sink: D) -> Self
    where D: DiagnosticSink + 'static {
        self.diagnostics = Some(Arc::new(sink));
        self
    }

    /// Runtime for asynchronous observer work. Defaults to the runtime the channel is created on.
    ///
    /// Work handed to a runtime that has shut down is dropped and reported as
    /// [`ObserverFailure::NoRuntime`](crate::ObserverFailure::NoRuntime); later values are still delivered.
    pub fn runtime(mut self, runtime: Handle) -> Self {
        self.runtime = Some(runtime);
        self
    }

    /// Resolve the dispatch context, failing if serialized delivery has no runtime to run on
    pub(crate) fn context(&mut self) -> Result<DispatchContext, ConfigError> {
        let runtime = task::runtime_or_current(self.runtime.take());
        if self.delivery == Delivery::Serialized && runtime.is_none() {
            return Err(ConfigError::NoRuntime { feature: "await_listeners" });
        }
        Ok(DispatchContext { sink: self.diagnostics.take().unwrap_or_else(default_sink), runtime })
    }
}

/// A fan-out primitive: observers subscribe, and every dispatched value is delivered to each of
/// them in subscription order. Cloning a `Channel` shares the same subscribers.
pub struct Channel<T>(Arc<Inner<T>>);

struct Inner<T> {
    delivery: Delivery,
    context: DispatchContext,
    dispatchers: RwLock<Vec<Arc<dyn Dispatcher<T>>>>,
    on_subscribe: Option<SubscribeHook<T>>,
    /// Taken by the first subscribe
    on_first_subscribe: Mutex<Option<SubscribeHook<T>>>,
}

impl<T> Clone for Channel<T> {
    fn clone(&self) -> Self { Self(self.0.clone()) }
}

impl<T> std::fmt::Debug for Channel<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Channel")
            .field("delivery", &self.0.delivery)
            .field("subscribers", &self.0.dispatchers.read().expect("dispatchers lock poisoned").len())
            .finish()
    }
}

impl<T> Default for Channel<T>
where T: Clone + Send + 'static
{
    fn default() -> Self { Self::new() }
}

impl<T> Channel<T>
where T: Clone + Send + 'static
{
    /// A channel with immediate delivery
    pub fn new() -> Self {
        let context = DispatchContext { sink: default_sink(), runtime: task::runtime_or_current(None) };
        Self::from_parts(Delivery::Immediate, context, None, None)
    }

    pub fn with_options(mut options: ChannelOptions<T>) -> Result<Self, ConfigError> {
        let context = options.context()?;
        Ok(Self::from_parts(options.delivery, context, options.on_subscribe, options.on_first_subscribe))
    }

    fn from_parts(
        delivery: Delivery,
        context: DispatchContext,
        on_subscribe: Option<SubscribeHook<T>>,
        on_first_subscribe: Option<SubscribeHook<T>>,
    ) -> Self {
        Self(Arc::new(Inner {
            delivery,
            context,
            dispatchers: RwLock::new(Vec::new()),
            on_subscribe,
            on_first_subscribe: Mutex::new(on_first_subscribe),
        }))
    }

    /// Subscribe an observer. The returned handle removes every subscription of that same observer.
    pub fn subscribe<O>(&self, observer: O) -> Subscription
    where O: IntoObserver<T> {
        let observer = observer.into_observer();
        let dispatcher = self.0.delivery.dispatcher(observer.clone(), self.0.context.clone());
        self.0.dispatchers.write().expect("dispatchers lock poisoned").push(dispatcher);

        // Hooks run without any lock held so they may subscribe or dispatch themselves
        if let Some(hook) = &self.0.on_subscribe {
            hook(&observer);
        }
        let first = self.0.on_first_subscribe.lock().expect("first subscribe lock poisoned").take();
        if let Some(hook) = first {
            hook(&observer);
        }

        let inner = Arc::downgrade(&self.0);
        Subscription::new(move || unsubscribe(&inner, &observer))
    }

    /// Deliver `value` to every current subscriber
    pub fn dispatch(&self, value: T) {
        // Snapshot the dispatchers so observers can (un)subscribe while we deliver
        let dispatchers = self.0.dispatchers.read().expect("dispatchers lock poisoned").clone();

        // clone the value for each dispatcher except the last one
        if let Some((last, rest)) = dispatchers.split_last() {
            for dispatcher in rest {
                dispatcher.dispatch(value.clone());
            }
            last.dispatch(value);
        }
    }
}

impl<T> Channel<T> {
    pub fn subscriber_count(&self) -> usize { self.0.dispatchers.read().expect("dispatchers lock poisoned").len() }

    pub fn delivery(&self) -> Delivery { self.0.delivery }
}

fn unsubscribe<T>(inner: &Weak<Inner<T>>, observer: &Observer<T>) {
    if let Some(inner) = inner.upgrade() {
        inner.dispatchers.write().expect("dispatchers lock poisoned").retain(|dispatcher| !dispatcher.observes(observer));
    }
}
