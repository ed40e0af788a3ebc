use std::collections::VecDeque;
use std::sync::{Arc, Mutex, RwLock};

use tokio::runtime::Handle;

use crate::{
    channel::{Channel, ChannelOptions},
    diagnostics::DiagnosticSink,
    error::ConfigError,
    observer::Observer,
    subscription::Subscription,
    traits::{Observable, Signal},
};

/// Decides whether an update carries the same value as the one already stored
pub type Equality<T> = Arc<dyn Fn(&T, &T) -> bool + Send + Sync + 'static>;

/// Configuration for a [`Cell`]: an equality predicate plus the options of its channel
pub struct CellOptions<T> {
    pub(crate) equals: Equality<T>,
    pub(crate) channel: ChannelOptions<Arc<T>>,
}

impl<T> Default for CellOptions<T>
where T: PartialEq + 'static
{
    fn default() -> Self { Self::with_equality(|a: &T, b: &T| a == b) }
}

impl<T> CellOptions<T>
where T: PartialEq + 'static
{
    /// Options comparing values with `PartialEq`
    pub fn new() -> Self { Self::default() }
}

impl<T> CellOptions<T> {
    /// Options for values without `PartialEq`, or which need a different notion of "unchanged"
    pub fn with_equality<F>(equals: F) -> Self
    where F: Fn(&T, &T) -> bool + Send + Sync + 'static {
        Self { equals: Arc::new(equals), channel: ChannelOptions::default() }
    }

    /// Replace the equality predicate
    pub fn equals<F>(mut self, equals: F) -> Self
    where F: Fn(&T, &T) -> bool + Send + Sync + 'static {
        self.equals = Arc::new(equals);
        self
    }

    pub fn channel(mut self, channel: ChannelOptions<Arc<T>>) -> Self {
        self.channel = channel;
        self
    }

    pub fn await_listeners(mut self, await_listeners: bool) -> Self {
        self.channel = self.channel.await_listeners(await_listeners);
        self
    }

    pub fn on_subscribe<F>(mut self, hook: F) -> Self
    where F: Fn(&Observer<Arc<T>>) + Send + Sync + 'static {
        self.channel = self.channel.on_subscribe(hook);
        self
    }

    pub fn on_first_subscribe<F>(mut self, hook: F) -> Self
    where F: Fn(&Observer<Arc<T>>) + Send + Sync + 'static {
        self.channel = self.channel.on_first_subscribe(hook);
        self
    }

    pub fn diagnostics<D>(mut self, sink: D) -> Self
    where D: DiagnosticSink + 'static {
        self.channel = self.channel.diagnostics(sink);
        self
    }

    pub fn runtime(mut self, runtime: Handle) -> Self {
        self.channel = self.channel.runtime(runtime);
        self
    }
}

/// A stored value plus a channel announcing its changes.
///
/// The first update always notifies; every later update notifies only if the new value is not
/// equal to the stored one. Stored values are frozen behind an `Arc`: readers and observers share
/// the snapshot and can never obtain a mutable reference to it.
///
/// Observers receive values in the order they were stored, also when several threads update
/// concurrently. Whoever finds the outbox idle delivers everything queued behind it, so an update
/// racing an ongoing delivery, or made by an observer during one, may return before its value
/// has reached every observer.
///
/// Cloning a `Cell` shares the same value and subscribers.
pub struct Cell<T>(Arc<Inner<T>>);

struct Inner<T> {
    state: RwLock<State<T>>,
    outbox: Mutex<Outbox<T>>,
    equals: Equality<T>,
    channel: Channel<Arc<T>>,
}

struct State<T> {
    value: Arc<T>,
    first_update: bool,
}

/// Stored snapshots waiting for dispatch, in store order
struct Outbox<T> {
    queue: VecDeque<Arc<T>>,
    delivering: bool,
}

impl<T> Inner<T> {
    fn new(initial: T, equals: Equality<T>, channel: Channel<Arc<T>>) -> Self {
        Self {
            state: RwLock::new(State::new(initial)),
            outbox: Mutex::new(Outbox { queue: VecDeque::new(), delivering: false }),
            equals,
            channel,
        }
    }
}

impl<T> Clone for Cell<T> {
    fn clone(&self) -> Self { Self(self.0.clone()) }
}

impl<T> Cell<T>
where T: PartialEq + Send + Sync + 'static
{
    /// A cell with immediate delivery and `PartialEq` change detection
    pub fn new(initial: T) -> Self {
        Self::init(Inner::new(initial, Arc::new(|a: &T, b: &T| a == b), Channel::new()))
    }
}

impl<T> Cell<T>
where T: Send + Sync + 'static
{
    pub fn with_options(initial: T, options: CellOptions<T>) -> Result<Self, ConfigError> {
        let CellOptions { equals, channel } = options;
        Ok(Self::init(Inner::new(initial, equals, Channel::with_options(channel)?)))
    }

    /// Runs the initial update: nobody is subscribed yet, but the first-update flag is consumed
    fn init(inner: Inner<T>) -> Self {
        let cell = Self(Arc::new(inner));
        let initial = cell.0.state.read().expect("cell state lock poisoned").value.clone();
        cell.commit(initial);
        cell
    }

    fn commit(&self, value: Arc<T>) {
        let deliver = {
            let mut state = self.0.state.write().expect("cell state lock poisoned");
            state.first_update = false;
            state.value = value.clone();
            // queued while the state is still locked, so queue order is store order
            let mut outbox = self.0.outbox.lock().expect("outbox lock poisoned");
            outbox.queue.push_back(value);
            !std::mem::replace(&mut outbox.delivering, true)
        };
        if deliver {
            self.deliver();
        }
    }

    fn deliver(&self) {
        loop {
            let next = {
                let mut outbox = self.0.outbox.lock().expect("outbox lock poisoned");
                let next = outbox.queue.pop_front();
                if next.is_none() {
                    outbox.delivering = false;
                }
                next
            };
            match next {
                Some(value) => self.0.channel.dispatch(value),
                None => return,
            }
        }
    }

    pub fn subscriber_count(&self) -> usize { self.0.channel.subscriber_count() }
}

impl<T> State<T> {
    fn new(initial: T) -> Self { Self { value: Arc::new(initial), first_update: true } }
}

impl<T> Observable for Cell<T>
where T: Send + Sync + 'static
{
    type Value = T;

    fn read(&self) -> Arc<T> { self.0.state.read().expect("cell state lock poisoned").value.clone() }

    fn subscribe(&self, observer: Observer<Arc<T>>) -> Subscription { self.0.channel.subscribe(observer) }
}

impl<T> Signal<T> for Cell<T>
where T: Send + Sync + 'static
{
    fn update(&self, value: T) {
        let current = {
            let state = self.0.state.read().expect("cell state lock poisoned");
            (!state.first_update).then(|| state.value.clone())
        };
        // the predicate is user code: run it without holding the lock
        if let Some(current) = current {
            if (self.0.equals)(&current, &value) {
                return;
            }
        }
        self.commit(Arc::new(value));
    }
}

impl<T> std::fmt::Debug for Cell<T>
where T: std::fmt::Debug + Send + Sync + 'static
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cell").field("value", &self.read()).field("channel", &self.0.channel).finish()
    }
}

impl<T> std::fmt::Display for Cell<T>
where T: std::fmt::Display + Send + Sync + 'static
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { write!(f, "{}", self.read()) }
}
