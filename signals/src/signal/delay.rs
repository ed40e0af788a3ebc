use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::runtime::Handle;
use tracing::trace;

use crate::{
    error::ConfigError,
    observer::Observer,
    subscription::Subscription,
    task,
    traits::{Observable, Signal},
};

/// Holds updates back for a fixed time and then forwards only the latest one.
///
/// The first update of a burst starts a one-shot timer. Further updates before it fires only
/// replace the pending value; they do not restart the timer. When the timer fires the wrapped
/// signal receives exactly one update carrying the most recent value.
pub struct Delay<Inner, I> {
    shared: Arc<Shared<Inner, I>>,
    duration: Duration,
    runtime: Handle,
}

struct Shared<Inner, I> {
    inner: Inner,
    timer: Mutex<Timer<I>>,
}

struct Timer<I> {
    pending: Option<I>,
    scheduled: bool,
}

impl<Inner, I> Delay<Inner, I>
where
    Inner: Signal<I> + 'static,
    I: Send + 'static,
{
    /// Delay on the runtime we are currently running on
    pub fn new(inner: Inner, duration: Duration) -> Result<Self, ConfigError> {
        let runtime = task::runtime_or_current(None).ok_or(ConfigError::NoRuntime { feature: "delay" })?;
        Ok(Self::with_runtime(inner, duration, runtime))
    }

    pub fn with_runtime(inner: Inner, duration: Duration, runtime: Handle) -> Self {
        Self { shared: Arc::new(Shared { inner, timer: Mutex::new(Timer { pending: None, scheduled: false }) }), duration, runtime }
    }

    pub fn duration(&self) -> Duration { self.duration }

    /// Whether a timer is waiting to fire
    pub fn is_scheduled(&self) -> bool { self.shared.timer.lock().expect("timer lock poisoned").scheduled }
}

impl<Inner, I> Shared<Inner, I>
where Inner: Signal<I>
{
    fn fire(&self) {
        let pending = {
            let mut timer = self.timer.lock().expect("timer lock poisoned");
            timer.scheduled = false;
            timer.pending.take()
        };
        if let Some(value) = pending {
            self.inner.update(value);
        }
    }
}

impl<Inner, I> Observable for Delay<Inner, I>
where
    Inner: Observable,
    I: Send,
{
    type Value = Inner::Value;

    fn read(&self) -> Arc<Self::Value> { self.shared.inner.read() }

    fn subscribe(&self, observer: Observer<Arc<Self::Value>>) -> Subscription { self.shared.inner.subscribe(observer) }
}

impl<Inner, I> Signal<I> for Delay<Inner, I>
where
    Inner: Signal<I> + 'static,
    I: Send + 'static,
{
    fn update(&self, value: I) {
        {
            let mut timer = self.shared.timer.lock().expect("timer lock poisoned");
            timer.pending = Some(value);
            if timer.scheduled {
                return;
            }
            timer.scheduled = true;
        }
        trace!(delay = ?self.duration, "scheduling delayed update");
        let shared = self.shared.clone();
        let duration = self.duration;
        task::spawn(&self.runtime, async move {
            tokio::time::sleep(duration).await;
            shared.fire();
        });
    }
}
