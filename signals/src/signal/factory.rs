use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;

use crate::{
    diagnostics::DiagnosticSink,
    error::ConfigError,
    observer::Observer,
    signal::{Cell, CellOptions, Delay, Input, Inputs, Transform},
    task,
    traits::{Observable, Signal},
};

/// A type-erased signal whose updates and reads share one type
pub type DynSignal<T> = Arc<dyn Signal<T, Value = T>>;

type Upstream<T> = Arc<dyn Observable<Value = T>>;

enum Link<T> {
    None,
    Input(Upstream<T>),
    Inputs(Vec<Upstream<T>>, Arc<dyn Fn(Vec<T>) -> T + Send + Sync>),
}

/// Everything [`create_signal`] can configure
pub struct SignalOptions<T> {
    cell: CellOptions<T>,
    transform: Option<Arc<dyn Fn(T) -> T + Send + Sync>>,
    link: Link<T>,
    conflicting_inputs: bool,
    delay: Option<Duration>,
}

impl<T> Default for SignalOptions<T>
where T: PartialEq + 'static
{
    fn default() -> Self { Self::from_cell(CellOptions::default()) }
}

impl<T> SignalOptions<T>
where T: PartialEq + 'static
{
    pub fn new() -> Self { Self::default() }
}

impl<T> SignalOptions<T> {
    /// Options for values compared with `equals` instead of `PartialEq`
    pub fn with_equality<F>(equals: F) -> Self
    where F: Fn(&T, &T) -> bool + Send + Sync + 'static {
        Self::from_cell(CellOptions::with_equality(equals))
    }

    fn from_cell(cell: CellOptions<T>) -> Self { Self { cell, transform: None, link: Link::None, conflicting_inputs: false, delay: None } }

    pub fn equals<F>(mut self, equals: F) -> Self
    where F: Fn(&T, &T) -> bool + Send + Sync + 'static {
        self.cell = self.cell.equals(equals);
        self
    }

    /// Map every update before it is compared and stored
    pub fn transform<F>(mut self, transform: F) -> Self
    where F: Fn(T) -> T + Send + Sync + 'static {
        self.transform = Some(Arc::new(transform));
        self
    }

    /// Follow a single upstream signal. Mutually exclusive with [`SignalOptions::inputs`].
    pub fn input<Up>(mut self, upstream: Up) -> Self
    where Up: Observable<Value = T> + 'static {
        self.set_link(Link::Input(Arc::new(upstream)));
        self
    }

    /// Follow several upstream signals, folding their values with `combine` before the
    /// transform runs. Mutually exclusive with [`SignalOptions::input`].
    pub fn inputs<Up, It, F>(mut self, upstreams: It, combine: F) -> Self
    where
        Up: Observable<Value = T> + 'static,
        It: IntoIterator<Item = Up>,
        F: Fn(Vec<T>) -> T + Send + Sync + 'static,
    {
        let upstreams = upstreams.into_iter().map(|upstream| Arc::new(upstream) as Upstream<T>).collect();
        self.set_link(Link::Inputs(upstreams, Arc::new(combine)));
        self
    }

    fn set_link(&mut self, link: Link<T>) {
        if !matches!(self.link, Link::None) {
            self.conflicting_inputs = true;
        }
        self.link = link;
    }

    /// Hold updates back, forwarding only the latest of each burst
    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn await_listeners(mut self, await_listeners: bool) -> Self {
        self.cell = self.cell.await_listeners(await_listeners);
        self
    }

    pub fn on_subscribe<F>(mut self, hook: F) -> Self
    where F: Fn(&Observer<Arc<T>>) + Send + Sync + 'static {
        self.cell = self.cell.on_subscribe(hook);
        self
    }

    pub fn on_first_subscribe<F>(mut self, hook: F) -> Self
    where F: Fn(&Observer<Arc<T>>) + Send + Sync + 'static {
        self.cell = self.cell.on_first_subscribe(hook);
        self
    }

    pub fn diagnostics<D>(mut self, sink: D) -> Self
    where D: DiagnosticSink + 'static {
        self.cell = self.cell.diagnostics(sink);
        self
    }

    /// Runtime for delayed updates and asynchronous observers
    pub fn runtime(mut self, runtime: Handle) -> Self {
        self.cell = self.cell.runtime(runtime);
        self
    }
}

/// Build a signal from options, applying decorators in a fixed order: transform, then the
/// upstream link, then the initial update, then the delay outermost.
///
/// The initial update travels through the transform and the link, so a transformed signal starts
/// with `transform(initial)` and a linked signal starts with its upstream's value. It is applied
/// before the delay, so the initial value is readable immediately.
///
/// Configuration problems are reported here rather than on first use.
pub fn create_signal<T>(initial: T, options: SignalOptions<T>) -> Result<DynSignal<T>, ConfigError>
where T: Clone + Send + Sync + 'static {
    let SignalOptions { cell, transform, link, conflicting_inputs, delay } = options;
    if conflicting_inputs {
        return Err(ConfigError::ConflictingInputs);
    }
    let delay = match delay {
        Some(duration) => {
            let runtime = task::runtime_or_current(cell.channel.runtime.clone()).ok_or(ConfigError::NoRuntime { feature: "delay" })?;
            Some((duration, runtime))
        }
        None => None,
    };

    let mut signal: DynSignal<T> = Arc::new(Cell::with_options(initial.clone(), cell)?);
    if let Some(transform) = transform {
        signal = Arc::new(Transform::new(signal, move |value: T| transform(value)));
    }
    match link {
        Link::None => {}
        Link::Input(upstream) => signal = Arc::new(Input::new(signal, upstream)),
        Link::Inputs(upstreams, combine) => {
            let combined = Transform::new(signal, move |values: Vec<T>| combine(values));
            signal = Arc::new(Inputs::new(combined, upstreams));
        }
    }
    signal.update(initial);
    if let Some((duration, runtime)) = delay {
        signal = Arc::new(Delay::with_runtime(signal, duration, runtime));
    }
    Ok(signal)
}
