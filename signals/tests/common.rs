use std::str::FromStr;
use std::sync::{Arc, Mutex};

use signal_cell::{DiagnosticSink, ObserverFailure};
use tracing::Level;

// Initialize tracing for tests
#[ctor::ctor]
fn init_tracing() {
    // if LOG_LEVEL env var is set, use it
    if let Ok(level) = std::env::var("LOG_LEVEL") {
        tracing_subscriber::fmt().with_max_level(Level::from_str(&level).unwrap()).with_test_writer().init();
    } else {
        tracing_subscriber::fmt().with_max_level(Level::INFO).with_test_writer().init();
    }
}

#[allow(unused)]
pub fn watcher<T: Send + Sync + 'static>() -> (Box<dyn Fn(T) + Send + Sync>, Box<dyn Fn() -> Vec<T> + Send + Sync>) {
    let changes = Arc::new(Mutex::new(Vec::new()));
    let watcher = {
        let changes = changes.clone();
        Box::new(move |value: T| {
            changes.lock().unwrap().push(value);
        })
    };

    let check = Box::new(move || {
        let changes: Vec<T> = changes.lock().unwrap().drain(..).collect();
        changes
    });

    (watcher, check)
}

/// A diagnostic sink which remembers the message of every failure it receives
#[allow(unused)]
#[derive(Clone, Default)]
pub struct RecordingSink(Arc<Mutex<Vec<String>>>);

#[allow(unused)]
impl RecordingSink {
    pub fn new() -> Self { Self::default() }

    pub fn messages(&self) -> Vec<String> { self.0.lock().unwrap().clone() }
}

impl DiagnosticSink for RecordingSink {
    fn observer_failed(&self, failure: &ObserverFailure) { self.0.lock().unwrap().push(failure.to_string()); }
}

/// A shared counter
#[allow(unused)]
#[derive(Clone, Default)]
pub struct Counter(Arc<Mutex<usize>>);

#[allow(unused)]
impl Counter {
    pub fn new() -> Self { Self::default() }

    pub fn increment(&self) { *self.0.lock().unwrap() += 1; }

    pub fn get(&self) -> usize { *self.0.lock().unwrap() }
}
