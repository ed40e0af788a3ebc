use std::sync::Arc;

use tracing::warn;

use crate::error::ObserverFailure;

/// Receives observer failures caught by a dispatcher.
///
/// Implementations must not panic: they run in the middle of a dispatch.
pub trait DiagnosticSink: Send + Sync {
    fn observer_failed(&self, failure: &ObserverFailure);
}

/// The default sink: logs each failure as a `warn` level tracing event
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn observer_failed(&self, failure: &ObserverFailure) {
        warn!(error = %failure, "signal event handler failed");
    }
}

impl<F> DiagnosticSink for F
where F: Fn(&ObserverFailure) + Send + Sync
{
    fn observer_failed(&self, failure: &ObserverFailure) { self(failure) }
}

pub(crate) fn default_sink() -> Arc<dyn DiagnosticSink> { Arc::new(TracingSink) }
