use thiserror::Error;

/// A failure raised by an observer while a value was being delivered to it.
///
/// Failures are caught at the dispatcher, reported to the channel's
/// [`DiagnosticSink`](crate::DiagnosticSink) and then discarded. They never reach the code that
/// called `update` or `dispatch`, and they never stop delivery to other observers.
#[derive(Debug, Error)]
pub enum ObserverFailure {
    /// The observer returned an error
    #[error("{0:#}")]
    Rejected(anyhow::Error),

    /// The observer panicked
    #[error("observer panicked: {0}")]
    Panicked(String),

    /// The observer returned a future but there was no runtime to drive it
    #[error("observer returned a future but no tokio runtime is available")]
    NoRuntime,
}

impl ObserverFailure {
    pub(crate) fn from_panic(payload: Box<dyn std::any::Any + Send>) -> Self {
        let message = if let Some(message) = payload.downcast_ref::<&str>() {
            (*message).to_string()
        } else if let Some(message) = payload.downcast_ref::<String>() {
            message.clone()
        } else {
            "non-string panic payload".to_string()
        };
        ObserverFailure::Panicked(message)
    }
}

impl From<anyhow::Error> for ObserverFailure {
    fn from(err: anyhow::Error) -> Self { ObserverFailure::Rejected(err) }
}

/// Invalid channel or signal configuration, reported when the channel or signal is built.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// `input` and `inputs` were both configured
    #[error("`input` and `inputs` are mutually exclusive")]
    ConflictingInputs,

    /// A feature that schedules work in the background was requested outside of a tokio runtime
    #[error("{feature} requires a tokio runtime, but none was configured or running")]
    NoRuntime { feature: &'static str },
}
