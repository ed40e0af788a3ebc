use std::future::Future;

use tokio::runtime::Handle;

/// Resolve the runtime used for background work: the configured one, else the runtime we are running on
pub(crate) fn runtime_or_current(configured: Option<Handle>) -> Option<Handle> { configured.or_else(|| Handle::try_current().ok()) }

/// Spawn a task
pub(crate) fn spawn<F>(runtime: &Handle, future: F)
where F: Future<Output = ()> + Send + 'static {
    runtime.spawn(future);
}
