use std::sync::Arc;

/// A handle for ending a subscription.
///
/// Dropping a `Subscription` does *not* unsubscribe: the observer stays subscribed until
/// [`Subscription::cancel`] is called. Use [`Subscription::guard`] to tie the subscription to a scope.
#[derive(Clone)]
pub struct Subscription(Arc<dyn Fn() + Send + Sync>);

impl Subscription {
    pub(crate) fn new<F>(cancel: F) -> Self
    where F: Fn() + Send + Sync + 'static {
        Self(Arc::new(cancel))
    }

    /// Unsubscribe. Calling this more than once has no further effect.
    pub fn cancel(&self) { (self.0)() }

    /// Convert into a guard which cancels the subscription when dropped
    pub fn guard(self) -> SubscriptionGuard { SubscriptionGuard(Some(self)) }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { f.debug_struct("Subscription").finish_non_exhaustive() }
}

/// A guard for a subscription to a channel or signal
#[must_use = "dropping the guard immediately cancels the subscription"]
#[derive(Debug)]
pub struct SubscriptionGuard(Option<Subscription>);

impl SubscriptionGuard {
    /// Give up the guard without cancelling
    pub fn detach(mut self) -> Subscription { self.0.take().expect("guard holds its subscription until dropped or detached") }
}

impl Drop for SubscriptionGuard {
    /// Automatically unsubscribes when the guard is dropped.
    fn drop(&mut self) {
        if let Some(subscription) = self.0.take() {
            subscription.cancel();
        }
    }
}
