use std::sync::Arc;

use crate::{
    observer::IntoObserver,
    subscription::{Subscription, SubscriptionGuard},
    traits::Observable,
};

/// Subscribe with anything that converts into an observer: closures, `std::sync::mpsc::Sender`,
/// `tokio::sync::mpsc::UnboundedSender` or an [`Observer`](crate::Observer) itself.
pub trait Event: Observable {
    /// Add a change event handler
    fn event<O>(&self, observer: O) -> Subscription
    where O: IntoObserver<Arc<Self::Value>> {
        self.subscribe(observer.into_observer())
    }

    /// Add a change event handler which is removed when the returned guard is dropped
    fn event_guard<O>(&self, observer: O) -> SubscriptionGuard
    where O: IntoObserver<Arc<Self::Value>> {
        self.event(observer).guard()
    }
}

impl<S> Event for S where S: Observable + ?Sized {}
