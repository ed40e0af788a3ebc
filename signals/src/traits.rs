use std::sync::Arc;

use crate::{observer::Observer, subscription::Subscription};

/// The readable, observable half of a signal.
///
/// Dyn safe, so upstream signals can be held as `Arc<dyn Observable<Value = U>>`.
pub trait Observable: Send + Sync {
    type Value;

    /// The current value. Snapshots are immutable; write through [`Signal::update`].
    fn read(&self) -> Arc<Self::Value>;

    /// Observe future changes. The current value is not delivered.
    fn subscribe(&self, observer: Observer<Arc<Self::Value>>) -> Subscription;
}

/// The full read / update / subscribe contract.
///
/// `I` is what `update` accepts, which differs from [`Observable::Value`] when a decorator such
/// as [`Transform`](crate::Transform) sits in front of the cell.
pub trait Signal<I>: Observable {
    fn update(&self, input: I);
}

impl<S> Observable for Arc<S>
where S: Observable + ?Sized
{
    type Value = S::Value;

    fn read(&self) -> Arc<Self::Value> { (**self).read() }

    fn subscribe(&self, observer: Observer<Arc<Self::Value>>) -> Subscription { (**self).subscribe(observer) }
}

impl<I, S> Signal<I> for Arc<S>
where S: Signal<I> + ?Sized
{
    fn update(&self, input: I) { (**self).update(input) }
}
