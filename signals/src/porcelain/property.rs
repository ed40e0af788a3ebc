use std::sync::Arc;

use crate::traits::{Observable, Signal};

/// Property-style read access: `get` is [`Observable::read`]
pub trait Get: Observable {
    fn get(&self) -> Arc<Self::Value> { self.read() }

    /// Clone the current value out of the snapshot
    fn get_cloned(&self) -> Self::Value
    where Self::Value: Clone {
        (*self.read()).clone()
    }
}

impl<S> Get for S where S: Observable + ?Sized {}

/// Property-style write access: `set` is [`Signal::update`]
pub trait Set<I>: Signal<I> {
    fn set(&self, value: I) { self.update(value) }
}

impl<I, S> Set<I> for S where S: Signal<I> + ?Sized {}
