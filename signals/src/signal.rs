pub mod cell;
pub mod delay;
pub mod factory;
pub mod input;
pub mod inputs;
pub mod transform;

pub use cell::*;
pub use delay::*;
pub use factory::*;
pub use input::*;
pub use inputs::*;
pub use transform::*;

use std::time::Duration;

use crate::{
    error::ConfigError,
    traits::{Observable, Signal},
};

/// Fluent nesting of decorators: `cell.transform(f).inputs(upstreams).delay(d)` builds the same
/// value as the equivalent nested constructor calls.
pub trait Compose: Observable + Sized {
    /// Wrap in a [`Transform`]
    fn transform<F, X>(self, transform: F) -> Transform<Self, F, X>
    where Self: Signal<X> {
        Transform::new(self, transform)
    }

    /// Wrap in an [`Input`] linked to `upstream`
    fn input<U, Up>(self, upstream: Up) -> Input<Self, U>
    where
        Self: Signal<U> + 'static,
        U: Clone + Send + Sync + 'static,
        Up: Observable<Value = U> + 'static,
    {
        Input::new(self, upstream)
    }

    /// Wrap in an [`Inputs`] linked to every one of `upstreams`
    fn inputs<U, Up, It>(self, upstreams: It) -> Inputs<Self, U>
    where
        Self: Signal<Vec<U>> + 'static,
        U: Clone + Send + Sync + 'static,
        Up: Observable<Value = U> + 'static,
        It: IntoIterator<Item = Up>,
    {
        Inputs::new(self, upstreams)
    }

    /// Wrap in a [`Delay`] running on the current tokio runtime
    fn delay<I>(self, duration: Duration) -> Result<Delay<Self, I>, ConfigError>
    where
        Self: Signal<I> + 'static,
        I: Send + 'static,
    {
        Delay::new(self, duration)
    }
}

impl<S> Compose for S where S: Observable {}
