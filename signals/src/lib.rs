/*!
Observable cells and a small algebra of decorators for them.

# Design:
- A [`Channel`] fans values out to observers. Delivery is either immediate, or serialized so that an
  observer doing asynchronous work never runs twice at once and only ever receives the latest value.
- A [`Cell`] is a channel plus a stored value. It only notifies when the value actually changes,
  and hands out values as immutable `Arc` snapshots.
- Decorators ([`Transform`], [`Input`], [`Inputs`], [`Delay`]) wrap anything implementing
  [`Observable`] + [`Signal`] and implement those traits themselves, so they nest freely.
- Observer failures (errors and panics) are caught per observer and reported to a
  [`DiagnosticSink`], which logs through `tracing` by default.

# Basic usage

```rust
use signal_cell::*;
use std::sync::Arc;

let signal = Cell::new(42);
let subscription = signal.event(|value: Arc<i32>| println!("value: {value}"));
signal.set(43); // prints "value: 43"
signal.set(43); // unchanged, nothing printed
subscription.cancel();
assert_eq!(*signal.get(), 43);
```

# Derived signals

```rust
use signal_cell::*;

let width = Cell::new(2.0);
let height = Cell::new(3.0);
let area = Cell::new(0.0).transform(|sides: Vec<f64>| sides[0] * sides[1]).inputs([width.clone(), height.clone()]);

assert_eq!(*area.read(), 6.0);
width.set(3.0);
assert_eq!(*area.read(), 9.0);
```
*/

mod channel;
mod diagnostics;
mod dispatcher;
mod error;
mod observer;
pub mod porcelain;
pub mod signal;
mod subscription;
mod task;
mod traits;

pub use channel::*;
pub use diagnostics::{DiagnosticSink, TracingSink};
pub use dispatcher::Delivery;
pub use error::*;
pub use observer::*;
pub use porcelain::*;
pub use signal::*;
pub use subscription::*;
pub use traits::*;
