pub mod event;
pub mod property;

pub use event::*;
pub use property::*;
