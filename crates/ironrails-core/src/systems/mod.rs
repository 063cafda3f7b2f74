pub mod tick;

pub use tick::*;
