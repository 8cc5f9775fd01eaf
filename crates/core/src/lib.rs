//! Core data types for the price alert engine.

pub mod alert;
pub mod market;
pub mod pass;

pub use alert::*;
pub use market::*;
pub use pass::*;
