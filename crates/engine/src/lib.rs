//! Alert evaluation engine.
//!
//! One pass: load alert configs and baselines, fetch a batched market
//! snapshot, evaluate every alert edge-triggered against its previous and
//! current price, route fired triggers, then advance the baselines.

pub mod coordinator;
pub mod error;
pub mod evaluator;
pub mod runner;

pub use coordinator::PriceBaselineCoordinator;
pub use error::EngineError;
pub use evaluator::evaluate;
pub use runner::EvaluationRunner;
