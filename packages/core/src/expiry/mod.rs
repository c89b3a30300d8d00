//! Expiry Monitoring Module
//!
//! Classifies stock lots by how close they are to expiry and turns the
//! stock snapshot into deduplicated, time-bucketed alerts.

pub mod classifier;
pub mod error;
pub mod store;
pub mod sweeper;
pub mod types;


pub use classifier::classify;
pub use error::SweepError;
pub use store::AlertStore;
pub use sweeper::ExpirySweeper;
pub use types::*;
