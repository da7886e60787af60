//! Points Calculation & Campaign Matching
//!
//! Pure functions mapping transactions to point awards:
//! - **calculator**: rate-based base points with floor semantics
//! - **matcher**: campaign applicability and deterministic selection
//! - **engine**: one-campaign award composition

pub mod calculator;
pub mod engine;
pub mod matcher;

pub use engine::{PointsBreakdown, compute_award};
