//! # MRP Optimizer
//!
//! 產能需求規劃：工序排程、產能剖面與瓶頸（[`CapacityPlanner`]），
//! 以及瓶頸的解決建議與自動處置（[`CapacityResolver`]）。

pub mod capacity;
pub mod constraint;
pub mod scheduling;

// Re-export 主要類型
pub use capacity::{CapacityPlan, CapacityPlanner, CapacityWarning, LevelingResult, LoadMove, OrderWindow};
pub use constraint::{CapacityResolver, ResolutionOutcome};
pub use scheduling::{OperationScheduler, ScheduledOperation};
