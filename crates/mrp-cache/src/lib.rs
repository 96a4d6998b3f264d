//! # MRP Cache
//!
//! 淨變計算支援：異動追蹤（[`DirtyTracker`]）與只重算受影響物料的
//! [`IncrementalCalculator`]。

pub mod dirty_tracking;
pub mod incremental;

pub use dirty_tracking::DirtyTracker;
pub use incremental::IncrementalCalculator;
