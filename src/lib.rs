//! # MRP Engine
//!
//! 物料需求規劃引擎的對外入口：重新匯出各子 crate 的主要類型，
//! 並提供示例與整合測試共用的日誌初始化。
//!
//! - [`mrp_core`]：資料模型、提供者介面、設定
//! - [`mrp_calc`]：BOM 展開、MRP 計算與引擎、預測備援
//! - [`mrp_optimizer`]：產能規劃與瓶頸處置
//! - [`mrp_cache`]：淨變計算

pub mod logging;

pub use mrp_cache::{DirtyTracker, IncrementalCalculator};
pub use mrp_calc::{
    BomExplosion, BomIssue, ExplodedComponent, ForecastService, MrpEngine, MrpResult, MrpRunResult, MrpWarning,
    WarningKind, WarningSeverity,
};
pub use mrp_core::*;
pub use mrp_optimizer::{
    CapacityPlan, CapacityPlanner, CapacityResolver, CapacityWarning, LevelingResult, LoadMove, OperationScheduler,
    ResolutionOutcome,
};

pub use mrp_cache;
pub use mrp_calc;
pub use mrp_core;
pub use mrp_optimizer;
