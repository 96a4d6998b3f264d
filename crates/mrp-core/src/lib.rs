//! # MRP Core
//!
//! 核心資料模型與類型定義：產品結構（BOM、Routing）、工作中心、計劃時界、
//! 需求/供應、計劃訂單、產能值物件，以及引擎邊界上的提供者介面。

pub mod bom;
pub mod calendar;
pub mod capacity;
pub mod config;
pub mod demand;
pub mod effectivity;
pub mod forecast;
pub mod horizon;
pub mod inventory;
pub mod memory;
pub mod plan;
pub mod provider;
pub mod routing;
pub mod settings;
pub mod supply;
pub mod work_center;
pub mod work_order;

use std::fmt;

use serde::{Deserialize, Serialize};

// Re-export 主要類型
pub use bom::{Bom, BomLine, BomStatus, BomType};
pub use calendar::{ShiftSchedule, WorkCalendar};
pub use capacity::{
    Bottleneck, CapacityLoad, CapacityPeriod, CapacityProfile, CapacityResolutionSuggestion,
    LoadSourceType, ResolutionAction,
};
pub use config::{LotSizingParams, LotSizingRule, MrpConfig, ReplenishmentType};
pub use demand::{Demand, DemandType};
pub use effectivity::Effectivity;
pub use forecast::{DemandForecast, DemandObservation, ForecastFeatures, ForecastMethod, ForecastPeriod};
pub use horizon::{BucketSize, PlanningHorizon, PlanningZone};
pub use inventory::Inventory;
pub use memory::{InMemoryInventory, InMemoryPlannedOrderRepository, InMemoryWorkCenters, StructureCatalog};
pub use plan::{MaterialRequirement, PlannedOrder, PlannedOrderType};
pub use provider::{
    ForecastProvider, InventoryProvider, PlannedOrderRepository, StructureStore, WhereUsedEntry,
    WorkCenterProvider,
};
pub use routing::{Operation, OperationType, Routing, RoutingStatus};
pub use settings::{CapacitySettings, EngineSettings, ForecastSettings, LeadTimeMode, ResolverPreferences};
pub use supply::{Supply, SupplyType};
pub use work_center::{CalendarEntry, WorkCenter, WorkCenterCalendar};
pub use work_order::{WorkOrder, WorkOrderStatus};

/// 產品結構種類（用於錯誤訊息）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StructureKind {
    Bom,
    Routing,
}

impl fmt::Display for StructureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StructureKind::Bom => write!(f, "BOM"),
            StructureKind::Routing => write!(f, "途程"),
        }
    }
}

/// MRP 錯誤類型
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MrpError {
    #[error("找不到有效的{structure}: 物料 {product_id}")]
    StructureNotFound {
        product_id: String,
        structure: StructureKind,
    },

    #[error("BOM 結構循環: {}", .path.join(" -> "))]
    CircularStructure { path: Vec<String> },

    #[error("無效的版本: {0}")]
    InvalidVersion(String),

    #[error("{entity} 目前狀態 {from} 不允許執行 {action}")]
    InvalidStatus {
        entity: String,
        from: String,
        action: String,
    },

    #[error("預測服務不可用: {0}")]
    ForecastUnavailable(String),

    #[error("物料 {product_id} 的批量規則 {rule} 缺少必要參數")]
    MissingLotSize { product_id: String, rule: String },

    #[error("無效的數量: {0}")]
    InvalidQuantity(String),

    #[error("無效的日期: {0}")]
    InvalidDate(String),

    #[error("無效的計劃時界: {0}")]
    InvalidHorizon(String),

    #[error("找不到工作中心: {0}")]
    WorkCenterNotFound(String),

    #[error("找不到物料主檔: {0}")]
    ItemNotFound(String),

    #[error("持久化錯誤: {0}")]
    Persistence(String),

    #[error("配置錯誤: {0}")]
    Configuration(String),

    #[error("計算錯誤: {0}")]
    CalculationError(String),
}

impl MrpError {
    /// 建立「找不到 BOM」錯誤
    pub fn bom_not_found(product_id: impl Into<String>) -> Self {
        MrpError::StructureNotFound {
            product_id: product_id.into(),
            structure: StructureKind::Bom,
        }
    }

    /// 建立「找不到途程」錯誤
    pub fn routing_not_found(product_id: impl Into<String>) -> Self {
        MrpError::StructureNotFound {
            product_id: product_id.into(),
            structure: StructureKind::Routing,
        }
    }

    /// 建立非法狀態轉換錯誤
    pub fn invalid_status(
        entity: impl Into<String>,
        from: impl fmt::Debug,
        action: impl Into<String>,
    ) -> Self {
        MrpError::InvalidStatus {
            entity: entity.into(),
            from: format!("{:?}", from),
            action: action.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, MrpError>;
