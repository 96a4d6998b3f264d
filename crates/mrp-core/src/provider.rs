//! 引擎邊界介面
//!
//! 引擎本身不含任何 I/O；產品結構、庫存需求、工作中心、預測與計劃訂單持久化
//! 都經由以下 trait 取得，實作者可以是資料庫、服務或記憶體（見 [`crate::memory`]）。

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    Bom, CalendarEntry, Demand, DemandForecast, DemandObservation, Effectivity, ForecastFeatures, MrpConfig,
    MrpError, PlannedOrder, PlanningHorizon, ReplenishmentType, Result, Routing, Supply, WorkCenter,
};

/// 反查結果：某個 BOM 的某一行引用了指定子件
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WhereUsedEntry {
    pub bom_id: Uuid,
    pub parent_product_id: String,
    pub bom_version: u32,
    pub line_id: Uuid,
    pub component_id: String,
    pub quantity: Decimal,
    pub line_effectivity: Effectivity,
}

/// 產品結構來源
pub trait StructureStore: Send + Sync {
    /// 指定日期有效且已發行的 BOM
    fn find_effective_bom(&self, product_id: &str, as_of: NaiveDate) -> Option<Bom>;

    /// 指定日期有效且已發行的途程
    fn find_effective_routing(&self, product_id: &str, as_of: NaiveDate) -> Option<Routing>;

    /// 列出所有引用該子件的 BOM 行
    fn find_where_used(&self, component_id: &str) -> Vec<WhereUsedEntry>;

    /// 物料主檔是否存在
    fn item_exists(&self, product_id: &str) -> bool;
}

/// 庫存與需求來源
pub trait InventoryProvider: Send + Sync {
    fn on_hand_quantity(&self, product_id: &str) -> Decimal;

    fn safety_stock(&self, product_id: &str) -> Decimal;

    /// 可用日早於 `until` 的預計收貨
    fn scheduled_receipts(&self, product_id: &str, until: NaiveDate) -> Vec<Supply>;

    fn lead_time_days(&self, product_id: &str) -> u32;

    fn replenishment_type(&self, product_id: &str) -> ReplenishmentType;

    /// 獨立需求；時界外的需求由引擎判斷並警告
    fn gross_requirements(&self, product_id: &str, horizon: &PlanningHorizon) -> Vec<Demand>;

    /// 物料計劃參數
    fn mrp_config(&self, product_id: &str) -> Option<MrpConfig>;

    /// 歷史需求（預測備援使用）
    fn demand_history(&self, _product_id: &str) -> Vec<DemandObservation> {
        Vec::new()
    }
}

/// 工作中心與行事曆來源
pub trait WorkCenterProvider: Send + Sync {
    fn work_center(&self, work_center_id: &str) -> Option<WorkCenter>;

    fn work_centers(&self) -> Vec<WorkCenter>;

    /// 某日可用工時
    fn available_capacity(&self, work_center_id: &str, date: NaiveDate, include_overtime: bool) -> Result<Decimal> {
        self.work_center(work_center_id)
            .map(|wc| wc.available_hours(date, include_overtime))
            .ok_or_else(|| MrpError::WorkCenterNotFound(work_center_id.to_string()))
    }

    /// 區間 `[start, end)` 的行事曆
    fn calendar(&self, work_center_id: &str, start: NaiveDate, end: NaiveDate) -> Result<Vec<CalendarEntry>> {
        let wc = self
            .work_center(work_center_id)
            .ok_or_else(|| MrpError::WorkCenterNotFound(work_center_id.to_string()))?;
        Ok(start
            .iter_days()
            .take_while(|d| *d < end)
            .map(|d| wc.calendar.entry_for(d, wc.hours_per_day))
            .collect())
    }
}

/// 外部預測服務（ML）
///
/// 呼叫者應先確認 [`is_healthy`](Self::is_healthy) 與 [`is_available`](Self::is_available)。
pub trait ForecastProvider: Send + Sync {
    fn is_healthy(&self) -> bool;

    fn is_available(&self) -> bool;

    fn predict(
        &self,
        product_id: &str,
        start: NaiveDate,
        end: NaiveDate,
        features: &ForecastFeatures,
    ) -> Result<DemandForecast>;
}

/// 計劃訂單持久化
pub trait PlannedOrderRepository: Send + Sync {
    fn save_planned_order(&self, order: &PlannedOrder) -> Result<()>;

    /// 刪除該物料開始日早於時界迄日的計劃訂單（含過期單），回傳刪除筆數
    fn delete_planned_orders(&self, product_id: &str, horizon: &PlanningHorizon) -> Result<usize>;

    fn find_planned_orders(&self, product_id: &str) -> Result<Vec<PlannedOrder>>;
}
