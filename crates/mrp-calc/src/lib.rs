//! # MRP Calculation Engine
//!
//! 核心 MRP 計算引擎：BOM 展開、時間分桶、淨需求、批量、提前期偏移，
//! 以及跨物料的 [`MrpEngine`] 與預測備援 [`ForecastService`]。

pub mod bucketing;
pub mod calculator;
pub mod engine;
pub mod explosion;
pub mod forecast;
pub mod lead_time;
pub mod lot_sizing;
pub mod netting;

use std::collections::BTreeMap;

use chrono::NaiveDate;
use mrp_core::{MaterialRequirement, MrpError, PlannedOrder, PlanningHorizon};
use serde::Serialize;

// Re-export 主要類型
pub use bucketing::{BucketPosition, TimeBucket, TimeBuckets};
pub use calculator::MrpCalculator;
pub use engine::MrpEngine;
pub use explosion::{BomExplosion, BomIssue, ExplodedComponent};
pub use forecast::ForecastService;
pub use lead_time::LeadTimeCalculator;
pub use lot_sizing::{LotSizingContext, LotSizingPolicy, LotSizingStrategy};
pub use netting::{NetRequirement, SupplyLedger};

/// 單一物料的 MRP 計算結果
#[derive(Debug, Clone, Serialize)]
pub struct MrpResult {
    pub product_id: String,

    /// 計劃訂單
    pub planned_orders: Vec<PlannedOrder>,

    /// 逐桶淨算記錄
    pub material_requirements: Vec<MaterialRequirement>,

    /// 警告信息
    pub warnings: Vec<MrpWarning>,

    /// 錯誤（不影響其他物料），序列化為錯誤訊息
    #[serde(serialize_with = "serialize_errors")]
    pub errors: Vec<MrpError>,
}

impl MrpResult {
    /// 創建空的計算結果
    pub fn empty(product_id: impl Into<String>) -> Self {
        Self {
            product_id: product_id.into(),
            planned_orders: Vec::new(),
            material_requirements: Vec::new(),
            warnings: Vec::new(),
            errors: Vec::new(),
        }
    }

    /// 添加警告
    pub fn add_warning(&mut self, warning: MrpWarning) {
        self.warnings.push(warning);
    }

    pub fn add_error(&mut self, error: MrpError) {
        self.errors.push(error);
    }

    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn has_warning(&self, kind: WarningKind) -> bool {
        self.warnings.iter().any(|w| w.kind == kind)
    }
}

fn serialize_errors<S: serde::Serializer>(errors: &[MrpError], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_seq(errors.iter().map(ToString::to_string))
}

/// MRP 警告類別
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum WarningKind {
    /// 下單日早於基準日，需催料
    PastDue,
    /// 批量調整產生超額
    LotSizingExcess,
    /// 預測信心不足
    LowConfidenceForecast,
    /// 外部預測不可用，改用歷史資料
    ForecastFallback,
    /// 需求落在時界外
    DemandOutsideHorizon,
    /// 生產件缺少有效途程
    MissingRouting,
    /// 虛擬件沒有 BOM，無法併入上層
    PhantomWithoutBom,
    /// 子件結構有誤，相依需求沒有傳遞下去
    DependentDemandDropped,
}

impl WarningKind {
    pub fn severity(&self) -> WarningSeverity {
        match self {
            WarningKind::LotSizingExcess => WarningSeverity::Info,
            WarningKind::PastDue
            | WarningKind::LowConfidenceForecast
            | WarningKind::ForecastFallback
            | WarningKind::DemandOutsideHorizon
            | WarningKind::MissingRouting
            | WarningKind::PhantomWithoutBom
            | WarningKind::DependentDemandDropped => WarningSeverity::Warning,
        }
    }
}

/// MRP 警告
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MrpWarning {
    pub product_id: String,
    pub kind: WarningKind,
    pub severity: WarningSeverity,
    pub message: String,
    pub date: Option<NaiveDate>,
}

impl MrpWarning {
    pub fn new(product_id: impl Into<String>, kind: WarningKind, message: impl Into<String>) -> Self {
        Self {
            product_id: product_id.into(),
            kind,
            severity: kind.severity(),
            message: message.into(),
            date: None,
        }
    }

    pub fn on(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum WarningSeverity {
    Info,
    Warning,
}

/// 一次 MRP 批次的結果
#[derive(Debug, Clone, Serialize)]
pub struct MrpRunResult {
    pub horizon: PlanningHorizon,

    /// 每個物料的結果（依物料 ID 排序）
    pub results: BTreeMap<String, MrpResult>,

    /// 重生時刪除的舊計劃訂單筆數
    pub deleted_orders: usize,

    /// 計算耗時（毫秒）
    pub calculation_time_ms: u128,
}

impl MrpRunResult {
    pub fn new(horizon: PlanningHorizon) -> Self {
        Self {
            horizon,
            results: BTreeMap::new(),
            deleted_orders: 0,
            calculation_time_ms: 0,
        }
    }

    pub fn result(&self, product_id: &str) -> Option<&MrpResult> {
        self.results.get(product_id)
    }

    /// 所有計劃訂單
    pub fn planned_orders(&self) -> impl Iterator<Item = &PlannedOrder> {
        self.results.values().flat_map(|r| r.planned_orders.iter())
    }

    pub fn orders_for(&self, product_id: &str) -> &[PlannedOrder] {
        self.results
            .get(product_id)
            .map(|r| r.planned_orders.as_slice())
            .unwrap_or(&[])
    }

    pub fn warnings(&self) -> impl Iterator<Item = &MrpWarning> {
        self.results.values().flat_map(|r| r.warnings.iter())
    }

    pub fn errors(&self) -> impl Iterator<Item = (&str, &MrpError)> {
        self.results
            .values()
            .flat_map(|r| r.errors.iter().map(move |e| (r.product_id.as_str(), e)))
    }

    pub fn has_errors(&self) -> bool {
        self.results.values().any(|r| !r.is_ok())
    }

    pub fn total_planned_orders(&self) -> usize {
        self.results.values().map(|r| r.planned_orders.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_errors_serialized_as_messages() {
        let mut result = MrpResult::empty("X");
        result.add_error(MrpError::bom_not_found("X"));

        let value = serde_json::to_value(&result).unwrap();

        let errors = value["errors"].as_array().unwrap();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0], MrpError::bom_not_found("X").to_string());
    }
}
