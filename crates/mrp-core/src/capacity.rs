//! 產能需求規劃（CRP）值物件
//!
//! 負荷（Load）→ 期間（Period）→ 剖面（Profile），以及瓶頸與解決建議。
//! 期間的負荷工時一律由其負荷清單加總而來。

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 負荷來源
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadSourceType {
    /// 確定工單（已承諾，不可自動移動）
    WorkOrder,
    /// 計劃訂單
    PlannedOrder,
}

/// 產能負荷
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapacityLoad {
    pub id: Uuid,
    pub source_id: Uuid,
    pub source_type: LoadSourceType,
    pub work_center_id: String,
    pub setup_hours: Decimal,
    pub run_hours: Decimal,
    pub load_date: NaiveDate,
    pub operation_number: Option<u32>,
    pub product_id: Option<String>,
    pub quantity: Option<Decimal>,
}

impl CapacityLoad {
    pub fn new(
        source_id: Uuid,
        source_type: LoadSourceType,
        work_center_id: impl Into<String>,
        setup_hours: Decimal,
        run_hours: Decimal,
        load_date: NaiveDate,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            source_id,
            source_type,
            work_center_id: work_center_id.into(),
            setup_hours,
            run_hours,
            load_date,
            operation_number: None,
            product_id: None,
            quantity: None,
        }
    }

    /// 建構器模式：設置工序與產品資訊
    pub fn with_operation(mut self, operation_number: u32, product_id: impl Into<String>, quantity: Decimal) -> Self {
        self.operation_number = Some(operation_number);
        self.product_id = Some(product_id.into());
        self.quantity = Some(quantity);
        self
    }

    /// 總工時
    pub fn hours(&self) -> Decimal {
        self.setup_hours + self.run_hours
    }

    pub fn is_firm(&self) -> bool {
        self.source_type == LoadSourceType::WorkOrder
    }

    /// 拆出指定工時成為新負荷（先扣準備工時，再扣加工工時）
    ///
    /// 回傳拆出的部分；`hours` 大於等於總工時時整筆拆出，自身歸零。
    pub fn split_off(&mut self, hours: Decimal) -> CapacityLoad {
        let hours = hours.max(Decimal::ZERO).min(self.hours());
        let setup_part = hours.min(self.setup_hours);
        let run_part = hours - setup_part;

        let mut part = self.clone();
        part.id = Uuid::new_v4();
        part.setup_hours = setup_part;
        part.run_hours = run_part;

        self.setup_hours -= setup_part;
        self.run_hours -= run_part;

        if let (Some(total_qty), Some(_)) = (self.quantity, part.quantity) {
            let whole = part.hours() + self.hours();
            if whole > Decimal::ZERO {
                let moved_qty = total_qty * part.hours() / whole;
                part.quantity = Some(moved_qty);
                self.quantity = Some(total_qty - moved_qty);
            }
        }

        part
    }
}

/// 產能期間 `[start_date, end_date)`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapacityPeriod {
    pub work_center_id: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub available_hours: Decimal,
    pub loads: Vec<CapacityLoad>,
}

impl CapacityPeriod {
    pub fn new(
        work_center_id: impl Into<String>,
        start_date: NaiveDate,
        end_date: NaiveDate,
        available_hours: Decimal,
    ) -> Self {
        Self {
            work_center_id: work_center_id.into(),
            start_date,
            end_date,
            available_hours,
            loads: Vec::new(),
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start_date && date < self.end_date
    }

    /// 已負荷工時（負荷清單加總）
    pub fn loaded_hours(&self) -> Decimal {
        self.loads.iter().map(CapacityLoad::hours).sum()
    }

    /// 利用率；可用工時 ≤ 0 時無定義
    pub fn utilization(&self) -> Option<Decimal> {
        if self.available_hours > Decimal::ZERO {
            Some(self.loaded_hours() / self.available_hours)
        } else {
            None
        }
    }

    /// 超載工時
    pub fn overload(&self) -> Decimal {
        (self.loaded_hours() - self.available_hours.max(Decimal::ZERO)).max(Decimal::ZERO)
    }

    /// 剩餘產能
    pub fn remaining_capacity(&self) -> Decimal {
        (self.available_hours - self.loaded_hours()).max(Decimal::ZERO)
    }

    pub fn is_overloaded(&self) -> bool {
        self.overload() > Decimal::ZERO
    }

    /// 利用率是否達門檻；無可用工時但有負荷者視為達到
    pub fn meets_threshold(&self, threshold: Decimal) -> bool {
        match self.utilization() {
            Some(utilization) => utilization >= threshold,
            None => self.loaded_hours() > Decimal::ZERO,
        }
    }

    pub fn add_load(&mut self, load: CapacityLoad) {
        self.loads.push(load);
    }

    /// 依 ID 取出負荷
    pub fn take_load(&mut self, load_id: Uuid) -> Option<CapacityLoad> {
        let index = self.loads.iter().position(|l| l.id == load_id)?;
        Some(self.loads.remove(index))
    }
}

/// 工作中心產能剖面
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapacityProfile {
    pub work_center_id: String,
    pub periods: Vec<CapacityPeriod>,
}

impl CapacityProfile {
    pub fn new(work_center_id: impl Into<String>, periods: Vec<CapacityPeriod>) -> Self {
        Self {
            work_center_id: work_center_id.into(),
            periods,
        }
    }

    pub fn total_available_hours(&self) -> Decimal {
        self.periods.iter().map(|p| p.available_hours).sum()
    }

    pub fn total_loaded_hours(&self) -> Decimal {
        self.periods.iter().map(CapacityPeriod::loaded_hours).sum()
    }

    pub fn total_overload(&self) -> Decimal {
        self.periods.iter().map(CapacityPeriod::overload).sum()
    }

    /// 整體平均利用率
    pub fn average_utilization(&self) -> Option<Decimal> {
        let available = self.total_available_hours();
        if available > Decimal::ZERO {
            Some(self.total_loaded_hours() / available)
        } else {
            None
        }
    }

    /// 尖峰利用率
    pub fn peak_utilization(&self) -> Option<Decimal> {
        self.periods.iter().filter_map(CapacityPeriod::utilization).max()
    }

    pub fn overloaded_period_count(&self) -> usize {
        self.periods.iter().filter(|p| p.is_overloaded()).count()
    }

    pub fn period_index(&self, date: NaiveDate) -> Option<usize> {
        self.periods.iter().position(|p| p.contains(date))
    }

    pub fn period_for(&self, date: NaiveDate) -> Option<&CapacityPeriod> {
        self.periods.iter().find(|p| p.contains(date))
    }

    pub fn period_for_mut(&mut self, date: NaiveDate) -> Option<&mut CapacityPeriod> {
        self.periods.iter_mut().find(|p| p.contains(date))
    }
}

/// 瓶頸
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bottleneck {
    pub work_center_id: String,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub available_hours: Decimal,
    pub loaded_hours: Decimal,
    pub utilization: Option<Decimal>,
    pub overload: Decimal,
}

impl Bottleneck {
    pub fn from_period(period: &CapacityPeriod) -> Self {
        Self {
            work_center_id: period.work_center_id.clone(),
            period_start: period.start_date,
            period_end: period.end_date,
            available_hours: period.available_hours,
            loaded_hours: period.loaded_hours(),
            utilization: period.utilization(),
            overload: period.overload(),
        }
    }
}

/// 產能問題的處置方式（宣告順序即同分時的最終排序）
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionAction {
    AlternativeWorkCenter,
    Overtime,
    Reschedule,
    Subcontract,
    Split,
}

impl ResolutionAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResolutionAction::AlternativeWorkCenter => "alternative_work_center",
            ResolutionAction::Overtime => "overtime",
            ResolutionAction::Reschedule => "reschedule",
            ResolutionAction::Subcontract => "subcontract",
            ResolutionAction::Split => "split",
        }
    }
}

/// 產能解決建議
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapacityResolutionSuggestion {
    pub action: ResolutionAction,
    /// 瓶頸所在工作中心
    pub work_center_id: String,
    /// 瓶頸期間起日
    pub bottleneck_date: NaiveDate,
    pub hours_resolved: Decimal,
    pub priority: u32,
    pub estimated_cost: Decimal,
    /// 交期影響天數（正值為延後）
    pub lead_time_impact_days: i64,
    pub auto_applicable: bool,
    pub requires_approval: bool,
    /// 目標資源（替代工作中心、外包商）
    pub target_resource: Option<String>,
    /// 目標日期（重排或拆分後的期間起日）
    pub target_date: Option<NaiveDate>,
    /// 受影響的負荷
    pub load_ids: Vec<Uuid>,
    pub description: String,
}
