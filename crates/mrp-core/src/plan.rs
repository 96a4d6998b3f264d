//! 計劃訂單模型

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{LotSizingRule, PlanningZone, ReplenishmentType};

/// 計劃訂單類型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlannedOrderType {
    /// 採購
    Purchase,
    /// 生產
    Manufacturing,
}

impl From<ReplenishmentType> for PlannedOrderType {
    fn from(value: ReplenishmentType) -> Self {
        match value {
            ReplenishmentType::Purchase => PlannedOrderType::Purchase,
            ReplenishmentType::Manufacture => PlannedOrderType::Manufacturing,
        }
    }
}

/// 物料需求（MRP 逐桶計算記錄）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialRequirement {
    pub product_id: String,
    pub gross_requirement: Decimal,
    pub net_requirement: Decimal,
    /// 需求日
    pub required_date: NaiveDate,
    /// 下單日（需求日 − 提前期）
    pub order_date: NaiveDate,
    /// 進入該桶時的預計在庫（含安全庫存）
    pub on_hand: Decimal,
    /// 該桶預計收貨
    pub scheduled_receipts: Decimal,
    pub safety_stock: Decimal,
    /// BOM 層級（0 = 最上層）
    pub bom_level: u32,
    pub parent_product_id: Option<String>,
    /// 產生此需求的父件計劃訂單
    pub source_order_id: Option<Uuid>,
}

impl MaterialRequirement {
    /// 可用量 = 在庫 + 預計收貨 − 安全庫存
    pub fn available(&self) -> Decimal {
        self.on_hand + self.scheduled_receipts - self.safety_stock
    }

    /// 依公式重算的淨需求（用於稽核）
    pub fn expected_net_requirement(&self) -> Decimal {
        (self.gross_requirement - self.available()).max(Decimal::ZERO)
    }
}

/// 計劃訂單（MRP計算結果）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannedOrder {
    /// 計劃訂單ID
    pub id: Uuid,

    /// 物料ID
    pub product_id: String,

    /// 計劃數量（批量調整後）
    pub quantity: Decimal,

    /// 開始日期（下單日）
    pub start_date: NaiveDate,

    /// 到期日期（需求日）
    pub due_date: NaiveDate,

    /// 訂單類型
    pub order_type: PlannedOrderType,

    /// BOM 層級
    pub bom_level: u32,

    /// 使用的批量規則
    pub lot_sizing_rule: LotSizingRule,

    /// 批量調整前的原始淨需求
    pub original_requirement: Decimal,

    /// 子件物料需求
    pub material_requirements: Vec<MaterialRequirement>,

    /// 開始日所屬時區
    pub zone: PlanningZone,

    /// 開始日早於計劃基準日（需催料）
    pub is_past_due: bool,

    /// 需求來源（銷售訂單號或父件計劃訂單）
    pub source_ref: Option<String>,
}

impl PlannedOrder {
    /// 創建新的計劃訂單
    pub fn new(
        product_id: impl Into<String>,
        quantity: Decimal,
        start_date: NaiveDate,
        due_date: NaiveDate,
        order_type: PlannedOrderType,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            product_id: product_id.into(),
            quantity,
            start_date,
            due_date,
            order_type,
            bom_level: 0,
            lot_sizing_rule: LotSizingRule::LotForLot,
            original_requirement: quantity,
            material_requirements: Vec::new(),
            zone: PlanningZone::Liquid,
            is_past_due: false,
            source_ref: None,
        }
    }

    /// 建構器模式：設置批量資訊
    pub fn with_lot_sizing(mut self, rule: LotSizingRule, original_requirement: Decimal) -> Self {
        self.lot_sizing_rule = rule;
        self.original_requirement = original_requirement;
        self
    }

    /// 建構器模式：設置 BOM 層級
    pub fn with_bom_level(mut self, bom_level: u32) -> Self {
        self.bom_level = bom_level;
        self
    }

    /// 建構器模式：設置來源
    pub fn with_source_ref(mut self, source_ref: impl Into<String>) -> Self {
        self.source_ref = Some(source_ref.into());
        self
    }

    /// 建構器模式：設置時區
    pub fn with_zone(mut self, zone: PlanningZone) -> Self {
        self.zone = zone;
        self
    }

    /// 建構器模式：標記過期
    pub fn with_past_due(mut self, is_past_due: bool) -> Self {
        self.is_past_due = is_past_due;
        self
    }

    /// 批量調整造成的超額數量
    pub fn excess_quantity(&self) -> Decimal {
        (self.quantity - self.original_requirement).max(Decimal::ZERO)
    }

    /// 計算提前期（天數）
    pub fn lead_time_days(&self) -> i64 {
        (self.due_date - self.start_date).num_days()
    }

    /// 檢查是否為採購訂單
    pub fn is_purchase(&self) -> bool {
        self.order_type == PlannedOrderType::Purchase
    }

    /// 檢查是否為生產訂單
    pub fn is_manufacturing(&self) -> bool {
        self.order_type == PlannedOrderType::Manufacturing
    }

    /// 以新的開始日重排，保持提前期（產生新值，不修改原訂單）
    pub fn rescheduled(&self, new_start: NaiveDate, zone: PlanningZone) -> Self {
        let shift = new_start - self.start_date;
        let mut order = self.clone();
        order.start_date = new_start;
        order.due_date = self.due_date + shift;
        order.zone = zone;
        order
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_planned_order() {
        let order = PlannedOrder::new(
            "BIKE-001",
            Decimal::from(100),
            NaiveDate::from_ymd_opt(2025, 10, 25).unwrap(),
            NaiveDate::from_ymd_opt(2025, 11, 1).unwrap(),
            PlannedOrderType::Manufacturing,
        );

        assert_eq!(order.product_id, "BIKE-001");
        assert_eq!(order.quantity, Decimal::from(100));
        assert_eq!(order.lead_time_days(), 7);
        assert!(order.is_manufacturing());
        assert!(!order.is_purchase());
        assert_eq!(order.excess_quantity(), Decimal::ZERO);
    }

    #[test]
    fn test_excess_quantity() {
        let order = PlannedOrder::new(
            "FRAME-001",
            Decimal::from(100),
            NaiveDate::from_ymd_opt(2025, 10, 20).unwrap(),
            NaiveDate::from_ymd_opt(2025, 10, 28).unwrap(),
            PlannedOrderType::Purchase,
        )
        .with_lot_sizing(LotSizingRule::FixedOrderQuantity, Decimal::from(90));

        assert_eq!(order.excess_quantity(), Decimal::from(10));
    }

    #[test]
    fn test_rescheduled_keeps_lead_time() {
        let order = PlannedOrder::new(
            "FRAME-001",
            Decimal::from(10),
            NaiveDate::from_ymd_opt(2025, 10, 20).unwrap(),
            NaiveDate::from_ymd_opt(2025, 10, 28).unwrap(),
            PlannedOrderType::Manufacturing,
        );
        let moved = order.rescheduled(NaiveDate::from_ymd_opt(2025, 10, 23).unwrap(), PlanningZone::Slushy);

        assert_eq!(moved.id, order.id);
        assert_eq!(moved.due_date, NaiveDate::from_ymd_opt(2025, 10, 31).unwrap());
        assert_eq!(moved.lead_time_days(), order.lead_time_days());
        assert_eq!(order.start_date, NaiveDate::from_ymd_opt(2025, 10, 20).unwrap());
    }

    #[test]
    fn test_material_requirement_netting_formula() {
        let req = MaterialRequirement {
            product_id: "P".to_string(),
            gross_requirement: Decimal::from(100),
            net_requirement: Decimal::from(90),
            required_date: NaiveDate::from_ymd_opt(2025, 11, 21).unwrap(),
            order_date: NaiveDate::from_ymd_opt(2025, 11, 16).unwrap(),
            on_hand: Decimal::from(20),
            scheduled_receipts: Decimal::ZERO,
            safety_stock: Decimal::from(10),
            bom_level: 0,
            parent_product_id: None,
            source_order_id: None,
        };

        assert_eq!(req.available(), Decimal::from(10));
        assert_eq!(req.expected_net_requirement(), req.net_requirement);
    }
}
