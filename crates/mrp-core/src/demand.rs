//! 需求模型

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 需求類型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DemandType {
    /// 銷售訂單
    SalesOrder,
    /// 銷售預測
    Forecast,
    /// 相依需求（BOM展開）
    Dependent,
}

/// 需求
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Demand {
    /// 需求ID
    pub id: Uuid,

    /// 物料ID
    pub product_id: String,

    /// 需求數量
    pub quantity: Decimal,

    /// 需求日期
    pub required_date: NaiveDate,

    /// 需求類型
    pub demand_type: DemandType,

    /// 來源單據（如銷售訂單號）
    pub source_ref: Option<String>,

    /// 相依需求的父件
    pub parent_product_id: Option<String>,

    /// 相依需求的來源計劃訂單
    pub source_order_id: Option<Uuid>,

    /// BOM 層級（0 = 最上層）
    pub bom_level: u32,

    /// 優先級（1-10，10最高）
    pub priority: u8,
}

impl Demand {
    /// 創建新的需求
    pub fn new(
        product_id: impl Into<String>,
        quantity: Decimal,
        required_date: NaiveDate,
        demand_type: DemandType,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            product_id: product_id.into(),
            quantity,
            required_date,
            demand_type,
            source_ref: None,
            parent_product_id: None,
            source_order_id: None,
            bom_level: 0,
            priority: 5,
        }
    }

    /// 創建由父件計劃訂單展開的相依需求
    pub fn dependent(
        product_id: impl Into<String>,
        quantity: Decimal,
        required_date: NaiveDate,
        parent_product_id: impl Into<String>,
        source_order_id: Uuid,
        bom_level: u32,
    ) -> Self {
        let mut demand = Self::new(product_id, quantity, required_date, DemandType::Dependent);
        demand.parent_product_id = Some(parent_product_id.into());
        demand.source_order_id = Some(source_order_id);
        demand.bom_level = bom_level;
        demand
    }

    /// 建構器模式：設置來源單據
    pub fn with_source_ref(mut self, source_ref: impl Into<String>) -> Self {
        self.source_ref = Some(source_ref.into());
        self
    }

    /// 建構器模式：設置優先級
    pub fn with_priority(mut self, priority: u8) -> Self {
        self.priority = priority.min(10);
        self
    }

    /// 檢查是否為獨立需求
    pub fn is_independent(&self) -> bool {
        matches!(self.demand_type, DemandType::SalesOrder | DemandType::Forecast)
    }

    /// 檢查是否為相依需求
    pub fn is_dependent(&self) -> bool {
        self.demand_type == DemandType::Dependent
    }

    /// 是否為確定需求（非預測）
    pub fn is_firm(&self) -> bool {
        self.demand_type != DemandType::Forecast
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_demand() {
        let demand = Demand::new(
            "BIKE-001",
            Decimal::from(100),
            NaiveDate::from_ymd_opt(2025, 11, 1).unwrap(),
            DemandType::SalesOrder,
        );

        assert_eq!(demand.product_id, "BIKE-001");
        assert_eq!(demand.quantity, Decimal::from(100));
        assert_eq!(demand.priority, 5);
        assert!(demand.is_independent());
        assert!(demand.is_firm());
    }

    #[test]
    fn test_dependent_demand() {
        let order_id = Uuid::new_v4();
        let demand = Demand::dependent(
            "FRAME-001",
            Decimal::from(50),
            NaiveDate::from_ymd_opt(2025, 11, 5).unwrap(),
            "BIKE-001",
            order_id,
            1,
        )
        .with_source_ref("SO-12345")
        .with_priority(12);

        assert!(demand.is_dependent());
        assert_eq!(demand.parent_product_id.as_deref(), Some("BIKE-001"));
        assert_eq!(demand.source_order_id, Some(order_id));
        assert_eq!(demand.bom_level, 1);
        assert_eq!(demand.priority, 10);
    }
}
