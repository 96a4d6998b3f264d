//! 供應模型（預計收貨）

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 供應類型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SupplyType {
    /// 採購訂單
    PurchaseOrder,
    /// 生產工單
    WorkOrder,
    /// 調撥在途
    Transfer,
}

/// 預計收貨
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Supply {
    /// 供應ID
    pub id: Uuid,

    /// 物料ID
    pub product_id: String,

    /// 供應數量
    pub quantity: Decimal,

    /// 可用日期
    pub available_date: NaiveDate,

    /// 供應類型
    pub supply_type: SupplyType,

    /// 來源單據
    pub source_ref: Option<String>,

    /// 是否已確認（確認的訂單不會被 MRP 修改）
    pub is_firm: bool,
}

impl Supply {
    /// 創建新的供應
    pub fn new(
        product_id: impl Into<String>,
        quantity: Decimal,
        available_date: NaiveDate,
        supply_type: SupplyType,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            product_id: product_id.into(),
            quantity,
            available_date,
            supply_type,
            source_ref: None,
            is_firm: true,
        }
    }

    /// 建構器模式：設置來源單據
    pub fn with_source_ref(mut self, source_ref: impl Into<String>) -> Self {
        self.source_ref = Some(source_ref.into());
        self
    }

    /// 建構器模式：設置為未確認
    pub fn as_tentative(mut self) -> Self {
        self.is_firm = false;
        self
    }

    /// 可用日期是否不晚於指定日
    pub fn is_available_by(&self, date: NaiveDate) -> bool {
        self.available_date <= date
    }
}
