//! 庫存模型

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{MrpError, Result};

/// 庫存狀態
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Inventory {
    /// 物料ID
    pub product_id: String,

    /// 現有庫存
    pub on_hand_qty: Decimal,

    /// 已分配數量（鎖定）
    pub allocated_qty: Decimal,

    /// 倉庫
    pub warehouse_id: Option<String>,
}

impl Inventory {
    /// 創建新的庫存記錄
    pub fn new(product_id: impl Into<String>, on_hand_qty: Decimal) -> Self {
        Self {
            product_id: product_id.into(),
            on_hand_qty,
            allocated_qty: Decimal::ZERO,
            warehouse_id: None,
        }
    }

    /// 建構器模式：設置已分配數量
    pub fn with_allocated_qty(mut self, allocated_qty: Decimal) -> Self {
        self.allocated_qty = allocated_qty;
        self
    }

    /// 建構器模式：設置倉庫
    pub fn with_warehouse_id(mut self, warehouse_id: impl Into<String>) -> Self {
        self.warehouse_id = Some(warehouse_id.into());
        self
    }

    /// 可用庫存（現有 - 已分配）
    pub fn available_qty(&self) -> Decimal {
        self.on_hand_qty - self.allocated_qty
    }

    /// 檢查庫存是否低於安全庫存
    pub fn is_below(&self, safety_stock: Decimal) -> bool {
        self.available_qty() < safety_stock
    }

    /// 分配庫存
    pub fn allocate(&mut self, quantity: Decimal) -> Result<()> {
        if quantity > self.available_qty() {
            return Err(MrpError::InvalidQuantity(format!(
                "庫存不足：需要 {}, 可用 {}",
                quantity,
                self.available_qty()
            )));
        }
        self.allocated_qty += quantity;
        Ok(())
    }

    /// 釋放已分配的庫存
    pub fn deallocate(&mut self, quantity: Decimal) -> Result<()> {
        if quantity > self.allocated_qty {
            return Err(MrpError::InvalidQuantity(format!(
                "釋放數量超過已分配數量：釋放 {}, 已分配 {}",
                quantity, self.allocated_qty
            )));
        }
        self.allocated_qty -= quantity;
        Ok(())
    }
}
