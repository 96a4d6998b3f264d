//! 確定工單（已承諾的產能負荷來源）

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{MrpError, Result};

/// 工單狀態
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorkOrderStatus {
    Planned,
    Released,
    InProgress,
    Completed,
    Cancelled,
}

/// 工單
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkOrder {
    pub id: Uuid,
    pub number: String,
    pub product_id: String,
    pub quantity: Decimal,
    /// 已承諾的開工日
    pub start_date: NaiveDate,
    pub due_date: NaiveDate,
    pub status: WorkOrderStatus,
}

impl WorkOrder {
    pub fn new(
        number: impl Into<String>,
        product_id: impl Into<String>,
        quantity: Decimal,
        start_date: NaiveDate,
        due_date: NaiveDate,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            number: number.into(),
            product_id: product_id.into(),
            quantity,
            start_date,
            due_date,
            status: WorkOrderStatus::Planned,
        }
    }

    fn transition(&mut self, allowed: &[WorkOrderStatus], next: WorkOrderStatus, action: &str) -> Result<()> {
        if allowed.contains(&self.status) {
            self.status = next;
            Ok(())
        } else {
            Err(MrpError::invalid_status(format!("工單 {}", self.number), self.status, action))
        }
    }

    /// 下達
    pub fn release(&mut self) -> Result<()> {
        self.transition(&[WorkOrderStatus::Planned], WorkOrderStatus::Released, "release")
    }

    /// 開工
    pub fn start(&mut self) -> Result<()> {
        self.transition(&[WorkOrderStatus::Released], WorkOrderStatus::InProgress, "start")
    }

    /// 完工
    pub fn complete(&mut self) -> Result<()> {
        self.transition(&[WorkOrderStatus::InProgress], WorkOrderStatus::Completed, "complete")
    }

    /// 取消（僅限尚未開工）
    pub fn cancel(&mut self) -> Result<()> {
        self.transition(
            &[WorkOrderStatus::Planned, WorkOrderStatus::Released],
            WorkOrderStatus::Cancelled,
            "cancel",
        )
    }

    /// 是否仍佔用產能
    pub fn carries_load(&self) -> bool {
        matches!(
            self.status,
            WorkOrderStatus::Planned | WorkOrderStatus::Released | WorkOrderStatus::InProgress
        )
    }
}
