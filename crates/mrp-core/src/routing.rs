//! 途程（Routing）模型

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Effectivity, MrpError, Result};

/// 每小時分鐘數
const MINUTES_PER_HOUR: Decimal = Decimal::from_parts(60, 0, 0, false, 0);

/// 工序類型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OperationType {
    /// 生產
    Production,
    /// 檢驗
    Inspection,
    /// 拆解
    Teardown,
    /// 委外（在供應商處加工，不佔用本廠工作中心）
    Subcontract,
    /// 純等候
    Queue,
    /// 純搬運
    Move,
}

impl OperationType {
    /// 是否佔用工作中心產能
    pub fn consumes_capacity(&self) -> bool {
        matches!(
            self,
            OperationType::Production | OperationType::Inspection | OperationType::Teardown
        )
    }
}

/// 工序
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    /// 工序序號
    pub sequence: u32,

    pub work_center_id: String,

    pub operation_type: OperationType,

    /// 準備時間（分鐘）
    pub setup_time_minutes: Decimal,

    /// 單位加工時間（分鐘）
    pub run_time_minutes: Decimal,

    /// 等候時間（分鐘）
    pub queue_time_minutes: Decimal,

    /// 搬運時間（分鐘）
    pub move_time_minutes: Decimal,

    /// 並行資源數
    pub resource_count: u32,

    /// 與下一工序的重疊百分比（0-100）
    pub overlap_percentage: Decimal,

    pub subcontractor_id: Option<String>,

    /// 委外單位成本
    pub subcontract_cost: Option<Decimal>,
}

impl Operation {
    /// 創建新的生產工序
    pub fn new(
        sequence: u32,
        work_center_id: impl Into<String>,
        setup_time_minutes: Decimal,
        run_time_minutes: Decimal,
    ) -> Self {
        Self {
            sequence,
            work_center_id: work_center_id.into(),
            operation_type: OperationType::Production,
            setup_time_minutes,
            run_time_minutes,
            queue_time_minutes: Decimal::ZERO,
            move_time_minutes: Decimal::ZERO,
            resource_count: 1,
            overlap_percentage: Decimal::ZERO,
            subcontractor_id: None,
            subcontract_cost: None,
        }
    }

    /// 建構器模式：設置工序類型
    pub fn with_type(mut self, operation_type: OperationType) -> Self {
        self.operation_type = operation_type;
        self
    }

    /// 建構器模式：設置等候與搬運時間
    pub fn with_queue_and_move(mut self, queue_minutes: Decimal, move_minutes: Decimal) -> Self {
        self.queue_time_minutes = queue_minutes;
        self.move_time_minutes = move_minutes;
        self
    }

    /// 建構器模式：設置重疊百分比
    pub fn with_overlap(mut self, overlap_percentage: Decimal) -> Self {
        self.overlap_percentage = overlap_percentage;
        self
    }

    /// 建構器模式：設置並行資源數
    pub fn with_resource_count(mut self, resource_count: u32) -> Self {
        self.resource_count = resource_count.max(1);
        self
    }

    /// 建構器模式：設置委外商與成本
    pub fn with_subcontractor(mut self, subcontractor_id: impl Into<String>, unit_cost: Decimal) -> Self {
        self.operation_type = OperationType::Subcontract;
        self.subcontractor_id = Some(subcontractor_id.into());
        self.subcontract_cost = Some(unit_cost);
        self
    }

    /// 準備工時（小時）
    pub fn setup_hours(&self) -> Decimal {
        if self.operation_type.consumes_capacity() {
            self.setup_time_minutes / MINUTES_PER_HOUR
        } else {
            Decimal::ZERO
        }
    }

    /// 加工工時（小時）
    pub fn run_hours(&self, quantity: Decimal) -> Decimal {
        if self.operation_type.consumes_capacity() {
            self.run_time_minutes * quantity / MINUTES_PER_HOUR
        } else {
            Decimal::ZERO
        }
    }

    /// 產能需求 `(setup + run × qty) / 60`
    pub fn capacity_hours(&self, quantity: Decimal) -> Decimal {
        self.setup_hours() + self.run_hours(quantity)
    }

    /// 工序加工經過時間（分鐘），並行資源分攤加工時間
    pub fn processing_minutes(&self, quantity: Decimal) -> Decimal {
        let resources = Decimal::from(self.resource_count.max(1));
        self.setup_time_minutes + self.run_time_minutes * quantity / resources
    }
}

/// 途程狀態
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoutingStatus {
    Draft,
    Released,
    Obsolete,
}

/// 途程
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Routing {
    pub id: Uuid,
    pub product_id: String,
    pub code: String,
    pub version: u32,
    /// 依序號排序的工序
    pub operations: Vec<Operation>,
    pub effectivity: Effectivity,
    pub status: RoutingStatus,
}

impl Routing {
    pub fn new(product_id: impl Into<String>, code: impl Into<String>, version: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            product_id: product_id.into(),
            code: code.into(),
            version,
            operations: Vec::new(),
            effectivity: Effectivity::always(),
            status: RoutingStatus::Draft,
        }
    }

    /// 建構器模式：添加工序（保持序號排序）
    pub fn with_operation(mut self, operation: Operation) -> Self {
        self.operations.push(operation);
        self.operations.sort_by_key(|op| op.sequence);
        self
    }

    pub fn with_effectivity(mut self, effectivity: Effectivity) -> Self {
        self.effectivity = effectivity;
        self
    }

    pub fn released(mut self) -> Self {
        self.status = RoutingStatus::Released;
        self
    }

    /// 發行途程（草稿 → 已發行）
    pub fn release(&mut self) -> Result<()> {
        match self.status {
            RoutingStatus::Draft => {
                if self.operations.is_empty() {
                    return Err(MrpError::InvalidQuantity(format!("途程 {} 沒有工序", self.code)));
                }
                self.status = RoutingStatus::Released;
                Ok(())
            }
            other => Err(MrpError::invalid_status(
                format!("途程 {} v{}", self.code, self.version),
                other,
                "release",
            )),
        }
    }

    /// 作廢途程
    pub fn obsolete(&mut self) -> Result<()> {
        match self.status {
            RoutingStatus::Draft | RoutingStatus::Released => {
                self.status = RoutingStatus::Obsolete;
                Ok(())
            }
            RoutingStatus::Obsolete => Err(MrpError::invalid_status(
                format!("途程 {} v{}", self.code, self.version),
                self.status,
                "obsolete",
            )),
        }
    }

    pub fn is_effective_on(&self, date: NaiveDate) -> bool {
        self.status == RoutingStatus::Released && self.effectivity.contains(date)
    }

    /// 依序號查找工序
    pub fn operation(&self, sequence: u32) -> Option<&Operation> {
        self.operations.iter().find(|op| op.sequence == sequence)
    }

    /// 總工時（小時），不受重疊影響
    pub fn total_capacity_hours(&self, quantity: Decimal) -> Decimal {
        self.operations.iter().map(|op| op.capacity_hours(quantity)).sum()
    }
}
