//! MRP 配置模型

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// 物料MRP參數配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MrpConfig {
    /// 物料ID
    pub product_id: String,

    /// 提前期（天）
    pub lead_time_days: u32,

    /// 補貨方式
    pub replenishment_type: ReplenishmentType,

    /// 批量規則
    pub lot_sizing_rule: LotSizingRule,

    /// 批量規則參數
    #[serde(default)]
    pub lot_sizing: LotSizingParams,

    /// 最小訂購量
    pub minimum_order_qty: Option<Decimal>,

    /// 訂購倍數（必須是此倍數）
    pub order_multiple: Option<Decimal>,

    /// 安全庫存
    pub safety_stock: Decimal,

    /// 是否啟用 MRP（有些物料可能不需要 MRP）
    pub mrp_enabled: bool,
}

impl MrpConfig {
    /// 創建新的 MRP 配置
    pub fn new(product_id: impl Into<String>, lead_time_days: u32, replenishment_type: ReplenishmentType) -> Self {
        Self {
            product_id: product_id.into(),
            lead_time_days,
            replenishment_type,
            lot_sizing_rule: LotSizingRule::LotForLot,
            lot_sizing: LotSizingParams::default(),
            minimum_order_qty: None,
            order_multiple: None,
            safety_stock: Decimal::ZERO,
            mrp_enabled: true,
        }
    }

    /// 建構器模式：設置批量規則
    pub fn with_lot_sizing_rule(mut self, rule: LotSizingRule) -> Self {
        self.lot_sizing_rule = rule;
        self
    }

    /// 建構器模式：設置固定批量（固定訂購量的倍數）
    pub fn with_fixed_lot_size(mut self, size: Decimal) -> Self {
        self.lot_sizing.fixed_lot_size = Some(size);
        self
    }

    /// 建構器模式：設置涵蓋週期數
    pub fn with_periods_of_supply(mut self, periods: u32) -> Self {
        self.lot_sizing.periods_of_supply = Some(periods);
        self
    }

    /// 建構器模式：設置經濟訂購量成本參數
    pub fn with_eoq_costs(mut self, ordering_cost: Decimal, holding_cost: Decimal) -> Self {
        self.lot_sizing.ordering_cost = Some(ordering_cost);
        self.lot_sizing.holding_cost = Some(holding_cost);
        self
    }

    /// 建構器模式：設置年需求量
    pub fn with_annual_demand(mut self, annual_demand: Decimal) -> Self {
        self.lot_sizing.annual_demand = Some(annual_demand);
        self
    }

    /// 建構器模式：設置最小訂購量
    pub fn with_minimum_order_qty(mut self, qty: Decimal) -> Self {
        self.minimum_order_qty = Some(qty);
        self
    }

    /// 建構器模式：設置訂購倍數
    pub fn with_order_multiple(mut self, multiple: Decimal) -> Self {
        self.order_multiple = Some(multiple);
        self
    }

    /// 建構器模式：設置安全庫存
    pub fn with_safety_stock(mut self, stock: Decimal) -> Self {
        self.safety_stock = stock;
        self
    }

    /// 建構器模式：停用 MRP
    pub fn disabled(mut self) -> Self {
        self.mrp_enabled = false;
        self
    }

    /// 調整訂購量以符合最小量與倍數（只會調高）
    pub fn adjust_order_quantity(&self, mut quantity: Decimal) -> Decimal {
        // 應用最小訂購量
        if let Some(min_qty) = self.minimum_order_qty {
            if quantity < min_qty {
                quantity = min_qty;
            }
        }

        // 應用訂購倍數
        if let Some(multiple) = self.order_multiple {
            if multiple > Decimal::ZERO {
                let remainder = quantity % multiple;
                if remainder > Decimal::ZERO {
                    quantity = quantity - remainder + multiple;
                }
            }
        }

        quantity
    }

    /// 檢查是否需要 MRP 計算
    pub fn needs_mrp(&self) -> bool {
        self.mrp_enabled
    }
}

/// 補貨方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplenishmentType {
    /// 採購
    Purchase,
    /// 生產
    Manufacture,
}

/// 批量規則
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LotSizingRule {
    /// 批對批（Lot for Lot）- 按實際需求訂購
    LotForLot,

    /// 固定訂購量（Fixed Order Quantity）- 向上取整到固定批量的倍數
    FixedOrderQuantity,

    /// 週期供應（Periods of Supply）- 一次涵蓋 N 個時間桶的淨需求
    PeriodsOfSupply,

    /// 經濟訂購量（Economic Order Quantity）
    EconomicOrderQuantity,
}

impl LotSizingRule {
    pub fn as_str(&self) -> &'static str {
        match self {
            LotSizingRule::LotForLot => "lot_for_lot",
            LotSizingRule::FixedOrderQuantity => "fixed_order_quantity",
            LotSizingRule::PeriodsOfSupply => "periods_of_supply",
            LotSizingRule::EconomicOrderQuantity => "economic_order_quantity",
        }
    }
}

/// 批量規則參數
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LotSizingParams {
    /// 固定批量
    pub fixed_lot_size: Option<Decimal>,

    /// 涵蓋週期數
    pub periods_of_supply: Option<u32>,

    /// 年需求量（未設定時由時界內淨需求年化）
    pub annual_demand: Option<Decimal>,

    /// 每次訂購成本
    pub ordering_cost: Option<Decimal>,

    /// 每單位年持有成本
    pub holding_cost: Option<Decimal>,
}
