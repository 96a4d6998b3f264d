//! 批量規則實現
//!
//! 每個規則實作 [`LotSizingStrategy`]；[`LotSizingPolicy`] 是依 [`MrpConfig`] 建出的封閉列舉，
//! 負責參數檢查與分派。最小訂購量與倍數在規則之後由 [`MrpConfig::adjust_order_quantity`] 套用。

use mrp_core::{LotSizingRule, MrpConfig, MrpError, Result};
use rust_decimal::{Decimal, MathematicalOps};

/// 批量計算所需的情境
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LotSizingContext {
    /// 涵蓋期間內後續桶的淨需求合計（週期供應使用）
    pub window_net: Decimal,
    /// 時界內毛需求年化（EOQ 未設定年需求時使用）
    pub annualized_demand: Decimal,
}

/// 批量策略
pub trait LotSizingStrategy {
    /// 由淨需求計算訂購量（尚未套用最小量與倍數）
    fn order_quantity(&self, net_requirement: Decimal, context: &LotSizingContext) -> Decimal;
}

/// 批對批：訂購量 = 淨需求
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LotForLot;

impl LotSizingStrategy for LotForLot {
    fn order_quantity(&self, net_requirement: Decimal, _context: &LotSizingContext) -> Decimal {
        net_requirement
    }
}

/// 固定訂購量：向上取整到批量的倍數
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedOrderQuantity {
    pub lot_size: Decimal,
}

impl LotSizingStrategy for FixedOrderQuantity {
    fn order_quantity(&self, net_requirement: Decimal, _context: &LotSizingContext) -> Decimal {
        let batches = (net_requirement / self.lot_size).ceil();
        (batches * self.lot_size).max(self.lot_size)
    }
}

/// 週期供應：一張單涵蓋本桶起 N 個桶的淨需求
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeriodsOfSupply {
    pub periods: u32,
}

impl LotSizingStrategy for PeriodsOfSupply {
    fn order_quantity(&self, net_requirement: Decimal, context: &LotSizingContext) -> Decimal {
        net_requirement + context.window_net
    }
}

/// 經濟訂購量：EOQ = √(2DS / H)，訂購量取 max(淨需求, EOQ)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EconomicOrderQuantity {
    pub ordering_cost: Decimal,
    pub holding_cost: Decimal,
    pub annual_demand: Option<Decimal>,
}

impl EconomicOrderQuantity {
    pub fn eoq(&self, annual_demand: Decimal) -> Decimal {
        let ratio = Decimal::TWO * annual_demand * self.ordering_cost / self.holding_cost;
        ratio.sqrt().unwrap_or(Decimal::ZERO)
    }
}

impl LotSizingStrategy for EconomicOrderQuantity {
    fn order_quantity(&self, net_requirement: Decimal, context: &LotSizingContext) -> Decimal {
        let demand = self.annual_demand.unwrap_or(context.annualized_demand);
        net_requirement.max(self.eoq(demand))
    }
}

/// 批量政策
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LotSizingPolicy {
    LotForLot(LotForLot),
    FixedOrderQuantity(FixedOrderQuantity),
    PeriodsOfSupply(PeriodsOfSupply),
    EconomicOrderQuantity(EconomicOrderQuantity),
}

impl LotSizingPolicy {
    /// 依物料配置建立政策，缺少必要參數時回報 [`MrpError::MissingLotSize`]
    pub fn from_config(config: &MrpConfig) -> Result<Self> {
        let params = &config.lot_sizing;
        let missing = || MrpError::MissingLotSize {
            product_id: config.product_id.clone(),
            rule: config.lot_sizing_rule.as_str().to_string(),
        };

        let policy = match config.lot_sizing_rule {
            LotSizingRule::LotForLot => LotSizingPolicy::LotForLot(LotForLot),
            LotSizingRule::FixedOrderQuantity => {
                let lot_size = params.fixed_lot_size.filter(|q| *q > Decimal::ZERO).ok_or_else(missing)?;
                LotSizingPolicy::FixedOrderQuantity(FixedOrderQuantity { lot_size })
            }
            LotSizingRule::PeriodsOfSupply => {
                let periods = params.periods_of_supply.filter(|p| *p > 0).ok_or_else(missing)?;
                LotSizingPolicy::PeriodsOfSupply(PeriodsOfSupply { periods })
            }
            LotSizingRule::EconomicOrderQuantity => {
                let ordering_cost = params.ordering_cost.filter(|c| *c >= Decimal::ZERO).ok_or_else(missing)?;
                let holding_cost = params.holding_cost.filter(|c| *c > Decimal::ZERO).ok_or_else(missing)?;
                LotSizingPolicy::EconomicOrderQuantity(EconomicOrderQuantity {
                    ordering_cost,
                    holding_cost,
                    annual_demand: params.annual_demand,
                })
            }
        };

        Ok(policy)
    }

    pub fn rule(&self) -> LotSizingRule {
        match self {
            LotSizingPolicy::LotForLot(_) => LotSizingRule::LotForLot,
            LotSizingPolicy::FixedOrderQuantity(_) => LotSizingRule::FixedOrderQuantity,
            LotSizingPolicy::PeriodsOfSupply(_) => LotSizingRule::PeriodsOfSupply,
            LotSizingPolicy::EconomicOrderQuantity(_) => LotSizingRule::EconomicOrderQuantity,
        }
    }

    /// 週期供應涵蓋的桶數
    pub fn periods_of_supply(&self) -> Option<u32> {
        match self {
            LotSizingPolicy::PeriodsOfSupply(p) => Some(p.periods),
            _ => None,
        }
    }

    fn strategy(&self) -> &dyn LotSizingStrategy {
        match self {
            LotSizingPolicy::LotForLot(s) => s,
            LotSizingPolicy::FixedOrderQuantity(s) => s,
            LotSizingPolicy::PeriodsOfSupply(s) => s,
            LotSizingPolicy::EconomicOrderQuantity(s) => s,
        }
    }

    /// 應用批量規則與訂購修正；淨需求為 0 時不下單
    pub fn apply(&self, net_requirement: Decimal, context: &LotSizingContext, config: &MrpConfig) -> Decimal {
        if net_requirement <= Decimal::ZERO {
            return Decimal::ZERO;
        }
        let quantity = self.strategy().order_quantity(net_requirement, context);
        config.adjust_order_quantity(quantity).max(net_requirement)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mrp_core::ReplenishmentType;
    use rstest::rstest;

    fn config(rule: LotSizingRule) -> MrpConfig {
        MrpConfig::new("P", 5, ReplenishmentType::Purchase).with_lot_sizing_rule(rule)
    }

    #[test]
    fn test_lot_for_lot_is_exact() {
        let config = config(LotSizingRule::LotForLot);
        let policy = LotSizingPolicy::from_config(&config).unwrap();
        let qty = policy.apply(Decimal::new(1234, 1), &LotSizingContext::default(), &config);
        assert_eq!(qty, Decimal::new(1234, 1));
    }

    #[rstest]
    #[case(90, 50, 100)]
    #[case(100, 50, 100)]
    #[case(101, 50, 150)]
    #[case(1, 50, 50)]
    fn test_fixed_order_quantity(#[case] net: i64, #[case] lot: i64, #[case] expected: i64) {
        let config = config(LotSizingRule::FixedOrderQuantity).with_fixed_lot_size(Decimal::from(lot));
        let policy = LotSizingPolicy::from_config(&config).unwrap();
        let qty = policy.apply(Decimal::from(net), &LotSizingContext::default(), &config);
        assert_eq!(qty, Decimal::from(expected));
    }

    #[test]
    fn test_periods_of_supply_adds_window() {
        let config = config(LotSizingRule::PeriodsOfSupply).with_periods_of_supply(3);
        let policy = LotSizingPolicy::from_config(&config).unwrap();
        assert_eq!(policy.periods_of_supply(), Some(3));

        let context = LotSizingContext {
            window_net: Decimal::from(70),
            ..Default::default()
        };
        assert_eq!(policy.apply(Decimal::from(30), &context, &config), Decimal::from(100));
    }

    #[test]
    fn test_eoq_formula() {
        // √(2 × 1000 × 50 / 4) = √25000 ≈ 158.11
        let config = config(LotSizingRule::EconomicOrderQuantity)
            .with_eoq_costs(Decimal::from(50), Decimal::from(4))
            .with_annual_demand(Decimal::from(1000));
        let policy = LotSizingPolicy::from_config(&config).unwrap();

        let qty = policy.apply(Decimal::from(40), &LotSizingContext::default(), &config);
        assert_eq!(qty.round_dp(2), Decimal::new(15811, 2));

        // 淨需求大於 EOQ 時以淨需求為準
        let qty = policy.apply(Decimal::from(500), &LotSizingContext::default(), &config);
        assert_eq!(qty, Decimal::from(500));
    }

    #[test]
    fn test_eoq_uses_annualized_demand() {
        let config = config(LotSizingRule::EconomicOrderQuantity).with_eoq_costs(Decimal::from(8), Decimal::ONE);
        let policy = LotSizingPolicy::from_config(&config).unwrap();
        let context = LotSizingContext {
            annualized_demand: Decimal::from(100),
            ..Default::default()
        };
        // √(2 × 100 × 8 / 1) = 40
        assert_eq!(policy.apply(Decimal::from(10), &context, &config).round_dp(6), Decimal::from(40));
    }

    #[rstest]
    #[case(LotSizingRule::FixedOrderQuantity)]
    #[case(LotSizingRule::PeriodsOfSupply)]
    #[case(LotSizingRule::EconomicOrderQuantity)]
    fn test_missing_parameters(#[case] rule: LotSizingRule) {
        let err = LotSizingPolicy::from_config(&config(rule)).unwrap_err();
        assert!(matches!(err, MrpError::MissingLotSize { .. }));
    }

    #[test]
    fn test_modifiers_after_strategy() {
        let config = config(LotSizingRule::LotForLot)
            .with_minimum_order_qty(Decimal::from(25))
            .with_order_multiple(Decimal::from(10));
        let policy = LotSizingPolicy::from_config(&config).unwrap();

        assert_eq!(policy.apply(Decimal::from(7), &LotSizingContext::default(), &config), Decimal::from(30));
        assert_eq!(policy.apply(Decimal::from(41), &LotSizingContext::default(), &config), Decimal::from(50));
        assert_eq!(policy.apply(Decimal::ZERO, &LotSizingContext::default(), &config), Decimal::ZERO);
    }
}
