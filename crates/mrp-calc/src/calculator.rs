//! MRP 主計算器（單一物料的淨算、批量、提前期與單階展開）
//!
//! 計算器不直接遞迴：製造訂單展開出的子件需求以相依需求回傳，
//! 由 [`MrpEngine`](crate::MrpEngine) 依最低階碼分波送進子件的下一次計算。

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use mrp_core::{
    Demand, EngineSettings, InventoryProvider, MaterialRequirement, MrpConfig, MrpError, PlannedOrder,
    PlannedOrderType, PlanningHorizon, Result, StructureStore, WorkCalendar,
};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::bucketing::{BucketPosition, TimeBuckets};
use crate::explosion::BomExplosion;
use crate::lead_time::LeadTimeCalculator;
use crate::lot_sizing::{LotSizingContext, LotSizingPolicy};
use crate::netting::SupplyLedger;
use crate::{MrpResult, MrpWarning, WarningKind};

/// 單一物料在一次批次中的計算狀態
///
/// 每一波只有一個執行緒持有並寫入它的供應帳。
#[derive(Debug)]
pub struct ProductState {
    pub product_id: String,
    /// 最低階碼（計算波次）
    pub level: u32,
    pub config: MrpConfig,
    pub ledger: SupplyLedger,
    pub result: MrpResult,
    /// 尚未淨算的需求（依到達順序）
    pub pending: Vec<Demand>,
    /// 所有曾送需求進來的上層物料
    pub ancestors: BTreeSet<String>,
    /// 第一條到達此物料的路徑（不含自身）
    pub path: Vec<String>,
    routing_checked: bool,
    halted: bool,
}

impl ProductState {
    /// 發生錯誤後不再計算
    pub fn is_halted(&self) -> bool {
        self.halted
    }

    /// 記錄致命錯誤並停止此物料後續的計算
    pub fn halt(&mut self, error: MrpError) {
        tracing::warn!("物料 {} 計算中止: {}", self.product_id, error);
        self.result.add_error(error);
        self.halted = true;
    }

    fn record_error(&mut self, error: MrpError) {
        if !self.result.errors.contains(&error) {
            tracing::warn!("物料 {}: {}", self.product_id, error);
            self.result.add_error(error);
        }
    }
}

/// 同一桶內彙總的毛需求
#[derive(Debug, Clone)]
struct BucketDemand {
    gross: Decimal,
    required_date: NaiveDate,
    bom_level: u32,
    parent_product_id: Option<String>,
    source_order_id: Option<Uuid>,
    source_ref: Option<String>,
    mixed_sources: bool,
}

impl BucketDemand {
    fn from_demand(demand: &Demand) -> Self {
        Self {
            gross: demand.quantity,
            required_date: demand.required_date,
            bom_level: demand.bom_level,
            parent_product_id: demand.parent_product_id.clone(),
            source_order_id: demand.source_order_id,
            source_ref: demand.source_ref.clone(),
            mixed_sources: false,
        }
    }

    fn add(&mut self, demand: &Demand) {
        self.gross += demand.quantity;
        self.required_date = self.required_date.min(demand.required_date);
        self.bom_level = self.bom_level.max(demand.bom_level);
        if self.source_order_id != demand.source_order_id || self.parent_product_id != demand.parent_product_id {
            self.mixed_sources = true;
        }
        if self.source_ref.is_none() {
            self.source_ref = demand.source_ref.clone();
        }
    }

    fn parent(&self) -> (Option<String>, Option<Uuid>) {
        if self.mixed_sources {
            (None, None)
        } else {
            (self.parent_product_id.clone(), self.source_order_id)
        }
    }
}

/// MRP 計算器
pub struct MrpCalculator<'a> {
    structures: &'a dyn StructureStore,
    explosion: BomExplosion<'a>,
    horizon: &'a PlanningHorizon,
    buckets: TimeBuckets,
    settings: &'a EngineSettings,
    calendar: &'a WorkCalendar,
}

impl<'a> MrpCalculator<'a> {
    /// 創建新的 MRP 計算器
    pub fn new(
        structures: &'a dyn StructureStore,
        horizon: &'a PlanningHorizon,
        settings: &'a EngineSettings,
        calendar: &'a WorkCalendar,
    ) -> Result<Self> {
        Ok(Self {
            structures,
            explosion: BomExplosion::new(structures),
            horizon,
            buckets: TimeBuckets::from_horizon(horizon)?,
            settings,
            calendar,
        })
    }

    pub fn buckets(&self) -> &TimeBuckets {
        &self.buckets
    }

    /// 過期判斷基準日
    pub fn as_of(&self) -> NaiveDate {
        self.settings.past_due_as_of.unwrap_or(self.horizon.start_date)
    }

    /// 由庫存提供者建立物料的計算狀態（在庫、安全庫存、預計收貨、MRP 參數）
    pub fn prepare(&self, product_id: &str, level: u32, inventory: &dyn InventoryProvider) -> ProductState {
        let lead_time_days = inventory.lead_time_days(product_id);
        let safety_stock = inventory.safety_stock(product_id);
        let replenishment_type = inventory.replenishment_type(product_id);

        let mut config = inventory
            .mrp_config(product_id)
            .unwrap_or_else(|| MrpConfig::new(product_id, lead_time_days, replenishment_type));
        config.lead_time_days = lead_time_days;
        config.safety_stock = safety_stock;
        config.replenishment_type = replenishment_type;

        let mut ledger = SupplyLedger::new(inventory.on_hand_quantity(product_id), safety_stock, self.buckets.len());
        for receipt in inventory.scheduled_receipts(product_id, self.horizon.end_date) {
            match self.buckets.locate(receipt.available_date) {
                // 已逾期未到的收貨視為立即可用
                BucketPosition::Before => ledger.receive(0, receipt.quantity),
                BucketPosition::Within(bucket) => ledger.receive(bucket, receipt.quantity),
                BucketPosition::After => {}
            }
        }

        ProductState {
            product_id: product_id.to_string(),
            level,
            config,
            ledger,
            result: MrpResult::empty(product_id),
            pending: Vec::new(),
            ancestors: BTreeSet::new(),
            path: Vec::new(),
            routing_checked: false,
            halted: false,
        }
    }

    /// 對目前累積的需求做一次計算，回傳展開出的子件相依需求
    pub fn plan(&self, state: &mut ProductState) -> Vec<Demand> {
        let demands = std::mem::take(&mut state.pending);
        if state.halted || !state.config.needs_mrp() || self.buckets.is_empty() {
            return Vec::new();
        }

        tracing::debug!("計算物料 {}（階碼 {}），需求 {} 筆", state.product_id, state.level, demands.len());

        let gross = self.group_by_bucket(state, &demands);
        let policy = match LotSizingPolicy::from_config(&state.config) {
            Ok(policy) => policy,
            Err(e) => {
                if gross.values().any(|d| d.gross > Decimal::ZERO) {
                    state.halt(e);
                }
                return Vec::new();
            }
        };

        let mut dependents = Vec::new();
        for (&bucket, demand) in &gross {
            if demand.gross <= Decimal::ZERO {
                continue;
            }
            if let Err(e) = self.plan_bucket(state, &policy, bucket, demand, &gross, &mut dependents) {
                state.halt(e);
                break;
            }
        }

        dependents
    }

    /// 依桶彙總毛需求；時界前的需求併入第一桶，時界後的忽略
    fn group_by_bucket(&self, state: &mut ProductState, demands: &[Demand]) -> BTreeMap<usize, BucketDemand> {
        let mut gross: BTreeMap<usize, BucketDemand> = BTreeMap::new();

        for demand in demands.iter().filter(|d| d.quantity > Decimal::ZERO) {
            let bucket = match self.buckets.locate(demand.required_date) {
                BucketPosition::Within(bucket) => bucket,
                BucketPosition::Before => {
                    state.result.add_warning(
                        MrpWarning::new(
                            &state.product_id,
                            WarningKind::DemandOutsideHorizon,
                            format!("需求 {} 早於時界起日，併入第一桶", demand.quantity),
                        )
                        .on(demand.required_date),
                    );
                    0
                }
                BucketPosition::After => {
                    state.result.add_warning(
                        MrpWarning::new(
                            &state.product_id,
                            WarningKind::DemandOutsideHorizon,
                            format!("需求 {} 晚於時界迄日，未納入計算", demand.quantity),
                        )
                        .on(demand.required_date),
                    );
                    continue;
                }
            };

            gross
                .entry(bucket)
                .and_modify(|d| d.add(demand))
                .or_insert_with(|| BucketDemand::from_demand(demand));
        }

        gross
    }

    fn plan_bucket(
        &self,
        state: &mut ProductState,
        policy: &LotSizingPolicy,
        bucket: usize,
        demand: &BucketDemand,
        batch: &BTreeMap<usize, BucketDemand>,
        dependents: &mut Vec<Demand>,
    ) -> Result<()> {
        let lead_time_days = state.config.lead_time_days;
        let required_date = demand.required_date;
        let order_date = LeadTimeCalculator::offset_for_lead_time(
            required_date,
            lead_time_days,
            self.settings.lead_time_mode,
            self.calendar,
        )?;

        let step = state.ledger.net(bucket, demand.gross);
        let safety_stock = state.ledger.safety_stock();
        let (parent_product_id, source_order_id) = demand.parent();

        state.result.material_requirements.push(MaterialRequirement {
            product_id: state.product_id.clone(),
            gross_requirement: step.gross_requirement,
            net_requirement: step.net_requirement,
            required_date,
            order_date,
            on_hand: step.carried + safety_stock,
            scheduled_receipts: step.scheduled_receipt,
            safety_stock,
            bom_level: demand.bom_level,
            parent_product_id,
            source_order_id,
        });

        let net = step.net_requirement;
        if net <= Decimal::ZERO {
            return Ok(());
        }

        let context = self.lot_sizing_context(state, policy, bucket, batch);
        let quantity = policy.apply(net, &context, &state.config);
        state.ledger.receive(bucket, quantity - net);

        let as_of = self.as_of();
        let is_past_due = order_date < as_of;
        let mut order = PlannedOrder::new(
            &state.product_id,
            quantity,
            order_date,
            required_date,
            PlannedOrderType::from(state.config.replenishment_type),
        )
        .with_lot_sizing(policy.rule(), net)
        .with_bom_level(state.level)
        .with_zone(self.horizon.zone_for(order_date))
        .with_past_due(is_past_due);
        if let Some(source_ref) = &demand.source_ref {
            order = order.with_source_ref(source_ref);
        }

        if quantity > net {
            state.result.add_warning(
                MrpWarning::new(
                    &state.product_id,
                    WarningKind::LotSizingExcess,
                    format!("批量規則 {} 將淨需求 {} 調整為 {}", policy.rule().as_str(), net, quantity),
                )
                .on(required_date),
            );
        }
        if is_past_due {
            tracing::warn!("物料 {} 計劃訂單下單日 {} 早於 {}，需催料", state.product_id, order_date, as_of);
            state.result.add_warning(
                MrpWarning::new(
                    &state.product_id,
                    WarningKind::PastDue,
                    format!("下單日 {} 早於基準日 {}，需催料", order_date, as_of),
                )
                .on(order_date),
            );
        }

        if order.is_manufacturing() {
            let children = self.explode_order(state, &mut order)?;
            dependents.extend(children);
        }

        state.result.planned_orders.push(order);
        Ok(())
    }

    /// 批量情境：週期供應用涵蓋期間的淨需求，EOQ 用年化毛需求
    fn lot_sizing_context(
        &self,
        state: &ProductState,
        policy: &LotSizingPolicy,
        bucket: usize,
        batch: &BTreeMap<usize, BucketDemand>,
    ) -> LotSizingContext {
        let mut context = LotSizingContext::default();

        if let Some(periods) = policy.periods_of_supply() {
            let window_end = bucket + periods as usize;
            let mut simulated = state.ledger.clone();
            context.window_net = batch
                .range(bucket + 1..window_end)
                .map(|(&b, d)| simulated.net(b, d.gross).net_requirement)
                .sum();
        }

        let total_days = self.horizon.total_days();
        if total_days > 0 {
            let batch_gross: Decimal = batch.values().map(|d| d.gross).sum();
            context.annualized_demand = batch_gross * Decimal::from(365) / Decimal::from(total_days);
        }

        context
    }

    /// 單階展開製造訂單，子件需求日 = 父件開工日
    fn explode_order(&self, state: &mut ProductState, order: &mut PlannedOrder) -> Result<Vec<Demand>> {
        let start_date = order.start_date;

        if !state.routing_checked {
            state.routing_checked = true;
            if self.structures.find_effective_routing(&state.product_id, start_date).is_none() {
                state.result.add_warning(
                    MrpWarning::new(&state.product_id, WarningKind::MissingRouting, "生產件沒有有效途程，無法計算產能")
                        .on(start_date),
                );
            }
        }

        let Some(bom) = self.structures.find_effective_bom(&state.product_id, start_date) else {
            state.record_error(MrpError::bom_not_found(&state.product_id));
            return Ok(Vec::new());
        };

        let mut dependents = Vec::new();
        for component in self.explosion.explode_single_level(&bom, order.quantity, start_date)? {
            if component.unresolved_phantom {
                state.result.add_warning(
                    MrpWarning::new(
                        &state.product_id,
                        WarningKind::PhantomWithoutBom,
                        format!("虛擬件 {} 沒有有效 BOM，視為一般子件", component.product_id),
                    )
                    .on(start_date),
                );
            }
            if component.quantity <= Decimal::ZERO {
                continue;
            }

            let demand = Demand::dependent(
                &component.product_id,
                component.quantity,
                start_date,
                &state.product_id,
                order.id,
                state.level + 1,
            );
            order.material_requirements.push(MaterialRequirement {
                product_id: component.product_id.clone(),
                gross_requirement: component.quantity,
                net_requirement: component.quantity,
                required_date: start_date,
                order_date: start_date,
                on_hand: Decimal::ZERO,
                scheduled_receipts: Decimal::ZERO,
                safety_stock: Decimal::ZERO,
                bom_level: state.level + 1,
                parent_product_id: Some(state.product_id.clone()),
                source_order_id: Some(order.id),
            });
            dependents.push(demand);
        }

        Ok(dependents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use mrp_core::{
        Bom, BomLine, BucketSize, DemandType, InMemoryInventory, LotSizingRule, PlanningZone, ReplenishmentType,
        StructureCatalog, Supply, SupplyType,
    };

    fn start() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 11, 1).unwrap()
    }

    fn horizon() -> PlanningHorizon {
        PlanningHorizon::from_days(start(), 30, 7, 7, BucketSize::Day).unwrap()
    }

    fn day(offset: i64) -> NaiveDate {
        start() + Duration::days(offset)
    }

    fn run(
        catalog: &StructureCatalog,
        inventory: &InMemoryInventory,
        product_id: &str,
        settings: &EngineSettings,
    ) -> (ProductState, Vec<Demand>) {
        let horizon = horizon();
        let calendar = WorkCalendar::default();
        let calculator = MrpCalculator::new(catalog, &horizon, settings, &calendar).unwrap();
        let mut state = calculator.prepare(product_id, 0, inventory);
        state.pending = inventory.gross_requirements(product_id, &horizon);
        let dependents = calculator.plan(&mut state);
        (state, dependents)
    }

    #[test]
    fn test_end_to_end_fixed_order_quantity() {
        // 毛需求 100（第 20 天），在庫 20，安全庫存 10，提前期 5，固定批量 50
        let catalog = StructureCatalog::new();
        let inventory = InMemoryInventory::new()
            .with_config(
                MrpConfig::new("P", 5, ReplenishmentType::Purchase)
                    .with_safety_stock(Decimal::from(10))
                    .with_lot_sizing_rule(LotSizingRule::FixedOrderQuantity)
                    .with_fixed_lot_size(Decimal::from(50)),
            )
            .with_on_hand("P", Decimal::from(20))
            .with_demand(Demand::new("P", Decimal::from(100), day(20), DemandType::SalesOrder));

        let (state, dependents) = run(&catalog, &inventory, "P", &EngineSettings::default());

        assert!(dependents.is_empty());
        assert_eq!(state.result.planned_orders.len(), 1);
        let order = &state.result.planned_orders[0];
        assert_eq!(order.original_requirement, Decimal::from(90));
        assert_eq!(order.quantity, Decimal::from(100));
        assert_eq!(order.start_date, day(15));
        assert_eq!(order.due_date, day(20));
        assert_eq!(order.zone, PlanningZone::Liquid);
        assert!(order.is_purchase());
        assert!(state.result.has_warning(WarningKind::LotSizingExcess));

        let requirement = &state.result.material_requirements[0];
        assert_eq!(requirement.net_requirement, requirement.expected_net_requirement());
    }

    #[test]
    fn test_lot_for_lot_has_no_excess() {
        let catalog = StructureCatalog::new();
        let inventory = InMemoryInventory::new()
            .with_config(MrpConfig::new("P", 2, ReplenishmentType::Purchase))
            .with_demand(Demand::new("P", Decimal::new(375, 1), day(10), DemandType::SalesOrder))
            .with_demand(Demand::new("P", Decimal::from(12), day(12), DemandType::SalesOrder));

        let (state, _) = run(&catalog, &inventory, "P", &EngineSettings::default());

        let orders = &state.result.planned_orders;
        assert_eq!(orders.len(), 2);
        for order in orders {
            assert_eq!(order.quantity, order.original_requirement);
            assert_eq!(order.excess_quantity(), Decimal::ZERO);
        }
        assert!(!state.result.has_warning(WarningKind::LotSizingExcess));
    }

    #[test]
    fn test_surplus_covers_later_bucket() {
        let catalog = StructureCatalog::new();
        let inventory = InMemoryInventory::new()
            .with_config(
                MrpConfig::new("P", 0, ReplenishmentType::Purchase)
                    .with_lot_sizing_rule(LotSizingRule::FixedOrderQuantity)
                    .with_fixed_lot_size(Decimal::from(50)),
            )
            .with_demand(Demand::new("P", Decimal::from(30), day(3), DemandType::SalesOrder))
            .with_demand(Demand::new("P", Decimal::from(15), day(8), DemandType::SalesOrder));

        let (state, _) = run(&catalog, &inventory, "P", &EngineSettings::default());

        assert_eq!(state.result.planned_orders.len(), 1);
        let second = &state.result.material_requirements[1];
        assert_eq!(second.on_hand, Decimal::from(20));
        assert_eq!(second.net_requirement, Decimal::ZERO);
    }

    #[test]
    fn test_periods_of_supply_covers_window() {
        let catalog = StructureCatalog::new();
        let inventory = InMemoryInventory::new()
            .with_config(
                MrpConfig::new("P", 0, ReplenishmentType::Purchase)
                    .with_lot_sizing_rule(LotSizingRule::PeriodsOfSupply)
                    .with_periods_of_supply(3),
            )
            .with_demand(Demand::new("P", Decimal::from(10), day(5), DemandType::SalesOrder))
            .with_demand(Demand::new("P", Decimal::from(20), day(6), DemandType::SalesOrder))
            .with_demand(Demand::new("P", Decimal::from(30), day(7), DemandType::SalesOrder))
            .with_demand(Demand::new("P", Decimal::from(40), day(8), DemandType::SalesOrder));

        let (state, _) = run(&catalog, &inventory, "P", &EngineSettings::default());

        let quantities: Vec<Decimal> = state.result.planned_orders.iter().map(|o| o.quantity).collect();
        assert_eq!(quantities, vec![Decimal::from(60), Decimal::from(40)]);
    }

    #[test]
    fn test_past_due_is_flagged_not_clamped() {
        let catalog = StructureCatalog::new();
        let inventory = InMemoryInventory::new()
            .with_config(MrpConfig::new("P", 10, ReplenishmentType::Purchase))
            .with_demand(Demand::new("P", Decimal::from(5), day(3), DemandType::SalesOrder));

        let (state, _) = run(&catalog, &inventory, "P", &EngineSettings::default());

        let order = &state.result.planned_orders[0];
        assert_eq!(order.start_date, day(-7));
        assert!(order.is_past_due);
        assert_eq!(order.zone, PlanningZone::Frozen);
        assert!(state.result.has_warning(WarningKind::PastDue));
    }

    #[test]
    fn test_scheduled_receipts_netted() {
        let catalog = StructureCatalog::new();
        let inventory = InMemoryInventory::new()
            .with_config(MrpConfig::new("P", 1, ReplenishmentType::Purchase))
            .with_supply(Supply::new("P", Decimal::from(25), day(4), SupplyType::PurchaseOrder))
            .with_supply(Supply::new("P", Decimal::from(99), day(40), SupplyType::PurchaseOrder))
            .with_demand(Demand::new("P", Decimal::from(40), day(6), DemandType::SalesOrder));

        let (state, _) = run(&catalog, &inventory, "P", &EngineSettings::default());

        assert_eq!(state.result.planned_orders[0].quantity, Decimal::from(15));
    }

    #[test]
    fn test_demand_outside_horizon() {
        let catalog = StructureCatalog::new();
        let inventory = InMemoryInventory::new()
            .with_config(MrpConfig::new("P", 0, ReplenishmentType::Purchase))
            .with_demand(Demand::new("P", Decimal::from(5), day(-2), DemandType::SalesOrder))
            .with_demand(Demand::new("P", Decimal::from(7), day(45), DemandType::SalesOrder));

        let (state, _) = run(&catalog, &inventory, "P", &EngineSettings::default());

        assert!(state.result.has_warning(WarningKind::DemandOutsideHorizon));
        assert_eq!(state.result.planned_orders.len(), 1);
        assert_eq!(state.result.planned_orders[0].quantity, Decimal::from(5));
        assert_eq!(state.result.planned_orders[0].due_date, day(-2));
    }

    #[test]
    fn test_manufacturing_order_emits_dependents() {
        let catalog = StructureCatalog::new()
            .with_bom(
                Bom::new("A", 1)
                    .with_line(BomLine::new("B", Decimal::from(2), "EA"))
                    .with_line(BomLine::new("C", Decimal::from(10), "EA").with_scrap(Decimal::from(10)))
                    .released(),
            )
            .unwrap();
        let inventory = InMemoryInventory::new()
            .with_config(MrpConfig::new("A", 3, ReplenishmentType::Manufacture))
            .with_demand(Demand::new("A", Decimal::from(4), day(10), DemandType::SalesOrder));

        let (state, dependents) = run(&catalog, &inventory, "A", &EngineSettings::default());

        let order = &state.result.planned_orders[0];
        assert!(order.is_manufacturing());
        assert_eq!(order.material_requirements.len(), 2);
        assert!(state.result.has_warning(WarningKind::MissingRouting));

        assert_eq!(dependents.len(), 2);
        let b = dependents.iter().find(|d| d.product_id == "B").unwrap();
        assert_eq!(b.quantity, Decimal::from(8));
        assert_eq!(b.required_date, day(7));
        assert_eq!(b.source_order_id, Some(order.id));
        assert_eq!(b.bom_level, 1);
        let c = dependents.iter().find(|d| d.product_id == "C").unwrap();
        assert_eq!(c.quantity, Decimal::from(44));
    }

    #[test]
    fn test_missing_bom_is_reported_once() {
        let catalog = StructureCatalog::new();
        let inventory = InMemoryInventory::new()
            .with_config(MrpConfig::new("A", 1, ReplenishmentType::Manufacture))
            .with_demand(Demand::new("A", Decimal::from(4), day(10), DemandType::SalesOrder))
            .with_demand(Demand::new("A", Decimal::from(6), day(20), DemandType::SalesOrder));

        let (state, dependents) = run(&catalog, &inventory, "A", &EngineSettings::default());

        assert!(dependents.is_empty());
        assert_eq!(state.result.planned_orders.len(), 2);
        assert_eq!(state.result.errors, vec![MrpError::bom_not_found("A")]);
    }

    #[test]
    fn test_missing_lot_size_halts_product() {
        let catalog = StructureCatalog::new();
        let inventory = InMemoryInventory::new()
            .with_config(
                MrpConfig::new("P", 1, ReplenishmentType::Purchase).with_lot_sizing_rule(LotSizingRule::FixedOrderQuantity),
            )
            .with_demand(Demand::new("P", Decimal::from(4), day(10), DemandType::SalesOrder));

        let (state, _) = run(&catalog, &inventory, "P", &EngineSettings::default());

        assert!(state.is_halted());
        assert!(state.result.planned_orders.is_empty());
        assert!(matches!(state.result.errors[0], MrpError::MissingLotSize { .. }));
    }

    #[test]
    fn test_working_day_offset() {
        let catalog = StructureCatalog::new();
        let inventory = InMemoryInventory::new()
            .with_config(MrpConfig::new("P", 5, ReplenishmentType::Purchase))
            // 2025-11-17 為星期一
            .with_demand(Demand::new("P", Decimal::from(4), day(16), DemandType::SalesOrder));
        let settings = EngineSettings::default().with_lead_time_mode(mrp_core::LeadTimeMode::WorkingDays);

        let (state, _) = run(&catalog, &inventory, "P", &settings);

        assert_eq!(state.result.planned_orders[0].start_date, day(9));
    }
}
