//! 記憶體實作的提供者
//!
//! 供測試、範例與小型批次使用。`StructureCatalog` 同時負責版本規則：
//! 新版本號必須大於現有最新版本，同一物料同一時點最多只有一個有效的已發行 BOM。

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Mutex;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::provider::{
    InventoryProvider, PlannedOrderRepository, StructureStore, WhereUsedEntry, WorkCenterProvider,
};
use crate::{
    Bom, BomStatus, Demand, DemandObservation, Inventory, MrpConfig, MrpError, PlannedOrder, PlanningHorizon,
    ReplenishmentType, Result, Routing, Supply, WorkCenter,
};

/// 產品結構目錄
#[derive(Debug, Clone, Default)]
pub struct StructureCatalog {
    boms: Vec<Bom>,
    routings: Vec<Routing>,
    items: BTreeSet<String>,
}

impl StructureCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// 登錄物料主檔
    pub fn add_item(&mut self, product_id: impl Into<String>) {
        self.items.insert(product_id.into());
    }

    /// 建構器模式：登錄多個物料
    pub fn with_items<I, S>(mut self, items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for item in items {
            self.add_item(item);
        }
        self
    }

    /// 加入 BOM 版本
    ///
    /// 版本號必須大於現有最新版本；已發行的 BOM 不得與其他已發行版本的生效區間重疊。
    /// BOM 所屬物料會自動登錄為物料主檔，子件不會。
    pub fn add_bom(&mut self, mut bom: Bom) -> Result<()> {
        if let Some(latest) = self.latest_bom(&bom.product_id) {
            if bom.version <= latest.version {
                return Err(MrpError::InvalidVersion(format!(
                    "BOM {} 新版本 v{} 必須大於最新版本 v{}",
                    bom.product_id, bom.version, latest.version
                )));
            }
        }
        if bom.status == BomStatus::Released {
            self.ensure_no_overlap(&bom)?;
        }

        for existing in self.boms.iter_mut().filter(|b| b.product_id == bom.product_id) {
            existing.is_latest = false;
        }
        bom.is_latest = true;
        self.items.insert(bom.product_id.clone());
        self.boms.push(bom);
        Ok(())
    }

    /// 建構器模式：加入 BOM
    pub fn with_bom(mut self, bom: Bom) -> Result<Self> {
        self.add_bom(bom)?;
        Ok(self)
    }

    /// 發行指定版本
    pub fn release_bom(&mut self, product_id: &str, version: u32) -> Result<()> {
        let index = self.bom_index(product_id, version)?;
        let mut candidate = self.boms[index].clone();
        candidate.release()?;
        self.ensure_no_overlap(&candidate)?;
        self.boms[index] = candidate;
        Ok(())
    }

    /// 作廢指定版本
    pub fn obsolete_bom(&mut self, product_id: &str, version: u32) -> Result<()> {
        let index = self.bom_index(product_id, version)?;
        self.boms[index].obsolete()
    }

    fn bom_index(&self, product_id: &str, version: u32) -> Result<usize> {
        self.boms
            .iter()
            .position(|b| b.product_id == product_id && b.version == version)
            .ok_or_else(|| MrpError::InvalidVersion(format!("BOM {} 不存在版本 v{}", product_id, version)))
    }

    fn ensure_no_overlap(&self, bom: &Bom) -> Result<()> {
        let conflict = self.boms.iter().find(|other| {
            other.product_id == bom.product_id
                && other.id != bom.id
                && other.status == BomStatus::Released
                && other.effectivity.overlaps(&bom.effectivity)
        });
        match conflict {
            Some(other) => Err(MrpError::InvalidVersion(format!(
                "BOM {} v{} 的生效區間與已發行版本 v{} 重疊",
                bom.product_id, bom.version, other.version
            ))),
            None => Ok(()),
        }
    }

    pub fn latest_bom(&self, product_id: &str) -> Option<&Bom> {
        self.boms
            .iter()
            .filter(|b| b.product_id == product_id)
            .max_by_key(|b| b.version)
    }

    pub fn boms(&self) -> &[Bom] {
        &self.boms
    }

    /// 加入途程版本（版本規則同 BOM）
    pub fn add_routing(&mut self, routing: Routing) -> Result<()> {
        if let Some(latest) = self
            .routings
            .iter()
            .filter(|r| r.product_id == routing.product_id)
            .max_by_key(|r| r.version)
        {
            if routing.version <= latest.version {
                return Err(MrpError::InvalidVersion(format!(
                    "途程 {} 新版本 v{} 必須大於最新版本 v{}",
                    routing.code, routing.version, latest.version
                )));
            }
        }
        self.items.insert(routing.product_id.clone());
        self.routings.push(routing);
        Ok(())
    }

    pub fn with_routing(mut self, routing: Routing) -> Result<Self> {
        self.add_routing(routing)?;
        Ok(self)
    }

    pub fn routings(&self) -> &[Routing] {
        &self.routings
    }
}

impl StructureStore for StructureCatalog {
    fn find_effective_bom(&self, product_id: &str, as_of: NaiveDate) -> Option<Bom> {
        self.boms
            .iter()
            .filter(|b| b.product_id == product_id && b.is_effective_on(as_of))
            .max_by_key(|b| b.version)
            .cloned()
    }

    fn find_effective_routing(&self, product_id: &str, as_of: NaiveDate) -> Option<Routing> {
        self.routings
            .iter()
            .filter(|r| r.product_id == product_id && r.is_effective_on(as_of))
            .max_by_key(|r| r.version)
            .cloned()
    }

    fn find_where_used(&self, component_id: &str) -> Vec<WhereUsedEntry> {
        self.boms
            .iter()
            .filter(|b| b.status != BomStatus::Obsolete)
            .flat_map(|bom| {
                bom.lines
                    .iter()
                    .filter(move |line| line.component_id == component_id)
                    .map(move |line| WhereUsedEntry {
                        bom_id: bom.id,
                        parent_product_id: bom.product_id.clone(),
                        bom_version: bom.version,
                        line_id: line.id,
                        component_id: line.component_id.clone(),
                        quantity: line.quantity,
                        line_effectivity: line.effectivity,
                    })
            })
            .collect()
    }

    fn item_exists(&self, product_id: &str) -> bool {
        self.items.contains(product_id)
    }
}

/// 記憶體庫存與需求
#[derive(Debug, Clone, Default)]
pub struct InMemoryInventory {
    configs: HashMap<String, MrpConfig>,
    inventories: HashMap<String, Inventory>,
    receipts: Vec<Supply>,
    demands: Vec<Demand>,
    history: HashMap<String, Vec<DemandObservation>>,
}

impl InMemoryInventory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(mut self, config: MrpConfig) -> Self {
        self.configs.insert(config.product_id.clone(), config);
        self
    }

    pub fn with_inventory(mut self, inventory: Inventory) -> Self {
        self.inventories.insert(inventory.product_id.clone(), inventory);
        self
    }

    pub fn with_on_hand(self, product_id: impl Into<String>, quantity: Decimal) -> Self {
        self.with_inventory(Inventory::new(product_id, quantity))
    }

    pub fn with_supply(mut self, supply: Supply) -> Self {
        self.receipts.push(supply);
        self
    }

    pub fn with_demand(mut self, demand: Demand) -> Self {
        self.demands.push(demand);
        self
    }

    pub fn with_history(mut self, product_id: impl Into<String>, history: Vec<DemandObservation>) -> Self {
        self.history.insert(product_id.into(), history);
        self
    }

    pub fn add_demand(&mut self, demand: Demand) {
        self.demands.push(demand);
    }

    pub fn set_on_hand(&mut self, product_id: &str, quantity: Decimal) {
        self.inventories
            .entry(product_id.to_string())
            .and_modify(|inv| inv.on_hand_qty = quantity)
            .or_insert_with(|| Inventory::new(product_id, quantity));
    }

    pub fn configs(&self) -> impl Iterator<Item = &MrpConfig> {
        self.configs.values()
    }
}

impl InventoryProvider for InMemoryInventory {
    fn on_hand_quantity(&self, product_id: &str) -> Decimal {
        self.inventories
            .get(product_id)
            .map(Inventory::available_qty)
            .unwrap_or(Decimal::ZERO)
    }

    fn safety_stock(&self, product_id: &str) -> Decimal {
        self.configs
            .get(product_id)
            .map(|c| c.safety_stock)
            .unwrap_or(Decimal::ZERO)
    }

    fn scheduled_receipts(&self, product_id: &str, until: NaiveDate) -> Vec<Supply> {
        self.receipts
            .iter()
            .filter(|s| s.product_id == product_id && s.available_date < until)
            .cloned()
            .collect()
    }

    fn lead_time_days(&self, product_id: &str) -> u32 {
        self.configs.get(product_id).map(|c| c.lead_time_days).unwrap_or(0)
    }

    fn replenishment_type(&self, product_id: &str) -> ReplenishmentType {
        self.configs
            .get(product_id)
            .map(|c| c.replenishment_type)
            .unwrap_or(ReplenishmentType::Purchase)
    }

    fn gross_requirements(&self, product_id: &str, _horizon: &PlanningHorizon) -> Vec<Demand> {
        self.demands
            .iter()
            .filter(|d| d.product_id == product_id)
            .cloned()
            .collect()
    }

    fn mrp_config(&self, product_id: &str) -> Option<MrpConfig> {
        self.configs.get(product_id).cloned()
    }

    fn demand_history(&self, product_id: &str) -> Vec<DemandObservation> {
        self.history.get(product_id).cloned().unwrap_or_default()
    }
}

/// 記憶體工作中心
#[derive(Debug, Clone, Default)]
pub struct InMemoryWorkCenters {
    centers: BTreeMap<String, WorkCenter>,
}

impl InMemoryWorkCenters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_work_center(mut self, work_center: WorkCenter) -> Self {
        self.centers.insert(work_center.id.clone(), work_center);
        self
    }
}

impl WorkCenterProvider for InMemoryWorkCenters {
    fn work_center(&self, work_center_id: &str) -> Option<WorkCenter> {
        self.centers.get(work_center_id).cloned()
    }

    fn work_centers(&self) -> Vec<WorkCenter> {
        self.centers.values().cloned().collect()
    }
}

/// 記憶體計劃訂單儲存
#[derive(Debug, Default)]
pub struct InMemoryPlannedOrderRepository {
    orders: Mutex<Vec<PlannedOrder>>,
}

impl InMemoryPlannedOrderRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// 目前所有計劃訂單（依物料、開始日排序）
    pub fn all(&self) -> Result<Vec<PlannedOrder>> {
        let mut orders = self.lock()?.clone();
        orders.sort_by(|a, b| {
            a.product_id
                .cmp(&b.product_id)
                .then(a.start_date.cmp(&b.start_date))
        });
        Ok(orders)
    }

    pub fn len(&self) -> Result<usize> {
        Ok(self.lock()?.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.lock()?.is_empty())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Vec<PlannedOrder>>> {
        self.orders
            .lock()
            .map_err(|e| MrpError::Persistence(format!("計劃訂單儲存鎖定失敗: {}", e)))
    }
}

impl PlannedOrderRepository for InMemoryPlannedOrderRepository {
    fn save_planned_order(&self, order: &PlannedOrder) -> Result<()> {
        let mut orders = self.lock()?;
        match orders.iter_mut().find(|o| o.id == order.id) {
            Some(existing) => *existing = order.clone(),
            None => orders.push(order.clone()),
        }
        Ok(())
    }

    fn delete_planned_orders(&self, product_id: &str, horizon: &PlanningHorizon) -> Result<usize> {
        let mut orders = self.lock()?;
        let before = orders.len();
        orders.retain(|o| !(o.product_id == product_id && o.start_date < horizon.end_date));
        Ok(before - orders.len())
    }

    fn find_planned_orders(&self, product_id: &str) -> Result<Vec<PlannedOrder>> {
        Ok(self
            .lock()?
            .iter()
            .filter(|o| o.product_id == product_id)
            .cloned()
            .collect())
    }
}
