//! 淨變（Net-Change）計算
//!
//! 只重算自上次執行後有異動的物料。異動物料經反查展開到最上層物料，
//! 再把這些最上層物料底下的共用子件所牽涉的其他最上層物料一併納入，
//! 確保每個子件的供應帳仍涵蓋它全部的上層需求。

use std::collections::BTreeSet;

use mrp_calc::{BomExplosion, MrpEngine, MrpRunResult};
use mrp_core::{PlanningHorizon, Result};
use rust_decimal::Decimal;

use crate::dirty_tracking::DirtyTracker;

/// 增量計算器
pub struct IncrementalCalculator<'a> {
    engine: &'a MrpEngine<'a>,
    tracker: DirtyTracker,
}

impl<'a> IncrementalCalculator<'a> {
    pub fn new(engine: &'a MrpEngine<'a>) -> Self {
        Self {
            engine,
            tracker: DirtyTracker::new(),
        }
    }

    pub fn tracker(&self) -> &DirtyTracker {
        &self.tracker
    }

    pub fn mark_dirty(&mut self, product_id: impl Into<String>) {
        self.tracker.mark_dirty(product_id);
    }

    pub fn mark_many<I, S>(&mut self, products: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tracker.mark_many(products);
    }

    /// 需要重算的最上層物料
    pub fn affected_products(&self, horizon: &PlanningHorizon) -> BTreeSet<String> {
        let structures = self.engine.structures();
        let explosion = BomExplosion::new(structures);
        let mut roots = BTreeSet::new();
        let mut visited = BTreeSet::new();
        let mut pending: Vec<String> = self.tracker.dirty_products().map(str::to_string).collect();

        while let Some(product_id) = pending.pop() {
            if !visited.insert(product_id.clone()) {
                continue;
            }
            for root in explosion.where_used_roots(&product_id) {
                if !roots.insert(root.clone()) {
                    continue;
                }
                if structures.find_effective_bom(&root, horizon.start_date).is_none() {
                    continue;
                }
                match explosion.explode(&root, Decimal::ONE, horizon.start_date) {
                    Ok(components) => pending.extend(components.into_iter().map(|c| c.product_id)),
                    // 結構錯誤交由引擎回報
                    Err(e) => tracing::warn!("物料 {} 展開失敗，僅重算自身: {}", root, e),
                }
            }
        }

        roots
    }

    /// 淨變重生：重算受影響物料並取代其計劃訂單，成功後清除異動標記
    pub fn run(&mut self, horizon: &PlanningHorizon) -> Result<MrpRunResult> {
        if self.tracker.is_empty() {
            tracing::debug!("沒有異動物料，略過淨變計算");
            return Ok(MrpRunResult::new(*horizon));
        }

        let processed: BTreeSet<String> = self.tracker.dirty_products().map(str::to_string).collect();
        let affected = self.affected_products(horizon);
        tracing::info!("淨變計算：{} 個異動物料，{} 個受影響的最上層物料", processed.len(), affected.len());

        let run = self.engine.regenerate(affected, horizon)?;
        self.tracker.clear_products(&processed);
        Ok(run)
    }

    /// 試算受影響物料，不寫入儲存庫，也不清除異動標記
    pub fn preview(&self, horizon: &PlanningHorizon) -> Result<MrpRunResult> {
        if self.tracker.is_empty() {
            return Ok(MrpRunResult::new(*horizon));
        }
        self.engine.calculate(self.affected_products(horizon), horizon)
    }
}
