//! MRP 引擎：跨物料批次計算與計劃重生
//!
//! 物料依最低階碼分波計算，同一子件的所有上層需求會在同一波一起淨算。
//! 每一波內各物料互不相依（各自持有自己的供應帳），可以平行；
//! 波與波之間依物料 ID 順序把相依需求併入子件。

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::time::Instant;

use mrp_core::{
    BucketSize, Demand, DemandType, EngineSettings, ForecastFeatures, InventoryProvider, MrpError, PlannedOrderRepository,
    PlanningHorizon, Result, StructureStore, WorkCalendar,
};
use rayon::prelude::*;
use rust_decimal::Decimal;

use crate::calculator::{MrpCalculator, ProductState};
use crate::explosion::BomExplosion;
use crate::forecast::ForecastService;
use crate::{MrpResult, MrpRunResult, MrpWarning, WarningKind};

/// MRP 引擎
pub struct MrpEngine<'a> {
    structures: &'a dyn StructureStore,
    inventory: &'a dyn InventoryProvider,
    repository: Option<&'a dyn PlannedOrderRepository>,
    forecast: Option<ForecastService>,
    settings: EngineSettings,
    calendar: WorkCalendar,
}

impl<'a> MrpEngine<'a> {
    pub fn new(structures: &'a dyn StructureStore, inventory: &'a dyn InventoryProvider) -> Self {
        Self {
            structures,
            inventory,
            repository: None,
            forecast: None,
            settings: EngineSettings::default(),
            calendar: WorkCalendar::default(),
        }
    }

    /// 建構器模式：設置計劃訂單儲存庫（重生時需要）
    pub fn with_repository(mut self, repository: &'a dyn PlannedOrderRepository) -> Self {
        self.repository = Some(repository);
        self
    }

    /// 建構器模式：沒有確定需求的最上層物料改用預測
    pub fn with_forecast_service(mut self, forecast: ForecastService) -> Self {
        self.forecast = Some(forecast);
        self
    }

    pub fn with_settings(mut self, settings: EngineSettings) -> Self {
        self.settings = settings;
        self
    }

    /// 建構器模式：工作天提前期使用的日曆
    pub fn with_calendar(mut self, calendar: WorkCalendar) -> Self {
        self.calendar = calendar;
        self
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn structures(&self) -> &'a dyn StructureStore {
        self.structures
    }

    /// 計算指定物料（及其展開出的所有子件）的 MRP，不寫入儲存庫
    pub fn calculate<I, S>(&self, products: I, horizon: &PlanningHorizon) -> Result<MrpRunResult>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let start_time = Instant::now();
        let products: BTreeSet<String> = products.into_iter().map(Into::into).collect();
        tracing::info!(
            "開始 MRP 計算：{} 個物料，時界 {} ~ {}",
            products.len(),
            horizon.start_date,
            horizon.end_date
        );

        let calculator = MrpCalculator::new(self.structures, horizon, &self.settings, &self.calendar)?;
        let mut run = MrpRunResult::new(*horizon);

        // Step 1: 最低階碼（同時檢查結構循環）
        let explosion = BomExplosion::new(self.structures);
        let mut codes: HashMap<String, u32> = HashMap::new();
        let mut failed: BTreeSet<String> = BTreeSet::new();
        for product_id in &products {
            codes.entry(product_id.clone()).or_insert(0);
            let Some(bom) = self.structures.find_effective_bom(product_id, horizon.start_date) else {
                continue;
            };
            if let Err(e) = explosion.low_level_codes(&bom, horizon.start_date, &mut codes) {
                tracing::warn!("物料 {} 無法展開: {}", product_id, e);
                let mut result = MrpResult::empty(product_id);
                result.add_error(e);
                run.results.insert(product_id.clone(), result);
                failed.insert(product_id.clone());
            }
        }

        // Step 2: 載入物料狀態
        let mut states: HashMap<String, ProductState> = HashMap::new();
        let mut queue: BTreeMap<u32, BTreeSet<String>> = BTreeMap::new();
        for product_id in products.iter().filter(|p| !failed.contains(*p)) {
            let level = codes.get(product_id).copied().unwrap_or(0);
            let mut state = self.load_state(&calculator, product_id, level, horizon);
            if level == 0 && state.pending.is_empty() {
                self.apply_forecast(&mut state, horizon);
            }
            if state.config.needs_mrp() {
                queue.entry(level).or_default().insert(product_id.clone());
            }
            states.insert(product_id.clone(), state);
        }

        // Step 3: 依階碼分波計算
        while let Some((level, wave)) = queue.pop_first() {
            let mut batch: Vec<ProductState> = wave.iter().filter_map(|p| states.remove(p)).collect();
            tracing::debug!("第 {} 階：{} 個物料", level, batch.len());

            let outputs: Vec<(String, Vec<Demand>)> = if self.settings.parallel {
                batch
                    .par_iter_mut()
                    .map(|state| (state.product_id.clone(), calculator.plan(state)))
                    .collect()
            } else {
                batch
                    .iter_mut()
                    .map(|state| (state.product_id.clone(), calculator.plan(state)))
                    .collect()
            };
            states.extend(batch.into_iter().map(|state| (state.product_id.clone(), state)));

            for (parent_id, demands) in outputs {
                if !demands.is_empty() {
                    self.route_dependents(&calculator, horizon, level, &parent_id, demands, &codes, &failed, &mut states, &mut queue);
                }
            }
        }

        // Step 4: 彙總結果
        for (product_id, mut state) in states {
            if !state.config.needs_mrp() {
                continue;
            }
            state.result.planned_orders.sort_by_key(|o| (o.due_date, o.start_date));
            state.result.material_requirements.sort_by_key(|r| r.required_date);
            run.results.insert(product_id, state.result);
        }

        run.calculation_time_ms = start_time.elapsed().as_millis();
        tracing::info!(
            "MRP 計算完成：{} 個物料，{} 張計劃訂單，耗時 {} ms",
            run.results.len(),
            run.total_planned_orders(),
            run.calculation_time_ms
        );
        if run.has_errors() {
            tracing::warn!("MRP 計算有 {} 個錯誤", run.errors().count());
        }

        Ok(run)
    }

    /// 重生計劃：先計算，再刪除舊的計劃訂單並寫入新的
    ///
    /// 刪除範圍是指定物料的整個子件結構，不只本次有結果的物料；
    /// 需求已被庫存滿足而不再展開的子件，舊訂單一樣會被清掉。
    pub fn regenerate<I, S>(&self, products: I, horizon: &PlanningHorizon) -> Result<MrpRunResult>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let repository = self
            .repository
            .ok_or_else(|| MrpError::Configuration("重生計劃需要設定計劃訂單儲存庫".to_string()))?;

        let products: BTreeSet<String> = products.into_iter().map(Into::into).collect();
        let mut run = self.calculate(products.iter().cloned(), horizon)?;

        let mut scope = self.structure_closure(&products, horizon);
        scope.extend(run.results.keys().cloned());

        let mut deleted = 0;
        for product_id in &scope {
            deleted += repository.delete_planned_orders(product_id, horizon)?;
        }
        for order in run.planned_orders() {
            repository.save_planned_order(order)?;
        }
        run.deleted_orders = deleted;

        tracing::info!(
            "計劃重生完成：刪除 {} 張，寫入 {} 張",
            run.deleted_orders,
            run.total_planned_orders()
        );
        Ok(run)
    }

    /// 指定物料與其在時界起日展開出的所有子件
    fn structure_closure(&self, products: &BTreeSet<String>, horizon: &PlanningHorizon) -> BTreeSet<String> {
        let explosion = BomExplosion::new(self.structures);
        let mut closure = products.clone();
        for product_id in products {
            if self.structures.find_effective_bom(product_id, horizon.start_date).is_none() {
                continue;
            }
            match explosion.explode(product_id, Decimal::ONE, horizon.start_date) {
                Ok(components) => closure.extend(components.into_iter().map(|c| c.product_id)),
                Err(e) => tracing::debug!("物料 {} 無法展開，只清除自身的舊訂單: {}", product_id, e),
            }
        }
        closure
    }

    fn load_state(
        &self,
        calculator: &MrpCalculator<'_>,
        product_id: &str,
        level: u32,
        horizon: &PlanningHorizon,
    ) -> ProductState {
        let mut state = calculator.prepare(product_id, level, self.inventory);
        state.pending = self.inventory.gross_requirements(product_id, horizon);
        state
    }

    /// 把父件展開出的相依需求送進子件，子件排到下一波以後
    #[allow(clippy::too_many_arguments)]
    fn route_dependents(
        &self,
        calculator: &MrpCalculator<'_>,
        horizon: &PlanningHorizon,
        level: u32,
        parent_id: &str,
        demands: Vec<Demand>,
        codes: &HashMap<String, u32>,
        failed: &BTreeSet<String>,
        states: &mut HashMap<String, ProductState>,
        queue: &mut BTreeMap<u32, BTreeSet<String>>,
    ) {
        let Some(parent) = states.get(parent_id) else {
            return;
        };
        let mut lineage = parent.ancestors.clone();
        lineage.insert(parent_id.to_string());
        let mut path = parent.path.clone();
        path.push(parent_id.to_string());

        for demand in demands {
            let child_id = demand.product_id.clone();

            if lineage.contains(&child_id) {
                let mut cycle = path.clone();
                cycle.push(child_id);
                if let Some(parent) = states.get_mut(parent_id) {
                    parent.halt(MrpError::CircularStructure { path: cycle });
                }
                continue;
            }
            if failed.contains(&child_id) {
                tracing::warn!("子件 {} 結構有誤，略過 {} 的相依需求", child_id, parent_id);
                if let Some(parent) = states.get_mut(parent_id) {
                    parent.result.add_warning(
                        MrpWarning::new(
                            parent_id,
                            WarningKind::DependentDemandDropped,
                            format!("子件 {} 結構有誤，相依需求 {} 未傳遞", child_id, demand.quantity),
                        )
                        .on(demand.required_date),
                    );
                }
                continue;
            }

            let state = states.entry(child_id.clone()).or_insert_with(|| {
                let child_level = codes.get(&child_id).copied().unwrap_or(0).max(level + 1);
                let mut state = self.load_state(calculator, &child_id, child_level, horizon);
                state.path = path.clone();
                state
            });
            state.ancestors.extend(lineage.iter().cloned());
            state.pending.push(demand);
            if state.level <= level {
                state.level = level + 1;
            }
            if state.config.needs_mrp() {
                queue.entry(state.level).or_default().insert(child_id);
            }
        }
    }

    /// 沒有確定需求時以預測補足毛需求
    fn apply_forecast(&self, state: &mut ProductState, horizon: &PlanningHorizon) {
        let Some(service) = &self.forecast else {
            return;
        };
        if !self.settings.forecast.enabled {
            return;
        }

        let period_days = match horizon.bucket_size {
            BucketSize::Day => 1,
            BucketSize::Week => 7,
            BucketSize::Month => 30,
        };
        let features = ForecastFeatures::new(self.inventory.demand_history(&state.product_id), period_days);
        let forecast = service.forecast(&state.product_id, horizon.start_date, horizon.end_date, &features);

        if forecast.is_fallback() {
            let detail = if forecast.warnings.is_empty() {
                format!("{:?}", forecast.method)
            } else {
                forecast.warnings.join("；")
            };
            state.result.add_warning(MrpWarning::new(
                &state.product_id,
                WarningKind::ForecastFallback,
                format!("使用歷史預測: {}", detail),
            ));
        }
        if forecast.is_low_confidence(service.settings().low_confidence_threshold) {
            state.result.add_warning(MrpWarning::new(
                &state.product_id,
                WarningKind::LowConfidenceForecast,
                format!("預測信心水準 {} 偏低", forecast.confidence),
            ));
        }

        let source_ref = format!("FC-{}", forecast.id);
        for period in &forecast.periods {
            if period.quantity > Decimal::ZERO && horizon.contains(period.start_date) {
                state.pending.push(
                    Demand::new(&state.product_id, period.quantity, period.start_date, DemandType::Forecast)
                        .with_source_ref(&source_ref),
                );
            }
        }
        tracing::debug!("物料 {} 預測需求 {}", state.product_id, forecast.total_quantity());
    }
}
