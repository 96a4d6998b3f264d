//! 產能需求規劃（CRP）
//!
//! 計劃訂單與確定工單依途程展開為工作中心負荷，按時界分桶彙總成產能剖面，
//! 再做瓶頸辨識、負荷平準與最早可用期間查詢。

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use mrp_calc::TimeBuckets;
use mrp_core::{
    Bottleneck, CapacityLoad, CapacityPeriod, CapacityProfile, CapacitySettings, LoadSourceType, MrpError,
    PlannedOrder, PlannedOrderType, PlanningHorizon, PlanningZone, Result, StructureStore, WorkCenter,
    WorkCenterProvider, WorkOrder,
};
use rayon::prelude::*;
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use crate::scheduling::OperationScheduler;

/// 負荷來源訂單的時間窗口
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderWindow {
    pub source_type: LoadSourceType,
    pub product_id: String,
    pub start_date: NaiveDate,
    pub due_date: NaiveDate,
}

impl OrderWindow {
    /// 最晚可負荷日：到期日前一天，不早於開工日
    pub fn latest_date(&self) -> NaiveDate {
        self.due_date.pred_opt().unwrap_or(self.due_date).max(self.start_date)
    }
}

/// 產能規劃警告（不中斷規劃）
#[derive(Debug, Clone, PartialEq)]
pub struct CapacityWarning {
    pub source_id: Uuid,
    pub product_id: String,
    pub error: MrpError,
}

/// 產能計劃快照
#[derive(Debug, Clone, PartialEq)]
pub struct CapacityPlan {
    pub horizon: PlanningHorizon,
    /// 可用工時是否已含加班
    pub include_overtime: bool,
    /// 依工作中心 ID 排序
    pub profiles: BTreeMap<String, CapacityProfile>,
    pub windows: BTreeMap<Uuid, OrderWindow>,
    /// 落在時界外或工作中心不存在的負荷
    pub unplaced_loads: Vec<CapacityLoad>,
    /// 已核准外包、移出本廠的負荷
    pub subcontracted_loads: Vec<CapacityLoad>,
    pub warnings: Vec<CapacityWarning>,
}

impl CapacityPlan {
    pub fn new(horizon: PlanningHorizon) -> Self {
        Self {
            horizon,
            include_overtime: false,
            profiles: BTreeMap::new(),
            windows: BTreeMap::new(),
            unplaced_loads: Vec::new(),
            subcontracted_loads: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn profile(&self, work_center_id: &str) -> Option<&CapacityProfile> {
        self.profiles.get(work_center_id)
    }

    pub fn period(&self, work_center_id: &str, date: NaiveDate) -> Option<&CapacityPeriod> {
        self.profile(work_center_id).and_then(|p| p.period_for(date))
    }

    pub fn period_mut(&mut self, work_center_id: &str, date: NaiveDate) -> Option<&mut CapacityPeriod> {
        self.profiles.get_mut(work_center_id).and_then(|p| p.period_for_mut(date))
    }

    /// 所有已排入期間的負荷
    pub fn loads(&self) -> impl Iterator<Item = &CapacityLoad> {
        self.profiles
            .values()
            .flat_map(|profile| profile.periods.iter())
            .flat_map(|period| period.loads.iter())
    }

    pub fn total_loaded_hours(&self) -> Decimal {
        self.profiles.values().map(CapacityProfile::total_loaded_hours).sum()
    }

    pub fn zone_for(&self, load: &CapacityLoad) -> PlanningZone {
        self.horizon.zone_for(load.load_date)
    }

    /// 是否可自動移動：非確定工單且不在凍結區
    pub fn is_movable(&self, load: &CapacityLoad) -> bool {
        !load.is_firm() && self.zone_for(load) != PlanningZone::Frozen
    }

    pub fn window(&self, load: &CapacityLoad) -> Option<&OrderWindow> {
        self.windows.get(&load.source_id)
    }

    /// 負荷最晚可落在的日期；無窗口資訊時為原日期
    pub fn latest_date(&self, load: &CapacityLoad) -> NaiveDate {
        self.window(load)
            .map(OrderWindow::latest_date)
            .unwrap_or(load.load_date)
            .max(load.load_date)
    }

    /// 寬裕天數
    pub fn slack_days(&self, load: &CapacityLoad) -> i64 {
        (self.latest_date(load) - load.load_date).num_days()
    }

    /// 移轉負荷到指定工作中心與日期
    ///
    /// `hours` 小於負荷工時時先拆分（準備工時優先），其餘留在原期間。回傳實際移轉工時。
    pub fn transfer_load(
        &mut self,
        load_id: Uuid,
        hours: Decimal,
        to_work_center: &str,
        to_date: NaiveDate,
    ) -> Result<Decimal> {
        if hours <= Decimal::ZERO {
            return Err(MrpError::InvalidQuantity(format!("移轉工時必須大於 0: {}", hours)));
        }
        let target_index = self
            .profiles
            .get(to_work_center)
            .ok_or_else(|| MrpError::WorkCenterNotFound(to_work_center.to_string()))?
            .period_index(to_date)
            .ok_or_else(|| MrpError::InvalidDate(format!("{} 不在計劃時界內", to_date)))?;

        let mut moved = {
            let source = self
                .profiles
                .values_mut()
                .flat_map(|profile| profile.periods.iter_mut())
                .find(|period| period.loads.iter().any(|l| l.id == load_id))
                .ok_or_else(|| MrpError::CalculationError(format!("找不到負荷 {}", load_id)))?;
            let mut load = source
                .take_load(load_id)
                .ok_or_else(|| MrpError::CalculationError(format!("找不到負荷 {}", load_id)))?;
            if hours < load.hours() {
                let part = load.split_off(hours);
                source.add_load(load);
                part
            } else {
                load
            }
        };

        moved.work_center_id = to_work_center.to_string();
        moved.load_date = to_date;
        let moved_hours = moved.hours();

        let target = self
            .profiles
            .get_mut(to_work_center)
            .and_then(|profile| profile.periods.get_mut(target_index))
            .ok_or_else(|| MrpError::WorkCenterNotFound(to_work_center.to_string()))?;
        target.add_load(moved);

        Ok(moved_hours)
    }

    /// 所有超載期間（依期間起日、工作中心排序）
    pub fn overloaded_periods(&self) -> Vec<Bottleneck> {
        self.bottlenecks_where(CapacityPeriod::is_overloaded)
    }

    fn bottlenecks_where(&self, predicate: impl Fn(&CapacityPeriod) -> bool) -> Vec<Bottleneck> {
        let mut bottlenecks: Vec<Bottleneck> = self
            .profiles
            .values()
            .flat_map(|profile| profile.periods.iter())
            .filter(|period| predicate(period))
            .map(Bottleneck::from_period)
            .collect();
        bottlenecks.sort_by(|a, b| {
            a.period_start
                .cmp(&b.period_start)
                .then_with(|| a.work_center_id.cmp(&b.work_center_id))
        });
        bottlenecks
    }
}

/// 一次負荷移動
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoadMove {
    pub load_id: Uuid,
    pub source_id: Uuid,
    pub work_center_id: String,
    pub from_date: NaiveDate,
    pub to_date: NaiveDate,
    pub hours: Decimal,
}

/// 負荷平準結果
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct LevelingResult {
    pub moves: Vec<LoadMove>,
    /// 平準後仍超載的期間
    pub hard_bottlenecks: Vec<Bottleneck>,
}

impl LevelingResult {
    pub fn hours_moved(&self) -> Decimal {
        self.moves.iter().map(|m| m.hours).sum()
    }

    pub fn is_leveled(&self) -> bool {
        self.hard_bottlenecks.is_empty()
    }
}

#[derive(Default)]
struct LoadSet {
    loads: Vec<CapacityLoad>,
    windows: BTreeMap<Uuid, OrderWindow>,
    warnings: Vec<CapacityWarning>,
}

/// 產能規劃器
pub struct CapacityPlanner<'a> {
    structures: &'a dyn StructureStore,
    work_centers: &'a dyn WorkCenterProvider,
    settings: CapacitySettings,
}

impl<'a> CapacityPlanner<'a> {
    pub fn new(structures: &'a dyn StructureStore, work_centers: &'a dyn WorkCenterProvider) -> Self {
        Self {
            structures,
            work_centers,
            settings: CapacitySettings::default(),
        }
    }

    pub fn with_settings(mut self, settings: CapacitySettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn settings(&self) -> &CapacitySettings {
        &self.settings
    }

    /// 單張訂單的工序負荷；途程取開工日有效的版本
    pub fn loads_for_order(
        &self,
        source_id: Uuid,
        source_type: LoadSourceType,
        product_id: &str,
        quantity: Decimal,
        start_date: NaiveDate,
        due_date: NaiveDate,
    ) -> Result<Vec<CapacityLoad>> {
        let routing = self
            .structures
            .find_effective_routing(product_id, start_date)
            .ok_or_else(|| MrpError::routing_not_found(product_id))?;

        Ok(OperationScheduler::schedule(&routing, quantity, start_date, due_date)
            .into_iter()
            .filter(|op| op.consumes_capacity())
            .map(|op| {
                CapacityLoad::new(
                    source_id,
                    source_type,
                    op.work_center_id,
                    op.setup_hours,
                    op.run_hours,
                    op.start_date,
                )
                .with_operation(op.sequence, product_id, quantity)
            })
            .collect())
    }

    /// 建立產能計劃；採購單不產生負荷，已完工或取消的工單亦同
    pub fn build_plan(
        &self,
        horizon: &PlanningHorizon,
        planned_orders: &[PlannedOrder],
        work_orders: &[WorkOrder],
    ) -> Result<CapacityPlan> {
        let buckets = TimeBuckets::from_horizon(horizon)?;
        let mut set = LoadSet::default();

        for order in planned_orders
            .iter()
            .filter(|o| o.order_type == PlannedOrderType::Manufacturing)
        {
            self.collect(
                &mut set,
                order.id,
                LoadSourceType::PlannedOrder,
                &order.product_id,
                order.quantity,
                order.start_date,
                order.due_date,
            );
        }
        for work_order in work_orders.iter().filter(|w| w.carries_load()) {
            self.collect(
                &mut set,
                work_order.id,
                LoadSourceType::WorkOrder,
                &work_order.product_id,
                work_order.quantity,
                work_order.start_date,
                work_order.due_date,
            );
        }

        let centers = self.work_centers.work_centers();
        let known: BTreeSet<&str> = centers.iter().map(|wc| wc.id.as_str()).collect();

        let mut plan = CapacityPlan::new(*horizon);
        plan.include_overtime = self.settings.include_overtime;
        plan.windows = set.windows;
        plan.warnings = set.warnings;

        let mut by_center: BTreeMap<String, Vec<CapacityLoad>> = BTreeMap::new();
        for load in set.loads {
            if known.contains(load.work_center_id.as_str()) {
                by_center.entry(load.work_center_id.clone()).or_default().push(load);
            } else {
                tracing::warn!("負荷 {} 的工作中心 {} 不存在", load.id, load.work_center_id);
                plan.warnings.push(CapacityWarning {
                    source_id: load.source_id,
                    product_id: load.product_id.clone().unwrap_or_default(),
                    error: MrpError::WorkCenterNotFound(load.work_center_id.clone()),
                });
                plan.unplaced_loads.push(load);
            }
        }

        // 各工作中心可平行彙總；每個期間的負荷清單只由所屬工作中心寫入
        let built = centers
            .par_iter()
            .map(|wc| {
                let loads = by_center.get(&wc.id).map(Vec::as_slice).unwrap_or(&[]);
                self.build_profile(wc, &buckets, loads)
            })
            .collect::<Result<Vec<_>>>()?;

        for (profile, outside) in built {
            if !outside.is_empty() {
                tracing::debug!("工作中心 {} 有 {} 筆負荷落在時界外", profile.work_center_id, outside.len());
            }
            plan.unplaced_loads.extend(outside);
            plan.profiles.insert(profile.work_center_id.clone(), profile);
        }

        tracing::info!(
            "產能計劃完成：{} 個工作中心，負荷 {} 小時，未排入 {} 筆",
            plan.profiles.len(),
            plan.total_loaded_hours(),
            plan.unplaced_loads.len()
        );
        Ok(plan)
    }

    #[allow(clippy::too_many_arguments)]
    fn collect(
        &self,
        set: &mut LoadSet,
        source_id: Uuid,
        source_type: LoadSourceType,
        product_id: &str,
        quantity: Decimal,
        start_date: NaiveDate,
        due_date: NaiveDate,
    ) {
        set.windows.insert(
            source_id,
            OrderWindow {
                source_type,
                product_id: product_id.to_string(),
                start_date,
                due_date,
            },
        );
        match self.loads_for_order(source_id, source_type, product_id, quantity, start_date, due_date) {
            Ok(loads) => set.loads.extend(loads),
            Err(error) => {
                tracing::warn!("訂單 {} 無法產生負荷: {}", source_id, error);
                set.warnings.push(CapacityWarning {
                    source_id,
                    product_id: product_id.to_string(),
                    error,
                });
            }
        }
    }

    fn build_profile(
        &self,
        work_center: &WorkCenter,
        buckets: &TimeBuckets,
        loads: &[CapacityLoad],
    ) -> Result<(CapacityProfile, Vec<CapacityLoad>)> {
        let mut periods = buckets
            .iter()
            .map(|bucket| -> Result<CapacityPeriod> {
                let available = bucket
                    .start_date
                    .iter_days()
                    .take_while(|d| *d < bucket.end_date)
                    .map(|d| {
                        self.work_centers
                            .available_capacity(&work_center.id, d, self.settings.include_overtime)
                    })
                    .sum::<Result<Decimal>>()?;
                Ok(CapacityPeriod::new(&work_center.id, bucket.start_date, bucket.end_date, available))
            })
            .collect::<Result<Vec<_>>>()?;

        let mut outside = Vec::new();
        for load in loads {
            match buckets.index_of(load.load_date).and_then(|i| periods.get_mut(i)) {
                Some(period) => period.add_load(load.clone()),
                None => outside.push(load.clone()),
            }
        }

        Ok((CapacityProfile::new(&work_center.id, periods), outside))
    }

    /// 利用率達門檻的期間
    pub fn identify_bottlenecks(&self, plan: &CapacityPlan, threshold: Decimal) -> Vec<Bottleneck> {
        plan.bottlenecks_where(|period| period.meets_threshold(threshold))
    }

    /// 以設定門檻辨識瓶頸
    pub fn bottlenecks(&self, plan: &CapacityPlan) -> Vec<Bottleneck> {
        self.identify_bottlenecks(plan, self.settings.bottleneck_threshold)
    }

    /// 負荷平準
    ///
    /// 逐一處理超載期間，把有寬裕的可移動負荷整筆移到剩餘產能足夠的相鄰期間；
    /// 往後不超過最晚可負荷日，往前不早於開工日且不進入凍結區。
    /// 候選負荷依寬裕天數多、工時大、ID 小排序；目標期間依剩餘產能多、日期早排序。
    pub fn level_load(&self, plan: &mut CapacityPlan) -> LevelingResult {
        let mut result = LevelingResult::default();
        let work_center_ids: Vec<String> = plan.profiles.keys().cloned().collect();

        for work_center_id in &work_center_ids {
            let period_count = plan.profiles.get(work_center_id).map_or(0, |p| p.periods.len());
            for index in 0..period_count {
                while let Some((load_id, target_date)) = next_leveling_move(plan, work_center_id, index) {
                    let Some(load) = plan
                        .profiles
                        .get(work_center_id)
                        .and_then(|p| p.periods.get(index))
                        .and_then(|p| p.loads.iter().find(|l| l.id == load_id))
                        .cloned()
                    else {
                        break;
                    };

                    match plan.transfer_load(load_id, load.hours(), work_center_id, target_date) {
                        Ok(hours) => {
                            tracing::debug!(
                                "平準：工作中心 {} 負荷 {} 由 {} 移到 {}",
                                work_center_id,
                                load_id,
                                load.load_date,
                                target_date
                            );
                            result.moves.push(LoadMove {
                                load_id,
                                source_id: load.source_id,
                                work_center_id: work_center_id.clone(),
                                from_date: load.load_date,
                                to_date: target_date,
                                hours,
                            });
                        }
                        Err(e) => {
                            tracing::warn!("平準移轉失敗: {}", e);
                            break;
                        }
                    }
                }
            }
        }

        result.hard_bottlenecks = plan.overloaded_periods();
        tracing::info!(
            "負荷平準完成：移動 {} 筆（{} 小時），剩餘瓶頸 {} 個",
            result.moves.len(),
            result.hours_moved(),
            result.hard_bottlenecks.len()
        );
        result
    }

    /// 自 `desired_date` 起向後找第一個剩餘產能足夠的期間
    pub fn find_earliest_available(
        &self,
        plan: &CapacityPlan,
        work_center_id: &str,
        desired_date: NaiveDate,
        required_hours: Decimal,
    ) -> Option<NaiveDate> {
        plan.profile(work_center_id)?
            .periods
            .iter()
            .filter(|period| period.end_date > desired_date)
            .find(|period| period.remaining_capacity() >= required_hours)
            .map(|period| period.start_date.max(desired_date))
    }
}

/// 超載期間的下一筆平準移動：（負荷 ID, 目標日期）
fn next_leveling_move(plan: &CapacityPlan, work_center_id: &str, index: usize) -> Option<(Uuid, NaiveDate)> {
    let periods = &plan.profile(work_center_id)?.periods;
    let period = periods.get(index)?;
    if !period.is_overloaded() {
        return None;
    }

    let mut candidates: Vec<&CapacityLoad> = period
        .loads
        .iter()
        .filter(|load| load.hours() > Decimal::ZERO && plan.is_movable(load))
        .collect();
    candidates.sort_by(|a, b| {
        plan.slack_days(b)
            .cmp(&plan.slack_days(a))
            .then_with(|| b.hours().cmp(&a.hours()))
            .then_with(|| a.id.cmp(&b.id))
    });

    let earlier = index.checked_sub(1).and_then(|i| periods.get(i));
    let later = periods.get(index + 1);

    candidates.into_iter().find_map(|load| {
        let mut targets: Vec<(Decimal, NaiveDate)> = Vec::with_capacity(2);

        if let Some(prev) = earlier {
            let date = prev.end_date.pred_opt().unwrap_or(prev.start_date);
            let not_before_start = plan.window(load).map_or(true, |w| date >= w.start_date);
            if not_before_start
                && plan.horizon.zone_for(date) != PlanningZone::Frozen
                && prev.remaining_capacity() >= load.hours()
            {
                targets.push((prev.remaining_capacity(), date));
            }
        }
        if let Some(next) = later {
            if next.start_date <= plan.latest_date(load) && next.remaining_capacity() >= load.hours() {
                targets.push((next.remaining_capacity(), next.start_date));
            }
        }

        targets
            .into_iter()
            .min_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(&b.1)))
            .map(|(_, date)| (load.id, date))
    })
}
