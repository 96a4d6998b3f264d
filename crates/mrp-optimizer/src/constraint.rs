//! 產能瓶頸解決：建議產生、排序與自動處置
//!
//! 建議依優先序高、成本低、目標日期早、目標資源 ID 小、處置方式宣告順序排序。
//! 自動處置只套用可自動執行的建議，且一律在計劃副本上進行；模擬模式不寫回。

use chrono::NaiveDate;
use mrp_core::{
    Bottleneck, CapacityLoad, CapacityPeriod, CapacityProfile, CapacityResolutionSuggestion, MrpError, PlanningZone,
    ResolutionAction, ResolverPreferences, Result, WorkCenter, WorkCenterProvider,
};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use crate::capacity::CapacityPlan;

const PRIORITY_ALTERNATIVE: u32 = 100;
const PRIORITY_RESCHEDULE: u32 = 90;
const PRIORITY_OVERTIME: u32 = 80;
const PRIORITY_RESCHEDULE_APPROVAL: u32 = 60;
const PRIORITY_SUBCONTRACT: u32 = 50;
const PRIORITY_SPLIT: u32 = 40;

/// 自動處置結果
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolutionOutcome {
    pub work_center_id: String,
    pub bottleneck_date: NaiveDate,
    pub initial_overload: Decimal,
    pub hours_resolved: Decimal,
    pub remaining_overload: Decimal,
    pub resolved: bool,
    pub simulated: bool,
    /// 已套用（或模擬套用）的建議，工時為實際處置量
    pub actions: Vec<CapacityResolutionSuggestion>,
}

/// 單一瓶頸的計算內容
struct BottleneckContext<'p> {
    plan: &'p CapacityPlan,
    center: WorkCenter,
    profile: &'p CapacityProfile,
    index: usize,
    overload: Decimal,
    /// 非確定工單的負荷，工時大者優先
    candidates: Vec<&'p CapacityLoad>,
}

impl<'p> BottleneckContext<'p> {
    fn period(&self) -> &'p CapacityPeriod {
        &self.profile.periods[self.index]
    }

    fn later_periods(&self, limit: usize) -> impl Iterator<Item = (usize, &'p CapacityPeriod)> {
        let profile: &'p CapacityProfile = self.profile;
        profile.periods.iter().enumerate().skip(self.index + 1).take(limit)
    }
}

/// 產能解決器
pub struct CapacityResolver<'a> {
    work_centers: &'a dyn WorkCenterProvider,
    preferences: ResolverPreferences,
}

impl<'a> CapacityResolver<'a> {
    pub fn new(work_centers: &'a dyn WorkCenterProvider) -> Self {
        Self {
            work_centers,
            preferences: ResolverPreferences::default(),
        }
    }

    pub fn with_preferences(mut self, preferences: ResolverPreferences) -> Self {
        self.preferences = preferences;
        self
    }

    pub fn preferences(&self) -> &ResolverPreferences {
        &self.preferences
    }

    /// 產生已排序的解決建議；期間未超載時回傳空集合
    pub fn suggest(&self, plan: &CapacityPlan, bottleneck: &Bottleneck) -> Vec<CapacityResolutionSuggestion> {
        let Some(context) = self.context(plan, bottleneck) else {
            return Vec::new();
        };

        let mut suggestions = Vec::new();
        if self.preferences.is_enabled(ResolutionAction::AlternativeWorkCenter) {
            suggestions.extend(self.alternatives(&context));
        }
        if self.preferences.is_enabled(ResolutionAction::Overtime) {
            suggestions.extend(self.overtime(&context));
        }
        if self.preferences.is_enabled(ResolutionAction::Reschedule) {
            suggestions.extend(self.reschedules(&context));
        }
        if self.preferences.is_enabled(ResolutionAction::Subcontract) {
            suggestions.extend(self.subcontract(&context));
        }
        if self.preferences.is_enabled(ResolutionAction::Split) {
            suggestions.extend(self.split(&context));
        }

        rank(&mut suggestions);
        tracing::debug!(
            "工作中心 {} 於 {} 超載 {} 小時，產生 {} 筆建議",
            bottleneck.work_center_id,
            bottleneck.period_start,
            context.overload,
            suggestions.len()
        );
        suggestions
    }

    /// 依序套用可自動執行的建議，直到超載消除或建議用盡
    pub fn auto_resolve(&self, plan: &mut CapacityPlan, bottleneck: &Bottleneck, simulate: bool) -> ResolutionOutcome {
        let mut scratch = plan.clone();
        let initial_overload = overload_of(&scratch, bottleneck);
        let mut actions = Vec::new();

        for suggestion in self
            .suggest(&scratch, bottleneck)
            .into_iter()
            .filter(|s| s.auto_applicable)
        {
            if overload_of(&scratch, bottleneck) <= Decimal::ZERO {
                break;
            }
            match self.apply(&mut scratch, &suggestion) {
                Ok(hours) if hours > Decimal::ZERO => actions.push(CapacityResolutionSuggestion {
                    hours_resolved: hours,
                    ..suggestion
                }),
                Ok(_) => {}
                Err(e) => tracing::warn!("建議 {} 套用失敗: {}", suggestion.action.as_str(), e),
            }
        }

        let remaining_overload = overload_of(&scratch, bottleneck);
        let outcome = ResolutionOutcome {
            work_center_id: bottleneck.work_center_id.clone(),
            bottleneck_date: bottleneck.period_start,
            initial_overload,
            hours_resolved: initial_overload - remaining_overload,
            remaining_overload,
            resolved: remaining_overload <= Decimal::ZERO,
            simulated: simulate,
            actions,
        };
        if !simulate {
            *plan = scratch;
        }

        tracing::info!(
            "工作中心 {} 於 {} 自動處置 {} 筆，解決 {} 小時，剩餘超載 {} 小時{}",
            outcome.work_center_id,
            outcome.bottleneck_date,
            outcome.actions.len(),
            outcome.hours_resolved,
            outcome.remaining_overload,
            if simulate { "（模擬）" } else { "" }
        );
        outcome
    }

    /// 依序處置多個瓶頸；模擬模式下後面的瓶頸看得到前面的模擬結果
    pub fn auto_resolve_all(
        &self,
        plan: &mut CapacityPlan,
        bottlenecks: &[Bottleneck],
        simulate: bool,
    ) -> Vec<ResolutionOutcome> {
        let mut scratch = plan.clone();
        let outcomes = bottlenecks
            .iter()
            .map(|bottleneck| {
                let mut outcome = self.auto_resolve(&mut scratch, bottleneck, false);
                outcome.simulated = simulate;
                outcome
            })
            .collect();
        if !simulate {
            *plan = scratch;
        }
        outcomes
    }

    /// 套用單一建議（需核准者由呼叫端核准後套用），回傳實際處置工時
    pub fn apply(&self, plan: &mut CapacityPlan, suggestion: &CapacityResolutionSuggestion) -> Result<Decimal> {
        let overload = plan
            .period(&suggestion.work_center_id, suggestion.bottleneck_date)
            .map(CapacityPeriod::overload)
            .ok_or_else(|| MrpError::WorkCenterNotFound(suggestion.work_center_id.clone()))?;
        let budget = suggestion.hours_resolved.min(overload);
        if budget <= Decimal::ZERO {
            return Ok(Decimal::ZERO);
        }

        match suggestion.action {
            ResolutionAction::Overtime => {
                let period = plan
                    .period_mut(&suggestion.work_center_id, suggestion.bottleneck_date)
                    .ok_or_else(|| MrpError::WorkCenterNotFound(suggestion.work_center_id.clone()))?;
                period.available_hours += budget;
                Ok(budget)
            }
            ResolutionAction::Subcontract => subcontract_loads(plan, suggestion, budget),
            ResolutionAction::AlternativeWorkCenter | ResolutionAction::Reschedule | ResolutionAction::Split => {
                let target_center = suggestion
                    .target_resource
                    .clone()
                    .unwrap_or_else(|| suggestion.work_center_id.clone());
                let target_date = suggestion.target_date.unwrap_or(suggestion.bottleneck_date);
                move_loads(plan, suggestion, budget, &target_center, target_date)
            }
        }
    }

    fn context<'p>(&self, plan: &'p CapacityPlan, bottleneck: &Bottleneck) -> Option<BottleneckContext<'p>> {
        let profile = plan.profile(&bottleneck.work_center_id)?;
        let index = profile.period_index(bottleneck.period_start)?;
        let period = profile.periods.get(index)?;
        let overload = period.overload();
        if overload <= Decimal::ZERO {
            return None;
        }
        let Some(center) = self.work_centers.work_center(&bottleneck.work_center_id) else {
            tracing::warn!("找不到工作中心 {}，無法產生建議", bottleneck.work_center_id);
            return None;
        };

        let mut candidates: Vec<&CapacityLoad> = period
            .loads
            .iter()
            .filter(|load| !load.is_firm() && load.hours() > Decimal::ZERO)
            .collect();
        candidates.sort_by(|a, b| b.hours().cmp(&a.hours()).then_with(|| a.id.cmp(&b.id)));

        Some(BottleneckContext {
            plan,
            center,
            profile,
            index,
            overload,
            candidates,
        })
    }

    fn base(
        &self,
        context: &BottleneckContext<'_>,
        action: ResolutionAction,
        default_priority: u32,
        hours: Decimal,
    ) -> CapacityResolutionSuggestion {
        CapacityResolutionSuggestion {
            action,
            work_center_id: context.center.id.clone(),
            bottleneck_date: context.period().start_date,
            hours_resolved: hours,
            priority: self.preferences.priority_for(action, default_priority),
            estimated_cost: Decimal::ZERO,
            lead_time_impact_days: 0,
            auto_applicable: false,
            requires_approval: true,
            target_resource: None,
            target_date: None,
            load_ids: Vec::new(),
            description: String::new(),
        }
    }

    /// 同群組的替代工作中心；費率相同時成本為 0
    fn alternatives(&self, context: &BottleneckContext<'_>) -> Vec<CapacityResolutionSuggestion> {
        let movable: Vec<&CapacityLoad> = context
            .candidates
            .iter()
            .copied()
            .filter(|load| context.plan.is_movable(load))
            .collect();
        let (pool, auto) = if movable.is_empty() {
            (context.candidates.clone(), false)
        } else {
            (movable, true)
        };
        let pool_hours: Decimal = pool.iter().map(|load| load.hours()).sum();
        if pool_hours <= Decimal::ZERO {
            return Vec::new();
        }

        let mut alternatives: Vec<WorkCenter> = self
            .work_centers
            .work_centers()
            .into_iter()
            .filter(|wc| wc.is_alternative_for(&context.center))
            .collect();
        alternatives.sort_by(|a, b| a.id.cmp(&b.id));

        let period_start = context.period().start_date;
        alternatives
            .into_iter()
            .filter_map(|alternative| {
                let remaining = context.plan.period(&alternative.id, period_start)?.remaining_capacity();
                let hours = context.overload.min(remaining).min(pool_hours);
                if hours <= Decimal::ZERO {
                    return None;
                }
                let rate_gap = (alternative.hourly_rate - context.center.hourly_rate).max(Decimal::ZERO);
                Some(CapacityResolutionSuggestion {
                    estimated_cost: hours * rate_gap,
                    auto_applicable: auto,
                    requires_approval: !auto,
                    target_date: Some(period_start),
                    load_ids: pick_loads(&pool, hours),
                    description: format!("改派 {} 小時到替代工作中心 {}", hours, alternative.id),
                    target_resource: Some(alternative.id),
                    ..self.base(context, ResolutionAction::AlternativeWorkCenter, PRIORITY_ALTERNATIVE, hours)
                })
            })
            .collect()
    }

    /// 加班，以行事曆加班上限為限；可用工時已含加班時不再建議
    fn overtime(&self, context: &BottleneckContext<'_>) -> Option<CapacityResolutionSuggestion> {
        if context.plan.include_overtime {
            return None;
        }
        let period = context.period();
        let capacity = context
            .center
            .overtime_capacity_between(period.start_date, period.end_date);
        let hours = context.overload.min(capacity);
        if hours <= Decimal::ZERO {
            return None;
        }
        let rate = context.center.effective_overtime_rate();
        Some(CapacityResolutionSuggestion {
            estimated_cost: hours * rate,
            target_resource: Some(context.center.id.clone()),
            target_date: Some(period.start_date),
            description: format!("{} 加班 {} 小時（費率 {}）", context.center.id, hours, rate),
            ..self.base(context, ResolutionAction::Overtime, PRIORITY_OVERTIME, hours)
        })
    }

    /// 整筆負荷延到後續最近、剩餘產能足夠的期間
    ///
    /// 只有位於自由區且仍在最晚可負荷日內者可自動執行。凍結區與半凍結區的
    /// 延後一律需核准，即使延後後不會遲交。
    fn reschedules(&self, context: &BottleneckContext<'_>) -> Vec<CapacityResolutionSuggestion> {
        let mut spare: Vec<(usize, Decimal)> = context
            .later_periods(self.preferences.max_reschedule_periods)
            .map(|(index, period)| (index, period.remaining_capacity()))
            .collect();

        // (期間索引, 可自動) → (負荷, 工時, 最大延後天數)
        let mut groups: Vec<((usize, bool), Vec<Uuid>, Decimal, i64)> = Vec::new();
        let mut covered = Decimal::ZERO;

        for load in &context.candidates {
            if covered >= context.overload {
                break;
            }
            let Some(slot) = spare.iter_mut().find(|(_, remaining)| *remaining >= load.hours()) else {
                continue;
            };
            slot.1 -= load.hours();
            let target = &context.profile.periods[slot.0];

            let on_time = target.start_date <= context.plan.latest_date(load);
            let auto = on_time && context.plan.zone_for(load) == PlanningZone::Liquid;
            let delay = (target.start_date - load.load_date).num_days();
            let key = (slot.0, auto);

            match groups.iter_mut().find(|group| group.0 == key) {
                Some(group) => {
                    group.1.push(load.id);
                    group.2 += load.hours();
                    group.3 = group.3.max(delay);
                }
                None => groups.push((key, vec![load.id], load.hours(), delay)),
            }
            covered += load.hours();
        }

        groups
            .into_iter()
            .map(|((index, auto), load_ids, hours, delay)| {
                let target = &context.profile.periods[index];
                let hours = hours.min(context.overload);
                let priority = if auto {
                    PRIORITY_RESCHEDULE
                } else {
                    PRIORITY_RESCHEDULE_APPROVAL
                };
                CapacityResolutionSuggestion {
                    lead_time_impact_days: delay,
                    auto_applicable: auto,
                    requires_approval: !auto,
                    target_resource: Some(context.center.id.clone()),
                    target_date: Some(target.start_date),
                    description: format!("{} 筆負荷共 {} 小時延到 {}", load_ids.len(), hours, target.start_date),
                    load_ids,
                    ..self.base(context, ResolutionAction::Reschedule, priority, hours)
                }
            })
            .collect()
    }

    /// 外包；無外包費率時以工時費率乘上加成
    fn subcontract(&self, context: &BottleneckContext<'_>) -> Option<CapacityResolutionSuggestion> {
        let pool_hours: Decimal = context.candidates.iter().map(|load| load.hours()).sum();
        let hours = context.overload.min(pool_hours);
        if hours <= Decimal::ZERO {
            return None;
        }
        let rate = context
            .center
            .subcontract_rate
            .unwrap_or(context.center.hourly_rate * self.preferences.subcontract_premium);
        Some(CapacityResolutionSuggestion {
            estimated_cost: hours * rate,
            load_ids: pick_loads(&context.candidates, hours),
            description: format!("外包 {} 小時（費率 {}）", hours, rate),
            ..self.base(context, ResolutionAction::Subcontract, PRIORITY_SUBCONTRACT, hours)
        })
    }

    /// 拆出最大負荷的一部分到後續最近有剩餘產能的期間
    fn split(&self, context: &BottleneckContext<'_>) -> Option<CapacityResolutionSuggestion> {
        let load = context.candidates.first()?;
        let (_, target) = context
            .later_periods(self.preferences.max_reschedule_periods)
            .find(|(_, period)| period.remaining_capacity() > Decimal::ZERO)?;
        let hours = context
            .overload
            .min(load.hours())
            .min(target.remaining_capacity());
        Some(CapacityResolutionSuggestion {
            lead_time_impact_days: (target.start_date - load.load_date).num_days(),
            target_resource: Some(context.center.id.clone()),
            target_date: Some(target.start_date),
            load_ids: vec![load.id],
            description: format!("拆分負荷 {} 小時到 {}", hours, target.start_date),
            ..self.base(context, ResolutionAction::Split, PRIORITY_SPLIT, hours)
        })
    }
}

/// 建議排序：優先序高 → 成本低 → 目標日期早 → 目標資源 → 處置方式
fn rank(suggestions: &mut [CapacityResolutionSuggestion]) {
    suggestions.sort_by(|a, b| {
        b.priority
            .cmp(&a.priority)
            .then_with(|| a.estimated_cost.cmp(&b.estimated_cost))
            .then_with(|| a.target_date.cmp(&b.target_date))
            .then_with(|| a.target_resource.cmp(&b.target_resource))
            .then_with(|| a.action.cmp(&b.action))
    });
}

/// 依序挑選負荷直到工時足夠
fn pick_loads(loads: &[&CapacityLoad], hours: Decimal) -> Vec<Uuid> {
    let mut picked = Vec::new();
    let mut covered = Decimal::ZERO;
    for load in loads {
        if covered >= hours {
            break;
        }
        picked.push(load.id);
        covered += load.hours();
    }
    picked
}

fn overload_of(plan: &CapacityPlan, bottleneck: &Bottleneck) -> Decimal {
    plan.period(&bottleneck.work_center_id, bottleneck.period_start)
        .map_or(Decimal::ZERO, CapacityPeriod::overload)
}

fn load_hours(plan: &CapacityPlan, suggestion: &CapacityResolutionSuggestion, load_id: Uuid) -> Option<Decimal> {
    plan.period(&suggestion.work_center_id, suggestion.bottleneck_date)?
        .loads
        .iter()
        .find(|load| load.id == load_id)
        .map(CapacityLoad::hours)
}

/// 把建議中的負荷移到目標期間，受剩餘預算與目標剩餘產能限制
fn move_loads(
    plan: &mut CapacityPlan,
    suggestion: &CapacityResolutionSuggestion,
    budget: Decimal,
    target_center: &str,
    target_date: NaiveDate,
) -> Result<Decimal> {
    let mut left = budget;
    let mut moved = Decimal::ZERO;

    for load_id in &suggestion.load_ids {
        if left <= Decimal::ZERO {
            break;
        }
        let Some(hours) = load_hours(plan, suggestion, *load_id) else {
            continue;
        };
        let room = plan
            .period(target_center, target_date)
            .map(CapacityPeriod::remaining_capacity)
            .ok_or_else(|| MrpError::InvalidDate(format!("{} 於 {} 沒有產能期間", target_center, target_date)))?;
        let amount = hours.min(left).min(room);
        if amount <= Decimal::ZERO {
            break;
        }
        let done = plan.transfer_load(*load_id, amount, target_center, target_date)?;
        left -= done;
        moved += done;
    }

    Ok(moved)
}

/// 外包的負荷移出工作中心
fn subcontract_loads(
    plan: &mut CapacityPlan,
    suggestion: &CapacityResolutionSuggestion,
    budget: Decimal,
) -> Result<Decimal> {
    let mut left = budget;
    let mut moved = Decimal::ZERO;

    for load_id in &suggestion.load_ids {
        if left <= Decimal::ZERO {
            break;
        }
        let period = plan
            .period_mut(&suggestion.work_center_id, suggestion.bottleneck_date)
            .ok_or_else(|| MrpError::WorkCenterNotFound(suggestion.work_center_id.clone()))?;
        let Some(mut load) = period.take_load(*load_id) else {
            continue;
        };
        let part = if left < load.hours() {
            let part = load.split_off(left);
            period.add_load(load);
            part
        } else {
            load
        };
        left -= part.hours();
        moved += part.hours();
        plan.subcontracted_loads.push(part);
    }

    Ok(moved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use mrp_core::{BucketSize, InMemoryWorkCenters, LoadSourceType, PlanningHorizon, WorkCenterCalendar};

    use crate::capacity::OrderWindow;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 11, day).unwrap()
    }

    /// WC-A、WC-B 同屬焊接群組；WC-A 每日可加班 2 小時
    fn work_centers() -> InMemoryWorkCenters {
        InMemoryWorkCenters::new()
            .with_work_center(
                WorkCenter::new("WC-A", Decimal::from(50))
                    .with_group("WELD")
                    .with_calendar(WorkCenterCalendar::default().with_default_overtime(Decimal::from(2))),
            )
            .with_work_center(WorkCenter::new("WC-B", Decimal::from(50)).with_group("WELD"))
            .with_work_center(WorkCenter::new("WC-C", Decimal::from(30)))
    }

    fn load(work_center: &str, hours: i64, day: u32, source_type: LoadSourceType) -> CapacityLoad {
        CapacityLoad::new(Uuid::new_v4(), source_type, work_center, Decimal::ZERO, Decimal::from(hours), date(day))
    }

    /// 三個工作中心各四週、每週 40 小時；負荷依日期排入並記錄（負荷日 ~ 到期日）窗口
    fn plan(frozen_days: u32, loads: Vec<(CapacityLoad, NaiveDate)>) -> CapacityPlan {
        let horizon = PlanningHorizon::from_days(date(3), 28, frozen_days, 0, BucketSize::Week).unwrap();
        let mut plan = CapacityPlan::new(horizon);
        for id in ["WC-A", "WC-B", "WC-C"] {
            let periods = (0..4)
                .map(|week| {
                    let start = date(3) + Duration::weeks(week);
                    CapacityPeriod::new(id, start, start + Duration::weeks(1), Decimal::from(40))
                })
                .collect();
            plan.profiles.insert(id.to_string(), CapacityProfile::new(id, periods));
        }
        for (load, due_date) in loads {
            plan.windows.insert(
                load.source_id,
                OrderWindow {
                    source_type: load.source_type,
                    product_id: "FRAME-001".to_string(),
                    start_date: load.load_date,
                    due_date,
                },
            );
            let work_center = load.work_center_id.clone();
            plan.period_mut(&work_center, load.load_date).unwrap().add_load(load);
        }
        plan
    }

    /// WC-A 第一週 30 + 20 = 50 小時（超載 10）；WC-B 第一週已排 34 小時
    fn overloaded(frozen_days: u32, due_date: NaiveDate) -> CapacityPlan {
        plan(
            frozen_days,
            vec![
                (load("WC-A", 30, 3, LoadSourceType::PlannedOrder), due_date),
                (load("WC-A", 20, 4, LoadSourceType::PlannedOrder), due_date),
                (load("WC-B", 34, 3, LoadSourceType::WorkOrder), date(7)),
            ],
        )
    }

    fn bottleneck(plan: &CapacityPlan) -> Bottleneck {
        Bottleneck::from_period(plan.period("WC-A", date(3)).unwrap())
    }

    #[test]
    fn test_suggestions_ranked() {
        let centers = work_centers();
        let resolver = CapacityResolver::new(&centers);
        let plan = overloaded(0, date(28));

        let suggestions = resolver.suggest(&plan, &bottleneck(&plan));
        let actions: Vec<_> = suggestions.iter().map(|s| s.action).collect();

        assert_eq!(
            actions,
            vec![
                ResolutionAction::AlternativeWorkCenter,
                ResolutionAction::Reschedule,
                ResolutionAction::Overtime,
                ResolutionAction::Subcontract,
                ResolutionAction::Split,
            ]
        );

        let alternative = &suggestions[0];
        assert_eq!(alternative.target_resource.as_deref(), Some("WC-B"));
        assert_eq!(alternative.hours_resolved, Decimal::from(6));
        assert_eq!(alternative.estimated_cost, Decimal::ZERO);
        assert!(alternative.auto_applicable);

        let reschedule = &suggestions[1];
        assert_eq!(reschedule.target_date, Some(date(10)));
        assert_eq!(reschedule.hours_resolved, Decimal::from(10));
        assert_eq!(reschedule.lead_time_impact_days, 7);
        assert!(reschedule.auto_applicable);

        // 10 × 50 × 1.5
        let overtime = &suggestions[2];
        assert_eq!(overtime.estimated_cost, Decimal::from(750));
        assert!(overtime.requires_approval);
        assert!(!overtime.auto_applicable);

        // 10 × 50 × 1.3
        assert_eq!(suggestions[3].estimated_cost, Decimal::from(650));
        assert!(suggestions[3].requires_approval);
    }

    #[test]
    fn test_not_overloaded_has_no_suggestions() {
        let centers = work_centers();
        let resolver = CapacityResolver::new(&centers);
        let plan = plan(0, vec![(load("WC-A", 38, 3, LoadSourceType::PlannedOrder), date(28))]);

        let target = bottleneck(&plan);
        assert!(resolver.suggest(&plan, &target).is_empty());
    }

    #[test]
    fn test_auto_resolve_covers_overload() {
        let centers = work_centers();
        let resolver = CapacityResolver::new(&centers);
        let mut plan = overloaded(0, date(28));
        let total = plan.total_loaded_hours();

        let target = bottleneck(&plan);
        let outcome = resolver.auto_resolve(&mut plan, &target, false);

        assert!(outcome.resolved);
        assert_eq!(outcome.initial_overload, Decimal::from(10));
        assert_eq!(outcome.hours_resolved, Decimal::from(10));
        assert_eq!(outcome.actions.len(), 2);
        assert_eq!(outcome.actions[0].action, ResolutionAction::AlternativeWorkCenter);
        assert_eq!(outcome.actions[0].hours_resolved, Decimal::from(6));
        assert_eq!(outcome.actions[1].action, ResolutionAction::Reschedule);
        assert_eq!(outcome.actions[1].hours_resolved, Decimal::from(4));

        assert_eq!(plan.period("WC-A", date(3)).unwrap().loaded_hours(), Decimal::from(40));
        assert_eq!(plan.period("WC-B", date(3)).unwrap().loaded_hours(), Decimal::from(40));
        assert_eq!(plan.period("WC-A", date(10)).unwrap().loaded_hours(), Decimal::from(4));
        assert_eq!(plan.total_loaded_hours(), total);
    }

    #[test]
    fn test_simulate_leaves_plan_untouched() {
        let centers = work_centers();
        let resolver = CapacityResolver::new(&centers);
        let mut plan = overloaded(0, date(28));
        let before = plan.clone();

        let target = bottleneck(&plan);
        let outcome = resolver.auto_resolve(&mut plan, &target, true);

        assert!(outcome.simulated);
        assert!(outcome.resolved);
        assert_eq!(outcome.actions.len(), 2);
        assert_eq!(plan, before);
    }

    #[test]
    fn test_auto_resolve_reports_remaining_overload() {
        let centers = work_centers();
        let resolver = CapacityResolver::new(&centers);
        // 到期日 11/7：延到下週會遲交，需核准
        let mut plan = overloaded(0, date(7));

        let target = bottleneck(&plan);
        let suggestions = resolver.suggest(&plan, &target);
        let reschedule = suggestions
            .iter()
            .find(|s| s.action == ResolutionAction::Reschedule)
            .unwrap();
        assert!(!reschedule.auto_applicable);
        assert_eq!(reschedule.priority, PRIORITY_RESCHEDULE_APPROVAL);

        let outcome = resolver.auto_resolve(&mut plan, &target, false);
        assert!(!outcome.resolved);
        assert_eq!(outcome.hours_resolved, Decimal::from(6));
        assert_eq!(outcome.remaining_overload, Decimal::from(4));
        assert_eq!(outcome.actions.len(), 1);
    }

    #[test]
    fn test_frozen_zone_requires_approval() {
        let centers = work_centers();
        let resolver = CapacityResolver::new(&centers);
        let mut plan = overloaded(7, date(28));

        let target = bottleneck(&plan);
        let suggestions = resolver.suggest(&plan, &target);
        assert!(!suggestions.is_empty());
        assert!(suggestions.iter().all(|s| !s.auto_applicable));

        let outcome = resolver.auto_resolve(&mut plan, &target, false);
        assert!(outcome.actions.is_empty());
        assert_eq!(outcome.remaining_overload, Decimal::from(10));
    }

    #[test]
    fn test_slushy_reschedule_requires_approval() {
        let centers = work_centers();
        let resolver = CapacityResolver::new(&centers);
        let mut plan = overloaded(0, date(28));
        plan.horizon = PlanningHorizon::from_days(date(3), 28, 0, 7, BucketSize::Week).unwrap();

        let target = bottleneck(&plan);
        let suggestions = resolver.suggest(&plan, &target);
        let reschedule = suggestions
            .iter()
            .find(|s| s.action == ResolutionAction::Reschedule)
            .unwrap();
        assert!(!reschedule.auto_applicable);
        assert!(reschedule.requires_approval);
        assert_eq!(reschedule.priority, PRIORITY_RESCHEDULE_APPROVAL);

        // 替代工作中心在半凍結區仍可自動改派
        let outcome = resolver.auto_resolve(&mut plan, &target, false);
        assert_eq!(outcome.actions.len(), 1);
        assert_eq!(outcome.actions[0].action, ResolutionAction::AlternativeWorkCenter);
        assert_eq!(outcome.remaining_overload, Decimal::from(4));
    }

    #[test]
    fn test_firm_loads_only_overtime() {
        let centers = work_centers();
        let resolver = CapacityResolver::new(&centers);
        let plan = plan(
            0,
            vec![
                (load("WC-A", 30, 3, LoadSourceType::WorkOrder), date(28)),
                (load("WC-A", 20, 4, LoadSourceType::WorkOrder), date(28)),
            ],
        );

        let suggestions = resolver.suggest(&plan, &bottleneck(&plan));
        assert_eq!(suggestions.len(), 1);
        assert_eq!(suggestions[0].action, ResolutionAction::Overtime);
        assert!(suggestions[0].load_ids.is_empty());
    }

    #[test]
    fn test_preferences_disable_and_reweight() {
        let centers = work_centers();
        let preferences = ResolverPreferences::default()
            .disable(ResolutionAction::Overtime)
            .with_priority(ResolutionAction::Subcontract, 120);
        let resolver = CapacityResolver::new(&centers).with_preferences(preferences);
        let plan = overloaded(0, date(28));

        let suggestions = resolver.suggest(&plan, &bottleneck(&plan));

        assert_eq!(suggestions[0].action, ResolutionAction::Subcontract);
        assert_eq!(suggestions[0].priority, 120);
        assert!(suggestions.iter().all(|s| s.action != ResolutionAction::Overtime));
    }

    #[test]
    fn test_apply_approved_overtime() {
        let centers = work_centers();
        let resolver = CapacityResolver::new(&centers);
        let mut plan = overloaded(0, date(28));

        let overtime = resolver
            .suggest(&plan, &bottleneck(&plan))
            .into_iter()
            .find(|s| s.action == ResolutionAction::Overtime)
            .unwrap();
        let hours = resolver.apply(&mut plan, &overtime).unwrap();

        assert_eq!(hours, Decimal::from(10));
        let period = plan.period("WC-A", date(3)).unwrap();
        assert_eq!(period.available_hours, Decimal::from(50));
        assert!(!period.is_overloaded());
    }

    #[test]
    fn test_apply_approved_subcontract() {
        let centers = work_centers();
        let resolver = CapacityResolver::new(&centers);
        let mut plan = overloaded(0, date(28));
        let total = plan.total_loaded_hours();

        let subcontract = resolver
            .suggest(&plan, &bottleneck(&plan))
            .into_iter()
            .find(|s| s.action == ResolutionAction::Subcontract)
            .unwrap();
        let hours = resolver.apply(&mut plan, &subcontract).unwrap();

        assert_eq!(hours, Decimal::from(10));
        assert_eq!(plan.subcontracted_loads.len(), 1);
        assert_eq!(plan.period("WC-A", date(3)).unwrap().loaded_hours(), Decimal::from(40));
        let outsourced: Decimal = plan.subcontracted_loads.iter().map(CapacityLoad::hours).sum();
        assert_eq!(plan.total_loaded_hours() + outsourced, total);
    }

    #[test]
    fn test_auto_resolve_all_in_sequence() {
        let centers = work_centers();
        let resolver = CapacityResolver::new(&centers);
        let mut plan = overloaded(0, date(28));
        let targets = vec![bottleneck(&plan)];

        let outcomes = resolver.auto_resolve_all(&mut plan, &targets, true);

        assert_eq!(outcomes.len(), 1);
        assert!(outcomes[0].resolved);
        assert!(outcomes[0].simulated);
        assert!(plan.period("WC-A", date(3)).unwrap().is_overloaded());
    }
}
