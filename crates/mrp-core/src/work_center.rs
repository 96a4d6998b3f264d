//! 工作中心與產能日曆

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::WorkCalendar;

/// 加班費率倍數（未設定加班費率時使用）
const DEFAULT_OVERTIME_PREMIUM: Decimal = Decimal::from_parts(15, 0, 0, false, 1);

/// 單日產能日曆記錄
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarEntry {
    pub date: NaiveDate,
    pub is_working: bool,
    /// 每單位可用工時
    pub available_hours: Decimal,
    /// 每單位可加班工時上限
    pub overtime_hours: Decimal,
}

impl CalendarEntry {
    pub fn working(date: NaiveDate, available_hours: Decimal) -> Self {
        Self {
            date,
            is_working: true,
            available_hours,
            overtime_hours: Decimal::ZERO,
        }
    }

    pub fn non_working(date: NaiveDate) -> Self {
        Self {
            date,
            is_working: false,
            available_hours: Decimal::ZERO,
            overtime_hours: Decimal::ZERO,
        }
    }

    pub fn with_overtime(mut self, overtime_hours: Decimal) -> Self {
        self.overtime_hours = overtime_hours;
        self
    }
}

/// 工作中心日曆：基礎排班 + 逐日例外
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkCenterCalendar {
    /// 基礎工作日曆
    pub base: WorkCalendar,
    /// 逐日例外記錄
    pub entries: BTreeMap<NaiveDate, CalendarEntry>,
    /// 基礎工作日的每單位可加班工時
    pub default_overtime_hours: Decimal,
}

impl WorkCenterCalendar {
    pub fn new(base: WorkCalendar) -> Self {
        Self {
            base,
            entries: BTreeMap::new(),
            default_overtime_hours: Decimal::ZERO,
        }
    }

    pub fn with_entry(mut self, entry: CalendarEntry) -> Self {
        self.entries.insert(entry.date, entry);
        self
    }

    pub fn with_default_overtime(mut self, hours: Decimal) -> Self {
        self.default_overtime_hours = hours;
        self
    }

    /// 取得某日的日曆記錄；沒有例外時依基礎日曆推導
    pub fn entry_for(&self, date: NaiveDate, hours_per_day: Decimal) -> CalendarEntry {
        if let Some(entry) = self.entries.get(&date) {
            return entry.clone();
        }
        if self.base.is_working_day(date) {
            CalendarEntry::working(date, hours_per_day).with_overtime(self.default_overtime_hours)
        } else {
            CalendarEntry::non_working(date)
        }
    }
}

impl Default for WorkCenterCalendar {
    fn default() -> Self {
        Self::new(WorkCalendar::default())
    }
}

/// 工作中心
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkCenter {
    pub id: String,
    pub code: String,

    /// 工序類別（同類別的工作中心可互為替代）
    pub work_center_group: Option<String>,

    /// 每小時費率
    pub hourly_rate: Decimal,

    /// 每小時製造費用
    pub overhead_rate: Decimal,

    /// 每小時加班費率（未設定時為費率 × 1.5）
    pub overtime_rate: Option<Decimal>,

    /// 委外每小時費率
    pub subcontract_rate: Option<Decimal>,

    /// 效率（百分比）
    pub efficiency_percentage: Decimal,

    /// 產能單位數（機台/人數）
    pub capacity_units: u32,

    /// 每日工時
    pub hours_per_day: Decimal,

    /// 是否為有限產能
    pub is_finite_capacity: bool,

    pub calendar: WorkCenterCalendar,
}

impl WorkCenter {
    /// 創建新的工作中心（預設 8 小時、1 單位、100% 效率）
    pub fn new(id: impl Into<String>, hourly_rate: Decimal) -> Self {
        let id = id.into();
        Self {
            code: id.clone(),
            id,
            work_center_group: None,
            hourly_rate,
            overhead_rate: Decimal::ZERO,
            overtime_rate: None,
            subcontract_rate: None,
            efficiency_percentage: Decimal::ONE_HUNDRED,
            capacity_units: 1,
            hours_per_day: Decimal::from(8),
            is_finite_capacity: true,
            calendar: WorkCenterCalendar::default(),
        }
    }

    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.work_center_group = Some(group.into());
        self
    }

    pub fn with_capacity(mut self, capacity_units: u32, hours_per_day: Decimal) -> Self {
        self.capacity_units = capacity_units;
        self.hours_per_day = hours_per_day;
        self
    }

    pub fn with_efficiency(mut self, efficiency_percentage: Decimal) -> Self {
        self.efficiency_percentage = efficiency_percentage;
        self
    }

    pub fn with_overtime_rate(mut self, rate: Decimal) -> Self {
        self.overtime_rate = Some(rate);
        self
    }

    pub fn with_subcontract_rate(mut self, rate: Decimal) -> Self {
        self.subcontract_rate = Some(rate);
        self
    }

    pub fn with_calendar(mut self, calendar: WorkCenterCalendar) -> Self {
        self.calendar = calendar;
        self
    }

    /// 實際加班費率
    pub fn effective_overtime_rate(&self) -> Decimal {
        self.overtime_rate
            .unwrap_or(self.hourly_rate * DEFAULT_OVERTIME_PREMIUM)
    }

    fn scale(&self, hours: Decimal) -> Decimal {
        hours * Decimal::from(self.capacity_units) * self.efficiency_percentage / Decimal::ONE_HUNDRED
    }

    /// 某日可用工時 = 工作日工時 × 產能單位 × 效率，可選擇加計加班
    pub fn available_hours(&self, date: NaiveDate, include_overtime: bool) -> Decimal {
        let entry = self.calendar.entry_for(date, self.hours_per_day);
        if !entry.is_working {
            return Decimal::ZERO;
        }
        let base = entry.available_hours.max(Decimal::ZERO);
        let overtime = if include_overtime {
            entry.overtime_hours.max(Decimal::ZERO)
        } else {
            Decimal::ZERO
        };
        self.scale(base + overtime)
    }

    /// 某日可加班工時上限
    pub fn overtime_capacity(&self, date: NaiveDate) -> Decimal {
        let entry = self.calendar.entry_for(date, self.hours_per_day);
        if entry.is_working {
            self.scale(entry.overtime_hours.max(Decimal::ZERO))
        } else {
            Decimal::ZERO
        }
    }

    /// 區間 `[start, end)` 的可用工時
    pub fn available_hours_between(&self, start: NaiveDate, end: NaiveDate, include_overtime: bool) -> Decimal {
        start
            .iter_days()
            .take_while(|d| *d < end)
            .map(|d| self.available_hours(d, include_overtime))
            .sum()
    }

    /// 區間 `[start, end)` 的加班上限
    pub fn overtime_capacity_between(&self, start: NaiveDate, end: NaiveDate) -> Decimal {
        start
            .iter_days()
            .take_while(|d| *d < end)
            .map(|d| self.overtime_capacity(d))
            .sum()
    }

    /// 是否可互為替代
    pub fn is_alternative_for(&self, other: &WorkCenter) -> bool {
        self.id != other.id
            && self.work_center_group.is_some()
            && self.work_center_group == other.work_center_group
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn monday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 11, 3).unwrap()
    }

    #[test]
    fn test_available_hours_weekly() {
        let wc = WorkCenter::new("WC-WELD", Decimal::from(50));
        let next_monday = NaiveDate::from_ymd_opt(2025, 11, 10).unwrap();

        // 週一至週五 × 8 小時
        assert_eq!(wc.available_hours_between(monday(), next_monday, false), Decimal::from(40));
    }

    #[test]
    fn test_capacity_units_and_efficiency() {
        let wc = WorkCenter::new("WC-ASSY", Decimal::from(40))
            .with_capacity(2, Decimal::from(8))
            .with_efficiency(Decimal::from(75));

        assert_eq!(wc.available_hours(monday(), false), Decimal::from(12));
    }

    #[test]
    fn test_calendar_exceptions_and_overtime() {
        let holiday = NaiveDate::from_ymd_opt(2025, 11, 4).unwrap();
        let calendar = WorkCenterCalendar::default()
            .with_entry(CalendarEntry::non_working(holiday))
            .with_entry(CalendarEntry::working(monday(), Decimal::from(10)).with_overtime(Decimal::from(2)));
        let wc = WorkCenter::new("WC-WELD", Decimal::from(50)).with_calendar(calendar);

        assert_eq!(wc.available_hours(holiday, true), Decimal::ZERO);
        assert_eq!(wc.available_hours(monday(), false), Decimal::from(10));
        assert_eq!(wc.available_hours(monday(), true), Decimal::from(12));
        assert_eq!(wc.overtime_capacity(monday()), Decimal::from(2));
    }

    #[test]
    fn test_default_overtime_rate() {
        let wc = WorkCenter::new("WC-WELD", Decimal::from(40));
        assert_eq!(wc.effective_overtime_rate(), Decimal::from(60));
    }

    #[test]
    fn test_alternative_requires_same_group() {
        let a = WorkCenter::new("WC-A", Decimal::ONE).with_group("WELD");
        let b = WorkCenter::new("WC-B", Decimal::ONE).with_group("WELD");
        let c = WorkCenter::new("WC-C", Decimal::ONE);

        assert!(a.is_alternative_for(&b));
        assert!(!a.is_alternative_for(&a));
        assert!(!c.is_alternative_for(&a));
    }
}
