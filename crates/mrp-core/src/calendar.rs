//! 工作日曆模型

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::{MrpError, Result};

/// 工作日曆
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkCalendar {
    /// 工作日（週一到週日，true表示工作日）
    /// 索引 0 = 週一, 1 = 週二, ..., 6 = 週日
    pub working_days: [bool; 7],

    /// 節假日列表
    pub holidays: Vec<NaiveDate>,

    /// 日曆ID
    pub calendar_id: String,
}

impl WorkCalendar {
    /// 創建新的工作日曆（預設週一到週五為工作日）
    pub fn new(calendar_id: String) -> Self {
        Self {
            working_days: [true, true, true, true, true, false, false],
            calendar_id,
            holidays: Vec::new(),
        }
    }

    /// 創建 24/7 日曆（所有日子都是工作日）
    pub fn new_24_7(calendar_id: String) -> Self {
        Self {
            working_days: [true; 7],
            calendar_id,
            holidays: Vec::new(),
        }
    }

    /// 建構器模式：設置工作日
    pub fn with_working_days(mut self, working_days: [bool; 7]) -> Self {
        self.working_days = working_days;
        self
    }

    /// 建構器模式：添加節假日
    pub fn with_holidays(mut self, holidays: Vec<NaiveDate>) -> Self {
        self.holidays = holidays;
        self.holidays.sort();
        self
    }

    /// 添加節假日
    pub fn add_holiday(&mut self, date: NaiveDate) {
        if let Err(pos) = self.holidays.binary_search(&date) {
            self.holidays.insert(pos, date);
        }
    }

    /// 檢查是否為工作日
    pub fn is_working_day(&self, date: NaiveDate) -> bool {
        if self.holidays.binary_search(&date).is_ok() {
            return false;
        }

        let weekday_index = date.weekday().num_days_from_monday() as usize;
        self.working_days[weekday_index]
    }

    fn has_working_days(&self) -> bool {
        self.working_days.iter().any(|&w| w)
    }

    /// 計算工作日（向前推算）
    pub fn add_working_days(&self, start_date: NaiveDate, days: u32) -> Result<NaiveDate> {
        if days > 0 && !self.has_working_days() {
            return Err(MrpError::InvalidDate(format!(
                "日曆 {} 沒有任何工作日",
                self.calendar_id
            )));
        }

        let mut current = start_date;
        let mut remaining = days;

        while remaining > 0 {
            current = current
                .succ_opt()
                .ok_or_else(|| MrpError::InvalidDate(format!("日期溢出: {}", current)))?;
            if self.is_working_day(current) {
                remaining -= 1;
            }
        }

        Ok(current)
    }

    /// 計算工作日（向後推算）
    pub fn subtract_working_days(&self, start_date: NaiveDate, days: u32) -> Result<NaiveDate> {
        if days > 0 && !self.has_working_days() {
            return Err(MrpError::InvalidDate(format!(
                "日曆 {} 沒有任何工作日",
                self.calendar_id
            )));
        }

        let mut current = start_date;
        let mut remaining = days;

        while remaining > 0 {
            current = current
                .pred_opt()
                .ok_or_else(|| MrpError::InvalidDate(format!("日期溢出: {}", current)))?;
            if self.is_working_day(current) {
                remaining -= 1;
            }
        }

        Ok(current)
    }

    /// 計算兩個日期之間的工作日數量（不含起日，含迄日）
    pub fn working_days_between(&self, start: NaiveDate, end: NaiveDate) -> u32 {
        start
            .iter_days()
            .skip(1)
            .take_while(|d| *d <= end)
            .filter(|d| self.is_working_day(*d))
            .count() as u32
    }

    /// 獲取下一個工作日
    pub fn next_working_day(&self, date: NaiveDate) -> Result<NaiveDate> {
        self.add_working_days(date, 1)
    }

    /// 獲取上一個工作日
    pub fn previous_working_day(&self, date: NaiveDate) -> Result<NaiveDate> {
        self.subtract_working_days(date, 1)
    }
}

impl Default for WorkCalendar {
    fn default() -> Self {
        Self::new("DEFAULT".to_string())
    }
}

/// 排班表資料結構（用於從 ERP 系統載入）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShiftSchedule {
    /// 日曆ID
    pub calendar_id: String,
    /// 工作日配置（週一=0, 週二=1, ..., 週日=6）
    pub working_days: Vec<bool>,
    /// 國定假日
    pub holidays: Vec<NaiveDate>,
}

impl WorkCalendar {
    /// 從排班表創建工作日曆
    ///
    /// ```
    /// use mrp_core::{ShiftSchedule, WorkCalendar};
    ///
    /// // 週一到週六上班，週日休息
    /// let schedule = ShiftSchedule {
    ///     calendar_id: "FACTORY-A".to_string(),
    ///     working_days: vec![true, true, true, true, true, true, false],
    ///     holidays: vec![],
    /// };
    ///
    /// let calendar = WorkCalendar::from_shift_schedule(schedule);
    /// assert!(calendar.working_days[5]);
    /// assert!(!calendar.working_days[6]);
    /// ```
    pub fn from_shift_schedule(schedule: ShiftSchedule) -> Self {
        let mut working_days = [false; 7];
        for (slot, &is_working) in working_days.iter_mut().zip(schedule.working_days.iter()) {
            *slot = is_working;
        }

        Self::new(schedule.calendar_id)
            .with_working_days(working_days)
            .with_holidays(schedule.holidays)
    }

    /// 創建降級日曆（當無法取得排班表時使用）
    ///
    /// 策略：使用 24/7 日曆確保 MRP 計算不會因為缺少排班資料而中斷
    pub fn fallback_calendar() -> Self {
        Self::new_24_7("FALLBACK-24/7".to_string())
    }
}
