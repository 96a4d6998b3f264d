//! 交期計算

use chrono::{Duration, NaiveDate};
use mrp_core::{LeadTimeMode, MrpError, Result, WorkCalendar};

/// 交期計算器
pub struct LeadTimeCalculator;

impl LeadTimeCalculator {
    /// 提前期偏移：下單日 = 需求日 − 提前期
    pub fn offset_for_lead_time(
        required_date: NaiveDate,
        lead_time_days: u32,
        mode: LeadTimeMode,
        calendar: &WorkCalendar,
    ) -> Result<NaiveDate> {
        match mode {
            LeadTimeMode::CalendarDays => required_date
                .checked_sub_signed(Duration::days(i64::from(lead_time_days)))
                .ok_or_else(|| MrpError::InvalidDate(format!("日期溢出: {} − {} 天", required_date, lead_time_days))),
            LeadTimeMode::WorkingDays => calendar.subtract_working_days(required_date, lead_time_days),
        }
    }

    /// 反向：到貨日 = 下單日 + 提前期
    pub fn add_lead_time(
        order_date: NaiveDate,
        lead_time_days: u32,
        mode: LeadTimeMode,
        calendar: &WorkCalendar,
    ) -> Result<NaiveDate> {
        match mode {
            LeadTimeMode::CalendarDays => order_date
                .checked_add_signed(Duration::days(i64::from(lead_time_days)))
                .ok_or_else(|| MrpError::InvalidDate(format!("日期溢出: {} + {} 天", order_date, lead_time_days))),
            LeadTimeMode::WorkingDays => calendar.add_working_days(order_date, lead_time_days),
        }
    }
}
