//! 生效區間

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// 生效區間 `[from, to)`，任一端可開放
///
/// BOM、BOM 行與途程共用同一個值類型。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Effectivity {
    /// 生效日（含）
    pub from: Option<NaiveDate>,
    /// 失效日（不含）
    pub to: Option<NaiveDate>,
}

impl Effectivity {
    /// 永久有效
    pub fn always() -> Self {
        Self::default()
    }

    pub fn new(from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        Self { from, to }
    }

    /// 自某日起生效
    pub fn starting(from: NaiveDate) -> Self {
        Self {
            from: Some(from),
            to: None,
        }
    }

    /// 某日起失效
    pub fn until(to: NaiveDate) -> Self {
        Self {
            from: None,
            to: Some(to),
        }
    }

    /// 檢查日期是否在生效區間內
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from.map_or(true, |from| date >= from) && self.to.map_or(true, |to| date < to)
    }

    /// 檢查兩個區間是否重疊
    pub fn overlaps(&self, other: &Effectivity) -> bool {
        let starts_before_other_ends = match (self.from, other.to) {
            (Some(from), Some(to)) => from < to,
            _ => true,
        };
        let other_starts_before_self_ends = match (other.from, self.to) {
            (Some(from), Some(to)) => from < to,
            _ => true,
        };
        starts_before_other_ends && other_starts_before_self_ends
    }

    /// 區間是否為空（失效日不晚於生效日）
    pub fn is_empty(&self) -> bool {
        matches!((self.from, self.to), (Some(from), Some(to)) if to <= from)
    }
}
