//! 時間分桶

use chrono::{Datelike, Duration, Months, NaiveDate};
use mrp_core::{BucketSize, MrpError, PlanningHorizon, Result};

/// 時間桶 `[start_date, end_date)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeBucket {
    pub index: usize,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl TimeBucket {
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start_date && date < self.end_date
    }

    pub fn days(&self) -> i64 {
        (self.end_date - self.start_date).num_days()
    }
}

/// 日期相對於時界的位置
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BucketPosition {
    /// 早於時界起日
    Before,
    Within(usize),
    /// 不早於時界迄日
    After,
}

/// 時界切出的連續時間桶
#[derive(Debug, Clone, PartialEq)]
pub struct TimeBuckets {
    buckets: Vec<TimeBucket>,
}

impl TimeBuckets {
    /// 依時界的桶大小切分；週為 7 天，月為日曆月，最後一桶截至時界迄日
    pub fn from_horizon(horizon: &PlanningHorizon) -> Result<Self> {
        horizon.validate()?;
        let mut buckets = Vec::new();
        let mut current = horizon.start_date;

        while current < horizon.end_date {
            let next = match horizon.bucket_size {
                BucketSize::Day => current.succ_opt(),
                BucketSize::Week => current.checked_add_signed(Duration::weeks(1)),
                BucketSize::Month => current
                    .with_day(1)
                    .and_then(|first| first.checked_add_months(Months::new(1))),
            }
            .ok_or_else(|| MrpError::InvalidDate(format!("日期溢出: {}", current)))?;

            let end_date = next.min(horizon.end_date);
            buckets.push(TimeBucket {
                index: buckets.len(),
                start_date: current,
                end_date,
            });
            current = end_date;
        }

        Ok(Self { buckets })
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&TimeBucket> {
        self.buckets.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TimeBucket> {
        self.buckets.iter()
    }

    /// 日期所在桶
    pub fn locate(&self, date: NaiveDate) -> BucketPosition {
        match (self.buckets.first(), self.buckets.last()) {
            (Some(first), _) if date < first.start_date => BucketPosition::Before,
            (_, Some(last)) if date >= last.end_date => BucketPosition::After,
            (Some(_), Some(_)) => {
                let index = self.buckets.partition_point(|b| b.end_date <= date);
                BucketPosition::Within(index)
            }
            _ => BucketPosition::After,
        }
    }

    /// 日期所在桶索引；時界外回傳 `None`
    pub fn index_of(&self, date: NaiveDate) -> Option<usize> {
        match self.locate(date) {
            BucketPosition::Within(index) => Some(index),
            BucketPosition::Before | BucketPosition::After => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn horizon(start: NaiveDate, days: u32, size: BucketSize) -> PlanningHorizon {
        PlanningHorizon::from_days(start, days, 0, 0, size).unwrap()
    }

    #[test]
    fn test_create_buckets_daily() {
        let start = NaiveDate::from_ymd_opt(2025, 10, 1).unwrap();
        let buckets = TimeBuckets::from_horizon(&horizon(start, 5, BucketSize::Day)).unwrap();

        assert_eq!(buckets.len(), 5);
        assert_eq!(buckets.get(0).unwrap().start_date, start);
        assert_eq!(buckets.get(4).unwrap().end_date, NaiveDate::from_ymd_opt(2025, 10, 6).unwrap());
    }

    #[test]
    fn test_weekly_last_bucket_truncated() {
        let start = NaiveDate::from_ymd_opt(2025, 11, 3).unwrap();
        let buckets = TimeBuckets::from_horizon(&horizon(start, 30, BucketSize::Week)).unwrap();

        assert_eq!(buckets.len(), 5);
        assert_eq!(buckets.get(4).unwrap().days(), 2);
        let total: i64 = buckets.iter().map(TimeBucket::days).sum();
        assert_eq!(total, 30);
    }

    #[test]
    fn test_monthly_follows_calendar() {
        let start = NaiveDate::from_ymd_opt(2025, 1, 15).unwrap();
        let buckets = TimeBuckets::from_horizon(&horizon(start, 60, BucketSize::Month)).unwrap();

        assert_eq!(buckets.len(), 3);
        assert_eq!(buckets.get(0).unwrap().end_date, NaiveDate::from_ymd_opt(2025, 2, 1).unwrap());
        assert_eq!(buckets.get(1).unwrap().days(), 28);
        assert_eq!(buckets.get(2).unwrap().end_date, NaiveDate::from_ymd_opt(2025, 3, 16).unwrap());
    }

    #[test]
    fn test_locate() {
        let start = NaiveDate::from_ymd_opt(2025, 11, 3).unwrap();
        let buckets = TimeBuckets::from_horizon(&horizon(start, 28, BucketSize::Week)).unwrap();

        assert_eq!(buckets.locate(start - Duration::days(1)), BucketPosition::Before);
        assert_eq!(buckets.locate(start), BucketPosition::Within(0));
        assert_eq!(buckets.locate(start + Duration::days(7)), BucketPosition::Within(1));
        assert_eq!(buckets.locate(start + Duration::days(27)), BucketPosition::Within(3));
        assert_eq!(buckets.locate(start + Duration::days(28)), BucketPosition::After);
        assert_eq!(buckets.index_of(start + Duration::days(28)), None);
    }
}
