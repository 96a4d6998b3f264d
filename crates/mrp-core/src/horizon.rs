//! 計劃時界與時區（凍結/半凍結/自由）

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::{MrpError, Result};

/// 時間桶大小
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BucketSize {
    Day,
    Week,
    Month,
}

/// 計劃時區
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PlanningZone {
    /// 凍結區：不得自動變更
    Frozen,
    /// 半凍結區：需核准才可變更
    Slushy,
    /// 自由區
    Liquid,
}

/// 計劃時界 `[start_date, end_date)`
///
/// 反序列化同樣經過 [`PlanningHorizon::new`] 驗證。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "HorizonFields")]
pub struct PlanningHorizon {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// 凍結區天數（自起日算）
    pub frozen_days: u32,
    /// 半凍結區天數（接續凍結區）
    pub slushy_days: u32,
    pub bucket_size: BucketSize,
}

#[derive(Deserialize)]
struct HorizonFields {
    start_date: NaiveDate,
    end_date: NaiveDate,
    frozen_days: u32,
    slushy_days: u32,
    bucket_size: BucketSize,
}

impl TryFrom<HorizonFields> for PlanningHorizon {
    type Error = MrpError;

    fn try_from(fields: HorizonFields) -> Result<Self> {
        Self::new(
            fields.start_date,
            fields.end_date,
            fields.frozen_days,
            fields.slushy_days,
            fields.bucket_size,
        )
    }
}

impl PlanningHorizon {
    /// 創建計劃時界，驗證 frozen + slushy ≤ 總天數
    pub fn new(
        start_date: NaiveDate,
        end_date: NaiveDate,
        frozen_days: u32,
        slushy_days: u32,
        bucket_size: BucketSize,
    ) -> Result<Self> {
        let horizon = Self {
            start_date,
            end_date,
            frozen_days,
            slushy_days,
            bucket_size,
        };
        horizon.validate()?;
        Ok(horizon)
    }

    /// 檢查迄日晚於起日，且凍結區加半凍結區不超過時界
    pub fn validate(&self) -> Result<()> {
        if self.end_date <= self.start_date {
            return Err(MrpError::InvalidHorizon(format!(
                "迄日 {} 必須晚於起日 {}",
                self.end_date, self.start_date
            )));
        }

        let fenced = i64::from(self.frozen_days) + i64::from(self.slushy_days);
        if fenced > self.total_days() {
            return Err(MrpError::InvalidHorizon(format!(
                "凍結區 {} 天 + 半凍結區 {} 天超過時界 {} 天",
                self.frozen_days,
                self.slushy_days,
                self.total_days()
            )));
        }

        Ok(())
    }

    /// 以天數建立時界
    pub fn from_days(
        start_date: NaiveDate,
        total_days: u32,
        frozen_days: u32,
        slushy_days: u32,
        bucket_size: BucketSize,
    ) -> Result<Self> {
        let end_date = start_date
            .checked_add_signed(Duration::days(i64::from(total_days)))
            .ok_or_else(|| MrpError::InvalidDate(format!("日期溢出: {} + {}", start_date, total_days)))?;
        Self::new(start_date, end_date, frozen_days, slushy_days, bucket_size)
    }

    /// 時界總天數
    pub fn total_days(&self) -> i64 {
        (self.end_date - self.start_date).num_days()
    }

    /// 日期是否在時界內
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start_date && date < self.end_date
    }

    /// 凍結區結束日（不含）；超出日期範圍時取最大日期
    pub fn frozen_fence(&self) -> NaiveDate {
        self.start_date
            .checked_add_signed(Duration::days(i64::from(self.frozen_days)))
            .unwrap_or(NaiveDate::MAX)
    }

    /// 半凍結區結束日（不含）
    pub fn slushy_fence(&self) -> NaiveDate {
        self.frozen_fence()
            .checked_add_signed(Duration::days(i64::from(self.slushy_days)))
            .unwrap_or(NaiveDate::MAX)
    }

    /// 日期所屬時區；起日之前視為凍結區
    pub fn zone_for(&self, date: NaiveDate) -> PlanningZone {
        if date < self.frozen_fence() {
            PlanningZone::Frozen
        } else if date < self.slushy_fence() {
            PlanningZone::Slushy
        } else {
            PlanningZone::Liquid
        }
    }

    /// 距起日的天數（可為負）
    pub fn day_offset(&self, date: NaiveDate) -> i64 {
        (date - self.start_date).num_days()
    }
}
