//! 需求預測值物件

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 預測方法
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForecastMethod {
    /// 外部 ML 模型
    MachineLearning,
    /// 指數平滑（歷史備援）
    ExponentialSmoothing,
    /// 歷史不足時的簡單平均
    HistoricalAverage,
}

/// 歷史需求觀測值
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DemandObservation {
    pub date: NaiveDate,
    pub quantity: Decimal,
}

impl DemandObservation {
    pub fn new(date: NaiveDate, quantity: Decimal) -> Self {
        Self { date, quantity }
    }
}

/// 預測特徵（交給預測提供者）
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ForecastFeatures {
    pub history: Vec<DemandObservation>,
    /// 期間長度（天）
    pub period_days: u32,
    pub attributes: BTreeMap<String, Decimal>,
}

impl ForecastFeatures {
    pub fn new(history: Vec<DemandObservation>, period_days: u32) -> Self {
        Self {
            history,
            period_days,
            attributes: BTreeMap::new(),
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: Decimal) -> Self {
        self.attributes.insert(key.into(), value);
        self
    }
}

/// 預測期間 `[start_date, end_date)`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastPeriod {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub quantity: Decimal,
    pub lower_bound: Decimal,
    pub upper_bound: Decimal,
}

/// 需求預測
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemandForecast {
    pub id: Uuid,
    pub product_id: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub periods: Vec<ForecastPeriod>,
    /// 信心水準 0..=1
    pub confidence: Decimal,
    pub method: ForecastMethod,
    pub warnings: Vec<String>,
}

impl DemandForecast {
    pub fn new(
        product_id: impl Into<String>,
        start_date: NaiveDate,
        end_date: NaiveDate,
        method: ForecastMethod,
        confidence: Decimal,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            product_id: product_id.into(),
            start_date,
            end_date,
            periods: Vec::new(),
            confidence,
            method,
            warnings: Vec::new(),
        }
    }

    pub fn with_period(mut self, period: ForecastPeriod) -> Self {
        self.periods.push(period);
        self
    }

    pub fn with_warning(mut self, warning: impl Into<String>) -> Self {
        self.warnings.push(warning.into());
        self
    }

    pub fn total_quantity(&self) -> Decimal {
        self.periods.iter().map(|p| p.quantity).sum()
    }

    pub fn is_low_confidence(&self, threshold: Decimal) -> bool {
        self.confidence < threshold
    }

    pub fn is_fallback(&self) -> bool {
        self.method != ForecastMethod::MachineLearning
    }
}
