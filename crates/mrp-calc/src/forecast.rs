//! 需求預測服務：外部 ML 預測 + 歷史資料備援
//!
//! 外部預測在獨立執行緒中呼叫並套用逾時；不健康、不可用、失敗或逾時時
//! 一律改用 [`ForecastService::calculate_from_history`]，不會回傳錯誤。
//!
//! 逾時的呼叫無法中斷，執行緒會跑到服務回應為止。同一個服務（含其 clone）
//! 同時最多只有一個呼叫在執行，前一個還沒結束時直接改用歷史預測。

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use chrono::NaiveDate;
use mrp_core::{
    DemandForecast, DemandObservation, ForecastFeatures, ForecastMethod, ForecastPeriod, ForecastProvider,
    ForecastSettings, MrpError,
};
use rust_decimal::Decimal;

/// 需求預測服務
#[derive(Clone)]
pub struct ForecastService {
    provider: Option<Arc<dyn ForecastProvider>>,
    settings: ForecastSettings,
    in_flight: Arc<AtomicBool>,
}

impl ForecastService {
    /// 只使用歷史備援
    pub fn new(settings: ForecastSettings) -> Self {
        Self {
            provider: None,
            settings,
            in_flight: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn with_provider(mut self, provider: Arc<dyn ForecastProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn settings(&self) -> &ForecastSettings {
        &self.settings
    }

    /// 產生預測；外部服務不可用時自動備援
    pub fn forecast(
        &self,
        product_id: &str,
        start: NaiveDate,
        end: NaiveDate,
        features: &ForecastFeatures,
    ) -> DemandForecast {
        let unavailable = match &self.provider {
            Some(provider) if provider.is_healthy() && provider.is_available() => {
                match self.predict_with_timeout(Arc::clone(provider), product_id, start, end, features) {
                    Ok(forecast) => return forecast,
                    Err(e) => e,
                }
            }
            Some(_) => MrpError::ForecastUnavailable("預測服務未就緒".to_string()),
            None => MrpError::ForecastUnavailable("未設定預測服務".to_string()),
        };

        tracing::warn!("物料 {} 改用歷史預測: {}", product_id, unavailable);
        self.calculate_from_history(product_id, start, end, &features.history, features.period_days)
            .with_warning(unavailable.to_string())
    }

    fn predict_with_timeout(
        &self,
        provider: Arc<dyn ForecastProvider>,
        product_id: &str,
        start: NaiveDate,
        end: NaiveDate,
        features: &ForecastFeatures,
    ) -> mrp_core::Result<DemandForecast> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(MrpError::ForecastUnavailable("上一次預測仍在執行".to_string()));
        }

        let (tx, rx) = mpsc::channel();
        let product = product_id.to_string();
        let features = features.clone();
        let in_flight = Arc::clone(&self.in_flight);

        let spawned = thread::Builder::new().name("forecast-provider".to_string()).spawn(move || {
            let result = provider.predict(&product, start, end, &features);
            // 先釋放再送出，收到結果時下一次呼叫已可進行
            in_flight.store(false, Ordering::Release);
            // 逾時後接收端已不存在，送出失敗可忽略
            let _ = tx.send(result);
        });
        if let Err(e) = spawned {
            self.in_flight.store(false, Ordering::Release);
            return Err(MrpError::ForecastUnavailable(format!("無法啟動預測執行緒: {}", e)));
        }

        let timeout = Duration::from_millis(self.settings.timeout_ms);
        match rx.recv_timeout(timeout) {
            Ok(result) => result,
            Err(mpsc::RecvTimeoutError::Timeout) => Err(MrpError::ForecastUnavailable(format!(
                "預測逾時（{} ms）",
                self.settings.timeout_ms
            ))),
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                Err(MrpError::ForecastUnavailable("預測執行緒異常結束".to_string()))
            }
        }
    }

    /// 歷史備援
    ///
    /// 歷史點數足夠時用指數平滑（每點視為一期的需求量），區間為 ± 平均絕對誤差；
    /// 不足時取平均值並給最低信心水準。
    pub fn calculate_from_history(
        &self,
        product_id: &str,
        start: NaiveDate,
        end: NaiveDate,
        history: &[DemandObservation],
        period_days: u32,
    ) -> DemandForecast {
        let mut history = history.to_vec();
        history.sort_by_key(|o| o.date);
        let period_days = period_days.max(1);

        let (method, confidence, level, deviation) = if history.len() < self.settings.min_history_points {
            let level = average(&history);
            (ForecastMethod::HistoricalAverage, self.settings.minimum_confidence, level, level)
        } else {
            let (level, mad) = exponential_smoothing(&history, self.settings.smoothing_alpha);
            (ForecastMethod::ExponentialSmoothing, self.settings.fallback_confidence, level, mad)
        };

        let mut forecast = DemandForecast::new(product_id, start, end, method, confidence);
        if method == ForecastMethod::HistoricalAverage {
            forecast = forecast.with_warning(format!(
                "歷史資料僅 {} 筆（至少需要 {} 筆），信心水準降至最低",
                history.len(),
                self.settings.min_history_points
            ));
        }

        let mut period_start = start;
        while period_start < end {
            let period_end = (period_start + chrono::Duration::days(i64::from(period_days))).min(end);
            let days = Decimal::from((period_end - period_start).num_days());
            let scale = |quantity: Decimal| quantity * days / Decimal::from(period_days);
            forecast = forecast.with_period(ForecastPeriod {
                start_date: period_start,
                end_date: period_end,
                quantity: scale(level),
                lower_bound: scale(level - deviation).max(Decimal::ZERO),
                upper_bound: scale(level + deviation),
            });
            period_start = period_end;
        }

        forecast
    }
}

fn average(history: &[DemandObservation]) -> Decimal {
    if history.is_empty() {
        return Decimal::ZERO;
    }
    let total: Decimal = history.iter().map(|o| o.quantity).sum();
    total / Decimal::from(history.len())
}

/// 回傳（平滑後水準, 一步預測的平均絕對誤差）
fn exponential_smoothing(history: &[DemandObservation], alpha: Decimal) -> (Decimal, Decimal) {
    let alpha = alpha.clamp(Decimal::ZERO, Decimal::ONE);
    let mut iter = history.iter();
    let Some(first) = iter.next() else {
        return (Decimal::ZERO, Decimal::ZERO);
    };

    let mut level = first.quantity;
    let mut total_error = Decimal::ZERO;
    let mut steps = 0u32;
    for observation in iter {
        total_error += (observation.quantity - level).abs();
        steps += 1;
        level = alpha * observation.quantity + (Decimal::ONE - alpha) * level;
    }

    let mad = if steps == 0 {
        Decimal::ZERO
    } else {
        total_error / Decimal::from(steps)
    };
    (level, mad)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 11, day).unwrap()
    }

    fn history(quantities: &[i64]) -> Vec<DemandObservation> {
        quantities
            .iter()
            .enumerate()
            .map(|(i, q)| DemandObservation::new(date(1) - chrono::Duration::weeks(i as i64 + 1), Decimal::from(*q)))
            .rev()
            .collect()
    }

    struct StubProvider {
        healthy: bool,
        fail: bool,
        delay_ms: u64,
        called: AtomicBool,
    }

    impl StubProvider {
        fn new() -> Self {
            Self {
                healthy: true,
                fail: false,
                delay_ms: 0,
                called: AtomicBool::new(false),
            }
        }
    }

    impl ForecastProvider for StubProvider {
        fn is_healthy(&self) -> bool {
            self.healthy
        }

        fn is_available(&self) -> bool {
            true
        }

        fn predict(
            &self,
            product_id: &str,
            start: NaiveDate,
            end: NaiveDate,
            _features: &ForecastFeatures,
        ) -> mrp_core::Result<DemandForecast> {
            self.called.store(true, Ordering::SeqCst);
            if self.delay_ms > 0 {
                thread::sleep(Duration::from_millis(self.delay_ms));
            }
            if self.fail {
                return Err(MrpError::ForecastUnavailable("模型載入失敗".to_string()));
            }
            Ok(
                DemandForecast::new(product_id, start, end, ForecastMethod::MachineLearning, Decimal::new(9, 1))
                    .with_period(ForecastPeriod {
                        start_date: start,
                        end_date: end,
                        quantity: Decimal::from(70),
                        lower_bound: Decimal::from(60),
                        upper_bound: Decimal::from(80),
                    }),
            )
        }
    }

    #[test]
    fn test_exponential_smoothing() {
        let service = ForecastService::new(ForecastSettings::default());
        // 水準：10 → 0.3×20+0.7×10=13 → 0.3×10+0.7×13=12.1
        let forecast = service.calculate_from_history("P", date(1), date(15), &history(&[10, 20, 10]), 7);

        assert_eq!(forecast.method, ForecastMethod::ExponentialSmoothing);
        assert_eq!(forecast.confidence, Decimal::new(6, 1));
        assert_eq!(forecast.periods.len(), 2);
        assert_eq!(forecast.periods[0].quantity, Decimal::new(121, 1));
        // MAD = (10 + 3) / 2
        assert_eq!(forecast.periods[0].upper_bound, Decimal::new(186, 1));
        assert!(forecast.warnings.is_empty());
    }

    #[test]
    fn test_insufficient_history_lowest_confidence() {
        let service = ForecastService::new(ForecastSettings::default());
        let forecast = service.calculate_from_history("P", date(1), date(8), &history(&[12, 18]), 7);

        assert_eq!(forecast.method, ForecastMethod::HistoricalAverage);
        assert_eq!(forecast.confidence, Decimal::new(1, 1));
        assert_eq!(forecast.total_quantity(), Decimal::from(15));
        assert_eq!(forecast.warnings.len(), 1);
    }

    #[test]
    fn test_truncated_last_period() {
        let service = ForecastService::new(ForecastSettings::default());
        let forecast = service.calculate_from_history("P", date(1), date(11), &history(&[14, 14, 14]), 7);

        assert_eq!(forecast.periods.len(), 2);
        assert_eq!(forecast.periods[1].quantity, Decimal::from(6));
    }

    #[test]
    fn test_provider_used_when_healthy() {
        let provider = Arc::new(StubProvider::new());
        let service = ForecastService::new(ForecastSettings::default()).with_provider(provider.clone());

        let forecast = service.forecast("P", date(1), date(8), &ForecastFeatures::default());

        assert!(provider.called.load(Ordering::SeqCst));
        assert_eq!(forecast.method, ForecastMethod::MachineLearning);
        assert_eq!(forecast.total_quantity(), Decimal::from(70));
    }

    #[test]
    fn test_unhealthy_provider_not_called() {
        let provider = Arc::new(StubProvider {
            healthy: false,
            ..StubProvider::new()
        });
        let service = ForecastService::new(ForecastSettings::default()).with_provider(provider.clone());

        let forecast = service.forecast("P", date(1), date(8), &ForecastFeatures::new(history(&[5, 5, 5]), 7));

        assert!(!provider.called.load(Ordering::SeqCst));
        assert!(forecast.is_fallback());
        assert_eq!(forecast.total_quantity(), Decimal::from(5));
        assert_eq!(forecast.warnings.len(), 1);
    }

    #[test]
    fn test_provider_failure_falls_back() {
        let provider = Arc::new(StubProvider {
            fail: true,
            ..StubProvider::new()
        });
        let service = ForecastService::new(ForecastSettings::default()).with_provider(provider);

        let forecast = service.forecast("P", date(1), date(8), &ForecastFeatures::new(history(&[5, 5, 5]), 7));

        assert_eq!(forecast.method, ForecastMethod::ExponentialSmoothing);
        assert!(forecast.warnings[0].contains("模型載入失敗"));
    }

    #[test]
    fn test_provider_timeout_falls_back() {
        let provider = Arc::new(StubProvider {
            delay_ms: 500,
            ..StubProvider::new()
        });
        let settings = ForecastSettings {
            timeout_ms: 20,
            ..ForecastSettings::default()
        };
        let service = ForecastService::new(settings).with_provider(provider);

        let forecast = service.forecast("P", date(1), date(8), &ForecastFeatures::new(history(&[5, 5, 5]), 7));

        assert!(forecast.is_fallback());
        assert!(forecast.warnings[0].contains("逾時"));
    }

    #[test]
    fn test_single_call_in_flight_after_timeout() {
        let provider = Arc::new(StubProvider {
            delay_ms: 200,
            ..StubProvider::new()
        });
        let settings = ForecastSettings {
            timeout_ms: 20,
            ..ForecastSettings::default()
        };
        let service = ForecastService::new(settings).with_provider(provider);
        let features = ForecastFeatures::new(history(&[5, 5, 5]), 7);

        let first = service.forecast("P", date(1), date(8), &features);
        assert!(first.warnings[0].contains("逾時"));

        // 前一個呼叫還在執行，不再開新執行緒
        let second = service.clone().forecast("P", date(1), date(8), &features);
        assert!(second.is_fallback());
        assert!(second.warnings[0].contains("仍在執行"));

        thread::sleep(Duration::from_millis(400));
        let third = service.forecast("P", date(1), date(8), &features);
        assert!(third.warnings[0].contains("逾時"));
    }
}
