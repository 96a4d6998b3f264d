//! 工序排程：把途程工序排入訂單的開工～到期窗口
//!
//! 以分鐘為單位順推：每道工序開始 = 前工序開始 + 前工序加工時間 × (1 − 重疊率)
//! + 前工序搬運時間 + 本工序等候時間。總經過時間超出窗口時等比例壓縮，
//! 只影響負荷日期，不影響工時。

use chrono::{Duration, NaiveDate};
use mrp_core::{OperationType, Routing};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Serialize;

const MINUTES_PER_DAY: Decimal = Decimal::from_parts(1440, 0, 0, false, 0);

/// 已排程的工序
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScheduledOperation {
    pub sequence: u32,
    pub work_center_id: String,
    pub operation_type: OperationType,
    /// 負荷日期
    pub start_date: NaiveDate,
    pub setup_hours: Decimal,
    pub run_hours: Decimal,
}

impl ScheduledOperation {
    pub fn hours(&self) -> Decimal {
        self.setup_hours + self.run_hours
    }

    pub fn consumes_capacity(&self) -> bool {
        self.operation_type.consumes_capacity() && self.hours() > Decimal::ZERO
    }
}

/// 工序排程器
pub struct OperationScheduler;

impl OperationScheduler {
    /// 排程 `routing` 的全部工序；日期落在 `[start, due)`，窗口為空時全部落在 `start`
    pub fn schedule(routing: &Routing, quantity: Decimal, start: NaiveDate, due: NaiveDate) -> Vec<ScheduledOperation> {
        let mut offsets = Vec::with_capacity(routing.operations.len());
        let mut cursor = Decimal::ZERO;
        let mut finish = Decimal::ZERO;

        for operation in &routing.operations {
            let begin = cursor + operation.queue_time_minutes.max(Decimal::ZERO);
            let duration = operation.processing_minutes(quantity).max(Decimal::ZERO);
            let overlap = operation.overlap_percentage.clamp(Decimal::ZERO, Decimal::ONE_HUNDRED) / Decimal::ONE_HUNDRED;
            let moving = operation.move_time_minutes.max(Decimal::ZERO);

            offsets.push(begin);
            finish = finish.max(begin + duration + moving);
            cursor = begin + duration * (Decimal::ONE - overlap) + moving;
        }

        let window_days = (due - start).num_days().max(0);
        let window = Decimal::from(window_days) * MINUTES_PER_DAY;
        let scale = if finish > window && finish > Decimal::ZERO {
            window / finish
        } else {
            Decimal::ONE
        };
        let last_day = (window_days - 1).max(0);

        routing
            .operations
            .iter()
            .zip(offsets)
            .map(|(operation, offset)| {
                let day = (offset * scale / MINUTES_PER_DAY)
                    .floor()
                    .to_i64()
                    .unwrap_or(0)
                    .clamp(0, last_day);
                ScheduledOperation {
                    sequence: operation.sequence,
                    work_center_id: operation.work_center_id.clone(),
                    operation_type: operation.operation_type,
                    start_date: start + Duration::days(day),
                    setup_hours: operation.setup_hours(),
                    run_hours: operation.run_hours(quantity),
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mrp_core::Operation;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 11, day).unwrap()
    }

    /// 三道工序，各 60 分鐘/件；24 件正好一天
    fn routing() -> Routing {
        Routing::new("FRAME-001", "R-FRAME", 1)
            .with_operation(Operation::new(10, "WC-CUT", Decimal::ZERO, Decimal::from(60)))
            .with_operation(Operation::new(20, "WC-WELD", Decimal::ZERO, Decimal::from(60)))
            .with_operation(Operation::new(30, "WC-PAINT", Decimal::ZERO, Decimal::from(60)))
            .released()
    }

    #[test]
    fn test_sequential_operations() {
        let scheduled = OperationScheduler::schedule(&routing(), Decimal::from(24), date(3), date(8));

        let dates: Vec<_> = scheduled.iter().map(|s| s.start_date).collect();
        assert_eq!(dates, vec![date(3), date(4), date(5)]);
        assert_eq!(scheduled[1].hours(), Decimal::from(24));
    }

    #[test]
    fn test_overlap_starts_successor_early() {
        let mut routing = routing();
        routing.operations[0] = routing.operations[0].clone().with_overlap(Decimal::from(50));

        let scheduled = OperationScheduler::schedule(&routing, Decimal::from(24), date(3), date(8));

        // 第二道工序於 720 分鐘開始
        assert_eq!(scheduled[1].start_date, date(3));
        assert_eq!(scheduled[2].start_date, date(4));
        // 重疊不減少工時
        let total: Decimal = scheduled.iter().map(ScheduledOperation::hours).sum();
        assert_eq!(total, Decimal::from(72));
    }

    #[test]
    fn test_compressed_into_short_window() {
        // 需 3 天，窗口僅 2 天：位移 × 2/3
        let scheduled = OperationScheduler::schedule(&routing(), Decimal::from(24), date(3), date(5));

        let dates: Vec<_> = scheduled.iter().map(|s| s.start_date).collect();
        assert_eq!(dates, vec![date(3), date(3), date(4)]);
    }

    #[test]
    fn test_queue_and_move_times() {
        let routing = Routing::new("FRAME-001", "R-FRAME", 1)
            .with_operation(
                Operation::new(10, "WC-CUT", Decimal::ZERO, Decimal::from(10))
                    .with_queue_and_move(Decimal::ZERO, Decimal::from(1440)),
            )
            .with_operation(
                Operation::new(20, "WC-WELD", Decimal::ZERO, Decimal::from(10))
                    .with_queue_and_move(Decimal::from(1440), Decimal::ZERO),
            )
            .released();

        let scheduled = OperationScheduler::schedule(&routing, Decimal::ONE, date(3), date(13));

        // 10 + 1440 搬運 + 1440 等候 = 2890 分鐘
        assert_eq!(scheduled[1].start_date, date(5));
    }

    #[test]
    fn test_empty_window_stays_on_start() {
        let scheduled = OperationScheduler::schedule(&routing(), Decimal::from(24), date(3), date(3));
        assert!(scheduled.iter().all(|s| s.start_date == date(3)));
    }

    #[test]
    fn test_non_capacity_operation() {
        let routing = Routing::new("FRAME-001", "R-FRAME", 1)
            .with_operation(Operation::new(10, "WC-CUT", Decimal::from(30), Decimal::from(6)))
            .with_operation(
                Operation::new(20, "WC-YARD", Decimal::ZERO, Decimal::from(60)).with_type(OperationType::Queue),
            )
            .released();

        let scheduled = OperationScheduler::schedule(&routing, Decimal::from(10), date(3), date(10));

        assert!(scheduled[0].consumes_capacity());
        assert_eq!(scheduled[0].hours(), Decimal::new(15, 1));
        assert!(!scheduled[1].consumes_capacity());
    }
}
