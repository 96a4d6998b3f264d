//! # 腳踏車 MRP 計算完整範例
//!
//! 這個範例展示完整的 MRP 計算流程：
//! - 產品：腳踏車（座椅組為虛擬件）
//! - 零件：車架、輪子、座墊、座管
//! - 需求：銷售訂單；沒有訂單的配件以歷史需求預測
//! - 批量規則：不同零件使用不同策略

use chrono::{Duration, NaiveDate};
use mrp_engine::*;
use rust_decimal::Decimal;

fn main() -> anyhow::Result<()> {
    logging::init();
    println!("🚲 ===== 腳踏車 MRP 計算範例 =====");
    println!();

    let start = NaiveDate::from_ymd_opt(2025, 11, 3).ok_or_else(|| anyhow::anyhow!("無效的起日"))?;
    let day = |offset: i64| start + Duration::days(offset);

    // ========== 1. 建立工作日曆 ==========
    println!("📅 步驟 1: 建立工廠工作日曆");
    let calendar = match load_shift_schedule() {
        Some(schedule) => {
            println!("   ✓ 從排班表載入：{}", schedule.calendar_id);
            WorkCalendar::from_shift_schedule(schedule)
        }
        None => {
            println!("   ⚠ 無排班表，使用 24/7 日曆");
            WorkCalendar::fallback_calendar()
        }
    };
    println!("   工作模式: {:?}", calendar.working_days);
    println!();

    // ========== 2. 建立產品 BOM 結構 ==========
    println!("🔧 步驟 2: 建立 BOM 結構");
    let catalog = create_bike_structures()?;
    let explosion = BomExplosion::new(&catalog);
    for component in explosion.explode("BIKE-001", Decimal::ONE, start)? {
        println!(
            "   {}└─ {} × {} {}（上層 {}）",
            "  ".repeat(component.level as usize - 1),
            component.product_id,
            component.quantity,
            component.uom_code,
            component.parent_product_id
        );
    }
    println!("   座管的最上層用途: {:?}", explosion.where_used_roots("POST-001"));
    println!();

    // ========== 3. 設定 MRP 參數 ==========
    println!("⚙️  步驟 3: 設定各物料 MRP 參數");
    let mut inventory = InMemoryInventory::new()
        .with_config(
            MrpConfig::new("BIKE-001", 5, ReplenishmentType::Manufacture)
                .with_lot_sizing_rule(LotSizingRule::LotForLot)
                .with_safety_stock(Decimal::from(5)),
        )
        .with_config(
            MrpConfig::new("FRAME-001", 3, ReplenishmentType::Manufacture)
                .with_lot_sizing_rule(LotSizingRule::FixedOrderQuantity)
                .with_fixed_lot_size(Decimal::from(100))
                .with_safety_stock(Decimal::from(10)),
        )
        .with_config(
            MrpConfig::new("WHEEL-001", 4, ReplenishmentType::Purchase)
                .with_lot_sizing_rule(LotSizingRule::PeriodsOfSupply)
                .with_periods_of_supply(7)
                .with_minimum_order_qty(Decimal::from(200))
                .with_order_multiple(Decimal::from(50))
                .with_safety_stock(Decimal::from(20)),
        )
        .with_config(
            MrpConfig::new("SADDLE-001", 3, ReplenishmentType::Purchase)
                .with_lot_sizing_rule(LotSizingRule::EconomicOrderQuantity)
                .with_eoq_costs(Decimal::from(50), Decimal::from(2))
                .with_annual_demand(Decimal::from(4000)),
        )
        .with_config(MrpConfig::new("POST-001", 3, ReplenishmentType::Purchase))
        .with_config(MrpConfig::new("BELL-001", 2, ReplenishmentType::Purchase));
    println!("   ✓ BIKE-001: 批對批 (LFL), 提前期 5 天");
    println!("   ✓ FRAME-001: 固定批量 (FOQ) 100, 提前期 3 天");
    println!("   ✓ WHEEL-001: 週期供應 7 天, 最小 200, 倍數 50");
    println!("   ✓ SADDLE-001: 經濟訂購量 (EOQ)");
    println!();

    // ========== 4. 建立需求與供應 ==========
    println!("📦 步驟 4: 銷售訂單、在途採購與庫存");
    inventory.add_demand(
        Demand::new("BIKE-001", Decimal::from(150), day(12), DemandType::SalesOrder)
            .with_source_ref("SO-2025-001")
            .with_priority(8),
    );
    inventory.add_demand(
        Demand::new("BIKE-001", Decimal::from(100), day(19), DemandType::SalesOrder)
            .with_source_ref("SO-2025-002")
            .with_priority(5),
    );
    let history = (1..=8)
        .map(|week| DemandObservation::new(start - Duration::weeks(week), Decimal::from(20 + week)))
        .collect();
    let inventory = inventory
        .with_supply(
            Supply::new("FRAME-001", Decimal::from(50), day(7), SupplyType::PurchaseOrder).with_source_ref("PO-2025-100"),
        )
        .with_on_hand("BIKE-001", Decimal::from(10))
        .with_on_hand("FRAME-001", Decimal::from(30))
        .with_on_hand("WHEEL-001", Decimal::from(100))
        .with_history("BELL-001", history);
    println!("   ✓ SO-2025-001: 150 台，需求日 {}", day(12));
    println!("   ✓ SO-2025-002: 100 台，需求日 {}", day(19));
    println!("   ✓ PO-2025-100: 50 個車架，到貨日 {}", day(7));
    println!();

    // ========== 5. 執行 MRP 計算 ==========
    println!("🚀 步驟 5: 執行 MRP 計算");
    let horizon = PlanningHorizon::from_days(start, 42, 7, 14, BucketSize::Week)?;
    let settings = EngineSettings::default()
        .with_parallel(true)
        .with_lead_time_mode(LeadTimeMode::WorkingDays);
    let forecast = ForecastService::new(settings.forecast.clone());
    let engine = MrpEngine::new(&catalog, &inventory)
        .with_settings(settings)
        .with_calendar(calendar)
        .with_forecast_service(forecast);
    let run = engine.calculate(["BIKE-001", "BELL-001"], &horizon)?;
    println!("   ✓ 完成！耗時 {} ms", run.calculation_time_ms);
    println!();

    // ========== 6. 顯示結果 ==========
    println!("📋 步驟 6: MRP 計算結果");
    println!("----------------------------------------");
    println!("計劃訂單總數: {}", run.total_planned_orders());
    println!();
    for (product_id, result) in &run.results {
        println!("物料: {}", product_id);
        for order in &result.planned_orders {
            println!(
                "  ├─ {:?} | 數量: {} | 開工: {} | 到期: {} | {:?}{}",
                order.order_type,
                order.quantity,
                order.start_date,
                order.due_date,
                order.zone,
                if order.is_past_due { " | 過期" } else { "" }
            );
        }
        println!();
    }

    // ========== 7. 警告與錯誤 ==========
    let warnings: Vec<_> = run.warnings().collect();
    if !warnings.is_empty() {
        println!("⚠️  警告訊息:");
        for warning in warnings {
            println!("  - [{}] {:?} {:?}: {}", warning.product_id, warning.severity, warning.kind, warning.message);
        }
        println!();
    }
    for (product_id, error) in run.errors() {
        println!("❌ {}: {}", product_id, error);
    }

    println!("✅ MRP 計算完成！");
    Ok(())
}

/// 模擬從 ERP 系統載入排班表（週一到週六上班）
fn load_shift_schedule() -> Option<ShiftSchedule> {
    Some(ShiftSchedule {
        calendar_id: "FACTORY-A".to_string(),
        working_days: vec![true, true, true, true, true, true, false],
        holidays: vec![],
    })
}

/// 腳踏車 = 車架 + 2 × 輪子 + 座椅組（虛擬件：座墊 + 座管，座墊損耗 5%）
fn create_bike_structures() -> Result<StructureCatalog> {
    let mut catalog = StructureCatalog::new();
    catalog.add_bom(
        Bom::new("BIKE-001", 1)
            .with_line(BomLine::new("FRAME-001", Decimal::ONE, "EA"))
            .with_line(BomLine::new("WHEEL-001", Decimal::from(2), "EA"))
            .with_line(BomLine::new("SEAT-KIT", Decimal::ONE, "EA").as_phantom())
            .released(),
    )?;
    catalog.add_bom(
        Bom::new("SEAT-KIT", 1)
            .with_type(BomType::Phantom)
            .with_line(BomLine::new("SADDLE-001", Decimal::ONE, "EA").with_scrap(Decimal::from(5)))
            .with_line(BomLine::new("POST-001", Decimal::ONE, "EA"))
            .released(),
    )?;
    catalog.add_bom(
        Bom::new("FRAME-001", 1)
            .with_line(BomLine::new("POST-001", Decimal::ONE, "EA"))
            .released(),
    )?;
    catalog.add_item("BELL-001");
    Ok(catalog)
}
