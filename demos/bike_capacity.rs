//! # 腳踏車產能規劃範例
//!
//! MRP 計劃訂單 + 已下達工單 → 產能剖面 → 瓶頸 → 負荷平準 → 解決建議 → 自動處置

use chrono::{Duration, NaiveDate};
use mrp_engine::*;
use rust_decimal::Decimal;

fn main() -> anyhow::Result<()> {
    logging::init();
    println!("🏭 ===== 腳踏車產能規劃範例 =====");
    println!();

    let start = NaiveDate::from_ymd_opt(2025, 11, 3).ok_or_else(|| anyhow::anyhow!("無效的起日"))?;
    let day = |offset: i64| start + Duration::days(offset);

    let catalog = create_structures()?;
    let centers = create_work_centers();
    let inventory = InMemoryInventory::new()
        .with_config(MrpConfig::new("BIKE-001", 2, ReplenishmentType::Manufacture))
        .with_config(MrpConfig::new("FRAME-001", 4, ReplenishmentType::Manufacture))
        .with_config(MrpConfig::new("WHEEL-001", 5, ReplenishmentType::Purchase))
        .with_demand(Demand::new("BIKE-001", Decimal::from(60), day(11), DemandType::SalesOrder))
        .with_demand(Demand::new("BIKE-001", Decimal::from(90), day(18), DemandType::SalesOrder));

    // ========== 1. MRP ==========
    println!("🚀 步驟 1: 執行 MRP");
    let mrp_horizon = PlanningHorizon::from_days(start, 28, 7, 7, BucketSize::Day)?;
    let run = MrpEngine::new(&catalog, &inventory).calculate(["BIKE-001"], &mrp_horizon)?;
    let orders: Vec<PlannedOrder> = run.planned_orders().cloned().collect();
    for order in &orders {
        println!(
            "   {} {:?} 數量 {} | {} ~ {}",
            order.product_id, order.order_type, order.quantity, order.start_date, order.due_date
        );
    }
    println!();

    // ========== 2. 產能剖面 ==========
    println!("📊 步驟 2: 建立產能剖面（週桶）");
    let mut released = WorkOrder::new("WO-2025-031", "FRAME-001", Decimal::from(40), day(1), day(4));
    released.release()?;

    let horizon = PlanningHorizon::from_days(start, 28, 7, 7, BucketSize::Week)?;
    let planner = CapacityPlanner::new(&catalog, &centers).with_settings(CapacitySettings {
        bottleneck_threshold: Decimal::new(95, 2),
        ..CapacitySettings::default()
    });
    let mut plan = planner.build_plan(&horizon, &orders, &[released])?;
    print_profiles(&plan);
    for warning in &plan.warnings {
        println!("   ⚠ {} ({}): {}", warning.product_id, warning.source_id, warning.error);
    }
    println!();

    // ========== 3. 瓶頸與平準 ==========
    println!("🔍 步驟 3: 瓶頸分析");
    for bottleneck in planner.bottlenecks(&plan) {
        println!(
            "   {} {} 負荷 {} / 可用 {}，超載 {}",
            bottleneck.work_center_id,
            bottleneck.period_start,
            bottleneck.loaded_hours,
            bottleneck.available_hours,
            bottleneck.overload
        );
    }
    let leveling = planner.level_load(&mut plan);
    println!("   平準移動 {} 筆，共 {} 小時", leveling.moves.len(), leveling.hours_moved());
    for load_move in &leveling.moves {
        println!(
            "     {} {} → {}（{} 小時）",
            load_move.work_center_id, load_move.from_date, load_move.to_date, load_move.hours
        );
    }
    if let Some(date) = planner.find_earliest_available(&plan, "WC-WELD", day(7), Decimal::from(8)) {
        println!("   焊接最早可再排 8 小時的期間: {}", date);
    }
    println!();

    // ========== 4. 解決建議 ==========
    println!("💡 步驟 4: 解決建議");
    let resolver = CapacityResolver::new(&centers).with_preferences(ResolverPreferences {
        max_reschedule_periods: 2,
        ..ResolverPreferences::default()
    });
    for bottleneck in &leveling.hard_bottlenecks {
        println!("   {} {}:", bottleneck.work_center_id, bottleneck.period_start);
        for suggestion in resolver.suggest(&plan, bottleneck) {
            println!(
                "     [{}] {} | 成本 {} | {}",
                suggestion.priority,
                suggestion.description,
                suggestion.estimated_cost,
                if suggestion.auto_applicable { "可自動" } else { "需核准" }
            );
        }
    }
    println!();

    // ========== 5. 自動處置（模擬） ==========
    println!("🧪 步驟 5: 自動處置模擬");
    let outcomes = resolver.auto_resolve_all(&mut plan, &leveling.hard_bottlenecks, true);
    println!("{}", serde_json::to_string_pretty(&outcomes)?);

    println!("✅ 產能規劃完成！");
    Ok(())
}

fn print_profiles(plan: &CapacityPlan) {
    for profile in plan.profiles.values() {
        println!("   {}", profile.work_center_id);
        for period in &profile.periods {
            let utilization = period
                .utilization()
                .map(|u| format!("{}%", (u * Decimal::ONE_HUNDRED).round_dp(1)))
                .unwrap_or_else(|| "-".to_string());
            println!(
                "     {} | 可用 {:>5} | 負荷 {:>5} | {}{}",
                period.start_date,
                period.available_hours,
                period.loaded_hours(),
                utilization,
                if period.is_overloaded() { " 🔴" } else { "" }
            );
        }
    }
}

/// 腳踏車組裝 2 道工序；車架切管後焊接，焊接與下一道工序重疊 30%
fn create_structures() -> Result<StructureCatalog> {
    StructureCatalog::new()
        .with_bom(
            Bom::new("BIKE-001", 1)
                .with_line(BomLine::new("FRAME-001", Decimal::ONE, "EA"))
                .with_line(BomLine::new("WHEEL-001", Decimal::from(2), "EA"))
                .released(),
        )?
        .with_routing(
            Routing::new("BIKE-001", "R-BIKE", 1)
                .with_operation(Operation::new(10, "WC-ASSY", Decimal::from(30), Decimal::from(20)))
                .with_operation(
                    Operation::new(20, "WC-QC", Decimal::ZERO, Decimal::from(5)).with_type(OperationType::Inspection),
                )
                .released(),
        )?
        .with_routing(
            Routing::new("FRAME-001", "R-FRAME", 1)
                .with_operation(
                    Operation::new(10, "WC-CUT", Decimal::from(30), Decimal::from(6))
                        .with_queue_and_move(Decimal::ZERO, Decimal::from(120)),
                )
                .with_operation(
                    Operation::new(20, "WC-WELD", Decimal::from(60), Decimal::from(36)).with_overlap(Decimal::from(30)),
                )
                .with_operation(Operation::new(30, "WC-PAINT", Decimal::from(45), Decimal::from(10)))
                .released(),
        )
}

fn create_work_centers() -> InMemoryWorkCenters {
    let overtime = WorkCenterCalendar::default().with_default_overtime(Decimal::from(2));
    InMemoryWorkCenters::new()
        .with_work_center(WorkCenter::new("WC-ASSY", Decimal::from(40)).with_group("ASSY"))
        .with_work_center(WorkCenter::new("WC-ASSY-2", Decimal::from(45)).with_group("ASSY"))
        .with_work_center(WorkCenter::new("WC-QC", Decimal::from(35)))
        .with_work_center(WorkCenter::new("WC-CUT", Decimal::from(35)).with_capacity(2, Decimal::from(8)))
        .with_work_center(
            WorkCenter::new("WC-WELD", Decimal::from(55))
                .with_efficiency(Decimal::from(90))
                .with_calendar(overtime),
        )
        .with_work_center(
            WorkCenter::new("WC-PAINT", Decimal::from(50))
                .with_subcontract_rate(Decimal::from(70)),
        )
}
