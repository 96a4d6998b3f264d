//! 簡單 MRP 計算示例：單一採購件、固定批量

use chrono::NaiveDate;
use mrp_engine::{
    logging, BucketSize, Demand, DemandType, InMemoryInventory, LotSizingRule, MrpConfig, MrpEngine, PlanningHorizon,
    ReplenishmentType, StructureCatalog,
};
use rust_decimal::Decimal;

fn main() -> anyhow::Result<()> {
    logging::init();
    println!("=== 簡單 MRP 計算示例 ===\n");

    let start = NaiveDate::from_ymd_opt(2025, 11, 1).ok_or_else(|| anyhow::anyhow!("無效的起日"))?;
    let horizon = PlanningHorizon::from_days(start, 30, 7, 7, BucketSize::Day)?;

    // 在庫 20、安全庫存 10、提前期 5 天、固定批量 50
    let inventory = InMemoryInventory::new()
        .with_config(
            MrpConfig::new("BOLT-M8", 5, ReplenishmentType::Purchase)
                .with_safety_stock(Decimal::from(10))
                .with_lot_sizing_rule(LotSizingRule::FixedOrderQuantity)
                .with_fixed_lot_size(Decimal::from(50)),
        )
        .with_on_hand("BOLT-M8", Decimal::from(20))
        .with_demand(
            Demand::new("BOLT-M8", Decimal::from(100), start + chrono::Duration::days(20), DemandType::SalesOrder)
                .with_source_ref("SO-001")
                .with_priority(5),
        );
    let catalog = StructureCatalog::new();

    let run = MrpEngine::new(&catalog, &inventory).calculate(["BOLT-M8"], &horizon)?;

    if let Some(result) = run.result("BOLT-M8") {
        for requirement in &result.material_requirements {
            println!(
                "需求日 {} | 毛需求 {} | 可用 {} | 淨需求 {}",
                requirement.required_date,
                requirement.gross_requirement,
                requirement.available(),
                requirement.net_requirement
            );
        }
    }
    for order in run.orders_for("BOLT-M8") {
        println!(
            "計劃訂單：數量 {}（淨需求 {}）| 下單日 {} | 到期日 {} | {:?}",
            order.quantity, order.original_requirement, order.start_date, order.due_date, order.zone
        );
    }

    Ok(())
}
