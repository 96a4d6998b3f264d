//! BOM 展開與 MRP 計算效能測試（隨機產生的多階 BOM）

use chrono::{Duration, NaiveDate};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use mrp_calc::{BomExplosion, MrpEngine};
use mrp_core::{
    Bom, BomLine, BucketSize, Demand, DemandType, EngineSettings, InMemoryInventory, MrpConfig, PlanningHorizon,
    ReplenishmentType, StructureCatalog,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;

fn start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 11, 1).unwrap()
}

/// 產生 `levels` 階、每階 `width` 個物料的 BOM；子件只取下一階，保證無循環
fn generate(levels: usize, width: usize, seed: u64) -> (StructureCatalog, InMemoryInventory, Vec<String>) {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut catalog = StructureCatalog::new();
    let mut inventory = InMemoryInventory::new();
    let id = |level: usize, index: usize| format!("L{}-{:03}", level, index);

    for level in 0..levels {
        for index in 0..width {
            let product_id = id(level, index);
            let is_leaf = level + 1 == levels;
            let replenishment = if is_leaf {
                ReplenishmentType::Purchase
            } else {
                ReplenishmentType::Manufacture
            };
            inventory = inventory
                .with_config(MrpConfig::new(&product_id, rng.gen_range(1..4), replenishment))
                .with_on_hand(&product_id, Decimal::from(rng.gen_range(0..20)));

            if !is_leaf {
                let mut bom = Bom::new(&product_id, 1);
                for _ in 0..rng.gen_range(2..5) {
                    let child = id(level + 1, rng.gen_range(0..width));
                    if bom.lines.iter().any(|l| l.component_id == child) {
                        continue;
                    }
                    bom = bom.with_line(BomLine::new(child, Decimal::from(rng.gen_range(1..4)), "EA"));
                }
                catalog.add_bom(bom.released()).unwrap();
            }
        }
    }

    let tops: Vec<String> = (0..width).map(|index| id(0, index)).collect();
    for product_id in &tops {
        for week in 1..4 {
            inventory.add_demand(Demand::new(
                product_id,
                Decimal::from(rng.gen_range(10..100)),
                start() + Duration::weeks(week),
                DemandType::SalesOrder,
            ));
        }
    }

    (catalog, inventory, tops)
}

fn bench_explosion(c: &mut Criterion) {
    let (catalog, _, tops) = generate(5, 20, 7);
    let explosion = BomExplosion::new(&catalog);

    c.bench_function("explode_5_levels", |b| {
        b.iter(|| {
            for product_id in &tops {
                black_box(explosion.explode(product_id, Decimal::from(10), start()).unwrap());
            }
        })
    });
}

fn bench_engine(c: &mut Criterion) {
    let (catalog, inventory, tops) = generate(5, 20, 11);
    let horizon = PlanningHorizon::from_days(start(), 56, 7, 7, BucketSize::Day).unwrap();

    let mut group = c.benchmark_group("mrp_engine");
    for parallel in [false, true] {
        let engine = MrpEngine::new(&catalog, &inventory).with_settings(EngineSettings::default().with_parallel(parallel));
        group.bench_with_input(BenchmarkId::new("calculate", parallel), &parallel, |b, _| {
            b.iter(|| black_box(engine.calculate(tops.iter().cloned(), &horizon).unwrap()))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_explosion, bench_engine);
criterion_main!(benches);
