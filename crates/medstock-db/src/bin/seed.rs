//! # Seed Data Generator
//!
//! Populates a development database with stations, categories, supply items
//! and some opening stock.
//!
//! ## Usage
//! ```bash
//! cargo run -p medstock-db --bin seed
//!
//! # Specify database path
//! cargo run -p medstock-db --bin seed -- --db ./data/medstock.db
//!
//! # Leave out the duplicate name variants
//! cargo run -p medstock-db --bin seed -- --no-duplicates
//! ```
//!
//! ## Duplicates
//! By default a handful of items are registered a second time under a name
//! variant (full-width digits, stray spaces), the way they accumulate in a
//! real catalog. Running `consolidate` afterwards folds them back together.

use std::env;

use anyhow::Context;
use chrono::{Duration, Utc};
use medstock_core::validation::parse_expiry_date;
use medstock_core::{Department, NewItem, NewMovement};
use medstock_db::{Database, DbConfig};
use tracing_subscriber::EnvFilter;

const DEPARTMENTS: &[(i64, &str)] = &[
    (1, "警防課"),
    (2, "三次"),
    (3, "作木"),
    (4, "吉舎"),
    (5, "三和"),
    (6, "口和"),
    (7, "甲奴"),
    (8, "庄原"),
    (9, "西城"),
    (10, "高野"),
    (11, "東城"),
];

/// (category, icon, [(item, unit, has_expiry)])
const CATALOG: &[(&str, &str, &[(&str, &str, bool)])] = &[
    (
        "輸液",
        "💉",
        &[
            ("生理食塩水 500ml", "本", true),
            ("生理食塩水 100ml", "本", true),
            ("乳酸リンゲル液 500ml", "本", true),
            ("5%ブドウ糖液 500ml", "本", true),
        ],
    ),
    (
        "薬剤",
        "💊",
        &[
            ("アドレナリン 1mg", "アンプル", true),
            ("アトロピン 0.5mg", "アンプル", true),
            ("リドカイン 2%", "アンプル", true),
        ],
    ),
    (
        "気道管理",
        "🫁",
        &[
            ("気管チューブ 7.0mm", "本", true),
            ("気管チューブ 7.5mm", "本", true),
            ("ラリンゲアルマスク #3", "個", true),
            ("吸引カテーテル 14Fr", "本", true),
        ],
    ),
    (
        "資機材",
        "🩺",
        &[
            ("留置針 18G", "本", true),
            ("留置針 20G", "本", true),
            ("輸液セット", "セット", true),
            ("三方活栓", "個", true),
        ],
    ),
    (
        "消耗品",
        "🩹",
        &[
            ("サージカルテープ", "巻", false),
            ("ガーゼ（滅菌）", "枚", true),
            ("三角巾", "枚", false),
            ("ディスポ手袋 M", "箱", true),
        ],
    ),
    (
        "その他",
        "📦",
        &[
            ("電極パッド（成人）", "セット", true),
            ("SpO2センサー", "個", false),
        ],
    ),
];

/// Name variants registered under a different category than the original,
/// with the expiry of their opening stock ("" for none).
const VARIANTS: &[(&str, &str, &str, &str)] = &[
    ("留置針 １８Ｇ", "資機材", "本", "2027-03-31"),
    ("三角巾 ", "その他", "枚", ""),
    ("ＳｐＯ２センサー", "資機材", "個", ""),
    ("生理食塩水　500ml", "輸液", "本", "2026-12-31"),
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./medstock_dev.db");
    let mut with_duplicates = true;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--no-duplicates" => with_duplicates = false,
            "--help" | "-h" => {
                println!("Medstock Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>      Database file path (default: ./medstock_dev.db)");
                println!("      --no-duplicates  Skip the duplicate name variants");
                println!("  -h, --help           Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Medstock Seed Data Generator");
    println!("===============================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path))
        .await
        .with_context(|| format!("opening {db_path}"))?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.catalog().count_items().await?;
    if existing > 0 {
        println!("⚠ Database already has {} items", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    for (id, name) in DEPARTMENTS {
        db.catalog()
            .insert_department(&Department {
                id: *id,
                name: name.to_string(),
            })
            .await?;
    }
    println!("✓ {} departments", DEPARTMENTS.len());

    let today = Utc::now().date_naive();
    let mut categories = Vec::new();
    let mut generated = 0;

    for (category_name, icon, items) in CATALOG {
        let category = db.catalog().create_category(category_name, icon).await?;

        for (idx, (name, unit, has_expiry)) in items.iter().enumerate() {
            let item = db
                .catalog()
                .create_item(&NewItem {
                    name: name.to_string(),
                    unit: unit.to_string(),
                    has_expiry: *has_expiry,
                    min_stock: 2,
                    category_id: Some(category.id),
                })
                .await?;
            generated += 1;

            // Opening stock at the HQ and one station.
            for department_id in [1, 2 + (idx as i64 % 10)] {
                let mut movement =
                    NewMovement::stock_in(department_id, item.id, 5 + idx as i64)
                        .with_remarks("初期在庫");
                if *has_expiry {
                    movement = movement.with_expiry(today + Duration::days(30 + 60 * idx as i64));
                }
                db.ledger().record_movement(&movement).await?;
            }
        }

        categories.push(category);
    }
    println!("✓ {} categories, {} items", categories.len(), generated);

    if with_duplicates {
        for (name, category_name, unit, expiry) in VARIANTS {
            let expiry_date = parse_expiry_date(expiry)
                .with_context(|| format!("expiry of variant {name}"))?;

            let category_id = categories
                .iter()
                .find(|c| c.name == *category_name)
                .map(|c| c.id);

            let item = db
                .catalog()
                .create_item(&NewItem {
                    name: name.to_string(),
                    unit: unit.to_string(),
                    has_expiry: expiry_date.is_some(),
                    min_stock: 0,
                    category_id,
                })
                .await?;

            let mut movement = NewMovement::stock_in(1, item.id, 3).with_remarks("重複登録");
            if let Some(expiry_date) = expiry_date {
                movement = movement.with_expiry(expiry_date);
            }
            db.ledger().record_movement(&movement).await?;
        }
        println!("✓ {} duplicate name variants", VARIANTS.len());
    }

    println!();
    println!("✓ Seed complete!");

    db.close().await;
    Ok(())
}

/// `RUST_LOG` overrides the default filter.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,medstock=debug,sqlx=warn"));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}
