//! # Seed Data Generator
//!
//! Populates a development database with a snack shop's worth of data.
//!
//! ## Usage
//! ```bash
//! # 40 customers (default)
//! cargo run -p fomezero-db --bin seed
//!
//! # Custom amount and path
//! cargo run -p fomezero-db --bin seed -- --customers 200 --db ./data/fomezero.db
//! ```
//!
//! ## Generated Data
//! - Payment methods: Dinheiro, Pix, Cartão de Débito, Cartão de Crédito
//! - A fixed snack menu
//! - Customers, each with a few sales spread over the last six months.
//!   Older sales are mostly paid, recent ones mostly open, so the dashboard
//!   has receivables, overdue debts and a monthly history to show.

use chrono::{Duration, Utc};
use std::env;
use uuid::Uuid;

use fomezero_core::{
    Customer, PaymentMethod, PaymentSource, Sale, SaleItem, SalePayment, Snack,
};
use fomezero_db::{Database, DbConfig};

const PAYMENT_METHODS: &[&str] = &["Dinheiro", "Pix", "Cartão de Débito", "Cartão de Crédito"];

/// Menu: (name, price in cents)
const MENU: &[(&str, i64)] = &[
    ("Coxinha", 650),
    ("Pastel de Carne", 800),
    ("Pastel de Queijo", 750),
    ("Pão de Queijo", 400),
    ("Esfiha", 600),
    ("Misto Quente", 900),
    ("Bolo de Pote", 1000),
    ("Brigadeiro", 300),
    ("Suco Natural", 700),
    ("Refrigerante Lata", 600),
    ("Café", 350),
    ("Água", 300),
];

const FIRST_NAMES: &[&str] = &[
    "Ana", "Bruno", "Carla", "Diego", "Eduarda", "Felipe", "Gabriela", "Heitor", "Isabela",
    "João", "Larissa", "Marcos", "Natália", "Otávio", "Paula", "Rafael", "Sabrina", "Tiago",
    "Vanessa", "Wagner",
];

const LAST_NAMES: &[&str] = &["Silva", "Souza", "Oliveira", "Santos", "Lima", "Costa", "Pereira", "Almeida"];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut customer_count: usize = 40;
    let mut db_path = String::from("./fomezero_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--customers" | "-c" => {
                if i + 1 < args.len() {
                    customer_count = args[i + 1].parse().unwrap_or(40);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Fome Zero Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --customers <N>  Number of customers to generate (default: 40)");
                println!("  -d, --db <PATH>      Database file path (default: ./fomezero_dev.db)");
                println!("  -h, --help           Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Fome Zero Seed Data Generator");
    println!("================================");
    println!("Database:  {}", db_path);
    println!("Customers: {}", customer_count);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.customers().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} customers", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    let now = Utc::now();

    let mut methods = Vec::new();
    for name in PAYMENT_METHODS {
        let method = PaymentMethod {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            is_active: true,
            created_at: now,
        };
        db.payment_methods().insert(&method).await?;
        methods.push(method);
    }
    println!("✓ {} payment methods", methods.len());

    let mut snacks = Vec::new();
    for (name, price_cents) in MENU {
        let snack = Snack {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            description: None,
            price_cents: *price_cents,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        db.snacks().insert(&snack).await?;
        snacks.push(snack);
    }
    println!("✓ {} snacks", snacks.len());

    println!();
    println!("Generating customers and sales...");
    let start = std::time::Instant::now();

    let mut sale_count = 0;
    for seed in 0..customer_count {
        let customer = generate_customer(seed);
        if let Err(e) = db.customers().insert(&customer).await {
            eprintln!("Failed to insert {}: {}", customer.name, e);
            continue;
        }

        // 0..=4 sales per customer
        for n in 0..(seed * 7 + 3) % 5 {
            let sale = generate_sale(&customer, &snacks, &methods, seed * 31 + n * 11);
            db.sales().insert(&sale).await?;
            sale_count += 1;
        }
    }

    let elapsed = start.elapsed();
    println!();
    println!("✓ Generated {} customers and {} sales in {:?}", customer_count, sale_count, elapsed);

    let open = db.sales().list_open().await?;
    let receivable: i64 = open.iter().map(|s| s.remaining_amount().cents()).sum();
    println!("  Open sales: {}", open.len());
    println!("  Receivable: {}", fomezero_core::Money::from_cents(receivable));

    println!();
    println!("✓ Seed complete!");

    Ok(())
}

/// Generates a customer with a unique name; every third one has no phone.
fn generate_customer(seed: usize) -> Customer {
    let now = Utc::now();
    let first = FIRST_NAMES[seed % FIRST_NAMES.len()];
    let last = LAST_NAMES[(seed / FIRST_NAMES.len()) % LAST_NAMES.len()];
    let name = if seed < FIRST_NAMES.len() * LAST_NAMES.len() {
        format!("{} {}", first, last)
    } else {
        format!("{} {} {}", first, last, seed)
    };
    let phone = (seed % 3 != 0).then(|| format!("119{:08}", 10_000_000 + seed));

    Customer {
        id: Uuid::new_v4().to_string(),
        name,
        phone,
        is_active: true,
        credit_cents: 0,
        created_at: now,
        updated_at: now,
    }
}

/// Generates a sale of 1-3 snacks dated up to ~180 days back.
///
/// Sales older than 45 days are paid in full; newer ones are left open,
/// with every fourth one partially paid.
fn generate_sale(customer: &Customer, snacks: &[Snack], methods: &[PaymentMethod], seed: usize) -> Sale {
    let now = Utc::now();
    let sale_id = Uuid::new_v4().to_string();
    let days_back = (seed * 13 % 180) as i64;
    let sale_date = now - Duration::days(days_back);

    let items: Vec<SaleItem> = (0..1 + seed % 3)
        .map(|k| {
            let snack = &snacks[(seed + k * 5) % snacks.len()];
            let quantity = 1 + ((seed + k) % 2) as i64;
            SaleItem {
                id: Uuid::new_v4().to_string(),
                sale_id: sale_id.clone(),
                snack_id: snack.id.clone(),
                quantity,
                unit_price_cents: snack.price_cents,
                discount_cents: 0,
                total_amount_cents: quantity * snack.price_cents,
                created_at: now,
            }
        })
        .collect();
    let total: i64 = items.iter().map(|i| i.total_amount_cents).sum();

    let method = &methods[seed % methods.len()];
    let paid_cents = if days_back > 45 {
        total
    } else if seed % 4 == 0 {
        total / 2
    } else {
        0
    };

    let payments = if paid_cents > 0 {
        vec![SalePayment {
            id: Uuid::new_v4().to_string(),
            sale_id: sale_id.clone(),
            source: PaymentSource::Method(method.id.clone()),
            amount_cents: paid_cents,
            paid_at: sale_date,
            created_at: now,
        }]
    } else {
        Vec::new()
    };

    let is_paid = paid_cents == total;
    Sale {
        id: sale_id,
        customer_id: customer.id.clone(),
        sale_date,
        is_paid,
        paid_at: is_paid.then_some(sale_date),
        is_active: true,
        items,
        payments,
        created_at: now,
        updated_at: now,
    }
}
