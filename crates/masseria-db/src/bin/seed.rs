//! # Seed Data Generator
//!
//! Loads a demo menu and accounts for local development.
//!
//! ## Usage
//! ```bash
//! # Seed ./masseria_dev.db
//! cargo run -p masseria-db --bin seed
//!
//! # Specify database path
//! cargo run -p masseria-db --bin seed -- --db ./data/masseria.db
//!
//! # Also place a sample order and reservation
//! cargo run -p masseria-db --bin seed -- --with-activity
//! ```
//!
//! ## Generated Data
//! - Four categories (Entradas, Fondos, Postres, Bebidas)
//! - A Peruvian menu with prices in soles, a few items featured
//! - One ADMIN and one CLIENTE account

use chrono::{Local, NaiveTime, Utc};
use std::env;
use uuid::Uuid;

use masseria_core::{ContactSnapshot, NewReservation, Product, Role, User};
use masseria_db::repository::order::pickup_request;
use masseria_db::{Database, DbConfig};

/// (category, description, [(name, price in cents, featured)])
const MENU: &[(&str, &str, &[(&str, i64, bool)])] = &[
    (
        "Entradas",
        "Para abrir el apetito",
        &[
            ("Ceviche Clásico", 3200, true),
            ("Causa Limeña", 1800, false),
            ("Papa a la Huancaína", 1500, false),
            ("Anticuchos de Corazón", 2200, true),
            ("Tequeños de Queso", 1600, false),
        ],
    ),
    (
        "Fondos",
        "Platos de fondo",
        &[
            ("Lomo Saltado", 3800, true),
            ("Ají de Gallina", 2900, false),
            ("Arroz con Mariscos", 3600, false),
            ("Seco de Res con Frejoles", 3400, false),
            ("Tacu Tacu con Bistec", 3500, false),
            ("Pollo a la Brasa (1/4)", 2400, true),
        ],
    ),
    (
        "Postres",
        "Dulces de la casa",
        &[
            ("Suspiro a la Limeña", 1200, false),
            ("Picarones", 1400, true),
            ("Mazamorra Morada", 900, false),
            ("Arroz con Leche", 900, false),
        ],
    ),
    (
        "Bebidas",
        "Frías y calientes",
        &[
            ("Chicha Morada (jarra)", 1800, false),
            ("Inca Kola 500ml", 600, false),
            ("Limonada Frozen", 1000, false),
            ("Pisco Sour", 2200, true),
            ("Café Pasado", 700, false),
        ],
    ),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./masseria_dev.db");
    let mut with_activity = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--with-activity" => with_activity = true,
            "--help" | "-h" => {
                println!("Masseria Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>     Database file path (default: ./masseria_dev.db)");
                println!("      --with-activity Place a sample order and reservation");
                println!("  -h, --help          Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Masseria Seed Data Generator");
    println!("===============================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;
    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.products().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} products", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    let start = std::time::Instant::now();
    let mut generated = 0;
    let mut first_products: Vec<Product> = Vec::new();

    for (category_name, description, items) in MENU {
        let category = db.categories().insert(category_name, Some(*description)).await?;

        for (name, price_cents, featured) in items.iter() {
            let product = menu_product(&category.id, name, *price_cents, *featured);
            match db.products().insert(&product).await {
                Ok(inserted) => {
                    if first_products.len() < 2 {
                        first_products.push(inserted);
                    }
                    generated += 1;
                }
                Err(e) => eprintln!("Failed to insert {}: {}", name, e),
            }
        }
        println!("  {}: {} items", category.name, items.len());
    }

    println!();
    println!("✓ Generated {} products in {:?}", generated, start.elapsed());

    let admin = account("Administración Masseria", "admin@masseria.pe", Role::Admin);
    let customer = account("Lucía Ramírez", "lucia@example.com", Role::Cliente);
    db.users().insert(&admin).await?;
    db.users().insert(&customer).await?;
    println!("✓ Accounts: {} (ADMIN), {} (CLIENTE)", admin.email, customer.email);

    if with_activity {
        let lines: Vec<(&str, i64)> = first_products
            .iter()
            .map(|p| (p.id.as_str(), 1))
            .collect();
        let order = db
            .orders()
            .place(&customer.id, pickup_request("", "", &lines))
            .await?;
        println!("✓ Order {} placed: {}", order.order.id, order.total());

        let reservation = db
            .reservations()
            .create(NewReservation {
                contact: ContactSnapshot {
                    name: customer.full_name.clone(),
                    email: customer.email.clone(),
                    phone: customer.phone.clone().unwrap_or_default(),
                },
                date: Local::now().date_naive(),
                time: NaiveTime::from_hms_opt(20, 0, 0).unwrap_or_default(),
                party_size: 4,
                notes: Some("Mesa cerca a la ventana".to_string()),
                user_id: Some(customer.id.clone()),
            })
            .await?;
        println!("✓ Reservation {} at {}", reservation.id, reservation.slot());
    }

    let featured = db.products().list_featured(20).await?;
    println!();
    println!("Featured today: {}", featured.len());
    for product in featured {
        println!("  {} - {}", product.name, product.price());
    }

    println!();
    println!("✓ Seed complete!");

    Ok(())
}

fn menu_product(category_id: &str, name: &str, price_cents: i64, featured: bool) -> Product {
    let now = Utc::now();
    Product {
        id: Uuid::new_v4().to_string(),
        category_id: Some(category_id.to_string()),
        name: name.to_string(),
        description: None,
        price_cents,
        // Stock varies so low-stock screens have something to show.
        stock: 5 + (price_cents / 100) % 40,
        is_featured: featured,
        is_active: true,
        created_at: now,
        updated_at: now,
    }
}

fn account(full_name: &str, email: &str, role: Role) -> User {
    User {
        id: Uuid::new_v4().to_string(),
        full_name: full_name.to_string(),
        email: email.to_string(),
        phone: Some("014445566".to_string()),
        address: Some("Av. José Larco 812, Miraflores".to_string()),
        role,
        is_active: true,
        created_at: Utc::now(),
    }
}
