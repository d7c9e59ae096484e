//! Seed script for development — populates a fresh database with sample data.
//!
//! Usage: `cargo run --bin seed`
//!
//! Requires `DATABASE_URL` and `JWT_SECRET` environment variables (reads .env).

use fortress::models::organization::Organization;
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

const ADMIN_PASSWORD: &str = "Admin123!";
const MANAGER_PASSWORD: &str = "Manager123!";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let db_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(&db_url)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    println!("=== Fortress Seed Script ===");

    let org_id = seed_organization(&pool).await?;
    seed_users(&pool, org_id).await?;
    let item_id = seed_items(&pool, org_id).await?;
    seed_rules(&pool, org_id, item_id).await?;

    println!("\n=== Seed complete! ===");
    println!("Admin login: admin / {ADMIN_PASSWORD}");
    println!("Manager login: manager / {MANAGER_PASSWORD}");

    Ok(())
}

async fn seed_organization(pool: &PgPool) -> anyhow::Result<Uuid> {
    if let Some(org) = sqlx::query_as::<_, Organization>(
        "SELECT * FROM organizations WHERE slug = 'acme-supply'",
    )
    .fetch_optional(pool)
    .await?
    {
        println!("[skip] Organization '{}' already exists", org.name);
        return Ok(org.id);
    }

    let id = sqlx::query_scalar::<_, Uuid>(
        "INSERT INTO organizations (name, slug) VALUES ('Acme Supply Co', 'acme-supply') RETURNING id",
    )
    .fetch_one(pool)
    .await?;

    println!("[done] Created organization Acme Supply Co");
    Ok(id)
}

async fn seed_users(pool: &PgPool, org_id: Uuid) -> anyhow::Result<()> {
    let exists: bool =
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE username = 'admin')")
            .fetch_one(pool)
            .await?;
    if exists {
        println!("[skip] Users already exist");
        return Ok(());
    }

    let admin_hash = fortress::services::auth::hash_password(ADMIN_PASSWORD)?;
    sqlx::query(
        "INSERT INTO users (organization_id, username, email, password_hash, display_name, role)
         VALUES ($1, 'admin', 'admin@acme-supply.test', $2, 'Warehouse Admin', 'Org_Admin')",
    )
    .bind(org_id)
    .bind(&admin_hash)
    .execute(pool)
    .await?;

    let manager_hash = fortress::services::auth::hash_password(MANAGER_PASSWORD)?;
    sqlx::query(
        "INSERT INTO users (organization_id, username, email, password_hash, display_name, role)
         VALUES ($1, 'manager', 'manager@acme-supply.test', $2, 'Inventory Manager', 'Inventory_Manager')",
    )
    .bind(org_id)
    .bind(&manager_hash)
    .execute(pool)
    .await?;

    println!("[done] Created admin and manager users");
    Ok(())
}

async fn seed_items(pool: &PgPool, org_id: Uuid) -> anyhow::Result<Uuid> {
    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM inventory_items WHERE organization_id = $1")
            .bind(org_id)
            .fetch_one(pool)
            .await?;
    if count > 0 {
        println!("[skip] Items already exist");
        let id = sqlx::query_scalar::<_, Uuid>(
            "SELECT id FROM inventory_items WHERE organization_id = $1 LIMIT 1",
        )
        .bind(org_id)
        .fetch_one(pool)
        .await?;
        return Ok(id);
    }

    let items = [
        ("Widget", "W-1", "Hardware", 40i64, 10i64, 2.5f64, 9.99f64),
        ("Gasket", "G-7", "Hardware", 8, 15, 0.4, 1.99),
        ("Label Roll", "L-3", "Packaging", 120, 25, 1.1, 4.5),
    ];

    let mut first_id = Uuid::nil();
    for (i, (name, sku, category, qty, threshold, cost, price)) in items.iter().enumerate() {
        let status = fortress::models::item::ItemStatus::for_quantity(*qty, *threshold);
        let id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO inventory_items
                (organization_id, name, sku, category, quantity, low_stock_threshold,
                 unit_cost, retail_price, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id
            "#,
        )
        .bind(org_id)
        .bind(name)
        .bind(sku)
        .bind(category)
        .bind(qty)
        .bind(threshold)
        .bind(cost)
        .bind(price)
        .bind(status)
        .fetch_one(pool)
        .await?;
        if i == 0 {
            first_id = id;
        }
    }

    println!("[done] Created {} inventory items", items.len());
    Ok(first_id)
}

async fn seed_rules(pool: &PgPool, org_id: Uuid, item_id: Uuid) -> anyhow::Result<()> {
    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM automation_rules WHERE organization_id = $1")
            .bind(org_id)
            .fetch_one(pool)
            .await?;
    if count > 0 {
        println!("[skip] Rules already exist");
        return Ok(());
    }

    let admin_id = sqlx::query_scalar::<_, Uuid>(
        "SELECT id FROM users WHERE organization_id = $1 AND role = 'Org_Admin' LIMIT 1",
    )
    .bind(org_id)
    .fetch_one(pool)
    .await?;

    let rules = [
        (
            "Low stock alert",
            "ON_STOCK_LEVEL_CHANGE",
            json!({"field": "quantity", "operator": "lt", "value": 10}),
            json!({"type": "SEND_NOTIFICATION", "message": "{itemName} low: {quantity} left"}),
        ),
        (
            "Auto-reorder widgets",
            "ON_STOCK_LEVEL_CHANGE",
            json!({"field": "quantity", "operator": "lt", "value": 5}),
            json!({"type": "CREATE_PURCHASE_ORDER", "itemId": item_id, "quantity": 50}),
        ),
        (
            "Shipment email",
            "ON_ORDER_STATUS_CHANGE",
            json!({"orderType": "Sales", "oldStatus": "any", "newStatus": "Shipped"}),
            json!({
                "type": "SEND_EMAIL",
                "to": "manager",
                "subject": "Order shipped: {sku}",
                "body": "{quantity} x {itemName} moved from {oldStatus} to {newStatus}."
            }),
        ),
    ];

    for (name, trigger, condition, action) in rules {
        sqlx::query(
            r#"
            INSERT INTO automation_rules
                (organization_id, name, trigger_type, condition, action, created_by)
            VALUES ($1, $2, $3::trigger_type, $4, $5, $6)
            "#,
        )
        .bind(org_id)
        .bind(name)
        .bind(trigger)
        .bind(&condition)
        .bind(&action)
        .bind(admin_id)
        .execute(pool)
        .await?;
    }

    println!("[done] Created 3 automation rules");
    Ok(())
}
