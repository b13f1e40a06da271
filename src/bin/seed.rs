use duka_api::{
    config::AppConfig,
    db::{create_orm_conn, create_pool, run_migrations},
};
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let orm = create_orm_conn(&config.database_url).await?;
    run_migrations(&orm).await?;

    let pool = create_pool(&config.database_url).await?;
    seed_users(&pool).await?;
    seed_inventory(&pool).await?;

    println!("Seed completed");
    Ok(())
}

async fn seed_users(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    let users = vec![
        ("shopkeeper", Some("+254700000001"), true),
        ("warehouse", Some("+254700000002"), true),
        ("walkin", None, false),
    ];

    for (username, phone_number, is_staff) in users {
        sqlx::query(
            r#"
            INSERT INTO users (id, username, phone_number, is_staff)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (username) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(username)
        .bind(phone_number)
        .bind(is_staff)
        .execute(pool)
        .await?;
        println!("Ensured user {username} (staff={is_staff})");
    }

    Ok(())
}

async fn seed_inventory(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    let items = vec![
        ("Laptop", "15.6\" business laptop", 80000_i64, 12, 5),
        ("Smartphone", "Dual-SIM Android handset", 45000, 25, 5),
        ("Headphones", "Over-ear, wired", 7000, 40, 10),
        ("Monitor", "24\" IPS display", 20000, 8, 5),
        ("Desk Chair", "Adjustable office chair", 15000, 6, 3),
    ];

    for (name, description, price, on_hand, warn_limit) in items {
        sqlx::query(
            r#"
            INSERT INTO inventory_items (id, name, description, price, on_hand, warn_limit)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (name) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(description)
        .bind(price)
        .bind(on_hand)
        .bind(warn_limit)
        .execute(pool)
        .await?;
    }

    println!("Seeded inventory");
    Ok(())
}
