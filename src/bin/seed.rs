use chrono::NaiveDate;
use grocery_shop_api::{config::AppConfig, db::create_pool, models::Role, security};
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let pool = create_pool(&config.database_url).await?;
    // Ensure migrations are applied.
    sqlx::migrate!("./migrations").run(&pool).await?;

    let admin_id = ensure_user(&pool, "admin", "admin@example.com", "admin123", Role::Admin).await?;
    let user_id = ensure_user(&pool, "alice", "alice@example.com", "alice123", Role::User).await?;
    seed_catalog(&pool).await?;

    println!("Seed completed. Admin ID: {admin_id}, User ID: {user_id}");
    Ok(())
}

async fn ensure_user(
    pool: &sqlx::PgPool,
    username: &str,
    email: &str,
    password: &str,
    role: Role,
) -> anyhow::Result<Uuid> {
    let password_hash = security::hash_password(password).map_err(|e| anyhow::anyhow!("{e}"))?;

    let row: Option<(Uuid,)> = sqlx::query_as(
        r#"
        INSERT INTO users (id, username, email, password_hash, role)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (username) DO UPDATE SET role = EXCLUDED.role
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(username)
    .bind(email)
    .bind(password_hash)
    .bind(role)
    .fetch_optional(pool)
    .await?;

    let user_id = match row {
        Some((id,)) => id,
        None => {
            let existing: (Uuid,) = sqlx::query_as("SELECT id FROM users WHERE username = $1")
                .bind(username)
                .fetch_one(pool)
                .await?;
            existing.0
        }
    };

    println!("Ensured user {username} (role={role:?})");
    Ok(user_id)
}

async fn seed_catalog(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    let country_id = ensure_named(pool, "countries", "Spain").await?;
    let category_id = ensure_named(pool, "categories", "Fruit").await?;

    let products = vec![
        ("Oranges", 2.5, "kg", NaiveDate::from_ymd_opt(2026, 12, 31)),
        ("Apples", 1.8, "kg", NaiveDate::from_ymd_opt(2026, 11, 30)),
        ("Watermelon", 4.0, "piece", NaiveDate::from_ymd_opt(2026, 10, 15)),
    ];

    for (name, price, unit, expiration) in products {
        let expiration = expiration.ok_or_else(|| anyhow::anyhow!("invalid seed date"))?;
        // Product names are not unique, so check before inserting.
        let exists: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM products WHERE name = $1")
            .bind(name)
            .fetch_optional(pool)
            .await?;
        if exists.is_some() {
            continue;
        }

        sqlx::query(
            r#"
            INSERT INTO products (id, name, country_id, category_id, price_per_unit, unit_type, expiration_date)
            VALUES ($1, $2, $3, $4, $5, $6::unit_type, $7)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(country_id)
        .bind(category_id)
        .bind(price)
        .bind(unit)
        .bind(expiration)
        .execute(pool)
        .await?;
    }

    println!("Seeded catalog");
    Ok(())
}

async fn ensure_named(pool: &sqlx::PgPool, table: &str, name: &str) -> anyhow::Result<Uuid> {
    let sql = format!(
        "INSERT INTO {table} (id, name) VALUES ($1, $2) ON CONFLICT (name) DO NOTHING RETURNING id"
    );
    let row: Option<(Uuid,)> = sqlx::query_as(&sql)
        .bind(Uuid::new_v4())
        .bind(name)
        .fetch_optional(pool)
        .await?;

    match row {
        Some((id,)) => Ok(id),
        None => {
            let sql = format!("SELECT id FROM {table} WHERE name = $1");
            let existing: (Uuid,) = sqlx::query_as(&sql).bind(name).fetch_one(pool).await?;
            Ok(existing.0)
        }
    }
}
