//! Seed the database with the default admin and demo user accounts.
//!
//! Upserts by email so the binary is safe to run repeatedly.

use anyhow::Result;
use argon2::{Argon2, PasswordHasher, password_hash::SaltString};
use sqlx::{PgPool, Row};
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

use common::database::{DatabaseConfig, init_pool, run_migrations};

struct SeedUser<'a> {
    name: &'a str,
    email: &'a str,
    role: &'a str,
    password: &'a str,
}

const SEED_USERS: &[SeedUser<'static>] = &[
    SeedUser {
        name: "Admin",
        email: "admin@zimmet.local",
        role: "admin",
        password: "Admin123!",
    },
    SeedUser {
        name: "User",
        email: "user@zimmet.local",
        role: "user",
        password: "User123!",
    },
];

async fn upsert_user(pool: &PgPool, seed: &SeedUser<'_>) -> Result<()> {
    let salt = SaltString::generate(&mut rand::thread_rng());
    let password_hash = Argon2::default()
        .hash_password(seed.password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {}", e))?
        .to_string();

    let exists: i64 = sqlx::query("SELECT COUNT(1) AS c FROM users WHERE lower(email) = lower($1)")
        .bind(seed.email)
        .fetch_one(pool)
        .await?
        .get("c");

    if exists == 0 {
        sqlx::query(
            r#"
            INSERT INTO users (name, email, role, password_hash)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(seed.name)
        .bind(seed.email)
        .bind(seed.role)
        .bind(&password_hash)
        .execute(pool)
        .await?;
        info!("Created user {}", seed.email);
    } else {
        sqlx::query(
            r#"
            UPDATE users SET name = $1, role = $2, password_hash = $3
            WHERE lower(email) = lower($4)
            "#,
        )
        .bind(seed.name)
        .bind(seed.role)
        .bind(&password_hash)
        .bind(seed.email)
        .execute(pool)
        .await?;
        info!("Updated user {}", seed.email);
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let db_config = DatabaseConfig::from_env()?;
    let pool = init_pool(&db_config).await?;

    run_migrations(&sqlx::migrate!("./migrations"), &pool).await?;

    for seed in SEED_USERS {
        upsert_user(&pool, seed).await?;
    }

    info!("Seed finished");
    Ok(())
}
