//! Repositories for database operations

use anyhow::Result;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString};
use common::field::Field;
use common::models::{CreateUserRequest, Role, UpdateUserRequest, User};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, QueryBuilder, Row};
use uuid::Uuid;

pub mod assets;
pub mod assignments;
pub mod categories;

/// Hash a plaintext password with argon2
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut rand::thread_rng());
    let argon2 = Argon2::default();
    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {}", e))?
        .to_string();

    Ok(password_hash)
}

/// Verify a plaintext password against a stored argon2 hash
///
/// An unparsable stored hash counts as a mismatch, not an error.
pub fn verify_password(password_hash: &str, password: &str) -> bool {
    let Ok(parsed_hash) = PasswordHash::new(password_hash) else {
        return false;
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

fn user_from_row(row: &PgRow) -> User {
    User {
        id: row.get("id"),
        name: row.get("name"),
        email: row.get("email"),
        department: row.get("department"),
        role: Role::from(row.get::<String, _>("role").as_str()),
    }
}

/// User repository for database operations
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    /// Create a new user repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// List all users ordered by name
    pub async fn list(&self) -> Result<Vec<User>> {
        let rows = sqlx::query(
            r#"
            SELECT id, name, email, department, role
            FROM users
            ORDER BY name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(user_from_row).collect())
    }

    /// Create a new user with the given plaintext password
    pub async fn create(&self, payload: &CreateUserRequest, password: &str) -> Result<User> {
        let password_hash = hash_password(password)?;
        let role = payload.role.unwrap_or(Role::User);

        let row = sqlx::query(
            r#"
            INSERT INTO users (name, email, department, role, password_hash)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, name, email, department, role
            "#,
        )
        .bind(&payload.name)
        .bind(&payload.email)
        .bind(payload.department.as_deref())
        .bind(role.as_str())
        .bind(&password_hash)
        .fetch_one(&self.pool)
        .await?;

        Ok(user_from_row(&row))
    }

    /// Update the provided fields of a user; a payload without any
    /// field is a no-op that returns the current row
    pub async fn update(&self, id: Uuid, payload: &UpdateUserRequest) -> Result<Option<User>> {
        let password_hash = match &payload.password {
            Some(password) => Some(hash_password(password)?),
            None => None,
        };

        let mut builder = QueryBuilder::new("UPDATE users SET ");
        let mut any_field = false;
        {
            let mut sets = builder.separated(", ");
            if let Some(name) = &payload.name {
                sets.push("name = ").push_bind_unseparated(name);
                any_field = true;
            }
            if let Some(email) = &payload.email {
                sets.push("email = ").push_bind_unseparated(email);
                any_field = true;
            }
            match &payload.department {
                Field::Absent => {}
                department => {
                    let value = department.as_option().flatten().map(String::as_str);
                    sets.push("department = ").push_bind_unseparated(value);
                    any_field = true;
                }
            }
            if let Some(role) = payload.role {
                sets.push("role = ").push_bind_unseparated(role.as_str());
                any_field = true;
            }
            if let Some(hash) = &password_hash {
                sets.push("password_hash = ").push_bind_unseparated(hash);
                any_field = true;
            }
        }

        if !any_field {
            return self.find_by_id(id).await;
        }

        builder.push(" WHERE id = ").push_bind(id);
        builder.push(" RETURNING id, name, email, department, role");

        let row = builder.build().fetch_optional(&self.pool).await?;

        Ok(row.as_ref().map(user_from_row))
    }

    /// Delete a user and its assignments
    pub async fn delete(&self, id: Uuid) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM assignments WHERE user_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Find a user by ID
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        let row = sqlx::query(
            r#"
            SELECT id, name, email, department, role
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(user_from_row))
    }

    /// Find a user and its password hash by email, case-insensitively
    pub async fn find_credentials(&self, email: &str) -> Result<Option<(User, String)>> {
        let row = sqlx::query(
            r#"
            SELECT id, name, email, department, role, password_hash
            FROM users
            WHERE lower(email) = lower($1)
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row
            .as_ref()
            .map(|row| (user_from_row(row), row.get("password_hash"))))
    }
}
