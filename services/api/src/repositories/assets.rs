//! Asset repository for database operations

use anyhow::Result;
use common::models::{Asset, CreateAssetRequest, UpdateAssetRequest};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, QueryBuilder, Row};
use uuid::Uuid;

fn asset_from_row(row: &PgRow) -> Asset {
    Asset {
        id: row.get("id"),
        name: row.get("name"),
        model: row.get("model"),
        serial: row.get("serial"),
        category: row.get("category"),
    }
}

/// Asset repository for database operations
#[derive(Clone)]
pub struct AssetRepository {
    pool: PgPool,
}

impl AssetRepository {
    /// Create a new asset repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// List all assets ordered by name
    pub async fn list(&self) -> Result<Vec<Asset>> {
        let rows = sqlx::query(
            r#"
            SELECT id, name, model, serial, category
            FROM assets
            ORDER BY name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(asset_from_row).collect())
    }

    /// Create a new asset
    pub async fn create(&self, payload: &CreateAssetRequest) -> Result<Asset> {
        let row = sqlx::query(
            r#"
            INSERT INTO assets (name, model, serial, category)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, model, serial, category
            "#,
        )
        .bind(&payload.name)
        .bind(&payload.model)
        .bind(&payload.serial)
        .bind(&payload.category)
        .fetch_one(&self.pool)
        .await?;

        Ok(asset_from_row(&row))
    }

    /// Update the provided fields of an asset; a payload without any
    /// field is a no-op that returns the current row
    pub async fn update(&self, id: Uuid, payload: &UpdateAssetRequest) -> Result<Option<Asset>> {
        let mut builder = QueryBuilder::new("UPDATE assets SET ");
        let mut any_field = false;
        {
            let mut sets = builder.separated(", ");
            if let Some(name) = &payload.name {
                sets.push("name = ").push_bind_unseparated(name);
                any_field = true;
            }
            if let Some(model) = &payload.model {
                sets.push("model = ").push_bind_unseparated(model);
                any_field = true;
            }
            if let Some(serial) = &payload.serial {
                sets.push("serial = ").push_bind_unseparated(serial);
                any_field = true;
            }
            if let Some(category) = &payload.category {
                sets.push("category = ").push_bind_unseparated(category);
                any_field = true;
            }
        }

        if !any_field {
            return self.find_by_id(id).await;
        }

        builder.push(" WHERE id = ").push_bind(id);
        builder.push(" RETURNING id, name, model, serial, category");

        let row = builder.build().fetch_optional(&self.pool).await?;

        Ok(row.as_ref().map(asset_from_row))
    }

    /// Delete an asset and its assignments
    pub async fn delete(&self, id: Uuid) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM assignments WHERE asset_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM assets WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Find an asset by ID
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Asset>> {
        let row = sqlx::query(
            r#"
            SELECT id, name, model, serial, category
            FROM assets
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(asset_from_row))
    }
}
