//! Assignment repository for database operations
//!
//! Listing and single-record reads join users and assets, which also
//! keeps orphaned rows out of the results.

use anyhow::Result;
use common::field::Field;
use common::models::{
    Assignment, AssignmentFilter, AssignmentRow, CreateAssignmentRequest, UpdateAssignmentRequest,
};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, QueryBuilder, Row};
use uuid::Uuid;

fn assignment_from_row(row: &PgRow) -> Assignment {
    Assignment {
        id: row.get("id"),
        user_id: row.get("user_id"),
        asset_id: row.get("asset_id"),
        assigned_at: row.get("assigned_at"),
        note: row.get("note"),
    }
}

fn joined_from_row(row: &PgRow) -> AssignmentRow {
    AssignmentRow {
        id: row.get("id"),
        user_id: row.get("user_id"),
        asset_id: row.get("asset_id"),
        assigned_at: row.get("assigned_at"),
        note: row.get("note"),
        user_name: row.get("user_name"),
        user_email: row.get("user_email"),
        asset_name: row.get("asset_name"),
        asset_model: row.get("asset_model"),
        asset_serial: row.get("asset_serial"),
        asset_category: row.get("asset_category"),
    }
}

const JOINED_SELECT: &str = r#"
    SELECT a.id, a.user_id, a.asset_id, a.assigned_at, a.note,
           u.name AS user_name, u.email AS user_email,
           s.name AS asset_name, s.model AS asset_model,
           s.serial AS asset_serial, s.category AS asset_category
    FROM assignments a
    JOIN users u ON u.id = a.user_id
    JOIN assets s ON s.id = a.asset_id
"#;

/// Assignment repository for database operations
#[derive(Clone)]
pub struct AssignmentRepository {
    pool: PgPool,
}

impl AssignmentRepository {
    /// Create a new assignment repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// List assignments joined with user and asset, newest first.
    ///
    /// Both filters are always bound; an omitted filter passes every
    /// row through, and both combine with AND semantics.
    pub async fn list(&self, filter: &AssignmentFilter) -> Result<Vec<AssignmentRow>> {
        let query = format!(
            r#"{JOINED_SELECT}
            WHERE ($1::uuid IS NULL OR a.user_id = $1)
              AND ($2::text IS NULL OR s.category = $2)
            ORDER BY a.assigned_at DESC
            "#
        );

        let rows = sqlx::query(&query)
            .bind(filter.user_id)
            .bind(filter.category.as_deref())
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.iter().map(joined_from_row).collect())
    }

    /// Get a single joined assignment by ID
    pub async fn get(&self, id: Uuid) -> Result<Option<AssignmentRow>> {
        let query = format!("{JOINED_SELECT} WHERE a.id = $1");

        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(joined_from_row))
    }

    /// Create a new assignment; the timestamp defaults to the server
    /// clock when omitted
    pub async fn create(&self, payload: &CreateAssignmentRequest) -> Result<Assignment> {
        let row = sqlx::query(
            r#"
            INSERT INTO assignments (user_id, asset_id, assigned_at, note)
            VALUES ($1, $2, COALESCE($3, now()), $4)
            RETURNING id, user_id, asset_id, assigned_at, note
            "#,
        )
        .bind(payload.user_id)
        .bind(payload.asset_id)
        .bind(payload.assigned_at)
        .bind(payload.note.as_deref())
        .fetch_one(&self.pool)
        .await?;

        Ok(assignment_from_row(&row))
    }

    /// Update the provided fields of an assignment.
    ///
    /// The caller rejects empty payloads; an explicit `null` note
    /// clears the column.
    pub async fn update(
        &self,
        id: Uuid,
        payload: &UpdateAssignmentRequest,
    ) -> Result<Option<Assignment>> {
        let mut builder = QueryBuilder::new("UPDATE assignments SET ");
        {
            let mut sets = builder.separated(", ");
            if let Some(user_id) = payload.user_id {
                sets.push("user_id = ").push_bind_unseparated(user_id);
            }
            if let Some(asset_id) = payload.asset_id {
                sets.push("asset_id = ").push_bind_unseparated(asset_id);
            }
            match &payload.note {
                Field::Absent => {}
                note => {
                    let value = note.as_option().flatten().map(String::as_str);
                    sets.push("note = ").push_bind_unseparated(value);
                }
            }
            if let Some(assigned_at) = payload.assigned_at {
                sets.push("assigned_at = ").push_bind_unseparated(assigned_at);
            }
        }

        builder.push(" WHERE id = ").push_bind(id);
        builder.push(" RETURNING id, user_id, asset_id, assigned_at, note");

        let row = builder.build().fetch_optional(&self.pool).await?;

        Ok(row.as_ref().map(assignment_from_row))
    }

    /// Delete an assignment by ID
    pub async fn delete(&self, id: Uuid) -> Result<()> {
        sqlx::query("DELETE FROM assignments WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
