//! Domain models and API payloads shared by the server and the client
//!
//! All wire types use camelCase field names. Identifiers are opaque
//! UUIDs assigned by the store at insert time; the user's password hash
//! lives only in the database and is never part of a wire type.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::field::Field;

/// Role of a user account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::User => "user",
        }
    }
}

impl From<&str> for Role {
    /// Unknown role strings fall back to the least-privileged role.
    fn from(s: &str) -> Self {
        match s {
            "admin" => Role::Admin,
            _ => Role::User,
        }
    }
}

/// User entity as served by the API (no password hash)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub department: Option<String>,
    pub role: Role,
}

/// Asset entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Asset {
    pub id: Uuid,
    pub name: String,
    pub model: String,
    pub serial: String,
    pub category: String,
}

/// Asset category entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: Uuid,
    pub name: String,
}

/// Assignment entity: an asset held by a user as of a point in time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    pub id: Uuid,
    pub user_id: Uuid,
    pub asset_id: Uuid,
    pub assigned_at: DateTime<Utc>,
    pub note: Option<String>,
}

/// Assignment joined with its user and asset, as returned by the list
/// and single-record endpoints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub asset_id: Uuid,
    pub assigned_at: DateTime<Utc>,
    pub note: Option<String>,
    pub user_name: String,
    pub user_email: String,
    pub asset_name: String,
    pub asset_model: String,
    pub asset_serial: String,
    pub asset_category: String,
}

impl From<AssignmentRow> for Assignment {
    /// Trim the joined display fields, keeping the bare assignment.
    fn from(row: AssignmentRow) -> Self {
        Assignment {
            id: row.id,
            user_id: row.user_id,
            asset_id: row.asset_id,
            assigned_at: row.assigned_at,
            note: row.note,
        }
    }
}

/// Request for user login
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Response for user login
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: User,
}

/// Request for user creation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub department: Option<String>,
    /// Required by the server; optional here so the handler can answer
    /// with a 400 `password_required` instead of a deserialize failure.
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub role: Option<Role>,
}

/// Partial user update; only present fields are written
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Field::is_absent")]
    pub department: Field<String>,
    #[serde(default)]
    pub role: Option<Role>,
    /// When present the password is re-hashed and replaced.
    #[serde(default)]
    pub password: Option<String>,
}

/// Request for asset creation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAssetRequest {
    pub name: String,
    pub model: String,
    pub serial: String,
    pub category: String,
}

/// Partial asset update; only present fields are written
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAssetRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub serial: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
}

/// Request for category creation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCategoryRequest {
    #[serde(default)]
    pub name: Option<String>,
}

/// Request for assignment creation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAssignmentRequest {
    pub user_id: Uuid,
    pub asset_id: Uuid,
    #[serde(default)]
    pub note: Option<String>,
    /// Defaults to the server clock when omitted.
    #[serde(default)]
    pub assigned_at: Option<DateTime<Utc>>,
}

/// Partial assignment update
///
/// An explicit `null` note clears the column; a payload with no fields
/// at all is rejected by the server with `no_fields`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAssignmentRequest {
    #[serde(default)]
    pub user_id: Option<Uuid>,
    #[serde(default)]
    pub asset_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Field::is_absent")]
    pub note: Field<String>,
    #[serde(default)]
    pub assigned_at: Option<DateTime<Utc>>,
}

impl UpdateAssignmentRequest {
    /// True when no field of the payload was provided
    pub fn is_empty(&self) -> bool {
        self.user_id.is_none()
            && self.asset_id.is_none()
            && self.note.is_absent()
            && self.assigned_at.is_none()
    }
}

/// Filter for the assignment listing; omitted filters pass through,
/// both filters combine with AND semantics
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentFilter {
    #[serde(default)]
    pub user_id: Option<Uuid>,
    #[serde(default)]
    pub category: Option<String>,
}

/// Legacy client-local user record, lenient about optional fields
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyUser {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub role: Option<Role>,
}

/// Legacy client-local asset record
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyAsset {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub serial: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
}

/// Legacy client-local assignment record
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyAssignment {
    pub user_id: String,
    pub asset_id: String,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub assigned_at: Option<DateTime<Utc>>,
}

/// The legacy `{users, assets, assignments}` blob cached on the client
/// before the backend existed; ids are locally generated and carry no
/// relation to server ids
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LegacyStore {
    #[serde(default)]
    pub users: Vec<LegacyUser>,
    #[serde(default)]
    pub assets: Vec<LegacyAsset>,
    #[serde(default)]
    pub assignments: Vec<LegacyAssignment>,
}
