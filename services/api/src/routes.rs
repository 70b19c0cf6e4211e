//! API service routes

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post, put},
};
use serde_json::json;
use uuid::Uuid;

use common::models::{
    AssignmentFilter, CreateAssetRequest, CreateAssignmentRequest, CreateCategoryRequest,
    CreateUserRequest, LoginRequest, LoginResponse, UpdateAssetRequest, UpdateAssignmentRequest,
    UpdateUserRequest,
};

use crate::{error::ApiError, repositories::verify_password, state::AppState};

/// Create the router for the API service
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/auth/login", post(login))
        .route("/users", get(list_users).post(create_user))
        .route("/users/:id", put(update_user).delete(delete_user))
        .route("/assets", get(list_assets).post(create_asset))
        .route("/assets/:id", put(update_asset).delete(delete_asset))
        .route("/categories", get(list_categories).post(create_category))
        .route("/categories/:id", delete(delete_category))
        .route("/assignments", get(list_assignments).post(create_assignment))
        .route(
            "/assignments/:id",
            get(get_assignment)
                .put(update_assignment)
                .delete(delete_assignment),
        )
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(json!({ "ok": true }))
}

/// Verify email and password, returning the session token and the user
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let (Some(email), Some(password)) = (payload.email, payload.password) else {
        return Err(ApiError::Validation("missing_credentials"));
    };

    let credentials = state
        .user_repository
        .find_credentials(&email)
        .await
        .map_err(|e| {
            tracing::error!("Failed to look up credentials: {}", e);
            ApiError::Internal("login_failed")
        })?;

    let Some((user, password_hash)) = credentials else {
        return Err(ApiError::Unauthorized("invalid_credentials"));
    };

    if !verify_password(&password_hash, &password) {
        return Err(ApiError::Unauthorized("invalid_credentials"));
    }

    // Placeholder token scheme; carries no signature or expiry.
    let token = format!("token-{}", user.id);

    Ok(Json(LoginResponse { token, user }))
}

/// List all users
pub async fn list_users(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let users = state.user_repository.list().await.map_err(|e| {
        tracing::error!("Failed to list users: {}", e);
        ApiError::Internal("users_list_failed")
    })?;

    Ok(Json(users))
}

/// Create a new user; the password is required
pub async fn create_user(
    State(state): State<AppState>,
    Json(payload): Json<CreateUserRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let Some(password) = payload.password.clone() else {
        return Err(ApiError::Validation("password_required"));
    };

    let user = state
        .user_repository
        .create(&payload, &password)
        .await
        .map_err(|e| {
            tracing::error!("Failed to create user: {}", e);
            ApiError::Internal("user_create_failed")
        })?;

    Ok((StatusCode::CREATED, Json(user)))
}

/// Update the provided fields of a user
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state
        .user_repository
        .update(id, &payload)
        .await
        .map_err(|e| {
            tracing::error!("Failed to update user: {}", e);
            ApiError::Internal("user_update_failed")
        })?
        .ok_or(ApiError::NotFound)?;

    Ok(Json(user))
}

/// Delete a user and, cascading, its assignments
pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state.user_repository.delete(id).await.map_err(|e| {
        tracing::error!("Failed to delete user: {}", e);
        ApiError::Internal("user_delete_failed")
    })?;

    Ok(Json(json!({ "ok": true })))
}

/// List all assets
pub async fn list_assets(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let assets = state.asset_repository.list().await.map_err(|e| {
        tracing::error!("Failed to list assets: {}", e);
        ApiError::Internal("assets_list_failed")
    })?;

    Ok(Json(assets))
}

/// Create a new asset
pub async fn create_asset(
    State(state): State<AppState>,
    Json(payload): Json<CreateAssetRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let asset = state.asset_repository.create(&payload).await.map_err(|e| {
        tracing::error!("Failed to create asset: {}", e);
        ApiError::Internal("asset_create_failed")
    })?;

    Ok((StatusCode::CREATED, Json(asset)))
}

/// Update the provided fields of an asset
pub async fn update_asset(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateAssetRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let asset = state
        .asset_repository
        .update(id, &payload)
        .await
        .map_err(|e| {
            tracing::error!("Failed to update asset: {}", e);
            ApiError::Internal("asset_update_failed")
        })?
        .ok_or(ApiError::NotFound)?;

    Ok(Json(asset))
}

/// Delete an asset and, cascading, its assignments
pub async fn delete_asset(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state.asset_repository.delete(id).await.map_err(|e| {
        tracing::error!("Failed to delete asset: {}", e);
        ApiError::Internal("asset_delete_failed")
    })?;

    Ok(Json(json!({ "ok": true })))
}

/// List all categories
pub async fn list_categories(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let categories = state.category_repository.list().await.map_err(|e| {
        tracing::error!("Failed to list categories: {}", e);
        ApiError::Internal("categories_list_failed")
    })?;

    Ok(Json(categories))
}

/// Create a new category; the name is required
pub async fn create_category(
    State(state): State<AppState>,
    Json(payload): Json<CreateCategoryRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let Some(name) = payload.name.filter(|n| !n.is_empty()) else {
        return Err(ApiError::Validation("name_required"));
    };

    let category = state
        .category_repository
        .create(&name)
        .await
        .map_err(|e| {
            tracing::error!("Failed to create category: {}", e);
            ApiError::Internal("category_create_failed")
        })?;

    Ok((StatusCode::CREATED, Json(category)))
}

/// Delete a category by ID
pub async fn delete_category(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state.category_repository.delete(id).await.map_err(|e| {
        tracing::error!("Failed to delete category: {}", e);
        ApiError::Internal("category_delete_failed")
    })?;

    Ok(Json(json!({ "ok": true })))
}

/// List assignments joined with user and asset, optionally filtered by
/// user and/or category
pub async fn list_assignments(
    State(state): State<AppState>,
    Query(filter): Query<AssignmentFilter>,
) -> Result<impl IntoResponse, ApiError> {
    let assignments = state
        .assignment_repository
        .list(&filter)
        .await
        .map_err(|e| {
            tracing::error!("Failed to list assignments: {}", e);
            ApiError::Internal("assignments_list_failed")
        })?;

    Ok(Json(assignments))
}

/// Get a single joined assignment by ID
pub async fn get_assignment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let assignment = state
        .assignment_repository
        .get(id)
        .await
        .map_err(|e| {
            tracing::error!("Failed to get assignment: {}", e);
            ApiError::Internal("assignment_get_failed")
        })?
        .ok_or(ApiError::NotFound)?;

    Ok(Json(assignment))
}

/// Create a new assignment
pub async fn create_assignment(
    State(state): State<AppState>,
    Json(payload): Json<CreateAssignmentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let assignment = state
        .assignment_repository
        .create(&payload)
        .await
        .map_err(|e| {
            tracing::error!("Failed to create assignment: {}", e);
            ApiError::Internal("assignment_create_failed")
        })?;

    Ok((StatusCode::CREATED, Json(assignment)))
}

/// Update the provided fields of an assignment; an empty payload is
/// rejected before touching the store
pub async fn update_assignment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateAssignmentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if payload.is_empty() {
        return Err(ApiError::Validation("no_fields"));
    }

    let assignment = state
        .assignment_repository
        .update(id, &payload)
        .await
        .map_err(|e| {
            tracing::error!("Failed to update assignment: {}", e);
            ApiError::Internal("assignment_update_failed")
        })?
        .ok_or(ApiError::NotFound)?;

    Ok(Json(assignment))
}

/// Delete an assignment by ID
pub async fn delete_assignment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state.assignment_repository.delete(id).await.map_err(|e| {
        tracing::error!("Failed to delete assignment: {}", e);
        ApiError::Internal("assignment_delete_failed")
    })?;

    Ok(Json(json!({ "ok": true })))
}
