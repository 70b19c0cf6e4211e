//! Application state shared across handlers

use sqlx::PgPool;

use crate::repositories::{
    UserRepository, assets::AssetRepository, assignments::AssignmentRepository,
    categories::CategoryRepository,
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub user_repository: UserRepository,
    pub asset_repository: AssetRepository,
    pub category_repository: CategoryRepository,
    pub assignment_repository: AssignmentRepository,
}
