use anyhow::Result;
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

use common::database::{DatabaseConfig, init_pool, run_migrations};

use api::repositories::{
    UserRepository, assets::AssetRepository, assignments::AssignmentRepository,
    categories::CategoryRepository,
};
use api::routes;
use api::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    info!("Starting Zimmet API service");

    // Initialize database connection pool
    let db_config = DatabaseConfig::from_env()?;
    let pool = init_pool(&db_config).await?;

    // Check database connectivity
    if common::database::health_check(&pool).await? {
        info!("Database connection successful");
    } else {
        anyhow::bail!("Failed to connect to database");
    }

    // Apply pending schema migrations
    run_migrations(&sqlx::migrate!("./migrations"), &pool).await?;
    info!("Database migrations applied");

    // Initialize repositories
    let user_repository = UserRepository::new(pool.clone());
    let asset_repository = AssetRepository::new(pool.clone());
    let category_repository = CategoryRepository::new(pool.clone());
    let assignment_repository = AssignmentRepository::new(pool.clone());

    let app_state = AppState {
        db_pool: pool,
        user_repository,
        asset_repository,
        category_repository,
        assignment_repository,
    };

    // Start the web server
    let app = routes::create_router(app_state);

    let bind_addr = std::env::var("API_BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:4000".to_string());
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("Zimmet API service listening on {}", bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
