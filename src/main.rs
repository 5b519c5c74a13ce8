use booking_backend::{
    api::{handlers::AppState, router::create_router},
    application::{AuthService, BookingService, InventoryService, MemberService},
    config::Config,
    repositories::{BookingRepository, InventoryRepository, MemberRepository, UserRepository},
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "booking_backend=debug,tower_http=debug,axum=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();
    tracing::info!("Database URL: {}", config.database_url);

    // Initialize database connection pool
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await
        .expect("Failed to connect to database");

    // Apply schema migrations
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run database migrations");

    // Repositories are constructed once and shared for the process lifetime
    let members = Arc::new(MemberRepository::new(pool.clone()));
    let inventory = Arc::new(InventoryRepository::new(pool.clone()));
    let bookings = Arc::new(BookingRepository::new(pool.clone()));
    let users = Arc::new(UserRepository::new(pool.clone()));

    let auth = Arc::new(AuthService::new(
        users,
        config.secret_key.clone(),
        config.access_token_expire_minutes,
    ));
    let booking_service = Arc::new(BookingService::new(
        pool.clone(),
        members.clone(),
        inventory.clone(),
        bookings,
        config.max_bookings,
    ));
    let member_service = Arc::new(MemberService::new(members));
    let inventory_service = Arc::new(InventoryService::new(inventory));

    // Create application state
    let app_state = Arc::new(AppState {
        auth,
        bookings: booking_service,
        members: member_service,
        inventory: inventory_service,
    });

    // Create router
    let app = create_router(app_state);

    // Server configuration
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind to address");

    tracing::info!("Server listening on {}", addr);

    // Start server
    axum::serve(listener, app)
        .await
        .expect("Failed to start server");
}
