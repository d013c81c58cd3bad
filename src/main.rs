pub mod auth;
pub mod billing;
pub mod config;
pub mod db;
pub mod drones;
pub mod error;
pub mod farmers;
pub mod object_id;
pub mod query;
pub mod roles;
pub mod users;
pub mod validation;

#[cfg(test)]
mod test_support;

use axum::{
    response::Json,
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};
use sqlx::PgPool;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use auth::{AuthService, PgResetTokenRepository, PgUserRepository, ResetTokenRepository, TokenService, UserRepository};
use billing::{BillingRepository, PgBillingRepository};
use config::Config;
use mockable::{Clock, DefaultClock};
use drones::{DroneRepository, PgDroneRepository};
use farmers::{FarmerRepository, PgFarmerRepository};
use roles::{PgRoleRepository, RoleRepository};

/// OpenAPI documentation structure
#[derive(OpenApi)]
#[openapi(
    paths(
        auth::handlers::register_handler,
        auth::handlers::login_handler,
        auth::handlers::logout_handler,
        auth::handlers::forgot_password_handler,
        auth::handlers::reset_password_handler,
        auth::handlers::change_password_handler,
        users::handlers::get_me,
        users::handlers::update_me,
        users::handlers::list_users,
        users::handlers::get_user,
        users::handlers::update_user,
        users::handlers::delete_user,
        roles::list_roles,
        farmers::handlers::create_farmer,
        farmers::handlers::list_farmers,
        farmers::handlers::get_farmer,
        farmers::handlers::update_farmer,
        farmers::handlers::delete_farmer,
        drones::handlers::create_drone,
        drones::handlers::list_drones,
        drones::handlers::get_drone,
        drones::handlers::update_drone,
        drones::handlers::delete_drone,
        billing::handlers::create_billing,
        billing::handlers::list_billing,
        billing::handlers::get_billing,
        billing::handlers::update_billing,
        billing::handlers::delete_billing,
    ),
    components(
        schemas(
            auth::models::RegisterRequest,
            auth::models::RegisterResponse,
            auth::models::LoginRequest,
            auth::models::LoginResponse,
            auth::models::UserSummary,
            auth::models::UserResponse,
            auth::models::ForgotPasswordRequest,
            auth::models::ResetPasswordRequest,
            auth::models::ChangePasswordRequest,
            auth::models::MessageResponse,
            users::models::UpdateUserRequest,
            roles::RoleRecord,
            farmers::models::Farmer,
            farmers::models::CreateFarmerRequest,
            farmers::models::UpdateFarmerRequest,
            drones::models::Drone,
            drones::models::CreateDroneRequest,
            drones::models::UpdateDroneRequest,
            billing::models::Billing,
            billing::models::PaymentMode,
            billing::models::CreateBillingRequest,
            billing::models::UpdateBillingRequest,
        )
    ),
    modifiers(&BearerSecurity),
    tags(
        (name = "auth", description = "Registration, login and password management"),
        (name = "users", description = "User profiles and administration"),
        (name = "roles", description = "Role reference data"),
        (name = "farmers", description = "Farmer records"),
        (name = "drones", description = "Drone fleet"),
        (name = "billing", description = "Spraying job billing")
    ),
    info(
        title = "Drone Billing API",
        version = "1.0.0",
        description = "Billing backend for a drone spraying service"
    )
)]
pub struct ApiDoc;

/// Registers the `bearer_auth` scheme referenced by protected paths
struct BearerSecurity;

impl Modify for BearerSecurity {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).bearer_format("JWT").build()),
            );
        }
    }
}

/// Persistence adapters behind the application
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub resets: Arc<dyn ResetTokenRepository>,
    pub roles: Arc<dyn RoleRepository>,
    pub farmers: Arc<dyn FarmerRepository>,
    pub drones: Arc<dyn DroneRepository>,
    pub billing: Arc<dyn BillingRepository>,
}

impl Repositories {
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            users: Arc::new(PgUserRepository::new(pool.clone())),
            resets: Arc::new(PgResetTokenRepository::new(pool.clone())),
            roles: Arc::new(PgRoleRepository::new(pool.clone())),
            farmers: Arc::new(PgFarmerRepository::new(pool.clone())),
            drones: Arc::new(PgDroneRepository::new(pool.clone())),
            billing: Arc::new(PgBillingRepository::new(pool)),
        }
    }
}

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub clock: Arc<dyn Clock>,
    pub auth_service: Arc<AuthService>,
    pub users: Arc<dyn UserRepository>,
    pub roles: Arc<dyn RoleRepository>,
    pub farmers: Arc<dyn FarmerRepository>,
    pub drones: Arc<dyn DroneRepository>,
    pub billing: Arc<dyn BillingRepository>,
}

impl AppState {
    pub fn new(config: Arc<Config>, clock: Arc<dyn Clock>, repos: Repositories) -> Self {
        let tokens = TokenService::new(&config.jwt_secret, config.jwt_algorithm, config.token_ttl, clock.clone());
        let auth_service = AuthService::new(
            repos.users.clone(),
            repos.resets,
            tokens,
            clock.clone(),
            config.reset_token_ttl,
        );

        Self {
            config,
            clock,
            auth_service: Arc::new(auth_service),
            users: repos.users,
            roles: repos.roles,
            farmers: repos.farmers,
            drones: repos.drones,
            billing: repos.billing,
        }
    }
}

/// Handler for GET /
async fn root() -> Json<Value> {
    Json(json!({ "message": "API is working for drone" }))
}

/// Creates and configures the application router
/// Maps all API endpoints to their handlers and adds CORS and tracing middleware
pub fn create_router(state: AppState) -> Router {
    use tower_http::cors::{Any, CorsLayer};

    // Configure CORS to allow all origins, methods, and headers
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Swagger UI
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/", get(root))
        // Authentication
        .route("/auth/register", post(auth::handlers::register_handler))
        .route("/auth/login", post(auth::handlers::login_handler))
        .route("/auth/logout", post(auth::handlers::logout_handler))
        .route("/auth/forgot-password", post(auth::handlers::forgot_password_handler))
        .route("/auth/reset-password", post(auth::handlers::reset_password_handler))
        .route("/auth/change-password", post(auth::handlers::change_password_handler))
        // Users
        .route("/users", get(users::handlers::list_users))
        .route("/users/me", get(users::handlers::get_me).put(users::handlers::update_me))
        .route(
            "/users/:id",
            get(users::handlers::get_user)
                .put(users::handlers::update_user)
                .delete(users::handlers::delete_user),
        )
        // Roles
        .route("/roles", get(roles::list_roles))
        // Farmers
        .route(
            "/farmers",
            get(farmers::handlers::list_farmers).post(farmers::handlers::create_farmer),
        )
        .route(
            "/farmers/:id",
            get(farmers::handlers::get_farmer)
                .put(farmers::handlers::update_farmer)
                .delete(farmers::handlers::delete_farmer),
        )
        // Drones
        .route(
            "/drones",
            get(drones::handlers::list_drones).post(drones::handlers::create_drone),
        )
        .route(
            "/drones/:id",
            get(drones::handlers::get_drone)
                .put(drones::handlers::update_drone)
                .delete(drones::handlers::delete_drone),
        )
        // Billing
        .route(
            "/billing",
            get(billing::handlers::list_billing).post(billing::handlers::create_billing),
        )
        .route(
            "/billing/:id",
            get(billing::handlers::get_billing)
                .put(billing::handlers::update_billing)
                .delete(billing::handlers::delete_billing),
        )
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()).layer(cors))
        .with_state(state)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "drone_billing=info,tower_http=info".into()),
        )
        .with_target(false)
        .with_level(true)
        .init();

    tracing::info!("Drone Billing API - Starting...");

    let config = Arc::new(Config::from_env()?);

    tracing::info!("Connecting to database...");
    let pool = db::create_pool(&config.database_url, config.db_max_connections).await?;
    db::run_migrations(&pool).await?;

    let clock: Arc<dyn Clock> = Arc::new(DefaultClock);
    let repos = Repositories::postgres(pool);
    db::spawn_reset_token_sweeper(repos.resets.clone(), clock.clone(), config.reset_sweep_interval);

    let addr = config.bind_address();
    let app = create_router(AppState::new(config, clock, repos));

    tracing::info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Drone Billing API is running on http://{}", addr);
    tracing::info!("Swagger UI available at http://{}/swagger-ui", addr);

    axum::serve(listener, app).await?;
    Ok(())
}
