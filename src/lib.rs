pub mod application;
pub mod config;
pub mod db;
pub mod domain;
pub mod errors;
pub mod handlers;
pub mod infrastructure;
pub mod schema;

use std::sync::Arc;

use actix_web::{middleware::Logger, web, App, HttpServer};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use application::AppState;
use errors::AppError;
use handlers::ApiDoc;
use infrastructure::coupon_repo::DieselCouponRepository;
use infrastructure::order_repo::DieselOrderRepository;
use infrastructure::product_repo::DieselProductRepository;
use infrastructure::seller_repo::DieselSellerRepository;

pub use db::{create_pool, DbPool};

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Run any pending Diesel migrations against the pool's database.
pub fn run_migrations(pool: &DbPool) -> Result<(), BoxError> {
    let mut conn = pool.get()?;
    let applied = conn.run_pending_migrations(MIGRATIONS)?;
    if !applied.is_empty() {
        log::info!("Applied {} migration(s)", applied.len());
    }
    Ok(())
}

/// Services wired to the Postgres repositories behind `pool`.
pub fn postgres_state(pool: DbPool, max_code_attempts: u32) -> AppState {
    AppState::new(
        Arc::new(DieselProductRepository::new(pool.clone())),
        Arc::new(DieselSellerRepository::new(pool.clone())),
        Arc::new(DieselCouponRepository::new(pool.clone())),
        Arc::new(DieselOrderRepository::new(pool)),
        max_code_attempts,
    )
}

/// Register every API route. Fixed segments such as `/products/watch` come
/// before the `{id}` routes they would otherwise collide with.
///
/// Extractor failures (bad JSON bodies, query strings or path ids) answer
/// with the same `{"error": ...}` body as every other 400.
pub fn configure(cfg: &mut web::ServiceConfig) {
    use handlers::{coupons, orders, products, sellers};

    cfg.app_data(
        web::JsonConfig::default()
            .error_handler(|err, _req| AppError::BadRequest(err.to_string()).into()),
    )
    .app_data(
        web::QueryConfig::default()
            .error_handler(|err, _req| AppError::BadRequest(err.to_string()).into()),
    )
    .app_data(
        web::PathConfig::default()
            .error_handler(|err, _req| AppError::BadRequest(err.to_string()).into()),
    )
    .service(
        web::scope("/products")
            .route("", web::get().to(products::list_products))
            .route("", web::post().to(products::create_product))
            .route("/watch", web::get().to(products::watch_products))
            .route("/{id}", web::get().to(products::get_product))
            .route("/{id}", web::patch().to(products::update_product))
            .route("/{id}", web::delete().to(products::delete_product)),
    )
    .service(
        web::scope("/sellers")
            .route("", web::get().to(sellers::list_sellers))
            .route("", web::post().to(sellers::create_seller))
            .route("/watch", web::get().to(sellers::watch_sellers))
            .route("/{id}", web::get().to(sellers::get_seller))
            .route("/{id}", web::patch().to(sellers::update_seller))
            .route("/{id}", web::delete().to(sellers::delete_seller))
            .route("/{id}/active", web::put().to(sellers::set_seller_active))
            .route("/{id}/coupons", web::get().to(sellers::list_seller_coupons))
            .route("/{id}/coupons", web::post().to(sellers::issue_seller_coupon))
            .route("/{id}/stats", web::get().to(sellers::seller_stats)),
    )
    .service(
        web::scope("/coupons")
            .route("/validate", web::post().to(coupons::validate_coupon))
            .route("/{id}/active", web::put().to(coupons::set_coupon_active)),
    )
    .service(
        web::scope("/orders")
            .route("", web::post().to(orders::create_order))
            .route("", web::get().to(orders::list_orders))
            .route("/by-customer", web::get().to(orders::orders_by_customer))
            .route("/by-coupon/{code}", web::get().to(orders::orders_by_coupon))
            .route("/{id}", web::get().to(orders::get_order))
            .route("/{id}", web::delete().to(orders::delete_order))
            .route("/{id}/status", web::put().to(orders::update_order_status)),
    );
}

/// Build and return an actix-web `Server` bound to `host:port`.
///
/// The caller is responsible for `.await`-ing (or `tokio::spawn`-ing) the
/// returned server.
pub fn build_server(
    state: web::Data<AppState>,
    host: &str,
    port: u16,
) -> std::io::Result<actix_web::dev::Server> {
    let openapi = ApiDoc::openapi();
    Ok(HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(Logger::default())
            .configure(configure)
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-docs/openapi.json", openapi.clone()),
            )
    })
    .bind((host.to_string(), port))?
    .run())
}
