use actix_web::web;
use dotenvy::dotenv;
use sua_medicina::config::Settings;
use sua_medicina::{build_server, create_pool, postgres_state, run_migrations, BoxError};

#[actix_web::main]
async fn main() -> Result<(), BoxError> {
    dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let settings = Settings::from_env()?;

    let pool = create_pool(&settings.database_url, settings.db_pool_size)?;
    run_migrations(&pool)?;

    let state = web::Data::new(postgres_state(pool, settings.coupon_max_attempts));
    if settings.seed_catalog {
        let seeder = state.clone();
        let inserted = web::block(move || seeder.products.seed_if_empty()).await??;
        if inserted == 0 {
            log::info!("Catalog already populated; skipping seed");
        }
    }

    log::info!(
        "Starting server at http://{}:{}",
        settings.host,
        settings.port
    );

    build_server(state, &settings.host, settings.port)?.await?;
    Ok(())
}
