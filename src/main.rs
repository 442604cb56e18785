use std::sync::Arc;

use actix_web::middleware::Logger;
use actix_web::{App, HttpServer, web};
use anyhow::{Context, Result};
use log::info;
use sqlx::postgres::PgPoolOptions;

use uah_rates::api;
use uah_rates::config::Settings;
use uah_rates::providers::{self, NbuProvider, PrivatBankProvider, RateProvider};
use uah_rates::resolver::RateResolver;
use uah_rates::store::PgRateStore;

#[actix_web::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let settings = Settings::from_env().context("Can't load settings")?;

    let pool = PgPoolOptions::new()
        .max_connections(settings.database_max_connections)
        .connect(&settings.database_url)
        .await
        .context("Can't connect to the database")?;
    sqlx::migrate!().run(&pool).await.context("Can't run migrations")?;

    let client = providers::http_client(settings.provider_timeout)?;
    let providers: Vec<Arc<dyn RateProvider>> = vec![
        Arc::new(NbuProvider::new(client.clone(), settings.nbu_url.clone())),
        Arc::new(PrivatBankProvider::new(client, settings.privatbank_url.clone())),
    ];
    let resolver = RateResolver::new(Arc::new(PgRateStore::new(pool)), providers)
        .with_max_depth(settings.max_fallback_depth);
    let resolver = web::Data::new(resolver);

    info!("Listening on {}", settings.bind_address);
    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .app_data(resolver.clone())
            .configure(api::configure)
    })
    .bind(&settings.bind_address)
    .with_context(|| format!("Can't bind {}", settings.bind_address))?
    .run()
    .await?;

    Ok(())
}
