#![allow(async_fn_in_trait)]

extern crate actix_web;
extern crate anyhow;
extern crate chrono;
extern crate default;
extern crate dotenv;
extern crate env_logger;
extern crate futures;
extern crate hex;
extern crate itertools;
extern crate jsonwebtoken;
extern crate rand;
extern crate serde;
extern crate serde_json;
extern crate sha2;
extern crate sqlx;
extern crate thiserror;
extern crate tokio;

mod config;
mod context;
pub mod core;
mod database;
mod error;
mod handlers;
mod impls;
mod middlewares;
pub mod response;

use crate::config::Config;
use crate::core::ports::repository::Manager;
use crate::core::services::demo;
use crate::database::memory::MemoryManager;
use crate::database::sqlx::{ensure_schema, PgSqlxManager};
use crate::handlers::TokenTtl;
use crate::impls::hasher::sha256::Sha256Hasher;
use crate::impls::tokener::jwt::JWT;
use crate::middlewares::jwt::JWTMiddleware;
use actix_web::web::Data;
use actix_web::{App, HttpServer};
use sqlx::postgres::PgPoolOptions;

async fn serve<M>(manager: M, config: &Config) -> Result<(), anyhow::Error>
where
    M: Manager + Send + Sync + 'static,
{
    if config.seed_demo {
        demo::seed(&manager, &Sha256Hasher).await?;
    }
    let tokener = JWT::new(config.jwt_secret.as_bytes().to_owned());
    let ttl = TokenTtl(config.token_ttl_days);
    let manager = Data::new(manager);
    log::info!("listening on {}:{}", config.bind_address, config.port);
    HttpServer::new(move || {
        App::new()
            .wrap(JWTMiddleware::new(tokener.clone()))
            .wrap(actix_web::middleware::Logger::default())
            .app_data(manager.clone())
            .app_data(Data::new(Sha256Hasher))
            .app_data(Data::new(tokener.clone()))
            .app_data(Data::new(ttl))
            .configure(handlers::configure::<M>)
    })
    .bind((config.bind_address.as_str(), config.port))?
    .run()
    .await?;
    Ok(())
}

#[actix_web::main]
async fn main() -> Result<(), anyhow::Error> {
    dotenv::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let config = Config::from_env()?;
    if config.is_memory() {
        log::warn!("DATABASE_URL is memory://, nothing will be persisted");
        return serve(MemoryManager::new(), &config).await;
    }
    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(&config.database_url)
        .await?;
    ensure_schema(&pool).await?;
    serve(PgSqlxManager::new(pool), &config).await
}
