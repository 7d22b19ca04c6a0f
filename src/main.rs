mod handlers;
mod middleware;
mod models;
mod routes;

use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpResponse, HttpServer};
use dotenvy::dotenv;
use log::{error, info};
use middleware::request_logger::RequestLogger;
use routes::{jobs::config_job_routes, users::config_user_routes};
use sqlx::postgres::PgPoolOptions;
use std::env;
use std::time::Duration;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    info!("=== Job Portal API Server Starting ===");

    let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    env::var("JWT_SECRET").expect("JWT_SECRET must be set");

    let port = env::var("PORT")
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(5000);

    let pool = match PgPoolOptions::new()
        .max_connections(20)
        .acquire_timeout(Duration::from_secs(5))
        .idle_timeout(Duration::from_secs(300))
        .max_lifetime(Duration::from_secs(1800))
        .connect(&database_url)
        .await
    {
        Ok(pool) => pool,
        Err(e) => {
            error!("Failed to connect to Postgres: {}", e);
            return Err(std::io::Error::new(std::io::ErrorKind::Other, e));
        }
    };

    if let Err(e) = sqlx::migrate!("./migrations").run(&pool).await {
        error!("Failed to run migrations: {}", e);
        return Err(std::io::Error::new(std::io::ErrorKind::Other, e));
    }

    if handlers::db::check_db_connection(&pool).await {
        info!("Database connection established and verified");
    } else {
        info!("Database connection established but verification failed");
    }

    let pool_data = web::Data::new(pool);

    info!("Starting Job Portal API Server on port {}", port);

    HttpServer::new(move || {
        let cors = Cors::default()
            .allowed_origin_fn(|_origin, _req_head| true)
            .allow_any_method()
            .allow_any_header()
            .expose_any_header()
            .max_age(3600);

        App::new()
            .app_data(pool_data.clone())
            .wrap(Logger::default())
            .wrap(RequestLogger)
            .wrap(cors)
            .configure(config_user_routes)
            .configure(config_job_routes)
            .route(
                "/",
                web::get()
                    .to(|| async { HttpResponse::Ok().body("Welcome to the Job Portal API") }),
            )
    })
    .bind(("0.0.0.0", port))?
    .run()
    .await
}
