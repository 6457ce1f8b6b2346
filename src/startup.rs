use actix_web::dev::Server;
use actix_web::http::{header, Method};
use actix_web::middleware::DefaultHeaders;
use actix_web::{web, App, HttpServer};
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Pool, Postgres};
use std::net::TcpListener;
use tracing_actix_web::TracingLogger;

use crate::config::{DatabaseSettings, Settings};
use crate::routes::{
    handle_admin, handle_preflight, handle_subscribe, handle_unsupported_method, health_check,
};
use crate::storage::DatabaseTarget;

pub struct Application {
    pub port: u16,
    pub server: Server,
}

impl Application {
    pub async fn build(config: Settings) -> Result<Self, std::io::Error> {
        let db_pool = get_connection_db_pool(&config.database);
        let db_target = DatabaseTarget {
            host: config.get_db_host(),
            database: config.get_db_name(),
        };

        let listener = TcpListener::bind(config.get_address())?;
        let port = listener.local_addr()?.port();
        let server = run(listener, db_pool, db_target)?;

        Ok(Self { port, server })
    }

    pub fn get_port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stop(self) -> Result<(), std::io::Error> {
        self.server.await
    }
}

pub fn run(
    listener: TcpListener,
    db_pool: PgPool,
    db_target: DatabaseTarget,
) -> Result<Server, std::io::Error> {
    let db_pool = web::Data::new(db_pool);
    let db_target = web::Data::new(db_target);

    let server = HttpServer::new(move || {
        // App is where your application logic lives: routing, middlewares, request handler, etc
        App::new()
            // 'wrap' method adds a middleware to the App. This specific middleware provide incoming
            // request logger
            .wrap(TracingLogger::default())
            // Every response, errors included, may be read from any origin
            .wrap(
                DefaultHeaders::new()
                    .add((header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"))
                    .add((header::ACCESS_CONTROL_ALLOW_METHODS, "POST, GET, OPTIONS"))
                    .add((header::ACCESS_CONTROL_ALLOW_HEADERS, "Content-Type")),
            )
            .route("/health_check", web::get().to(health_check))
            .service(
                web::resource("/newsletter")
                    .route(web::post().to(handle_subscribe))
                    .route(web::get().to(handle_admin))
                    .route(web::method(Method::OPTIONS).to(handle_preflight))
                    .default_service(web::route().to(handle_unsupported_method)),
            )
            .app_data(db_pool.clone())
            .app_data(db_target.clone())
    })
    .listen(listener)?
    .run();

    Ok(server)
}

pub fn get_connection_db_pool(config: &DatabaseSettings) -> Pool<Postgres> {
    PgPoolOptions::new()
        .acquire_timeout(std::time::Duration::from_secs(2))
        .connect_lazy_with(config.get_db_options())
}
