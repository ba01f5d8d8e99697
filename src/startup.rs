use std::net::TcpListener;
use std::time::Duration;

use actix_web::dev::Server;
use actix_web::web;
use actix_web::App;
use actix_web::HttpServer;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing_actix_web::TracingLogger;

use crate::configuration::Settings;
use crate::routes::health_check;
use crate::routes::status;
use crate::routes::submit;

/// Wrapper for actix's `Server` with access to the bound port.
pub struct Application {
    port: u16,
    server: Server,
}

impl Application {
    pub async fn build(settings: Settings) -> Result<Self, anyhow::Error> {
        let addr = format!("{}:{}", settings.application.host, settings.application.port);
        let listener = TcpListener::bind(addr)?;
        let port = listener.local_addr()?.port();

        let pool = get_connection_pool(&settings);

        let server = run(listener, pool, settings).await?;
        Ok(Self { port, server })
    }

    pub fn get_port(&self) -> u16 { self.port }

    /// Because this consumes `self`, this should be the final function call
    /// (or passed to `tokio::spawn`).
    pub async fn run_until_stopped(self) -> Result<(), std::io::Error> { self.server.await }
}

pub fn get_connection_pool(settings: &Settings) -> PgPool {
    PgPoolOptions::new().connect_lazy_with(settings.database.with_db())
}

/// One client, reused by the server (health/status only touch the store)
/// and handed to every worker task — establishing an HTTP connection is
/// expensive, so it is shared rather than recreated per call.
pub fn build_http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(10))
        .build()
        .expect("the default TLS backend should always build")
}

/// Declares the submit/status/health endpoints (§6). The server itself is
/// not responsible for target/reply delivery — that is the worker set's
/// job, driven entirely off rows this handler inserts.
pub async fn run(
    listener: TcpListener,
    pool: PgPool,
    settings: Settings,
) -> Result<Server, anyhow::Error> {
    let pool = web::Data::new(pool);
    let settings = web::Data::new(settings);

    let server = HttpServer::new(move || {
        App::new()
            .wrap(TracingLogger::default())
            .route("/submit", web::route().to(submit))
            .route("/message", web::get().to(status))
            .route("/health_check", web::get().to(health_check))
            .app_data(pool.clone())
            .app_data(settings.clone())
    })
    .listen(listener)?
    .run();

    Ok(server)
}
