//! Toy target/reply endpoint for exercising the proxy by hand. Echoes a
//! configurable status code and the request body back to the caller, and
//! logs every hit so a reader can watch `X-TaskId` show up on replies.
//!
//! Not part of the core library — see `demos/client` for a submitter.

use std::net::TcpListener;

use actix_web::web;
use actix_web::App;
use actix_web::HttpRequest;
use actix_web::HttpResponse;
use actix_web::HttpServer;

async fn echo(req: HttpRequest, body: web::Bytes) -> HttpResponse {
    let status = std::env::var("DEMO_STATUS")
        .ok()
        .and_then(|s| s.parse::<u16>().ok())
        .unwrap_or(200);

    println!(
        "demo-target-server: {} {} task_id={:?} body={:?}",
        req.method(),
        req.uri(),
        req.headers().get("X-TaskId"),
        String::from_utf8_lossy(&body),
    );

    HttpResponse::build(actix_web::http::StatusCode::from_u16(status).unwrap_or(actix_web::http::StatusCode::OK))
        .content_type("application/json")
        .body(body)
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    let port: u16 = std::env::var("DEMO_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(9091);
    let listener = TcpListener::bind(("127.0.0.1", port))?;
    println!("demo-target-server listening on http://127.0.0.1:{port}");

    HttpServer::new(|| App::new().default_service(web::route().to(echo)))
        .listen(listener)?
        .run()
        .await
}
