use std::fmt::Debug;
use std::fmt::Display;

use tokio::task::JoinError;
use resilient_proxy::configuration::get_configuration;
use resilient_proxy::startup::build_http_client;
use resilient_proxy::startup::get_connection_pool;
use resilient_proxy::startup::Application;
use resilient_proxy::telemetry::get_subscriber;
use resilient_proxy::telemetry::init_subscriber;
use resilient_proxy::workers::cleanup;
use resilient_proxy::workers::requeue;
use resilient_proxy::workers::retry_reply;
use resilient_proxy::workers::send;

fn report_exit(
    name: &str,
    outcome: Result<Result<(), impl Debug + Display>, JoinError>,
) {
    match outcome {
        Ok(Ok(())) => {
            tracing::info!("{name} exited gracefully")
        }
        Ok(Err(e)) => {
            tracing::error!(
                error.cause_chain=?e,
                error.message=%e,
                "{name} failed (inner)"
            )
        }
        Err(e) => {
            tracing::error!(
                error.cause_chain=?e,
                error.message=%e,
                "{name} failed (outer)"
            )
        }
    }
}

/// Initialise telemetry, load config, and start the server plus the four
/// background workers that drive the activity state machine.
#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let subscriber = get_subscriber("resilient-proxy", "info", std::io::stdout);
    init_subscriber(subscriber);

    let settings = get_configuration().expect("Failed to read configuration");

    let pool = get_connection_pool(&settings);
    sqlx::migrate!().run(&pool).await?;

    let client = build_http_client();

    let server = Application::build(settings.clone()).await?.run_until_stopped();
    let send_worker = send::run(pool.clone(), client.clone(), settings.clone());
    let requeue_worker = requeue::run(pool.clone(), settings.clone());
    let retry_reply_worker = retry_reply::run(pool.clone(), client, settings.clone());
    let cleanup_worker = cleanup::run(pool, settings);

    // Each concern runs on its own task so a blocked/failed branch can't
    // starve the others; the first to exit (server or any worker) brings
    // the process down, and `report_exit` says which.
    let server_thread = tokio::spawn(server);
    let send_thread = tokio::spawn(send_worker);
    let requeue_thread = tokio::spawn(requeue_worker);
    let retry_reply_thread = tokio::spawn(retry_reply_worker);
    let cleanup_thread = tokio::spawn(cleanup_worker);

    tokio::select! {
        o = server_thread => { report_exit("API", o) },
        o = send_thread => { report_exit("Send worker", o) },
        o = requeue_thread => { report_exit("Requeue worker", o) },
        o = retry_reply_thread => { report_exit("Retry-reply worker", o) },
        o = cleanup_thread => { report_exit("Cleanup worker", o) },
    }

    Ok(())
}
