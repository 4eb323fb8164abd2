//! VTN Server Binary
//!
//! Runs a VTN configured from the environment. Every extension point keeps
//! its default binding and answers `501`; deployments embed the library and
//! bind their own handlers.

use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use vtn_server::{VtnConfig, VtnServer};

#[tokio::main]
async fn main() {
    let config = match VtnConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{}", err);
            std::process::exit(1);
        }
    };

    // Initialize logging; VTN_LOG_LEVEL takes a level or filter directives
    let filter = EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info"));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set tracing subscriber");

    info!(
        vtn_id = %config.vtn_id,
        signed = config.cert_path.is_some(),
        known_vens = config.ven_fingerprints.len(),
        "Starting VTN server"
    );

    let server = match VtnServer::from_config(&config) {
        Ok(server) => server,
        Err(err) => {
            error!(error = %err, "Failed to initialize VTN");
            std::process::exit(1);
        }
    };

    let addr = config.listen_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind to address");

    if let Err(err) = server.serve(listener).await {
        error!(error = %err, "Server error");
        std::process::exit(1);
    }
}
