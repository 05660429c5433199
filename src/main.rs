// Entry point: loads configuration, binds the shared UDP socket, builds the
// router-state object, sends the first LSA immediately, then hands off to
// the originator and listener tasks for the remainder of the process
// lifetime. There is no graceful shutdown protocol; termination is by
// signal.

use std::net::SocketAddr;
use std::sync::Arc;

use routingd::error::{self, RoutingError};
use routingd::state::AppState;
use routingd::{config, flooder, lsa, scheduler};

fn init_logging() {
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info");
    }
    env_logger::init();
}

#[tokio::main]
async fn main() {
    init_logging();

    let config = match config::RouterConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            log::error!("fatal startup error: {}", e);
            std::process::exit(1);
        }
    };

    log::info!(
        "{} starting up with {} configured neighbor(s)",
        config.my_name,
        config.neighbors.len()
    );

    let socket = match bind_socket(lsa::PORT).await {
        Ok(socket) => socket,
        Err(e) => {
            log::error!("fatal bind error: {}", e);
            std::process::exit(1);
        }
    };

    let state = AppState::new(config, socket);

    // The first LSA is sent immediately rather than waiting a full
    // origination period, so neighbors converge quickly after a restart.
    flooder::originate_once(&state).await;

    scheduler::spawn_originator_task(Arc::clone(&state));
    scheduler::spawn_listener_task(Arc::clone(&state));

    std::future::pending::<()>().await;
}

async fn bind_socket(port: u16) -> error::Result<Arc<tokio::net::UdpSocket>> {
    let addr: SocketAddr = format!("0.0.0.0:{}", port)
        .parse()
        .map_err(|e| RoutingError::Config(format!("invalid bind address: {}", e)))?;
    let socket = tokio::net::UdpSocket::bind(addr)
        .await
        .map_err(RoutingError::Bind)?;
    Ok(Arc::new(socket))
}
