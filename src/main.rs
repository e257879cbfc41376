use std::sync::Arc;

mod config;
mod handler;
mod http;
mod logger;
mod server;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cfg = config::Config::load()?;
    logger::init(&cfg)?;

    // Create the Tokio runtime, with the worker count from config if set
    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();
    if let Some(workers) = cfg.server.workers {
        runtime_builder.worker_threads(workers);
    }
    let runtime = runtime_builder.build()?;

    runtime.block_on(async_main(cfg))
}

async fn async_main(cfg: config::Config) -> Result<(), Box<dyn std::error::Error>> {
    let addr = cfg.get_socket_addr()?;

    let state = Arc::new(config::AppState::new(cfg).map_err(|e| {
        format!("Cannot serve document root: {e}")
    })?);
    let listener =
        server::create_listener(addr).map_err(|e| format!("Failed to bind {addr}: {e}"))?;
    let port = listener.local_addr()?.port();

    let signals = Arc::new(server::SignalHandler::new());
    server::start_signal_handler(Arc::clone(&signals))?;

    logger::log_server_start(port);
    server::start_server_loop(listener, state, signals).await;
    logger::log_server_stopped();

    Ok(())
}
