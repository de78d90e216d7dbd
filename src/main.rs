mod config;
mod handler;
mod http;
mod logger;
mod server;

use std::sync::Arc;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Optional config file path (without extension) as the only argument
    let config_path = std::env::args().nth(1).unwrap_or_else(|| "config".to_string());
    let cfg = config::Config::load_from(&config_path)?;

    logger::init(&cfg)?;

    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();
    if let Some(workers) = cfg.server.workers {
        runtime_builder.worker_threads(workers);
    }
    let runtime = runtime_builder.build()?;

    runtime.block_on(async_main(cfg))
}

async fn async_main(cfg: config::Config) -> Result<(), Box<dyn std::error::Error>> {
    // Validates the served root and fixes the entry document path
    let state = Arc::new(config::AppState::new(&cfg)?);

    let addr = cfg.get_socket_addr()?;
    // A failed bind is fatal: the error propagates and the process
    // exits non-zero
    let listener = server::create_listener(addr)?;

    logger::log_server_start(&addr, &state);

    server::run(listener, state).await;
    Ok(())
}
