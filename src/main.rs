use std::sync::Arc;

use clap::Parser;

mod cli;
mod config;
mod error;
mod handler;
mod http;
mod logger;
mod server;
mod storage;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = cli::Cli::parse();
    let cfg = config::Config::load(&cli)?;
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
    let addr = cfg.get_socket_addr()?;
    let store = storage::LocalDiskStore::new(&cfg.server.root)?;
    let listener = server::create_listener(addr)?;

    logger::log_server_start(&addr, &cfg);

    let state = Arc::new(config::AppState::new(cfg, Arc::new(store)));
    server::signal::start_signal_handler(Arc::clone(&state.shutdown))?;

    // Connections are spawned with spawn_local
    let local = tokio::task::LocalSet::new();
    local
        .run_until(server::run_server_loop(listener, state))
        .await;
    Ok(())
}
