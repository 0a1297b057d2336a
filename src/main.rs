use std::process::ExitCode;

use magician_serve::config::Config;
use magician_serve::error::StartupError;
use magician_serve::{logger, server};

fn main() -> ExitCode {
    let cfg = match Config::load() {
        Ok(cfg) => cfg,
        Err(e) => {
            logger::log_error(&e.to_string());
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = logger::init(&cfg) {
        logger::log_error(&format!("Failed to open log files: {e}"));
        return ExitCode::FAILURE;
    }

    // Worker thread count comes from server.workers, CPU count otherwise
    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();
    if let Some(workers) = cfg.server.workers {
        runtime_builder.worker_threads(workers);
    }
    logger::log_runtime_workers(cfg.server.workers);

    let runtime = match runtime_builder.build() {
        Ok(rt) => rt,
        Err(e) => {
            logger::log_error(&format!("Failed to start runtime: {e}"));
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(async_main(cfg)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            logger::log_error(&e.to_string());
            ExitCode::FAILURE
        }
    }
}

async fn async_main(cfg: Config) -> Result<(), StartupError> {
    let running = server::start(cfg)?;

    let signal = server::wait_for_shutdown().await;
    if let Ok(name) = signal {
        logger::log_shutdown_requested(name);
    }

    running.stop().await;
    signal.map(|_| ()).map_err(StartupError::from)
}
