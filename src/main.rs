#[macro_use] extern crate log;

pub mod api;
pub mod config;
pub mod context;
pub mod db;
pub mod handlers;
pub mod logger;
pub mod mime;
pub mod request;
pub mod response;
pub mod router;
pub mod server;
pub mod utils;

#[cfg(test)]
mod testing;

use std::net::TcpListener;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;

use crate::config::Config;
use crate::context::Context;
use crate::db::KNOWN_KINDS;
use crate::server::handle_connection;
use crate::utils::ResultV;


const MODULE: &str = "MAIN";

/// Static file server with JSON and XML exports of a catalog and a person table
#[derive(Parser, Debug)]
#[command(author, version, about, long_about)]
struct Args {
    /// Path to the configurational file, defaults are used when omitted
    config_fn: Option<String>,
}


fn run(cfg: Config) -> ResultV {
    if !cfg.files.web_root.is_dir() {
        warn!("[{}] Web root {} is not a directory", MODULE, cfg.files.web_root.display());
    }
    if !KNOWN_KINDS.contains(&cfg.store.kind.as_str()) {
        warn!("[{}] Unknown store kind `{}`, data exports will fail", MODULE, cfg.store.kind);
    }

    let addr = cfg.address();
    let listener = TcpListener::bind(&addr).map_err(|e| {
        error!("[{}] Could not start server at {}: {}", MODULE, addr, e);
        "init server error"
    })?;

    info!("[{}] Starting tabserve at {}", MODULE, addr);
    info!(
        "[{}] Serving {} with {} workers, store `{}` at {}",
        MODULE, cfg.files.web_root.display(), cfg.server.workers, cfg.store.kind, cfg.store.host
    );

    let pool = threadpool::ThreadPool::new(cfg.server.workers);

    let cfg_arc = Arc::new(cfg);
    for stream in listener.incoming() {
        match stream {
            Ok(stream) => {
                let ctx = Context::new(cfg_arc.clone());
                pool.execute(move || handle_connection(stream, ctx));
            }
            Err(e) => warn!("[{}] Failed to accept connection: {}", MODULE, e),
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();
    let cfg = match Config::load(args.config_fn.as_deref()) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };
    if logger::init_logger(&cfg).is_err() {
        return ExitCode::FAILURE;
    }
    if let Some(path) = &args.config_fn {
        info!("[{}] Config loaded from {}", MODULE, path);
    }

    match run(cfg) {
        Ok(()) => ExitCode::SUCCESS,
        Err(_) => ExitCode::FAILURE,
    }
}
