//! Subscriber setup for the bench binary.

use std::env;
use std::fs::{File, OpenOptions};
use std::io;
use std::sync::Mutex;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

fn open_log_file(path: &str) -> io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

fn init_error<E: std::fmt::Display>(err: E) -> Box<dyn std::error::Error> {
    format!("Failed to initialize logging: {err}").into()
}

/// Install a subscriber driven by `TETHER_TRACE`, `TETHER_LOG_FORMAT` and
/// `TETHER_LOG_FILE`.
///
/// `TETHER_TRACE` is an `EnvFilter` directive and defaults to `off`. Events
/// go to stderr (and the log file, if set) as `pretty` text or `json`.
/// Returns false when a subscriber was already installed.
pub fn init_tracing() -> Result<bool, Box<dyn std::error::Error>> {
    if tracing::dispatcher::has_been_set() {
        return Ok(false);
    }

    let level = env::var("TETHER_TRACE").unwrap_or_else(|_| "off".to_string());
    let filter = if level.eq_ignore_ascii_case("off") {
        EnvFilter::default().add_directive(LevelFilter::OFF.into())
    } else {
        EnvFilter::try_new(&level).map_err(|err| format!("Invalid TETHER_TRACE filter: {err}"))?
    };

    let format = env::var("TETHER_LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string());
    let use_json = format.eq_ignore_ascii_case("json");
    if !use_json && !format.eq_ignore_ascii_case("pretty") {
        return Err("Invalid TETHER_LOG_FORMAT (expected 'json' or 'pretty')".into());
    }
    let log_file = env::var("TETHER_LOG_FILE")
        .ok()
        .map(|path| open_log_file(&path))
        .transpose()?;

    let registry = tracing_subscriber::registry().with(filter);
    if use_json {
        let stderr_layer = tracing_subscriber::fmt::layer()
            .with_writer(io::stderr)
            .json();
        let file_layer = log_file.map(|file| {
            tracing_subscriber::fmt::layer()
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .json()
        });
        registry
            .with(stderr_layer)
            .with(file_layer)
            .try_init()
            .map_err(init_error)?;
    } else {
        let stderr_layer = tracing_subscriber::fmt::layer()
            .with_writer(io::stderr)
            .pretty();
        let file_layer = log_file.map(|file| {
            tracing_subscriber::fmt::layer()
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .pretty()
        });
        registry
            .with(stderr_layer)
            .with(file_layer)
            .try_init()
            .map_err(init_error)?;
    }
    Ok(true)
}
