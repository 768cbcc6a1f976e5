mod app;
mod assistant;
mod cache;
mod cli;
mod commands;
mod config;
mod db;
mod event;
mod journal;
mod prayer;
mod qibla;
mod query;
mod store;
mod ui;

use clap::Parser;
use color_eyre::Result;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "nuswally")]
#[command(about = "Prayer times, an ibadah journal and an offline cache, in the terminal")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/nuswally/config.yaml)
  #[arg(short, long, global = true)]
  config: Option<PathBuf>,

  /// Latitude override
  #[arg(long, global = true, allow_hyphen_values = true)]
  lat: Option<f64>,

  /// Longitude override
  #[arg(long, global = true, allow_hyphen_values = true)]
  lng: Option<f64>,

  #[command(subcommand)]
  command: Option<cli::Command>,
}

fn env_filter() -> EnvFilter {
  EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
}

/// The dashboard owns the terminal, so its logs go to a daily file.
fn init_file_tracing() -> Result<WorkerGuard> {
  let dir = db::data_dir()?.join("logs");
  std::fs::create_dir_all(&dir)
    .map_err(|e| color_eyre::eyre::eyre!("Failed to create log directory: {}", e))?;

  let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::daily(dir, "nuswally.log"));
  tracing_subscriber::registry()
    .with(fmt::layer().with_writer(writer).with_ansi(false))
    .with(env_filter())
    .init();
  Ok(guard)
}

fn init_stderr_tracing() {
  tracing_subscriber::registry()
    .with(fmt::layer().with_writer(io::stderr))
    .with(env_filter())
    .init();
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();

  let _guard = match args.command {
    Some(_) => {
      init_stderr_tracing();
      None
    }
    None => Some(init_file_tracing()?),
  };

  let config = config::Config::load(args.config.as_deref())?;

  // CLI flags win over the config file
  let mut coords = config.location;
  if let Some(lat) = args.lat {
    coords.latitude = lat;
  }
  if let Some(lng) = args.lng {
    coords.longitude = lng;
  }

  let db = Arc::new(db::Database::open()?);

  match args.command {
    Some(command) => {
      cli::run(
        command,
        cli::Env {
          config,
          coords,
          db,
        },
      )
      .await
    }
    None => {
      info!(lat = coords.latitude, lng = coords.longitude, "Starting dashboard");
      let ctx = app::Context::new(config, coords, db)?;
      let mut app = app::App::new(ctx);
      app.run().await
    }
  }
}
