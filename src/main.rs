mod app;
mod cache;
mod commands;
mod config;
mod event;
mod logging;
mod project;
mod provider;
mod sync;
mod theme;
mod ui;
mod upstream;

use cache::SqliteStore;
use clap::{Parser, Subcommand};
use color_eyre::Result;
use config::Config;
use provider::{LocalSource, ProjectSource, RemoteSource};
use std::path::PathBuf;
use std::sync::Arc;
use sync::{ProjectSyncService, SyncOptions};
use tracing::info;
use upstream::{NrelFeed, UpstreamFeed};

#[derive(Parser, Debug)]
#[command(name = "renewdash")]
#[command(about = "A terminal dashboard for renewable energy projects")]
#[command(version)]
struct Args {
  /// Path to config file (default: ./renewdash.yaml or $XDG_CONFIG_HOME/renewdash/config.yaml)
  #[arg(short, long, global = true)]
  config: Option<PathBuf>,

  /// Path to the project database
  #[arg(long, global = true)]
  database: Option<PathBuf>,

  #[command(subcommand)]
  command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
  /// Serve projects over HTTP
  Serve {
    /// Address to listen on (default from config)
    #[arg(long)]
    addr: Option<String>,
  },
  /// Browse projects in the terminal (default)
  Browse {
    /// Base URL of a running `renewdash serve`
    #[arg(long)]
    remote: Option<String>,
  },
  /// Store the built-in demo projects
  Seed,
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();

  // Load configuration
  let config = Config::load(args.config.as_deref())?;

  // Override database if specified on command line
  let config = if let Some(database) = args.database {
    Config {
      database: Some(database),
      ..config
    }
  } else {
    config
  };

  match args.command.unwrap_or(Commands::Browse { remote: None }) {
    Commands::Serve { addr } => {
      logging::init_stderr()?;
      let addr = addr.unwrap_or_else(|| config.server.addr.clone());
      let service = Arc::new(build_service(&config)?);
      sync::http::serve(service, chart_css(&config), &addr).await
    }
    Commands::Browse { remote } => {
      let _guard = logging::init_file(&logging::default_dir()?)?;
      let source: Arc<dyn ProjectSource> = match remote {
        Some(url) => Arc::new(RemoteSource::new(&url)?),
        None => {
          let service = Arc::new(build_service(&config)?);
          Arc::new(LocalSource::new(service, database_path(&config)?.display().to_string()))
        }
      };

      let mut app = app::App::new(&config, source);
      app.run().await
    }
    Commands::Seed => {
      logging::init_stderr()?;
      let service = build_service(&config)?;
      let count = service.load_seed_data()?;
      info!(count, path = %database_path(&config)?.display(), "Seeded project store");
      Ok(())
    }
  }
}

fn database_path(config: &Config) -> Result<PathBuf> {
  match &config.database {
    Some(path) => Ok(path.clone()),
    None => SqliteStore::default_path(),
  }
}

fn build_service(config: &Config) -> Result<ProjectSyncService<SqliteStore>> {
  let store = SqliteStore::open(&database_path(config)?)?;
  let feeds = NrelFeed::from_config(config)?
    .into_iter()
    .map(|feed| Box::new(feed) as Box<dyn UpstreamFeed>)
    .collect();
  Ok(ProjectSyncService::new(
    store,
    feeds,
    SyncOptions::from_config(config),
  ))
}

fn chart_css(config: &Config) -> String {
  theme::generate_chart_css(&config.chart.themes, &config.chart.id, &config.chart.colors)
}
