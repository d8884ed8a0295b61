//! Studio administration console

use std::io::read_to_string;

use clap::Parser;
use color_eyre::Result;
use studio_auth::identity::MockIdentity;
use studio_auth::session::SessionController;
use studio_auth::storage::{FileArea, MemoryArea, Storage};
use tokio::io::BufReader;
use tracing::info;

use crate::config::{Config, LogFormat};
use crate::opt::{Command, Opt};
use crate::shell::Shell;

mod config;
mod opt;
mod shell;

/// Initializes tracing collection
fn setup_tracing(config: config::Logging) {
    use tracing_error::ErrorLayer;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::{EnvFilter, fmt};

    // Standard output belongs to the console itself
    let fmt_layer = match config.format {
        LogFormat::Pretty => fmt::layer().pretty().with_writer(std::io::stderr).boxed(),
        LogFormat::Compact => fmt::layer().compact().with_writer(std::io::stderr).boxed(),
    };

    let filter_layer =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let filter_layer = config
        .filters
        .into_iter()
        .fold(filter_layer, |layer, filter| layer.add_directive(filter));

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .with(ErrorLayer::default())
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let Opt { config, command } = Opt::parse();

    let (config, config_path) = match config {
        Some(mut config_file) => {
            let content = read_to_string(&mut config_file)?;
            let config: Config = toml::from_str(&content)?;
            (config, Some(config_file.path().path().to_owned()))
        }
        None => (Config::default(), None),
    };

    setup_tracing(config.logging);
    color_eyre::install()?;

    info!(
        config = ?config_path,
        storage = ?config.storage.durable_path,
        "Tracing initialized, restoring session"
    );

    let storage = Storage::new(
        FileArea::new(config.storage.durable_path),
        MemoryArea::default(),
    );
    let identity = MockIdentity::new(config.identity.latency());
    let controller = SessionController::new(identity, storage);
    controller.initialize().await;

    let mut console = Shell::new(controller);
    match command.and_then(Command::action) {
        Some(action) => {
            let lines = console.execute(action).await;
            shell::write_lines(&mut tokio::io::stdout(), &lines).await?;
        }
        None => {
            let stdin = BufReader::new(tokio::io::stdin());
            console.run(stdin, tokio::io::stdout()).await?;
        }
    }

    info!("Console closed");
    Ok(())
}
