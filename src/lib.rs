pub mod cli;
pub mod config;
pub mod dispatch;
pub mod logging;
pub mod model;
pub mod model_gateway;
pub mod providers;
pub mod render;

#[cfg(test)]
mod test_support;

use anyhow::{Context, Result};
use reqwest::Client;
use std::io::{self, IsTerminal, Read};
use tracing::{info, warn};

use cli::Cli;
use config::{Config, ConfigStore};
use dispatch::Dispatcher;
use model_gateway::HttpModelGateway;
use render::Renderer;

pub async fn run(cli: Cli) -> Result<()> {
    let path = config::default_config_path().context("Failed to locate config file")?;
    let mut store = match ConfigStore::load(&path) {
        Ok(store) => store,
        Err(err) => {
            warn!(error = %err, "config file unreadable, using defaults");
            println!("Error: {err}");
            ConfigStore::new(path, Config::default())
        }
    };
    info!(
        config_path = %store.path().display(),
        base_url = %store.config().base_url,
        model = %store.config().model,
        api_key_set = store.config().has_api_key(),
        "loaded runtime configuration"
    );

    let client = Client::builder()
        .build()
        .context("Failed to initialize HTTP client")?;
    let gateway = HttpModelGateway::new(&client);

    let stdout = io::stdout();
    let interactive = stdout.is_terminal();
    Dispatcher::new(&mut store, &gateway, stdout)
        .with_renderer(Renderer::for_stdout())
        .interactive(interactive)
        .dispatch(&cli, read_piped_stdin)
        .await
        .context("Failed to write to stdout")
}

/// Reads all of stdin unless it is attached to a terminal.
fn read_piped_stdin() -> io::Result<Option<String>> {
    let stdin = io::stdin();
    if stdin.is_terminal() {
        return Ok(None);
    }

    let mut input = String::new();
    stdin.lock().read_to_string(&mut input)?;
    Ok(Some(input))
}
