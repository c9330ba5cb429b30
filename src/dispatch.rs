use clap::CommandFactory;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::io::{self, Write};
use std::time::Duration;
use tracing::{debug, warn};

use crate::cli::{AUTH_USAGE, Cli, parse_credentials};
use crate::config::{ConfigKey, ConfigStore};
use crate::model_gateway::ModelGateway;
use crate::render::Renderer;

const THINKING: &str = "Thinking...";
const SPINNER_TICK: Duration = Duration::from_millis(100);

/// Spinner shown while the chat request is in flight.
fn thinking_spinner(target: ProgressDrawTarget) -> ProgressBar {
    let spinner = ProgressBar::with_draw_target(None, target);
    spinner.set_style(
        ProgressStyle::with_template("{spinner} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(THINKING);
    spinner.enable_steady_tick(SPINNER_TICK);
    spinner
}

/// Runs one invocation: save credentials, switch or list models, or
/// translate the input text.
///
/// Failures of individual steps are written to `out` as `Error: ...` lines.
/// Only failures to write `out` itself are returned.
pub struct Dispatcher<'a, G, W> {
    store: &'a mut ConfigStore,
    gateway: &'a G,
    out: W,
    renderer: Renderer,
    interactive: bool,
}

impl<'a, G, W> Dispatcher<'a, G, W>
where
    G: ModelGateway,
    W: Write,
{
    pub fn new(store: &'a mut ConfigStore, gateway: &'a G, out: W) -> Self {
        Self {
            store,
            gateway,
            out,
            renderer: Renderer::plain(),
            interactive: false,
        }
    }

    pub fn with_renderer(mut self, renderer: Renderer) -> Self {
        self.renderer = renderer;
        self
    }

    /// Shows a spinner on the terminal while waiting for the reply.
    pub fn interactive(mut self, interactive: bool) -> Self {
        self.interactive = interactive;
        self
    }

    pub async fn dispatch<F>(&mut self, cli: &Cli, read_stdin: F) -> io::Result<()>
    where
        F: FnOnce() -> io::Result<Option<String>>,
    {
        if !cli.auth.is_empty() {
            return self.handle_auth(cli);
        }

        if let Some(model) = cli.model.as_deref() {
            self.handle_model(model).await?;
        }

        let Some(text) = self.input_text(cli, read_stdin)? else {
            return Ok(());
        };

        if text.is_empty() {
            if cli.model.is_some() {
                return Ok(());
            }
            write!(self.out, "{}", Cli::command().render_help())?;
            return Ok(());
        }

        let mode = cli.mode();
        debug!(mode = ?mode, input_len = text.len(), "dispatching translation");

        let spinner = self
            .interactive
            .then(|| thinking_spinner(ProgressDrawTarget::stderr()));
        let result = self
            .gateway
            .chat(self.store.config(), mode.system_prompt(), &text)
            .await;
        if let Some(spinner) = spinner {
            spinner.finish_and_clear();
        }

        match result {
            Ok(reply) => write!(self.out, "{}", self.renderer.render(&reply))?,
            Err(err) => {
                warn!(error = %err, "translation failed");
                writeln!(self.out, "Error: {err}")?;
            }
        }
        self.out.flush()
    }

    fn handle_auth(&mut self, cli: &Cli) -> io::Result<()> {
        let credentials = match parse_credentials(&cli.auth, &cli.text) {
            Ok(credentials) => credentials,
            Err(err) => {
                writeln!(self.out, "Error: {err}")?;
                writeln!(self.out, "{AUTH_USAGE}")?;
                return Ok(());
            }
        };

        if let Err(err) = self.store.ensure_file_exists() {
            writeln!(self.out, "Warning: failed to create config file: {err}")?;
        }

        for (key, value) in [
            (ConfigKey::BaseUrl, credentials.base_url.as_str()),
            (ConfigKey::ApiKey, credentials.api_key.as_str()),
        ] {
            if let Err(err) = self.store.save(key, value) {
                writeln!(self.out, "Error saving {}: {err}", key.as_str())?;
                return Ok(());
            }
        }

        writeln!(self.out, "Configuration saved!")
    }

    async fn handle_model(&mut self, model: &str) -> io::Result<()> {
        if !model.eq_ignore_ascii_case("list") {
            return match self.store.save(ConfigKey::Model, model) {
                Ok(()) => writeln!(self.out, "Model switched to: {model}"),
                Err(err) => writeln!(self.out, "Error saving model: {err}"),
            };
        }

        writeln!(self.out, "Current Model: {}", self.store.config().model)?;
        writeln!(self.out, "Fetching available models...")?;
        match self.gateway.list_models(self.store.config()).await {
            Ok(models) => {
                for (idx, id) in models.iter().enumerate() {
                    writeln!(self.out, "[{idx}] {id}")?;
                }
            }
            Err(err) => {
                warn!(error = %err, "model listing failed");
                writeln!(self.out, "Error: failed to fetch models: {err}")?;
            }
        }
        Ok(())
    }

    /// Positional text wins over piped input. `None` means reading standard
    /// input failed and the error was already reported.
    fn input_text<F>(&mut self, cli: &Cli, read_stdin: F) -> io::Result<Option<String>>
    where
        F: FnOnce() -> io::Result<Option<String>>,
    {
        let raw = if cli.text.is_empty() {
            match read_stdin() {
                Ok(piped) => piped.unwrap_or_default(),
                Err(err) => {
                    writeln!(self.out, "Error: failed to read standard input: {err}")?;
                    return Ok(None);
                }
            }
        } else {
            cli.text.join(" ")
        };

        Ok(Some(raw.trim().to_string()))
    }
}
