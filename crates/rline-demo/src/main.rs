//! Worked example wiring a real [`rline_session::Session`] to a nested
//! command completion tree, mirroring the `flash`/`system`/`wan`/`exit`
//! completer from the reference's own example program.

mod completion;

use std::path::PathBuf;
use std::sync::Once;

use anyhow::Result;
use clap::Parser;
use tracing_appender::non_blocking::WorkerGuard;

use rline_session::{Config, Session};

/// CLI arguments.
#[derive(Parser, Debug)]
#[command(name = "rline-demo", version, about = "rline interactive demo")]
struct Args {
    /// Optional TOML configuration file (overlaid on top of the defaults).
    #[arg(long = "config")]
    config: Option<PathBuf>,
    /// Override the history file path (defaults to ~/.rline_history).
    #[arg(long = "history")]
    history: Option<PathBuf>,
    /// Prompt string to display.
    #[arg(long = "prompt", default_value = "ogo> ")]
    prompt: String,
}

struct AppStartup {
    log_guard: Option<WorkerGuard>,
}

impl AppStartup {
    fn new() -> Self {
        Self { log_guard: None }
    }

    fn configure_logging(&mut self) {
        let log_dir = std::path::Path::new(".");
        let log_path = log_dir.join("rline-demo.log");
        if log_path.exists() {
            let _ = std::fs::remove_file(&log_path);
        }

        let file_appender = tracing_appender::rolling::never(log_dir, "rline-demo.log");
        let (nb_writer, guard) = tracing_appender::non_blocking(file_appender);
        match tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_writer(nb_writer)
            .try_init()
        {
            Ok(_) => self.log_guard = Some(guard),
            Err(_err) => {
                // Global subscriber already installed; drop the guard so the writer shuts down.
            }
        }
    }

    fn install_panic_hook() {
        static HOOK: Once = Once::new();
        HOOK.call_once(|| {
            let default_panic = std::panic::take_hook();
            std::panic::set_hook(Box::new(move |info| {
                tracing::error!(target: "runtime.panic", ?info, "panic");
                default_panic(info);
            }));
        });
    }
}

fn build_config(args: &Args) -> Result<Config> {
    let mut config = match &args.config {
        Some(path) => rline_session::config::load_from(path)?,
        None => Config::default(),
    };

    let history_file = args
        .history
        .clone()
        .or_else(|| dirs::home_dir().map(|home| home.join(".rline_history")));
    if let Some(path) = history_file {
        config = config.with_history_file(path);
    }

    Ok(config)
}

fn is_exit(line: &str) -> bool {
    line.split(' ').next() == Some("exit")
}

fn main() -> Result<()> {
    let mut startup = AppStartup::new();
    startup.configure_logging();
    AppStartup::install_panic_hook();

    tracing::info!(target: "runtime", "startup");

    let args = Args::parse();
    let config = build_config(&args)?;
    let mut session = Session::new(config, Box::new(completion::complete_command))?;

    loop {
        match session.readline(&args.prompt, None)? {
            Some(line) => {
                println!("exec '{line}'");
                if is_exit(&line) {
                    break;
                }
            }
            None => break,
        }
    }

    session.shutdown();
    tracing::info!(target: "runtime", "shutdown");
    Ok(())
}
