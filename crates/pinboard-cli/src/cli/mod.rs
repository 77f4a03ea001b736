//! Command-line entry for pinboard.
//!
//! Without a subcommand the interactive board starts. `login`, `logout`,
//! and `whoami` manage the stored session from the shell.

use std::io::{BufRead, Write};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use pinboard_core::backend::{BackendClient, auth};
use pinboard_core::config::Config;
use pinboard_core::paths;

#[derive(Parser)]
#[command(name = "pinboard", version, about = "Terminal message-board client")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Sign in and store the session token
    Login {
        /// Account email
        #[arg(long)]
        email: String,
    },
    /// End the session and remove stored credentials
    Logout,
    /// Print the signed-in user's email
    Whoami,
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    let _log_guard = init_tracing()?;
    let config = Config::load()?;

    let runtime = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;
    runtime.block_on(async {
        match cli.command {
            None => pinboard_tui::run_board(config).await,
            Some(Command::Login { email }) => login(config, &email).await,
            Some(Command::Logout) => logout(config).await,
            Some(Command::Whoami) => whoami(config).await,
        }
    })
}

async fn login(config: Config, email: &str) -> Result<()> {
    config.require_backend()?;

    let password = prompt_password()?;
    if password.is_empty() {
        bail!("Password must not be empty");
    }

    let client = BackendClient::new(config, None);
    let resp = client
        .sign_in(email, &password)
        .await
        .context("Sign-in failed")?;

    auth::save_credentials(&auth::Credentials {
        access_token: resp.access_token,
    })?;

    println!("Signed in as {}", resp.user.email);
    Ok(())
}

async fn logout(config: Config) -> Result<()> {
    let Some(creds) = auth::load_credentials()? else {
        println!("Not signed in.");
        return Ok(());
    };

    // End the backend session best-effort; the local credentials go either way.
    if config.require_backend().is_ok() {
        let client = BackendClient::new(config, Some(creds.access_token));
        if let Err(e) = client.sign_out().await {
            tracing::warn!("backend sign-out failed: {}", e);
        }
    }

    auth::clear_credentials()?;
    println!("Signed out.");
    Ok(())
}

async fn whoami(config: Config) -> Result<()> {
    config.require_backend()?;

    let Some(creds) = auth::load_credentials()? else {
        bail!("Not signed in. Run `pinboard login --email <email>` first.");
    };

    let client = BackendClient::new(config, Some(creds.access_token));
    let user = client.current_user().await.context("Session check failed")?;
    println!("{}", user.email);
    Ok(())
}

/// Reads the password from stdin, prompting on stderr so pipes stay clean.
fn prompt_password() -> Result<String> {
    let mut err = std::io::stderr();
    write!(err, "Password: ")?;
    err.flush()?;

    let mut line = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read password")?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

/// Sets up file logging under the pinboard home.
///
/// The TUI owns the terminal, so logs never go to stdout. Filter with
/// `PINBOARD_LOG` (default `info`).
fn init_tracing() -> Result<tracing_appender::non_blocking::WorkerGuard> {
    let dir = paths::logs_dir();
    std::fs::create_dir_all(&dir).context("Failed to create log directory")?;

    let appender = tracing_appender::rolling::daily(dir, "pinboard.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let filter =
        EnvFilter::try_from_env("PINBOARD_LOG").unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .init();

    Ok(guard)
}
