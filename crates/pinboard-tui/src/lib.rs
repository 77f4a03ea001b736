//! Full-screen TUI for the pinboard message-board client.

pub mod effects;
pub mod events;
pub mod input;
pub mod render;
pub mod runtime;
pub mod state;
pub mod terminal;
pub mod update;

use std::io::{IsTerminal, stderr};

use anyhow::Result;
use pinboard_core::backend::{BackendClient, auth};
use pinboard_core::config::Config;
pub use runtime::BoardRuntime;

use crate::state::Route;

/// Runs the interactive board.
///
/// Starts on the feed when stored credentials exist (the session guard still
/// verifies them against the backend), otherwise on the login view.
pub async fn run_board(config: Config) -> Result<()> {
    // The board requires a terminal to render
    if !stderr().is_terminal() {
        anyhow::bail!(
            "The board requires a terminal.\n\
             Use `pinboard whoami` for non-interactive session checks."
        );
    }

    config.require_backend()?;

    let creds = auth::load_credentials()?;
    let initial = if creds.is_some() {
        Route::Feed
    } else {
        Route::Login
    };

    let client = BackendClient::new(config, creds.map(|c| c.access_token));

    let mut runtime = BoardRuntime::new(client, initial)?;
    let result = runtime.run();

    terminal::restore_terminal()?;
    result
}
