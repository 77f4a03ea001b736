//! Board runtime - owns terminal, runs event loop, executes effects.
//!
//! This is the "Elm runtime" boundary: all side effects happen here.
//! The reducer stays pure and produces effects; this module executes them.
//!
//! Async results funnel through a single inbox channel (`inbox`): spawned
//! handlers send `UiEvent`s to it and the event loop drains it once per
//! frame, so there is no per-operation receiver bookkeeping.

pub mod handlers;
pub mod inbox;

use std::future::Future;
use std::io::Stdout;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::event;
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use tokio_util::sync::CancellationToken;

use pinboard_core::backend::storage::attachment_path;
use pinboard_core::backend::{BackendClient, auth};

use crate::effects::UiEffect;
use crate::events::UiEvent;
use crate::runtime::inbox::Inbox;
use crate::state::{AppState, Route};
use crate::{render, terminal, update};

/// Poll cadence for the event loop. Nothing here streams per-token, so a
/// single tick rate keeps input responsive without burning CPU.
pub const TICK_INTERVAL: Duration = Duration::from_millis(100);

/// Full-screen board runtime.
///
/// Owns the terminal, the state, and the injected backend client. Runs the
/// event loop and executes effects.
pub struct BoardRuntime {
    /// Terminal instance.
    terminal: Terminal<CrosstermBackend<Stdout>>,
    /// Application state.
    pub state: AppState,
    /// Injected backend client; rebuilt when the session token changes.
    client: BackendClient,
    /// Shared inbox all async results arrive through.
    inbox: Inbox,
    /// Effects from the initial navigation, executed when the loop starts.
    pending_effects: Vec<UiEffect>,
    /// Generation counter for change-feed watchers.
    subscription_seq: u64,
    /// Last time a Tick event was emitted.
    last_tick: Instant,
}

impl BoardRuntime {
    /// Creates a new board runtime parked on the given initial route.
    pub fn new(client: BackendClient, initial: Route) -> Result<Self> {
        // The panic hook must be in place before the alternate screen.
        terminal::install_panic_hook();

        let terminal = terminal::setup_terminal().context("Failed to setup terminal")?;

        let mut state = AppState::new();
        let pending_effects = update::navigate(&mut state, initial);

        Ok(Self {
            terminal,
            state,
            client,
            inbox: Inbox::new(),
            pending_effects,
            subscription_seq: 0,
            last_tick: Instant::now(),
        })
    }

    /// Runs the main event loop.
    pub fn run(&mut self) -> Result<()> {
        let pending = std::mem::take(&mut self.pending_effects);
        self.execute_effects(pending);

        let mut dirty = true; // first frame always draws

        while !self.state.should_quit {
            let events = self.collect_events()?;

            for event in events {
                self.refresh_client_for(&event);
                let effects = update::update(&mut self.state, event);
                self.execute_effects(effects);
                dirty = true;
            }

            if dirty {
                self.terminal.draw(|frame| {
                    render::render(&self.state, frame);
                })?;
                dirty = false;
            }
        }

        Ok(())
    }

    // ========================================================================
    // Event Collection
    // ========================================================================

    /// Collects events from all sources (inbox, terminal, tick).
    fn collect_events(&mut self) -> Result<Vec<UiEvent>> {
        let mut events = Vec::new();

        self.inbox.drain_into(&mut events);

        // Terminal poll blocks until the next tick is due, unless async
        // results are already waiting to be processed.
        let poll_duration = if events.is_empty() {
            TICK_INTERVAL.saturating_sub(self.last_tick.elapsed())
        } else {
            Duration::ZERO
        };

        if event::poll(poll_duration)? {
            events.push(UiEvent::Terminal(event::read()?));
            // Pick up whatever else the terminal already buffered.
            while event::poll(Duration::ZERO)? {
                events.push(UiEvent::Terminal(event::read()?));
            }
        }

        if self.last_tick.elapsed() >= TICK_INTERVAL {
            events.push(UiEvent::Tick);
            self.last_tick = Instant::now();
        }

        Ok(events)
    }

    /// Rebuilds the client when the stored session token changed.
    ///
    /// Sign-in persists fresh credentials before its result event arrives;
    /// logout clears them. The reducer never sees the token itself.
    fn refresh_client_for(&mut self, event: &UiEvent) {
        let token = match event {
            UiEvent::SignInFinished(Ok(_)) => match auth::load_credentials() {
                Ok(creds) => creds.map(|c| c.access_token),
                Err(e) => {
                    tracing::warn!("failed to reload credentials: {}", e);
                    return;
                }
            },
            UiEvent::LogoutFinished(Ok(())) => None,
            _ => return,
        };
        self.client = BackendClient::new(self.client.config().clone(), token);
    }

    // ========================================================================
    // Effect Dispatch
    // ========================================================================

    /// Executes effects returned by the reducer.
    fn execute_effects(&mut self, effects: Vec<UiEffect>) {
        for effect in effects {
            self.execute_effect(effect);
        }
    }

    /// Spawns an async effect handler and routes its result to the inbox.
    fn spawn_effect<Fut>(&self, fut: Fut)
    where
        Fut: Future<Output = UiEvent> + Send + 'static,
    {
        let tx = self.inbox.sender();
        tokio::spawn(async move {
            let _ = tx.send(fut.await);
        });
    }

    /// Executes a single effect by dispatching to the appropriate handler.
    fn execute_effect(&mut self, effect: UiEffect) {
        match effect {
            UiEffect::Quit => {
                self.state.should_quit = true;
            }

            UiEffect::CheckSession => {
                self.spawn_effect(handlers::check_session(self.client.clone()));
            }
            UiEffect::SignIn { email, password } => {
                self.spawn_effect(handlers::sign_in(self.client.clone(), email, password));
            }
            UiEffect::LoadPosts => {
                self.spawn_effect(handlers::load_feed(self.client.clone()));
            }
            UiEffect::SubmitPost {
                content,
                attachment,
            } => {
                self.spawn_effect(handlers::submit(self.client.clone(), content, attachment));
            }
            UiEffect::DeletePost { post } => {
                self.spawn_effect(handlers::delete_post(self.client.clone(), post));
            }
            UiEffect::Logout => {
                self.spawn_effect(handlers::logout(self.client.clone()));
            }

            UiEffect::SubscribeFeed => {
                self.subscription_seq += 1;
                let id = self.subscription_seq;
                let cancel = CancellationToken::new();
                // Report the handle first so the reducer owns it before any
                // notification can arrive.
                let _ = self.inbox.sender().send(UiEvent::SubscriptionStarted {
                    id,
                    cancel: cancel.clone(),
                });
                tokio::spawn(handlers::watch_changes(
                    self.client.clone(),
                    id,
                    cancel,
                    self.inbox.sender(),
                ));
            }
            UiEffect::CancelSubscription { cancel } => {
                cancel.cancel();
            }

            UiEffect::OpenAttachment { user_id, image_id } => {
                let url = self
                    .client
                    .public_url(&attachment_path(&user_id, &image_id));
                let _ = open::that(&url);
            }
        }
    }
}
