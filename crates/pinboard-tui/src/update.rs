//! TUI reducer (update function).
//!
//! All state mutations happen here. The runtime calls `update(state, event)`
//! and executes the returned effects.
//!
//! This is the single source of truth for how events modify state: the
//! session guard, the feed list state machine, the ownership gate on delete,
//! and the subscription lifecycle all live in this module.

use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::effects::UiEffect;
use crate::events::UiEvent;
use crate::state::{
    AppState, ComposerFocus, FeedList, LoginFocus, Route, SessionState, Subscription,
};

/// The main reducer function.
///
/// Takes the current state and an event, mutates state, and returns effects
/// for the runtime to execute.
pub fn update(state: &mut AppState, event: UiEvent) -> Vec<UiEffect> {
    match event {
        UiEvent::Tick => vec![],
        UiEvent::Terminal(term_event) => handle_terminal_event(state, term_event),
        UiEvent::SessionChecked(result) => handle_session_checked(state, result),
        UiEvent::SignInFinished(result) => handle_sign_in_finished(state, result),
        UiEvent::PostsLoaded(result) => handle_posts_loaded(state, result),
        UiEvent::FeedChanged => handle_feed_changed(state),
        UiEvent::SubscriptionStarted { id, cancel } => {
            handle_subscription_started(state, id, cancel)
        }
        UiEvent::SubscriptionEnded { id } => {
            if state
                .feed
                .subscription
                .as_ref()
                .is_some_and(|s| s.id == id)
            {
                state.feed.subscription = None;
            }
            vec![]
        }
        UiEvent::SubmitFinished(result) => handle_submit_finished(state, result),
        UiEvent::DeleteFinished(result) => {
            match result {
                Ok(_) => state.feed.error = None,
                Err(message) => state.feed.error = Some(message),
            }
            vec![]
        }
        UiEvent::LogoutFinished(result) => match result {
            Ok(()) => navigate(state, Route::Login),
            Err(message) => {
                // Logout failure leaves the session untouched; only report.
                state.feed.error = Some(message);
                vec![]
            }
        },
    }
}

// ============================================================================
// Navigation
// ============================================================================

/// Switches the active view.
///
/// Leaving the feed releases its change-feed subscription exactly once.
/// Activating a protected view re-runs the session guard; the protected
/// content stays suppressed until the verdict arrives.
pub fn navigate(state: &mut AppState, route: Route) -> Vec<UiEffect> {
    let mut effects = Vec::new();

    if state.route == Route::Feed
        && route != Route::Feed
        && let Some(subscription) = state.feed.subscription.take()
    {
        effects.push(UiEffect::CancelSubscription {
            cancel: subscription.cancel,
        });
    }

    state.route = route;
    match route {
        Route::Login => {
            state.session = SessionState::Anonymous;
            state.login.submitting = false;
        }
        Route::Feed => {
            state.feed.list = FeedList::Loading;
            state.feed.selected = 0;
            state.feed.error = None;
            state.session = SessionState::Checking;
            effects.push(UiEffect::CheckSession);
        }
        Route::Compose => {
            state.composer.reset();
            state.session = SessionState::Checking;
            effects.push(UiEffect::CheckSession);
        }
    }
    effects
}

// ============================================================================
// Async Result Handlers
// ============================================================================

fn handle_session_checked(
    state: &mut AppState,
    result: Result<pinboard_core::types::UserInfo, String>,
) -> Vec<UiEffect> {
    // A verdict only matters while a protected view is waiting on it.
    if !state.route.is_protected() {
        return vec![];
    }

    match result {
        Ok(user) => {
            state.session = SessionState::Authenticated(user);
            let mut effects = Vec::new();
            if state.route == Route::Feed {
                state.feed.list = FeedList::Loading;
                effects.push(UiEffect::LoadPosts);
                if state.feed.subscription.is_none() {
                    effects.push(UiEffect::SubscribeFeed);
                }
            }
            effects
        }
        // Any failure is treated identically to "no session": redirect.
        Err(_) => navigate(state, Route::Login),
    }
}

fn handle_sign_in_finished(
    state: &mut AppState,
    result: Result<pinboard_core::types::UserInfo, String>,
) -> Vec<UiEffect> {
    state.login.submitting = false;
    match result {
        Ok(_) => {
            state.login.password.clear();
            state.login.error = None;
            navigate(state, Route::Feed)
        }
        Err(message) => {
            state.login.error = Some(message);
            vec![]
        }
    }
}

fn handle_posts_loaded(
    state: &mut AppState,
    result: Result<Vec<pinboard_core::types::Post>, String>,
) -> Vec<UiEffect> {
    match result {
        Ok(posts) => {
            state.feed.selected = state.feed.selected.min(posts.len().saturating_sub(1));
            state.feed.list = FeedList::Loaded(posts);
        }
        Err(message) => state.feed.list = FeedList::Errored(message),
    }
    vec![]
}

/// A change notification always means "re-run the load and replace the whole
/// sequence". While a load is already in flight the notification is absorbed
/// by it: at most one load per transition into `Loading`. Notifications
/// still in the inbox after the feed was left are dropped; re-entering the
/// feed starts with a fresh load anyway.
fn handle_feed_changed(state: &mut AppState) -> Vec<UiEffect> {
    if state.route != Route::Feed {
        return vec![];
    }
    match state.feed.list {
        FeedList::Loaded(_) | FeedList::Errored(_) => {
            state.feed.list = FeedList::Loading;
            vec![UiEffect::LoadPosts]
        }
        FeedList::Loading => vec![],
    }
}

fn handle_subscription_started(
    state: &mut AppState,
    id: u64,
    cancel: tokio_util::sync::CancellationToken,
) -> Vec<UiEffect> {
    if state.route == Route::Feed && state.feed.subscription.is_none() {
        state.feed.subscription = Some(Subscription { id, cancel });
        vec![]
    } else {
        // The view moved on (or already has a watcher) before this one came
        // up; kill the orphan rather than leak a listener.
        vec![UiEffect::CancelSubscription { cancel }]
    }
}

fn handle_submit_finished(state: &mut AppState, result: Result<(), String>) -> Vec<UiEffect> {
    state.composer.submitting = false;
    match result {
        Ok(()) => {
            state.composer.reset();
            navigate(state, Route::Feed)
        }
        Err(message) => {
            state.composer.error = Some(message);
            vec![]
        }
    }
}

// ============================================================================
// Terminal Event Handlers
// ============================================================================

fn handle_terminal_event(state: &mut AppState, event: Event) -> Vec<UiEffect> {
    match event {
        Event::Key(key) if key.kind != KeyEventKind::Release => handle_key(state, key),
        Event::Paste(text) => {
            handle_paste(state, &text);
            vec![]
        }
        _ => vec![],
    }
}

fn handle_paste(state: &mut AppState, text: &str) {
    match state.route {
        Route::Login => match state.login.focus {
            LoginFocus::Email => state.login.email.insert_str(text),
            LoginFocus::Password => state.login.password.insert_str(text),
        },
        Route::Compose => match state.composer.focus {
            ComposerFocus::Content => state.composer.content.insert_str(text),
            ComposerFocus::Attachment => state.composer.attachment.insert_str(text),
        },
        Route::Feed => {}
    }
}

fn handle_key(state: &mut AppState, key: KeyEvent) -> Vec<UiEffect> {
    // Ctrl+C quits from anywhere.
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return vec![UiEffect::Quit];
    }

    match state.route {
        Route::Login => handle_login_key(state, key),
        Route::Feed => handle_feed_key(state, key),
        Route::Compose => handle_compose_key(state, key),
    }
}

fn handle_login_key(state: &mut AppState, key: KeyEvent) -> Vec<UiEffect> {
    match key.code {
        KeyCode::Esc => return vec![UiEffect::Quit],
        KeyCode::Tab | KeyCode::Up | KeyCode::Down => {
            state.login.focus = match state.login.focus {
                LoginFocus::Email => LoginFocus::Password,
                LoginFocus::Password => LoginFocus::Email,
            };
        }
        KeyCode::Enter => {
            if !state.login.submitting
                && !state.login.email.is_empty()
                && !state.login.password.is_empty()
            {
                state.login.submitting = true;
                state.login.error = None;
                return vec![UiEffect::SignIn {
                    email: state.login.email.value().trim().to_string(),
                    password: state.login.password.value().to_string(),
                }];
            }
        }
        code => {
            let field = match state.login.focus {
                LoginFocus::Email => &mut state.login.email,
                LoginFocus::Password => &mut state.login.password,
            };
            match code {
                KeyCode::Char(ch) => field.insert_char(ch),
                KeyCode::Backspace => field.delete_prev_char(),
                KeyCode::Left => field.move_left(),
                KeyCode::Right => field.move_right(),
                _ => {}
            }
        }
    }
    vec![]
}

fn handle_feed_key(state: &mut AppState, key: KeyEvent) -> Vec<UiEffect> {
    // While the guard is checking (or has failed) the protected view is
    // suppressed; only quitting works.
    let Some(user) = state.session.user().cloned() else {
        return match key.code {
            KeyCode::Char('q') | KeyCode::Esc => vec![UiEffect::Quit],
            _ => vec![],
        };
    };

    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => return vec![UiEffect::Quit],
        KeyCode::Up | KeyCode::Char('k') => {
            state.feed.selected = state.feed.selected.saturating_sub(1);
        }
        KeyCode::Down | KeyCode::Char('j') => {
            if let Some(posts) = state.feed.posts()
                && !posts.is_empty()
            {
                state.feed.selected = (state.feed.selected + 1).min(posts.len() - 1);
            }
        }
        KeyCode::Char('n') => return navigate(state, Route::Compose),
        KeyCode::Char('r') => {
            if state.feed.list != FeedList::Loading {
                state.feed.list = FeedList::Loading;
                let mut effects = vec![UiEffect::LoadPosts];
                if state.feed.subscription.is_none() {
                    effects.push(UiEffect::SubscribeFeed);
                }
                return effects;
            }
        }
        KeyCode::Char('d') => {
            // Ownership gate: only the author's own posts are deletable
            // from this client. The backend must enforce this too; a
            // rejection there surfaces as a normal error.
            if let Some(post) = state.feed.selected_post()
                && post.user_id == user.id
            {
                return vec![UiEffect::DeletePost { post: post.clone() }];
            }
        }
        KeyCode::Char('o') => {
            if let Some(post) = state.feed.selected_post()
                && let Some(image_id) = &post.image_id
            {
                return vec![UiEffect::OpenAttachment {
                    user_id: post.user_id.clone(),
                    image_id: image_id.clone(),
                }];
            }
        }
        KeyCode::Char('l') => return vec![UiEffect::Logout],
        _ => {}
    }
    vec![]
}

fn handle_compose_key(state: &mut AppState, key: KeyEvent) -> Vec<UiEffect> {
    match key.code {
        KeyCode::Esc => return navigate(state, Route::Feed),
        KeyCode::Tab => {
            state.composer.focus = match state.composer.focus {
                ComposerFocus::Content => ComposerFocus::Attachment,
                ComposerFocus::Attachment => ComposerFocus::Content,
            };
        }
        KeyCode::Char('s') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            if !state.composer.submitting && !state.composer.content.is_blank() {
                state.composer.submitting = true;
                state.composer.error = None;
                let attachment = if state.composer.attachment.is_empty() {
                    None
                } else {
                    Some(std::path::PathBuf::from(
                        state.composer.attachment.value().trim(),
                    ))
                };
                return vec![UiEffect::SubmitPost {
                    content: state.composer.content.text(),
                    attachment,
                }];
            }
        }
        code => match state.composer.focus {
            ComposerFocus::Content => {
                let buffer = &mut state.composer.content;
                match code {
                    KeyCode::Char(ch) => buffer.insert_char(ch),
                    KeyCode::Enter => buffer.insert_newline(),
                    KeyCode::Backspace => buffer.delete_prev_char(),
                    KeyCode::Left => buffer.move_left(),
                    KeyCode::Right => buffer.move_right(),
                    KeyCode::Up => buffer.move_up(),
                    KeyCode::Down => buffer.move_down(),
                    _ => {}
                }
            }
            ComposerFocus::Attachment => {
                let field = &mut state.composer.attachment;
                match code {
                    KeyCode::Char(ch) => field.insert_char(ch),
                    KeyCode::Backspace => field.delete_prev_char(),
                    KeyCode::Left => field.move_left(),
                    KeyCode::Right => field.move_right(),
                    _ => {}
                }
            }
        },
    }
    vec![]
}
