//! View rendering for the board TUI.
//!
//! Rendering is read-only over `AppState`. Protected views render a
//! placeholder until the session guard has verified the session.

use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use pinboard_core::backend::storage::attachment_path;
use pinboard_core::types::Post;

use crate::state::{AppState, ComposerFocus, FeedList, LoginFocus, Route, SessionState};

const ACCENT: Color = Color::Cyan;
const DIM: Style = Style::new().fg(Color::DarkGray);
const ERROR_STYLE: Style = Style::new().fg(Color::Red);

/// Renders the active view.
pub fn render(state: &AppState, frame: &mut Frame) {
    match state.route {
        Route::Login => render_login(state, frame),
        Route::Feed => render_feed(state, frame),
        Route::Compose => render_compose(state, frame),
    }
}

// ============================================================================
// Login
// ============================================================================

fn render_login(state: &AppState, frame: &mut Frame) {
    let area = centered_box(frame.area(), 50, 11);

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" pinboard: sign in ");
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let [email_area, password_area, _, error_area, hint_area] = Layout::vertical([
        Constraint::Length(3),
        Constraint::Length(3),
        Constraint::Length(1),
        Constraint::Length(1),
        Constraint::Length(1),
    ])
    .areas(inner);

    render_field(
        frame,
        email_area,
        "email",
        state.login.email.value(),
        state.login.focus == LoginFocus::Email,
    );
    let masked = "•".repeat(state.login.password.value().chars().count());
    render_field(
        frame,
        password_area,
        "password",
        &masked,
        state.login.focus == LoginFocus::Password,
    );

    if state.login.submitting {
        frame.render_widget(Paragraph::new("Signing in…").style(DIM), error_area);
    } else if let Some(error) = &state.login.error {
        frame.render_widget(
            Paragraph::new(error.as_str()).style(ERROR_STYLE),
            error_area,
        );
    }

    frame.render_widget(
        Paragraph::new("Tab switch · Enter sign in · Esc quit").style(DIM),
        hint_area,
    );
}

fn render_field(frame: &mut Frame, area: Rect, label: &str, value: &str, focused: bool) {
    let style = if focused {
        Style::default().fg(ACCENT)
    } else {
        Style::default()
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(style)
        .title(format!(" {} ", label));
    frame.render_widget(Paragraph::new(value).block(block), area);
}

// ============================================================================
// Feed
// ============================================================================

fn render_feed(state: &AppState, frame: &mut Frame) {
    let [header_area, body_area, error_area, hint_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(1),
        Constraint::Length(1),
        Constraint::Length(1),
    ])
    .areas(frame.area());

    let header = Line::from(vec![
        Span::styled("Posts", Style::default().add_modifier(Modifier::BOLD)),
        Span::styled(
            match &state.session {
                SessionState::Authenticated(user) => format!("  ({})", user.email),
                _ => String::new(),
            },
            DIM,
        ),
    ]);
    frame.render_widget(Paragraph::new(header), header_area);

    // Guard: protected content stays hidden until the session is verified.
    if state.session.user().is_none() {
        frame.render_widget(Paragraph::new("Verifying session…").style(DIM), body_area);
        return;
    }

    match &state.feed.list {
        FeedList::Loading => {
            frame.render_widget(Paragraph::new("Loading posts…").style(DIM), body_area);
        }
        FeedList::Errored(message) => {
            frame.render_widget(
                Paragraph::new(format!("Failed to load posts: {}", message))
                    .style(ERROR_STYLE)
                    .wrap(Wrap { trim: false }),
                body_area,
            );
        }
        FeedList::Loaded(posts) if posts.is_empty() => {
            frame.render_widget(
                Paragraph::new("No posts yet. Press n to write one.").style(DIM),
                body_area,
            );
        }
        FeedList::Loaded(posts) => {
            let width = body_area.width.saturating_sub(2) as usize;
            let items: Vec<ListItem> = posts
                .iter()
                .map(|post| post_item(post, state, width))
                .collect();

            let list = List::new(items)
                .highlight_style(Style::default().bg(Color::Rgb(40, 40, 40)))
                .highlight_symbol("> ");
            let mut list_state = ListState::default();
            list_state.select(Some(state.feed.selected));
            frame.render_stateful_widget(list, body_area, &mut list_state);
        }
    }

    if let Some(error) = &state.feed.error {
        frame.render_widget(
            Paragraph::new(error.as_str()).style(ERROR_STYLE),
            error_area,
        );
    }

    frame.render_widget(
        Paragraph::new("j/k move · n new · r reload · d delete own · o open image · l logout · q quit")
            .style(DIM),
        hint_area,
    );
}

fn post_item<'a>(post: &'a Post, state: &AppState, width: usize) -> ListItem<'a> {
    let own = state
        .session
        .user()
        .is_some_and(|user| user.id == post.user_id);

    let mut header_spans = vec![
        Span::styled(
            post.author_email().to_string(),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!("  {}", post.created_at.format("%Y-%m-%d %H:%M")),
            DIM,
        ),
    ];
    if own {
        header_spans.push(Span::styled("  (yours)", Style::default().fg(ACCENT)));
    }

    let mut lines = vec![Line::from(header_spans)];
    for content_line in post.content.lines() {
        lines.push(Line::from(truncate_to_width(content_line, width)));
    }
    if let Some(image_id) = &post.image_id {
        lines.push(Line::from(Span::styled(
            format!("[image] {}", attachment_path(&post.user_id, image_id)),
            DIM,
        )));
    }
    lines.push(Line::from(""));

    ListItem::new(lines)
}

// ============================================================================
// Compose
// ============================================================================

fn render_compose(state: &AppState, frame: &mut Frame) {
    let [header_area, content_area, attachment_area, error_area, hint_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(3),
        Constraint::Length(3),
        Constraint::Length(1),
        Constraint::Length(1),
    ])
    .areas(frame.area());

    frame.render_widget(
        Paragraph::new(Span::styled(
            "Write a post",
            Style::default().add_modifier(Modifier::BOLD),
        )),
        header_area,
    );

    // Guard placeholder, same as the feed.
    if state.session.user().is_none() {
        frame.render_widget(
            Paragraph::new("Verifying session…").style(DIM),
            content_area,
        );
        return;
    }

    let content_focused = state.composer.focus == ComposerFocus::Content;
    let content_style = if content_focused {
        Style::default().fg(ACCENT)
    } else {
        Style::default()
    };
    let content_block = Block::default()
        .borders(Borders::ALL)
        .border_style(content_style)
        .title(" post ");
    let content_inner = content_block.inner(content_area);
    let content_text: Vec<Line> = state
        .composer
        .content
        .lines()
        .iter()
        .map(|l| Line::from(l.as_str()))
        .collect();
    frame.render_widget(Paragraph::new(content_text).block(content_block), content_area);

    if content_focused {
        let (row, col) = state.composer.content.cursor();
        set_cursor(frame, content_inner, col, row);
    }

    render_field(
        frame,
        attachment_area,
        "attachment path (optional)",
        state.composer.attachment.value(),
        !content_focused,
    );
    if !content_focused {
        let inner = Block::default().borders(Borders::ALL).inner(attachment_area);
        set_cursor(frame, inner, state.composer.attachment.cursor(), 0);
    }

    if state.composer.submitting {
        frame.render_widget(Paragraph::new("Posting…").style(DIM), error_area);
    } else if let Some(error) = &state.composer.error {
        frame.render_widget(
            Paragraph::new(error.as_str()).style(ERROR_STYLE),
            error_area,
        );
    }

    frame.render_widget(
        Paragraph::new("Tab switch field · Ctrl+S post · Esc back").style(DIM),
        hint_area,
    );
}

// ============================================================================
// Helpers
// ============================================================================

fn set_cursor(frame: &mut Frame, area: Rect, col: usize, row: usize) {
    let x = area.x.saturating_add(col.min(u16::MAX as usize) as u16);
    let y = area.y.saturating_add(row.min(u16::MAX as usize) as u16);
    if x < area.x + area.width.max(1) && y < area.y + area.height.max(1) {
        frame.set_cursor_position((x, y));
    }
}

fn centered_box(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

/// Truncates a line to the given display width, appending an ellipsis.
fn truncate_to_width(line: &str, max_width: usize) -> String {
    if max_width == 0 || line.width() <= max_width {
        return line.to_string();
    }

    let mut out = String::new();
    let mut used = 0;
    for ch in line.chars() {
        let w = ch.width().unwrap_or(0);
        if used + w > max_width.saturating_sub(1) {
            break;
        }
        out.push(ch);
        used += w;
    }
    out.push('…');
    out
}
