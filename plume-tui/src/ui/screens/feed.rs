use chrono::Utc;
use plume_types::Post;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use crate::app::{App, MessageKind};
use crate::likes::LikeState;
use crate::log_rendering;
use crate::ui::formatting::{format_post_content, format_relative_time, format_timestamp, truncate_chars};
use crate::ui::theme::{get_theme_colors, ThemeColors};

/// Rows one post card takes in the feed list
const CARD_HEIGHT: u16 = 5;

pub fn render_feed_screen(frame: &mut Frame, app: &mut App, area: Rect) {
    let theme = get_theme_colors();
    let has_message = app.feed.message.is_some();
    let has_error = app.feed.loader.error().is_some();

    let mut constraints = vec![Constraint::Length(3), Constraint::Length(3)];
    if has_message {
        constraints.push(Constraint::Length(3));
    }
    if has_error {
        constraints.push(Constraint::Length(3));
    }
    constraints.push(Constraint::Min(0));
    constraints.push(Constraint::Length(1));

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(area);

    let mut chunk_idx = 0;
    render_header(frame, app, &theme, chunks[chunk_idx]);
    chunk_idx += 1;
    render_filter_bar(frame, app, &theme, chunks[chunk_idx]);
    chunk_idx += 1;

    // Message banner (success or error, auto-clears)
    if let Some(message) = &app.feed.message {
        let color = match message.kind {
            MessageKind::Success => theme.success,
            MessageKind::Error => theme.error,
        };
        let banner = Paragraph::new(message.text.clone())
            .style(Style::default().fg(color).add_modifier(Modifier::BOLD))
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL).title("Message").border_style(Style::default().fg(theme.border)));
        frame.render_widget(banner, chunks[chunk_idx]);
        chunk_idx += 1;
    }

    if let Some(error) = app.feed.loader.error() {
        let banner = Paragraph::new(format!("{} (press r to retry)", error))
            .style(Style::default().fg(theme.error).add_modifier(Modifier::BOLD))
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL).title("Error").border_style(Style::default().fg(theme.border)));
        frame.render_widget(banner, chunks[chunk_idx]);
        chunk_idx += 1;
    }

    let body = chunks[chunk_idx];
    if app.feed.detail.is_some() {
        render_post_detail(frame, app, &theme, body);
    } else {
        render_post_list(frame, app, &theme, body);
    }
    chunk_idx += 1;

    let hints = if app.feed.detail.is_some() {
        "l: Like | e: Edit | d: Delete | Esc: Back"
    } else {
        "j/k: Move | Enter: Open | l: Like | n: New | /: Filter | ?: Help | q: Quit"
    };
    let footer = Paragraph::new(hints)
        .style(Style::default().fg(theme.text_dim))
        .alignment(Alignment::Center);
    frame.render_widget(footer, chunks[chunk_idx]);
}

fn render_header(frame: &mut Frame, app: &App, theme: &ThemeColors, area: Rect) {
    let username = app.current_username().unwrap_or_default();
    let header = Paragraph::new(Line::from(vec![
        Span::styled("Plume", Style::default().fg(theme.text).add_modifier(Modifier::BOLD)),
        Span::raw("  "),
        Span::styled(format!("@{}", username), Style::default().fg(theme.primary)),
        Span::styled(format!("  {}", app.server_url()), Style::default().fg(theme.text_dim)),
    ]))
    .alignment(Alignment::Center)
    .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(theme.border)));
    frame.render_widget(header, area);
}

fn render_filter_bar(frame: &mut Frame, app: &App, theme: &ThemeColors, area: Rect) {
    let focused = app.feed.filter_focused;
    let border = if focused { theme.primary } else { theme.border };

    let mut spans = vec![Span::styled(app.feed.filter_input.clone(), Style::default().fg(theme.text))];
    if focused {
        spans.push(Span::styled("█", Style::default().fg(theme.primary)));
        spans.push(Span::styled("  Ctrl+U: clear", Style::default().fg(theme.text_dim)));
    } else if app.feed.filter_input.is_empty() {
        spans.push(Span::styled("Press / to filter by title", Style::default().fg(theme.text_dim)));
    }
    if app.feed.filter_debounce.is_pending() {
        spans.push(Span::styled("  …", Style::default().fg(theme.text_dim)));
    }

    let filter = Paragraph::new(Line::from(spans)).block(
        Block::default()
            .borders(Borders::ALL)
            .title("Filter")
            .border_style(Style::default().fg(border)),
    );
    frame.render_widget(filter, area);
}

fn render_post_list(frame: &mut Frame, app: &mut App, theme: &ThemeColors, area: Rect) {
    let title = match app.feed.loader.filter() {
        Some(filter) => format!("Posts matching \"{}\"", filter),
        None => "Feed".to_string(),
    };
    let title = if app.feed.loader.is_revalidating() {
        format!("{} (refreshing)", title)
    } else {
        title
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .title(title)
        .border_style(Style::default().fg(theme.border));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    // Keep the viewport in step with the space we actually have
    app.feed.viewport.height = (inner.height / CARD_HEIGHT).max(1) as usize;
    app.feed.clamp_selection();

    if app.feed.loader.is_loading_first_page() && app.feed.loader.post_count() == 0 {
        let loading = Paragraph::new(Span::styled("Loading posts...", Style::default().fg(theme.warning)))
            .alignment(Alignment::Center);
        frame.render_widget(loading, inner);
        return;
    }

    let count = app.feed.loader.post_count();
    if count == 0 {
        if app.feed.loader.error().is_some() {
            return;
        }
        let hint = if app.feed.loader.filter().is_some() {
            "No posts match this filter"
        } else {
            "No posts yet. Press 'n' to write the first one!"
        };
        let empty = Paragraph::new(vec![
            Line::from(""),
            Line::from(Span::styled(hint, Style::default().fg(theme.warning).add_modifier(Modifier::BOLD))),
        ])
        .alignment(Alignment::Center);
        frame.render_widget(empty, inner);
        return;
    }

    let width = inner.width.saturating_sub(4) as usize;
    let top = app.feed.viewport.top;
    let end = (top + app.feed.viewport.height).min(count);
    let now = Utc::now();

    let mut lines: Vec<Line> = Vec::new();
    {
        let posts = app.feed.loader.posts();
        for (index, post) in posts.iter().enumerate().take(end).skip(top) {
            let selected = index == app.feed.selected;
            let likes = app.feed.likes.state(post);
            let own = app.is_own_post(post);
            lines.extend(post_card(post, likes, selected, own, width, now, theme));
        }
    }

    if end == count {
        lines.push(sentinel_line(app, theme));
    }

    log_rendering!(app.log_config, "feed rows {}..{} of {}", top, end, count);

    frame.render_widget(Paragraph::new(lines), inner);
}

fn post_card(
    post: &Post,
    likes: LikeState,
    selected: bool,
    own: bool,
    width: usize,
    now: chrono::DateTime<Utc>,
    theme: &ThemeColors,
) -> Vec<Line<'static>> {
    let header_style = if selected {
        Style::default().fg(theme.success).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(theme.primary)
    };
    let prefix = if selected { "▶ " } else { "  " };

    let mut author = vec![
        Span::raw("  "),
        Span::styled(format!("@{}", post.author_username), Style::default().fg(theme.secondary)),
        Span::raw(" • "),
        Span::styled(format_relative_time(&post.created_at, now), Style::default().fg(theme.text_dim)),
    ];
    if own {
        author.push(Span::styled("  (you)", Style::default().fg(theme.text_dim)));
    }

    let preview = post.content.lines().next().unwrap_or_default();

    vec![
        Line::from(vec![
            Span::styled(prefix, header_style),
            Span::styled(truncate_chars(&post.title, width), header_style.add_modifier(Modifier::BOLD)),
        ]),
        Line::from(author),
        Line::from(vec![
            Span::raw("  "),
            Span::styled(truncate_chars(preview, width), Style::default().fg(theme.text)),
        ]),
        Line::from(vec![Span::raw("  "), like_span(likes, theme)]),
        Line::from(""),
    ]
}

fn like_span(likes: LikeState, theme: &ThemeColors) -> Span<'static> {
    if likes.liked {
        Span::styled(format!("♥ {}", likes.count), Style::default().fg(theme.like).add_modifier(Modifier::BOLD))
    } else {
        Span::styled(format!("♡ {}", likes.count), Style::default().fg(theme.text_dim))
    }
}

/// The row after the last post: a fetch marker while more pages exist
fn sentinel_line(app: &App, theme: &ThemeColors) -> Line<'static> {
    let loader = &app.feed.loader;
    let text = if loader.is_fetching_next_page() {
        "⟳ Loading more..."
    } else if loader.has_next_page() {
        "Scroll for more"
    } else {
        "─── No more posts ───"
    };
    Line::from(Span::styled(text, Style::default().fg(theme.text_dim).add_modifier(Modifier::DIM)))
        .alignment(Alignment::Center)
}

fn render_post_detail(frame: &mut Frame, app: &App, theme: &ThemeColors, area: Rect) {
    let post = match &app.feed.detail {
        Some(post) => post,
        None => return,
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" {} ", post.title))
        .border_style(Style::default().fg(theme.accent).add_modifier(Modifier::BOLD));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let likes = app.feed.likes.state(post);
    let mut lines = vec![
        Line::from(vec![
            Span::styled(format!("@{}", post.author_username), Style::default().fg(theme.secondary).add_modifier(Modifier::BOLD)),
            Span::raw(" • "),
            Span::styled(format_timestamp(&post.created_at), Style::default().fg(theme.text_dim)),
        ]),
    ];
    if post.updated_at != post.created_at {
        lines.push(Line::from(Span::styled(
            format!("edited {}", format_timestamp(&post.updated_at)),
            Style::default().fg(theme.text_dim).add_modifier(Modifier::ITALIC),
        )));
    }
    lines.push(Line::from(""));
    lines.extend(format_post_content(&post.content, theme, inner.width.saturating_sub(1) as usize));
    lines.push(Line::from(""));
    lines.push(Line::from(like_span(likes, theme)));

    let detail = Paragraph::new(lines).wrap(Wrap { trim: false });
    frame.render_widget(detail, inner);
}
