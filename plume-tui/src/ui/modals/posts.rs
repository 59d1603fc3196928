use ratatui::{
    layout::{Alignment, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use super::super::formatting::truncate_chars;
use super::super::theme::get_theme_colors;
use super::utils::centered_rect;
use crate::app::App;

/// Render the delete confirmation for the post held in `pending_delete`
pub fn render_delete_confirmation_modal(frame: &mut Frame, app: &mut App, area: Rect) {
    let theme = get_theme_colors();

    let pending = match &app.feed.pending_delete {
        Some(pending) => pending,
        None => return,
    };

    let modal_area = centered_rect(50, 35, area);
    frame.render_widget(Clear, modal_area);

    let title_width = modal_area.width.saturating_sub(6) as usize;
    let content = vec![
        Line::from(""),
        Line::from(Span::styled(
            "Are you sure you want to delete this post?",
            Style::default().fg(theme.text),
        )),
        Line::from(""),
        Line::from(Span::styled(
            truncate_chars(pending.title(), title_width),
            Style::default().fg(theme.primary).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled(
            "This action cannot be undone.",
            Style::default().fg(theme.text_dim),
        )),
        Line::from(""),
        Line::from("─".repeat(title_width.min(46))).style(Style::default().fg(theme.border)),
        Line::from(""),
        Line::from(vec![
            Span::styled("Y", Style::default().fg(theme.error).add_modifier(Modifier::BOLD)),
            Span::styled(": Delete  ", Style::default().fg(theme.text)),
            Span::styled("N", Style::default().fg(theme.success).add_modifier(Modifier::BOLD)),
            Span::styled(": Cancel  ", Style::default().fg(theme.text)),
            Span::styled("Esc", Style::default().fg(theme.accent).add_modifier(Modifier::BOLD)),
            Span::styled(": Cancel", Style::default().fg(theme.text)),
        ]),
    ];

    let modal = Paragraph::new(content)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: false })
        .block(
            Block::default()
                .title(" Delete Post ")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.warning).add_modifier(Modifier::BOLD))
                .style(Style::default().bg(theme.background)),
        );

    frame.render_widget(modal, modal_area);
}
