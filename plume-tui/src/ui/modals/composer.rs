use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use super::super::formatting::format_counter;
use super::super::theme::{get_theme_colors, ThemeColors};
use super::utils::centered_rect;
use crate::app::{App, ComposerField, ComposerMode};
use crate::mutations::{CONTENT_MAX_CHARS, TITLE_MAX_CHARS};

/// Render the post composer (new post or edit)
pub fn render_composer_modal(frame: &mut Frame, app: &mut App, area: Rect) {
    let theme = get_theme_colors();

    let title = match app.composer.mode {
        Some(ComposerMode::NewPost) => "New Post",
        Some(ComposerMode::EditPost { .. }) => "Edit Post",
        None => return,
    };

    let modal_area = centered_rect(70, 80, area);
    frame.render_widget(Clear, modal_area);

    let outer_block = Block::default()
        .title(format!(" {} ", title))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.accent).add_modifier(Modifier::BOLD))
        .style(Style::default().bg(theme.background));

    let inner = outer_block.inner(modal_area);
    frame.render_widget(outer_block, modal_area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Title
            Constraint::Min(3),    // Content
            Constraint::Length(1), // Counters
            Constraint::Length(1), // Error / submitting
            Constraint::Length(3), // Instructions
        ])
        .split(inner);

    let composer = &app.composer;
    let title_focused = composer.focus == ComposerField::Title;

    let title_block = field_block("Title", title_focused, &theme);
    let title_inner = title_block.inner(chunks[0]);
    frame.render_widget(title_block, chunks[0]);
    frame.render_widget(&composer.title, title_inner);

    let content_block = field_block("Content", !title_focused, &theme);
    let content_inner = content_block.inner(chunks[1]);
    frame.render_widget(content_block, chunks[1]);
    frame.render_widget(&composer.content, content_inner);

    let counters = Line::from(vec![
        Span::styled("Title ", Style::default().fg(theme.text_dim)),
        Span::styled(
            format_counter(composer.title_chars(), TITLE_MAX_CHARS),
            counter_style(composer.title_chars(), TITLE_MAX_CHARS, &theme),
        ),
        Span::styled("   Content ", Style::default().fg(theme.text_dim)),
        Span::styled(
            format_counter(composer.content_chars(), CONTENT_MAX_CHARS),
            counter_style(composer.content_chars(), CONTENT_MAX_CHARS, &theme),
        ),
    ]);
    frame.render_widget(Paragraph::new(counters).alignment(Alignment::Center), chunks[2]);

    let status = if composer.submitting {
        Line::from(Span::styled("Saving...", Style::default().fg(theme.warning)))
    } else if let Some(error) = &composer.error {
        Line::from(Span::styled(error.text.clone(), Style::default().fg(theme.error)))
    } else {
        Line::from("")
    };
    frame.render_widget(Paragraph::new(status).alignment(Alignment::Center), chunks[3]);

    let instructions = Paragraph::new("Tab: Switch field | Enter: Submit | Alt+Enter: New line | Esc: Cancel")
        .style(Style::default().fg(theme.text))
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.border)),
        );
    frame.render_widget(instructions, chunks[4]);
}

fn field_block<'a>(label: &'a str, focused: bool, theme: &ThemeColors) -> Block<'a> {
    let color = if focused { theme.primary } else { theme.border };
    Block::default()
        .borders(Borders::ALL)
        .title(label)
        .border_style(Style::default().fg(color))
}

fn counter_style(count: usize, max: usize, theme: &ThemeColors) -> Style {
    if count >= max {
        Style::default().fg(theme.error).add_modifier(Modifier::BOLD)
    } else if count >= max * 9 / 10 {
        Style::default().fg(theme.warning)
    } else {
        Style::default().fg(theme.success)
    }
}
