use ratatui::{
    layout::{Alignment, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use super::super::theme::get_theme_colors;
use super::utils::centered_rect;

type ShortcutGroup = (&'static str, Vec<(&'static str, &'static str)>);

/// Render help modal
pub fn render_help_modal(frame: &mut Frame, area: Rect) {
    let theme = get_theme_colors();

    let modal_area = centered_rect(80, 85, area);
    frame.render_widget(Clear, modal_area);

    let mut lines = vec![Line::from("")];

    for (category, items) in feed_shortcuts() {
        lines.push(Line::from(Span::styled(
            category,
            Style::default().fg(theme.accent).add_modifier(Modifier::BOLD),
        )));
        lines.push(Line::from(""));

        for (key, description) in items {
            lines.push(Line::from(vec![
                Span::styled(format!("  {:<15}", key), Style::default().fg(theme.success)),
                Span::styled(description, Style::default().fg(theme.text)),
            ]));
        }

        lines.push(Line::from(""));
    }

    let help_content = Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.accent).add_modifier(Modifier::BOLD))
                .title(" Keyboard Shortcuts ")
                .title_alignment(Alignment::Center)
                .style(Style::default().bg(theme.background)),
        )
        .wrap(Wrap { trim: false });

    frame.render_widget(help_content, modal_area);
}

fn feed_shortcuts() -> Vec<ShortcutGroup> {
    vec![
        (
            "Global",
            vec![("q", "Quit application"), ("?", "Toggle this help"), ("Shift+L", "Logout")],
        ),
        (
            "Feed",
            vec![
                ("↑/k", "Previous post"),
                ("↓/j", "Next post"),
                ("Enter", "Open post"),
                ("l / Space", "Like / unlike"),
                ("/", "Filter posts by title"),
                ("Ctrl+U", "Clear filter while typing"),
                ("r", "Retry after an error"),
            ],
        ),
        (
            "Your Posts",
            vec![("n", "New post"), ("e", "Edit selected post"), ("d", "Delete selected post")],
        ),
        (
            "Composer",
            vec![
                ("Tab", "Switch between title and content"),
                ("Enter", "Submit"),
                ("Alt+Enter", "New line in content"),
                ("Esc", "Cancel"),
            ],
        ),
    ]
}
