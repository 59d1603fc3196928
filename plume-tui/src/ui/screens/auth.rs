use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use crate::app::{App, LoginField, MessageKind, RegisterField, StatusMessage};
use crate::auth::{LOGIN_TITLE, REGISTER_TITLE};
use crate::ui::theme::{get_theme_colors, ThemeColors};

const LOGO_LINES: &[&str] = &[
    "  ____  _                       ",
    " |  _ \\| |_   _ _ __ ___   ___  ",
    " | |_) | | | | | '_ ` _ \\ / _ \\ ",
    " |  __/| | |_| | | | | | |  __/ ",
    " |_|   |_|\\__,_|_| |_| |_|\\___| ",
];

pub fn render_login_screen(frame: &mut Frame, app: &mut App, area: Rect) {
    let theme = get_theme_colors();
    let chunks = auth_layout(area);

    render_header(frame, app, &theme, chunks[0]);

    let form = &app.login;
    let mut lines = logo_lines(&theme);

    // A fresh registration notice takes the title's place
    lines.push(title_line(LOGIN_TITLE, form.notice.as_ref(), &theme));
    lines.push(Line::from(""));

    lines.push(field_line("Email", &form.email, form.focus == LoginField::Email, &theme));
    lines.push(Line::from(""));
    let password = masked(&form.password, form.show_password);
    lines.push(field_line("Password", &password, form.focus == LoginField::Password, &theme));
    lines.push(Line::from(""));

    if form.loading {
        lines.push(Line::from(Span::styled("Signing in...", Style::default().fg(theme.warning))));
    } else if let Some(error) = &form.error {
        lines.push(Line::from(Span::styled(error.clone(), Style::default().fg(theme.error))));
    }

    render_form(frame, lines, &theme, chunks[1]);
    render_footer(
        frame,
        "Tab: Next field | Enter: Login | Ctrl+T: Show password | Ctrl+R: Register | Esc: Quit",
        &theme,
        chunks[2],
    );
}

pub fn render_register_screen(frame: &mut Frame, app: &mut App, area: Rect) {
    let theme = get_theme_colors();
    let chunks = auth_layout(area);

    render_header(frame, app, &theme, chunks[0]);

    let form = &app.register;
    let mut lines = logo_lines(&theme);

    lines.push(title_line(REGISTER_TITLE, form.message.as_ref(), &theme));
    lines.push(Line::from(""));

    lines.push(field_line(
        "Username",
        &form.username,
        form.focus == RegisterField::Username,
        &theme,
    ));
    lines.push(Line::from(""));
    lines.push(field_line("Email", &form.email, form.focus == RegisterField::Email, &theme));
    lines.push(Line::from(""));
    let password = masked(&form.password, form.show_password);
    lines.push(field_line(
        "Password",
        &password,
        form.focus == RegisterField::Password,
        &theme,
    ));
    lines.push(Line::from(""));

    if form.loading {
        lines.push(Line::from(Span::styled("Creating account...", Style::default().fg(theme.warning))));
    } else {
        lines.push(Line::from(Span::styled(
            "Username 3-20 characters, password 8-20 characters",
            Style::default().fg(theme.text_dim),
        )));
    }

    render_form(frame, lines, &theme, chunks[1]);
    render_footer(
        frame,
        "Tab: Next field | Enter: Register | Ctrl+T: Show password | Esc: Back to login",
        &theme,
        chunks[2],
    );
}

fn auth_layout(area: Rect) -> std::rc::Rc<[Rect]> {
    Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(3),
        ])
        .split(area)
}

fn render_header(frame: &mut Frame, app: &App, theme: &ThemeColors, area: Rect) {
    let header = Paragraph::new(Line::from(vec![
        Span::styled("Plume", Style::default().fg(theme.text).add_modifier(Modifier::BOLD)),
        Span::styled(format!("  {}", app.server_url()), Style::default().fg(theme.text_dim)),
    ]))
    .alignment(Alignment::Center)
    .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(theme.border)));
    frame.render_widget(header, area);
}

fn render_form(frame: &mut Frame, lines: Vec<Line<'static>>, theme: &ThemeColors, area: Rect) {
    let form = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: false })
        .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(theme.border)));
    frame.render_widget(form, area);
}

fn render_footer(frame: &mut Frame, text: &'static str, theme: &ThemeColors, area: Rect) {
    let footer = Paragraph::new(text)
        .style(Style::default().fg(theme.text_dim))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(theme.border)));
    frame.render_widget(footer, area);
}

fn logo_lines(theme: &ThemeColors) -> Vec<Line<'static>> {
    let mut lines = vec![Line::from("")];
    for logo_line in LOGO_LINES {
        lines.push(Line::from(Span::styled(
            *logo_line,
            Style::default().fg(theme.primary).add_modifier(Modifier::BOLD),
        )));
    }
    lines.push(Line::from(""));
    lines
}

fn title_line(title: &'static str, message: Option<&StatusMessage>, theme: &ThemeColors) -> Line<'static> {
    match message {
        Some(message) => {
            let color = match message.kind {
                MessageKind::Success => theme.success,
                MessageKind::Error => theme.error,
            };
            Line::from(Span::styled(
                message.text.clone(),
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            ))
        }
        None => Line::from(Span::styled(
            title,
            Style::default().fg(theme.text).add_modifier(Modifier::BOLD),
        )),
    }
}

fn field_line(label: &'static str, value: &str, focused: bool, theme: &ThemeColors) -> Line<'static> {
    let (marker, value_style) = if focused {
        ("▶ ", Style::default().fg(theme.primary).add_modifier(Modifier::BOLD))
    } else {
        ("  ", Style::default().fg(theme.text))
    };
    let cursor = if focused { "█" } else { "" };

    Line::from(vec![
        Span::styled(marker, value_style),
        Span::styled(format!("{:<10}", label), Style::default().fg(theme.text_dim)),
        Span::styled(format!("{}{}", value, cursor), value_style),
    ])
}

fn masked(password: &str, show: bool) -> String {
    if show {
        password.to_string()
    } else {
        "•".repeat(password.chars().count())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_is_masked_per_character() {
        assert_eq!(masked("pässword", false), "••••••••");
        assert_eq!(masked("secret", true), "secret");
    }
}
