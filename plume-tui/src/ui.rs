// UI module - split into cohesive submodules for maintainability
pub mod theme;
pub mod formatting;
mod screens;
mod modals;

// Re-export main render function
pub use self::render_main::render;

// Main render logic
mod render_main {
    use ratatui::{
        layout::Alignment,
        style::{Modifier, Style},
        text::{Line, Span},
        widgets::{Block, Borders, Clear, Paragraph},
        Frame,
    };

    use super::modals::{render_composer_modal, render_delete_confirmation_modal, render_help_modal};
    use super::screens::{render_feed_screen, render_login_screen, render_register_screen};
    use super::theme::get_theme_colors;
    use crate::app::{App, Screen};
    use crate::log_rendering;

    /// Render the UI
    pub fn render(app: &mut App, frame: &mut Frame) {
        let area = frame.area();
        let theme = get_theme_colors();

        frame.render_widget(Clear, area);
        let background = Block::default().style(Style::default().bg(theme.background));
        frame.render_widget(background, area);

        const MIN_WIDTH: u16 = 50;
        const MIN_HEIGHT: u16 = 16;

        if area.width < MIN_WIDTH || area.height < MIN_HEIGHT {
            let warning = Paragraph::new(vec![
                Line::from(""),
                Line::from(Span::styled(
                    "Terminal Too Small",
                    Style::default().fg(theme.error).add_modifier(Modifier::BOLD),
                )),
                Line::from(""),
                Line::from(Span::styled(
                    format!("Minimum size: {}x{}", MIN_WIDTH, MIN_HEIGHT),
                    Style::default().fg(theme.text),
                )),
                Line::from(Span::styled(
                    format!("Current size: {}x{}", area.width, area.height),
                    Style::default().fg(theme.warning),
                )),
            ])
            .alignment(Alignment::Center)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(theme.error)),
            );

            frame.render_widget(warning, area);
            return;
        }

        log_rendering!(app.log_config, "render screen={:?} size={}x{}", app.screen, area.width, area.height);

        match app.screen {
            Screen::Login => render_login_screen(frame, app, area),
            Screen::Register => render_register_screen(frame, app, area),
            Screen::Feed => {
                render_feed_screen(frame, app, area);

                if app.composer.is_open() {
                    render_composer_modal(frame, app, area);
                }
                if app.feed.pending_delete.is_some() {
                    render_delete_confirmation_modal(frame, app, area);
                }
                if app.show_help {
                    render_help_modal(frame, area);
                }
            }
        }
    }
}
