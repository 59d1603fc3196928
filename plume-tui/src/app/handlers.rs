use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use std::time::Instant;

use crate::app::state::{ComposerField, Screen};
use crate::app::App;
use crate::log_key_event;

/// Work a key press asks for that has to go over the network
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    SubmitLogin,
    SubmitRegister,
    SubmitComposer,
    ConfirmDelete,
    OpenDetail,
}

/// Apply a key press to the app state. Returns the network action to run, if any.
pub fn handle_key_event(app: &mut App, key: KeyEvent) -> Result<Option<Action>> {
    if key.kind != KeyEventKind::Press {
        return Ok(None);
    }

    log_key_event!(app.log_config, "key={:?}, screen={:?}", key.code, app.screen);

    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.quit();
        return Ok(None);
    }

    match app.screen {
        Screen::Login => Ok(handle_login_keys(app, key)),
        Screen::Register => Ok(handle_register_keys(app, key)),
        Screen::Feed => Ok(handle_feed_keys(app, key)),
    }
}

fn handle_login_keys(app: &mut App, key: KeyEvent) -> Option<Action> {
    if app.login.loading {
        return None;
    }

    match key.code {
        KeyCode::Esc => app.quit(),
        KeyCode::Char('r') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.show_register();
        }
        KeyCode::Char('t') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.login.show_password = !app.login.show_password;
        }
        KeyCode::Tab | KeyCode::Down | KeyCode::Up | KeyCode::BackTab => app.login.next_field(),
        KeyCode::Enter => {
            if app.login.can_submit() {
                return Some(Action::SubmitLogin);
            }
        }
        KeyCode::Backspace => {
            app.login.focused_input().pop();
        }
        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.login.error = None;
            app.login.focused_input().push(c);
        }
        _ => {}
    }
    None
}

fn handle_register_keys(app: &mut App, key: KeyEvent) -> Option<Action> {
    if app.register.loading {
        return None;
    }

    match key.code {
        KeyCode::Esc => app.show_login(),
        KeyCode::Char('t') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.register.show_password = !app.register.show_password;
        }
        KeyCode::Tab | KeyCode::Down | KeyCode::Up | KeyCode::BackTab => app.register.next_field(),
        KeyCode::Enter => {
            if app.register.can_submit() {
                return Some(Action::SubmitRegister);
            }
        }
        KeyCode::Backspace => {
            app.register.focused_input().pop();
        }
        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
            let limit = app.register.focused_limit();
            let input = app.register.focused_input();
            if input.chars().count() < limit {
                input.push(c);
            }
        }
        _ => {}
    }
    None
}

fn handle_feed_keys(app: &mut App, key: KeyEvent) -> Option<Action> {
    // Priority 1: Help modal
    if app.show_help {
        if matches!(key.code, KeyCode::Esc | KeyCode::Char('?')) {
            app.toggle_help();
        }
        return None;
    }

    // Priority 2: Delete confirmation
    if app.feed.pending_delete.is_some() {
        return match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') => Some(Action::ConfirmDelete),
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                app.cancel_delete();
                None
            }
            _ => None,
        };
    }

    // Priority 3: Composer
    if app.composer.is_open() {
        return handle_composer_keys(app, key);
    }

    // Priority 4: Filter box
    if app.feed.filter_focused {
        handle_filter_keys(app, key);
        return None;
    }

    // Priority 5: Post detail
    if app.feed.detail.is_some() {
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') => app.close_detail(),
            KeyCode::Char('l') | KeyCode::Char(' ') => app.toggle_like(),
            KeyCode::Char('e') => app.open_composer_edit(),
            KeyCode::Char('d') => app.request_delete(),
            _ => {}
        }
        return None;
    }

    match key.code {
        KeyCode::Char('q') => app.quit(),
        KeyCode::Char('?') => app.toggle_help(),
        KeyCode::Char('j') | KeyCode::Down => app.feed.select_next(),
        KeyCode::Char('k') | KeyCode::Up => app.feed.select_previous(),
        KeyCode::Enter => {
            if app.feed.selected_post().is_some() {
                return Some(Action::OpenDetail);
            }
        }
        KeyCode::Char('l') | KeyCode::Char(' ') => app.toggle_like(),
        KeyCode::Char('n') => app.open_composer_new(),
        KeyCode::Char('e') => app.open_composer_edit(),
        KeyCode::Char('d') => app.request_delete(),
        KeyCode::Char('/') => app.feed.filter_focused = true,
        KeyCode::Char('r') => app.retry_feed(),
        KeyCode::Char('L') => app.logout(),
        _ => {}
    }
    None
}

fn handle_composer_keys(app: &mut App, key: KeyEvent) -> Option<Action> {
    if app.composer.submitting {
        return None;
    }

    match key.code {
        KeyCode::Esc => app.close_composer(),
        KeyCode::Tab | KeyCode::BackTab => app.composer.next_field(),
        KeyCode::Enter if app.composer.focus == ComposerField::Title => {
            app.composer.focus = ComposerField::Content;
        }
        // Alt+Enter breaks the line; plain Enter submits
        KeyCode::Enter if key.modifiers.contains(KeyModifiers::ALT) => {
            if app.composer.focused_has_room() {
                app.composer.content.insert_newline();
            }
        }
        KeyCode::Enter => return Some(Action::SubmitComposer),
        KeyCode::Char(_) if !app.composer.focused_has_room() => {}
        _ => {
            app.composer.focused_textarea().input(key);
        }
    }
    None
}

fn handle_filter_keys(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc | KeyCode::Enter | KeyCode::Tab => app.feed.filter_focused = false,
        KeyCode::Backspace => {
            if app.feed.filter_input.pop().is_some() {
                app.on_filter_input(Instant::now());
            }
        }
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            if !app.feed.filter_input.is_empty() {
                app.feed.filter_input.clear();
                app.on_filter_input(Instant::now());
            }
        }
        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.feed.filter_input.push(c);
            app.on_filter_input(Instant::now());
        }
        _ => {}
    }
}
