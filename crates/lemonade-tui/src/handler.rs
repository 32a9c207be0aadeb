use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};
use lemonade_core::SessionPhase;

use crate::app::{App, InputMode};
use crate::tui::AppEvent;

pub fn handle_event(app: &mut App, event: AppEvent) {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Mouse(mouse) => handle_mouse(app, mouse),
        AppEvent::Resize => app.scroll_chat_to_bottom(),
        AppEvent::Tick => app.tick_animation(),
    }
}

fn handle_key(app: &mut App, key: KeyEvent) {
    // Global keys that work in any mode
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }

    if app.show_address_input {
        handle_address_popup(app, key);
        return;
    }

    match app.phase() {
        SessionPhase::Connecting => handle_connecting(app, key),
        SessionPhase::Failed => handle_failed(app, key),
        SessionPhase::ChatReady | SessionPhase::Blocked => match app.input_mode {
            InputMode::Normal => handle_chat_normal(app, key),
            InputMode::Editing => handle_chat_editing(app, key),
        },
    }
}

fn handle_connecting(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => app.should_quit = true,
        KeyCode::Char('a') => app.open_address_input(),
        _ => {}
    }
}

/// The address field is always live on the failure screen
fn handle_failed(app: &mut App, key: KeyEvent) {
    if handle_address_shortcut(app, key) {
        return;
    }
    match key.code {
        KeyCode::Esc => app.should_quit = true,
        KeyCode::Enter => app.submit_address(),
        _ => edit_address_draft(app, key),
    }
}

fn handle_address_popup(app: &mut App, key: KeyEvent) {
    if handle_address_shortcut(app, key) {
        return;
    }
    match key.code {
        KeyCode::Esc => app.show_address_input = false,
        KeyCode::Enter => app.submit_address(),
        _ => edit_address_draft(app, key),
    }
}

/// Ctrl+R retries, Ctrl+L swaps localhost and 127.0.0.1
fn handle_address_shortcut(app: &mut App, key: KeyEvent) -> bool {
    if !key.modifiers.contains(KeyModifiers::CONTROL) {
        return false;
    }
    match key.code {
        KeyCode::Char('r') => app.retry(),
        KeyCode::Char('l') => app.session.toggle_loopback_host(),
        _ => return false,
    }
    true
}

fn edit_address_draft(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Backspace => {
            app.session.address_draft_mut().pop();
        }
        KeyCode::Char(c) => app.session.address_draft_mut().push(c),
        _ => {}
    }
}

fn handle_chat_normal(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') => app.should_quit = true,

        KeyCode::Char('i') | KeyCode::Enter => {
            if app.phase() == SessionPhase::ChatReady {
                app.input_mode = InputMode::Editing;
            }
        }
        KeyCode::Char('r') => app.reset(),
        KeyCode::Char('a') => app.open_address_input(),

        // Half-page scroll
        KeyCode::Char('d') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.scroll_down(app.half_page());
        }
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.scroll_up(app.half_page());
        }

        KeyCode::Char('j') | KeyCode::Down => app.scroll_down(1),
        KeyCode::Char('k') | KeyCode::Up => app.scroll_up(1),
        KeyCode::Char('g') => app.chat_scroll = 0,
        KeyCode::Char('G') => app.scroll_chat_to_bottom(),

        _ => {}
    }
}

fn handle_chat_editing(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.input_mode = InputMode::Normal,
        // Ignored while a reply is pending; the input is kept
        KeyCode::Enter => app.submit_chat(),
        KeyCode::Backspace => app.delete_char_before_cursor(),
        KeyCode::Delete => app.delete_char_at_cursor(),
        KeyCode::Left => app.move_cursor_left(),
        KeyCode::Right => app.move_cursor_right(),
        KeyCode::Home => app.move_cursor_home(),
        KeyCode::End => app.move_cursor_end(),
        KeyCode::Char(c) => app.insert_char(c),
        _ => {}
    }
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    match mouse.kind {
        MouseEventKind::ScrollDown => app.scroll_down(3),
        MouseEventKind::ScrollUp => app.scroll_up(3),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lemonade_core::Config;

    fn key(code: KeyCode) -> AppEvent {
        AppEvent::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn ctrl(c: char) -> AppEvent {
        AppEvent::Key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL))
    }

    fn unreachable_app() -> App {
        App::new(Config {
            server_address: "http://127.0.0.1:1".to_string(),
            ..Config::new()
        })
    }

    #[tokio::test]
    async fn test_ctrl_c_quits_from_any_screen() {
        let mut app = unreachable_app();
        handle_event(&mut app, ctrl('c'));
        assert!(app.should_quit);
    }

    #[tokio::test]
    async fn test_address_popup_edits_draft_and_cancels() {
        let mut app = unreachable_app();
        handle_event(&mut app, key(KeyCode::Char('a')));
        assert!(app.show_address_input);

        handle_event(&mut app, ctrl('l'));
        assert_eq!(app.session.address_draft(), "http://localhost:1");

        handle_event(&mut app, key(KeyCode::Backspace));
        handle_event(&mut app, key(KeyCode::Char('2')));
        assert_eq!(app.session.address_draft(), "http://localhost:2");

        handle_event(&mut app, key(KeyCode::Esc));
        assert!(!app.show_address_input);
        assert_eq!(app.session.address(), "http://127.0.0.1:1");
    }

    #[tokio::test]
    async fn test_address_popup_submit_reprobes() {
        let mut app = unreachable_app();
        handle_event(&mut app, key(KeyCode::Char('a')));
        handle_event(&mut app, key(KeyCode::Backspace));
        handle_event(&mut app, key(KeyCode::Char('9')));
        handle_event(&mut app, key(KeyCode::Enter));

        assert!(!app.show_address_input);
        assert_eq!(app.session.address(), "http://127.0.0.1:9");
        assert_eq!(app.phase(), SessionPhase::Connecting);
    }

    #[tokio::test]
    async fn test_cursor_editing_is_utf8_safe() {
        let mut app = unreachable_app();
        for c in "héy".chars() {
            app.insert_char(c);
        }
        app.move_cursor_left();
        app.delete_char_before_cursor();
        assert_eq!(app.chat_input, "hy");
        assert_eq!(app.chat_cursor, 1);

        app.move_cursor_end();
        app.insert_char('!');
        assert_eq!(app.chat_input, "hy!");
    }
}
