use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};
use ratatui::layout::Rect;

use lucosms_core::{navigate_to_section, SectionId};

use crate::app::{App, InputMode};
use crate::tui::AppEvent;

const WHEEL_STEP: i32 = 3;

pub async fn handle_event(app: &mut App, event: AppEvent) -> Result<()> {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Mouse(mouse) => handle_mouse(app, mouse),
        AppEvent::Resize => {}
        AppEvent::Tick => app.tick(),
    }

    app.poll_exchange().await;
    Ok(())
}

fn handle_key(app: &mut App, key: KeyEvent) {
    // Global keys that work in any mode
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }

    match app.input_mode {
        InputMode::Normal => handle_normal_mode(app, key),
        InputMode::Editing => handle_editing_mode(app, key),
    }
}

fn handle_normal_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') => app.should_quit = true,

        // Chat widget
        KeyCode::Char('c') | KeyCode::Tab => {
            if app.chat_open {
                app.close_chat();
            } else {
                app.open_chat();
            }
        }
        KeyCode::Char('i') | KeyCode::Enter if app.chat_open => {
            app.input_mode = InputMode::Editing;
        }
        KeyCode::Esc => app.close_chat(),
        KeyCode::Char('J') => app.scroll_chat(1),
        KeyCode::Char('K') => app.scroll_chat(-1),

        // Page scrolling
        KeyCode::Char('j') | KeyCode::Down => app.scroll_page(1),
        KeyCode::Char('k') | KeyCode::Up => app.scroll_page(-1),
        KeyCode::PageDown | KeyCode::Char(' ') => app.page_down(),
        KeyCode::PageUp => app.page_up(),
        KeyCode::Char('g') | KeyCode::Home => app.page.lock().scroll_to_top(),
        KeyCode::Char('G') | KeyCode::End => app.page.lock().scroll_to_bottom(),

        // Nav bar links: 1-6 jump to sections the same way the assistant does
        KeyCode::Char(c @ '1'..='6') => {
            let index = c as usize - '1' as usize;
            if let Some(section) = SectionId::all().get(index) {
                navigate_to_section(&mut app.page, section.as_str());
            }
        }

        _ => {}
    }
}

fn handle_editing_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.input_mode = InputMode::Normal,
        KeyCode::Enter => app.submit_chat(),
        KeyCode::Backspace => app.backspace(),
        KeyCode::Delete => app.delete(),
        KeyCode::Left => app.cursor_left(),
        KeyCode::Right => app.cursor_right(),
        KeyCode::Home => app.cursor_home(),
        KeyCode::End => app.cursor_end(),
        KeyCode::Up => app.scroll_chat(-1),
        KeyCode::Down => app.scroll_chat(1),
        KeyCode::Char(c) => app.insert_char(c),
        _ => {}
    }
}

/// Check if a point is within a rectangle
fn point_in_rect(x: u16, y: u16, rect: Rect) -> bool {
    x >= rect.x && x < rect.x + rect.width && y >= rect.y && y < rect.y + rect.height
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    let in_chat = app.chat_open
        && app
            .chat_area
            .map(|r| point_in_rect(mouse.column, mouse.row, r))
            .unwrap_or(false);

    let delta = match mouse.kind {
        MouseEventKind::ScrollDown => WHEEL_STEP,
        MouseEventKind::ScrollUp => -WHEEL_STEP,
        _ => return,
    };

    if in_chat {
        app.scroll_chat(delta);
    } else if app
        .page_area
        .map(|r| point_in_rect(mouse.column, mouse.row, r))
        .unwrap_or(true)
    {
        app.scroll_page(delta);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyEventState;
    use lucosms_core::Config;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent {
            code,
            modifiers: KeyModifiers::NONE,
            kind: crossterm::event::KeyEventKind::Press,
            state: KeyEventState::NONE,
        }
    }

    fn app() -> App {
        let mut app = App::new(Config::default());
        app.assistant = None;
        app.page.lock().set_viewport_height(10);
        app
    }

    #[test]
    fn test_toggle_chat_enters_editing() {
        let mut app = app();
        handle_key(&mut app, key(KeyCode::Char('c')));
        assert!(app.chat_open);
        assert_eq!(app.input_mode, InputMode::Editing);

        // 'c' is text while editing
        handle_key(&mut app, key(KeyCode::Char('c')));
        assert_eq!(app.chat_input, "c");

        handle_key(&mut app, key(KeyCode::Esc));
        assert_eq!(app.input_mode, InputMode::Normal);
        handle_key(&mut app, key(KeyCode::Esc));
        assert!(!app.chat_open);
    }

    #[test]
    fn test_number_keys_smooth_scroll_to_section() {
        let mut app = app();
        // '4' is pricing
        handle_key(&mut app, key(KeyCode::Char('4')));
        assert!(app.page.lock().is_animating());

        for _ in 0..100 {
            app.tick();
        }
        let page = app.page.lock();
        assert_eq!(page.current_section(), Some(SectionId::Pricing));
    }

    #[test]
    fn test_ctrl_c_quits_from_editing() {
        let mut app = app();
        app.open_chat();
        handle_key(
            &mut app,
            KeyEvent {
                modifiers: KeyModifiers::CONTROL,
                ..key(KeyCode::Char('c'))
            },
        );
        assert!(app.should_quit);
    }
}
