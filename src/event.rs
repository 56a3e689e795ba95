use crossterm::event::{Event, EventStream, KeyEvent, KeyEventKind, MouseButton, MouseEventKind};
use futures::StreamExt;
use tokio::sync::mpsc;

use crate::content::{ContentError, ContentRequest};

#[derive(Debug)]
pub enum AppEvent {
    Key(KeyEvent),
    MouseDown { x: u16, y: u16 },
    MouseDrag { x: u16, y: u16 },
    MouseUp,
    Resize(u16, u16),
    ContentLoaded {
        request: ContentRequest,
        result: Result<String, ContentError>,
    },
}

/// Map a raw terminal event to an app event, dropping the ones the preview ignores.
pub fn translate(event: Event) -> Option<AppEvent> {
    match event {
        Event::Key(key) if key.kind == KeyEventKind::Press => Some(AppEvent::Key(key)),
        Event::Mouse(m) => match m.kind {
            MouseEventKind::Down(MouseButton::Left) => Some(AppEvent::MouseDown { x: m.column, y: m.row }),
            MouseEventKind::Drag(MouseButton::Left) => Some(AppEvent::MouseDrag { x: m.column, y: m.row }),
            MouseEventKind::Up(_) => Some(AppEvent::MouseUp),
            _ => None,
        },
        Event::Resize(w, h) => Some(AppEvent::Resize(w, h)),
        _ => None,
    }
}

pub fn start_event_loop(event_tx: mpsc::UnboundedSender<AppEvent>) {
    tokio::spawn(async move {
        let mut reader = EventStream::new();
        while let Some(Ok(event)) = reader.next().await {
            let Some(app_event) = translate(event) else {
                continue;
            };
            if event_tx.send(app_event).is_err() {
                break;
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyCode, KeyModifiers, MouseEvent};

    fn mouse(kind: MouseEventKind, column: u16, row: u16) -> Event {
        Event::Mouse(MouseEvent {
            kind,
            column,
            row,
            modifiers: KeyModifiers::NONE,
        })
    }

    #[test]
    fn test_translate_mouse() {
        assert!(matches!(
            translate(mouse(MouseEventKind::Down(MouseButton::Left), 4, 7)),
            Some(AppEvent::MouseDown { x: 4, y: 7 })
        ));
        assert!(matches!(
            translate(mouse(MouseEventKind::Drag(MouseButton::Left), 5, 7)),
            Some(AppEvent::MouseDrag { x: 5, y: 7 })
        ));
        assert!(matches!(
            translate(mouse(MouseEventKind::Up(MouseButton::Left), 5, 7)),
            Some(AppEvent::MouseUp)
        ));
        assert!(translate(mouse(MouseEventKind::Moved, 1, 1)).is_none());
    }

    #[test]
    fn test_translate_key_press_only() {
        let press = KeyEvent::new(KeyCode::Char('q'), KeyModifiers::NONE);
        assert!(matches!(translate(Event::Key(press)), Some(AppEvent::Key(_))));

        let release = KeyEvent::new_with_kind(KeyCode::Char('q'), KeyModifiers::NONE, KeyEventKind::Release);
        assert!(translate(Event::Key(release)).is_none());
    }
}
