use std::path::PathBuf;
use std::sync::Arc;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::layout::Rect;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::config::Config;
use crate::content::{ContentLoader, FsContentLoader};
use crate::event::AppEvent;
use crate::interaction::{DragSession, FocusDirection};
use crate::layout::{geometry, Axis, NodeId};
use crate::session::store;
use crate::tui::Tui;
use crate::workspace::Workspace;

pub struct App {
    pub workspace: Workspace,
    pub config: Config,
    /// Message shown in the status bar until the next action.
    pub status: Option<String>,
    pub should_quit: bool,
    loader: Arc<FsContentLoader>,
    layouts_dir: PathBuf,
    event_tx: mpsc::UnboundedSender<AppEvent>,
    drag: Option<DragSession>,
    screen: Rect,
}

impl App {
    pub fn new(
        workspace: Workspace,
        config: Config,
        loader: FsContentLoader,
        layouts_dir: PathBuf,
        event_tx: mpsc::UnboundedSender<AppEvent>,
    ) -> Self {
        Self {
            workspace,
            config,
            status: None,
            should_quit: false,
            loader: Arc::new(loader),
            layouts_dir,
            event_tx,
            drag: None,
            screen: Rect::default(),
        }
    }

    /// The part of the screen the layout occupies; the last row is the status bar.
    pub fn body_area(screen: Rect) -> Rect {
        Rect::new(screen.x, screen.y, screen.width, screen.height.saturating_sub(1))
    }

    pub fn body(&self) -> Rect {
        Self::body_area(self.screen)
    }

    pub fn set_screen(&mut self, screen: Rect) {
        self.screen = screen;
    }

    /// The split being resized, if a drag is in progress.
    pub fn dragging(&self) -> Option<NodeId> {
        self.drag.as_ref().map(DragSession::anchor)
    }

    pub fn on_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::Key(key) => self.handle_key(key),
            AppEvent::MouseDown { x, y } => self.handle_mouse_down(x, y),
            AppEvent::MouseDrag { x, y } => self.handle_mouse_drag(x, y),
            AppEvent::MouseUp => self.handle_mouse_up(),
            AppEvent::Resize(w, h) => self.set_screen(Rect::new(0, 0, w, h)),
            AppEvent::ContentLoaded { request, result } => {
                self.workspace.apply_content(&request, result);
            }
        }
        self.spawn_loads();
    }

    fn handle_key(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return;
        }
        self.status = None;
        let body = self.body();
        let tolerance = self.config.behavior.focus_tolerance;

        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('h') | KeyCode::Left => self.focus(FocusDirection::Left, body, tolerance),
            KeyCode::Char('l') | KeyCode::Right => self.focus(FocusDirection::Right, body, tolerance),
            KeyCode::Char('k') | KeyCode::Up => self.focus(FocusDirection::Up, body, tolerance),
            KeyCode::Char('j') | KeyCode::Down => self.focus(FocusDirection::Down, body, tolerance),
            KeyCode::Char('s') => self.split(Axis::Row),
            KeyCode::Char('v') => self.split(Axis::Column),
            KeyCode::Char('x') => {
                if let Some(focused) = self.workspace.focused() {
                    self.workspace.close_window(focused);
                }
            }
            KeyCode::Char('=') => self.workspace.equalize(),
            KeyCode::Char('w') => self.save_layout(),
            _ => {}
        }
    }

    fn focus(&mut self, direction: FocusDirection, body: Rect, tolerance: f64) {
        self.workspace.focus_directional(direction, body, tolerance);
    }

    fn split(&mut self, axis: Axis) {
        if self.workspace.split_focused(axis).is_none() {
            self.status = Some("nothing to split".to_string());
        }
    }

    fn save_layout(&mut self) {
        let layout = self.workspace.snapshot();
        let saved = store::layout_file(&self.layouts_dir, &layout.name)
            .and_then(|path| store::save_to(&layout, &path).map(|()| path));
        self.status = Some(match saved {
            Ok(path) => format!("saved {}", path.display()),
            Err(e) => {
                warn!(error = %e, "failed to save layout");
                format!("save failed: {e}")
            }
        });
    }

    fn handle_mouse_down(&mut self, x: u16, y: u16) {
        let body = self.body();
        let Some(root) = self.workspace.tree().root() else {
            return;
        };

        let thickness = self.config.behavior.divider_thickness;
        if let Some(divider) = geometry::hit_test_divider(root, body, x, y, thickness) {
            self.drag = DragSession::begin(self.workspace.tree(), &divider, x, y);
            return;
        }
        if let Some(pane) = geometry::pane_at(root, body, x, y) {
            self.workspace.focus_window(pane);
        }
    }

    fn handle_mouse_drag(&mut self, x: u16, y: u16) {
        if let Some(drag) = &self.drag {
            self.workspace.update_drag(drag, x, y);
        }
    }

    fn handle_mouse_up(&mut self) {
        if let Some(drag) = self.drag.take() {
            let anchor = drag.end();
            debug!(anchor = %anchor, "resize finished");
        }
    }

    /// Start a background load for every document pane that needs one.
    fn spawn_loads(&mut self) {
        for request in self.workspace.take_pending() {
            let loader = Arc::clone(&self.loader);
            let tx = self.event_tx.clone();
            tokio::spawn(async move {
                let result = loader.load(&request.filename).await;
                let _ = tx.send(AppEvent::ContentLoaded { request, result });
            });
        }
    }
}

/// Draw and dispatch events until the user quits.
pub async fn run(mut app: App, mut tui: Tui, mut events: mpsc::UnboundedReceiver<AppEvent>) -> anyhow::Result<()> {
    app.set_screen(tui.area()?);
    app.spawn_loads();
    loop {
        tui.draw(|frame| crate::ui::render(&app, frame))?;
        let Some(event) = events.recv().await else {
            break;
        };
        app.on_event(event);
        if app.should_quit {
            break;
        }
    }
    Ok(())
}
