use ratatui::layout::Rect;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::content::{ContentCache, ContentError, ContentLoader, ContentRequest};
use crate::interaction::{DragSession, FocusDirection};
use crate::layout::{Axis, ContentDescriptor, DropSide, LayoutError, LayoutTree, NodeId, PaneId, SplitRequest};
use crate::session::SavedLayout;

const EVENT_CAPACITY: usize = 256;

/// Pane lifecycle notifications for content collaborators and views.
#[derive(Clone, Debug, PartialEq)]
pub enum PaneEvent {
    Created { pane: PaneId, content: ContentDescriptor },
    Closed { pane: PaneId },
    ContentChanged { pane: PaneId },
    FocusChanged { pane: Option<PaneId> },
}

/// A layout tree together with the content shown in its panes.
pub struct Workspace {
    pub name: String,
    tree: LayoutTree,
    contents: ContentCache,
    pending: Vec<ContentRequest>,
    events: broadcast::Sender<PaneEvent>,
}

impl Workspace {
    pub fn new(name: impl Into<String>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            name: name.into(),
            tree: LayoutTree::new(),
            contents: ContentCache::new(),
            pending: Vec::new(),
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PaneEvent> {
        self.events.subscribe()
    }

    pub fn tree(&self) -> &LayoutTree {
        &self.tree
    }

    pub fn contents(&self) -> &ContentCache {
        &self.contents
    }

    pub fn focused(&self) -> Option<PaneId> {
        self.tree.focused()
    }

    pub fn open_window(&mut self, content: ContentDescriptor) -> PaneId {
        let before = self.tree.focused();
        let pane = self.tree.open_window(content.clone());
        self.register(pane, content);
        self.focus_changed(before);
        pane
    }

    pub fn split_window(&self, axis: Axis) -> Option<SplitRequest> {
        self.tree.split_window(axis)
    }

    pub fn create_window_in_split(
        &mut self,
        request: &SplitRequest,
        content: ContentDescriptor,
    ) -> Result<PaneId, LayoutError> {
        let before = self.tree.focused();
        let pane = self.tree.create_window_in_split(request, content.clone())?;
        self.register(pane, content);
        self.focus_changed(before);
        Ok(pane)
    }

    /// Both split phases at once, copying the focused pane's descriptor.
    pub fn split_focused(&mut self, axis: Axis) -> Option<PaneId> {
        let request = self.tree.split_window(axis)?;
        let content = request.content.clone();
        match self.create_window_in_split(&request, content) {
            Ok(pane) => Some(pane),
            Err(e) => {
                warn!(error = %e, "split failed");
                None
            }
        }
    }

    pub fn close_window(&mut self, pane: PaneId) -> bool {
        let before = self.tree.focused();
        if !self.tree.close_window(pane) {
            return false;
        }
        self.contents.forget(pane);
        self.pending.retain(|r| r.pane != pane);
        self.emit(PaneEvent::Closed { pane });
        self.focus_changed(before);
        true
    }

    pub fn focus_window(&mut self, pane: PaneId) -> bool {
        let before = self.tree.focused();
        let focused = self.tree.focus_window(pane);
        self.focus_changed(before);
        focused
    }

    pub fn focus_directional(&mut self, direction: FocusDirection, area: Rect, alignment: f64) -> Option<PaneId> {
        let before = self.tree.focused();
        let target = self.tree.focus_directional(direction, area, alignment);
        self.focus_changed(before);
        target
    }

    pub fn move_window_to_position(&mut self, source: PaneId, target: PaneId, side: DropSide) -> bool {
        let before = self.tree.focused();
        let moved = self.tree.move_window_to_position(source, target, side);
        self.focus_changed(before);
        moved
    }

    pub fn resize_by_proportion(&mut self, node: NodeId, share: f64) -> bool {
        self.tree.resize_by_proportion(node, share)
    }

    pub fn update_drag(&mut self, drag: &DragSession, x: u16, y: u16) -> bool {
        drag.update(&mut self.tree, x, y)
    }

    pub fn equalize(&mut self) {
        self.tree.equalize();
    }

    pub fn snapshot(&self) -> SavedLayout {
        SavedLayout::capture(&self.tree, self.name.clone())
    }

    /// Replace the whole layout with a saved one. On error nothing changes.
    pub fn restore(&mut self, saved: SavedLayout) -> Result<(), LayoutError> {
        let restored = saved.restore()?;

        for pane in self.tree.pane_ids() {
            self.emit(PaneEvent::Closed { pane });
        }
        self.contents.clear();
        self.pending.clear();

        self.name = restored.name;
        self.tree = restored.tree;
        let panes: Vec<_> = self
            .tree
            .root()
            .map(|root| root.panes().into_iter().map(|p| (p.id, p.content.clone())).collect())
            .unwrap_or_default();
        for (pane, content) in panes {
            self.emit(PaneEvent::Created { pane, content });
        }
        for mut request in restored.content_requests {
            request.ticket = self.contents.begin(request.pane);
            self.pending.push(request);
        }
        self.emit(PaneEvent::FocusChanged {
            pane: self.tree.focused(),
        });
        debug!(workspace = %self.name, pending = self.pending.len(), "restored workspace");
        Ok(())
    }

    /// Record a finished load. Returns false if the pane is gone or the
    /// request was superseded by a later one.
    pub fn apply_content(&mut self, request: &ContentRequest, result: Result<String, ContentError>) -> bool {
        let pane = request.pane;
        if let Err(e) = &result {
            warn!(pane = %pane, error = %e, "content load failed");
        }
        let accepted = self.contents.complete(pane, request.ticket, result);
        if accepted {
            self.emit(PaneEvent::ContentChanged { pane });
        }
        accepted
    }

    pub fn take_pending(&mut self) -> Vec<ContentRequest> {
        std::mem::take(&mut self.pending)
    }

    /// Run every queued load against `loader` and store the results.
    pub async fn load_pending<L: ContentLoader>(&mut self, loader: &L) {
        for request in self.take_pending() {
            let result = loader.load(&request.filename).await;
            self.apply_content(&request, result);
        }
    }

    fn register(&mut self, pane: PaneId, content: ContentDescriptor) {
        if content.needs_load() {
            let ticket = self.contents.begin(pane);
            self.pending.push(ContentRequest {
                pane,
                filename: content.filename.clone(),
                ticket,
            });
        }
        self.emit(PaneEvent::Created { pane, content });
    }

    fn focus_changed(&self, before: Option<PaneId>) {
        let after = self.tree.focused();
        if after != before {
            self.emit(PaneEvent::FocusChanged { pane: after });
        }
    }

    fn emit(&self, event: PaneEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }
}
