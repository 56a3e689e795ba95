pub mod pane_view;
pub mod status_bar;

use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::Style;
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use crate::app::App;
use crate::layout::geometry;

pub fn render(app: &App, frame: &mut Frame) {
    let [body, footer] = Layout::vertical([Constraint::Fill(1), Constraint::Length(1)]).areas(frame.area());

    render_layout(app, frame, body);
    status_bar::render(app, frame, footer);
}

fn render_layout(app: &App, frame: &mut Frame, area: Rect) {
    let tree = app.workspace.tree();
    let theme = &app.config.theme;
    let Some(root) = tree.root() else {
        let hint = Paragraph::new("no windows open; restart with --layout NAME to load a saved layout")
            .style(Style::default().fg(theme.border_inactive));
        frame.render_widget(hint, area);
        return;
    };

    for (id, rect) in geometry::resolve_layout(root, area) {
        if let Some(pane) = tree.pane(id) {
            let focused = tree.focused() == Some(id);
            pane_view::render_pane(pane, app.workspace.contents().get(id), focused, theme, frame, rect);
        }
    }

    // Highlight the divider under an active drag.
    if let Some(anchor) = app.dragging() {
        let thickness = app.config.behavior.divider_thickness;
        for divider in geometry::resolve_dividers(root, area, thickness) {
            if divider.anchor == anchor {
                frame
                    .buffer_mut()
                    .set_style(divider.rect, Style::default().bg(theme.divider));
            }
        }
    }
}
