use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};
use unicode_width::UnicodeWidthStr;

use crate::app::App;

const HINTS: &str = "hjkl focus  s/v split  x close  = equalize  w save  q quit ";

pub fn render(app: &App, frame: &mut Frame, area: Rect) {
    let left = build_left(app);
    let right = if app.dragging().is_some() {
        "resizing… "
    } else {
        HINTS
    };

    let padding = (area.width as usize).saturating_sub(left.width() + right.width());
    let line = Line::from(vec![
        Span::styled(
            left,
            Style::default()
                .fg(app.config.theme.accent)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(" ".repeat(padding)),
        Span::styled(right, Style::default().fg(Color::DarkGray)),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

fn build_left(app: &App) -> String {
    if let Some(status) = &app.status {
        return format!(" {status} ");
    }
    let tree = app.workspace.tree();
    let panes = tree.pane_ids().len();
    let focused = tree
        .focused_pane()
        .map(|p| p.content.filename.as_str())
        .unwrap_or("");
    format!(" {} │ {panes} windows │ {focused} ", app.workspace.name)
}
