use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::Line,
    widgets::{Block, BorderType, Borders, Paragraph, Wrap},
    Frame,
};
use unicode_width::UnicodeWidthStr;

use crate::config::Theme;
use crate::content::ContentState;
use crate::layout::{ContentKind, Pane};

pub fn render_pane(
    pane: &Pane,
    state: Option<&ContentState>,
    is_focused: bool,
    theme: &Theme,
    frame: &mut Frame,
    area: Rect,
) {
    let border_style = if is_focused {
        Style::default().fg(theme.border_active)
    } else {
        Style::default().fg(theme.border_inactive)
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(border_style)
        .title(title(pane, area.width.saturating_sub(4) as usize));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    if inner.width <= 2 || inner.height == 0 {
        return;
    }

    // 1-cell padding on left and right
    let padded = Rect::new(inner.x + 1, inner.y, inner.width - 2, inner.height);
    frame.render_widget(body(pane, state), padded);
}

fn title(pane: &Pane, max_width: usize) -> String {
    let kind = match pane.content.kind {
        ContentKind::Document => "doc",
        ContentKind::Terminal => "term",
    };
    let name = if pane.content.filename.is_empty() {
        "untitled"
    } else {
        pane.content.filename.as_str()
    };
    let full = format!(" {kind}: {name} ");
    if full.width() <= max_width {
        return full;
    }
    let mut truncated = String::new();
    for c in full.chars() {
        if truncated.width() + 2 > max_width {
            break;
        }
        truncated.push(c);
    }
    truncated.push('…');
    truncated
}

fn body<'a>(pane: &Pane, state: Option<&'a ContentState>) -> Paragraph<'a> {
    let dim = Style::default().fg(Color::DarkGray);
    match (pane.content.kind, state) {
        (_, Some(ContentState::Ready(text))) => Paragraph::new(text.as_str()).wrap(Wrap { trim: false }),
        (_, Some(ContentState::Loading)) => Paragraph::new(Line::styled("loading…", dim)),
        (_, Some(ContentState::Failed(msg))) => Paragraph::new(Line::styled(
            msg.as_str(),
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        ))
        .wrap(Wrap { trim: true }),
        (ContentKind::Terminal, None) => Paragraph::new(Line::styled(format!("terminal session {}", pane.id), dim)),
        (ContentKind::Document, None) => Paragraph::new(Line::styled("not loaded", dim)),
    }
}
