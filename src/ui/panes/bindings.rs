//! Bindings pane: the names visible at the current step

use crate::snapshot::BindingView;
use crate::ui::theme::DEFAULT_THEME;
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph},
    Frame,
};

/// Render the bindings visible at the current step.
/// The title names the active function while inside one.
pub fn render_bindings_pane(
    frame: &mut Frame,
    area: Rect,
    bindings: &[BindingView],
    function: Option<&str>,
    call_depth: usize,
    is_focused: bool,
    scroll_offset: &mut usize,
) {
    let border_style = if is_focused {
        Style::default()
            .fg(DEFAULT_THEME.border_focused)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(DEFAULT_THEME.border_normal)
    };

    let block = Block::default()
        .title(bindings_title(function, call_depth))
        .borders(Borders::ALL)
        .border_style(border_style);

    if bindings.is_empty() {
        let paragraph = Paragraph::new("(nothing declared yet)")
            .block(block)
            .style(Style::default().fg(DEFAULT_THEME.comment));
        frame.render_widget(paragraph, area);
        return;
    }

    let visible_height = area.height.saturating_sub(2).max(1) as usize;
    *scroll_offset = (*scroll_offset).min(bindings.len().saturating_sub(visible_height));

    let items: Vec<ListItem> = bindings
        .iter()
        .skip(*scroll_offset)
        .take(visible_height)
        .map(|binding| {
            let keyword = if binding.is_mutable { "var " } else { "let " };
            ListItem::new(Line::from(vec![
                Span::styled(keyword, Style::default().fg(DEFAULT_THEME.keyword)),
                Span::styled(binding.name.clone(), Style::default().fg(DEFAULT_THEME.fg)),
                Span::styled(": ", Style::default().fg(DEFAULT_THEME.comment)),
                Span::styled(
                    binding.type_name.clone(),
                    Style::default().fg(DEFAULT_THEME.type_name),
                ),
                Span::styled(" = ", Style::default().fg(DEFAULT_THEME.comment)),
                Span::styled(binding.value.clone(), Style::default().fg(DEFAULT_THEME.number)),
            ]))
        })
        .collect();

    frame.render_widget(List::new(items).block(block), area);
}

fn bindings_title(function: Option<&str>, call_depth: usize) -> String {
    match function {
        Some(name) => format!(" Bindings (in {}, call depth {}) ", name, call_depth),
        None => " Bindings ".to_string(),
    }
}
