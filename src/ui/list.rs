use super::{Palette, filters, notice};
use crate::app::App;
use crate::present;
use crate::state::LoadState;
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

pub fn render(app: &App, palette: &Palette, frame: &mut Frame) {
    let area = frame.area();

    // Layout: header(3) + filters(4) + list(min) + status(1)
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(4),
            Constraint::Min(5),
            Constraint::Length(1),
        ])
        .split(area);

    // ── Header ──
    let total = app.catalog.state.ready().map_or(0, |c| c.movies.len());
    let header_text = format!(
        " Movie Explorer   [{} of {} popular movies]",
        app.catalog.displayed.len(),
        total
    );
    let header = Paragraph::new(header_text)
        .style(
            Style::default()
                .fg(palette.accent)
                .add_modifier(Modifier::BOLD),
        )
        .alignment(Alignment::Left)
        .block(
            Block::default()
                .borders(Borders::BOTTOM)
                .border_style(palette.muted()),
        );
    frame.render_widget(header, chunks[0]);

    // ── Filter bar ──
    filters::render(app, palette, frame, chunks[1]);

    // ── List ──
    match &app.catalog.state {
        LoadState::Idle | LoadState::Loading => {
            notice::loading(frame, chunks[2], palette, "Loading popular movies…");
        }
        LoadState::Failed(message) => {
            notice::failed(frame, chunks[2], palette, message);
        }
        LoadState::Ready(_) if app.catalog.displayed.is_empty() => {
            notice::empty(frame, chunks[2], palette, present::EMPTY_CATALOG);
        }
        LoadState::Ready(_) => {
            let width = area.width as usize;
            let items: Vec<ListItem> = app
                .page()
                .iter()
                .map(|movie| {
                    let year = present::year_of(&movie.release_date)
                        .map(|y| y.to_string())
                        .unwrap_or_else(|| "----".to_string());
                    // highlight(2) + borders(2) + rating(7) + year(6)
                    let room = width.saturating_sub(17);
                    let title = truncate_str(&movie.title, room);
                    let preview_room = room.saturating_sub(title.width() + 3);
                    let preview = movie.overview.lines().next().unwrap_or("").trim();

                    let mut spans = vec![
                        Span::styled(
                            format!("{:<7}", present::rating(movie.vote_average)),
                            Style::default().fg(palette.rating),
                        ),
                        Span::styled(format!("{:<6}", year), palette.muted()),
                        Span::styled(title, Style::default().add_modifier(Modifier::BOLD)),
                    ];
                    if preview_room > 8 && !preview.is_empty() {
                        spans.push(Span::styled(
                            format!("   {}", truncate_str(preview, preview_room)),
                            palette.muted(),
                        ));
                    }
                    ListItem::new(Line::from(spans))
                })
                .collect();

            let page_info = format!(
                " {}-{} of {} ",
                app.catalog.list_offset + 1,
                app.catalog.list_offset + app.page().len(),
                app.catalog.displayed.len()
            );

            let list_widget = List::new(items)
                .block(
                    Block::default()
                        .borders(Borders::ALL)
                        .border_style(palette.muted())
                        .title(format!(
                            " {} · {} {} ",
                            app.genre_label(),
                            app.catalog.sort_key.label(),
                            app.catalog.direction.arrow()
                        ))
                        .title_bottom(Line::from(page_info).alignment(Alignment::Right)),
                )
                .highlight_style(
                    Style::default()
                        .bg(palette.highlight_bg)
                        .fg(palette.highlight_fg)
                        .add_modifier(Modifier::BOLD),
                )
                .highlight_symbol("▸ ");

            let mut list_state = ListState::default();
            list_state.select(Some(app.catalog.list_selected));
            frame.render_stateful_widget(list_widget, chunks[2], &mut list_state);
        }
    }

    // ── Status bar ──
    let mut status_spans = palette.hints(&[
        ("↑↓", "Navigate"),
        ("Enter", "Detail"),
        ("←→", "Genre"),
        ("s/o", "Sort"),
        ("r", "Reload"),
        ("t", "Theme"),
        ("?", "Help"),
        ("q", "Quit"),
    ]);
    status_spans.push(Span::styled(format!(" {}", app.status_msg), palette.muted()));
    frame.render_widget(Paragraph::new(Line::from(status_spans)), chunks[3]);
}

/// Truncate a string to `max_width` display columns, adding "…" if truncated.
pub fn truncate_str(s: &str, max_width: usize) -> String {
    if s.width() <= max_width {
        return s.to_string();
    }
    if max_width == 0 {
        return String::new();
    }
    let mut result = String::new();
    let mut used = 0;
    for c in s.chars() {
        let w = c.width().unwrap_or(0);
        if used + w + 1 > max_width {
            break;
        }
        result.push(c);
        used += w;
    }
    result.push('…');
    result
}
