use super::Palette;
use crate::app::App;
use crate::catalog::SortKey;
use ratatui::{
    Frame,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};
use unicode_width::UnicodeWidthStr;

const GENRE_LABEL: &str = " Genre: ";
const SORT_LABEL: &str = " Sort:  ";
const GAP: usize = 2;

/// Genre strip and sort line for the catalog screen.
pub fn render(app: &App, palette: &Palette, frame: &mut Frame, area: Rect) {
    let selected_style = Style::default()
        .fg(palette.highlight_fg)
        .bg(palette.highlight_bg)
        .add_modifier(Modifier::BOLD);

    // ── Genre strip ──
    let mut labels = vec!["All".to_string()];
    let mut selected = 0;
    if let Some(catalog) = app.catalog.state.ready() {
        for (i, genre) in catalog.genres.iter().enumerate() {
            if app.catalog.genre == Some(genre.id) {
                selected = i + 1;
            }
            labels.push(genre.name.clone());
        }
    }

    let inner_width = (area.width as usize).saturating_sub(2 + GENRE_LABEL.width() + 4);
    let widths: Vec<usize> = labels.iter().map(|l| l.width() + 2).collect();
    let (start, end) = visible_window(&widths, selected, inner_width);

    let mut genre_spans = vec![Span::styled(GENRE_LABEL, palette.muted())];
    genre_spans.push(Span::styled(if start > 0 { "◂ " } else { "  " }, palette.muted()));
    for (i, label) in labels.iter().enumerate().take(end).skip(start) {
        let style = if i == selected {
            selected_style
        } else {
            palette.base()
        };
        genre_spans.push(Span::styled(format!(" {} ", label), style));
        if i + 1 < end {
            genre_spans.push(Span::raw(" ".repeat(GAP - 1)));
        }
    }
    if end < labels.len() {
        genre_spans.push(Span::styled(" ▸", palette.muted()));
    }

    // ── Sort line ──
    let mut sort_spans = vec![Span::styled(SORT_LABEL, palette.muted()), Span::raw("  ")];
    for key in SortKey::ALL {
        let style = if key == app.catalog.sort_key {
            selected_style
        } else {
            palette.base()
        };
        sort_spans.push(Span::styled(format!(" {} ", key.label()), style));
        sort_spans.push(Span::raw(" "));
    }
    sort_spans.push(Span::styled(
        format!(
            "  {} {}",
            app.catalog.direction.arrow(),
            app.catalog.direction.label()
        ),
        palette.key(),
    ));

    let bar = Paragraph::new(vec![Line::from(genre_spans), Line::from(sort_spans)])
        .style(palette.base())
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(palette.muted())
                .title(" Filters [←/→ genre  s sort  o order] "),
        );
    frame.render_widget(bar, area);
}

/// Pick the run of items `[start, end)` to show so that `selected` is
/// visible and the total width (with gaps) fits in `max_width`. The run
/// grows to the right first, then to the left.
pub fn visible_window(widths: &[usize], selected: usize, max_width: usize) -> (usize, usize) {
    if widths.is_empty() {
        return (0, 0);
    }
    let selected = selected.min(widths.len() - 1);
    let (mut start, mut end) = (selected, selected + 1);
    let mut used = widths[selected];

    loop {
        let mut grew = false;
        if end < widths.len() && used + GAP + widths[end] <= max_width {
            used += GAP + widths[end];
            end += 1;
            grew = true;
        }
        if start > 0 && used + GAP + widths[start - 1] <= max_width {
            used += GAP + widths[start - 1];
            start -= 1;
            grew = true;
        }
        if !grew {
            return (start, end);
        }
    }
}
