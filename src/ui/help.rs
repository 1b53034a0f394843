use super::{Palette, centered_rect};
use ratatui::{
    Frame,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};

const SECTIONS: &[(&str, &[(&str, &str)])] = &[
    (
        "Global",
        &[
            ("?", "Toggle this help"),
            ("t", "Switch light/dark theme"),
            ("r", "Reload the current screen"),
            ("Ctrl+C", "Quit application"),
        ],
    ),
    (
        "Catalog",
        &[
            ("↑/k ↓/j", "Navigate up/down"),
            ("PgUp/PgDn", "Previous/next page"),
            ("g/G", "Jump to first/last movie"),
            ("←/→ [/]", "Previous/next genre"),
            ("0/a", "Show all genres"),
            ("s", "Cycle sort: popularity, title, release date"),
            ("o", "Toggle ascending/descending"),
            ("Enter", "Open movie details"),
            ("q", "Quit"),
        ],
    ),
    (
        "Detail",
        &[
            ("↑/↓", "Scroll content"),
            ("PgUp/PgDn", "Scroll page up/down"),
            ("y", "Copy IMDb or poster link to clipboard"),
            ("p", "Open poster in browser"),
            ("Esc/q", "Back to catalog"),
        ],
    ),
];

pub fn render(palette: &Palette, frame: &mut Frame) {
    let area = centered_rect(70, 70, frame.area());

    // Clear the area behind the popup
    frame.render_widget(Clear, area);

    let mut help_text = vec![Line::from("")];
    for (title, keys) in SECTIONS {
        help_text.push(Line::from(Span::styled(
            format!("  {}", title),
            Style::default()
                .fg(palette.accent)
                .add_modifier(Modifier::BOLD),
        )));
        for (key, what) in *keys {
            help_text.push(Line::from(vec![
                Span::styled(
                    format!("    {:<12}", key),
                    Style::default().fg(palette.rating),
                ),
                Span::raw(*what),
            ]));
        }
        help_text.push(Line::from(""));
    }

    let help = Paragraph::new(help_text)
        .wrap(Wrap { trim: false })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(palette.accent))
                .title(" Help: Keybindings ")
                .title_bottom(Line::from(" Press any key to close ").style(palette.muted())),
        )
        .style(palette.base());

    frame.render_widget(help, area);
}
