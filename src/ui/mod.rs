mod detail;
mod filters;
mod help;
mod list;
mod notice;

use crate::app::{App, View};
use crate::settings::Theme;
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::Span,
    widgets::Block,
};

/// Colors for one theme.
#[derive(Debug, Clone, Copy)]
pub struct Palette {
    pub background: Color,
    pub text: Color,
    pub muted: Color,
    pub accent: Color,
    pub highlight_bg: Color,
    pub highlight_fg: Color,
    pub rating: Color,
    pub error: Color,
    pub link: Color,
}

impl Palette {
    pub fn for_theme(theme: Theme) -> Self {
        match theme {
            Theme::Dark => Self {
                background: Color::Reset,
                text: Color::White,
                muted: Color::DarkGray,
                accent: Color::Cyan,
                highlight_bg: Color::DarkGray,
                highlight_fg: Color::White,
                rating: Color::Yellow,
                error: Color::Red,
                link: Color::Blue,
            },
            Theme::Light => Self {
                background: Color::White,
                text: Color::Black,
                muted: Color::Gray,
                accent: Color::Blue,
                highlight_bg: Color::LightBlue,
                highlight_fg: Color::Black,
                rating: Color::Rgb(176, 110, 0),
                error: Color::Red,
                link: Color::Blue,
            },
        }
    }

    pub fn base(&self) -> Style {
        Style::default().bg(self.background).fg(self.text)
    }

    pub fn muted(&self) -> Style {
        Style::default().fg(self.muted)
    }

    pub fn key(&self) -> Style {
        Style::default().fg(self.accent).add_modifier(Modifier::BOLD)
    }

    /// Status bar hints: key in accent, description plain.
    pub fn hints<'a>(&self, pairs: &[(&'a str, &'a str)]) -> Vec<Span<'a>> {
        let mut spans = Vec::with_capacity(pairs.len() * 2);
        for (key, label) in pairs {
            spans.push(Span::styled(format!(" {}", key), self.key()));
            spans.push(Span::raw(format!(" {} ", label)));
        }
        spans
    }
}

/// Top-level render dispatch.
pub fn render(app: &App, frame: &mut Frame) {
    let palette = Palette::for_theme(app.theme);
    frame.render_widget(Block::default().style(palette.base()), frame.area());

    match app.view {
        View::Catalog => list::render(app, &palette, frame),
        View::Detail => detail::render(app, &palette, frame),
    }

    // Render help overlay on top if active
    if app.show_help {
        help::render(&palette, frame);
    }
}

/// Create a centered rectangle using percentage of parent area.
pub(crate) fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1]);

    horizontal[1]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_centered_rect_is_inside() {
        let outer = Rect::new(0, 0, 100, 40);
        let inner = centered_rect(60, 50, outer);
        assert_eq!(inner.width, 60);
        assert_eq!(inner.height, 20);
        assert_eq!(inner.x, 20);
        assert_eq!(inner.y, 10);
    }

    #[test]
    fn test_hints_pair_up() {
        let palette = Palette::for_theme(Theme::Dark);
        let spans = palette.hints(&[("q", "Quit"), ("?", "Help")]);
        assert_eq!(spans.len(), 4);
        assert_eq!(spans[0].content, " q");
        assert_eq!(spans[1].content, " Quit ");
    }
}
