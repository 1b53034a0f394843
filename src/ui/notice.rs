//! Placeholder panels shown in place of a screen's content while it loads,
//! after it failed, or when there is nothing to show.

use super::{Palette, centered_rect};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};

pub fn loading(frame: &mut Frame, area: Rect, palette: &Palette, what: &str) {
    let area = panel_area(area);
    frame.render_widget(Clear, area);

    let block = Block::default()
        .title(" Loading ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(palette.accent));

    let text = vec![
        Line::from(""),
        Line::from(Span::styled(what.to_string(), palette.base())),
    ];
    let paragraph = Paragraph::new(text)
        .block(block)
        .style(palette.base())
        .alignment(Alignment::Center);

    frame.render_widget(paragraph, area);
}

pub fn failed(frame: &mut Frame, area: Rect, palette: &Palette, message: &str) {
    let area = panel_area(area);
    frame.render_widget(Clear, area);

    let block = Block::default()
        .title(" Error ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(palette.error));

    let text = vec![
        Line::from(""),
        Line::from(Span::styled(
            message.to_string(),
            Style::default().fg(palette.error),
        )),
        Line::from(""),
        Line::from(vec![
            Span::raw("Press "),
            Span::styled("r", palette.key()),
            Span::raw(" to try again"),
        ]),
    ];
    let paragraph = Paragraph::new(text)
        .block(block)
        .style(palette.base())
        .wrap(Wrap { trim: true })
        .alignment(Alignment::Center);

    frame.render_widget(paragraph, area);
}

pub fn empty(frame: &mut Frame, area: Rect, palette: &Palette, message: &str) {
    let area = panel_area(area);
    let paragraph = Paragraph::new(vec![Line::from(""), Line::from(message.to_string())])
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(palette.muted()),
        )
        .style(palette.muted())
        .alignment(Alignment::Center);

    frame.render_widget(paragraph, area);
}

fn panel_area(area: Rect) -> Rect {
    let rect = centered_rect(70, 60, area);
    // Never smaller than the text it holds
    if rect.height < 7 || rect.width < 30 {
        area
    } else {
        rect
    }
}
