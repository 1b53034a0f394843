use super::{Palette, notice};
use crate::app::App;
use crate::present;
use crate::state::LoadState;
use crate::tmdb::{self, ImageSize, MovieDetail};
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
};

pub fn render(app: &App, palette: &Palette, frame: &mut Frame) {
    let area = frame.area();
    let detail = match &app.detail {
        Some(d) => d,
        None => return,
    };

    // Layout: header(3) + content(min) + status(1)
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(5),
            Constraint::Length(1),
        ])
        .split(area);

    // ── Header ──
    let title = match detail.state.ready() {
        Some(movie) => match present::year_of(&movie.release_date) {
            Some(year) => format!(" {} ({})", movie.title, year),
            None => format!(" {}", movie.title),
        },
        None => format!(" Movie #{}", detail.id),
    };
    let header = Paragraph::new(title)
        .style(
            Style::default()
                .fg(palette.accent)
                .add_modifier(Modifier::BOLD),
        )
        .block(
            Block::default()
                .borders(Borders::BOTTOM)
                .border_style(palette.muted()),
        );
    frame.render_widget(header, chunks[0]);

    // ── Content ──
    match &detail.state {
        LoadState::Idle | LoadState::Loading => {
            notice::loading(frame, chunks[1], palette, "Loading movie details…");
        }
        LoadState::Failed(message) => {
            notice::failed(frame, chunks[1], palette, message);
        }
        LoadState::Ready(movie) => {
            let content = Paragraph::new(detail_lines(movie, palette))
                .style(palette.base())
                .wrap(Wrap { trim: false })
                .scroll((detail.scroll, 0))
                .block(
                    Block::default()
                        .borders(Borders::ALL)
                        .border_style(palette.muted())
                        .title(" Details ")
                        .title_bottom(
                            Line::from(format!(" scroll: {} ", detail.scroll))
                                .alignment(Alignment::Right),
                        ),
                );
            frame.render_widget(content, chunks[1]);
        }
    }

    // ── Status bar ──
    let mut status_spans = palette.hints(&[
        ("↑↓/PgUp/PgDn", "Scroll"),
        ("y", "Yank link"),
        ("p", "Poster"),
        ("r", "Reload"),
        ("Esc", "Back"),
    ]);
    status_spans.push(Span::styled(format!(" {}", app.status_msg), palette.muted()));
    frame.render_widget(Paragraph::new(Line::from(status_spans)), chunks[2]);
}

fn section(title: &str, palette: &Palette) -> Line<'static> {
    Line::from(Span::styled(
        title.to_string(),
        Style::default()
            .fg(palette.accent)
            .add_modifier(Modifier::BOLD),
    ))
}

fn field(label: &str, value: String, value_style: Style, palette: &Palette) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!(" {:<10}", format!("{}:", label)), palette.muted()),
        Span::styled(value, value_style),
    ])
}

/// Every line of the detail body, top to bottom.
pub fn detail_lines(movie: &MovieDetail, palette: &Palette) -> Vec<Line<'static>> {
    let plain = palette.base();
    let link = Style::default()
        .fg(palette.link)
        .add_modifier(Modifier::UNDERLINED);
    let mut lines = Vec::new();

    if let Some(tagline) = movie.tagline.as_deref().filter(|t| !t.is_empty()) {
        lines.push(Line::from(Span::styled(
            format!(" “{}”", tagline),
            Style::default().add_modifier(Modifier::ITALIC),
        )));
        lines.push(Line::from(""));
    }

    let genres: Vec<&str> = movie.genres.iter().map(|g| g.name.as_str()).collect();
    let genres = if genres.is_empty() {
        present::UNKNOWN.to_string()
    } else {
        genres.join(", ")
    };
    lines.push(field("Genres", genres, plain, palette));
    lines.push(field(
        "Released",
        present::release_label(&movie.release_date),
        plain,
        palette,
    ));
    lines.push(Line::from(vec![
        Span::styled(format!(" {:<10}", "Rating:"), palette.muted()),
        Span::styled(
            present::rating(movie.vote_average),
            Style::default().fg(palette.rating).add_modifier(Modifier::BOLD),
        ),
        Span::styled(format!("  ({})", present::votes(movie.vote_count)), palette.muted()),
    ]));
    lines.push(field("Runtime", present::runtime(movie.runtime), plain, palette));
    let status = if movie.status.is_empty() {
        present::UNKNOWN.to_string()
    } else {
        movie.status.clone()
    };
    lines.push(field("Status", status, plain, palette));
    lines.push(field("Budget", present::money(movie.budget), plain, palette));
    lines.push(field("Revenue", present::money(movie.revenue), plain, palette));

    lines.push(Line::from(""));
    lines.push(section(" Overview", palette));
    if movie.overview.is_empty() {
        lines.push(Line::from(Span::styled(" No overview available.", palette.muted())));
    } else {
        for paragraph in movie.overview.lines() {
            lines.push(Line::from(format!(" {}", paragraph)));
        }
    }

    if !movie.production_companies.is_empty() {
        lines.push(Line::from(""));
        lines.push(section(" Production companies", palette));
        for company in &movie.production_companies {
            let mut spans = match tmdb::image_url(company.logo_path.as_deref(), ImageSize::W200) {
                Some(logo) => vec![
                    Span::raw(format!("   {}  ", company.name)),
                    Span::styled(logo, link),
                ],
                None => vec![
                    Span::styled(
                        format!("   [{}] ", present::initial(&company.name)),
                        Style::default()
                            .fg(palette.highlight_fg)
                            .bg(palette.highlight_bg),
                    ),
                    Span::raw(format!(" {}", company.name)),
                ],
            };
            if !company.origin_country.is_empty() {
                spans.push(Span::styled(
                    format!("  ({})", company.origin_country),
                    palette.muted(),
                ));
            }
            lines.push(Line::from(spans));
        }
    }

    if !movie.production_countries.is_empty() {
        lines.push(Line::from(""));
        lines.push(section(" Production countries", palette));
        for country in &movie.production_countries {
            lines.push(Line::from(vec![
                Span::raw(format!("   {}", country.name)),
                Span::styled(format!("  {}", country.iso_3166_1), palette.muted()),
            ]));
        }
    }

    lines.push(Line::from(""));
    lines.push(section(" Links", palette));
    match tmdb::image_url(movie.poster_path.as_deref(), ImageSize::W500) {
        Some(url) => lines.push(field("Poster", url, link, palette)),
        None => lines.push(field(
            "Poster",
            present::NO_IMAGE.to_string(),
            palette.muted(),
            palette,
        )),
    }
    if let Some(url) = tmdb::imdb_url(movie.imdb_id.as_deref()) {
        lines.push(field("IMDb", url, link, palette));
    }

    lines
}
