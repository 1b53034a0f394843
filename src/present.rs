//! Text formatting shared by the terminal UI and the `list`/`show` commands.

use crate::catalog::{self, Catalog, SortDirection, SortKey};
use crate::fetch::{self, FetchError};
use crate::tmdb::{self, GenreId, ImageSize, MovieApi, MovieDetail, MovieId, MovieSummary};
use chrono::Datelike;
use std::fmt::Write;

pub const NO_IMAGE: &str = "No image available";
pub const EMPTY_CATALOG: &str = "No movies found. Try changing your filters.";
pub const UNKNOWN: &str = "Unknown";

pub fn year_of(release_date: &str) -> Option<i32> {
    catalog::parse_release_date(release_date).map(|d| d.year())
}

/// "15 Dec 1995", or "Unknown" for a missing/invalid date.
pub fn release_label(release_date: &str) -> String {
    catalog::parse_release_date(release_date)
        .map(|d| d.format("%-d %b %Y").to_string())
        .unwrap_or_else(|| UNKNOWN.to_string())
}

pub fn rating(vote_average: f64) -> String {
    format!("★ {:.1}", vote_average)
}

pub fn votes(count: u64) -> String {
    match count {
        1 => "1 vote".to_string(),
        n => format!("{} votes", group_thousands(n)),
    }
}

/// 1234567 → "1,234,567"
pub fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// TMDB reports unknown budgets and revenues as 0.
pub fn money(amount: u64) -> String {
    if amount == 0 {
        UNKNOWN.to_string()
    } else {
        format!("${}", group_thousands(amount))
    }
}

pub fn runtime(minutes: Option<u32>) -> String {
    match minutes {
        None | Some(0) => UNKNOWN.to_string(),
        Some(m) if m < 60 => format!("{}m", m),
        Some(m) => format!("{}h {}m", m / 60, m % 60),
    }
}

/// Names for the given ids, skipping ids the genre list doesn't know.
pub fn genre_names<'a>(catalog: &'a Catalog, ids: &[GenreId]) -> Vec<&'a str> {
    ids.iter().filter_map(|id| catalog.genre_name(*id)).collect()
}

/// Placeholder for a company without a logo.
pub fn initial(name: &str) -> String {
    name.chars()
        .find(|c| c.is_alphanumeric())
        .map(|c| c.to_uppercase().collect())
        .unwrap_or_else(|| "?".to_string())
}

/// Plain-text listing of the projected catalog.
pub fn format_catalog(catalog: &Catalog, displayed: &[MovieSummary], heading: &str) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", heading);
    let _ = writeln!(out);

    if displayed.is_empty() {
        let _ = writeln!(out, "{}", EMPTY_CATALOG);
        return out;
    }

    for (rank, movie) in displayed.iter().enumerate() {
        let year = year_of(&movie.release_date)
            .map(|y| y.to_string())
            .unwrap_or_else(|| "----".to_string());
        let _ = write!(
            out,
            "{:>3}. {:>8}  {}  {}  {}",
            rank + 1,
            movie.id,
            rating(movie.vote_average),
            year,
            movie.title
        );
        let genres = genre_names(catalog, &movie.genre_ids);
        if !genres.is_empty() {
            let _ = write!(out, "  [{}]", genres.join(", "));
        }
        let _ = writeln!(out);
    }
    out
}

/// Plain-text rendering of one movie's details.
pub fn format_detail(movie: &MovieDetail) -> String {
    let mut out = String::new();
    match year_of(&movie.release_date) {
        Some(year) => {
            let _ = writeln!(out, "{} ({})", movie.title, year);
        }
        None => {
            let _ = writeln!(out, "{}", movie.title);
        }
    }
    if let Some(tagline) = movie.tagline.as_deref().filter(|t| !t.is_empty()) {
        let _ = writeln!(out, "\"{}\"", tagline);
    }
    let _ = writeln!(out);

    let genres: Vec<&str> = movie.genres.iter().map(|g| g.name.as_str()).collect();
    let fields = [
        ("Genres", if genres.is_empty() { UNKNOWN.to_string() } else { genres.join(", ") }),
        ("Released", release_label(&movie.release_date)),
        ("Rating", format!("{} ({})", rating(movie.vote_average), votes(movie.vote_count))),
        ("Runtime", runtime(movie.runtime)),
        ("Status", if movie.status.is_empty() { UNKNOWN.to_string() } else { movie.status.clone() }),
        ("Budget", money(movie.budget)),
        ("Revenue", money(movie.revenue)),
    ];
    for (label, value) in fields {
        let _ = writeln!(out, "{:<10} {}", format!("{}:", label), value);
    }

    if !movie.overview.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "{}", movie.overview);
    }

    if !movie.production_companies.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "Production companies:");
        for company in &movie.production_companies {
            match tmdb::image_url(company.logo_path.as_deref(), ImageSize::W200) {
                Some(logo) => {
                    let _ = writeln!(out, "  - {} ({})", company.name, logo);
                }
                None => {
                    let _ = writeln!(out, "  - [{}] {}", initial(&company.name), company.name);
                }
            }
        }
    }

    if !movie.production_countries.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "Production countries:");
        for country in &movie.production_countries {
            let _ = writeln!(out, "  - {} ({})", country.name, country.iso_3166_1);
        }
    }

    let _ = writeln!(out);
    let poster = tmdb::image_url(movie.poster_path.as_deref(), ImageSize::W500);
    let _ = writeln!(out, "{:<10} {}", "Poster:", poster.as_deref().unwrap_or(NO_IMAGE));
    if let Some(imdb) = tmdb::imdb_url(movie.imdb_id.as_deref()) {
        let _ = writeln!(out, "{:<10} {}", "IMDb:", imdb);
    }
    out
}

/// Fetch and project the catalog, rendered for the `list` command.
pub async fn catalog_report(
    api: &dyn MovieApi,
    genre: Option<GenreId>,
    sort: SortKey,
    order: SortDirection,
) -> Result<String, FetchError> {
    let fetched = fetch::load_catalog(api).await?;
    let displayed = catalog::project(&fetched.movies, genre, sort, order);
    let genre_label = match genre {
        None => "All genres".to_string(),
        Some(id) => fetched
            .genre_name(id)
            .map(str::to_string)
            .unwrap_or_else(|| format!("genre {}", id)),
    };
    let heading = format!(
        "Popular movies: {} ({} of {}), by {} {}",
        genre_label,
        displayed.len(),
        fetched.movies.len(),
        sort.label(),
        order.arrow()
    );
    Ok(format_catalog(&fetched, &displayed, &heading))
}

/// Fetch one movie, rendered for the `show` command.
pub async fn detail_report(api: &dyn MovieApi, id: MovieId) -> Result<String, FetchError> {
    let movie = fetch::load_detail(api, id).await?;
    Ok(format_detail(&movie))
}
