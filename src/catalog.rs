//! Filter and sort over the fetched catalog.
//!
//! The displayed list is always derived from the last fetched collection;
//! nothing here mutates the source.

use crate::tmdb::{Genre, GenreId, MovieSummary};
use chrono::NaiveDate;
use std::cmp::Ordering;

/// Popular movies together with the genre taxonomy they reference.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalog {
    pub movies: Vec<MovieSummary>,
    pub genres: Vec<Genre>,
}

impl Catalog {
    pub fn genre_name(&self, id: GenreId) -> Option<&str> {
        self.genres
            .iter()
            .find(|g| g.id == id)
            .map(|g| g.name.as_str())
    }

    pub fn has_genre(&self, id: GenreId) -> bool {
        self.genres.iter().any(|g| g.id == id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum SortKey {
    #[default]
    Popularity,
    Title,
    #[value(name = "release-date")]
    ReleaseDate,
}

impl SortKey {
    pub fn next(self) -> Self {
        match self {
            Self::Popularity => Self::Title,
            Self::Title => Self::ReleaseDate,
            Self::ReleaseDate => Self::Popularity,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Popularity => "Popularity",
            Self::Title => "Title",
            Self::ReleaseDate => "Release Date",
        }
    }

    pub const ALL: [SortKey; 3] = [Self::Popularity, Self::Title, Self::ReleaseDate];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum SortDirection {
    #[value(name = "asc")]
    Ascending,
    #[default]
    #[value(name = "desc")]
    Descending,
}

impl SortDirection {
    pub fn toggle(self) -> Self {
        match self {
            Self::Ascending => Self::Descending,
            Self::Descending => Self::Ascending,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Ascending => "Ascending",
            Self::Descending => "Descending",
        }
    }

    pub fn arrow(self) -> &'static str {
        match self {
            Self::Ascending => "↑",
            Self::Descending => "↓",
        }
    }

    fn apply(self, ord: Ordering) -> Ordering {
        match self {
            Self::Ascending => ord,
            Self::Descending => ord.reverse(),
        }
    }
}

/// Compute the displayed list: keep movies tagged with `genre` (all when
/// `None`), then stable-sort by `key` in `direction`. Ties keep their
/// original relative order in both directions.
///
/// Release dates that are missing or not `YYYY-MM-DD` always sort after
/// every valid date, whichever the direction.
pub fn project(
    movies: &[MovieSummary],
    genre: Option<GenreId>,
    key: SortKey,
    direction: SortDirection,
) -> Vec<MovieSummary> {
    let shown: Vec<MovieSummary> = movies
        .iter()
        .filter(|m| genre.is_none_or(|g| m.genre_ids.contains(&g)))
        .cloned()
        .collect();

    match key {
        SortKey::Popularity => {
            let mut shown = shown;
            shown.sort_by(|a, b| direction.apply(a.popularity.total_cmp(&b.popularity)));
            shown
        }
        SortKey::Title => sort_keyed(shown, |m| TitleKey::new(&m.title), |a, b| {
            direction.apply(a.cmp(b))
        }),
        SortKey::ReleaseDate => sort_keyed(shown, |m| parse_release_date(&m.release_date), |a, b| {
            match (a, b) {
                (Some(a), Some(b)) => direction.apply(a.cmp(b)),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            }
        }),
    }
}

/// Decorate, stable-sort, undecorate. Keys are computed once per movie.
fn sort_keyed<K>(
    movies: Vec<MovieSummary>,
    key: impl Fn(&MovieSummary) -> K,
    cmp: impl Fn(&K, &K) -> Ordering,
) -> Vec<MovieSummary> {
    let mut keyed: Vec<(K, MovieSummary)> = movies.into_iter().map(|m| (key(&m), m)).collect();
    keyed.sort_by(|(a, _), (b, _)| cmp(a, b));
    keyed.into_iter().map(|(_, m)| m).collect()
}

pub fn parse_release_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok()
}

/// Collation key for titles: compares letters ignoring case and accents
/// first, then case-insensitively, then by exact text.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct TitleKey {
    folded: String,
    lower: String,
    exact: String,
}

impl TitleKey {
    fn new(title: &str) -> Self {
        let lower = title.to_lowercase();
        let folded = lower.chars().map(fold_diacritic).collect();
        Self {
            folded,
            lower,
            exact: title.to_string(),
        }
    }
}

/// Strip accents from Latin-1 and Central European lowercase letters.
/// Anything else, including every non-Latin script, is returned unchanged
/// and so orders by plain code point.
fn fold_diacritic(c: char) -> char {
    match c {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' | 'ą' | 'ā' => 'a',
        'ç' | 'ć' | 'č' => 'c',
        'ď' => 'd',
        'è' | 'é' | 'ê' | 'ë' | 'ę' | 'ě' | 'ē' => 'e',
        'ì' | 'í' | 'î' | 'ï' | 'ī' => 'i',
        'ł' | 'ľ' => 'l',
        'ñ' | 'ń' | 'ň' => 'n',
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' | 'ō' => 'o',
        'ř' => 'r',
        'ś' | 'š' | 'ș' => 's',
        'ť' | 'ț' => 't',
        'ù' | 'ú' | 'û' | 'ü' | 'ů' | 'ū' => 'u',
        'ý' | 'ÿ' => 'y',
        'ź' | 'ż' | 'ž' => 'z',
        other => other,
    }
}
