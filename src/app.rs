use crate::catalog::{self, Catalog, SortDirection, SortKey};
use crate::fetch::{Dispatcher, FetchMessage, PendingFetch, Subject};
use crate::settings::{Preferences, Theme};
use crate::state::LoadState;
use crate::tmdb::{self, GenreId, ImageSize, MovieDetail, MovieId, MovieSummary};
use std::path::PathBuf;
use std::sync::mpsc::Receiver;
use tracing::{debug, info, warn};

/// Which view is currently active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Catalog,
    Detail,
}

/// header(3) + filters(4) + list borders(2) + status(1)
pub const LIST_OVERHEAD: u16 = 10;

/// State of the catalog (root) screen.
pub struct CatalogScreen {
    pub state: LoadState<Catalog>,
    pending: Option<PendingFetch>,

    pub genre: Option<GenreId>,
    pub sort_key: SortKey,
    pub direction: SortDirection,

    // Derived from the last fetched catalog; never edited directly
    pub displayed: Vec<MovieSummary>,

    pub list_selected: usize, // Index within visible page
    pub list_offset: usize,   // Offset into displayed
}

impl CatalogScreen {
    fn new() -> Self {
        Self {
            state: LoadState::Idle,
            pending: None,
            genre: None,
            sort_key: SortKey::default(),
            direction: SortDirection::default(),
            displayed: Vec::new(),
            list_selected: 0,
            list_offset: 0,
        }
    }
}

/// State of one detail screen, keyed by the movie it was opened for.
pub struct DetailScreen {
    pub id: MovieId,
    pub state: LoadState<MovieDetail>,
    pending: Option<PendingFetch>,
    pub scroll: u16,
}

impl DetailScreen {
    fn cancel(self) {
        if let Some(pending) = self.pending {
            pending.cancel();
        }
    }
}

/// Main application state.
pub struct App {
    dispatcher: Dispatcher,
    inbox: Receiver<FetchMessage>,

    pub should_quit: bool,
    pub view: View,
    pub show_help: bool,
    pub theme: Theme,
    preferences_path: Option<PathBuf>,

    pub catalog: CatalogScreen,
    pub detail: Option<DetailScreen>,
    pub page_size: usize,

    // Status message
    pub status_msg: String,
}

impl App {
    pub fn new(
        dispatcher: Dispatcher,
        inbox: Receiver<FetchMessage>,
        theme: Theme,
        preferences_path: Option<PathBuf>,
    ) -> Self {
        Self {
            dispatcher,
            inbox,
            should_quit: false,
            view: View::Catalog,
            show_help: false,
            theme,
            preferences_path,
            catalog: CatalogScreen::new(),
            detail: None,
            page_size: 20, // Updated on first render/resize
            status_msg: String::new(),
        }
    }

    /// Start (or restart) the catalog fetch. No-op while one is in flight.
    pub fn load_catalog(&mut self) {
        if !self.catalog.state.begin() {
            return;
        }
        if let Some(old) = self.catalog.pending.take() {
            old.cancel();
        }
        // Nothing from the previous fetch stays visible or selectable
        self.catalog.displayed.clear();
        self.list_first();
        self.catalog.pending = Some(self.dispatcher.request_catalog());
        self.status_msg = "Loading popular movies...".to_string();
    }

    /// Re-run the current screen's fetch.
    pub fn retry(&mut self) {
        match self.view {
            View::Catalog => self.load_catalog(),
            View::Detail => self.reload_detail(),
        }
    }

    fn reload_detail(&mut self) {
        let Some(detail) = self.detail.as_mut() else {
            return;
        };
        if !detail.state.begin() {
            return;
        }
        if let Some(old) = detail.pending.take() {
            old.cancel();
        }
        detail.pending = Some(self.dispatcher.request_detail(detail.id));
        detail.scroll = 0;
        self.status_msg = format!("Loading movie {}...", detail.id);
    }

    /// Apply every result waiting in the inbox. Returns how many arrived.
    pub fn pump(&mut self) -> usize {
        let mut count = 0;
        while let Ok(msg) = self.inbox.try_recv() {
            debug!(ticket = msg.ticket().value(), "Fetch result received");
            self.handle_message(msg);
            count += 1;
        }
        count
    }

    /// Apply one fetch result if it belongs to the screen that asked for it.
    /// Results for a screen that has since been left or reloaded are dropped.
    pub fn handle_message(&mut self, msg: FetchMessage) -> bool {
        match msg {
            FetchMessage::Catalog { ticket, result } => {
                if self.catalog.pending.as_ref().map(|p| p.ticket) != Some(ticket) {
                    debug!(ticket = ticket.value(), "Discarding stale catalog result");
                    return false;
                }
                self.catalog.pending = None;
                match result {
                    Ok(fresh) => {
                        if let Some(genre) = self.catalog.genre {
                            if !fresh.has_genre(genre) {
                                self.catalog.genre = None;
                            }
                        }
                        let count = fresh.movies.len();
                        self.catalog.state.resolve(Ok(fresh));
                        self.apply_projection();
                        self.status_msg = format!("{} movies loaded", count);
                    }
                    Err(e) => {
                        self.catalog
                            .state
                            .resolve(Err(e.user_message(Subject::Movies)));
                        self.catalog.displayed.clear();
                        self.status_msg = if e.is_retryable() {
                            "Press r to try again".to_string()
                        } else {
                            String::new()
                        };
                    }
                }
                true
            }
            FetchMessage::Detail { ticket, id, result } => {
                let Some(detail) = self.detail.as_mut() else {
                    debug!(ticket = ticket.value(), id, "Discarding detail result, screen closed");
                    return false;
                };
                if detail.id != id || detail.pending.as_ref().map(|p| p.ticket) != Some(ticket) {
                    debug!(ticket = ticket.value(), id, "Discarding stale detail result");
                    return false;
                }
                detail.pending = None;
                match result {
                    Ok(movie) => {
                        self.status_msg = movie.title.clone();
                        detail.state.resolve(Ok(movie));
                    }
                    Err(e) => {
                        detail.state.resolve(Err(e.user_message(Subject::MovieDetails)));
                        self.status_msg = "Press r to try again".to_string();
                    }
                }
                true
            }
        }
    }

    /// Recompute the displayed list from the fetched catalog and the
    /// current genre/sort selection, then reset the list position.
    pub fn apply_projection(&mut self) {
        self.catalog.displayed = match self.catalog.state.ready() {
            Some(fetched) => catalog::project(
                &fetched.movies,
                self.catalog.genre,
                self.catalog.sort_key,
                self.catalog.direction,
            ),
            None => Vec::new(),
        };
        self.catalog.list_offset = 0;
        self.catalog.list_selected = 0;
    }

    pub fn select_genre(&mut self, genre: Option<GenreId>) {
        if self.catalog.genre == genre {
            return;
        }
        self.catalog.genre = genre;
        self.apply_projection();
        self.status_msg = format!(
            "{} movies in {}",
            self.catalog.displayed.len(),
            self.genre_label()
        );
    }

    /// All → first genre → … → last genre → All
    pub fn next_genre(&mut self) {
        let Some(fetched) = self.catalog.state.ready() else {
            return;
        };
        let next = match self.catalog.genre {
            None => fetched.genres.first().map(|g| g.id),
            Some(current) => {
                let pos = fetched.genres.iter().position(|g| g.id == current);
                pos.and_then(|i| fetched.genres.get(i + 1)).map(|g| g.id)
            }
        };
        self.select_genre(next);
    }

    pub fn prev_genre(&mut self) {
        let Some(fetched) = self.catalog.state.ready() else {
            return;
        };
        let prev = match self.catalog.genre {
            None => fetched.genres.last().map(|g| g.id),
            Some(current) => match fetched.genres.iter().position(|g| g.id == current) {
                Some(i) if i > 0 => Some(fetched.genres[i - 1].id),
                _ => None,
            },
        };
        self.select_genre(prev);
    }

    pub fn cycle_sort_key(&mut self) {
        self.catalog.sort_key = self.catalog.sort_key.next();
        self.apply_projection();
        self.status_msg = format!("Sorted by {}", self.catalog.sort_key.label());
    }

    pub fn toggle_direction(&mut self) {
        self.catalog.direction = self.catalog.direction.toggle();
        self.apply_projection();
        self.status_msg = format!("Sort order: {}", self.catalog.direction.label());
    }

    /// Display name of the selected genre, or "All".
    pub fn genre_label(&self) -> String {
        match self.catalog.genre {
            None => "All".to_string(),
            Some(id) => self
                .catalog
                .state
                .ready()
                .and_then(|c| c.genre_name(id))
                .map(str::to_string)
                .unwrap_or_else(|| format!("genre {}", id)),
        }
    }

    /// Current visible page of the displayed list.
    pub fn page(&self) -> &[MovieSummary] {
        let displayed = &self.catalog.displayed;
        let start = self.catalog.list_offset.min(displayed.len());
        let end = (start + self.page_size).min(displayed.len());
        &displayed[start..end]
    }

    /// Update page size based on terminal height.
    pub fn update_page_size(&mut self, terminal_height: u16) {
        let new_size = terminal_height.saturating_sub(LIST_OVERHEAD) as usize;
        self.page_size = new_size.max(1);
        // Keep the selected movie visible
        let absolute = self.catalog.list_offset + self.catalog.list_selected;
        self.catalog.list_offset = (absolute / self.page_size) * self.page_size;
        self.catalog.list_selected = absolute - self.catalog.list_offset;
    }

    pub fn selected_movie(&self) -> Option<&MovieSummary> {
        self.catalog
            .displayed
            .get(self.catalog.list_offset + self.catalog.list_selected)
    }

    /// Move selection down in the list.
    pub fn list_next(&mut self) {
        let page_len = self.page().len();
        if page_len == 0 {
            return;
        }
        let c = &mut self.catalog;
        if c.list_selected + 1 < page_len {
            c.list_selected += 1;
        } else {
            // Next page
            let new_offset = c.list_offset + self.page_size;
            if new_offset < c.displayed.len() {
                c.list_offset = new_offset;
                c.list_selected = 0;
            }
        }
    }

    /// Move selection up in the list.
    pub fn list_prev(&mut self) {
        let c = &mut self.catalog;
        if c.list_selected > 0 {
            c.list_selected -= 1;
        } else if c.list_offset > 0 {
            // Prev page
            c.list_offset = c.list_offset.saturating_sub(self.page_size);
            c.list_selected = self.page_size - 1;
        }
    }

    pub fn list_page_down(&mut self) {
        let new_offset = self.catalog.list_offset + self.page_size;
        if new_offset < self.catalog.displayed.len() {
            self.catalog.list_offset = new_offset;
            self.catalog.list_selected = 0;
        } else {
            self.list_last();
        }
    }

    pub fn list_page_up(&mut self) {
        self.catalog.list_offset = self.catalog.list_offset.saturating_sub(self.page_size);
        self.catalog.list_selected = 0;
    }

    pub fn list_first(&mut self) {
        self.catalog.list_offset = 0;
        self.catalog.list_selected = 0;
    }

    pub fn list_last(&mut self) {
        if self.catalog.displayed.is_empty() {
            return;
        }
        let last = self.catalog.displayed.len() - 1;
        self.catalog.list_offset = (last / self.page_size) * self.page_size;
        self.catalog.list_selected = last - self.catalog.list_offset;
    }

    /// Open the detail view for the currently selected movie.
    pub fn open_selected(&mut self) {
        if self.catalog.state.ready().is_none() {
            return;
        }
        if let Some(id) = self.selected_movie().map(|m| m.id) {
            self.open_detail(id);
        }
    }

    /// Navigate to the detail view for `id`, starting its fetch. Any
    /// previous detail screen is discarded first.
    pub fn open_detail(&mut self, id: MovieId) {
        if let Some(old) = self.detail.take() {
            old.cancel();
        }
        let mut state = LoadState::Idle;
        state.begin();
        let pending = self.dispatcher.request_detail(id);
        self.detail = Some(DetailScreen {
            id,
            state,
            pending: Some(pending),
            scroll: 0,
        });
        self.view = View::Detail;
        self.status_msg = format!("Loading movie {}...", id);
    }

    /// Back to the catalog. An unfinished detail fetch is abandoned.
    pub fn close_detail(&mut self) {
        if let Some(old) = self.detail.take() {
            if old.state.is_loading() {
                info!(id = old.id, "Leaving detail view before it loaded");
            }
            old.cancel();
        }
        self.view = View::Catalog;
        self.status_msg = format!(
            "{} movies in {}",
            self.catalog.displayed.len(),
            self.genre_label()
        );
    }

    pub fn loaded_detail(&self) -> Option<&MovieDetail> {
        self.detail.as_ref().and_then(|d| d.state.ready())
    }

    /// Best external link for the loaded movie: IMDb page, else poster.
    pub fn detail_link(&self) -> Option<String> {
        let movie = self.loaded_detail()?;
        tmdb::imdb_url(movie.imdb_id.as_deref()).or_else(|| self.poster_url(ImageSize::W500))
    }

    pub fn poster_url(&self, size: ImageSize) -> Option<String> {
        let movie = self.loaded_detail()?;
        tmdb::image_url(movie.poster_path.as_deref(), size)
    }

    pub fn scroll_down(&mut self) {
        if let Some(d) = self.detail.as_mut() {
            d.scroll = d.scroll.saturating_add(1);
        }
    }

    pub fn scroll_up(&mut self) {
        if let Some(d) = self.detail.as_mut() {
            d.scroll = d.scroll.saturating_sub(1);
        }
    }

    pub fn scroll_page_down(&mut self) {
        if let Some(d) = self.detail.as_mut() {
            d.scroll = d.scroll.saturating_add(20);
        }
    }

    pub fn scroll_page_up(&mut self) {
        if let Some(d) = self.detail.as_mut() {
            d.scroll = d.scroll.saturating_sub(20);
        }
    }

    /// Flip light/dark and persist the choice.
    pub fn toggle_theme(&mut self) {
        self.theme = self.theme.toggle();
        self.status_msg = format!("Theme: {}", self.theme.label());
        if let Some(path) = &self.preferences_path {
            let prefs = Preferences { theme: self.theme };
            if let Err(e) = prefs.save(path) {
                warn!(path = %path.display(), error = %e, "Could not save preferences");
                self.status_msg = format!("Theme: {} (not saved: {})", self.theme.label(), e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::Ticket;
    use crate::fetch::testing::*;
    use std::sync::Arc;
    use std::time::Duration;

    fn app_with(api: FakeApi) -> App {
        let (dispatcher, inbox) = Dispatcher::new(Arc::new(api));
        App::new(dispatcher, inbox, Theme::Dark, None)
    }

    async fn settle(app: &mut App, done: impl Fn(&App) -> bool) {
        for _ in 0..200 {
            app.pump();
            if done(app) {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("timed out waiting for fetch results");
    }

    fn sample_api() -> FakeApi {
        FakeApi::with_catalog(
            vec![
                summary(1, "Heat", 30.0, "1995-12-15", &[28, 80]),
                summary(2, "Amélie", 50.0, "2001-04-25", &[35, 10749]),
                summary(3, "Speed", 10.0, "1994-06-10", &[28]),
                summary(4, "Clue", 20.0, "", &[35]),
            ],
            vec![genre(28, "Action"), genre(35, "Comedy"), genre(80, "Crime")],
        )
        .with_detail(detail(1, "Heat"))
        .with_detail(detail(2, "Amélie"))
    }

    fn displayed_ids(app: &App) -> Vec<u64> {
        app.catalog.displayed.iter().map(|m| m.id).collect()
    }

    #[tokio::test]
    async fn test_catalog_loads_with_default_sort() {
        let mut app = app_with(sample_api());
        assert_eq!(app.catalog.state, LoadState::Idle);

        app.load_catalog();
        assert!(app.catalog.state.is_loading());
        settle(&mut app, |a| a.catalog.state.ready().is_some()).await;

        // Popularity, descending
        assert_eq!(displayed_ids(&app), vec![2, 1, 4, 3]);
        assert_eq!(app.status_msg, "4 movies loaded");
    }

    #[tokio::test]
    async fn test_genre_and_sort_controls() {
        let mut app = app_with(sample_api());
        app.load_catalog();
        settle(&mut app, |a| a.catalog.state.ready().is_some()).await;

        app.next_genre();
        assert_eq!(app.catalog.genre, Some(28));
        assert_eq!(app.genre_label(), "Action");
        assert_eq!(displayed_ids(&app), vec![1, 3]);

        app.next_genre();
        assert_eq!(app.catalog.genre, Some(35));
        app.next_genre();
        app.next_genre();
        assert_eq!(app.catalog.genre, None);
        assert_eq!(displayed_ids(&app).len(), 4);

        app.prev_genre();
        assert_eq!(app.catalog.genre, Some(80));
        app.select_genre(None);

        app.cycle_sort_key();
        assert_eq!(app.catalog.sort_key, SortKey::Title);
        // Descending titles
        assert_eq!(displayed_ids(&app), vec![3, 1, 4, 2]);

        app.toggle_direction();
        assert_eq!(displayed_ids(&app), vec![2, 4, 1, 3]);

        app.cycle_sort_key();
        assert_eq!(app.catalog.sort_key, SortKey::ReleaseDate);
        // Ascending dates; the undated movie goes last
        assert_eq!(displayed_ids(&app), vec![3, 1, 2, 4]);
    }

    #[tokio::test]
    async fn test_catalog_failure_and_retry() {
        let api = FakeApi {
            movies: Some(vec![summary(1, "Heat", 30.0, "1995-12-15", &[28])]),
            genres: None,
            ..Default::default()
        };
        let mut app = app_with(api);
        app.load_catalog();
        settle(&mut app, |a| a.catalog.state.failure().is_some()).await;

        assert_eq!(
            app.catalog.state.failure(),
            Some("Failed to fetch movies. Please try again later.")
        );
        assert!(app.catalog.displayed.is_empty());

        app.retry();
        assert!(app.catalog.state.is_loading());
        settle(&mut app, |a| a.catalog.state.failure().is_some()).await;
    }

    #[tokio::test]
    async fn test_load_catalog_ignored_while_loading() {
        let mut app = app_with(sample_api());
        app.load_catalog();
        let first = app.catalog.pending.as_ref().map(|p| p.ticket);
        app.load_catalog();
        assert_eq!(app.catalog.pending.as_ref().map(|p| p.ticket), first);
    }

    #[tokio::test]
    async fn test_unknown_catalog_ticket_is_discarded() {
        let mut app = app_with(sample_api());
        app.load_catalog();
        let applied = app.handle_message(FetchMessage::Catalog {
            ticket: Ticket(999),
            result: Ok(Catalog::default()),
        });
        assert!(!applied);
        assert!(app.catalog.state.is_loading());
    }

    #[tokio::test]
    async fn test_detail_loads_and_back_keeps_catalog_position() {
        let mut app = app_with(sample_api());
        app.load_catalog();
        settle(&mut app, |a| a.catalog.state.ready().is_some()).await;

        app.list_next();
        assert_eq!(app.selected_movie().map(|m| m.id), Some(1));
        app.open_selected();
        assert_eq!(app.view, View::Detail);
        settle(&mut app, |a| a.loaded_detail().is_some()).await;
        assert_eq!(app.loaded_detail().unwrap().title, "Heat");
        assert_eq!(
            app.detail_link().as_deref(),
            Some("https://www.imdb.com/title/tt0000001/")
        );
        assert_eq!(
            app.poster_url(ImageSize::Original).as_deref(),
            Some("https://image.tmdb.org/t/p/original/poster1.jpg")
        );

        app.close_detail();
        assert_eq!(app.view, View::Catalog);
        assert!(app.detail.is_none());
        assert_eq!(app.selected_movie().map(|m| m.id), Some(1));
    }

    #[tokio::test]
    async fn test_reload_hides_previous_list() {
        let mut app = app_with(sample_api());
        app.load_catalog();
        settle(&mut app, |a| a.catalog.state.ready().is_some()).await;
        app.list_next();

        app.retry();
        assert!(app.catalog.state.is_loading());
        assert!(app.catalog.displayed.is_empty());
        assert!(app.selected_movie().is_none());
        assert_eq!(app.catalog.list_offset, 0);
        assert_eq!(app.catalog.list_selected, 0);

        app.list_next();
        app.list_last();
        app.open_selected();
        assert_eq!(app.view, View::Catalog);
        assert!(app.detail.is_none());

        settle(&mut app, |a| a.catalog.state.ready().is_some()).await;
        assert_eq!(displayed_ids(&app), vec![2, 1, 4, 3]);
    }

    #[tokio::test]
    async fn test_detail_not_found() {
        let mut app = app_with(sample_api());
        app.open_detail(404);
        settle(&mut app, |a| {
            a.detail.as_ref().is_some_and(|d| d.state.failure().is_some())
        })
        .await;
        let detail = app.detail.as_ref().unwrap();
        assert_eq!(
            detail.state.failure(),
            Some("Failed to fetch movie details. Please try again later.")
        );
        assert!(app.loaded_detail().is_none());
    }

    #[tokio::test]
    async fn test_stale_detail_never_reaches_new_screen() {
        let api = sample_api().with_delay(1, Duration::from_millis(150));
        let mut app = app_with(api);

        app.open_detail(1);
        app.close_detail();
        app.open_detail(2);
        settle(&mut app, |a| a.loaded_detail().is_some()).await;
        assert_eq!(app.loaded_detail().unwrap().title, "Amélie");

        // Outlive the slow first request and drain again
        tokio::time::sleep(Duration::from_millis(250)).await;
        app.pump();
        let detail = app.detail.as_ref().unwrap();
        assert_eq!(detail.id, 2);
        assert_eq!(app.loaded_detail().unwrap().title, "Amélie");
    }

    #[tokio::test]
    async fn test_detail_result_with_old_ticket_is_discarded() {
        let mut app = app_with(sample_api().with_delay(2, Duration::from_millis(500)));

        app.open_detail(1);
        let first_ticket = app.detail.as_ref().unwrap().pending.as_ref().unwrap().ticket;
        app.open_detail(2);

        let applied = app.handle_message(FetchMessage::Detail {
            ticket: first_ticket,
            id: 1,
            result: Ok(detail(1, "Heat")),
        });
        assert!(!applied);
        let screen = app.detail.as_ref().unwrap();
        assert_eq!(screen.id, 2);
        assert!(screen.state.is_loading());
    }

    #[tokio::test]
    async fn test_detail_retry_after_failure() {
        let mut app = app_with(sample_api());
        app.open_detail(77);
        settle(&mut app, |a| {
            a.detail.as_ref().is_some_and(|d| d.state.failure().is_some())
        })
        .await;

        app.retry();
        assert!(app.detail.as_ref().unwrap().state.is_loading());
        settle(&mut app, |a| {
            a.detail.as_ref().is_some_and(|d| d.state.failure().is_some())
        })
        .await;
    }

    #[tokio::test]
    async fn test_paging() {
        let movies = (1..=5)
            .map(|i| summary(i, &format!("M{}", i), 100.0 - i as f64, "2000-01-01", &[]))
            .collect();
        let mut app = app_with(FakeApi::with_catalog(movies, Vec::new()));
        app.update_page_size(LIST_OVERHEAD + 2);
        assert_eq!(app.page_size, 2);

        app.load_catalog();
        settle(&mut app, |a| a.catalog.state.ready().is_some()).await;
        assert_eq!(app.page().len(), 2);

        app.list_next();
        app.list_next();
        assert_eq!(app.catalog.list_offset, 2);
        assert_eq!(app.selected_movie().map(|m| m.id), Some(3));

        app.list_prev();
        assert_eq!(app.catalog.list_offset, 0);
        assert_eq!(app.selected_movie().map(|m| m.id), Some(2));

        app.list_last();
        assert_eq!(app.selected_movie().map(|m| m.id), Some(5));
        assert_eq!(app.page().len(), 1);

        app.list_first();
        assert_eq!(app.selected_movie().map(|m| m.id), Some(1));

        app.list_page_down();
        app.list_page_down();
        app.list_page_down();
        assert_eq!(app.selected_movie().map(|m| m.id), Some(5));
    }

    #[tokio::test]
    async fn test_toggle_theme_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("preferences.json");
        let (dispatcher, inbox) = Dispatcher::new(Arc::new(FakeApi::default()));
        let mut app = App::new(dispatcher, inbox, Theme::Dark, Some(path.clone()));

        app.toggle_theme();
        assert_eq!(app.theme, Theme::Light);
        assert_eq!(Preferences::load(&path).theme, Theme::Light);

        app.toggle_theme();
        assert_eq!(Preferences::load(&path).theme, Theme::Dark);
    }
}
