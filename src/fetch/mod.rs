mod messages;

pub use messages::{FetchMessage, Ticket};

use crate::catalog::Catalog;
use crate::tmdb::{MovieApi, MovieDetail, MovieId};
use std::sync::Arc;
use std::sync::mpsc::{Receiver, Sender};
use thiserror::Error;
use tokio::task::AbortHandle;
use tracing::{info, warn};

/// The only two ways a fetch can fail
#[derive(Error, Debug)]
pub enum FetchError {
    /// Credential missing or unusable. Raised before any request.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Network failure, non-success status or undecodable payload.
    #[error("Data unavailable: {0}")]
    DataUnavailable(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        FetchError::DataUnavailable(format!("request failed: {}", e))
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(e: serde_json::Error) -> Self {
        FetchError::DataUnavailable(format!("malformed payload: {}", e))
    }
}

/// What a screen was trying to load, for user-facing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Subject {
    Movies,
    MovieDetails,
}

impl Subject {
    fn label(self) -> &'static str {
        match self {
            Subject::Movies => "movies",
            Subject::MovieDetails => "movie details",
        }
    }
}

impl FetchError {
    /// Manual retry makes sense for data failures only
    pub fn is_retryable(&self) -> bool {
        matches!(self, FetchError::DataUnavailable(_))
    }

    /// One uniform message per screen; the technical cause goes to the log.
    pub fn user_message(&self, subject: Subject) -> String {
        match self {
            FetchError::Configuration(msg) => format!("Configuration error: {}", msg),
            FetchError::DataUnavailable(_) => format!(
                "Failed to fetch {}. Please try again later.",
                subject.label()
            ),
        }
    }
}

/// Fetch popular movies and the genre list concurrently. Succeeds only if
/// both requests do; no partial catalog is ever returned.
pub async fn load_catalog(api: &dyn MovieApi) -> Result<Catalog, FetchError> {
    let (movies, genres) =
        futures_util::future::try_join(api.popular_movies(), api.genres()).await?;
    Ok(Catalog { movies, genres })
}

/// Fetch one movie's detail record. No retry.
pub async fn load_detail(api: &dyn MovieApi, id: MovieId) -> Result<MovieDetail, FetchError> {
    api.movie_detail(id).await
}

/// An in-flight fetch owned by a screen.
#[derive(Debug)]
pub struct PendingFetch {
    pub ticket: Ticket,
    handle: AbortHandle,
}

impl PendingFetch {
    /// Stop the task. A result already queued is still filtered by ticket.
    pub fn cancel(self) {
        self.handle.abort();
    }
}

/// Runs fetches as background tasks and posts their results to one inbox.
pub struct Dispatcher {
    api: Arc<dyn MovieApi>,
    tx: Sender<FetchMessage>,
    next_ticket: u64,
}

impl Dispatcher {
    pub fn new(api: Arc<dyn MovieApi>) -> (Self, Receiver<FetchMessage>) {
        let (tx, rx) = std::sync::mpsc::channel();
        (
            Self {
                api,
                tx,
                next_ticket: 1,
            },
            rx,
        )
    }

    fn issue(&mut self) -> Ticket {
        let ticket = Ticket(self.next_ticket);
        self.next_ticket += 1;
        ticket
    }

    /// Spawn a catalog load. Must be called from within a tokio runtime.
    pub fn request_catalog(&mut self) -> PendingFetch {
        let ticket = self.issue();
        let api = Arc::clone(&self.api);
        let tx = self.tx.clone();
        info!(ticket = ticket.value(), "Loading catalog");

        let handle = tokio::spawn(async move {
            let result = load_catalog(api.as_ref()).await;
            match &result {
                Ok(catalog) => info!(
                    ticket = ticket.value(),
                    movies = catalog.movies.len(),
                    genres = catalog.genres.len(),
                    "Catalog loaded"
                ),
                Err(e) => warn!(ticket = ticket.value(), error = %e, "Catalog load failed"),
            }
            // The receiver is gone only when the app is shutting down
            let _ = tx.send(FetchMessage::Catalog { ticket, result });
        });

        PendingFetch {
            ticket,
            handle: handle.abort_handle(),
        }
    }

    /// Spawn a detail load for `id`.
    pub fn request_detail(&mut self, id: MovieId) -> PendingFetch {
        let ticket = self.issue();
        let api = Arc::clone(&self.api);
        let tx = self.tx.clone();
        info!(ticket = ticket.value(), id, "Loading movie detail");

        let handle = tokio::spawn(async move {
            let result = load_detail(api.as_ref(), id).await;
            if let Err(e) = &result {
                warn!(ticket = ticket.value(), id, error = %e, "Detail load failed");
            }
            let _ = tx.send(FetchMessage::Detail { ticket, id, result });
        });

        PendingFetch {
            ticket,
            handle: handle.abort_handle(),
        }
    }
}


#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_load_catalog_success() {
        let api = FakeApi::with_catalog(
            vec![summary(1, "A", 1.0, "2020-01-01", &[28])],
            vec![genre(28, "Action")],
        );
        let catalog = load_catalog(&api).await.unwrap();
        assert_eq!(catalog.movies.len(), 1);
        assert_eq!(catalog.genres.len(), 1);
        assert_eq!(api.call_count(), 2);
    }

    #[tokio::test]
    async fn test_load_catalog_genre_failure_is_not_partial() {
        let api = FakeApi {
            movies: Some(vec![summary(1, "A", 1.0, "2020-01-01", &[28])]),
            genres: None,
            ..Default::default()
        };
        let err = load_catalog(&api).await.unwrap_err();
        assert!(matches!(err, FetchError::DataUnavailable(_)));
    }

    #[tokio::test]
    async fn test_load_catalog_movie_failure() {
        let api = FakeApi {
            movies: None,
            genres: Some(vec![genre(28, "Action")]),
            ..Default::default()
        };
        let err = load_catalog(&api).await.unwrap_err();
        assert!(matches!(err, FetchError::DataUnavailable(_)));
    }

    #[tokio::test]
    async fn test_load_detail_unknown_id() {
        let api = FakeApi::default().with_detail(detail(7, "Seven"));
        assert_eq!(load_detail(&api, 7).await.unwrap().title, "Seven");

        let err = load_detail(&api, 8).await.unwrap_err();
        assert!(matches!(err, FetchError::DataUnavailable(_)));
    }

    #[tokio::test]
    async fn test_dispatcher_tickets_increase_and_results_arrive() {
        let api = Arc::new(
            FakeApi::with_catalog(Vec::new(), Vec::new()).with_detail(detail(5, "Five")),
        );
        let (mut dispatcher, inbox) = Dispatcher::new(api);

        let first = dispatcher.request_catalog();
        let second = dispatcher.request_detail(5);
        assert!(first.ticket < second.ticket);

        let mut received = Vec::new();
        for _ in 0..100 {
            while let Ok(msg) = inbox.try_recv() {
                received.push(msg);
            }
            if received.len() == 2 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(received.len(), 2);
        assert!(received.iter().any(|m| matches!(
            m,
            FetchMessage::Detail { id: 5, result: Ok(_), .. }
        )));
        assert!(received.iter().any(|m| matches!(
            m,
            FetchMessage::Catalog { result: Ok(_), .. }
        )));
    }

    #[tokio::test]
    async fn test_cancelled_fetch_never_reports() {
        let api = Arc::new(
            FakeApi::default()
                .with_detail(detail(9, "Nine"))
                .with_delay(9, Duration::from_millis(100)),
        );
        let (mut dispatcher, inbox) = Dispatcher::new(api);

        dispatcher.request_detail(9).cancel();
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(inbox.try_recv().is_err());
    }

    #[test]
    fn test_fetch_error_user_message() {
        let err = FetchError::DataUnavailable("HTTP 500".to_string());
        assert_eq!(
            err.user_message(Subject::Movies),
            "Failed to fetch movies. Please try again later."
        );
        assert_eq!(
            err.user_message(Subject::MovieDetails),
            "Failed to fetch movie details. Please try again later."
        );
        assert!(err.is_retryable());

        let err = FetchError::Configuration("no key".to_string());
        assert!(err.user_message(Subject::Movies).contains("no key"));
        assert!(!err.is_retryable());
    }
}
