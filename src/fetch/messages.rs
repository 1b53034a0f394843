use crate::catalog::Catalog;
use crate::fetch::FetchError;
use crate::tmdb::{MovieDetail, MovieId};

/// Identifies one issued fetch. Tickets are handed out in increasing order
/// by a single dispatcher, so a screen can tell its own result apart from a
/// stale one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ticket(pub(crate) u64);

impl Ticket {
    pub fn value(self) -> u64 {
        self.0
    }
}

/// Messages sent from fetch tasks to the UI loop
#[derive(Debug)]
pub enum FetchMessage {
    /// Popular movies and genres, both or neither
    Catalog {
        ticket: Ticket,
        result: Result<Catalog, FetchError>,
    },

    /// One movie's detail record
    Detail {
        ticket: Ticket,
        id: MovieId,
        result: Result<MovieDetail, FetchError>,
    },
}

impl FetchMessage {
    pub fn ticket(&self) -> Ticket {
        match self {
            FetchMessage::Catalog { ticket, .. } | FetchMessage::Detail { ticket, .. } => *ticket,
        }
    }
}
