/// Lifecycle of a screen's single required fetch:
/// `Idle → Loading → (Ready | Failed)`, with `Failed → Loading` on retry and
/// `Ready → Loading` on re-fetch.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadState<T> {
    Idle,
    Loading,
    Ready(T),
    Failed(String),
}

impl<T> Default for LoadState<T> {
    fn default() -> Self {
        LoadState::Idle
    }
}

impl<T> LoadState<T> {
    /// Enter `Loading`. Returns `false` (and changes nothing) if a load is
    /// already in progress.
    pub fn begin(&mut self) -> bool {
        if self.is_loading() {
            return false;
        }
        *self = LoadState::Loading;
        true
    }

    /// Settle an outstanding load. Ignored unless currently `Loading`.
    pub fn resolve(&mut self, outcome: Result<T, String>) -> bool {
        if !self.is_loading() {
            return false;
        }
        *self = match outcome {
            Ok(value) => LoadState::Ready(value),
            Err(message) => LoadState::Failed(message),
        };
        true
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, LoadState::Loading)
    }

    pub fn ready(&self) -> Option<&T> {
        match self {
            LoadState::Ready(value) => Some(value),
            _ => None,
        }
    }

    pub fn failure(&self) -> Option<&str> {
        match self {
            LoadState::Failed(message) => Some(message),
            _ => None,
        }
    }
}
