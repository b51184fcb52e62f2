//! State of one remote fetch as seen by a client.

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RemoteData<E, T> {
    #[default]
    NotStarted,
    Pending,
    Failed(E),
    Succeeded(T),
}

impl<E, T> RemoteData<E, T> {
    /// NotStarted -> Pending. Returns false, leaving the state alone, from
    /// any other state.
    pub fn start(&mut self) -> bool {
        match self {
            RemoteData::NotStarted => {
                *self = RemoteData::Pending;
                true
            }
            _ => false,
        }
    }

    /// Pending -> Failed or Succeeded. A fetch settles at most once; results
    /// arriving in any other state are ignored.
    pub fn settle(&mut self, outcome: Result<T, E>) -> bool {
        match self {
            RemoteData::Pending => {
                *self = match outcome {
                    Ok(value) => RemoteData::Succeeded(value),
                    Err(error) => RemoteData::Failed(error),
                };
                true
            }
            _ => false,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, RemoteData::Pending)
    }

    pub fn is_settled(&self) -> bool {
        matches!(self, RemoteData::Failed(_) | RemoteData::Succeeded(_))
    }

    pub fn fold<R>(
        &self,
        not_started: impl FnOnce() -> R,
        pending: impl FnOnce() -> R,
        failed: impl FnOnce(&E) -> R,
        succeeded: impl FnOnce(&T) -> R,
    ) -> R {
        match self {
            RemoteData::NotStarted => not_started(),
            RemoteData::Pending => pending(),
            RemoteData::Failed(error) => failed(error),
            RemoteData::Succeeded(value) => succeeded(value),
        }
    }
}
