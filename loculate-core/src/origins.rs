use crate::types::MAX_SAVED_ORIGINS;
use thiserror::Error;

/// Sentinel index meaning "no origin selected".
pub const NO_SELECTION: i64 = -1;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OriginError {
    #[error("origin address is empty")]
    Empty,
    #[error("Origin limit reached")]
    LimitReached,
    #[error("no saved origin at index {0}")]
    OutOfRange(i64),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddOutcome {
    /// A new entry was appended and selected.
    Added(usize),
    /// The input matched an existing entry, which is now selected.
    SelectedExisting(usize),
}

impl AddOutcome {
    pub fn index(&self) -> usize {
        match self {
            AddOutcome::Added(i) | AddOutcome::SelectedExisting(i) => *i,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteOutcome {
    pub removed: String,
    /// The deleted entry was the selected one; selection is now `-1`.
    pub selection_cleared: bool,
}

/// Brings a possibly stale index back into `[-1, len - 1]`.
///
/// Store reads are not atomic across keys, so every reader runs this instead of
/// trusting the stored index.
pub fn reconcile_index(selected: i64, len: usize) -> i64 {
    if selected < 0 || len == 0 {
        return NO_SELECTION;
    }
    let last = (len - 1) as i64;
    selected.min(last)
}

/// The ordered saved-origin list plus its selected index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedOrigins {
    origins: Vec<String>,
    selected: i64,
}

impl Default for SavedOrigins {
    fn default() -> Self {
        Self::empty()
    }
}

impl SavedOrigins {
    pub fn empty() -> Self {
        Self {
            origins: vec![],
            selected: NO_SELECTION,
        }
    }

    /// Builds a reconciled list from raw store values.
    pub fn from_parts(mut origins: Vec<String>, selected: i64) -> Self {
        if origins.len() > MAX_SAVED_ORIGINS {
            log::warn!(
                "stored origin list has {} entries; keeping the first {MAX_SAVED_ORIGINS}",
                origins.len()
            );
            origins.truncate(MAX_SAVED_ORIGINS);
        }
        let selected = reconcile_index(selected, origins.len());
        Self { origins, selected }
    }

    pub fn entries(&self) -> &[String] {
        &self.origins
    }

    pub fn len(&self) -> usize {
        self.origins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.origins.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.origins.len() >= MAX_SAVED_ORIGINS
    }

    pub fn selected_index(&self) -> i64 {
        self.selected
    }

    pub fn selected_origin(&self) -> Option<&str> {
        usize::try_from(self.selected)
            .ok()
            .and_then(|i| self.origins.get(i))
            .map(String::as_str)
    }

    pub fn position_of(&self, address: &str) -> Option<usize> {
        let needle = address.trim().to_lowercase();
        self.origins
            .iter()
            .position(|o| o.trim().to_lowercase() == needle)
    }

    /// Saves `input` as an origin, or selects the existing case-insensitive match.
    pub fn add(&mut self, input: &str) -> Result<AddOutcome, OriginError> {
        let address = input.trim();
        if address.is_empty() {
            return Err(OriginError::Empty);
        }

        if let Some(i) = self.position_of(address) {
            self.selected = i as i64;
            return Ok(AddOutcome::SelectedExisting(i));
        }

        if self.is_full() {
            return Err(OriginError::LimitReached);
        }

        self.origins.push(address.to_string());
        let i = self.origins.len() - 1;
        self.selected = i as i64;
        Ok(AddOutcome::Added(i))
    }

    pub fn select(&mut self, index: usize) -> Result<(), OriginError> {
        if index >= self.origins.len() {
            return Err(OriginError::OutOfRange(index as i64));
        }
        self.selected = index as i64;
        Ok(())
    }

    pub fn delete(&mut self, index: usize) -> Result<DeleteOutcome, OriginError> {
        if index >= self.origins.len() {
            return Err(OriginError::OutOfRange(index as i64));
        }

        let removed = self.origins.remove(index);
        let index = index as i64;
        let selection_cleared = index == self.selected;
        if selection_cleared {
            self.selected = NO_SELECTION;
        } else if index < self.selected {
            // Keep pointing at the same logical entry.
            self.selected -= 1;
        }

        Ok(DeleteOutcome {
            removed,
            selection_cleared,
        })
    }
}
