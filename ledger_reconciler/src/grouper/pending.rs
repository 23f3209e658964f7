use crate::db_types::RawEntry;

#[derive(Debug, Clone)]
struct Slot {
    entry: RawEntry,
    consumed: bool,
}

/// The lifecycle of the candidate backlog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BacklogState {
    /// No unconsumed candidates.
    Empty,
    /// Candidates have been collected and none has been claimed yet.
    Accumulating,
    /// At least one candidate in the current working set has been claimed by a sell.
    PartiallyConsumed,
}

/// Rewards and refunds waiting for the sell order they settle.
///
/// Candidates live in an arena. Pairing marks a slot as consumed instead of removing it, so indices stay stable while a
/// batch is processed. [`PendingMatches::carry_forward`] compacts the arena before the set is handed to the next batch.
#[derive(Debug, Clone, Default)]
pub struct PendingMatches {
    slots: Vec<Slot>,
}

impl PendingMatches {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a candidate. Returns `false` and leaves the set untouched if an entry with the same id is already present,
    /// consumed or not.
    pub fn push(&mut self, entry: RawEntry) -> bool {
        if self.slots.iter().any(|s| s.entry.id == entry.id) {
            return false;
        }
        self.slots.push(Slot { entry, consumed: false });
        true
    }

    /// The number of unconsumed candidates.
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| !s.consumed).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, id: &str) -> bool {
        self.unconsumed().any(|(_, e)| e.id == id)
    }

    pub fn state(&self) -> BacklogState {
        if self.is_empty() {
            BacklogState::Empty
        } else if self.slots.iter().any(|s| s.consumed) {
            BacklogState::PartiallyConsumed
        } else {
            BacklogState::Accumulating
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &RawEntry> {
        self.unconsumed().map(|(_, e)| e)
    }

    pub(crate) fn unconsumed(&self) -> impl Iterator<Item = (usize, &RawEntry)> {
        self.slots.iter().enumerate().filter(|(_, s)| !s.consumed).map(|(i, s)| (i, &s.entry))
    }

    pub(crate) fn get(&self, index: usize) -> Option<&RawEntry> {
        self.slots.get(index).filter(|s| !s.consumed).map(|s| &s.entry)
    }

    /// Claims the candidate at `index`. A slot can only be claimed once; claiming it again returns `None`.
    pub(crate) fn consume(&mut self, index: usize) -> Option<RawEntry> {
        let slot = self.slots.get_mut(index)?;
        if slot.consumed {
            return None;
        }
        slot.consumed = true;
        Some(slot.entry.clone())
    }

    /// Drops the consumed slots, leaving the survivors in arrival order.
    pub fn carry_forward(self) -> Self {
        let slots = self.slots.into_iter().filter(|s| !s.consumed).collect();
        Self { slots }
    }

    pub fn into_entries(self) -> Vec<RawEntry> {
        self.slots.into_iter().filter(|s| !s.consumed).map(|s| s.entry).collect()
    }
}

impl FromIterator<RawEntry> for PendingMatches {
    fn from_iter<T: IntoIterator<Item = RawEntry>>(iter: T) -> Self {
        let mut pending = Self::new();
        iter.into_iter().for_each(|e| {
            pending.push(e);
        });
        pending
    }
}
