use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::{MappingWarning, RemapError};
use crate::remap::RemappedClass;

/// One class to remap. `id` is whatever the caller uses to recognise the
/// item again, typically a path.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BatchInput {
    pub id: String,
    pub bytes: Vec<u8>,
}

impl BatchInput {
    pub fn new(id: impl Into<String>, bytes: Vec<u8>) -> Self {
        BatchInput {
            id: id.into(),
            bytes,
        }
    }
}

/// Shared flag that stops a running batch before its next item.
#[derive(Clone, Debug, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Clone, Debug, Default)]
pub struct BatchOptions {
    /// Worker threads; `None` uses the global rayon pool.
    pub threads: Option<usize>,
    pub cancellation: CancellationToken,
}

#[derive(Clone, Debug, PartialEq)]
pub enum ItemOutcome {
    Remapped(RemappedClass),
    Failed(RemapError),
    /// The batch was cancelled before the item started.
    Cancelled,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ItemReport {
    pub id: String,
    pub outcome: ItemOutcome,
}

impl ItemReport {
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, ItemOutcome::Remapped(_))
    }

    pub fn remapped(&self) -> Option<&RemappedClass> {
        match &self.outcome {
            ItemOutcome::Remapped(class) => Some(class),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&RemapError> {
        match &self.outcome {
            ItemOutcome::Failed(e) => Some(e),
            _ => None,
        }
    }

    pub fn warnings(&self) -> &[MappingWarning] {
        self.remapped().map_or(&[], |class| class.warnings.as_slice())
    }
}

/// Per-item outcomes, in input order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BatchReport {
    pub items: Vec<ItemReport>,
}

impl BatchReport {
    /// True only when every item was remapped.
    pub fn is_success(&self) -> bool {
        self.items.iter().all(ItemReport::is_success)
    }

    pub fn remapped(&self) -> impl Iterator<Item = (&str, &RemappedClass)> {
        self.items
            .iter()
            .filter_map(|item| Some((item.id.as_str(), item.remapped()?)))
    }

    pub fn failures(&self) -> impl Iterator<Item = (&str, &RemapError)> {
        self.items
            .iter()
            .filter_map(|item| Some((item.id.as_str(), item.error()?)))
    }

    pub fn warnings(&self) -> impl Iterator<Item = (&str, &MappingWarning)> {
        self.items.iter().flat_map(|item| {
            item.warnings()
                .iter()
                .map(move |warning| (item.id.as_str(), warning))
        })
    }

    pub fn success_count(&self) -> usize {
        self.remapped().count()
    }

    pub fn failure_count(&self) -> usize {
        self.failures().count()
    }

    pub fn cancelled_count(&self) -> usize {
        self.items
            .iter()
            .filter(|item| item.outcome == ItemOutcome::Cancelled)
            .count()
    }
}
