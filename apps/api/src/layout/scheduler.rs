//! Illustration scheduling — hands each illustration to exactly one slot.
//!
//! Illustrations are indexed by `(target_chapter_index, position)`. Input order is
//! preserved inside a slot. The paginator reads an `occupancy()` snapshot to decide
//! which slot events to emit; the page assembler consumes slots with `take`.

use std::collections::{BTreeMap, VecDeque};

use crate::layout::document::{Illustration, IllustrationPosition};

type SlotKey = (usize, IllustrationPosition);

#[derive(Debug, Default)]
pub struct IllustrationScheduler {
    slots: BTreeMap<SlotKey, VecDeque<Illustration>>,
}

/// Immutable view of which slots hold illustrations, taken before pagination starts.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SlotOccupancy {
    counts: BTreeMap<SlotKey, usize>,
}

impl SlotOccupancy {
    pub fn count(&self, chapter: usize, position: IllustrationPosition) -> usize {
        self.counts.get(&(chapter, position)).copied().unwrap_or(0)
    }

    /// Illustrations targeting chapters after `chapter`.
    pub fn count_beyond(&self, chapter: usize) -> usize {
        self.counts
            .range((chapter + 1, IllustrationPosition::Top)..)
            .map(|(_, n)| n)
            .sum()
    }

    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }
}

impl IllustrationScheduler {
    pub fn new(illustrations: impl IntoIterator<Item = Illustration>) -> Self {
        let mut slots: BTreeMap<SlotKey, VecDeque<Illustration>> = BTreeMap::new();
        for illustration in illustrations {
            slots
                .entry((illustration.target_chapter_index, illustration.position))
                .or_default()
                .push_back(illustration);
        }
        Self { slots }
    }

    pub fn occupancy(&self) -> SlotOccupancy {
        SlotOccupancy {
            counts: self
                .slots
                .iter()
                .filter(|(_, queue)| !queue.is_empty())
                .map(|(key, queue)| (*key, queue.len()))
                .collect(),
        }
    }

    /// Consumes every illustration in the slot. A second call returns nothing.
    pub fn take(&mut self, chapter: usize, position: IllustrationPosition) -> Vec<Illustration> {
        self.slots
            .remove(&(chapter, position))
            .map(Vec::from)
            .unwrap_or_default()
    }

    /// Consumes every illustration targeting a chapter after `chapter`, ordered by
    /// chapter, then position, then input order.
    pub fn drain_beyond(&mut self, chapter: usize) -> Vec<Illustration> {
        let beyond = self.slots.split_off(&(chapter + 1, IllustrationPosition::Top));
        beyond.into_values().flatten().collect()
    }

    pub fn remaining(&self) -> usize {
        self.slots.values().map(VecDeque::len).sum()
    }
}
