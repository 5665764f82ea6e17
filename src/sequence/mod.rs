//! Sequence allocation for drag-and-drop reordering
//!
//! Cards are ordered within a column and columns within a board by a positive
//! integer sequence. A reorder renumbers the dropped item and every item after
//! it, so no two items ever share a sequence once the reorder is committed.

mod allocator;

pub use allocator::{
    allocate, current_index, next_sequence, plan_move, Assignment, SequencePlan, Sequenced,
};

use crate::types::{Card, Column, Sequence};

impl Sequenced for Card {
    fn item_id(&self) -> &str {
        &self.id
    }

    fn sequence(&self) -> Sequence {
        self.sequence
    }
}

impl Sequenced for Column {
    fn item_id(&self) -> &str {
        &self.id
    }

    fn sequence(&self) -> Sequence {
        self.sequence
    }
}
