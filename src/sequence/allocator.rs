//! Drag-and-drop sequence renumbering

use crate::types::Sequence;

/// Anything with an identifier and an ordering key
pub trait Sequenced {
    fn item_id(&self) -> &str;
    fn sequence(&self) -> Sequence;
}

impl<T: Sequenced + ?Sized> Sequenced for &T {
    fn item_id(&self) -> &str {
        (**self).item_id()
    }

    fn sequence(&self) -> Sequence {
        (**self).sequence()
    }
}

/// New sequence number for one item
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    pub id: String,
    pub sequence: Sequence,
}

/// Result of placing one item into an ordered list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequencePlan {
    /// Where the dragged item lands
    pub moved: Assignment,
    /// Items at or after the destination, renumbered in order
    pub shifted: Vec<Assignment>,
}

impl SequencePlan {
    /// Moved item first, then the shifted items in list order
    pub fn assignments(&self) -> impl Iterator<Item = &Assignment> {
        std::iter::once(&self.moved).chain(self.shifted.iter())
    }

    /// New sequence of `id`, if this plan touches it
    pub fn sequence_of(&self, id: &str) -> Option<Sequence> {
        self.assignments()
            .find(|a| a.id == id)
            .map(|a| a.sequence)
    }
}

/// Compute sequence numbers for `moved_id` inserted at `destination_index`.
///
/// `sorted` must be ascending by sequence and must not contain the moved item.
/// The moved item gets 1 at the head of the list, otherwise one more than its
/// new predecessor; every item from the destination onward is then given the
/// next integer in turn. Indices past the end are treated as the end.
pub fn allocate<T: Sequenced>(sorted: &[T], destination_index: usize, moved_id: &str) -> SequencePlan {
    let destination_index = destination_index.min(sorted.len());

    let mut next = match destination_index {
        0 => 1,
        i => sorted[i - 1].sequence() + 1,
    };

    let moved = Assignment {
        id: moved_id.to_string(),
        sequence: next,
    };

    let shifted = sorted[destination_index..]
        .iter()
        .map(|item| {
            next += 1;
            Assignment {
                id: item.item_id().to_string(),
                sequence: next,
            }
        })
        .collect();

    SequencePlan { moved, shifted }
}

/// Drop the moved item from `items`, sort the rest and allocate.
///
/// Ties on sequence are broken by identifier so every caller sees the same order.
pub fn plan_move<T: Sequenced>(items: &[T], moved_id: &str, destination_index: usize) -> SequencePlan {
    let others = sorted_without(items, moved_id);
    allocate(&others, destination_index, moved_id)
}

/// Sequence for a new item appended after every item in `items`
pub fn next_sequence<T: Sequenced>(items: &[T]) -> Sequence {
    items.iter().map(Sequenced::sequence).max().map_or(1, |last| last + 1)
}

/// Position of `id` in `items` once sorted by sequence
pub fn current_index<T: Sequenced>(items: &[T], id: &str) -> Option<usize> {
    let mut sorted: Vec<&T> = items.iter().collect();
    sort_by_sequence(&mut sorted);
    sorted.iter().position(|item| item.item_id() == id)
}

fn sorted_without<'a, T: Sequenced>(items: &'a [T], moved_id: &str) -> Vec<&'a T> {
    let mut others: Vec<&T> = items.iter().filter(|item| item.item_id() != moved_id).collect();
    sort_by_sequence(&mut others);
    others
}

fn sort_by_sequence<T: Sequenced>(items: &mut [&T]) {
    items.sort_by(|a, b| {
        a.sequence()
            .cmp(&b.sequence())
            .then_with(|| a.item_id().cmp(b.item_id()))
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone)]
    struct Item {
        id: &'static str,
        seq: Sequence,
    }

    impl Sequenced for Item {
        fn item_id(&self) -> &str {
            self.id
        }

        fn sequence(&self) -> Sequence {
            self.seq
        }
    }

    fn items(pairs: &[(&'static str, Sequence)]) -> Vec<Item> {
        pairs.iter().map(|&(id, seq)| Item { id, seq }).collect()
    }

    #[test]
    fn test_insert_in_middle() {
        let list = items(&[("A", 1), ("B", 2), ("C", 3)]);
        let plan = allocate(&list, 1, "D");

        assert_eq!(plan.moved.sequence, 2);
        assert_eq!(plan.sequence_of("B"), Some(3));
        assert_eq!(plan.sequence_of("C"), Some(4));
        assert_eq!(plan.sequence_of("A"), None);
    }

    #[test]
    fn test_insert_at_head() {
        let list = items(&[("A", 4), ("B", 9)]);
        let plan = allocate(&list, 0, "X");

        assert_eq!(plan.moved.sequence, 1);
        assert_eq!(
            plan.shifted,
            vec![
                Assignment { id: "A".to_string(), sequence: 2 },
                Assignment { id: "B".to_string(), sequence: 3 },
            ]
        );
    }

    #[test]
    fn test_empty_list() {
        let list: Vec<Item> = Vec::new();
        let plan = allocate(&list, 0, "X");

        assert_eq!(plan.moved.sequence, 1);
        assert!(plan.shifted.is_empty());
    }

    #[test]
    fn test_append_at_end_shifts_nothing() {
        let list = items(&[("A", 1), ("B", 5)]);
        let plan = allocate(&list, 2, "X");

        assert_eq!(plan.moved.sequence, 6);
        assert!(plan.shifted.is_empty());
    }

    #[test]
    fn test_index_past_end_is_clamped() {
        let list = items(&[("A", 1)]);
        let plan = allocate(&list, 10, "X");

        assert_eq!(plan.moved.sequence, 2);
        assert!(plan.shifted.is_empty());
    }

    #[test]
    fn test_plan_move_excludes_moved_item() {
        // Unsorted input, moved item still present
        let list = items(&[("C", 3), ("A", 1), ("X", 2), ("B", 2)]);
        let plan = plan_move(&list, "X", 0);

        assert_eq!(plan.moved.sequence, 1);
        let ids: Vec<&str> = plan.shifted.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["A", "B", "C"]);
        assert_eq!(plan.sequence_of("C"), Some(4));
    }

    #[test]
    fn test_next_sequence_appends() {
        assert_eq!(next_sequence::<Item>(&[]), 1);
        let list = items(&[("B", 7), ("A", 2)]);
        assert_eq!(next_sequence(&list), 8);
        assert_eq!(next_sequence(&list), plan_move(&list, "N", list.len()).moved.sequence);
    }

    #[test]
    fn test_current_index() {
        let list = items(&[("C", 3), ("A", 1), ("B", 2)]);
        assert_eq!(current_index(&list, "A"), Some(0));
        assert_eq!(current_index(&list, "C"), Some(2));
        assert_eq!(current_index(&list, "Z"), None);
    }

    #[test]
    fn test_no_duplicates_for_every_destination() {
        let list = items(&[("A", 1), ("B", 3), ("C", 4), ("D", 10)]);

        for index in 0..=list.len() {
            let plan = allocate(&list, index, "M");

            let mut finals: Vec<(String, Sequence)> = list
                .iter()
                .map(|item| {
                    let seq = plan.sequence_of(item.id).unwrap_or(item.seq);
                    (item.id.to_string(), seq)
                })
                .collect();
            finals.push(("M".to_string(), plan.moved.sequence));

            let mut seqs: Vec<Sequence> = finals.iter().map(|(_, s)| *s).collect();
            seqs.sort_unstable();
            seqs.dedup();
            assert_eq!(seqs.len(), finals.len(), "duplicate at index {}", index);

            // Relative order of the existing items is preserved
            let order: Vec<Sequence> = list
                .iter()
                .map(|item| plan.sequence_of(item.id).unwrap_or(item.seq))
                .collect();
            assert!(order.windows(2).all(|w| w[0] < w[1]));

            // The moved item sits at the requested position
            finals.sort_by_key(|(_, s)| *s);
            assert_eq!(finals[index].0, "M");
        }
    }
}
