//! Prolated durations and score offsets.
//!
//! Durations are exact rationals in whole notes. A leaf's *preprolated*
//! duration is its written duration times its own multiplier; its
//! *prolation* is the product of the multipliers of every tuplet above it.
//! Sequential containers last as long as the sum of their children and
//! parallel containers as long as the longest child.

use crate::components::{ComponentId, ComponentKind, ContainerKind, ScoreTree};
use crate::types::{Duration, Multiplier};
use num_traits::{One, Zero};

impl ScoreTree {
    /// Duration before prolation by enclosing tuplets.
    pub fn preprolated_duration(&self, id: ComponentId) -> Duration {
        let Ok(component) = self.component(id) else {
            return Duration::zero();
        };
        match &component.kind {
            ComponentKind::Leaf(leaf) => {
                leaf.written_duration * leaf.multiplier.unwrap_or_else(Multiplier::one)
            }
            ComponentKind::Container(container) => {
                let contents = self.contents_duration(id);
                match &container.kind {
                    ContainerKind::Tuplet { multiplier } => contents * *multiplier,
                    _ => contents,
                }
            }
        }
    }

    /// Sum (sequential) or maximum (parallel) of the children's preprolated durations.
    pub fn contents_duration(&self, id: ComponentId) -> Duration {
        let durations = self
            .children(id)
            .iter()
            .map(|&child| self.preprolated_duration(child));
        if self.is_parallel(id) {
            durations.max().unwrap_or_else(Duration::zero)
        } else {
            durations.fold(Duration::zero(), |total, d| total + d)
        }
    }

    /// Product of the multipliers of every tuplet strictly above `id`.
    pub fn prolation(&self, id: ComponentId) -> Multiplier {
        self.parentage(id, false)
            .into_iter()
            .filter_map(|ancestor| self.container_kind(ancestor).and_then(ContainerKind::tuplet_multiplier))
            .fold(Multiplier::one(), |total, m| total * m)
    }

    /// Sounding duration of `id`.
    pub fn duration(&self, id: ComponentId) -> Duration {
        self.preprolated_duration(id) * self.prolation(id)
    }

    /// Offset from the start of the root of `id`.
    pub fn start_offset(&self, id: ComponentId) -> Duration {
        let Some(parent) = self.parent(id) else {
            return Duration::zero();
        };
        let mut offset = self.start_offset(parent);
        if !self.is_parallel(parent) {
            for &sibling in self.children(parent) {
                if sibling == id {
                    break;
                }
                offset += self.duration(sibling);
            }
        }
        offset
    }

    pub fn stop_offset(&self, id: ComponentId) -> Duration {
        self.start_offset(id) + self.duration(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{duration, Pitch};

    #[test]
    fn test_sequential_offsets() {
        let mut tree = ScoreTree::new();
        let voice = tree.voice(None);
        let a = tree.note(Pitch::default(), duration(1, 4)).unwrap();
        let b = tree.note(Pitch::default(), duration(3, 8)).unwrap();
        let c = tree.rest(duration(1, 8)).unwrap();
        tree.extend(voice, &[a, b, c]).unwrap();

        assert_eq!(tree.start_offset(b), duration(1, 4));
        assert_eq!(tree.stop_offset(b), duration(5, 8));
        assert_eq!(tree.start_offset(c), duration(5, 8));
        assert_eq!(tree.duration(voice), duration(3, 4));
    }

    #[test]
    fn test_tuplet_prolation() {
        let mut tree = ScoreTree::new();
        let voice = tree.voice(None);
        let tuplet = tree.tuplet(duration(2, 3)).unwrap();
        let notes: Vec<_> = (0..3)
            .map(|_| tree.note(Pitch::default(), duration(1, 8)).unwrap())
            .collect();
        tree.extend(tuplet, &notes).unwrap();
        let after = tree.note(Pitch::default(), duration(1, 4)).unwrap();
        tree.extend(voice, &[tuplet, after]).unwrap();

        assert_eq!(tree.prolation(notes[0]), duration(2, 3));
        assert_eq!(tree.duration(notes[0]), duration(1, 12));
        assert_eq!(tree.preprolated_duration(tuplet), duration(1, 4));
        assert_eq!(tree.start_offset(notes[2]), duration(1, 6));
        assert_eq!(tree.start_offset(after), duration(1, 4));
    }

    #[test]
    fn test_leaf_multiplier() {
        let mut tree = ScoreTree::new();
        let note = tree.note(Pitch::default(), duration(1, 4)).unwrap();
        tree.set_multiplier(note, Some(duration(1, 2))).unwrap();
        assert_eq!(tree.duration(note), duration(1, 8));
    }

    #[test]
    fn test_parallel_contents_take_the_longest() {
        let mut tree = ScoreTree::new();
        let staff = tree.staff(None);
        tree.set_parallel(staff, true).unwrap();
        let upper = tree.voice(None);
        let lower = tree.voice(None);
        let long = tree.note(Pitch::default(), duration(1, 1)).unwrap();
        let short = tree.note(Pitch::default(), duration(1, 2)).unwrap();
        tree.append(upper, long).unwrap();
        tree.append(lower, short).unwrap();
        tree.extend(staff, &[upper, lower]).unwrap();

        assert_eq!(tree.contents_duration(staff), duration(1, 1));
        assert_eq!(tree.start_offset(lower), duration(0, 1));
        assert_eq!(tree.start_offset(short), duration(0, 1));
    }
}
