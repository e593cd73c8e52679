use crate::types::WalkerId;

/// Per-walker scratch flags filled during one micro-step.
///
/// For each `WalkerId`, this buffer stores:
///
/// - Whether the walker touches the aggregate (any of its four axis
///   neighbors is occupied).
/// - Whether the walker won its sticking draw this micro-step.
///
/// The buffer is reused across micro-steps to avoid reallocating; call
/// [`ContactBuffer::ensure_len`] at the start of each contact pass.
#[derive(Debug, Default)]
pub struct ContactBuffer {
    /// `true` if the walker has an occupied axis neighbor.
    pub(crate) touching: Vec<bool>,
    /// `true` if the walker sticks this micro-step.
    pub(crate) sticks: Vec<bool>,
}

impl ContactBuffer {
    /// Creates a cleared buffer with room for `len` walkers.
    pub fn with_len(len: usize) -> Self {
        Self {
            touching: vec![false; len],
            sticks: vec![false; len],
        }
    }

    /// Resizes to exactly `len` entries and clears every flag, even if the
    /// length was already correct.
    pub fn ensure_len(&mut self, len: usize) {
        if self.touching.len() != len {
            self.touching.resize(len, false);
            self.sticks.resize(len, false);
        }
        self.clear();
    }

    pub fn clear(&mut self) {
        self.touching.fill(false);
        self.sticks.fill(false);
    }

    pub fn len(&self) -> usize {
        self.touching.len()
    }

    pub fn is_empty(&self) -> bool {
        self.touching.is_empty()
    }

    #[inline]
    pub fn is_touching(&self, id: WalkerId) -> bool {
        self.touching[id]
    }

    #[inline]
    pub fn mark_stick(&mut self, id: WalkerId) {
        self.sticks[id] = true;
    }

    /// Ids of walkers that touch the aggregate, ascending.
    pub fn touching_indices(&self) -> impl Iterator<Item = WalkerId> + '_ {
        self.touching
            .iter()
            .enumerate()
            .filter_map(|(i, &t)| if t { Some(i) } else { None })
    }

    /// Ids of walkers that stick this micro-step, ascending.
    pub fn sticking_indices(&self) -> impl Iterator<Item = WalkerId> + '_ {
        self.sticks
            .iter()
            .enumerate()
            .filter_map(|(i, &s)| if s { Some(i) } else { None })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn with_len_starts_cleared() {
        let buf = ContactBuffer::with_len(4);
        assert_eq!(buf.len(), 4);
        assert!(buf.touching_indices().next().is_none());
        assert!(buf.sticking_indices().next().is_none());
    }

    #[test]
    fn ensure_len_resizes_and_clears() {
        let mut buf = ContactBuffer::with_len(2);
        buf.touching[1] = true;
        buf.mark_stick(1);

        buf.ensure_len(2);
        assert!(!buf.is_touching(1));
        assert!(buf.sticking_indices().next().is_none());

        buf.ensure_len(5);
        assert_eq!(buf.len(), 5);
        assert_eq!(buf.sticks.len(), 5);
        assert!(buf.touching.iter().all(|&t| !t));

        buf.ensure_len(0);
        assert!(buf.is_empty());
    }

    #[test]
    fn indices_are_ascending_and_filtered() {
        let mut buf = ContactBuffer::with_len(5);
        buf.touching[3] = true;
        buf.touching[0] = true;
        buf.mark_stick(3);

        assert_eq!(buf.touching_indices().collect::<Vec<_>>(), vec![0, 3]);
        assert_eq!(buf.sticking_indices().collect::<Vec<_>>(), vec![3]);

        buf.clear();
        assert!(buf.touching_indices().next().is_none());
    }
}
