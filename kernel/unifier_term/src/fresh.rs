//! Contains the definition of [`Fresh`].

/// A monotonic generator of fresh indices.
///
/// Each unification engine owns one generator and threads it through every
/// row extension it performs, so that fresh row tails created by the same
/// engine never capture each other.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default,
)]
pub struct Fresh {
    next: usize,
}

impl Fresh {
    /// Creates a generator starting at index zero.
    #[must_use]
    pub const fn new() -> Self { Self { next: 0 } }

    /// Creates a generator whose first index is `next`.
    #[must_use]
    pub const fn starting_at(next: usize) -> Self { Self { next } }

    /// Returns a new index that has never been returned by this generator.
    pub fn generate(&mut self) -> usize {
        let index = self.next;
        self.next += 1;
        index
    }

    /// Returns the number of indices generated so far (plus the starting
    /// offset).
    #[must_use]
    pub const fn generated(&self) -> usize { self.next }
}

#[cfg(test)]
mod tests {
    use super::Fresh;

    #[test]
    fn indices_are_monotonic() {
        let mut fresh = Fresh::starting_at(3);

        assert_eq!(fresh.generate(), 3);
        assert_eq!(fresh.generate(), 4);
        assert_eq!(fresh.generated(), 5);
    }

    #[test]
    fn copies_continue_independently() {
        let mut original = Fresh::new();
        original.generate();

        let mut copy = original;

        assert_eq!(copy.generate(), 1);
        assert_eq!(copy.generate(), 2);
        assert_eq!(original.generate(), 1);
    }
}
