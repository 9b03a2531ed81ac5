// This macro generates a struct which wraps a dense index. Indices are handed out from `0` upwards
// and always fit in a `usize`.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

macro_rules! IdxNewtype {
    ($(#[$attr:meta])* $n: ident) => {
        $(#[$attr])*
        #[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
        #[cfg_attr(feature="serde", derive(Serialize, Deserialize))]
        pub struct $n(pub usize);

        impl From<$n> for usize {
            fn from(idx: $n) -> Self {
                idx.0
            }
        }

        impl From<usize> for $n {
            fn from(v: usize) -> Self {
                $n(v)
            }
        }

        impl std::fmt::Display for $n {
            fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    }
}

IdxNewtype!(
    /// A type specifically for terminal indices.
    ///
    /// Terminal indices follow the order in which the grammar declares its terminals.
    TIdx);
IdxNewtype!(
    /// A type specifically for nonterminal indices. The augmenting start nonterminal never has
    /// one.
    NTIdx);
IdxNewtype!(
    /// A type specifically for production indices (e.g. a nonterminal `E: A | B;` has two
    /// productions). Productions are numbered across the whole grammar, nonterminal by
    /// nonterminal.
    PIdx);
IdxNewtype!(
    /// A type specifically for automaton state indices. A state's index is its position in the
    /// automaton.
    StIdx);

#[cfg(test)]
mod test {
    use super::{PIdx, StIdx, TIdx};

    #[test]
    fn test_conversions() {
        assert_eq!(usize::from(TIdx(3)), 3);
        assert_eq!(StIdx::from(7usize), StIdx(7));
        assert!(PIdx(1) < PIdx(2));
        assert_eq!(format!("{}", StIdx(12)), "12");
    }
}
