//! The tag every stored value carries.

/// Which of the five value types a cell holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Str,
    Hash,
    Set,
    SortedSet,
    List,
}
