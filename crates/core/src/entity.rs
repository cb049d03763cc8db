//! Entity trait: identity + continuity across state changes.

/// Entity marker + minimal interface.
///
/// Master data (companies, AFIP error codes) are entities: they are looked up
/// and updated by id but carry no event history.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;
}
