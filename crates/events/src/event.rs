/// A domain-agnostic event.
///
/// Events are immutable, append-only facts.
pub trait Event: Clone + core::fmt::Debug + Send + Sync + 'static {
    /// Stable event name/type identifier (e.g. "accounting.move.posted").
    fn event_type(&self) -> &'static str;
}
