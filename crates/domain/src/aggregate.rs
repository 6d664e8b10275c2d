//! Aggregate root contract.

use common::Version;

/// Trait for aggregate roots that record domain events.
///
/// An aggregate is a cluster of domain objects treated as a single unit for
/// data changes. It records the events raised by its operations; the events
/// stay pending until the unit of work drains them with [`take_events`].
///
/// [`take_events`]: Aggregate::take_events
pub trait Aggregate {
    /// Identity of the aggregate.
    type Id;

    /// The type of events this aggregate records.
    type Event;

    /// Returns the aggregate type name.
    fn aggregate_type() -> &'static str;

    /// Returns the aggregate's identity.
    fn id(&self) -> &Self::Id;

    /// Returns the optimistic concurrency token.
    fn version(&self) -> Version;

    /// Returns the events raised since the last drain, oldest first.
    fn pending_events(&self) -> &[Self::Event];

    /// Removes and returns the pending events, oldest first.
    fn take_events(&mut self) -> Vec<Self::Event>;
}
