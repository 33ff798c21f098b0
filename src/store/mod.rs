pub mod memory;

pub use memory::MemoryStore;

use crate::shared::{CoreResult, Elevator, ElevatorUpdate, Event, EventType};

/**
 * Record storage used by the core.
 *
 * The store is the single source of truth for elevator state; callers never keep an
 * authoritative copy. Implementations only need to make each call atomic on its own.
 * Read-modify-write sequences are serialised one level up by the state machine.
 */
pub trait StateStore: Send + Sync {
    /// All elevators in ascending id order.
    fn list_elevators(&self) -> CoreResult<Vec<Elevator>>;

    fn get_elevator(&self, id: u32) -> CoreResult<Elevator>;

    fn update_elevator(&self, id: u32, update: &ElevatorUpdate) -> CoreResult<()>;

    /// Appends an event stamped with the store's clock and returns it.
    fn append_event(
        &self,
        elevator_id: u32,
        event_type: EventType,
        details: serde_json::Value,
    ) -> CoreResult<Event>;

    /// Full event log in append order.
    fn list_events(&self) -> CoreResult<Vec<Event>>;
}
