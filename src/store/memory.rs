/***************************************/
/*        3rd party libraries          */
/***************************************/
use log::debug;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::Arc;

/***************************************/
/*           Local modules             */
/***************************************/
use super::StateStore;
use crate::shared::{CoreError, CoreResult, Elevator, ElevatorUpdate, Event, EventType};
use crate::timer::Clock;

/**
 * In-process store keeping elevators in a `BTreeMap` and events in an append-only `Vec`.
 *
 * Event timestamps come from the clock handed in at construction, so a simulation
 * driven by a `ManualClock` gets virtual timestamps.
 */
pub struct MemoryStore {
    clock: Arc<dyn Clock>,
    elevators: Mutex<BTreeMap<u32, Elevator>>,
    events: Mutex<Vec<Event>>,
}

impl MemoryStore {
    pub fn new(clock: Arc<dyn Clock>) -> MemoryStore {
        MemoryStore {
            clock,
            elevators: Mutex::new(BTreeMap::new()),
            events: Mutex::new(Vec::new()),
        }
    }

    /// Store holding `count` idle elevators with ids `1..=count`, all on `floor`.
    pub fn with_fleet(clock: Arc<dyn Clock>, count: u32, floor: i32) -> MemoryStore {
        let store = MemoryStore::new(clock);
        for id in 1..=count {
            store.insert_elevator(Elevator::new(id, floor));
        }
        store
    }

    /// Adds or replaces an elevator record as is, bypassing transition checks.
    pub fn insert_elevator(&self, elevator: Elevator) {
        debug!("Storing elevator {} at floor {}", elevator.id, elevator.current_floor);
        self.elevators.lock().insert(elevator.id, elevator);
    }

    /// Drops an elevator record. Movement chains for it stop at their next step.
    pub fn remove_elevator(&self, id: u32) -> Option<Elevator> {
        self.elevators.lock().remove(&id)
    }
}

impl StateStore for MemoryStore {
    fn list_elevators(&self) -> CoreResult<Vec<Elevator>> {
        Ok(self.elevators.lock().values().cloned().collect())
    }

    fn get_elevator(&self, id: u32) -> CoreResult<Elevator> {
        self.elevators
            .lock()
            .get(&id)
            .cloned()
            .ok_or(CoreError::NotFound(id))
    }

    fn update_elevator(&self, id: u32, update: &ElevatorUpdate) -> CoreResult<()> {
        let mut elevators = self.elevators.lock();
        let elevator = elevators.get_mut(&id).ok_or(CoreError::NotFound(id))?;
        *elevator = elevator.merged(update);
        Ok(())
    }

    fn append_event(
        &self,
        elevator_id: u32,
        event_type: EventType,
        details: serde_json::Value,
    ) -> CoreResult<Event> {
        let mut events = self.events.lock();
        let event = Event {
            id: events.len() as u64 + 1,
            timestamp_ms: self.clock.now_ms(),
            elevator_id,
            event_type,
            details,
        };
        events.push(event.clone());
        Ok(event)
    }

    fn list_events(&self) -> CoreResult<Vec<Event>> {
        Ok(self.events.lock().clone())
    }
}
