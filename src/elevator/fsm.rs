/***************************************/
/*        3rd party libraries          */
/***************************************/
use log::{debug, warn};
use parking_lot::{Mutex, MutexGuard};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;

/***************************************/
/*           Local modules             */
/***************************************/
use crate::config::BuildingConfig;
use crate::shared::ElevatorState::{DoorsOpen, Idle, Moving};
use crate::shared::{CoreError, CoreResult, Direction, Elevator, ElevatorUpdate, Event, EventType};
use crate::store::StateStore;

/**
 * Guards elevator state transitions.
 *
 * The `ElevatorStateMachine` is the only path through which elevator records are mutated.
 * Each update is merged with the stored record, checked against the transition rules,
 * written back, and recorded as exactly one event.
 *
 * # Fields
 * - `store`:       Backing store, the single source of truth.
 * - `building`:    Floor range used to bound `current_floor`.
 * - `locks`:       One mutex per elevator, built from the fleet at construction.
 *
 * Elevators are never created after construction, so the lock table is fixed.
 */
pub struct ElevatorStateMachine {
    store: Arc<dyn StateStore>,
    building: BuildingConfig,
    locks: HashMap<u32, Mutex<()>>,
}

/// Exclusive access to one elevator. Dropping it releases the elevator.
pub struct ElevatorGuard<'a> {
    machine: &'a ElevatorStateMachine,
    elevator_id: u32,
    _lock: MutexGuard<'a, ()>,
}

impl ElevatorStateMachine {
    pub fn new(store: Arc<dyn StateStore>, building: &BuildingConfig) -> CoreResult<ElevatorStateMachine> {
        let locks = store
            .list_elevators()?
            .into_iter()
            .map(|elevator| (elevator.id, Mutex::new(())))
            .collect();

        Ok(ElevatorStateMachine {
            store,
            building: building.clone(),
            locks,
        })
    }

    pub fn store(&self) -> &Arc<dyn StateStore> {
        &self.store
    }

    /// Blocks until the elevator is free. Fails with `NotFound` for ids outside the fleet.
    pub fn lock(&self, elevator_id: u32) -> CoreResult<ElevatorGuard<'_>> {
        let lock = self
            .locks
            .get(&elevator_id)
            .ok_or(CoreError::NotFound(elevator_id))?;

        Ok(ElevatorGuard {
            machine: self,
            elevator_id,
            _lock: lock.lock(),
        })
    }

    pub fn read(&self, elevator_id: u32) -> CoreResult<Elevator> {
        self.store.get_elevator(elevator_id)
    }

    pub fn apply(&self, elevator_id: u32, update: ElevatorUpdate) -> CoreResult<Elevator> {
        self.lock(elevator_id)?.apply(update)
    }

    fn commit(
        &self,
        elevator_id: u32,
        update: &ElevatorUpdate,
        event_type: EventType,
        extra: serde_json::Value,
    ) -> CoreResult<(Elevator, Event)> {
        let current = self.store.get_elevator(elevator_id)?;
        let next = current.merged(update);

        if let Err(reason) = self.check_transition(&current, &next) {
            warn!(
                "Refusing update for elevator {}: {} ({:?} -> {:?})",
                elevator_id, reason, current.state, next.state
            );
            return Err(CoreError::InvalidTransition { elevator_id, reason });
        }

        self.store.update_elevator(elevator_id, update)?;

        let mut details = json!({
            "state": next.state,
            "direction": next.direction,
            "current_floor": next.current_floor,
        });
        if let (Some(details), serde_json::Value::Object(extra)) = (details.as_object_mut(), extra) {
            details.extend(extra);
        }
        let event = self.store.append_event(elevator_id, event_type, details)?;

        debug!(
            "Elevator {}: {} {:?} floor {}",
            elevator_id, next.state, next.direction, next.current_floor
        );
        Ok((next, event))
    }

    fn check_transition(&self, current: &Elevator, next: &Elevator) -> Result<(), String> {
        // direction = Stop <=> state = Idle <=> active_job = none
        let idle = next.state == Idle;
        if idle != (next.direction == Direction::Stop) {
            return Err(format!("direction {:?} not allowed while {}", next.direction, next.state));
        }
        if idle != next.active_job.is_none() {
            return Err(format!("active job must be present exactly when not idle, state is {}", next.state));
        }

        if !self.building.contains(next.current_floor) {
            return Err(format!("floor {} is outside the building", next.current_floor));
        }
        if next.current_floor != current.current_floor {
            if current.state != Moving || next.state != Moving {
                return Err("floor can only change while moving".to_string());
            }
            if next.current_floor.abs_diff(current.current_floor) != 1 {
                return Err(format!(
                    "floor jump from {} to {}",
                    current.current_floor, next.current_floor
                ));
            }
        }

        let legal = matches!(
            (current.state, next.state),
            (Idle, Idle) | (Idle, Moving) | (Moving, Moving) | (Moving, DoorsOpen) | (DoorsOpen, DoorsOpen) | (DoorsOpen, Idle)
        );
        if !legal {
            return Err(format!("{} -> {} is not a legal transition", current.state, next.state));
        }

        if current.state != Idle && next.state != Idle && current.active_job != next.active_job {
            return Err("active job cannot change before the elevator is idle".to_string());
        }
        Ok(())
    }
}

impl<'a> ElevatorGuard<'a> {
    pub fn elevator_id(&self) -> u32 {
        self.elevator_id
    }

    pub fn read(&self) -> CoreResult<Elevator> {
        self.machine.read(self.elevator_id)
    }

    /// Merges `update` and records a `state_update` event.
    pub fn apply(&mut self, update: ElevatorUpdate) -> CoreResult<Elevator> {
        self.apply_with(update, EventType::StateUpdate, json!({}))
    }

    /// Merges `update` and records a single event of `event_type`. `extra` fields are
    /// added to the event's state details.
    pub fn apply_with(
        &mut self,
        update: ElevatorUpdate,
        event_type: EventType,
        extra: serde_json::Value,
    ) -> CoreResult<Elevator> {
        self.machine
            .commit(self.elevator_id, &update, event_type, extra)
            .map(|(elevator, _)| elevator)
    }
}
