/***************************************/
/*        3rd party libraries          */
/***************************************/
use log::{error, info};
use std::sync::Arc;

/***************************************/
/*           Local modules             */
/***************************************/
use crate::config::Config;
use crate::coordinator::{Dispatcher, StatusQuery};
use crate::elevator::{ElevatorStateMachine, MovementSimulator};
use crate::shared::{CallResult, CoreResult, Elevator, Event};
use crate::store::{MemoryStore, StateStore};
use crate::timer::Timer;

/**
 * Request surface of the simulator.
 *
 * Builds an in-memory fleet from the configuration and wires store, state machine,
 * movement simulator, dispatcher and status query around one timer.
 */
pub struct ElevatorSystem {
    store: Arc<dyn StateStore>,
    dispatcher: Dispatcher,
    status: StatusQuery,
}

impl ElevatorSystem {
    pub fn new<T>(config: &Config, timer: Arc<T>) -> CoreResult<ElevatorSystem>
    where
        T: Timer + 'static,
    {
        let store: Arc<dyn StateStore> = Arc::new(MemoryStore::with_fleet(
            timer.clone(),
            config.building.elevator_count,
            config.building.start_floor(),
        ));
        ElevatorSystem::with_store(config, timer, store)
    }

    /// Uses an existing store. The fleet is whatever the store holds at this point.
    pub fn with_store<T>(config: &Config, timer: Arc<T>, store: Arc<dyn StateStore>) -> CoreResult<ElevatorSystem>
    where
        T: Timer + 'static,
    {
        let machine = Arc::new(ElevatorStateMachine::new(store.clone(), &config.building)?);
        let simulator = Arc::new(MovementSimulator::new(&config.elevator, machine, timer));
        let dispatcher = Dispatcher::new(&config.building, simulator);
        let status = StatusQuery::new(store.clone());

        info!("Elevator system ready with {} elevators", store.list_elevators()?.len());
        Ok(ElevatorSystem {
            store,
            dispatcher,
            status,
        })
    }

    /// Store failures come back as a failed result rather than an error.
    pub fn call_elevator(&self, start_floor: i32, end_floor: i32) -> CallResult {
        match self.dispatcher.call(start_floor, end_floor) {
            Ok(result) => result,
            Err(e) => {
                error!("Call {} -> {} failed: {}", start_floor, end_floor, e);
                CallResult::rejected(&format!("Internal error: {}", e))
            }
        }
    }

    pub fn elevator_status(&self, elevator_id: Option<u32>) -> CoreResult<Vec<Elevator>> {
        self.status.status(elevator_id)
    }

    pub fn events(&self) -> CoreResult<Vec<Event>> {
        self.store.list_events()
    }

    pub fn events_for(&self, elevator_id: u32) -> CoreResult<Vec<Event>> {
        Ok(self
            .store
            .list_events()?
            .into_iter()
            .filter(|event| event.elevator_id == elevator_id)
            .collect())
    }
}
