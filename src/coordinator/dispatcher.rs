/***************************************/
/*        3rd party libraries          */
/***************************************/
use log::{debug, info, warn};
use parking_lot::Mutex;
use serde_json::json;
use std::collections::HashSet;
use std::sync::Arc;
use uuid::Uuid;

/***************************************/
/*           Local modules             */
/***************************************/
use crate::config::BuildingConfig;
use crate::elevator::{ElevatorGuard, MovementSimulator, OnLegComplete};
use crate::shared::{ActiveJob, CallResult, CoreError, CoreResult, Elevator, EventType};

pub const INVALID_FLOORS: &str = "Invalid floor numbers.";
pub const NO_IDLE_ELEVATORS: &str = "No idle elevators available.";

/**
 * Assigns calls to elevators and sequences the two legs of each job.
 *
 * Leg 1 takes the chosen elevator from where it stands to the pickup floor. Leg 2 is
 * handed to the simulator as the completion continuation of leg 1: once leg 1's doors
 * close the elevator is reserved, and leg 2 starts one door interval later. A reserved
 * elevator is Idle but never selected, so no other call can claim it in between.
 *
 * # Fields
 * - `simulator`:       Drives the legs.
 * - `building`:        Valid floor range for calls.
 * - `dispatch_lock`:   Serialises selection so two calls never pick the same elevator.
 * - `reserved`:        Elevators dwelling at a pickup floor before their second leg.
 */
pub struct Dispatcher {
    simulator: Arc<MovementSimulator>,
    building: BuildingConfig,
    dispatch_lock: Mutex<()>,
    reserved: Arc<Mutex<HashSet<u32>>>,
}

impl Dispatcher {
    pub fn new(building: &BuildingConfig, simulator: Arc<MovementSimulator>) -> Dispatcher {
        Dispatcher {
            simulator,
            building: building.clone(),
            dispatch_lock: Mutex::new(()),
            reserved: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// Accepts or rejects a call. Rejections leave every elevator untouched.
    /// Store failures are returned as `Err`.
    pub fn call(&self, start_floor: i32, end_floor: i32) -> CoreResult<CallResult> {
        if let Err(e) = self.validate(start_floor, end_floor) {
            info!("Rejected call {} -> {}: {}", start_floor, end_floor, e);
            return Ok(CallResult::rejected(INVALID_FLOORS));
        }

        let _dispatch = self.dispatch_lock.lock();
        let machine = self.simulator.machine();

        for candidate in select_candidates(machine.store().list_elevators()?, start_floor) {
            let mut guard = match machine.lock(candidate.id) {
                Ok(guard) => guard,
                Err(CoreError::NotFound(_)) => continue,
                Err(e) => return Err(e),
            };

            // Could have been moved by a direct update since the listing.
            let elevator = match guard.read() {
                Ok(elevator) if elevator.is_idle() => elevator,
                Ok(_) | Err(CoreError::NotFound(_)) => continue,
                Err(e) => return Err(e),
            };
            if self.reserved.lock().contains(&elevator.id) {
                debug!("Elevator {} is reserved for a second leg", elevator.id);
                continue;
            }

            let job_id = Uuid::new_v4().to_string();
            self.dispatch(&mut guard, &elevator, &job_id, start_floor, end_floor)?;
            return Ok(CallResult::accepted(job_id, elevator.id));
        }

        info!("Rejected call {} -> {}: {}", start_floor, end_floor, CoreError::NoAvailableResource);
        Ok(CallResult::rejected(NO_IDLE_ELEVATORS))
    }

    fn validate(&self, start_floor: i32, end_floor: i32) -> CoreResult<()> {
        if start_floor == end_floor {
            return Err(CoreError::Validation("start and end floor are the same".to_string()));
        }
        for floor in [start_floor, end_floor] {
            if !self.building.contains(floor) {
                return Err(CoreError::Validation(format!(
                    "floor {} is outside {}..={}",
                    floor, self.building.min_floor, self.building.max_floors
                )));
            }
        }
        Ok(())
    }

    fn dispatch(
        &self,
        guard: &mut ElevatorGuard<'_>,
        elevator: &Elevator,
        job_id: &str,
        start_floor: i32,
        end_floor: i32,
    ) -> CoreResult<()> {
        let store = self.simulator.machine().store();
        store.append_event(
            elevator.id,
            EventType::Call,
            json!({ "start_floor": start_floor, "end_floor": end_floor, "job_id": job_id }),
        )?;

        let pickup_ms = self.estimate_pickup_ms(elevator.current_floor, start_floor);
        info!(
            "Job {}: elevator {} at floor {} takes call {} -> {}, pickup done in ~{} ms",
            job_id, elevator.id, elevator.current_floor, start_floor, end_floor, pickup_ms
        );

        let simulator = Arc::clone(&self.simulator);
        let reserved = Arc::clone(&self.reserved);
        let second_leg = ActiveJob::new(job_id, start_floor, end_floor);
        let on_pickup_done: OnLegComplete = Box::new(move |guard| {
            let elevator_id = guard.elevator_id();
            reserved.lock().insert(elevator_id);

            let leg_simulator = Arc::clone(&simulator);
            let dwell = simulator.door_interval();
            simulator.after_locked(
                elevator_id,
                dwell,
                Box::new(move |guard: &mut ElevatorGuard<'_>| {
                    reserved.lock().remove(&guard.elevator_id());
                    start_second_leg(&leg_simulator, guard, second_leg);
                }),
            );
        });

        let first_leg = ActiveJob::new(job_id, elevator.current_floor, start_floor);
        self.simulator.start_leg_locked(guard, first_leg, Some(on_pickup_done))
    }

    /// Travel to the pickup floor plus one full door cycle.
    pub fn estimate_pickup_ms(&self, current_floor: i32, start_floor: i32) -> u128 {
        let floors = u128::from(start_floor.abs_diff(current_floor));
        floors * self.simulator.travel_interval().as_millis() + 2 * self.simulator.door_interval().as_millis()
    }
}

/// Idle elevators ordered by distance to `start_floor`, lowest id first among equals.
pub fn select_candidates(elevators: Vec<Elevator>, start_floor: i32) -> Vec<Elevator> {
    let mut idle: Vec<Elevator> = elevators.into_iter().filter(Elevator::is_idle).collect();
    idle.sort_by_key(|elevator| (elevator.current_floor.abs_diff(start_floor), elevator.id));
    idle
}

pub(crate) fn start_second_leg(simulator: &Arc<MovementSimulator>, guard: &mut ElevatorGuard<'_>, leg: ActiveJob) {
    let elevator_id = guard.elevator_id();
    match guard.read() {
        Ok(elevator) if elevator.is_idle() && elevator.current_floor == leg.start_floor => {
            debug!("Job {}: pickup done on elevator {}", leg.job_id, elevator_id);
            if let Err(e) = simulator.start_leg_locked(guard, leg.clone(), None) {
                warn!("Job {}: second leg on elevator {} failed to start: {}", leg.job_id, elevator_id, e);
            }
        }
        Ok(elevator) => warn!(
            "Job {}: skipping second leg, elevator {} is {} at floor {} instead of idle at {}",
            leg.job_id, elevator_id, elevator.state, elevator.current_floor, leg.start_floor
        ),
        Err(e) => warn!("Job {}: skipping second leg on elevator {}: {}", leg.job_id, elevator_id, e),
    }
}
