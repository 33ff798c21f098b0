/***************************************/
/*        3rd party libraries          */
/***************************************/
use log::{debug, info, warn};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

/***************************************/
/*           Local modules             */
/***************************************/
use super::fsm::{ElevatorGuard, ElevatorStateMachine};
use crate::config::ElevatorConfig;
use crate::shared::ElevatorState::{DoorsOpen, Moving};
use crate::shared::{ActiveJob, CoreError, CoreResult, Direction, ElevatorUpdate, EventType};
use crate::timer::Timer;

/// Continuation run once a leg has closed its doors, still holding the elevator.
pub type OnLegComplete = Box<dyn FnOnce(&mut ElevatorGuard<'_>) + Send + 'static>;

/**
 * Drives single legs: one floor per travel interval, then the door cycle.
 *
 * Each step is a separate timer task that locks the elevator, re-reads it from the store,
 * and only then moves it. A step that finds the elevator gone or working on another job
 * abandons the rest of the chain.
 *
 * # Fields
 * - `machine`:             State machine all mutations go through.
 * - `timer`:               Delayed-callback facility driving the chain.
 * - `travel_interval`:     Time to move one floor.
 * - `door_interval`:       Time the doors stay open before closing.
 */
pub struct MovementSimulator {
    machine: Arc<ElevatorStateMachine>,
    timer: Arc<dyn Timer>,
    travel_interval: Duration,
    door_interval: Duration,
}

impl MovementSimulator {
    pub fn new(
        config: &ElevatorConfig,
        machine: Arc<ElevatorStateMachine>,
        timer: Arc<dyn Timer>,
    ) -> MovementSimulator {
        MovementSimulator {
            machine,
            timer,
            travel_interval: config.travel_interval(),
            door_interval: config.door_interval(),
        }
    }

    pub fn machine(&self) -> &Arc<ElevatorStateMachine> {
        &self.machine
    }

    pub fn travel_interval(&self) -> Duration {
        self.travel_interval
    }

    pub fn door_interval(&self) -> Duration {
        self.door_interval
    }

    /// Runs `task` on the held elevator after `delay`. Gives up with a warning if the
    /// elevator is gone by then.
    pub fn after_locked(self: &Arc<Self>, elevator_id: u32, delay: Duration, task: OnLegComplete) {
        let simulator = Arc::clone(self);
        self.timer.schedule(
            delay,
            Box::new(move || match simulator.machine.lock(elevator_id) {
                Ok(mut guard) => task(&mut guard),
                Err(e) => warn!("Cancelled: delayed task on elevator {}: {}", elevator_id, e),
            }),
        );
    }

    pub fn start_leg(
        self: &Arc<Self>,
        elevator_id: u32,
        start_floor: i32,
        end_floor: i32,
        job_id: &str,
        on_complete: Option<OnLegComplete>,
    ) -> CoreResult<()> {
        let mut guard = self.machine.lock(elevator_id)?;
        self.start_leg_locked(&mut guard, ActiveJob::new(job_id, start_floor, end_floor), on_complete)
    }

    /// Starts a leg on an elevator the caller already holds.
    pub fn start_leg_locked(
        self: &Arc<Self>,
        guard: &mut ElevatorGuard<'_>,
        job: ActiveJob,
        on_complete: Option<OnLegComplete>,
    ) -> CoreResult<()> {
        let elevator_id = guard.elevator_id();
        let current_floor = guard.read()?.current_floor;
        if current_floor != job.start_floor {
            return Err(CoreError::InvalidTransition {
                elevator_id,
                reason: format!(
                    "leg {} -> {} must start from the current floor {}",
                    job.start_floor, job.end_floor, current_floor
                ),
            });
        }

        let elevator = guard.apply(ElevatorUpdate::moving(&job))?;
        info!(
            "Elevator {} starting leg {} -> {} for job {} ({:?})",
            elevator_id, elevator.current_floor, job.end_floor, job.job_id, elevator.direction
        );

        if elevator.current_floor == job.end_floor {
            self.arrive(guard, job, on_complete)
        } else {
            self.schedule_step(elevator_id, job, on_complete);
            Ok(())
        }
    }

    fn schedule_step(self: &Arc<Self>, elevator_id: u32, job: ActiveJob, on_complete: Option<OnLegComplete>) {
        let simulator = Arc::clone(self);
        self.timer.schedule(
            self.travel_interval,
            Box::new(move || simulator.step(elevator_id, job, on_complete)),
        );
    }

    fn step(self: &Arc<Self>, elevator_id: u32, job: ActiveJob, on_complete: Option<OnLegComplete>) {
        if let Err(e) = self.try_step(elevator_id, job.clone(), on_complete) {
            self.abandon(elevator_id, &job, &e);
        }
    }

    fn try_step(
        self: &Arc<Self>,
        elevator_id: u32,
        job: ActiveJob,
        on_complete: Option<OnLegComplete>,
    ) -> CoreResult<()> {
        let mut guard = self.machine.lock(elevator_id)?;
        let elevator = guard.read()?;
        if elevator.state != Moving || elevator.active_job.as_ref() != Some(&job) {
            return Err(CoreError::InvalidTransition {
                elevator_id,
                reason: format!("expected to be moving for job {}, found {}", job.job_id, elevator.state),
            });
        }

        let next_floor = match Direction::step_toward(elevator.current_floor, job.end_floor) {
            Some(floor) => floor,
            None => return self.arrive(&mut guard, job, on_complete),
        };
        guard.apply(ElevatorUpdate::floor(next_floor))?;
        debug!("Elevator {} passed floor {}", elevator_id, next_floor);

        if next_floor == job.end_floor {
            self.arrive(&mut guard, job, on_complete)
        } else {
            drop(guard);
            self.schedule_step(elevator_id, job, on_complete);
            Ok(())
        }
    }

    fn arrive(
        self: &Arc<Self>,
        guard: &mut ElevatorGuard<'_>,
        job: ActiveJob,
        on_complete: Option<OnLegComplete>,
    ) -> CoreResult<()> {
        let elevator_id = guard.elevator_id();
        let elevator = guard.apply_with(
            ElevatorUpdate::doors_open(),
            EventType::Arrival,
            json!({ "doors": "open", "job_id": job.job_id }),
        )?;
        info!("Elevator {} arrived at floor {}, doors open", elevator_id, elevator.current_floor);

        let simulator = Arc::clone(self);
        self.timer.schedule(
            self.door_interval,
            Box::new(move || {
                if let Err(e) = simulator.close_doors(elevator_id, &job, on_complete) {
                    simulator.abandon(elevator_id, &job, &e);
                }
            }),
        );
        Ok(())
    }

    fn close_doors(
        self: &Arc<Self>,
        elevator_id: u32,
        job: &ActiveJob,
        on_complete: Option<OnLegComplete>,
    ) -> CoreResult<()> {
        let mut guard = self.machine.lock(elevator_id)?;
        let elevator = guard.read()?;
        if elevator.state != DoorsOpen || elevator.active_job.as_ref() != Some(job) {
            return Err(CoreError::InvalidTransition {
                elevator_id,
                reason: format!("expected open doors for job {}, found {}", job.job_id, elevator.state),
            });
        }

        let elevator = guard.apply_with(
            ElevatorUpdate::idle(),
            EventType::DoorClose,
            json!({ "doors": "closed", "job_id": job.job_id }),
        )?;
        info!("Elevator {} closed doors at floor {}, idle", elevator_id, elevator.current_floor);

        if let Some(on_complete) = on_complete {
            on_complete(&mut guard);
        }
        Ok(())
    }

    fn abandon(&self, elevator_id: u32, job: &ActiveJob, reason: &CoreError) {
        warn!(
            "Cancelled: leg {} -> {} of job {} on elevator {} abandoned: {}",
            job.start_floor, job.end_floor, job.job_id, elevator_id, reason
        );
    }
}
