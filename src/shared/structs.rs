/***************************************/
/*        3rd party libraries          */
/***************************************/
use serde::Deserialize;
use serde::Serialize;
use std::fmt;

/***************************************/
/*       Public data structures        */
/***************************************/
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElevatorState {
    Idle,
    Moving,
    DoorsOpen,
}

impl fmt::Display for ElevatorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ElevatorState::Idle => write!(f, "Idle"),
            ElevatorState::Moving => write!(f, "Moving"),
            ElevatorState::DoorsOpen => write!(f, "DoorsOpen"),
        }
    }
}

/// Travel direction. `Stop` is only valid while the elevator is idle.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
    Stop,
}

impl Direction {
    /// Direction of a leg from `start` to `end`. A zero-length leg counts as `Down`.
    pub fn of_leg(start: i32, end: i32) -> Direction {
        if end > start {
            Direction::Up
        } else {
            Direction::Down
        }
    }

    /// Single-floor step toward `to`, or `None` when already there.
    pub fn step_toward(from: i32, to: i32) -> Option<i32> {
        match from.cmp(&to) {
            std::cmp::Ordering::Less => Some(from + 1),
            std::cmp::Ordering::Greater => Some(from - 1),
            std::cmp::Ordering::Equal => None,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ActiveJob {
    pub job_id: String,
    pub start_floor: i32,
    pub end_floor: i32,
}

impl ActiveJob {
    pub fn new(job_id: &str, start_floor: i32, end_floor: i32) -> ActiveJob {
        ActiveJob {
            job_id: job_id.to_string(),
            start_floor,
            end_floor,
        }
    }

    pub fn direction(&self) -> Direction {
        Direction::of_leg(self.start_floor, self.end_floor)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Elevator {
    pub id: u32,
    pub current_floor: i32,
    pub state: ElevatorState,
    pub direction: Direction,
    pub active_job: Option<ActiveJob>,
}

impl Elevator {
    pub fn new(id: u32, floor: i32) -> Elevator {
        Elevator {
            id,
            current_floor: floor,
            state: ElevatorState::Idle,
            direction: Direction::Stop,
            active_job: None,
        }
    }

    pub fn is_idle(&self) -> bool {
        self.state == ElevatorState::Idle
    }

    /// Returns a copy with `update` merged in. Omitted fields keep their value.
    pub fn merged(&self, update: &ElevatorUpdate) -> Elevator {
        Elevator {
            id: self.id,
            current_floor: update.current_floor.unwrap_or(self.current_floor),
            state: update.state.unwrap_or(self.state),
            direction: update.direction.unwrap_or(self.direction),
            active_job: match &update.active_job {
                Some(job) => job.clone(),
                None => self.active_job.clone(),
            },
        }
    }
}

/**
 * Partial elevator update.
 *
 * Every field is optional; `None` leaves the stored value untouched. `active_job`
 * is doubly optional so that a job can be cleared explicitly with `Some(None)`.
 */
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ElevatorUpdate {
    pub current_floor: Option<i32>,
    pub state: Option<ElevatorState>,
    pub direction: Option<Direction>,
    pub active_job: Option<Option<ActiveJob>>,
}

impl ElevatorUpdate {
    pub fn floor(floor: i32) -> ElevatorUpdate {
        ElevatorUpdate {
            current_floor: Some(floor),
            ..Default::default()
        }
    }

    pub fn moving(job: &ActiveJob) -> ElevatorUpdate {
        ElevatorUpdate {
            state: Some(ElevatorState::Moving),
            direction: Some(job.direction()),
            active_job: Some(Some(job.clone())),
            ..Default::default()
        }
    }

    pub fn doors_open() -> ElevatorUpdate {
        ElevatorUpdate {
            state: Some(ElevatorState::DoorsOpen),
            ..Default::default()
        }
    }

    pub fn idle() -> ElevatorUpdate {
        ElevatorUpdate {
            state: Some(ElevatorState::Idle),
            direction: Some(Direction::Stop),
            active_job: Some(None),
            ..Default::default()
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    Call,
    Arrival,
    DoorClose,
    StateUpdate,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Event {
    pub id: u64,
    pub timestamp_ms: u64,
    pub elevator_id: u32,
    pub event_type: EventType,
    pub details: serde_json::Value,
}

/// Outcome of a dispatch request as seen by the caller.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct CallResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elevator_id: Option<u32>,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ElevatorState>,
}

impl CallResult {
    pub fn accepted(job_id: String, elevator_id: u32) -> CallResult {
        CallResult {
            success: true,
            message: format!("Elevator {} dispatched.", elevator_id),
            job_id: Some(job_id),
            elevator_id: Some(elevator_id),
            status: Some(ElevatorState::Moving),
        }
    }

    pub fn rejected(message: &str) -> CallResult {
        CallResult {
            success: false,
            job_id: None,
            elevator_id: None,
            message: message.to_string(),
            status: None,
        }
    }
}
