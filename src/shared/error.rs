/***************************************/
/*        3rd party libraries          */
/***************************************/
use thiserror::Error;

/***************************************/
/*            Error types              */
/***************************************/
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// Call rejected before any state was touched.
    #[error("validation error: {0}")]
    Validation(String),

    #[error("no idle elevators available")]
    NoAvailableResource,

    #[error("elevator {0} not found")]
    NotFound(u32),

    /// Update would break the idle/direction/job invariant or skip floors.
    #[error("invalid transition for elevator {elevator_id}: {reason}")]
    InvalidTransition { elevator_id: u32, reason: String },

    #[error("store error: {0}")]
    Store(String),
}

pub type CoreResult<T> = Result<T, CoreError>;
