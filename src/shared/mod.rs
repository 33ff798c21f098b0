pub mod error;
pub mod macros;
pub mod structs;

pub use error::CoreError;
pub use error::CoreResult;
pub use structs::ActiveJob;
pub use structs::CallResult;
pub use structs::Direction;
pub use structs::Elevator;
pub use structs::ElevatorState;
pub use structs::ElevatorUpdate;
pub use structs::Event;
pub use structs::EventType;
