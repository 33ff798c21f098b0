pub mod fsm;
mod fsm_tests;
pub mod simulator;
mod simulator_tests;

pub use fsm::ElevatorGuard;
pub use fsm::ElevatorStateMachine;
pub use simulator::MovementSimulator;
pub use simulator::OnLegComplete;
