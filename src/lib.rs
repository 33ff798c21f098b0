//! Elevator fleet dispatch and movement simulator.
//!
//! Calls go through [`ElevatorSystem`], which picks the closest idle elevator and
//! drives it floor by floor on a [`timer::Timer`], first to the pickup floor and
//! then to the destination. Every transition is recorded as an [`shared::Event`].

pub mod config;
pub mod coordinator;
pub mod elevator;
pub mod shared;
pub mod store;
pub mod system;
pub mod timer;

pub use system::ElevatorSystem;
