/*
 * Unit tests for the elevator state machine
 *
 * The unit tests follows the Arrange, Act, Assert pattern.
 *
 * Tests:
 * - test_apply_merges_and_records_state_update
 * - test_unknown_elevator
 * - test_rejects_direction_without_job
 * - test_rejects_floor_jump
 * - test_rejects_floor_change_while_idle
 * - test_rejects_floor_outside_building
 * - test_rejects_doors_open_to_moving
 * - test_rejects_job_swap
 * - test_apply_with_records_single_event
 */

/***************************************/
/*             Unit tests              */
/***************************************/
#[cfg(test)]
mod fsm_tests {
    use crate::config::BuildingConfig;
    use crate::elevator::ElevatorStateMachine;
    use crate::shared::Direction::{Stop, Up};
    use crate::shared::ElevatorState::{DoorsOpen, Idle, Moving};
    use crate::shared::{ActiveJob, CoreError, Elevator, ElevatorUpdate, EventType};
    use crate::store::{MemoryStore, StateStore};
    use crate::timer::ManualClock;
    use serde_json::json;
    use std::sync::Arc;

    fn setup_machine(count: u32) -> (Arc<MemoryStore>, ElevatorStateMachine) {
        let store = Arc::new(MemoryStore::with_fleet(Arc::new(ManualClock::new()), count, 1));
        let building = BuildingConfig {
            min_floor: 1,
            max_floors: 10,
            elevator_count: count,
        };
        let machine = ElevatorStateMachine::new(store.clone(), &building).unwrap();
        (store, machine)
    }

    fn assert_refused(result: Result<Elevator, CoreError>) {
        match result {
            Err(CoreError::InvalidTransition { .. }) => {}
            other => panic!("Expected InvalidTransition, got {:?}", other),
        }
    }

    #[test]
    fn test_apply_merges_and_records_state_update() {
        // Arrange
        let (store, machine) = setup_machine(2);
        let job = ActiveJob::new("job-1", 1, 3);

        // Act
        let elevator = machine.apply(1, ElevatorUpdate::moving(&job)).unwrap();

        // Assert
        assert_eq!(elevator.state, Moving);
        assert_eq!(elevator.direction, Up);
        assert_eq!(elevator.current_floor, 1);
        assert_eq!(elevator.active_job, Some(job));
        assert_eq!(machine.read(1).unwrap(), elevator);

        let events = store.list_events().unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].elevator_id, 1);
        assert_eq!(events[0].event_type, EventType::StateUpdate);
        assert_eq!(events[0].details["state"], json!("Moving"));
        assert_eq!(events[0].details["direction"], json!("up"));
        assert_eq!(events[0].details["current_floor"], json!(1));
    }

    #[test]
    fn test_unknown_elevator() {
        let (_store, machine) = setup_machine(1);

        assert_eq!(machine.read(9), Err(CoreError::NotFound(9)));
        assert_eq!(
            machine.apply(9, ElevatorUpdate::idle()),
            Err(CoreError::NotFound(9))
        );
        assert!(machine.lock(9).is_err());
    }

    #[test]
    fn test_rejects_direction_without_job() {
        // Arrange
        let (store, machine) = setup_machine(1);
        let update = ElevatorUpdate {
            state: Some(Moving),
            direction: Some(Up),
            ..Default::default()
        };

        // Act
        let result = machine.apply(1, update);

        // Assert
        assert_refused(result);
        assert_eq!(store.get_elevator(1).unwrap(), Elevator::new(1, 1));
        assert!(store.list_events().unwrap().is_empty());
    }

    #[test]
    fn test_rejects_floor_jump() {
        let (_store, machine) = setup_machine(1);
        machine.apply(1, ElevatorUpdate::moving(&ActiveJob::new("job", 1, 5))).unwrap();

        assert_refused(machine.apply(1, ElevatorUpdate::floor(3)));
        assert_eq!(machine.apply(1, ElevatorUpdate::floor(2)).unwrap().current_floor, 2);
    }

    #[test]
    fn test_rejects_floor_change_while_idle() {
        let (_store, machine) = setup_machine(1);

        assert_refused(machine.apply(1, ElevatorUpdate::floor(2)));
        assert_eq!(machine.read(1).unwrap().current_floor, 1);
    }

    #[test]
    fn test_rejects_floor_outside_building() {
        // Arrange
        let (store, machine) = setup_machine(1);
        store.insert_elevator(Elevator::new(1, 10));
        machine.apply(1, ElevatorUpdate::moving(&ActiveJob::new("job", 10, 11))).unwrap();

        // Act + Assert
        assert_refused(machine.apply(1, ElevatorUpdate::floor(11)));
        assert_eq!(machine.read(1).unwrap().current_floor, 10);
    }

    #[test]
    fn test_rejects_doors_open_to_moving() {
        // Arrange
        let (_store, machine) = setup_machine(1);
        let job = ActiveJob::new("job", 1, 2);
        machine.apply(1, ElevatorUpdate::moving(&job)).unwrap();
        machine.apply(1, ElevatorUpdate::floor(2)).unwrap();
        machine.apply(1, ElevatorUpdate::doors_open()).unwrap();

        // Act
        let result = machine.apply(1, ElevatorUpdate::moving(&job));
        let idle = machine.apply(1, ElevatorUpdate::idle()).unwrap();

        // Assert
        assert_refused(result);
        assert_eq!(idle.state, Idle);
        assert_eq!(idle.direction, Stop);
        assert_eq!(idle.active_job, None);
        assert_eq!(idle.current_floor, 2);
    }

    #[test]
    fn test_rejects_job_swap() {
        let (_store, machine) = setup_machine(1);
        machine.apply(1, ElevatorUpdate::moving(&ActiveJob::new("a", 1, 4))).unwrap();

        assert_refused(machine.apply(1, ElevatorUpdate::moving(&ActiveJob::new("b", 1, 4))));
        assert_eq!(
            machine.read(1).unwrap().active_job.map(|job| job.job_id),
            Some("a".to_string())
        );
    }

    #[test]
    fn test_apply_with_records_single_event() {
        // Arrange
        let (store, machine) = setup_machine(1);
        let mut guard = machine.lock(1).unwrap();
        guard.apply(ElevatorUpdate::moving(&ActiveJob::new("job", 1, 1))).unwrap();

        // Act
        let elevator = guard
            .apply_with(ElevatorUpdate::doors_open(), EventType::Arrival, json!({"doors": "open"}))
            .unwrap();

        // Assert
        assert_eq!(elevator.state, DoorsOpen);
        let events = store.list_events().unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[1].event_type, EventType::Arrival);
        assert_eq!(events[1].details["doors"], json!("open"));
        assert_eq!(events[1].details["state"], json!("DoorsOpen"));
        assert_eq!(events[1].details["current_floor"], json!(1));
    }
}
