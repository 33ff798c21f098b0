/*
 * Unit tests for the movement simulator
 *
 * The unit tests follows the Arrange, Act, Assert pattern. Time is driven by a
 * ManualClock, so every step is deterministic.
 *
 * Tests:
 * - test_leg_moves_one_floor_per_interval
 * - test_leg_down
 * - test_zero_length_leg
 * - test_on_complete_runs_after_door_close
 * - test_removed_elevator_abandons_chain
 * - test_external_update_abandons_chain
 * - test_start_leg_unknown_elevator
 * - test_start_leg_on_busy_elevator
 * - test_start_leg_away_from_current_floor
 */

/***************************************/
/*             Unit tests              */
/***************************************/
#[cfg(test)]
mod simulator_tests {
    use crate::config::{BuildingConfig, ElevatorConfig};
    use crate::elevator::{ElevatorStateMachine, MovementSimulator, OnLegComplete};
    use crate::shared::Direction::{Down, Stop, Up};
    use crate::shared::ElevatorState::{DoorsOpen, Idle, Moving};
    use crate::shared::{CoreError, Elevator, ElevatorUpdate, EventType};
    use crate::store::{MemoryStore, StateStore};
    use crate::timer::ManualClock;
    use crossbeam_channel::unbounded;
    use serde_json::json;
    use std::sync::Arc;

    struct Setup {
        clock: Arc<ManualClock>,
        store: Arc<MemoryStore>,
        simulator: Arc<MovementSimulator>,
    }

    // Travel 100 ms per floor, doors 50 ms, floors 1..=10, two elevators on floor 1.
    fn setup_simulator() -> Setup {
        let clock = Arc::new(ManualClock::new());
        let store = Arc::new(MemoryStore::with_fleet(clock.clone(), 2, 1));
        let building = BuildingConfig {
            min_floor: 1,
            max_floors: 10,
            elevator_count: 2,
        };
        let config = ElevatorConfig {
            floor_travel_time_ms: 100,
            door_action_time_ms: 50,
        };
        let machine = Arc::new(ElevatorStateMachine::new(store.clone(), &building).unwrap());
        let simulator = Arc::new(MovementSimulator::new(&config, machine, clock.clone()));

        Setup {
            clock,
            store,
            simulator,
        }
    }

    #[test]
    fn test_leg_moves_one_floor_per_interval() {
        // Arrange
        let s = setup_simulator();

        // Act
        s.simulator.start_leg(1, 1, 4, "job", None).unwrap();

        // Assert
        let elevator = s.store.get_elevator(1).unwrap();
        assert_eq!((elevator.state, elevator.direction, elevator.current_floor), (Moving, Up, 1));

        for floor in [2, 3] {
            s.clock.advance_ms(100);
            let elevator = s.store.get_elevator(1).unwrap();
            assert_eq!((elevator.state, elevator.current_floor), (Moving, floor));
        }

        s.clock.advance_ms(100);
        let elevator = s.store.get_elevator(1).unwrap();
        assert_eq!((elevator.state, elevator.direction, elevator.current_floor), (DoorsOpen, Up, 4));

        s.clock.advance_ms(49);
        assert_eq!(s.store.get_elevator(1).unwrap().state, DoorsOpen);

        s.clock.advance_ms(1);
        let elevator = s.store.get_elevator(1).unwrap();
        assert_eq!(elevator, Elevator::new(1, 4));

        let events = s.store.list_events().unwrap();
        let trail: Vec<(EventType, u64)> = events.iter().map(|e| (e.event_type, e.timestamp_ms)).collect();
        assert_eq!(
            trail,
            vec![
                (EventType::StateUpdate, 0),
                (EventType::StateUpdate, 100),
                (EventType::StateUpdate, 200),
                (EventType::StateUpdate, 300),
                (EventType::Arrival, 300),
                (EventType::DoorClose, 350),
            ]
        );
        assert_eq!(events[4].details["doors"], json!("open"));
        assert_eq!(events[4].details["current_floor"], json!(4));
        assert_eq!(events[5].details["doors"], json!("closed"));
        assert_eq!(s.clock.pending(), 0);
    }

    #[test]
    fn test_leg_down() {
        // Arrange
        let s = setup_simulator();
        s.store.insert_elevator(Elevator::new(2, 5));

        // Act
        s.simulator.start_leg(2, 5, 3, "down", None).unwrap();
        s.clock.advance_ms(100);

        // Assert
        let elevator = s.store.get_elevator(2).unwrap();
        assert_eq!((elevator.state, elevator.direction, elevator.current_floor), (Moving, Down, 4));

        s.clock.advance_ms(100);
        assert_eq!(s.store.get_elevator(2).unwrap().state, DoorsOpen);
        s.clock.advance_ms(50);
        assert_eq!(s.store.get_elevator(2).unwrap(), Elevator::new(2, 3));
        assert_eq!(s.store.get_elevator(1).unwrap(), Elevator::new(1, 1));
    }

    #[test]
    fn test_zero_length_leg() {
        // Arrange
        let s = setup_simulator();

        // Act
        s.simulator.start_leg(1, 1, 1, "here", None).unwrap();

        // Assert
        let elevator = s.store.get_elevator(1).unwrap();
        assert_eq!((elevator.state, elevator.current_floor), (DoorsOpen, 1));
        let types: Vec<EventType> = s.store.list_events().unwrap().iter().map(|e| e.event_type).collect();
        assert_eq!(types, vec![EventType::StateUpdate, EventType::Arrival]);

        s.clock.advance_ms(50);
        assert_eq!(s.store.get_elevator(1).unwrap(), Elevator::new(1, 1));
    }

    #[test]
    fn test_on_complete_runs_after_door_close() {
        // Arrange
        let s = setup_simulator();
        let (done_tx, done_rx) = unbounded::<Elevator>();
        let on_complete: OnLegComplete = Box::new(move |guard| {
            done_tx.send(guard.read().unwrap()).unwrap();
        });

        // Act
        s.simulator.start_leg(1, 1, 2, "job", Some(on_complete)).unwrap();
        s.clock.advance_ms(100);
        assert!(done_rx.try_recv().is_err());
        s.clock.advance_ms(50);

        // Assert
        let elevator = done_rx.try_recv().unwrap();
        assert_eq!(elevator, Elevator::new(1, 2));
    }

    #[test]
    fn test_removed_elevator_abandons_chain() {
        // Arrange
        let s = setup_simulator();
        s.simulator.start_leg(1, 1, 5, "job", None).unwrap();
        s.clock.advance_ms(100);
        let events_before = s.store.list_events().unwrap().len();

        // Act
        s.store.remove_elevator(1);
        s.clock.advance_ms(1000);

        // Assert
        assert_eq!(s.clock.pending(), 0);
        assert_eq!(s.store.list_events().unwrap().len(), events_before);
        assert_eq!(s.store.get_elevator(1), Err(CoreError::NotFound(1)));
    }

    #[test]
    fn test_external_update_abandons_chain() {
        // Arrange
        let s = setup_simulator();
        s.simulator.start_leg(1, 1, 5, "job", None).unwrap();
        s.clock.advance_ms(100);

        // Act
        s.simulator.machine().apply(1, ElevatorUpdate::doors_open()).unwrap();
        s.clock.advance_ms(1000);

        // Assert
        let elevator = s.store.get_elevator(1).unwrap();
        assert_eq!((elevator.state, elevator.current_floor), (DoorsOpen, 2));
        assert_eq!(s.clock.pending(), 0);
    }

    #[test]
    fn test_start_leg_unknown_elevator() {
        let s = setup_simulator();

        assert_eq!(
            s.simulator.start_leg(9, 1, 2, "job", None),
            Err(CoreError::NotFound(9))
        );
        assert_eq!(s.clock.pending(), 0);
    }

    #[test]
    fn test_start_leg_on_busy_elevator() {
        // Arrange
        let s = setup_simulator();
        s.simulator.start_leg(1, 1, 3, "first", None).unwrap();

        // Act
        let result = s.simulator.start_leg(1, 1, 6, "second", None);

        // Assert
        assert!(matches!(result, Err(CoreError::InvalidTransition { .. })));
        s.clock.advance_ms(250);
        let elevator = s.store.get_elevator(1).unwrap();
        assert_eq!((elevator.state, elevator.direction, elevator.current_floor), (Idle, Stop, 3));
    }

    #[test]
    fn test_start_leg_away_from_current_floor() {
        // Arrange
        let s = setup_simulator();

        // Act
        let result = s.simulator.start_leg(1, 6, 3, "job", None);
        s.clock.advance_ms(100);

        // Assert
        assert!(matches!(result, Err(CoreError::InvalidTransition { elevator_id: 1, .. })));
        assert_eq!(s.store.get_elevator(1).unwrap(), Elevator::new(1, 1));
        assert!(s.store.list_events().unwrap().is_empty());
        assert_eq!(s.clock.pending(), 0);
    }
}
