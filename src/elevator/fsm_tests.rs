/*
 * Unit tests for the elevator control loop
 *
 * The unit tests follows the Arrange, Act, Assert pattern.
 * The FSM is stepped by hand, so every test is deterministic.
 *
 * Tests:
 *  - test_fsm_door_cycle_walks_every_phase
 *  - test_fsm_travels_to_queued_floor
 *  - test_fsm_parks_at_nearest_floor
 *  - test_fsm_stop_request_parks_without_door_cycle
 *  - test_fsm_drops_invalid_queued_floor
 *  - test_fsm_more_stops_keep_it_moving
 *  - test_fsm_visits_stops_in_queue_order
 *  - test_fsm_stop_added_on_the_way_is_served_first
 */

/***************************************/
/*             Unit tests              */
/***************************************/
#[cfg(test)]
mod fsm_tests {
    use crate::building::FloorTable;
    use crate::config::{BuildingConfig, DoorConfig, ElevatorConfig};
    use crate::elevator::kinematics::EPSILON;
    use crate::elevator::{Elevator, ElevatorEvent, ElevatorFSM};
    use crate::runtime::{Actor, Step};
    use crate::shared::{Direction, DoorState, MotionState};
    use crossbeam_channel::Receiver;
    use std::sync::Arc;
    use std::time::Duration;

    const MAX_STEPS: usize = 10_000;

    fn setup_fsm(floors_above_ground: u8) -> (ElevatorFSM, Arc<Elevator>, Receiver<ElevatorEvent>) {
        let building = BuildingConfig {
            floors_above_ground,
            floors_below_ground: 0,
            floor_height: 3.0,
            n_elevators: 1,
        };
        let floors = Arc::new(FloorTable::new(&building));
        let elevator = Arc::new(Elevator::new(1, 4, floors, 1).unwrap());
        let events = elevator.subscribe();
        let fsm = ElevatorFSM::new(
            elevator.clone(),
            &ElevatorConfig::default(),
            &DoorConfig::default(),
        );
        (fsm, elevator, events)
    }

    /// Steps until `done` holds, returning the number of steps taken.
    fn step_until<F: Fn(&Elevator) -> bool>(fsm: &mut ElevatorFSM, elevator: &Elevator, done: F) -> usize {
        for n in 0..MAX_STEPS {
            if done(elevator) {
                return n;
            }
            assert!(matches!(fsm.step(Duration::ZERO), Step::Sleep(_)));
        }
        panic!("condition not reached after {} steps", MAX_STEPS);
    }

    fn arrivals(events: &Receiver<ElevatorEvent>) -> Vec<i32> {
        events
            .try_iter()
            .filter_map(|event| match event {
                ElevatorEvent::Arrived { floor, .. } => Some(floor),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_fsm_door_cycle_walks_every_phase() {
        // Arrange
        let (mut fsm, elevator, events) = setup_fsm(3);
        elevator.enqueue_stop(1, Direction::None).unwrap();

        // Act
        let mut phases = Vec::new();
        for _ in 0..DoorState::CYCLE.len() {
            fsm.step(Duration::ZERO);
            let status = elevator.status();
            assert_eq!(status.position, 0.0);
            phases.push(status.door_state);
        }

        // Assert
        assert_eq!(phases, DoorState::CYCLE.to_vec());
        assert_eq!(fsm.test_door_phase(), None);
        assert_eq!(elevator.status().motion_state, MotionState::Idle);
        assert!(elevator.path().is_empty());

        let received: Vec<ElevatorEvent> = events.try_iter().collect();
        assert_eq!(
            received,
            vec![
                ElevatorEvent::DoorOpened { elevator: 1, floor: 1 },
                ElevatorEvent::DoorClosed { elevator: 1, floor: 1 },
                ElevatorEvent::Arrived { elevator: 1, floor: 1 },
            ]
        );
    }

    #[test]
    fn test_fsm_travels_to_queued_floor() {
        // Arrange
        let (mut fsm, elevator, events) = setup_fsm(4);
        elevator.enqueue_stop(3, Direction::Up).unwrap();
        elevator.press_cabin_button(3).unwrap();

        // Act
        step_until(&mut fsm, &elevator, |e| e.status().door_state == DoorState::Opened);

        // Assert
        let status = elevator.status();
        assert_eq!(status.position, 6.0);
        assert_eq!(status.velocity, 0.0);
        assert_eq!(status.floor, 3);
        assert!(elevator.path().is_empty());
        assert!(!elevator.cabin_button_pressed(3));

        let floors: Vec<i32> = events
            .try_iter()
            .filter_map(|event| match event {
                ElevatorEvent::FloorChanged { floor, .. } => Some(floor),
                _ => None,
            })
            .collect();
        assert_eq!(floors, vec![2, 3]);
    }

    #[test]
    fn test_fsm_parks_at_nearest_floor() {
        // Arrange
        let (mut fsm, elevator, events) = setup_fsm(5);
        fsm.test_set_motion(4.0, 0.0);

        // Act
        step_until(&mut fsm, &elevator, |e| e.status().motion_state == MotionState::Idle);

        // Assert
        let status = elevator.status();
        assert!((status.position - 3.0).abs() < EPSILON);
        assert!(status.velocity.abs() < EPSILON);
        assert_eq!(status.floor, 2);
        assert_eq!(status.door_state, DoorState::Closed);
        assert!(!events
            .try_iter()
            .any(|event| matches!(event, ElevatorEvent::DoorOpened { .. })));
    }

    #[test]
    fn test_fsm_stop_request_parks_without_door_cycle() {
        // Arrange
        let (mut fsm, elevator, events) = setup_fsm(10);
        elevator.enqueue_stop(10, Direction::Up).unwrap();
        step_until(&mut fsm, &elevator, |e| e.status().position > 7.0);
        let position = elevator.status().position;

        // Act
        elevator.request_stop();
        step_until(&mut fsm, &elevator, |e| e.status().motion_state == MotionState::Idle);

        // Assert
        let status = elevator.status();
        assert!(elevator.path().is_empty());
        assert!(status.position >= position);
        assert!(status.position < 27.0);
        assert!((status.position / 3.0 - (status.position / 3.0).round()).abs() < EPSILON);
        assert!(!events
            .try_iter()
            .any(|event| matches!(event, ElevatorEvent::DoorOpened { .. })));
    }

    #[test]
    fn test_fsm_drops_invalid_queued_floor() {
        // Arrange
        let (mut fsm, elevator, _events) = setup_fsm(3);
        elevator.path().enqueue(42, Direction::Up);

        // Act
        fsm.step(Duration::ZERO);

        // Assert
        assert!(elevator.path().is_empty());
        assert_eq!(elevator.status().floor, 1);
        assert_eq!(elevator.status().motion_state, MotionState::Idle);
    }

    #[test]
    fn test_fsm_more_stops_keep_it_moving() {
        // Arrange
        let (mut fsm, elevator, events) = setup_fsm(5);
        elevator.enqueue_stop(2, Direction::Up).unwrap();
        elevator.enqueue_stop(4, Direction::Up).unwrap();

        // Act
        step_until(&mut fsm, &elevator, |e| e.status().floor == 2 && e.path().len() == 1);
        step_until(&mut fsm, &elevator, |e| e.status().door_state == DoorState::Closed);

        // Assert
        assert_eq!(elevator.status().motion_state, MotionState::Moving);
        assert!(!elevator.is_available(1, Direction::None));

        step_until(&mut fsm, &elevator, |e| e.path().is_empty());
        step_until(&mut fsm, &elevator, |e| e.status().motion_state == MotionState::Idle);
        assert_eq!(arrivals(&events), vec![2, 4]);
        assert_eq!(elevator.status().position, 9.0);
    }

    #[test]
    fn test_fsm_visits_stops_in_queue_order() {
        // Arrange
        let (mut fsm, elevator, events) = setup_fsm(8);
        elevator.enqueue_stop(3, Direction::Up).unwrap();
        elevator.enqueue_stop(7, Direction::Up).unwrap();
        elevator.enqueue_stop(5, Direction::Up).unwrap();

        // Act
        step_until(&mut fsm, &elevator, |e| e.path().is_empty());
        step_until(&mut fsm, &elevator, |e| e.status().motion_state == MotionState::Idle);

        // Assert
        assert_eq!(arrivals(&events), vec![3, 5, 7]);
        assert_eq!(elevator.status().floor, 7);
    }

    #[test]
    fn test_fsm_stop_added_on_the_way_is_served_first() {
        // Arrange
        let (mut fsm, elevator, events) = setup_fsm(8);
        elevator.enqueue_stop(6, Direction::Up).unwrap();
        step_until(&mut fsm, &elevator, |e| e.status().position > 1.0);
        assert_eq!(elevator.status().motion_state, MotionState::Moving);

        // Act
        elevator.enqueue_stop(4, Direction::Up).unwrap();
        let queued = elevator.path().to_vec();
        step_until(&mut fsm, &elevator, |e| e.path().is_empty());
        step_until(&mut fsm, &elevator, |e| e.status().motion_state == MotionState::Idle);

        // Assert
        assert_eq!(queued, vec![4, 6]);
        assert_eq!(arrivals(&events), vec![4, 6]);
        assert_eq!(elevator.status().position, 15.0);
    }
}
