/*
 * Unit tests for the dispatcher
 *
 * The unit tests follows the Arrange, Act, Assert pattern.
 *
 * Tests:
 *  - test_dispatch_picks_first_available_elevator
 *  - test_dispatch_skips_busy_elevator
 *  - test_dispatch_drops_request_when_none_available
 *  - test_dispatch_routes_cabin_request_to_assigned_elevator
 *  - test_dispatch_rejects_unassigned_cabin_request
 *  - test_dispatch_reservation_spreads_simultaneous_calls
 *  - test_dispatch_without_reservation_stacks_calls
 */

/***************************************/
/*             Unit tests              */
/***************************************/
#[cfg(test)]
mod dispatcher_tests {
    use crate::building::FloorTable;
    use crate::config::{BuildingConfig, DispatchConfig};
    use crate::dispatcher::{DispatchHandle, Dispatcher};
    use crate::elevator::Elevator;
    use crate::rider::{RideRequest, SharedRequest};
    use crate::runtime::Actor;
    use crate::shared::{Location, SimError};
    use std::sync::Arc;
    use std::time::Duration;

    fn setup_dispatcher(
        n_elevators: u32,
        reserve_on_assign: bool,
    ) -> (Dispatcher, DispatchHandle, Vec<Arc<Elevator>>) {
        let building = BuildingConfig {
            floors_above_ground: 8,
            floors_below_ground: 0,
            floor_height: 3.0,
            n_elevators: n_elevators as u8,
        };
        let floors = Arc::new(FloorTable::new(&building));
        let elevators: Vec<Arc<Elevator>> = (1..=n_elevators)
            .map(|id| Arc::new(Elevator::new(id, 2, floors.clone(), 1).unwrap()))
            .collect();
        let config = DispatchConfig {
            poll_interval_ms: 100,
            reserve_on_assign,
        };
        let (dispatcher, handle) = Dispatcher::new(elevators.clone(), &config);
        (dispatcher, handle, elevators)
    }

    fn floor_call(rider: u64, origin: i32, target: i32) -> SharedRequest {
        RideRequest::new(rider, origin, target, Duration::ZERO).shared()
    }

    #[test]
    fn test_dispatch_picks_first_available_elevator() {
        // Arrange
        let (mut dispatcher, handle, elevators) = setup_dispatcher(2, false);
        let request = floor_call(1, 3, 6);
        handle.submit(request.clone());

        // Act
        dispatcher.step(Duration::ZERO);

        // Assert
        assert_eq!(request.lock().unwrap().assigned_elevator, Some(1));
        assert_eq!(elevators[0].path().to_vec(), vec![3]);
        assert!(elevators[1].path().is_empty());
        assert_eq!(handle.pending(), 0);
    }

    #[test]
    fn test_dispatch_skips_busy_elevator() {
        // Arrange
        let (dispatcher, _handle, elevators) = setup_dispatcher(2, false);
        assert!(elevators[0].try_reserve());
        let request = floor_call(1, 4, 2);

        // Act
        let result = dispatcher.dispatch(&request);

        // Assert
        assert_eq!(result, Ok(2));
        assert_eq!(elevators[1].path().to_vec(), vec![4]);
        assert!(elevators[0].path().is_empty());
    }

    #[test]
    fn test_dispatch_drops_request_when_none_available() {
        // Arrange
        let (mut dispatcher, handle, elevators) = setup_dispatcher(1, false);
        assert!(elevators[0].try_reserve());
        let request = floor_call(1, 4, 2);
        handle.submit(request.clone());

        // Act
        dispatcher.step(Duration::ZERO);
        elevators[0].release_reservation();
        dispatcher.step(Duration::from_millis(100));

        // Assert
        assert_eq!(request.lock().unwrap().assigned_elevator, None);
        assert!(elevators[0].path().is_empty());
        assert_eq!(handle.pending(), 0);
        assert_eq!(
            dispatcher.dispatch(&floor_call(2, 5, 1)).map(|_| ()),
            Ok(())
        );
    }

    #[test]
    fn test_dispatch_routes_cabin_request_to_assigned_elevator() {
        // Arrange
        let (dispatcher, _handle, elevators) = setup_dispatcher(3, false);
        let request = floor_call(1, 1, 7);
        {
            let mut request = request.lock().unwrap();
            request.location = Location::InCabin;
            request.assigned_elevator = Some(3);
        }

        // Act
        let result = dispatcher.dispatch(&request);

        // Assert
        assert_eq!(result, Ok(3));
        assert_eq!(elevators[2].path().to_vec(), vec![7]);
        assert!(elevators[0].path().is_empty());
    }

    #[test]
    fn test_dispatch_rejects_unassigned_cabin_request() {
        // Arrange
        let (dispatcher, _handle, _elevators) = setup_dispatcher(1, false);
        let orphan = floor_call(4, 1, 7);
        orphan.lock().unwrap().location = Location::InCabin;
        let lost = floor_call(5, 1, 7);
        {
            let mut lost = lost.lock().unwrap();
            lost.location = Location::InCabin;
            lost.assigned_elevator = Some(9);
        }

        // Act
        let orphan = dispatcher.dispatch(&orphan);
        let lost = dispatcher.dispatch(&lost);

        // Assert
        assert_eq!(orphan, Err(SimError::UnassignedCabinRequest { rider: 4 }));
        assert_eq!(lost, Err(SimError::UnknownElevator(9)));
    }

    #[test]
    fn test_dispatch_reservation_spreads_simultaneous_calls() {
        // Arrange
        let (mut dispatcher, handle, elevators) = setup_dispatcher(2, true);
        let first = floor_call(1, 5, 8);
        let second = floor_call(2, 2, 1);
        let third = floor_call(3, 6, 1);
        handle.submit(first.clone());
        handle.submit(second.clone());
        handle.submit(third.clone());

        // Act
        dispatcher.step(Duration::ZERO);

        // Assert
        assert_eq!(first.lock().unwrap().assigned_elevator, Some(1));
        assert_eq!(second.lock().unwrap().assigned_elevator, Some(2));
        assert_eq!(third.lock().unwrap().assigned_elevator, None);
        assert_eq!(elevators[0].path().to_vec(), vec![5]);
        assert_eq!(elevators[1].path().to_vec(), vec![2]);
    }

    #[test]
    fn test_dispatch_without_reservation_stacks_calls() {
        // Arrange
        let (mut dispatcher, handle, elevators) = setup_dispatcher(2, false);
        handle.submit(floor_call(1, 5, 8));
        handle.submit(floor_call(2, 2, 4));

        // Act
        dispatcher.step(Duration::ZERO);

        // Assert
        assert_eq!(elevators[0].path().to_vec(), vec![2, 5]);
        assert!(elevators[1].path().is_empty());
    }
}
