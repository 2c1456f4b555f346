/***************************************/
/*        3rd party libraries          */
/***************************************/
use std::sync::{Arc, Mutex};
use std::time::Duration;

/***************************************/
/*           Local modules             */
/***************************************/
use crate::shared::{Direction, ElevatorId, FloorIndex, Location, RiderId};

/**
 * One journey from `origin` to `target`.
 *
 * Owned by its rider and shared with the dispatcher. The dispatcher writes
 * `assigned_elevator`, the rider writes everything else.
 *
 * # Fields
 * - `rider`:               Rider making the journey.
 * - `origin`:              Floor the rider called from.
 * - `target`:              Floor the rider wants to reach.
 * - `direction`:           Direction from `origin` to `target`.
 * - `assigned_elevator`:   Elevator serving the journey, once dispatched.
 * - `location`:            `AtFloor` for a floor call, `InCabin` for a cabin request.
 * - `start_time`:          Simulated time of the first call.
 * - `boarded_time`:        Simulated time the rider boarded.
 * - `end_time`:            Simulated time the rider left the cabin.
 */
#[derive(Debug, Clone, PartialEq)]
pub struct RideRequest {
    pub rider: RiderId,
    pub origin: FloorIndex,
    pub target: FloorIndex,
    pub direction: Direction,
    pub assigned_elevator: Option<ElevatorId>,
    pub location: Location,
    pub start_time: Duration,
    pub boarded_time: Option<Duration>,
    pub end_time: Option<Duration>,
}

pub type SharedRequest = Arc<Mutex<RideRequest>>;

impl RideRequest {
    pub fn new(rider: RiderId, origin: FloorIndex, target: FloorIndex, now: Duration) -> RideRequest {
        RideRequest {
            rider,
            origin,
            target,
            direction: Direction::between(origin, target),
            assigned_elevator: None,
            location: Location::AtFloor,
            start_time: now,
            boarded_time: None,
            end_time: None,
        }
    }

    pub fn shared(self) -> SharedRequest {
        Arc::new(Mutex::new(self))
    }

    /// Time spent on the floor before boarding.
    pub fn wait_time(&self) -> Option<Duration> {
        self.boarded_time
            .map(|boarded| boarded.saturating_sub(self.start_time))
    }

    /// Time from the first call until leaving the cabin.
    pub fn journey_time(&self) -> Option<Duration> {
        self.end_time.map(|end| end.saturating_sub(self.start_time))
    }
}

/***************************************/
/*             Unit tests              */
/***************************************/
