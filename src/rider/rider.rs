/***************************************/
/*        3rd party libraries          */
/***************************************/
use std::sync::Mutex;
use std::time::Duration;

/***************************************/
/*           Local modules             */
/***************************************/
use super::request::SharedRequest;
use crate::shared::sync::lock;
use crate::shared::{ElevatorId, FloorIndex, Location, RiderId, RiderSnapshot, RiderState};

/// Raised on the building's rider bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiderEvent {
    RequestCompleted {
        rider: RiderId,
        origin: FloorIndex,
        target: FloorIndex,
        wait: Duration,
        total: Duration,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RiderStatus {
    pub state: RiderState,
    pub location: Location,
    pub current_floor: FloorIndex,
    pub elevator: Option<ElevatorId>,
}

/**
 * Shared, read-mostly view of one rider.
 *
 * `RiderFSM` owns the behaviour and writes here after each transition, so
 * the status reporter and tests can observe a rider without touching its
 * control loop.
 */
#[derive(Debug)]
pub struct Rider {
    id: RiderId,
    status: Mutex<RiderStatus>,
    request: Mutex<Option<SharedRequest>>,
}

impl Rider {
    pub fn new(id: RiderId, floor: FloorIndex) -> Rider {
        Rider {
            id,
            status: Mutex::new(RiderStatus {
                state: RiderState::Waiting,
                location: Location::AtFloor,
                current_floor: floor,
                elevator: None,
            }),
            request: Mutex::new(None),
        }
    }

    pub fn id(&self) -> RiderId {
        self.id
    }

    pub fn status(&self) -> RiderStatus {
        *lock(&self.status)
    }

    pub fn state(&self) -> RiderState {
        self.status().state
    }

    pub(crate) fn set_status(&self, status: RiderStatus) {
        *lock(&self.status) = status;
    }

    pub fn request(&self) -> Option<SharedRequest> {
        lock(&self.request).clone()
    }

    pub(crate) fn set_request(&self, request: Option<SharedRequest>) {
        *lock(&self.request) = request;
    }

    pub fn snapshot(&self) -> RiderSnapshot {
        let status = self.status();
        let target_floor = self.request().as_ref().map(|request| lock(request).target);
        RiderSnapshot {
            id: self.id,
            state: status.state,
            location: status.location,
            current_floor: status.current_floor,
            target_floor,
            elevator: status.elevator,
        }
    }
}
