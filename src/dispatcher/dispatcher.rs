/***************************************/
/*        3rd party libraries          */
/***************************************/
use crossbeam_channel as cbc;
use log::{debug, info, warn};
use std::sync::Arc;
use std::time::Duration;

/***************************************/
/*           Local modules             */
/***************************************/
use crate::config::DispatchConfig;
use crate::elevator::Elevator;
use crate::rider::SharedRequest;
use crate::runtime::{Actor, Step};
use crate::shared::sync::lock;
use crate::shared::{ElevatorId, Location, SimError};

/***************************************/
/*             Public API              */
/***************************************/
/// Submission side of the dispatcher, cloned into every rider.
#[derive(Debug, Clone)]
pub struct DispatchHandle {
    request_tx: cbc::Sender<SharedRequest>,
}

impl DispatchHandle {
    /// Appends to the pending queue. Safe from any number of riders at once.
    pub fn submit(&self, request: SharedRequest) {
        if self.request_tx.send(request).is_err() {
            warn!("Dispatcher gone, request dropped");
        }
    }

    /// Requests submitted but not yet handled.
    pub fn pending(&self) -> usize {
        self.request_tx.len()
    }
}

/**
 * Assigns pending ride requests to elevators.
 *
 * Every poll the dispatcher drains its queue oldest first. A floor call goes
 * to the first available elevator in id order, a cabin request goes to the
 * elevator the rider is in. Each submission gets exactly one attempt: when it
 * fails the request is dropped and it is up to the rider to submit again.
 *
 * # Fields
 * - `request_rx`:          Pending requests, FIFO.
 * - `elevators`:           Every elevator, in id order.
 * - `reserve_on_assign`:   Reserve the chosen elevator so no second call lands on it before it moves.
 * - `poll_interval`:       Simulated time between two polls.
 */
pub struct Dispatcher {
    request_rx: cbc::Receiver<SharedRequest>,
    elevators: Vec<Arc<Elevator>>,
    reserve_on_assign: bool,
    poll_interval: Duration,
}

impl Dispatcher {
    pub fn new(elevators: Vec<Arc<Elevator>>, config: &DispatchConfig) -> (Dispatcher, DispatchHandle) {
        let (request_tx, request_rx) = cbc::unbounded::<SharedRequest>();
        let dispatcher = Dispatcher {
            request_rx,
            elevators,
            reserve_on_assign: config.reserve_on_assign,
            poll_interval: Duration::from_millis(config.poll_interval_ms),
        };
        (dispatcher, DispatchHandle { request_tx })
    }

    /// Handles one request and returns the elevator that got it.
    pub fn dispatch(&self, request: &SharedRequest) -> Result<ElevatorId, SimError> {
        let mut request = lock(request);
        match request.location {
            Location::AtFloor => {
                let elevator = self
                    .elevators
                    .iter()
                    .find(|e| {
                        e.is_available(request.origin, request.direction)
                            && (!self.reserve_on_assign || e.try_reserve())
                    })
                    .ok_or(SimError::NoElevatorAvailable {
                        floor: request.origin,
                    })?;

                if let Err(e) = elevator.enqueue_stop(request.origin, request.direction) {
                    elevator.release_reservation();
                    return Err(e);
                }
                request.assigned_elevator = Some(elevator.id());
                info!(
                    "Dispatcher: rider {} at floor {} -> elevator {}",
                    request.rider,
                    request.origin,
                    elevator.id()
                );
                Ok(elevator.id())
            }
            Location::InCabin => {
                let id = request
                    .assigned_elevator
                    .ok_or(SimError::UnassignedCabinRequest {
                        rider: request.rider,
                    })?;
                let elevator = self.elevator(id)?;
                elevator.enqueue_stop(request.target, request.direction)?;
                debug!(
                    "Dispatcher: rider {} in elevator {} -> floor {}",
                    request.rider, id, request.target
                );
                Ok(id)
            }
        }
    }

    fn elevator(&self, id: ElevatorId) -> Result<&Arc<Elevator>, SimError> {
        self.elevators
            .iter()
            .find(|e| e.id() == id)
            .ok_or(SimError::UnknownElevator(id))
    }
}

impl Actor for Dispatcher {
    fn name(&self) -> String {
        "dispatcher".to_string()
    }

    fn step(&mut self, _now: Duration) -> Step {
        while let Ok(request) = self.request_rx.try_recv() {
            if let Err(e) = self.dispatch(&request) {
                warn!("Dispatcher: dropping request of rider {}: {}", lock(&request).rider, e);
            }
        }
        Step::Sleep(self.poll_interval)
    }
}
