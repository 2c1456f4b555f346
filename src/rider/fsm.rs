/***************************************/
/*        3rd party libraries          */
/***************************************/
use crossbeam_channel as cbc;
use log::{debug, info, trace, warn};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::sync::Arc;
use std::time::Duration;

/***************************************/
/*           Local modules             */
/***************************************/
use super::request::{RideRequest, SharedRequest};
use super::rider::{Rider, RiderEvent, RiderStatus};
use crate::building::FloorTable;
use crate::config::RiderConfig;
use crate::dispatcher::DispatchHandle;
use crate::elevator::{Elevator, ElevatorEvent};
use crate::runtime::{Actor, EventBus, Step};
use crate::shared::sync::lock;
use crate::shared::{Direction, ElevatorId, FloorIndex, Location, RiderState, SimError};

/// Everything a rider needs from the building, shared by all riders.
#[derive(Clone)]
pub struct RiderContext {
    pub elevators: Vec<Arc<Elevator>>,
    pub floors: Arc<FloorTable>,
    pub dispatch: DispatchHandle,
    pub completions: Arc<EventBus<RiderEvent>>,
    pub timings: RiderConfig,
    pub seed: u64,
}

/**
 * Control loop of one rider.
 *
 * Waiting -> Calling -> CheckingElevatorArrival -> Boarding -> InCabin ->
 * CheckingDestination -> Exiting -> Completed
 *
 * Elevator telemetry arrives on a single channel attached to every
 * elevator's bus and is drained at the start of each step.
 *
 * # Fields
 * - `rider`:           Shared view updated after every transition.
 * - `ctx`:             Elevators, floors, dispatcher handle and timings.
 * - `events_rx`:       Merged `ElevatorEvent`s of every elevator.
 * - `rng`:             Picks target floors. Seeded from the simulation seed and rider id.
 * - `fixed_target`:    Target used instead of a random one.
 * - `state`:           Current lifecycle state.
 * - `floor`:           Floor the rider stands on, or the cabin's floor while riding.
 * - `elevator`:        Elevator the rider is in.
 * - `request`:         Journey in progress.
 * - `deadline`:        End of the current delay, if one is running.
 * - `called_at`:       Last time the rider submitted a floor call.
 * - `open_doors`:      Elevators reported open at the rider's floor.
 */
pub struct RiderFSM {
    rider: Arc<Rider>,
    ctx: RiderContext,
    events_rx: cbc::Receiver<ElevatorEvent>,
    rng: StdRng,
    fixed_target: Option<FloorIndex>,

    state: RiderState,
    floor: FloorIndex,
    elevator: Option<ElevatorId>,
    request: Option<SharedRequest>,
    deadline: Option<Duration>,
    called_at: Duration,
    open_doors: Vec<ElevatorId>,
}

impl RiderFSM {
    pub fn new(rider: Arc<Rider>, ctx: RiderContext, fixed_target: Option<FloorIndex>) -> RiderFSM {
        let (events_tx, events_rx) = cbc::unbounded::<ElevatorEvent>();
        for elevator in ctx.elevators.iter() {
            elevator.attach(events_tx.clone());
        }
        let seed = ctx.seed ^ rider.id().wrapping_mul(0x9E37_79B9_7F4A_7C15);
        let floor = rider.status().current_floor;

        RiderFSM {
            rider,
            rng: StdRng::seed_from_u64(seed),
            ctx,
            events_rx,
            fixed_target,
            state: RiderState::Waiting,
            floor,
            elevator: None,
            request: None,
            deadline: None,
            called_at: Duration::ZERO,
            open_doors: Vec::new(),
        }
    }

    fn poll(&self) -> Step {
        Step::Sleep(Duration::from_millis(self.ctx.timings.poll_ms))
    }

    /// Starts a delay on the first call and reports whether it has run out.
    fn delay_elapsed(&mut self, now: Duration, delay_ms: u64) -> bool {
        let deadline = *self
            .deadline
            .get_or_insert(now + Duration::from_millis(delay_ms));
        if now >= deadline {
            self.deadline = None;
            true
        } else {
            false
        }
    }

    fn transition(&mut self, state: RiderState) {
        debug!("Rider {}: {:?} -> {:?}", self.rider.id(), self.state, state);
        self.state = state;
        self.deadline = None;
        self.publish_status();
    }

    fn publish_status(&self) {
        self.rider.set_status(RiderStatus {
            state: self.state,
            location: if self.elevator.is_some() {
                Location::InCabin
            } else {
                Location::AtFloor
            },
            current_floor: self.floor,
            elevator: self.elevator,
        });
    }

    fn elevator_by_id(&self, id: ElevatorId) -> Option<&Arc<Elevator>> {
        self.ctx.elevators.iter().find(|e| e.id() == id)
    }

    /***************************************/
    /*          Elevator events            */
    /***************************************/
    fn drain_events(&mut self) {
        while let Ok(event) = self.events_rx.try_recv() {
            trace!("Rider {}: {:?}", self.rider.id(), event);
            match event {
                ElevatorEvent::DoorOpened { elevator, floor } if floor == self.floor => {
                    if !self.open_doors.contains(&elevator) {
                        self.open_doors.push(elevator);
                    }
                }
                ElevatorEvent::DoorClosed { elevator, .. } => {
                    self.open_doors.retain(|id| *id != elevator);
                }
                ElevatorEvent::FloorChanged { elevator, floor }
                    if self.elevator == Some(elevator) =>
                {
                    self.floor = floor;
                    self.publish_status();
                }
                _ => (),
            }
        }
    }

    /***************************************/
    /*              States                 */
    /***************************************/
    fn choose_target(&mut self) -> Result<FloorIndex, SimError> {
        if let Some(target) = self.fixed_target.take() {
            if target != self.floor && self.ctx.floors.contains(target) {
                return Ok(target);
            }
            warn!("Rider {}: ignoring target floor {}", self.rider.id(), target);
        }
        let here = self.floor;
        let choices: Vec<FloorIndex> = self.ctx.floors.indices().filter(|f| *f != here).collect();
        choices
            .choose(&mut self.rng)
            .copied()
            .ok_or(SimError::NoTargetFloor { floor: here })
    }

    fn call(&mut self, now: Duration) -> Step {
        let target = match self.choose_target() {
            Ok(target) => target,
            Err(e) => {
                warn!("Rider {}: no journey this time: {}", self.rider.id(), e);
                return self.poll();
            }
        };
        let request = RideRequest::new(self.rider.id(), self.floor, target, now).shared();
        info!(
            "Rider {}: calling at floor {} to go to floor {}",
            self.rider.id(),
            self.floor,
            target
        );
        self.rider.set_request(Some(request.clone()));
        self.request = Some(request);
        self.submit_floor_call(now);
        self.transition(RiderState::CheckingElevatorArrival);
        self.poll()
    }

    fn submit_floor_call(&mut self, now: Duration) {
        let Some(request) = self.request.clone() else {
            return;
        };
        let direction = {
            let mut request = lock(&request);
            request.location = Location::AtFloor;
            request.assigned_elevator = None;
            request.direction
        };
        if let Ok(floor) = self.ctx.floors.get(self.floor) {
            floor.press(direction);
        }
        self.called_at = now;
        self.ctx.dispatch.submit(request);
        self.note_open_doors();
    }

    /// Picks up elevators whose doors opened before this rider was listening.
    fn note_open_doors(&mut self) {
        for elevator in self.ctx.elevators.iter() {
            let status = elevator.status();
            if status.floor == self.floor
                && status.door_state.is_open()
                && !self.open_doors.contains(&elevator.id())
            {
                self.open_doors.push(elevator.id());
            }
        }
    }

    fn check_arrival(&mut self, now: Duration) -> Step {
        let assigned = self
            .request
            .as_ref()
            .and_then(|request| lock(request).assigned_elevator);

        // The assigned elevator first, then any other open at this floor.
        let mut candidates = self.open_doors.clone();
        if let Some(id) = assigned {
            if let Some(position) = candidates.iter().position(|c| *c == id) {
                candidates.swap(0, position);
            }
        }

        for id in candidates {
            let Some(elevator) = self.elevator_by_id(id).cloned() else {
                continue;
            };
            let status = elevator.status();
            if status.floor != self.floor || !status.door_state.is_open() {
                continue;
            }
            match elevator.board_rider(self.rider.id()) {
                Ok(()) => {
                    self.board(&elevator, now);
                    return self.poll();
                }
                Err(e) => {
                    debug!("Rider {}: not boarding: {}", self.rider.id(), e);
                    self.open_doors.retain(|c| *c != id);
                }
            }
        }

        let recall = Duration::from_millis(self.ctx.timings.recall_timeout_ms);
        if now >= self.called_at + recall {
            info!(
                "Rider {}: no elevator after {:?}, calling again",
                self.rider.id(),
                recall
            );
            self.submit_floor_call(now);
        }
        self.poll()
    }

    fn board(&mut self, elevator: &Arc<Elevator>, now: Duration) {
        let direction = match self.request.as_ref() {
            Some(request) => {
                let mut request = lock(request);
                request.boarded_time = Some(now);
                request.assigned_elevator = Some(elevator.id());
                request.direction
            }
            None => Direction::None,
        };
        if let Ok(floor) = self.ctx.floors.get(self.floor) {
            floor.cancel(direction);
        }
        self.elevator = Some(elevator.id());
        self.open_doors.clear();
        self.transition(RiderState::Boarding);
    }

    fn press_cabin_button(&mut self) {
        let (Some(request), Some(id)) = (self.request.clone(), self.elevator) else {
            return;
        };
        let target = {
            let mut request = lock(&request);
            request.location = Location::InCabin;
            request.assigned_elevator = Some(id);
            request.target
        };
        if let Some(elevator) = self.elevator_by_id(id) {
            if let Err(e) = elevator.press_cabin_button(target) {
                warn!("Rider {}: {}", self.rider.id(), e);
            }
        }
        self.ctx.dispatch.submit(request);
    }

    fn check_destination(&mut self) -> Step {
        let target = match self.request.as_ref() {
            Some(request) => lock(request).target,
            None => return self.poll(),
        };
        let Some(elevator) = self.elevator.and_then(|id| self.elevator_by_id(id)) else {
            return self.poll();
        };
        let status = elevator.status();
        if status.floor != self.floor {
            self.floor = status.floor;
            self.publish_status();
        }
        if self.floor == target && status.door_state.is_open() {
            self.transition(RiderState::Exiting);
        }
        self.poll()
    }

    fn exit(&mut self, now: Duration) {
        if let Some(elevator) = self.elevator.and_then(|id| self.elevator_by_id(id)) {
            elevator.remove_rider(self.rider.id());
        }
        self.elevator = None;

        let Some(request) = self.request.take() else {
            return;
        };
        let event = {
            let mut request = lock(&request);
            request.end_time = Some(now);
            self.floor = request.target;
            RiderEvent::RequestCompleted {
                rider: request.rider,
                origin: request.origin,
                target: request.target,
                wait: request.wait_time().unwrap_or_default(),
                total: request.journey_time().unwrap_or_default(),
            }
        };
        info!("Rider {}: journey done {:?}", self.rider.id(), event);
        self.ctx.completions.publish(event);
    }
}

impl Actor for RiderFSM {
    fn name(&self) -> String {
        format!("rider_{}", self.rider.id())
    }

    fn step(&mut self, now: Duration) -> Step {
        self.drain_events();

        match self.state {
            RiderState::Waiting => {
                if self.delay_elapsed(now, self.ctx.timings.call_delay_ms) {
                    self.transition(RiderState::Calling);
                }
                self.poll()
            }
            RiderState::Calling => self.call(now),
            RiderState::CheckingElevatorArrival => self.check_arrival(now),
            RiderState::Boarding => {
                self.transition(RiderState::InCabin);
                self.poll()
            }
            RiderState::InCabin => {
                if self.delay_elapsed(now, self.ctx.timings.cabin_button_delay_ms) {
                    self.press_cabin_button();
                    self.transition(RiderState::CheckingDestination);
                }
                self.poll()
            }
            RiderState::CheckingDestination => self.check_destination(),
            RiderState::Exiting => {
                if self.delay_elapsed(now, self.ctx.timings.exit_delay_ms) {
                    self.exit(now);
                    self.transition(RiderState::Completed);
                }
                self.poll()
            }
            RiderState::Completed => {
                if self.ctx.timings.repeat_journeys {
                    self.transition(RiderState::Waiting);
                    self.poll()
                } else {
                    Step::Done
                }
            }
        }
    }
}
