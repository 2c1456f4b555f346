/***************************************/
/*        3rd party libraries          */
/***************************************/
use crossbeam_channel as cbc;
use log::{debug, info, warn};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/***************************************/
/*           Local modules             */
/***************************************/
use super::path_queue::PathQueue;
use crate::building::{Button, FloorTable};
use crate::runtime::EventBus;
use crate::shared::sync::lock;
use crate::shared::{
    Direction, DoorState, ElevatorId, ElevatorSnapshot, FloorIndex, MotionState, RiderId, SimError,
};

/***************************************/
/*       Public data structures        */
/***************************************/
/// Telemetry raised by an elevator's control loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElevatorEvent {
    FloorChanged { elevator: ElevatorId, floor: FloorIndex },
    DoorOpened { elevator: ElevatorId, floor: FloorIndex },
    DoorClosed { elevator: ElevatorId, floor: FloorIndex },
    Arrived { elevator: ElevatorId, floor: FloorIndex },
}

impl ElevatorEvent {
    pub fn elevator(&self) -> ElevatorId {
        match *self {
            ElevatorEvent::FloorChanged { elevator, .. }
            | ElevatorEvent::DoorOpened { elevator, .. }
            | ElevatorEvent::DoorClosed { elevator, .. }
            | ElevatorEvent::Arrived { elevator, .. } => elevator,
        }
    }

    pub fn floor(&self) -> FloorIndex {
        match *self {
            ElevatorEvent::FloorChanged { floor, .. }
            | ElevatorEvent::DoorOpened { floor, .. }
            | ElevatorEvent::DoorClosed { floor, .. }
            | ElevatorEvent::Arrived { floor, .. } => floor,
        }
    }
}

/// Physical state as last written by the control loop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ElevatorStatus {
    pub position: f64,
    pub velocity: f64,
    pub floor: FloorIndex,
    pub direction: Direction,
    pub motion_state: MotionState,
    pub door_state: DoorState,
}

/**
 * Shared handle of one elevator shaft.
 *
 * The control loop (`ElevatorFSM`) is the only writer of the physical status.
 * The scheduler and riders go through this handle to queue stops, board and
 * leave, and subscribe to telemetry.
 *
 * # Fields
 * - `id`:              Elevator number, starting at 1.
 * - `capacity`:        Maximum number of occupants.
 * - `path`:            Floors still to visit.
 * - `occupants`:       Riders currently in the cabin.
 * - `status`:          Position, velocity, floor, direction, motion and door state.
 * - `cabin_buttons`:   One button per floor on the cabin panel.
 * - `events`:          Bus carrying `ElevatorEvent`s to subscribers.
 * - `reserved`:        Set by the scheduler when it claims the elevator, cleared when it leaves idle.
 * - `stop_requested`:  Asks the control loop to park at the nearest floor.
 */
#[derive(Debug)]
pub struct Elevator {
    id: ElevatorId,
    capacity: usize,
    floors: Arc<FloorTable>,
    path: PathQueue,
    occupants: Mutex<HashSet<RiderId>>,
    status: Mutex<ElevatorStatus>,
    cabin_buttons: HashMap<FloorIndex, Button>,
    events: EventBus<ElevatorEvent>,
    reserved: AtomicBool,
    stop_requested: AtomicBool,
}

impl Elevator {
    pub fn new(
        id: ElevatorId,
        capacity: usize,
        floors: Arc<FloorTable>,
        start_floor: FloorIndex,
    ) -> Result<Elevator, SimError> {
        let position = floors.offset_of(start_floor)?;
        let cabin_buttons = floors.indices().map(|f| (f, Button::default())).collect();

        Ok(Elevator {
            id,
            capacity,
            floors,
            path: PathQueue::new(),
            occupants: Mutex::new(HashSet::new()),
            status: Mutex::new(ElevatorStatus {
                position,
                velocity: 0.0,
                floor: start_floor,
                direction: Direction::None,
                motion_state: MotionState::Idle,
                door_state: DoorState::Closed,
            }),
            cabin_buttons,
            events: EventBus::new(),
            reserved: AtomicBool::new(false),
            stop_requested: AtomicBool::new(false),
        })
    }

    pub fn id(&self) -> ElevatorId {
        self.id
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn floors(&self) -> &Arc<FloorTable> {
        &self.floors
    }

    pub fn path(&self) -> &PathQueue {
        &self.path
    }

    /***************************************/
    /*             Path queue              */
    /***************************************/
    /// Queues a stop. Returns `Ok(false)` when the floor was already queued.
    pub fn enqueue_stop(&self, floor: FloorIndex, direction: Direction) -> Result<bool, SimError> {
        if !self.floors.contains(floor) {
            return Err(SimError::InvalidFloorReference(floor));
        }
        let added = self.path.enqueue(floor, direction);
        if added {
            debug!(
                "[ID {}] Floor {} added to path ({:?}): {:?}",
                self.id,
                floor,
                direction,
                self.path.to_vec()
            );
        } else {
            debug!("[ID {}] Floor {} already in path, ignored", self.id, floor);
        }
        Ok(added)
    }

    /// The elevator takes new calls only while parked with its doors closed.
    /// The requested floor and direction are not weighed.
    pub fn is_available(&self, _floor: FloorIndex, _direction: Direction) -> bool {
        let status = self.status();
        status.motion_state == MotionState::Idle
            && status.door_state == DoorState::Closed
            && !self.is_reserved()
    }

    pub fn try_reserve(&self) -> bool {
        self.reserved
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    pub fn is_reserved(&self) -> bool {
        self.reserved.load(Ordering::SeqCst)
    }

    pub(crate) fn release_reservation(&self) {
        self.reserved.store(false, Ordering::SeqCst);
    }

    /// Drops every queued stop and parks at the nearest floor.
    pub fn request_stop(&self) {
        info!("[ID {}] Stop requested", self.id);
        self.stop_requested.store(true, Ordering::SeqCst);
    }

    pub(crate) fn take_stop_request(&self) -> bool {
        self.stop_requested.swap(false, Ordering::SeqCst)
    }

    /***************************************/
    /*             Occupants               */
    /***************************************/
    pub fn board_rider(&self, rider: RiderId) -> Result<(), SimError> {
        let mut occupants = lock(&self.occupants);
        if occupants.contains(&rider) {
            return Ok(());
        }
        if occupants.len() >= self.capacity {
            warn!("[ID {}] Full, rider {} cannot board", self.id, rider);
            return Err(SimError::CapacityExceeded {
                elevator: self.id,
                capacity: self.capacity,
            });
        }
        occupants.insert(rider);
        info!(
            "[ID {}] Rider {} boarded, {} on board",
            self.id,
            rider,
            occupants.len()
        );
        Ok(())
    }

    pub fn remove_rider(&self, rider: RiderId) -> bool {
        let mut occupants = lock(&self.occupants);
        let removed = occupants.remove(&rider);
        if removed {
            info!(
                "[ID {}] Rider {} left, {} on board",
                self.id,
                rider,
                occupants.len()
            );
        } else {
            warn!("[ID {}] Rider {} is not on board", self.id, rider);
        }
        removed
    }

    pub fn occupant_count(&self) -> usize {
        lock(&self.occupants).len()
    }

    pub fn has_rider(&self, rider: RiderId) -> bool {
        lock(&self.occupants).contains(&rider)
    }

    /***************************************/
    /*           Cabin buttons             */
    /***************************************/
    pub fn press_cabin_button(&self, floor: FloorIndex) -> Result<bool, SimError> {
        let button = self
            .cabin_buttons
            .get(&floor)
            .ok_or(SimError::InvalidFloorReference(floor))?;
        let pressed = button.press();
        if !pressed {
            debug!("[ID {}] Cabin button {} already lit", self.id, floor);
        }
        Ok(pressed)
    }

    pub fn cabin_button_pressed(&self, floor: FloorIndex) -> bool {
        self.cabin_buttons
            .get(&floor)
            .map(|button| button.is_pressed())
            .unwrap_or(false)
    }

    pub(crate) fn clear_cabin_button(&self, floor: FloorIndex) {
        if let Some(button) = self.cabin_buttons.get(&floor) {
            button.cancel();
        }
    }

    /***************************************/
    /*         Status and events           */
    /***************************************/
    pub fn status(&self) -> ElevatorStatus {
        *lock(&self.status)
    }

    pub(crate) fn set_status(&self, status: ElevatorStatus) {
        *lock(&self.status) = status;
    }

    pub fn subscribe(&self) -> cbc::Receiver<ElevatorEvent> {
        self.events.subscribe()
    }

    pub fn attach(&self, tx: cbc::Sender<ElevatorEvent>) {
        self.events.attach(tx);
    }

    pub(crate) fn publish(&self, event: ElevatorEvent) {
        self.events.publish(event);
    }

    pub fn snapshot(&self) -> ElevatorSnapshot {
        let status = self.status();
        ElevatorSnapshot {
            id: self.id,
            position: status.position,
            velocity: status.velocity,
            floor: status.floor,
            direction: status.direction,
            motion_state: status.motion_state,
            door_state: status.door_state,
            occupants: self.occupant_count(),
            capacity: self.capacity,
            path_queue: self.path.to_vec(),
        }
    }
}
