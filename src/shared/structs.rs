/***************************************/
/*        3rd party libraries          */
/***************************************/
use serde::Serialize;

/***************************************/
/*           Type aliases              */
/***************************************/
/// Signed floor number. Ground floor is 1, basements are negative, 0 is never used.
pub type FloorIndex = i32;
pub type ElevatorId = u32;
pub type RiderId = u64;

/***************************************/
/*       Public data structures        */
/***************************************/
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
    None,
}

impl Direction {
    /// Direction of travel needed to cover `delta`.
    pub fn from_delta(delta: f64) -> Direction {
        if delta > 0.0 {
            Direction::Up
        } else if delta < 0.0 {
            Direction::Down
        } else {
            Direction::None
        }
    }

    /// Direction a rider at `from` must call to reach `to`.
    pub fn between(from: FloorIndex, to: FloorIndex) -> Direction {
        match to.cmp(&from) {
            std::cmp::Ordering::Greater => Direction::Up,
            std::cmp::Ordering::Less => Direction::Down,
            std::cmp::Ordering::Equal => Direction::None,
        }
    }

    pub fn sign(&self) -> f64 {
        match *self {
            Direction::Up => 1.0,
            Direction::Down => -1.0,
            Direction::None => 0.0,
        }
    }
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum Location {
    AtFloor,
    InCabin,
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MotionState {
    Idle,
    Moving,
}

/// Door phases in the order a door cycle walks through them.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum DoorState {
    OpeningStarted,
    Opening,
    Opened,
    WaitingStarted,
    Waiting,
    WaitingFinished,
    ClosingStarted,
    Closing,
    Closed,
}

impl DoorState {
    pub const CYCLE: [DoorState; 9] = [
        DoorState::OpeningStarted,
        DoorState::Opening,
        DoorState::Opened,
        DoorState::WaitingStarted,
        DoorState::Waiting,
        DoorState::WaitingFinished,
        DoorState::ClosingStarted,
        DoorState::Closing,
        DoorState::Closed,
    ];

    /// Phase following this one, `None` once the doors are closed.
    pub fn next(&self) -> Option<DoorState> {
        let position = DoorState::CYCLE.iter().position(|phase| phase == self)?;
        DoorState::CYCLE.get(position + 1).copied()
    }

    /// Whether a rider can walk through the doors in this phase.
    pub fn is_open(&self) -> bool {
        matches!(
            self,
            DoorState::Opened
                | DoorState::WaitingStarted
                | DoorState::Waiting
                | DoorState::WaitingFinished
        )
    }
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum RiderState {
    Waiting,
    Calling,
    CheckingElevatorArrival,
    Boarding,
    InCabin,
    CheckingDestination,
    Exiting,
    Completed,
}

/***************************************/
/*         Read-only snapshots         */
/***************************************/
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ElevatorSnapshot {
    pub id: ElevatorId,
    pub position: f64,
    pub velocity: f64,
    pub floor: FloorIndex,
    pub direction: Direction,
    #[serde(rename = "motion")]
    pub motion_state: MotionState,
    #[serde(rename = "door")]
    pub door_state: DoorState,
    pub occupants: usize,
    pub capacity: usize,
    #[serde(rename = "path")]
    pub path_queue: Vec<FloorIndex>,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct RiderSnapshot {
    pub id: RiderId,
    pub state: RiderState,
    pub location: Location,
    #[serde(rename = "currentFloor")]
    pub current_floor: FloorIndex,
    #[serde(rename = "targetFloor")]
    pub target_floor: Option<FloorIndex>,
    pub elevator: Option<ElevatorId>,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct BuildingSnapshot {
    #[serde(rename = "timeMs")]
    pub time_ms: u64,
    pub elevators: Vec<ElevatorSnapshot>,
    pub riders: Vec<RiderSnapshot>,
    #[serde(rename = "pendingRequests")]
    pub pending_requests: usize,
}

/***************************************/
/*             Unit tests              */
/***************************************/
