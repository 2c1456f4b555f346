/***************************************/
/*        3rd party libraries          */
/***************************************/
use thiserror::Error;

/***************************************/
/*           Local modules             */
/***************************************/
use super::structs::{ElevatorId, FloorIndex, RiderId};

/// Recoverable failures raised inside the control loops.
///
/// None of these terminate a loop: each is logged at the boundary of the
/// loop that produced it and the loop carries on.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SimError {
    #[error("floor {0} does not exist in this building")]
    InvalidFloorReference(FloorIndex),

    #[error("position {0:.3} lies outside the shaft")]
    PositionOutOfRange(f64),

    #[error("elevator {elevator} is full (capacity {capacity})")]
    CapacityExceeded {
        elevator: ElevatorId,
        capacity: usize,
    },

    #[error("no elevator available for a call at floor {floor}")]
    NoElevatorAvailable { floor: FloorIndex },

    #[error("no destination other than floor {floor} exists")]
    NoTargetFloor { floor: FloorIndex },

    #[error("elevator {0} does not exist")]
    UnknownElevator(ElevatorId),

    #[error("cabin request of rider {rider} has no elevator attached")]
    UnassignedCabinRequest { rider: RiderId },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read configuration file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse configuration file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}
