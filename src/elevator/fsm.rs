/***************************************/
/*        3rd party libraries          */
/***************************************/
use log::{debug, info, trace, warn};
use std::sync::Arc;
use std::time::Duration;

/***************************************/
/*           Local modules             */
/***************************************/
use super::door::DoorCycle;
use super::elevator::{Elevator, ElevatorEvent, ElevatorStatus};
use super::kinematics::{Motion, MotionProfile};
use crate::building::FloorTable;
use crate::config::{DoorConfig, ElevatorConfig};
use crate::runtime::{Actor, Step};
use crate::shared::{Direction, DoorState, FloorIndex, MotionState};

/// Where the cabin is heading during one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Target {
    /// A floor taken from the path queue.
    Stop(FloorIndex, f64),
    /// A parking position with no door cycle at the end.
    Park(f64),
}

impl Target {
    fn offset(&self) -> f64 {
        match *self {
            Target::Stop(_, offset) | Target::Park(offset) => offset,
        }
    }
}

/**
 * Control loop of one elevator.
 *
 * Every tick the FSM picks a target from the head of the path queue (or the
 * nearest floor when the queue is empty), integrates the motion profile
 * towards it and publishes a `FloorChanged` event whenever the cabin passes
 * another floor. Reaching a queued floor runs the door cycle, one phase per
 * step, during which the cabin does not move.
 *
 * # Fields
 * - `elevator`:        Shared handle. The FSM is the only writer of its status.
 * - `floors`:          Floor table used for floor / position conversions.
 * - `profile`:         Acceleration and speed limits.
 * - `door_timings`:    Duration of every door phase.
 * - `tick`:            Simulated time between two motion updates.
 * - `motion`:          Current position and velocity.
 * - `floor`:           Last known floor. Kept when a lookup fails.
 * - `direction`:       Direction of travel.
 * - `motion_state`:    `Idle` or `Moving`.
 * - `door`:            Running door cycle, if any.
 * - `parking`:         Graceful-stop target after `request_stop`.
 */
pub struct ElevatorFSM {
    elevator: Arc<Elevator>,
    floors: Arc<FloorTable>,
    profile: MotionProfile,
    door_timings: DoorConfig,
    tick: Duration,

    motion: Motion,
    floor: FloorIndex,
    direction: Direction,
    motion_state: MotionState,
    door: Option<DoorCycle>,
    parking: Option<f64>,
}

impl ElevatorFSM {
    pub fn new(elevator: Arc<Elevator>, config: &ElevatorConfig, door: &DoorConfig) -> ElevatorFSM {
        let status = elevator.status();
        ElevatorFSM {
            floors: elevator.floors().clone(),
            elevator,
            profile: MotionProfile::from(config),
            door_timings: door.clone(),
            tick: config.tick(),
            motion: Motion {
                position: status.position,
                velocity: status.velocity,
            },
            floor: status.floor,
            direction: status.direction,
            motion_state: status.motion_state,
            door: None,
            parking: None,
        }
    }

    /***************************************/
    /*             Door cycle              */
    /***************************************/
    fn step_door(&mut self) -> Step {
        let Some(door) = self.door.as_mut() else {
            return Step::Sleep(self.tick);
        };

        let phase = door.advance().unwrap_or(DoorState::Closed);
        let hold = door.hold_time();
        debug!("[ID {}] Door {:?} at floor {}", self.elevator.id(), phase, self.floor);

        match phase {
            DoorState::Opened => {
                self.publish_status();
                self.elevator.publish(ElevatorEvent::DoorOpened {
                    elevator: self.elevator.id(),
                    floor: self.floor,
                });
                Step::Sleep(hold)
            }
            DoorState::Closed => {
                self.door = None;
                self.direction = Direction::None;
                self.motion_state = if self.elevator.path().is_empty() {
                    MotionState::Idle
                } else {
                    MotionState::Moving
                };
                self.publish_status();
                self.elevator.publish(ElevatorEvent::DoorClosed {
                    elevator: self.elevator.id(),
                    floor: self.floor,
                });
                self.elevator.publish(ElevatorEvent::Arrived {
                    elevator: self.elevator.id(),
                    floor: self.floor,
                });
                info!("[ID {}] Arrived at floor {}", self.elevator.id(), self.floor);
                Step::Sleep(self.tick)
            }
            _ => {
                self.publish_status();
                Step::Sleep(hold)
            }
        }
    }

    /// Snaps onto a queued floor and starts the door cycle.
    fn arrive(&mut self, floor: FloorIndex, offset: f64) -> Step {
        self.motion = Motion::at_rest(offset);
        self.floor = floor;
        self.motion_state = MotionState::Moving;
        self.elevator.release_reservation();
        self.elevator.path().dequeue(floor);
        self.elevator.clear_cabin_button(floor);

        let door = DoorCycle::start(&self.door_timings);
        let hold = door.hold_time();
        self.door = Some(door);
        debug!("[ID {}] Stopping at floor {}", self.elevator.id(), floor);
        self.publish_status();
        Step::Sleep(hold)
    }

    /***************************************/
    /*               Motion                */
    /***************************************/
    fn step_motion(&mut self) -> Step {
        if self.elevator.take_stop_request() {
            let dropped = self.elevator.path().clear();
            let target = self.stop_offset();
            info!(
                "[ID {}] Stopping at offset {:.2}, dropped stops {:?}",
                self.elevator.id(),
                target,
                dropped
            );
            self.parking = Some(target);
        }

        let target = self.next_target();
        if self.motion.is_at(target.offset()) {
            return match target {
                Target::Stop(floor, offset) => self.arrive(floor, offset),
                Target::Park(offset) => {
                    self.motion = Motion::at_rest(offset);
                    self.parking = None;
                    self.settle_idle();
                    Step::Sleep(self.tick)
                }
            };
        }

        if self.motion_state == MotionState::Idle {
            debug!("[ID {}] Leaving floor {}", self.elevator.id(), self.floor);
        }
        self.motion_state = MotionState::Moving;
        self.elevator.release_reservation();
        self.direction = Direction::from_delta(target.offset() - self.motion.position);

        let dt = self.tick.as_secs_f64();
        let next = self.profile.advance(self.motion, target.offset(), dt);
        self.motion = self.clamp_to_shaft(next);
        trace!(
            "[ID {}] pos={:.3} vel={:.3} target={:.2}",
            self.elevator.id(),
            self.motion.position,
            self.motion.velocity,
            target.offset()
        );

        self.update_floor();
        self.publish_status();
        Step::Sleep(self.tick)
    }

    fn next_target(&mut self) -> Target {
        while let Some(floor) = self.elevator.path().head() {
            match self.floors.offset_of(floor) {
                Ok(offset) => {
                    self.parking = None;
                    return Target::Stop(floor, offset);
                }
                Err(e) => {
                    warn!("[ID {}] Dropping queued stop: {}", self.elevator.id(), e);
                    self.elevator.path().dequeue(floor);
                }
            }
        }
        match self.parking {
            Some(offset) => Target::Park(offset),
            None => Target::Park(self.floors.nearest_offset(self.motion.position)),
        }
    }

    /// First floor the cabin can still stop at without exceeding its braking rate.
    fn stop_offset(&self) -> f64 {
        let speed = self.motion.velocity.abs();
        let direction = Direction::from_delta(self.motion.velocity);
        let projected = self.motion.position + direction.sign() * self.profile.braking_distance(speed);
        self.floors.next_offset(projected, direction)
    }

    fn clamp_to_shaft(&self, motion: Motion) -> Motion {
        let (low, high) = (self.floors.lowest_offset(), self.floors.highest_offset());
        if motion.position < low {
            Motion::at_rest(low)
        } else if motion.position > high {
            Motion::at_rest(high)
        } else {
            motion
        }
    }

    fn update_floor(&mut self) {
        match self.floors.floor_at(self.motion.position) {
            Ok(floor) if floor != self.floor => {
                self.floor = floor;
                debug!("[ID {}] Passing floor {}", self.elevator.id(), floor);
                self.elevator.publish(ElevatorEvent::FloorChanged {
                    elevator: self.elevator.id(),
                    floor,
                });
            }
            Ok(_) => (),
            Err(e) => warn!(
                "[ID {}] Keeping floor {}: {}",
                self.elevator.id(),
                self.floor,
                e
            ),
        }
    }

    fn settle_idle(&mut self) {
        if self.motion_state == MotionState::Moving {
            debug!("[ID {}] Idle at floor {}", self.elevator.id(), self.floor);
        }
        self.update_floor();
        self.motion_state = MotionState::Idle;
        self.direction = Direction::None;
        self.publish_status();
    }

    fn publish_status(&self) {
        self.elevator.set_status(ElevatorStatus {
            position: self.motion.position,
            velocity: self.motion.velocity,
            floor: self.floor,
            direction: self.direction,
            motion_state: self.motion_state,
            door_state: self
                .door
                .as_ref()
                .map(|door| door.phase())
                .unwrap_or(DoorState::Closed),
        });
    }

    /***************************************/
    /*             Test hooks              */
    /***************************************/
    #[cfg(test)]
    pub fn test_set_motion(&mut self, position: f64, velocity: f64) {
        self.motion = Motion { position, velocity };
        self.motion_state = MotionState::Moving;
        self.publish_status();
    }

    #[cfg(test)]
    pub fn test_door_phase(&self) -> Option<DoorState> {
        self.door.as_ref().map(|door| door.phase())
    }
}

impl Actor for ElevatorFSM {
    fn name(&self) -> String {
        format!("elevator_{}", self.elevator.id())
    }

    fn step(&mut self, _now: Duration) -> Step {
        if self.door.is_some() {
            self.step_door()
        } else {
            self.step_motion()
        }
    }
}
