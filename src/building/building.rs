/***************************************/
/*        3rd party libraries          */
/***************************************/
use crossbeam_channel as cbc;
use log::info;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};

/***************************************/
/*           Local modules             */
/***************************************/
use super::floor::FloorTable;
use crate::config::Config;
use crate::dispatcher::{DispatchHandle, Dispatcher};
use crate::elevator::{Elevator, ElevatorFSM};
use crate::rider::{Rider, RiderContext, RiderEvent, RiderFSM};
use crate::runtime::{EventBus, Runtime, SimClock, Spawner};
use crate::shared::sync::lock;
use crate::shared::{BuildingSnapshot, ElevatorId, FloorIndex, SimError};

/// Floor every elevator starts on.
const START_FLOOR: FloorIndex = 1;

/**
 * The simulated building.
 *
 * Creating it spawns one control loop per elevator and the dispatcher on the
 * given runtime. Riders are added later with `create_rider`, from the main
 * thread or from a running actor.
 *
 * # Fields
 * - `floors`:          Floor table shared with everything else.
 * - `elevators`:       Shared elevator handles, in id order.
 * - `dispatch`:        Submission handle of the dispatcher.
 * - `rider_events`:    Bus carrying `RiderEvent::RequestCompleted`.
 * - `rider_ctx`:       Context cloned into each new rider.
 * - `riders`:          Riders created so far. Finished ones drop out.
 * - `next_rider`:      Id of the next rider.
 * - `spawner`:         Adds rider loops to the runtime.
 * - `clock`:           Simulated clock of the runtime.
 */
pub struct Building {
    floors: Arc<FloorTable>,
    elevators: Vec<Arc<Elevator>>,
    dispatch: DispatchHandle,
    rider_events: Arc<EventBus<RiderEvent>>,
    rider_ctx: RiderContext,
    riders: Mutex<Vec<Weak<Rider>>>,
    next_rider: AtomicU64,
    spawner: Spawner,
    clock: SimClock,
}

impl Building {
    pub fn new(config: &Config, runtime: &mut Runtime) -> Result<Arc<Building>, SimError> {
        let floors = Arc::new(FloorTable::new(&config.building));

        let elevators = (1..=config.building.n_elevators as ElevatorId)
            .map(|id| {
                Elevator::new(id, config.elevator.capacity, floors.clone(), START_FLOOR).map(Arc::new)
            })
            .collect::<Result<Vec<_>, _>>()?;
        for elevator in elevators.iter() {
            runtime.spawn(ElevatorFSM::new(elevator.clone(), &config.elevator, &config.door));
        }

        let (dispatcher, dispatch) = Dispatcher::new(elevators.clone(), &config.dispatch);
        runtime.spawn(dispatcher);

        let rider_events = Arc::new(EventBus::new());
        let rider_ctx = RiderContext {
            elevators: elevators.clone(),
            floors: floors.clone(),
            dispatch: dispatch.clone(),
            completions: rider_events.clone(),
            timings: config.rider.clone(),
            seed: config.simulation.seed,
        };

        info!(
            "Building: floors {}..={}, {} elevators of capacity {}",
            floors.lowest(),
            floors.highest(),
            elevators.len(),
            config.elevator.capacity
        );

        Ok(Arc::new(Building {
            floors,
            elevators,
            dispatch,
            rider_events,
            rider_ctx,
            riders: Mutex::new(Vec::new()),
            next_rider: AtomicU64::new(1),
            spawner: runtime.spawner(),
            clock: runtime.clock(),
        }))
    }

    /// Adds a rider on floor `at` who picks a random destination.
    pub fn create_rider(&self, at: FloorIndex) -> Result<Arc<Rider>, SimError> {
        self.spawn_rider(at, None)
    }

    pub fn create_rider_with_target(
        &self,
        at: FloorIndex,
        target: FloorIndex,
    ) -> Result<Arc<Rider>, SimError> {
        self.floors.get(target)?;
        if target == at {
            return Err(SimError::NoTargetFloor { floor: at });
        }
        self.spawn_rider(at, Some(target))
    }

    fn spawn_rider(&self, at: FloorIndex, target: Option<FloorIndex>) -> Result<Arc<Rider>, SimError> {
        self.floors.get(at)?;
        let id = self.next_rider.fetch_add(1, Ordering::SeqCst);
        let rider = Arc::new(Rider::new(id, at));

        {
            let mut riders = lock(&self.riders);
            riders.retain(|rider| rider.strong_count() > 0);
            riders.push(Arc::downgrade(&rider));
        }
        self.spawner
            .spawn(RiderFSM::new(rider.clone(), self.rider_ctx.clone(), target));
        info!("Building: rider {} appeared on floor {}", id, at);
        Ok(rider)
    }

    pub fn floors(&self) -> &Arc<FloorTable> {
        &self.floors
    }

    pub fn elevators(&self) -> &[Arc<Elevator>] {
        &self.elevators
    }

    pub fn elevator(&self, id: ElevatorId) -> Result<&Arc<Elevator>, SimError> {
        self.elevators
            .iter()
            .find(|e| e.id() == id)
            .ok_or(SimError::UnknownElevator(id))
    }

    pub fn subscribe_riders(&self) -> cbc::Receiver<RiderEvent> {
        self.rider_events.subscribe()
    }

    /// Riders that are still alive.
    pub fn riders(&self) -> Vec<Arc<Rider>> {
        lock(&self.riders).iter().filter_map(Weak::upgrade).collect()
    }

    /// Asks every elevator to park at its nearest floor.
    pub fn stop_all(&self) {
        for elevator in self.elevators.iter() {
            elevator.request_stop();
        }
    }

    pub fn clock(&self) -> &SimClock {
        &self.clock
    }

    pub fn snapshot(&self) -> BuildingSnapshot {
        BuildingSnapshot {
            time_ms: self.clock.now_ms(),
            elevators: self.elevators.iter().map(|e| e.snapshot()).collect(),
            riders: self.riders().iter().map(|r| r.snapshot()).collect(),
            pending_requests: self.dispatch.pending(),
        }
    }
}
