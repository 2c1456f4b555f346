/***************************************/
/*        3rd party libraries          */
/***************************************/
use crossbeam_channel as cbc;
use log::{info, warn};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/***************************************/
/*           Local modules             */
/***************************************/
use crate::building::Building;
use crate::config::SimulationConfig;
use crate::rider::RiderEvent;
use crate::runtime::{Actor, Step};
use crate::shared::sync::lock;
use crate::shared::{FloorIndex, RiderId};

/// Running totals over every finished journey.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JourneyStats {
    pub spawned: u64,
    pub completed: u64,
    pub total_wait: Duration,
    pub total_journey: Duration,
}

impl JourneyStats {
    pub fn record(&mut self, wait: Duration, journey: Duration) {
        self.completed += 1;
        self.total_wait += wait;
        self.total_journey += journey;
    }

    pub fn mean_wait(&self) -> Option<Duration> {
        u32::try_from(self.completed)
            .ok()
            .filter(|n| *n > 0)
            .map(|n| self.total_wait / n)
    }

    pub fn mean_journey(&self) -> Option<Duration> {
        u32::try_from(self.completed)
            .ok()
            .filter(|n| *n > 0)
            .map(|n| self.total_journey / n)
    }
}

/**
 * Populates the building with riders.
 *
 * A new rider appears every `[min_interval, density]` ms of simulated time.
 * With probability `ground_floor_ratio` it appears on the ground floor,
 * otherwise on any floor. Completed journeys are collected into `stats`.
 *
 * # Fields
 * - `building`:            Where riders are created.
 * - `rng`:                 Seeded from the simulation seed.
 * - `min_interval`:        Shortest time between two riders, in ms.
 * - `density`:             Longest time between two riders, in ms.
 * - `ground_floor_ratio`:  Share of riders starting on floor 1.
 * - `completions_rx`:      `RiderEvent`s of the building.
 * - `active`:              Riders whose journey is not finished.
 * - `stats`:               Shared journey statistics.
 */
pub struct LoadGenerator {
    building: Arc<Building>,
    rng: StdRng,
    min_interval: u64,
    density: u64,
    ground_floor_ratio: f64,
    completions_rx: cbc::Receiver<RiderEvent>,
    active: HashSet<RiderId>,
    stats: Arc<Mutex<JourneyStats>>,
}

impl LoadGenerator {
    pub fn new(building: Arc<Building>, config: &SimulationConfig) -> LoadGenerator {
        LoadGenerator {
            completions_rx: building.subscribe_riders(),
            building,
            rng: StdRng::seed_from_u64(config.seed),
            min_interval: config.min_interval_ms,
            density: config.density_ms.max(config.min_interval_ms),
            ground_floor_ratio: config.ground_floor_ratio.clamp(0.0, 1.0),
            active: HashSet::new(),
            stats: Arc::new(Mutex::new(JourneyStats::default())),
        }
    }

    pub fn stats(&self) -> Arc<Mutex<JourneyStats>> {
        self.stats.clone()
    }

    fn collect_completions(&mut self) {
        while let Ok(event) = self.completions_rx.try_recv() {
            let RiderEvent::RequestCompleted {
                rider, wait, total, ..
            } = event;
            self.active.remove(&rider);
            lock(&self.stats).record(wait, total);
        }
    }

    fn pick_floor(&mut self) -> FloorIndex {
        if self.rng.gen_bool(self.ground_floor_ratio) {
            return 1;
        }
        let floors: Vec<FloorIndex> = self.building.floors().indices().collect();
        floors.choose(&mut self.rng).copied().unwrap_or(1)
    }
}

impl Actor for LoadGenerator {
    fn name(&self) -> String {
        "load_generator".to_string()
    }

    fn step(&mut self, _now: Duration) -> Step {
        self.collect_completions();

        let floor = self.pick_floor();
        match self.building.create_rider(floor) {
            Ok(rider) => {
                self.active.insert(rider.id());
                lock(&self.stats).spawned += 1;
            }
            Err(e) => warn!("Load generator: could not add rider on floor {}: {}", floor, e),
        }

        let interval = self.rng.gen_range(self.min_interval..=self.density);
        info!(
            "Load generator: {} riders active, next in {} ms",
            self.active.len(),
            interval
        );
        Step::Sleep(Duration::from_millis(interval))
    }
}
