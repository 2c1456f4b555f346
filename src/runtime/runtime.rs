/***************************************/
/*        3rd party libraries          */
/***************************************/
use crossbeam_channel as cbc;
use log::{debug, error, trace};
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};
use std::panic::{self, AssertUnwindSafe};
use std::thread::{self, Builder, JoinHandle};
use std::time::Duration;

/***************************************/
/*           Local modules             */
/***************************************/
use super::clock::SimClock;

/// Delay before a task whose step panicked is stepped again.
const PANIC_RETRY: Duration = Duration::from_millis(100);

/***************************************/
/*              Actors                 */
/***************************************/
/// What a control loop wants after one iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Suspend for the given simulated duration.
    Sleep(Duration),
    /// The loop has finished and can be dropped.
    Done,
}

/// One iteration of a perpetually running control loop.
///
/// `step` must not block: every wait is expressed by returning `Step::Sleep`.
pub trait Actor: Send {
    fn name(&self) -> String;
    fn step(&mut self, now: Duration) -> Step;
}

/// Handle for adding actors to a running runtime from inside another actor.
#[derive(Clone)]
pub struct Spawner {
    spawn_tx: cbc::Sender<Box<dyn Actor>>,
}

impl Spawner {
    pub fn spawn<A: Actor + 'static>(&self, actor: A) {
        let name = actor.name();
        if self.spawn_tx.send(Box::new(actor)).is_err() {
            error!("Runtime gone, could not spawn {}", name);
        }
    }
}

/***************************************/
/*            Worker pool              */
/***************************************/
struct Job {
    key: u64,
    actor: Box<dyn Actor>,
    now: Duration,
}

struct Outcome {
    key: u64,
    actor: Box<dyn Actor>,
    step: Step,
}

/**
 * Fixed set of OS threads stepping actors.
 *
 * # Fields
 * - `job_tx`:          Sends actors that are due to the workers.
 * - `outcome_rx`:      Receives the stepped actors and their next request.
 * - `terminate_tx`:    Dropped to make every worker leave its loop.
 * - `workers`:         Join handles of the worker threads.
 */
struct WorkerPool {
    job_tx: cbc::Sender<Job>,
    outcome_rx: cbc::Receiver<Outcome>,
    terminate_tx: Option<cbc::Sender<()>>,
    workers: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    fn new(n_workers: usize) -> WorkerPool {
        let (job_tx, job_rx) = cbc::unbounded::<Job>();
        let (outcome_tx, outcome_rx) = cbc::unbounded::<Outcome>();
        let (terminate_tx, terminate_rx) = cbc::unbounded::<()>();

        let workers = (0..n_workers.max(1))
            .filter_map(|n| {
                let job_rx = job_rx.clone();
                let outcome_tx = outcome_tx.clone();
                let terminate_rx = terminate_rx.clone();
                Builder::new()
                    .name(format!("sim_worker_{}", n))
                    .spawn(move || worker_loop(job_rx, outcome_tx, terminate_rx))
                    .map_err(|e| error!("Failed to start worker {}: {}", n, e))
                    .ok()
            })
            .collect();

        WorkerPool {
            job_tx,
            outcome_rx,
            terminate_tx: Some(terminate_tx),
            workers,
        }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        drop(self.terminate_tx.take());
        for worker in self.workers.drain(..) {
            let _ = worker.join();
        }
    }
}

fn worker_loop(
    job_rx: cbc::Receiver<Job>,
    outcome_tx: cbc::Sender<Outcome>,
    terminate_rx: cbc::Receiver<()>,
) {
    loop {
        cbc::select! {
            recv(job_rx) -> job => {
                let Ok(mut job) = job else { break };
                let step = match panic::catch_unwind(AssertUnwindSafe(|| job.actor.step(job.now))) {
                    Ok(step) => step,
                    Err(_) => {
                        error!("{} panicked, rescheduling", job.actor.name());
                        Step::Sleep(PANIC_RETRY)
                    }
                };
                let outcome = Outcome { key: job.key, actor: job.actor, step };
                if outcome_tx.send(outcome).is_err() {
                    break;
                }
            }
            recv(terminate_rx) -> _ => break,
        }
    }
}

/***************************************/
/*              Runtime                */
/***************************************/
/**
 * Discrete-event executor multiplexing every control loop onto a worker pool.
 *
 * The clock jumps from one wake-up time to the next. All actors due at the
 * same instant are stepped in parallel, and the runtime waits for the whole
 * batch before moving the clock on. With a non-zero `speedup` the runtime
 * also sleeps in real time, `speedup` simulated milliseconds per real one.
 */
pub struct Runtime {
    clock: SimClock,
    speedup: f64,
    wakeups: BinaryHeap<Reverse<(u64, u64)>>,
    actors: HashMap<u64, Box<dyn Actor>>,
    next_key: u64,
    spawn_tx: cbc::Sender<Box<dyn Actor>>,
    spawn_rx: cbc::Receiver<Box<dyn Actor>>,
    pool: WorkerPool,
}

impl Runtime {
    pub fn new(clock: SimClock, n_workers: usize, speedup: f64) -> Runtime {
        let (spawn_tx, spawn_rx) = cbc::unbounded::<Box<dyn Actor>>();
        Runtime {
            clock,
            speedup,
            wakeups: BinaryHeap::new(),
            actors: HashMap::new(),
            next_key: 0,
            spawn_tx,
            spawn_rx,
            pool: WorkerPool::new(n_workers),
        }
    }

    pub fn clock(&self) -> SimClock {
        self.clock.clone()
    }

    pub fn now(&self) -> Duration {
        self.clock.now()
    }

    pub fn spawner(&self) -> Spawner {
        Spawner {
            spawn_tx: self.spawn_tx.clone(),
        }
    }

    pub fn spawn<A: Actor + 'static>(&mut self, actor: A) {
        self.insert(Box::new(actor));
    }

    /// Number of live actors.
    pub fn actor_count(&self) -> usize {
        self.actors.len() + self.spawn_rx.len()
    }

    pub fn run_for(&mut self, duration: Duration) {
        self.run_until(|| false, duration);
    }

    /// Runs until `done` holds or `limit` of simulated time has passed.
    /// Returns whether `done` was reached.
    pub fn run_until<F: FnMut() -> bool>(&mut self, mut done: F, limit: Duration) -> bool {
        let deadline = self.clock.now_ms() + limit.as_millis() as u64;
        loop {
            if done() {
                return true;
            }
            self.absorb_spawned();

            let next = match self.wakeups.peek() {
                Some(Reverse((wake, _))) if *wake <= deadline => *wake,
                _ => {
                    self.pace_to(deadline);
                    self.clock.advance_to(deadline);
                    return done();
                }
            };
            self.run_batch(next);
        }
    }

    fn insert(&mut self, actor: Box<dyn Actor>) {
        let key = self.next_key;
        self.next_key += 1;
        debug!("Runtime: spawned {}", actor.name());
        self.actors.insert(key, actor);
        self.wakeups.push(Reverse((self.clock.now_ms(), key)));
    }

    fn absorb_spawned(&mut self) {
        while let Ok(actor) = self.spawn_rx.try_recv() {
            self.insert(actor);
        }
    }

    fn pace_to(&self, wake: u64) {
        let now = self.clock.now_ms();
        if self.speedup > 0.0 && wake > now {
            thread::sleep(Duration::from_millis(wake - now).div_f64(self.speedup));
        }
    }

    fn run_batch(&mut self, wake: u64) {
        self.pace_to(wake);
        self.clock.advance_to(wake);
        let now = Duration::from_millis(wake);

        let mut dispatched = 0;
        while let Some(Reverse((at, key))) = self.wakeups.peek().copied() {
            if at != wake {
                break;
            }
            self.wakeups.pop();
            if let Some(actor) = self.actors.remove(&key) {
                if self.pool.job_tx.send(Job { key, actor, now }).is_ok() {
                    dispatched += 1;
                }
            }
        }
        trace!("Runtime: t={}ms stepping {} actors", wake, dispatched);

        for _ in 0..dispatched {
            let Ok(outcome) = self.pool.outcome_rx.recv() else {
                error!("Runtime: worker pool disconnected");
                return;
            };
            match outcome.step {
                Step::Sleep(delay) => {
                    let delay = (delay.as_millis() as u64).max(1);
                    self.actors.insert(outcome.key, outcome.actor);
                    self.wakeups.push(Reverse((wake + delay, outcome.key)));
                }
                Step::Done => {
                    debug!("Runtime: {} finished", outcome.actor.name());
                }
            }
        }
    }
}
