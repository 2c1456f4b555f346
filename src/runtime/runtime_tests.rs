/*
 * Unit tests for the task runtime
 *
 * The unit tests follows the Arrange, Act, Assert pattern.
 *
 * Tests:
 *  - test_runtime_steps_actor_at_requested_interval
 *  - test_runtime_drops_finished_actors
 *  - test_runtime_spawner_adds_actor_while_running
 *  - test_runtime_run_until_stops_on_condition
 *  - test_runtime_survives_panicking_actor
 */

/***************************************/
/*             Unit tests              */
/***************************************/
#[cfg(test)]
mod runtime_tests {
    use crate::runtime::{Actor, Runtime, SimClock, Spawner, Step};
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    struct Ticker {
        interval: Duration,
        remaining: u32,
        seen: Arc<Mutex<Vec<u64>>>,
    }

    impl Actor for Ticker {
        fn name(&self) -> String {
            "ticker".to_string()
        }

        fn step(&mut self, now: Duration) -> Step {
            self.seen.lock().unwrap().push(now.as_millis() as u64);
            if self.remaining == 0 {
                return Step::Done;
            }
            self.remaining -= 1;
            Step::Sleep(self.interval)
        }
    }

    struct Parent {
        spawner: Spawner,
        child_seen: Arc<Mutex<Vec<u64>>>,
        spawned: bool,
    }

    impl Actor for Parent {
        fn name(&self) -> String {
            "parent".to_string()
        }

        fn step(&mut self, _now: Duration) -> Step {
            if self.spawned {
                return Step::Done;
            }
            self.spawned = true;
            self.spawner.spawn(Ticker {
                interval: Duration::from_millis(10),
                remaining: 1,
                seen: self.child_seen.clone(),
            });
            Step::Sleep(Duration::from_millis(100))
        }
    }

    struct Faulty {
        calls: Arc<AtomicU64>,
    }

    impl Actor for Faulty {
        fn name(&self) -> String {
            "faulty".to_string()
        }

        fn step(&mut self, _now: Duration) -> Step {
            let calls = self.calls.fetch_add(1, Ordering::SeqCst);
            if calls == 0 {
                panic!("first step fails");
            }
            Step::Done
        }
    }

    fn setup_runtime() -> Runtime {
        Runtime::new(SimClock::new(), 2, 0.0)
    }

    #[test]
    fn test_runtime_steps_actor_at_requested_interval() {
        // Arrange
        let mut runtime = setup_runtime();
        let seen = Arc::new(Mutex::new(Vec::new()));
        runtime.spawn(Ticker {
            interval: Duration::from_millis(50),
            remaining: 3,
            seen: seen.clone(),
        });

        // Act
        runtime.run_for(Duration::from_millis(500));

        // Assert
        assert_eq!(*seen.lock().unwrap(), vec![0, 50, 100, 150]);
        assert_eq!(runtime.now(), Duration::from_millis(500));
    }

    #[test]
    fn test_runtime_drops_finished_actors() {
        // Arrange
        let mut runtime = setup_runtime();
        let seen = Arc::new(Mutex::new(Vec::new()));
        runtime.spawn(Ticker {
            interval: Duration::from_millis(5),
            remaining: 0,
            seen: seen.clone(),
        });

        // Act
        runtime.run_for(Duration::from_millis(20));

        // Assert
        assert_eq!(runtime.actor_count(), 0);
        assert_eq!(seen.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_runtime_spawner_adds_actor_while_running() {
        // Arrange
        let mut runtime = setup_runtime();
        let child_seen = Arc::new(Mutex::new(Vec::new()));
        let spawner = runtime.spawner();
        runtime.spawn(Parent {
            spawner,
            child_seen: child_seen.clone(),
            spawned: false,
        });

        // Act
        runtime.run_for(Duration::from_millis(300));

        // Assert
        let child_seen = child_seen.lock().unwrap();
        assert_eq!(child_seen.len(), 2);
        assert_eq!(child_seen[1] - child_seen[0], 10);
    }

    #[test]
    fn test_runtime_run_until_stops_on_condition() {
        // Arrange
        let mut runtime = setup_runtime();
        let seen = Arc::new(Mutex::new(Vec::new()));
        runtime.spawn(Ticker {
            interval: Duration::from_millis(10),
            remaining: 1000,
            seen: seen.clone(),
        });

        // Act
        let probe = seen.clone();
        let reached = runtime.run_until(|| probe.lock().unwrap().len() >= 5, Duration::from_secs(60));

        // Assert
        assert!(reached);
        assert_eq!(runtime.now(), Duration::from_millis(40));
    }

    #[test]
    fn test_runtime_survives_panicking_actor() {
        // Arrange
        let mut runtime = setup_runtime();
        let calls = Arc::new(AtomicU64::new(0));
        runtime.spawn(Faulty { calls: calls.clone() });

        // Act
        runtime.run_for(Duration::from_secs(1));

        // Assert
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(runtime.actor_count(), 0);
    }
}
