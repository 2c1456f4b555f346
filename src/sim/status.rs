/***************************************/
/*        3rd party libraries          */
/***************************************/
use log::{info, warn};
use std::sync::Arc;
use std::time::Duration;

/***************************************/
/*           Local modules             */
/***************************************/
use crate::building::Building;
use crate::runtime::{Actor, Step};

/// Logs a JSON snapshot of the building at a fixed interval.
pub struct StatusReporter {
    building: Arc<Building>,
    interval: Duration,
}

impl StatusReporter {
    pub fn new(building: Arc<Building>, interval: Duration) -> StatusReporter {
        StatusReporter { building, interval }
    }

    pub fn render(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.building.snapshot())
    }
}

impl Actor for StatusReporter {
    fn name(&self) -> String {
        "status_reporter".to_string()
    }

    fn step(&mut self, _now: Duration) -> Step {
        match self.render() {
            Ok(line) => info!("Status: {}", line),
            Err(e) => warn!("Status: snapshot not serializable: {}", e),
        }
        Step::Sleep(self.interval)
    }
}
