// file: src/utils/telemetry.rs
// description: per-stage timing for pipeline runs
// reference: operation timers reported through tracing

use crate::pipeline::Stage;
use std::time::{Duration, Instant};
use tracing::debug;

/// Wall time spent in one stage.
#[derive(Debug, Clone, Copy)]
pub struct StageTiming {
    pub stage: Stage,
    pub elapsed: Duration,
}

pub struct StageTimer {
    stage: Stage,
    start: Instant,
}

impl StageTimer {
    pub fn start(stage: Stage) -> Self {
        debug!("Starting stage: {}", stage);
        Self {
            stage,
            start: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    pub fn finish(self) -> StageTiming {
        let elapsed = self.elapsed();
        debug!(
            "Completed stage: {} in {:.3}s",
            self.stage,
            elapsed.as_secs_f64()
        );
        StageTiming {
            stage: self.stage,
            elapsed,
        }
    }
}

pub fn total_elapsed(timings: &[StageTiming]) -> Duration {
    timings.iter().map(|t| t.elapsed).sum()
}

/// The slowest stage, if any ran.
pub fn slowest(timings: &[StageTiming]) -> Option<&StageTiming> {
    timings.iter().max_by_key(|t| t.elapsed)
}
