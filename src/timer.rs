use std::time::{Duration, Instant};
use tracing::info;

/// Logs how long a phase took, at named checkpoints and when dropped.
pub struct ScopedTimer {
    name: String,
    start: Instant,
    stop: Vec<(String, Instant)>,
}

impl ScopedTimer {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            start: Instant::now(),
            stop: Vec::new(),
        }
    }

    pub fn checkpoint(&mut self, name: &str) {
        self.stop.push((name.to_string(), Instant::now()));
    }

    pub fn elapsed_since_checkpoint(&mut self) -> Option<Duration> {
        let (name, at) = self.stop.pop()?;
        let elapsed = at.elapsed();
        info!(phase = %name, msec = elapsed.as_millis() as u64, "checkpoint");
        Some(elapsed)
    }

    pub fn elapsed(&self) -> Duration {
        let elapsed = self.start.elapsed();
        info!(phase = %self.name, msec = elapsed.as_millis() as u64, "elapsed");
        elapsed
    }
}

impl std::ops::Drop for ScopedTimer {
    fn drop(&mut self) {
        self.elapsed();
    }
}
