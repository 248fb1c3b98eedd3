//! Cycle scheduling.
//!
//! One cycle = ensure the expiration rule (once) → capture → upload.
//! Cycles run strictly one at a time; the only suspension points are
//! the capture subprocess and the network writes. A failed cycle backs
//! the next wait off by a fixed factor; any success resets it.

use crate::camera::FrameSource;
use crate::lifecycle::LifecycleConfigurator;
use crate::store::ObjectStore;
use crate::uploader::FrameUploader;
use metrics::counter;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{error, info, warn};

/// Multiplier applied to the base interval after a failed cycle.
/// Non-cumulative: one success returns the wait to the base interval.
pub const BACKOFF_FACTOR: u32 = 10;

/// Result of one capture/upload cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Frame landed in the bucket under this key.
    Uploaded { key: String },
    /// Capture or upload failed.
    Failed { reason: String },
}

impl CycleOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, CycleOutcome::Uploaded { .. })
    }
}

/// Wait before the next cycle, given the last outcome.
pub fn next_wait(base: Duration, outcome: &CycleOutcome) -> Duration {
    if outcome.is_success() {
        base
    } else {
        base * BACKOFF_FACTOR
    }
}

/// Counters for the lifetime of the process.
#[derive(Debug, Default, Clone)]
pub struct SchedulerStats {
    pub cycles: u64,
    pub uploads_ok: u64,
    pub failures: u64,
}

/// Drives the repeating capture/upload cycle.
pub struct Scheduler<C, S> {
    camera: C,
    uploader: FrameUploader<S>,
    lifecycle: LifecycleConfigurator<S>,
    interval: Duration,
    stats: SchedulerStats,
}

impl<C: FrameSource, S: ObjectStore> Scheduler<C, S> {
    pub fn new(
        camera: C,
        uploader: FrameUploader<S>,
        lifecycle: LifecycleConfigurator<S>,
        interval: Duration,
    ) -> Self {
        Self {
            camera,
            uploader,
            lifecycle,
            interval,
            stats: SchedulerStats::default(),
        }
    }

    pub fn stats(&self) -> &SchedulerStats {
        &self.stats
    }

    /// Run cycles until the future is dropped. The first cycle starts
    /// immediately; every later one waits out the computed interval.
    pub async fn run(&mut self) {
        loop {
            let outcome = self.run_cycle().await;
            let wait = next_wait(self.interval, &outcome);
            if !outcome.is_success() {
                warn!(wait_secs = wait.as_secs(), "cycle failed, backing off");
            }
            sleep(wait).await;
        }
    }

    /// Execute one full cycle.
    pub async fn run_cycle(&mut self) -> CycleOutcome {
        let started = Instant::now();
        self.stats.cycles += 1;
        counter!("cycles_total").increment(1);

        // A rejected expiration rule is not worth losing frames over;
        // the configurator will try again next cycle.
        if let Err(e) = self.lifecycle.ensure().await {
            warn!(error = %e, "could not configure bucket expiration, continuing");
        }

        let frame = match self.camera.grab().await {
            Ok(frame) => frame,
            Err(e) => {
                error!(error = %e, "frame capture failed");
                return self.failed(e.to_string());
            }
        };

        match self.uploader.upload(frame).await {
            Ok(key) => {
                info!(
                    key = %key,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "frame uploaded"
                );
                self.stats.uploads_ok += 1;
                CycleOutcome::Uploaded { key }
            }
            Err(e) => {
                error!(error = %e, "frame upload failed");
                self.failed(e.to_string())
            }
        }
    }

    fn failed(&mut self, reason: String) -> CycleOutcome {
        self.stats.failures += 1;
        counter!("cycle_failures_total").increment(1);
        CycleOutcome::Failed { reason }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::{CameraError, MockFrameSource};
    use crate::store::{MockObjectStore, StoreError};
    use crate::uploader::FRAME_CONTENT_TYPE;
    use bytes::Bytes;
    use std::sync::Arc;

    fn scheduler_with(
        camera: MockFrameSource,
        store: MockObjectStore,
    ) -> Scheduler<MockFrameSource, MockObjectStore> {
        let store = Arc::new(store);
        let uploader = FrameUploader::new(store.clone(), "images", 7);
        let lifecycle = LifecycleConfigurator::new(store, "images", 7);
        Scheduler::new(camera, uploader, lifecycle, Duration::from_secs(30))
    }

    #[test]
    fn test_next_wait_backs_off_on_failure() {
        let base = Duration::from_secs(30);
        let failed = CycleOutcome::Failed {
            reason: "device busy".to_string(),
        };
        assert_eq!(next_wait(base, &failed), Duration::from_secs(300));
    }

    #[test]
    fn test_next_wait_is_base_on_success() {
        let base = Duration::from_secs(30);
        let uploaded = CycleOutcome::Uploaded {
            key: "images/x.png".to_string(),
        };
        assert_eq!(next_wait(base, &uploaded), base);
    }

    #[tokio::test]
    async fn test_first_cycle_configures_uploads_and_counts() {
        let mut camera = MockFrameSource::new();
        camera
            .expect_grab()
            .times(2)
            .returning(|| Ok(Bytes::from_static(b"\x89PNG frame")));

        let mut store = MockObjectStore::new();
        // Exactly one lifecycle write across both cycles, carrying the
        // retention digits in the rule id.
        store
            .expect_put_expiration_rule()
            .withf(|rule| rule.id.contains('7') && rule.prefix == "images")
            .times(1)
            .returning(|_| Ok(()));
        store
            .expect_put_object()
            .withf(|upload| {
                upload.key.starts_with("images/")
                    && upload.key.ends_with(".png")
                    && upload.content_type == FRAME_CONTENT_TYPE
                    && upload.public_read
            })
            .times(2)
            .returning(|_| Ok(()));

        let mut scheduler = scheduler_with(camera, store);

        assert!(scheduler.run_cycle().await.is_success());
        assert!(scheduler.run_cycle().await.is_success());

        let stats = scheduler.stats();
        assert_eq!(stats.cycles, 2);
        assert_eq!(stats.uploads_ok, 2);
        assert_eq!(stats.failures, 0);
    }

    #[tokio::test]
    async fn test_capture_failure_ends_cycle_before_upload() {
        let mut camera = MockFrameSource::new();
        camera.expect_grab().times(1).returning(|| {
            Err(CameraError::CaptureFailed {
                status: "exit status: 1".to_string(),
                stderr: "no such device".to_string(),
            })
        });

        let mut store = MockObjectStore::new();
        store
            .expect_put_expiration_rule()
            .times(1)
            .returning(|_| Ok(()));
        store.expect_put_object().never();

        let mut scheduler = scheduler_with(camera, store);
        let outcome = scheduler.run_cycle().await;

        assert!(!outcome.is_success());
        assert_eq!(scheduler.stats().failures, 1);
    }

    #[tokio::test]
    async fn test_lifecycle_failure_does_not_block_the_pipeline() {
        let mut camera = MockFrameSource::new();
        camera
            .expect_grab()
            .times(1)
            .returning(|| Ok(Bytes::from_static(b"frame")));

        let mut store = MockObjectStore::new();
        store
            .expect_put_expiration_rule()
            .times(1)
            .returning(|_| Err(StoreError::Lifecycle("access denied".to_string())));
        store.expect_put_object().times(1).returning(|_| Ok(()));

        let mut scheduler = scheduler_with(camera, store);
        let outcome = scheduler.run_cycle().await;

        assert!(outcome.is_success());
    }

    #[tokio::test]
    async fn test_upload_failure_flags_the_cycle() {
        let mut camera = MockFrameSource::new();
        camera
            .expect_grab()
            .times(1)
            .returning(|| Ok(Bytes::from_static(b"frame")));

        let mut store = MockObjectStore::new();
        store
            .expect_put_expiration_rule()
            .times(1)
            .returning(|_| Ok(()));
        store
            .expect_put_object()
            .times(1)
            .returning(|_| Err(StoreError::Upload("connection reset".to_string())));

        let mut scheduler = scheduler_with(camera, store);
        let outcome = scheduler.run_cycle().await;

        assert!(!outcome.is_success());
        assert_eq!(scheduler.stats().failures, 1);
    }
}
