//! Capture Agent
//!
//! Periodic webcam capture agent: grabs a still frame from an attached
//! camera device at a configurable interval, uploads it to S3 under a
//! key that makes the bucket's default listing newest-first, and keeps
//! the bucket trimmed with an expiration rule.
//!
//! ## Architecture
//!
//! ```text
//! Camera device            S3 Bucket
//! ┌──────────────┐        ┌────────────────────────────┐
//! │ fswebcam     │        │ images/                    │
//! │ (FrameSource)│───────▶│   <hex>__<timestamp>.png   │
//! └──────────────┘        │   ...                      │
//!        ▲                └────────────────────────────┘
//!        │                        ▲            ▲
//! ┌──────────────┐        ┌──────────────┐ ┌──────────────┐
//! │ Scheduler    │───────▶│ Frame        │ │ Lifecycle    │
//! │ (cycle loop, │        │ Uploader     │ │ Configurator │
//! │  10x backoff)│        └──────────────┘ │ (once)       │
//! └──────────────┘                         └──────────────┘
//! ```
//!
//! Cycles are strictly sequential: lifecycle (once) → capture → upload
//! → sleep. A failed cycle multiplies the next wait by ten; any success
//! resets it to the configured interval.

pub mod camera;
pub mod cli;
pub mod config;
pub mod keys;
pub mod lifecycle;
pub mod scheduler;
pub mod store;
pub mod uploader;

pub use camera::{CameraError, FrameSource, FswebcamSource};
pub use cli::Args;
pub use config::{ConfigError, CredentialSource, RunConfig};
pub use lifecycle::LifecycleConfigurator;
pub use scheduler::{CycleOutcome, Scheduler, SchedulerStats, BACKOFF_FACTOR};
pub use store::{ExpirationRule, ObjectStore, ObjectUpload, S3ObjectStore, StoreError};
pub use uploader::{FrameUploader, UploadError, FRAME_CONTENT_TYPE};
