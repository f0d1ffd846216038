//! Bundler capture
//!
//! Some server distributions only ship a self-extracting launcher stub that
//! assembles the real module list at runtime before starting the game. This
//! module runs that stub far enough to observe the assembled module list,
//! then aborts before any real application code takes over.
//!
//! ## Module structure
//! - `loader.rs`: sandboxed capture loader (restricted-namespace self-serve,
//!   then parent delegation), fresh per attempt
//! - `capture.rs`: one-shot capture slot, redirect-key scope guarding, timed
//!   rendezvous with the launcher thread

mod capture;
mod loader;

pub use capture::{CAPTURE_TIMEOUT, publish_captured_classpath, run_capture};
pub use loader::{CaptureLoader, ResourceLoader};

#[cfg(test)]
pub(crate) use capture::TEST_CAPTURE_LOCK;
