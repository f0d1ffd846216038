//! Locate module - game discovery, classification and lifecycle
//!
//! This module provides:
//! - The ordered launch-argument map and its per-environment processing
//! - Module classification into functional roles
//! - Direct entrypoint scanning over the host search path
//! - The locator state machine driving unlocated -> located -> initialized
//!   -> launched
//!
//! ## Module structure
//! - `types.rs`: located-game aggregate, locator states, error taxonomy
//! - `arguments.rs`: argument map (pure)
//! - `classify.rs`: role classification over candidate module lists
//! - `scan.rs`: direct entrypoint scan
//! - `machine.rs`: `GameLocator` orchestration and collaborator seams

mod arguments;
mod classify;
mod machine;
mod scan;
mod types;

pub use arguments::{Arguments, launch_directory, process_argument_map};
pub use classify::{ClassifiedModules, classify, ensure_logging_captured};
pub use machine::{ENV_GAME_VERSION, ENV_SKIP, GameLocator, PassthroughTransformer, Transformer};
pub use scan::{DirectScan, scan_direct};
pub use types::{LocateError, LocatedGame, LocatorState};
