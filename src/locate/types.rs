//! Locator types and error taxonomy

use std::error::Error;
use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::archive::ArchiveError;
use crate::profile::EnvKind;

/// Result of a successful locate pass. Produced exactly once per process;
/// only the orchestrating locator writes it (the transformation pass swaps
/// `primary`/`extension` for their transformed variants during
/// initialization, keeping the originals in `input_*`).
#[derive(Clone, Debug)]
pub struct LocatedGame {
    pub primary: PathBuf,
    pub extension: Option<PathBuf>,
    /// None means the logging API is co-located with the primary module.
    pub logging_api: Option<PathBuf>,
    /// Empty when co-located with the primary module.
    pub logging_impls: Vec<PathBuf>,
    /// Remaining modules, in discovery order. Order matters for shadowing:
    /// first registered wins.
    pub miscellaneous: Vec<PathBuf>,
    pub entrypoint: String,
    pub env_kind: EnvKind,
    pub logging_colocated: bool,
    pub has_legacy_loader: bool,
    /// Pre-transformation primary module, for consumers that remap against
    /// the original distribution.
    pub input_primary: PathBuf,
    pub input_extension: Option<PathBuf>,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum LocatorState {
    Unlocated,
    Located,
    Initialized,
    Launched,
    Crashed,
    Completed,
}

impl fmt::Display for LocatorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LocatorState::Unlocated => "unlocated",
            LocatorState::Located => "located",
            LocatorState::Initialized => "initialized",
            LocatorState::Launched => "launched",
            LocatorState::Crashed => "crashed",
            LocatorState::Completed => "completed",
        };
        write!(f, "{name}")
    }
}

#[derive(Debug, Error)]
pub enum LocateError {
    /// Archive unreadable while probing the single primary candidate. On
    /// multi-module lists unreadable candidates are skipped instead.
    #[error(transparent)]
    Archive(#[from] ArchiveError),

    #[error("no game entrypoint found on the module path")]
    NoEntrypointFound,

    /// The bundler was present but running it failed. Always fatal; a missing
    /// bundler is not an error (discovery falls through).
    #[error("error invoking the server bundler: {0}")]
    BundlerInvocation(#[source] Box<dyn Error + Send + Sync>),

    #[error("bundler yielded no module containing the logging API")]
    MissingLoggingApi,

    #[error("bundler yielded no module containing a logging implementation")]
    MissingLoggingImpl,

    #[error("game version lookup failed: {0}")]
    Version(#[source] Box<dyn Error + Send + Sync>),

    /// Partial states are not resumable; a fresh process is required to retry.
    #[error("locator is in state {actual}, expected {expected}")]
    WrongState {
        expected: LocatorState,
        actual: LocatorState,
    },
}
