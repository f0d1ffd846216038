//! Role classification over candidate module lists
//!
//! Used on the bundler capture path: the captured list is walked once, in
//! the order the host environment would have loaded it, and every module is
//! assigned at most one functional role.

use std::path::{Path, PathBuf};

use crate::archive;
use crate::archive::ArchiveError;
use crate::profile::GameProfile;
use crate::util::class_entry_name;

use super::types::LocateError;

/// Partial locate result: roles assigned, nothing else decided yet.
#[derive(Clone, Debug, PartialEq)]
pub struct ClassifiedModules {
    pub primary: PathBuf,
    pub entrypoint: String,
    pub extension: Option<PathBuf>,
    pub logging_api: Option<PathBuf>,
    pub logging_impls: Vec<PathBuf>,
    pub logging_colocated: bool,
    pub miscellaneous: Vec<PathBuf>,
}

enum Assigned {
    Primary {
        entrypoint: String,
        api_colocated: bool,
        impl_colocated: bool,
    },
    Extension,
    LoggingApi,
    LoggingImpl,
    Miscellaneous,
}

/// Probe one candidate in priority order, testing only still-unassigned roles.
fn classify_candidate(
    path: &Path,
    profile: &GameProfile,
    need_primary: bool,
    need_extension: bool,
    need_api: bool,
    need_impl: bool,
) -> Result<Assigned, ArchiveError> {
    if need_primary {
        let entry_names: Vec<String> = profile
            .server_entrypoints
            .iter()
            .map(|symbol| class_entry_name(symbol))
            .collect();

        if let Some(entry) = archive::probe_any(path, &entry_names)? {
            let idx = entry_names.iter().position(|e| e == entry).unwrap_or(0);
            // Logging shaded into the primary module means "do nothing extra":
            // record the fact instead of assigning a separate module.
            let api_here = need_api && archive::probe(path, &profile.logging_api_marker)?;
            let impl_here =
                need_impl && archive::probe_any(path, &profile.logging_impl_markers)?.is_some();

            return Ok(Assigned::Primary {
                entrypoint: profile.server_entrypoints[idx].clone(),
                api_colocated: api_here,
                impl_colocated: impl_here,
            });
        }
    }

    if need_extension && archive::probe(path, &profile.extension_marker)? {
        return Ok(Assigned::Extension);
    }

    if need_api && archive::probe(path, &profile.logging_api_marker)? {
        return Ok(Assigned::LoggingApi);
    }

    if need_impl && archive::probe_any(path, &profile.logging_impl_markers)?.is_some() {
        return Ok(Assigned::LoggingImpl);
    }

    Ok(Assigned::Miscellaneous)
}

/// Assign every candidate to at most one functional role.
///
/// Single pass in input order. Once the primary, extension, logging-API and
/// logging-implementation roles are all held, remaining candidates go
/// straight to miscellaneous without opening them; that never changes the
/// classification of already-seen candidates. Unreadable candidates are
/// logged and skipped.
pub fn classify(
    candidates: &[PathBuf],
    profile: &GameProfile,
) -> Result<ClassifiedModules, LocateError> {
    let mut primary: Option<(PathBuf, String)> = None;
    let mut extension: Option<PathBuf> = None;
    let mut logging_api: Option<PathBuf> = None;
    let mut logging_impls: Vec<PathBuf> = Vec::new();
    let mut logging_colocated = false;
    let mut miscellaneous: Vec<PathBuf> = Vec::new();
    let mut has_api = false;
    let mut has_impl = false;

    for path in candidates {
        if primary.is_some() && extension.is_some() && has_api && has_impl {
            miscellaneous.push(path.clone());
            continue;
        }

        let assigned = match classify_candidate(
            path,
            profile,
            primary.is_none(),
            extension.is_none(),
            !has_api,
            !has_impl,
        ) {
            Ok(assigned) => assigned,
            Err(e) => {
                eprintln!("[loadstone] skipping unreadable candidate: {e}");
                continue;
            }
        };

        match assigned {
            Assigned::Primary {
                entrypoint,
                api_colocated,
                impl_colocated,
            } => {
                primary = Some((path.clone(), entrypoint));
                logging_colocated |= api_colocated || impl_colocated;
                has_api |= api_colocated;
                has_impl |= impl_colocated;
            }
            Assigned::Extension => extension = Some(path.clone()),
            Assigned::LoggingApi => {
                logging_api = Some(path.clone());
                has_api = true;
            }
            Assigned::LoggingImpl => {
                logging_impls.push(path.clone());
                has_impl = true;
            }
            Assigned::Miscellaneous => miscellaneous.push(path.clone()),
        }
    }

    let Some((primary, entrypoint)) = primary else {
        return Err(LocateError::NoEntrypointFound);
    };

    Ok(ClassifiedModules {
        primary,
        entrypoint,
        extension,
        logging_api,
        logging_impls,
        logging_colocated,
        miscellaneous,
    })
}

/// The bundler path must yield logging modules unless they are co-located
/// with the primary module.
pub fn ensure_logging_captured(modules: &ClassifiedModules) -> Result<(), LocateError> {
    if modules.logging_colocated {
        return Ok(());
    }

    if modules.logging_api.is_none() {
        return Err(LocateError::MissingLoggingApi);
    }

    if modules.logging_impls.is_empty() {
        return Err(LocateError::MissingLoggingImpl);
    }

    Ok(())
}
