//! Direct entrypoint scan
//!
//! The cheap path: the game ships directly loadable on the host search path,
//! so the primary module is whichever one provides an entrypoint class from
//! the fixed per-environment candidate list.

use std::path::PathBuf;

use crate::launcher::Launcher;
use crate::profile::GameProfile;
use crate::util::class_entry_name;

#[derive(Clone, Debug)]
pub struct DirectScan {
    pub primary: PathBuf,
    pub entrypoint: String,
    pub extension: Option<PathBuf>,
    pub logging_colocated: bool,
    pub has_legacy_loader: bool,
}

pub fn scan_direct(host: &dyn Launcher, profile: &GameProfile) -> Option<DirectScan> {
    let env_kind = host.env_kind();

    for symbol in profile.entrypoints(env_kind) {
        let Some(primary) = host.find_source(&class_entry_name(symbol)) else {
            continue;
        };

        let extension = host.find_source(&profile.extension_marker);
        let logging_colocated =
            host.find_source(&profile.logging_api_marker).as_deref() == Some(primary.as_path());
        let has_legacy_loader = host.find_source(&profile.legacy_loader_marker).is_some();

        return Some(DirectScan {
            primary,
            entrypoint: symbol.clone(),
            extension,
            logging_colocated,
            has_legacy_loader,
        });
    }

    None
}
