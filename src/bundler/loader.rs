//! Sandboxed capture loader

use crate::launcher::Launcher;
use crate::util::class_entry_name;

/// Minimal loading capability: bytes by symbolic name, or nothing.
pub trait ResourceLoader {
    fn load_bytes(&self, symbol: &str) -> Option<Vec<u8>>;
}

/// Loader used while observing a bundler run.
///
/// Symbols under the restricted namespace prefixes are served directly from
/// the running host's resources instead of delegating upward first; that is
/// what lets observation work before the final classpath exists. Everything
/// else falls through to the parent loader. One instance per capture
/// attempt, discarded afterwards.
pub struct CaptureLoader<'a> {
    restricted_prefixes: &'a [String],
    host: &'a dyn Launcher,
    parent: &'a dyn ResourceLoader,
}

impl<'a> CaptureLoader<'a> {
    pub fn new(
        restricted_prefixes: &'a [String],
        host: &'a dyn Launcher,
        parent: &'a dyn ResourceLoader,
    ) -> Self {
        CaptureLoader {
            restricted_prefixes,
            host,
            parent,
        }
    }
}

impl ResourceLoader for CaptureLoader<'_> {
    fn load_bytes(&self, symbol: &str) -> Option<Vec<u8>> {
        if self
            .restricted_prefixes
            .iter()
            .any(|prefix| symbol.starts_with(prefix.as_str()))
            && let Some(data) = self.host.read_resource(&class_entry_name(symbol))
        {
            return Some(data);
        }

        self.parent.load_bytes(symbol)
    }
}
