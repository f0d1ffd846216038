//! Game version discovery
//!
//! Derives the raw and normalized version of the primary module once, at
//! locate time. The default lookup reads the version manifest embedded in
//! the module and takes the class-format hint from the entrypoint's compiled
//! object header.

use std::error::Error;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use semver::VersionReq;
use serde::Deserialize;

use crate::archive;
use crate::profile::RuntimePolicy;
use crate::util::class_entry_name;

const VERSION_MANIFEST_ENTRY: &str = "version.json";
const CLASS_HEADER_MAGIC: [u8; 4] = [0xCA, 0xFE, 0xBA, 0xBE];

/// Immutable after discovery.
#[derive(Clone, Debug, PartialEq)]
pub struct VersionInfo {
    pub raw: String,
    pub normalized: String,
    /// Numeric class-format version of the entrypoint, when readable.
    pub class_format: Option<u32>,
}

pub trait VersionLookup {
    fn lookup(
        &self,
        primary: &Path,
        candidate_entrypoints: &[String],
        override_version: Option<&str>,
    ) -> Result<VersionInfo, Box<dyn Error + Send + Sync>>;
}

#[derive(Debug, Deserialize)]
struct VersionManifest {
    id: Option<String>,
    name: Option<String>,
    /// Class-format hint some manifests carry; the object header wins.
    java_version: Option<u32>,
}

/// Default lookup against the primary module's embedded manifest.
pub struct EmbeddedVersionLookup;

impl VersionLookup for EmbeddedVersionLookup {
    fn lookup(
        &self,
        primary: &Path,
        candidate_entrypoints: &[String],
        override_version: Option<&str>,
    ) -> Result<VersionInfo, Box<dyn Error + Send + Sync>> {
        let manifest = read_manifest(primary)?;

        let raw = match override_version {
            Some(version) => version.to_string(),
            None => manifest
                .as_ref()
                .and_then(|m| m.id.clone().or_else(|| m.name.clone()))
                .unwrap_or_else(|| "unknown".to_string()),
        };

        let class_format = entrypoint_class_format(primary, candidate_entrypoints)?
            .or(manifest.and_then(|m| m.java_version));

        Ok(VersionInfo {
            normalized: normalize(&raw),
            class_format,
            raw,
        })
    }
}

fn read_manifest(primary: &Path) -> Result<Option<VersionManifest>, Box<dyn Error + Send + Sync>> {
    let Some(data) = archive::read_entry(primary, VERSION_MANIFEST_ENTRY)? else {
        return Ok(None);
    };

    Ok(Some(serde_json::from_slice(&data)?))
}

/// Class-format version from the first resolvable entrypoint's object header.
fn entrypoint_class_format(
    primary: &Path,
    candidate_entrypoints: &[String],
) -> Result<Option<u32>, Box<dyn Error + Send + Sync>> {
    for symbol in candidate_entrypoints {
        let Some(data) = archive::read_entry(primary, &class_entry_name(symbol))? else {
            continue;
        };

        if data.len() >= 8 && data[0..4] == CLASS_HEADER_MAGIC {
            return Ok(Some(u16::from_be_bytes([data[6], data[7]]) as u32));
        }
    }

    Ok(None)
}

static RE_RELEASE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)\.(\d+)(\.\d+)?$").expect("release pattern"));
static RE_PRE_RC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d+\.\d+(?:\.\d+)?)[- ]?(pre|rc)(\d+)$").expect("pre/rc pattern")
});
static RE_SNAPSHOT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{2}w\d{2}[a-z]$").expect("snapshot pattern"));

/// Normalize a raw version string into a semver-orderable form. Unknown
/// shapes pass through unchanged.
pub fn normalize(raw: &str) -> String {
    if let Some(caps) = RE_RELEASE.captures(raw) {
        return match caps.get(3) {
            Some(_) => raw.to_string(),
            None => format!("{raw}.0"),
        };
    }

    if let Some(caps) = RE_PRE_RC.captures(raw) {
        let base = &caps[1];
        let base = if base.matches('.').count() == 1 {
            format!("{base}.0")
        } else {
            base.to_string()
        };
        return format!("{base}-{}.{}", &caps[2], &caps[3]);
    }

    if RE_SNAPSHOT.is_match(raw) {
        return format!("0.0.0-snapshot.{raw}");
    }

    raw.to_string()
}

/// Minimum language-runtime requirement implied by a class-format version.
/// The offset is policy, supplied by the embedder.
pub fn runtime_requirement(
    class_format: u32,
    policy: &RuntimePolicy,
) -> Result<VersionReq, semver::Error> {
    VersionReq::parse(&format!(
        ">={}",
        class_format.saturating_sub(policy.class_format_offset)
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::fixtures::write_module;

    #[test]
    fn test_normalize_release_versions() {
        assert_eq!(normalize("1.19.2"), "1.19.2");
        assert_eq!(normalize("1.19"), "1.19.0");
    }

    #[test]
    fn test_normalize_prerelease_versions() {
        assert_eq!(normalize("1.19.3-pre2"), "1.19.3-pre.2");
        assert_eq!(normalize("1.19-rc1"), "1.19.0-rc.1");
    }

    #[test]
    fn test_normalize_snapshot_versions() {
        assert_eq!(normalize("23w31a"), "0.0.0-snapshot.23w31a");
        assert!(semver::Version::parse(&normalize("23w31a")).is_ok());
    }

    #[test]
    fn test_normalize_unknown_shapes_pass_through() {
        assert_eq!(normalize("infdev"), "infdev");
    }

    #[test]
    fn test_runtime_requirement_uses_policy_offset() {
        let req = runtime_requirement(61, &RuntimePolicy::default()).unwrap();
        assert_eq!(req.to_string(), ">=17");
        assert!(req.matches(&semver::Version::new(17, 0, 0)));
        assert!(!req.matches(&semver::Version::new(16, 0, 0)));
    }

    #[test]
    fn test_embedded_lookup_reads_manifest_and_class_format() {
        // major version 61 at bytes 6..8
        let class_bytes: &[u8] = &[0xCA, 0xFE, 0xBA, 0xBE, 0x00, 0x00, 0x00, 0x3D];
        let module = write_module(
            "versioned",
            &[
                ("version.json", br#"{"id": "1.19.2"}"#),
                ("net/minecraft/server/Main.class", class_bytes),
            ],
        );

        let info = EmbeddedVersionLookup
            .lookup(
                &module,
                &["net.minecraft.server.Main".to_string()],
                None,
            )
            .unwrap();

        assert_eq!(info.raw, "1.19.2");
        assert_eq!(info.normalized, "1.19.2");
        assert_eq!(info.class_format, Some(61));
    }

    #[test]
    fn test_override_takes_precedence_over_manifest() {
        let module = write_module("overridden", &[("version.json", br#"{"id": "1.19.2"}"#)]);

        let info = EmbeddedVersionLookup
            .lookup(&module, &[], Some("1.20.1"))
            .unwrap();

        assert_eq!(info.raw, "1.20.1");
    }

    #[test]
    fn test_manifest_class_format_hint_is_a_fallback() {
        let module = write_module(
            "hinted",
            &[("version.json", br#"{"id": "1.18", "java_version": 60}"#)],
        );

        let info = EmbeddedVersionLookup.lookup(&module, &[], None).unwrap();

        assert_eq!(info.raw, "1.18");
        assert_eq!(info.class_format, Some(60));
    }

    #[test]
    fn test_missing_manifest_is_unknown() {
        let module = write_module("bare", &[("whatever", b"x")]);

        let info = EmbeddedVersionLookup.lookup(&module, &[], None).unwrap();

        assert_eq!(info.raw, "unknown");
        assert_eq!(info.class_format, None);
    }
}
