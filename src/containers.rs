//! Mod container bookkeeping
//!
//! Secondary structure tracking which discovered mod came from where and who
//! nests inside whom. Containers are built from candidates once discovery
//! settles and are looked up by id afterwards.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use semver::VersionReq;

use crate::archive;
use crate::archive::ArchiveError;

#[derive(Clone, Debug)]
pub struct ModMetadata {
    pub id: String,
    pub version: String,
    pub name: String,
    /// Minimum language-runtime requirement, when derivable.
    pub runtime_requirement: Option<VersionReq>,
}

#[derive(Clone, Debug)]
pub struct ModCandidate {
    pub metadata: ModMetadata,
    pub path: PathBuf,
    /// Ids of mods this candidate was found nested in, primary parent first.
    pub parent_ids: Vec<String>,
    pub nested: Vec<ModCandidate>,
}

pub struct ModContainer {
    metadata: ModMetadata,
    origin_path: PathBuf,
    parent_id: Option<String>,
    child_ids: Vec<String>,
    root: Option<PathBuf>,
    warned: bool,
}

impl ModContainer {
    pub fn new(candidate: &ModCandidate) -> Self {
        let parent_id = candidate.parent_ids.first().cloned();

        // A nested candidate belongs to this container only when it has no
        // other parent, or this container is its primary parent.
        let child_ids = candidate
            .nested
            .iter()
            .filter(|nested| {
                nested.parent_ids.len() <= 1
                    || nested.parent_ids.first() == Some(&candidate.metadata.id)
            })
            .map(|nested| nested.metadata.id.clone())
            .collect();

        ModContainer {
            metadata: candidate.metadata.clone(),
            origin_path: candidate.path.clone(),
            parent_id,
            child_ids,
            root: None,
            warned: false,
        }
    }

    pub fn metadata(&self) -> &ModMetadata {
        &self.metadata
    }

    pub fn origin_path(&self) -> &Path {
        &self.origin_path
    }

    pub fn parent_id(&self) -> Option<&str> {
        self.parent_id.as_deref()
    }

    pub fn child_ids(&self) -> &[String] {
        &self.child_ids
    }

    /// Resolve the container's content root lazily: the origin itself for a
    /// directory mod, the validated archive path otherwise. A cached root
    /// that disappears from disk is re-resolved with a one-time warning.
    pub fn root_path(&mut self) -> Result<&Path, ArchiveError> {
        if let Some(root) = &self.root
            && !root.exists()
        {
            if !self.warned {
                self.warned = true;
                eprintln!(
                    "[loadstone] content root for {self} vanished, existing references may break"
                );
            }
            self.root = None;
        }

        if self.root.is_none() {
            if !self.origin_path.is_dir() {
                archive::validate(&self.origin_path)?;
            }
            self.root = Some(self.origin_path.clone());
        }

        // checked/filled just above
        Ok(self.root.as_deref().unwrap_or(self.origin_path.as_path()))
    }
}

impl fmt::Display for ModContainer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.metadata.id, self.metadata.version)
    }
}

/// Id-indexed container registry with parent/child navigation.
#[derive(Default)]
pub struct ContainerRegistry {
    containers: HashMap<String, ModContainer>,
}

impl ContainerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a candidate and, recursively, everything nested in it.
    pub fn add(&mut self, candidate: &ModCandidate) {
        self.containers.insert(
            candidate.metadata.id.clone(),
            ModContainer::new(candidate),
        );

        for nested in &candidate.nested {
            self.add(nested);
        }
    }

    pub fn get(&self, id: &str) -> Option<&ModContainer> {
        self.containers.get(id)
    }

    pub fn len(&self) -> usize {
        self.containers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.containers.is_empty()
    }

    /// The container a mod is nested in, if any.
    pub fn containing_mod(&self, id: &str) -> Option<&ModContainer> {
        let parent = self.containers.get(id)?.parent_id()?;
        self.containers.get(parent)
    }

    /// Registered containers nested in the given mod, in child-id order.
    pub fn contained_mods(&self, id: &str) -> Vec<&ModContainer> {
        let Some(container) = self.containers.get(id) else {
            return Vec::new();
        };

        container
            .child_ids()
            .iter()
            .filter_map(|child| self.containers.get(child))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::fixtures::write_module;

    fn candidate(id: &str, parents: &[&str], nested: Vec<ModCandidate>) -> ModCandidate {
        ModCandidate {
            metadata: ModMetadata {
                id: id.to_string(),
                version: "1.0.0".to_string(),
                name: id.to_string(),
                runtime_requirement: None,
            },
            path: PathBuf::from(format!("/tmp/{id}.jar")),
            parent_ids: parents.iter().map(|p| p.to_string()).collect(),
            nested,
        }
    }

    #[test]
    fn test_parent_and_child_bookkeeping() {
        let nested_single = candidate("single-parent", &["outer"], Vec::new());
        let nested_shared = candidate("shared", &["elsewhere", "outer"], Vec::new());
        let outer = candidate("outer", &[], vec![nested_single, nested_shared]);

        let mut registry = ContainerRegistry::new();
        registry.add(&outer);

        // shared has another primary parent, so it is not outer's child
        let children = registry.contained_mods("outer");
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].metadata().id, "single-parent");

        assert_eq!(
            registry.containing_mod("single-parent").map(|c| c.metadata().id.as_str()),
            Some("outer")
        );
        assert!(registry.containing_mod("outer").is_none());
    }

    #[test]
    fn test_root_path_for_archive_mod() {
        let module = write_module("container", &[("entry", b"x")]);
        let mut c = candidate("archived", &[], Vec::new());
        c.path = module.clone();

        let mut container = ModContainer::new(&c);
        assert_eq!(container.root_path().unwrap(), module.as_path());
    }

    #[test]
    fn test_root_path_unreadable_archive_is_an_error() {
        let mut c = candidate("ghost", &[], Vec::new());
        c.path = PathBuf::from("/nonexistent/ghost.jar");

        let mut container = ModContainer::new(&c);
        assert!(container.root_path().is_err());
    }

    #[test]
    fn test_display_is_id_and_version() {
        let container = ModContainer::new(&candidate("demo", &[], Vec::new()));
        assert_eq!(container.to_string(), "demo 1.0.0");
    }
}
