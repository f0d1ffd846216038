//! Classpath gate
//!
//! Two-phase visibility contract over the host class-loading environment:
//! restricted while the transformation pass runs, fully unlocked afterwards.
//! Transitions are monotonic; once unlocked the gate never narrows again.

use crate::launcher::Launcher;
use crate::locate::LocatedGame;

#[derive(Clone, Debug, PartialEq)]
pub enum Visibility {
    Undefined,
    Restricted(Vec<String>),
    Unlocked,
}

pub struct ClasspathGate {
    visibility: Visibility,
}

impl ClasspathGate {
    pub fn new() -> Self {
        ClasspathGate {
            visibility: Visibility::Undefined,
        }
    }

    pub fn visibility(&self) -> &Visibility {
        &self.visibility
    }

    /// Restrict resolution to the given namespace prefixes. Rejected after
    /// unlock: a post-unlock call is a logged no-op and returns false.
    pub fn restrict_to(&mut self, host: &mut dyn Launcher, prefixes: &[String]) -> bool {
        if self.visibility == Visibility::Unlocked {
            eprintln!("[loadstone] ignoring classpath restriction after unlock");
            return false;
        }

        host.set_restrictions(prefixes);
        self.visibility = Visibility::Restricted(prefixes.to_vec());
        true
    }

    /// Make logging resolvable ahead of the full unlock.
    ///
    /// In the co-located case the primary module itself goes on the classpath
    /// early, with its namespace prefixes restricted so unrelated code in it
    /// stays unresolvable until transformation completes. Separately captured
    /// logging modules are simply exposed.
    pub fn expose_for_logging(
        &mut self,
        host: &mut dyn Launcher,
        game: &LocatedGame,
        restricted_prefixes: &[String],
    ) {
        if game.logging_colocated {
            host.add_to_classpath(&game.primary);
            self.restrict_to(host, restricted_prefixes);
        }

        if let Some(api) = &game.logging_api {
            host.add_to_classpath(api);
        }

        for module in &game.logging_impls {
            host.add_to_classpath(module);
        }
    }

    /// Expose every discovered module, in discovery order (first registered
    /// wins when two modules define the same symbol). Safe to call once;
    /// repeated calls are logged no-ops.
    pub fn unlock_all(&mut self, host: &mut dyn Launcher, game: &LocatedGame) {
        if self.visibility == Visibility::Unlocked {
            eprintln!("[loadstone] classpath already unlocked");
            return;
        }

        if game.logging_colocated {
            // The primary module is already on the classpath; only the
            // restrictions come off.
            host.set_restrictions(&[]);
        } else {
            host.add_to_classpath(&game.primary);
        }

        if let Some(extension) = &game.extension {
            host.add_to_classpath(extension);
        }

        for module in &game.miscellaneous {
            host.add_to_classpath(module);
        }

        self.visibility = Visibility::Unlocked;
    }
}

impl Default for ClasspathGate {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::launcher::StandardHost;
    use crate::profile::EnvKind;
    use std::path::PathBuf;

    fn located(colocated: bool) -> LocatedGame {
        LocatedGame {
            primary: PathBuf::from("/tmp/game.jar"),
            extension: Some(PathBuf::from("/tmp/ext.jar")),
            logging_api: None,
            logging_impls: Vec::new(),
            miscellaneous: vec![PathBuf::from("/tmp/lib1.jar"), PathBuf::from("/tmp/lib2.jar")],
            entrypoint: "net.minecraft.server.Main".to_string(),
            env_kind: EnvKind::Server,
            logging_colocated: colocated,
            has_legacy_loader: false,
            input_primary: PathBuf::from("/tmp/game.jar"),
            input_extension: None,
        }
    }

    #[test]
    fn test_unlock_exposes_modules_in_discovery_order() {
        let mut host = StandardHost::new(EnvKind::Server, Vec::new());
        let mut gate = ClasspathGate::new();

        gate.unlock_all(&mut host, &located(false));

        let expected: Vec<PathBuf> = ["/tmp/game.jar", "/tmp/ext.jar", "/tmp/lib1.jar", "/tmp/lib2.jar"]
            .iter()
            .map(PathBuf::from)
            .collect();
        assert_eq!(host.classpath(), expected.as_slice());
        assert_eq!(*gate.visibility(), Visibility::Unlocked);
    }

    #[test]
    fn test_restrict_after_unlock_is_rejected() {
        let mut host = StandardHost::new(EnvKind::Server, Vec::new());
        let mut gate = ClasspathGate::new();

        gate.unlock_all(&mut host, &located(false));
        let narrowed = gate.restrict_to(&mut host, &["net.minecraft.".to_string()]);

        assert!(!narrowed);
        assert_eq!(*gate.visibility(), Visibility::Unlocked);
        assert!(host.restrictions().is_empty());
    }

    #[test]
    fn test_colocated_unlock_clears_restrictions_instead_of_readding() {
        let mut host = StandardHost::new(EnvKind::Server, Vec::new());
        let mut gate = ClasspathGate::new();
        let game = located(true);
        let prefixes = vec!["net.minecraft.".to_string(), "com.mojang.".to_string()];

        gate.expose_for_logging(&mut host, &game, &prefixes);
        assert_eq!(host.restrictions(), prefixes.as_slice());
        assert_eq!(host.classpath(), &[PathBuf::from("/tmp/game.jar")]);

        gate.unlock_all(&mut host, &game);
        assert!(host.restrictions().is_empty());
        // primary not re-added
        assert_eq!(
            host.classpath().iter().filter(|m| **m == PathBuf::from("/tmp/game.jar")).count(),
            1
        );
    }

    #[test]
    fn test_unlock_is_idempotent() {
        let mut host = StandardHost::new(EnvKind::Server, Vec::new());
        let mut gate = ClasspathGate::new();
        let game = located(false);

        gate.unlock_all(&mut host, &game);
        let len = host.classpath().len();
        gate.unlock_all(&mut host, &game);

        assert_eq!(host.classpath().len(), len);
    }
}
