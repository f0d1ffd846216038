//! Launch coordination
//!
//! Resolves the located game's entrypoint in the final target environment,
//! invokes it, and routes failures through crash handling. A fault thrown by
//! the game itself is unwrapped before reaching the reporter; failures of the
//! invocation mechanism are passed as-is.

use std::error::Error;
use std::time::{SystemTime, UNIX_EPOCH};

use dialog::DialogBox;
use thiserror::Error;

use crate::launcher::{InvokeFault, Launcher};
use crate::locate::LocatedGame;
use crate::paths::PATH_CRASH_REPORTS;
use crate::profile::{EnvKind, GameProfile};

#[derive(Debug)]
pub enum LaunchOutcome {
    Success,
    /// The reporter handled the crash; propagation is suppressed.
    CrashedRecoverable(Box<dyn Error + Send + Sync>),
    CrashedFatal {
        context: String,
        cause: Box<dyn Error + Send + Sync>,
    },
}

#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("{context}")]
    Fatal {
        context: String,
        #[source]
        cause: Box<dyn Error + Send + Sync>,
    },
}

/// External crash-surface collaborator. Returns whether the crash was
/// handled; unhandled crashes are re-raised by the coordinator.
pub trait CrashReporter {
    fn display_error(&self, context: &str, cause: &dyn Error, fatal_hint: bool) -> bool;
}

/// Default reporter: writes a crash report file and pops a message box.
/// Never claims to have handled the crash, so faults keep propagating.
pub struct DialogCrashReporter;

impl DialogCrashReporter {
    fn write_report(&self, context: &str, cause: &dyn Error) {
        if std::fs::create_dir_all(&*PATH_CRASH_REPORTS).is_err() {
            return;
        }

        let stamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        let path = PATH_CRASH_REPORTS.join(format!("crash-{stamp}.txt"));

        let mut body = format!("{context}\n\n{cause}\n");
        let mut source = cause.source();
        while let Some(inner) = source {
            body.push_str(&format!("caused by: {inner}\n"));
            source = inner.source();
        }

        if std::fs::write(&path, body).is_ok() {
            eprintln!("[loadstone] crash report written to {}", path.display());
        }
    }
}

impl CrashReporter for DialogCrashReporter {
    fn display_error(&self, context: &str, cause: &dyn Error, _fatal_hint: bool) -> bool {
        self.write_report(context, cause);
        let _ = dialog::Message::new(format!("{context}\n\n{cause}"))
            .title("loadstone")
            .show();
        false
    }
}

fn crash(
    reporter: &dyn CrashReporter,
    context: &str,
    cause: Box<dyn Error + Send + Sync>,
) -> LaunchOutcome {
    if reporter.display_error(context, cause.as_ref(), false) {
        LaunchOutcome::CrashedRecoverable(cause)
    } else {
        LaunchOutcome::CrashedFatal {
            context: context.to_string(),
            cause,
        }
    }
}

/// Invoke the located game's entrypoint with the prepared argument vector.
pub fn launch_game(
    game: &LocatedGame,
    args: &[String],
    target: &dyn Launcher,
    profile: &GameProfile,
    reporter: &dyn CrashReporter,
) -> LaunchOutcome {
    // Applet-flavored client entrypoints go through the standalone adapter.
    let symbol = if game.env_kind == EnvKind::Client && game.entrypoint.contains("Applet") {
        profile.applet_adapter.as_str()
    } else {
        game.entrypoint.as_str()
    };

    let failed_to_start = format!("Failed to start {}!", profile.game_name);

    let Some(entry) = target.resolve(symbol) else {
        return crash(
            reporter,
            &failed_to_start,
            format!("entrypoint {symbol} not found in target environment").into(),
        );
    };

    match entry.invoke(args) {
        Ok(()) => LaunchOutcome::Success,
        Err(InvokeFault::Target(cause)) => crash(
            reporter,
            &format!("{} has crashed!", profile.game_name),
            cause,
        ),
        Err(fault @ InvokeFault::Resolution(_)) => {
            crash(reporter, &failed_to_start, Box::new(fault))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::launcher::StandardHost;
    use std::path::PathBuf;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    struct Handled(bool);

    impl CrashReporter for Handled {
        fn display_error(&self, _context: &str, _cause: &dyn Error, _fatal_hint: bool) -> bool {
            self.0
        }
    }

    fn located(entrypoint: &str, env_kind: EnvKind) -> LocatedGame {
        LocatedGame {
            primary: PathBuf::from("/tmp/game.jar"),
            extension: None,
            logging_api: None,
            logging_impls: Vec::new(),
            miscellaneous: Vec::new(),
            entrypoint: entrypoint.to_string(),
            env_kind,
            logging_colocated: false,
            has_legacy_loader: false,
            input_primary: PathBuf::from("/tmp/game.jar"),
            input_extension: None,
        }
    }

    #[test]
    fn test_successful_launch_passes_arguments() {
        let mut host = StandardHost::new(EnvKind::Server, Vec::new());
        let seen = Arc::new(AtomicBool::new(false));
        let seen_in = seen.clone();

        host.register_symbol("net.minecraft.server.Main", move |args| {
            assert_eq!(args, ["--port".to_string(), "25565".to_string()]);
            seen_in.store(true, Ordering::SeqCst);
            Ok(())
        });

        let outcome = launch_game(
            &located("net.minecraft.server.Main", EnvKind::Server),
            &["--port".to_string(), "25565".to_string()],
            &host,
            &GameProfile::default(),
            &Handled(false),
        );

        assert!(matches!(outcome, LaunchOutcome::Success));
        assert!(seen.load(Ordering::SeqCst));
    }

    #[test]
    fn test_applet_entrypoint_is_substituted_for_clients() {
        let profile = GameProfile::default();
        let mut host = StandardHost::new(EnvKind::Client, Vec::new());
        host.register_symbol(&profile.applet_adapter, |_args| Ok(()));

        let outcome = launch_game(
            &located("net.minecraft.client.MinecraftApplet", EnvKind::Client),
            &[],
            &host,
            &profile,
            &Handled(false),
        );

        assert!(matches!(outcome, LaunchOutcome::Success));
    }

    #[test]
    fn test_target_fault_is_unwrapped_and_fatal_when_unhandled() {
        let mut host = StandardHost::new(EnvKind::Server, Vec::new());
        host.register_symbol("net.minecraft.server.Main", |_args| {
            Err(InvokeFault::Target("world corrupted".into()))
        });

        let outcome = launch_game(
            &located("net.minecraft.server.Main", EnvKind::Server),
            &[],
            &host,
            &GameProfile::default(),
            &Handled(false),
        );

        match outcome {
            LaunchOutcome::CrashedFatal { context, cause } => {
                assert!(context.contains("has crashed"));
                assert_eq!(cause.to_string(), "world corrupted");
            }
            other => panic!("expected fatal crash, got {other:?}"),
        }
    }

    #[test]
    fn test_handled_crash_is_recoverable() {
        let mut host = StandardHost::new(EnvKind::Server, Vec::new());
        host.register_symbol("net.minecraft.server.Main", |_args| {
            Err(InvokeFault::Target("boom".into()))
        });

        let outcome = launch_game(
            &located("net.minecraft.server.Main", EnvKind::Server),
            &[],
            &host,
            &GameProfile::default(),
            &Handled(true),
        );

        assert!(matches!(outcome, LaunchOutcome::CrashedRecoverable(_)));
    }

    #[test]
    fn test_missing_entrypoint_goes_through_crash_handling() {
        let host = StandardHost::new(EnvKind::Server, Vec::new());

        let outcome = launch_game(
            &located("net.minecraft.server.Main", EnvKind::Server),
            &[],
            &host,
            &GameProfile::default(),
            &Handled(false),
        );

        match outcome {
            LaunchOutcome::CrashedFatal { context, .. } => {
                assert!(context.contains("Failed to start"));
            }
            other => panic!("expected fatal crash, got {other:?}"),
        }
    }
}
