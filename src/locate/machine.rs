//! Locator state machine
//!
//! One locate/initialize/launch pipeline per process, driven sequentially on
//! the control thread. Every fallible step either succeeds, degrades to a
//! documented fallback, or is fatal; there are no retries and partial states
//! are not resumable.

use std::env;
use std::error::Error;
use std::path::{Path, PathBuf};

use crate::bundler;
use crate::classpath::ClasspathGate;
use crate::containers::{ModCandidate, ModMetadata};
use crate::launch::{CrashReporter, LaunchError, LaunchOutcome, launch_game};
use crate::launcher::Launcher;
use crate::profile::{EnvKind, GameProfile, RuntimePolicy};
use crate::version::{VersionInfo, VersionLookup, runtime_requirement};

use super::arguments::{Arguments, launch_directory, process_argument_map};
use super::classify::{classify, ensure_logging_captured};
use super::scan::scan_direct;
use super::types::{LocateError, LocatedGame, LocatorState};

/// Set to anything to disable the engine entirely.
pub const ENV_SKIP: &str = "LOADSTONE_SKIP";
/// Explicit game version override.
pub const ENV_GAME_VERSION: &str = "LOADSTONE_GAME_VERSION";

/// Transformation/deobfuscation pass over game modules. The pipeline itself
/// is external; these are its two call-in points.
pub trait Transformer {
    /// Rewrite the given modules, returning the transformed variants with
    /// the same cardinality and order.
    fn deobfuscate(
        &self,
        modules: Vec<PathBuf>,
        game_id: &str,
        normalized_version: &str,
        launch_dir: &Path,
        env_kind: EnvKind,
    ) -> Result<Vec<PathBuf>, Box<dyn Error>>;

    /// Locate and patch the entrypoints inside the (transformed) primary module.
    fn locate_entrypoints(
        &self,
        host: &mut dyn Launcher,
        primary: &Path,
    ) -> Result<(), Box<dyn Error>>;
}

/// Transformer that changes nothing; used by the dry-run driver.
pub struct PassthroughTransformer;

impl Transformer for PassthroughTransformer {
    fn deobfuscate(
        &self,
        modules: Vec<PathBuf>,
        _game_id: &str,
        _normalized_version: &str,
        _launch_dir: &Path,
        _env_kind: EnvKind,
    ) -> Result<Vec<PathBuf>, Box<dyn Error>> {
        Ok(modules)
    }

    fn locate_entrypoints(
        &self,
        _host: &mut dyn Launcher,
        _primary: &Path,
    ) -> Result<(), Box<dyn Error>> {
        Ok(())
    }
}

pub struct GameLocator {
    profile: GameProfile,
    policy: RuntimePolicy,
    state: LocatorState,
    env_kind: Option<EnvKind>,
    arguments: Arguments,
    game: Option<LocatedGame>,
    version: Option<VersionInfo>,
    gate: ClasspathGate,
}

impl GameLocator {
    pub fn new(profile: GameProfile, policy: RuntimePolicy) -> Self {
        GameLocator {
            profile,
            policy,
            state: LocatorState::Unlocated,
            env_kind: None,
            arguments: Arguments::default(),
            game: None,
            version: None,
            gate: ClasspathGate::new(),
        }
    }

    /// Feature kill-switch; when disabled the embedding host skips this
    /// engine altogether.
    pub fn is_enabled() -> bool {
        env::var(ENV_SKIP).is_err()
    }

    pub fn state(&self) -> LocatorState {
        self.state
    }

    pub fn game(&self) -> Option<&LocatedGame> {
        self.game.as_ref()
    }

    pub fn version(&self) -> Option<&VersionInfo> {
        self.version.as_ref()
    }

    pub fn gate(&self) -> &ClasspathGate {
        &self.gate
    }

    pub fn launch_arguments(&self, sanitize: bool) -> Vec<String> {
        if self.game.is_none() {
            return Vec::new();
        }
        if sanitize {
            self.arguments.sanitized_vec()
        } else {
            self.arguments.to_vec()
        }
    }

    fn expect_state(&self, expected: LocatorState) -> Result<(), LocateError> {
        if self.state == expected {
            Ok(())
        } else {
            Err(LocateError::WrongState {
                expected,
                actual: self.state,
            })
        }
    }

    /// Discover the game modules: direct entrypoint scan first, then the
    /// bundler capture path (server only). `Ok(false)` means no game was
    /// found and the caller decides whether to abort startup.
    pub fn locate(
        &mut self,
        host: &dyn Launcher,
        lookup: &dyn VersionLookup,
        raw_args: &[String],
    ) -> Result<bool, Box<dyn Error>> {
        self.expect_state(LocatorState::Unlocated)?;

        let env_kind = host.env_kind();
        self.env_kind = Some(env_kind);
        self.arguments = Arguments::parse(raw_args);

        let game = match scan_direct(host, &self.profile) {
            Some(scan) => LocatedGame {
                input_primary: scan.primary.clone(),
                input_extension: scan.extension.clone(),
                primary: scan.primary,
                extension: scan.extension,
                logging_api: None,
                logging_impls: Vec::new(),
                miscellaneous: Vec::new(),
                entrypoint: scan.entrypoint,
                env_kind,
                logging_colocated: scan.logging_colocated,
                has_legacy_loader: scan.has_legacy_loader,
            },
            None => {
                // No entrypoint on the search path; try the bundler.
                let Some(captured) = bundler::run_capture(host, &self.profile)? else {
                    return Ok(false);
                };

                let classified = classify(&captured, &self.profile)?;
                ensure_logging_captured(&classified)?;

                LocatedGame {
                    input_primary: classified.primary.clone(),
                    input_extension: classified.extension.clone(),
                    primary: classified.primary,
                    extension: classified.extension,
                    logging_api: classified.logging_api,
                    logging_impls: classified.logging_impls,
                    miscellaneous: classified.miscellaneous,
                    entrypoint: classified.entrypoint,
                    env_kind,
                    logging_colocated: classified.logging_colocated,
                    // bundler and the legacy loader don't normally coexist
                    has_legacy_loader: false,
                }
            }
        };

        // Install the logging handler right away unless the implementation is
        // shaded into the game module or was captured separately; in both of
        // those cases installation waits until after transformation.
        if !game.logging_colocated && game.logging_impls.is_empty() {
            host.load_log_handler(false)?.install()?;
        }

        let version_override = self
            .arguments
            .remove("version")
            .or_else(|| env::var(ENV_GAME_VERSION).ok());
        let version = lookup
            .lookup(
                &game.primary,
                self.profile.entrypoints(env_kind),
                version_override.as_deref(),
            )
            .map_err(LocateError::Version)?;

        process_argument_map(&mut self.arguments, env_kind, &self.profile.brand);

        println!(
            "[loadstone] located {} {} ({} {})",
            self.profile.game_name, version.raw, env_kind, game.entrypoint
        );

        self.game = Some(game);
        self.version = Some(version);
        self.state = LocatorState::Located;
        Ok(true)
    }

    /// Run the transformation pass, expose logging modules through the gate
    /// and install the deferred logging handler. The gate stays restricted
    /// until `unlock_classpath`.
    pub fn initialize(
        &mut self,
        host: &mut dyn Launcher,
        transformer: &dyn Transformer,
    ) -> Result<(), Box<dyn Error>> {
        self.expect_state(LocatorState::Located)?;

        let normalized = self
            .version
            .as_ref()
            .map(|v| v.normalized.clone())
            .unwrap_or_default();
        let launch_dir = launch_directory(&self.arguments);
        let env_kind = self.env_kind.unwrap_or(EnvKind::Client);

        let Some(game) = self.game.as_mut() else {
            return Err("no located game to initialize".into());
        };

        let mut modules = vec![game.primary.clone()];
        if let Some(extension) = &game.extension {
            modules.push(extension.clone());
        }

        let transformed = transformer.deobfuscate(
            modules.clone(),
            &self.profile.game_id,
            &normalized,
            &launch_dir,
            env_kind,
        )?;
        if transformed.len() != modules.len() {
            return Err(format!(
                "transformer returned {} module(s) for {}",
                transformed.len(),
                modules.len()
            )
            .into());
        }

        let mut transformed = transformed.into_iter();
        if let Some(primary) = transformed.next() {
            game.primary = primary;
        }
        if game.extension.is_some() {
            game.extension = transformed.next();
        }

        // Logging modules become visible before the handler is installed, so
        // the transformation pass never depends on the final logging
        // implementation being resolvable through arbitrary namespaces.
        if game.logging_colocated || game.logging_api.is_some() || !game.logging_impls.is_empty() {
            self.gate
                .expose_for_logging(host, game, &self.profile.restricted_prefixes);
            host.load_log_handler(true)?.install()?;
        }

        transformer.locate_entrypoints(host, &game.primary)?;

        self.state = LocatorState::Initialized;
        Ok(())
    }

    /// Expose every discovered module, in discovery order.
    pub fn unlock_classpath(&mut self, host: &mut dyn Launcher) -> Result<(), Box<dyn Error>> {
        self.expect_state(LocatorState::Initialized)?;

        let Some(game) = &self.game else {
            return Err("no located game to unlock".into());
        };

        self.gate.unlock_all(host, game);
        Ok(())
    }

    /// Hand off to the launch coordinator.
    pub fn launch(
        &mut self,
        host: &dyn Launcher,
        reporter: &dyn CrashReporter,
    ) -> Result<(), Box<dyn Error>> {
        self.expect_state(LocatorState::Initialized)?;

        let Some(game) = &self.game else {
            return Err("no located game to launch".into());
        };

        self.state = LocatorState::Launched;

        match launch_game(game, &self.arguments.to_vec(), host, &self.profile, reporter) {
            LaunchOutcome::Success => {
                self.state = LocatorState::Completed;
                Ok(())
            }
            LaunchOutcome::CrashedRecoverable(cause) => {
                self.state = LocatorState::Crashed;
                eprintln!("[loadstone] crash handled by reporter: {cause}");
                Ok(())
            }
            LaunchOutcome::CrashedFatal { context, cause } => {
                self.state = LocatorState::Crashed;
                Err(Box::new(LaunchError::Fatal { context, cause }))
            }
        }
    }

    /// Whether surfacing a graphical crash report is acceptable here.
    pub fn can_open_crash_ui(&self) -> bool {
        if self.env_kind != Some(EnvKind::Server) {
            return true;
        }

        let extras = self.arguments.extra_args();
        !extras.iter().any(|a| a == "nogui" || a == "--nogui")
    }

    /// The game itself, described as a built-in mod candidate carrying its
    /// minimum-runtime requirement derived from the class-format hint.
    pub fn builtin_game_candidate(&self) -> Option<ModCandidate> {
        let game = self.game.as_ref()?;
        let version = self.version.as_ref()?;

        let requirement = version
            .class_format
            .and_then(|format| runtime_requirement(format, &self.policy).ok());

        Some(ModCandidate {
            metadata: ModMetadata {
                id: self.profile.game_id.clone(),
                version: version.normalized.clone(),
                name: self.profile.game_name.clone(),
                runtime_requirement: requirement,
            },
            path: game.primary.clone(),
            parent_ids: Vec::new(),
            nested: Vec::new(),
        })
    }
}
