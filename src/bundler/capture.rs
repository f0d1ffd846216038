//! Capture rendezvous

use std::path::PathBuf;
use std::sync::Mutex;
use std::sync::mpsc::{self, RecvTimeoutError, SyncSender};
use std::thread;
use std::time::{Duration, Instant};

use super::loader::CaptureLoader;
use crate::launcher::{HostResources, Launcher};
use crate::locate::LocateError;
use crate::profile::{EnvKind, GameProfile};
use crate::util::EnvVarGuard;

/// How long the runner waits for the launcher stub to hand off its classpath.
pub const CAPTURE_TIMEOUT: Duration = Duration::from_secs(10);

const POLL_SLICE: Duration = Duration::from_millis(25);

/// Single-fulfillment slot the capture shim publishes into. Armed for the
/// duration of one capture attempt, cleared on every exit path.
static CAPTURE_SLOT: Mutex<Option<SyncSender<Vec<PathBuf>>>> = Mutex::new(None);

/// Serializes tests that exercise the process-wide capture slot.
#[cfg(test)]
pub(crate) static TEST_CAPTURE_LOCK: Mutex<()> = Mutex::new(());

fn slot() -> std::sync::MutexGuard<'static, Option<SyncSender<Vec<PathBuf>>>> {
    CAPTURE_SLOT.lock().unwrap_or_else(|e| e.into_inner())
}

/// Called by the capture shim once the launcher stub hands control to it:
/// publishes the classpath it observed instead of continuing execution.
/// Returns false when no capture attempt is pending.
pub fn publish_captured_classpath(modules: Vec<PathBuf>) -> bool {
    match slot().take() {
        Some(sender) => sender.send(modules).is_ok(),
        None => false,
    }
}

struct SlotGuard;

impl Drop for SlotGuard {
    fn drop(&mut self) {
        slot().take();
    }
}

/// Run the bundler far enough to capture the module list it assembles.
///
/// `Ok(None)` means the bundler is absent (no entry symbol, or no handoff
/// within the timeout) and discovery should fall through. Any failure of the
/// invocation itself aborts the whole locate operation.
pub fn run_capture(
    host: &dyn Launcher,
    profile: &GameProfile,
) -> Result<Option<Vec<PathBuf>>, LocateError> {
    run_capture_with(host, profile, CAPTURE_TIMEOUT)
}

pub(crate) fn run_capture_with(
    host: &dyn Launcher,
    profile: &GameProfile,
    timeout: Duration,
) -> Result<Option<Vec<PathBuf>>, LocateError> {
    // Client distributions never use a bundler.
    if host.env_kind() != EnvKind::Server {
        return Ok(None);
    }

    let entry = {
        let parent = HostResources(host);
        let loader = CaptureLoader::new(&profile.restricted_prefixes, host, &parent);

        match host.resolve_in(&profile.bundler_entrypoint, &loader) {
            Some(entry) => entry,
            // No bundler on the module path.
            None => return Ok(None),
        }
    };

    let (sender, receiver) = mpsc::sync_channel(1);
    *slot() = Some(sender);
    let _slot_guard = SlotGuard;
    let _redirect_guard = EnvVarGuard::set(&profile.bundler_redirect_key, &profile.capture_shim);

    eprintln!(
        "[loadstone] running bundler {} for classpath capture",
        profile.bundler_entrypoint
    );

    let worker = thread::spawn(move || entry.invoke(&[]));
    let deadline = Instant::now() + timeout;

    loop {
        match receiver.recv_timeout(POLL_SLICE) {
            Ok(modules) => {
                eprintln!("[loadstone] bundler yielded {} module(s)", modules.len());
                return Ok(Some(modules));
            }
            Err(RecvTimeoutError::Timeout) => {
                if worker.is_finished() {
                    return match worker.join() {
                        // The stub returned without handing off; the shim may
                        // still have published just before it finished.
                        Ok(Ok(())) => Ok(receiver.try_recv().ok()),
                        Ok(Err(fault)) => Err(LocateError::BundlerInvocation(Box::new(fault))),
                        Err(_) => Err(LocateError::BundlerInvocation(
                            "bundler thread panicked".into(),
                        )),
                    };
                }

                if Instant::now() >= deadline {
                    eprintln!("[loadstone] bundler capture timed out, treating bundler as absent");
                    return Ok(None);
                }
            }
            Err(RecvTimeoutError::Disconnected) => return Ok(None),
        }
    }
}
