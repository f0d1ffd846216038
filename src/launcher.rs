//! Host environment seams
//!
//! The engine never touches class loading machinery directly. Everything it
//! needs from the embedding host goes through the `Launcher` trait: search
//! path queries, classpath mutation, symbol resolution and log-handler
//! construction. `StandardHost` is the search-path-backed implementation the
//! driver binary and the tests run against.

use std::cell::Cell;
use std::collections::HashMap;
use std::error::Error;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;
use walkdir::WalkDir;

use crate::archive;
use crate::bundler::ResourceLoader;
use crate::profile::EnvKind;
use crate::util::class_entry_name;

/// Failure modes of a resolved entrypoint invocation.
///
/// `Target` wraps a fault thrown by the invoked code itself; `Resolution`
/// covers every other failure of the invocation mechanism. Crash handling
/// unwraps the former and passes the latter as-is.
#[derive(Debug, Error)]
pub enum InvokeFault {
    #[error("target fault: {0}")]
    Target(#[source] Box<dyn Error + Send + Sync>),
    #[error("invocation failure: {0}")]
    Resolution(#[source] Box<dyn Error + Send + Sync>),
}

/// A resolved, callable entrypoint.
pub trait Invokable: Send {
    fn invoke(&self, args: &[String]) -> Result<(), InvokeFault>;
}

/// The game's logging handler, resolved by symbol and installed once.
pub trait LogHandler {
    fn install(&self) -> Result<(), Box<dyn Error>>;
}

/// Host class-loading environment.
pub trait Launcher {
    fn env_kind(&self) -> EnvKind;

    /// Which module on the host search path provides `entry`, if any.
    /// I/O failures on individual modules are logged and skipped.
    fn find_source(&self, entry: &str) -> Option<PathBuf>;

    /// Raw bytes of `entry` from the host search path.
    fn read_resource(&self, entry: &str) -> Option<Vec<u8>>;

    fn add_to_classpath(&mut self, module: &Path);

    fn set_restrictions(&mut self, prefixes: &[String]);

    /// Resolve a symbolic name to an invokable entrypoint.
    fn resolve(&self, symbol: &str) -> Option<Box<dyn Invokable>>;

    /// Resolve within a capture loader context: the symbol must be servable
    /// by `loader` before it can be invoked. Used by bundler capture only.
    fn resolve_in(&self, symbol: &str, loader: &dyn ResourceLoader) -> Option<Box<dyn Invokable>> {
        loader.load_bytes(symbol)?;
        self.resolve(symbol)
    }

    /// Construct the logging handler, in the current context or in the final
    /// launch target when `into_target` is set.
    fn load_log_handler(&self, into_target: bool) -> Result<Box<dyn LogHandler>, Box<dyn Error>>;
}

/// Invokable backed by a plain function; how hosts register entry symbols.
#[derive(Clone)]
pub struct FnInvokable(
    pub Arc<dyn Fn(&[String]) -> Result<(), InvokeFault> + Send + Sync>,
);

impl Invokable for FnInvokable {
    fn invoke(&self, args: &[String]) -> Result<(), InvokeFault> {
        (self.0)(args)
    }
}

/// Collect archive modules under a directory, in stable (sorted) order.
pub fn modules_under(dir: &Path) -> Vec<PathBuf> {
    let mut modules: Vec<PathBuf> = WalkDir::new(dir)
        .follow_links(false)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| {
            matches!(
                path.extension().and_then(|ext| ext.to_str()),
                Some("jar") | Some("zip")
            )
        })
        .collect();
    modules.sort();
    modules
}

/// Search-path-backed host environment.
pub struct StandardHost {
    env_kind: EnvKind,
    search_path: Vec<PathBuf>,
    classpath: Vec<PathBuf>,
    restrictions: Vec<String>,
    symbols: HashMap<String, FnInvokable>,
    log_handler_loads: Cell<u32>,
}

impl StandardHost {
    pub fn new(env_kind: EnvKind, search_path: Vec<PathBuf>) -> Self {
        StandardHost {
            env_kind,
            search_path,
            classpath: Vec::new(),
            restrictions: Vec::new(),
            symbols: HashMap::new(),
            log_handler_loads: Cell::new(0),
        }
    }

    pub fn register_symbol<F>(&mut self, symbol: &str, body: F)
    where
        F: Fn(&[String]) -> Result<(), InvokeFault> + Send + Sync + 'static,
    {
        self.symbols
            .insert(symbol.to_string(), FnInvokable(Arc::new(body)));
    }

    pub fn classpath(&self) -> &[PathBuf] {
        &self.classpath
    }

    pub fn restrictions(&self) -> &[String] {
        &self.restrictions
    }

    pub fn log_handler_loads(&self) -> u32 {
        self.log_handler_loads.get()
    }
}

impl Launcher for StandardHost {
    fn env_kind(&self) -> EnvKind {
        self.env_kind
    }

    fn find_source(&self, entry: &str) -> Option<PathBuf> {
        for module in &self.search_path {
            match archive::probe(module, entry) {
                Ok(true) => return Some(module.clone()),
                Ok(false) => {}
                Err(e) => {
                    eprintln!("[loadstone] skipping unreadable module: {e}");
                }
            }
        }
        None
    }

    fn read_resource(&self, entry: &str) -> Option<Vec<u8>> {
        for module in &self.search_path {
            if let Ok(Some(data)) = archive::read_entry(module, entry) {
                return Some(data);
            }
        }
        None
    }

    fn add_to_classpath(&mut self, module: &Path) {
        if !self.classpath.iter().any(|m| m == module) {
            self.classpath.push(module.to_path_buf());
        }
    }

    fn set_restrictions(&mut self, prefixes: &[String]) {
        self.restrictions = prefixes.to_vec();
    }

    fn resolve(&self, symbol: &str) -> Option<Box<dyn Invokable>> {
        self.symbols
            .get(symbol)
            .map(|inv| Box::new(inv.clone()) as Box<dyn Invokable>)
    }

    fn load_log_handler(&self, into_target: bool) -> Result<Box<dyn LogHandler>, Box<dyn Error>> {
        self.log_handler_loads.set(self.log_handler_loads.get() + 1);
        Ok(Box::new(ConsoleLogHandler { into_target }))
    }
}

/// Log handler used by the standard host: routes game logging to the console.
pub struct ConsoleLogHandler {
    into_target: bool,
}

impl LogHandler for ConsoleLogHandler {
    fn install(&self) -> Result<(), Box<dyn Error>> {
        let context = if self.into_target { "target" } else { "host" };
        println!("[loadstone] console log handler installed ({context} context)");
        Ok(())
    }
}

/// Resource loader view over a host's search path, used as the parent end of
/// a capture loader chain.
pub struct HostResources<'a>(pub &'a dyn Launcher);

impl ResourceLoader for HostResources<'_> {
    fn load_bytes(&self, symbol: &str) -> Option<Vec<u8>> {
        self.0.read_resource(&class_entry_name(symbol))
    }
}
