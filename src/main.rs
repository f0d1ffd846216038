mod archive;
mod bundler;
mod classpath;
mod containers;
mod launch;
mod launcher;
mod locate;
mod paths;
mod profile;
mod util;
mod version;

use std::error::Error;
use std::path::PathBuf;

use crate::containers::ContainerRegistry;
use crate::launcher::{StandardHost, modules_under};
use crate::locate::{GameLocator, PassthroughTransformer};
use crate::profile::{EnvKind, GameProfile, RuntimePolicy};
use crate::version::EmbeddedVersionLookup;

const USAGE_TEXT: &str = "\
loadstone - game runtime locator

Usage: loadstone [options] [game arguments...]

Options:
  --env <client|server>     environment kind (default: client)
  --modulePath <a:b:c>      colon-separated module search path
  --libraryDir <dir>        add every archive module under <dir>
  --launch                  initialize and unlock after locating
  --help                    print this text

Game arguments (--accessToken, --version, --versionType, --gameDir,
--assetsDir, ...) are passed through the argument map.";

fn split_flag(args: &mut Vec<String>, flag: &str) -> Option<String> {
    let idx = args.iter().position(|a| a == flag)?;
    if idx + 1 >= args.len() {
        args.remove(idx);
        return None;
    }
    let value = args.remove(idx + 1);
    args.remove(idx);
    Some(value)
}

fn main() -> Result<(), Box<dyn Error>> {
    if !GameLocator::is_enabled() {
        println!("[loadstone] disabled via {}, skipping", locate::ENV_SKIP);
        return Ok(());
    }

    let mut args: Vec<String> = std::env::args().skip(1).collect();

    if args.iter().any(|arg| arg == "--help") {
        println!("{USAGE_TEXT}");
        return Ok(());
    }

    let env_kind = match split_flag(&mut args, "--env") {
        Some(value) => EnvKind::parse(&value)
            .ok_or_else(|| format!("unknown environment kind: {value}"))?,
        None => EnvKind::Client,
    };

    let mut search_path: Vec<PathBuf> = Vec::new();
    if let Some(module_path) = split_flag(&mut args, "--modulePath") {
        search_path.extend(module_path.split(':').filter(|s| !s.is_empty()).map(PathBuf::from));
    }
    if let Some(library_dir) = split_flag(&mut args, "--libraryDir") {
        search_path.extend(modules_under(&PathBuf::from(library_dir)));
    }

    let run_pipeline = {
        let idx = args.iter().position(|a| a == "--launch");
        if let Some(idx) = idx {
            args.remove(idx);
            true
        } else {
            false
        }
    };

    println!(
        "[loadstone] scanning {} module(s) as {env_kind}",
        search_path.len()
    );

    let mut host = StandardHost::new(env_kind, search_path);
    let mut locator = GameLocator::new(GameProfile::default(), RuntimePolicy::default());

    if !locator.locate(&host, &EmbeddedVersionLookup, &args)? {
        eprintln!("[loadstone] no game found on the module path");
        std::process::exit(1);
    }

    report(&locator);

    if run_pipeline {
        locator.initialize(&mut host, &PassthroughTransformer)?;
        locator.unlock_classpath(&mut host)?;
        println!(
            "[loadstone] classpath unlocked with {} module(s); handing off to the embedding host",
            host.classpath().len()
        );
    }

    Ok(())
}

fn report(locator: &GameLocator) {
    let Some(game) = locator.game() else {
        return;
    };

    println!("[loadstone] primary module: {}", game.primary.display());
    println!("[loadstone] entrypoint: {}", game.entrypoint);

    if let Some(extension) = &game.extension {
        println!("[loadstone] extension module: {}", extension.display());
    }

    if game.logging_colocated {
        println!("[loadstone] logging co-located with the primary module");
    } else {
        if let Some(api) = &game.logging_api {
            println!("[loadstone] logging API module: {}", api.display());
        }
        for module in &game.logging_impls {
            println!("[loadstone] logging impl module: {}", module.display());
        }
    }

    for module in &game.miscellaneous {
        println!("[loadstone] misc module: {}", module.display());
    }

    if let Some(version) = locator.version() {
        println!(
            "[loadstone] version: {} (normalized {})",
            version.raw, version.normalized
        );
    }

    if let Some(builtin) = locator.builtin_game_candidate() {
        let mut registry = ContainerRegistry::new();
        registry.add(&builtin);
        if let Some(container) = registry.get(&builtin.metadata.id) {
            match &container.metadata().runtime_requirement {
                Some(req) => println!("[loadstone] builtin mod: {container} (runtime {req})"),
                None => println!("[loadstone] builtin mod: {container}"),
            }
        }
    }

    let sanitized = locator.launch_arguments(true);
    if !sanitized.is_empty() {
        println!("[loadstone] launch arguments: {}", sanitized.join(" "));
    }
}
