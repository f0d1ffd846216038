//! Launch-argument map (pure, no side effects)
//!
//! Ordered `--key value` map plus positional extras. Insertion order is
//! preserved because the target application cares about it when the argument
//! vector is rebuilt for the real entrypoint.

use std::path::PathBuf;

use crate::profile::EnvKind;

const KEY_ACCESS_TOKEN: &str = "accessToken";
const KEY_VERSION: &str = "version";
const KEY_VERSION_TYPE: &str = "versionType";
const KEY_GAME_DIR: &str = "gameDir";
const KEY_ASSETS_DIR: &str = "assetsDir";

#[derive(Clone, Debug, Default)]
pub struct Arguments {
    pairs: Vec<(String, String)>,
    extra: Vec<String>,
}

impl Arguments {
    pub fn parse(raw: &[String]) -> Arguments {
        let mut args = Arguments::default();
        let mut iter = raw.iter().peekable();

        while let Some(token) = iter.next() {
            if let Some(key) = token.strip_prefix("--")
                && let Some(next) = iter.peek()
                && !next.starts_with("--")
            {
                let value = iter.next().map(|v| v.clone()).unwrap_or_default();
                args.put(key, &value);
            } else {
                args.extra.push(token.clone());
            }
        }

        args
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn put(&mut self, key: &str, value: &str) {
        match self.pairs.iter_mut().find(|(k, _)| k == key) {
            Some((_, v)) => *v = value.to_string(),
            None => self.pairs.push((key.to_string(), value.to_string())),
        }
    }

    pub fn put_if_absent(&mut self, key: &str, value: &str) {
        if !self.contains_key(key) {
            self.put(key, value);
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        let idx = self.pairs.iter().position(|(k, _)| k == key)?;
        Some(self.pairs.remove(idx).1)
    }

    pub fn extra_args(&self) -> &[String] {
        &self.extra
    }

    /// Rebuild the token vector: pairs in insertion order, then extras.
    pub fn to_vec(&self) -> Vec<String> {
        let mut out = Vec::with_capacity(self.pairs.len() * 2 + self.extra.len());
        for (key, value) in &self.pairs {
            out.push(format!("--{key}"));
            out.push(value.clone());
        }
        out.extend(self.extra.iter().cloned());
        out
    }

    /// Token vector with any two-token `--accessToken <value>` pair removed,
    /// for display and logging.
    pub fn sanitized_vec(&self) -> Vec<String> {
        let mut out = Vec::new();
        let mut remove = 0usize;

        for token in self.to_vec() {
            if token == "--accessToken" {
                remove = 2;
            }

            if remove > 0 {
                remove -= 1;
                continue;
            }

            out.push(token);
        }

        out
    }
}

/// The directory the game runs in: explicit `gameDir` or the working directory.
pub fn launch_directory(args: &Arguments) -> PathBuf {
    PathBuf::from(args.get(KEY_GAME_DIR).unwrap_or("."))
}

/// Default or strip recognized keys depending on the environment kind.
pub fn process_argument_map(args: &mut Arguments, env_kind: EnvKind, brand: &str) {
    match env_kind {
        EnvKind::Client => {
            args.put_if_absent(KEY_ACCESS_TOKEN, brand);
            args.put_if_absent(KEY_VERSION, brand);

            let prefix = match args.get(KEY_VERSION_TYPE) {
                Some(current) if !current.eq_ignore_ascii_case("release") => {
                    format!("{current}/")
                }
                _ => String::new(),
            };
            args.put(KEY_VERSION_TYPE, &format!("{prefix}{brand}"));

            if !args.contains_key(KEY_GAME_DIR) {
                let dir = launch_directory(args);
                args.put(KEY_GAME_DIR, &dir.display().to_string());
            }
        }
        EnvKind::Server => {
            args.remove(KEY_VERSION);
            args.remove(KEY_GAME_DIR);
            args.remove(KEY_ASSETS_DIR);
        }
    }
}
