//! Small shared helpers: symbol/entry mapping and scoped env-var mutation.

use std::env;

/// Map a dotted symbolic name to the archive entry holding its compiled form.
pub fn class_entry_name(symbol: &str) -> String {
    format!("{}.class", symbol.replace('.', "/"))
}

/// Scope guard over a process-wide environment variable.
///
/// Saves the prior value on construction and restores it on drop, on every
/// exit path. Used for the bundler redirect key, which must never leak past
/// a capture attempt.
pub struct EnvVarGuard {
    key: String,
    previous: Option<String>,
}

impl EnvVarGuard {
    pub fn set(key: &str, value: &str) -> Self {
        let previous = env::var(key).ok();
        unsafe {
            env::set_var(key, value);
        }
        EnvVarGuard {
            key: key.to_string(),
            previous,
        }
    }
}

impl Drop for EnvVarGuard {
    fn drop(&mut self) {
        unsafe {
            match &self.previous {
                Some(value) => env::set_var(&self.key, value),
                None => env::remove_var(&self.key),
            }
        }
    }
}

#[cfg(test)]
pub mod fixtures {
    use std::fs::File;
    use std::io::Write;
    use std::path::PathBuf;

    use zip::ZipWriter;
    use zip::write::SimpleFileOptions;

    /// Write a throwaway archive module with the given entries, returning its path.
    pub fn write_module(hint: &str, entries: &[(&str, &[u8])]) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("loadstone-test-{}", fastrand::u64(..)));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(format!("{hint}.jar"));

        let mut writer = ZipWriter::new(File::create(&path).unwrap());
        for (name, data) in entries {
            writer
                .start_file(*name, SimpleFileOptions::default())
                .unwrap();
            writer.write_all(data).unwrap();
        }
        writer.finish().unwrap();

        path
    }
}
