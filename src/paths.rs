use std::env;
use std::path::PathBuf;
use std::sync::LazyLock;

pub static PATH_HOME: LazyLock<PathBuf> =
    LazyLock::new(|| PathBuf::from(env::var("HOME").unwrap_or_else(|_| ".".to_string())));

pub static PATH_DATA: LazyLock<PathBuf> = LazyLock::new(|| {
    if let Ok(xdg_data_home) = env::var("XDG_DATA_HOME") {
        return PathBuf::from(xdg_data_home).join("loadstone");
    }
    PATH_HOME.join(".local/share/loadstone")
});

/// Where the default crash reporter drops its report files.
pub static PATH_CRASH_REPORTS: LazyLock<PathBuf> =
    LazyLock::new(|| PATH_DATA.join("crash-reports"));
