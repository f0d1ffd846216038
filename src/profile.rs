//! Target application profile
//!
//! Everything the engine knows about the application it bootstraps lives
//! here as data: entrypoint symbol lists, archive markers used for role
//! classification, the bundler handoff surface, and the namespace prefixes
//! that stay restricted while transformation runs.

use std::fmt;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum EnvKind {
    Client,
    Server,
}

impl EnvKind {
    pub fn parse(s: &str) -> Option<EnvKind> {
        match s {
            "client" => Some(EnvKind::Client),
            "server" => Some(EnvKind::Server),
            _ => None,
        }
    }
}

impl fmt::Display for EnvKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnvKind::Client => write!(f, "client"),
            EnvKind::Server => write!(f, "server"),
        }
    }
}

#[derive(Clone, Debug)]
pub struct GameProfile {
    pub game_id: String,
    pub game_name: String,
    /// Brand written into defaulted client arguments (`version`, `versionType`).
    pub brand: String,

    pub client_entrypoints: Vec<String>,
    pub server_entrypoints: Vec<String>,

    /// Entry symbol of the self-extracting launcher, when the distribution
    /// ships one instead of a directly loadable module.
    pub bundler_entrypoint: String,
    /// Process-wide key the bundler reads to decide which main class to hand
    /// control to. Owned by the bundler; we only redirect it under a guard.
    pub bundler_redirect_key: String,
    /// Symbol of our capture shim, installed under the redirect key.
    pub capture_shim: String,

    /// Marker entry identifying the optional extension module.
    pub extension_marker: String,
    /// Marker entry identifying the logging-API module.
    pub logging_api_marker: String,
    /// Marker entries identifying a logging-implementation module.
    pub logging_impl_markers: Vec<String>,
    /// Marker entry of the legacy third-party loader some old distributions carry.
    pub legacy_loader_marker: String,

    /// Namespace prefixes kept restricted while the primary module is exposed
    /// early for logging.
    pub restricted_prefixes: Vec<String>,

    /// Standalone adapter substituted for applet-flavored client entrypoints.
    pub applet_adapter: String,
    /// Symbol of the logging handler resolved in the host or target context.
    pub log_handler: String,
}

impl GameProfile {
    pub fn entrypoints(&self, env_kind: EnvKind) -> &[String] {
        match env_kind {
            EnvKind::Client => &self.client_entrypoints,
            EnvKind::Server => &self.server_entrypoints,
        }
    }
}

impl Default for GameProfile {
    fn default() -> Self {
        let owned = |items: &[&str]| items.iter().map(|s| s.to_string()).collect::<Vec<_>>();

        GameProfile {
            game_id: "minecraft".to_string(),
            game_name: "Minecraft".to_string(),
            brand: "Loadstone".to_string(),

            client_entrypoints: owned(&[
                "net.minecraft.client.main.Main",
                "net.minecraft.client.MinecraftApplet",
                "com.mojang.minecraft.MinecraftApplet",
            ]),
            server_entrypoints: owned(&[
                "net.minecraft.server.Main",
                "net.minecraft.server.MinecraftServer",
                "com.mojang.minecraft.server.MinecraftServer",
            ]),

            bundler_entrypoint: "net.minecraft.bundler.Main".to_string(),
            bundler_redirect_key: "bundlerMainClass".to_string(),
            capture_shim: "loadstone.bundler.ClasspathCapture".to_string(),

            extension_marker: "realmsVersion".to_string(),
            logging_api_marker: "org/apache/logging/log4j/LogManager.class".to_string(),
            logging_impl_markers: owned(&[
                "META-INF/services/org.apache.logging.log4j.spi.Provider",
                "META-INF/log4j-provider.properties",
            ]),
            legacy_loader_marker: "ModLoader.class".to_string(),

            restricted_prefixes: owned(&["net.minecraft.", "com.mojang."]),

            applet_adapter: "loadstone.applet.AppletMain".to_string(),
            log_handler: "loadstone.logging.Log4jLogHandler".to_string(),
        }
    }
}

/// External policy constants that are configuration, not engine logic.
#[derive(Clone, Debug)]
pub struct RuntimePolicy {
    /// Offset subtracted from a module's class-format version to obtain the
    /// minimum language-runtime version it depends on. The mapping comes from
    /// an external version table, so embedders can override it.
    pub class_format_offset: u32,
}

impl Default for RuntimePolicy {
    fn default() -> Self {
        RuntimePolicy {
            class_format_offset: 44,
        }
    }
}
