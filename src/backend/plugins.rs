//! Process-wide plugin discovery and the platform registry.
//!
//! The engine's compute platforms ship as dynamic-library plugins. Discovery
//! locates the plugin directory (environment variable, then build-time
//! directory, then the default install location — first directory containing
//! at least one plugin wins) and runs at most once per process behind a
//! run-once gate. Platform adapters make themselves selectable by calling
//! [`register_platform`]; the built-in reference platform registers itself
//! the first time discovery succeeds.
//!
//! The first [`ensure_loaded`] call is not re-entrant-safe: in a multi-rank
//! host process, callers must serialize the first initialization.

use std::env;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock};

use log::info;

use super::reference::ReferencePlatform;
use super::Platform;
use crate::error::Error;
use std::sync::Arc;

/// Environment variable naming the plugin directory; checked first.
pub const PLUGIN_DIR_ENV: &str = "MDBRIDGE_PLUGIN_DIR";

/// Default plugin install location, used when neither the environment
/// variable nor the build-time directory yields plugins.
pub const DEFAULT_PLUGIN_DIR: &str = "/usr/local/lib/mdbridge/plugins";

/// Result of a successful discovery pass.
#[derive(Debug, Clone)]
pub struct PluginInventory {
    /// The directory that won the search.
    pub directory: PathBuf,
    /// File names of the plugins found there.
    pub plugins: Vec<String>,
}

static INVENTORY: OnceLock<PluginInventory> = OnceLock::new();

fn registry() -> &'static Mutex<Vec<Arc<dyn Platform>>> {
    static REGISTRY: OnceLock<Mutex<Vec<Arc<dyn Platform>>>> = OnceLock::new();
    REGISTRY.get_or_init(|| Mutex::new(Vec::new()))
}

/// Makes a platform adapter selectable by name.
///
/// Registration is idempotent per name: a platform whose name is already
/// present (case-insensitive) is ignored.
pub fn register_platform(platform: Arc<dyn Platform>) {
    let mut platforms = registry().lock().expect("platform registry poisoned");
    if !platforms
        .iter()
        .any(|p| p.name().eq_ignore_ascii_case(platform.name()))
    {
        platforms.push(platform);
    }
}

/// All currently registered platforms, in registration order.
pub fn platforms() -> Vec<Arc<dyn Platform>> {
    registry()
        .lock()
        .expect("platform registry poisoned")
        .clone()
}

/// Runs plugin discovery once per process and returns the inventory.
///
/// Subsequent calls return the cached inventory without touching the
/// filesystem. Fails with [`Error::BackendUnavailable`] when no candidate
/// directory contains plugins; the gate stays unset in that case, so a later
/// call retries after the environment is fixed.
pub fn ensure_loaded() -> Result<&'static PluginInventory, Error> {
    if let Some(inventory) = INVENTORY.get() {
        return Ok(inventory);
    }

    let inventory = discover()?;
    info!(
        "loaded {} backend plugin(s) from {}: {}",
        inventory.plugins.len(),
        inventory.directory.display(),
        inventory.plugins.join(", ")
    );
    register_platform(Arc::new(ReferencePlatform::new()));
    Ok(INVENTORY.get_or_init(|| inventory))
}

fn discover() -> Result<PluginInventory, Error> {
    discover_in(
        env::var(PLUGIN_DIR_ENV).ok().as_deref(),
        option_env!("MDBRIDGE_PLUGIN_DIR"),
        Path::new(DEFAULT_PLUGIN_DIR),
    )
}

/// Directory search, in priority order. Split out from [`discover`] so the
/// candidate sources can be supplied directly.
fn discover_in(
    env_dir: Option<&str>,
    build_dir: Option<&str>,
    default_dir: &Path,
) -> Result<PluginInventory, Error> {
    // An explicitly named directory that contains no plugins is an
    // installation problem in its own right, not a fallthrough case.
    if let Some(dir) = env_dir.map(str::trim).filter(|d| !d.is_empty()) {
        let plugins = scan_directory(Path::new(dir));
        if plugins.is_empty() {
            return Err(Error::BackendUnavailable(format!(
                "the directory named in {PLUGIN_DIR_ENV} ({dir}) contains no backend plugins; \
                 check the backend installation"
            )));
        }
        return Ok(PluginInventory {
            directory: PathBuf::from(dir),
            plugins,
        });
    }

    if let Some(dir) = build_dir {
        let plugins = scan_directory(Path::new(dir));
        if !plugins.is_empty() {
            return Ok(PluginInventory {
                directory: PathBuf::from(dir),
                plugins,
            });
        }
    }

    let plugins = scan_directory(default_dir);
    if !plugins.is_empty() {
        return Ok(PluginInventory {
            directory: default_dir.to_path_buf(),
            plugins,
        });
    }

    Err(Error::BackendUnavailable(format!(
        "no backend plugins were found; set {PLUGIN_DIR_ENV} to the plugin directory"
    )))
}

/// Dynamic-library files directly inside `dir`, sorted by name.
fn scan_directory(dir: &Path) -> Vec<String> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };

    let mut plugins: Vec<String> = entries
        .flatten()
        .filter(|entry| entry.path().is_file())
        .filter_map(|entry| {
            let path = entry.path();
            let is_plugin = path
                .extension()
                .is_some_and(|ext| ext == env::consts::DLL_EXTENSION);
            if is_plugin {
                path.file_name().map(|n| n.to_string_lossy().into_owned())
            } else {
                None
            }
        })
        .collect();
    plugins.sort();
    plugins
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn scratch_dir(label: &str) -> PathBuf {
        let dir = env::temp_dir().join(format!(
            "mdbridge-plugins-{}-{}",
            label,
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn fake_plugin(dir: &Path, stem: &str) {
        let name = format!("{stem}.{}", env::consts::DLL_EXTENSION);
        fs::write(dir.join(name), b"").unwrap();
    }

    #[test]
    fn env_directory_wins_over_later_candidates() {
        let env_dir = scratch_dir("env");
        let build_dir = scratch_dir("build");
        fake_plugin(&env_dir, "mdbridge_cuda");
        fake_plugin(&build_dir, "mdbridge_opencl");

        let inventory = discover_in(
            Some(env_dir.to_str().unwrap()),
            Some(build_dir.to_str().unwrap()),
            Path::new("/nonexistent"),
        )
        .unwrap();
        assert_eq!(inventory.directory, env_dir);
        assert_eq!(inventory.plugins.len(), 1);
        assert!(inventory.plugins[0].starts_with("mdbridge_cuda"));
    }

    #[test]
    fn empty_env_directory_is_fatal_not_fallthrough() {
        let env_dir = scratch_dir("empty-env");
        let build_dir = scratch_dir("build-fallback");
        fake_plugin(&build_dir, "mdbridge_cuda");

        let err = discover_in(
            Some(env_dir.to_str().unwrap()),
            Some(build_dir.to_str().unwrap()),
            Path::new("/nonexistent"),
        )
        .unwrap_err();
        assert!(matches!(err, Error::BackendUnavailable(_)));
        assert!(err.to_string().contains(PLUGIN_DIR_ENV));
    }

    #[test]
    fn build_directory_used_when_env_unset() {
        let build_dir = scratch_dir("build-only");
        fake_plugin(&build_dir, "mdbridge_cuda");

        let inventory = discover_in(
            None,
            Some(build_dir.to_str().unwrap()),
            Path::new("/nonexistent"),
        )
        .unwrap();
        assert_eq!(inventory.directory, build_dir);
    }

    #[test]
    fn no_plugins_anywhere_is_backend_unavailable() {
        let empty = scratch_dir("all-empty");
        let err = discover_in(None, None, &empty).unwrap_err();
        assert!(matches!(err, Error::BackendUnavailable(_)));
    }

    #[test]
    fn scan_ignores_non_library_files() {
        let dir = scratch_dir("mixed");
        fake_plugin(&dir, "mdbridge_cuda");
        fs::write(dir.join("README.txt"), b"not a plugin").unwrap();
        let plugins = scan_directory(&dir);
        assert_eq!(plugins.len(), 1);
    }

    #[test]
    fn registration_is_idempotent_per_name() {
        register_platform(Arc::new(ReferencePlatform::new()));
        register_platform(Arc::new(ReferencePlatform::new()));
        let count = platforms()
            .iter()
            .filter(|p| p.name().eq_ignore_ascii_case("Reference"))
            .count();
        assert_eq!(count, 1);
    }
}
