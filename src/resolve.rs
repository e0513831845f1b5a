//! Locating the dictionary file at startup.
//!
//! Kept apart from the lookup service so that it stays free of filesystem
//! and platform concerns.

use crate::error::{Result, WordCardError};
use directories_next::ProjectDirs;
use log::{debug, info, warn};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// File name searched for in every candidate location.
pub const DB_FILENAME: &str = "dictionary.db";
/// Subdirectory name within the user's data directory
pub const APP_SUBDIR: &str = "wordcard";
/// Environment variable overriding the bundled resource location.
pub const BUNDLED_DB_ENV: &str = "WORDCARD_BUNDLED_DB";
const BUNDLED_RESOURCE_DIR: &str = "resources";

/// Where to look for the dictionary.
#[derive(Debug, Clone)]
pub struct ResolveOptions {
    /// Directory the application runs from.
    pub app_dir: PathBuf,
    /// Read-only copy shipped with the application, if any.
    pub bundled_resource: Option<PathBuf>,
    /// Writable per-user data directory receiving the bundled copy.
    pub data_dir: PathBuf,
}

impl ResolveOptions {
    /// Builds the options for the running executable.
    ///
    /// The bundled resource defaults to `<app-dir>/resources/dictionary.db`
    /// unless `WORDCARD_BUNDLED_DB` points elsewhere.
    pub fn from_environment() -> Result<Self> {
        let exe = env::current_exe()?;
        let app_dir = exe
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        let bundled_resource = match env::var_os(BUNDLED_DB_ENV) {
            Some(path) => PathBuf::from(path),
            None => app_dir.join(BUNDLED_RESOURCE_DIR).join(DB_FILENAME),
        };
        Ok(ResolveOptions {
            app_dir,
            bundled_resource: Some(bundled_resource),
            data_dir: get_data_dir()?,
        })
    }
}

/// Gets the per-user data directory path. Does not create it.
fn get_data_dir() -> Result<PathBuf> {
    let proj_dirs =
        ProjectDirs::from("org", "WordCard", APP_SUBDIR).ok_or(WordCardError::DataDirNotFound)?;
    Ok(proj_dirs.data_dir().to_path_buf())
}

/// Picks the dictionary file to open.
///
/// 1. `<app-dir>/dictionary.db` when it exists.
/// 2. Otherwise the bundled resource, copied into `<data-dir>/dictionary.db`
///    first. An existing copy is left untouched.
/// 3. Otherwise `DatabaseNotFound`.
pub fn resolve_database_path(options: &ResolveOptions) -> Result<PathBuf> {
    let app_path = options.app_dir.join(DB_FILENAME);
    if app_path.exists() {
        info!("Using dictionary next to the application: {:?}", app_path);
        return Ok(app_path);
    }
    debug!("No dictionary at {:?}", app_path);

    if let Some(bundled) = options.bundled_resource.as_deref().filter(|p| p.exists()) {
        let target = options.data_dir.join(DB_FILENAME);
        if target.exists() {
            warn!(
                "{:?} already exists, not overwriting it with the bundled copy",
                target
            );
        } else {
            fs::create_dir_all(&options.data_dir)?;
            fs::copy(bundled, &target)?;
            info!("Copied bundled dictionary {:?} to {:?}", bundled, target);
        }
        return Ok(target);
    }

    Err(WordCardError::DatabaseNotFound)
}
