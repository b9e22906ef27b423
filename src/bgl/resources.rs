//! Directory receiving the files embedded in type-2 blocks.

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, error, info, warn};

use crate::bgl::types::error::{BglError, Result};

/// Files every Babylon builder embeds; never extracted.
pub const BOILERPLATE_RESOURCES: [&str; 2] = ["C2EEF3F6.html", "8EAF66FD.bmp"];

#[derive(Debug, Clone)]
pub struct ResourceDir {
    path: PathBuf,
}

impl ResourceDir {
    /// Creates the resource directory for the dictionary at `bgl_path`.
    ///
    /// Without an explicit path the first of `<file>_files`, `<file>_files_0`,
    /// `<file>_files_1`, ... that is absent or already a directory is used.
    /// When the directory cannot be created there, `<tmp>/<name>_files` is
    /// used instead.
    pub fn create(bgl_path: &Path, requested: Option<&Path>) -> Result<Self> {
        let path = match requested {
            Some(path) if path.exists() && !path.is_dir() => {
                error!("{} is not a directory", path.display());
                return Self::create_in_temp(bgl_path);
            }
            Some(path) => path.to_path_buf(),
            None => Self::free_candidate(bgl_path),
        };
        if !path.exists() {
            if let Err(e) = fs::create_dir(&path) {
                error!("error while creating resource directory {}: {}", path.display(), e);
                return Self::create_in_temp(bgl_path);
            }
        }
        debug!("Resource directory: {}", path.display());
        Ok(Self { path })
    }

    fn free_candidate(bgl_path: &Path) -> PathBuf {
        let base = bgl_path.as_os_str().to_string_lossy();
        let first = PathBuf::from(format!("{}_files", base));
        std::iter::once(first)
            .chain((0u32..).map(|i| PathBuf::from(format!("{}_files_{}", base, i))))
            .find(|p| !p.exists() || p.is_dir())
            .unwrap_or_else(|| PathBuf::from(format!("{}_files", base)))
    }

    fn create_in_temp(bgl_path: &Path) -> Result<Self> {
        let name = bgl_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let path = std::env::temp_dir().join(format!("{}_files", name));
        if !path.is_dir() {
            fs::create_dir(&path).map_err(|source| BglError::ResourceDir {
                path: path.display().to_string(),
                source,
            })?;
        }
        warn!("using temp resource directory {}", path.display());
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes one embedded file. Returns `false` if the name was rejected;
    /// reporting that is left to the caller.
    pub fn write(&self, name: &str, data: &[u8]) -> Result<bool> {
        if !is_safe_name(name) {
            return Ok(false);
        }
        fs::write(self.path.join(name), data)?;
        debug!("Resource extracted: {} ({} bytes)", name, data.len());
        Ok(true)
    }

    /// Removes the directory if nothing was extracted into it.
    pub fn remove_if_empty(&self) -> bool {
        let empty = fs::read_dir(&self.path)
            .map(|mut entries| entries.next().is_none())
            .unwrap_or(false);
        if !empty {
            return false;
        }
        match fs::remove_dir(&self.path) {
            Ok(()) => {
                info!("Removed empty resource directory {}", self.path.display());
                true
            }
            Err(e) => {
                error!("error removing resource directory {}: {}", self.path.display(), e);
                false
            }
        }
    }
}

fn is_safe_name(name: &str) -> bool {
    !name.is_empty() && name != "." && name != ".." && !name.contains(['/', '\\'])
}
