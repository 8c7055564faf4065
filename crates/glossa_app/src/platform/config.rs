//! Reading and writing the client configuration file.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use engine_logging::{engine_info, engine_warn};
use glossa_core::ClientConfig;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigFileError {
    #[error("cannot read {path:?}: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("cannot parse {path:?}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("cannot write {path:?}: {source}")]
    Write { path: PathBuf, source: io::Error },
    #[error("{path:?} already exists; pass --force to replace it")]
    Exists { path: PathBuf },
}

/// Loads the configuration. A missing file yields the defaults; a file that
/// exists but does not parse is an error rather than silently ignored.
pub fn load_config(path: &Path) -> Result<ClientConfig, ConfigFileError> {
    let content = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            engine_info!("no configuration at {:?}, using defaults", path);
            return Ok(ClientConfig::default());
        }
        Err(source) => {
            return Err(ConfigFileError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    let config: ClientConfig =
        serde_json::from_str(&content).map_err(|source| ConfigFileError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
    if config.platform.is_none() {
        engine_warn!("configuration {:?} names no platform", path);
    }
    engine_info!("loaded configuration from {:?}", path);
    Ok(config)
}

/// Writes `config` as pretty JSON through a temp file in the same directory,
/// so a crash never leaves a half-written file behind.
pub fn save_config(
    path: &Path,
    config: &ClientConfig,
    overwrite: bool,
) -> Result<(), ConfigFileError> {
    if !overwrite && path.exists() {
        return Err(ConfigFileError::Exists {
            path: path.to_path_buf(),
        });
    }
    let write_err = |source: io::Error| ConfigFileError::Write {
        path: path.to_path_buf(),
        source,
    };

    let mut content = serde_json::to_string_pretty(config)
        .map_err(io::Error::from)
        .map_err(write_err)?;
    content.push('\n');

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir).map_err(write_err)?;
    let mut temp = tempfile::NamedTempFile::new_in(dir).map_err(write_err)?;
    temp.write_all(content.as_bytes()).map_err(write_err)?;
    temp.as_file().sync_all().map_err(write_err)?;
    temp.persist(path).map_err(|err| write_err(err.error))?;

    engine_info!("wrote configuration to {:?}", path);
    Ok(())
}

/// Starting point written by `glossa config init`.
pub fn template() -> ClientConfig {
    ClientConfig {
        platform: Some("openai".to_string()),
        model: Some("gpt-4o-mini".to_string()),
        ..ClientConfig::default()
    }
}
