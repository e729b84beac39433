//! API credentials file.
//!
//! The file is TOML with a single optional key:
//!
//! ```toml
//! api_key = "0123456789abcdef"
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use log::debug;
use serde::Deserialize;

use crate::Error;

pub const APP_NAME: &str = "flickr2kml";
pub const CONFIG_FILE_NAME: &str = "flickr_api_credentials.toml";

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub api_key: Option<String>,
}

/// Location of the credentials file when none is given.
pub fn default_config_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", APP_NAME).map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
}

fn read_config(path: &Path) -> Result<FileConfig, Error> {
    let text = fs::read_to_string(path).map_err(|e| Error::Config {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    toml::from_str(&text).map_err(|e| Error::Config {
        path: path.to_path_buf(),
        reason: e.message().to_string(),
    })
}

/// Loads the credentials file.
///
/// An explicitly given file must exist. The default file is optional.
pub fn load_config(explicit: Option<&Path>) -> Result<FileConfig, Error> {
    if let Some(path) = explicit {
        return read_config(path);
    }
    let Some(path) = default_config_path() else {
        return Ok(FileConfig::default());
    };
    match fs::metadata(&path) {
        Ok(_) => read_config(&path),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!("No config file at {}", path.display());
            Ok(FileConfig::default())
        }
        Err(e) => Err(Error::Config {
            path,
            reason: e.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use speculoos::prelude::*;
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn reads_api_key() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("creds.toml");
        fs::write(&path, "api_key = \"k\"\n").unwrap();
        let config = load_config(Some(&path)).unwrap();
        assert_that!(config).is_equal_to(FileConfig {
            api_key: Some("k".to_string()),
        });
    }

    #[test]
    fn api_secret_is_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("creds.toml");
        fs::write(&path, "api_key = \"k\"\napi_secret = \"s\"\n").unwrap();
        match load_config(Some(&path)) {
            Err(Error::Config { reason, .. }) => assert_that!(reason).contains("api_secret"),
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn keys_are_optional() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("creds.toml");
        fs::write(&path, "").unwrap();
        assert_that!(load_config(Some(&path)).unwrap()).is_equal_to(FileConfig::default());
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let dir = tempdir().unwrap();
        let r = load_config(Some(&dir.path().join("nope.toml")));
        assert!(matches!(r, Err(Error::Config { .. })));
    }

    #[test]
    fn unknown_key_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("creds.toml");
        fs::write(&path, "apikey = \"typo\"\n").unwrap();
        let r = load_config(Some(&path));
        assert!(matches!(r, Err(Error::Config { .. })));
    }
}
