use std::{
    env, fs,
    path::{Path, PathBuf},
};

use log::debug;
use serde::{Deserialize, Serialize};

use crate::{
    API_BASE_ENV,
    error::{Error, Result},
    request::OperationKind,
};

pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
const CONFIG_FILE_NAME: &str = "gemini_ops.ron";

/// Optional settings, read from `gemini_ops.ron` in the local config dir. Every field has a
/// default, so a partial file is fine and a missing one is the common case.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub api_base: String,
    pub timeout_secs: u64,
    pub models: Models,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Models {
    pub generate: String,
    pub image: String,
    pub upscale: String,
    pub edit: String,
    pub svg: String,
    pub segment: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.into(),
            timeout_secs: 60 * 3,
            models: Models::default(),
        }
    }
}

impl Default for Models {
    fn default() -> Self {
        Self {
            generate: "gemini-3-pro-preview".into(),
            image: "imagen-4.0-generate-001".into(),
            upscale: "imagen-4.0-upscale-preview".into(),
            edit: "imagen-3.0-capability-001".into(),
            svg: "gemini-3-pro-preview".into(),
            segment: "gemini-2.5-flash".into(),
        }
    }
}

impl Models {
    pub fn for_kind(&self, kind: OperationKind) -> &str {
        match kind {
            OperationKind::Generate => &self.generate,
            OperationKind::Image => &self.image,
            OperationKind::Upscale => &self.upscale,
            OperationKind::Edit => &self.edit,
            OperationKind::Svg => &self.svg,
            OperationKind::Segment => &self.segment,
        }
    }
}

impl Config {
    pub fn path() -> Option<PathBuf> {
        dirs::config_local_dir().map(|dir| dir.join(CONFIG_FILE_NAME))
    }

    /// Config file (if any) plus environment overrides.
    pub fn load() -> Result<Self> {
        let mut config = match Self::path() {
            Some(path) if path.exists() => Self::load_file(&path)?,
            _ => Self::default(),
        };

        if let Ok(base) = env::var(API_BASE_ENV) {
            let base = base.trim().trim_end_matches('/');
            if !base.is_empty() {
                config.api_base = base.to_string();
            }
        }

        debug!("Config: {config:#?}");
        Ok(config)
    }

    pub fn load_file(path: &Path) -> Result<Self> {
        let src = fs::read_to_string(path).map_err(|e| Error::io("read", path, e))?;
        ron::from_str(&src).map_err(|e| Error::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }
}

#[cfg(test)]
mod test {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;

    #[test]
    fn partial_file_keeps_defaults() -> Result<()> {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"(timeout_secs: 30, models: (image: "imagen-4.0-ultra-generate-001"))"#)
            .unwrap();

        let config = Config::load_file(file.path())?;
        assert_eq!(config.timeout_secs, 30);
        assert_eq!(config.api_base, DEFAULT_API_BASE);
        assert_eq!(config.models.image, "imagen-4.0-ultra-generate-001");
        assert_eq!(config.models.generate, Models::default().generate);
        Ok(())
    }

    #[test]
    fn malformed_file_is_a_config_error() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "(timeout_secs: \"soon\")").unwrap();

        let err = Config::load_file(file.path()).unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[test]
    fn models_by_kind() {
        let models = Models::default();
        assert_eq!(models.for_kind(OperationKind::Segment), "gemini-2.5-flash");
        assert_eq!(models.for_kind(OperationKind::Edit), "imagen-3.0-capability-001");
    }
}
