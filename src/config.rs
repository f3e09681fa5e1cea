use std::{env, path::PathBuf};

use color_eyre::Result;
use directories::{BaseDirs, ProjectDirs};
use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};

use crate::core::models::SortSpec;
use crate::core::state::FilterState;
use crate::core::types::{Operator, OperatorOption, SearchField, SortOrder};

const CONFIG: &str = include_str!("../.config/config.json5");

/// Page size used when nothing else is configured
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Engine behaviour settings
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSettings {
    #[serde(default = "default_page_size")]
    pub default_page_size: usize,
    #[serde(default)]
    pub panel_open: bool,
    #[serde(default)]
    pub sort_by: Option<String>,
    #[serde(default)]
    pub sort_order: SortOrder,
}

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

impl Default for FilterSettings {
    fn default() -> Self {
        Self {
            default_page_size: DEFAULT_PAGE_SIZE,
            panel_open: false,
            sort_by: None,
            sort_order: SortOrder::default(),
        }
    }
}

impl FilterSettings {
    /// Configured page size, never zero
    pub fn page_size(&self) -> usize {
        if self.default_page_size == 0 {
            DEFAULT_PAGE_SIZE
        } else {
            self.default_page_size
        }
    }

    pub fn sort(&self) -> Option<SortSpec> {
        self.sort_by
            .as_ref()
            .filter(|field| !field.trim().is_empty())
            .map(|field| SortSpec::new(field.clone(), self.sort_order))
    }
}

/// Field and operator catalogs offered to condition rows
#[derive(Clone, Debug, Default, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub fields: Vec<SearchField>,
    #[serde(default)]
    pub operators: Vec<OperatorOption>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub config_dir: PathBuf,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default, flatten)]
    pub config: AppConfig,
    #[serde(default)]
    pub filter: FilterSettings,
    #[serde(default)]
    pub catalog: Catalog,
}

lazy_static! {
    pub static ref PROJECT_NAME: String = env!("CARGO_CRATE_NAME").to_uppercase().to_string();
    pub static ref CONFIG_FOLDER: Option<PathBuf> =
        env::var(format!("{}_CONFIG", PROJECT_NAME.clone()))
            .ok()
            .map(PathBuf::from);
}

impl Config {
    /// Load settings.
    ///
    /// Sources, later ones winning: the embedded defaults, the user file
    /// (`config_path` if given, else `<config dir>/config.json5` when present),
    /// then `ADVFILTER_*` environment variables such as
    /// `ADVFILTER_FILTER__DEFAULT_PAGE_SIZE`.
    pub fn from_path(config_path: Option<&PathBuf>) -> Result<Self, config::ConfigError> {
        let config_dir = get_config_dir();
        let mut builder = config::Config::builder()
            .add_source(config::File::from_str(CONFIG, config::FileFormat::Json5))
            .set_default("config_dir", config_dir.to_string_lossy().to_string())?;

        builder = match config_path {
            Some(p) => builder.add_source(
                config::File::from(expand_tilde(p))
                    .format(config::FileFormat::Json5)
                    .required(true),
            ),
            None => builder.add_source(
                config::File::from(config_dir.join("config.json5"))
                    .format(config::FileFormat::Json5)
                    .required(false),
            ),
        };

        builder = builder.add_source(
            config::Environment::with_prefix(&PROJECT_NAME)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let mut cfg: Self = builder.build()?.try_deserialize()?;
        if cfg.catalog.operators.is_empty() {
            cfg.catalog.operators = Operator::catalog();
        }
        Ok(cfg)
    }

    /// Embedded defaults only, ignoring user files and the environment
    pub fn embedded() -> Result<Self> {
        let mut cfg: Self = json5::from_str(CONFIG)?;
        if cfg.catalog.operators.is_empty() {
            cfg.catalog.operators = Operator::catalog();
        }
        Ok(cfg)
    }

    /// A fresh condition tree seeded from the configured catalogs
    pub fn new_filter_state(&self) -> FilterState {
        FilterState::new(self.catalog.fields.clone(), self.catalog.operators.clone())
    }
}

fn expand_tilde(path: &PathBuf) -> PathBuf {
    if let Some(s) = path.to_str() {
        if s.starts_with('~') {
            if let Some(base) = BaseDirs::new() {
                return PathBuf::from(s.replacen('~', base.home_dir().to_str().unwrap_or(""), 1));
            }
        }
    }
    path.clone()
}

fn project_directory() -> Option<ProjectDirs> {
    ProjectDirs::from("", "", env!("CARGO_PKG_NAME"))
}

pub fn get_config_dir() -> PathBuf {
    if let Some(s) = CONFIG_FOLDER.clone() {
        s
    } else if let Some(proj_dirs) = project_directory() {
        proj_dirs.config_local_dir().to_path_buf()
    } else {
        PathBuf::from(".").join(".config")
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::core::types::FieldType;

    #[test]
    fn test_embedded_defaults() {
        let cfg = Config::embedded().unwrap();
        assert_eq!(cfg.filter, FilterSettings::default());
        assert_eq!(cfg.catalog.operators, Operator::catalog());
        assert_eq!(cfg.catalog.fields[0].value, "name");

        let status = cfg
            .catalog
            .fields
            .iter()
            .find(|f| f.value == "status")
            .unwrap();
        assert_eq!(status.field_type, FieldType::Select);
        assert!(!status.accepts_custom_input());
    }

    #[test]
    fn test_user_file_overrides_defaults() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.json5");
        std::fs::write(
            &path,
            r#"{
                // trimmed catalog for the roster screen
                "filter": { "default_page_size": 25, "sort_by": "name", "sort_order": "desc" },
                "catalog": { "fields": [ { "value": "shift", "label": "Shift", "type": "input" } ] },
            }"#,
        )
        .unwrap();

        let cfg = Config::from_path(Some(&path)).unwrap();
        assert_eq!(cfg.filter.default_page_size, 25);
        assert_eq!(cfg.filter.sort(), Some(SortSpec::new("name", SortOrder::Desc)));
        assert_eq!(cfg.catalog.fields.len(), 1);
        assert_eq!(cfg.catalog.operators.len(), 6);

        let state = cfg.new_filter_state();
        assert_eq!(state.groups()[0].conditions[0].field, "shift");
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("nope.json5");
        assert!(Config::from_path(Some(&path)).is_err());
    }

    #[test]
    fn test_zero_page_size_falls_back() {
        let settings = FilterSettings {
            default_page_size: 0,
            ..FilterSettings::default()
        };
        assert_eq!(settings.page_size(), DEFAULT_PAGE_SIZE);
        assert_eq!(settings.sort(), None);
    }
}
