//! Configuration file discovery and loading.
//!
//! All configuration files are optional. With none present the built-in
//! defaults apply.

use crate::config::merger::merge_configs;
use crate::config::schema::SvnmigConfig;
use crate::error::{Result, SvnmigError};
use std::fs;
use std::path::{Path, PathBuf};

/// Directory holding project configuration.
pub const CONFIG_DIR: &str = ".svnmig";

/// Paths to configuration files in priority order (later overrides earlier).
///
/// Merge order:
/// 1. User global config (`~/.svnmig/config.yml`)
/// 2. Project config (`.svnmig/config.yml`)
/// 3. Local overrides (`.svnmig/config.local.yml`)
#[derive(Debug, Clone)]
pub struct ConfigPaths {
    /// User's global config: ~/.svnmig/config.yml
    pub user_global: Option<PathBuf>,

    /// Project config: .svnmig/config.yml
    pub project: Option<PathBuf>,

    /// Local overrides: .svnmig/config.local.yml
    pub project_local: Option<PathBuf>,
}

impl ConfigPaths {
    /// Discover config files for the given project root.
    pub fn discover(project_root: &Path) -> Self {
        Self {
            user_global: dirs::home_dir()
                .and_then(|home| existing(home.join(CONFIG_DIR).join("config.yml"))),
            project: existing(project_root.join(CONFIG_DIR).join("config.yml")),
            project_local: existing(project_root.join(CONFIG_DIR).join("config.local.yml")),
        }
    }

    /// Returns all existing config paths in merge order.
    pub fn all_existing(&self) -> Vec<&PathBuf> {
        [&self.user_global, &self.project, &self.project_local]
            .into_iter()
            .flatten()
            .collect()
    }

    /// Check if any project config exists.
    pub fn has_project_config(&self) -> bool {
        self.project.is_some()
    }
}

fn existing(path: PathBuf) -> Option<PathBuf> {
    path.exists().then_some(path)
}

/// Find the project root by walking up from `start`.
///
/// Looks for a `.svnmig` directory first, then a version control
/// directory (`.svn` or `.git`).
pub fn find_project_root(start: &Path) -> Option<PathBuf> {
    let mut current = start.to_path_buf();

    loop {
        if current.join(CONFIG_DIR).is_dir() {
            return Some(current);
        }

        if current.join(".svn").exists() || current.join(".git").exists() {
            return Some(current);
        }

        if !current.pop() {
            return None;
        }
    }
}

/// Load a single config file and parse it into `SvnmigConfig`.
///
/// # Errors
///
/// Returns `ConfigNotFound` if the file doesn't exist.
/// Returns `ConfigParseError` if the YAML is invalid.
pub fn load_config_file(path: &Path) -> Result<SvnmigConfig> {
    let value = load_config_value(path)?;
    parse_value(merge_configs(&[value]), path)
}

/// Parse YAML content into `SvnmigConfig`.
pub fn parse_config(content: &str, source_path: &Path) -> Result<SvnmigConfig> {
    let value: serde_yaml::Value =
        serde_yaml::from_str(content).map_err(|e| SvnmigError::ConfigParseError {
            path: source_path.to_path_buf(),
            message: e.to_string(),
        })?;
    parse_value(merge_configs(&[value]), source_path)
}

/// Load a config file as a raw YAML value, for merging.
pub fn load_config_value(path: &Path) -> Result<serde_yaml::Value> {
    let content = fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            SvnmigError::ConfigNotFound {
                path: path.to_path_buf(),
            }
        } else {
            SvnmigError::Io(e)
        }
    })?;

    serde_yaml::from_str(&content).map_err(|e| SvnmigError::ConfigParseError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

fn parse_value(value: serde_yaml::Value, source_path: &Path) -> Result<SvnmigConfig> {
    serde_yaml::from_value(value).map_err(|e| SvnmigError::ConfigParseError {
        path: source_path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Load and merge every discovered config file for a project.
///
/// Falls back to defaults when no file exists.
pub fn load_merged_config(project_root: &Path) -> Result<SvnmigConfig> {
    let paths = ConfigPaths::discover(project_root);

    let mut configs = Vec::new();
    for path in paths.all_existing() {
        tracing::debug!("Loading config from {}", path.display());
        configs.push(load_config_value(path)?);
    }

    let merged = merge_configs(&configs);
    serde_yaml::from_value(merged).map_err(|e| SvnmigError::ConfigParseError {
        path: project_root.join(CONFIG_DIR).join("config.yml"),
        message: format!("Failed to parse merged config: {}", e),
    })
}

/// Load config with optional path override.
///
/// If `config_override` is provided, loads only that file without merging.
/// Otherwise, discovers and merges all config files.
pub fn load_config(project_root: &Path, config_override: Option<&Path>) -> Result<SvnmigConfig> {
    if let Some(override_path) = config_override {
        load_config_file(override_path)
    } else {
        load_merged_config(project_root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_project(temp: &TempDir, name: &str, content: &str) {
        let dir = temp.path().join(CONFIG_DIR);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(name), content).unwrap();
    }

    #[test]
    fn discover_finds_project_and_local() {
        let temp = TempDir::new().unwrap();
        write_project(&temp, "config.yml", "");
        write_project(&temp, "config.local.yml", "");

        let paths = ConfigPaths::discover(temp.path());
        assert!(paths.has_project_config());
        assert!(paths.project_local.is_some());
    }

    #[test]
    fn discover_returns_none_for_missing_configs() {
        let temp = TempDir::new().unwrap();
        let paths = ConfigPaths::discover(temp.path());
        assert!(paths.project.is_none());
        assert!(paths.project_local.is_none());
        assert!(!paths.has_project_config());
    }

    #[test]
    fn all_existing_puts_local_last() {
        let temp = TempDir::new().unwrap();
        write_project(&temp, "config.yml", "");
        write_project(&temp, "config.local.yml", "");

        let paths = ConfigPaths::discover(temp.path());
        let all = paths.all_existing();
        assert!(all.len() >= 2);
        assert!(all[all.len() - 1].ends_with("config.local.yml"));
    }

    #[test]
    fn find_project_root_finds_config_dir() {
        let temp = TempDir::new().unwrap();
        let subdir = temp.path().join("trunk").join("src");
        fs::create_dir_all(&subdir).unwrap();
        fs::create_dir_all(temp.path().join(CONFIG_DIR)).unwrap();

        assert_eq!(find_project_root(&subdir), Some(temp.path().to_path_buf()));
    }

    #[test]
    fn find_project_root_finds_svn_working_copy() {
        let temp = TempDir::new().unwrap();
        let subdir = temp.path().join("src");
        fs::create_dir_all(&subdir).unwrap();
        fs::create_dir_all(temp.path().join(".svn")).unwrap();

        assert_eq!(find_project_root(&subdir), Some(temp.path().to_path_buf()));
    }

    #[test]
    fn find_project_root_prefers_nearest_config_dir() {
        let temp = TempDir::new().unwrap();
        let subdir = temp.path().join("nested").join("project");
        fs::create_dir_all(&subdir).unwrap();
        fs::create_dir_all(temp.path().join(".git")).unwrap();
        fs::create_dir_all(subdir.join(CONFIG_DIR)).unwrap();

        assert_eq!(find_project_root(&subdir), Some(subdir));
    }

    #[test]
    fn load_config_file_handles_empty_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.yml");
        fs::write(&path, "").unwrap();

        let config = load_config_file(&path).unwrap();
        assert_eq!(config, SvnmigConfig::default());
    }

    #[test]
    fn load_config_file_returns_not_found_error() {
        let result = load_config_file(Path::new("/nonexistent/config.yml"));
        assert!(matches!(result, Err(SvnmigError::ConfigNotFound { .. })));
    }

    #[test]
    fn parse_config_returns_parse_error_for_invalid_yaml() {
        let result = parse_config("invalid: yaml: content: [", Path::new("test.yml"));
        assert!(matches!(result, Err(SvnmigError::ConfigParseError { .. })));
    }

    #[test]
    fn parse_config_rejects_wrong_types() {
        let result = parse_config("verify:\n  timeout_secs: soon\n", Path::new("test.yml"));
        assert!(matches!(result, Err(SvnmigError::ConfigParseError { .. })));
    }

    #[test]
    fn merged_config_without_files_is_default() {
        let temp = TempDir::new().unwrap();
        let config = load_merged_config(temp.path()).unwrap();
        assert_eq!(config.authors, SvnmigConfig::default().authors);
    }

    #[test]
    fn load_merged_config_applies_local_overrides() {
        let temp = TempDir::new().unwrap();
        write_project(
            &temp,
            "config.yml",
            r#"
authors:
  domain: corp.example
  repo: /srv/svn/project
"#,
        );
        write_project(&temp, "config.local.yml", "authors:\n  repo: /home/me/wc\n");

        let config = load_merged_config(temp.path()).unwrap();

        assert_eq!(config.authors.domain, "corp.example");
        assert_eq!(config.authors.repo, PathBuf::from("/home/me/wc"));
        assert_eq!(config.authors.log_command, "svn log --quiet");
    }

    #[test]
    fn load_config_with_override_skips_merge() {
        let temp = TempDir::new().unwrap();
        write_project(&temp, "config.yml", "authors:\n  domain: merged.example\n");
        let override_path = temp.path().join("custom.yml");
        fs::write(&override_path, "authors:\n  output: custom.txt\n").unwrap();

        let config = load_config(temp.path(), Some(&override_path)).unwrap();
        assert_eq!(config.authors.output, PathBuf::from("custom.txt"));
        assert_eq!(config.authors.domain, "foo.com");
    }
}
