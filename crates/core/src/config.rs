use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    #[default]
    Table,
    Json,
}

/// Defaults applied before command-line flags. The tool only ever reads
/// this file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub recursive_default: bool,
    pub suffix_default: bool,
    pub strict_default: bool,
    pub exclude_hidden_default: bool,
    pub output: ReportFormat,
}

#[derive(Debug, Clone)]
pub struct AppPaths {
    pub config_dir: PathBuf,
    pub config_path: PathBuf,
}

pub fn app_paths() -> Result<AppPaths> {
    let proj = ProjectDirs::from("com", "kelly", "numsort")
        .context("OS標準設定ディレクトリを取得できませんでした")?;
    let config_dir = proj.config_dir().to_path_buf();
    Ok(AppPaths {
        config_path: config_dir.join("config.toml"),
        config_dir,
    })
}

pub fn load_config() -> Result<AppConfig> {
    let paths = app_paths()?;
    if !paths.config_path.exists() {
        return Ok(AppConfig::default());
    }
    load_config_from(&paths.config_path)
}

pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("設定ファイルを読めませんでした: {}", path.display()))?;
    let config = toml::from_str::<AppConfig>(&raw)
        .with_context(|| format!("設定ファイルのパースに失敗しました: {}", path.display()))?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_keys_fall_back_to_defaults() {
        let temp = tempdir().expect("tempdir");
        let path = temp.path().join("config.toml");
        fs::write(&path, "suffix_default = true\noutput = \"json\"\n").expect("write config");

        let config = load_config_from(&path).expect("load");
        assert!(config.suffix_default);
        assert!(!config.recursive_default);
        assert_eq!(config.output, ReportFormat::Json);
    }

    #[test]
    fn empty_file_is_all_defaults() {
        let temp = tempdir().expect("tempdir");
        let path = temp.path().join("config.toml");
        fs::write(&path, "").expect("write config");

        assert_eq!(load_config_from(&path).expect("load"), AppConfig::default());
    }

    #[test]
    fn malformed_config_reports_path() {
        let temp = tempdir().expect("tempdir");
        let path = temp.path().join("config.toml");
        fs::write(&path, "recursive_default = \"yes\"").expect("write config");

        let err = load_config_from(&path).expect_err("bad type");
        assert!(err.to_string().contains("設定ファイルのパースに失敗しました"));
    }

    #[test]
    fn unreadable_config_is_an_error() {
        let temp = tempdir().expect("tempdir");
        let err = load_config_from(&temp.path().join("absent.toml")).expect_err("missing file");
        assert!(err.to_string().contains("設定ファイルを読めませんでした"));
    }
}
