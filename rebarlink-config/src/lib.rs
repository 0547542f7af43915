use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

/// 指定配置文件路径的环境变量。
pub const CONFIG_ENV: &str = "REBARLINK_CONFIG";

/// 应用配置的根结构。
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub transfer: TransferConfig,
    /// 消息编号 → 文本，覆盖内置字符串表。
    #[serde(default)]
    pub messages: BTreeMap<String, String>,
    #[serde(default)]
    pub scene: SceneConfig,
}

impl AppConfig {
    /// 从显式路径加载配置。
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// 自动发现配置文件：优先读取环境变量 `REBARLINK_CONFIG`，否则寻找 `./config/default.toml`。
    /// 若文件缺失，则返回默认配置。
    pub fn discover() -> Result<Self, ConfigError> {
        if let Some(path) = env::var_os(CONFIG_ENV) {
            return Self::from_file(PathBuf::from(path));
        }

        let default_path = env::current_dir()
            .map(|dir| dir.join("config").join("default.toml"))
            .map_err(|source| ConfigError::Context {
                message: "获取当前工作目录失败".to_string(),
                source,
            })?;

        if default_path.exists() {
            Self::from_file(default_path)
        } else {
            Ok(Self::default())
        }
    }

    /// 将 `[messages]` 表解析为 (编号, 文本) 列表。
    pub fn message_overrides(&self) -> Result<Vec<(u32, String)>, ConfigError> {
        self.messages
            .iter()
            .map(|(code, text)| {
                code.trim()
                    .parse::<u32>()
                    .map(|code| (code, text.clone()))
                    .map_err(|_| ConfigError::InvalidMessageCode(code.clone()))
            })
            .collect()
    }

    /// 容差与属性 ID 留到触发时校验，这里只检查数值选项。
    fn validate(&self) -> Result<(), ConfigError> {
        let epsilon = self.transfer.point_epsilon;
        if !epsilon.is_finite() || epsilon < 0.0 {
            return Err(ConfigError::Invalid {
                field: "transfer.point_epsilon",
                message: format!("必须是非负有限数，实际为 {epsilon}"),
            });
        }
        self.message_overrides().map(|_| ())
    }
}

/// 日志配置，支持设置默认等级。
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "LoggingConfig::default_level")]
    pub level: String,
}

impl LoggingConfig {
    fn default_level() -> String {
        "info".to_string()
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Self::default_level(),
        }
    }
}

/// 属性传递参数。
#[derive(Debug, Clone, Deserialize)]
pub struct TransferConfig {
    /// 缺省时在触发阶段报告参数未设置。
    #[serde(default)]
    pub tolerance: Option<f64>,
    #[serde(default)]
    pub attribute_ids: Vec<i32>,
    #[serde(default = "TransferConfig::default_point_epsilon")]
    pub point_epsilon: f64,
    #[serde(default = "TransferConfig::default_bounds_prefilter")]
    pub bounds_prefilter: bool,
}

impl TransferConfig {
    fn default_point_epsilon() -> f64 {
        1e-9
    }

    fn default_bounds_prefilter() -> bool {
        true
    }
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            tolerance: None,
            attribute_ids: Vec::new(),
            point_epsilon: Self::default_point_epsilon(),
            bounds_prefilter: Self::default_bounds_prefilter(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SceneConfig {
    /// 控制台宿主加载的场景快照。
    #[serde(default)]
    pub fixture: Option<PathBuf>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("读取配置文件 {path:?} 失败: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("解析配置文件 {path:?} 失败: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("配置项 {field} 无效: {message}")]
    Invalid {
        field: &'static str,
        message: String,
    },
    #[error("消息编号 {0:?} 不是有效的数字")]
    InvalidMessageCode(String),
    #[error("{message}")]
    Context {
        message: String,
        #[source]
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().expect("create temp file");
        writeln!(file, "{content}").unwrap();
        file
    }

    #[test]
    fn defaults_leave_transfer_unconfigured() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.logging.level, "info");
        assert!(cfg.transfer.tolerance.is_none());
        assert!(cfg.transfer.attribute_ids.is_empty());
        assert_eq!(cfg.transfer.point_epsilon, 1e-9);
        assert!(cfg.transfer.bounds_prefilter);
        assert!(cfg.messages.is_empty());
        assert!(cfg.scene.fixture.is_none());
    }

    #[test]
    fn load_from_temp_file() {
        let file = write_config(
            r#"
            [logging]
            level = "debug"

            [transfer]
            tolerance = 0.75
            attribute_ids = [10, 20, 508]
            bounds_prefilter = false

            [messages]
            "9008" = "Fertig"

            [scene]
            fixture = "scenes/slab.json"
            "#,
        );

        let cfg = AppConfig::from_file(file.path()).expect("load config");
        assert_eq!(cfg.logging.level, "debug");
        assert_eq!(cfg.transfer.tolerance, Some(0.75));
        assert_eq!(cfg.transfer.attribute_ids, vec![10, 20, 508]);
        assert_eq!(cfg.transfer.point_epsilon, 1e-9);
        assert!(!cfg.transfer.bounds_prefilter);
        assert_eq!(
            cfg.message_overrides().unwrap(),
            vec![(9008, "Fertig".to_string())]
        );
        assert_eq!(
            cfg.scene.fixture.as_deref(),
            Some(Path::new("scenes/slab.json"))
        );
    }

    #[test]
    fn non_numeric_message_code_is_rejected() {
        let file = write_config(
            r#"
            [messages]
            finished = "Fertig"
            "#,
        );
        let err = AppConfig::from_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidMessageCode(code) if code == "finished"));
    }

    #[test]
    fn negative_epsilon_is_rejected() {
        let file = write_config(
            r#"
            [transfer]
            point_epsilon = -1.0
            "#,
        );
        let err = AppConfig::from_file(file.path()).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                field: "transfer.point_epsilon",
                ..
            }
        ));
    }

    #[test]
    fn missing_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        let err = AppConfig::from_file(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Io { path: p, .. } if p == path));
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let file = write_config("[transfer\ntolerance = ");
        let err = AppConfig::from_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }
}
