//! 配置提供者实现

use async_trait::async_trait;
use config_abstractions::{flatten_value, ConfigProvider};
use infrastructure_common::ConfigError;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// 配置文件格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    /// TOML
    Toml,
    /// YAML
    Yaml,
    /// JSON
    Json,
}

impl FileFormat {
    /// 根据文件扩展名推断格式
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()? {
            "toml" => Some(Self::Toml),
            "yaml" | "yml" => Some(Self::Yaml),
            "json" => Some(Self::Json),
            _ => None,
        }
    }

    /// 解析文件内容为 JSON 值
    fn parse(self, content: &str) -> Result<Value, ConfigError> {
        match self {
            Self::Toml => {
                let value: toml::Value = toml::from_str(content).map_err(ConfigError::parse_error)?;
                Ok(toml_to_json(&value))
            }
            Self::Yaml => serde_yaml::from_str(content).map_err(ConfigError::parse_error),
            Self::Json => Ok(serde_json::from_str(content)?),
        }
    }
}

/// 将 TOML 值转换为 JSON 值
fn toml_to_json(value: &toml::Value) -> Value {
    match value {
        toml::Value::String(s) => Value::String(s.clone()),
        toml::Value::Integer(i) => Value::Number(serde_json::Number::from(*i)),
        toml::Value::Float(f) => serde_json::Number::from_f64(*f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        toml::Value::Boolean(b) => Value::Bool(*b),
        toml::Value::Array(arr) => Value::Array(arr.iter().map(toml_to_json).collect()),
        toml::Value::Table(table) => Value::Object(
            table
                .iter()
                .map(|(k, v)| (k.clone(), toml_to_json(v)))
                .collect(),
        ),
        toml::Value::Datetime(dt) => Value::String(dt.to_string()),
    }
}

/// 文件配置源
#[derive(Debug)]
struct FileSource {
    file_path: PathBuf,
    format: FileFormat,
    values: BTreeMap<String, Value>,
}

impl FileSource {
    fn open(path: &Path, format: FileFormat) -> Result<Self, ConfigError> {
        let mut source = Self {
            file_path: path.to_path_buf(),
            format,
            values: BTreeMap::new(),
        };
        source.load()?;
        Ok(source)
    }

    fn load(&mut self) -> Result<(), ConfigError> {
        debug!("加载 {:?} 配置文件: {}", self.format, self.file_path.display());

        if !self.file_path.exists() {
            return Err(ConfigError::FileNotFound {
                path: self.file_path.display().to_string(),
            });
        }

        let content = std::fs::read_to_string(&self.file_path)?;
        let parsed = self.format.parse(&content)?;

        let mut flattened = Vec::new();
        flatten_value(&parsed, "", &mut flattened);
        self.values = flattened.into_iter().collect();

        debug!("配置文件加载完成，共 {} 个键", self.values.len());
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Value, ConfigError> {
        self.values
            .get(key)
            .cloned()
            .ok_or_else(|| ConfigError::KeyNotFound { key: key.to_string() })
    }
}

macro_rules! file_config_provider {
    ($(#[$meta:meta])* $name:ident, $format:expr, $priority:expr) => {
        $(#[$meta])*
        #[derive(Debug)]
        pub struct $name {
            source: FileSource,
            priority: i32,
        }

        impl $name {
            /// 打开配置文件并立即加载
            pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
                Ok(Self {
                    source: FileSource::open(path.as_ref(), $format)?,
                    priority: $priority,
                })
            }

            /// 设置优先级
            pub fn with_priority(mut self, priority: i32) -> Self {
                self.priority = priority;
                self
            }

            /// 获取文件路径
            pub fn file_path(&self) -> &Path {
                &self.source.file_path
            }
        }

        #[async_trait]
        impl ConfigProvider for $name {
            async fn get_configuration(&self, key: &str) -> Result<Value, ConfigError> {
                self.source.get(key)
            }

            async fn reload(&mut self) -> Result<(), ConfigError> {
                self.source.load()
            }

            async fn contains_key(&self, key: &str) -> Result<bool, ConfigError> {
                Ok(self.source.values.contains_key(key))
            }

            async fn get_all_keys(&self) -> Result<Vec<String>, ConfigError> {
                Ok(self.source.values.keys().cloned().collect())
            }

            fn name(&self) -> &str {
                stringify!($name)
            }

            fn priority(&self) -> i32 {
                self.priority
            }
        }
    };
}

file_config_provider!(
    /// TOML 配置提供者
    TomlConfigProvider,
    FileFormat::Toml,
    100
);

file_config_provider!(
    /// YAML 配置提供者
    YamlConfigProvider,
    FileFormat::Yaml,
    95
);

file_config_provider!(
    /// JSON 配置提供者
    JsonConfigProvider,
    FileFormat::Json,
    90
);

/// 将字符串解析为最贴近的 JSON 值
fn parse_scalar(value: &str) -> Value {
    if let Ok(bool_val) = value.parse::<bool>() {
        Value::Bool(bool_val)
    } else if let Ok(int_val) = value.parse::<i64>() {
        Value::Number(serde_json::Number::from(int_val))
    } else if let Some(number) = value
        .parse::<f64>()
        .ok()
        .and_then(serde_json::Number::from_f64)
    {
        Value::Number(number)
    } else {
        Value::String(value.to_string())
    }
}

/// 环境变量配置提供者
///
/// `APP_MANAGEMENT_PORT` 在前缀为 `APP` 时映射为 `management.port`
#[derive(Debug)]
pub struct EnvironmentConfigProviderImpl {
    prefix: String,
    separator: String,
    priority: i32,
    env_vars: BTreeMap<String, String>,
}

impl EnvironmentConfigProviderImpl {
    /// 创建新的环境变量配置提供者
    pub fn new(prefix: impl Into<String>) -> Result<Self, ConfigError> {
        let mut provider = Self {
            prefix: prefix.into(),
            separator: "_".to_string(),
            priority: 200,
            env_vars: BTreeMap::new(),
        };

        provider.load_env_vars();
        Ok(provider)
    }

    /// 设置分隔符
    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self.load_env_vars();
        self
    }

    /// 设置优先级
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// 环境变量前缀
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    fn load_env_vars(&mut self) {
        debug!("加载环境变量，前缀: {}", self.prefix);

        let qualified = format!("{}{}", self.prefix, self.separator);
        self.env_vars = std::env::vars()
            .filter(|(key, _)| key.starts_with(&qualified))
            .map(|(key, value)| (self.env_key_to_config_key(&key), value))
            .collect();

        debug!("加载了 {} 个环境变量", self.env_vars.len());
    }

    /// 将环境变量键转换为配置键
    fn env_key_to_config_key(&self, env_key: &str) -> String {
        let key = env_key
            .strip_prefix(&self.prefix)
            .unwrap_or(env_key)
            .trim_start_matches(self.separator.as_str());

        key.replace(&self.separator, ".").to_lowercase()
    }
}

#[async_trait]
impl ConfigProvider for EnvironmentConfigProviderImpl {
    async fn get_configuration(&self, key: &str) -> Result<Value, ConfigError> {
        self.env_vars
            .get(key)
            .map(|value| parse_scalar(value))
            .ok_or_else(|| ConfigError::KeyNotFound { key: key.to_string() })
    }

    async fn reload(&mut self) -> Result<(), ConfigError> {
        self.load_env_vars();
        Ok(())
    }

    async fn contains_key(&self, key: &str) -> Result<bool, ConfigError> {
        Ok(self.env_vars.contains_key(key))
    }

    async fn get_all_keys(&self) -> Result<Vec<String>, ConfigError> {
        Ok(self.env_vars.keys().cloned().collect())
    }

    fn name(&self) -> &str {
        "EnvironmentConfigProvider"
    }

    fn priority(&self) -> i32 {
        self.priority
    }
}

/// 内存配置提供者
///
/// 用于内联属性与测试属性覆盖，默认优先级高于所有外部来源
#[derive(Debug, Clone)]
pub struct MapConfigProvider {
    name: String,
    priority: i32,
    values: BTreeMap<String, Value>,
}

impl MapConfigProvider {
    /// 创建新的内存配置提供者
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            priority: 300,
            values: BTreeMap::new(),
        }
    }

    /// 添加字符串属性
    pub fn with_property(mut self, key: impl Into<String>, value: impl AsRef<str>) -> Self {
        self.insert(key, value);
        self
    }

    /// 添加任意 JSON 值
    pub fn with_value(mut self, key: impl Into<String>, value: Value) -> Self {
        self.values.insert(key.into(), value);
        self
    }

    /// 插入字符串属性
    pub fn insert(&mut self, key: impl Into<String>, value: impl AsRef<str>) {
        self.values.insert(key.into(), parse_scalar(value.as_ref()));
    }

    /// 解析 `key=value` 形式的属性
    pub fn parse_pair(&mut self, pair: &str) -> Result<(), ConfigError> {
        let (key, value) = pair
            .split_once('=')
            .ok_or_else(|| ConfigError::TypeConversionError {
                message: format!("属性格式应为 key=value: {}", pair),
            })?;
        self.insert(key.trim(), value.trim());
        Ok(())
    }

    /// 设置优先级
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// 属性数量
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[async_trait]
impl ConfigProvider for MapConfigProvider {
    async fn get_configuration(&self, key: &str) -> Result<Value, ConfigError> {
        self.values
            .get(key)
            .cloned()
            .ok_or_else(|| ConfigError::KeyNotFound { key: key.to_string() })
    }

    async fn reload(&mut self) -> Result<(), ConfigError> {
        Ok(())
    }

    async fn contains_key(&self, key: &str) -> Result<bool, ConfigError> {
        Ok(self.values.contains_key(key))
    }

    async fn get_all_keys(&self) -> Result<Vec<String>, ConfigError> {
        Ok(self.values.keys().cloned().collect())
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn priority(&self) -> i32 {
        self.priority
    }
}
