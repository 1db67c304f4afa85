//! 标准环境实现
//!
//! 将多个配置提供者合并为一个只读的属性快照

use config_abstractions::{render_value, ConfigProvider, PropertyResolver};
use infrastructure_common::{ConfigError, ConfigSection};
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::str::FromStr;
use tracing::{debug, info};

/// 激活 profile 的属性名
pub const ACTIVE_PROFILES_PROPERTY: &str = "profiles.active";

/// 标准环境
///
/// 属性快照在加载完成后不再变化，可以在多个线程间共享读取
#[derive(Debug, Clone, Default)]
pub struct StandardEnvironment {
    /// 原始配置值
    values: BTreeMap<String, Value>,
    /// 渲染后的属性字符串
    properties: BTreeMap<String, String>,
    /// 每个属性来自哪个提供者
    origins: BTreeMap<String, String>,
    /// 激活的 profile
    active_profiles: Vec<String>,
}

impl StandardEnvironment {
    /// 创建环境构建器
    pub fn builder() -> EnvironmentBuilder {
        EnvironmentBuilder::new()
    }

    /// 从配置提供者加载环境
    pub async fn load(providers: Vec<Box<dyn ConfigProvider>>) -> Result<Self, ConfigError> {
        let mut builder = EnvironmentBuilder::new();
        for provider in providers {
            builder = builder.add_provider(provider);
        }
        builder.build().await
    }

    /// 获取属性，不存在时返回默认值
    pub fn get_property_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.get_property(key).unwrap_or(default)
    }

    /// 获取并解析属性
    pub fn get_typed<T>(&self, key: &str) -> Result<Option<T>, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        self.get_property(key)
            .map(|raw| {
                raw.parse::<T>().map_err(|e| ConfigError::TypeConversionError {
                    message: format!("属性 {} = {:?} 无法转换为 {}: {}", key, raw, std::any::type_name::<T>(), e),
                })
            })
            .transpose()
    }

    /// 获取原始配置值
    pub fn get_value(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// 属性来自哪个提供者
    pub fn property_origin(&self, key: &str) -> Option<&str> {
        self.origins.get(key).map(String::as_str)
    }

    /// 获取指定前缀下的配置节
    pub fn get_section(&self, prefix: &str) -> ConfigSection {
        let section_prefix = format!("{}.", prefix);
        let mut section = ConfigSection::new();
        for (key, value) in &self.values {
            if let Some(sub_key) = key.strip_prefix(&section_prefix) {
                section.insert(sub_key, value.clone());
            }
        }
        section
    }

    /// 将指定前缀下的配置绑定到具体类型
    pub fn bind<T>(&self, prefix: &str) -> Result<T, ConfigError>
    where
        T: for<'de> Deserialize<'de>,
    {
        debug!("绑定配置到类型: {} -> {}", prefix, std::any::type_name::<T>());
        let section = self.get_section(prefix);
        if section.is_empty() {
            return Err(ConfigError::KeyNotFound {
                key: prefix.to_string(),
            });
        }
        section.bind()
    }

    /// 所有属性键
    pub fn property_names(&self) -> impl Iterator<Item = &str> {
        self.properties.keys().map(String::as_str)
    }

    /// 属性数量
    pub fn len(&self) -> usize {
        self.properties.len()
    }

    /// 是否没有任何属性
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }
}

impl PropertyResolver for StandardEnvironment {
    fn get_property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    fn active_profiles(&self) -> &[String] {
        &self.active_profiles
    }
}

/// 环境构建器
#[derive(Default)]
pub struct EnvironmentBuilder {
    providers: Vec<Box<dyn ConfigProvider>>,
    active_profiles: Option<Vec<String>>,
    ignore_profile_properties: bool,
}

impl EnvironmentBuilder {
    /// 创建新的环境构建器
    pub fn new() -> Self {
        Self::default()
    }

    /// 添加配置提供者
    pub fn add_provider(mut self, provider: Box<dyn ConfigProvider>) -> Self {
        self.providers.push(provider);
        self
    }

    /// 显式设置激活的 profile，忽略配置中的 profile 属性
    pub fn with_active_profiles<I, S>(mut self, profiles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.active_profiles = Some(profiles.into_iter().map(Into::into).collect());
        self
    }

    /// 不从属性中读取激活的 profile
    ///
    /// 测试环境使用此选项，保证 profile 只由测试代码决定
    pub fn ignore_profile_properties(mut self) -> Self {
        self.ignore_profile_properties = true;
        self
    }

    /// 加载所有提供者并合并为环境
    pub async fn build(mut self) -> Result<StandardEnvironment, ConfigError> {
        // 低优先级先写入，高优先级覆盖
        self.providers.sort_by_key(|p| p.priority());

        let mut environment = StandardEnvironment::default();
        for provider in &self.providers {
            let keys = provider.get_all_keys().await?;
            debug!("合并配置提供者: {} ({} 个键)", provider.name(), keys.len());
            for key in keys {
                let value = provider.get_configuration(&key).await?;
                let Some(rendered) = render_value(&value) else {
                    continue;
                };
                environment.properties.insert(key.clone(), rendered);
                environment.origins.insert(key.clone(), provider.name().to_string());
                environment.values.insert(key, value);
            }
        }

        environment.active_profiles = match self.active_profiles {
            Some(profiles) => profiles,
            None if self.ignore_profile_properties => Vec::new(),
            None => environment
                .properties
                .get(ACTIVE_PROFILES_PROPERTY)
                .map(|raw| {
                    raw.split(',')
                        .map(str::trim)
                        .filter(|p| !p.is_empty())
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default(),
        };

        info!(
            "环境加载完成: {} 个属性, 激活的 profile: {:?}",
            environment.properties.len(),
            environment.active_profiles
        );
        Ok(environment)
    }
}
