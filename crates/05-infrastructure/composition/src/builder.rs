//! 应用构建器

use crate::application::Application;
use config_abstractions::ConfigProvider;
use config_impl::environment::StandardEnvironment;
use config_impl::providers::{
    EnvironmentConfigProviderImpl, FileFormat, JsonConfigProvider, MapConfigProvider,
    TomlConfigProvider, YamlConfigProvider,
};
use di_abstractions::{Capabilities, Configuration};
use di_impl::RegistryBuilder;
use infrastructure_common::{FactoryOrigin, InfrastructureError, StartupRecorder};
use std::path::Path;
use tracing::{debug, info};

/// 应用构建器
///
/// 使用建造者模式加载配置、应用组件配置并刷新注册表
pub struct ApplicationBuilder {
    /// 配置源列表
    config_sources: Vec<Box<dyn ConfigProvider>>,
    /// 内联属性
    inline_properties: MapConfigProvider,
    /// 能力集合
    capabilities: Capabilities,
    /// 显式指定的 profile
    active_profiles: Option<Vec<String>>,
    /// 是否忽略配置中的 profile 属性
    ignore_profile_properties: bool,
    /// 用户配置
    configurations: Vec<Box<dyn Configuration>>,
    /// 自动配置
    auto_configurations: Vec<Box<dyn Configuration>>,
    /// 是否启用日志初始化
    logging_enabled: bool,
    /// 日志配置
    logging_config: LoggingConfig,
    /// 启动步骤记录器
    startup: StartupRecorder,
}

impl ApplicationBuilder {
    /// 创建新的应用构建器
    pub fn new() -> Self {
        Self {
            config_sources: Vec::new(),
            inline_properties: MapConfigProvider::new("InlineProperties"),
            capabilities: Capabilities::new(),
            active_profiles: None,
            ignore_profile_properties: false,
            configurations: Vec::new(),
            auto_configurations: Vec::new(),
            logging_enabled: false, // 默认不启用日志初始化
            logging_config: LoggingConfig::default(),
            startup: StartupRecorder::disabled(),
        }
    }

    fn ensure_exists(path: &Path) -> Result<(), InfrastructureError> {
        if path.exists() {
            Ok(())
        } else {
            Err(InfrastructureError::BootstrapFailed {
                message: format!("配置文件不存在: {}", path.display()),
            })
        }
    }

    /// 添加 TOML 配置文件
    pub fn add_config_toml<P: AsRef<Path>>(mut self, path: P) -> Result<Self, InfrastructureError> {
        let path = path.as_ref();
        Self::ensure_exists(path)?;

        info!("添加 TOML 配置文件: {}", path.display());
        let provider = TomlConfigProvider::new(path)?;
        self.config_sources.push(Box::new(provider));
        Ok(self)
    }

    /// 添加 JSON 配置文件
    pub fn add_config_json<P: AsRef<Path>>(mut self, path: P) -> Result<Self, InfrastructureError> {
        let path = path.as_ref();
        Self::ensure_exists(path)?;

        info!("添加 JSON 配置文件: {}", path.display());
        let provider = JsonConfigProvider::new(path)?;
        self.config_sources.push(Box::new(provider));
        Ok(self)
    }

    /// 添加 YAML 配置文件
    pub fn add_config_yaml<P: AsRef<Path>>(mut self, path: P) -> Result<Self, InfrastructureError> {
        let path = path.as_ref();
        Self::ensure_exists(path)?;

        info!("添加 YAML 配置文件: {}", path.display());
        let provider = YamlConfigProvider::new(path)?;
        self.config_sources.push(Box::new(provider));
        Ok(self)
    }

    /// 按扩展名添加配置文件
    pub fn add_config_file<P: AsRef<Path>>(self, path: P) -> Result<Self, InfrastructureError> {
        let path = path.as_ref();
        match FileFormat::from_path(path) {
            Some(FileFormat::Toml) => self.add_config_toml(path),
            Some(FileFormat::Yaml) => self.add_config_yaml(path),
            Some(FileFormat::Json) => self.add_config_json(path),
            None => Err(InfrastructureError::BootstrapFailed {
                message: format!("不支持的配置文件格式: {}", path.display()),
            }),
        }
    }

    /// 添加环境变量配置源
    pub fn add_config_env_vars<S: Into<String>>(mut self, prefix: S) -> Result<Self, InfrastructureError> {
        let prefix = prefix.into();
        info!("添加环境变量配置源，前缀: {}", prefix);

        let provider = EnvironmentConfigProviderImpl::new(prefix)?;
        self.config_sources.push(Box::new(provider));
        Ok(self)
    }

    /// 添加自定义配置提供者
    pub fn add_config_provider<T: ConfigProvider + 'static>(mut self, provider: T) -> Self {
        info!("添加自定义配置提供者: {}", provider.name());
        self.config_sources.push(Box::new(provider));
        self
    }

    /// 添加内联属性，优先级高于所有配置源
    pub fn with_property(mut self, key: impl Into<String>, value: impl AsRef<str>) -> Self {
        self.inline_properties.insert(key, value);
        self
    }

    /// 添加 `key=value` 形式的内联属性
    pub fn with_property_pair(mut self, pair: &str) -> Result<Self, InfrastructureError> {
        self.inline_properties.parse_pair(pair)?;
        Ok(self)
    }

    /// 添加能力
    pub fn with_capability(mut self, flag: impl Into<String>) -> Self {
        self.capabilities.insert(flag);
        self
    }

    /// 显式设置激活的 profile
    pub fn with_active_profiles<I, S>(mut self, profiles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.active_profiles = Some(profiles.into_iter().map(Into::into).collect());
        self
    }

    /// 不从配置属性中读取激活的 profile
    pub fn ignore_profile_properties(mut self) -> Self {
        self.ignore_profile_properties = true;
        self
    }

    /// 添加用户配置
    pub fn add_configuration<C: Configuration + 'static>(mut self, configuration: C) -> Self {
        debug!("添加用户配置: {}", configuration.name());
        self.configurations.push(Box::new(configuration));
        self
    }

    /// 添加自动配置，其中的组件在用户组件之后求值
    pub fn add_auto_configuration<C: Configuration + 'static>(mut self, configuration: C) -> Self {
        debug!("添加自动配置: {}", configuration.name());
        self.auto_configurations.push(Box::new(configuration));
        self
    }

    /// 配置日志
    pub fn with_logging(mut self, config: LoggingConfig) -> Self {
        self.logging_config = config;
        self.logging_enabled = true; // 启用日志初始化
        self
    }

    /// 记录启动步骤，最多缓冲 `capacity` 个，超出的步骤被丢弃
    pub fn with_startup_buffer(mut self, capacity: usize) -> Self {
        self.startup = StartupRecorder::buffering(capacity);
        self
    }

    /// 构建应用
    pub async fn build(mut self) -> Result<Application, InfrastructureError> {
        // 只有在明确配置了日志时才初始化日志
        // 避免在测试环境中重复初始化
        if self.logging_enabled {
            self.logging_config.initialize()?;
        }

        info!("开始构建应用");

        let step = self
            .startup
            .start("environment.load")
            .tag("sources", self.config_sources.len().to_string());
        let mut environment_builder = StandardEnvironment::builder();
        for provider in self.config_sources {
            environment_builder = environment_builder.add_provider(provider);
        }
        if !self.inline_properties.is_empty() {
            environment_builder = environment_builder.add_provider(Box::new(self.inline_properties));
        }
        if let Some(profiles) = self.active_profiles {
            environment_builder = environment_builder.with_active_profiles(profiles);
        }
        if self.ignore_profile_properties {
            environment_builder = environment_builder.ignore_profile_properties();
        }
        let environment = environment_builder.build().await?;
        self.startup.end(step.tag("properties", environment.len().to_string()));

        let mut registry = RegistryBuilder::new();
        let user = self.configurations.iter().map(|c| (c, FactoryOrigin::User));
        let auto = self
            .auto_configurations
            .iter()
            .map(|c| (c, FactoryOrigin::AutoConfiguration));
        for (configuration, origin) in user.chain(auto) {
            let step = self
                .startup
                .start("configuration.apply")
                .tag("configuration", configuration.name())
                .tag("origin", origin.to_string());
            registry.apply_configuration(configuration.as_ref(), origin)?;
            self.startup.end(step);
        }
        info!(
            "已应用 {} 个用户配置, {} 个自动配置, 能力: {:?}",
            self.configurations.len(),
            self.auto_configurations.len(),
            self.capabilities.iter().collect::<Vec<_>>()
        );

        let context = registry.refresh_recorded(&environment, &self.capabilities, &mut self.startup)?;
        if self.startup.dropped() > 0 {
            debug!("启动步骤缓冲区已满，丢弃 {} 个步骤", self.startup.dropped());
        }
        let application = Application::new(environment, context, self.capabilities, self.startup);

        info!("应用构建完成: {}", application.id());
        Ok(application)
    }
}

impl Default for ApplicationBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// 日志配置
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// 日志级别
    pub level: tracing::Level,
    /// 是否显示目标
    pub show_target: bool,
    /// 是否显示线程ID
    pub show_thread_ids: bool,
    /// 是否显示文件名
    pub show_file: bool,
    /// 是否显示行号
    pub show_line_number: bool,
    /// 是否使用 JSON 格式
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: tracing::Level::INFO,
            show_target: true,
            show_thread_ids: false,
            show_file: false,
            show_line_number: false,
            json_format: false,
        }
    }
}

impl LoggingConfig {
    /// 创建开发环境日志配置
    pub fn development() -> Self {
        Self {
            level: tracing::Level::DEBUG,
            show_target: true,
            show_thread_ids: true,
            show_file: true,
            show_line_number: true,
            json_format: false,
        }
    }

    /// 创建生产环境日志配置
    pub fn production() -> Self {
        Self {
            level: tracing::Level::INFO,
            show_target: false,
            show_thread_ids: false,
            show_file: false,
            show_line_number: false,
            json_format: true,
        }
    }

    /// 设置日志级别
    pub fn with_level(mut self, level: tracing::Level) -> Self {
        self.level = level;
        self
    }

    /// 初始化日志系统
    pub fn initialize(&self) -> Result<(), InfrastructureError> {
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(self.level)
            .with_target(self.show_target)
            .with_thread_ids(self.show_thread_ids)
            .with_file(self.show_file)
            .with_line_number(self.show_line_number);

        if self.json_format {
            subscriber.json().try_init()
        } else {
            subscriber.try_init()
        }
        .map_err(|e| InfrastructureError::BootstrapFailed {
            message: format!("日志初始化失败: {}", e),
        })?;

        info!("日志系统初始化完成");
        Ok(())
    }
}
