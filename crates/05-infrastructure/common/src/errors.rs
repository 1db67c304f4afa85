//! 错误类型定义

use thiserror::Error;

/// 配置错误类型
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("配置文件不存在: {path}")]
    FileNotFound { path: String },

    #[error("配置文件读取失败: {source}")]
    FileReadError {
        #[from]
        source: std::io::Error,
    },

    #[error("配置解析失败: {source}")]
    ParseError {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("配置序列化失败: {source}")]
    SerializationError {
        #[from]
        source: serde_json::Error,
    },

    #[error("配置键不存在: {key}")]
    KeyNotFound { key: String },

    #[error("配置类型转换失败: {message}")]
    TypeConversionError { message: String },
}

impl ConfigError {
    /// 创建解析错误
    pub fn parse_error(source: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::ParseError {
            source: source.into(),
        }
    }
}

/// 依赖注入错误类型
///
/// 除 `ComponentNotRegistered` 与 `TypeMismatch` 外，其余变体都只会在
/// 注册阶段（refresh）出现，并导致启动失败。
#[derive(Error, Debug)]
pub enum DependencyError {
    #[error("组件未注册: {type_name}")]
    ComponentNotRegistered { type_name: String },

    #[error("组件创建失败: {type_name}, 原因: {source}")]
    ComponentCreationFailed {
        type_name: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("循环依赖检测到: {}", .cycle.join(" -> "))]
    CircularDependency { cycle: Vec<String> },

    #[error("组件槽位存在多个候选: {slot}, 候选: [{}]", .candidates.join(", "))]
    AmbiguousSlot {
        slot: String,
        candidates: Vec<String>,
    },

    #[error("缺少依赖: 工厂 {factory} 需要 {dependency}, 但没有可用的提供者")]
    MissingDependency { factory: String, dependency: String },

    #[error("未声明的依赖: 工厂 {factory} 请求了 {dependency}")]
    UndeclaredDependency { factory: String, dependency: String },

    #[error("组件类型不匹配: 期望 {expected}")]
    TypeMismatch { expected: String },

    #[error("组件注册失败: {type_name}, 原因: {message}")]
    RegistrationError { type_name: String, message: String },
}

impl DependencyError {
    /// 创建组件创建失败错误
    pub fn creation_failed(
        type_name: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::ComponentCreationFailed {
            type_name: type_name.into(),
            source: source.into(),
        }
    }

    /// 是否为启动期致命错误
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            Self::ComponentNotRegistered { .. } | Self::TypeMismatch { .. }
        )
    }
}

/// 基础设施错误类型
#[derive(Error, Debug)]
pub enum InfrastructureError {
    #[error("配置错误: {source}")]
    ConfigError {
        #[from]
        source: ConfigError,
    },

    #[error("依赖注入错误: {source}")]
    DependencyError {
        #[from]
        source: DependencyError,
    },

    #[error("基础设施启动失败: {message}")]
    BootstrapFailed { message: String },

    #[error("基础设施关闭失败: {message}")]
    ShutdownFailed { message: String },
}

/// 结果类型别名
pub type ConfigResult<T> = Result<T, ConfigError>;
pub type DependencyResult<T> = Result<T, DependencyError>;
pub type InfrastructureResult<T> = Result<T, InfrastructureError>;
