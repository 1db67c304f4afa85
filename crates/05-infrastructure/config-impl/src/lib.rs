//! # Configuration Implementation
//! 
//! 配置来源的具体实现，以及合并后的标准环境。
//! 
//! ## 主要组件
//! 
//! - [`StandardEnvironment`] - 合并后的属性快照
//! - [`TomlConfigProvider`] / [`YamlConfigProvider`] / [`JsonConfigProvider`] - 文件配置提供者
//! - [`EnvironmentConfigProviderImpl`] - 环境变量配置提供者
//! - [`MapConfigProvider`] - 内存配置提供者

pub mod environment;
pub mod providers;

pub use environment::*;
pub use providers::*;

#[cfg(test)]
mod tests;
