//! # Infrastructure Common
//!
//! 这个 crate 提供了 Lorn Boot 基础设施层的公共类型。
//!
//! ## 核心内容
//!
//! - [`DependencyError`] / [`ConfigError`] / [`InfrastructureError`] - 错误分类
//! - [`TypeInfo`] / [`ComponentMetadata`] - 组件元数据
//! - [`Lifetime`] - 组件生命周期
//! - [`HIGHEST_PRECEDENCE`] / [`LOWEST_PRECEDENCE`] - 排序约定
//! - [`ConfigSection`] - 配置节与类型化绑定
//! - [`StartupRecorder`] - 有界的启动步骤记录

pub mod configuration;
pub mod errors;
pub mod lifecycle;
pub mod metadata;
pub mod ordering;
pub mod startup;

pub use configuration::*;
pub use errors::*;
pub use lifecycle::*;
pub use metadata::*;
pub use ordering::*;
pub use startup::*;
