//! # Configuration Abstractions
//! 
//! 配置抽象层，定义配置来源与属性查询的核心接口。
//! 
//! ## 核心接口
//! 
//! - [`ConfigProvider`] - 配置提供者接口（异步加载）
//! - [`PropertyResolver`] - 属性解析接口（同步查询，供条件求值使用）

pub mod property;
pub mod provider;

pub use property::*;
pub use provider::*;
