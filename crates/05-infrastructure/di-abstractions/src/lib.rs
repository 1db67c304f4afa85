//! # Dependency Injection Abstractions
//!
//! 条件组件注册表的抽象层，定义工厂、条件、槽位与解析接口。
//!
//! ## 核心接口
//!
//! - [`ComponentRegistry`] - 组件注册表接口
//! - [`ComponentResolver`] - 组件解析器接口
//! - [`Configuration`] - 配置单元接口
//! - [`Factory`] - 类型化工厂构建器
//! - [`Condition`] - 激活条件

pub mod capability;
pub mod condition;
pub mod configuration;
pub mod factory;
pub mod registry;
pub mod resolver;
pub mod slot;

pub use capability::*;
pub use condition::*;
pub use configuration::*;
pub use factory::*;
pub use registry::*;
pub use resolver::*;
pub use slot::*;
