//! # 条件组件注册表实现
//!
//! 提供 [`RegistryBuilder`]（收集工厂声明并执行注册流程）与刷新后只读的 [`ApplicationContext`]。
//!
//! ## 注册流程
//!
//! 1. 按依赖与条件引用的类型构建依赖图并拓扑排序
//! 2. 按拓扑顺序求值条件，激活满足条件的工厂
//! 3. 校验单值槽位唯一、依赖可解析
//! 4. 创建声明为立即创建的单例，其余单例在首次解析时创建

pub mod builder;
pub mod context;
pub mod graph;
pub mod report;

pub use builder::*;
pub use context::*;
pub use graph::*;
pub use report::*;
