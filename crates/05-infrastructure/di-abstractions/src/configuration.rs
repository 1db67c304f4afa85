//! 配置单元抽象
//!
//! 配置是一组工厂的声明来源，可以带有作用于其中所有工厂的条件与默认排序值

use crate::condition::Condition;
use crate::registry::ComponentRegistry;
use infrastructure_common::{DependencyError, LOWEST_PRECEDENCE};

/// 配置 trait
///
/// ```rust,ignore
/// struct ManagementAutoConfiguration;
///
/// impl Configuration for ManagementAutoConfiguration {
///     fn name(&self) -> &str {
///         "ManagementAutoConfiguration"
///     }
///
///     fn configure(&self, registry: &mut dyn ComponentRegistry) -> Result<(), DependencyError> {
///         registry.register_factory(
///             Factory::new("heapDumpEndpoint", |_| Ok(HeapDumpEndpoint::new()))
///                 .when(Condition::on_property("management.endpoint.heapdump.access").having_value("unrestricted")),
///         )
///     }
/// }
/// ```
pub trait Configuration: Send + Sync {
    /// 配置名称
    fn name(&self) -> &str;

    /// 其中工厂未显式设置排序值时继承的排序值
    fn order(&self) -> i32 {
        LOWEST_PRECEDENCE
    }

    /// 作用于配置内所有工厂的条件
    fn conditions(&self) -> Vec<Condition> {
        Vec::new()
    }

    /// 声明工厂
    fn configure(&self, registry: &mut dyn ComponentRegistry) -> Result<(), DependencyError>;
}
