//! # 示例应用
//!
//! 演示条件组件注册表：方法级安全的有序过滤链，以及由属性控制的堆转储端点

pub mod management;
pub mod security;

use infrastructure_composition::ApplicationBuilder;
use management::HeapDumpEndpointAutoConfiguration;
use security::{ActuatorSecurity, ApplicationSecurity, AuthenticationSecurity, SecurityAutoConfiguration};

/// 示例应用依赖的能力
pub const SERVLET_CAPABILITY: &str = "servlet";

/// 启动步骤缓冲区容量
pub const STARTUP_BUFFER_CAPACITY: usize = 2048;

/// 注册示例应用的全部配置
pub fn configure(builder: ApplicationBuilder) -> ApplicationBuilder {
    builder
        .with_startup_buffer(STARTUP_BUFFER_CAPACITY)
        .with_capability(SERVLET_CAPABILITY)
        .add_configuration(AuthenticationSecurity)
        .add_configuration(ApplicationSecurity)
        .add_configuration(ActuatorSecurity)
        .add_auto_configuration(SecurityAutoConfiguration)
        .add_auto_configuration(HeapDumpEndpointAutoConfiguration)
}
