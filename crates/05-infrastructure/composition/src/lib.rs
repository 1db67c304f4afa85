//! # 基础设施组合层
//!
//! 这个 crate 负责将配置加载、条件组件注册表与日志组合成一个可运行的应用。
//!
//! ## 主要功能
//!
//! - **应用构建器**: 使用构建者模式组装配置源、用户配置与自动配置
//! - **注册流程**: 用户配置先于自动配置应用，随后一次性刷新注册表
//! - **生命周期管理**: 管理应用的启动和关闭
//!
//! ## 基本使用
//!
//! ```rust,no_run
//! use infrastructure_composition::ApplicationBuilder;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let application = ApplicationBuilder::new()
//!         .add_config_toml("config/application.toml")?
//!         .with_property("management.endpoint.heapdump.access", "unrestricted")
//!         .with_capability("servlet")
//!         .build()
//!         .await?;
//!
//!     application.start().await?;
//!     println!("{}", application.condition_report());
//!     application.stop().await?;
//!
//!     Ok(())
//! }
//! ```

pub mod application;
pub mod builder;


// 重新导出主要类型
pub use application::{Application, ApplicationMetrics, ApplicationStatus};
pub use builder::{ApplicationBuilder, LoggingConfig};

// 重新导出错误类型
pub use infrastructure_common::InfrastructureError;
