//! 应用主入口

use crate::builder::ApplicationBuilder;
use config_abstractions::PropertyResolver;
use config_impl::environment::StandardEnvironment;
use di_abstractions::{Capabilities, ComponentResolverExt};
use di_impl::{ApplicationContext, ConditionEvaluationReport};
use infrastructure_common::{InfrastructureError, StartupRecorder, StartupStep};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};

/// 应用
///
/// 持有只读的属性快照与组件上下文；运行状态可在多个任务间共享查询
pub struct Application {
    /// 属性快照
    environment: Arc<StandardEnvironment>,
    /// 组件上下文
    context: Arc<ApplicationContext>,
    /// 启动时的能力集合
    capabilities: Capabilities,
    /// 运行状态
    status: Arc<RwLock<ApplicationStatus>>,
    /// 统计信息
    metrics: Arc<RwLock<ApplicationMetrics>>,
    /// 构建阶段的启动步骤
    startup: StartupRecorder,
}

impl Application {
    /// 创建应用构建器
    pub fn builder() -> ApplicationBuilder {
        ApplicationBuilder::new()
    }

    /// 内部构造函数
    pub(crate) fn new(
        environment: StandardEnvironment,
        context: ApplicationContext,
        capabilities: Capabilities,
        startup: StartupRecorder,
    ) -> Self {
        let metrics = ApplicationMetrics {
            component_count: context.len(),
            property_count: environment.len(),
            skipped_factory_count: context.condition_report().negative_matches().count(),
            ..ApplicationMetrics::default()
        };
        Self {
            environment: Arc::new(environment),
            context: Arc::new(context),
            capabilities,
            status: Arc::new(RwLock::new(ApplicationStatus::Initialized)),
            metrics: Arc::new(RwLock::new(metrics)),
            startup,
        }
    }

    /// 应用ID
    pub fn id(&self) -> &str {
        self.context.id()
    }

    /// 属性快照
    pub fn environment(&self) -> &Arc<StandardEnvironment> {
        &self.environment
    }

    /// 组件上下文
    pub fn context(&self) -> &Arc<ApplicationContext> {
        &self.context
    }

    /// 启动时的能力集合
    pub fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    /// 条件求值报告
    pub fn condition_report(&self) -> &ConditionEvaluationReport {
        self.context.condition_report()
    }

    /// 启动步骤记录器
    pub fn startup_recorder(&self) -> &StartupRecorder {
        &self.startup
    }

    /// 构建阶段记录的启动步骤，未启用记录时为空
    pub fn startup_steps(&self) -> &[StartupStep] {
        self.startup.steps()
    }

    /// 启动应用
    pub async fn start(&self) -> Result<(), InfrastructureError> {
        info!("启动应用: {}", self.id());

        {
            let mut status = self.status.write().await;
            if *status == ApplicationStatus::Running {
                warn!("应用已在运行");
                return Ok(());
            }
            *status = ApplicationStatus::Starting;
        }

        {
            let mut metrics = self.metrics.write().await;
            metrics.start_time = Some(chrono::Utc::now());
            metrics.stop_time = None;
        }

        {
            let mut status = self.status.write().await;
            *status = ApplicationStatus::Running;
        }

        info!("应用启动完成");
        Ok(())
    }

    /// 停止应用
    pub async fn stop(&self) -> Result<(), InfrastructureError> {
        info!("停止应用: {}", self.id());

        {
            let mut status = self.status.write().await;
            if *status != ApplicationStatus::Running {
                return Err(InfrastructureError::ShutdownFailed {
                    message: format!("应用未在运行: {:?}", *status),
                });
            }
            *status = ApplicationStatus::Stopping;
        }

        {
            let mut status = self.status.write().await;
            *status = ApplicationStatus::Stopped;

            let mut metrics = self.metrics.write().await;
            metrics.stop_time = Some(chrono::Utc::now());
        }

        info!("应用停止完成");
        Ok(())
    }

    /// 获取组件
    pub fn get<T: Send + Sync + 'static>(&self) -> Result<Arc<T>, InfrastructureError> {
        Ok(self.context.get::<T>()?)
    }

    /// 获取带限定名的组件
    pub fn get_named<T: Send + Sync + 'static>(&self, qualifier: &str) -> Result<Arc<T>, InfrastructureError> {
        Ok(self.context.get_named::<T>(qualifier)?)
    }

    /// 获取类型 `T` 的全部组件，按排序值排列
    pub fn get_all<T: Send + Sync + 'static>(&self) -> Result<Vec<Arc<T>>, InfrastructureError> {
        Ok(self.context.get_all::<T>()?)
    }

    /// 是否存在类型 `T` 的组件
    pub fn contains<T: Send + Sync + 'static>(&self) -> bool {
        self.context.contains::<T>()
    }

    /// 获取属性
    pub fn get_property(&self, key: &str) -> Option<&str> {
        self.environment.get_property(key)
    }

    /// 将指定前缀下的配置绑定到具体类型
    pub fn get_config<T>(&self, prefix: &str) -> Result<T, InfrastructureError>
    where
        T: for<'de> Deserialize<'de>,
    {
        Ok(self.environment.bind(prefix)?)
    }

    /// 获取运行状态
    pub async fn get_status(&self) -> ApplicationStatus {
        *self.status.read().await
    }

    /// 获取统计信息
    pub async fn get_metrics(&self) -> ApplicationMetrics {
        self.metrics.read().await.clone()
    }
}

/// 应用运行状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApplicationStatus {
    /// 已初始化
    Initialized,
    /// 启动中
    Starting,
    /// 运行中
    Running,
    /// 停止中
    Stopping,
    /// 已停止
    Stopped,
}

/// 应用统计信息
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApplicationMetrics {
    /// 启动时间
    pub start_time: Option<chrono::DateTime<chrono::Utc>>,
    /// 停止时间
    pub stop_time: Option<chrono::DateTime<chrono::Utc>>,
    /// 激活的组件数量
    pub component_count: usize,
    /// 条件不满足而跳过的工厂数量
    pub skipped_factory_count: usize,
    /// 属性数量
    pub property_count: usize,
}

impl ApplicationMetrics {
    /// 计算运行时间
    pub fn uptime(&self) -> Option<chrono::Duration> {
        match (self.start_time, self.stop_time) {
            (Some(start), Some(stop)) => Some(stop - start),
            (Some(start), None) => Some(chrono::Utc::now() - start),
            _ => None,
        }
    }
}
