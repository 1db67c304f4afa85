//! 管理端点示例

use di_abstractions::{ComponentRegistry, ComponentRegistryExt, Condition, Configuration, Factory};
use infrastructure_common::DependencyError;
use std::path::PathBuf;
use tracing::info;

/// 控制堆转储端点访问级别的属性
pub const HEAP_DUMP_ACCESS_PROPERTY: &str = "management.endpoint.heapdump.access";

/// 堆转储实现
pub trait HeapDumper: Send + Sync {
    /// 执行转储并返回转储文件路径
    fn dump_heap(&self, live: bool) -> anyhow::Result<PathBuf>;
}

/// 将转储写入临时目录的实现
#[derive(Debug, Default)]
pub struct TempFileHeapDumper;

impl HeapDumper for TempFileHeapDumper {
    fn dump_heap(&self, live: bool) -> anyhow::Result<PathBuf> {
        let path = std::env::temp_dir().join(format!("heap-{}.hprof", uuid::Uuid::new_v4()));
        let content = if live { "<<live objects>>" } else { "<<all objects>>" };
        std::fs::write(&path, content)?;
        Ok(path)
    }
}

/// 堆转储端点
pub struct HeapDumpEndpoint {
    dumper: Box<dyn HeapDumper>,
}

impl HeapDumpEndpoint {
    /// 使用指定的转储实现创建端点
    pub fn new(dumper: impl HeapDumper + 'static) -> Self {
        Self {
            dumper: Box::new(dumper),
        }
    }

    /// 执行堆转储
    pub fn heap_dump(&self, live: bool) -> anyhow::Result<PathBuf> {
        let path = self.dumper.dump_heap(live)?;
        info!("堆转储完成: {}", path.display());
        Ok(path)
    }
}

impl std::fmt::Debug for HeapDumpEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HeapDumpEndpoint").finish_non_exhaustive()
    }
}

/// 堆转储端点自动配置
///
/// 只有访问级别为 `unrestricted` 时才暴露端点，用户自定义的端点优先
pub struct HeapDumpEndpointAutoConfiguration;

impl Configuration for HeapDumpEndpointAutoConfiguration {
    fn name(&self) -> &str {
        "HeapDumpEndpointAutoConfiguration"
    }

    fn configure(&self, registry: &mut dyn ComponentRegistry) -> Result<(), DependencyError> {
        registry.register_factory(
            Factory::new("heapDumpEndpoint", |_| Ok(HeapDumpEndpoint::new(TempFileHeapDumper)))
                .when(Condition::on_property(HEAP_DUMP_ACCESS_PROPERTY).having_value("unrestricted"))
                .when(Condition::on_missing_component::<HeapDumpEndpoint>())
                .description("按需生成堆转储文件"),
        )
    }
}
