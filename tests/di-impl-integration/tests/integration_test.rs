//! 跨 crate 的集中集成测试：环境、条件注册表与示例配置协同工作
use di_abstractions::{ComponentRegistry, ComponentRegistryExt, Configuration, Factory};
use example_app::management::{HeapDumpEndpoint, HeapDumper, HEAP_DUMP_ACCESS_PROPERTY};
use example_app::security::{
    ApplicationSecurity, FilterChainProxy, InMemoryUserDetailsManager, SecurityAutoConfiguration,
    SecurityFilterChain, UserDetails,
};
use infrastructure_common::{DependencyError, InfrastructureError};
use infrastructure_composition::{Application, ApplicationBuilder};
use std::path::PathBuf;

/// 返回固定路径的转储实现
struct FixedHeapDumper;

impl HeapDumper for FixedHeapDumper {
    fn dump_heap(&self, _live: bool) -> anyhow::Result<PathBuf> {
        Ok(PathBuf::from("/tmp/custom.hprof"))
    }
}

/// 用户自定义的堆转储端点
struct CustomHeapDumpConfiguration;

impl Configuration for CustomHeapDumpConfiguration {
    fn name(&self) -> &str {
        "CustomHeapDumpConfiguration"
    }

    fn configure(&self, registry: &mut dyn ComponentRegistry) -> Result<(), DependencyError> {
        registry.register_factory(Factory::new("customHeapDumpEndpoint", |_| {
            Ok(HeapDumpEndpoint::new(FixedHeapDumper))
        }))
    }
}

async fn sample_application(builder: ApplicationBuilder) -> Application {
    example_app::configure(builder).build().await.expect("示例应用构建应该成功")
}

#[tokio::test]
async fn test_heap_dump_endpoint_requires_unrestricted_access() {
    let restricted = sample_application(
        ApplicationBuilder::new().with_property(HEAP_DUMP_ACCESS_PROPERTY, "read-only"),
    )
    .await;
    assert!(!restricted.contains::<HeapDumpEndpoint>());

    let absent = sample_application(ApplicationBuilder::new()).await;
    assert!(!absent.contains::<HeapDumpEndpoint>());

    let unrestricted = sample_application(
        ApplicationBuilder::new().with_property(HEAP_DUMP_ACCESS_PROPERTY, "unrestricted"),
    )
    .await;
    assert!(unrestricted.contains::<HeapDumpEndpoint>());
    assert!(!unrestricted.context().is_instantiated("heapDumpEndpoint"));

    let endpoint = unrestricted.get::<HeapDumpEndpoint>().unwrap();
    assert!(unrestricted.context().is_instantiated("heapDumpEndpoint"));
    let path = endpoint.heap_dump(false).unwrap();
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "<<all objects>>");
    std::fs::remove_file(path).unwrap();
}

#[tokio::test]
async fn test_user_heap_dump_endpoint_wins() {
    let application = sample_application(
        ApplicationBuilder::new()
            .with_property(HEAP_DUMP_ACCESS_PROPERTY, "unrestricted")
            .add_configuration(CustomHeapDumpConfiguration),
    )
    .await;

    assert!(application.context().contains_component("customHeapDumpEndpoint"));
    assert!(!application.context().contains_component("heapDumpEndpoint"));

    let endpoint = application.get::<HeapDumpEndpoint>().unwrap();
    assert_eq!(endpoint.heap_dump(true).unwrap(), PathBuf::from("/tmp/custom.hprof"));
}

#[tokio::test]
async fn test_security_chains_follow_configuration_order() {
    let application = sample_application(ApplicationBuilder::new()).await;

    let proxy = application.get::<FilterChainProxy>().unwrap();
    assert_eq!(proxy.chain_names(), ["actuatorSecurity", "configure"]);
    assert_eq!(proxy.chain_for("/actuator/health").unwrap().name(), "actuatorSecurity");
    assert_eq!(proxy.chain_for("/").unwrap().name(), "configure");

    let chains = application.get_all::<SecurityFilterChain>().unwrap();
    assert_eq!(chains.len(), 2);

    let applied = application
        .startup_steps()
        .iter()
        .filter(|step| step.name == "configuration.apply")
        .count();
    assert_eq!(applied, 5);

    let context = application.context();
    assert!(!context.contains_component("defaultSecurityFilterChain"));
    assert!(!context.contains_component("generatedUserDetailsManager"));
}

#[tokio::test]
async fn test_user_details_authenticate_through_context() {
    let application = sample_application(ApplicationBuilder::new()).await;

    let users = application.get::<InMemoryUserDetailsManager>().unwrap();
    let principal = users.authenticate("admin", "admin").unwrap();
    assert!(principal.has_role("ACTUATOR"));
    assert!(users.authenticate("admin", "wrong").is_err());

    let chain = application.get::<FilterChainProxy>().unwrap();
    let actuator = chain.chain_for("/actuator/heapdump").unwrap();
    assert!(actuator.http_basic_enabled());
    assert!(actuator.authenticate("user", "user").is_ok());
}

#[tokio::test]
async fn test_auto_configuration_defaults_without_user_security() {
    let application = ApplicationBuilder::new()
        .with_capability(example_app::SERVLET_CAPABILITY)
        .add_auto_configuration(SecurityAutoConfiguration)
        .build()
        .await
        .unwrap();

    let proxy = application.get::<FilterChainProxy>().unwrap();
    assert_eq!(proxy.chain_names(), ["defaultSecurityFilterChain"]);
    assert!(application.context().contains_component("generatedUserDetailsManager"));
    assert!(application.condition_report().evaluation("generatedUserDetailsManager").unwrap().matched);
}

#[tokio::test]
async fn test_security_auto_configuration_requires_servlet() {
    let application = ApplicationBuilder::new()
        .add_auto_configuration(SecurityAutoConfiguration)
        .build()
        .await
        .unwrap();

    assert!(!application.contains::<FilterChainProxy>());
    assert!(application.context().is_empty());
    assert_eq!(application.condition_report().negative_matches().count(), 4);
}

#[tokio::test]
async fn test_user_chain_without_http_security_fails() {
    let result = ApplicationBuilder::new()
        .add_configuration(ApplicationSecurity)
        .add_auto_configuration(SecurityAutoConfiguration)
        .build()
        .await;

    match result {
        Err(InfrastructureError::DependencyError {
            source: DependencyError::MissingDependency { factory, dependency },
        }) => {
            assert_eq!(factory, "configure");
            assert_eq!(dependency, "HttpSecurity");
        }
        Err(other) => panic!("unexpected error: {}", other),
        Ok(_) => panic!("missing HttpSecurity should fail the build"),
    }
}

#[tokio::test]
async fn test_user_details_manager_override_from_plain_factory() {
    struct OperatorSecurity;

    impl Configuration for OperatorSecurity {
        fn name(&self) -> &str {
            "OperatorSecurity"
        }

        fn configure(&self, registry: &mut dyn ComponentRegistry) -> Result<(), DependencyError> {
            registry.register_factory(Factory::new("operators", |_| {
                Ok(InMemoryUserDetailsManager::new([UserDetails::with_password(
                    "operator",
                    "secret",
                    ["ACTUATOR"],
                )?]))
            }))
        }
    }

    let application = ApplicationBuilder::new()
        .with_capability(example_app::SERVLET_CAPABILITY)
        .add_configuration(OperatorSecurity)
        .add_auto_configuration(SecurityAutoConfiguration)
        .build()
        .await
        .unwrap();

    let proxy = application.get::<FilterChainProxy>().unwrap();
    let chain = proxy.chain_for("/").unwrap();
    assert!(chain.authenticate("operator", "secret").is_ok());
    assert!(chain.authenticate("user", "user").is_err());
    assert!(!application.context().contains_component("generatedUserDetailsManager"));
}
