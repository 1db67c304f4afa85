//! 配置来源与环境合并测试

use super::super::*;
use config_abstractions::{ConfigProvider, PropertyResolver};
use infrastructure_common::ConfigError;
use serde::Deserialize;
use std::io::Write;
use tempfile::NamedTempFile;

fn write_temp(suffix: &str, content: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

/// 测试 TOML 文件展开为点分隔键
#[tokio::test]
async fn test_toml_provider_flattens_tables() {
    let file = write_temp(
        ".toml",
        r#"
[management.endpoint.heapdump]
access = "unrestricted"

[security]
roles = ["ADMIN", "USER"]
"#,
    );

    let provider = TomlConfigProvider::new(file.path()).unwrap();
    let keys = provider.get_all_keys().await.unwrap();
    assert!(keys.contains(&"management.endpoint.heapdump.access".to_string()));
    assert!(provider.contains_key("security.roles").await.unwrap());
    assert!(!provider.contains_key("security").await.unwrap(), "中间表不是叶子键");
}

/// 测试 YAML 文件加载
#[tokio::test]
async fn test_yaml_provider_loads_nested_keys() {
    let file = write_temp(
        ".yml",
        "management:\n  endpoint:\n    heapdump:\n      access: unrestricted\n",
    );

    let provider = YamlConfigProvider::new(file.path()).unwrap();
    let value = provider
        .get_configuration("management.endpoint.heapdump.access")
        .await
        .unwrap();
    assert_eq!(value, serde_json::json!("unrestricted"));
}

/// 测试文件不存在时报错
#[tokio::test]
async fn test_missing_file_is_reported() {
    let result = JsonConfigProvider::new("/definitely/not/here.json");
    assert!(matches!(result, Err(ConfigError::FileNotFound { .. })));
}

/// 测试高优先级提供者覆盖低优先级
#[tokio::test]
async fn test_higher_priority_wins() {
    let file = write_temp(".json", r#"{"server": {"port": 8080, "host": "0.0.0.0"}}"#);

    let environment = StandardEnvironment::builder()
        .add_provider(Box::new(JsonConfigProvider::new(file.path()).unwrap()))
        .add_provider(Box::new(MapConfigProvider::new("inline").with_property("server.port", "9090")))
        .build()
        .await
        .unwrap();

    assert_eq!(environment.get_property("server.port"), Some("9090"));
    assert_eq!(environment.get_property("server.host"), Some("0.0.0.0"));
    assert_eq!(environment.property_origin("server.port"), Some("inline"));
    assert_eq!(environment.get_typed::<u16>("server.port").unwrap(), Some(9090));
}

/// 测试类型转换失败
#[tokio::test]
async fn test_typed_conversion_failure() {
    let environment = StandardEnvironment::load(vec![Box::new(
        MapConfigProvider::new("inline").with_property("server.port", "eighty"),
    )])
    .await
    .unwrap();

    assert!(matches!(
        environment.get_typed::<u16>("server.port"),
        Err(ConfigError::TypeConversionError { .. })
    ));
    assert_eq!(environment.get_typed::<u16>("server.missing").unwrap(), None);
}

/// 测试 profile 从属性读取
#[tokio::test]
async fn test_active_profiles_from_property() {
    let environment = StandardEnvironment::load(vec![Box::new(
        MapConfigProvider::new("inline").with_property(ACTIVE_PROFILES_PROPERTY, "dev, docker"),
    )])
    .await
    .unwrap();

    assert_eq!(environment.active_profiles(), ["dev".to_string(), "docker".to_string()]);
    assert!(environment.accepts_profile("docker"));
    assert!(!environment.accepts_profile("default"));
}

/// 测试忽略 profile 属性的测试环境
#[tokio::test]
async fn test_ignore_profile_properties() {
    let environment = StandardEnvironment::builder()
        .add_provider(Box::new(
            MapConfigProvider::new("inline").with_property(ACTIVE_PROFILES_PROPERTY, "prod"),
        ))
        .ignore_profile_properties()
        .build()
        .await
        .unwrap();

    assert!(environment.active_profiles().is_empty());
    assert!(environment.accepts_profile("default"));
    // 属性本身仍然可见
    assert_eq!(environment.get_property(ACTIVE_PROFILES_PROPERTY), Some("prod"));
}

#[derive(Debug, Deserialize)]
struct HeapDumpProperties {
    access: String,
    #[serde(default)]
    live: bool,
}

/// 测试按前缀绑定配置
#[tokio::test]
async fn test_bind_section() {
    let environment = StandardEnvironment::load(vec![Box::new(
        MapConfigProvider::new("inline")
            .with_property("management.endpoint.heapdump.access", "unrestricted")
            .with_property("management.endpoint.heapdump.live", "true"),
    )])
    .await
    .unwrap();

    let properties: HeapDumpProperties = environment.bind("management.endpoint.heapdump").unwrap();
    assert_eq!(properties.access, "unrestricted");
    assert!(properties.live);

    let missing: Result<HeapDumpProperties, _> = environment.bind("management.endpoint.env");
    assert!(matches!(missing, Err(ConfigError::KeyNotFound { .. })));
}

/// 测试环境变量映射
#[tokio::test]
async fn test_environment_variables_are_mapped() {
    std::env::set_var("LORNTEST_MANAGEMENT_SERVER_PORT", "9001");

    let provider = EnvironmentConfigProviderImpl::new("LORNTEST").unwrap();
    let value = provider.get_configuration("management.server.port").await.unwrap();
    assert_eq!(value, serde_json::json!(9001));

    std::env::remove_var("LORNTEST_MANAGEMENT_SERVER_PORT");
}
