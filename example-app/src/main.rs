//! # 示例应用程序
//!
//! 演示如何使用 Lorn Boot 条件组件注册表

use clap::Parser;
use example_app::management::HeapDumpEndpoint;
use example_app::security::{FilterChainProxy, InMemoryUserDetailsManager};
use infrastructure_composition::{Application, ApplicationBuilder, LoggingConfig};
use serde::Deserialize;
use std::path::Path;
use tracing::{debug, info, warn};

/// 命令行参数
#[derive(Parser, Debug)]
#[command(name = "example-app")]
#[command(about = "Lorn Boot 示例应用")]
struct Args {
    /// 配置文件路径（toml / yaml / json）
    #[arg(short, long, default_value = "config/application.toml")]
    config: String,

    /// 内联属性，形如 key=value，可重复
    #[arg(long = "set", value_name = "KEY=VALUE")]
    properties: Vec<String>,

    /// 额外的能力标记，可重复
    #[arg(long = "capability")]
    capabilities: Vec<String>,

    /// 激活的 profile，可重复
    #[arg(long = "profile")]
    profiles: Vec<String>,

    /// 日志级别
    #[arg(long, default_value = "info")]
    log_level: String,

    /// 使用 JSON 日志格式
    #[arg(long)]
    json_log: bool,
}

/// 应用配置
#[derive(Debug, Clone, Deserialize)]
struct AppConfig {
    /// 应用名称
    name: String,
    /// 监听端口
    #[serde(default = "default_port")]
    port: u16,
}

fn default_port() -> u16 {
    8080
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let application = build_application(&args).await?;
    info!("启动 Lorn Boot 示例应用");
    application.start().await?;
    debug!("{}", application.condition_report());
    for step in application.startup_steps() {
        debug!("启动步骤 {}: {:?} {:?}", step.name, step.duration, step.tags);
    }

    demonstrate_configuration(&application);
    demonstrate_security(&application)?;
    demonstrate_heap_dump(&application)?;

    // 等待退出信号
    tokio::signal::ctrl_c().await?;
    info!("收到退出信号，正在关闭应用");

    application.stop().await?;
    info!("应用已关闭");
    Ok(())
}

/// 构建应用
async fn build_application(args: &Args) -> anyhow::Result<Application> {
    let logging = if args.json_log {
        LoggingConfig::production()
    } else {
        LoggingConfig::development()
    };
    let mut builder = ApplicationBuilder::new().with_logging(logging.with_level(parse_log_level(&args.log_level)));

    // 添加配置文件（如果存在）
    let config_exists = Path::new(&args.config).exists();
    if config_exists {
        builder = builder.add_config_file(&args.config)?;
    }

    // 添加环境变量配置源
    builder = builder.add_config_env_vars("APP")?;

    for pair in &args.properties {
        builder = builder.with_property_pair(pair)?;
    }
    for capability in &args.capabilities {
        builder = builder.with_capability(capability.as_str());
    }
    if !args.profiles.is_empty() {
        builder = builder.with_active_profiles(args.profiles.iter().cloned());
    }

    let application = example_app::configure(builder).build().await?;
    if !config_exists {
        warn!("配置文件不存在，已使用默认配置和环境变量: {}", args.config);
    }
    Ok(application)
}

/// 演示配置绑定
fn demonstrate_configuration(application: &Application) {
    match application.get_config::<AppConfig>("app") {
        Ok(config) => info!("应用配置: {} (端口 {})", config.name, config.port),
        Err(e) => info!("未找到应用配置: {}", e),
    }
}

/// 演示有序过滤链与认证
fn demonstrate_security(application: &Application) -> anyhow::Result<()> {
    let proxy = application.get::<FilterChainProxy>()?;
    info!("安全过滤链顺序: {:?}", proxy.chain_names());

    for path in ["/actuator/health", "/"] {
        if let Some(chain) = proxy.chain_for(path) {
            info!("请求 {} 由过滤链 {} 处理", path, chain.name());
        }
    }

    let users = application.get::<InMemoryUserDetailsManager>()?;
    match users.authenticate("admin", "admin") {
        Ok(principal) => info!("认证成功: {} {:?}", principal.username, principal.roles),
        Err(e) => warn!("认证失败: {}", e),
    }
    Ok(())
}

/// 演示按属性启用的堆转储端点
fn demonstrate_heap_dump(application: &Application) -> anyhow::Result<()> {
    if !application.contains::<HeapDumpEndpoint>() {
        info!("堆转储端点未启用，可使用 --set management.endpoint.heapdump.access=unrestricted 启用");
        return Ok(());
    }

    let endpoint = application.get::<HeapDumpEndpoint>()?;
    let path = endpoint.heap_dump(true)?;
    info!("堆转储文件: {}", path.display());
    Ok(())
}

/// 解析日志级别
fn parse_log_level(level: &str) -> tracing::Level {
    match level.to_lowercase().as_str() {
        "trace" => tracing::Level::TRACE,
        "debug" => tracing::Level::DEBUG,
        "warn" => tracing::Level::WARN,
        "error" => tracing::Level::ERROR,
        _ => tracing::Level::INFO,
    }
}
