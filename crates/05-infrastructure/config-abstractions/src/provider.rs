//! 配置提供者抽象接口

use async_trait::async_trait;
use infrastructure_common::ConfigError;
use serde_json::Value;

/// 配置提供者 trait
/// 
/// 定义从不同数据源获取配置的统一接口，键使用点分隔格式
#[async_trait]
pub trait ConfigProvider: Send + Sync {
    /// 获取配置值
    async fn get_configuration(&self, key: &str) -> Result<Value, ConfigError>;
    
    /// 重新加载配置
    async fn reload(&mut self) -> Result<(), ConfigError>;
    
    /// 检查配置键是否存在
    async fn contains_key(&self, key: &str) -> Result<bool, ConfigError>;
    
    /// 获取所有叶子配置键
    async fn get_all_keys(&self) -> Result<Vec<String>, ConfigError>;
    
    /// 获取提供者名称
    fn name(&self) -> &str;
    
    /// 获取提供者优先级，数值越大越优先
    fn priority(&self) -> i32 {
        0
    }
}

/// 将任意配置值渲染为属性字符串
///
/// 数组使用逗号拼接，对象无法表示为单个属性时返回 `None`
pub fn render_value(value: &Value) -> Option<String> {
    match value {
        Value::Null => Some(String::new()),
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Array(items) => {
            let rendered: Option<Vec<String>> = items.iter().map(render_value).collect();
            rendered.map(|parts| parts.join(","))
        }
        Value::Object(_) => None,
    }
}

/// 将嵌套的配置值展开为点分隔的叶子键
pub fn flatten_value(value: &Value, prefix: &str, out: &mut Vec<(String, Value)>) {
    match value {
        Value::Object(map) => {
            for (key, nested) in map {
                let full_key = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{}.{}", prefix, key)
                };
                flatten_value(nested, &full_key, out);
            }
        }
        leaf if !prefix.is_empty() => out.push((prefix.to_string(), leaf.clone())),
        _ => {}
    }
}
