//! 配置节定义

use crate::errors::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 配置节
///
/// 以相对键保存某个前缀下的配置值，可绑定到具体类型
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigSection {
    /// 配置数据
    pub data: BTreeMap<String, serde_json::Value>,
}

impl ConfigSection {
    /// 创建新的配置节
    pub fn new() -> Self {
        Self::default()
    }

    /// 插入配置项
    pub fn insert(&mut self, key: impl Into<String>, value: serde_json::Value) {
        self.data.insert(key.into(), value);
    }

    /// 获取配置项
    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.data.get(key)
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// 将点分隔的键还原为嵌套对象
    pub fn to_value(&self) -> serde_json::Value {
        let mut root = serde_json::Map::new();
        for (key, value) in &self.data {
            let mut parts = key.split('.').peekable();
            let mut current = &mut root;
            while let Some(part) = parts.next() {
                if parts.peek().is_none() {
                    current.insert(part.to_string(), value.clone());
                    break;
                }
                let entry = current
                    .entry(part.to_string())
                    .or_insert_with(|| serde_json::Value::Object(serde_json::Map::new()));
                if !entry.is_object() {
                    *entry = serde_json::Value::Object(serde_json::Map::new());
                }
                match entry {
                    serde_json::Value::Object(map) => current = map,
                    _ => unreachable!("entry was just replaced by an object"),
                }
            }
        }
        serde_json::Value::Object(root)
    }

    /// 绑定到具体类型
    pub fn bind<T>(&self) -> Result<T, ConfigError>
    where
        T: for<'de> Deserialize<'de>,
    {
        serde_json::from_value(self.to_value()).map_err(|e| ConfigError::SerializationError { source: e })
    }
}
