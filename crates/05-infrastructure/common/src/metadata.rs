//! 元数据定义
//!
//! 提供组件和类型的元数据信息

use crate::lifecycle::Lifetime;
use std::any::TypeId;
use std::fmt;

/// 类型信息
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeInfo {
    /// 类型ID
    pub id: TypeId,
    /// 完整类型名称（包含模块路径）
    pub full_name: &'static str,
}

impl TypeInfo {
    /// 从类型获取类型信息
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            full_name: std::any::type_name::<T>(),
        }
    }

    /// 获取简短的类型名称（不包含模块路径）
    pub fn short_name(&self) -> &'static str {
        // 泛型参数中也可能出现 "::"，只截取最外层类型名
        let head = self
            .full_name
            .split('<')
            .next()
            .unwrap_or(self.full_name);
        let start = head.rfind("::").map_or(0, |i| i + 2);
        &self.full_name[start..]
    }
}

impl fmt::Display for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

/// 组件来源
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FactoryOrigin {
    /// 用户声明的组件
    User,
    /// 内置的自动配置组件
    AutoConfiguration,
}

impl fmt::Display for FactoryOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User => f.write_str("user"),
            Self::AutoConfiguration => f.write_str("auto-configuration"),
        }
    }
}

/// 组件元数据
#[derive(Debug, Clone)]
pub struct ComponentMetadata {
    /// 工厂名称
    pub name: String,
    /// 类型信息
    pub type_info: TypeInfo,
    /// 限定名
    pub qualifier: Option<String>,
    /// 组件来源
    pub origin: FactoryOrigin,
    /// 贡献此组件的配置名称
    pub configuration: Option<String>,
    /// 排序值
    pub order: i32,
    /// 生命周期
    pub lifetime: Lifetime,
    /// 是否在刷新时立即创建，默认首次解析时创建
    pub eager: bool,
    /// 组件描述
    pub description: Option<String>,
}

impl ComponentMetadata {
    /// 创建新的组件元数据
    pub fn new(type_info: TypeInfo, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_info,
            qualifier: None,
            origin: FactoryOrigin::User,
            configuration: None,
            order: crate::ordering::LOWEST_PRECEDENCE,
            lifetime: Lifetime::Singleton,
            eager: false,
            description: None,
        }
    }

    /// 设置描述
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}
