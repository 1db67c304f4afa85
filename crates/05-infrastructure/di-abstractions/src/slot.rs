//! 组件槽位

use infrastructure_common::TypeInfo;
use std::any::TypeId;
use std::fmt;

/// 组件槽位标识
///
/// 由组件类型与可选的限定名组成；单值槽位在同一上下文中最多只有一个实例
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SlotKey {
    /// 组件类型
    pub type_info: TypeInfo,
    /// 限定名
    pub qualifier: Option<String>,
}

impl SlotKey {
    /// 未限定的类型槽位
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            type_info: TypeInfo::of::<T>(),
            qualifier: None,
        }
    }

    /// 带限定名的类型槽位
    pub fn named<T: ?Sized + 'static>(qualifier: impl Into<String>) -> Self {
        Self {
            type_info: TypeInfo::of::<T>(),
            qualifier: Some(qualifier.into()),
        }
    }

    /// 类型ID
    pub fn type_id(&self) -> TypeId {
        self.type_info.id
    }
}

impl fmt::Display for SlotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.qualifier {
            Some(qualifier) => write!(f, "{}({:?})", self.type_info, qualifier),
            None => write!(f, "{}", self.type_info),
        }
    }
}

/// 槽位基数
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Cardinality {
    /// 单值槽位
    #[default]
    Single,
    /// 有序多值槽位，按排序值升序、声明顺序稳定排序
    Ordered,
}
