//! 组件解析器抽象接口
//!
//! 提供按槽位解析组件实例的能力

use crate::slot::SlotKey;
use infrastructure_common::{DependencyError, TypeInfo};
use std::any::Any;
use std::sync::Arc;

/// 类型擦除后的组件实例
pub type ComponentInstance = Arc<dyn Any + Send + Sync>;

/// 组件解析器 trait
///
/// 负责按槽位返回组件实例；类型化的便捷方法见 [`ComponentResolverExt`]
pub trait ComponentResolver: Send + Sync {
    /// 解析槽位
    ///
    /// 未限定的槽位在同类型存在多个候选时，优先返回唯一的未限定组件
    fn resolve_slot(&self, key: &SlotKey) -> Result<ComponentInstance, DependencyError>;

    /// 解析指定类型的全部组件，多值槽位按排序值返回
    fn resolve_all_of(&self, type_info: &TypeInfo) -> Result<Vec<ComponentInstance>, DependencyError>;

    /// 槽位是否可解析
    fn contains_slot(&self, key: &SlotKey) -> bool;
}

/// 类型化解析扩展
pub trait ComponentResolverExt: ComponentResolver {
    /// 解析类型 `T` 的组件
    fn get<T: Send + Sync + 'static>(&self) -> Result<Arc<T>, DependencyError> {
        downcast(self.resolve_slot(&SlotKey::of::<T>())?)
    }

    /// 解析带限定名的组件
    fn get_named<T: Send + Sync + 'static>(&self, qualifier: &str) -> Result<Arc<T>, DependencyError> {
        downcast(self.resolve_slot(&SlotKey::named::<T>(qualifier))?)
    }

    /// 解析可选组件，不存在时返回 `None`
    fn get_optional<T: Send + Sync + 'static>(&self) -> Result<Option<Arc<T>>, DependencyError> {
        let key = SlotKey::of::<T>();
        if !self.contains_slot(&key) {
            return Ok(None);
        }
        downcast(self.resolve_slot(&key)?).map(Some)
    }

    /// 解析类型 `T` 的全部组件
    fn get_all<T: Send + Sync + 'static>(&self) -> Result<Vec<Arc<T>>, DependencyError> {
        self.resolve_all_of(&TypeInfo::of::<T>())?
            .into_iter()
            .map(downcast)
            .collect()
    }

    /// 是否存在类型 `T` 的组件
    fn contains<T: Send + Sync + 'static>(&self) -> bool {
        self.contains_slot(&SlotKey::of::<T>())
    }
}

impl<R: ComponentResolver + ?Sized> ComponentResolverExt for R {}

/// 将类型擦除的实例还原为具体类型
pub fn downcast<T: Send + Sync + 'static>(instance: ComponentInstance) -> Result<Arc<T>, DependencyError> {
    instance
        .downcast::<T>()
        .map_err(|_| DependencyError::TypeMismatch {
            expected: std::any::type_name::<T>().to_string(),
        })
}
