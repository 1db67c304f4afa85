//! 组件注册表抽象接口

use crate::factory::{Factory, FactoryDefinition};
use crate::slot::{Cardinality, SlotKey};
use infrastructure_common::{DependencyError, TypeInfo};

/// 组件注册表 trait
///
/// 配置通过注册表声明工厂与槽位基数；注册只记录声明，条件求值与实例化在刷新时进行
pub trait ComponentRegistry {
    /// 注册工厂定义
    fn register(&mut self, factory: FactoryDefinition) -> Result<(), DependencyError>;

    /// 声明类型的槽位基数
    fn declare_slot(&mut self, type_info: TypeInfo, cardinality: Cardinality);

    /// 是否已有工厂声明产生该槽位
    fn contains_factory(&self, key: &SlotKey) -> bool;
}

/// 类型化注册扩展
pub trait ComponentRegistryExt: ComponentRegistry {
    /// 注册类型化工厂
    fn register_factory<T: Send + Sync + 'static>(&mut self, factory: Factory<T>) -> Result<(), DependencyError> {
        self.register(factory.into_definition())
    }

    /// 声明类型 `T` 为有序多值槽位
    fn declare_ordered<T: ?Sized + 'static>(&mut self) {
        self.declare_slot(TypeInfo::of::<T>(), Cardinality::Ordered);
    }
}

impl<R: ComponentRegistry + ?Sized> ComponentRegistryExt for R {}
