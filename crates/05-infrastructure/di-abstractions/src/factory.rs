//! 组件工厂定义
//!
//! 工厂负责产生某个槽位的组件实例，并声明自己的依赖与激活条件

use crate::condition::Condition;
use crate::resolver::{ComponentInstance, ComponentResolver};
use crate::slot::SlotKey;
use infrastructure_common::{ComponentMetadata, DependencyError, FactoryOrigin, Lifetime, TypeInfo};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// 类型擦除的创建函数
pub type CreateFn =
    Arc<dyn Fn(&dyn ComponentResolver) -> anyhow::Result<ComponentInstance> + Send + Sync>;

/// 依赖类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DependencyKind {
    /// 必需的单个组件
    Required,
    /// 可选的单个组件
    Optional,
    /// 该类型的全部组件
    All,
}

/// 工厂声明的依赖
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dependency {
    /// 依赖类型
    pub type_info: TypeInfo,
    /// 限定名
    pub qualifier: Option<String>,
    /// 依赖类型
    pub kind: DependencyKind,
}

impl Dependency {
    /// 必需依赖
    pub fn required<T: ?Sized + 'static>() -> Self {
        Self::new::<T>(None, DependencyKind::Required)
    }

    /// 带限定名的必需依赖
    pub fn named<T: ?Sized + 'static>(qualifier: impl Into<String>) -> Self {
        Self::new::<T>(Some(qualifier.into()), DependencyKind::Required)
    }

    /// 可选依赖
    pub fn optional<T: ?Sized + 'static>() -> Self {
        Self::new::<T>(None, DependencyKind::Optional)
    }

    /// 全部组件
    pub fn all<T: ?Sized + 'static>() -> Self {
        Self::new::<T>(None, DependencyKind::All)
    }

    fn new<T: ?Sized + 'static>(qualifier: Option<String>, kind: DependencyKind) -> Self {
        Self {
            type_info: TypeInfo::of::<T>(),
            qualifier,
            kind,
        }
    }

    /// 依赖对应的槽位
    pub fn slot(&self) -> SlotKey {
        SlotKey {
            type_info: self.type_info,
            qualifier: self.qualifier.clone(),
        }
    }
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            DependencyKind::All => write!(f, "all {}", self.type_info),
            DependencyKind::Optional => write!(f, "optional {}", self.slot()),
            DependencyKind::Required => write!(f, "{}", self.slot()),
        }
    }
}

/// 工厂定义（类型擦除）
#[derive(Clone)]
pub struct FactoryDefinition {
    /// 组件元数据
    pub metadata: ComponentMetadata,
    /// 声明的依赖
    pub dependencies: Vec<Dependency>,
    /// 激活条件，全部满足才会激活
    pub conditions: Vec<Condition>,
    /// 是否显式设置了排序值
    explicit_order: bool,
    create: CreateFn,
}

impl FactoryDefinition {
    /// 创建工厂定义
    pub fn new(metadata: ComponentMetadata, create: CreateFn) -> Self {
        Self {
            metadata,
            dependencies: Vec::new(),
            conditions: Vec::new(),
            explicit_order: false,
            create,
        }
    }

    /// 工厂名称
    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    /// 产生的槽位
    pub fn slot(&self) -> SlotKey {
        SlotKey {
            type_info: self.metadata.type_info,
            qualifier: self.metadata.qualifier.clone(),
        }
    }

    /// 排序值
    pub fn order(&self) -> i32 {
        self.metadata.order
    }

    /// 设置排序值
    pub fn set_order(&mut self, order: i32) {
        self.metadata.order = order;
        self.explicit_order = true;
    }

    /// 未显式设置排序值时继承配置的排序值
    pub fn inherit_order(&mut self, order: i32) {
        if !self.explicit_order {
            self.metadata.order = order;
        }
    }

    /// 组件来源
    pub fn origin(&self) -> FactoryOrigin {
        self.metadata.origin
    }

    /// 条件引用的所有组件类型
    pub fn condition_types(&self) -> Vec<TypeInfo> {
        self.conditions.iter().flat_map(Condition::referenced_types).collect()
    }

    /// 调用工厂创建实例
    ///
    /// 工厂内部抛出的依赖错误原样传递，其余错误包装为创建失败
    pub fn create(&self, resolver: &dyn ComponentResolver) -> Result<ComponentInstance, DependencyError> {
        (self.create)(resolver).map_err(|error| match error.downcast::<DependencyError>() {
            Ok(dependency_error) => dependency_error,
            Err(other) => DependencyError::creation_failed(self.metadata.name.clone(), other),
        })
    }
}

impl fmt::Debug for FactoryDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FactoryDefinition")
            .field("metadata", &self.metadata)
            .field("dependencies", &self.dependencies)
            .field("conditions", &self.conditions)
            .field("create", &"<function>")
            .finish()
    }
}

/// 类型化工厂构建器
///
/// ```rust,ignore
/// let factory = Factory::<SecurityFilterChain>::new("actuatorSecurity", |deps| {
///     let http = deps.get::<HttpSecurity>()?;
///     Ok(http.build("actuator"))
/// })
/// .depends_on::<HttpSecurity>()
/// .order(1);
/// ```
pub struct Factory<T> {
    definition: FactoryDefinition,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Send + Sync + 'static> Factory<T> {
    /// 使用创建函数定义工厂
    pub fn new<F>(name: impl Into<String>, create: F) -> Self
    where
        F: Fn(&dyn ComponentResolver) -> anyhow::Result<T> + Send + Sync + 'static,
    {
        let create: CreateFn = Arc::new(move |resolver: &dyn ComponentResolver| {
            let instance: ComponentInstance = Arc::new(create(resolver)?);
            Ok(instance)
        });
        Self::from_create(name, create)
    }

    /// 使用现成的实例定义工厂
    pub fn instance(name: impl Into<String>, instance: T) -> Self {
        let instance: ComponentInstance = Arc::new(instance);
        let create: CreateFn = Arc::new(move |_: &dyn ComponentResolver| Ok(Arc::clone(&instance)));
        Self::from_create(name, create)
    }

    fn from_create(name: impl Into<String>, create: CreateFn) -> Self {
        Self {
            definition: FactoryDefinition::new(
                ComponentMetadata::new(TypeInfo::of::<T>(), name),
                create,
            ),
            _marker: PhantomData,
        }
    }

    /// 设置限定名
    pub fn qualifier(mut self, qualifier: impl Into<String>) -> Self {
        self.definition.metadata.qualifier = Some(qualifier.into());
        self
    }

    /// 声明必需依赖
    pub fn depends_on<D: ?Sized + 'static>(self) -> Self {
        self.dependency(Dependency::required::<D>())
    }

    /// 声明带限定名的必需依赖
    pub fn depends_on_named<D: ?Sized + 'static>(self, qualifier: impl Into<String>) -> Self {
        self.dependency(Dependency::named::<D>(qualifier))
    }

    /// 声明可选依赖
    pub fn depends_on_optional<D: ?Sized + 'static>(self) -> Self {
        self.dependency(Dependency::optional::<D>())
    }

    /// 声明依赖该类型的全部组件
    pub fn depends_on_all<D: ?Sized + 'static>(self) -> Self {
        self.dependency(Dependency::all::<D>())
    }

    /// 声明依赖
    pub fn dependency(mut self, dependency: Dependency) -> Self {
        self.definition.dependencies.push(dependency);
        self
    }

    /// 添加激活条件
    pub fn when(mut self, condition: impl Into<Condition>) -> Self {
        self.definition.conditions.push(condition.into());
        self
    }

    /// 设置排序值
    pub fn order(mut self, order: i32) -> Self {
        self.definition.set_order(order);
        self
    }

    /// 原型作用域，每次解析创建新实例
    pub fn prototype(mut self) -> Self {
        self.definition.metadata.lifetime = Lifetime::Prototype;
        self
    }

    /// 在刷新时立即创建单例，创建失败即启动失败
    pub fn eager(mut self) -> Self {
        self.definition.metadata.eager = true;
        self
    }

    /// 设置描述
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.definition.metadata.description = Some(description.into());
        self
    }

    /// 转换为类型擦除的定义
    pub fn into_definition(self) -> FactoryDefinition {
        self.definition
    }
}

impl<T: Send + Sync + 'static> From<Factory<T>> for FactoryDefinition {
    fn from(factory: Factory<T>) -> Self {
        factory.into_definition()
    }
}
