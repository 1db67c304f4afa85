//! 组件注册表构建器
//!
//! 收集工厂声明，并在 [`RegistryBuilder::refresh`] 中完成条件求值、依赖校验与单例创建

use crate::context::{ApplicationContext, ComponentEntry, Selection};
use crate::graph::DependencyGraph;
use crate::report::{ConditionEvaluationReport, FactoryEvaluation};
use config_abstractions::PropertyResolver;
use di_abstractions::{
    Capabilities, Cardinality, ComponentRegistry, Condition, ConditionContext, Configuration,
    DependencyKind, FactoryDefinition, SlotKey,
};
use infrastructure_common::{DependencyError, FactoryOrigin, StartupRecorder, TypeInfo};
use std::any::TypeId;
use std::collections::{HashMap, HashSet};
use tracing::{debug, info};

/// 组件注册表构建器
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    factories: Vec<FactoryDefinition>,
    names: HashSet<String>,
    cardinalities: HashMap<TypeId, Cardinality>,
}

impl RegistryBuilder {
    /// 创建新的注册表构建器
    pub fn new() -> Self {
        Self::default()
    }

    /// 应用配置
    ///
    /// 配置中的工厂会带上来源、配置名称、配置级条件，未显式排序的工厂继承配置的排序值
    pub fn apply_configuration(
        &mut self,
        configuration: &dyn Configuration,
        origin: FactoryOrigin,
    ) -> Result<(), DependencyError> {
        debug!("应用配置: {} ({})", configuration.name(), origin);
        let mut scope = ConfigurationScope {
            registry: self,
            name: configuration.name().to_string(),
            origin,
            order: configuration.order(),
            conditions: configuration.conditions(),
        };
        configuration.configure(&mut scope)
    }

    /// 已声明的工厂数量
    pub fn len(&self) -> usize {
        self.factories.len()
    }

    /// 是否没有声明任何工厂
    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }

    fn cardinality(&self, type_info: &TypeInfo) -> Cardinality {
        self.cardinalities
            .get(&type_info.id)
            .copied()
            .unwrap_or_default()
    }

    /// 执行注册流程并生成只读的应用上下文
    ///
    /// 任何失败都会终止启动，不会返回部分初始化的上下文
    pub fn refresh(
        self,
        properties: &dyn PropertyResolver,
        capabilities: &Capabilities,
    ) -> Result<ApplicationContext, DependencyError> {
        self.refresh_recorded(properties, capabilities, &mut StartupRecorder::disabled())
    }

    /// 执行注册流程，并把各阶段耗时写入启动记录器
    pub fn refresh_recorded(
        self,
        properties: &dyn PropertyResolver,
        capabilities: &Capabilities,
        recorder: &mut StartupRecorder,
    ) -> Result<ApplicationContext, DependencyError> {
        info!("刷新组件注册表: {} 个工厂", self.factories.len());

        let step = recorder
            .start("registry.graph.sort")
            .tag("factories", self.factories.len().to_string());
        let graph = DependencyGraph::build(&self.factories);
        let order = graph.topological_order(&self.factories)?;
        recorder.end(step);

        let step = recorder.start("registry.conditions.evaluate");

        let mut report = ConditionEvaluationReport::new();
        let mut activated_types = HashSet::new();
        let mut slot_owners: HashMap<SlotKey, usize> = HashMap::new();
        let mut active = vec![false; self.factories.len()];

        for &index in &order {
            let factory = &self.factories[index];
            let context = EvaluationContext {
                properties,
                capabilities,
                activated_types: &activated_types,
            };

            let mut outcomes = Vec::with_capacity(factory.conditions.len());
            let mut matched = true;
            for condition in &factory.conditions {
                let outcome = condition.evaluate(&context);
                debug!(
                    "条件求值: {} -> {} ({})",
                    factory.name(),
                    if outcome.matched { "匹配" } else { "不匹配" },
                    outcome.message
                );
                matched = outcome.matched;
                outcomes.push(outcome);
                if !matched {
                    break;
                }
            }

            report.record(FactoryEvaluation {
                factory: factory.name().to_string(),
                configuration: factory.metadata.configuration.clone(),
                origin: factory.origin(),
                matched,
                outcomes,
            });
            if !matched {
                continue;
            }

            let slot = factory.slot();
            if self.cardinality(&slot.type_info) == Cardinality::Single {
                if let Some(&owner) = slot_owners.get(&slot) {
                    return Err(DependencyError::AmbiguousSlot {
                        slot: slot.to_string(),
                        candidates: vec![
                            self.factories[owner].name().to_string(),
                            factory.name().to_string(),
                        ],
                    });
                }
                slot_owners.insert(slot, index);
            }

            activated_types.insert(factory.metadata.type_info.id);
            active[index] = true;
        }
        recorder.end(step.tag("matched", active.iter().filter(|&&a| a).count().to_string()));

        // 上下文中的组件保持声明顺序，多值槽位据此稳定排序
        let mut entry_of = vec![None; self.factories.len()];
        let mut entries = Vec::new();
        for (index, factory) in self.factories.into_iter().enumerate() {
            if active[index] {
                entry_of[index] = Some(entries.len());
                entries.push(ComponentEntry::new(factory));
            }
        }
        let skipped = report.negative_matches().count();
        let context = ApplicationContext::new(entries, report);
        let creation_order: Vec<usize> = order.iter().filter_map(|&index| entry_of[index]).collect();

        let step = recorder.start("registry.dependencies.validate");
        validate_dependencies(&context, &creation_order)?;
        recorder.end(step);
        debug!("{}", context.condition_report());

        let step = recorder.start("registry.singletons.instantiate");
        let created = context.instantiate_singletons(&creation_order)?;
        recorder.end(step.tag("created", created.to_string()));
        info!(
            "组件注册表刷新完成: {} 个组件激活, {} 个跳过, {} 个单例已创建",
            context.len(),
            skipped,
            created
        );
        Ok(context)
    }
}

impl ComponentRegistry for RegistryBuilder {
    fn register(&mut self, factory: FactoryDefinition) -> Result<(), DependencyError> {
        if !self.names.insert(factory.name().to_string()) {
            return Err(DependencyError::RegistrationError {
                type_name: factory.metadata.type_info.to_string(),
                message: format!("工厂名称重复: {}", factory.name()),
            });
        }
        debug!(
            "注册工厂: {} -> {} (order: {}, {})",
            factory.name(),
            factory.slot(),
            factory.order(),
            factory.metadata.lifetime
        );
        self.factories.push(factory);
        Ok(())
    }

    fn declare_slot(&mut self, type_info: TypeInfo, cardinality: Cardinality) {
        self.cardinalities.insert(type_info.id, cardinality);
    }

    fn contains_factory(&self, key: &SlotKey) -> bool {
        self.factories.iter().any(|factory| factory.slot() == *key)
    }
}

/// 检查每个激活组件声明的依赖都能唯一解析
fn validate_dependencies(context: &ApplicationContext, order: &[usize]) -> Result<(), DependencyError> {
    for factory in order.iter().filter_map(|&index| context.definition(index)) {
        for dependency in &factory.dependencies {
            if dependency.kind == DependencyKind::All {
                continue;
            }
            let slot = dependency.slot();
            match context.select(&slot) {
                Selection::Found(_) => {}
                Selection::Missing if dependency.kind == DependencyKind::Optional => {}
                Selection::Missing => {
                    return Err(DependencyError::MissingDependency {
                        factory: factory.name().to_string(),
                        dependency: dependency.to_string(),
                    });
                }
                Selection::Ambiguous(candidates) => return Err(context.ambiguous(&slot, &candidates)),
            }
        }
    }
    Ok(())
}

/// 配置作用域内的注册表
struct ConfigurationScope<'a> {
    registry: &'a mut RegistryBuilder,
    name: String,
    origin: FactoryOrigin,
    order: i32,
    conditions: Vec<Condition>,
}

impl ComponentRegistry for ConfigurationScope<'_> {
    fn register(&mut self, mut factory: FactoryDefinition) -> Result<(), DependencyError> {
        factory.metadata.origin = self.origin;
        factory.metadata.configuration = Some(self.name.clone());
        factory.inherit_order(self.order);
        if !self.conditions.is_empty() {
            let mut conditions = self.conditions.clone();
            conditions.append(&mut factory.conditions);
            factory.conditions = conditions;
        }
        self.registry.register(factory)
    }

    fn declare_slot(&mut self, type_info: TypeInfo, cardinality: Cardinality) {
        self.registry.declare_slot(type_info, cardinality);
    }

    fn contains_factory(&self, key: &SlotKey) -> bool {
        self.registry.contains_factory(key)
    }
}

/// 条件求值上下文
struct EvaluationContext<'a> {
    properties: &'a dyn PropertyResolver,
    capabilities: &'a Capabilities,
    activated_types: &'a HashSet<TypeId>,
}

impl ConditionContext for EvaluationContext<'_> {
    fn properties(&self) -> &dyn PropertyResolver {
        self.properties
    }

    fn capabilities(&self) -> &Capabilities {
        self.capabilities
    }

    fn has_component(&self, type_info: &TypeInfo) -> bool {
        self.activated_types.contains(&type_info.id)
    }
}
