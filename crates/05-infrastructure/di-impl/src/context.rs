//! 应用上下文
//!
//! 刷新完成后的只读组件表，可以在多个线程间共享

use crate::report::ConditionEvaluationReport;
use chrono::{DateTime, Utc};
use di_abstractions::{
    ComponentInstance, ComponentResolver, DependencyKind, FactoryDefinition, SlotKey,
};
use infrastructure_common::{ComponentMetadata, DependencyError, Lifetime, TypeInfo};
use once_cell::sync::OnceCell;
use std::any::TypeId;
use std::collections::HashMap;
use tracing::debug;

/// 已激活的组件
#[derive(Debug)]
pub(crate) struct ComponentEntry {
    pub(crate) definition: FactoryDefinition,
    instance: OnceCell<ComponentInstance>,
}

impl ComponentEntry {
    pub(crate) fn new(definition: FactoryDefinition) -> Self {
        Self {
            definition,
            instance: OnceCell::new(),
        }
    }
}

/// 槽位选择结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Selection {
    Found(usize),
    Missing,
    Ambiguous(Vec<usize>),
}

/// 应用上下文
///
/// 单例组件在上下文生命周期内只创建一次；原型组件每次解析都会创建新实例
#[derive(Debug)]
pub struct ApplicationContext {
    id: String,
    refreshed_at: DateTime<Utc>,
    entries: Vec<ComponentEntry>,
    /// 类型到组件序号，按排序值升序、声明顺序稳定排列
    by_type: HashMap<TypeId, Vec<usize>>,
    report: ConditionEvaluationReport,
}

impl ApplicationContext {
    pub(crate) fn new(entries: Vec<ComponentEntry>, report: ConditionEvaluationReport) -> Self {
        let mut by_type: HashMap<TypeId, Vec<usize>> = HashMap::new();
        for (index, entry) in entries.iter().enumerate() {
            by_type
                .entry(entry.definition.metadata.type_info.id)
                .or_default()
                .push(index);
        }
        for indices in by_type.values_mut() {
            indices.sort_by_key(|&index| entries[index].definition.order());
        }

        Self {
            id: uuid::Uuid::new_v4().to_string(),
            refreshed_at: Utc::now(),
            entries,
            by_type,
            report,
        }
    }

    /// 上下文ID
    pub fn id(&self) -> &str {
        &self.id
    }

    /// 刷新完成时间
    pub fn refreshed_at(&self) -> DateTime<Utc> {
        self.refreshed_at
    }

    /// 条件求值报告
    pub fn condition_report(&self) -> &ConditionEvaluationReport {
        &self.report
    }

    /// 激活的组件数量
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// 是否没有激活任何组件
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 激活的组件元数据，按声明顺序
    pub fn components(&self) -> impl Iterator<Item = &ComponentMetadata> {
        self.entries.iter().map(|entry| &entry.definition.metadata)
    }

    /// 按工厂名称查找组件元数据
    pub fn component(&self, name: &str) -> Option<&ComponentMetadata> {
        self.components().find(|metadata| metadata.name == name)
    }

    /// 是否激活了指定名称的组件
    pub fn contains_component(&self, name: &str) -> bool {
        self.component(name).is_some()
    }

    pub(crate) fn definition(&self, index: usize) -> Option<&FactoryDefinition> {
        self.entries.get(index).map(|entry| &entry.definition)
    }

    /// 单例组件是否已经创建
    pub fn is_instantiated(&self, name: &str) -> bool {
        self.entries
            .iter()
            .any(|entry| entry.definition.name() == name && entry.instance.get().is_some())
    }

    /// 选择槽位对应的组件
    ///
    /// 限定槽位只匹配同名组件；未限定槽位只有一个候选时直接使用，
    /// 多个候选时使用唯一的未限定组件
    pub(crate) fn select(&self, key: &SlotKey) -> Selection {
        let Some(indices) = self.by_type.get(&key.type_id()) else {
            return Selection::Missing;
        };

        let qualifier_of = |index: usize| self.entries[index].definition.metadata.qualifier.as_deref();
        let candidates: Vec<usize> = match &key.qualifier {
            Some(qualifier) => indices
                .iter()
                .copied()
                .filter(|&index| qualifier_of(index) == Some(qualifier.as_str()))
                .collect(),
            None => indices.clone(),
        };

        match candidates.len() {
            0 => Selection::Missing,
            1 => Selection::Found(candidates[0]),
            _ if key.qualifier.is_some() => Selection::Ambiguous(candidates),
            _ => {
                let primaries: Vec<usize> = candidates
                    .iter()
                    .copied()
                    .filter(|&index| qualifier_of(index).is_none())
                    .collect();
                if primaries.len() == 1 {
                    Selection::Found(primaries[0])
                } else {
                    Selection::Ambiguous(candidates)
                }
            }
        }
    }

    pub(crate) fn ambiguous(&self, key: &SlotKey, candidates: &[usize]) -> DependencyError {
        DependencyError::AmbiguousSlot {
            slot: key.to_string(),
            candidates: candidates
                .iter()
                .map(|&index| self.entries[index].definition.name().to_string())
                .collect(),
        }
    }

    /// 获取组件实例，单例在首次调用时创建
    pub(crate) fn instance_of(&self, index: usize) -> Result<ComponentInstance, DependencyError> {
        let entry = &self.entries[index];
        let scope = FactoryScope {
            context: self,
            factory: &entry.definition,
        };
        match entry.definition.metadata.lifetime {
            Lifetime::Prototype => entry.definition.create(&scope),
            Lifetime::Singleton => entry
                .instance
                .get_or_try_init(|| {
                    debug!("创建单例组件: {}", entry.definition.name());
                    entry.definition.create(&scope)
                })
                .cloned(),
        }
    }

    /// 按给定顺序创建所有声明为立即创建的单例
    pub(crate) fn instantiate_singletons(&self, order: &[usize]) -> Result<usize, DependencyError> {
        let mut created = 0;
        for &index in order {
            let metadata = &self.entries[index].definition.metadata;
            if metadata.lifetime == Lifetime::Singleton && metadata.eager {
                self.instance_of(index)?;
                created += 1;
            }
        }
        Ok(created)
    }
}

impl ComponentResolver for ApplicationContext {
    fn resolve_slot(&self, key: &SlotKey) -> Result<ComponentInstance, DependencyError> {
        match self.select(key) {
            Selection::Found(index) => self.instance_of(index),
            Selection::Missing => Err(DependencyError::ComponentNotRegistered {
                type_name: key.to_string(),
            }),
            Selection::Ambiguous(candidates) => Err(self.ambiguous(key, &candidates)),
        }
    }

    fn resolve_all_of(&self, type_info: &TypeInfo) -> Result<Vec<ComponentInstance>, DependencyError> {
        self.by_type
            .get(&type_info.id)
            .map(|indices| indices.iter().map(|&index| self.instance_of(index)).collect())
            .unwrap_or_else(|| Ok(Vec::new()))
    }

    fn contains_slot(&self, key: &SlotKey) -> bool {
        matches!(self.select(key), Selection::Found(_))
    }
}

/// 工厂执行期间使用的解析器，只允许解析工厂声明过的依赖
struct FactoryScope<'a> {
    context: &'a ApplicationContext,
    factory: &'a FactoryDefinition,
}

impl FactoryScope<'_> {
    fn ensure_declared(&self, type_info: &TypeInfo, qualifier: Option<&str>) -> Result<(), DependencyError> {
        let declared = self.factory.dependencies.iter().any(|dependency| {
            dependency.type_info == *type_info
                && (dependency.kind == DependencyKind::All
                    || dependency.qualifier.as_deref() == qualifier)
        });
        if declared {
            Ok(())
        } else {
            let slot = SlotKey {
                type_info: *type_info,
                qualifier: qualifier.map(str::to_string),
            };
            Err(DependencyError::UndeclaredDependency {
                factory: self.factory.name().to_string(),
                dependency: slot.to_string(),
            })
        }
    }
}

impl ComponentResolver for FactoryScope<'_> {
    fn resolve_slot(&self, key: &SlotKey) -> Result<ComponentInstance, DependencyError> {
        self.ensure_declared(&key.type_info, key.qualifier.as_deref())?;
        self.context.resolve_slot(key)
    }

    fn resolve_all_of(&self, type_info: &TypeInfo) -> Result<Vec<ComponentInstance>, DependencyError> {
        self.ensure_declared(type_info, None)?;
        self.context.resolve_all_of(type_info)
    }

    fn contains_slot(&self, key: &SlotKey) -> bool {
        self.ensure_declared(&key.type_info, key.qualifier.as_deref()).is_ok()
            && self.context.contains_slot(key)
    }
}
