//! 工厂依赖图
//!
//! 节点是工厂在注册表中的声明序号，边指向必须先于它处理的工厂

use di_abstractions::FactoryDefinition;
use infrastructure_common::{DependencyError, FactoryOrigin};
use std::any::TypeId;
use std::cmp::Reverse;
use std::collections::{BTreeSet, BinaryHeap, HashMap};

/// 工厂依赖图
#[derive(Debug, Clone)]
pub struct DependencyGraph {
    /// 每个节点的前置节点
    prerequisites: Vec<BTreeSet<usize>>,
    /// 每个节点的后继节点
    dependents: Vec<Vec<usize>>,
}

impl DependencyGraph {
    /// 根据工厂声明构建依赖图
    ///
    /// - 依赖某类型的工厂排在该类型所有提供者之后（限定依赖只关联同名提供者）
    /// - 条件引用的类型同样产生排序边，但不指向自身；两个都提供该类型且都对其带条件的工厂，
    ///   只有后声明的等待先声明的
    pub fn build(factories: &[FactoryDefinition]) -> Self {
        let mut producers: HashMap<TypeId, Vec<usize>> = HashMap::new();
        for (index, factory) in factories.iter().enumerate() {
            producers
                .entry(factory.metadata.type_info.id)
                .or_default()
                .push(index);
        }

        let condition_types: Vec<Vec<TypeId>> = factories
            .iter()
            .map(|f| f.condition_types().iter().map(|t| t.id).collect())
            .collect();

        let mut prerequisites = vec![BTreeSet::new(); factories.len()];
        for (index, factory) in factories.iter().enumerate() {
            for dependency in &factory.dependencies {
                let Some(candidates) = producers.get(&dependency.type_info.id) else {
                    continue;
                };
                for &producer in candidates {
                    let qualifier_matches = dependency.qualifier.is_none()
                        || factories[producer].metadata.qualifier == dependency.qualifier;
                    if qualifier_matches {
                        prerequisites[index].insert(producer);
                    }
                }
            }

            for type_id in &condition_types[index] {
                let Some(candidates) = producers.get(type_id) else {
                    continue;
                };
                let competes = factory.metadata.type_info.id == *type_id;
                for &producer in candidates {
                    if producer == index {
                        continue;
                    }
                    // 同一槽位的竞争者之间只有后声明的等待先声明的
                    if competes && producer > index && condition_types[producer].contains(type_id) {
                        continue;
                    }
                    prerequisites[index].insert(producer);
                }
            }
        }

        let mut dependents = vec![Vec::new(); factories.len()];
        for (index, prereqs) in prerequisites.iter().enumerate() {
            for &prereq in prereqs {
                dependents[prereq].push(index);
            }
        }

        Self {
            prerequisites,
            dependents,
        }
    }

    /// 节点数量
    pub fn len(&self) -> usize {
        self.prerequisites.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.prerequisites.is_empty()
    }

    /// 节点的前置节点
    pub fn prerequisites(&self, node: usize) -> impl Iterator<Item = usize> + '_ {
        self.prerequisites[node].iter().copied()
    }

    /// 拓扑排序
    ///
    /// 同层节点按来源（用户组件优先于自动配置）再按声明顺序排列；存在环时返回完整的环路径
    pub fn topological_order(&self, factories: &[FactoryDefinition]) -> Result<Vec<usize>, DependencyError> {
        let mut in_degree: Vec<usize> = self.prerequisites.iter().map(BTreeSet::len).collect();
        let rank = |index: usize| -> Reverse<(FactoryOrigin, usize)> {
            Reverse((factories[index].origin(), index))
        };

        let mut ready: BinaryHeap<_> = in_degree
            .iter()
            .enumerate()
            .filter(|(_, degree)| **degree == 0)
            .map(|(index, _)| rank(index))
            .collect();

        let mut order = Vec::with_capacity(self.len());
        while let Some(Reverse((_, index))) = ready.pop() {
            order.push(index);
            for &dependent in &self.dependents[index] {
                in_degree[dependent] -= 1;
                if in_degree[dependent] == 0 {
                    ready.push(rank(dependent));
                }
            }
        }

        if order.len() < self.len() {
            let cycle = self.find_cycle(&in_degree);
            return Err(DependencyError::CircularDependency {
                cycle: cycle.into_iter().map(|i| factories[i].name().to_string()).collect(),
            });
        }
        Ok(order)
    }

    /// 从剩余的最小节点出发，沿第一个未处理的前置节点走到重复节点为止
    fn find_cycle(&self, in_degree: &[usize]) -> Vec<usize> {
        let remaining = |node: usize| in_degree[node] > 0;
        let Some(start) = (0..self.len()).find(|&node| remaining(node)) else {
            return Vec::new();
        };

        let mut path = vec![start];
        let mut current = start;
        loop {
            let Some(next) = self.prerequisites(current).find(|&p| remaining(p)) else {
                return path;
            };
            if let Some(position) = path.iter().position(|&node| node == next) {
                let mut cycle = path.split_off(position);
                cycle.push(next);
                return cycle;
            }
            path.push(next);
            current = next;
        }
    }
}
