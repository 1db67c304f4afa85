//! 条件求值报告

use di_abstractions::ConditionOutcome;
use infrastructure_common::FactoryOrigin;
use std::fmt;

/// 单个工厂的条件求值结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FactoryEvaluation {
    /// 工厂名称
    pub factory: String,
    /// 所属配置
    pub configuration: Option<String>,
    /// 组件来源
    pub origin: FactoryOrigin,
    /// 是否激活
    pub matched: bool,
    /// 已求值的条件结果，遇到第一个不满足的条件即停止
    pub outcomes: Vec<ConditionOutcome>,
}

/// 条件求值报告
#[derive(Debug, Clone, Default)]
pub struct ConditionEvaluationReport {
    evaluations: Vec<FactoryEvaluation>,
}

impl ConditionEvaluationReport {
    /// 创建空报告
    pub fn new() -> Self {
        Self::default()
    }

    /// 记录一个工厂的求值结果
    pub fn record(&mut self, evaluation: FactoryEvaluation) {
        self.evaluations.push(evaluation);
    }

    /// 激活的工厂
    pub fn positive_matches(&self) -> impl Iterator<Item = &FactoryEvaluation> {
        self.evaluations.iter().filter(|e| e.matched)
    }

    /// 被跳过的工厂
    pub fn negative_matches(&self) -> impl Iterator<Item = &FactoryEvaluation> {
        self.evaluations.iter().filter(|e| !e.matched)
    }

    /// 查找工厂的求值结果
    pub fn evaluation(&self, factory: &str) -> Option<&FactoryEvaluation> {
        self.evaluations.iter().find(|e| e.factory == factory)
    }

    /// 记录数量
    pub fn len(&self) -> usize {
        self.evaluations.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.evaluations.is_empty()
    }
}

fn write_section<'a>(
    f: &mut fmt::Formatter<'_>,
    title: &str,
    evaluations: impl Iterator<Item = &'a FactoryEvaluation>,
) -> fmt::Result {
    writeln!(f, "{}:", title)?;
    writeln!(f, "{}", "-".repeat(title.len() + 1))?;
    let mut empty = true;
    for evaluation in evaluations {
        empty = false;
        match &evaluation.configuration {
            Some(configuration) => writeln!(f, "   {} ({}):", evaluation.factory, configuration)?,
            None => writeln!(f, "   {}:", evaluation.factory)?,
        }
        if evaluation.outcomes.is_empty() {
            writeln!(f, "      - 无条件")?;
        }
        for outcome in &evaluation.outcomes {
            writeln!(f, "      - {}", outcome.message)?;
        }
    }
    if empty {
        writeln!(f, "    None")?;
    }
    writeln!(f)
}

impl fmt::Display for ConditionEvaluationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f)?;
        writeln!(f, "============================")?;
        writeln!(f, "CONDITIONS EVALUATION REPORT")?;
        writeln!(f, "============================")?;
        writeln!(f)?;
        write_section(f, "Positive matches", self.positive_matches())?;
        write_section(f, "Negative matches", self.negative_matches())
    }
}
