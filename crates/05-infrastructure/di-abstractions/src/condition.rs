//! 激活条件
//!
//! 条件在注册阶段求值一次，只读取属性快照、能力集合与已激活的组件类型。
//! 同一个工厂上声明的多个条件按"全部满足"组合。

use crate::capability::Capabilities;
use config_abstractions::PropertyResolver;
use infrastructure_common::TypeInfo;
use std::fmt;
use std::sync::Arc;

/// 条件求值上下文
pub trait ConditionContext {
    /// 属性快照
    fn properties(&self) -> &dyn PropertyResolver;

    /// 能力集合
    fn capabilities(&self) -> &Capabilities;

    /// 是否已有该类型的组件被激活
    fn has_component(&self, type_info: &TypeInfo) -> bool;
}

/// 自定义条件谓词
pub type ConditionPredicate = Arc<dyn Fn(&dyn ConditionContext) -> bool + Send + Sync>;

/// 组件激活条件
#[derive(Clone)]
pub enum Condition {
    /// 属性条件
    OnProperty(PropertyCondition),
    /// 具备指定能力
    OnCapability(String),
    /// 不具备指定能力
    OnMissingCapability(String),
    /// 已存在该类型的组件
    OnComponent(TypeInfo),
    /// 不存在该类型的组件（用户覆盖时内置组件退让）
    OnMissingComponent(TypeInfo),
    /// profile 表达式，支持 `!name`
    OnProfile(String),
    /// 任一子条件满足
    AnyOf(Vec<Condition>),
    /// 子条件不满足
    Not(Box<Condition>),
    /// 自定义条件
    Custom {
        /// 条件描述，用于报告
        description: String,
        /// 谓词
        predicate: ConditionPredicate,
    },
}

impl Condition {
    /// 属性条件
    pub fn on_property(name: impl Into<String>) -> PropertyCondition {
        PropertyCondition::new(name)
    }

    /// 具备能力
    pub fn on_capability(flag: impl Into<String>) -> Self {
        Self::OnCapability(flag.into())
    }

    /// 不具备能力
    pub fn on_missing_capability(flag: impl Into<String>) -> Self {
        Self::OnMissingCapability(flag.into())
    }

    /// 已存在类型 `T` 的组件
    pub fn on_component<T: ?Sized + 'static>() -> Self {
        Self::OnComponent(TypeInfo::of::<T>())
    }

    /// 不存在类型 `T` 的组件
    pub fn on_missing_component<T: ?Sized + 'static>() -> Self {
        Self::OnMissingComponent(TypeInfo::of::<T>())
    }

    /// profile 条件
    pub fn on_profile(expression: impl Into<String>) -> Self {
        Self::OnProfile(expression.into())
    }

    /// 任一满足
    pub fn any_of(conditions: impl IntoIterator<Item = Condition>) -> Self {
        Self::AnyOf(conditions.into_iter().collect())
    }

    /// 取反
    pub fn not(condition: impl Into<Condition>) -> Self {
        Self::Not(Box::new(condition.into()))
    }

    /// 自定义条件
    pub fn custom<F>(description: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&dyn ConditionContext) -> bool + Send + Sync + 'static,
    {
        Self::Custom {
            description: description.into(),
            predicate: Arc::new(predicate),
        }
    }

    /// 求值
    pub fn evaluate(&self, context: &dyn ConditionContext) -> ConditionOutcome {
        match self {
            Self::OnProperty(condition) => condition.evaluate(context.properties()),
            Self::OnCapability(flag) => {
                if context.capabilities().contains(flag) {
                    ConditionOutcome::matched(format!("具备能力 {}", flag))
                } else {
                    ConditionOutcome::no_match(format!("缺少能力 {}", flag))
                }
            }
            Self::OnMissingCapability(flag) => {
                if context.capabilities().contains(flag) {
                    ConditionOutcome::no_match(format!("已具备能力 {}", flag))
                } else {
                    ConditionOutcome::matched(format!("未具备能力 {}", flag))
                }
            }
            Self::OnComponent(type_info) => {
                if context.has_component(type_info) {
                    ConditionOutcome::matched(format!("找到组件 {}", type_info))
                } else {
                    ConditionOutcome::no_match(format!("未找到组件 {}", type_info))
                }
            }
            Self::OnMissingComponent(type_info) => {
                if context.has_component(type_info) {
                    ConditionOutcome::no_match(format!("已存在组件 {}，退让", type_info))
                } else {
                    ConditionOutcome::matched(format!("未找到组件 {}", type_info))
                }
            }
            Self::OnProfile(expression) => {
                if context.properties().accepts_profile(expression) {
                    ConditionOutcome::matched(format!("profile {} 被接受", expression))
                } else {
                    ConditionOutcome::no_match(format!("profile {} 未被接受", expression))
                }
            }
            Self::AnyOf(conditions) => {
                let outcomes: Vec<ConditionOutcome> =
                    conditions.iter().map(|c| c.evaluate(context)).collect();
                let message = outcomes
                    .iter()
                    .map(|o| o.message.as_str())
                    .collect::<Vec<_>>()
                    .join("; ");
                if outcomes.iter().any(|o| o.matched) {
                    ConditionOutcome::matched(format!("任一满足: {}", message))
                } else {
                    ConditionOutcome::no_match(format!("全部不满足: {}", message))
                }
            }
            Self::Not(inner) => {
                let outcome = inner.evaluate(context);
                ConditionOutcome {
                    matched: !outcome.matched,
                    message: format!("取反 ({})", outcome.message),
                }
            }
            Self::Custom {
                description,
                predicate,
            } => ConditionOutcome {
                matched: predicate(context),
                message: description.clone(),
            },
        }
    }

    /// 条件引用的组件类型，注册阶段据此调整求值顺序
    pub fn referenced_types(&self) -> Vec<TypeInfo> {
        match self {
            Self::OnComponent(type_info) | Self::OnMissingComponent(type_info) => vec![*type_info],
            Self::AnyOf(conditions) => conditions.iter().flat_map(Self::referenced_types).collect(),
            Self::Not(inner) => inner.referenced_types(),
            _ => Vec::new(),
        }
    }
}

impl fmt::Debug for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OnProperty(condition) => f.debug_tuple("OnProperty").field(condition).finish(),
            Self::OnCapability(flag) => f.debug_tuple("OnCapability").field(flag).finish(),
            Self::OnMissingCapability(flag) => f.debug_tuple("OnMissingCapability").field(flag).finish(),
            Self::OnComponent(t) => f.debug_tuple("OnComponent").field(&t.full_name).finish(),
            Self::OnMissingComponent(t) => f.debug_tuple("OnMissingComponent").field(&t.full_name).finish(),
            Self::OnProfile(expression) => f.debug_tuple("OnProfile").field(expression).finish(),
            Self::AnyOf(conditions) => f.debug_tuple("AnyOf").field(conditions).finish(),
            Self::Not(inner) => f.debug_tuple("Not").field(inner).finish(),
            Self::Custom { description, .. } => f
                .debug_struct("Custom")
                .field("description", description)
                .finish_non_exhaustive(),
        }
    }
}

/// 属性条件
///
/// - 属性缺失时结果为 `match_if_missing`
/// - 未指定期望值时，属性值不为 `false` 即匹配
/// - 指定期望值时按忽略大小写比较
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyCondition {
    /// 属性名
    pub name: String,
    /// 期望值
    pub having_value: Option<String>,
    /// 属性缺失时是否匹配
    pub match_if_missing: bool,
}

impl PropertyCondition {
    /// 创建属性条件
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            having_value: None,
            match_if_missing: false,
        }
    }

    /// 设置期望值
    pub fn having_value(mut self, value: impl Into<String>) -> Self {
        self.having_value = Some(value.into());
        self
    }

    /// 属性缺失时是否匹配
    pub fn match_if_missing(mut self, match_if_missing: bool) -> Self {
        self.match_if_missing = match_if_missing;
        self
    }

    /// 求值
    pub fn evaluate(&self, properties: &dyn PropertyResolver) -> ConditionOutcome {
        let Some(value) = properties.get_property(&self.name) else {
            return if self.match_if_missing {
                ConditionOutcome::matched(format!("属性 {} 缺失，按缺失匹配", self.name))
            } else {
                ConditionOutcome::no_match(format!("属性 {} 缺失", self.name))
            };
        };

        let matched = match &self.having_value {
            Some(expected) => value.eq_ignore_ascii_case(expected),
            None => !value.eq_ignore_ascii_case("false"),
        };
        let expectation = self.having_value.as_deref().unwrap_or("!false");
        let message = format!("属性 {} = {:?}，期望 {}", self.name, value, expectation);
        if matched {
            ConditionOutcome::matched(message)
        } else {
            ConditionOutcome::no_match(message)
        }
    }
}

impl From<PropertyCondition> for Condition {
    fn from(condition: PropertyCondition) -> Self {
        Self::OnProperty(condition)
    }
}

/// 条件求值结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConditionOutcome {
    /// 是否匹配
    pub matched: bool,
    /// 说明
    pub message: String,
}

impl ConditionOutcome {
    /// 匹配
    pub fn matched(message: impl Into<String>) -> Self {
        Self {
            matched: true,
            message: message.into(),
        }
    }

    /// 不匹配
    pub fn no_match(message: impl Into<String>) -> Self {
        Self {
            matched: false,
            message: message.into(),
        }
    }
}
