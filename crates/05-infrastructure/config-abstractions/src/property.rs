//! 属性解析接口

/// 属性解析器
///
/// 注册阶段的条件求值只读地查询此接口，实现必须是纯查询、无副作用
pub trait PropertyResolver: Send + Sync {
    /// 获取属性值
    fn get_property(&self, key: &str) -> Option<&str>;

    /// 检查属性是否存在
    fn contains_property(&self, key: &str) -> bool {
        self.get_property(key).is_some()
    }

    /// 当前激活的 profile
    fn active_profiles(&self) -> &[String];

    /// 检查 profile 表达式是否被接受
    ///
    /// 支持 `name` 与取反的 `!name`；没有激活任何 profile 时接受 `default`
    fn accepts_profile(&self, expression: &str) -> bool {
        let expression = expression.trim();
        if let Some(negated) = expression.strip_prefix('!') {
            return !self.accepts_profile(negated);
        }
        let active = self.active_profiles();
        if active.is_empty() {
            return expression == "default";
        }
        active.iter().any(|p| p == expression)
    }
}

/// 空属性解析器
#[derive(Debug, Default, Clone, Copy)]
pub struct EmptyPropertyResolver;

impl PropertyResolver for EmptyPropertyResolver {
    fn get_property(&self, _key: &str) -> Option<&str> {
        None
    }

    fn active_profiles(&self) -> &[String] {
        &[]
    }
}
