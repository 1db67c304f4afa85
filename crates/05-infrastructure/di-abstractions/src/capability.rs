//! 能力标记
//!
//! 以显式的能力集合代替"某个库是否存在"的隐式判断

use std::collections::BTreeSet;

/// 启动时传入的能力集合
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Capabilities {
    flags: BTreeSet<String>,
}

impl Capabilities {
    /// 创建空的能力集合
    pub fn new() -> Self {
        Self::default()
    }

    /// 添加能力
    pub fn with(mut self, flag: impl Into<String>) -> Self {
        self.insert(flag);
        self
    }

    /// 插入能力
    pub fn insert(&mut self, flag: impl Into<String>) {
        self.flags.insert(flag.into());
    }

    /// 是否具备指定能力
    pub fn contains(&self, flag: &str) -> bool {
        self.flags.contains(flag)
    }

    /// 遍历所有能力
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.flags.iter().map(String::as_str)
    }

    /// 能力数量
    pub fn len(&self) -> usize {
        self.flags.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for Capabilities {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            flags: iter.into_iter().map(Into::into).collect(),
        }
    }
}
