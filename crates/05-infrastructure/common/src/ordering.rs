//! 排序约定
//!
//! 数值越小越先参与排序，与多值槽位的求值顺序一致。

/// 最高优先级
pub const HIGHEST_PRECEDENCE: i32 = i32::MIN;

/// 最低优先级，未显式声明排序值的组件使用此值
pub const LOWEST_PRECEDENCE: i32 = i32::MAX;
