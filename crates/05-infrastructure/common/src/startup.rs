//! 启动步骤记录
//!
//! 记录启动过程中各阶段的耗时，缓冲区写满后丢弃后续步骤

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::{Duration, Instant};

/// 已完成的启动步骤
#[derive(Debug, Clone, Serialize)]
pub struct StartupStep {
    /// 步骤序号，按开始顺序递增
    pub id: usize,
    /// 步骤名称
    pub name: String,
    /// 附加标签
    pub tags: BTreeMap<String, String>,
    /// 开始时间
    pub started_at: DateTime<Utc>,
    /// 耗时
    pub duration: Duration,
}

/// 进行中的启动步骤
#[derive(Debug)]
#[must_use = "步骤需要交给 StartupRecorder::end 才会被记录"]
pub struct PendingStep {
    id: usize,
    name: String,
    tags: BTreeMap<String, String>,
    started_at: DateTime<Utc>,
    instant: Instant,
}

impl PendingStep {
    /// 添加标签
    pub fn tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }
}

/// 有界的启动步骤记录器
#[derive(Debug, Clone, Default)]
pub struct StartupRecorder {
    capacity: usize,
    enabled: bool,
    next_id: usize,
    steps: Vec<StartupStep>,
    dropped: usize,
}

impl StartupRecorder {
    /// 不记录任何步骤
    pub fn disabled() -> Self {
        Self::default()
    }

    /// 最多缓冲 `capacity` 个步骤
    pub fn buffering(capacity: usize) -> Self {
        Self {
            capacity,
            enabled: true,
            ..Self::default()
        }
    }

    /// 是否启用
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// 缓冲区容量
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// 开始一个步骤
    pub fn start(&mut self, name: impl Into<String>) -> PendingStep {
        let id = self.next_id;
        self.next_id += 1;
        PendingStep {
            id,
            name: name.into(),
            tags: BTreeMap::new(),
            started_at: Utc::now(),
            instant: Instant::now(),
        }
    }

    /// 结束步骤并写入缓冲区
    pub fn end(&mut self, step: PendingStep) {
        if !self.enabled {
            return;
        }
        if self.steps.len() >= self.capacity {
            self.dropped += 1;
            return;
        }
        self.steps.push(StartupStep {
            id: step.id,
            name: step.name,
            tags: step.tags,
            started_at: step.started_at,
            duration: step.instant.elapsed(),
        });
    }

    /// 已记录的步骤，按完成顺序排列
    pub fn steps(&self) -> &[StartupStep] {
        &self.steps
    }

    /// 因缓冲区已满而丢弃的步骤数
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    /// 所有已记录步骤的名称
    pub fn step_names(&self) -> Vec<&str> {
        self.steps.iter().map(|step| step.name.as_str()).collect()
    }
}
