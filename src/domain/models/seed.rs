// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

/// 默认最大重试次数
pub const DEFAULT_MAX_RETRY: u32 = 3;

/// 种子实体
///
/// 表示一个待处理的抓取工作单元。种子由种子存储或处理结果
/// （派生种子）产生，在一次处理尝试内只被调度器和处理器独占修改，
/// 到达终态后由种子存储归档。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Seed {
    /// 种子唯一标识符
    pub id: Uuid,
    /// 种子内容，通常是URL
    pub data: String,
    /// 当前状态
    pub status: SeedStatus,
    /// 已重试次数
    pub retry: u32,
    /// 最大重试次数
    pub max_retry: u32,
    /// 派生深度，初始种子为0
    pub depth: u32,
    /// 创建时间
    pub created_at: DateTime<Utc>,
}

/// 种子状态枚举
///
/// 单次处理尝试内状态单调流转：
/// Init/Retrying → Running → Success/Fail/Retrying
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SeedStatus {
    /// 新建，尚未处理
    #[default]
    Init,
    /// 处理中
    Running,
    /// 处理成功
    Success,
    /// 最终失败，不会再次入队
    Fail,
    /// 等待重试
    Retrying,
}

impl fmt::Display for SeedStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SeedStatus::Init => write!(f, "init"),
            SeedStatus::Running => write!(f, "running"),
            SeedStatus::Success => write!(f, "success"),
            SeedStatus::Fail => write!(f, "fail"),
            SeedStatus::Retrying => write!(f, "retrying"),
        }
    }
}

impl FromStr for SeedStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "init" => Ok(SeedStatus::Init),
            "running" => Ok(SeedStatus::Running),
            "success" => Ok(SeedStatus::Success),
            "fail" => Ok(SeedStatus::Fail),
            "retrying" => Ok(SeedStatus::Retrying),
            _ => Err(()),
        }
    }
}

/// 领域错误类型
#[derive(Error, Debug, PartialEq, Eq)]
pub enum DomainError {
    /// 状态转换不符合种子生命周期
    #[error("Invalid seed state transition from {from} to {to}")]
    InvalidStateTransition { from: SeedStatus, to: SeedStatus },
}

impl Seed {
    /// 创建一个新的种子
    ///
    /// # 参数
    ///
    /// * `data` - 种子内容
    pub fn new(data: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            data: data.into(),
            status: SeedStatus::Init,
            retry: 0,
            max_retry: DEFAULT_MAX_RETRY,
            depth: 0,
            created_at: Utc::now(),
        }
    }

    /// 设置最大重试次数
    pub fn with_max_retry(mut self, max_retry: u32) -> Self {
        self.max_retry = max_retry;
        self
    }

    /// 设置派生深度
    pub fn with_depth(mut self, depth: u32) -> Self {
        self.depth = depth;
        self
    }

    /// 从当前种子派生一个新种子
    ///
    /// 新种子继承最大重试次数，深度加一
    pub fn derive(&self, data: impl Into<String>) -> Self {
        Seed::new(data)
            .with_max_retry(self.max_retry)
            .with_depth(self.depth + 1)
    }

    /// 开始一次处理尝试
    ///
    /// 将状态从Init或Retrying变更为Running
    ///
    /// # 返回值
    ///
    /// * `Ok(())` - 状态转换成功
    /// * `Err(DomainError)` - 当前状态不允许开始处理
    pub fn start(&mut self) -> Result<(), DomainError> {
        match self.status {
            SeedStatus::Init | SeedStatus::Retrying => {
                self.status = SeedStatus::Running;
                Ok(())
            }
            from => Err(DomainError::InvalidStateTransition {
                from,
                to: SeedStatus::Running,
            }),
        }
    }

    /// 标记处理成功
    pub fn succeed(&mut self) -> Result<(), DomainError> {
        match self.status {
            SeedStatus::Running => {
                self.status = SeedStatus::Success;
                Ok(())
            }
            from => Err(DomainError::InvalidStateTransition {
                from,
                to: SeedStatus::Success,
            }),
        }
    }

    /// 申请重试
    ///
    /// 未达到最大重试次数时计数加一并进入Retrying，
    /// 否则直接进入Fail，计数不会超过最大重试次数。
    pub fn retry(&mut self) {
        if self.retry >= self.max_retry {
            self.status = SeedStatus::Fail;
        } else {
            self.retry += 1;
            self.status = SeedStatus::Retrying;
        }
    }

    /// 标记最终失败
    pub fn fail(&mut self) {
        self.status = SeedStatus::Fail;
    }

    /// 是否处于终态
    pub fn is_terminal(&self) -> bool {
        matches!(self.status, SeedStatus::Success | SeedStatus::Fail)
    }
}
