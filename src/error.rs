use std::fmt;

use thiserror::Error;

use crate::services::collaborators::GenerationError;

/// 投递流程错误类型
///
/// 组件内部的瞬时问题（单个定位策略落空、单次中间页跳转）在各自的上限内重试，
/// 超出上限后转换为下列错误之一并向上传递到 `ApplyFlow`。
#[derive(Debug, Error)]
pub enum ApplyError {
    /// 所有定位策略、所有轮次都没有找到可交互元素
    #[error("未找到可交互元素: {target} (已尝试 {rounds} 轮)")]
    NotFound {
        target: String,
        rounds: usize,
        /// 失败时的页面源码，用于排查
        page_source: String,
    },

    /// 单次等待超时
    #[error("等待超时: {what} ({timeout_ms} ms)")]
    Timeout { what: String, timeout_ms: u64 },

    /// 被重定向到中间页且无法返回，属于策略性拦截，不再重试
    #[error("被重定向到中间页，{attempts} 次返回后仍停留在: {url}")]
    RedirectLoop { url: String, attempts: usize },

    /// 生成的附件不满足上传要求，不会盲目重新生成
    #[error("附件不符合上传要求 ({path}): {violation}")]
    ArtifactInvalid {
        path: String,
        violation: ArtifactViolation,
    },

    /// 远端表单校验失败，错误文本原样保留
    #[error("表单校验失败: {}", .errors.join(" | "))]
    ValidationFailed { errors: Vec<String> },

    /// 答案库不可读（加载时降级为空库，不会终止运行）
    #[error("答案库损坏 ({path}): {reason}")]
    StoreCorrupt { path: String, reason: String },

    /// 超过最大步骤数仍未到达提交
    #[error("超过最大步骤数 {max_steps}，仍未到达提交步骤")]
    StepLimitExceeded { max_steps: usize },

    #[error("附件生成失败: {0}")]
    Generation(#[from] GenerationError),

    #[error("文件错误: {0}")]
    Io(#[from] std::io::Error),

    /// 浏览器驱动或外部协作方的底层错误
    #[error(transparent)]
    Driver(#[from] anyhow::Error),
}

/// 附件校验失败原因
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactViolation {
    TooLarge { size: u64, limit: u64 },
    UnsupportedExtension { extension: String },
}

impl fmt::Display for ArtifactViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArtifactViolation::TooLarge { size, limit } => {
                write!(f, "文件大小 {} 字节超过上限 {} 字节", size, limit)
            }
            ArtifactViolation::UnsupportedExtension { extension } => {
                write!(f, "不支持的文件格式 '{}'，仅支持 pdf/doc/docx", extension)
            }
        }
    }
}

impl ApplyError {
    /// 创建等待超时错误
    pub fn timeout(what: impl Into<String>, timeout: std::time::Duration) -> Self {
        ApplyError::Timeout {
            what: what.into(),
            timeout_ms: timeout.as_millis() as u64,
        }
    }

    /// 是否为终止性错误（调用方不应对同一职位重试）
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ApplyError::RedirectLoop { .. }
                | ApplyError::ArtifactInvalid { .. }
                | ApplyError::ValidationFailed { .. }
        )
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, ApplyError>;
