//! 外部协作方接口
//!
//! 问题回答与附件生成都依赖外部能力（通常是 LLM），工作流只通过这里的 trait 调用它们。

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{Job, QuestionKind};

/// 上传框用途
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadPurpose {
    Resume,
    CoverLetter,
}

/// 协作方给出的答案
///
/// `persist` 为 false 的答案（兜底值、随时间变化的值）只用于本次填写，不写入答案库。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedAnswer {
    pub value: String,
    pub persist: bool,
}

impl ResolvedAnswer {
    /// 协作方真正给出的答案，可以复用
    pub fn answered(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            persist: true,
        }
    }

    /// 只用于本次填写的答案
    pub fn one_off(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            persist: false,
        }
    }
}

/// 问题回答能力
#[async_trait]
pub trait QuestionAnswerer: Send + Sync {
    /// 设置当前职位，后续回答以它为上下文
    async fn set_job(&self, job: &Job);

    /// 判断上传框标签对应简历还是求职信
    async fn classify_upload_purpose(&self, label: &str) -> anyhow::Result<UploadPurpose>;

    /// 为答案库里没有的问题生成答案
    ///
    /// `Choice` 类型返回的答案必须是 `options` 中的一项。
    async fn resolve_answer(
        &self,
        question: &str,
        kind: QuestionKind,
        options: &[String],
    ) -> anyhow::Result<ResolvedAnswer>;
}

/// 附件生成错误
#[derive(Debug, Error)]
pub enum GenerationError {
    /// 上游限流，等待 `retry_after` 后可重试
    #[error("上游限流，{}s 后重试", .retry_after.as_secs())]
    RateLimited { retry_after: Duration },

    #[error(transparent)]
    Failed(#[from] anyhow::Error),
}

/// 附件生成能力，返回文档的原始字节
#[async_trait]
pub trait ArtifactGenerator: Send + Sync {
    async fn generate_resume(&self, job_description: &str) -> Result<Vec<u8>, GenerationError>;

    async fn generate_cover_letter(
        &self,
        job_description: &str,
    ) -> Result<Vec<u8>, GenerationError>;
}
