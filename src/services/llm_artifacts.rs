//! 基于 LLM 的附件生成
//!
//! 先让 LLM 写出简历/求职信正文，再渲染成 PDF。

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::services::collaborators::{ArtifactGenerator, GenerationError};
use crate::services::llm_service::LlmService;
use crate::services::pdf_writer::render_text_pdf;

/// 上游没有给出等待时间时的默认限流等待
pub const DEFAULT_RATE_LIMIT_WAIT: Duration = Duration::from_secs(20);

pub struct LlmArtifactGenerator {
    llm: Arc<LlmService>,
}

impl LlmArtifactGenerator {
    pub fn new(llm: Arc<LlmService>) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl ArtifactGenerator for LlmArtifactGenerator {
    async fn generate_resume(&self, job_description: &str) -> Result<Vec<u8>, GenerationError> {
        let text = self
            .llm
            .tailor_resume(job_description)
            .await
            .map_err(classify_llm_error)?;
        debug!("简历正文 {} 字符", text.len());
        Ok(render_text_pdf(&text))
    }

    async fn generate_cover_letter(
        &self,
        job_description: &str,
    ) -> Result<Vec<u8>, GenerationError> {
        let text = self
            .llm
            .write_cover_letter(job_description)
            .await
            .map_err(classify_llm_error)?;
        debug!("求职信正文 {} 字符", text.len());
        Ok(render_text_pdf(&text))
    }
}

/// 限流类错误转换为 `RateLimited`，其余保持为 `Failed`
fn classify_llm_error(err: anyhow::Error) -> GenerationError {
    if is_rate_limited(&err) {
        GenerationError::RateLimited {
            retry_after: DEFAULT_RATE_LIMIT_WAIT,
        }
    } else {
        GenerationError::Failed(err)
    }
}

fn is_rate_limited(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| {
        let message = cause.to_string().to_lowercase();
        message.contains("rate limit")
            || message.contains("rate_limit")
            || message.contains("429")
            || message.contains("too many requests")
    })
}
