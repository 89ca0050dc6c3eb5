//! 附件服务 - 业务能力层
//!
//! 调用附件生成能力，把结果写入输出目录，并在上传前做大小和格式校验。

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use tokio::fs;
use tokio::time::sleep;
use tracing::{info, warn};

use crate::error::{AppResult, ApplyError, ArtifactViolation};
use crate::models::Job;
use crate::services::collaborators::{ArtifactGenerator, GenerationError};

/// 上传文件大小上限：2 MiB
pub const MAX_ARTIFACT_BYTES: u64 = 2 * 1024 * 1024;

/// 允许上传的扩展名（不区分大小写）
pub const ALLOWED_EXTENSIONS: &[&str] = &["pdf", "doc", "docx"];

/// 限流时的最大尝试次数
pub const MAX_GENERATION_ATTEMPTS: usize = 3;

/// 校验待上传文件，通过时返回文件大小
///
/// 扩展名不合法时无论大小都拒绝。
pub fn validate_artifact(path: &Path) -> AppResult<u64> {
    let invalid = |violation| ApplyError::ArtifactInvalid {
        path: path.display().to_string(),
        violation,
    };

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default()
        .to_lowercase();
    if !ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
        return Err(invalid(ArtifactViolation::UnsupportedExtension { extension }));
    }

    let size = std::fs::metadata(path)?.len();
    if size > MAX_ARTIFACT_BYTES {
        return Err(invalid(ArtifactViolation::TooLarge {
            size,
            limit: MAX_ARTIFACT_BYTES,
        }));
    }

    Ok(size)
}

#[derive(Debug, Clone, Copy)]
enum ArtifactKind {
    Resume,
    CoverLetter,
}

impl ArtifactKind {
    fn file_prefix(self) -> &'static str {
        match self {
            ArtifactKind::Resume => "CV",
            ArtifactKind::CoverLetter => "Cover_Letter",
        }
    }

    fn label(self) -> &'static str {
        match self {
            ArtifactKind::Resume => "简历",
            ArtifactKind::CoverLetter => "求职信",
        }
    }
}

/// 附件服务
pub struct ArtifactService {
    generator: Arc<dyn ArtifactGenerator>,
    output_dir: PathBuf,
    max_attempts: usize,
}

impl ArtifactService {
    pub fn new(generator: Arc<dyn ArtifactGenerator>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            generator,
            output_dir: output_dir.into(),
            max_attempts: MAX_GENERATION_ATTEMPTS,
        }
    }

    /// 为职位生成简历并校验，返回文件的绝对路径
    pub async fn create_resume(&self, job: &Job) -> AppResult<PathBuf> {
        self.create(job, ArtifactKind::Resume).await
    }

    /// 为职位生成求职信并校验，返回文件的绝对路径
    pub async fn create_cover_letter(&self, job: &Job) -> AppResult<PathBuf> {
        self.create(job, ArtifactKind::CoverLetter).await
    }

    async fn create(&self, job: &Job, kind: ArtifactKind) -> AppResult<PathBuf> {
        info!("📝 正在生成{}: {}", kind.label(), job);
        let bytes = self.generate_with_retry(&job.description, kind).await?;

        fs::create_dir_all(&self.output_dir)
            .await
            .with_context(|| format!("无法创建附件目录: {}", self.output_dir.display()))?;

        let path = self.unique_path(kind).await;
        fs::write(&path, &bytes)
            .await
            .with_context(|| format!("无法写入附件: {}", path.display()))?;

        let size = validate_artifact(&path)?;
        let path = fs::canonicalize(&path).await?;
        info!("✓ {}已生成: {} ({} 字节)", kind.label(), path.display(), size);
        Ok(path)
    }

    async fn generate_with_retry(&self, description: &str, kind: ArtifactKind) -> AppResult<Vec<u8>> {
        let mut attempt = 1;
        loop {
            let result = match kind {
                ArtifactKind::Resume => self.generator.generate_resume(description).await,
                ArtifactKind::CoverLetter => self.generator.generate_cover_letter(description).await,
            };

            match result {
                Ok(bytes) => return Ok(bytes),
                Err(GenerationError::RateLimited { retry_after }) if attempt < self.max_attempts => {
                    warn!(
                        "⏳ 生成{}被限流，{} 秒后进行第 {}/{} 次尝试",
                        kind.label(),
                        retry_after.as_secs(),
                        attempt + 1,
                        self.max_attempts
                    );
                    sleep(retry_after).await;
                    attempt += 1;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// `CV_<unix-ts>.pdf`，同一秒内重名时追加序号
    async fn unique_path(&self, kind: ArtifactKind) -> PathBuf {
        let ts = chrono::Utc::now().timestamp();
        let mut path = self
            .output_dir
            .join(format!("{}_{}.pdf", kind.file_prefix(), ts));
        let mut n = 1;
        while fs::try_exists(&path).await.unwrap_or(false) {
            path = self
                .output_dir
                .join(format!("{}_{}_{}.pdf", kind.file_prefix(), ts, n));
            n += 1;
        }
        path
    }
}
