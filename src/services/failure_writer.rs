//! 失败记录服务 - 业务能力层
//!
//! 只负责"写 failed.txt"能力，不关心流程

use anyhow::Result;
use std::fs::OpenOptions;
use std::io::Write;
use tracing::debug;

use crate::models::Job;

/// 失败记录服务
///
/// 每个投递失败的职位追加一行：时间、职位链接、标题和错误详情。
pub struct FailureWriter {
    path: String,
}

impl FailureWriter {
    pub fn new() -> Self {
        Self {
            path: "failed.txt".to_string(),
        }
    }

    /// 使用自定义文件路径创建
    pub fn with_path(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }

    pub fn write(&self, job: &Job, detail: &str) -> Result<()> {
        debug!("写入失败记录: {} | {}", job.link, detail);

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        // 每条记录占一行
        let detail = detail.split_whitespace().collect::<Vec<_>>().join(" ");
        let line = format!(
            "{} | {} | {} | {}\n",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
            job.link,
            job.title,
            detail
        );

        file.write_all(line.as_bytes())?;

        Ok(())
    }
}

impl Default for FailureWriter {
    fn default() -> Self {
        Self::new()
    }
}
