use crate::models::job::{Job, JobList};
use anyhow::{Context, Result};
use std::path::Path;
use tokio::fs;

/// 从 TOML 文件加载待投递职位
///
/// 文件格式：
/// ```toml
/// [[jobs]]
/// link = "https://www.linkedin.com/jobs/view/123"
/// title = "Backend Engineer"
/// company = "Acme"
/// ```
///
/// 没有链接的条目会被跳过。
pub async fn load_jobs(jobs_file: impl AsRef<Path>) -> Result<Vec<Job>> {
    let path = jobs_file.as_ref();
    if !path.exists() {
        anyhow::bail!("职位列表文件不存在: {}", path.display());
    }

    let content = fs::read_to_string(path)
        .await
        .with_context(|| format!("无法读取职位列表: {}", path.display()))?;

    let list: JobList = toml::from_str(&content)
        .with_context(|| format!("无法解析职位列表: {}", path.display()))?;

    let total = list.jobs.len();
    let jobs: Vec<Job> = list
        .jobs
        .into_iter()
        .filter(|job| {
            let keep = !job.link.trim().is_empty();
            if !keep {
                tracing::warn!("跳过没有链接的职位: {}", job.title);
            }
            keep
        })
        .collect();

    tracing::info!("成功加载 {}/{} 个职位", jobs.len(), total);
    Ok(jobs)
}
