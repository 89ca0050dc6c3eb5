//! 单个职位处理器 - 编排层
//!
//! ## 职责
//!
//! 把一个职位交给 `ApplyFlow`，并把结果计入统计。
//!
//! ## 核心功能
//!
//! 1. **流程调度**：调用 `ApplyFlow::apply_to_job`
//! 2. **失败记录**：失败的职位写入 failed.txt
//! 3. **统计输出**：记录成功/跳过/失败数量

use tracing::{error, info, warn};

use crate::infrastructure::PageDriver;
use crate::models::Job;
use crate::services::FailureWriter;
use crate::workflow::{ApplyFlow, WorkflowOutcome};

/// 投递统计
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct JobStats {
    pub applied: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl JobStats {
    pub fn total(&self) -> usize {
        self.applied + self.skipped + self.failed
    }
}

/// 处理单个职位
///
/// # 参数
/// - `flow`: 投递流程（跨职位复用，持有答案库）
/// - `driver`: 页面驱动
/// - `job`: 待投递职位，流程中采集到的信息会回填
/// - `job_index`: 职位序号（用于日志）
/// - `failures`: 失败记录
/// - `stats`: 累计统计
pub async fn process_job(
    flow: &mut ApplyFlow,
    driver: &dyn PageDriver,
    job: &mut Job,
    job_index: usize,
    failures: &FailureWriter,
    stats: &mut JobStats,
) -> WorkflowOutcome {
    log_job_start(job_index, job);

    let outcome = flow.apply_to_job(driver, job).await;
    match &outcome {
        WorkflowOutcome::Applied => {
            stats.applied += 1;
            info!("[职位 {}] ✅ 已投递", job_index);
        }
        WorkflowOutcome::Skipped { reason } => {
            stats.skipped += 1;
            warn!("[职位 {}] ⏭️ 已跳过: {}", job_index, reason);
        }
        WorkflowOutcome::Failed(e) => {
            stats.failed += 1;
            if let Err(write_err) = failures.write(job, &e.to_string()) {
                error!("[职位 {}] 写入失败记录出错: {}", job_index, write_err);
            }
        }
    }

    outcome
}

fn log_job_start(job_index: usize, job: &Job) {
    info!("\n{}", "─".repeat(60));
    info!("[职位 {}] 🔗 {}", job_index, job.link);
    info!("[职位 {}] 💼 {}", job_index, job.title);
    if !job.company.is_empty() {
        info!("[职位 {}] 🏢 {}", job_index, job.company);
    }
}
