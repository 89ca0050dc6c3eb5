//! 批量投递处理器 - 编排层
//!
//! ## 职责
//!
//! 本模块是整个应用的入口，负责职位列表的处理和资源管理。
//!
//! ## 核心功能
//!
//! 1. **应用初始化**：日志文件、浏览器会话、答案库、LLM 协作方
//! 2. **批量加载**：读取待投递职位（`Vec<Job>`）
//! 3. **顺序投递**：同一浏览器会话中逐个投递，不并发填写表单
//! 4. **资源管理**：持有 Browser 和页面驱动，确保生命周期正确
//! 5. **全局统计**：汇总成功 / 跳过 / 失败数量

use std::sync::Arc;

use anyhow::Result;
use chromiumoxide::Browser;
use tracing::{info, warn};

use crate::browser;
use crate::config::Config;
use crate::infrastructure::{ChromePage, JsExecutor};
use crate::models::Job;
use crate::orchestrator::job_runner::{self, JobStats};
use crate::services::redirect_guard::RedirectGuard;
use crate::services::waits::{Waits, DEFAULT_POLL_INTERVAL};
use crate::services::{AnswerStore, ArtifactService, FailureWriter, LlmArtifactGenerator, LlmService};
use crate::utils::logging::{init_log_file, log_jobs_loaded, log_startup, print_final_stats};
use crate::utils::Pacer;
use crate::workflow::{ApplyFlow, FlowOptions};

/// 职位页面地址特征，连接已有浏览器时优先复用
const JOB_PAGE_HINT: &str = "linkedin.com/jobs";

/// 应用主结构
pub struct App {
    config: Config,
    _browser: Browser,
    driver: ChromePage,
    flow: ApplyFlow,
    failures: FailureWriter,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> Result<Self> {
        init_log_file(&config.output_log_file)?;
        log_startup(config.headless, &config.answers_file);

        let (browser, page) = if config.headless {
            browser::launch_headless_browser(config.chrome_executable.as_deref()).await?
        } else {
            browser::connect_to_browser_and_page(config.browser_debug_port, Some(JOB_PAGE_HINT))
                .await?
        };
        let driver = ChromePage::new(JsExecutor::new(page));

        let store = AnswerStore::load(&config.answers_file);

        let llm = Arc::new(LlmService::new(&config).with_resume_profile(load_resume_profile(&config).await));
        let artifacts = ArtifactService::new(
            Arc::new(LlmArtifactGenerator::new(llm.clone())),
            &config.generated_dir,
        );

        let resume_path = config.usable_resume_path();
        if config.resume_path.is_some() && resume_path.is_none() {
            warn!("⚠️ 配置的简历文件不存在，将为每个职位生成简历");
        }

        let pacer = if config.human_pacing {
            Pacer::human()
        } else {
            Pacer::instant()
        };
        let options = FlowOptions {
            waits: Waits::new(config.wait_timeout(), DEFAULT_POLL_INTERVAL),
            pacer,
            redirect: RedirectGuard::with_defaults(config.redirect_max_attempts)?,
            resume_path,
            max_steps: config.max_steps,
        };
        let flow = ApplyFlow::new(llm, artifacts, store, options);
        let failures = FailureWriter::with_path(&config.failure_log_file);

        Ok(Self {
            config,
            _browser: browser,
            driver,
            flow,
            failures,
        })
    }

    /// 运行应用主逻辑
    pub async fn run(&mut self) -> Result<()> {
        let mut jobs = self.load_jobs().await?;

        if jobs.is_empty() {
            warn!("⚠️ 没有待投递的职位，程序结束");
            return Ok(());
        }
        log_jobs_loaded(jobs.len());

        let mut stats = JobStats::default();
        for (index, job) in jobs.iter_mut().enumerate() {
            job_runner::process_job(
                &mut self.flow,
                &self.driver,
                job,
                index + 1,
                &self.failures,
                &mut stats,
            )
            .await;
        }

        info!("📒 答案库共 {} 条", self.flow.store().len());
        print_final_stats(
            stats.applied,
            stats.skipped,
            stats.failed,
            &self.config.output_log_file,
        );

        Ok(())
    }

    async fn load_jobs(&self) -> Result<Vec<Job>> {
        info!("\n📁 正在读取职位列表: {}", self.config.jobs_file);
        crate::models::load_jobs(&self.config.jobs_file).await
    }
}

/// 读取简历资料，缺失时以空资料继续
async fn load_resume_profile(config: &Config) -> String {
    match tokio::fs::read_to_string(&config.resume_profile).await {
        Ok(profile) => profile,
        Err(e) => {
            warn!(
                "⚠️ 无法读取简历资料 {}: {}，将不带简历背景生成内容",
                config.resume_profile, e
            );
            String::new()
        }
    }
}
