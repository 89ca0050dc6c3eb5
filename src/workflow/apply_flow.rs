//! 单个职位的投递流程 - 流程层
//!
//! 打开职位 → 中间页检查 → 定位 Easy Apply → 记录描述/招聘人 → 点击
//! → 循环 { 填写当前步骤 → 推进提交状态机 } → 成功
//!
//! 任何一步出错都会先撤销进行中的申请（关闭弹窗并确认放弃），再把原始错误交给调用方。

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::error::{AppResult, ApplyError};
use crate::infrastructure::{ElementHandle, Matcher, PageDriver};
use crate::models::Job;
use crate::services::answer_store::AnswerStore;
use crate::services::artifact_service::ArtifactService;
use crate::services::collaborators::QuestionAnswerer;
use crate::services::element_locator::ElementLocator;
use crate::services::redirect_guard::RedirectGuard;
use crate::services::waits::Waits;
use crate::utils::logging::truncate_text;
use crate::utils::Pacer;
use crate::workflow::apply_ctx::ApplyCtx;
use crate::workflow::form_step::FormStepProcessor;
use crate::workflow::selectors::*;
use crate::workflow::submission::{SubmissionState, SubmissionStateMachine};

/// 单个职位的最终结果
#[derive(Debug)]
pub enum WorkflowOutcome {
    Applied,
    /// 没有找到 Easy Apply 按钮
    Skipped { reason: String },
    /// 已尝试回滚
    Failed(ApplyError),
}

impl WorkflowOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, WorkflowOutcome::Applied)
    }
}

/// 流程参数
pub struct FlowOptions {
    pub waits: Waits,
    pub pacer: Pacer,
    pub redirect: RedirectGuard,
    /// 预先准备好的简历
    pub resume_path: Option<PathBuf>,
    pub max_steps: usize,
}

/// 投递流程
///
/// 持有答案库，同一时间只操作一个页面。
pub struct ApplyFlow {
    answerer: Arc<dyn QuestionAnswerer>,
    store: AnswerStore,
    locator: ElementLocator,
    steps: FormStepProcessor,
    redirect: RedirectGuard,
    pacer: Pacer,
    max_steps: usize,
    jobs_seen: usize,
}

impl ApplyFlow {
    pub fn new(
        answerer: Arc<dyn QuestionAnswerer>,
        artifacts: ArtifactService,
        store: AnswerStore,
        options: FlowOptions,
    ) -> Self {
        let steps = FormStepProcessor::new(
            answerer.clone(),
            artifacts,
            options.resume_path,
            options.waits,
            options.pacer,
        );
        Self {
            answerer,
            store,
            locator: ElementLocator::new(options.waits, options.pacer),
            steps,
            redirect: options.redirect,
            pacer: options.pacer,
            max_steps: options.max_steps,
            jobs_seen: 0,
        }
    }

    pub fn store(&self) -> &AnswerStore {
        &self.store
    }

    /// 投递一个职位
    ///
    /// 职位的描述、招聘人链接和生成的附件路径会被回填到 `job`。
    pub async fn apply_to_job(&mut self, driver: &dyn PageDriver, job: &mut Job) -> WorkflowOutcome {
        self.jobs_seen += 1;
        let mut ctx = ApplyCtx::new(self.jobs_seen);
        info!("{} 🎯 开始投递: {}", ctx, job);

        let trigger = match self.acquire_trigger(driver, job).await {
            Ok(trigger) => trigger,
            Err(ApplyError::NotFound { target, rounds, .. }) => {
                self.discard_application(driver).await;
                let reason = format!("{} 轮定位后仍未找到{}", rounds, target);
                warn!("{} ⏭️ 跳过: {}", ctx, reason);
                return WorkflowOutcome::Skipped { reason };
            }
            Err(e) => {
                self.discard_application(driver).await;
                error!("{} ❌ 投递失败: {}", ctx, e);
                return WorkflowOutcome::Failed(e);
            }
        };

        match self.run(driver, job, trigger, &mut ctx).await {
            Ok(()) => {
                info!("{} ✅ 投递成功: {}", ctx, job.title);
                WorkflowOutcome::Applied
            }
            Err(e) => {
                error!("{} ❌ 投递失败: {}", ctx, e);
                self.discard_application(driver).await;
                WorkflowOutcome::Failed(e)
            }
        }
    }

    /// 打开职位页面并定位 Easy Apply 按钮
    async fn acquire_trigger(&self, driver: &dyn PageDriver, job: &Job) -> AppResult<ElementHandle> {
        driver.navigate(&job.link).await?;
        self.pacer.pause(3_000, 5_000).await;
        self.redirect.check(driver, &job.link).await?;

        // 清除可能挡住按钮的焦点
        driver.blur_active().await?;
        self.locate_trigger(driver, job).await
    }

    async fn locate_trigger(&self, driver: &dyn PageDriver, job: &Job) -> AppResult<ElementHandle> {
        self.locator
            .locate_guarded(driver, &apply_trigger_target(), Some((&self.redirect, job.link.as_str())))
            .await
    }

    async fn run(
        &mut self,
        driver: &dyn PageDriver,
        job: &mut Job,
        mut trigger: ElementHandle,
        ctx: &mut ApplyCtx,
    ) -> AppResult<()> {
        if self.redirect.check(driver, &job.link).await? {
            debug!("{} 职位页已重新打开，重新定位 Easy Apply", ctx);
            trigger = self.locate_trigger(driver, job).await?;
        }

        let description = self.capture_description(driver).await?;
        debug!("{} 职位描述: {}", ctx, truncate_text(&description, 80));
        job.set_description(description);
        job.set_recruiter_link(self.capture_recruiter(driver).await);

        driver.click(trigger).await?;
        self.pacer.pause(1_500, 2_500).await;
        self.answerer.set_job(job).await;

        let mut machine = SubmissionStateMachine::new(self.locator.clone(), self.pacer);
        for _ in 0..self.max_steps {
            ctx.next_step();
            self.steps.process(driver, job, &mut self.store, ctx).await?;

            match machine.advance(driver).await? {
                SubmissionState::Submitted => return Ok(()),
                SubmissionState::ValidationFailed(errors) => {
                    return Err(ApplyError::ValidationFailed { errors })
                }
                SubmissionState::StepSubmittedContinue | SubmissionState::AwaitingStep => {
                    debug!("{} 进入下一步", ctx);
                }
            }
        }

        Err(ApplyError::StepLimitExceeded {
            max_steps: self.max_steps,
        })
    }

    /// 读取职位描述，先展开"查看更多"
    async fn capture_description(&self, driver: &dyn PageDriver) -> AppResult<String> {
        match driver
            .find_first(None, &Matcher::xpath(SEE_MORE_DESCRIPTION))
            .await
        {
            Ok(Some(button)) => match driver.click(button).await {
                Ok(()) => self.pacer.pause(2_000, 3_000).await,
                Err(e) => debug!("展开职位描述失败: {}", e),
            },
            Ok(None) => {}
            Err(e) => debug!("查找'查看更多'按钮失败: {}", e),
        }

        for selector in [DESCRIPTION, DESCRIPTION_PREMIUM] {
            if let Some(element) = driver.find_first(None, &Matcher::css(selector)).await? {
                return Ok(driver.text(element).await?.trim().to_string());
            }
        }

        Err(ApplyError::NotFound {
            target: "职位描述".to_string(),
            rounds: 1,
            page_source: driver.page_source().await.unwrap_or_default(),
        })
    }

    /// 读取招聘人主页链接，找不到不算错误
    async fn capture_recruiter(&self, driver: &dyn PageDriver) -> Option<String> {
        let heading = match driver
            .find_first(None, &Matcher::xpath(HIRING_TEAM_HEADING))
            .await
        {
            Ok(Some(heading)) => heading,
            Ok(None) => {
                debug!("没有招聘团队信息");
                return None;
            }
            Err(e) => {
                debug!("查找招聘团队失败: {}", e);
                return None;
            }
        };

        let link = driver
            .find_first(Some(heading), &Matcher::xpath(RECRUITER_LINK))
            .await
            .ok()
            .flatten()?;
        driver.attribute(link, "href").await.ok().flatten()
    }

    /// 关闭申请弹窗并确认放弃，所有错误只记录日志
    async fn discard_application(&self, driver: &dyn PageDriver) {
        debug!("撤销进行中的申请");

        match driver.find_first(None, &Matcher::css(MODAL_DISMISS)).await {
            Ok(Some(dismiss)) => {
                if let Err(e) = driver.click(dismiss).await {
                    warn!("关闭申请弹窗失败: {}", e);
                    return;
                }
            }
            Ok(None) => {
                debug!("没有打开的申请弹窗");
                return;
            }
            Err(e) => {
                warn!("查找申请弹窗失败: {}", e);
                return;
            }
        }
        self.pacer.pause(3_000, 5_000).await;

        match driver.find_all(None, &Matcher::css(DISCARD_CONFIRM)).await {
            Ok(buttons) => {
                if let Some(confirm) = buttons.first() {
                    if let Err(e) = driver.click(*confirm).await {
                        warn!("确认放弃申请失败: {}", e);
                    }
                }
            }
            Err(e) => warn!("查找放弃确认按钮失败: {}", e),
        }
        self.pacer.pause(3_000, 5_000).await;
    }
}
