//! 提交状态机
//!
//! 每填完一步调用一次 [`SubmissionStateMachine::advance`]：
//! 主按钮是提交按钮则点击并结束；否则作为"下一步"点击，再检查表单校验错误。

use phf::phf_set;
use tracing::{debug, info, warn};

use crate::error::AppResult;
use crate::infrastructure::{ElementHandle, Matcher, PageDriver};
use crate::services::element_locator::ElementLocator;
use crate::utils::Pacer;
use crate::workflow::selectors::{primary_action_target, FOLLOW_COMPANY_LABEL, VALIDATION_ERROR};

/// 已知的提交按钮文案（小写）
static SUBMIT_PHRASES: phf::Set<&'static str> = phf_set! {
    "submit application",
    "enviar solicitud",
    "soumettre la candidature",
    "bewerbung absenden",
};

/// 按钮文案是否表示最终提交
pub fn is_submit_label(label: &str) -> bool {
    let label = label.to_lowercase();
    SUBMIT_PHRASES.iter().any(|phrase| label.contains(phrase))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionState {
    /// 等待填写当前步骤
    AwaitingStep,
    /// 已点击"下一步"且没有校验错误
    StepSubmittedContinue,
    /// 已点击提交
    Submitted,
    /// 点击"下一步"后出现校验错误，错误文本原样保留
    ValidationFailed(Vec<String>),
}

impl SubmissionState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SubmissionState::Submitted | SubmissionState::ValidationFailed(_)
        )
    }
}

pub struct SubmissionStateMachine {
    locator: ElementLocator,
    pacer: Pacer,
    state: SubmissionState,
}

impl SubmissionStateMachine {
    pub fn new(locator: ElementLocator, pacer: Pacer) -> Self {
        Self {
            locator,
            pacer,
            state: SubmissionState::AwaitingStep,
        }
    }

    pub fn state(&self) -> &SubmissionState {
        &self.state
    }

    /// 当前步骤已填写完毕，推进状态
    ///
    /// 终止状态下不再点击任何按钮，直接返回当前状态。
    pub async fn advance(&mut self, driver: &dyn PageDriver) -> AppResult<SubmissionState> {
        if self.state.is_terminal() {
            return Ok(self.state.clone());
        }

        let button = self
            .locator
            .locate_in_place(driver, &primary_action_target())
            .await?;
        let label = self.button_label(driver, button).await;
        debug!("主按钮文案: '{}'", label);

        if is_submit_label(&label) {
            self.unfollow_company(driver).await;
            self.pacer.pause(1_500, 2_500).await;
            driver.click(button).await?;
            self.pacer.pause(1_500, 2_500).await;
            info!("📨 已点击提交");
            self.state = SubmissionState::Submitted;
            return Ok(self.state.clone());
        }

        self.pacer.pause(1_500, 2_500).await;
        driver.click(button).await?;
        self.pacer.pause(3_000, 5_000).await;

        let errors = self.collect_errors(driver).await?;
        self.state = if errors.is_empty() {
            SubmissionState::AwaitingStep
        } else {
            warn!("⚠️ 表单校验失败: {:?}", errors);
            SubmissionState::ValidationFailed(errors)
        };

        Ok(match &self.state {
            SubmissionState::AwaitingStep => SubmissionState::StepSubmittedContinue,
            terminal => terminal.clone(),
        })
    }

    /// 按钮文本为空时退回 aria-label
    async fn button_label(&self, driver: &dyn PageDriver, button: ElementHandle) -> String {
        let text = driver.text(button).await.unwrap_or_default();
        if !text.trim().is_empty() {
            return text.trim().to_string();
        }
        driver
            .attribute(button, "aria-label")
            .await
            .ok()
            .flatten()
            .unwrap_or_default()
    }

    /// 取消"关注公司"勾选，失败只记录日志
    async fn unfollow_company(&self, driver: &dyn PageDriver) {
        match driver
            .find_first(None, &Matcher::xpath(FOLLOW_COMPANY_LABEL))
            .await
        {
            Ok(Some(label)) => {
                if let Err(e) = driver.click(label).await {
                    debug!("取消关注公司失败: {}", e);
                }
            }
            Ok(None) => debug!("没有关注公司选项"),
            Err(e) => debug!("查找关注公司选项失败: {}", e),
        }
    }

    async fn collect_errors(&self, driver: &dyn PageDriver) -> AppResult<Vec<String>> {
        let mut errors = Vec::new();
        for element in driver
            .find_all(None, &Matcher::css(VALIDATION_ERROR))
            .await?
        {
            errors.push(driver.text(element).await?.trim().to_string());
        }
        Ok(errors)
    }
}
