//! 表单步骤处理
//!
//! 处理申请弹窗里当前显示的一步：含文件输入框的是上传步骤，其余是问题步骤。

use std::path::PathBuf;
use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use crate::error::{AppResult, ApplyError};
use crate::infrastructure::{ElementHandle, Matcher, PageDriver};
use crate::models::{Job, QuestionKind};
use crate::services::answer_store::AnswerStore;
use crate::services::artifact_service::ArtifactService;
use crate::services::collaborators::{QuestionAnswerer, UploadPurpose};
use crate::services::llm_service::match_option;
use crate::services::waits::Waits;
use crate::utils::Pacer;
use crate::workflow::apply_ctx::ApplyCtx;
use crate::workflow::question_classifier::{classify, FieldControl, SectionControls, TextFieldFacts};
use crate::workflow::selectors::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepKind {
    Upload,
    Questions,
}

/// 单步处理结果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepReport {
    /// `None` 表示没有找到表单容器
    pub kind: Option<StepKind>,
    pub uploaded: Vec<PathBuf>,
    pub answered: usize,
    /// 新写入答案库的条数
    pub learned: usize,
    pub skipped: usize,
}

enum SectionOutcome {
    Answered { learned: bool },
    Skipped,
}

pub struct FormStepProcessor {
    answerer: Arc<dyn QuestionAnswerer>,
    artifacts: ArtifactService,
    resume_path: Option<PathBuf>,
    waits: Waits,
    pacer: Pacer,
}

impl FormStepProcessor {
    pub fn new(
        answerer: Arc<dyn QuestionAnswerer>,
        artifacts: ArtifactService,
        resume_path: Option<PathBuf>,
        waits: Waits,
        pacer: Pacer,
    ) -> Self {
        Self {
            answerer,
            artifacts,
            resume_path,
            waits,
            pacer,
        }
    }

    /// 处理当前步骤
    ///
    /// 找不到表单容器时只记录警告，交给提交状态机继续判断。
    pub async fn process(
        &self,
        driver: &dyn PageDriver,
        job: &mut Job,
        store: &mut AnswerStore,
        ctx: &ApplyCtx,
    ) -> AppResult<StepReport> {
        let container = match self
            .waits
            .first_present(driver, None, &Matcher::css(STEP_CONTAINER))
            .await
        {
            Ok(container) => container,
            Err(ApplyError::Timeout { .. }) => {
                warn!("{} 未找到表单容器，跳过填写", ctx);
                return Ok(StepReport::default());
            }
            Err(e) => return Err(e),
        };

        let kind = self.classify_step(driver, container).await?;
        debug!("{} 步骤类型: {:?}", ctx, kind);

        let mut report = match kind {
            StepKind::Upload => self.handle_uploads(driver, container, job, ctx).await?,
            StepKind::Questions => self.fill_questions(driver, container, store, ctx).await?,
        };
        report.kind = Some(kind);
        Ok(report)
    }

    /// 含至少一个文件输入框即为上传步骤
    pub async fn classify_step(
        &self,
        driver: &dyn PageDriver,
        container: ElementHandle,
    ) -> AppResult<StepKind> {
        let inputs = driver
            .find_all(Some(container), &Matcher::css(FILE_INPUT))
            .await?;
        Ok(if inputs.is_empty() {
            StepKind::Questions
        } else {
            StepKind::Upload
        })
    }

    async fn handle_uploads(
        &self,
        driver: &dyn PageDriver,
        container: ElementHandle,
        job: &mut Job,
        ctx: &ApplyCtx,
    ) -> AppResult<StepReport> {
        self.expand_resume_list(driver).await;

        let mut report = StepReport::default();
        let inputs = driver
            .find_all(Some(container), &Matcher::css(FILE_INPUT))
            .await?;

        for input in inputs {
            let label = match driver.parent(input).await? {
                Some(parent) => driver.text(parent).await.unwrap_or_default(),
                None => String::new(),
            };
            driver.reveal(input).await?;

            let purpose = self
                .answerer
                .classify_upload_purpose(&label.to_lowercase())
                .await?;
            let path = match purpose {
                UploadPurpose::Resume => self.resume_for(job).await?,
                UploadPurpose::CoverLetter => {
                    let path = self.artifacts.create_cover_letter(job).await?;
                    job.cover_letter_path = Some(path.clone());
                    path
                }
            };

            driver.set_file(input, &path).await?;
            info!("{} 📎 已上传{:?}: {}", ctx, purpose, path.display());
            report.uploaded.push(path);
            self.pacer.pause(1_500, 2_500).await;
        }

        Ok(report)
    }

    /// 预先配置的简历优先，否则为本职位生成一份（同一职位只生成一次）
    async fn resume_for(&self, job: &mut Job) -> AppResult<PathBuf> {
        if let Some(path) = &self.resume_path {
            return Ok(path.clone());
        }
        if let Some(path) = &job.resume_path {
            return Ok(path.clone());
        }
        let path = self.artifacts.create_resume(job).await?;
        job.resume_path = Some(path.clone());
        Ok(path)
    }

    async fn expand_resume_list(&self, driver: &dyn PageDriver) {
        let button = match driver
            .find_first(None, &Matcher::xpath(SHOW_MORE_RESUMES))
            .await
        {
            Ok(Some(button)) => button,
            Ok(None) => {
                debug!("没有 'Show more resumes' 按钮");
                return;
            }
            Err(e) => {
                debug!("查找 'Show more resumes' 按钮失败: {}", e);
                return;
            }
        };

        match driver.click(button).await {
            Ok(()) => self.pacer.pause(1_000, 2_000).await,
            Err(e) => debug!("点击 'Show more resumes' 失败: {}", e),
        }
    }

    async fn fill_questions(
        &self,
        driver: &dyn PageDriver,
        container: ElementHandle,
        store: &mut AnswerStore,
        ctx: &ApplyCtx,
    ) -> AppResult<StepReport> {
        let mut sections = driver
            .find_all(Some(container), &Matcher::css(QUESTION_SECTION))
            .await?;
        if sections.is_empty() {
            sections = driver
                .find_all(Some(container), &Matcher::css(FORM_ELEMENT))
                .await?;
        }

        let mut report = StepReport::default();
        for section in sections {
            match self.answer_section(driver, section, store, ctx).await? {
                SectionOutcome::Answered { learned } => {
                    report.answered += 1;
                    if learned {
                        report.learned += 1;
                    }
                }
                SectionOutcome::Skipped => report.skipped += 1,
            }
        }

        info!(
            "{} 回答 {} 个问题（新增 {}，跳过 {}）",
            ctx, report.answered, report.learned, report.skipped
        );
        Ok(report)
    }

    async fn answer_section(
        &self,
        driver: &dyn PageDriver,
        section: ElementHandle,
        store: &mut AnswerStore,
        ctx: &ApplyCtx,
    ) -> AppResult<SectionOutcome> {
        let controls = self.controls(driver, section).await?;
        let Some(control) = classify(&controls) else {
            debug!("{} 问题块没有可填写的控件", ctx);
            return Ok(SectionOutcome::Skipped);
        };

        let question = self.question_text(driver, section).await?;
        if question.is_empty() {
            debug!("{} 问题块没有题目文本", ctx);
            return Ok(SectionOutcome::Skipped);
        }

        let kind = control.kind();
        let options = self.options(driver, section, control).await?;

        let stored = store.lookup(&question).and_then(|record| {
            let usable = kind != QuestionKind::Choice
                || options.iter().any(|o| o.eq_ignore_ascii_case(&record.answer));
            usable.then(|| record.answer.clone())
        });

        // 已保存的答案不重复写入；协作方的兜底答案只用于本次填写
        let (answer, reusable) = match stored {
            Some(answer) => {
                debug!("{} 使用已保存的答案: {} → {}", ctx, question, answer);
                (answer, false)
            }
            None => {
                let resolved = self
                    .answerer
                    .resolve_answer(&question, kind, &options)
                    .await?;
                debug!("{} 新答案: {} → {}", ctx, question, resolved.value);
                (resolved.value, resolved.persist)
            }
        };

        let answer = match kind {
            QuestionKind::Choice => choose_option(&answer, &options),
            QuestionKind::Date => format_date_answer(&answer),
            _ => answer,
        };

        self.fill(driver, section, control, &answer).await?;
        self.pacer.pause(500, 1_000).await;

        // 日期答案随时间变化，不写入答案库
        let learned = reusable
            && kind != QuestionKind::Date
            && store.append(&question, &answer, kind)?;
        Ok(SectionOutcome::Answered { learned })
    }

    async fn controls(&self, driver: &dyn PageDriver, section: ElementHandle) -> AppResult<SectionControls> {
        let count = |selector: &'static str| async move {
            driver
                .find_all(Some(section), &Matcher::css(selector))
                .await
                .map(|found| found.len())
        };

        let text_input = match driver
            .find_first(Some(section), &Matcher::css(TEXT_INPUT))
            .await?
        {
            Some(input) => Some(TextFieldFacts {
                input_type: driver.attribute(input, "type").await?,
                placeholder: driver.attribute(input, "placeholder").await?,
                id: driver.attribute(input, "id").await?,
                class: driver.attribute(input, "class").await?,
            }),
            None => None,
        };

        Ok(SectionControls {
            radios: count(RADIO_INPUT).await?,
            selects: count(SELECT).await?,
            checkboxes: count(CHECKBOX_INPUT).await?,
            text_input,
            textareas: count(TEXTAREA).await?,
        })
    }

    async fn question_text(&self, driver: &dyn PageDriver, section: ElementHandle) -> AppResult<String> {
        match driver
            .find_first(Some(section), &Matcher::css(QUESTION_LABEL))
            .await?
        {
            Some(label) => Ok(driver.text(label).await?.trim().to_string()),
            None => Ok(String::new()),
        }
    }

    async fn options(
        &self,
        driver: &dyn PageDriver,
        section: ElementHandle,
        control: FieldControl,
    ) -> AppResult<Vec<String>> {
        let selector = match control {
            FieldControl::RadioGroup => RADIO_OPTION_LABEL,
            FieldControl::CheckboxGroup => CHECKBOX_OPTION_LABEL,
            FieldControl::Dropdown => SELECT_OPTION,
            _ => return Ok(Vec::new()),
        };

        let mut options = Vec::new();
        for element in driver.find_all(Some(section), &Matcher::css(selector)).await? {
            let text = driver.text(element).await?.trim().to_string();
            if !text.is_empty() && text != SELECT_PLACEHOLDER {
                options.push(text);
            }
        }
        Ok(options)
    }

    /// 按题型填写答案
    ///
    /// 复选框组按单选处理：只勾选文本与答案一致的第一个选项。
    async fn fill(
        &self,
        driver: &dyn PageDriver,
        section: ElementHandle,
        control: FieldControl,
        answer: &str,
    ) -> AppResult<()> {
        match control {
            FieldControl::RadioGroup | FieldControl::CheckboxGroup => {
                let selector = if control == FieldControl::RadioGroup {
                    RADIO_OPTION_LABEL
                } else {
                    CHECKBOX_OPTION_LABEL
                };
                for label in driver.find_all(Some(section), &Matcher::css(selector)).await? {
                    if driver.text(label).await?.trim() == answer {
                        driver.click(label).await?;
                        return Ok(());
                    }
                }
                Err(ApplyError::NotFound {
                    target: format!("选项 '{}'", answer),
                    rounds: 1,
                    page_source: driver.page_source().await.unwrap_or_default(),
                })
            }
            FieldControl::Dropdown => {
                let select = self.first_in(driver, section, SELECT).await?;
                driver.select_option(select, answer).await?;
                Ok(())
            }
            FieldControl::DateInput | FieldControl::NumericInput | FieldControl::TextInput => {
                let input = self.first_in(driver, section, TEXT_INPUT).await?;
                driver.type_text(input, answer).await?;
                Ok(())
            }
            FieldControl::TextArea => {
                let textarea = self.first_in(driver, section, TEXTAREA).await?;
                driver.type_text(textarea, answer).await?;
                Ok(())
            }
        }
    }

    async fn first_in(
        &self,
        driver: &dyn PageDriver,
        section: ElementHandle,
        selector: &str,
    ) -> AppResult<ElementHandle> {
        match driver.find_first(Some(section), &Matcher::css(selector)).await? {
            Some(element) => Ok(element),
            None => Err(ApplyError::NotFound {
                target: selector.to_string(),
                rounds: 1,
                page_source: driver.page_source().await.unwrap_or_default(),
            }),
        }
    }
}

/// 把答案对应到某个选项；对应不上时选第一个
fn choose_option(answer: &str, options: &[String]) -> String {
    match match_option(answer, options) {
        Some(option) => option,
        None => {
            let fallback = options.first().cloned().unwrap_or_else(|| answer.to_string());
            warn!("答案 '{}' 不在选项中，改选 '{}'", answer, fallback);
            fallback
        }
    }
}

/// 日期统一为 MM/DD/YYYY，无法识别时原样返回
fn format_date_answer(answer: &str) -> String {
    const FORMATS: &[&str] = &["%m/%d/%Y", "%Y-%m-%d", "%d.%m.%Y", "%B %d, %Y", "%b %d, %Y"];
    let trimmed = answer.trim();
    FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(trimmed, format).ok())
        .map(|date| date.format("%m/%d/%Y").to_string())
        .unwrap_or_else(|| trimmed.to_string())
}
