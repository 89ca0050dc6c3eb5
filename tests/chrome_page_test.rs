//! 在真实 Chrome 里跑页面驱动和选择器
//!
//! 需要本机装有 Chrome / Chromium（可用 CHROME_EXECUTABLE 指定），默认忽略：
//! cargo test --test chrome_page_test -- --ignored

use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::anyhow;
use async_trait::async_trait;
use chromiumoxide::{Browser, Page};
use easy_apply::browser::launch_headless_browser;
use easy_apply::config::Config;
use easy_apply::services::{ArtifactGenerator, GenerationError, Waits};
use easy_apply::utils::{logger, Pacer};
use easy_apply::workflow::selectors::*;
use easy_apply::workflow::{ApplyCtx, FormStepProcessor, StepKind};
use easy_apply::{
    AnswerStore, ArtifactService, ChromePage, Job, JsExecutor, Matcher, PageDriver, QuestionAnswerer,
    QuestionKind, ResolvedAnswer, UploadPurpose,
};
use serde_json::Value as JsonValue;
use tempfile::TempDir;

const JOB_PAGE: &str = r#"<!DOCTYPE html>
<html><body>
<h2>Meet the hiring team</h2>
<a href="https://www.linkedin.com/in/recruiter">Recruiter</a>
<button class="jobs-apply-button artdeco-button"><span class="artdeco-button__text">Easy Apply</span></button>
<div class="artdeco-modal">
  <div class="jobs-easy-apply-content">
    <div class="jobs-easy-apply-form-section__grouping">
      <fieldset>
        <legend>Are you authorized to work?</legend>
        <input type="radio" id="auth-yes" name="auth" value="Yes"><label for="auth-yes">Yes</label>
        <input type="radio" id="auth-no" name="auth" value="No"><label for="auth-no">No</label>
      </fieldset>
    </div>
    <div class="jobs-easy-apply-form-section__grouping">
      <label for="office">Preferred office</label>
      <select id="office">
        <option>Select an option</option>
        <option>Berlin</option>
        <option>Paris</option>
      </select>
    </div>
    <div class="jobs-easy-apply-form-section__grouping">
      <label for="years">Years of Rust experience?</label>
      <input id="years" type="number">
    </div>
    <div class="jobs-easy-apply-form-section__grouping">
      <label for="start">Earliest start date</label>
      <input id="start" type="text" placeholder="mm/dd/yyyy">
    </div>
    <div class="jobs-easy-apply-form-section__grouping">
      <label for="why">Why do you want this job?</label>
      <textarea id="why"></textarea>
    </div>
  </div>
  <button class="artdeco-button artdeco-button--primary">Next</button>
</div>
</body></html>"#;

const UPLOAD_PAGE: &str = r#"<!DOCTYPE html>
<html><body>
<div class="artdeco-modal">
  <div class="jobs-easy-apply-content">
    <div class="pb4">
      <label>Upload resume <input type="file" id="resume-input" class="hidden"></label>
    </div>
  </div>
  <button class="artdeco-button artdeco-button--primary">Review</button>
</div>
</body></html>"#;

/// 固定答案，不访问 LLM
struct ScriptedAnswerer;

#[async_trait]
impl QuestionAnswerer for ScriptedAnswerer {
    async fn set_job(&self, _job: &Job) {}

    async fn classify_upload_purpose(&self, label: &str) -> anyhow::Result<UploadPurpose> {
        Ok(if label.contains("cover") {
            UploadPurpose::CoverLetter
        } else {
            UploadPurpose::Resume
        })
    }

    async fn resolve_answer(
        &self,
        _question: &str,
        kind: QuestionKind,
        options: &[String],
    ) -> anyhow::Result<ResolvedAnswer> {
        Ok(match kind {
            QuestionKind::Choice => ResolvedAnswer::answered(
                options
                    .iter()
                    .find(|o| o.as_str() != "Paris")
                    .cloned()
                    .ok_or_else(|| anyhow!("没有可选项"))?,
            ),
            QuestionKind::Numeric => ResolvedAnswer::answered("6"),
            QuestionKind::Date => ResolvedAnswer::one_off("2025-01-15"),
            QuestionKind::Text => ResolvedAnswer::answered("Happy to discuss."),
        })
    }
}

/// 配置了简历时不会调用
struct NoGenerator;

#[async_trait]
impl ArtifactGenerator for NoGenerator {
    async fn generate_resume(&self, _job_description: &str) -> Result<Vec<u8>, GenerationError> {
        Err(GenerationError::Failed(anyhow!("不应生成简历")))
    }

    async fn generate_cover_letter(&self, _job_description: &str) -> Result<Vec<u8>, GenerationError> {
        Err(GenerationError::Failed(anyhow!("不应生成求职信")))
    }
}

async fn launch() -> (Browser, Page) {
    logger::init(true);
    let config = Config::from_env();
    launch_headless_browser(config.chrome_executable.as_deref())
        .await
        .expect("无法启动无头浏览器")
}

fn write_fixture(dir: &Path, name: &str, html: &str) -> String {
    let path = dir.join(name);
    fs::write(&path, html).unwrap();
    format!("file://{}", path.display())
}

/// 读取页面状态，用于断言
async fn read(page: &Page, body: &str) -> JsonValue {
    JsExecutor::new(page.clone())
        .call(body, &JsonValue::Null)
        .await
        .unwrap()
}

fn processor(dir: &Path) -> FormStepProcessor {
    FormStepProcessor::new(
        Arc::new(ScriptedAnswerer),
        ArtifactService::new(Arc::new(NoGenerator), dir.join("generated")),
        Some(dir.join("resume.pdf")),
        Waits::new(Duration::from_secs(5), Duration::from_millis(100)),
        Pacer::instant(),
    )
}

#[tokio::test]
#[ignore] // 需要本机 Chrome
async fn test_job_page_selectors_match_real_dom() {
    let (_browser, page) = launch().await;
    let dir = TempDir::new().unwrap();
    let driver = ChromePage::new(JsExecutor::new(page.clone()));
    driver
        .navigate(&write_fixture(dir.path(), "job.html", JOB_PAGE))
        .await
        .unwrap();

    let triggers = driver
        .find_all(None, &Matcher::xpath(APPLY_TRIGGER_STRUCTURAL))
        .await
        .unwrap();
    assert_eq!(triggers.len(), 1);
    assert!(driver.is_clickable(triggers[0]).await.unwrap());

    let heading = driver
        .find_first(None, &Matcher::xpath(HIRING_TEAM_HEADING))
        .await
        .unwrap()
        .expect("没有找到招聘团队标题");
    let recruiter = driver
        .find_first(Some(heading), &Matcher::xpath(RECRUITER_LINK))
        .await
        .unwrap()
        .expect("没有找到招聘人链接");
    assert_eq!(
        driver.attribute(recruiter, "href").await.unwrap().as_deref(),
        Some("https://www.linkedin.com/in/recruiter")
    );

    let buttons = driver
        .find_all(None, &Matcher::css(PRIMARY_ACTION_MODAL))
        .await
        .unwrap();
    assert_eq!(buttons.len(), 1);
    assert_eq!(driver.text(buttons[0]).await.unwrap().trim(), "Next");

    // 同一个节点再次查找得到同一个句柄
    let container = driver
        .find_first(None, &Matcher::css(STEP_CONTAINER))
        .await
        .unwrap()
        .unwrap();
    let sections = driver
        .find_all(Some(container), &Matcher::css(QUESTION_SECTION))
        .await
        .unwrap();
    assert_eq!(sections.len(), 5);
    let first_parent = driver.parent(sections[0]).await.unwrap();
    assert_eq!(first_parent, Some(container));
}

#[tokio::test]
#[ignore] // 需要本机 Chrome
async fn test_question_step_fills_real_controls() {
    let (_browser, page) = launch().await;
    let dir = TempDir::new().unwrap();
    let driver = ChromePage::new(JsExecutor::new(page.clone()));
    driver
        .navigate(&write_fixture(dir.path(), "job.html", JOB_PAGE))
        .await
        .unwrap();

    let mut store = AnswerStore::load(dir.path().join("answers.json"));
    let mut job = Job::new("https://www.linkedin.com/jobs/view/42", "Rust Engineer");
    let report = processor(dir.path())
        .process(&driver, &mut job, &mut store, &ApplyCtx::new(1))
        .await
        .unwrap();

    assert_eq!(report.kind, Some(StepKind::Questions));
    assert_eq!(report.answered, 5);
    // 日期答案不写入答案库
    assert_eq!(report.learned, 4);

    let values = read(
        &page,
        r#"
        return {
            auth: document.getElementById('auth-yes').checked,
            office: document.getElementById('office').value,
            years: document.getElementById('years').value,
            start: document.getElementById('start').value,
            why: document.getElementById('why').value,
        };
        "#,
    )
    .await;
    assert_eq!(values["auth"], JsonValue::Bool(true));
    assert_eq!(values["office"], "Berlin");
    assert_eq!(values["years"], "6");
    assert_eq!(values["start"], "01/15/2025");
    assert_eq!(values["why"], "Happy to discuss.");
}

#[tokio::test]
#[ignore] // 需要本机 Chrome
async fn test_upload_step_attaches_configured_resume() {
    let (_browser, page) = launch().await;
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("resume.pdf"),
        easy_apply::services::render_text_pdf("Jane Doe\nRust Engineer"),
    )
    .unwrap();
    let driver = ChromePage::new(JsExecutor::new(page.clone()));
    driver
        .navigate(&write_fixture(dir.path(), "upload.html", UPLOAD_PAGE))
        .await
        .unwrap();

    let mut store = AnswerStore::load(dir.path().join("answers.json"));
    let mut job = Job::new("https://www.linkedin.com/jobs/view/42", "Rust Engineer");
    let report = processor(dir.path())
        .process(&driver, &mut job, &mut store, &ApplyCtx::new(1))
        .await
        .unwrap();

    assert_eq!(report.kind, Some(StepKind::Upload));
    assert_eq!(report.uploaded, vec![dir.path().join("resume.pdf")]);

    let files = read(
        &page,
        r#"
        const input = document.getElementById('resume-input');
        return { count: input.files.length, name: input.files[0].name, hidden: input.classList.contains('hidden') };
        "#,
    )
    .await;
    assert_eq!(files["count"], 1);
    assert_eq!(files["name"], "resume.pdf");
    assert_eq!(files["hidden"], JsonValue::Bool(false));
}

#[tokio::test]
#[ignore] // 需要本机 Chrome
async fn test_handles_do_not_survive_navigation() {
    let (_browser, page) = launch().await;
    let dir = TempDir::new().unwrap();
    let job_url = write_fixture(dir.path(), "job.html", JOB_PAGE);
    let driver = ChromePage::new(JsExecutor::new(page.clone()));

    driver.navigate(&job_url).await.unwrap();
    let old = driver
        .find_first(None, &Matcher::xpath(APPLY_TRIGGER_STRUCTURAL))
        .await
        .unwrap()
        .unwrap();

    driver.navigate(&job_url).await.unwrap();
    assert!(driver.click(old).await.is_err());
    assert!(driver.text(old).await.is_err());

    // 新文档里的节点拿到更大的编号，不会和旧句柄重合
    let fresh = driver
        .find_first(None, &Matcher::xpath(APPLY_TRIGGER_STRUCTURAL))
        .await
        .unwrap()
        .unwrap();
    assert!(fresh.id() > old.id());
    driver.click(fresh).await.unwrap();
}
