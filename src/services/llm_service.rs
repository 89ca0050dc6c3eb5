//! LLM 服务 - 业务能力层
//!
//! 只负责"LLM 回答与撰写"能力，不关心流程
//!
//! ## 技术栈
//! - 使用 `async-openai` crate 进行 API 调用
//! - 支持自定义 API 端点和模型
//! - 兼容 OpenAI API 的服务（如 Azure, Gemini, Doubao 等）

use std::sync::LazyLock;

use anyhow::{Context, Result};
use async_openai::{
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use rand::seq::SliceRandom;
use regex::Regex;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::config::Config;
use crate::models::{Job, QuestionKind};
use crate::services::collaborators::{QuestionAnswerer, ResolvedAnswer, UploadPurpose};

/// 开放式问题回答失败时使用的通用答案
pub const FALLBACK_TEXT_ANSWER: &str =
    "I am very interested in this opportunity and confident my experience is a strong fit.";

/// 数字问题无法得到数字时的默认答案
pub const FALLBACK_NUMERIC_ANSWER: &str = "0";

/// LLM 服务
///
/// 职责：
/// - 调用 LLM API 回答表单问题
/// - 按职位描述撰写简历和求职信正文
/// - 持有当前职位作为上下文，不关心流程顺序
pub struct LlmService {
    client: Client<OpenAIConfig>,
    model_name: String,
    resume_profile: String,
    job: RwLock<Option<Job>>,
}

impl LlmService {
    /// 创建新的 LLM 服务
    pub fn new(config: &Config) -> Self {
        // 配置 OpenAI 客户端（兼容 OpenAI API 的服务）
        let openai_config = OpenAIConfig::new()
            .with_api_key(&config.llm_api_key)
            .with_api_base(&config.llm_api_base_url);

        let client = Client::with_config(openai_config);

        Self {
            client,
            model_name: config.llm_model_name.clone(),
            resume_profile: String::new(),
            job: RwLock::new(None),
        }
    }

    /// 设置简历资料（纯文本），作为所有提示词的候选人背景
    pub fn with_resume_profile(mut self, profile: impl Into<String>) -> Self {
        self.resume_profile = profile.into();
        self
    }

    /// 通用的 LLM 调用函数
    ///
    /// 其他所有 LLM 相关功能都基于此函数。
    ///
    /// # 参数
    /// - `user_message`: 用户消息内容
    /// - `system_message`: 系统消息（可选）
    ///
    /// # 返回
    /// 返回 LLM 的响应内容（已去除首尾空白）
    pub async fn send_to_llm(&self, user_message: &str, system_message: Option<&str>) -> Result<String> {
        debug!("调用 LLM API，模型: {}", self.model_name);
        debug!("用户消息长度: {} 字符", user_message.len());

        let mut messages = Vec::new();

        if let Some(sys_msg) = system_message {
            let system_msg = ChatCompletionRequestSystemMessageArgs::default()
                .content(sys_msg)
                .build()?;
            messages.push(ChatCompletionRequestMessage::System(system_msg));
        }

        let user_msg = ChatCompletionRequestUserMessageArgs::default()
            .content(user_message)
            .build()?;
        messages.push(ChatCompletionRequestMessage::User(user_msg));

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model_name)
            .messages(messages)
            .temperature(0.3)
            .max_tokens(2048u32)
            .build()?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| {
                warn!("LLM API 调用失败: {}", e);
                e
            })
            .context("LLM API 调用失败")?;

        debug!("LLM API 调用成功");

        let content = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .ok_or_else(|| anyhow::anyhow!("LLM 返回内容为空"))?;

        Ok(content.trim().to_string())
    }

    /// 按职位描述改写简历，返回纯文本
    pub async fn tailor_resume(&self, job_description: &str) -> Result<String> {
        let system_message = "You are an expert resume writer. Write concise, truthful, \
                              ATS-friendly resumes in plain text without markdown.";
        let user_message = format!(
            "Rewrite the candidate's resume so it highlights the experience most relevant to the job.\n\
             Only use facts from the candidate profile.\n\n\
             ## Candidate profile\n{}\n\n## Job description\n{}",
            self.resume_profile, job_description
        );
        self.send_to_llm(&user_message, Some(system_message)).await
    }

    /// 按职位描述撰写求职信，返回纯文本
    pub async fn write_cover_letter(&self, job_description: &str) -> Result<String> {
        let system_message = "You write short, specific cover letters in plain text. \
                              Three paragraphs at most, no placeholders.";
        let user_message = format!(
            "Write a cover letter for the job below on behalf of the candidate.\n\n\
             ## Candidate profile\n{}\n\n## Job description\n{}",
            self.resume_profile, job_description
        );
        self.send_to_llm(&user_message, Some(system_message)).await
    }

    async fn answer_text(&self, question: &str) -> ResolvedAnswer {
        let prompt = format!(
            "{}\n\nAnswer the application question below in the first person, \
             in at most three sentences.\n\nQuestion: {}",
            self.context().await,
            question
        );
        match self.send_to_llm(&prompt, Some(ANSWER_SYSTEM_MESSAGE)).await {
            Ok(answer) if !answer.is_empty() => ResolvedAnswer::answered(answer),
            Ok(_) => ResolvedAnswer::one_off(FALLBACK_TEXT_ANSWER),
            Err(e) => {
                warn!("文本问题回答失败，使用通用答案: {}", e);
                ResolvedAnswer::one_off(FALLBACK_TEXT_ANSWER)
            }
        }
    }

    async fn answer_numeric(&self, question: &str) -> ResolvedAnswer {
        let prompt = format!(
            "{}\n\nAnswer the application question below with a single whole number only.\n\nQuestion: {}",
            self.context().await,
            question
        );
        match self.send_to_llm(&prompt, Some(ANSWER_SYSTEM_MESSAGE)).await {
            Ok(reply) => match extract_number(&reply) {
                Some(number) => ResolvedAnswer::answered(number),
                None => {
                    warn!("LLM 未返回数字: '{}'，使用默认值", reply);
                    ResolvedAnswer::one_off(FALLBACK_NUMERIC_ANSWER)
                }
            },
            Err(e) => {
                warn!("数字问题回答失败，使用默认值: {}", e);
                ResolvedAnswer::one_off(FALLBACK_NUMERIC_ANSWER)
            }
        }
    }

    async fn answer_choice(&self, question: &str, options: &[String]) -> Result<ResolvedAnswer> {
        if options.is_empty() {
            anyhow::bail!("选择题没有可选项: {}", question);
        }

        let listed = options
            .iter()
            .map(|o| format!("- {}", o))
            .collect::<Vec<_>>()
            .join("\n");
        let prompt = format!(
            "{}\n\nPick the best option for the application question below. \
             Reply with the option text exactly as written and nothing else.\n\n\
             Question: {}\nOptions:\n{}",
            self.context().await,
            question,
            listed
        );

        let reply = match self.send_to_llm(&prompt, Some(ANSWER_SYSTEM_MESSAGE)).await {
            Ok(reply) => match_option(&reply, options),
            Err(e) => {
                warn!("选择题回答失败: {}", e);
                None
            }
        };

        Ok(match reply {
            Some(option) => ResolvedAnswer::answered(option),
            None => {
                let picked = options
                    .choose(&mut rand::thread_rng())
                    .cloned()
                    .unwrap_or_default();
                warn!("LLM 答案不在选项中，随机选择: {}", picked);
                ResolvedAnswer::one_off(picked)
            }
        })
    }

    async fn context(&self) -> String {
        let job = self.job.read().await;
        let job_summary = job
            .as_ref()
            .map(Job::summary)
            .unwrap_or_else(|| "No job selected.".to_string());
        format!(
            "## Candidate profile\n{}\n\n## Job\n{}",
            self.resume_profile, job_summary
        )
    }
}

const ANSWER_SYSTEM_MESSAGE: &str = "You are the job candidate described in the profile, \
                                     filling in a job application form. Be honest and brief.";

#[async_trait]
impl QuestionAnswerer for LlmService {
    async fn set_job(&self, job: &Job) {
        *self.job.write().await = Some(job.clone());
    }

    async fn classify_upload_purpose(&self, label: &str) -> Result<UploadPurpose> {
        Ok(classify_upload_label(label))
    }

    async fn resolve_answer(
        &self,
        question: &str,
        kind: QuestionKind,
        options: &[String],
    ) -> Result<ResolvedAnswer> {
        debug!("LLM 回答问题 [{}]: {}", kind, question);
        let answer = match kind {
            QuestionKind::Choice => self.answer_choice(question, options).await?,
            QuestionKind::Numeric => self.answer_numeric(question).await,
            // 日期随时间变化，只用于本次填写
            QuestionKind::Date => ResolvedAnswer::one_off(today()),
            QuestionKind::Text => self.answer_text(question).await,
        };
        Ok(answer)
    }
}

/// 上传框标签含 "cover" 视为求职信，其余一律按简历处理
pub fn classify_upload_label(label: &str) -> UploadPurpose {
    if label.to_lowercase().contains("cover") {
        UploadPurpose::CoverLetter
    } else {
        UploadPurpose::Resume
    }
}

/// 把 LLM 的回复对应到某个选项
///
/// 先做忽略大小写的完全匹配，再看回复是否包含某个选项（取最长的那个）。
pub fn match_option(reply: &str, options: &[String]) -> Option<String> {
    let reply = reply.trim().trim_matches(|c: char| c == '"' || c == '\'' || c == '.').to_lowercase();
    if reply.is_empty() {
        return None;
    }

    if let Some(exact) = options.iter().find(|o| o.trim().to_lowercase() == reply) {
        return Some(exact.clone());
    }

    options
        .iter()
        .filter(|o| {
            let option = o.trim().to_lowercase();
            !option.is_empty() && reply.contains(&option)
        })
        .max_by_key(|o| o.trim().len())
        .cloned()
}

static NUMBER_RE: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"-?\d+").ok());

/// 从回复中提取第一个整数
pub fn extract_number(reply: &str) -> Option<String> {
    NUMBER_RE.as_ref()?.find(reply).map(|m| m.as_str().to_string())
}

/// 今天的日期，格式 MM/DD/YYYY
pub fn today() -> String {
    chrono::Local::now().format("%m/%d/%Y").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 创建测试用的 LlmService
    fn create_test_service() -> LlmService {
        let config = Config {
            llm_api_key: std::env::var("LLM_API_KEY").unwrap_or_default(),
            llm_api_base_url: std::env::var("LLM_API_BASE_URL")
                .unwrap_or_else(|_| "https://api.openai.com/v1".to_string()),
            ..Config::default()
        };
        LlmService::new(&config).with_resume_profile(
            "Name: Jane Doe\nExperience: 6 years Rust, 3 years Go\nLocation: Berlin",
        )
    }

    #[test]
    fn test_classify_upload_label() {
        assert_eq!(classify_upload_label("Upload Cover Letter"), UploadPurpose::CoverLetter);
        assert_eq!(classify_upload_label("Upload resume"), UploadPurpose::Resume);
        assert_eq!(classify_upload_label(""), UploadPurpose::Resume);
    }

    #[test]
    fn test_match_option_prefers_exact_then_longest_contained() {
        let options: Vec<String> = ["Yes", "No", "Yes, with sponsorship"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        assert_eq!(match_option("yes", &options).as_deref(), Some("Yes"));
        assert_eq!(match_option("\"No.\"", &options).as_deref(), Some("No"));
        assert_eq!(
            match_option("I'd say Yes, with sponsorship", &options).as_deref(),
            Some("Yes, with sponsorship")
        );
        assert_eq!(match_option("Maybe", &options), None);
        assert_eq!(match_option("   ", &options), None);
    }

    #[test]
    fn test_extract_number() {
        assert_eq!(extract_number("5").as_deref(), Some("5"));
        assert_eq!(extract_number("About 7 years").as_deref(), Some("7"));
        assert_eq!(extract_number("none"), None);
    }

    #[test]
    fn test_number_pattern_is_built_once() {
        assert!(NUMBER_RE.is_some());
        let first = NUMBER_RE.as_ref().map(|re| re as *const Regex);
        for reply in ["-2 years", "12", "about 3"] {
            assert!(extract_number(reply).is_some());
        }
        assert_eq!(extract_number("-2 years").as_deref(), Some("-2"));
        assert_eq!(NUMBER_RE.as_ref().map(|re| re as *const Regex), first);
    }

    #[test]
    fn test_today_format() {
        let date = today();
        let re = Regex::new(r"^\d{2}/\d{2}/\d{4}$").unwrap();
        assert!(re.is_match(&date), "日期格式错误: {}", date);
    }

    #[tokio::test]
    async fn test_date_question_does_not_call_llm() {
        let service = create_test_service();
        let answer = service
            .resolve_answer("Earliest start date", QuestionKind::Date, &[])
            .await
            .unwrap();
        assert_eq!(answer.value, today());
        assert!(!answer.persist);
    }

    /// 指向一个不可达的地址，所有 LLM 调用都会失败
    fn unreachable_service() -> LlmService {
        let config = Config {
            llm_api_key: "test-key".to_string(),
            llm_api_base_url: "http://127.0.0.1:9/v1".to_string(),
            ..Config::default()
        };
        LlmService::new(&config)
    }

    #[tokio::test]
    async fn test_fallback_answers_are_not_reusable() {
        let service = unreachable_service();

        let numeric = service
            .resolve_answer("Years of Rust experience", QuestionKind::Numeric, &[])
            .await
            .unwrap();
        assert_eq!(numeric, ResolvedAnswer::one_off(FALLBACK_NUMERIC_ANSWER));

        let text = service
            .resolve_answer("Why do you want this job?", QuestionKind::Text, &[])
            .await
            .unwrap();
        assert_eq!(text, ResolvedAnswer::one_off(FALLBACK_TEXT_ANSWER));

        let options = vec!["Yes".to_string(), "No".to_string()];
        let choice = service
            .resolve_answer("Willing to relocate?", QuestionKind::Choice, &options)
            .await
            .unwrap();
        assert!(options.contains(&choice.value));
        assert!(!choice.persist);
    }

    #[tokio::test]
    async fn test_choice_without_options_is_error() {
        let service = create_test_service();
        assert!(service
            .resolve_answer("Pick one", QuestionKind::Choice, &[])
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_set_job_updates_context() {
        let service = create_test_service();
        let mut job = Job::new("https://example.com/jobs/1", "Rust Engineer");
        job.company = "Acme".to_string();

        service.set_job(&job).await;

        let context = service.context().await;
        assert!(context.contains("Position: Rust Engineer"));
        assert!(context.contains("Company: Acme"));
        assert!(context.contains("6 years Rust"));
    }

    /// 测试通用 LLM 调用（需要 LLM_API_KEY）
    #[tokio::test]
    #[ignore]
    async fn test_send_to_llm_simple() {
        let _ = tracing_subscriber::fmt::try_init();

        let service = create_test_service();

        let result = service
            .send_to_llm("Say hello in one word.", Some("You are a terse assistant."))
            .await;

        match result {
            Ok(response) => {
                println!("\n========== LLM 响应 ==========");
                println!("{}", response);
                println!("==============================\n");
                assert!(!response.is_empty());
            }
            Err(e) => panic!("测试失败: {}", e),
        }
    }

    /// 测试选择题回答始终落在选项内（需要 LLM_API_KEY）
    #[tokio::test]
    #[ignore]
    async fn test_choice_answer_is_one_of_options() {
        let _ = tracing_subscriber::fmt::try_init();

        let service = create_test_service();
        let options = vec!["Yes".to_string(), "No".to_string()];

        let answer = service
            .resolve_answer(
                "Are you legally authorized to work in Germany?",
                QuestionKind::Choice,
                &options,
            )
            .await
            .unwrap();

        println!("LLM 选择: {}", answer.value);
        assert!(options.contains(&answer.value));
    }
}
