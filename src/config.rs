use std::path::PathBuf;
use std::time::Duration;

/// 程序配置
#[derive(Clone, Debug)]
pub struct Config {
    /// 浏览器调试端口（连接已打开的 Chrome）
    pub browser_debug_port: u16,
    /// 为 true 时自行启动无头浏览器，而不是连接调试端口
    pub headless: bool,
    /// 无头模式下使用的浏览器可执行文件
    pub chrome_executable: Option<PathBuf>,
    /// 待投递职位列表（TOML）
    pub jobs_file: String,
    /// 答案库文件
    pub answers_file: String,
    /// 预先准备好的简历文件，未配置时按职位生成
    pub resume_path: Option<PathBuf>,
    /// 纯文本简历资料，生成简历和回答问题时作为上下文
    pub resume_profile: String,
    /// 生成附件的存放目录
    pub generated_dir: String,
    /// 失败职位记录文件
    pub failure_log_file: String,
    /// 运行日志文件
    pub output_log_file: String,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    /// 单次元素等待的超时时间（毫秒）
    pub wait_timeout_ms: u64,
    /// 中间页跳转的最大返回次数
    pub redirect_max_attempts: usize,
    /// 单个职位表单的最大步骤数
    pub max_steps: usize,
    /// 是否启用随机操作间隔
    pub human_pacing: bool,
    // --- LLM 配置 ---
    pub llm_api_key: String,
    pub llm_api_base_url: String,
    pub llm_model_name: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            browser_debug_port: 9222,
            headless: false,
            chrome_executable: None,
            jobs_file: "data_folder/jobs.toml".to_string(),
            answers_file: "answers.json".to_string(),
            resume_path: None,
            resume_profile: "data_folder/plain_text_resume.yaml".to_string(),
            generated_dir: "generated_cv".to_string(),
            failure_log_file: "failed.txt".to_string(),
            output_log_file: "output.txt".to_string(),
            verbose_logging: false,
            wait_timeout_ms: 10_000,
            redirect_max_attempts: 3,
            max_steps: 20,
            human_pacing: true,
            llm_api_key: String::new(),
            llm_api_base_url: "https://api.openai.com/v1".to_string(),
            llm_model_name: "gpt-4o-mini".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            browser_debug_port: std::env::var("BROWSER_DEBUG_PORT").ok().and_then(|v| v.parse().ok()).unwrap_or(default.browser_debug_port),
            headless: std::env::var("HEADLESS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.headless),
            chrome_executable: std::env::var("CHROME_EXECUTABLE").ok().map(PathBuf::from).or(default.chrome_executable),
            jobs_file: std::env::var("JOBS_FILE").unwrap_or(default.jobs_file),
            answers_file: std::env::var("ANSWERS_FILE").unwrap_or(default.answers_file),
            resume_path: std::env::var("RESUME_PATH").ok().map(PathBuf::from).or(default.resume_path),
            resume_profile: std::env::var("RESUME_PROFILE").unwrap_or(default.resume_profile),
            generated_dir: std::env::var("GENERATED_DIR").unwrap_or(default.generated_dir),
            failure_log_file: std::env::var("FAILURE_LOG_FILE").unwrap_or(default.failure_log_file),
            output_log_file: std::env::var("OUTPUT_LOG_FILE").unwrap_or(default.output_log_file),
            verbose_logging: std::env::var("VERBOSE_LOGGING").ok().and_then(|v| v.parse().ok()).unwrap_or(default.verbose_logging),
            wait_timeout_ms: std::env::var("WAIT_TIMEOUT_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.wait_timeout_ms),
            redirect_max_attempts: std::env::var("REDIRECT_MAX_ATTEMPTS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.redirect_max_attempts),
            max_steps: std::env::var("MAX_STEPS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.max_steps),
            human_pacing: std::env::var("HUMAN_PACING").ok().and_then(|v| v.parse().ok()).unwrap_or(default.human_pacing),
            llm_api_key: std::env::var("LLM_API_KEY").unwrap_or(default.llm_api_key),
            llm_api_base_url: std::env::var("LLM_API_BASE_URL").unwrap_or(default.llm_api_base_url),
            llm_model_name: std::env::var("LLM_MODEL_NAME").unwrap_or(default.llm_model_name),
        }
    }

    pub fn wait_timeout(&self) -> Duration {
        Duration::from_millis(self.wait_timeout_ms)
    }

    /// 只有指向真实文件的简历路径才算已配置
    pub fn usable_resume_path(&self) -> Option<PathBuf> {
        self.resume_path.clone().filter(|p| p.is_file())
    }
}
