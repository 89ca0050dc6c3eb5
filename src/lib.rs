//! # Easy Apply
//!
//! 自动完成招聘网站 "Easy Apply" 多步申请表单的 Rust 应用程序
//!
//! ## 架构设计
//!
//! 本系统采用严格的四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有稀缺资源（Page），只暴露能力
//! - `PageDriver` - 页面能力接口，工作流只依赖它
//! - `ChromePage` / `JsExecutor` - 基于 chromiumoxide 的实现
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"
//! - `ElementLocator` / `Waits` - 多策略、有界的元素定位
//! - `RedirectGuard` - 中间页检测与返回
//! - `AnswerStore` - 持久化问答库
//! - `ArtifactService` - 生成并校验简历 / 求职信
//! - `LlmService` - LLM 回答问题和撰写附件
//! - `FailureWriter` - 写 failed.txt 能力
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一个职位"的完整投递流程
//! - `ApplyCtx` - 上下文封装（职位序号 + 步骤序号）
//! - `FormStepProcessor` - 填写单个表单步骤
//! - `SubmissionStateMachine` - 下一步 / 提交 / 校验失败
//! - `ApplyFlow` - 流程编排（打开 → 定位 → 填写 → 提交 → 回滚）
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/batch_processor` - 批量投递，管理浏览器资源
//! - `orchestrator/job_runner` - 单个职位的结果统计与失败记录
//!
//! ## 模块结构

pub mod browser;
pub mod config;
pub mod error;
pub mod infrastructure;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

#[cfg(test)]
pub(crate) mod testing;

// 重新导出常用类型
pub use browser::{connect_to_browser_and_page, launch_headless_browser};
pub use config::Config;
pub use error::{AppResult, ApplyError, ArtifactViolation};
pub use infrastructure::{ChromePage, ElementHandle, JsExecutor, Matcher, PageDriver};
pub use models::{Job, QuestionAnswer, QuestionKind};
pub use orchestrator::{process_job, App, JobStats};
pub use services::{AnswerStore, ArtifactService, QuestionAnswerer, ResolvedAnswer, UploadPurpose};
pub use workflow::{ApplyFlow, FlowOptions, SubmissionState, WorkflowOutcome};
