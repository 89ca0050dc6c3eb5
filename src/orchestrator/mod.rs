//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责批量投递和资源管理，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `batch_processor` - 批量投递处理器
//! - 管理应用生命周期（初始化、运行）
//! - 加载职位列表（Vec<Job>）
//! - 管理浏览器资源（Browser、ChromePage）
//! - 输出全局统计信息
//!
//! ### `job_runner` - 单个职位处理器
//! - 调用 `ApplyFlow` 投递单个职位
//! - 记录失败职位
//! - 累计统计
//!
//! ## 层次关系
//!
//! ```text
//! batch_processor (处理 Vec<Job>)
//!     ↓
//! job_runner (处理单个 Job)
//!     ↓
//! workflow::ApplyFlow (Easy Apply 表单流程)
//!     ↓
//! services (能力层：定位 / 中间页 / 答案库 / 附件 / LLM)
//!     ↓
//! infrastructure (基础设施：PageDriver)
//! ```
//!
//! ## 设计原则
//!
//! 1. **单一职责**：batch_processor 管批量，job_runner 管单个
//! 2. **资源隔离**：只有编排层持有 Browser
//! 3. **向下依赖**：编排层 → workflow → services → infrastructure
//! 4. **串行执行**：同一浏览器会话中不会同时填写两个表单

pub mod batch_processor;
pub mod job_runner;

// 重新导出主要类型
pub use batch_processor::App;
pub use job_runner::{process_job, JobStats};
