//! 投递上下文
//!
//! 封装"我正在投递第几个职位的第几步"这一信息，只用于日志

use std::fmt::Display;

#[derive(Debug, Clone)]
pub struct ApplyCtx {
    /// 职位序号（从1开始）
    pub job_index: usize,

    /// 表单步骤序号（从1开始）
    pub step: usize,
}

impl ApplyCtx {
    pub fn new(job_index: usize) -> Self {
        Self { job_index, step: 0 }
    }

    /// 进入下一步
    pub fn next_step(&mut self) {
        self.step += 1;
    }
}

impl Display for ApplyCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[职位 #{} 步骤 #{}]", self.job_index, self.step)
    }
}
