//! 中间页守卫 - 业务能力层
//!
//! 检测被重定向到推销/中间页的情况，并把浏览器带回职位页面。

use std::time::Duration;

use anyhow::Context;
use regex::Regex;
use tokio::time::sleep;
use tracing::{info, warn};

use crate::error::{AppResult, ApplyError};
use crate::infrastructure::PageDriver;

/// 默认中间页地址模式
pub const DEFAULT_INTERSTITIAL_PATTERNS: &[&str] = &[r"linkedin\.com/premium"];

/// 默认最大返回次数
pub const DEFAULT_MAX_ATTEMPTS: usize = 3;

#[derive(Debug, Clone)]
pub struct RedirectGuard {
    patterns: Vec<Regex>,
    max_attempts: usize,
    settle: Duration,
}

impl RedirectGuard {
    pub fn new(patterns: &[&str], max_attempts: usize) -> anyhow::Result<Self> {
        let patterns = patterns
            .iter()
            .map(|p| Regex::new(p).with_context(|| format!("无效的中间页模式: {}", p)))
            .collect::<anyhow::Result<Vec<_>>>()?;

        Ok(Self {
            patterns,
            max_attempts,
            settle: Duration::from_secs(2),
        })
    }

    /// 使用默认中间页模式
    pub fn with_defaults(max_attempts: usize) -> anyhow::Result<Self> {
        Self::new(DEFAULT_INTERSTITIAL_PATTERNS, max_attempts)
    }

    /// 每次返回职位页后的等待时间
    pub fn with_settle(mut self, settle: Duration) -> Self {
        self.settle = settle;
        self
    }

    pub fn is_interstitial(&self, url: &str) -> bool {
        self.patterns.iter().any(|p| p.is_match(url))
    }

    /// 检查当前地址，落在中间页时重新打开职位链接
    ///
    /// 最多尝试 `max_attempts` 次，仍停留在中间页则返回 `RedirectLoop`。
    /// 当前地址正常时不做任何导航，返回 `false`；重新打开过职位页时返回 `true`，
    /// 此前查到的元素句柄都已失效。
    pub async fn check(&self, driver: &dyn PageDriver, job_link: &str) -> AppResult<bool> {
        let mut url = driver.current_url().await?;
        if !self.is_interstitial(&url) {
            return Ok(false);
        }

        for attempt in 1..=self.max_attempts {
            warn!(
                "检测到中间页，第 {}/{} 次返回职位页: {}",
                attempt, self.max_attempts, url
            );
            driver.navigate(job_link).await?;
            if !self.settle.is_zero() {
                sleep(self.settle).await;
            }

            url = driver.current_url().await?;
            if !self.is_interstitial(&url) {
                info!("✓ 已返回职位页面");
                return Ok(true);
            }
        }

        Err(ApplyError::RedirectLoop {
            url,
            attempts: self.max_attempts,
        })
    }
}
