//! 有界等待
//!
//! 所有等待都按固定间隔轮询，并在超时后返回 `ApplyError::Timeout`，不会无限挂起。

use std::future::Future;
use std::time::Duration;

use tokio::time::{sleep, Instant};

use crate::error::{AppResult, ApplyError};
use crate::infrastructure::{ElementHandle, Matcher, PageDriver};

pub const DEFAULT_WAIT_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(250);

#[derive(Debug, Clone, Copy)]
pub struct Waits {
    pub timeout: Duration,
    pub poll: Duration,
}

impl Waits {
    pub fn new(timeout: Duration, poll: Duration) -> Self {
        Self { timeout, poll }
    }

    /// 等待至少一个匹配元素出现，返回全部匹配
    pub async fn presence(
        &self,
        driver: &dyn PageDriver,
        scope: Option<ElementHandle>,
        matcher: &Matcher,
    ) -> AppResult<Vec<ElementHandle>> {
        self.until(&format!("元素出现 {}", matcher), || async move {
            let found = driver.find_all(scope, matcher).await?;
            Ok((!found.is_empty()).then_some(found))
        })
        .await
    }

    /// 等待第一个匹配元素出现
    pub async fn first_present(
        &self,
        driver: &dyn PageDriver,
        scope: Option<ElementHandle>,
        matcher: &Matcher,
    ) -> AppResult<ElementHandle> {
        let found = self.presence(driver, scope, matcher).await?;
        found
            .into_iter()
            .next()
            .ok_or_else(|| ApplyError::timeout(format!("元素出现 {}", matcher), self.timeout))
    }

    pub async fn visible(&self, driver: &dyn PageDriver, element: ElementHandle) -> AppResult<()> {
        self.until("元素可见", || async move {
            Ok(driver.is_visible(element).await?.then_some(()))
        })
        .await
    }

    pub async fn clickable(
        &self,
        driver: &dyn PageDriver,
        element: ElementHandle,
    ) -> AppResult<()> {
        self.until("元素可点击", || async move {
            Ok(driver.is_clickable(element).await?.then_some(()))
        })
        .await
    }

    /// 轮询 `poll` 直到返回 `Some` 或超时
    async fn until<T, F, Fut>(&self, what: &str, mut poll: F) -> AppResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = anyhow::Result<Option<T>>>,
    {
        let deadline = Instant::now() + self.timeout;
        loop {
            if let Some(value) = poll().await? {
                return Ok(value);
            }
            if Instant::now() >= deadline {
                return Err(ApplyError::timeout(what, self.timeout));
            }
            sleep(self.poll).await;
        }
    }
}

impl Default for Waits {
    fn default() -> Self {
        Self::new(DEFAULT_WAIT_TIMEOUT, DEFAULT_POLL_INTERVAL)
    }
}
