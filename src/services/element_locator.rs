//! 元素定位服务 - 业务能力层
//!
//! 把"申请按钮"、"下一步/提交按钮"这类逻辑目标解析为一个可以直接点击的元素。
//!
//! 定位流程：
//! 1. 按优先级依次尝试每个策略（结构化 class/属性匹配在前，文本匹配在后）
//! 2. 全部落空时刷新页面，先上下滚动一遍触发懒加载，再完整重试一轮
//! 3. 两轮都失败时返回 `NotFound`，附带当时的页面源码

use tracing::{debug, info, warn};

use crate::error::{AppResult, ApplyError};
use crate::infrastructure::{ElementHandle, Matcher, PageDriver};
use crate::services::redirect_guard::RedirectGuard;
use crate::services::waits::Waits;
use crate::utils::Pacer;

/// 含刷新在内的最大定位轮数
pub const MAX_ROUNDS: usize = 2;

/// 滚动步长（像素）
const SCROLL_STEP: u64 = 300;

/// 候选数量
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    /// 等待单个元素出现、可见、可点击
    Single,
    /// 枚举所有候选，返回第一个可见且可点击的
    Multiple,
}

/// 一条定位策略
#[derive(Debug, Clone)]
pub struct LocatorStrategy {
    pub description: String,
    pub matcher: Matcher,
    pub cardinality: Cardinality,
}

/// 逻辑定位目标：按优先级排列的策略列表
#[derive(Debug, Clone)]
pub struct LocatorTarget {
    pub name: String,
    pub strategies: Vec<LocatorStrategy>,
}

impl LocatorTarget {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            strategies: Vec::new(),
        }
    }

    pub fn strategy(
        mut self,
        description: impl Into<String>,
        matcher: Matcher,
        cardinality: Cardinality,
    ) -> Self {
        self.strategies.push(LocatorStrategy {
            description: description.into(),
            matcher,
            cardinality,
        });
        self
    }
}

/// 元素定位服务
#[derive(Debug, Clone)]
pub struct ElementLocator {
    waits: Waits,
    pacer: Pacer,
}

impl ElementLocator {
    pub fn new(waits: Waits, pacer: Pacer) -> Self {
        Self { waits, pacer }
    }

    pub fn waits(&self) -> &Waits {
        &self.waits
    }

    /// 定位目标元素，最多两轮，两轮之间刷新页面
    pub async fn locate(
        &self,
        driver: &dyn PageDriver,
        target: &LocatorTarget,
    ) -> AppResult<ElementHandle> {
        self.locate_guarded(driver, target, None).await
    }

    /// 同 [`locate`](Self::locate)，但每轮开始前先做一次中间页检查
    pub async fn locate_guarded(
        &self,
        driver: &dyn PageDriver,
        target: &LocatorTarget,
        guard: Option<(&RedirectGuard, &str)>,
    ) -> AppResult<ElementHandle> {
        debug!("开始定位: {}", target.name);

        for round in 1..=MAX_ROUNDS {
            if let Some((guard, job_link)) = guard {
                guard.check(driver, job_link).await?;
            }

            if round > 1 {
                self.scroll_pass(driver).await;
            }

            if let Some(element) = self.try_strategies(driver, target).await {
                debug!("✓ 第 {} 轮定位到 {}", round, target.name);
                return Ok(element);
            }

            if round < MAX_ROUNDS {
                info!("未找到 {}，刷新页面后重试", target.name);
                driver.reload().await?;
                self.pacer.pause(3_000, 5_000).await;
            }
        }

        Err(self.not_found(driver, target, MAX_ROUNDS).await)
    }

    /// 只在当前 DOM 上尝试一轮，不刷新也不滚动
    ///
    /// 用于表单弹窗内部：刷新会直接丢掉正在填写的表单。
    pub async fn locate_in_place(
        &self,
        driver: &dyn PageDriver,
        target: &LocatorTarget,
    ) -> AppResult<ElementHandle> {
        match self.try_strategies(driver, target).await {
            Some(element) => Ok(element),
            None => Err(self.not_found(driver, target, 1).await),
        }
    }

    async fn try_strategies(
        &self,
        driver: &dyn PageDriver,
        target: &LocatorTarget,
    ) -> Option<ElementHandle> {
        for strategy in &target.strategies {
            debug!("尝试策略: {}", strategy.description);
            match self.try_strategy(driver, strategy).await {
                Ok(Some(element)) => return Some(element),
                Ok(None) => debug!("策略未命中: {}", strategy.description),
                Err(e) => warn!("策略 '{}' 失败: {}", strategy.description, e),
            }
        }
        None
    }

    async fn try_strategy(
        &self,
        driver: &dyn PageDriver,
        strategy: &LocatorStrategy,
    ) -> AppResult<Option<ElementHandle>> {
        match strategy.cardinality {
            Cardinality::Multiple => {
                let candidates = driver.find_all(None, &strategy.matcher).await?;
                if candidates.is_empty() {
                    return Ok(None);
                }
                for (index, candidate) in candidates.into_iter().enumerate() {
                    match self.ready(driver, candidate).await {
                        Ok(()) => {
                            debug!("第 {} 个候选可点击", index + 1);
                            return Ok(Some(candidate));
                        }
                        Err(e) => warn!("候选 {} 不可点击: {}", index + 1, e),
                    }
                }
                Ok(None)
            }
            Cardinality::Single => {
                let element = match self
                    .waits
                    .first_present(driver, None, &strategy.matcher)
                    .await
                {
                    Ok(element) => element,
                    Err(ApplyError::Timeout { .. }) => return Ok(None),
                    Err(e) => return Err(e),
                };
                self.ready(driver, element).await?;
                Ok(Some(element))
            }
        }
    }

    async fn ready(&self, driver: &dyn PageDriver, element: ElementHandle) -> AppResult<()> {
        self.waits.visible(driver, element).await?;
        self.waits.clickable(driver, element).await
    }

    /// 先向下再向上滚动整页，失败只记录日志
    async fn scroll_pass(&self, driver: &dyn PageDriver) {
        let height = match driver.scroll_height().await {
            Ok(height) => height,
            Err(e) => {
                debug!("无法获取页面高度，跳过滚动: {}", e);
                return;
            }
        };

        let down = (0..height).step_by(SCROLL_STEP as usize);
        let up = (1..=height).rev().step_by(SCROLL_STEP as usize);
        for y in down.chain(up) {
            if let Err(e) = driver.scroll_to(y).await {
                debug!("滚动中断: {}", e);
                return;
            }
            self.pacer.pause(200, 400).await;
        }
    }

    async fn not_found(
        &self,
        driver: &dyn PageDriver,
        target: &LocatorTarget,
        rounds: usize,
    ) -> ApplyError {
        let page_source = driver.page_source().await.unwrap_or_default();
        warn!("❌ {} 轮后仍未找到 {}", rounds, target.name);
        ApplyError::NotFound {
            target: target.name.clone(),
            rounds,
            page_source,
        }
    }
}
