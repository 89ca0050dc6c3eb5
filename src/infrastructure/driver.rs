//! 页面驱动能力接口 - 基础设施层
//!
//! 工作流只通过 [`PageDriver`] 操作页面，不关心背后是 chromiumoxide
//! 还是测试用的内存页面。

use std::fmt;
use std::path::Path;

use anyhow::Result;
use async_trait::async_trait;

/// 元素匹配表达式
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Matcher {
    /// CSS 选择器
    Css(String),
    /// XPath 表达式
    XPath(String),
}

impl Matcher {
    pub fn css(selector: impl Into<String>) -> Self {
        Matcher::Css(selector.into())
    }

    pub fn xpath(expression: impl Into<String>) -> Self {
        Matcher::XPath(expression.into())
    }

    /// 原始表达式文本
    pub fn expression(&self) -> &str {
        match self {
            Matcher::Css(s) | Matcher::XPath(s) => s,
        }
    }
}

impl fmt::Display for Matcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Matcher::Css(s) => write!(f, "css={}", s),
            Matcher::XPath(s) => write!(f, "xpath={}", s),
        }
    }
}

/// 页面元素句柄
///
/// 句柄只在当前 DOM 存活期间有效，页面刷新或步骤切换后需要重新查找。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElementHandle(u64);

impl ElementHandle {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn id(self) -> u64 {
        self.0
    }
}

/// 浏览器会话能力
///
/// 职责：
/// - 导航、刷新、读取地址与源码
/// - 查找元素并判断可见 / 可点击
/// - 点击、输入、选择、上传文件
///
/// 所有方法都是单次操作，等待与重试由上层的 `Waits` / `ElementLocator` 负责。
#[async_trait]
pub trait PageDriver: Send + Sync {
    async fn navigate(&self, url: &str) -> Result<()>;

    async fn current_url(&self) -> Result<String>;

    async fn reload(&self) -> Result<()>;

    /// 当前页面 HTML（用于诊断）
    async fn page_source(&self) -> Result<String>;

    /// 在 `scope` 内（`None` 表示整个文档）查找所有匹配元素，按文档顺序返回
    async fn find_all(
        &self,
        scope: Option<ElementHandle>,
        matcher: &Matcher,
    ) -> Result<Vec<ElementHandle>>;

    async fn parent(&self, element: ElementHandle) -> Result<Option<ElementHandle>>;

    async fn is_visible(&self, element: ElementHandle) -> Result<bool>;

    async fn is_clickable(&self, element: ElementHandle) -> Result<bool>;

    async fn click(&self, element: ElementHandle) -> Result<()>;

    /// 清空并输入文本
    async fn type_text(&self, element: ElementHandle, text: &str) -> Result<()>;

    /// 按可见文本选择下拉框选项
    async fn select_option(&self, element: ElementHandle, option_text: &str) -> Result<()>;

    async fn text(&self, element: ElementHandle) -> Result<String>;

    async fn attribute(&self, element: ElementHandle, name: &str) -> Result<Option<String>>;

    /// 向文件输入框注入本地文件路径
    async fn set_file(&self, element: ElementHandle, path: &Path) -> Result<()>;

    /// 让隐藏的输入框可交互（唯一允许的 DOM 改动）
    async fn reveal(&self, element: ElementHandle) -> Result<()>;

    /// 取消当前焦点
    async fn blur_active(&self) -> Result<()>;

    async fn scroll_height(&self) -> Result<u64>;

    async fn scroll_to(&self, y: u64) -> Result<()>;

    async fn find_first(
        &self,
        scope: Option<ElementHandle>,
        matcher: &Matcher,
    ) -> Result<Option<ElementHandle>> {
        Ok(self.find_all(scope, matcher).await?.into_iter().next())
    }
}
