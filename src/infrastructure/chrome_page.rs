//! 基于 chromiumoxide 的页面驱动
//!
//! 元素查找在页面内执行：命中的元素被打上 `data-ea-handle` 标记，
//! 之后的操作再通过该标记定位回同一个 DOM 节点。
//!
//! 编号由驱动统一分配并且只增不减，导航或刷新后旧编号不会被新文档里的节点复用，
//! 旧句柄只会报"已失效"。

use std::path::Path;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::dom::SetFileInputFilesParams;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value as JsonValue};
use tokio::sync::Mutex;
use tracing::debug;

use crate::infrastructure::driver::{ElementHandle, Matcher, PageDriver};
use crate::infrastructure::js_executor::JsExecutor;

const HANDLE_ATTR: &str = "data-ea-handle";

/// 给节点分配句柄编号（已有编号时复用），从 `args.next` 开始递增
const TAG_FN: &str = r#"
let next = args.next;
const tag = (n) => {
    if (!n.hasAttribute('data-ea-handle')) {
        n.setAttribute('data-ea-handle', String(next));
        next += 1;
    }
    return Number(n.getAttribute('data-ea-handle'));
};
"#;

/// 打标记脚本的返回值
#[derive(Debug, Deserialize)]
struct Tagged<T> {
    found: T,
    next: u64,
}

/// Chrome 页面驱动
pub struct ChromePage {
    executor: JsExecutor,
    /// 下一个可分配的句柄编号
    next_handle: Mutex<u64>,
}

impl ChromePage {
    pub fn new(executor: JsExecutor) -> Self {
        Self {
            executor,
            next_handle: Mutex::new(1),
        }
    }

    /// 执行会给节点打标记的脚本，并记下用到的编号
    ///
    /// 脚本中用 `tag(node)` 取得编号，最后 `return done(value)`。
    async fn call_tagging<T: DeserializeOwned>(&self, body: &str, mut args: JsonValue) -> Result<T> {
        let mut next_handle = self.next_handle.lock().await;
        args["next"] = json!(*next_handle);

        let body = format!(
            r#"
            {TAG_FN}
            const done = (found) => ({{ found, next }});
            {body}
            "#
        );
        let tagged: Tagged<T> = self.executor.call_as(&body, &args).await?;
        *next_handle = tagged.next.max(*next_handle);
        Ok(tagged.found)
    }

    fn selector_for(element: ElementHandle) -> String {
        format!("[{}=\"{}\"]", HANDLE_ATTR, element.id())
    }

    /// 在指定元素上执行一段脚本
    ///
    /// 脚本中以 `el` 引用该元素，以 `params` 引用额外参数。
    async fn eval_on(
        &self,
        element: ElementHandle,
        body: &str,
        params: JsonValue,
    ) -> Result<JsonValue> {
        let body = format!(
            r#"
            const el = document.querySelector(args.selector);
            if (!el) {{
                return {{ __missing: true }};
            }}
            const params = args.params;
            {body}
            "#
        );
        let args = json!({ "selector": Self::selector_for(element), "params": params });

        let value = self.executor.call(&body, &args).await?;
        if value.get("__missing").and_then(|v| v.as_bool()) == Some(true) {
            anyhow::bail!("元素句柄已失效: #{}", element.id());
        }
        Ok(value)
    }

    async fn element(&self, element: ElementHandle) -> Result<chromiumoxide::element::Element> {
        self.executor
            .page()
            .find_element(Self::selector_for(element))
            .await
            .with_context(|| format!("无法定位元素句柄 #{}", element.id()))
    }
}

#[async_trait]
impl PageDriver for ChromePage {
    async fn navigate(&self, url: &str) -> Result<()> {
        debug!("导航到: {}", url);
        self.executor
            .page()
            .goto(url)
            .await
            .with_context(|| format!("导航到 {} 失败", url))?;
        Ok(())
    }

    async fn current_url(&self) -> Result<String> {
        Ok(self.executor.page().url().await?.unwrap_or_default())
    }

    async fn reload(&self) -> Result<()> {
        self.executor.page().reload().await.context("刷新页面失败")?;
        Ok(())
    }

    async fn page_source(&self) -> Result<String> {
        Ok(self.executor.page().content().await?)
    }

    async fn find_all(
        &self,
        scope: Option<ElementHandle>,
        matcher: &Matcher,
    ) -> Result<Vec<ElementHandle>> {
        let (kind, expression) = match matcher {
            Matcher::Css(s) => ("css", s),
            Matcher::XPath(s) => ("xpath", s),
        };
        let args = json!({
            "scope": scope.map(Self::selector_for),
            "kind": kind,
            "expression": expression,
        });

        let body = format!(
            r#"
            const root = args.scope === null ? document : document.querySelector(args.scope);
            if (!root) {{
                return done([]);
            }}
            let nodes = [];
            if (args.kind === 'css') {{
                nodes = Array.from(root.querySelectorAll(args.expression));
            }} else {{
                const snapshot = document.evaluate(args.expression, root, null, XPathResult.ORDERED_NODE_SNAPSHOT_TYPE, null);
                for (let i = 0; i < snapshot.snapshotLength; i++) {{
                    nodes.push(snapshot.snapshotItem(i));
                }}
            }}
            return done(nodes.filter(n => n.nodeType === Node.ELEMENT_NODE).map(tag));
            "#
        );

        let ids: Vec<u64> = self.call_tagging(&body, args).await?;
        Ok(ids.into_iter().map(ElementHandle::new).collect())
    }

    async fn parent(&self, element: ElementHandle) -> Result<Option<ElementHandle>> {
        let found: Option<JsonValue> = self
            .call_tagging(
                r#"
                const el = document.querySelector(args.selector);
                if (!el) {
                    return done({ __missing: true });
                }
                return done(el.parentElement ? tag(el.parentElement) : null);
                "#,
                json!({ "selector": Self::selector_for(element) }),
            )
            .await?;
        match found {
            Some(JsonValue::Object(map)) if map.contains_key("__missing") => {
                anyhow::bail!("元素句柄已失效: #{}", element.id())
            }
            Some(value) => Ok(value.as_u64().map(ElementHandle::new)),
            None => Ok(None),
        }
    }

    async fn is_visible(&self, element: ElementHandle) -> Result<bool> {
        let value = self
            .eval_on(
                element,
                r#"
                const style = window.getComputedStyle(el);
                if (style.visibility === 'hidden' || style.display === 'none') {
                    return false;
                }
                return el.getClientRects().length > 0;
                "#,
                JsonValue::Null,
            )
            .await?;
        Ok(value.as_bool().unwrap_or(false))
    }

    async fn is_clickable(&self, element: ElementHandle) -> Result<bool> {
        let value = self
            .eval_on(
                element,
                r#"
                const style = window.getComputedStyle(el);
                if (style.visibility === 'hidden' || style.display === 'none' || style.pointerEvents === 'none') {
                    return false;
                }
                if (el.disabled || el.getAttribute('aria-disabled') === 'true') {
                    return false;
                }
                return el.getClientRects().length > 0;
                "#,
                JsonValue::Null,
            )
            .await?;
        Ok(value.as_bool().unwrap_or(false))
    }

    async fn click(&self, element: ElementHandle) -> Result<()> {
        self.element(element)
            .await?
            .click()
            .await
            .with_context(|| format!("点击元素 #{} 失败", element.id()))?;
        Ok(())
    }

    async fn type_text(&self, element: ElementHandle, text: &str) -> Result<()> {
        self.eval_on(
            element,
            r#"
            el.focus();
            if ('value' in el) {
                el.value = '';
                el.dispatchEvent(new Event('input', { bubbles: true }));
            }
            return true;
            "#,
            JsonValue::Null,
        )
        .await?;

        self.element(element)
            .await?
            .click()
            .await?
            .type_str(text)
            .await
            .with_context(|| format!("向元素 #{} 输入文本失败", element.id()))?;
        Ok(())
    }

    async fn select_option(&self, element: ElementHandle, option_text: &str) -> Result<()> {
        let selected = self
            .eval_on(
                element,
                r#"
                const wanted = params.wanted.trim().toLowerCase();
                const option = Array.from(el.options || []).find(o => o.text.trim().toLowerCase() === wanted);
                if (!option) {
                    return false;
                }
                el.value = option.value;
                el.dispatchEvent(new Event('change', { bubbles: true }));
                return true;
                "#,
                json!({ "wanted": option_text }),
            )
            .await?;
        if selected.as_bool() != Some(true) {
            anyhow::bail!("下拉框中没有选项: {}", option_text);
        }
        Ok(())
    }

    async fn text(&self, element: ElementHandle) -> Result<String> {
        let value = self
            .eval_on(
                element,
                "return el.innerText || el.textContent || '';",
                JsonValue::Null,
            )
            .await?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    async fn attribute(&self, element: ElementHandle, name: &str) -> Result<Option<String>> {
        let value = self
            .eval_on(
                element,
                "return el.getAttribute(params.name);",
                json!({ "name": name }),
            )
            .await?;
        Ok(value.as_str().map(str::to_string))
    }

    async fn set_file(&self, element: ElementHandle, path: &Path) -> Result<()> {
        let target = self.element(element).await?;
        let mut params = SetFileInputFilesParams::new(vec![path.to_string_lossy().to_string()]);
        params.backend_node_id = Some(target.backend_node_id);
        self.executor
            .page()
            .execute(params)
            .await
            .with_context(|| format!("上传文件失败: {}", path.display()))?;
        Ok(())
    }

    async fn reveal(&self, element: ElementHandle) -> Result<()> {
        self.eval_on(
            element,
            "el.classList.remove('hidden'); return true;",
            JsonValue::Null,
        )
        .await?;
        Ok(())
    }

    async fn blur_active(&self) -> Result<()> {
        self.executor
            .call(
                "if (document.activeElement) { document.activeElement.blur(); } return true;",
                &JsonValue::Null,
            )
            .await?;
        Ok(())
    }

    async fn scroll_height(&self) -> Result<u64> {
        let height: f64 = self
            .executor
            .call_as("return document.documentElement.scrollHeight;", &JsonValue::Null)
            .await?;
        Ok(height.max(0.0) as u64)
    }

    async fn scroll_to(&self, y: u64) -> Result<()> {
        self.executor
            .call(
                "document.documentElement.scrollTop = args.y; return true;",
                &json!({ "y": y }),
            )
            .await?;
        Ok(())
    }
}
