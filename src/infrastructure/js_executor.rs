//! JS 执行器 - 基础设施层
//!
//! 持有唯一的 page 资源，只暴露"执行 JS"的能力

use anyhow::{Context, Result};
use chromiumoxide::Page;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;

/// JS 执行器
///
/// 职责：
/// - 持有唯一的 Page 资源
/// - 暴露 eval() / call() 能力
/// - 不认识 Job / 表单步骤
pub struct JsExecutor {
    page: Page,
}

impl JsExecutor {
    pub fn new(page: Page) -> Self {
        Self { page }
    }

    /// 获取 page 的引用（用于导航、上传等非脚本操作）
    pub fn page(&self) -> &Page {
        &self.page
    }

    /// 执行 JS 代码并返回 JSON 结果
    ///
    /// 脚本没有返回值时结果为 `null`。
    pub async fn eval(&self, js_code: impl Into<String>) -> Result<JsonValue> {
        let result = self
            .page
            .evaluate(js_code.into())
            .await
            .context("执行页面脚本失败")?;
        Ok(result.into_value().unwrap_or(JsonValue::Null))
    }

    /// 以 JSON 参数调用一段函数体
    ///
    /// 函数体中以 `args` 引用参数，参数经过 JSON 序列化后传入，不需要手动转义。
    pub async fn call(&self, body: &str, args: &JsonValue) -> Result<JsonValue> {
        let js_code = format!(
            "((args) => {{\n{}\n}})({})",
            body,
            serde_json::to_string(args)?
        );
        self.eval(js_code).await
    }

    /// 调用函数体并反序列化为指定类型
    pub async fn call_as<T: DeserializeOwned>(&self, body: &str, args: &JsonValue) -> Result<T> {
        let json_value = self.call(body, args).await?;
        serde_json::from_value(json_value).context("脚本返回值类型不符")
    }
}
