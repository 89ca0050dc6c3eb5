//! 答案库 - 业务能力层
//!
//! 持久化"归一化问题 → 答案"的记录，运行开始时整体读入内存，
//! 运行期间只追加，每新增一条就写回文件。

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::error::{AppResult, ApplyError};
use crate::models::{normalize_question, QuestionAnswer, QuestionKind};

#[derive(Debug)]
pub struct AnswerStore {
    path: PathBuf,
    records: Vec<QuestionAnswer>,
}

impl AnswerStore {
    /// 加载答案库
    ///
    /// 文件不存在时得到空库；内容损坏时记录警告并降级为空库。
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        match Self::try_load(&path) {
            Ok(store) => store,
            Err(e) => {
                warn!("⚠️ {}，使用空答案库", e);
                Self {
                    path,
                    records: Vec::new(),
                }
            }
        }
    }

    /// 严格加载，损坏时返回 `StoreCorrupt`
    pub fn try_load(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            debug!("答案库不存在，将新建: {}", path.display());
            return Ok(Self {
                path: path.to_path_buf(),
                records: Vec::new(),
            });
        }

        let corrupt = |reason: String| ApplyError::StoreCorrupt {
            path: path.display().to_string(),
            reason,
        };

        let content = fs::read_to_string(path).map_err(|e| corrupt(e.to_string()))?;
        let records: Vec<QuestionAnswer> = if content.trim().is_empty() {
            Vec::new()
        } else {
            serde_json::from_str(&content).map_err(|e| corrupt(e.to_string()))?
        };

        info!("📒 已加载 {} 条历史答案", records.len());
        Ok(Self {
            path: path.to_path_buf(),
            records,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 按追加顺序返回全部记录
    pub fn records(&self) -> &[QuestionAnswer] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// 按问题查找答案，问题文本会先归一化
    pub fn lookup(&self, question: &str) -> Option<&QuestionAnswer> {
        let key = normalize_question(question);
        self.records.iter().find(|r| r.question == key)
    }

    /// 追加一条新答案并立即写回
    ///
    /// 已有相同归一化问题时不追加，返回 `false`。
    pub fn append(
        &mut self,
        question: &str,
        answer: impl Into<String>,
        kind: QuestionKind,
    ) -> AppResult<bool> {
        let record = QuestionAnswer::new(question, answer, kind);
        if record.question.is_empty() {
            return Ok(false);
        }
        if self.records.iter().any(|r| r.question == record.question) {
            debug!("答案已存在，跳过: {}", record.question);
            return Ok(false);
        }

        self.records.push(record);
        self.flush()?;
        Ok(true)
    }

    /// 显式重新保存：覆盖同一问题的旧答案
    pub fn resave(
        &mut self,
        question: &str,
        answer: impl Into<String>,
        kind: QuestionKind,
    ) -> AppResult<()> {
        let record = QuestionAnswer::new(question, answer, kind);
        match self.records.iter_mut().find(|r| r.question == record.question) {
            Some(existing) => *existing = record,
            None => self.records.push(record),
        }
        self.flush()
    }

    /// 把全部记录写回文件（先写临时文件再替换）
    pub fn flush(&self) -> AppResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(&self.records)
            .map_err(|e| ApplyError::Driver(e.into()))?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}
