use std::fmt;

use serde::{Deserialize, Serialize};

/// 问题类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionKind {
    Text,
    Numeric,
    Choice,
    Date,
}

impl fmt::Display for QuestionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            QuestionKind::Text => "text",
            QuestionKind::Numeric => "numeric",
            QuestionKind::Choice => "choice",
            QuestionKind::Date => "date",
        };
        f.write_str(name)
    }
}

/// 一条已回答过的问题
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionAnswer {
    /// 归一化后的问题文本（答案库的键）
    pub question: String,
    pub answer: String,
    #[serde(rename = "type")]
    pub kind: QuestionKind,
}

impl QuestionAnswer {
    /// 创建记录，问题文本会被归一化
    pub fn new(question: &str, answer: impl Into<String>, kind: QuestionKind) -> Self {
        Self {
            question: normalize_question(question),
            answer: answer.into(),
            kind,
        }
    }
}

/// 归一化问题文本
///
/// 小写化；去掉全部控制字符（包括换行和制表符）、双引号和反斜杠；
/// 去掉首部空白以及尾部的空白和逗号。结果满足 `normalize(normalize(s)) == normalize(s)`。
pub fn normalize_question(text: &str) -> String {
    let cleaned: String = text
        .to_lowercase()
        .chars()
        .filter(|c| !c.is_control() && *c != '"' && *c != '\\')
        .collect();

    cleaned
        .trim_start()
        .trim_end_matches(|c: char| c == ',' || c.is_whitespace())
        .to_string()
}
