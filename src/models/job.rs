use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// 待投递的职位
///
/// 由调用方创建并持有；投递流程只会回填描述、招聘人链接和生成的附件路径。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Job {
    pub link: String,
    pub title: String,
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recruiter_link: Option<String>,
    #[serde(skip)]
    pub resume_path: Option<PathBuf>,
    #[serde(skip)]
    pub cover_letter_path: Option<PathBuf>,
}

impl Job {
    pub fn new(link: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            link: link.into(),
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = description.into();
    }

    /// 空字符串视为没有招聘人信息
    pub fn set_recruiter_link(&mut self, link: Option<String>) {
        self.recruiter_link = link.filter(|l| !l.trim().is_empty());
    }

    /// 用于提示词的职位摘要
    pub fn summary(&self) -> String {
        let mut summary = format!("Position: {}", self.title);
        if !self.company.is_empty() {
            summary.push_str(&format!("\nCompany: {}", self.company));
        }
        if !self.location.is_empty() {
            summary.push_str(&format!("\nLocation: {}", self.location));
        }
        if !self.description.is_empty() {
            summary.push_str(&format!("\nDescription:\n{}", self.description));
        }
        summary
    }
}

impl fmt::Display for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.company.is_empty() {
            write!(f, "{} ({})", self.title, self.link)
        } else {
            write!(f, "{} @ {} ({})", self.title, self.company, self.link)
        }
    }
}

/// 职位列表文件
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JobList {
    #[serde(default)]
    pub jobs: Vec<Job>,
}
