//! 页面选择器与内置定位目标
//!
//! 所有和目标站点 DOM 结构相关的表达式都集中在这里。

use crate::infrastructure::Matcher;
use crate::services::element_locator::{Cardinality, LocatorTarget};

// ========== 职位详情页 ==========

pub const SEE_MORE_DESCRIPTION: &str = r#"//button[@aria-label="Click to see more description"]"#;
pub const DESCRIPTION: &str = ".jobs-description-content__text";
/// 高级会员布局下的职位描述
pub const DESCRIPTION_PREMIUM: &str = ".job-details-about-the-job-module__description";
pub const HIRING_TEAM_HEADING: &str = r#"//h2[text()="Meet the hiring team"]"#;
/// 相对于招聘团队标题查找
pub const RECRUITER_LINK: &str = r#".//following::a[contains(@href, "linkedin.com/in/")]"#;

// ========== 申请表单 ==========

pub const STEP_CONTAINER: &str = ".jobs-easy-apply-content";
pub const FORM_ELEMENT: &str = ".pb4";
pub const FILE_INPUT: &str = "input[type='file']";
pub const SHOW_MORE_RESUMES: &str = "//button[contains(@aria-label, 'Show more resumes')]";
pub const QUESTION_SECTION: &str = ".jobs-easy-apply-form-section__grouping";
pub const QUESTION_LABEL: &str = "label, legend";

pub const RADIO_INPUT: &str = "input[type='radio']";
pub const RADIO_OPTION_LABEL: &str = "input[type='radio'] + label";
pub const CHECKBOX_INPUT: &str = "input[type='checkbox']";
pub const CHECKBOX_OPTION_LABEL: &str = "input[type='checkbox'] + label";
pub const SELECT: &str = "select";
pub const SELECT_OPTION: &str = "select option";
pub const TEXT_INPUT: &str =
    "input:not([type='radio']):not([type='checkbox']):not([type='file']):not([type='hidden'])";
pub const TEXTAREA: &str = "textarea";

/// 下拉框占位选项，不算作答案
pub const SELECT_PLACEHOLDER: &str = "Select an option";

// ========== 提交与回滚 ==========

pub const VALIDATION_ERROR: &str = ".artdeco-inline-feedback--error";
pub const FOLLOW_COMPANY_LABEL: &str = "//label[contains(.,'to stay up to date with their page.')]";
pub const MODAL_DISMISS: &str = ".artdeco-modal__dismiss";
pub const DISCARD_CONFIRM: &str = ".artdeco-modal__confirm-dialog-btn";

// ========== 定位目标 ==========

pub const APPLY_TRIGGER_STRUCTURAL: &str = r#"//button[contains(@class, "jobs-apply-button") and .//span[contains(@class, "artdeco-button__text") and normalize-space(text()) = "Easy Apply"]]"#;
pub const APPLY_TRIGGER_ARIA: &str = r#"//button[contains(@aria-label, "Easy Apply to")]"#;
pub const APPLY_TRIGGER_TEXT: &str = r#"//button[contains(text(), "Easy Apply") or contains(text(), "Apply now") or contains(text(), "Solicitud sencilla")]"#;

pub const PRIMARY_ACTION_MODAL: &str = ".artdeco-modal button.artdeco-button--primary";
pub const PRIMARY_ACTION_ARIA: &str = "//button[contains(@aria-label, 'Submit application') or contains(@aria-label, 'Continue to next step') or contains(@aria-label, 'Review your application')]";
pub const PRIMARY_ACTION_TEXT: &str = "//button[contains(., 'Submit application') or contains(., 'Enviar solicitud') or contains(., 'Next') or contains(., 'Review')]";

/// "Easy Apply" 按钮：结构匹配 → aria-label → 多语言文本
pub fn apply_trigger_target() -> LocatorTarget {
    LocatorTarget::new("Easy Apply 按钮")
        .strategy(
            "jobs-apply-button 结构匹配",
            Matcher::xpath(APPLY_TRIGGER_STRUCTURAL),
            Cardinality::Multiple,
        )
        .strategy(
            "aria-label 匹配",
            Matcher::xpath(APPLY_TRIGGER_ARIA),
            Cardinality::Single,
        )
        .strategy(
            "按钮文本匹配",
            Matcher::xpath(APPLY_TRIGGER_TEXT),
            Cardinality::Single,
        )
}

/// 表单弹窗里的主按钮（下一步 / 检查 / 提交）
pub fn primary_action_target() -> LocatorTarget {
    LocatorTarget::new("表单主按钮")
        .strategy(
            "弹窗内 primary 按钮",
            Matcher::css(PRIMARY_ACTION_MODAL),
            Cardinality::Multiple,
        )
        .strategy(
            "aria-label 匹配",
            Matcher::xpath(PRIMARY_ACTION_ARIA),
            Cardinality::Single,
        )
        .strategy(
            "按钮文本匹配",
            Matcher::xpath(PRIMARY_ACTION_TEXT),
            Cardinality::Single,
        )
}
