//! 问题分类
//!
//! 根据问题块里出现的控件判断问题类型，以及应该如何填写。

use crate::models::QuestionKind;

/// 文本输入框的特征
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextFieldFacts {
    pub input_type: Option<String>,
    pub placeholder: Option<String>,
    pub id: Option<String>,
    pub class: Option<String>,
}

impl TextFieldFacts {
    fn is_date(&self) -> bool {
        let input_type = self.input_type.as_deref().unwrap_or_default().to_lowercase();
        let placeholder = self.placeholder.as_deref().unwrap_or_default().to_lowercase();
        let id = self.id.as_deref().unwrap_or_default().to_lowercase();
        let class = self.class.as_deref().unwrap_or_default().to_lowercase();

        input_type == "date"
            || placeholder.contains("mm/dd/yyyy")
            || placeholder.contains("dd/mm/yyyy")
            || id.contains("date")
            || class.contains("date")
    }

    fn is_numeric(&self) -> bool {
        let input_type = self.input_type.as_deref().unwrap_or_default().to_lowercase();
        let id = self.id.as_deref().unwrap_or_default().to_lowercase();

        input_type == "number" || id.contains("numeric")
    }
}

/// 一个问题块里各类控件的数量
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SectionControls {
    pub radios: usize,
    pub selects: usize,
    pub checkboxes: usize,
    /// 第一个文本输入框
    pub text_input: Option<TextFieldFacts>,
    pub textareas: usize,
}

/// 问题块应当使用的填写方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldControl {
    RadioGroup,
    Dropdown,
    CheckboxGroup,
    DateInput,
    NumericInput,
    TextInput,
    TextArea,
}

impl FieldControl {
    pub fn kind(self) -> QuestionKind {
        match self {
            FieldControl::RadioGroup | FieldControl::Dropdown | FieldControl::CheckboxGroup => {
                QuestionKind::Choice
            }
            FieldControl::DateInput => QuestionKind::Date,
            FieldControl::NumericInput => QuestionKind::Numeric,
            FieldControl::TextInput | FieldControl::TextArea => QuestionKind::Text,
        }
    }
}

/// 判断问题块的填写方式，没有可填写的控件时返回 `None`
///
/// 优先级：单选 > 下拉 > 多选 > 文本输入（日期 / 数字 / 普通） > 多行文本
pub fn classify(controls: &SectionControls) -> Option<FieldControl> {
    if controls.radios > 0 {
        return Some(FieldControl::RadioGroup);
    }
    if controls.selects > 0 {
        return Some(FieldControl::Dropdown);
    }
    if controls.checkboxes > 0 {
        return Some(FieldControl::CheckboxGroup);
    }
    if let Some(facts) = &controls.text_input {
        return Some(if facts.is_date() {
            FieldControl::DateInput
        } else if facts.is_numeric() {
            FieldControl::NumericInput
        } else {
            FieldControl::TextInput
        });
    }
    if controls.textareas > 0 {
        return Some(FieldControl::TextArea);
    }
    None
}
