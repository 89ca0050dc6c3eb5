pub mod apply_ctx;
pub mod apply_flow;
pub mod form_step;
pub mod question_classifier;
pub mod selectors;
pub mod submission;

pub use apply_ctx::ApplyCtx;
pub use apply_flow::{ApplyFlow, FlowOptions, WorkflowOutcome};
pub use form_step::{FormStepProcessor, StepKind, StepReport};
pub use question_classifier::{classify, FieldControl, SectionControls, TextFieldFacts};
pub use submission::{is_submit_label, SubmissionState, SubmissionStateMachine};
