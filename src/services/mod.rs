pub mod answer_store;
pub mod artifact_service;
pub mod collaborators;
pub mod element_locator;
pub mod failure_writer;
pub mod llm_artifacts;
pub mod llm_service;
pub mod pdf_writer;
pub mod redirect_guard;
pub mod waits;

pub use answer_store::AnswerStore;
pub use artifact_service::{validate_artifact, ArtifactService};
pub use collaborators::{
    ArtifactGenerator, GenerationError, QuestionAnswerer, ResolvedAnswer, UploadPurpose,
};
pub use element_locator::{Cardinality, ElementLocator, LocatorStrategy, LocatorTarget};
pub use failure_writer::FailureWriter;
pub use llm_artifacts::LlmArtifactGenerator;
pub use llm_service::LlmService;
pub use pdf_writer::render_text_pdf;
pub use redirect_guard::RedirectGuard;
pub use waits::Waits;
