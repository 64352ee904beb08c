pub mod artifact_generator;
pub mod artifact_grader;
pub mod feedback;
pub mod llm_service;
pub mod submission_writer;

pub use artifact_generator::ArtifactGenerator;
pub use artifact_grader::{ArtifactGrader, GradeResult};
pub use feedback::{FeedbackMode, FeedbackSynthesizer};
pub use llm_service::{LlmService, TextGenerator};
pub use submission_writer::SubmissionWriter;
