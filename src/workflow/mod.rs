pub mod interview_flow;
pub mod turn_ctx;

pub use interview_flow::{ChatReply, InterviewFlow, SubmissionReport, TurnStatus, START_KEYWORD};
pub use turn_ctx::TurnCtx;
