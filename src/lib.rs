//! # Excel Interviewer
//!
//! AI 驱动的 Excel 模拟面试后端
//!
//! ## 架构设计
//!
//! 本系统采用严格的四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有共享状态，只暴露能力
//! - `SessionStore` - 按会话加锁的会话表
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，不关心会话流程
//! - `LlmService` / `FeedbackSynthesizer` - LLM 生成与重试兜底
//! - `ArtifactGenerator` - 生成模板和每个会话的任务表格
//! - `ArtifactGrader` - 按评分规则检查公式
//! - `SubmissionWriter` - 保存上传的解答
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一轮对话"的完整处理流程
//! - `TurnCtx` - 上下文封装（session_id + turn_index）
//! - `InterviewFlow` - 状态机（问答 → 发放任务 → 评分 → 结束）
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/server` - 应用初始化和 HTTP 服务
//! - `orchestrator/routes` - HTTP 路由
//!
//! ## 模块结构

pub mod config;
pub mod error;
pub mod infrastructure;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::Config;
pub use error::{AppError, AppResult};
pub use infrastructure::SessionStore;
pub use models::{QuestionBank, Rubric, RubricRule, Session};
pub use orchestrator::{router, App};
pub use services::{FeedbackSynthesizer, GradeResult, TextGenerator};
pub use workflow::{ChatReply, InterviewFlow, SubmissionReport, TurnCtx, TurnStatus};
