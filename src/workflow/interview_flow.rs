//! 面试流程 - 流程层
//!
//! 核心职责：定义"一个候选人"的完整面试流程
//!
//! 阶段顺序：
//! 1. 未开始 → 收到 start 关键字后进入概念问答
//! 2. 概念问答 → 逐题下发，最后一题回答后生成阶段点评并下发实操任务
//! 3. 任务已下发 → 等待上传，评分 + 最终点评后删除会话

use std::path::PathBuf;
use std::sync::Arc;

use chrono::Local;
use serde::Serialize;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::error::AppResult;
use crate::infrastructure::SessionStore;
use crate::models::{Phase, QuestionBank, Rubric, Session, Turn};
use crate::services::{
    ArtifactGenerator, ArtifactGrader, FeedbackMode, FeedbackSynthesizer, GradeResult,
    SubmissionWriter, TextGenerator,
};
use crate::utils::logging::truncate_text;
use crate::workflow::turn_ctx::TurnCtx;

/// 开始面试的关键字（不区分大小写）
pub const START_KEYWORD: &str = "start";

const INTRO_MESSAGE: &str = "Hello! I'm your AI Excel Interviewer. I'll ask you a few questions about Excel concepts first, then provide a practical task. Let's begin.";
const NOT_STARTED_MESSAGE: &str = "Please click the start button to begin the interview.";
const TASK_READY_MESSAGE: &str = "That concludes the conceptual part. Your practical task is ready: download the spreadsheet, complete it, and upload your solution.";
const TASK_REMINDER_MESSAGE: &str = "Your practical task is ready. Please download it and upload your solution when you are done.";
const TASK_ERROR_MESSAGE: &str = "Sorry, we could not prepare your practical task. Please send your last answer again.";
const CONTINUE_MESSAGE: &str = "I'm ready for the next question. Please continue.";
const NO_TASK_MESSAGE: &str = "No practical task has been issued for this session. Please complete the interview first.";

/// 对外返回的状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnStatus {
    Ongoing,
    NotStarted,
    TaskReady,
    Complete,
    Error,
}

/// 一轮对话的回复
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatReply {
    pub response: String,
    pub status: TurnStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conceptual_feedback: Option<String>,
}

impl ChatReply {
    fn new(response: impl Into<String>, status: TurnStatus) -> Self {
        Self {
            response: response.into(),
            status,
            conceptual_feedback: None,
        }
    }
}

/// 提交实操任务后的报告
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmissionReport {
    pub status: TurnStatus,
    pub report: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<u32>,
    pub feedback: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_feedback: Option<String>,
}

impl SubmissionReport {
    fn not_started() -> Self {
        Self {
            status: TurnStatus::NotStarted,
            report: NO_TASK_MESSAGE.to_string(),
            score: None,
            feedback: Vec::new(),
            final_feedback: None,
        }
    }
}

fn is_start_keyword(text: &str) -> bool {
    text.trim().eq_ignore_ascii_case(START_KEYWORD)
}

/// 面试流程
///
/// - 持有会话存储和所有业务能力
/// - 每个阶段一个处理函数，阶段是显式字段而不是隐式推断
/// - 同一会话的请求在会话锁内串行执行
pub struct InterviewFlow {
    store: SessionStore,
    questions: QuestionBank,
    generator: ArtifactGenerator,
    grader: Arc<ArtifactGrader>,
    synthesizer: FeedbackSynthesizer,
    submissions: SubmissionWriter,
    acknowledge_answers: bool,
}

impl InterviewFlow {
    /// 创建新的面试流程
    pub fn new(
        config: &Config,
        questions: QuestionBank,
        rubric: Rubric,
        text_generator: Arc<dyn TextGenerator>,
    ) -> Self {
        Self::with_synthesizer(
            config,
            questions,
            rubric,
            FeedbackSynthesizer::new(text_generator, config),
        )
    }

    /// 使用自定义的反馈生成器
    pub fn with_synthesizer(
        config: &Config,
        questions: QuestionBank,
        rubric: Rubric,
        synthesizer: FeedbackSynthesizer,
    ) -> Self {
        Self {
            store: SessionStore::new(),
            questions,
            generator: ArtifactGenerator::new(&config.artifact_dir),
            grader: Arc::new(ArtifactGrader::new(rubric)),
            synthesizer,
            submissions: SubmissionWriter::new(&config.artifact_dir),
            acknowledge_answers: config.acknowledge_answers,
        }
    }

    /// 当前存活的会话数量
    pub fn active_sessions(&self) -> usize {
        self.store.session_count()
    }

    /// 会话状态快照（只读）
    pub async fn snapshot(&self, session_id: &str) -> Option<Session> {
        self.store.lock(session_id).await.clone()
    }

    /// 处理一轮对话
    pub async fn handle_turn(&self, session_id: &str, text: &str) -> ChatReply {
        let mut guard = self.store.lock(session_id).await;

        match guard.as_mut() {
            Some(session) => {
                let ctx = TurnCtx::new(session_id, session.turn_index);
                match session.phase {
                    Phase::ConceptualQa => self.conceptual_turn(session, text, &ctx).await,
                    Phase::TaskIssued => self.task_issued_turn(&ctx),
                }
            }
            None if is_start_keyword(text) => {
                let (session, reply) = self.begin(session_id);
                *guard = Some(session);
                reply
            }
            None => {
                info!("[会话 {}] 尚未开始，提示候选人点击开始", session_id);
                ChatReply::new(NOT_STARTED_MESSAGE, TurnStatus::NotStarted)
            }
        }
    }

    /// 会话的任务文件路径（未生成时返回 `None`）
    pub async fn task_artifact(&self, session_id: &str) -> Option<PathBuf> {
        if self.generator.task_exists(session_id).await {
            Some(self.generator.task_path(session_id))
        } else {
            None
        }
    }

    pub async fn task_exists(&self, session_id: &str) -> bool {
        self.generator.task_exists(session_id).await
    }

    /// 提交实操任务
    ///
    /// 只有上传文件落盘失败会返回错误；无法解析的文件按 0 分处理
    pub async fn submit_solution(
        &self,
        session_id: &str,
        file_name: &str,
        bytes: &[u8],
    ) -> AppResult<SubmissionReport> {
        let mut guard = self.store.lock(session_id).await;

        let Some(session) = guard
            .as_mut()
            .filter(|session| session.phase == Phase::TaskIssued)
        else {
            warn!("[会话 {}] ⚠️ 未下发任务就收到上传，忽略", session_id);
            return Ok(SubmissionReport::not_started());
        };
        let ctx = TurnCtx::new(session_id, session.turn_index);

        let path = self.submissions.write(session_id, file_name, bytes).await?;
        info!("{} 📥 收到提交文件: {}", ctx, path.display());

        let grade = self.grade(path).await;
        let max_score = self.grader.rubric().max_score();
        info!("{} 📊 评分: {}/{}", ctx, grade.score, max_score);

        session.push(Turn::interviewer(format!(
            "Practical task graded: {}/{}.\n{}",
            grade.score,
            max_score,
            grade.feedback.join("\n")
        )));

        let final_feedback = self
            .synthesizer
            .synthesize(session.history(), FeedbackMode::FinalReview)
            .await;

        let report = format!(
            "Score: {}/{}\n\nRubric feedback:\n{}\n\nOverall feedback:\n{}",
            grade.score,
            max_score,
            grade.feedback.join("\n"),
            final_feedback
        );

        let elapsed = Local::now() - session.started_at;
        info!("{} ✅ 面试结束，用时 {} 秒，删除会话", ctx, elapsed.num_seconds());

        *guard = None;
        self.generator.remove_task(session_id).await;

        Ok(SubmissionReport {
            status: TurnStatus::Complete,
            report,
            score: Some(grade.score),
            feedback: grade.feedback,
            final_feedback: Some(final_feedback),
        })
    }

    // ========== 各阶段处理 ==========

    /// 创建会话，下发开场白和第一题
    fn begin(&self, session_id: &str) -> (Session, ChatReply) {
        let mut session = Session::new(session_id);
        let first_question = self.questions.get(0).unwrap_or_default();

        session.push(Turn::interviewer(INTRO_MESSAGE));
        session.push(Turn::interviewer(first_question));
        session.turn_index = 1;

        info!(
            "[会话 {}] 🚀 面试开始，共 {} 道概念题",
            session_id,
            self.questions.len()
        );

        let reply = ChatReply::new(
            format!("{}\n\n{}", INTRO_MESSAGE, first_question),
            TurnStatus::Ongoing,
        );
        (session, reply)
    }

    /// 概念问答阶段
    async fn conceptual_turn(&self, session: &mut Session, text: &str, ctx: &TurnCtx) -> ChatReply {
        // 重复的 start 不当作回答，重发当前问题
        if is_start_keyword(text) {
            let pending = session.last_interviewer_line().unwrap_or(CONTINUE_MESSAGE);
            return ChatReply::new(pending, TurnStatus::Ongoing);
        }

        let total = self.questions.len();
        match session.turn_index {
            index if index >= 1 && index < total => self.advance(session, text, ctx).await,
            index if index == total => self.close_conceptual_phase(session, text, ctx).await,
            index => {
                warn!("{} ⚠️ 意外的 turn_index: {}", ctx, index);
                ChatReply::new(CONTINUE_MESSAGE, TurnStatus::Ongoing)
            }
        }
    }

    /// 记录回答并下发下一题
    async fn advance(&self, session: &mut Session, text: &str, ctx: &TurnCtx) -> ChatReply {
        let Some(question) = self.questions.get(session.turn_index) else {
            return ChatReply::new(CONTINUE_MESSAGE, TurnStatus::Ongoing);
        };

        info!("{} 回答: {}", ctx, truncate_text(text, 80));
        session.push(Turn::candidate(text));

        let acknowledgement = if self.acknowledge_answers {
            Some(
                self.synthesizer
                    .synthesize(session.history(), FeedbackMode::AcknowledgeAndContinue)
                    .await,
            )
        } else {
            None
        };

        session.push(Turn::interviewer(question));
        session.turn_index += 1;
        info!(
            "{} ➡️ 下发第 {}/{} 题",
            ctx,
            session.turn_index,
            self.questions.len()
        );

        let response = match acknowledgement {
            Some(ack) => format!("{}\n\n{}", ack, question),
            None => question.to_string(),
        };
        ChatReply::new(response, TurnStatus::Ongoing)
    }

    /// 最后一题回答后：生成阶段点评并下发实操任务
    ///
    /// 任务文件生成失败时不修改会话，候选人重发回答即可重试
    async fn close_conceptual_phase(
        &self,
        session: &mut Session,
        text: &str,
        ctx: &TurnCtx,
    ) -> ChatReply {
        info!("{} 回答: {}", ctx, truncate_text(text, 80));

        let mut transcript = session.history().to_vec();
        transcript.push(Turn::candidate(text));

        let feedback = self
            .synthesizer
            .synthesize(&transcript, FeedbackMode::FinalReview)
            .await;

        if let Err(e) = self.generator.ensure_task_artifact(&session.id).await {
            error!("{} ❌ 生成任务文件失败: {}", ctx, e);
            return ChatReply::new(TASK_ERROR_MESSAGE, TurnStatus::Error);
        }

        session.push(Turn::candidate(text));
        session.conceptual_feedback = Some(feedback.clone());
        session.phase = Phase::TaskIssued;
        session.turn_index += 1;
        info!("{} 📝 概念问答结束，实操任务已下发", ctx);

        ChatReply {
            response: TASK_READY_MESSAGE.to_string(),
            status: TurnStatus::TaskReady,
            conceptual_feedback: Some(feedback),
        }
    }

    /// 任务已下发：普通聊天只提示下载，不修改状态
    fn task_issued_turn(&self, ctx: &TurnCtx) -> ChatReply {
        info!("{} 任务已下发，提示下载", ctx);
        ChatReply::new(TASK_REMINDER_MESSAGE, TurnStatus::TaskReady)
    }

    /// 在阻塞线程池中评分
    async fn grade(&self, path: PathBuf) -> GradeResult {
        let grader = Arc::clone(&self.grader);
        tokio::task::spawn_blocking(move || grader.grade(&path))
            .await
            .unwrap_or_else(|e| {
                warn!("⚠️ 评分任务异常退出: {}", e);
                GradeResult::unreadable()
            })
    }
}
