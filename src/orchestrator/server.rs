//! 应用入口 - 编排层
//!
//! ## 职责
//!
//! 1. **应用初始化**：加载题库和评分规则、创建 LLM 服务和面试流程
//! 2. **资源管理**：持有唯一的 `InterviewFlow`，所有请求共享
//! 3. **对外服务**：绑定端口并启动 HTTP 服务，支持 Ctrl+C 优雅退出

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use crate::config::Config;
use crate::models::{load_question_bank_or_default, load_rubric_or_default};
use crate::orchestrator::routes;
use crate::services::LlmService;
use crate::utils::logging::log_startup;
use crate::workflow::InterviewFlow;

/// 应用主结构
pub struct App {
    config: Config,
    flow: Arc<InterviewFlow>,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> Result<Self> {
        let questions = load_question_bank_or_default(config.questions_file.as_deref()).await?;
        let rubric = load_rubric_or_default(config.rubric_file.as_deref()).await?;

        log_startup(&config, questions.len(), rubric.max_score());

        let llm = Arc::new(LlmService::new(&config));
        let flow = Arc::new(InterviewFlow::new(&config, questions, rubric, llm));

        Ok(Self { config, flow })
    }

    /// 运行 HTTP 服务直到收到退出信号
    pub async fn run(self) -> Result<()> {
        let listener = tokio::net::TcpListener::bind(&self.config.bind_addr)
            .await
            .with_context(|| format!("无法绑定地址: {}", self.config.bind_addr))?;

        info!("🌐 HTTP 服务已启动: http://{}", listener.local_addr()?);

        axum::serve(listener, routes::router(self.flow))
            .with_graceful_shutdown(shutdown_signal())
            .await
            .context("HTTP 服务异常退出")?;

        info!("👋 服务已停止");
        Ok(())
    }
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("收到退出信号，正在关闭...");
    }
}
