//! HTTP 路由
//!
//! - GET  /                 - 服务说明
//! - POST /chat             - 一轮对话
//! - GET  /download_task    - 下载实操任务表格
//! - GET  /task_exists      - 任务表格是否已生成
//! - POST /upload_solution  - 上传解答并获取报告

use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, Multipart, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, warn};

use crate::workflow::{ChatReply, InterviewFlow};

const XLSX_CONTENT_TYPE: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
const TASK_CONTENT_DISPOSITION: &str = "attachment; filename=\"excel_task.xlsx\"";

/// 上传文件大小上限
const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// 路由共享状态
#[derive(Clone)]
struct AppState {
    flow: Arc<InterviewFlow>,
}

#[derive(Debug, Deserialize)]
struct ChatRequest {
    #[serde(alias = "user_id")]
    session_id: String,
    message: String,
}

#[derive(Debug, Deserialize)]
struct SessionQuery {
    #[serde(alias = "user_id")]
    session_id: String,
}

/// 构建路由
pub fn router(flow: Arc<InterviewFlow>) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/chat", post(chat_handler))
        .route("/download_task", get(download_task_handler))
        .route("/task_exists", get(task_exists_handler))
        .route("/upload_solution", post(upload_solution_handler))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(AppState { flow })
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(json!({ "error": message.into() }))).into_response()
}

async fn index_handler() -> Json<serde_json::Value> {
    Json(json!({ "message": "Hello, this is the AI-Powered Excel Mock Interviewer Backend!" }))
}

async fn chat_handler(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Json<ChatReply> {
    Json(
        state
            .flow
            .handle_turn(&request.session_id, &request.message)
            .await,
    )
}

async fn download_task_handler(
    State(state): State<AppState>,
    Query(query): Query<SessionQuery>,
) -> Response {
    let Some(path) = state.flow.task_artifact(&query.session_id).await else {
        return error_response(
            StatusCode::NOT_FOUND,
            "Task file not found. Please finish the conceptual questions first.",
        );
    };

    match tokio::fs::read(&path).await {
        Ok(bytes) => (
            [
                (header::CONTENT_TYPE, XLSX_CONTENT_TYPE),
                (header::CONTENT_DISPOSITION, TASK_CONTENT_DISPOSITION),
            ],
            bytes,
        )
            .into_response(),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            error_response(StatusCode::NOT_FOUND, "Task file not found.")
        }
        Err(e) => {
            error!("读取任务文件失败 ({}): {}", path.display(), e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to read the task file.")
        }
    }
}

async fn task_exists_handler(
    State(state): State<AppState>,
    Query(query): Query<SessionQuery>,
) -> Json<serde_json::Value> {
    let exists = state.flow.task_exists(&query.session_id).await;
    Json(json!({ "exists": exists }))
}

async fn upload_solution_handler(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Response {
    let mut session_id: Option<String> = None;
    let mut upload: Option<(String, Vec<u8>)> = None;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                warn!("⚠️ 解析上传请求失败: {}", e);
                return error_response(e.status(), e.body_text());
            }
        };

        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "session_id" | "user_id" => match field.text().await {
                Ok(text) => session_id = Some(text.trim().to_string()),
                Err(e) => return error_response(e.status(), e.body_text()),
            },
            "file" => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                match field.bytes().await {
                    Ok(bytes) => upload = Some((file_name, bytes.to_vec())),
                    Err(e) => return error_response(e.status(), e.body_text()),
                }
            }
            _ => {}
        }
    }

    let Some(session_id) = session_id.filter(|id| !id.is_empty()) else {
        return error_response(StatusCode::BAD_REQUEST, "session_id is required.");
    };
    let Some((file_name, bytes)) = upload else {
        return error_response(StatusCode::BAD_REQUEST, "file is required.");
    };

    match state
        .flow
        .submit_solution(&session_id, &file_name, &bytes)
        .await
    {
        Ok(report) => Json(report).into_response(),
        Err(e) => {
            error!("[会话 {}] ❌ 处理上传失败: {}", session_id, e);
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to process the uploaded file: {}", e),
            )
        }
    }
}
