use std::path::PathBuf;

/// 应用程序错误类型
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// LLM 服务错误
    #[error("LLM错误: {0}")]
    Llm(#[from] LlmError),
    /// 上传文件落盘失败
    #[error("上传失败 ({path}): {source}")]
    Upload {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// 任务文件（模板 / 任务副本）相关错误
#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    /// 创建目录失败
    #[error("创建目录失败 ({path}): {source}")]
    CreateDirFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// 生成模板失败
    #[error("生成模板失败 ({path}): {source}")]
    TemplateFailed {
        path: PathBuf,
        #[source]
        source: rust_xlsxwriter::XlsxError,
    },
    /// 读取文件失败
    #[error("读取文件失败 ({path}): {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// 写入文件失败
    #[error("写入文件失败 ({path}): {source}")]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// LLM 服务错误
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    /// API 调用失败
    #[error("LLM API调用失败 (模型: {model}): {source}")]
    ApiCallFailed {
        model: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 调用超时
    #[error("LLM 调用超时 (模型: {model}, {timeout_secs}秒)")]
    Timeout { model: String, timeout_secs: u64 },
    /// 返回内容为空
    #[error("LLM返回内容为空 (模型: {model})")]
    EmptyContent { model: String },
}

/// 配置错误
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// 配置文件读取或解析失败
    #[error("配置文件 {path} 无效: {reason}")]
    InvalidFile { path: PathBuf, reason: String },
    /// 题库为空
    #[error("题库不能为空")]
    EmptyQuestionBank,
    /// 评分规则无效
    #[error("评分规则无效: {0}")]
    InvalidRubric(String),
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建上传落盘错误
    pub fn upload_failed(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        AppError::Upload {
            path: path.into(),
            source,
        }
    }

    /// 创建LLM API调用错误
    pub fn llm_api_failed(model: impl Into<String>, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        AppError::Llm(LlmError::ApiCallFailed {
            model: model.into(),
            source: Box::new(source),
        })
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_error_names_path() {
        let err = AppError::upload_failed(
            "submissions/alice/solution.xlsx",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );

        assert!(matches!(err, AppError::Upload { .. }));
        assert!(err.to_string().contains("solution.xlsx"));
    }

    #[test]
    fn test_llm_api_error_wraps_source() {
        let err = AppError::llm_api_failed(
            "gpt-test",
            std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused"),
        );

        assert!(matches!(err, AppError::Llm(LlmError::ApiCallFailed { .. })));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_timeout_message_names_model() {
        let err = LlmError::Timeout {
            model: "gpt-test".to_string(),
            timeout_secs: 5,
        };
        assert!(err.to_string().contains("gpt-test"));
    }
}
