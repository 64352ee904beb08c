use std::path::PathBuf;

/// 程序配置
#[derive(Clone, Debug)]
pub struct Config {
    /// HTTP 监听地址
    pub bind_addr: String,
    /// 模板、任务副本和提交文件的根目录
    pub artifact_dir: PathBuf,
    /// 自定义题库 TOML（可选）
    pub questions_file: Option<PathBuf>,
    /// 自定义评分规则 TOML（可选）
    pub rubric_file: Option<PathBuf>,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    /// 概念问答中是否先用 LLM 简短回应候选人的回答
    pub acknowledge_answers: bool,
    // --- LLM 配置 ---
    pub llm_api_key: String,
    pub llm_api_base_url: String,
    pub llm_model_name: String,
    /// 单次调用超时（秒）
    pub llm_timeout_secs: u64,
    /// 失败后的最大重试次数
    pub llm_max_retries: u32,
    /// 重试退避基数（毫秒）
    pub llm_retry_backoff_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8000".to_string(),
            artifact_dir: PathBuf::from("artifacts"),
            questions_file: None,
            rubric_file: None,
            verbose_logging: false,
            acknowledge_answers: false,
            llm_api_key: String::new(),
            llm_api_base_url: "https://api.openai.com/v1".to_string(),
            llm_model_name: "gpt-4.1-nano-2025-04-14".to_string(),
            llm_timeout_secs: 30,
            llm_max_retries: 1,
            llm_retry_backoff_ms: 500,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            bind_addr: std::env::var("BIND_ADDR").unwrap_or(default.bind_addr),
            artifact_dir: std::env::var("ARTIFACT_DIR").map(PathBuf::from).unwrap_or(default.artifact_dir),
            questions_file: std::env::var("QUESTIONS_FILE").ok().map(PathBuf::from),
            rubric_file: std::env::var("RUBRIC_FILE").ok().map(PathBuf::from),
            verbose_logging: std::env::var("VERBOSE_LOGGING").ok().and_then(|v| v.parse().ok()).unwrap_or(default.verbose_logging),
            acknowledge_answers: std::env::var("ACKNOWLEDGE_ANSWERS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.acknowledge_answers),
            llm_api_key: std::env::var("LLM_API_KEY")
                .or_else(|_| std::env::var("OPENAI_API_KEY"))
                .unwrap_or(default.llm_api_key),
            llm_api_base_url: std::env::var("LLM_API_BASE_URL").unwrap_or(default.llm_api_base_url),
            llm_model_name: std::env::var("LLM_MODEL_NAME").unwrap_or(default.llm_model_name),
            llm_timeout_secs: std::env::var("LLM_TIMEOUT_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.llm_timeout_secs),
            llm_max_retries: std::env::var("LLM_MAX_RETRIES").ok().and_then(|v| v.parse().ok()).unwrap_or(default.llm_max_retries),
            llm_retry_backoff_ms: std::env::var("LLM_RETRY_BACKOFF_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.llm_retry_backoff_ms),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.bind_addr, "0.0.0.0:8000");
        assert_eq!(config.llm_max_retries, 1);
        assert!(config.questions_file.is_none());
        assert!(config.llm_api_key.is_empty());
    }
}
