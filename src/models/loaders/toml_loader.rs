use crate::error::ConfigError;
use crate::models::question::QuestionBank;
use crate::models::rubric::{Rubric, RubricRule};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use tokio::fs;

#[derive(Debug, Deserialize)]
struct QuestionFile {
    questions: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RubricFile {
    rules: Vec<RubricRule>,
}

/// 从 TOML 文件加载题库
///
/// 文件格式：`questions = ["...", "..."]`
pub async fn load_question_bank(path: &Path) -> Result<QuestionBank> {
    let content = fs::read_to_string(path)
        .await
        .with_context(|| format!("无法读取题库文件: {}", path.display()))?;

    let file: QuestionFile = toml::from_str(&content).map_err(|e| ConfigError::InvalidFile {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    let bank = QuestionBank::new(file.questions)?;
    tracing::info!("成功加载 {} 道概念题", bank.len());
    Ok(bank)
}

/// 从 TOML 文件加载评分规则
///
/// 文件格式：若干 `[[rules]]`，每条包含 cell / pattern / penalty / description
pub async fn load_rubric(path: &Path) -> Result<Rubric> {
    let content = fs::read_to_string(path)
        .await
        .with_context(|| format!("无法读取评分规则文件: {}", path.display()))?;

    let file: RubricFile = toml::from_str(&content).map_err(|e| ConfigError::InvalidFile {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    let rubric = Rubric::new(file.rules)?;
    tracing::info!(
        "成功加载 {} 条评分规则，满分 {}",
        rubric.rules().len(),
        rubric.max_score()
    );
    Ok(rubric)
}

/// 有路径就从文件加载，否则用内置默认值
pub async fn load_question_bank_or_default(path: Option<&Path>) -> Result<QuestionBank> {
    match path {
        Some(path) => load_question_bank(path).await,
        None => Ok(QuestionBank::default()),
    }
}

pub async fn load_rubric_or_default(path: Option<&Path>) -> Result<Rubric> {
    match path {
        Some(path) => load_rubric(path).await,
        None => Ok(Rubric::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_load_question_bank() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("questions.toml");
        std::fs::write(&path, "questions = [\"Q1\", \"Q2\"]\n").unwrap();

        let bank = load_question_bank(&path).await.unwrap();
        assert_eq!(bank.len(), 2);
        assert_eq!(bank.get(1), Some("Q2"));
    }

    #[tokio::test]
    async fn test_load_rubric() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rubric.toml");
        std::fs::write(
            &path,
            r#"
[[rules]]
cell = "A2"
pattern = "SUM("
penalty = 60
description = "sum"

[[rules]]
cell = "B2"
pattern = "IF("
penalty = 40
description = "if"
"#,
        )
        .unwrap();

        let rubric = load_rubric(&path).await.unwrap();
        assert_eq!(rubric.rules().len(), 2);
        assert_eq!(rubric.max_score(), 100);
    }

    #[tokio::test]
    async fn test_rubric_over_full_score_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rubric.toml");
        std::fs::write(
            &path,
            r#"
[[rules]]
cell = "A2"
pattern = "SUM("
penalty = 80
description = "sum"

[[rules]]
cell = "B2"
pattern = "IF("
penalty = 80
description = "if"
"#,
        )
        .unwrap();

        let err = load_rubric(&path).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ConfigError>(),
            Some(ConfigError::InvalidRubric(_))
        ));
    }

    #[tokio::test]
    async fn test_empty_question_file_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("questions.toml");
        std::fs::write(&path, "questions = []\n").unwrap();

        assert!(load_question_bank(&path).await.is_err());
    }

    #[tokio::test]
    async fn test_missing_path_uses_default() {
        let bank = load_question_bank_or_default(None).await.unwrap();
        assert_eq!(bank, QuestionBank::default());
    }
}
