//! 任务文件生成 - 业务能力层
//!
//! 只负责"准备好一份实操任务表格"能力，不关心面试流程
//!
//! - 模板：只含表头，首次需要时创建，之后不再改写
//! - 任务副本：每个会话一份，每次生成都从模板覆盖写入

use std::path::{Path, PathBuf};

use rust_xlsxwriter::{Format, Workbook, XlsxError};
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::error::ArtifactError;

/// 任务工作表名称
pub const TASK_SHEET: &str = "Task";

/// 下发给候选人的文件名
pub const TASK_FILE_NAME: &str = "excel_task.xlsx";

const TEMPLATE_FILE_NAME: &str = "template.xlsx";

/// 第一行表头，空字符串表示留空的列
const TEMPLATE_HEADERS: [&str; 8] = [
    "Item",
    "Quantity",
    "Unit Price",
    "Total",
    "",
    "Grand Total",
    "High Value?",
    "Price Lookup",
];

/// 把会话 id 编码为安全的目录名
///
/// 字母数字、`-`、`_` 原样保留，其余字节编码为 `%XX`，保证不同 id 不会落到同一目录
pub fn session_dir_name(session_id: &str) -> String {
    if session_id.is_empty() {
        return "%".to_string();
    }
    let mut name = String::with_capacity(session_id.len());
    for byte in session_id.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'-' || byte == b'_' {
            name.push(byte as char);
        } else {
            name.push_str(&format!("%{:02X}", byte));
        }
    }
    name
}

/// 任务文件生成器
///
/// 职责：
/// - 惰性创建模板（只创建一次）
/// - 为每个会话写入新的任务副本
/// - 只做文件读写，不访问网络
pub struct ArtifactGenerator {
    artifact_dir: PathBuf,
    template_lock: Mutex<()>,
}

impl ArtifactGenerator {
    pub fn new(artifact_dir: impl Into<PathBuf>) -> Self {
        Self {
            artifact_dir: artifact_dir.into(),
            template_lock: Mutex::new(()),
        }
    }

    pub fn template_path(&self) -> PathBuf {
        self.artifact_dir.join(TEMPLATE_FILE_NAME)
    }

    /// 某个会话的任务副本路径
    pub fn task_path(&self, session_id: &str) -> PathBuf {
        self.artifact_dir
            .join("tasks")
            .join(session_dir_name(session_id))
            .join(TASK_FILE_NAME)
    }

    /// 确保模板存在，并为会话写入一份新的任务副本
    ///
    /// # 返回
    /// 返回任务副本路径
    pub async fn ensure_task_artifact(&self, session_id: &str) -> Result<PathBuf, ArtifactError> {
        let template_path = self.ensure_template().await?;

        let bytes = fs::read(&template_path)
            .await
            .map_err(|source| ArtifactError::ReadFailed {
                path: template_path.clone(),
                source,
            })?;

        let task_path = self.task_path(session_id);
        if let Some(parent) = task_path.parent() {
            create_dir(parent).await?;
        }

        fs::write(&task_path, bytes)
            .await
            .map_err(|source| ArtifactError::WriteFailed {
                path: task_path.clone(),
                source,
            })?;

        info!("📄 已生成任务文件: {}", task_path.display());
        Ok(task_path)
    }

    /// 会话的任务副本是否存在
    pub async fn task_exists(&self, session_id: &str) -> bool {
        fs::try_exists(self.task_path(session_id))
            .await
            .unwrap_or(false)
    }

    /// 删除会话的任务副本（会话结束时调用，失败只记录日志）
    pub async fn remove_task(&self, session_id: &str) {
        let task_path = self.task_path(session_id);
        let Some(dir) = task_path.parent() else {
            return;
        };
        match fs::remove_dir_all(dir).await {
            Ok(()) => debug!("已删除任务目录: {}", dir.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!("⚠️ 删除任务目录失败 ({}): {}", dir.display(), e),
        }
    }

    /// 模板不存在时创建，已存在则保持不动
    async fn ensure_template(&self) -> Result<PathBuf, ArtifactError> {
        let _guard = self.template_lock.lock().await;
        let template_path = self.template_path();

        let exists = fs::try_exists(&template_path)
            .await
            .map_err(|source| ArtifactError::ReadFailed {
                path: template_path.clone(),
                source,
            })?;
        if exists {
            return Ok(template_path);
        }

        create_dir(&self.artifact_dir).await?;

        let path = template_path.clone();
        tokio::task::spawn_blocking(move || write_template(&path))
            .await
            .map_err(|e| ArtifactError::WriteFailed {
                path: template_path.clone(),
                source: std::io::Error::new(std::io::ErrorKind::Other, e),
            })?
            .map_err(|source| ArtifactError::TemplateFailed {
                path: template_path.clone(),
                source,
            })?;

        info!("📄 已创建模板: {}", template_path.display());
        Ok(template_path)
    }
}

async fn create_dir(path: &Path) -> Result<(), ArtifactError> {
    fs::create_dir_all(path)
        .await
        .map_err(|source| ArtifactError::CreateDirFailed {
            path: path.to_path_buf(),
            source,
        })
}

/// 写入只含表头的模板（无数据、无公式）
fn write_template(path: &Path) -> Result<(), XlsxError> {
    let mut workbook = Workbook::new();
    let header_format = Format::new().set_bold();

    let worksheet = workbook.add_worksheet();
    worksheet.set_name(TASK_SHEET)?;

    for (col, header) in TEMPLATE_HEADERS.iter().enumerate() {
        if header.is_empty() {
            continue;
        }
        worksheet.write_string_with_format(0, col as u16, *header, &header_format)?;
    }

    workbook.save(path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_dir_name() {
        assert_eq!(session_dir_name("alice_01"), "alice_01");
        assert_eq!(session_dir_name("../etc"), "%2E%2E%2Fetc");
        assert_ne!(session_dir_name("a.b"), session_dir_name("a_b"));
        assert_eq!(session_dir_name(""), "%");
    }

    #[tokio::test]
    async fn test_template_created_once() {
        let dir = tempfile::tempdir().unwrap();
        let generator = ArtifactGenerator::new(dir.path());

        generator.ensure_task_artifact("alice").await.unwrap();

        // 写入标记，证明模板没有被重新生成
        std::fs::write(generator.template_path(), b"marker").unwrap();
        generator.ensure_task_artifact("bob").await.unwrap();

        assert_eq!(std::fs::read(generator.template_path()).unwrap(), b"marker");
        assert_eq!(std::fs::read(generator.task_path("bob")).unwrap(), b"marker");
    }

    #[tokio::test]
    async fn test_task_copy_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        let generator = ArtifactGenerator::new(dir.path());

        let path = generator.ensure_task_artifact("alice").await.unwrap();
        std::fs::write(&path, b"edited by candidate").unwrap();

        generator.ensure_task_artifact("alice").await.unwrap();
        assert_eq!(
            std::fs::read(&path).unwrap(),
            std::fs::read(generator.template_path()).unwrap()
        );
    }

    #[tokio::test]
    async fn test_task_paths_are_per_session() {
        let dir = tempfile::tempdir().unwrap();
        let generator = ArtifactGenerator::new(dir.path());

        assert_ne!(generator.task_path("alice"), generator.task_path("bob"));

        generator.ensure_task_artifact("alice").await.unwrap();
        assert!(generator.task_exists("alice").await);
        assert!(!generator.task_exists("bob").await);

        generator.remove_task("alice").await;
        assert!(!generator.task_exists("alice").await);
    }

    #[tokio::test]
    async fn test_unwritable_dir_fails() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not_a_dir");
        std::fs::write(&blocker, b"file").unwrap();

        let generator = ArtifactGenerator::new(&blocker);
        assert!(generator.ensure_task_artifact("alice").await.is_err());
    }
}
