//! 提交文件写入服务 - 业务能力层
//!
//! 只负责"把候选人上传的文件落盘"能力，不关心流程

use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::debug;

use crate::error::{AppError, AppResult};
use crate::services::artifact_generator::session_dir_name;

/// 上传文件名无法使用时的替代名
const DEFAULT_UPLOAD_NAME: &str = "solution.xlsx";

/// 提交文件写入服务
///
/// 职责：
/// - 按会话分目录保存上传文件
/// - 只保留上传文件名的最后一段，同名文件直接覆盖
pub struct SubmissionWriter {
    submissions_dir: PathBuf,
}

impl SubmissionWriter {
    pub fn new(artifact_dir: &Path) -> Self {
        Self {
            submissions_dir: artifact_dir.join("submissions"),
        }
    }

    /// 上传文件的保存路径
    pub fn submission_path(&self, session_id: &str, file_name: &str) -> PathBuf {
        self.submissions_dir
            .join(session_dir_name(session_id))
            .join(sanitize_file_name(file_name))
    }

    /// 写入上传文件
    ///
    /// # 返回
    /// 返回保存路径
    pub async fn write(&self, session_id: &str, file_name: &str, bytes: &[u8]) -> AppResult<PathBuf> {
        let path = self.submission_path(session_id, file_name);
        debug!(
            "写入提交文件: 会话 {} | {} | {} 字节",
            session_id,
            path.display(),
            bytes.len()
        );

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| AppError::upload_failed(parent, e))?;
        }

        fs::write(&path, bytes)
            .await
            .map_err(|e| AppError::upload_failed(&path, e))?;

        Ok(path)
    }
}

/// 只保留文件名最后一段，去掉目录部分
fn sanitize_file_name(file_name: &str) -> String {
    let last = file_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or("")
        .trim();

    if last.is_empty() || last == "." || last == ".." {
        DEFAULT_UPLOAD_NAME.to_string()
    } else {
        last.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("answer.xlsx"), "answer.xlsx");
        assert_eq!(sanitize_file_name("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_file_name("C:\\Users\\me\\answer.xlsx"), "answer.xlsx");
        assert_eq!(sanitize_file_name(".."), DEFAULT_UPLOAD_NAME);
        assert_eq!(sanitize_file_name(""), DEFAULT_UPLOAD_NAME);
    }

    #[tokio::test]
    async fn test_same_name_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let writer = SubmissionWriter::new(dir.path());

        let first = writer.write("alice", "answer.xlsx", b"v1").await.unwrap();
        let second = writer.write("alice", "answer.xlsx", b"v2").await.unwrap();

        assert_eq!(first, second);
        assert_eq!(std::fs::read(&second).unwrap(), b"v2");
    }

    #[tokio::test]
    async fn test_sessions_do_not_collide() {
        let dir = tempfile::tempdir().unwrap();
        let writer = SubmissionWriter::new(dir.path());

        let alice = writer.write("alice", "answer.xlsx", b"a").await.unwrap();
        let bob = writer.write("bob", "answer.xlsx", b"b").await.unwrap();

        assert_ne!(alice, bob);
        assert_eq!(std::fs::read(&alice).unwrap(), b"a");
    }
}
