//! 表格评分 - 业务能力层
//!
//! 只负责"按评分规则给一份表格打分"能力，不关心流程。
//! 只看公式文本，不信任单元格的计算结果。

use std::path::Path;

use calamine::{open_workbook_auto, Reader};
use serde::Serialize;
use tracing::{debug, warn};

use crate::models::{Rubric, RubricRule};

/// 无法读取上传文件时的唯一反馈
pub const UNREADABLE_FEEDBACK: &str =
    "We could not read your uploaded file. Please make sure it is a valid .xlsx workbook.";

/// 评分结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GradeResult {
    pub score: u32,
    /// 与规则顺序一一对应
    pub feedback: Vec<String>,
}

impl GradeResult {
    /// 无法读取文件时的结果：0 分 + 一条通用反馈
    pub fn unreadable() -> Self {
        Self {
            score: 0,
            feedback: vec![UNREADABLE_FEEDBACK.to_string()],
        }
    }
}

/// 读取上传文件失败（在评分器内部恢复，不向外传播）
#[derive(Debug, thiserror::Error)]
enum GradingError {
    #[error("无法打开表格: {0}")]
    Open(#[from] calamine::Error),
    #[error("表格中没有工作表")]
    NoWorksheet,
}

/// 表格评分器
///
/// 职责：
/// - 打开上传文件并读取第一个工作表的公式
/// - 按规则顺序逐条检查，通过记正面反馈，未通过扣分
/// - 任何读取失败都返回 0 分，不会让服务崩溃
pub struct ArtifactGrader {
    rubric: Rubric,
}

impl ArtifactGrader {
    pub fn new(rubric: Rubric) -> Self {
        Self { rubric }
    }

    pub fn rubric(&self) -> &Rubric {
        &self.rubric
    }

    /// 给表格打分
    ///
    /// 这是阻塞调用，异步上下文中应放到 `spawn_blocking` 里执行
    pub fn grade(&self, path: &Path) -> GradeResult {
        let mut workbook = match open_workbook_auto(path) {
            Ok(workbook) => workbook,
            Err(e) => return self.unreadable(path, GradingError::Open(e)),
        };

        let Some(sheet) = workbook.sheet_names().first().cloned() else {
            return self.unreadable(path, GradingError::NoWorksheet);
        };

        let formulas = match workbook.worksheet_formula(&sheet) {
            Ok(range) => range,
            Err(e) => return self.unreadable(path, GradingError::Open(e)),
        };

        self.score_with(|row, col| formulas.get_value((row, col)).map(String::as_str))
    }

    /// 按规则打分，`formula_at` 返回某单元格的公式文本
    fn score_with<'a>(&self, formula_at: impl Fn(u32, u32) -> Option<&'a str>) -> GradeResult {
        let mut failed_penalty = 0u32;
        let mut feedback = Vec::with_capacity(self.rubric.rules().len());

        for rule in self.rubric.rules() {
            let formula = rule
                .position()
                .and_then(|(row, col)| formula_at(row, col))
                .unwrap_or("");

            if rule_passes(rule, formula) {
                feedback.push(format!(
                    "✅ {}: {} (found `{}`).",
                    rule.cell, rule.description, rule.pattern
                ));
            } else {
                failed_penalty += rule.penalty;
                feedback.push(format!(
                    "❌ {}: {} (expected `{}`, -{} points).",
                    rule.cell, rule.description, rule.pattern, rule.penalty
                ));
            }
        }

        let score = self.rubric.max_score().saturating_sub(failed_penalty);
        debug!("评分完成: {}/{}", score, self.rubric.max_score());

        GradeResult { score, feedback }
    }

    fn unreadable(&self, path: &Path, error: GradingError) -> GradeResult {
        warn!("⚠️ 无法评分 {}: {}", path.display(), error);
        GradeResult::unreadable()
    }
}

/// 公式文本包含规则片段即通过（不区分大小写）
fn rule_passes(rule: &RubricRule, formula: &str) -> bool {
    !formula.is_empty() && formula.to_lowercase().contains(&rule.pattern.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RubricRule;
    use rust_xlsxwriter::Workbook;

    fn two_rule_rubric() -> Rubric {
        Rubric::new(vec![
            RubricRule::new("D2", "B2*C2", 50, "multiply"),
            RubricRule::new("F2", "SUM(", 50, "sum"),
        ])
        .unwrap()
    }

    fn write_workbook(path: &Path, formulas: &[(u32, u16, &str)]) {
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        worksheet.write_string(0, 0, "Item").unwrap();
        for (row, col, formula) in formulas {
            worksheet.write_formula(*row, *col, *formula).unwrap();
        }
        workbook.save(path).unwrap();
    }

    #[test]
    fn test_all_rules_pass() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("solution.xlsx");
        write_workbook(&path, &[(1, 3, "=B2*C2"), (1, 5, "=sum(D2:D10)")]);

        let result = ArtifactGrader::new(two_rule_rubric()).grade(&path);

        assert_eq!(result.score, 100);
        assert_eq!(result.feedback.len(), 2);
        assert!(result.feedback.iter().all(|line| line.starts_with("✅")));
    }

    #[test]
    fn test_partial_credit_keeps_rule_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("solution.xlsx");
        write_workbook(&path, &[(1, 5, "=SUM(D2:D10)")]);

        let result = ArtifactGrader::new(two_rule_rubric()).grade(&path);

        assert_eq!(result.score, 50);
        assert!(result.feedback[0].starts_with("❌ D2"));
        assert!(result.feedback[1].starts_with("✅ F2"));
    }

    #[test]
    fn test_values_without_formulas_fail() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("solution.xlsx");

        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        // 直接写数值（包括看起来像公式的文本）都不算
        worksheet.write_number(1, 3, 42.0).unwrap();
        worksheet.write_string(1, 5, "SUM(D2:D10)").unwrap();
        workbook.save(&path).unwrap();

        let result = ArtifactGrader::new(two_rule_rubric()).grade(&path);
        assert_eq!(result.score, 0);
    }

    #[test]
    fn test_garbage_file_scores_zero() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.xlsx");
        std::fs::write(&path, b"definitely not a zip archive").unwrap();

        let result = ArtifactGrader::new(two_rule_rubric()).grade(&path);

        assert_eq!(result.score, 0);
        assert_eq!(result.feedback, vec![UNREADABLE_FEEDBACK.to_string()]);
    }

    #[test]
    fn test_missing_file_scores_zero() {
        let result = ArtifactGrader::new(Rubric::default()).grade(Path::new("/nonexistent/x.xlsx"));
        assert_eq!(result.score, 0);
        assert_eq!(result.feedback.len(), 1);
    }

    #[test]
    fn test_no_formulas_scores_zero() {
        let grader = ArtifactGrader::new(Rubric::default());
        let result = grader.score_with(|_, _| None);
        assert_eq!(result.score, 0);
        assert_eq!(result.feedback.len(), Rubric::default().rules().len());
    }
}
