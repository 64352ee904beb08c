//! 评分规则
//!
//! 每条规则：目标单元格 + 公式中必须出现的片段 + 未通过时扣的分数。
//! 所有规则的扣分之和必须等于满分 100。

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// 实操任务满分
pub const FULL_SCORE: u32 = 100;

fn cell_ref_regex() -> &'static Regex {
    static CELL_REF: OnceLock<Regex> = OnceLock::new();
    CELL_REF.get_or_init(|| Regex::new(r"^\$?([A-Za-z]{1,3})\$?([1-9][0-9]*)$").expect("valid regex"))
}

/// 把 `D2` / `$D$2` 形式的引用解析为从 0 开始的 (行, 列)
pub fn parse_cell_ref(cell: &str) -> Option<(u32, u32)> {
    let caps = cell_ref_regex().captures(cell.trim())?;

    let col = caps[1]
        .chars()
        .fold(0u32, |acc, c| acc * 26 + (c.to_ascii_uppercase() as u32 - 'A' as u32 + 1));
    let row: u32 = caps[2].parse().ok()?;

    Some((row - 1, col - 1))
}

/// 单条评分规则
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RubricRule {
    /// 单元格引用，例如 `D2`
    pub cell: String,
    /// 公式中必须包含的片段（不区分大小写）
    pub pattern: String,
    /// 未通过时的扣分
    pub penalty: u32,
    /// 用于反馈的说明
    pub description: String,
}

impl RubricRule {
    pub fn new(
        cell: impl Into<String>,
        pattern: impl Into<String>,
        penalty: u32,
        description: impl Into<String>,
    ) -> Self {
        Self {
            cell: cell.into(),
            pattern: pattern.into(),
            penalty,
            description: description.into(),
        }
    }

    /// 目标单元格的 (行, 列)，从 0 开始
    pub fn position(&self) -> Option<(u32, u32)> {
        parse_cell_ref(&self.cell)
    }
}

/// 评分规则集（顺序即反馈顺序）
///
/// 只能通过 `Rubric::new` 构造，保证扣分之和等于满分
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rubric {
    rules: Vec<RubricRule>,
}

impl Rubric {
    pub fn new(rules: Vec<RubricRule>) -> Result<Self, ConfigError> {
        if rules.is_empty() {
            return Err(ConfigError::InvalidRubric("至少需要一条规则".to_string()));
        }
        if let Some(rule) = rules.iter().find(|r| r.pattern.is_empty()) {
            return Err(ConfigError::InvalidRubric(format!(
                "单元格 {} 的匹配片段为空",
                rule.cell
            )));
        }
        if let Some(rule) = rules.iter().find(|r| r.position().is_none()) {
            return Err(ConfigError::InvalidRubric(format!(
                "无法解析单元格引用: {}",
                rule.cell
            )));
        }

        let total = rules
            .iter()
            .try_fold(0u32, |acc, r| acc.checked_add(r.penalty))
            .ok_or_else(|| ConfigError::InvalidRubric("扣分之和溢出".to_string()))?;
        if total != FULL_SCORE {
            return Err(ConfigError::InvalidRubric(format!(
                "扣分之和必须为 {}，实际为 {}",
                FULL_SCORE, total
            )));
        }

        Ok(Self { rules })
    }

    pub fn rules(&self) -> &[RubricRule] {
        &self.rules
    }

    /// 满分（构造时已校验扣分之和）
    pub fn max_score(&self) -> u32 {
        FULL_SCORE
    }
}

impl Default for Rubric {
    fn default() -> Self {
        Self {
            rules: vec![
                RubricRule::new("D2", "B2*C2", 30, "Total should multiply Quantity by Unit Price"),
                RubricRule::new("F2", "SUM(", 30, "Grand Total should add up the Total column with SUM"),
                RubricRule::new("G2", "IF(", 20, "High Value? should flag large totals with IF"),
                RubricRule::new("H2", "LOOKUP(", 20, "Price Lookup should use VLOOKUP or XLOOKUP"),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_rubric_max_score() {
        assert_eq!(Rubric::default().max_score(), 100);
    }

    #[test]
    fn test_parse_cell_ref() {
        assert_eq!(parse_cell_ref("A1"), Some((0, 0)));
        assert_eq!(parse_cell_ref("D2"), Some((1, 3)));
        assert_eq!(parse_cell_ref("$H$2"), Some((1, 7)));
        assert_eq!(parse_cell_ref("aa10"), Some((9, 26)));
        assert_eq!(parse_cell_ref("A0"), None);
        assert_eq!(parse_cell_ref("2D"), None);
    }

    #[test]
    fn test_default_rules_have_valid_cells() {
        assert!(Rubric::default().rules().iter().all(|r| r.position().is_some()));
    }

    #[test]
    fn test_invalid_cell_rejected() {
        let result = Rubric::new(vec![RubricRule::new("ZZ", "SUM(", 10, "bad")]);
        assert!(matches!(result, Err(ConfigError::InvalidRubric(_))));
    }

    #[test]
    fn test_penalties_must_sum_to_full_score() {
        let over = Rubric::new(vec![
            RubricRule::new("A1", "SUM(", 80, "sum"),
            RubricRule::new("B1", "IF(", 80, "if"),
        ]);
        assert!(matches!(over, Err(ConfigError::InvalidRubric(_))));

        let under = Rubric::new(vec![
            RubricRule::new("A1", "SUM(", 30, "sum"),
            RubricRule::new("B1", "IF(", 30, "if"),
        ]);
        assert!(matches!(under, Err(ConfigError::InvalidRubric(_))));

        let exact = Rubric::new(vec![
            RubricRule::new("A1", "SUM(", 70, "sum"),
            RubricRule::new("B1", "IF(", 30, "if"),
        ]);
        assert_eq!(exact.unwrap().max_score(), 100);
    }

    #[test]
    fn test_penalty_overflow_rejected() {
        let result = Rubric::new(vec![
            RubricRule::new("A1", "SUM(", u32::MAX, "huge"),
            RubricRule::new("B1", "IF(", 1, "if"),
        ]);
        assert!(matches!(result, Err(ConfigError::InvalidRubric(_))));
    }

    #[test]
    fn test_empty_pattern_rejected() {
        let result = Rubric::new(vec![RubricRule::new("A1", "", 10, "empty")]);
        assert!(matches!(result, Err(ConfigError::InvalidRubric(_))));
    }
}
