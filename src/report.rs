// 该文件是 Cheshang （车伤） 项目的一部分。
// src/report.rs - 损伤报告
//
// 本文件根据 Apache 许可证第 2.0 版（以下简称“许可证”）授权使用；
// 除非遵守该许可证条款，否则您不得使用本文件。
// 您可通过以下网址获取许可证副本：
// http://www.apache.org/licenses/LICENSE-2.0
// 除非适用法律要求或书面同意，根据本许可协议分发的软件均按“原样”提供，
// 不附带任何形式的明示或暗示的保证或条件。
// 有关许可权限与限制的具体条款，请参阅本许可协议。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, Wareless Group

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{
  model::{AngleLabel, DefectKind, ImageSeverity, Severity},
  overlay::Overlay,
};

/// 分割器没有报告权重来源时的 seg_source
pub const UNKNOWN_SOURCE: &str = "unknown";

/// 单个缺陷的评估记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DamageRecord {
  #[serde(rename = "type")]
  pub kind: DefectKind,
  /// 框级严重度（已含角度升级）
  pub severity_bbox: Severity,
  /// 与全图严重度融合后的结果
  pub severity_fused: Severity,
  pub det_confidence: f32,
  pub part: String,
  /// [x, y, width, height]
  pub bbox: [f32; 4],
  pub area_ratio: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntegrityLabel {
  NoIssues,
  Issues,
}

impl IntegrityLabel {
  pub fn as_str(&self) -> &'static str {
    match self {
      IntegrityLabel::NoIssues => "no_issues",
      IntegrityLabel::Issues => "issues",
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Integrity {
  pub score_1to5: u8,
  pub label: IntegrityLabel,
}

impl Integrity {
  pub fn from_score(score_1to5: u8) -> Self {
    let label = if score_1to5 == 5 {
      IntegrityLabel::NoIssues
    } else {
      IntegrityLabel::Issues
    };
    Self { score_1to5, label }
  }
}

/// 一张图像的最终评估结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
  pub angle: AngleLabel,
  pub severity_image: ImageSeverity,
  pub integrity: Integrity,
  pub damage: Vec<DamageRecord>,
  pub seg_source: String,
  /// 可视化标注，仅在请求时生成，不参与序列化
  #[serde(skip)]
  pub overlay: Option<Overlay>,
}

impl AnalysisReport {
  pub fn has_damage(&self) -> bool {
    !self.damage.is_empty()
  }

  pub fn to_json(&self, pretty: bool) -> Result<String, serde_json::Error> {
    if pretty {
      serde_json::to_string_pretty(self)
    } else {
      serde_json::to_string(self)
    }
  }
}

/// 单行摘要，用于逐帧日志
impl fmt::Display for AnalysisReport {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(
      f,
      "角度 {}, 缺陷 {} 个, 完好度 {} ({})",
      self.angle,
      self.damage.len(),
      self.integrity.score_1to5,
      self.integrity.label.as_str()
    )?;
    if let Some(worst) = self.damage.iter().map(|r| r.severity_fused).max() {
      write!(f, ", 最高严重度 {}", worst)?;
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn json_shape_matches_service_contract() {
    let report = AnalysisReport {
      angle: AngleLabel::Front,
      severity_image: ImageSeverity::new("major", 0.8),
      integrity: Integrity::from_score(2),
      damage: vec![DamageRecord {
        kind: DefectKind::Dent,
        severity_bbox: Severity::Major,
        severity_fused: Severity::Major,
        det_confidence: 0.5,
        part: "headlight".to_string(),
        bbox: [10.0, 20.0, 30.0, 40.0],
        area_ratio: 0.0012,
      }],
      seg_source: "local:carparts-seg.pt".to_string(),
      overlay: Some(Overlay::default()),
    };

    let value: serde_json::Value = serde_json::from_str(&report.to_json(false).unwrap()).unwrap();
    assert_eq!(value["angle"], "front");
    assert_eq!(value["severity_image"]["label"], "major");
    assert_eq!(value["integrity"]["score_1to5"], 2);
    assert_eq!(value["integrity"]["label"], "issues");
    assert_eq!(value["damage"][0]["type"], "dent");
    assert_eq!(value["damage"][0]["severity_fused"], "major");
    assert_eq!(value["damage"][0]["bbox"][3], 40.0);
    assert_eq!(value["seg_source"], "local:carparts-seg.pt");
    assert!(value.get("overlay").is_none());
  }

  #[test]
  fn summary_line_names_outcome() {
    let mut report = AnalysisReport {
      angle: AngleLabel::Left,
      severity_image: ImageSeverity::default(),
      integrity: Integrity::from_score(5),
      damage: Vec::new(),
      seg_source: UNKNOWN_SOURCE.to_string(),
      overlay: None,
    };
    assert_eq!(report.to_string(), "角度 left, 缺陷 0 个, 完好度 5 (no_issues)");

    report.integrity = Integrity::from_score(3);
    report.damage.push(DamageRecord {
      kind: DefectKind::Rust,
      severity_bbox: Severity::Moderate,
      severity_fused: Severity::Moderate,
      det_confidence: 0.7,
      part: "left_door".to_string(),
      bbox: [0.0, 0.0, 10.0, 10.0],
      area_ratio: 0.02,
    });
    assert_eq!(
      report.to_string(),
      "角度 left, 缺陷 1 个, 完好度 3 (issues), 最高严重度 moderate"
    );
  }

  #[test]
  fn only_five_is_no_issues() {
    assert_eq!(Integrity::from_score(5).label, IntegrityLabel::NoIssues);
    for score in 1..5 {
      assert_eq!(Integrity::from_score(score).label, IntegrityLabel::Issues);
    }
  }
}
