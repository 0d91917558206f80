// 该文件是 Cheshang （车伤） 项目的一部分。
// src/assess/assembler.rs - 报告组装
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

use tracing::{debug, info};

use super::{
  integrity::integrity_score,
  matcher::match_part,
  severity::{box_severity, escalate_for_angle, fuse_severity},
};
use crate::{
  config::EngineConfig,
  mask::PartSegmentation,
  model::{AngleLabel, DefectKind, Detection, ImageSeverity},
  overlay::Overlay,
  report::{AnalysisReport, DamageRecord, UNKNOWN_SOURCE},
};

/// 一张图像的全部协作模型输出
#[derive(Debug, Clone, Copy)]
pub struct AssessmentInput<'a> {
  pub width: u32,
  pub height: u32,
  pub angle: AngleLabel,
  /// None 表示分类器没有给出可用结果
  pub image_severity: Option<&'a ImageSeverity>,
  pub detections: &'a [Detection],
  pub segmentation: &'a PartSegmentation,
}

/// 融合引擎。只持有只读配置，可在线程间共享。
#[derive(Debug, Clone, Default)]
pub struct Assessor {
  config: EngineConfig,
}

impl Assessor {
  pub fn new(config: EngineConfig) -> Self {
    Self { config }
  }

  fn area_ratio(detection: &Detection, width: u32, height: u32) -> f64 {
    let image_area = width as f64 * height as f64;
    if image_area <= 0.0 {
      return 0.0;
    }
    (detection.bbox.area() / image_area).clamp(0.0, 1.0)
  }

  /// 评估单个缺陷：部件匹配 -> 框级严重度 -> 角度升级 -> 全图融合
  pub fn assess_defect(
    &self,
    kind: DefectKind,
    detection: &Detection,
    input: &AssessmentInput<'_>,
    image_label: &str,
  ) -> DamageRecord {
    let area_ratio = Self::area_ratio(detection, input.width, input.height);
    let part = match_part(
      &detection.bbox,
      (input.width, input.height),
      input.segmentation,
      self.config.union_floor,
    );

    let base = box_severity(
      &self.config,
      kind,
      area_ratio,
      &part.name,
      detection.bbox.width() as f64,
      detection.bbox.height() as f64,
    );
    let severity_bbox = escalate_for_angle(&self.config, base, &part.name, input.angle);
    let severity_fused = fuse_severity(kind, severity_bbox, image_label);

    debug!(
      "{} @ {}: 面积占比 {:.5}, 框级 {} -> {}, 融合 {}",
      kind, part.name, area_ratio, base, severity_bbox, severity_fused
    );

    DamageRecord {
      kind,
      severity_bbox,
      severity_fused,
      det_confidence: detection.confidence,
      part: part.name,
      bbox: detection.bbox.xywh(),
      area_ratio,
    }
  }

  /// 对所有受跟踪的缺陷生成记录，其余类别静默丢弃
  pub fn assess_defects(&self, input: &AssessmentInput<'_>) -> Vec<DamageRecord> {
    let image_label = input
      .image_severity
      .unwrap_or(&self.config.default_image_severity)
      .label
      .as_str();

    input
      .detections
      .iter()
      .filter_map(|detection| match detection.kind() {
        Some(kind) => Some(self.assess_defect(kind, detection, input, image_label)),
        None => {
          debug!("忽略非受跟踪类别: {}", detection.label);
          None
        }
      })
      .collect()
  }

  /// 生成完整报告
  pub fn assess(&self, input: &AssessmentInput<'_>) -> AnalysisReport {
    let damage = self.assess_defects(input);
    let integrity = integrity_score(
      &self.config,
      damage.iter().map(|r| (r.area_ratio, r.part.as_str())),
    );
    let severity_image = input
      .image_severity
      .cloned()
      .unwrap_or_else(|| self.config.default_image_severity.clone());
    let seg_source = input
      .segmentation
      .source()
      .unwrap_or(UNKNOWN_SOURCE)
      .to_string();

    info!(
      "评估完成: 角度 {}, 缺陷 {} 个, 完好度 {}",
      input.angle,
      damage.len(),
      integrity.score_1to5
    );

    AnalysisReport {
      angle: input.angle,
      severity_image,
      integrity,
      damage,
      seg_source,
      overlay: None,
    }
  }

  /// 生成报告并附带可视化标注
  pub fn assess_with_overlay(&self, input: &AssessmentInput<'_>) -> AnalysisReport {
    let mut report = self.assess(input);
    report.overlay = Some(Overlay::from_records(
      input.width,
      input.height,
      &report.damage,
    ));
    report
  }
}
