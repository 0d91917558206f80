// 该文件是 Cheshang （车伤） 项目的一部分。
// src/assess/severity.rs - 框级严重度、角度升级与全图融合
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

use crate::{
  config::EngineConfig,
  model::{AngleLabel, DefectKind, Severity},
};

/// 根据几何、类型和所在部件估计单个缺陷的严重度
///
/// 规则按顺序生效：
/// 1. 全局关键部件上面积为正的缺陷一律 major；
/// 2. 划痕按细长度折算有效面积，细长且不大的划痕单独分档；
/// 3. 凹陷、锈蚀直接按面积占比分档。
pub fn box_severity(
  config: &EngineConfig,
  kind: DefectKind,
  area_ratio: f64,
  part: &str,
  width: f64,
  height: f64,
) -> Severity {
  if config.is_critical(part) && area_ratio > 0.0 {
    return Severity::Major;
  }

  match kind {
    DefectKind::Scratch => {
      let shape = &config.scratch;
      let thinness = width.min(height) / (width.max(height) + shape.epsilon);
      let effective = area_ratio * (shape.base_weight + shape.thinness_weight * thinness);

      if thinness < shape.thin_below && area_ratio < shape.thin_area_below {
        return if area_ratio >= shape.thin_moderate_from {
          Severity::Moderate
        } else {
          Severity::Minor
        };
      }
      config.area.bucket(effective)
    }
    DefectKind::Dent | DefectKind::Rust => config.area.bucket(area_ratio),
  }
}

/// 缺陷位于当前拍摄角度的关键部件上时升级为 major，从不降级
pub fn escalate_for_angle(
  config: &EngineConfig,
  base: Severity,
  part: &str,
  angle: AngleLabel,
) -> Severity {
  if config.is_angle_critical(angle, part) && base < Severity::Major {
    Severity::Major
  } else {
    base
  }
}

/// 融合框级与全图严重度。划痕取较低者，其他缺陷取较高者。
/// 无法识别的全图标签按 moderate 处理。
pub fn fuse_severity(kind: DefectKind, bbox_severity: Severity, image_label: &str) -> Severity {
  let image = Severity::from_label(image_label).unwrap_or(Severity::Moderate);
  match kind {
    DefectKind::Scratch => bbox_severity.min(image),
    DefectKind::Dent | DefectKind::Rust => bbox_severity.max(image),
  }
}
