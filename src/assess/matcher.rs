// 该文件是 Cheshang （车伤） 项目的一部分。
// src/assess/matcher.rs - 缺陷框与部件掩码的 IoU 匹配
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

use tracing::debug;

use crate::{
  mask::{GridRect, PartSegmentation},
  model::{BBox, UNKNOWN_PART},
};

/// 部件匹配结果，未匹配时 name 为 unknown、iou 为 0
#[derive(Debug, Clone, PartialEq)]
pub struct PartMatch {
  pub name: String,
  pub iou: f64,
}

impl PartMatch {
  pub fn unknown() -> Self {
    Self {
      name: UNKNOWN_PART.to_string(),
      iou: 0.0,
    }
  }

  pub fn is_unknown(&self) -> bool {
    self.iou <= 0.0
  }
}

/// 把图像坐标系下的框投影到掩码网格并截断到网格范围内。
///
/// 坐标先按网格与图像的比例缩放，再向零取整，夹到 [0, size - 1]。
/// 截断后面积为 0 时返回 None。
pub fn project_bbox(bbox: &BBox, frame: (u32, u32), grid: (u32, u32)) -> Option<GridRect> {
  let (frame_w, frame_h) = frame;
  let (grid_w, grid_h) = grid;
  if frame_w == 0 || frame_h == 0 || grid_w == 0 || grid_h == 0 {
    return None;
  }

  let sx = grid_w as f64 / frame_w as f64;
  let sy = grid_h as f64 / frame_h as f64;
  let snap = |v: f32, scale: f64, size: u32| -> u32 {
    ((v as f64 * scale) as i64).clamp(0, size as i64 - 1) as u32
  };

  let rect = GridRect {
    x1: snap(bbox.x1, sx, grid_w),
    y1: snap(bbox.y1, sy, grid_h),
    x2: snap(bbox.x2, sx, grid_w),
    y2: snap(bbox.y2, sy, grid_h),
  };

  if rect.x2 <= rect.x1 || rect.y2 <= rect.y1 {
    return None;
  }
  Some(rect)
}

/// 为缺陷框选出 IoU 最大的部件。
///
/// 只有严格更大的 IoU 才会替换当前最优，并列时保留分割器先给出的部件。
/// 与框没有交集的部件直接跳过。
pub fn match_part(
  bbox: &BBox,
  frame: (u32, u32),
  segmentation: &PartSegmentation,
  union_floor: f64,
) -> PartMatch {
  let Some(grid) = segmentation.grid() else {
    return PartMatch::unknown();
  };
  let Some(rect) = project_bbox(bbox, frame, grid) else {
    debug!("缺陷框 {:?} 截断后面积为 0", bbox);
    return PartMatch::unknown();
  };

  let rect_area = rect.area() as f64;
  let mut best = PartMatch::unknown();
  let mut best_class = None;

  for part in segmentation.parts() {
    let inter = part.count_in_rect(&rect) as f64;
    if inter <= 0.0 {
      continue;
    }
    let union = rect_area + part.area() as f64 - inter;
    let iou = if union > union_floor { inter / union } else { 0.0 };

    if iou > best.iou {
      best = PartMatch {
        name: part.name().to_string(),
        iou,
      };
      best_class = Some(part.class_id());
    }
  }

  debug!(
    "缺陷框 {:?} 匹配部件 {} (类别 {:?}, IoU {:.4})",
    bbox, best.name, best_class, best.iou
  );
  best
}
