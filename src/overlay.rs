// 该文件是 Cheshang （车伤） 项目的一部分。
// src/overlay.rs - 可视化标注
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

use crate::{model::DefectKind, report::DamageRecord};

const SCRATCH_COLOR: [u8; 3] = [255, 170, 36]; // 橙色
const DENT_COLOR: [u8; 3] = [40, 220, 40]; // 绿色
const RUST_COLOR: [u8; 3] = [240, 50, 50]; // 红色

pub fn color_of(kind: DefectKind) -> [u8; 3] {
  match kind {
    DefectKind::Scratch => SCRATCH_COLOR,
    DefectKind::Dent => DENT_COLOR,
    DefectKind::Rust => RUST_COLOR,
  }
}

/// 一个待绘制的缺陷框，坐标为整数像素 [x_min, y_min, x_max, y_max]
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayBox {
  pub rect: [i32; 4],
  pub caption: String,
  pub color: [u8; 3],
}

/// 一张图像上的全部标注，交给外部绘制
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Overlay {
  pub width: u32,
  pub height: u32,
  pub boxes: Vec<OverlayBox>,
}

impl Overlay {
  pub fn from_records(width: u32, height: u32, records: &[DamageRecord]) -> Self {
    let boxes = records
      .iter()
      .map(|record| {
        let [x, y, w, h] = record.bbox;
        OverlayBox {
          rect: [x as i32, y as i32, (x + w) as i32, (y + h) as i32],
          caption: format!(
            "{} | {} | {}",
            record.kind, record.part, record.severity_fused
          ),
          color: color_of(record.kind),
        }
      })
      .collect();

    Self {
      width,
      height,
      boxes,
    }
  }

  /// 每个框一行: `caption, x_min, y_min, x_max, y_max, #rrggbb`
  pub fn to_lines(&self) -> Vec<String> {
    self
      .boxes
      .iter()
      .map(|b| {
        format!(
          "{}, {}, {}, {}, {}, #{:02x}{:02x}{:02x}",
          b.caption, b.rect[0], b.rect[1], b.rect[2], b.rect[3], b.color[0], b.color[1], b.color[2]
        )
      })
      .collect()
  }
}
