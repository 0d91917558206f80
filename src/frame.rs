// 该文件是 Cheshang （车伤） 项目的一部分。
// src/frame.rs - 单帧观测定义
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
  mask::PartSegmentation,
  model::{AngleLabel, Detection, ImageSeverity},
};

/// 帧的原始像素尺寸
pub trait FrameShape {
  fn width(&self) -> u32;
  fn height(&self) -> u32;
}

/// 一张图像上四个协作模型的已记录输出
#[derive(Debug, Clone)]
pub struct Observation {
  /// 来源标识（通常为文件名）
  pub name: String,
  pub width: u32,
  pub height: u32,
  pub angle: AngleLabel,
  pub detections: Vec<Detection>,
  pub segmentation: PartSegmentation,
  pub image_severity: Option<ImageSeverity>,
}

impl FrameShape for Observation {
  fn width(&self) -> u32 {
    self.width
  }

  fn height(&self) -> u32 {
    self.height
  }
}
