// 该文件是 Cheshang （车伤） 项目的一部分。
// src/mask.rs - 部件分割掩码
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

use image::{GrayImage, Luma};
use imageproc::{drawing::draw_polygon_mut, point::Point};
use thiserror::Error;
use tracing::debug;

const MASK_ON: Luma<u8> = Luma([255]);

#[derive(Error, Debug, PartialEq)]
pub enum MaskError {
  #[error("掩码网格尺寸无效: {0}x{1}")]
  EmptyGrid(u32, u32),
  #[error("掩码尺寸 {found_w}x{found_h} 与分割网格 {grid_w}x{grid_h} 不一致")]
  GridMismatch {
    grid_w: u32,
    grid_h: u32,
    found_w: u32,
    found_h: u32,
  },
  #[error("游程编码总长 {found} 与网格像素数 {expected} 不一致")]
  RunLengthMismatch { expected: u64, found: u64 },
  #[error("多边形顶点 ({0}, {1}) 超出网格允许范围")]
  VertexOutOfRange(f32, f32),
}

/// 网格上的半开矩形 [x1, x2) × [y1, y2)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridRect {
  pub x1: u32,
  pub y1: u32,
  pub x2: u32,
  pub y2: u32,
}

impl GridRect {
  pub fn area(&self) -> u64 {
    (self.x2.saturating_sub(self.x1)) as u64 * (self.y2.saturating_sub(self.y1)) as u64
  }
}

/// 一个部件的二值掩码，非零像素属于该部件
#[derive(Debug, Clone)]
pub struct PartMask {
  name: String,
  class_id: u32,
  mask: GrayImage,
  area: u64,
}

impl PartMask {
  pub fn from_image(name: impl Into<String>, class_id: u32, mask: GrayImage) -> Self {
    let area = mask.pixels().filter(|p| p[0] != 0).count() as u64;
    Self {
      name: name.into(),
      class_id,
      mask,
      area,
    }
  }

  /// 在 width×height 网格上填充多边形。少于三个不同顶点的多边形得到空掩码。
  pub fn from_polygon(
    name: impl Into<String>,
    class_id: u32,
    width: u32,
    height: u32,
    polygon: &[[f32; 2]],
  ) -> Result<Self, MaskError> {
    if width == 0 || height == 0 {
      return Err(MaskError::EmptyGrid(width, height));
    }

    // 顶点只允许落在 [-w, 2w] × [-h, 2h] 内
    let (w, h) = (width as f32, height as f32);
    let mut points: Vec<Point<i32>> = Vec::with_capacity(polygon.len());
    for &[x, y] in polygon {
      if !(x.is_finite() && y.is_finite()) || x < -w || x > 2.0 * w || y < -h || y > 2.0 * h {
        return Err(MaskError::VertexOutOfRange(x, y));
      }
      let p = Point::new(x.round() as i32, y.round() as i32);
      if points.last() != Some(&p) {
        points.push(p);
      }
    }
    // draw_polygon_mut 要求首尾不重合
    while points.len() > 1 && points.first() == points.last() {
      points.pop();
    }

    let mut mask = GrayImage::new(width, height);
    if points.len() >= 3 {
      draw_polygon_mut(&mut mask, &points, MASK_ON);
    } else {
      debug!("多边形顶点不足 ({}), 生成空掩码", points.len());
    }

    Ok(Self::from_image(name, class_id, mask))
  }

  /// 行优先的游程编码，从背景开始交替：[背景, 前景, 背景, ...]
  pub fn from_run_length(
    name: impl Into<String>,
    class_id: u32,
    width: u32,
    height: u32,
    counts: &[u32],
  ) -> Result<Self, MaskError> {
    if width == 0 || height == 0 {
      return Err(MaskError::EmptyGrid(width, height));
    }

    let expected = width as u64 * height as u64;
    let found: u64 = counts.iter().map(|&c| c as u64).sum();
    if found != expected {
      return Err(MaskError::RunLengthMismatch { expected, found });
    }

    let mut data = Vec::with_capacity(expected as usize);
    for (idx, &count) in counts.iter().enumerate() {
      let value = if idx % 2 == 0 { 0u8 } else { MASK_ON[0] };
      data.extend(std::iter::repeat_n(value, count as usize));
    }

    let mask = GrayImage::from_raw(width, height, data).ok_or(MaskError::RunLengthMismatch {
      expected,
      found,
    })?;
    Ok(Self::from_image(name, class_id, mask))
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn class_id(&self) -> u32 {
    self.class_id
  }

  pub fn width(&self) -> u32 {
    self.mask.width()
  }

  pub fn height(&self) -> u32 {
    self.mask.height()
  }

  /// 前景像素数
  pub fn area(&self) -> u64 {
    self.area
  }

  /// 矩形内的前景像素数，矩形超出掩码的部分不计
  pub fn count_in_rect(&self, rect: &GridRect) -> u64 {
    let x2 = rect.x2.min(self.mask.width());
    let y2 = rect.y2.min(self.mask.height());
    let mut count = 0u64;
    for y in rect.y1..y2 {
      for x in rect.x1..x2 {
        if self.mask.get_pixel(x, y)[0] != 0 {
          count += 1;
        }
      }
    }
    count
  }
}

/// 一张图像的部件分割结果。所有掩码共享同一网格，网格由第一个掩码确定。
#[derive(Debug, Clone, Default)]
pub struct PartSegmentation {
  source: Option<String>,
  grid: Option<(u32, u32)>,
  parts: Vec<PartMask>,
}

impl PartSegmentation {
  pub fn new(source: Option<String>) -> Self {
    Self {
      source,
      grid: None,
      parts: Vec::new(),
    }
  }

  /// 追加掩码，保持分割器给出的顺序
  pub fn push(&mut self, part: PartMask) -> Result<(), MaskError> {
    let (w, h) = (part.width(), part.height());
    if w == 0 || h == 0 {
      return Err(MaskError::EmptyGrid(w, h));
    }
    match self.grid {
      Some((grid_w, grid_h)) if (grid_w, grid_h) != (w, h) => {
        return Err(MaskError::GridMismatch {
          grid_w,
          grid_h,
          found_w: w,
          found_h: h,
        });
      }
      Some(_) => {}
      None => self.grid = Some((w, h)),
    }
    self.parts.push(part);
    Ok(())
  }

  pub fn with_parts<I>(source: Option<String>, parts: I) -> Result<Self, MaskError>
  where
    I: IntoIterator<Item = PartMask>,
  {
    let mut segmentation = Self::new(source);
    for part in parts {
      segmentation.push(part)?;
    }
    Ok(segmentation)
  }

  /// 分割所用权重的来源标记
  pub fn source(&self) -> Option<&str> {
    self.source.as_deref()
  }

  pub fn grid(&self) -> Option<(u32, u32)> {
    self.grid
  }

  pub fn parts(&self) -> &[PartMask] {
    &self.parts
  }

  pub fn is_empty(&self) -> bool {
    self.parts.is_empty()
  }
}
