// 该文件是 Cheshang （车伤） 项目的一部分。
// src/model.rs - 协作模型接口与检测数据定义
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
use thiserror::Error;

/// 外部协作模型（缺陷检测、部件分割、严重度分类、拍摄角度分类）的统一接口。
///
/// 每次调用相互独立，实现不得在调用之间保存可变状态。
pub trait Model {
  type Input;
  type Output;
  type Error;

  fn infer(&self, input: &Self::Input) -> Result<Self::Output, Self::Error>;
}

/// 未匹配到任何部件时使用的部件名
pub const UNKNOWN_PART: &str = "unknown";

#[derive(Error, Debug, PartialEq)]
pub enum ModelError {
  #[error("边界框无效: [{0}, {1}, {2}, {3}]")]
  InvalidBox(f32, f32, f32, f32),
  #[error("置信度超出 [0, 1] 范围: {0}")]
  InvalidConfidence(f32),
}

/// 轴对齐边界框，图像像素坐标 [x_min, y_min, x_max, y_max]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BBox {
  pub x1: f32,
  pub y1: f32,
  pub x2: f32,
  pub y2: f32,
}

impl BBox {
  pub fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Result<Self, ModelError> {
    let finite = [x1, y1, x2, y2].iter().all(|v| v.is_finite());
    if !finite || x2 < x1 || y2 < y1 {
      return Err(ModelError::InvalidBox(x1, y1, x2, y2));
    }
    Ok(Self { x1, y1, x2, y2 })
  }

  pub fn width(&self) -> f32 {
    (self.x2 - self.x1).max(0.0)
  }

  pub fn height(&self) -> f32 {
    (self.y2 - self.y1).max(0.0)
  }

  pub fn area(&self) -> f64 {
    self.width() as f64 * self.height() as f64
  }

  /// [x, y, width, height]
  pub fn xywh(&self) -> [f32; 4] {
    [self.x1, self.y1, self.width(), self.height()]
  }
}

/// 受跟踪的缺陷类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DefectKind {
  Scratch,
  Dent,
  Rust,
}

impl DefectKind {
  /// 检测器类别名到缺陷类型，其余类别返回 None
  pub fn from_label(label: &str) -> Option<Self> {
    match label {
      "scratch" => Some(DefectKind::Scratch),
      "dent" => Some(DefectKind::Dent),
      "rust" => Some(DefectKind::Rust),
      _ => None,
    }
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      DefectKind::Scratch => "scratch",
      DefectKind::Dent => "dent",
      DefectKind::Rust => "rust",
    }
  }
}

impl fmt::Display for DefectKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// 有序严重度等级：minor < moderate < major
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
  Minor,
  Moderate,
  Major,
}

impl Severity {
  pub fn from_label(label: &str) -> Option<Self> {
    match label {
      "minor" => Some(Severity::Minor),
      "moderate" => Some(Severity::Moderate),
      "major" => Some(Severity::Major),
      _ => None,
    }
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      Severity::Minor => "minor",
      Severity::Moderate => "moderate",
      Severity::Major => "major",
    }
  }
}

impl fmt::Display for Severity {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// 拍摄角度
#[derive(
  Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum AngleLabel {
  Front,
  Back,
  Left,
  Right,
  #[default]
  Unknown,
}

impl AngleLabel {
  /// 角度分类器可以给出的四个视角
  pub const VIEWS: [AngleLabel; 4] = [
    AngleLabel::Front,
    AngleLabel::Back,
    AngleLabel::Left,
    AngleLabel::Right,
  ];

  /// 无法识别的标签视为 unknown
  pub fn from_label(label: &str) -> Self {
    match label {
      "front" => AngleLabel::Front,
      "back" => AngleLabel::Back,
      "left" => AngleLabel::Left,
      "right" => AngleLabel::Right,
      _ => AngleLabel::Unknown,
    }
  }

  /// 取得分最高的视角；并列时保留先出现者，没有有效分数时为 unknown
  pub fn from_scores<I>(scores: I) -> Self
  where
    I: IntoIterator<Item = (AngleLabel, f32)>,
  {
    let mut best: Option<(AngleLabel, f32)> = None;
    for (angle, score) in scores {
      if angle == AngleLabel::Unknown || !score.is_finite() {
        continue;
      }
      if best.is_none_or(|(_, top)| score > top) {
        best = Some((angle, score));
      }
    }
    best.map(|(angle, _)| angle).unwrap_or_default()
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      AngleLabel::Front => "front",
      AngleLabel::Back => "back",
      AngleLabel::Left => "left",
      AngleLabel::Right => "right",
      AngleLabel::Unknown => "unknown",
    }
  }
}

impl fmt::Display for AngleLabel {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// 缺陷检测器的一条原始输出
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
  pub class_id: u32,
  pub label: String,
  pub confidence: f32,
  pub bbox: BBox,
}

impl Detection {
  pub fn new(
    class_id: u32,
    label: impl Into<String>,
    confidence: f32,
    bbox: BBox,
  ) -> Result<Self, ModelError> {
    if !(0.0..=1.0).contains(&confidence) {
      return Err(ModelError::InvalidConfidence(confidence));
    }
    Ok(Self {
      class_id,
      label: label.into(),
      confidence,
      bbox,
    })
  }

  /// 非受跟踪类型返回 None
  pub fn kind(&self) -> Option<DefectKind> {
    DefectKind::from_label(&self.label)
  }
}

/// 全图严重度分类结果。标签保留分类器原文，可能不在 minor/moderate/major 之内。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageSeverity {
  pub label: String,
  pub confidence: f32,
}

impl Default for ImageSeverity {
  fn default() -> Self {
    Self {
      label: Severity::Moderate.as_str().to_string(),
      confidence: 0.5,
    }
  }
}

impl ImageSeverity {
  pub fn new(label: impl Into<String>, confidence: f32) -> Self {
    Self {
      label: label.into(),
      confidence,
    }
  }

  /// 从分类器概率向量取 argmax。向量为空或与类别名数量不一致时没有可用结果。
  pub fn from_probs(names: &[String], probs: &[f32]) -> Option<Self> {
    if probs.is_empty() || names.len() != probs.len() {
      return None;
    }

    let mut best: Option<(usize, f32)> = None;
    for (idx, &p) in probs.iter().enumerate() {
      if !p.is_finite() {
        continue;
      }
      if best.is_none_or(|(_, top)| p > top) {
        best = Some((idx, p));
      }
    }

    best.map(|(idx, p)| Self::new(names[idx].clone(), p))
  }
}
