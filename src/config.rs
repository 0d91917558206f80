// 该文件是 Cheshang （车伤） 项目的一部分。
// src/config.rs - 启发式阈值与关键部件表
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

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::model::{AngleLabel, ImageSeverity, Severity};

#[derive(Error, Debug)]
pub enum ConfigError {
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("配置解析错误: {0}")]
  ParseError(#[from] serde_json::Error),
  #[error("阈值无效: {0}")]
  InvalidThreshold(String),
}

/// 面积占比分档：`< minor_below` 为 minor，`< moderate_below` 为 moderate，其余 major
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AreaBuckets {
  pub minor_below: f64,
  pub moderate_below: f64,
}

impl Default for AreaBuckets {
  fn default() -> Self {
    Self {
      minor_below: 0.01,
      moderate_below: 0.03,
    }
  }
}

impl AreaBuckets {
  pub fn bucket(&self, area: f64) -> Severity {
    if area < self.minor_below {
      Severity::Minor
    } else if area < self.moderate_below {
      Severity::Moderate
    } else {
      Severity::Major
    }
  }
}

/// 划痕形状修正
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScratchShape {
  /// 细长度分母的平滑项
  pub epsilon: f64,
  /// 有效面积 = 面积占比 × (base_weight + thinness_weight × 细长度)
  pub base_weight: f64,
  pub thinness_weight: f64,
  /// 细长度低于该值且面积占比低于 thin_area_below 时走细长划痕分支
  pub thin_below: f64,
  pub thin_area_below: f64,
  /// 细长划痕面积占比达到该值时为 moderate，否则 minor
  pub thin_moderate_from: f64,
}

impl Default for ScratchShape {
  fn default() -> Self {
    Self {
      epsilon: 1e-6,
      base_weight: 0.25,
      thinness_weight: 0.75,
      thin_below: 0.15,
      thin_area_below: 0.15,
      thin_moderate_from: 0.02,
    }
  }
}

/// 完好度分档，worst 为加权后最大面积占比
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntegrityBuckets {
  pub critical_weight: f64,
  pub score4_below: f64,
  pub score3_below: f64,
  pub score2_below: f64,
}

impl Default for IntegrityBuckets {
  fn default() -> Self {
    Self {
      critical_weight: 2.0,
      score4_below: 0.01,
      score3_below: 0.03,
      score2_below: 0.08,
    }
  }
}

/// 融合引擎的全部常量。进程内只读，构造引擎时传入。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
  /// 任何角度下都视为关键的部件
  pub critical_parts: BTreeSet<String>,
  /// 各拍摄角度下的关键部件
  pub angle_critical_parts: BTreeMap<AngleLabel, BTreeSet<String>>,
  pub area: AreaBuckets,
  pub scratch: ScratchShape,
  pub integrity: IntegrityBuckets,
  /// IoU 并集低于该值时视为 0
  pub union_floor: f64,
  /// 分类器没有可用输出时的全图严重度
  pub default_image_severity: ImageSeverity,
}

fn part_set(parts: &[&str]) -> BTreeSet<String> {
  parts.iter().map(|p| p.to_string()).collect()
}

impl Default for EngineConfig {
  fn default() -> Self {
    let angle_critical_parts = BTreeMap::from([
      (
        AngleLabel::Front,
        part_set(&["headlight", "front_windshield", "front_bumper"]),
      ),
      (
        AngleLabel::Back,
        part_set(&["taillight", "rear_window", "rear_bumper"]),
      ),
      (AngleLabel::Left, part_set(&["left_door", "left_fender"])),
      (AngleLabel::Right, part_set(&["right_door", "right_fender"])),
    ]);

    Self {
      critical_parts: part_set(&["headlight", "front_windshield", "rear_window", "taillight"]),
      angle_critical_parts,
      area: AreaBuckets::default(),
      scratch: ScratchShape::default(),
      integrity: IntegrityBuckets::default(),
      union_floor: 1e-6,
      default_image_severity: ImageSeverity::default(),
    }
  }
}

impl EngineConfig {
  /// 从 JSON 文件加载，缺省字段取默认值
  pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
    let path = path.as_ref();
    info!("加载引擎配置: {}", path.display());
    let text = std::fs::read_to_string(path)?;
    Self::from_json_str(&text)
  }

  /// 未指定路径时使用默认配置
  pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
    match path {
      Some(path) => Self::from_path(path),
      None => {
        info!("使用默认引擎配置");
        Ok(Self::default())
      }
    }
  }

  pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
    let config: Self = serde_json::from_str(text)?;
    config.validate()?;
    Ok(config)
  }

  pub fn validate(&self) -> Result<(), ConfigError> {
    let ascending = |name: &str, values: &[f64]| -> Result<(), ConfigError> {
      if values.iter().any(|v| !v.is_finite() || *v < 0.0) {
        return Err(ConfigError::InvalidThreshold(format!(
          "{} 必须为非负有限值: {:?}",
          name, values
        )));
      }
      if values.windows(2).any(|w| w[0] > w[1]) {
        return Err(ConfigError::InvalidThreshold(format!(
          "{} 必须递增: {:?}",
          name, values
        )));
      }
      Ok(())
    };

    ascending("area", &[self.area.minor_below, self.area.moderate_below])?;
    ascending(
      "integrity",
      &[
        self.integrity.score4_below,
        self.integrity.score3_below,
        self.integrity.score2_below,
      ],
    )?;
    let weights = [
      self.scratch.base_weight,
      self.scratch.thinness_weight,
      self.scratch.thin_below,
      self.scratch.thin_area_below,
      self.scratch.thin_moderate_from,
      self.integrity.critical_weight,
      self.union_floor,
    ];
    if weights.iter().any(|v| !v.is_finite() || *v < 0.0) {
      return Err(ConfigError::InvalidThreshold(format!(
        "权重必须为非负有限值: {:?}",
        weights
      )));
    }
    if self.scratch.epsilon <= 0.0 {
      return Err(ConfigError::InvalidThreshold(
        "scratch.epsilon 必须大于 0".to_string(),
      ));
    }
    Ok(())
  }

  pub fn is_critical(&self, part: &str) -> bool {
    self.critical_parts.contains(part)
  }

  pub fn is_angle_critical(&self, angle: AngleLabel, part: &str) -> bool {
    self
      .angle_critical_parts
      .get(&angle)
      .is_some_and(|parts| parts.contains(part))
  }
}
