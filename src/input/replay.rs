// 该文件是 Cheshang （车伤） 项目的一部分。
// src/input/replay.rs - 回放已记录的协作模型输出
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

use std::convert::Infallible;

use crate::{
  assess::Assessor,
  frame::Observation,
  inspector::Inspector,
  mask::PartSegmentation,
  model::{AngleLabel, Detection, ImageSeverity, Model},
};

/// 回放记录中的缺陷检测结果
#[derive(Debug, Default, Clone, Copy)]
pub struct ReplayDetector;

impl Model for ReplayDetector {
  type Input = Observation;
  type Output = Vec<Detection>;
  type Error = Infallible;

  fn infer(&self, input: &Self::Input) -> Result<Self::Output, Self::Error> {
    Ok(input.detections.clone())
  }
}

/// 回放记录中的部件分割结果
#[derive(Debug, Default, Clone, Copy)]
pub struct ReplaySegmenter;

impl Model for ReplaySegmenter {
  type Input = Observation;
  type Output = PartSegmentation;
  type Error = Infallible;

  fn infer(&self, input: &Self::Input) -> Result<Self::Output, Self::Error> {
    Ok(input.segmentation.clone())
  }
}

/// 回放记录中的全图严重度
#[derive(Debug, Default, Clone, Copy)]
pub struct ReplayClassifier;

impl Model for ReplayClassifier {
  type Input = Observation;
  type Output = Option<ImageSeverity>;
  type Error = Infallible;

  fn infer(&self, input: &Self::Input) -> Result<Self::Output, Self::Error> {
    Ok(input.image_severity.clone())
  }
}

/// 回放记录中的拍摄角度
#[derive(Debug, Default, Clone, Copy)]
pub struct ReplayAngle;

impl Model for ReplayAngle {
  type Input = Observation;
  type Output = AngleLabel;
  type Error = Infallible;

  fn infer(&self, input: &Self::Input) -> Result<Self::Output, Self::Error> {
    Ok(input.angle)
  }
}

pub type ReplayInspector = Inspector<ReplayDetector, ReplaySegmenter, ReplayClassifier, ReplayAngle>;

/// 以记录回放作为全部协作模型的检查器
pub fn replay_inspector(assessor: Assessor) -> ReplayInspector {
  Inspector::new(
    assessor,
    ReplayDetector,
    ReplaySegmenter,
    ReplayClassifier,
    ReplayAngle,
  )
}
