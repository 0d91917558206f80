// 该文件是 Cheshang （车伤） 项目的一部分。
// src/inspector.rs - 协作模型与融合引擎的组合
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

use thiserror::Error;
use tracing::{debug, info};

use crate::{
  assess::{AssessmentInput, Assessor},
  frame::FrameShape,
  mask::PartSegmentation,
  model::{AngleLabel, Detection, ImageSeverity, Model},
  report::AnalysisReport,
};

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// 出错的协作模型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
  Detector,
  Segmenter,
  Classifier,
  Angle,
}

impl fmt::Display for Stage {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      Stage::Detector => "缺陷检测",
      Stage::Segmenter => "部件分割",
      Stage::Classifier => "严重度分类",
      Stage::Angle => "角度分类",
    };
    f.write_str(name)
  }
}

#[derive(Error, Debug)]
pub enum InspectError {
  #[error("帧尺寸无效: {0}x{1}")]
  EmptyFrame(u32, u32),
  #[error("{stage}推理失败: {source}")]
  Collaborator {
    stage: Stage,
    #[source]
    source: BoxError,
  },
}

impl InspectError {
  fn collaborator<E>(stage: Stage) -> impl FnOnce(E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    move |e| InspectError::Collaborator {
      stage,
      source: Box::new(e),
    }
  }
}

/// 依次调用四个协作模型，再交给融合引擎生成报告。
///
/// 本身也是一个 [`Model`]，输入为帧，输出为 [`AnalysisReport`]。
pub struct Inspector<D, S, C, A> {
  assessor: Assessor,
  detector: D,
  segmenter: S,
  classifier: C,
  angle: A,
  overlay: bool,
}

impl<D, S, C, A> Inspector<D, S, C, A> {
  pub fn new(assessor: Assessor, detector: D, segmenter: S, classifier: C, angle: A) -> Self {
    Self {
      assessor,
      detector,
      segmenter,
      classifier,
      angle,
      overlay: false,
    }
  }

  /// 是否在报告中附带可视化标注
  pub fn with_overlay(mut self, overlay: bool) -> Self {
    self.overlay = overlay;
    self
  }
}

impl<F, D, S, C, A, DE, SE, CE, AE> Model for Inspector<D, S, C, A>
where
  F: FrameShape,
  D: Model<Input = F, Output = Vec<Detection>, Error = DE>,
  S: Model<Input = F, Output = PartSegmentation, Error = SE>,
  C: Model<Input = F, Output = Option<ImageSeverity>, Error = CE>,
  A: Model<Input = F, Output = AngleLabel, Error = AE>,
  DE: std::error::Error + Send + Sync + 'static,
  SE: std::error::Error + Send + Sync + 'static,
  CE: std::error::Error + Send + Sync + 'static,
  AE: std::error::Error + Send + Sync + 'static,
{
  type Input = F;
  type Output = AnalysisReport;
  type Error = InspectError;

  fn infer(&self, frame: &Self::Input) -> Result<Self::Output, Self::Error> {
    let (width, height) = (frame.width(), frame.height());
    if width == 0 || height == 0 {
      return Err(InspectError::EmptyFrame(width, height));
    }

    let segmentation = self
      .segmenter
      .infer(frame)
      .map_err(InspectError::collaborator(Stage::Segmenter))?;
    let detections = self
      .detector
      .infer(frame)
      .map_err(InspectError::collaborator(Stage::Detector))?;
    let image_severity = self
      .classifier
      .infer(frame)
      .map_err(InspectError::collaborator(Stage::Classifier))?;
    let angle = self
      .angle
      .infer(frame)
      .map_err(InspectError::collaborator(Stage::Angle))?;

    debug!(
      "协作模型输出: 检测 {} 个, 部件 {} 个, 全图严重度 {:?}, 角度 {}",
      detections.len(),
      segmentation.parts().len(),
      image_severity,
      angle
    );

    let input = AssessmentInput {
      width,
      height,
      angle,
      image_severity: image_severity.as_ref(),
      detections: &detections,
      segmentation: &segmentation,
    };

    let report = if self.overlay {
      self.assessor.assess_with_overlay(&input)
    } else {
      self.assessor.assess(&input)
    };
    info!("{}x{} 图像评估完成", width, height);
    Ok(report)
  }
}
