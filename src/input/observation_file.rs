// 该文件是 Cheshang （车伤） 项目的一部分。
// src/input/observation_file.rs - 观测记录文件输入
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

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::{error, info, warn};
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  frame::Observation,
  mask::{MaskError, PartMask, PartSegmentation},
  model::{AngleLabel, BBox, Detection, ImageSeverity, ModelError},
};

#[derive(Error, Debug)]
pub enum ObservationFileError {
  #[error("URI scheme mismatch: expected '{expected}', found '{found}'")]
  SchemeMismatch {
    expected: &'static str,
    found: String,
  },
  #[error("I/O error: {0}")]
  IoError(#[from] std::io::Error),
  #[error("JSON error: {0}")]
  JsonError(#[from] serde_json::Error),
  #[error("Invalid detection: {0}")]
  ModelError(#[from] ModelError),
  #[error("Invalid part mask '{name}': {source}")]
  MaskError {
    name: String,
    #[source]
    source: MaskError,
  },
}

#[derive(Debug, Deserialize)]
struct ImageRecord {
  width: u32,
  height: u32,
}

#[derive(Debug, Deserialize)]
struct DetectionRecord {
  #[serde(default)]
  class_id: u32,
  label: String,
  confidence: f32,
  /// [x_min, y_min, x_max, y_max]
  bbox: [f32; 4],
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
enum ShapeRecord {
  Polygon(Vec<[f32; 2]>),
  RunLength(Vec<u32>),
}

#[derive(Debug, Deserialize)]
struct PartRecord {
  #[serde(default)]
  class_id: u32,
  name: String,
  #[serde(flatten)]
  shape: ShapeRecord,
}

#[derive(Debug, Deserialize)]
struct SegmentationRecord {
  #[serde(default)]
  source: Option<String>,
  width: u32,
  height: u32,
  #[serde(default)]
  parts: Vec<PartRecord>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SeverityRecord {
  Probs { names: Vec<String>, probs: Vec<f32> },
  Label { label: String, confidence: f32 },
}

#[derive(Debug, Deserialize)]
struct ObservationRecord {
  image: ImageRecord,
  #[serde(default)]
  angle: Option<String>,
  #[serde(default)]
  angle_scores: Option<BTreeMap<String, f32>>,
  #[serde(default)]
  detections: Vec<DetectionRecord>,
  #[serde(default)]
  segmentation: Option<SegmentationRecord>,
  #[serde(default)]
  severity: Option<SeverityRecord>,
}

impl ObservationRecord {
  fn into_observation(self, name: String) -> Result<Observation, ObservationFileError> {
    let angle = match (self.angle, self.angle_scores) {
      (Some(label), _) => AngleLabel::from_label(&label),
      (None, Some(scores)) => AngleLabel::from_scores(
        AngleLabel::VIEWS
          .iter()
          .filter_map(|view| scores.get(view.as_str()).map(|&score| (*view, score))),
      ),
      (None, None) => AngleLabel::Unknown,
    };

    let detections = self
      .detections
      .into_iter()
      .map(|d| {
        let [x1, y1, x2, y2] = d.bbox;
        Detection::new(d.class_id, d.label, d.confidence, BBox::new(x1, y1, x2, y2)?)
      })
      .collect::<Result<Vec<_>, _>>()?;

    let segmentation = match self.segmentation {
      Some(seg) => {
        let mut segmentation = PartSegmentation::new(seg.source);
        for part in seg.parts {
          let mask = match &part.shape {
            ShapeRecord::Polygon(points) => {
              PartMask::from_polygon(&part.name, part.class_id, seg.width, seg.height, points)
            }
            ShapeRecord::RunLength(counts) => {
              PartMask::from_run_length(&part.name, part.class_id, seg.width, seg.height, counts)
            }
          };
          mask
            .and_then(|mask| segmentation.push(mask))
            .map_err(|source| ObservationFileError::MaskError {
              name: part.name.clone(),
              source,
            })?;
        }
        segmentation
      }
      None => PartSegmentation::new(None),
    };

    let image_severity = match self.severity {
      Some(SeverityRecord::Probs { names, probs }) => {
        let severity = ImageSeverity::from_probs(&names, &probs);
        if severity.is_none() {
          warn!("{}: 严重度概率向量不可用，使用默认值", name);
        }
        severity
      }
      Some(SeverityRecord::Label { label, confidence }) => {
        Some(ImageSeverity::new(label, confidence))
      }
      None => None,
    };

    Ok(Observation {
      name,
      width: self.image.width,
      height: self.image.height,
      angle,
      detections,
      segmentation,
      image_severity,
    })
  }
}

/// 读取并解析一个观测文件
pub fn read_observation(path: &Path) -> Result<Observation, ObservationFileError> {
  let text = std::fs::read_to_string(path)?;
  let record: ObservationRecord = serde_json::from_str(&text)?;
  let name = path
    .file_stem()
    .map(|s| s.to_string_lossy().into_owned())
    .unwrap_or_default();
  record.into_observation(name)
}

fn check_scheme(url: &Url, expected: &'static str) -> Result<(), ObservationFileError> {
  if url.scheme() != expected {
    error!(
      "URI scheme mismatch: expected '{}', found '{}'",
      expected,
      url.scheme()
    );
    return Err(ObservationFileError::SchemeMismatch {
      expected,
      found: url.scheme().to_string(),
    });
  }
  Ok(())
}

/// 单个观测文件: `observation:///path/to/file.json`
pub struct ObservationFileInput {
  observation: Option<Observation>,
}

impl FromUrlWithScheme for ObservationFileInput {
  const SCHEME: &'static str = "observation";
}

impl FromUrl for ObservationFileInput {
  type Error = ObservationFileError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    check_scheme(url, Self::SCHEME)?;
    let observation = read_observation(Path::new(url.path()))?;
    info!("已读取观测文件: {}", url.path());
    Ok(Self {
      observation: Some(observation),
    })
  }
}

impl Iterator for ObservationFileInput {
  type Item = Observation;

  fn next(&mut self) -> Option<Self::Item> {
    self.observation.take()
  }
}

/// 目录下全部 `*.json` 观测文件，按文件名排序: `observations:///path/to/dir`
///
/// 无法解析的文件记录错误后跳过。
pub struct ObservationDirectoryInput {
  files: std::vec::IntoIter<PathBuf>,
}

impl FromUrlWithScheme for ObservationDirectoryInput {
  const SCHEME: &'static str = "observations";
}

impl FromUrl for ObservationDirectoryInput {
  type Error = ObservationFileError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    check_scheme(url, Self::SCHEME)?;

    let mut files = Vec::new();
    for entry in std::fs::read_dir(url.path())? {
      let path = entry?.path();
      if path.is_file() && path.extension().is_some_and(|ext| ext == "json") {
        files.push(path);
      }
    }
    files.sort();
    info!("目录 {} 下共有 {} 个观测文件", url.path(), files.len());

    Ok(Self {
      files: files.into_iter(),
    })
  }
}

impl Iterator for ObservationDirectoryInput {
  type Item = Observation;

  fn next(&mut self) -> Option<Self::Item> {
    for path in self.files.by_ref() {
      match read_observation(&path) {
        Ok(observation) => return Some(observation),
        Err(e) => error!("跳过观测文件 {}: {}", path.display(), e),
      }
    }
    None
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn record_with_everything() {
    let record: ObservationRecord = serde_json::from_str(
      r#"{
        "image": { "width": 100, "height": 50 },
        "angle_scores": { "front": 0.1, "left": 0.7, "right": 0.2 },
        "detections": [
          { "class_id": 0, "label": "scratch", "confidence": 0.8, "bbox": [1, 2, 11, 12] }
        ],
        "segmentation": {
          "source": "pretrained:yolov8s-seg.pt",
          "width": 4, "height": 2,
          "parts": [
            { "class_id": 2, "name": "hood", "run_length": [2, 3, 3] },
            { "class_id": 5, "name": "roof", "polygon": [[0, 0], [3, 0], [3, 1]] }
          ]
        },
        "severity": { "names": ["minor", "moderate", "major"], "probs": [0.2, 0.3, 0.5] }
      }"#,
    )
    .unwrap();

    let observation = record.into_observation("sample".to_string()).unwrap();
    assert_eq!(observation.angle, AngleLabel::Left);
    assert_eq!(observation.detections.len(), 1);
    assert_eq!(observation.segmentation.parts().len(), 2);
    assert_eq!(observation.segmentation.source(), Some("pretrained:yolov8s-seg.pt"));
    assert_eq!(
      observation.image_severity,
      Some(ImageSeverity::new("major", 0.5))
    );
  }

  #[test]
  fn tied_angle_scores_follow_view_order() {
    let record: ObservationRecord = serde_json::from_str(
      r#"{
        "image": { "width": 10, "height": 10 },
        "angle_scores": { "back": 0.5, "front": 0.5, "top": 0.9 }
      }"#,
    )
    .unwrap();
    let observation = record.into_observation("tie".to_string()).unwrap();
    assert_eq!(observation.angle, AngleLabel::Front);
  }

  #[test]
  fn minimal_record_uses_defaults() {
    let record: ObservationRecord =
      serde_json::from_str(r#"{ "image": { "width": 10, "height": 10 } }"#).unwrap();
    let observation = record.into_observation("empty".to_string()).unwrap();
    assert_eq!(observation.angle, AngleLabel::Unknown);
    assert!(observation.detections.is_empty());
    assert!(observation.segmentation.is_empty());
    assert_eq!(observation.image_severity, None);
  }

  #[test]
  fn inverted_box_is_rejected() {
    let record: ObservationRecord = serde_json::from_str(
      r#"{
        "image": { "width": 10, "height": 10 },
        "detections": [ { "label": "dent", "confidence": 0.5, "bbox": [5, 5, 1, 1] } ]
      }"#,
    )
    .unwrap();
    assert!(matches!(
      record.into_observation("bad".to_string()),
      Err(ObservationFileError::ModelError(_))
    ));
  }

  #[test]
  fn wrong_scheme_is_rejected() {
    let url = Url::parse("image:///tmp/a.json").unwrap();
    assert!(matches!(
      ObservationFileInput::from_url(&url),
      Err(ObservationFileError::SchemeMismatch { .. })
    ));
  }
}
