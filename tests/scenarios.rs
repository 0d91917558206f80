use image::{GrayImage, Luma};
use thiserror::Error;

use cheshang::{
  assess::Assessor,
  config::EngineConfig,
  frame::FrameShape,
  inspector::{InspectError, Inspector, Stage},
  mask::{PartMask, PartSegmentation},
  model::{AngleLabel, BBox, Detection, ImageSeverity, Model, Severity},
  report::IntegrityLabel,
};

struct Frame {
  width: u32,
  height: u32,
}

impl FrameShape for Frame {
  fn width(&self) -> u32 {
    self.width
  }

  fn height(&self) -> u32 {
    self.height
  }
}

#[derive(Error, Debug)]
#[error("mock collaborator offline")]
struct Offline;

struct FixedDetector(Result<Vec<Detection>, ()>);

impl Model for FixedDetector {
  type Input = Frame;
  type Output = Vec<Detection>;
  type Error = Offline;

  fn infer(&self, _input: &Frame) -> Result<Self::Output, Self::Error> {
    self.0.clone().map_err(|_| Offline)
  }
}

struct FixedSegmenter(PartSegmentation);

impl Model for FixedSegmenter {
  type Input = Frame;
  type Output = PartSegmentation;
  type Error = Offline;

  fn infer(&self, _input: &Frame) -> Result<Self::Output, Self::Error> {
    Ok(self.0.clone())
  }
}

struct FixedClassifier(Option<ImageSeverity>);

impl Model for FixedClassifier {
  type Input = Frame;
  type Output = Option<ImageSeverity>;
  type Error = Offline;

  fn infer(&self, _input: &Frame) -> Result<Self::Output, Self::Error> {
    Ok(self.0.clone())
  }
}

struct FixedAngle(AngleLabel);

impl Model for FixedAngle {
  type Input = Frame;
  type Output = AngleLabel;
  type Error = Offline;

  fn infer(&self, _input: &Frame) -> Result<Self::Output, Self::Error> {
    Ok(self.0)
  }
}

type MockInspector = Inspector<FixedDetector, FixedSegmenter, FixedClassifier, FixedAngle>;

fn inspector(
  config: EngineConfig,
  detections: Vec<Detection>,
  segmentation: PartSegmentation,
  image_severity: Option<ImageSeverity>,
  angle: AngleLabel,
) -> MockInspector {
  Inspector::new(
    Assessor::new(config),
    FixedDetector(Ok(detections)),
    FixedSegmenter(segmentation),
    FixedClassifier(image_severity),
    FixedAngle(angle),
  )
}

fn detection(label: &str, bbox: [f32; 4]) -> Detection {
  let bbox = BBox::new(bbox[0], bbox[1], bbox[2], bbox[3]).unwrap();
  Detection::new(0, label, 0.75, bbox).unwrap()
}

fn rect_mask(name: &str, grid: (u32, u32), x: (u32, u32), y: (u32, u32)) -> PartMask {
  let mut image = GrayImage::new(grid.0, grid.1);
  for yy in y.0..y.1 {
    for xx in x.0..x.1 {
      image.put_pixel(xx, yy, Luma([1]));
    }
  }
  PartMask::from_image(name, 0, image)
}

const FRAME: Frame = Frame {
  width: 1000,
  height: 1000,
};

#[test]
fn thin_scratch_on_left_fender() {
  let segmentation = PartSegmentation::with_parts(
    None,
    [rect_mask("left_fender", (1000, 1000), (0, 200), (0, 300))],
  )
  .unwrap();
  let detections = vec![detection("scratch", [0.0, 0.0, 2.0, 100.0])];
  let major = Some(ImageSeverity::new("major", 0.7));

  // 视角表中不含 left_fender：保持 minor，融合后仍为 minor
  let mut config = EngineConfig::default();
  config
    .angle_critical_parts
    .insert(AngleLabel::Left, ["left_door".to_string()].into());
  let report = inspector(
    config,
    detections.clone(),
    segmentation.clone(),
    major.clone(),
    AngleLabel::Left,
  )
  .infer(&FRAME)
  .unwrap();
  let record = &report.damage[0];
  assert_eq!(record.part, "left_fender");
  assert!((record.area_ratio - 0.0002).abs() < 1e-9);
  assert_eq!(record.severity_bbox, Severity::Minor);
  assert_eq!(record.severity_fused, Severity::Minor);

  // 默认视角表包含 left_fender：框级升级为 major，划痕融合取较低的全图等级
  let minor = Some(ImageSeverity::new("minor", 0.7));
  let report = inspector(
    EngineConfig::default(),
    detections,
    segmentation,
    minor,
    AngleLabel::Left,
  )
  .infer(&FRAME)
  .unwrap();
  let record = &report.damage[0];
  assert_eq!(record.severity_bbox, Severity::Major);
  assert_eq!(record.severity_fused, Severity::Minor);
  assert_eq!(report.integrity.score_1to5, 4);
}

#[test]
fn dent_on_headlight() {
  let segmentation = PartSegmentation::with_parts(
    Some("local:carparts-seg.pt".to_string()),
    [rect_mask("headlight", (1000, 1000), (100, 300), (100, 200))],
  )
  .unwrap();
  let detections = vec![detection("dent", [150.0, 120.0, 250.0, 170.0])];

  let report = inspector(
    EngineConfig::default(),
    detections,
    segmentation,
    Some(ImageSeverity::new("minor", 0.9)),
    AngleLabel::Front,
  )
  .infer(&FRAME)
  .unwrap();

  let record = &report.damage[0];
  assert_eq!(record.part, "headlight");
  assert_eq!(record.severity_bbox, Severity::Major);
  assert_eq!(record.severity_fused, Severity::Major);
  // 面积占比 0.005，关键部件加倍后为 0.01
  assert_eq!(report.integrity.score_1to5, 3);
  assert_eq!(report.seg_source, "local:carparts-seg.pt");
}

#[test]
fn zero_defects_is_a_clean_report() {
  let report = inspector(
    EngineConfig::default(),
    Vec::new(),
    PartSegmentation::new(None),
    None,
    AngleLabel::Unknown,
  )
  .infer(&FRAME)
  .unwrap();

  assert!(report.damage.is_empty());
  assert_eq!(report.integrity.score_1to5, 5);
  assert_eq!(report.integrity.label, IntegrityLabel::NoIssues);
  assert_eq!(report.severity_image, ImageSeverity::new("moderate", 0.5));
  assert_eq!(report.seg_source, "unknown");
}

#[test]
fn equal_overlap_resolves_to_first_mask_every_time() {
  let segmentation = PartSegmentation::with_parts(
    None,
    [
      rect_mask("hood", (1000, 1000), (0, 100), (0, 100)),
      rect_mask("front_bumper", (1000, 1000), (0, 100), (0, 100)),
    ],
  )
  .unwrap();
  let inspector = inspector(
    EngineConfig::default(),
    vec![detection("rust", [10.0, 10.0, 60.0, 60.0])],
    segmentation,
    None,
    AngleLabel::Back,
  );

  let first = inspector.infer(&FRAME).unwrap();
  for _ in 0..5 {
    let again = inspector.infer(&FRAME).unwrap();
    assert_eq!(again, first);
  }
  assert_eq!(first.damage[0].part, "hood");
}

#[test]
fn fused_severity_respects_rank_bounds() {
  let segmentation = PartSegmentation::with_parts(
    None,
    [rect_mask("left_door", (1000, 1000), (0, 500), (0, 1000))],
  )
  .unwrap();
  let boxes = [
    [10.0, 10.0, 20.0, 20.0],
    [10.0, 10.0, 150.0, 150.0],
    [10.0, 10.0, 400.0, 400.0],
    [10.0, 10.0, 14.0, 300.0],
  ];

  for label in ["scratch", "dent", "rust"] {
    for image in ["minor", "moderate", "major", "severe"] {
      for angle in [AngleLabel::Left, AngleLabel::Right] {
        let detections = boxes.iter().map(|b| detection(label, *b)).collect();
        let report = inspector(
          EngineConfig::default(),
          detections,
          segmentation.clone(),
          Some(ImageSeverity::new(image, 0.6)),
          angle,
        )
        .infer(&FRAME)
        .unwrap();

        let image_rank = Severity::from_label(image).unwrap_or(Severity::Moderate);
        for record in &report.damage {
          let lo = record.severity_bbox.min(image_rank);
          let hi = record.severity_bbox.max(image_rank);
          if label == "scratch" {
            assert!(record.severity_fused <= hi);
          } else {
            assert!(record.severity_fused >= lo);
          }
        }
      }
    }
  }
}

#[test]
fn collaborator_failure_names_the_stage() {
  let inspector = Inspector::new(
    Assessor::default(),
    FixedDetector(Err(())),
    FixedSegmenter(PartSegmentation::new(None)),
    FixedClassifier(None),
    FixedAngle(AngleLabel::Front),
  );

  match inspector.infer(&FRAME) {
    Err(InspectError::Collaborator { stage, .. }) => assert_eq!(stage, Stage::Detector),
    other => panic!("unexpected result: {:?}", other),
  }
}

#[test]
fn empty_frame_is_rejected() {
  let inspector = inspector(
    EngineConfig::default(),
    Vec::new(),
    PartSegmentation::new(None),
    None,
    AngleLabel::Front,
  );
  let frame = Frame {
    width: 0,
    height: 480,
  };
  assert!(matches!(
    inspector.infer(&frame),
    Err(InspectError::EmptyFrame(0, 480))
  ));
}
