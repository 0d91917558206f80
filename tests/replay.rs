use std::path::{Path, PathBuf};

use url::Url;

use cheshang::{
  FromUrl,
  assess::Assessor,
  config::EngineConfig,
  input::{InputWrapper, ObservationDirectoryInput, read_observation, replay_inspector},
  model::{AngleLabel, DefectKind, Model, Severity},
  output::{DirectoryRecordOutput, OutputWrapper, Render},
  report::IntegrityLabel,
  task::{OneShotTask, Task},
};

fn fixture() -> PathBuf {
  Path::new(env!("CARGO_MANIFEST_DIR"))
    .join("tests")
    .join("data")
    .join("front_headlight.json")
}

fn url(scheme: &str, path: &Path, query: &str) -> Url {
  Url::parse(&format!("{}://{}{}", scheme, path.display(), query)).unwrap()
}

fn files_with_suffix(dir: &Path, suffix: &str) -> Vec<PathBuf> {
  let mut found = Vec::new();
  for entry in std::fs::read_dir(dir).unwrap() {
    let path = entry.unwrap().path();
    if path.is_dir() {
      found.extend(files_with_suffix(&path, suffix));
    } else if path.to_string_lossy().ends_with(suffix) {
      found.push(path);
    }
  }
  found
}

#[test]
fn replay_front_headlight() {
  let observation = read_observation(&fixture()).unwrap();
  assert_eq!(observation.name, "front_headlight");
  assert_eq!(observation.angle, AngleLabel::Front);

  let report = replay_inspector(Assessor::new(EngineConfig::default()))
    .infer(&observation)
    .unwrap();

  assert_eq!(report.angle, AngleLabel::Front);
  assert_eq!(report.severity_image.label, "minor");
  assert_eq!(report.seg_source, "local:carparts-seg.pt");
  // license_plate 不在跟踪的缺陷类型中
  assert_eq!(report.damage.len(), 2);

  let dent = &report.damage[0];
  assert_eq!(dent.kind, DefectKind::Dent);
  assert_eq!(dent.part, "headlight");
  assert_eq!(dent.bbox, [20.0, 20.0, 20.0, 20.0]);
  assert!((dent.area_ratio - 0.02).abs() < 1e-9);
  assert_eq!(dent.severity_bbox, Severity::Major);
  assert_eq!(dent.severity_fused, Severity::Major);

  let scratch = &report.damage[1];
  assert_eq!(scratch.kind, DefectKind::Scratch);
  assert_eq!(scratch.part, "front_bumper");
  assert!((scratch.area_ratio - 0.004).abs() < 1e-9);
  assert_eq!(scratch.severity_bbox, Severity::Major);
  assert_eq!(scratch.severity_fused, Severity::Minor);

  assert_eq!(report.integrity.score_1to5, 2);
  assert_eq!(report.integrity.label, IntegrityLabel::Issues);
  assert!(report.overlay.is_none());
}

#[test]
fn oneshot_writes_json_report() {
  let dir = tempfile::tempdir().unwrap();
  let target = dir.path().join("out").join("report.json");

  let input = InputWrapper::from_url(&url("observation", &fixture(), "")).unwrap();
  let output = OutputWrapper::from_url(&url("json", &target, "")).unwrap();
  let inspector = replay_inspector(Assessor::default()).with_overlay(true);
  OneShotTask.run_task(input, inspector, output).unwrap();

  let text = std::fs::read_to_string(&target).unwrap();
  let value: serde_json::Value = serde_json::from_str(&text).unwrap();
  assert_eq!(value["angle"], "front");
  assert_eq!(value["severity_image"]["label"], "minor");
  assert_eq!(value["integrity"]["score_1to5"], 2);
  assert_eq!(value["integrity"]["label"], "issues");
  assert_eq!(value["damage"][0]["type"], "dent");
  assert_eq!(value["damage"][0]["severity_bbox"], "major");
  assert_eq!(value["damage"][1]["severity_fused"], "minor");
  assert_eq!(value["seg_source"], "local:carparts-seg.pt");
  assert!(value.get("overlay").is_none());
}

#[test]
fn directory_record_writes_overlay_sidecar() {
  let dir = tempfile::tempdir().unwrap();
  let observation = read_observation(&fixture()).unwrap();
  let report = replay_inspector(Assessor::default())
    .with_overlay(true)
    .infer(&observation)
    .unwrap();

  let output = DirectoryRecordOutput::from_url(&url("folder", dir.path(), "?overlay")).unwrap();
  output.render_result(&observation, &report).unwrap();

  assert_eq!(files_with_suffix(dir.path(), ".json").len(), 1);
  let sidecars = files_with_suffix(dir.path(), ".overlay.txt");
  assert_eq!(sidecars.len(), 1);
  let lines = std::fs::read_to_string(&sidecars[0]).unwrap();
  assert_eq!(
    lines,
    "dent | headlight | major, 20, 20, 40, 40, #28dc28\n\
     scratch | front_bumper | minor, 120, 50, 122, 90, #ffaa24"
  );
}

#[test]
fn directory_record_skips_clean_reports_unless_always() {
  let dir = tempfile::tempdir().unwrap();
  let mut observation = read_observation(&fixture()).unwrap();
  observation.detections.clear();
  let report = replay_inspector(Assessor::default())
    .infer(&observation)
    .unwrap();
  assert!(!report.has_damage());

  let skipping = DirectoryRecordOutput::from_url(&url("folder", dir.path(), "")).unwrap();
  skipping.render_result(&observation, &report).unwrap();
  assert!(files_with_suffix(dir.path(), ".json").is_empty());

  let always = DirectoryRecordOutput::from_url(&url("folder", dir.path(), "?always")).unwrap();
  always.render_result(&observation, &report).unwrap();
  always.render_result(&observation, &report).unwrap();
  assert_eq!(files_with_suffix(dir.path(), ".json").len(), 2);
}

#[test]
fn directory_input_skips_unreadable_files() {
  let dir = tempfile::tempdir().unwrap();
  std::fs::copy(fixture(), dir.path().join("a.json")).unwrap();
  std::fs::write(dir.path().join("b.json"), "{ not json").unwrap();
  std::fs::write(
    dir.path().join("b2.json"),
    r#"{
      "image": { "width": 10, "height": 10 },
      "segmentation": {
        "width": 10, "height": 10,
        "parts": [ { "name": "hood", "polygon": [[0, 0], [3.0e9, 0], [0, 9]] } ]
      }
    }"#,
  )
  .unwrap();
  std::fs::copy(fixture(), dir.path().join("c.json")).unwrap();
  std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

  let input = ObservationDirectoryInput::from_url(&url("observations", dir.path(), "")).unwrap();
  let names: Vec<String> = input.map(|o| o.name).collect();
  assert_eq!(names, vec!["a".to_string(), "c".to_string()]);
}

#[test]
fn unknown_schemes_are_rejected() {
  let dir = tempfile::tempdir().unwrap();
  assert!(InputWrapper::from_url(&url("camera", dir.path(), "")).is_err());
  assert!(OutputWrapper::from_url(&url("rtsp", dir.path(), "")).is_err());
}
