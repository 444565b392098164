// 该文件是 Lvye （绿野） 项目的一部分。
// tests/detectors.rs - 检测器集成测试
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

use std::path::Path;

use image::RgbImage;
use lvye::{
  algorithm::Algorithm,
  config::DetectorConfig,
  detection::{
    BoundingBox, Centroid, DetectError, DetectOutput, DetectWarning, GREEN_ON_GREEN, GreenOnBrown,
    GreenOnBrownParams, GreenOnGreen, GreenOnGreenError, GreenOnGreenParams, WeedDetector,
  },
  frame::BgrFrame,
  model::{DetectItem, DetectResult, InferRequest, LoadModel, Model, ModelError},
};

const RESOLUTIONS: [(u32, u32); 4] = [(123, 456), (789, 101), (112, 134), (563, 289)];
const GREEN: [u8; 3] = [30, 160, 40];
const SOIL: [u8; 3] = [40, 80, 120];

fn plants_on_soil(width: u32, height: u32, plants: &[(u32, u32, u32, u32)]) -> BgrFrame {
  BgrFrame::from_fn(width, height, |x, y| {
    let inside = plants
      .iter()
      .any(|&(px, py, pw, ph)| (px..px + pw).contains(&x) && (py..py + ph).contains(&y));
    if inside { GREEN } else { SOIL }
  })
}

fn assert_in_bounds(output: &DetectOutput, width: u32, height: u32) {
  assert_eq!(output.boxes.len(), output.centers.len());
  assert_eq!(output.boxes.len(), output.labels.len());
  for bbox in &output.boxes {
    assert!(bbox.x < width && bbox.y < height, "{bbox:?}");
    assert!(bbox.right() <= width && bbox.bottom() <= height, "{bbox:?}");
  }
}

#[test]
fn every_algorithm_handles_non_standard_resolutions() {
  let detector = GreenOnBrown::default();
  for (width, height) in RESOLUTIONS {
    for algorithm in Algorithm::ALL {
      let params = GreenOnBrownParams {
        algorithm: algorithm.name().to_string(),
        ..detector.params()
      };
      let output = detector.find(BgrFrame::new(width, height), &params);
      assert_eq!(output.image.dimensions(), (width, height));
      assert_in_bounds(&output, width, height);
    }
  }
}

#[test]
fn every_algorithm_keeps_boxes_inside_textured_frames() {
  let detector = GreenOnBrown::default();
  let frame = plants_on_soil(150, 90, &[(0, 0, 20, 15), (60, 30, 25, 25), (130, 70, 20, 20)]);
  for algorithm in Algorithm::ALL {
    let params = GreenOnBrownParams {
      algorithm: algorithm.name().to_string(),
      ..detector.params()
    };
    let output = detector.find(frame.clone(), &params);
    assert_in_bounds(&output, 150, 90);
    if matches!(algorithm, Algorithm::Hsv | Algorithm::Exg) {
      assert_eq!(output.len(), 3, "{}", algorithm.name());
      assert_eq!((output.boxes[0].x, output.boxes[0].y), (0, 0));
    }
  }
}

#[test]
fn plants_cut_by_the_frame_edge_are_detected() {
  let detector = GreenOnBrown::new("hsv", "weed");
  let output = detector.find(
    plants_on_soil(50, 40, &[(0, 0, 10, 10)]),
    &detector.params(),
  );
  assert_eq!(
    output.boxes,
    vec![BoundingBox {
      x: 0,
      y: 0,
      width: 10,
      height: 10
    }]
  );
  assert_eq!(output.centers, vec![Centroid { x: 5, y: 5 }]);

  let output = detector.find(
    plants_on_soil(50, 40, &[(38, 25, 12, 15)]),
    &detector.params(),
  );
  assert_eq!(
    output.boxes,
    vec![BoundingBox {
      x: 38,
      y: 25,
      width: 12,
      height: 15
    }]
  );

  let exg = GreenOnBrown::default();
  let output = exg.find(plants_on_soil(50, 40, &[(0, 0, 10, 10)]), &exg.params());
  assert_eq!(output.len(), 1);
  assert_eq!((output.boxes[0].x, output.boxes[0].y), (0, 0));
}

#[test]
fn fully_green_frame_is_one_detection() {
  let detector = GreenOnBrown::new("hsv", "weed");
  let output = detector.find(
    plants_on_soil(60, 45, &[(0, 0, 60, 45)]),
    &detector.params(),
  );
  assert_eq!(
    output.boxes,
    vec![BoundingBox {
      x: 0,
      y: 0,
      width: 60,
      height: 45
    }]
  );
}

#[test]
fn unknown_algorithm_matches_exg() {
  let detector = GreenOnBrown::default();
  let frame = plants_on_soil(120, 90, &[(40, 30, 20, 20)]);
  let invalid = detector.find(
    frame.clone(),
    &GreenOnBrownParams {
      algorithm: "invalid".to_string(),
      ..detector.params()
    },
  );
  let exg = detector.find(frame, &detector.params());

  assert_eq!(
    invalid.warnings,
    vec![DetectWarning::UnknownAlgorithm("invalid".to_string())]
  );
  assert!(exg.warnings.is_empty());
  assert_eq!(invalid.boxes, exg.boxes);
  assert_eq!(invalid.centers, exg.centers);
}

#[test]
fn hsv_reports_box_and_center() {
  let detector = GreenOnBrown::new("hsv", "weed");
  let output = detector.find(
    plants_on_soil(100, 80, &[(20, 30, 40, 25)]),
    &detector.params(),
  );
  assert_eq!(
    output.boxes,
    vec![BoundingBox {
      x: 20,
      y: 30,
      width: 40,
      height: 25
    }]
  );
  assert_eq!(output.centers, vec![Centroid { x: 40, y: 42 }]);
}

#[test]
fn min_area_is_strict() {
  // 5x5 方块的轮廓面积为 16
  let detector = GreenOnBrown::new("hsv", "weed");
  let frame = plants_on_soil(40, 40, &[(10, 10, 5, 5)]);
  let params = |min_area| GreenOnBrownParams {
    min_area,
    ..detector.params()
  };

  assert_eq!(detector.find(frame.clone(), &params(16)).len(), 0);
  assert_eq!(detector.find(frame, &params(15)).len(), 1);
}

#[test]
fn config_drives_green_on_brown() {
  let config = DetectorConfig::from_json_str(
    r#"{"algorithm": "hsv", "hueMin": 30, "hueMax": 90, "saturationMin": 30,
        "saturationMax": 255, "brightnessMin": 5, "brightnessMax": 200, "minArea": 1}"#,
  )
  .unwrap();
  let mut detector = WeedDetector::green_on_brown(&config);
  let output = detector
    .run(plants_on_soil(100, 80, &[(20, 30, 40, 25)]), &config)
    .unwrap();
  assert_eq!(output.len(), 1);
  assert_eq!(output.labels[0].name, "weed");
}

struct FixedModel {
  items: Vec<DetectItem>,
}

impl Model for FixedModel {
  fn infer(
    &mut self,
    _image: &RgbImage,
    _request: &InferRequest,
  ) -> Result<Vec<DetectResult>, ModelError> {
    Ok(vec![DetectResult::from(self.items.clone())])
  }

  fn class_name(&self, _class_id: u32) -> String {
    "weed".to_string()
  }
}

impl LoadModel for FixedModel {
  const EXTENSION: &'static str = "fixed";

  fn load(_path: &Path) -> Result<Self, ModelError> {
    Ok(FixedModel {
      items: vec![DetectItem {
        class_id: 0,
        score: 0.9,
        bbox: [0.1, 0.2, 0.5, 0.6],
      }],
    })
  }
}

struct UnloadableModel;

impl Model for UnloadableModel {
  fn infer(
    &mut self,
    _image: &RgbImage,
    _request: &InferRequest,
  ) -> Result<Vec<DetectResult>, ModelError> {
    Err(ModelError::Invalid("不应被调用".to_string()))
  }

  fn class_name(&self, class_id: u32) -> String {
    class_id.to_string()
  }
}

impl LoadModel for UnloadableModel {
  const EXTENSION: &'static str = "fixed";

  fn load(_path: &Path) -> Result<Self, ModelError> {
    panic!("平台检查失败时不应加载模型");
  }
}

#[test]
fn green_on_green_boxes_follow_working_resolution() {
  for (width, height) in RESOLUTIONS {
    let mut detector = GreenOnGreen::with_model(FixedModel::load(Path::new("")).unwrap());
    let output = detector
      .find(BgrFrame::new(width, height), &GreenOnGreenParams::default())
      .unwrap();
    assert_eq!(output.image.dimensions(), (640, 420));
    assert!(output.contours.is_none());
    assert_in_bounds(&output, 640, 420);
  }

  let mut detector = GreenOnGreen::with_model(FixedModel::load(Path::new("")).unwrap());
  let params = GreenOnGreenParams {
    resolution: Some((100, 50)),
    ..GreenOnGreenParams::default()
  };
  let output = detector.find(BgrFrame::new(200, 100), &params).unwrap();
  assert_eq!(
    output.boxes,
    vec![BoundingBox {
      x: 10,
      y: 10,
      width: 40,
      height: 20
    }]
  );
  assert_eq!(output.centers, vec![Centroid { x: 30, y: 20 }]);
  assert_eq!(output.image.dimensions(), (100, 50));
}

#[test]
fn green_on_green_construction_errors() {
  let dir = tempfile::tempdir().unwrap();

  let missing = dir.path().join("missing.fixed");
  assert!(matches!(
    GreenOnGreen::load::<FixedModel>(&missing, "desktop"),
    Err(GreenOnGreenError::ModelNotFound(path)) if path == missing
  ));

  let wrong_extension = dir.path().join("model.pt");
  std::fs::write(&wrong_extension, b"").unwrap();
  assert!(matches!(
    GreenOnGreen::load::<FixedModel>(&wrong_extension, "linux"),
    Err(GreenOnGreenError::InvalidModelExtension {
      expected: "fixed",
      ..
    })
  ));

  let model = dir.path().join("model.fixed");
  std::fs::write(&model, b"").unwrap();
  assert!(matches!(
    GreenOnGreen::load::<UnloadableModel>(&model, "invalid_platform"),
    Err(GreenOnGreenError::UnsupportedPlatform(_))
  ));
  assert!(GreenOnGreen::load::<FixedModel>(&model, "windows").is_ok());
}

#[test]
fn dispatch_selects_family_from_config() {
  let dir = tempfile::tempdir().unwrap();
  let model = dir.path().join("model.fixed");
  std::fs::write(&model, b"").unwrap();

  let gog_config = DetectorConfig {
    algorithm: GREEN_ON_GREEN.to_string(),
    conf: 0.5,
    resolution: Some((100, 50)),
    ..DetectorConfig::default()
  };
  let mut detector = WeedDetector::green_on_green::<FixedModel>(&model, "desktop").unwrap();
  let output = detector.run(BgrFrame::new(100, 50), &gog_config).unwrap();
  assert_eq!(output.len(), 1);
  assert_eq!(output.labels[0].name, "weed");

  let gob_config = DetectorConfig::default();
  assert!(matches!(
    detector.run(BgrFrame::new(100, 50), &gob_config),
    Err(DetectError::DetectorMismatch { .. })
  ));
}
