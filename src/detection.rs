// 该文件是 Lvye （绿野） 项目的一部分。
// src/detection.rs - 杂草检测器与统一调用接口
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

use imageproc::contours::Contour;
use thiserror::Error;
use tracing::debug;

use crate::{config::DetectorConfig, frame::BgrFrame, model::LoadModel};

pub mod contour;
mod green_on_brown;
mod green_on_green;
pub mod mask;

pub use self::green_on_brown::{GreenOnBrown, GreenOnBrownParams};
pub use self::green_on_green::{GreenOnGreen, GreenOnGreenError, GreenOnGreenParams, Platform};

/// 配置中选择 Green-on-Green 检测器的算法名
pub const GREEN_ON_GREEN: &str = "gog";

/// 像素坐标下的检测框
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BoundingBox {
  pub x: u32,
  pub y: u32,
  pub width: u32,
  pub height: u32,
}

impl BoundingBox {
  /// 框中心，向下取整
  pub fn center(&self) -> Centroid {
    Centroid {
      x: self.x + self.width / 2,
      y: self.y + self.height / 2,
    }
  }

  pub fn right(&self) -> u32 {
    self.x + self.width
  }

  pub fn bottom(&self) -> u32 {
    self.y + self.height
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Centroid {
  pub x: u32,
  pub y: u32,
}

/// 检测框的标签；模型检测额外带有类别与置信度
#[derive(Debug, Clone, PartialEq)]
pub struct DetectLabel {
  pub name: String,
  pub class_id: Option<u32>,
  pub confidence: Option<f32>,
}

impl DetectLabel {
  pub fn named(name: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      class_id: None,
      confidence: None,
    }
  }
}

/// 不影响结果的诊断信息
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetectWarning {
  /// 算法不可用，已回退到 ExG
  UnknownAlgorithm(String),
}

/// 一帧的检测结果；`boxes`、`centers`、`labels` 按下标一一对应
#[derive(Debug, Clone)]
pub struct DetectOutput {
  /// 通过面积过滤的外轮廓，模型检测时为 `None`
  pub contours: Option<Vec<Contour<i32>>>,
  pub boxes: Vec<BoundingBox>,
  pub centers: Vec<Centroid>,
  pub labels: Vec<DetectLabel>,
  /// 已绘制检测框的帧
  pub image: BgrFrame,
  pub warnings: Vec<DetectWarning>,
}

impl DetectOutput {
  pub(crate) fn empty(image: BgrFrame) -> Self {
    Self {
      contours: None,
      boxes: Vec::new(),
      centers: Vec::new(),
      labels: Vec::new(),
      image,
      warnings: Vec::new(),
    }
  }

  pub(crate) fn push(&mut self, bbox: BoundingBox, center: Centroid, label: DetectLabel) {
    self.boxes.push(bbox);
    self.centers.push(center);
    self.labels.push(label);
  }

  pub fn len(&self) -> usize {
    self.boxes.len()
  }

  pub fn is_empty(&self) -> bool {
    self.boxes.is_empty()
  }
}

#[derive(Error, Debug)]
pub enum DetectError {
  #[error("Green-on-Green 检测错误: {0}")]
  GreenOnGreen(#[from] GreenOnGreenError),
  #[error("检测器不匹配: 配置要求 {expected}, 实际为 {actual}")]
  DetectorMismatch {
    expected: &'static str,
    actual: &'static str,
  },
}

/// 可替换的两类检测器
pub enum WeedDetector {
  GreenOnBrown(GreenOnBrown),
  GreenOnGreen(GreenOnGreen),
}

impl WeedDetector {
  pub fn green_on_brown(config: &DetectorConfig) -> Self {
    WeedDetector::GreenOnBrown(GreenOnBrown::new(&config.algorithm, green_on_brown::DEFAULT_LABEL))
  }

  pub fn green_on_green<L: LoadModel + Send + 'static>(
    model_path: impl AsRef<Path>,
    platform: &str,
  ) -> Result<Self, GreenOnGreenError> {
    GreenOnGreen::load::<L>(model_path, platform).map(WeedDetector::GreenOnGreen)
  }

  pub fn family(&self) -> &'static str {
    match self {
      WeedDetector::GreenOnBrown(_) => "green-on-brown",
      WeedDetector::GreenOnGreen(_) => "green-on-green",
    }
  }

  /// 按配置的算法名把参数转发给对应检测器
  pub fn run(&mut self, frame: BgrFrame, config: &DetectorConfig) -> Result<DetectOutput, DetectError> {
    let family = self.family();
    match self {
      WeedDetector::GreenOnGreen(detector) if config.is_green_on_green() => {
        debug!("使用 Green-on-Green 检测");
        Ok(detector.find(frame, &config.green_on_green_params())?)
      }
      WeedDetector::GreenOnBrown(detector) if !config.is_green_on_green() => {
        debug!("使用 Green-on-Brown 检测, 算法 {}", config.algorithm);
        Ok(detector.find(frame, &config.green_on_brown_params()))
      }
      _ => Err(DetectError::DetectorMismatch {
        expected: if config.is_green_on_green() {
          "green-on-green"
        } else {
          "green-on-brown"
        },
        actual: family,
      }),
    }
  }

  pub fn with_config(self, config: DetectorConfig) -> ConfiguredDetector {
    ConfiguredDetector {
      detector: self,
      config,
    }
  }
}

/// 逐帧检测
pub trait Detect {
  type Error;
  fn detect(&mut self, frame: BgrFrame) -> Result<DetectOutput, Self::Error>;
}

/// 绑定了配置的检测器，供任务循环使用
pub struct ConfiguredDetector {
  detector: WeedDetector,
  config: DetectorConfig,
}

impl ConfiguredDetector {
  pub fn config(&self) -> &DetectorConfig {
    &self.config
  }
}

impl Detect for ConfiguredDetector {
  type Error = DetectError;

  fn detect(&mut self, frame: BgrFrame) -> Result<DetectOutput, Self::Error> {
    self.detector.run(frame, &self.config)
  }
}
