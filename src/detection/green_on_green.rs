// 该文件是 Lvye （绿野） 项目的一部分。
// src/detection/green_on_green.rs - 基于目标检测模型的绿色（作物背景）检测
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

use std::{
  fmt,
  path::{Path, PathBuf},
  str::FromStr,
};

use thiserror::Error;
use tracing::{debug, info};

use crate::{
  detection::{BoundingBox, Centroid, DetectLabel, DetectOutput},
  frame::BgrFrame,
  model::{Device, InferRequest, LoadModel, Model, ModelError},
  output::draw::Draw,
};

const LABEL_FONT_SIZE: f32 = 18.0;

#[derive(Error, Debug)]
pub enum GreenOnGreenError {
  #[error("平台 {0} 尚不支持 Green-on-Green 检测")]
  UnsupportedPlatform(String),
  #[error("模型文件不存在: {}", .0.display())]
  ModelNotFound(PathBuf),
  #[error("模型文件扩展名无效: {}, 期望 .{expected}", .path.display())]
  InvalidModelExtension {
    path: PathBuf,
    expected: &'static str,
  },
  #[error("模型加载失败: {0}")]
  ModelLoad(#[source] ModelError),
  #[error("模型推理失败: {0}")]
  Inference(#[source] ModelError),
  #[error("工作分辨率无效: {0}x{1}")]
  InvalidResolution(u32, u32),
}

/// 可运行模型检测的平台
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
  Desktop,
  Windows,
  Linux,
}

impl FromStr for Platform {
  type Err = GreenOnGreenError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "desktop" => Ok(Platform::Desktop),
      "windows" => Ok(Platform::Windows),
      "linux" => Ok(Platform::Linux),
      other => Err(GreenOnGreenError::UnsupportedPlatform(other.to_string())),
    }
  }
}

impl fmt::Display for Platform {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Platform::Desktop => f.write_str("desktop"),
      Platform::Windows => f.write_str("windows"),
      Platform::Linux => f.write_str("linux"),
    }
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GreenOnGreenParams {
  pub conf: f32,
  pub iou: f32,
  /// 工作分辨率 `(宽, 高)`，`None` 时使用输入帧尺寸
  pub resolution: Option<(u32, u32)>,
  pub filter_id: Option<u32>,
}

impl Default for GreenOnGreenParams {
  fn default() -> Self {
    Self {
      conf: 0.4,
      iou: 0.7,
      resolution: Some((640, 420)),
      filter_id: None,
    }
  }
}

/// 在作物背景上用检测模型寻找杂草
pub struct GreenOnGreen {
  model: Box<dyn Model + Send>,
  device: Device,
  draw: Draw,
}

impl GreenOnGreen {
  /// 先检查平台，再检查模型路径与扩展名，最后加载模型
  pub fn load<L: LoadModel + Send + 'static>(
    model_path: impl AsRef<Path>,
    platform: &str,
  ) -> Result<Self, GreenOnGreenError> {
    let platform: Platform = platform.parse()?;
    let path = model_path.as_ref();

    if !path.exists() {
      return Err(GreenOnGreenError::ModelNotFound(path.to_path_buf()));
    }
    if path.extension().and_then(|ext| ext.to_str()) != Some(L::EXTENSION) {
      return Err(GreenOnGreenError::InvalidModelExtension {
        path: path.to_path_buf(),
        expected: L::EXTENSION,
      });
    }

    info!("在 {} 平台加载模型 {}", platform, path.display());
    let model = L::load(path).map_err(GreenOnGreenError::ModelLoad)?;
    Ok(Self::with_model(model))
  }

  pub fn with_model(model: impl Model + Send + 'static) -> Self {
    let device = model.device();
    info!("模型使用设备: {}", device);
    Self {
      model: Box::new(model),
      device,
      draw: Draw::default().with_font_size(LABEL_FONT_SIZE),
    }
  }

  pub fn device(&self) -> Device {
    self.device
  }

  pub fn find(
    &mut self,
    frame: BgrFrame,
    params: &GreenOnGreenParams,
  ) -> Result<DetectOutput, GreenOnGreenError> {
    let (width, height) = params.resolution.unwrap_or(frame.dimensions());
    if width == 0 || height == 0 {
      return Err(GreenOnGreenError::InvalidResolution(width, height));
    }
    let mut frame = frame.resize(width, height);

    let request = InferRequest {
      confidence: params.conf,
      iou: params.iou,
      class_filter: params.filter_id,
    };
    let results = self
      .model
      .infer(&frame.to_rgb_image(), &request)
      .map_err(GreenOnGreenError::Inference)?;

    let mut detections = Vec::new();
    for result in results {
      for item in result.items.iter() {
        if item.score < params.conf {
          continue;
        }
        if let Some(filter) = params.filter_id
          && filter != item.class_id
        {
          continue;
        }

        let [x_min, y_min, x_max, y_max] = item.bbox;
        let start_x = scale(x_min, width).min(width - 1);
        let start_y = scale(y_min, height).min(height - 1);
        let end_x = scale(x_max, width).max(start_x);
        let end_y = scale(y_max, height).max(start_y);

        let bbox = BoundingBox {
          x: start_x,
          y: start_y,
          width: scale(x_max - x_min, width).min(width - start_x),
          height: scale(y_max - y_min, height).min(height - start_y),
        };
        let center = Centroid {
          x: (start_x as f32 + (end_x - start_x) as f32 / 2.0).round() as u32,
          y: (start_y as f32 + (end_y - start_y) as f32 / 2.0).round() as u32,
        };
        let label = DetectLabel {
          name: self.model.class_name(item.class_id),
          class_id: Some(item.class_id),
          confidence: Some(item.score),
        };
        detections.push((bbox, center, label));
      }
    }
    debug!("模型检测到 {} 个目标", detections.len());

    for (bbox, center, label) in &detections {
      let percent = (100.0 * label.confidence.unwrap_or_default()) as u32;
      let text = format!("{}% {}", percent, label.name);
      self.draw.draw_box_with_label(&mut frame, bbox, &text);
      self.draw.draw_centroid(&mut frame, center);
    }

    let mut output = DetectOutput::empty(frame);
    for (bbox, center, label) in detections {
      output.push(bbox, center, label);
    }
    Ok(output)
  }
}

/// 归一化坐标换算为像素并限制在 `[0, extent]`
fn scale(value: f32, extent: u32) -> u32 {
  (value * extent as f32).round().clamp(0.0, extent as f32) as u32
}
