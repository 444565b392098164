// 该文件是 Lvye （绿野） 项目的一部分。
// src/model.rs - 目标检测模型接口
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

use std::{collections::HashMap, fmt, path::Path};

use image::RgbImage;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum ModelError {
  #[error("模型加载错误: {0}")]
  Io(#[from] std::io::Error),
  #[error("模型无效: {0}")]
  Invalid(String),
  #[error("推理后端错误: {0}")]
  Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ModelError {
  pub fn backend(err: impl std::error::Error + Send + Sync + 'static) -> Self {
    ModelError::Backend(Box::new(err))
  }
}

/// 推理使用的计算设备，在模型加载时确定
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Device {
  #[default]
  Cpu,
  Gpu,
}

impl fmt::Display for Device {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Device::Cpu => f.write_str("cpu"),
      Device::Gpu => f.write_str("gpu"),
    }
  }
}

/// 单次推理的过滤参数
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InferRequest {
  pub confidence: f32,
  pub iou: f32,
  pub class_filter: Option<u32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DetectItem {
  pub class_id: u32,
  pub score: f32,
  pub bbox: [f32; 4], // [x_min, y_min, x_max, y_max]，相对输入图像归一化到 [0, 1]
}

/// 一批检测结果
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DetectResult {
  pub items: Box<[DetectItem]>,
}

impl From<Vec<DetectItem>> for DetectResult {
  fn from(items: Vec<DetectItem>) -> Self {
    Self {
      items: items.into_boxed_slice(),
    }
  }
}

/// 外部目标检测模型。
///
/// 每次调用都返回新的、有限的结果批次序列；同一实例不保证可并发调用，
/// 因此 `infer` 需要 `&mut self`。
pub trait Model {
  fn infer(
    &mut self,
    image: &RgbImage,
    request: &InferRequest,
  ) -> Result<Vec<DetectResult>, ModelError>;

  fn class_name(&self, class_id: u32) -> String;

  fn device(&self) -> Device {
    Device::Cpu
  }
}

impl<M: Model + ?Sized> Model for Box<M> {
  fn infer(
    &mut self,
    image: &RgbImage,
    request: &InferRequest,
  ) -> Result<Vec<DetectResult>, ModelError> {
    (**self).infer(image, request)
  }

  fn class_name(&self, class_id: u32) -> String {
    (**self).class_name(class_id)
  }

  fn device(&self) -> Device {
    (**self).device()
  }
}

/// 可从模型文件加载的模型
pub trait LoadModel: Model + Sized {
  /// 模型文件扩展名（不含点）
  const EXTENSION: &'static str;

  fn load(path: &Path) -> Result<Self, ModelError>;
}

/// 读取标签文件，每行为 `id 名称` 或仅 `名称`（此时以行号为 id）
pub fn read_label_file(path: &Path) -> Result<HashMap<u32, String>, std::io::Error> {
  let content = std::fs::read_to_string(path)?;
  let labels = parse_labels(&content);
  debug!("读取 {} 个标签: {}", labels.len(), path.display());
  Ok(labels)
}

fn parse_labels(content: &str) -> HashMap<u32, String> {
  content
    .lines()
    .map(str::trim)
    .filter(|line| !line.is_empty())
    .enumerate()
    .map(|(row, line)| {
      let mut parts = line.splitn(2, char::is_whitespace);
      let head = parts.next().unwrap_or_default();
      match (head.parse::<u32>(), parts.next()) {
        (Ok(id), Some(name)) => (id, name.trim().to_string()),
        _ => (row as u32, line.to_string()),
      }
    })
    .collect()
}

/// 同类别非极大值抑制，结果按置信度降序
pub fn non_max_suppression(mut items: Vec<DetectItem>, iou_threshold: f32) -> Vec<DetectItem> {
  items.sort_by(|a, b| b.score.total_cmp(&a.score));

  let mut result: Vec<DetectItem> = Vec::with_capacity(items.len());
  for item in items {
    let suppressed = result
      .iter()
      .any(|kept| kept.class_id == item.class_id && iou(&kept.bbox, &item.bbox) > iou_threshold);
    if !suppressed {
      result.push(item);
    }
  }
  result
}

/// 两个 `[x_min, y_min, x_max, y_max]` 框的 IoU
pub fn iou(a: &[f32; 4], b: &[f32; 4]) -> f32 {
  let x1 = a[0].max(b[0]);
  let y1 = a[1].max(b[1]);
  let x2 = a[2].min(b[2]);
  let y2 = a[3].min(b[3]);

  let intersection = (x2 - x1).max(0.0) * (y2 - y1).max(0.0);
  let area_a = (a[2] - a[0]).max(0.0) * (a[3] - a[1]).max(0.0);
  let area_b = (b[2] - b[0]).max(0.0) * (b[3] - b[1]).max(0.0);
  let union = area_a + area_b - intersection;

  if union > 0.0 { intersection / union } else { 0.0 }
}

#[cfg(feature = "model_onnx")]
mod yolo_onnx;
#[cfg(feature = "model_onnx")]
pub use self::yolo_onnx::YoloOnnx;
