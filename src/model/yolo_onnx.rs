// 该文件是 Lvye （绿野） 项目的一部分。
// src/model/yolo_onnx.rs - ONNX YOLO 模型
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

use std::{collections::HashMap, path::Path};

use image::{RgbImage, imageops::FilterType};
use ort::{
  execution_providers::{CUDAExecutionProvider, ExecutionProvider},
  inputs,
  session::{Session, builder::GraphOptimizationLevel},
  value::Tensor,
};
use tracing::{debug, info, warn};

use crate::model::{
  DetectItem, DetectResult, Device, InferRequest, LoadModel, Model, ModelError,
  non_max_suppression, read_label_file,
};

const YOLO_INPUT_W: u32 = 640;
const YOLO_INPUT_H: u32 = 640;
const YOLO_INPUT_NAME: &str = "images";
// 输出为 [1, 4 + 类别数, 锚点数]，前 4 行为 cx, cy, w, h
const YOLO_BOX_PARAMS: usize = 4;
const YOLO_LABEL_FILE: &str = "labels.txt";

/// 以 ONNX Runtime 执行的 YOLOv8 类检测模型
pub struct YoloOnnx {
  session: Session,
  device: Device,
  labels: HashMap<u32, String>,
  input_width: u32,
  input_height: u32,
}

fn device_for(cuda_available: Result<bool, ort::Error>) -> Device {
  match cuda_available {
    Ok(true) => Device::Gpu,
    Ok(false) => Device::Cpu,
    Err(err) => {
      warn!("无法查询 CUDA 执行后端: {}", err);
      Device::Cpu
    }
  }
}

/// 优先注册 CUDA，运行时不可用时回退到 CPU
fn build_session(path: &Path) -> Result<(Session, Device), ort::Error> {
  let cuda = CUDAExecutionProvider::default();
  let device = device_for(cuda.is_available());

  let session = Session::builder()?
    .with_optimization_level(GraphOptimizationLevel::Level3)?
    .with_execution_providers([cuda.build()])?
    .commit_from_file(path)?;
  Ok((session, device))
}

impl LoadModel for YoloOnnx {
  const EXTENSION: &'static str = "onnx";

  fn load(path: &Path) -> Result<Self, ModelError> {
    info!("加载模型文件: {}", path.display());
    let (session, device) = build_session(path).map_err(ModelError::backend)?;
    info!("模型加载完成, 推理设备: {}", device);

    let label_path = path.with_file_name(YOLO_LABEL_FILE);
    let labels = if label_path.exists() {
      read_label_file(&label_path)?
    } else {
      warn!("未找到标签文件 {}, 使用类别编号", label_path.display());
      HashMap::new()
    };

    Ok(Self {
      session,
      device,
      labels,
      input_width: YOLO_INPUT_W,
      input_height: YOLO_INPUT_H,
    })
  }
}

impl YoloOnnx {
  /// 指定模型输入尺寸（导出时的 imgsz）
  pub fn with_input_size(mut self, width: u32, height: u32) -> Self {
    self.input_width = width;
    self.input_height = height;
    self
  }

  /// 拉伸到模型输入尺寸，转为 NCHW 且归一化到 [0, 1]
  fn preprocess(&self, image: &RgbImage) -> Vec<f32> {
    let resized = image::imageops::resize(
      image,
      self.input_width,
      self.input_height,
      FilterType::Triangle,
    );

    let plane = (self.input_width * self.input_height) as usize;
    let mut tensor = vec![0f32; plane * 3];
    for (index, pixel) in resized.pixels().enumerate() {
      for channel in 0..3 {
        tensor[channel * plane + index] = pixel.0[channel] as f32 / 255.0;
      }
    }
    tensor
  }

  fn run(&mut self, tensor: Vec<f32>) -> Result<(Vec<i64>, Vec<f32>), ort::Error> {
    let shape = [
      1usize,
      3,
      self.input_height as usize,
      self.input_width as usize,
    ];
    let input_tensor = Tensor::from_array((shape, tensor))?;
    let outputs = self.session.run(inputs![YOLO_INPUT_NAME => input_tensor])?;
    let (shape, data) = outputs[0].try_extract_tensor::<f32>()?;
    Ok((shape.iter().copied().collect(), data.to_vec()))
  }

  fn postprocess(
    &self,
    shape: &[i64],
    data: &[f32],
    request: &InferRequest,
  ) -> Result<Vec<DetectItem>, ModelError> {
    if shape.len() != 3 || shape[0] != 1 {
      return Err(ModelError::Invalid(format!(
        "模型输出形状不符合预期: {:?}",
        shape
      )));
    }

    let channels = shape[1] as usize;
    let anchors = shape[2] as usize;
    if channels <= YOLO_BOX_PARAMS || data.len() < channels * anchors {
      return Err(ModelError::Invalid(format!(
        "模型输出大小不匹配: 形状 {:?}, 数据长度 {}",
        shape,
        data.len()
      )));
    }

    let classes = channels - YOLO_BOX_PARAMS;
    let (input_w, input_h) = (self.input_width as f32, self.input_height as f32);
    let mut items = Vec::new();

    for anchor in 0..anchors {
      let (class_id, score) = (0..classes)
        .map(|c| (c as u32, data[(YOLO_BOX_PARAMS + c) * anchors + anchor]))
        .fold((0u32, f32::MIN), |best, current| {
          if current.1 > best.1 { current } else { best }
        });

      if score < request.confidence {
        continue;
      }
      if let Some(filter) = request.class_filter
        && filter != class_id
      {
        continue;
      }

      let cx = data[anchor];
      let cy = data[anchors + anchor];
      let w = data[2 * anchors + anchor];
      let h = data[3 * anchors + anchor];

      items.push(DetectItem {
        class_id,
        score,
        bbox: [
          ((cx - w / 2.0) / input_w).clamp(0.0, 1.0),
          ((cy - h / 2.0) / input_h).clamp(0.0, 1.0),
          ((cx + w / 2.0) / input_w).clamp(0.0, 1.0),
          ((cy + h / 2.0) / input_h).clamp(0.0, 1.0),
        ],
      });
    }

    debug!("置信度过滤后剩余 {} 个候选框", items.len());
    Ok(non_max_suppression(items, request.iou))
  }
}

impl Model for YoloOnnx {
  fn infer(
    &mut self,
    image: &RgbImage,
    request: &InferRequest,
  ) -> Result<Vec<DetectResult>, ModelError> {
    debug!("设置模型输入");
    let tensor = self.preprocess(image);

    debug!("执行模型推理");
    let (shape, data) = self.run(tensor).map_err(ModelError::backend)?;
    debug!("模型输出形状: {:?}", shape);

    let items = self.postprocess(&shape, &data, request)?;
    debug!("检测到 {} 个物体", items.len());
    Ok(vec![DetectResult::from(items)])
  }

  fn class_name(&self, class_id: u32) -> String {
    self
      .labels
      .get(&class_id)
      .cloned()
      .unwrap_or_else(|| class_id.to_string())
  }

  fn device(&self) -> Device {
    self.device
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn device_follows_cuda_availability() {
    assert_eq!(device_for(Ok(true)), Device::Gpu);
    assert_eq!(device_for(Ok(false)), Device::Cpu);
  }
}
