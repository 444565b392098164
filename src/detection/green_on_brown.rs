// 该文件是 Lvye （绿野） 项目的一部分。
// src/detection/green_on_brown.rs - 基于植被指数的绿色（土壤背景）检测
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

use tracing::{debug, warn};

use crate::{
  algorithm::{Algorithm, HsvThreshold, UnknownAlgorithm},
  detection::{
    DetectLabel, DetectOutput, DetectWarning,
    contour::{bounding_rect, contour_area, external_contours},
    mask,
  },
  frame::BgrFrame,
  output::draw::Draw,
};

pub(crate) const DEFAULT_ALGORITHM: &str = "exg";
pub(crate) const DEFAULT_LABEL: &str = "weed";

const INDEX_CLOSE_ITERATIONS: u8 = 1;
const MASK_CLOSE_ITERATIONS: u8 = 5;

/// 单次检测的阈值参数
#[derive(Debug, Clone, PartialEq)]
pub struct GreenOnBrownParams {
  pub exg_min: u8,
  pub exg_max: u8,
  pub hsv: HsvThreshold,
  /// 轮廓面积需严格大于该值
  pub min_area: u32,
  /// 输出中间掩码的调试日志
  pub show_display: bool,
  pub algorithm: String,
}

impl Default for GreenOnBrownParams {
  fn default() -> Self {
    Self {
      exg_min: 30,
      exg_max: 250,
      hsv: HsvThreshold {
        hue_min: 30,
        hue_max: 90,
        saturation_min: 30,
        saturation_max: 255,
        brightness_min: 5,
        brightness_max: 200,
        invert_hue: false,
      },
      min_area: 1,
      show_display: false,
      algorithm: DEFAULT_ALGORITHM.to_string(),
    }
  }
}

/// 在土壤背景上寻找绿色植物
#[derive(Debug, Clone)]
pub struct GreenOnBrown {
  algorithm: String,
  label: String,
  draw: Draw,
}

impl Default for GreenOnBrown {
  fn default() -> Self {
    Self::new(DEFAULT_ALGORITHM, DEFAULT_LABEL)
  }
}

impl GreenOnBrown {
  pub fn new(algorithm: &str, label: &str) -> Self {
    Self {
      algorithm: algorithm.to_string(),
      label: label.to_string(),
      draw: Draw::default(),
    }
  }

  pub fn algorithm(&self) -> &str {
    &self.algorithm
  }

  pub fn label(&self) -> &str {
    &self.label
  }

  /// 默认参数，算法取构造时指定的算法
  pub fn params(&self) -> GreenOnBrownParams {
    GreenOnBrownParams {
      algorithm: self.algorithm.clone(),
      ..GreenOnBrownParams::default()
    }
  }

  pub fn find(&self, mut frame: BgrFrame, params: &GreenOnBrownParams) -> DetectOutput {
    let mut warnings = Vec::new();
    let algorithm = match params.algorithm.parse::<Algorithm>() {
      Ok(algorithm) => algorithm,
      Err(UnknownAlgorithm(name)) => {
        warn!("算法 {} 不可用, 回退到 ExG", name);
        warnings.push(DetectWarning::UnknownAlgorithm(name));
        Algorithm::Exg
      }
    };

    let greenness = algorithm.apply(&frame, &params.hsv);
    let binary = if greenness.thresholded {
      mask::close(&greenness.map, MASK_CLOSE_ITERATIONS)
    } else {
      let banded = mask::band_filter(&greenness.map, params.exg_min, params.exg_max);
      if params.show_display {
        debug!("阈值区间内像素数: {}", mask::count_on(&banded));
      }
      let threshold = mask::adaptive_threshold_inverse(&banded);
      mask::close(&threshold, INDEX_CLOSE_ITERATIONS)
    };
    if params.show_display {
      debug!("二值掩码前景像素数: {}", mask::count_on(&binary));
    }

    let mut contours = Vec::new();
    let mut boxes = Vec::new();
    for contour in external_contours(&binary) {
      if contour_area(&contour.points) > params.min_area as f64 {
        boxes.push(bounding_rect(&contour.points));
        contours.push(contour);
      }
    }
    debug!("{} 算法检测到 {} 个目标", algorithm, boxes.len());

    for bbox in &boxes {
      self.draw.draw_box_with_label(&mut frame, bbox, &self.label);
    }

    let mut output = DetectOutput::empty(frame);
    for bbox in boxes {
      output.push(bbox, bbox.center(), DetectLabel::named(self.label.as_str()));
    }
    output.contours = Some(contours);
    output.warnings = warnings;
    output
  }
}
