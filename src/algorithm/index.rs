// 该文件是 Lvye （绿野） 项目的一部分。
// src/algorithm/index.rs - 植被指数
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

//! 植被指数：把 BGR 帧映射为单通道“绿度”图。
//!
//! 所有函数都是纯函数，输出与输入同尺寸，并饱和到 [0, 255]。
//! 涉及除法的地方都对零分母做了替换，全黑或无方差的输入不会产生 NaN。

use image::{GrayImage, Luma};

use super::hsv::{HsvThreshold, hsv_mask};
use crate::frame::BgrFrame;

fn saturate(value: f32) -> u8 {
  // NaN 经 `as` 转换为 0
  value.clamp(0.0, 255.0) as u8
}

fn non_zero(value: f32) -> f32 {
  if value == 0.0 { 1.0 } else { value }
}

/// 逐像素计算，结果直接饱和
fn pointwise(frame: &BgrFrame, f: impl Fn(f32, f32, f32) -> f32) -> GrayImage {
  let (width, height) = frame.dimensions();
  GrayImage::from_fn(width, height, |x, y| {
    let [b, g, r] = frame.bgr(x, y);
    Luma([saturate(f(b as f32, g as f32, r as f32))])
  })
}

fn raw_values(frame: &BgrFrame, f: impl Fn(f32, f32, f32) -> f32) -> Vec<f32> {
  frame
    .pixels()
    .map(|[b, g, r]| f(b as f32, g as f32, r as f32))
    .collect()
}

fn from_values(frame: &BgrFrame, values: &[f32], scale: impl Fn(f32) -> u8) -> GrayImage {
  let (width, height) = frame.dimensions();
  GrayImage::from_fn(width, height, |x, y| {
    let index = y as usize * width as usize + x as usize;
    Luma([scale(values[index])])
  })
}

/// 最小-最大归一化到 [0, 255]，取值范围为空时输出全零
fn min_max_normalise(frame: &BgrFrame, f: impl Fn(f32, f32, f32) -> f32) -> GrayImage {
  let values = raw_values(frame, f);
  let (min, max) = values
    .iter()
    .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| {
      (lo.min(v), hi.max(v))
    });
  let range = max - min;

  if !range.is_finite() || range <= 0.0 {
    return GrayImage::new(frame.width(), frame.height());
  }

  from_values(frame, &values, |v| saturate((v - min) / range * 255.0))
}

/// ExG，Woebbecke 等 1995：`2G - R - B`
pub fn exg(frame: &BgrFrame) -> GrayImage {
  pointwise(frame, |b, g, r| 2.0 * g - r - b)
}

/// ExGR：`ExG - (1.4R - G)`，ExG 取饱和后的字节值
pub fn exgr(frame: &BgrFrame) -> GrayImage {
  pointwise(frame, |b, g, r| {
    let exg = saturate(2.0 * g - r - b) as f32;
    exg - (1.4 * r - g)
  })
}

/// MaxG，Jin 等 2021：`24G - 19R - 2B`，再按最大值缩放到 255
pub fn maxg(frame: &BgrFrame) -> GrayImage {
  let values = raw_values(frame, |b, g, r| 24.0 * g - 19.0 * r - 2.0 * b);
  let max = values.iter().copied().fold(f32::NEG_INFINITY, f32::max);

  if !max.is_finite() || max <= 0.0 {
    return GrayImage::new(frame.width(), frame.height());
  }

  from_values(frame, &values, |v| saturate(v / max * 255.0))
}

/// 标准化 ExG：各通道先除以三通道之和
pub fn exg_standardised(frame: &BgrFrame) -> GrayImage {
  pointwise(frame, standardised_exg_value)
}

fn standardised_exg_value(b: f32, g: f32, r: f32) -> f32 {
  let sum = non_zero(r + g + b);
  let (b, g, r) = (b / sum, g / sum, r / sum);
  255.0 * (2.0 * g - r - b)
}

/// 标准化 ExG 与 HSV 掩码按位与
pub fn exg_standardised_hue(frame: &BgrFrame, threshold: &HsvThreshold) -> GrayImage {
  let mut output = exg_standardised(frame);
  let mask = hsv_mask(frame, threshold);
  for (out, mask) in output.pixels_mut().zip(mask.pixels()) {
    out.0[0] &= mask.0[0];
  }
  output
}

/// GNDVI，仅适用于近红外图像：第三通道作为 NIR，`(NIR - G) / (NIR + G)`
pub fn gndvi(frame: &BgrFrame) -> GrayImage {
  min_max_normalise(frame, |_, g, nir| (nir - g) / non_zero(nir + g))
}

/// VEG：`G / (R^0.667 * B^0.333)`
pub fn veg(frame: &BgrFrame) -> GrayImage {
  min_max_normalise(frame, |b, g, r| g / non_zero(r.powf(0.667) * b.powf(0.333)))
}

/// CIVE：`0.441R - 0.881G + 0.385B + 18.78745`
pub fn cive(frame: &BgrFrame) -> GrayImage {
  pointwise(frame, |b, g, r| 0.441 * r - 0.881 * g + 0.385 * b + 18.78745)
}

#[cfg(test)]
mod tests {
  use super::*;

  fn uniform(value: [u8; 3]) -> BgrFrame {
    BgrFrame::from_fn(7, 5, move |_, _| value)
  }

  fn all(map: &GrayImage, value: u8) -> bool {
    map.pixels().all(|p| p.0[0] == value)
  }

  #[test]
  fn exg_on_black_is_zero() {
    let map = exg(&uniform([0, 0, 0]));
    assert_eq!(map.dimensions(), (7, 5));
    assert!(all(&map, 0));
  }

  #[test]
  fn exg_saturates_green() {
    assert!(all(&exg(&uniform([0, 200, 0])), 255));
    assert!(all(&exg(&uniform([30, 160, 40])), 250));
    assert!(all(&exg(&uniform([0, 0, 200])), 0));
  }

  #[test]
  fn exgr_and_maxg_are_defined_on_degenerate_frames() {
    assert!(all(&exgr(&uniform([0, 0, 0])), 0));
    assert!(all(&exgr(&uniform([255, 255, 255])), 0));
    assert!(all(&maxg(&uniform([0, 0, 0])), 0));
    // 24 - 19 - 2 = 3 > 0，缩放后为 255
    assert!(all(&maxg(&uniform([255, 255, 255])), 255));
  }

  #[test]
  fn maxg_scales_by_maximum() {
    let frame = BgrFrame::from_fn(2, 1, |x, _| if x == 0 { [0, 10, 0] } else { [0, 5, 0] });
    let map = maxg(&frame);
    assert_eq!(map.get_pixel(0, 0).0[0], 255);
    assert_eq!(map.get_pixel(1, 0).0[0], 127);
  }

  #[test]
  fn standardised_exg_is_zero_on_grey() {
    for value in [0u8, 1, 77, 128, 255] {
      assert!(all(&exg_standardised(&uniform([value; 3])), 0));
    }
  }

  #[test]
  fn standardised_exg_of_pure_green_saturates() {
    assert!(all(&exg_standardised(&uniform([0, 90, 0])), 255));
  }

  #[test]
  fn standardised_exg_hue_is_masked() {
    let frame = BgrFrame::from_fn(2, 1, |x, _| {
      if x == 0 { [30, 160, 40] } else { [10, 240, 30] }
    });
    let map = exg_standardised_hue(&frame, &HsvThreshold::default());
    assert!(map.get_pixel(0, 0).0[0] > 0);
    assert_eq!(map.get_pixel(1, 0).0[0], 0);
  }

  #[test]
  fn range_normalised_indices_are_zero_without_variance() {
    assert!(all(&gndvi(&uniform([0, 0, 0])), 0));
    assert!(all(&gndvi(&uniform([10, 50, 90])), 0));
    assert!(all(&veg(&uniform([0, 0, 0])), 0));
  }

  #[test]
  fn gndvi_spans_full_range() {
    let frame = BgrFrame::from_fn(2, 1, |x, _| if x == 0 { [0, 200, 0] } else { [0, 0, 200] });
    let map = gndvi(&frame);
    assert_eq!(map.get_pixel(0, 0).0[0], 0);
    assert_eq!(map.get_pixel(1, 0).0[0], 255);
  }

  #[test]
  fn cive_offsets_black() {
    assert!(all(&cive(&uniform([0, 0, 0])), 18));
  }
}
