// 该文件是 Lvye （绿野） 项目的一部分。
// src/detection/mask.rs - 阈值与形态学处理
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

use image::{GrayImage, ImageBuffer, Luma};
use imageproc::{distance_transform::Norm, filter::separable_filter_equal, morphology};

const MASK_ON: u8 = 255;
const MASK_OFF: u8 = 0;

const ADAPTIVE_BLOCK: usize = 31;
const ADAPTIVE_OFFSET: i16 = 2;

/// 窗口长度为 `size` 的归一化高斯核，σ 取 `0.3 * ((size - 1) * 0.5 - 1) + 0.8`
fn gaussian_kernel(size: usize) -> Vec<f32> {
  let sigma = 0.3 * ((size as f32 - 1.0) * 0.5 - 1.0) + 0.8;
  let center = (size / 2) as f32;
  let weights: Vec<f32> = (0..size)
    .map(|i| {
      let d = i as f32 - center;
      (-(d * d) / (2.0 * sigma * sigma)).exp()
    })
    .collect();
  let sum: f32 = weights.iter().sum();
  weights.into_iter().map(|w| w / sum).collect()
}

/// 31x31 高斯加权局部均值，取整到 u8
fn local_mean(map: &GrayImage) -> GrayImage {
  let (width, height) = map.dimensions();
  let values: ImageBuffer<Luma<f32>, Vec<f32>> =
    ImageBuffer::from_fn(width, height, |x, y| Luma([map.get_pixel(x, y).0[0] as f32]));
  let mean = separable_filter_equal(&values, &gaussian_kernel(ADAPTIVE_BLOCK));
  GrayImage::from_fn(width, height, |x, y| {
    Luma([mean.get_pixel(x, y).0[0].round().clamp(0.0, 255.0) as u8])
  })
}

/// 只保留 `min < v <= max` 的值，其余置零
pub fn band_filter(map: &GrayImage, min: u8, max: u8) -> GrayImage {
  let mut output = map.clone();
  for pixel in output.pixels_mut() {
    let v = pixel.0[0];
    if v <= min || v > max {
      pixel.0[0] = 0;
    }
  }
  output
}

/// 反向高斯自适应阈值：像素比局部加权均值低至少 2 时置 255
pub fn adaptive_threshold_inverse(map: &GrayImage) -> GrayImage {
  let mean = local_mean(map);
  let (width, height) = map.dimensions();
  GrayImage::from_fn(width, height, |x, y| {
    let diff = map.get_pixel(x, y).0[0] as i16 - mean.get_pixel(x, y).0[0] as i16;
    if diff <= -ADAPTIVE_OFFSET {
      Luma([MASK_ON])
    } else {
      Luma([MASK_OFF])
    }
  })
}

/// 以 3x3 十字结构元做 `iterations` 次闭运算（先膨胀后腐蚀）
pub fn close(mask: &GrayImage, iterations: u8) -> GrayImage {
  if iterations == 0 {
    return mask.clone();
  }
  morphology::close(mask, Norm::L1, iterations)
}

/// 掩码中前景像素数
pub fn count_on(mask: &GrayImage) -> usize {
  mask.pixels().filter(|p| p.0[0] != 0).count()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn band_filter_is_open_below_and_closed_above() {
    let map = GrayImage::from_fn(4, 1, |x, _| Luma([[30u8, 31, 250, 251][x as usize]]));
    let filtered = band_filter(&map, 30, 250);
    let values: Vec<u8> = filtered.pixels().map(|p| p.0[0]).collect();
    assert_eq!(values, vec![0, 31, 250, 0]);
  }

  #[test]
  fn adaptive_threshold_of_flat_map_is_empty() {
    for value in [0u8, 100, 255] {
      let map = GrayImage::from_pixel(40, 40, Luma([value]));
      assert_eq!(count_on(&adaptive_threshold_inverse(&map)), 0);
    }
  }

  #[test]
  fn adaptive_threshold_marks_dark_side_of_edge() {
    let map = GrayImage::from_fn(40, 40, |x, _| Luma([if x < 20 { 0 } else { 200 }]));
    let mask = adaptive_threshold_inverse(&map);
    assert_eq!(mask.get_pixel(19, 20).0[0], MASK_ON);
    assert_eq!(mask.get_pixel(20, 20).0[0], MASK_OFF);
    assert_eq!(mask.get_pixel(0, 20).0[0], MASK_OFF);
  }

  #[test]
  fn gaussian_kernel_is_normalised_and_symmetric() {
    let kernel = gaussian_kernel(ADAPTIVE_BLOCK);
    assert_eq!(kernel.len(), 31);
    assert!((kernel.iter().sum::<f32>() - 1.0).abs() < 1e-5);
    assert!((kernel[0] - kernel[30]).abs() < 1e-9);
    assert!(kernel[15] > kernel[14]);
  }

  #[test]
  fn adaptive_window_reaches_fifteen_pixels() {
    // 离植物边缘 10 到 12 像素处，局部均值仍不低于 2
    let map = GrayImage::from_fn(64, 10, |x, _| Luma([if x < 20 { 250 } else { 0 }]));
    let mask = adaptive_threshold_inverse(&map);
    for x in 20..32 {
      assert_eq!(mask.get_pixel(x, 5).0[0], MASK_ON, "x = {x}");
    }
    assert_eq!(mask.get_pixel(32, 5).0[0], MASK_OFF);
    assert_eq!(mask.get_pixel(10, 5).0[0], MASK_OFF);
  }

  #[test]
  fn close_fills_single_pixel_gap() {
    let mask = GrayImage::from_fn(9, 5, |x, _| Luma([if x == 4 { 0 } else { MASK_ON }]));
    let closed = close(&mask, 1);
    assert_eq!(closed.get_pixel(4, 2).0[0], MASK_ON);
  }

  #[test]
  fn close_keeps_rectangle() {
    let mask = GrayImage::from_fn(30, 30, |x, y| {
      Luma([if (10..20).contains(&x) && (8..15).contains(&y) { MASK_ON } else { 0 }])
    });
    assert_eq!(close(&mask, 5), mask);
  }
}
