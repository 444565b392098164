// 该文件是 Lvye （绿野） 项目的一部分。
// src/algorithm/hsv.rs - HSV 阈值分割
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

use image::{GrayImage, Luma};

use crate::frame::BgrFrame;

/// 8 位图像的色相范围为 [0, 180)，即角度的一半
pub const HUE_RANGE: i32 = 180;

const MASK_ON: u8 = 255;
const MASK_OFF: u8 = 0;

/// HSV 三通道的闭区间阈值
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HsvThreshold {
  pub hue_min: u8,
  pub hue_max: u8,
  pub saturation_min: u8,
  pub saturation_max: u8,
  pub brightness_min: u8,
  pub brightness_max: u8,
  /// 反选色相区间，用于选择绿色以外的目标（如紫色、红色杂草）
  pub invert_hue: bool,
}

impl Default for HsvThreshold {
  fn default() -> Self {
    Self {
      hue_min: 30,
      hue_max: 90,
      saturation_min: 30,
      saturation_max: 255,
      brightness_min: 10,
      brightness_max: 220,
      invert_hue: false,
    }
  }
}

impl HsvThreshold {
  fn hue_selected(&self, hsv: [u8; 3], chromatic: bool) -> bool {
    // 无彩色像素没有色相，永远不落在色相区间内
    let inside = chromatic && (self.hue_min..=self.hue_max).contains(&hsv[0]);
    inside != self.invert_hue
  }

  fn selects(&self, bgr: [u8; 3]) -> bool {
    let hsv = bgr_to_hsv(bgr);
    let chromatic = is_chromatic(bgr);
    self.hue_selected(hsv, chromatic)
      && (self.saturation_min..=self.saturation_max).contains(&hsv[1])
      && (self.brightness_min..=self.brightness_max).contains(&hsv[2])
  }
}

/// 像素的最大通道与最小通道不同
pub fn is_chromatic(bgr: [u8; 3]) -> bool {
  let [b, g, r] = bgr;
  b.max(g).max(r) != b.min(g).min(r)
}

/// BGR 转 HSV，输出 `[h, s, v]`，h 位于 [0, 180)，s、v 位于 [0, 255]
pub fn bgr_to_hsv(bgr: [u8; 3]) -> [u8; 3] {
  let [b, g, r] = bgr.map(i32::from);
  let value = b.max(g).max(r);
  let min = b.min(g).min(r);
  let diff = value - min;

  let saturation = if value == 0 {
    0
  } else {
    (diff as f32 * 255.0 / value as f32).round() as i32
  };

  let hue = if diff == 0 {
    0
  } else {
    let sector = if value == r {
      g - b
    } else if value == g {
      (b - r) + 2 * diff
    } else {
      (r - g) + 4 * diff
    };
    // 60° 每扇区，再折半到 [0, 180)
    let hue = (sector as f32 * (HUE_RANGE / 6) as f32 / diff as f32).round() as i32;
    if hue < 0 { hue + HUE_RANGE } else { hue }
  };

  [hue as u8, saturation as u8, value as u8]
}

/// 按 HSV 阈值生成二值掩码（0 / 255）
pub fn hsv_mask(frame: &BgrFrame, threshold: &HsvThreshold) -> GrayImage {
  let (width, height) = frame.dimensions();
  GrayImage::from_fn(width, height, |x, y| {
    if threshold.selects(frame.bgr(x, y)) {
      Luma([MASK_ON])
    } else {
      Luma([MASK_OFF])
    }
  })
}
