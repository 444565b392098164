// 该文件是 Lvye （绿野） 项目的一部分。
// src/frame.rs - BGR 帧定义
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

use image::{ImageBuffer, Rgb, RgbImage, imageops::FilterType};
use thiserror::Error;

const BGR_CHANNELS: usize = 3;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum FrameError {
  #[error("数据长度不匹配: 期望长度 {expected}, 实际长度 {actual}")]
  ShapeMismatch { expected: usize, actual: usize },
  #[error("帧尺寸无效: {0}x{1}")]
  EmptyShape(u32, u32),
}

/// 按 B、G、R 顺序存储的 8 位三通道帧。
///
/// 内部复用 `RgbImage` 的存储，但第 0 通道为蓝色、第 2 通道为红色，
/// 因此绘制时颜色也按 BGR 顺序给出。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BgrFrame {
  buffer: RgbImage,
}

impl BgrFrame {
  /// 全黑帧
  pub fn new(width: u32, height: u32) -> Self {
    Self {
      buffer: ImageBuffer::new(width, height),
    }
  }

  /// 从 BGR 交织的原始字节构造帧，长度必须为 `width * height * 3`
  pub fn from_raw(width: u32, height: u32, data: Vec<u8>) -> Result<Self, FrameError> {
    if width == 0 || height == 0 {
      return Err(FrameError::EmptyShape(width, height));
    }

    let expected = BGR_CHANNELS * width as usize * height as usize;
    let actual = data.len();
    if actual != expected {
      return Err(FrameError::ShapeMismatch { expected, actual });
    }

    ImageBuffer::from_raw(width, height, data)
      .map(|buffer| Self { buffer })
      .ok_or(FrameError::ShapeMismatch { expected, actual })
  }

  pub fn from_fn(width: u32, height: u32, f: impl Fn(u32, u32) -> [u8; 3]) -> Self {
    Self {
      buffer: ImageBuffer::from_fn(width, height, |x, y| Rgb(f(x, y))),
    }
  }

  pub fn from_rgb_image(image: &RgbImage) -> Self {
    Self {
      buffer: ImageBuffer::from_fn(image.width(), image.height(), |x, y| {
        let [r, g, b] = image.get_pixel(x, y).0;
        Rgb([b, g, r])
      }),
    }
  }

  pub fn to_rgb_image(&self) -> RgbImage {
    ImageBuffer::from_fn(self.width(), self.height(), |x, y| {
      let [b, g, r] = self.buffer.get_pixel(x, y).0;
      Rgb([r, g, b])
    })
  }

  pub fn width(&self) -> u32 {
    self.buffer.width()
  }

  pub fn height(&self) -> u32 {
    self.buffer.height()
  }

  pub fn dimensions(&self) -> (u32, u32) {
    self.buffer.dimensions()
  }

  /// 像素值 `[b, g, r]`
  pub fn bgr(&self, x: u32, y: u32) -> [u8; 3] {
    self.buffer.get_pixel(x, y).0
  }

  pub fn set_bgr(&mut self, x: u32, y: u32, bgr: [u8; 3]) {
    self.buffer.put_pixel(x, y, Rgb(bgr));
  }

  /// 按行优先顺序遍历每个像素的 `[b, g, r]`
  pub fn pixels(&self) -> impl Iterator<Item = [u8; 3]> + '_ {
    self.buffer.pixels().map(|p| p.0)
  }

  /// 缩放到指定尺寸，尺寸相同时原样返回
  pub fn resize(self, width: u32, height: u32) -> Self {
    if self.dimensions() == (width, height) {
      return self;
    }
    Self {
      buffer: image::imageops::resize(&self.buffer, width, height, FilterType::Triangle),
    }
  }

  /// 绘制用画布，颜色需按 BGR 顺序给出
  pub(crate) fn canvas_mut(&mut self) -> &mut RgbImage {
    &mut self.buffer
  }
}

impl From<RgbImage> for BgrFrame {
  fn from(image: RgbImage) -> Self {
    BgrFrame::from_rgb_image(&image)
  }
}
