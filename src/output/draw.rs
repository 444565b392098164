// 该文件是 Lvye （绿野） 项目的一部分。
// src/output/draw.rs - 检测结果可视化
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

use ab_glyph::{FontRef, PxScale};
use image::Rgb;
use imageproc::{
  drawing::{draw_filled_circle_mut, draw_hollow_rect_mut, draw_text_mut},
  rect::Rect,
};

use crate::{
  detection::{BoundingBox, Centroid},
  frame::BgrFrame,
};

// 颜色均按 BGR 顺序
const BOX_COLOR: [u8; 3] = [0, 0, 255]; // 红色
const TEXT_COLOR: [u8; 3] = [255, 0, 0]; // 蓝色
const LABEL_FONT_SIZE: f32 = 24.0;
const LABEL_BASELINE_OFFSET: i32 = 30; // 文字基线位于框顶下方
const BOX_THICKNESS: u32 = 2;
const CENTROID_RADIUS: i32 = 5;

#[derive(Debug, Clone)]
pub struct Draw {
  font: FontRef<'static>,
  font_size: f32,
  box_color: [u8; 3],
  text_color: [u8; 3],
}

impl Default for Draw {
  fn default() -> Self {
    let font_data = include_bytes!("../../assets/DejaVuSans.ttf");
    let font = FontRef::try_from_slice(font_data).expect("无法加载嵌入的字体文件");

    Self {
      font,
      font_size: LABEL_FONT_SIZE,
      box_color: BOX_COLOR,
      text_color: TEXT_COLOR,
    }
  }
}

impl Draw {
  pub fn with_font_size(mut self, font_size: f32) -> Self {
    self.font_size = font_size;
    self
  }

  /// 绘制 2 像素粗的边框，并在框顶下方写标签
  pub fn draw_box_with_label(&self, frame: &mut BgrFrame, bbox: &BoundingBox, label: &str) {
    if bbox.width == 0 || bbox.height == 0 {
      return;
    }

    let canvas = frame.canvas_mut();
    for inset in 0..BOX_THICKNESS {
      if bbox.width <= 2 * inset || bbox.height <= 2 * inset {
        break;
      }
      let rect = Rect::at((bbox.x + inset) as i32, (bbox.y + inset) as i32)
        .of_size(bbox.width - 2 * inset, bbox.height - 2 * inset);
      draw_hollow_rect_mut(canvas, rect, Rgb(self.box_color));
    }

    if label.is_empty() {
      return;
    }
    let text_top = bbox.y as i32 + LABEL_BASELINE_OFFSET - self.font_size as i32;
    draw_text_mut(
      canvas,
      Rgb(self.text_color),
      bbox.x as i32,
      text_top,
      PxScale::from(self.font_size),
      &self.font,
      label,
    );
  }

  /// 在质心处绘制实心圆点
  pub fn draw_centroid(&self, frame: &mut BgrFrame, center: &Centroid) {
    draw_filled_circle_mut(
      frame.canvas_mut(),
      (center.x as i32, center.y as i32),
      CENTROID_RADIUS,
      Rgb(self.text_color),
    );
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn box_outline_is_red_and_interior_untouched() {
    let mut frame = BgrFrame::new(40, 40);
    let bbox = BoundingBox {
      x: 5,
      y: 5,
      width: 20,
      height: 20,
    };
    Draw::default().draw_box_with_label(&mut frame, &bbox, "");
    assert_eq!(frame.bgr(5, 5), BOX_COLOR);
    assert_eq!(frame.bgr(6, 6), BOX_COLOR);
    assert_eq!(frame.bgr(24, 24), BOX_COLOR);
    assert_eq!(frame.bgr(15, 15), [0, 0, 0]);
    assert_eq!(frame.bgr(26, 26), [0, 0, 0]);
  }

  #[test]
  fn degenerate_box_draws_nothing() {
    let mut frame = BgrFrame::new(10, 10);
    let bbox = BoundingBox {
      x: 2,
      y: 2,
      width: 0,
      height: 4,
    };
    Draw::default().draw_box_with_label(&mut frame, &bbox, "weed");
    assert!(frame.pixels().all(|p| p == [0, 0, 0]));
  }

  #[test]
  fn label_near_border_is_clipped() {
    let mut frame = BgrFrame::new(12, 12);
    let bbox = BoundingBox {
      x: 8,
      y: 8,
      width: 4,
      height: 4,
    };
    Draw::default().draw_box_with_label(&mut frame, &bbox, "100% weed");
    assert_eq!(frame.dimensions(), (12, 12));
  }

  #[test]
  fn centroid_is_blue_disc() {
    let mut frame = BgrFrame::new(20, 20);
    Draw::default().draw_centroid(&mut frame, &Centroid { x: 10, y: 10 });
    assert_eq!(frame.bgr(10, 10), TEXT_COLOR);
    assert_eq!(frame.bgr(10, 14), TEXT_COLOR);
    assert_eq!(frame.bgr(0, 0), [0, 0, 0]);
  }
}
