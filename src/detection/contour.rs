// 该文件是 Lvye （绿野） 项目的一部分。
// src/detection/contour.rs - 轮廓提取与几何量
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

use image::{GrayImage, imageops};
use imageproc::{
  contours::{BorderType, Contour, find_contours},
  point::Point,
};

use crate::detection::BoundingBox;

/// 最外层的外边界，孔洞及孔洞内的区域均被忽略，顺序为光栅扫描的发现顺序。
///
/// 掩码四周先补一圈零像素，贴着图像边缘的区域同样作为外边界返回。
pub fn external_contours(mask: &GrayImage) -> Vec<Contour<i32>> {
  let (width, height) = mask.dimensions();
  let mut padded = GrayImage::new(width + 2, height + 2);
  imageops::replace(&mut padded, mask, 1, 1);

  find_contours::<i32>(&padded)
    .into_iter()
    .filter(|contour| contour.border_type == BorderType::Outer && contour.parent.is_none())
    .map(|contour| Contour {
      points: contour
        .points
        .into_iter()
        .map(|p| Point::new(p.x - 1, p.y - 1))
        .collect(),
      ..contour
    })
    .collect()
}

/// 以鞋带公式计算多边形面积，顶点为边界像素中心
pub fn contour_area(points: &[Point<i32>]) -> f64 {
  if points.len() < 3 {
    return 0.0;
  }

  let twice_area: i64 = points
    .iter()
    .zip(points.iter().cycle().skip(1))
    .map(|(a, b)| a.x as i64 * b.y as i64 - b.x as i64 * a.y as i64)
    .sum();
  twice_area.abs() as f64 / 2.0
}

/// 包含所有点的最小直立矩形，宽高包含两端像素
pub fn bounding_rect(points: &[Point<i32>]) -> BoundingBox {
  let Some(first) = points.first() else {
    return BoundingBox::default();
  };

  let (min_x, min_y, max_x, max_y) = points.iter().fold(
    (first.x, first.y, first.x, first.y),
    |(min_x, min_y, max_x, max_y), p| (min_x.min(p.x), min_y.min(p.y), max_x.max(p.x), max_y.max(p.y)),
  );

  BoundingBox {
    x: min_x.max(0) as u32,
    y: min_y.max(0) as u32,
    width: (max_x - min_x + 1) as u32,
    height: (max_y - min_y + 1) as u32,
  }
}
