// 该文件是 Lvye （绿野） 项目的一部分。
// src/algorithm.rs - 绿度算法选择
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

use std::{fmt, str::FromStr};

use image::GrayImage;
use thiserror::Error;

use crate::frame::BgrFrame;

pub mod hsv;
pub mod index;

pub use self::hsv::HsvThreshold;

/// 绿度图，以及它是否已经是二值掩码
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GreennessMap {
  pub map: GrayImage,
  /// 为 `true` 时下游跳过自适应阈值，只做形态学闭运算
  pub thresholded: bool,
}

impl GreennessMap {
  fn index(map: GrayImage) -> Self {
    Self {
      map,
      thresholded: false,
    }
  }

  fn mask(map: GrayImage) -> Self {
    Self {
      map,
      thresholded: true,
    }
  }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("不支持的算法: {0}")]
pub struct UnknownAlgorithm(pub String);

/// Green-on-Brown 可选的像素分类算法
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Algorithm {
  #[default]
  Exg,
  Exgr,
  Maxg,
  Nexg,
  Exhsv,
  Hsv,
  Gndvi,
  Veg,
  Cive,
}

impl Algorithm {
  pub const ALL: [Algorithm; 9] = [
    Algorithm::Exg,
    Algorithm::Exgr,
    Algorithm::Maxg,
    Algorithm::Nexg,
    Algorithm::Exhsv,
    Algorithm::Hsv,
    Algorithm::Gndvi,
    Algorithm::Veg,
    Algorithm::Cive,
  ];

  pub fn name(&self) -> &'static str {
    match self {
      Algorithm::Exg => "exg",
      Algorithm::Exgr => "exgr",
      Algorithm::Maxg => "maxg",
      Algorithm::Nexg => "nexg",
      Algorithm::Exhsv => "exhsv",
      Algorithm::Hsv => "hsv",
      Algorithm::Gndvi => "gndvi",
      Algorithm::Veg => "veg",
      Algorithm::Cive => "cive",
    }
  }

  /// 计算绿度图；`threshold` 只被 `hsv` 与 `exhsv` 使用
  pub fn apply(&self, frame: &BgrFrame, threshold: &HsvThreshold) -> GreennessMap {
    match self {
      Algorithm::Exg => GreennessMap::index(index::exg(frame)),
      Algorithm::Exgr => GreennessMap::index(index::exgr(frame)),
      Algorithm::Maxg => GreennessMap::index(index::maxg(frame)),
      Algorithm::Nexg => GreennessMap::index(index::exg_standardised(frame)),
      Algorithm::Exhsv => GreennessMap::index(index::exg_standardised_hue(frame, threshold)),
      Algorithm::Hsv => GreennessMap::mask(hsv::hsv_mask(frame, threshold)),
      Algorithm::Gndvi => GreennessMap::index(index::gndvi(frame)),
      Algorithm::Veg => GreennessMap::index(index::veg(frame)),
      Algorithm::Cive => GreennessMap::index(index::cive(frame)),
    }
  }
}

impl FromStr for Algorithm {
  type Err = UnknownAlgorithm;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "exg" => Ok(Algorithm::Exg),
      "exgr" => Ok(Algorithm::Exgr),
      "maxg" => Ok(Algorithm::Maxg),
      "nexg" | "exg_standardised" => Ok(Algorithm::Nexg),
      "exhsv" | "exg_standardised_hue" => Ok(Algorithm::Exhsv),
      "hsv" => Ok(Algorithm::Hsv),
      "gndvi" => Ok(Algorithm::Gndvi),
      "veg" => Ok(Algorithm::Veg),
      "cive" => Ok(Algorithm::Cive),
      other => Err(UnknownAlgorithm(other.to_string())),
    }
  }
}

impl fmt::Display for Algorithm {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.name())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn names_round_trip_through_from_str() {
    for algorithm in Algorithm::ALL {
      assert_eq!(algorithm.name().parse::<Algorithm>(), Ok(algorithm));
    }
  }

  #[test]
  fn aliases_are_accepted() {
    assert_eq!("exg_standardised".parse(), Ok(Algorithm::Nexg));
    assert_eq!("exg_standardised_hue".parse(), Ok(Algorithm::Exhsv));
  }

  #[test]
  fn unknown_name_is_reported() {
    assert_eq!(
      "invalid".parse::<Algorithm>(),
      Err(UnknownAlgorithm("invalid".to_string()))
    );
  }

  #[test]
  fn only_hsv_is_pre_thresholded() {
    let frame = BgrFrame::new(9, 4);
    for algorithm in Algorithm::ALL {
      let output = algorithm.apply(&frame, &HsvThreshold::default());
      assert_eq!(output.map.dimensions(), (9, 4));
      assert_eq!(output.thresholded, algorithm == Algorithm::Hsv, "{algorithm}");
    }
  }
}
