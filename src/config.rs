// 该文件是 Lvye （绿野） 项目的一部分。
// src/config.rs - 检测器配置
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

//! 检测器的全部可调参数。
//!
//! JSON 键名与现有配置文件保持一致（如 `exgMin`、`minArea`），
//! 以 `//` 开头的键视为注释被忽略，缺失的键取 `day_sensitivity_1` 预设值。

use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize, de};
use serde_json::Value;
use thiserror::Error;
use tracing::{info, warn};

use crate::{
  algorithm::HsvThreshold,
  detection::{GREEN_ON_GREEN, GreenOnBrownParams, GreenOnGreenParams},
};

pub const DEFAULT_PRESET: &str = "day_sensitivity_1";

#[derive(Error, Debug)]
pub enum ConfigError {
  #[error("读取配置文件错误: {0}")]
  Io(#[from] std::io::Error),
  #[error("解析配置错误: {0}")]
  Parse(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
  pub conf: f32,
  pub iou: f32,
  #[serde(deserialize_with = "deserialize_filter_id")]
  pub filter_id: Option<u32>,
  #[serde(rename = "exgMin")]
  pub exg_min: u8,
  #[serde(rename = "exgMax")]
  pub exg_max: u8,
  #[serde(rename = "hueMin")]
  pub hue_min: u8,
  #[serde(rename = "hueMax")]
  pub hue_max: u8,
  #[serde(rename = "saturationMin")]
  pub saturation_min: u8,
  #[serde(rename = "saturationMax")]
  pub saturation_max: u8,
  #[serde(rename = "brightnessMin")]
  pub brightness_min: u8,
  #[serde(rename = "brightnessMax")]
  pub brightness_max: u8,
  #[serde(rename = "minArea")]
  pub min_area: u32,
  pub invert_hue: bool,
  pub show_display: bool,
  pub algorithm: String,
  /// `[宽, 高]`
  pub resolution: Option<(u32, u32)>,
}

impl Default for DetectorConfig {
  fn default() -> Self {
    Self::day_sensitivity_1()
  }
}

impl DetectorConfig {
  fn day_sensitivity_1() -> Self {
    Self {
      conf: 0.6,
      iou: 0.7,
      filter_id: None,
      exg_min: 25,
      exg_max: 200,
      hue_min: 39,
      hue_max: 83,
      saturation_min: 50,
      saturation_max: 220,
      brightness_min: 60,
      brightness_max: 190,
      min_area: 10,
      invert_hue: false,
      show_display: false,
      algorithm: "exhsv".to_string(),
      resolution: Some((416, 320)),
    }
  }

  /// 按名称取预设，未知名称回退到默认预设
  pub fn preset(name: &str) -> Self {
    match name {
      DEFAULT_PRESET => Self::day_sensitivity_1(),
      other => {
        warn!("未知预设 {}, 使用 {}", other, DEFAULT_PRESET);
        Self::day_sensitivity_1()
      }
    }
  }

  pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
    Ok(serde_json::from_str(json)?)
  }

  pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)?;
    let config = Self::from_json_str(&content)?;
    info!("读取配置文件: {}", path.display());
    Ok(config)
  }

  pub fn is_green_on_green(&self) -> bool {
    self.algorithm == GREEN_ON_GREEN
  }

  pub fn hsv_threshold(&self) -> HsvThreshold {
    HsvThreshold {
      hue_min: self.hue_min,
      hue_max: self.hue_max,
      saturation_min: self.saturation_min,
      saturation_max: self.saturation_max,
      brightness_min: self.brightness_min,
      brightness_max: self.brightness_max,
      invert_hue: self.invert_hue,
    }
  }

  pub fn green_on_brown_params(&self) -> GreenOnBrownParams {
    GreenOnBrownParams {
      exg_min: self.exg_min,
      exg_max: self.exg_max,
      hsv: self.hsv_threshold(),
      min_area: self.min_area,
      show_display: self.show_display,
      algorithm: self.algorithm.clone(),
    }
  }

  pub fn green_on_green_params(&self) -> GreenOnGreenParams {
    GreenOnGreenParams {
      conf: self.conf,
      iou: self.iou,
      resolution: self.resolution,
      filter_id: self.filter_id,
    }
  }
}

/// 接受整数、数字字符串、`"null"`、空字符串或 `null`
fn deserialize_filter_id<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
  D: Deserializer<'de>,
{
  match Value::deserialize(deserializer)? {
    Value::Null => Ok(None),
    Value::Number(number) => number
      .as_u64()
      .and_then(|id| u32::try_from(id).ok())
      .map(Some)
      .ok_or_else(|| de::Error::custom(format!("无效的类别编号: {number}"))),
    Value::String(text) => match text.trim() {
      "" | "null" | "None" => Ok(None),
      id => id
        .parse::<u32>()
        .map(Some)
        .map_err(|_| de::Error::custom(format!("无效的类别编号: {id}"))),
    },
    other => Err(de::Error::custom(format!("无效的类别编号: {other}"))),
  }
}
