// 该文件是 Lvye （绿野） 项目的一部分。
// src/output/save_image_file.rs - 保存图像文件
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

use std::path::PathBuf;

use thiserror::Error;
use tracing::info;
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme, detection::DetectOutput, frame::BgrFrame, output::Render, url_path,
};

/// 把标注后的帧保存为单个图像文件，每帧覆盖一次
pub struct SaveImageFileOutput {
  path: PathBuf,
}

#[derive(Error, Debug)]
pub enum SaveImageFileError {
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("图像错误: {0}")]
  ImageError(#[from] image::ImageError),
  #[error("URI 方案不匹配: {0}")]
  SchemeMismatch(String),
}

impl FromUrlWithScheme for SaveImageFileOutput {
  const SCHEME: &'static str = "image";
}

impl FromUrl for SaveImageFileOutput {
  type Error = SaveImageFileError;

  fn from_url(uri: &Url) -> Result<Self, Self::Error> {
    if uri.scheme() != Self::SCHEME {
      return Err(SaveImageFileError::SchemeMismatch(format!(
        "期望保存方式 '{}', 实际保存方式 '{}'",
        Self::SCHEME,
        uri.scheme()
      )));
    }

    Ok(SaveImageFileOutput {
      path: url_path(uri),
    })
  }
}

impl SaveImageFileOutput {
  fn save_image(&self, frame: &BgrFrame) -> Result<(), SaveImageFileError> {
    if let Some(parent) = self.path.parent()
      && !parent.as_os_str().is_empty()
    {
      std::fs::create_dir_all(parent)?;
    }

    frame.to_rgb_image().save(&self.path)?;
    info!("保存图像到文件: {}", self.path.display());

    Ok(())
  }
}

impl Render<BgrFrame, DetectOutput> for SaveImageFileOutput {
  type Error = SaveImageFileError;

  fn render_result(&self, _frame: &BgrFrame, result: &DetectOutput) -> Result<(), Self::Error> {
    self.save_image(&result.image)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn annotated_frame_is_written() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("out.png");
    let url = Url::parse(&format!("image://{}", path.display())).unwrap();
    let output = SaveImageFileOutput::from_url(&url).unwrap();

    let raw = BgrFrame::new(6, 4);
    let mut annotated = raw.clone();
    annotated.set_bgr(1, 1, [0, 0, 255]);
    let mut result = DetectOutput::empty(annotated);
    result.contours = Some(Vec::new());

    output.render_result(&raw, &result).unwrap();
    let saved = image::open(&path).unwrap().to_rgb8();
    assert_eq!(saved.get_pixel(1, 1).0, [255, 0, 0]);
  }
}
