// 该文件是 Lvye （绿野） 项目的一部分。
// src/input/read_directory.rs - 图像目录输入
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
use tracing::{debug, error, info};
use url::Url;

use crate::{FromUrl, FromUrlWithScheme, frame::BgrFrame, input::read_frame, url_path};

const IMAGE_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

#[derive(Error, Debug)]
pub enum DirectoryInputError {
  #[error("URI 方案不匹配")]
  SchemeMismatch,
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
}

/// 按文件名顺序读取目录中的图像，`?loop` 时循环读取
pub struct DirectoryInput {
  files: Vec<PathBuf>,
  cursor: usize,
  looping: bool,
  // 本轮是否成功读出过帧，避免目录内全是坏文件时空转
  yielded: bool,
}

impl FromUrlWithScheme for DirectoryInput {
  const SCHEME: &'static str = "folder";
}

impl FromUrl for DirectoryInput {
  type Error = DirectoryInputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      return Err(DirectoryInputError::SchemeMismatch);
    }

    let directory = url_path(url);
    let mut files = Vec::new();
    for entry in std::fs::read_dir(&directory)? {
      let path = entry?.path();
      let is_image = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false);
      if path.is_file() && is_image {
        files.push(path);
      }
    }
    files.sort();

    let looping = url.query_pairs().any(|(k, _)| k == "loop");
    info!(
      "目录 {} 中共有 {} 张图像{}",
      directory.display(),
      files.len(),
      if looping { ", 循环读取" } else { "" }
    );

    Ok(DirectoryInput {
      files,
      cursor: 0,
      looping,
      yielded: false,
    })
  }
}

impl DirectoryInput {
  pub fn len(&self) -> usize {
    self.files.len()
  }

  pub fn is_empty(&self) -> bool {
    self.files.is_empty()
  }
}

impl Iterator for DirectoryInput {
  type Item = BgrFrame;

  fn next(&mut self) -> Option<Self::Item> {
    loop {
      if self.cursor >= self.files.len() {
        if !self.looping || !self.yielded {
          return None;
        }
        debug!("目录读取完毕, 重新开始");
        self.cursor = 0;
        self.yielded = false;
      }

      let path = &self.files[self.cursor];
      self.cursor += 1;
      match read_frame(path) {
        Ok(frame) => {
          self.yielded = true;
          return Some(frame);
        }
        Err(err) => error!("跳过无法读取的图像 {}: {}", path.display(), err),
      }
    }
  }
}
