// 该文件是 Lvye （绿野） 项目的一部分。
// src/args.rs - 项目参数配置
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

use clap::Parser;
use url::Url;

use lvye::config::DEFAULT_PRESET;

/// Lvye 杂草检测参数配置
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// JSON 配置文件路径，优先于预设
  #[arg(long, value_name = "CONFIG")]
  pub config: Option<PathBuf>,

  /// 预设名称
  #[arg(long, value_name = "PRESET", default_value = DEFAULT_PRESET)]
  pub preset: String,

  /// 覆盖配置中的算法（exg、exgr、maxg、nexg、exhsv、hsv、gndvi、veg、cive 或 gog）
  #[arg(long, value_name = "ALGORITHM")]
  pub algorithm: Option<String>,

  /// 输入来源
  /// 支持格式:
  /// - 图片: image:///path/to/image.png
  /// - 目录: folder:///path/to/dir[?loop]
  #[arg(long, value_name = "SOURCE")]
  pub input: Url,

  /// 输出路径
  /// 支持格式:
  /// - 图片: image:///path/to/output.png
  /// - 目录: folder:///path/to/dir[?always]
  #[arg(long, value_name = "OUTPUT")]
  pub output: Url,

  /// 模型文件路径（仅 gog 算法使用）
  #[arg(long, value_name = "MODEL")]
  pub model: Option<PathBuf>,

  /// 运行平台
  #[arg(long, value_name = "PLATFORM", default_value = "desktop")]
  pub platform: String,

  /// 最大处理帧数
  #[arg(long, value_name = "FRAME_NUMBER")]
  pub frame_number: Option<usize>,

  /// 只处理第一帧
  #[arg(long)]
  pub oneshot: bool,
}
