// 该文件是 Lvye （绿野） 项目的一部分。
// src/main.rs - 项目主程序
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

mod args;

use anyhow::Result;
use clap::Parser;
use tracing::info;

use lvye::{
  FromUrl,
  config::DetectorConfig,
  detection::WeedDetector,
  input::InputWrapper,
  output::OutputWrapper,
  task::{ContinuousTask, OneShotTask, Task},
};

fn build_detector(args: &args::Args, config: &DetectorConfig) -> Result<WeedDetector> {
  if !config.is_green_on_green() {
    return Ok(WeedDetector::green_on_brown(config));
  }

  let model = args
    .model
    .as_ref()
    .ok_or_else(|| anyhow::anyhow!("gog 算法需要通过 --model 指定模型文件"))?;

  #[cfg(feature = "model_onnx")]
  {
    let detector = WeedDetector::green_on_green::<lvye::model::YoloOnnx>(model, &args.platform)?;
    Ok(detector)
  }
  #[cfg(not(feature = "model_onnx"))]
  {
    anyhow::bail!(
      "未启用模型推理后端, 无法加载 {} (需要 model_onnx 特性)",
      model.display()
    )
  }
}

fn main() -> Result<()> {
  tracing_subscriber::fmt::init();

  let args = args::Args::parse();

  let mut config = match &args.config {
    Some(path) => DetectorConfig::from_json_file(path)?,
    None => DetectorConfig::preset(&args.preset),
  };
  if let Some(algorithm) = &args.algorithm {
    config.algorithm = algorithm.clone();
  }

  info!("检测算法: {}", config.algorithm);
  info!("输入来源: {}", args.input);
  info!("输出路径: {}", args.output);

  let detector = build_detector(&args, &config)?;
  let input = InputWrapper::from_url(&args.input)?.into_frames(config.resolution);
  let output = OutputWrapper::from_url(&args.output)?;
  let detector = detector.with_config(config);

  if args.oneshot {
    OneShotTask.run_task(input, detector, output)?;
  } else {
    ContinuousTask::default()
      .with_frame_number(args.frame_number)
      .run_task(input, detector, output)?;
  }

  Ok(())
}
