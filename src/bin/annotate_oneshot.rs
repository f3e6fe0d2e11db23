// 该文件是 Muwen （木纹） 项目的一部分。
// src/bin/annotate_oneshot.rs - 单张图像标注
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

use anyhow::Result;
use clap::Parser;
use url::Url;

use muwen::{
  FromUrl,
  model::{DefectLabel, ReplayModel},
  normalize::DEFAULT_MAX_DIMENSION,
  task::{OneShotTask, Task},
};
use tracing::info;

/// Muwen 单张标注参数配置
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// 输入来源（image:// 或 data:）
  #[arg(long, value_name = "SOURCE")]
  pub input: Url,
  /// 推理结果来源（replay:///response.json）
  #[arg(long, value_name = "INFERENCE")]
  pub inference: Url,
  /// 输出路径（image://、folder:// 或 json://）
  #[arg(long, value_name = "OUTPUT")]
  pub output: Url,
  /// 上传前图像的最长边
  #[arg(long, value_name = "PIXELS", default_value_t = DEFAULT_MAX_DIMENSION)]
  pub max_dimension: u32,
}

fn main() -> Result<()> {
  tracing_subscriber::fmt::init();

  let args = Args::parse();

  info!("输入来源: {}", args.input);
  info!("推理结果来源: {}", args.inference);
  info!("输出路径: {}", args.output);

  let input = muwen::input::InputWrapper::from_url(&args.input)?;
  let model: ReplayModel<DefectLabel> = ReplayModel::from_url(&args.inference)?;
  let output = muwen::output::OutputWrapper::from_url(&args.output)?;

  OneShotTask::default()
    .with_max_dimension(args.max_dimension)
    .run_task(input, model, output)?;

  Ok(())
}
