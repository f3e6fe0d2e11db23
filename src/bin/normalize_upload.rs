// 该文件是 Muwen （木纹） 项目的一部分。
// src/bin/normalize_upload.rs - 生成上传负载
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

use anyhow::Result;
use clap::Parser;
use url::Url;

use muwen::{
  FromUrl,
  normalize::DEFAULT_MAX_DIMENSION,
  upload::{UploadPayload, UploadSource},
};
use tracing::info;

/// 归一化图像并输出推理服务的表单字段
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// 图像来源（image://、data: 或 http(s)://）
  #[arg(long, value_name = "SOURCE")]
  pub input: Url,
  /// 上传前图像的最长边
  #[arg(long, value_name = "PIXELS", default_value_t = DEFAULT_MAX_DIMENSION)]
  pub max_dimension: u32,
  /// 写入字段值的文件，缺省时打印到标准输出
  #[arg(long, value_name = "PATH")]
  pub output: Option<PathBuf>,
}

fn main() -> Result<()> {
  tracing_subscriber::fmt::init();

  let args = Args::parse();

  info!("输入来源: {}", args.input);

  let source = UploadSource::from_url(&args.input)?;
  let payload = UploadPayload::prepare(&source, args.max_dimension);
  let (field, value) = payload.form_field();
  info!("负载类型: {}，表单字段: {}", payload.kind(), field);

  match args.output {
    Some(path) => {
      std::fs::write(&path, value)?;
      info!("已写入 {}", path.display());
    }
    None => println!("{field}={value}"),
  }

  Ok(())
}
