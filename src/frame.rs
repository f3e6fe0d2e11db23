// 该文件是 Muwen （木纹） 项目的一部分。
// src/frame.rs - 输入图像帧
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

use crate::{geometry::Dimensions, raster};

/// 未解码的原始图像及其来源名称
#[derive(Debug, Clone)]
pub struct SourceImage {
  name: String,
  bytes: Box<[u8]>,
}

impl SourceImage {
  pub fn new(name: impl Into<String>, bytes: impl Into<Box<[u8]>>) -> Self {
    Self {
      name: name.into(),
      bytes: bytes.into(),
    }
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn bytes(&self) -> &[u8] {
    &self.bytes
  }

  /// 只读取图像头部获得尺寸，不做完整解码
  pub fn dimensions(&self) -> Option<Dimensions> {
    raster::probe_dimensions(&self.bytes).ok()
  }
}

impl AsRef<[u8]> for SourceImage {
  fn as_ref(&self) -> &[u8] {
    &self.bytes
  }
}
