// 该文件是 Muwen （木纹） 项目的一部分。
// src/upload.rs - 推理服务上传负载
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

use base64::{Engine, engine::general_purpose::STANDARD};
use tracing::info;
use url::Url;

use crate::{
  FromUrl,
  frame::SourceImage,
  input::{InputError, InputWrapper},
  normalize::normalize,
};

/// 待上传的图像：本地字节或外部托管的 URL
#[derive(Debug, Clone)]
pub enum UploadSource {
  Image(SourceImage),
  Remote(Url),
}

impl FromUrl for UploadSource {
  type Error = InputError;

  /// `http(s)://` 原样透传，其余方案按输入源读取第一张图像
  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if matches!(url.scheme(), "http" | "https") {
      return Ok(UploadSource::Remote(url.clone()));
    }
    InputWrapper::from_url(url)?
      .next()
      .map(UploadSource::Image)
      .ok_or(InputError::NoImage)
  }
}

/// 发往推理服务的负载
#[derive(Debug, Clone, PartialEq)]
pub enum UploadPayload {
  /// 归一化后的图像，base64 编码
  Base64(String),
  ImageUrl(Url),
}

impl UploadPayload {
  pub fn from_image(image: &SourceImage, max_dimension: u32) -> Self {
    let normalized = normalize(image.bytes(), max_dimension);
    info!(
      "上传图像 {}: {} 字节 -> {} 字节",
      image.name(),
      image.bytes().len(),
      normalized.len()
    );
    UploadPayload::Base64(STANDARD.encode(normalized.as_ref()))
  }

  pub fn prepare(source: &UploadSource, max_dimension: u32) -> Self {
    match source {
      UploadSource::Image(image) => Self::from_image(image, max_dimension),
      UploadSource::Remote(url) => UploadPayload::ImageUrl(url.clone()),
    }
  }

  pub fn kind(&self) -> &'static str {
    match self {
      UploadPayload::Base64(_) => "base64",
      UploadPayload::ImageUrl(_) => "image_url",
    }
  }

  /// 表单字段名与值：`file` 或 `image_url`
  pub fn form_field(&self) -> (&'static str, &str) {
    match self {
      UploadPayload::Base64(data) => ("file", data),
      UploadPayload::ImageUrl(url) => ("image_url", url.as_str()),
    }
  }

  pub fn decoded_bytes(&self) -> Option<Vec<u8>> {
    match self {
      UploadPayload::Base64(data) => STANDARD.decode(data).ok(),
      UploadPayload::ImageUrl(_) => None,
    }
  }
}
