// 该文件是 Muwen （木纹） 项目的一部分。
// src/model/replay.rs - 回放已记录的推理响应
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

use std::{marker::PhantomData, path::PathBuf};

use thiserror::Error;
use tracing::{debug, error};
use url::Url;

use super::{DefectLabel, Inference, IngestError, Model, WithLabel};
use crate::{FromUrl, FromUrlWithScheme, upload::UploadPayload, url_path};

#[derive(Error, Debug)]
pub enum ReplayModelError {
  #[error("URI 方案不匹配: {0}")]
  SchemeMismatch(String),
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("推理响应错误: {0}")]
  IngestError(#[from] IngestError),
}

/// 从 JSON 文件读取推理服务的响应，代替真实的远程调用。
///
/// `replay:///path/to/response.json`
pub struct ReplayModel<T = DefectLabel> {
  path: PathBuf,
  _label: PhantomData<T>,
}

impl<T> ReplayModel<T> {
  pub fn new(path: impl Into<PathBuf>) -> Self {
    Self {
      path: path.into(),
      _label: PhantomData,
    }
  }
}

impl<T> FromUrlWithScheme for ReplayModel<T> {
  const SCHEME: &'static str = "replay";
}

impl<T> FromUrl for ReplayModel<T> {
  type Error = ReplayModelError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      error!(
        "URI scheme mismatch: expected '{}', found '{}'",
        Self::SCHEME,
        url.scheme()
      );
      return Err(ReplayModelError::SchemeMismatch(url.scheme().to_string()));
    }

    let path = url_path(url);
    std::fs::metadata(&path)?;
    Ok(Self::new(path))
  }
}

impl<T: WithLabel> Model for ReplayModel<T> {
  type Input = UploadPayload;
  type Output = Inference<T>;
  type Error = ReplayModelError;

  fn infer(&self, input: &UploadPayload) -> Result<Self::Output, Self::Error> {
    debug!("回放推理响应 {} ({})", self.path.display(), input.kind());
    let bytes = std::fs::read(&self.path)?;
    Ok(Inference::from_slice(&bytes)?)
  }
}
