// 该文件是 Muwen （木纹） 项目的一部分。
// src/input/read_image_file.rs - 图像文件输入
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

use std::{collections::VecDeque, path::PathBuf};

use thiserror::Error;
use tracing::{debug, error};
use url::Url;

use crate::{FromUrl, FromUrlWithScheme, frame::SourceImage, url_path};

#[derive(Error, Debug)]
pub enum ImageFileInputError {
  #[error("URI schema mismatch")]
  SchemaMismatch,
  #[error("I/O error: {0}")]
  IoError(#[from] std::io::Error),
  #[error("目录中没有图像文件: {0}")]
  EmptyDirectory(String),
}

const IMAGE_EXTENSIONS: [&str; 6] = ["jpg", "jpeg", "png", "bmp", "gif", "webp"];

fn is_image_file(path: &std::path::Path) -> bool {
  path.is_file()
    && path
      .extension()
      .and_then(|ext| ext.to_str())
      .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
      .unwrap_or(false)
}

/// `image:///path/board.jpg` 读取单张图像，`image:///path/dir` 按文件名顺序读取目录中的全部图像
pub struct ImageFileInput {
  pending: VecDeque<PathBuf>,
}

impl FromUrlWithScheme for ImageFileInput {
  const SCHEME: &'static str = "image";
}

impl FromUrl for ImageFileInput {
  type Error = ImageFileInputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      error!(
        "URI scheme mismatch: expected '{}', found '{}'",
        Self::SCHEME,
        url.scheme()
      );
      return Err(ImageFileInputError::SchemaMismatch);
    }

    let path = url_path(url);
    let metadata = std::fs::metadata(&path)?;

    let pending = if metadata.is_dir() {
      let mut files = std::fs::read_dir(&path)?
        .filter_map(|entry| entry.ok().map(|entry| entry.path()))
        .filter(|p| is_image_file(p))
        .collect::<Vec<_>>();
      files.sort();
      if files.is_empty() {
        return Err(ImageFileInputError::EmptyDirectory(path.display().to_string()));
      }
      debug!("目录 {} 中找到 {} 张图像", path.display(), files.len());
      files.into()
    } else {
      VecDeque::from([path])
    };

    Ok(ImageFileInput { pending })
  }
}

impl ImageFileInput {
  pub fn remaining(&self) -> usize {
    self.pending.len()
  }
}

impl Iterator for ImageFileInput {
  type Item = SourceImage;

  // 读取失败的文件记录错误后跳过
  fn next(&mut self) -> Option<Self::Item> {
    while let Some(path) = self.pending.pop_front() {
      match std::fs::read(&path) {
        Ok(bytes) => {
          let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
          return Some(SourceImage::new(name, bytes));
        }
        Err(err) => error!("读取图像文件 {} 失败: {}", path.display(), err),
      }
    }
    None
  }
}
