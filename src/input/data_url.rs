// 该文件是 Muwen （木纹） 项目的一部分。
// src/input/data_url.rs - data: URL 输入
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
use thiserror::Error;
use url::Url;

use crate::{FromUrl, FromUrlWithScheme, frame::SourceImage};

#[derive(Error, Debug)]
pub enum DataUrlInputError {
  #[error("URI 方案不匹配")]
  SchemeMismatch,
  #[error("data URL 缺少 ',' 分隔符")]
  MissingSeparator,
  #[error("base64 解码错误: {0}")]
  Base64Error(#[from] base64::DecodeError),
}

/// `data:image/png;base64,....`，也接受百分号编码的负载
pub struct DataUrlInput {
  image: Option<SourceImage>,
}

impl FromUrlWithScheme for DataUrlInput {
  const SCHEME: &'static str = "data";
}

impl FromUrl for DataUrlInput {
  type Error = DataUrlInputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      return Err(DataUrlInputError::SchemeMismatch);
    }

    let body = &url.as_str()[Self::SCHEME.len() + 1..];
    let (header, payload) = body
      .split_once(',')
      .ok_or(DataUrlInputError::MissingSeparator)?;

    let bytes = if header.ends_with(";base64") {
      // base64 负载里可能混有空白或百分号转义
      let payload = urlencoding::decode_binary(payload.as_bytes());
      let cleaned: Vec<u8> = payload
        .iter()
        .copied()
        .filter(|b| !b.is_ascii_whitespace())
        .collect();
      STANDARD.decode(cleaned)?
    } else {
      urlencoding::decode_binary(payload.as_bytes()).into_owned()
    };

    let mime = header.split(';').next().filter(|m| !m.is_empty()).unwrap_or("text/plain");
    Ok(DataUrlInput {
      image: Some(SourceImage::new(format!("data-url ({mime})"), bytes)),
    })
  }
}

impl Iterator for DataUrlInput {
  type Item = SourceImage;

  fn next(&mut self) -> Option<Self::Item> {
    self.image.take()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn decodes_base64_payload() {
    let encoded = STANDARD.encode(b"\x89PNG fake");
    let url = Url::parse(&format!("data:image/png;base64,{encoded}")).unwrap();
    let mut input = DataUrlInput::from_url(&url).unwrap();
    let frame = input.next().unwrap();
    assert_eq!(frame.bytes(), b"\x89PNG fake");
    assert_eq!(frame.name(), "data-url (image/png)");
    assert!(input.next().is_none());
  }

  #[test]
  fn decodes_percent_encoded_payload() {
    let url = Url::parse("data:text/plain,hello%20wood").unwrap();
    let frame = DataUrlInput::from_url(&url).unwrap().next().unwrap();
    assert_eq!(frame.bytes(), b"hello wood");
  }

  #[test]
  fn rejects_broken_payloads() {
    let url = Url::parse("data:image/png;base64").unwrap();
    assert!(matches!(
      DataUrlInput::from_url(&url),
      Err(DataUrlInputError::MissingSeparator)
    ));

    let url = Url::parse("data:image/png;base64,@@@@").unwrap();
    assert!(matches!(
      DataUrlInput::from_url(&url),
      Err(DataUrlInputError::Base64Error(_))
    ));
  }
}
