// 该文件是 Muwen （木纹） 项目的一部分。
// src/output/save_json_file.rs - 保存推理结果 JSON
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
use tracing::info;
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  frame::SourceImage,
  model::{Inference, WithLabel},
  output::Render,
  url_path,
};

#[derive(Error, Debug)]
pub enum SaveJsonFileError {
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("JSON 序列化错误: {0}")]
  JsonError(#[from] serde_json::Error),
  #[error("URI 方案不匹配")]
  SchemeMismatch,
}

/// `json:///path/result.json`，只写推理结果，不处理图像
pub struct SaveJsonFileOutput {
  path: PathBuf,
}

impl FromUrlWithScheme for SaveJsonFileOutput {
  const SCHEME: &'static str = "json";
}

impl FromUrl for SaveJsonFileOutput {
  type Error = SaveJsonFileError;

  fn from_url(uri: &Url) -> Result<Self, Self::Error> {
    if uri.scheme() != Self::SCHEME {
      return Err(SaveJsonFileError::SchemeMismatch);
    }
    Ok(SaveJsonFileOutput { path: url_path(uri) })
  }
}

impl<T: WithLabel> Render<SourceImage, Inference<T>> for SaveJsonFileOutput {
  type Error = SaveJsonFileError;

  fn render_result(&self, frame: &SourceImage, result: &Inference<T>) -> Result<(), Self::Error> {
    if let Some(parent) = self.path.parent()
      && !parent.as_os_str().is_empty()
    {
      std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&self.path, serde_json::to_string_pretty(result)?)?;
    info!("{} 的推理结果已写入 {}", frame.name(), self.path.display());
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    FromUrl,
    geometry::{BoxShape, Shape},
    model::{DefectLabel, Model, ReplayModel},
    upload::UploadPayload,
  };

  #[test]
  fn written_json_reads_back() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out").join("result.json");
    let url = Url::from_file_path(&path).unwrap();
    let url = Url::parse(&format!("json://{}", url.path())).unwrap();

    let source = r#"{
      "inference_id": "abc",
      "time": 0.5,
      "image": {"width": 100, "height": 50},
      "predictions": [
        {"x": 10, "y": 10, "width": 4, "height": 4, "confidence": 0.9, "class": "board_knot"}
      ]
    }"#;
    let inference = Inference::<DefectLabel>::from_json(source).unwrap();

    let output = SaveJsonFileOutput::from_url(&url).unwrap();
    output
      .render_result(&SourceImage::new("board.jpg", Vec::new()), &inference)
      .unwrap();

    let written = std::fs::read_to_string(&path).unwrap();
    let value: serde_json::Value = serde_json::from_str(&written).unwrap();
    assert_eq!(value["inference_id"], "abc");
    assert_eq!(value["predictions"][0]["class"], "board_knot");
    assert_eq!(value["predictions"][0]["x"], 10.0);

    // 写出的文件可以直接作为回放输入
    let replay = Url::parse(&format!("replay://{}", Url::from_file_path(&path).unwrap().path())).unwrap();
    let model: ReplayModel<DefectLabel> = ReplayModel::from_url(&replay).unwrap();
    let replayed = model
      .infer(&UploadPayload::Base64(String::new()))
      .unwrap();
    assert_eq!(replayed.inference_id, "abc");
    assert_eq!(replayed.predictions.len(), 1);
    assert_eq!(replayed.predictions[0].kind, DefectLabel::Knot);
    assert_eq!(
      replayed.predictions[0].shape,
      Shape::Box(BoxShape::new(10.0, 10.0, 4.0, 4.0))
    );
  }
}
