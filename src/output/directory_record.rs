// 该文件是 Muwen （木纹） 项目的一部分。
// src/output/directory_record.rs - 目录记录输出
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

use std::{
  path::{Path, PathBuf},
  sync::{Arc, Mutex},
};

use chrono::{Datelike, Local};
use thiserror::Error;
use tracing::{debug, info};

use crate::{
  FromUrl, FromUrlWithScheme,
  frame::SourceImage,
  model::{Inference, Region, WithLabel},
  output::{Render, RenderOptions},
  url_path,
};

#[derive(Error, Debug)]
pub enum DirectoryRecordOutputError {
  #[error("URI 方案不匹配")]
  SchemeMismatch,
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
}

/// 写入标注图，或保存原图并附带文本记录
#[derive(Debug, Clone, PartialEq)]
pub enum RecordMode {
  Draw(RenderOptions),
  Record { label_with_name: bool },
}

impl RecordMode {
  /// `label, confidence, x, y, width, height`，坐标为中心锚定的外接框
  fn record_line<T: WithLabel>(label_with_name: bool, region: &Region<T>) -> Option<String> {
    let bbox = region.shape.bounding_box()?;
    let name = if label_with_name {
      region.kind.to_label_str()
    } else {
      region
        .class_id
        .map(|id| id.to_string())
        .unwrap_or_else(|| "-".to_string())
    };
    Some(format!(
      "{}, {:.4}, {:.4}, {:.4}, {:.4}, {:.4}",
      name,
      region.confidence.fraction(),
      bbox.x,
      bbox.y,
      bbox.width,
      bbox.height
    ))
  }

  fn save_result<T: WithLabel>(
    &self,
    path: &Path,
    frame: &SourceImage,
    result: &Inference<T>,
  ) -> Result<(), DirectoryRecordOutputError> {
    match self {
      RecordMode::Draw(options) => {
        std::fs::write(path, options.annotate(frame, result))?;
      }
      RecordMode::Record { label_with_name } => {
        std::fs::write(path, frame.bytes())?;
        let records: Vec<String> = result
          .predictions
          .iter()
          .filter_map(|region| Self::record_line(*label_with_name, region))
          .collect();
        std::fs::write(path.with_extension("txt"), records.join("\n"))?;
      }
    }
    Ok(())
  }
}

/// `folder:///dir?record=name|id&always`，按日期分目录逐张保存
pub struct DirectoryRecordOutput {
  directory: PathBuf,
  mode: RecordMode,
  frame_counter: Arc<Mutex<u16>>,
  always: bool,
}

impl FromUrlWithScheme for DirectoryRecordOutput {
  const SCHEME: &'static str = "folder";
}

impl FromUrl for DirectoryRecordOutput {
  type Error = DirectoryRecordOutputError;

  fn from_url(uri: &url::Url) -> Result<Self, Self::Error> {
    if uri.scheme() != Self::SCHEME {
      return Err(DirectoryRecordOutputError::SchemeMismatch);
    }

    let mode = uri
      .query_pairs()
      .find(|(k, _)| k == "record")
      .map(|(_, v)| RecordMode::Record {
        label_with_name: v != "id",
      })
      .unwrap_or_else(|| RecordMode::Draw(RenderOptions::from_query(uri)));

    let always = uri.query_pairs().any(|(k, _)| k == "always");

    Ok(DirectoryRecordOutput {
      directory: url_path(uri),
      mode,
      frame_counter: Arc::new(Mutex::new(0)),
      always,
    })
  }
}

impl DirectoryRecordOutput {
  pub fn new(directory: impl Into<PathBuf>, mode: RecordMode, always: bool) -> Self {
    Self {
      directory: directory.into(),
      mode,
      frame_counter: Arc::new(Mutex::new(0)),
      always,
    }
  }

  pub fn mode(&self) -> &RecordMode {
    &self.mode
  }

  fn frame_id(&self) -> u16 {
    let mut counter = self
      .frame_counter
      .lock()
      .unwrap_or_else(|poisoned| poisoned.into_inner());
    *counter = counter.wrapping_add(1);
    *counter
  }

  fn frame_path(&self) -> Result<PathBuf, DirectoryRecordOutputError> {
    let now = Local::now();
    let directory = self
      .directory
      .join(now.year().to_string())
      .join(format!("{:02}", now.month()))
      .join(format!("{:02}", now.day()));
    std::fs::create_dir_all(&directory)?;

    Ok(directory.join(format!(
      "{}-{:04X}.jpg",
      now.format("%H-%M-%S"),
      self.frame_id()
    )))
  }
}

impl<T: WithLabel> Render<SourceImage, Inference<T>> for DirectoryRecordOutput {
  type Error = DirectoryRecordOutputError;

  fn render_result(&self, frame: &SourceImage, result: &Inference<T>) -> Result<(), Self::Error> {
    if !self.always && result.is_empty() {
      debug!("{} 没有检测结果，不保存", frame.name());
      return Ok(());
    }
    let path = self.frame_path()?;
    self.mode.save_result(&path, frame, result)?;
    info!("{} 已保存到 {}", frame.name(), path.display());
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use image::{DynamicImage, Rgb, RgbImage};

  use super::*;
  use crate::{
    geometry::{BoxShape, Dimensions, Point, Shape},
    model::{Confidence, DefectLabel},
    raster,
  };

  fn frame() -> SourceImage {
    let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(40, 30, Rgb([120, 100, 80])));
    SourceImage::new("board.jpg", raster::encode_jpeg(&image, 90).unwrap())
  }

  fn inference(predictions: Vec<Region<DefectLabel>>) -> Inference<DefectLabel> {
    Inference {
      inference_id: "dir".to_string(),
      time: 0.0,
      image: Dimensions::new(40, 30),
      predictions: predictions.into(),
    }
  }

  fn saved_files(root: &Path, extension: &str) -> Vec<PathBuf> {
    let mut found = Vec::new();
    let mut stack = vec![root.to_path_buf()];
    while let Some(dir) = stack.pop() {
      for entry in std::fs::read_dir(dir).unwrap() {
        let path = entry.unwrap().path();
        if path.is_dir() {
          stack.push(path);
        } else if path.extension().is_some_and(|ext| ext == extension) {
          found.push(path);
        }
      }
    }
    found.sort();
    found
  }

  #[test]
  fn parses_record_mode() {
    let url = url::Url::parse("folder:///tmp/records?record=id&always").unwrap();
    let output = DirectoryRecordOutput::from_url(&url).unwrap();
    assert_eq!(output.mode(), &RecordMode::Record { label_with_name: false });
    assert!(output.always);

    let url = url::Url::parse("folder:///tmp/records?crop").unwrap();
    let output = DirectoryRecordOutput::from_url(&url).unwrap();
    assert!(matches!(output.mode(), RecordMode::Draw(options) if options.crop()));
    assert!(!output.always);
  }

  #[test]
  fn empty_results_are_skipped_unless_always() {
    let dir = tempfile::tempdir().unwrap();
    let output = DirectoryRecordOutput::new(dir.path(), RecordMode::Draw(RenderOptions::default()), false);
    output.render_result(&frame(), &inference(vec![])).unwrap();
    assert!(saved_files(dir.path(), "jpg").is_empty());

    let output = DirectoryRecordOutput::new(dir.path(), RecordMode::Draw(RenderOptions::default()), true);
    output.render_result(&frame(), &inference(vec![])).unwrap();
    output.render_result(&frame(), &inference(vec![])).unwrap();
    assert_eq!(saved_files(dir.path(), "jpg").len(), 2);
  }

  #[test]
  fn record_mode_writes_raw_image_and_text() {
    let dir = tempfile::tempdir().unwrap();
    let output = DirectoryRecordOutput::new(dir.path(), RecordMode::Record { label_with_name: true }, false);
    let source = frame();
    let result = inference(vec![
      Region {
        kind: DefectLabel::Knot,
        confidence: Confidence::from_raw(0.5),
        shape: Shape::Box(BoxShape::new(10.0, 10.0, 4.0, 6.0)),
        class_id: Some(4),
        detection_id: None,
      },
      Region {
        kind: DefectLabel::Rot,
        confidence: Confidence::from_raw(0.25),
        shape: Shape::polygon(vec![Point::new(0.0, 0.0), Point::new(4.0, 0.0), Point::new(4.0, 2.0)]),
        class_id: None,
        detection_id: None,
      },
    ]);
    output.render_result(&source, &result).unwrap();

    let images = saved_files(dir.path(), "jpg");
    assert_eq!(images.len(), 1);
    assert_eq!(std::fs::read(&images[0]).unwrap(), source.bytes());

    let text = std::fs::read_to_string(images[0].with_extension("txt")).unwrap();
    assert_eq!(
      text,
      "board_knot, 0.5000, 10.0000, 10.0000, 4.0000, 6.0000\n\
       board_rot, 0.2500, 2.0000, 1.0000, 4.0000, 2.0000"
    );
  }
}
