// 该文件是 Muwen （木纹） 项目的一部分。
// src/model/wire.rs - 推理服务响应解析
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

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;
use tracing::warn;

use super::{Confidence, Inference, Region, WithLabel};
use crate::geometry::{BoxShape, Dimensions, Point, Shape};

#[derive(Error, Debug)]
pub enum IngestError {
  #[error("响应 JSON 解析错误: {0}")]
  Json(#[from] serde_json::Error),
  #[error("响应中缺少图像尺寸")]
  MissingDimensions,
}

// 推理服务直接返回 `image` + `predictions`，代理层返回 `original`/`cropped` + `defects`
#[derive(Deserialize, Debug)]
struct RawInference {
  #[serde(default, alias = "inferenceId")]
  inference_id: Option<String>,
  #[serde(default)]
  time: Option<f64>,
  #[serde(default)]
  image: Option<Dimensions>,
  #[serde(default)]
  original: Option<Dimensions>,
  #[serde(default)]
  cropped: Option<Dimensions>,
  #[serde(default, alias = "defects", deserialize_with = "each_prediction")]
  predictions: Option<Vec<RawPrediction>>,
}

// 逐条解析，格式错误的检测结果单独丢弃，不影响整个响应
fn each_prediction<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Vec<RawPrediction>>, D::Error> {
  let values: Option<Vec<serde_json::Value>> = Option::deserialize(deserializer)?;
  Ok(values.map(|values| {
    values
      .into_iter()
      .filter_map(|value| match serde_json::from_value::<RawPrediction>(value) {
        Ok(prediction) => Some(prediction),
        Err(err) => {
          warn!("丢弃格式错误的检测结果: {}", err);
          None
        }
      })
      .collect()
  }))
}

#[derive(Deserialize, Debug)]
struct RawPrediction {
  #[serde(default)]
  x: Option<f32>,
  #[serde(default)]
  y: Option<f32>,
  #[serde(default)]
  width: Option<f32>,
  #[serde(default)]
  height: Option<f32>,
  #[serde(default)]
  confidence: Option<f32>,
  class: String,
  #[serde(default)]
  points: Option<Vec<Point>>,
  #[serde(default)]
  class_id: Option<u32>,
  #[serde(default)]
  detection_id: Option<String>,
}

impl RawPrediction {
  fn resolve_shape(&mut self) -> Option<Shape> {
    match self.points.take() {
      Some(points) if !points.is_empty() => Some(Shape::polygon(points)),
      points => match (self.x, self.y, self.width, self.height) {
        (Some(x), Some(y), Some(width), Some(height)) => {
          Some(Shape::Box(BoxShape::new(x, y, width, height)))
        }
        // 空点列仍保留为多边形，由绘制阶段跳过
        _ => points.map(Shape::polygon),
      },
    }
  }

  fn into_region<T: WithLabel>(mut self) -> Option<Region<T>> {
    let Some(shape) = self.resolve_shape() else {
      warn!("丢弃既无点列也无矩形框的检测结果: {}", self.class);
      return None;
    };

    Some(Region {
      kind: T::from_label_str(&self.class),
      confidence: Confidence::from_raw(self.confidence.unwrap_or_default()),
      shape,
      class_id: self.class_id,
      detection_id: self.detection_id,
    })
  }
}

impl<T: WithLabel> TryFrom<RawInference> for Inference<T> {
  type Error = IngestError;

  fn try_from(raw: RawInference) -> Result<Self, Self::Error> {
    let image = raw
      .image
      .or(raw.cropped)
      .or(raw.original)
      .ok_or(IngestError::MissingDimensions)?;

    let predictions = raw
      .predictions
      .unwrap_or_default()
      .into_iter()
      .filter_map(RawPrediction::into_region)
      .collect();

    Ok(Inference {
      inference_id: raw.inference_id.unwrap_or_default(),
      time: raw.time.unwrap_or_default(),
      image,
      predictions,
    })
  }
}

// 写出时与推理服务响应同形：矩形框字段或 `points` 平铺在检测结果上
#[derive(Serialize)]
struct WireInference<'a> {
  inference_id: &'a str,
  time: f64,
  image: Dimensions,
  predictions: Vec<WirePrediction<'a>>,
}

#[derive(Serialize)]
struct WirePrediction<'a> {
  #[serde(flatten)]
  shape: WireShape<'a>,
  confidence: f32,
  class: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  class_id: Option<u32>,
  #[serde(skip_serializing_if = "Option::is_none")]
  detection_id: Option<&'a str>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum WireShape<'a> {
  Box { x: f32, y: f32, width: f32, height: f32 },
  Polygon { points: &'a [Point] },
}

impl<'a, T: WithLabel> From<&'a Region<T>> for WirePrediction<'a> {
  fn from(region: &'a Region<T>) -> Self {
    let shape = match &region.shape {
      Shape::Box(b) => WireShape::Box {
        x: b.x,
        y: b.y,
        width: b.width,
        height: b.height,
      },
      Shape::Polygon { points } => WireShape::Polygon { points },
    };
    WirePrediction {
      shape,
      confidence: region.confidence.fraction(),
      class: region.kind.to_label_str(),
      class_id: region.class_id,
      detection_id: region.detection_id.as_deref(),
    }
  }
}

impl<T: WithLabel> Serialize for Inference<T> {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    WireInference {
      inference_id: &self.inference_id,
      time: self.time,
      image: self.image,
      predictions: self.predictions.iter().map(WirePrediction::from).collect(),
    }
    .serialize(serializer)
  }
}

impl<T: WithLabel> Inference<T> {
  pub fn from_json(json: &str) -> Result<Self, IngestError> {
    let raw: RawInference = serde_json::from_str(json)?;
    Self::try_from(raw)
  }

  pub fn from_slice(bytes: &[u8]) -> Result<Self, IngestError> {
    let raw: RawInference = serde_json::from_slice(bytes)?;
    Self::try_from(raw)
  }
}
