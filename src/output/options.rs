// 该文件是 Muwen （木纹） 项目的一部分。
// src/output/options.rs - 渲染选项
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

use std::str::FromStr;

use tracing::warn;
use url::Url;

use crate::{
  crop::{crop, primary_subject},
  features::Features,
  frame::SourceImage,
  model::{Inference, WithLabel},
  output::draw::Draw,
  palette::color_for,
};

/// 一次标注所需的全部选项：绘制参数、启用的类别、是否按主体裁剪
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderOptions {
  draw: Draw,
  features: Features,
  crop: bool,
}

fn parse_or_warn<V: FromStr>(key: &str, value: &str) -> Option<V> {
  match value.parse() {
    Ok(parsed) => Some(parsed),
    Err(_) => {
      warn!("忽略无效的输出参数 {}={}", key, value);
      None
    }
  }
}

impl RenderOptions {
  /// 从 URL 查询参数读取：`classes`、`stroke`、`alpha`、`quality`、`crop`
  pub fn from_query(url: &Url) -> Self {
    let mut options = RenderOptions::default();
    for (key, value) in url.query_pairs() {
      match key.as_ref() {
        "classes" => options.features = Features::from_list(&value),
        "stroke" => {
          if let Some(width) = parse_or_warn::<f32>(&key, &value) {
            options.draw = options.draw.with_stroke_width(width);
          }
        }
        "alpha" => {
          if let Some(alpha) = parse_or_warn::<u8>(&key, &value) {
            options.draw = options.draw.with_fill_alpha(alpha);
          }
        }
        "quality" => {
          if let Some(quality) = parse_or_warn::<u8>(&key, &value) {
            options.draw = options.draw.with_quality(quality);
          }
        }
        "crop" => options.crop = !matches!(value.as_ref(), "0" | "false" | "no"),
        _ => {}
      }
    }
    options
  }

  pub fn with_draw(mut self, draw: Draw) -> Self {
    self.draw = draw;
    self
  }

  pub fn with_features(mut self, features: Features) -> Self {
    self.features = features;
    self
  }

  pub fn with_crop(mut self, crop: bool) -> Self {
    self.crop = crop;
    self
  }

  pub fn draw(&self) -> &Draw {
    &self.draw
  }

  pub fn features(&self) -> &Features {
    &self.features
  }

  pub fn crop(&self) -> bool {
    self.crop
  }

  /// 过滤、绘制，需要时再裁剪到主体。总是返回可用的图像数据。
  pub fn annotate<T: WithLabel>(&self, frame: &SourceImage, inference: &Inference<T>) -> Vec<u8> {
    let regions = self.features.select(inference);
    let annotated = self
      .draw
      .render(frame.bytes(), inference.image, regions, color_for::<T>);

    if !self.crop {
      return annotated;
    }
    match primary_subject(inference.predictions.iter()) {
      Some(subject) => crop(&annotated, inference.image, &subject).into_owned(),
      None => {
        warn!("{} 中没有板面区域，跳过裁剪", frame.name());
        annotated
      }
    }
  }
}
