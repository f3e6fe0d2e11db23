// 该文件是 Muwen （木纹） 项目的一部分。
// src/crop.rs - 按主体区域裁剪
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

use std::borrow::Cow;

use image::DynamicImage;
use tracing::{debug, warn};

use crate::{
  geometry::{BoxShape, Dimensions, PixelRect, Scale},
  model::{Region, WithLabel},
  raster,
};

pub const CROP_QUALITY: u8 = 90;

/// 主体框换算到实际栅格后的像素矩形，已裁剪到画布内
pub fn crop_rect(displayed: Dimensions, original: Dimensions, target: &BoxShape) -> Option<PixelRect> {
  if !target.is_finite() {
    return None;
  }
  let scale = Scale::between(original, displayed)?;
  target.to_draw_rect(scale).clip_to(displayed)
}

pub fn crop_image(image: &DynamicImage, original: Dimensions, target: &BoxShape) -> Option<DynamicImage> {
  let displayed = Dimensions::new(image.width(), image.height());
  let rect = crop_rect(displayed, original, target)?;
  Some(image.crop_imm(rect.x, rect.y, rect.width, rect.height))
}

/// 任何失败都返回原图，不打断调用方流程
pub fn crop<'a>(raw: &'a [u8], original: Dimensions, target: &BoxShape) -> Cow<'a, [u8]> {
  let image = match raster::decode(raw) {
    Ok(image) => image,
    Err(err) => {
      warn!("裁剪时图像解码失败，返回原图: {}", err);
      return Cow::Borrowed(raw);
    }
  };

  let Some(cropped) = crop_image(&image, original, target) else {
    warn!("主体框 {:?} 与图像没有交集，返回原图", target);
    return Cow::Borrowed(raw);
  };

  match raster::encode_jpeg(&cropped, CROP_QUALITY) {
    Ok(encoded) => {
      debug!("裁剪为 {}x{}", cropped.width(), cropped.height());
      Cow::Owned(encoded)
    }
    Err(err) => {
      warn!("裁剪结果编码失败，返回原图: {}", err);
      Cow::Borrowed(raw)
    }
  }
}

/// 调用方的主体选择策略：面积最大的板面区域
pub fn primary_subject<'a, T, I>(regions: I) -> Option<BoxShape>
where
  T: WithLabel + 'a,
  I: IntoIterator<Item = &'a Region<T>>,
{
  regions
    .into_iter()
    .filter(|region| region.kind.is_surface() && region.shape.is_finite())
    .filter_map(|region| region.shape.bounding_box())
    .max_by(|a, b| a.area().total_cmp(&b.area()))
}

#[cfg(test)]
mod tests {
  use image::{Rgb, RgbImage};

  use super::*;
  use crate::{
    geometry::{Point, Shape},
    model::{Confidence, DefectLabel},
  };

  fn jpeg(width: u32, height: u32) -> Vec<u8> {
    let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([30, 60, 90])));
    raster::encode_jpeg(&image, 90).unwrap()
  }

  #[test]
  fn crop_size_follows_scaled_box() {
    // 原图 1000x500，实际栅格 400x200，缩放 0.4
    let original = Dimensions::new(1000, 500);
    let displayed = Dimensions::new(400, 200);
    let boxes = [
      BoxShape::new(500.0, 250.0, 333.0, 127.0),
      BoxShape::new(200.0, 100.0, 101.0, 55.0),
      BoxShape::new(700.0, 300.0, 257.0, 199.0),
    ];
    for target in boxes {
      let rect = crop_rect(displayed, original, &target).unwrap();
      let expected_w = (target.width * 0.4).round();
      let expected_h = (target.height * 0.4).round();
      assert!((rect.width as f32 - expected_w).abs() <= 1.0, "{rect:?}");
      assert!((rect.height as f32 - expected_h).abs() <= 1.0, "{rect:?}");
    }
  }

  #[test]
  fn crop_clips_to_canvas() {
    let original = Dimensions::new(100, 100);
    let rect = crop_rect(original, original, &BoxShape::new(95.0, 50.0, 20.0, 20.0)).unwrap();
    assert_eq!(rect.x, 85);
    assert_eq!(rect.width, 15);
    assert_eq!(rect.height, 20);
  }

  #[test]
  fn crop_encodes_region() {
    let raw = jpeg(200, 100);
    let out = crop(&raw, Dimensions::new(400, 200), &BoxShape::new(200.0, 100.0, 100.0, 50.0));
    assert!(matches!(out, Cow::Owned(_)));
    assert_eq!(
      raster::probe_dimensions(&out).unwrap(),
      Dimensions::new(50, 25)
    );
  }

  #[test]
  fn crop_falls_back_to_original() {
    let garbage = b"garbage".to_vec();
    let target = BoxShape::new(1.0, 1.0, 1.0, 1.0);
    assert_eq!(crop(&garbage, Dimensions::new(2, 2), &target).as_ref(), garbage.as_slice());

    let raw = jpeg(20, 20);
    let outside = BoxShape::new(500.0, 500.0, 10.0, 10.0);
    assert!(matches!(crop(&raw, Dimensions::new(20, 20), &outside), Cow::Borrowed(_)));
    assert!(matches!(crop(&raw, Dimensions::new(0, 20), &target), Cow::Borrowed(_)));
  }

  #[test]
  fn primary_subject_is_largest_surface_region() {
    let make = |kind, shape| Region {
      kind,
      confidence: Confidence::from_raw(0.9),
      shape,
      class_id: None,
      detection_id: None,
    };
    let regions = vec![
      make(DefectLabel::Knot, Shape::Box(BoxShape::new(5.0, 5.0, 90.0, 90.0))),
      make(DefectLabel::Whitewood, Shape::Box(BoxShape::new(5.0, 5.0, 10.0, 10.0))),
      make(
        DefectLabel::Heartwood,
        Shape::polygon(vec![
          Point::new(0.0, 0.0),
          Point::new(40.0, 0.0),
          Point::new(40.0, 20.0),
        ]),
      ),
    ];
    assert_eq!(
      primary_subject(&regions),
      Some(BoxShape::new(20.0, 10.0, 40.0, 20.0))
    );
    assert_eq!(primary_subject(&regions[..1]), None);
  }
}
