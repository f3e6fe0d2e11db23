// 该文件是 Muwen （木纹） 项目的一部分。
// src/normalize.rs - 上传前的图像尺寸归一化
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

//! 长边超过上限的图像按比例缩小并重新编码为 JPEG；已在上限内的图像原样返回。

use std::borrow::Cow;

use image::{DynamicImage, imageops::FilterType};
use tracing::{debug, warn};

use crate::{geometry::Dimensions, raster};

pub const DEFAULT_MAX_DIMENSION: u32 = 1024;
pub const NORMALIZE_QUALITY: u8 = 90;

/// 缩放后的尺寸：长边等于 `max_dimension`，短边四舍五入。已在范围内时返回 None（不放大）。
pub fn target_dimensions(source: Dimensions, max_dimension: u32) -> Option<Dimensions> {
  if max_dimension == 0 || source.is_empty() || source.fits_within(max_dimension) {
    return None;
  }

  let scaled = |short: u32, long: u32| -> u32 {
    let value = (short as f64 * max_dimension as f64 / long as f64).round() as u32;
    value.max(1)
  };

  Some(if source.width > source.height {
    Dimensions::new(max_dimension, scaled(source.height, source.width))
  } else {
    Dimensions::new(scaled(source.width, source.height), max_dimension)
  })
}

/// 已解码图像的归一化，范围内返回 None
pub fn normalize_image(image: &DynamicImage, max_dimension: u32) -> Option<DynamicImage> {
  let source = Dimensions::new(image.width(), image.height());
  let target = target_dimensions(source, max_dimension)?;
  Some(image.resize_exact(target.width, target.height, FilterType::Triangle))
}

pub fn normalize(raw: &[u8], max_dimension: u32) -> Cow<'_, [u8]> {
  if max_dimension == 0 {
    warn!("最大边长为 0，跳过归一化");
    return Cow::Borrowed(raw);
  }

  // 先只读头部，范围内的图像不必完整解码
  let source = match raster::probe_dimensions(raw) {
    Ok(source) => source,
    Err(err) => {
      warn!("无法读取图像尺寸，按原样上传: {}", err);
      return Cow::Borrowed(raw);
    }
  };

  if target_dimensions(source, max_dimension).is_none() {
    debug!("图像 {} 未超过 {}，保持原样", source, max_dimension);
    return Cow::Borrowed(raw);
  }

  let image = match raster::decode(raw) {
    Ok(image) => image,
    Err(err) => {
      warn!("图像解码失败，按原样上传: {}", err);
      return Cow::Borrowed(raw);
    }
  };

  let Some(resized) = normalize_image(&image, max_dimension) else {
    return Cow::Borrowed(raw);
  };

  match raster::encode_jpeg(&resized, NORMALIZE_QUALITY) {
    Ok(encoded) => {
      debug!(
        "图像 {} 缩放为 {}x{}",
        source,
        resized.width(),
        resized.height()
      );
      Cow::Owned(encoded)
    }
    Err(err) => {
      warn!("图像编码失败，按原样上传: {}", err);
      Cow::Borrowed(raw)
    }
  }
}

#[cfg(test)]
mod tests {
  use image::{ImageFormat, Rgb, RgbImage};

  use super::*;

  fn png(width: u32, height: u32) -> Vec<u8> {
    let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([200, 150, 90])));
    let mut buffer = std::io::Cursor::new(Vec::new());
    image.write_to(&mut buffer, ImageFormat::Png).unwrap();
    buffer.into_inner()
  }

  #[test]
  fn target_dimensions_caps_longest_side() {
    assert_eq!(
      target_dimensions(Dimensions::new(2000, 1000), 1024),
      Some(Dimensions::new(1024, 512))
    );
    assert_eq!(
      target_dimensions(Dimensions::new(1000, 3000), 1024),
      Some(Dimensions::new(341, 1024))
    );
    assert_eq!(
      target_dimensions(Dimensions::new(1500, 1500), 1024),
      Some(Dimensions::new(1024, 1024))
    );
  }

  #[test]
  fn target_dimensions_never_upscales() {
    assert_eq!(target_dimensions(Dimensions::new(1024, 1024), 1024), None);
    assert_eq!(target_dimensions(Dimensions::new(300, 200), 1024), None);
  }

  #[test]
  fn tiny_short_side_stays_visible() {
    assert_eq!(
      target_dimensions(Dimensions::new(5000, 1), 1024),
      Some(Dimensions::new(1024, 1))
    );
  }

  #[test]
  fn normalize_resizes_large_image() {
    let raw = png(2000, 1000);
    let out = normalize(&raw, 1024);
    assert!(matches!(out, Cow::Owned(_)));
    assert_eq!(
      raster::probe_dimensions(&out).unwrap(),
      Dimensions::new(1024, 512)
    );
  }

  #[test]
  fn normalize_is_idempotent() {
    let raw = png(2000, 1000);
    let once = normalize(&raw, 1024).into_owned();
    let twice = normalize(&once, 1024);
    assert!(matches!(twice, Cow::Borrowed(_)));
    assert_eq!(twice.as_ref(), once.as_slice());
  }

  #[test]
  fn normalize_keeps_small_image_bytes() {
    let raw = png(64, 32);
    let out = normalize(&raw, 1024);
    assert!(matches!(out, Cow::Borrowed(_)));
    assert_eq!(out.as_ref(), raw.as_slice());
  }

  #[test]
  fn normalize_falls_back_on_garbage() {
    let raw = b"not an image at all".to_vec();
    assert_eq!(normalize(&raw, 16).as_ref(), raw.as_slice());
  }
}
