// 该文件是 Muwen （木纹） 项目的一部分。
// src/raster.rs - 栅格解码、编码与绘制能力
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

use std::io::Cursor;

use image::{DynamicImage, ImageReader, Pixel, Rgba, RgbaImage, codecs::jpeg::JpegEncoder};
use imageproc::{
  drawing::{
    Canvas, draw_filled_circle_mut, draw_filled_rect_mut, draw_line_segment_mut, draw_polygon_mut,
  },
  point::Point as PixelPoint,
  rect::Rect,
};
use thiserror::Error;

use crate::geometry::{Dimensions, DrawRect, Point};

#[derive(Error, Debug)]
pub enum RasterError {
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("图像解码错误: {0}")]
  DecodeError(image::ImageError),
  #[error("图像编码错误: {0}")]
  EncodeError(image::ImageError),
}

pub fn probe_dimensions(bytes: &[u8]) -> Result<Dimensions, RasterError> {
  let (width, height) = ImageReader::new(Cursor::new(bytes))
    .with_guessed_format()?
    .into_dimensions()
    .map_err(RasterError::DecodeError)?;
  Ok(Dimensions::new(width, height))
}

pub fn decode(bytes: &[u8]) -> Result<DynamicImage, RasterError> {
  image::load_from_memory(bytes).map_err(RasterError::DecodeError)
}

/// JPEG 不带透明通道，编码前统一转为 RGB
pub fn encode_jpeg(image: &DynamicImage, quality: u8) -> Result<Vec<u8>, RasterError> {
  let rgb = image.to_rgb8();
  let mut buffer = Vec::new();
  JpegEncoder::new_with_quality(&mut buffer, quality.clamp(1, 100))
    .encode_image(&rgb)
    .map_err(RasterError::EncodeError)?;
  Ok(buffer)
}

/// 绘制能力：渲染器只依赖这几个操作
pub trait DrawSurface {
  fn dimensions(&self) -> Dimensions;

  /// 填充闭合多边形（末点隐式连回首点），颜色的 alpha 参与混合
  fn fill_polygon(&mut self, points: &[Point], color: Rgba<u8>);

  fn fill_rect(&mut self, rect: DrawRect, color: Rgba<u8>);

  /// 以给定线宽描绘闭合路径
  fn stroke_path(&mut self, points: &[Point], width: f32, color: Rgba<u8>);
}

// 按 alpha 混合写入像素
struct BlendCanvas<'a>(&'a mut RgbaImage);

impl Canvas for BlendCanvas<'_> {
  type Pixel = Rgba<u8>;

  fn dimensions(&self) -> (u32, u32) {
    self.0.dimensions()
  }

  fn get_pixel(&self, x: u32, y: u32) -> Self::Pixel {
    *self.0.get_pixel(x, y)
  }

  fn draw_pixel(&mut self, x: u32, y: u32, color: Self::Pixel) {
    self.0.get_pixel_mut(x, y).blend(&color);
  }
}

/// 描边线宽上限（像素）
pub const MAX_STROKE_WIDTH: f32 = 64.0;

fn to_pixel(x: f32, y: f32) -> PixelPoint<i32> {
  PixelPoint::new(x.round() as i32, y.round() as i32)
}

/// 取整到像素后互不相同的点数
pub fn distinct_pixels(points: &[Point]) -> usize {
  let mut pixels: Vec<(i32, i32)> = points
    .iter()
    .map(|p| {
      let q = to_pixel(p.x, p.y);
      (q.x, q.y)
    })
    .collect();
  pixels.sort_unstable();
  pixels.dedup();
  pixels.len()
}

// 取整后去掉相邻重复点和与首点重合的末点，draw_polygon_mut 不接受首尾相同
fn to_pixel_polygon(points: &[Point]) -> Vec<PixelPoint<i32>> {
  let mut polygon: Vec<PixelPoint<i32>> = Vec::with_capacity(points.len());
  for p in points {
    let q = to_pixel(p.x, p.y);
    if polygon.last() != Some(&q) {
      polygon.push(q);
    }
  }
  while polygon.len() > 1 && polygon.first() == polygon.last() {
    polygon.pop();
  }
  polygon
}

fn stroke_segment(canvas: &mut BlendCanvas<'_>, a: Point, b: Point, half: f32, color: Rgba<u8>) {
  let (dx, dy) = (b.x - a.x, b.y - a.y);
  let length = (dx * dx + dy * dy).sqrt();
  if length < f32::EPSILON {
    return;
  }

  if half < 0.75 {
    draw_line_segment_mut(canvas, (a.x, a.y), (b.x, b.y), color);
    return;
  }

  // 线段两侧各外扩 half 得到四边形
  let (nx, ny) = (-dy / length * half, dx / length * half);
  let quad = [
    to_pixel(a.x + nx, a.y + ny),
    to_pixel(b.x + nx, b.y + ny),
    to_pixel(b.x - nx, b.y - ny),
    to_pixel(a.x - nx, a.y - ny),
  ];
  draw_polygon_mut(canvas, &quad, color);
}

impl DrawSurface for RgbaImage {
  fn dimensions(&self) -> Dimensions {
    Dimensions::new(self.width(), self.height())
  }

  fn fill_polygon(&mut self, points: &[Point], color: Rgba<u8>) {
    let polygon = to_pixel_polygon(points);
    if polygon.len() < 3 {
      return;
    }
    draw_polygon_mut(&mut BlendCanvas(self), &polygon, color);
  }

  fn fill_rect(&mut self, rect: DrawRect, color: Rgba<u8>) {
    let Some(clipped) = rect.clip_to(DrawSurface::dimensions(self)) else {
      return;
    };
    let rect = Rect::at(clipped.x as i32, clipped.y as i32).of_size(clipped.width, clipped.height);
    draw_filled_rect_mut(&mut BlendCanvas(self), rect, color);
  }

  fn stroke_path(&mut self, points: &[Point], width: f32, color: Rgba<u8>) {
    if points.len() < 2 || !width.is_finite() || width <= 0.0 {
      return;
    }

    let half = width.min(MAX_STROKE_WIDTH) / 2.0;
    let mut canvas = BlendCanvas(self);
    for (i, a) in points.iter().enumerate() {
      let b = points[(i + 1) % points.len()];
      stroke_segment(&mut canvas, *a, b, half, color);
    }

    // 圆形拐角，避免粗线在顶点处出现缺口
    let radius = half.round() as i32;
    if radius >= 1 {
      for p in points {
        let center = to_pixel(p.x, p.y);
        draw_filled_circle_mut(&mut canvas, (center.x, center.y), radius, color);
      }
    }
  }
}
