// 该文件是 Muwen （木纹） 项目的一部分。
// src/output/draw.rs - 检测区域可视化
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

use image::{DynamicImage, Rgb, Rgba, RgbaImage};
use tracing::{debug, warn};

use crate::{
  geometry::{Dimensions, DrawRect, Point, Scale, Shape},
  model::{Region, WithLabel},
  raster::{self, DrawSurface, MAX_STROKE_WIDTH},
};

// 填充透明度 0x66（约 40%），描边不透明
pub const FILL_ALPHA: u8 = 0x66;
pub const STROKE_WIDTH: f32 = 2.0;
pub const DEFAULT_QUALITY: u8 = 90;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Draw {
  fill_alpha: u8,
  stroke_width: f32,
  quality: u8,
}

impl Default for Draw {
  fn default() -> Self {
    Self {
      fill_alpha: FILL_ALPHA,
      stroke_width: STROKE_WIDTH,
      quality: DEFAULT_QUALITY,
    }
  }
}

impl Draw {
  pub fn with_fill_alpha(mut self, fill_alpha: u8) -> Self {
    self.fill_alpha = fill_alpha;
    self
  }

  /// 线宽限制在 `[0, MAX_STROKE_WIDTH]`，非有限值保持原线宽
  pub fn with_stroke_width(mut self, stroke_width: f32) -> Self {
    if !stroke_width.is_finite() {
      warn!("忽略无效线宽 {}，保持 {}", stroke_width, self.stroke_width);
      return self;
    }
    self.stroke_width = stroke_width.clamp(0.0, MAX_STROKE_WIDTH);
    self
  }

  pub fn with_quality(mut self, quality: u8) -> Self {
    self.quality = quality.clamp(1, 100);
    self
  }

  pub fn fill_alpha(&self) -> u8 {
    self.fill_alpha
  }

  pub fn stroke_width(&self) -> f32 {
    self.stroke_width
  }

  pub fn quality(&self) -> u8 {
    self.quality
  }

  // 返回是否实际绘制
  fn draw_shape<S: DrawSurface>(&self, surface: &mut S, shape: &Shape, scale: Scale, color: Rgb<u8>) -> bool {
    if !shape.is_finite() {
      debug!("跳过含非有限坐标的区域");
      return false;
    }

    let [r, g, b] = color.0;
    let fill = Rgba([r, g, b, self.fill_alpha]);
    let stroke = Rgba([r, g, b, u8::MAX]);

    // 裁剪产生的边落在画布外超过半个线宽，不会被画出来
    let view = DrawRect::covering(surface.dimensions()).expanded(self.stroke_width / 2.0 + 2.0);

    match shape {
      Shape::Polygon { points } => {
        let scaled: Vec<Point> = points.iter().map(|p| p.scaled(scale)).collect();
        if !scaled.iter().all(Point::is_finite) {
          debug!("跳过缩放后溢出的多边形");
          return false;
        }
        let distinct = raster::distinct_pixels(&scaled);
        if distinct < 3 {
          debug!("跳过只有 {} 个不同顶点的多边形", distinct);
          return false;
        }
        let visible = view.clip_polygon(&scaled);
        if raster::distinct_pixels(&visible) < 3 {
          debug!("多边形在画布之外");
          return false;
        }
        surface.fill_polygon(&visible, fill);
        surface.stroke_path(&visible, self.stroke_width, stroke);
      }
      Shape::Box(shape) => {
        let rect = shape.to_draw_rect(scale);
        if !rect.is_finite() {
          debug!("跳过缩放后溢出的矩形框");
          return false;
        }
        if !rect.intersects(&view) {
          debug!("矩形框在画布之外");
          return false;
        }
        surface.fill_rect(rect, fill);
        surface.stroke_path(&view.clip_polygon(&rect.corners()), self.stroke_width, stroke);
      }
    }
    true
  }

  /// 在画布上绘制全部区域，`source` 为区域坐标所在的图像尺寸。返回实际绘制的区域数。
  ///
  /// 区域应已由调用方按类别过滤。
  pub fn draw_regions<'r, S, T, I, F>(&self, surface: &mut S, source: Dimensions, regions: I, color_for: F) -> usize
  where
    S: DrawSurface,
    T: WithLabel + 'r,
    I: IntoIterator<Item = &'r Region<T>>,
    F: Fn(&T) -> Rgb<u8>,
  {
    let Some(scale) = Scale::between(source, surface.dimensions()) else {
      warn!("区域坐标的源尺寸 {} 无效，不绘制", source);
      return 0;
    };

    let mut drawn = 0;
    for region in regions {
      if self.draw_shape(surface, &region.shape, scale, color_for(&region.kind)) {
        drawn += 1;
      }
    }
    drawn
  }

  /// 返回新图像，输入不会被修改
  pub fn annotate<'r, T, I, F>(&self, image: &DynamicImage, source: Dimensions, regions: I, color_for: F) -> RgbaImage
  where
    T: WithLabel + 'r,
    I: IntoIterator<Item = &'r Region<T>>,
    F: Fn(&T) -> Rgb<u8>,
  {
    let mut canvas = image.to_rgba8();
    let drawn = self.draw_regions(&mut canvas, source, regions, color_for);
    debug!("绘制了 {} 个区域", drawn);
    canvas
  }

  /// 解码、绘制并重新编码为 JPEG；解码或编码失败时返回未标注的原始数据
  pub fn render<'r, T, I, F>(&self, raw: &[u8], source: Dimensions, regions: I, color_for: F) -> Vec<u8>
  where
    T: WithLabel + 'r,
    I: IntoIterator<Item = &'r Region<T>>,
    F: Fn(&T) -> Rgb<u8>,
  {
    let image = match raster::decode(raw) {
      Ok(image) => image,
      Err(err) => {
        warn!("标注时图像解码失败，返回原图: {}", err);
        return raw.to_vec();
      }
    };

    let annotated = DynamicImage::ImageRgba8(self.annotate(&image, source, regions, color_for));
    match raster::encode_jpeg(&annotated, self.quality) {
      Ok(encoded) => encoded,
      Err(err) => {
        warn!("标注结果编码失败，返回原图: {}", err);
        raw.to_vec()
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use image::RgbImage;

  use super::*;
  use crate::{
    features::Features,
    geometry::BoxShape,
    model::{Confidence, DefectLabel, Inference},
    palette::color_for,
  };

  const BACKGROUND: Rgba<u8> = Rgba([200, 200, 200, 255]);

  fn region(kind: DefectLabel, shape: Shape) -> Region<DefectLabel> {
    Region {
      kind,
      confidence: Confidence::from_raw(0.8),
      shape,
      class_id: None,
      detection_id: None,
    }
  }

  fn canvas(width: u32, height: u32) -> RgbaImage {
    RgbaImage::from_pixel(width, height, BACKGROUND)
  }

  fn triangle() -> Shape {
    Shape::polygon(vec![
      Point::new(10.0, 10.0),
      Point::new(40.0, 10.0),
      Point::new(25.0, 40.0),
    ])
  }

  #[test]
  fn box_is_drawn_at_top_left_anchor() {
    let mut image = canvas(1024, 768);
    let regions = [region(
      DefectLabel::Knot,
      Shape::Box(BoxShape::new(512.0, 384.0, 200.0, 100.0)),
    )];
    let drawn = Draw::default().draw_regions(&mut image, Dimensions::new(1024, 768), &regions, color_for);
    assert_eq!(drawn, 1);

    let knot = color_for(&DefectLabel::Knot);
    let stroke = Rgba([knot[0], knot[1], knot[2], 255]);
    // 左上角 (412, 334)，描边落在边界上
    assert_eq!(*image.get_pixel(412, 334), stroke);
    assert_eq!(*image.get_pixel(512, 334), stroke);
    // 内部半透明
    let inside = *image.get_pixel(512, 384);
    assert_ne!(inside, BACKGROUND);
    assert_ne!(inside, stroke);
    // 框外不受影响
    assert_eq!(*image.get_pixel(400, 384), BACKGROUND);
    assert_eq!(*image.get_pixel(512, 320), BACKGROUND);
  }

  #[test]
  fn degenerate_polygons_are_skipped() {
    let mut image = canvas(50, 50);
    let regions = [
      region(DefectLabel::Rot, Shape::polygon(vec![Point::new(5.0, 5.0)])),
      region(DefectLabel::Rot, Shape::polygon(Vec::<Point>::new())),
      region(
        DefectLabel::Rot,
        Shape::polygon(vec![Point::new(f32::NAN, 1.0), Point::new(2.0, 2.0), Point::new(3.0, 1.0)]),
      ),
    ];
    let drawn = Draw::default().draw_regions(&mut image, Dimensions::new(50, 50), &regions, color_for);
    assert_eq!(drawn, 0);
    assert_eq!(image, canvas(50, 50));
  }

  #[test]
  fn coincident_polygon_points_are_skipped() {
    let mut image = canvas(50, 50);
    let regions = [
      region(DefectLabel::Rot, Shape::polygon(vec![Point::new(20.0, 20.0); 3])),
      // 取整后只剩两个像素
      region(
        DefectLabel::Rot,
        Shape::polygon(vec![Point::new(10.0, 10.0), Point::new(10.2, 9.9), Point::new(30.0, 10.0)]),
      ),
    ];
    let drawn = Draw::default().draw_regions(&mut image, Dimensions::new(50, 50), &regions, color_for);
    assert_eq!(drawn, 0);
    assert_eq!(image, canvas(50, 50));
  }

  #[test]
  fn huge_box_is_clipped_to_canvas() {
    let mut image = canvas(100, 100);
    let regions = [region(
      DefectLabel::Knot,
      Shape::Box(BoxShape::new(50.0, 50.0, 4e8, 10.0)),
    )];
    let started = std::time::Instant::now();
    let drawn = Draw::default().draw_regions(&mut image, Dimensions::new(100, 100), &regions, color_for);
    assert_eq!(drawn, 1);
    assert!(started.elapsed() < std::time::Duration::from_secs(2));

    let knot = color_for(&DefectLabel::Knot);
    let stroke = Rgba([knot[0], knot[1], knot[2], 255]);
    // 上下两条边横贯画布，左右两条边在画布外
    assert_eq!(*image.get_pixel(0, 45), stroke);
    assert_eq!(*image.get_pixel(99, 55), stroke);
    let inside = *image.get_pixel(50, 50);
    assert_ne!(inside, BACKGROUND);
    assert_ne!(inside, stroke);
    assert_eq!(*image.get_pixel(50, 20), BACKGROUND);
  }

  #[test]
  fn regions_off_canvas_are_not_drawn() {
    let mut image = canvas(100, 100);
    let regions = [
      region(DefectLabel::Knot, Shape::Box(BoxShape::new(-5e8, 50.0, 10.0, 10.0))),
      region(
        DefectLabel::Rot,
        Shape::polygon(vec![
          Point::new(300.0, 300.0),
          Point::new(400.0, 300.0),
          Point::new(350.0, 400.0),
        ]),
      ),
      region(DefectLabel::Knot, Shape::Box(BoxShape::new(3e38, 3e38, 3e38, 3e38))),
    ];
    let drawn = Draw::default().draw_regions(&mut image, Dimensions::new(50, 50), &regions, color_for);
    assert_eq!(drawn, 0);
    assert_eq!(image, canvas(100, 100));
  }

  #[test]
  fn stroke_width_is_bounded() {
    let draw = Draw::default();
    assert_eq!(draw.with_stroke_width(f32::INFINITY).stroke_width(), STROKE_WIDTH);
    assert_eq!(draw.with_stroke_width(f32::NAN).stroke_width(), STROKE_WIDTH);
    assert_eq!(draw.with_stroke_width(20000.0).stroke_width(), MAX_STROKE_WIDTH);
    assert_eq!(draw.with_stroke_width(-3.0).stroke_width(), 0.0);
    assert_eq!(draw.with_stroke_width(5.0).stroke_width(), 5.0);
  }

  #[test]
  fn skipped_region_does_not_stop_the_rest() {
    let mut image = canvas(50, 50);
    let regions = [
      region(DefectLabel::Rot, Shape::polygon(vec![Point::new(5.0, 5.0)])),
      region(DefectLabel::Rot, triangle()),
    ];
    let drawn = Draw::default().draw_regions(&mut image, Dimensions::new(50, 50), &regions, color_for);
    assert_eq!(drawn, 1);
    assert_ne!(*image.get_pixel(25, 20), BACKGROUND);
  }

  #[test]
  fn scaling_is_proportional() {
    let regions = [region(DefectLabel::Streak, triangle())];
    let source = Dimensions::new(50, 50);

    let mut small = canvas(50, 50);
    Draw::default().draw_regions(&mut small, source, &regions, color_for);
    let mut large = canvas(100, 100);
    Draw::default().draw_regions(&mut large, source, &regions, color_for);

    // 内部、描边与外部在两倍栅格上的对应位置一致
    for (x, y) in [(25, 20), (25, 10), (5, 5), (45, 45), (25, 30)] {
      assert_eq!(
        small.get_pixel(x, y),
        large.get_pixel(x * 2, y * 2),
        "pixel ({x}, {y})"
      );
    }
  }

  #[test]
  fn empty_source_dimensions_draw_nothing() {
    let mut image = canvas(10, 10);
    let regions = [region(DefectLabel::Knot, triangle())];
    let drawn = Draw::default().draw_regions(&mut image, Dimensions::new(0, 0), &regions, color_for);
    assert_eq!(drawn, 0);
  }

  #[test]
  fn unknown_label_uses_default_color() {
    let mut image = canvas(50, 50);
    let regions = [region(DefectLabel::Unknown("board_split".into()), triangle())];
    Draw::default().draw_regions(&mut image, Dimensions::new(50, 50), &regions, color_for);
    assert_eq!(*image.get_pixel(25, 10), Rgba([0, 0, 0, 255]));
  }

  #[test]
  fn filtered_out_regions_render_like_no_regions() {
    let base = DynamicImage::ImageRgb8(RgbImage::from_pixel(64, 48, Rgb([120, 90, 60])));
    let raw = raster::encode_jpeg(&base, 95).unwrap();
    let inference = Inference {
      inference_id: "f".into(),
      time: 0.0,
      image: Dimensions::new(64, 48),
      predictions: vec![region(
        DefectLabel::Wormhole,
        Shape::Box(BoxShape::new(32.0, 24.0, 20.0, 20.0)),
      )]
      .into(),
    };

    let draw = Draw::default();
    let selected = Features::default().select(&inference);
    let filtered = draw.render(&raw, inference.image, selected, color_for);
    let empty = draw.render(&raw, inference.image, std::iter::empty::<&Region<DefectLabel>>(), color_for);
    assert_eq!(filtered, empty);
  }

  #[test]
  fn render_does_not_touch_input_and_falls_back() {
    let garbage = b"not an image".to_vec();
    let regions = [region(DefectLabel::Knot, triangle())];
    let out = Draw::default().render(&garbage, Dimensions::new(10, 10), &regions, color_for);
    assert_eq!(out, garbage);

    let base = DynamicImage::ImageRgb8(RgbImage::from_pixel(50, 50, Rgb([1, 2, 3])));
    let before = base.clone();
    let annotated = Draw::default().annotate(&base, Dimensions::new(50, 50), &regions, color_for);
    assert_eq!(base, before);
    assert_eq!(annotated.dimensions(), (50, 50));
  }
}
