// 该文件是 Muwen （木纹） 项目的一部分。
// src/geometry.rs - 坐标与形状
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

use serde::{Deserialize, Serialize};

/// 图像像素尺寸
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dimensions {
  pub width: u32,
  pub height: u32,
}

impl Dimensions {
  pub const fn new(width: u32, height: u32) -> Self {
    Self { width, height }
  }

  pub fn is_empty(&self) -> bool {
    self.width == 0 || self.height == 0
  }

  pub fn longest_side(&self) -> u32 {
    self.width.max(self.height)
  }

  /// 两边都不超过 `max` 时为真
  pub fn fits_within(&self, max: u32) -> bool {
    self.width <= max && self.height <= max
  }
}

impl From<(u32, u32)> for Dimensions {
  fn from((width, height): (u32, u32)) -> Self {
    Self { width, height }
  }
}

impl std::fmt::Display for Dimensions {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}x{}", self.width, self.height)
  }
}

/// 推理图像坐标系下的像素点
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
  pub x: f32,
  pub y: f32,
}

impl Point {
  pub const fn new(x: f32, y: f32) -> Self {
    Self { x, y }
  }

  pub fn is_finite(&self) -> bool {
    self.x.is_finite() && self.y.is_finite()
  }

  pub fn scaled(self, scale: Scale) -> Self {
    Self {
      x: self.x * scale.x,
      y: self.y * scale.y,
    }
  }
}

/// 源图像坐标到实际栅格坐标的缩放比例
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scale {
  pub x: f32,
  pub y: f32,
}

impl Scale {
  pub const IDENTITY: Scale = Scale { x: 1.0, y: 1.0 };

  /// `displayed / source`，源尺寸为空时无意义，返回 None
  pub fn between(source: Dimensions, displayed: Dimensions) -> Option<Self> {
    if source.is_empty() {
      return None;
    }
    Some(Self {
      x: displayed.width as f32 / source.width as f32,
      y: displayed.height as f32 / source.height as f32,
    })
  }
}

/// 中心锚定的矩形框，(x, y) 为框中心
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoxShape {
  pub x: f32,
  pub y: f32,
  pub width: f32,
  pub height: f32,
}

impl BoxShape {
  pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
    Self {
      x,
      y,
      width,
      height,
    }
  }

  pub fn is_finite(&self) -> bool {
    self.x.is_finite() && self.y.is_finite() && self.width.is_finite() && self.height.is_finite()
  }

  pub fn area(&self) -> f32 {
    self.width.abs() * self.height.abs()
  }

  /// 转为左上角锚定、已缩放的绘制矩形
  pub fn to_draw_rect(&self, scale: Scale) -> DrawRect {
    DrawRect {
      x: (self.x - self.width / 2.0) * scale.x,
      y: (self.y - self.height / 2.0) * scale.y,
      width: self.width * scale.x,
      height: self.height * scale.y,
    }
  }
}

/// 左上角锚定的绘制矩形（栅格坐标）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawRect {
  pub x: f32,
  pub y: f32,
  pub width: f32,
  pub height: f32,
}

impl DrawRect {
  /// 覆盖整张画布的矩形
  pub fn covering(bounds: Dimensions) -> Self {
    Self {
      x: 0.0,
      y: 0.0,
      width: bounds.width as f32,
      height: bounds.height as f32,
    }
  }

  /// 四边各向外扩 `margin`
  pub fn expanded(&self, margin: f32) -> Self {
    Self {
      x: self.x - margin,
      y: self.y - margin,
      width: self.width + margin * 2.0,
      height: self.height + margin * 2.0,
    }
  }

  pub fn is_finite(&self) -> bool {
    self.x.is_finite() && self.y.is_finite() && self.width.is_finite() && self.height.is_finite()
  }

  /// 闭区间意义下是否相交，宽高可为负
  pub fn intersects(&self, other: &DrawRect) -> bool {
    let (l0, r0) = ordered(self.x, self.x + self.width);
    let (t0, b0) = ordered(self.y, self.y + self.height);
    let (l1, r1) = ordered(other.x, other.x + other.width);
    let (t1, b1) = ordered(other.y, other.y + other.height);
    l0 <= r1 && l1 <= r0 && t0 <= b1 && t1 <= b0
  }

  /// Sutherland-Hodgman 裁剪：把闭合多边形裁到矩形内，完全在外时返回空。
  ///
  /// 交点在 f64 下计算，坐标很大时也不会溢出。
  pub fn clip_polygon(&self, points: &[Point]) -> Vec<Point> {
    let (left, right) = ordered(self.x, self.x + self.width);
    let (top, bottom) = ordered(self.y, self.y + self.height);
    let edges = [
      ClipEdge::Left(left as f64),
      ClipEdge::Right(right as f64),
      ClipEdge::Top(top as f64),
      ClipEdge::Bottom(bottom as f64),
    ];

    let mut polygon: Vec<(f64, f64)> = points.iter().map(|p| (p.x as f64, p.y as f64)).collect();
    for edge in edges {
      if polygon.is_empty() {
        break;
      }
      let input = std::mem::take(&mut polygon);
      for (i, &current) in input.iter().enumerate() {
        let previous = input[(i + input.len() - 1) % input.len()];
        match (edge.inside(previous), edge.inside(current)) {
          (true, true) => polygon.push(current),
          (true, false) => polygon.push(edge.intersect(previous, current)),
          (false, true) => {
            polygon.push(edge.intersect(previous, current));
            polygon.push(current);
          }
          (false, false) => {}
        }
      }
    }

    polygon
      .into_iter()
      .map(|(x, y)| Point::new(x as f32, y as f32))
      .collect()
  }

  /// 顺时针四个角点
  pub fn corners(&self) -> [Point; 4] {
    let (x0, y0) = (self.x, self.y);
    let (x1, y1) = (self.x + self.width, self.y + self.height);
    [
      Point::new(x0, y0),
      Point::new(x1, y0),
      Point::new(x1, y1),
      Point::new(x0, y1),
    ]
  }

  /// 取整并裁剪到 `bounds` 内，与画布没有交集时返回 None
  pub fn clip_to(&self, bounds: Dimensions) -> Option<PixelRect> {
    let (left, right) = ordered(self.x, self.x + self.width);
    let (top, bottom) = ordered(self.y, self.y + self.height);

    let x0 = clamp_to_axis(left.round(), bounds.width);
    let x1 = clamp_to_axis(right.round(), bounds.width);
    let y0 = clamp_to_axis(top.round(), bounds.height);
    let y1 = clamp_to_axis(bottom.round(), bounds.height);

    if x1 <= x0 || y1 <= y0 {
      return None;
    }

    Some(PixelRect {
      x: x0,
      y: y0,
      width: x1 - x0,
      height: y1 - y0,
    })
  }
}

#[derive(Debug, Clone, Copy)]
enum ClipEdge {
  Left(f64),
  Right(f64),
  Top(f64),
  Bottom(f64),
}

impl ClipEdge {
  fn inside(self, (x, y): (f64, f64)) -> bool {
    match self {
      ClipEdge::Left(edge) => x >= edge,
      ClipEdge::Right(edge) => x <= edge,
      ClipEdge::Top(edge) => y >= edge,
      ClipEdge::Bottom(edge) => y <= edge,
    }
  }

  // 两端点分处边界两侧，分母不为零
  fn intersect(self, (ax, ay): (f64, f64), (bx, by): (f64, f64)) -> (f64, f64) {
    match self {
      ClipEdge::Left(edge) | ClipEdge::Right(edge) => {
        let t = (edge - ax) / (bx - ax);
        (edge, ay + t * (by - ay))
      }
      ClipEdge::Top(edge) | ClipEdge::Bottom(edge) => {
        let t = (edge - ay) / (by - ay);
        (ax + t * (bx - ax), edge)
      }
    }
  }
}

fn ordered(a: f32, b: f32) -> (f32, f32) {
  if a <= b { (a, b) } else { (b, a) }
}

fn clamp_to_axis(value: f32, limit: u32) -> u32 {
  value.clamp(0.0, limit as f32) as u32
}

/// 整数像素矩形，保证落在画布内
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
  pub x: u32,
  pub y: u32,
  pub width: u32,
  pub height: u32,
}

impl PixelRect {
  pub fn dimensions(&self) -> Dimensions {
    Dimensions::new(self.width, self.height)
  }
}

/// 检测区域的几何形状，入库时一次性确定
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Shape {
  Polygon { points: Box<[Point]> },
  Box(BoxShape),
}

impl Shape {
  pub fn polygon(points: impl Into<Box<[Point]>>) -> Self {
    Shape::Polygon {
      points: points.into(),
    }
  }

  pub fn is_finite(&self) -> bool {
    match self {
      Shape::Polygon { points } => points.iter().all(Point::is_finite),
      Shape::Box(shape) => shape.is_finite(),
    }
  }

  /// 外接矩形（中心锚定），空多边形返回 None
  pub fn bounding_box(&self) -> Option<BoxShape> {
    match self {
      Shape::Box(shape) => Some(*shape),
      Shape::Polygon { points } => {
        let first = points.first()?;
        let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
        for p in points.iter().skip(1) {
          min_x = min_x.min(p.x);
          min_y = min_y.min(p.y);
          max_x = max_x.max(p.x);
          max_y = max_y.max(p.y);
        }
        Some(BoxShape::new(
          (min_x + max_x) / 2.0,
          (min_y + max_y) / 2.0,
          max_x - min_x,
          max_y - min_y,
        ))
      }
    }
  }
}
