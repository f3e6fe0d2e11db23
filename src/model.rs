// 该文件是 Muwen （木纹） 项目的一部分。
// src/model.rs - 推理结果模型
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

use crate::geometry::{Dimensions, Shape};

/// 推理服务接口，具体模型由外部服务提供
pub trait Model {
  type Input;
  type Output;
  type Error;

  fn infer(&self, input: &Self::Input) -> Result<Self::Output, Self::Error>;
}

const BOARD_PREFIX: &str = "board_";

pub trait WithLabel: Sized + Clone + std::fmt::Debug {
  /// 完整类别名，例如 `board_knot`
  fn to_label_str(&self) -> String;
  fn from_label_str(label: &str) -> Self;

  /// 板面类别（心材/边材）描述的是板材本身而非缺陷
  fn is_surface(&self) -> bool {
    false
  }

  /// 去掉 `board_` 前缀的显示名
  fn display_name(&self) -> String {
    let label = self.to_label_str();
    match label.strip_prefix(BOARD_PREFIX) {
      Some(name) => name.to_string(),
      None => label,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DefectLabel {
  Heartwood,
  Whitewood,
  Rot,
  Streak,
  Knot,
  Wormhole,
  Flagworm,
  Want,
  Bark,
  Firescar,
  Beltmark,
  Unknown(String),
}

impl DefectLabel {
  pub const KNOWN: [DefectLabel; 11] = [
    DefectLabel::Heartwood,
    DefectLabel::Whitewood,
    DefectLabel::Rot,
    DefectLabel::Streak,
    DefectLabel::Knot,
    DefectLabel::Wormhole,
    DefectLabel::Flagworm,
    DefectLabel::Want,
    DefectLabel::Bark,
    DefectLabel::Firescar,
    DefectLabel::Beltmark,
  ];

  fn as_known_str(&self) -> Option<&'static str> {
    Some(match self {
      DefectLabel::Heartwood => "board_heartwood",
      DefectLabel::Whitewood => "board_whitewood",
      DefectLabel::Rot => "board_rot",
      DefectLabel::Streak => "board_streak",
      DefectLabel::Knot => "board_knot",
      DefectLabel::Wormhole => "board_wormhole",
      DefectLabel::Flagworm => "board_flagworm",
      DefectLabel::Want => "board_want",
      DefectLabel::Bark => "board_bark",
      DefectLabel::Firescar => "board_firescar",
      DefectLabel::Beltmark => "board_beltmark",
      DefectLabel::Unknown(_) => return None,
    })
  }
}

impl WithLabel for DefectLabel {
  fn to_label_str(&self) -> String {
    match self {
      DefectLabel::Unknown(label) => label.clone(),
      known => known.as_known_str().unwrap_or_default().to_string(),
    }
  }

  fn from_label_str(label: &str) -> Self {
    Self::KNOWN
      .iter()
      .find(|known| known.as_known_str() == Some(label))
      .cloned()
      .unwrap_or_else(|| DefectLabel::Unknown(label.to_string()))
  }

  fn is_surface(&self) -> bool {
    matches!(self, DefectLabel::Heartwood | DefectLabel::Whitewood)
  }
}

/// 补全 `board_` 前缀，允许用户只写 `knot`
pub fn canonical_label(name: &str) -> String {
  let name = name.trim();
  if name.starts_with(BOARD_PREFIX) {
    name.to_string()
  } else {
    format!("{BOARD_PREFIX}{name}")
  }
}

/// 置信度，内部统一保存为 [0, 1] 的小数
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
pub struct Confidence(f32);

impl Confidence {
  /// 上游有时给小数有时给百分数，大于 1 的值按百分数处理
  pub fn from_raw(raw: f32) -> Self {
    if !raw.is_finite() {
      return Self(0.0);
    }
    let fraction = if raw > 1.0 { raw / 100.0 } else { raw };
    Self(fraction.clamp(0.0, 1.0))
  }

  pub fn fraction(&self) -> f32 {
    self.0
  }

  pub fn percent(&self) -> u32 {
    (self.0 * 100.0).floor() as u32
  }
}

#[derive(Debug, Clone)]
pub struct Region<T> {
  pub kind: T,
  pub confidence: Confidence,
  pub shape: Shape,
  pub class_id: Option<u32>,
  pub detection_id: Option<String>,
}

/// 一次推理调用的结果，创建后不再修改，只派生过滤后的子集。
///
/// 序列化为推理服务的响应格式，可再次由 `from_json` 读回。
#[derive(Debug, Clone)]
pub struct Inference<T> {
  pub inference_id: String,
  pub time: f64,
  pub image: Dimensions,
  pub predictions: Box<[Region<T>]>,
}

impl<T> Inference<T> {
  pub fn is_empty(&self) -> bool {
    self.predictions.is_empty()
  }

  pub fn filtered<F>(&self, mut keep: F) -> Vec<&Region<T>>
  where
    F: FnMut(&Region<T>) -> bool,
  {
    self.predictions.iter().filter(|r| keep(r)).collect()
  }
}

mod wire;
pub use self::wire::IngestError;

mod replay;
pub use self::replay::{ReplayModel, ReplayModelError};
