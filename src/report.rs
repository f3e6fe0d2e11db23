// 该文件是 Muwen （木纹） 项目的一部分。
// src/report.rs - 缺陷报告
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

use crate::{
  features::is_defect,
  model::{Inference, Region, WithLabel},
};

pub const NO_DEFECTS: &str = "No defects detected.";

pub fn report_line<T: WithLabel>(region: &Region<T>) -> String {
  format!("{} - {}%", region.kind.display_name(), region.confidence.percent())
}

/// 每个缺陷一行，板面类别不计入
pub fn report_lines<T: WithLabel>(inference: &Inference<T>) -> Vec<String> {
  inference
    .predictions
    .iter()
    .filter(|region| is_defect(region))
    .map(report_line)
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    geometry::{BoxShape, Dimensions, Shape},
    model::{Confidence, DefectLabel},
  };

  #[test]
  fn lines_skip_surface_classes() {
    let make = |kind, raw| Region {
      kind,
      confidence: Confidence::from_raw(raw),
      shape: Shape::Box(BoxShape::new(0.0, 0.0, 1.0, 1.0)),
      class_id: None,
      detection_id: None,
    };
    let inference = Inference {
      inference_id: String::new(),
      time: 0.0,
      image: Dimensions::new(1, 1),
      predictions: vec![
        make(DefectLabel::Knot, 0.876),
        make(DefectLabel::Heartwood, 0.99),
        make(DefectLabel::Rot, 42.0),
      ]
      .into(),
    };
    assert_eq!(report_lines(&inference), vec!["knot - 87%", "rot - 42%"]);
  }

  #[test]
  fn empty_inference_has_no_lines() {
    let inference: Inference<DefectLabel> = Inference {
      inference_id: String::new(),
      time: 0.0,
      image: Dimensions::new(1, 1),
      predictions: Box::new([]),
    };
    assert!(report_lines(&inference).is_empty());
  }
}
