// 该文件是 Muwen （木纹） 项目的一部分。
// src/features.rs - 显示类别开关
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

use std::collections::BTreeSet;

use crate::model::{Inference, Region, WithLabel, canonical_label};

const DEFAULT_ENABLED: [&str; 5] = [
  "board_whitewood",
  "board_rot",
  "board_streak",
  "board_knot",
  "board_firescar",
];

/// 启用显示的类别集合，过滤发生在渲染之前
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Features {
  enabled: BTreeSet<String>,
}

impl Default for Features {
  fn default() -> Self {
    Self {
      enabled: DEFAULT_ENABLED.iter().map(|s| s.to_string()).collect(),
    }
  }
}

impl Features {
  pub fn none() -> Self {
    Self {
      enabled: BTreeSet::new(),
    }
  }

  /// 逗号分隔的类别名，`board_` 前缀可省略
  pub fn from_list(list: &str) -> Self {
    Self {
      enabled: list
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(canonical_label)
        .collect(),
    }
  }

  pub fn enable(&mut self, name: &str) {
    self.enabled.insert(canonical_label(name));
  }

  pub fn disable(&mut self, name: &str) {
    self.enabled.remove(&canonical_label(name));
  }

  pub fn is_enabled<T: WithLabel>(&self, kind: &T) -> bool {
    self.enabled.contains(&kind.to_label_str())
  }

  pub fn enabled(&self) -> impl Iterator<Item = &str> {
    self.enabled.iter().map(String::as_str)
  }

  pub fn select<'a, T: WithLabel>(&self, inference: &'a Inference<T>) -> Vec<&'a Region<T>> {
    inference.filtered(|region| self.is_enabled(&region.kind))
  }
}

/// 去掉板面类别，只保留缺陷
pub fn is_defect<T: WithLabel>(region: &Region<T>) -> bool {
  !region.kind.is_surface()
}
