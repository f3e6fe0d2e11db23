// 该文件是 Muwen （木纹） 项目的一部分。
// src/palette.rs - 类别配色
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

use image::Rgb;

use crate::model::WithLabel;

/// 未登记类别使用的颜色（黑色）
pub const DEFAULT_COLOR: Rgb<u8> = Rgb([0x00, 0x00, 0x00]);

const PALETTE: [(&str, [u8; 3]); 10] = [
  ("board_heartwood", [0x32, 0x3c, 0x63]),
  ("board_whitewood", [0x63, 0x7c, 0xa2]),
  ("board_rot", [0x9d, 0x67, 0xfb]),
  ("board_streak", [0xc7, 0x8e, 0x58]),
  ("board_knot", [0x7b, 0x49, 0x2d]),
  ("board_wormhole", [0x06, 0x92, 0xda]),
  ("board_want", [0xae, 0x63, 0x79]),
  ("board_bark", [0x7e, 0x7e, 0x88]),
  ("board_firescar", [0xdf, 0xb2, 0xad]),
  ("board_beltmark", [0x78, 0xdd, 0x84]),
];

pub fn color_for_label(label: &str) -> Rgb<u8> {
  PALETTE
    .iter()
    .find(|(name, _)| *name == label)
    .map(|(_, rgb)| Rgb(*rgb))
    .unwrap_or(DEFAULT_COLOR)
}

pub fn color_for<T: WithLabel>(kind: &T) -> Rgb<u8> {
  color_for_label(&kind.to_label_str())
}

/// `#rrggbb` 形式，用于报告和记录
pub fn to_hex(color: Rgb<u8>) -> String {
  format!("#{:02x}{:02x}{:02x}", color[0], color[1], color[2])
}
