// 该文件是 Muwen （木纹） 项目的一部分。
// src/history.rs - 会话内的推理历史
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

use std::num::NonZeroUsize;

use tracing::debug;

use crate::{
  frame::SourceImage,
  model::{Inference, WithLabel},
  output::RenderOptions,
};

#[derive(Debug, Clone)]
pub struct SavedResult<T> {
  pub frame: SourceImage,
  pub inference: Inference<T>,
}

/// 只在内存中保存，进程退出即丢弃
#[derive(Debug, Clone)]
pub struct History<T> {
  entries: Vec<SavedResult<T>>,
}

impl<T> Default for History<T> {
  fn default() -> Self {
    Self { entries: Vec::new() }
  }
}

impl<T> History<T> {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn push(&mut self, frame: SourceImage, inference: Inference<T>) {
    debug!("历史记录新增 {}", frame.name());
    self.entries.push(SavedResult { frame, inference });
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  pub fn iter(&self) -> impl Iterator<Item = &SavedResult<T>> {
    self.entries.iter()
  }

  /// 在不超过可用并行度的作用域线程上处理全部记录，结果按历史顺序返回
  pub fn map_concurrent<R, F>(&self, f: F) -> Vec<R>
  where
    T: Sync,
    R: Send,
    F: Fn(&SavedResult<T>) -> R + Sync,
  {
    let workers = std::thread::available_parallelism()
      .map(NonZeroUsize::get)
      .unwrap_or(1);
    self.map_with_workers(workers, f)
  }

  /// 记录按顺序切成至多 `workers` 段，每段一个线程
  pub fn map_with_workers<R, F>(&self, workers: usize, f: F) -> Vec<R>
  where
    T: Sync,
    R: Send,
    F: Fn(&SavedResult<T>) -> R + Sync,
  {
    if self.entries.is_empty() {
      return Vec::new();
    }
    let chunk = self.entries.len().div_ceil(workers.max(1));
    debug!("{} 条记录分给 {} 个线程", self.entries.len(), self.entries.len().div_ceil(chunk));

    let f = &f;
    std::thread::scope(|scope| {
      let handles: Vec<_> = self
        .entries
        .chunks(chunk)
        .map(|part| scope.spawn(move || part.iter().map(f).collect::<Vec<R>>()))
        .collect();
      handles
        .into_iter()
        .flat_map(|handle| match handle.join() {
          Ok(results) => results,
          Err(panic) => std::panic::resume_unwind(panic),
        })
        .collect()
    })
  }
}

impl<T: WithLabel + Sync> History<T> {
  /// 并发渲染全部记录，每个线程独占自己的画布
  pub fn render_all(&self, options: &RenderOptions) -> Vec<Vec<u8>> {
    self.map_concurrent(|entry| options.annotate(&entry.frame, &entry.inference))
  }
}

impl<'a, T> IntoIterator for &'a History<T> {
  type Item = &'a SavedResult<T>;
  type IntoIter = std::slice::Iter<'a, SavedResult<T>>;

  fn into_iter(self) -> Self::IntoIter {
    self.entries.iter()
  }
}
