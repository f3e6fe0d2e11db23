// 该文件是 Muwen （木纹） 项目的一部分。
// src/task.rs - 标注任务
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

use tracing::{error, info, warn};

use crate::{
  frame::SourceImage,
  history::History,
  model::{Inference, Model, WithLabel},
  normalize::DEFAULT_MAX_DIMENSION,
  output::Render,
  report::{NO_DEFECTS, report_lines},
  upload::UploadPayload,
};

pub trait Task<I, M, O>: Sized {
  type Error;
  fn run_task(self, input: I, model: M, output: O) -> Result<(), Self::Error>;
}

fn log_report<T: WithLabel>(frame: &SourceImage, inference: &Inference<T>) {
  let lines = report_lines(inference);
  if lines.is_empty() {
    info!("{}: {}", frame.name(), NO_DEFECTS);
  }
  for line in lines {
    info!("{}: {}", frame.name(), line);
  }
}

/// 取第一张输入图像：归一化上传、推理、输出
#[derive(Debug, Clone, Copy)]
pub struct OneShotTask {
  max_dimension: u32,
}

impl Default for OneShotTask {
  fn default() -> Self {
    Self {
      max_dimension: DEFAULT_MAX_DIMENSION,
    }
  }
}

impl OneShotTask {
  pub fn with_max_dimension(mut self, max_dimension: u32) -> Self {
    self.max_dimension = max_dimension;
    self
  }
}

impl<
  T: WithLabel,
  ME: std::error::Error + Sync + Send + 'static,
  RE: std::error::Error + Sync + Send + 'static,
  I: Iterator<Item = SourceImage>,
  M: Model<Input = UploadPayload, Output = Inference<T>, Error = ME>,
  O: Render<SourceImage, Inference<T>, Error = RE>,
> Task<I, M, O> for OneShotTask
{
  type Error = anyhow::Error;

  fn run_task(self, mut input: I, model: M, output: O) -> Result<(), Self::Error> {
    info!("开始任务...");
    let frame = input.next().ok_or_else(|| anyhow::anyhow!("没有输入图像"))?;
    info!("输入图像 {} 获取成功，开始推理...", frame.name());
    let payload = UploadPayload::from_image(&frame, self.max_dimension);
    let now = std::time::Instant::now();
    let result = model.infer(&payload)?;
    info!(
      "推理完成，耗时: {:.2?}，共 {} 个区域",
      now.elapsed(),
      result.predictions.len()
    );
    log_report(&frame, &result);
    let now = std::time::Instant::now();
    output.render_result(&frame, &result)?;
    info!("渲染完成，耗时: {:.2?}", now.elapsed());

    Ok(())
  }
}

/// 逐张推理并记入历史，最后并发输出全部结果
#[derive(Debug, Clone, Copy)]
pub struct GalleryTask {
  max_dimension: u32,
}

impl Default for GalleryTask {
  fn default() -> Self {
    Self {
      max_dimension: DEFAULT_MAX_DIMENSION,
    }
  }
}

impl GalleryTask {
  pub fn with_max_dimension(mut self, max_dimension: u32) -> Self {
    self.max_dimension = max_dimension;
    self
  }
}

impl<
  T: WithLabel + Send + Sync,
  ME: std::error::Error + Sync + Send + 'static,
  RE: std::error::Error + Sync + Send + 'static,
  I: Iterator<Item = SourceImage>,
  M: Model<Input = UploadPayload, Output = Inference<T>, Error = ME>,
  O: Render<SourceImage, Inference<T>, Error = RE> + Sync,
> Task<I, M, O> for GalleryTask
{
  type Error = anyhow::Error;

  fn run_task(self, input: I, model: M, output: O) -> Result<(), Self::Error> {
    info!("开始任务...");
    let mut history = History::new();
    for frame in input {
      let payload = UploadPayload::from_image(&frame, self.max_dimension);
      match model.infer(&payload) {
        Ok(result) => {
          log_report(&frame, &result);
          history.push(frame, result);
        }
        Err(err) => error!("{} 推理失败，跳过: {}", frame.name(), err),
      }
    }

    if history.is_empty() {
      return Err(anyhow::anyhow!("没有可输出的推理结果"));
    }

    info!("共 {} 条记录，开始并发输出...", history.len());
    let now = std::time::Instant::now();
    let results = history.map_concurrent(|entry| output.render_result(&entry.frame, &entry.inference));
    let mut failed = 0;
    for (entry, result) in history.iter().zip(results) {
      if let Err(err) = result {
        warn!("{} 输出失败: {}", entry.frame.name(), err);
        failed += 1;
      }
    }
    info!("输出完成，耗时: {:.2?}，失败 {} 条", now.elapsed(), failed);

    if failed == history.len() {
      return Err(anyhow::anyhow!("全部 {} 条记录输出失败", failed));
    }
    Ok(())
  }
}
