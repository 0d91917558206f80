// 该文件是 Cheshang （车伤） 项目的一部分。
// src/task.rs - 评估任务
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

use std::{
  fmt::Display,
  thread,
  time::{Duration, Instant},
};
use tracing::{info, warn};

use crate::{model::Model, output::Render};

pub trait Task<I, M, O>: Sized {
  type Error;
  fn run_task(self, input: I, model: M, output: O) -> Result<(), Self::Error>;
}

/// 只评估第一帧
pub struct OneShotTask;

impl<
  F,
  D: Display,
  ME: std::error::Error + Sync + Send + 'static,
  RE: std::error::Error + Sync + Send + 'static,
  I: Iterator<Item = F>,
  M: Model<Input = F, Output = D, Error = ME>,
  O: Render<F, D, Error = RE>,
> Task<I, M, O> for OneShotTask
{
  type Error = anyhow::Error;

  fn run_task(self, mut input: I, model: M, output: O) -> Result<(), Self::Error> {
    info!("开始单次评估...");
    let frame = input.next().ok_or_else(|| anyhow::anyhow!("没有可用的观测"))?;
    let now = Instant::now();
    let result = model.infer(&frame)?;
    info!("评估结果: {} (耗时 {:.2?})", result, now.elapsed());
    output.render_result(&frame, &result)?;
    info!("报告已输出，总耗时 {:.2?}", now.elapsed());

    Ok(())
  }
}

/// 逐帧评估，直到输入耗尽、达到指定帧数或收到中断信号
#[derive(Default, Debug)]
pub struct ContinuousTask {
  frame_number: Option<usize>,
}

impl ContinuousTask {
  pub fn with_frame_number(mut self, frame_number: Option<usize>) -> Self {
    self.frame_number = frame_number;
    self
  }
}

impl<
  F,
  D: Display,
  ME: std::error::Error + Sync + Send + 'static,
  RE: std::error::Error + Sync + Send + 'static,
  I: Iterator<Item = F>,
  M: Model<Input = F, Output = D, Error = ME>,
  O: Render<F, D, Error = RE>,
> Task<I, M, O> for ContinuousTask
{
  type Error = anyhow::Error;

  fn run_task(self, input: I, model: M, output: O) -> Result<(), Self::Error> {
    info!("开始任务...");
    let (tx, rx) = std::sync::mpsc::channel();

    ctrlc::set_handler(move || {
      info!("收到中断信号，准备退出...");
      let _ = tx.send(());
      thread::spawn(|| {
        thread::sleep(Duration::from_secs(30));
        warn!("强制退出程序");
        std::process::exit(1);
      });
    })?;

    let mut frame_index = 0usize;
    let mut failed = 0usize;
    let started = Instant::now();
    for frame in input {
      frame_index = frame_index.wrapping_add(1);
      let now = Instant::now();
      let result = model.infer(&frame)?;
      let inferred = now.elapsed();
      if let Err(e) = output.render_result(&frame, &result) {
        failed += 1;
        warn!("第 {} 帧报告输出失败: {}", frame_index, e);
      }
      info!(
        "第 {} 帧: {} (评估 {:.2?} / 合计 {:.2?})",
        frame_index,
        result,
        inferred,
        now.elapsed()
      );
      if self.frame_number.is_some_and(|n| frame_index >= n) {
        info!("达到指定帧数 {}, 退出任务循环", frame_index);
        break;
      }
      if rx.try_recv().is_ok() {
        warn!("中断信号接收，退出任务循环");
        break;
      }
    }

    info!(
      "任务完成，共评估 {} 帧，输出失败 {} 帧，耗时 {:.2?}",
      frame_index,
      failed,
      started.elapsed()
    );
    Ok(())
  }
}
