// 该文件是 Cheshang （车伤） 项目的一部分。
// src/bin/simple_oneshot.rs - 单次评估
//
// 本程序遵循 GNU Affero 通用公共许可证（AGPL）许可协议。
// 本程序的发布旨在提供实用价值，但不作任何形式的担保，
// 包括但不限于对适销性或特定用途适用性的默示担保。
// 更多详情请参阅 GNU 通用公共许可证。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, ETVP

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use url::Url;

use cheshang::{
  FromUrl,
  assess::Assessor,
  config::EngineConfig,
  input::{InputWrapper, replay_inspector},
  output::OutputWrapper,
  task::{OneShotTask, Task},
};
use tracing::info;

/// Cheshang 单次评估参数
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// 观测输入，例如 observation:///data/car.json
  #[arg(long, value_name = "SOURCE")]
  pub input: Url,
  /// 报告输出，例如 json:///out/report.json、json:-、folder:///out?always
  #[arg(long, value_name = "OUTPUT")]
  pub output: Url,
  /// 引擎配置文件（JSON），缺省使用内置阈值
  #[arg(long, value_name = "FILE")]
  pub config: Option<PathBuf>,
  /// 在报告中附带可视化标注
  #[arg(long)]
  pub overlay: bool,
}

fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_writer(std::io::stderr)
    .init();

  let args = Args::parse();

  info!("观测输入: {}", args.input);
  info!("报告输出: {}", args.output);

  let config = EngineConfig::load_or_default(args.config.as_deref())?;
  let input = InputWrapper::from_url(&args.input)?;
  let inspector = replay_inspector(Assessor::new(config)).with_overlay(args.overlay);
  let output = OutputWrapper::from_url(&args.output)?;

  OneShotTask.run_task(input, inspector, output)?;

  Ok(())
}
