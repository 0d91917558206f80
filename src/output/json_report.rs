// 该文件是 Cheshang （车伤） 项目的一部分。
// src/output/json_report.rs - JSON 报告输出
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

use std::io::Write;
use std::path::Path;

use thiserror::Error;
use tracing::info;
use url::Url;

use crate::{FromUrl, FromUrlWithScheme, output::Render, report::AnalysisReport};

const STDOUT_PATH: &str = "-";

#[derive(Error, Debug)]
pub enum JsonReportError {
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("JSON 错误: {0}")]
  JsonError(#[from] serde_json::Error),
  #[error("URI 方案不匹配: {0}")]
  SchemeMismatch(String),
}

/// 把报告写为 JSON 文件: `json:///path/to/report.json`，`json:-` 写到标准输出。
/// 查询参数 `compact` 关闭缩进。
pub struct JsonReportOutput {
  path: String,
  pretty: bool,
}

impl FromUrlWithScheme for JsonReportOutput {
  const SCHEME: &'static str = "json";
}

impl FromUrl for JsonReportOutput {
  type Error = JsonReportError;

  fn from_url(uri: &Url) -> Result<Self, Self::Error> {
    if uri.scheme() != Self::SCHEME {
      return Err(JsonReportError::SchemeMismatch(format!(
        "期望输出方式 '{}', 实际输出方式 '{}'",
        Self::SCHEME,
        uri.scheme()
      )));
    }

    let pretty = !uri.query_pairs().any(|(k, _)| k == "compact");
    Ok(JsonReportOutput {
      path: uri.path().to_string(),
      pretty,
    })
  }
}

impl JsonReportOutput {
  fn save_report(&self, report: &AnalysisReport) -> Result<(), JsonReportError> {
    let text = report.to_json(self.pretty)?;

    if self.path == STDOUT_PATH {
      let mut stdout = std::io::stdout().lock();
      writeln!(stdout, "{}", text)?;
      return Ok(());
    }

    if let Some(parent) = Path::new(&self.path).parent()
      && !parent.as_os_str().is_empty()
    {
      std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&self.path, text)?;
    info!("保存报告到文件: {}", self.path);

    Ok(())
  }
}

impl<F> Render<F, AnalysisReport> for JsonReportOutput {
  type Error = JsonReportError;

  fn render_result(&self, _frame: &F, result: &AnalysisReport) -> Result<(), Self::Error> {
    self.save_report(result)
  }
}
