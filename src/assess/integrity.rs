// 该文件是 Cheshang （车伤） 项目的一部分。
// src/assess/integrity.rs - 整车完好度评分
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

use crate::{config::EngineConfig, report::Integrity};

/// 由 (面积占比, 部件) 计算 1-5 分完好度，5 分表示没有可见损伤。
/// 关键部件上的缺陷按 critical_weight 加权，取所有缺陷中的最大值分档。
pub fn integrity_score<'a, I>(config: &EngineConfig, defects: I) -> Integrity
where
  I: IntoIterator<Item = (f64, &'a str)>,
{
  let buckets = &config.integrity;
  let worst = defects
    .into_iter()
    .map(|(area_ratio, part)| {
      if config.is_critical(part) {
        area_ratio * buckets.critical_weight
      } else {
        area_ratio
      }
    })
    .fold(0.0f64, f64::max);

  let score = if worst == 0.0 {
    5
  } else if worst < buckets.score4_below {
    4
  } else if worst < buckets.score3_below {
    3
  } else if worst < buckets.score2_below {
    2
  } else {
    1
  };

  Integrity::from_score(score)
}
