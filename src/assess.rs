// 该文件是 Cheshang （车伤） 项目的一部分。
// src/assess.rs - 损伤融合与评分
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

//! 融合引擎：把检测、分割、分类结果合成为一份损伤报告。
//!
//! 每个缺陷依次经过部件匹配、框级严重度、角度升级、全图融合，
//! 最后对所有缺陷统一计算完好度。整个过程是纯计算，不产生错误。

mod assembler;
mod integrity;
mod matcher;
mod severity;

pub use self::assembler::{AssessmentInput, Assessor};
pub use self::integrity::integrity_score;
pub use self::matcher::{PartMatch, match_part, project_bbox};
pub use self::severity::{box_severity, escalate_for_angle, fuse_severity};
