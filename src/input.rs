// 该文件是 Cheshang （车伤） 项目的一部分。
// src/input.rs - 观测输入
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

use thiserror::Error;

use crate::{FromUrl, frame::Observation};

mod replay;
pub use self::replay::{
  ReplayAngle, ReplayClassifier, ReplayDetector, ReplayInspector, ReplaySegmenter,
  replay_inspector,
};

#[cfg(feature = "observation_file")]
mod observation_file;
#[cfg(feature = "observation_file")]
pub use self::observation_file::{
  ObservationDirectoryInput, ObservationFileError, ObservationFileInput, read_observation,
};

#[derive(Error, Debug)]
pub enum InputError {
  #[cfg(feature = "observation_file")]
  #[error("Observation file input error: {0}")]
  ObservationFileError(#[from] ObservationFileError),
  #[error("URI scheme mismatch")]
  SchemeMismatch,
}

pub enum InputWrapper {
  #[cfg(feature = "observation_file")]
  ObservationFile(ObservationFileInput),
  #[cfg(feature = "observation_file")]
  ObservationDirectory(ObservationDirectoryInput),
}

impl FromUrl for InputWrapper {
  type Error = InputError;

  fn from_url(url: &url::Url) -> Result<Self, Self::Error> {
    #[cfg(feature = "observation_file")]
    {
      use crate::FromUrlWithScheme;

      if url.scheme() == ObservationFileInput::SCHEME {
        let input = ObservationFileInput::from_url(url)?;
        return Ok(InputWrapper::ObservationFile(input));
      }
      if url.scheme() == ObservationDirectoryInput::SCHEME {
        let input = ObservationDirectoryInput::from_url(url)?;
        return Ok(InputWrapper::ObservationDirectory(input));
      }
    }
    Err(InputError::SchemeMismatch)
  }
}

impl Iterator for InputWrapper {
  type Item = Observation;

  fn next(&mut self) -> Option<Self::Item> {
    match self {
      #[cfg(feature = "observation_file")]
      InputWrapper::ObservationFile(input) => input.next(),
      #[cfg(feature = "observation_file")]
      InputWrapper::ObservationDirectory(input) => input.next(),
    }
  }
}
