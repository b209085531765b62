//! Shared types and enums used across GEOSR.
//! Includes `PreprocessMode`, the numeric convention a super-resolution model
//! expects its input tiles in, and `ModelVariant`.
use std::str::FromStr;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Numeric convention used to feed tiles to the model and read them back.
#[derive(
    Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum PreprocessMode {
    /// Pixels already in [0,1]; passed through untouched.
    #[default]
    #[value(name = "zero_one")]
    ZeroOne,
    /// Pixels mapped to [-1,1] via `x * 2 - 1`.
    #[value(name = "minus_one_one")]
    MinusOneOne,
    /// Per-channel ImageNet mean/std standardization.
    #[value(name = "imagenet")]
    Imagenet,
}

impl std::fmt::Display for PreprocessMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PreprocessMode::ZeroOne => "zero_one",
            PreprocessMode::MinusOneOne => "minus_one_one",
            PreprocessMode::Imagenet => "imagenet",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for PreprocessMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "zero_one" => Ok(PreprocessMode::ZeroOne),
            "minus_one_one" => Ok(PreprocessMode::MinusOneOne),
            "imagenet" => Ok(PreprocessMode::Imagenet),
            other => Err(Error::InvalidArgument {
                arg: "preprocess_mode",
                value: other.to_string(),
            }),
        }
    }
}

/// Which model artifact a request runs against.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum ModelVariant {
    /// The model named by the request's `sr_model_key`.
    SuperResolution,
    /// The fixed U-Net artifact stored next to it.
    Unet,
}

impl ModelVariant {
    pub fn from_flag(use_unet: bool) -> Self {
        if use_unet {
            ModelVariant::Unet
        } else {
            ModelVariant::SuperResolution
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_modes() {
        assert_eq!("zero_one".parse::<PreprocessMode>().unwrap(), PreprocessMode::ZeroOne);
        assert_eq!(
            "minus_one_one".parse::<PreprocessMode>().unwrap(),
            PreprocessMode::MinusOneOne
        );
        assert_eq!("imagenet".parse::<PreprocessMode>().unwrap(), PreprocessMode::Imagenet);
    }

    #[test]
    fn unknown_mode_is_a_bad_request() {
        let err = "bicubic".parse::<PreprocessMode>().unwrap_err();
        assert_eq!(err.class(), crate::error::ErrorClass::BadRequest);
    }

    #[test]
    fn display_matches_parse() {
        for mode in [
            PreprocessMode::ZeroOne,
            PreprocessMode::MinusOneOne,
            PreprocessMode::Imagenet,
        ] {
            assert_eq!(mode.to_string().parse::<PreprocessMode>().unwrap(), mode);
        }
    }

    #[test]
    fn serde_uses_snake_case_names() {
        let mode: PreprocessMode = serde_json::from_str("\"minus_one_one\"").unwrap();
        assert_eq!(mode, PreprocessMode::MinusOneOne);
        assert!(serde_json::from_str::<PreprocessMode>("\"bogus\"").is_err());
    }
}
