//! Spacecraft operating modes

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModeError {
    #[error("Unknown mode code {0}")]
    UnknownCode(u8),
}

/// Operating mode, commanded from the ground
///
/// Only `Nominal` runs the estimator. The pointing modes are driven by
/// control laws outside this crate and park the estimate while active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Mode {
    Detumble,
    PointToSun,
    PointToEarth,
    #[default]
    Nominal,
}

impl Mode {
    pub const ALL: [Mode; 4] = [Mode::Detumble, Mode::PointToSun, Mode::PointToEarth, Mode::Nominal];

    /// Ground-command code
    pub fn code(&self) -> u8 {
        match self {
            Mode::Detumble => 0,
            Mode::PointToSun => 1,
            Mode::PointToEarth => 2,
            Mode::Nominal => 3,
        }
    }

    pub fn runs_estimation(&self) -> bool {
        match self {
            Mode::Nominal => true,
            Mode::Detumble | Mode::PointToSun | Mode::PointToEarth => false,
        }
    }
}

impl TryFrom<u8> for Mode {
    type Error = ModeError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Mode::Detumble),
            1 => Ok(Mode::PointToSun),
            2 => Ok(Mode::PointToEarth),
            3 => Ok(Mode::Nominal),
            other => Err(ModeError::UnknownCode(other)),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Mode::Detumble => "Detumble",
            Mode::PointToSun => "PointToSun",
            Mode::PointToEarth => "PointToEarth",
            Mode::Nominal => "Nominal",
        };
        f.write_str(name)
    }
}
