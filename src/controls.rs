use serde::{Deserialize, Serialize};

use crate::network::{NetworkError, OUTPUT_COUNT};

/// Per-tick control bits. Manual robots receive one of these from the host,
/// AI robots derive theirs from the network output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Controls {
    pub forward: bool,
    pub left: bool,
    pub right: bool,
    pub reverse: bool,
}

impl Controls {
    pub const FORWARD: Controls = Controls {
        forward: true,
        left: false,
        right: false,
        reverse: false,
    };

    /// Map network outputs `[forward, left, right, reverse]`; any non-zero value is on.
    pub fn from_outputs(outputs: &[f64; OUTPUT_COUNT]) -> Self {
        let [forward, left, right, reverse] = outputs.map(|v| v != 0.0);
        Self {
            forward,
            left,
            right,
            reverse,
        }
    }

    /// Like [`Controls::from_outputs`] for an unsized output vector, which must
    /// hold exactly four values.
    pub fn try_from_outputs(outputs: &[f64]) -> Result<Self, NetworkError> {
        let outputs: &[f64; OUTPUT_COUNT] = outputs.try_into().map_err(|_| NetworkError::OutputSize {
            expected: OUTPUT_COUNT,
            actual: outputs.len(),
        })?;
        Ok(Self::from_outputs(outputs))
    }
}

/// Who drives a robot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ControlType {
    Ai,
    Manual,
}
