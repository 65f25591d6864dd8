//! Textual inference context (`cpu`, `gpu`, `cuda`, `cuda:N`).

use std::fmt;
use std::str::FromStr;

use candle_core::Device;
use tracing::{info, warn};

/// Where inference should run, as requested by the user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DeviceSpec {
    /// Host CPU.
    #[default]
    Cpu,
    /// Any available accelerator (Metal or CUDA).
    Gpu,
    /// A specific CUDA device.
    Cuda(usize),
}

impl DeviceSpec {
    /// Opens the requested device, falling back to the CPU when it is not
    /// available in this build or fails to initialise.
    #[must_use]
    pub fn resolve(self) -> Device {
        match self {
            Self::Cpu => Device::Cpu,
            Self::Gpu => crate::inference::get_device(),
            Self::Cuda(ordinal) => match Device::new_cuda(ordinal) {
                Ok(device) => {
                    info!("Using CUDA device {ordinal} for inference");
                    device
                }
                Err(e) => {
                    warn!("CUDA device {ordinal} unavailable ({e}), using CPU");
                    Device::Cpu
                }
            },
        }
    }
}

impl FromStr for DeviceSpec {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        match lower.as_str() {
            "cpu" => Ok(Self::Cpu),
            "gpu" => Ok(Self::Gpu),
            "cuda" => Ok(Self::Cuda(0)),
            other => other
                .strip_prefix("cuda:")
                .and_then(|n| n.parse().ok())
                .map(Self::Cuda)
                .ok_or_else(|| format!("'{s}' is not a valid device, expected cpu, gpu or cuda[:N]")),
        }
    }
}

impl fmt::Display for DeviceSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cpu => f.write_str("cpu"),
            Self::Gpu => f.write_str("gpu"),
            Self::Cuda(n) => write!(f, "cuda:{n}"),
        }
    }
}

/// Returns true if `context` names a device this crate understands.
#[must_use]
pub fn is_valid_context(context: &str) -> bool {
    context.parse::<DeviceSpec>().is_ok()
}
