//! Compute device identifiers.

use std::fmt;

/// The execution device a model handle is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Device {
    #[default]
    Cpu,
    /// NVIDIA GPU by ordinal.
    Cuda(usize),
    /// Apple GPU.
    Metal,
}

impl Device {
    pub fn is_accelerated(&self) -> bool {
        !matches!(self, Device::Cpu)
    }

    /// Number of conversions the device runs at once by default.
    ///
    /// CPU work spreads over the available cores; an accelerator serializes
    /// model calls.
    pub fn default_capacity(&self) -> usize {
        match self {
            Device::Cpu => std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
            Device::Cuda(_) | Device::Metal => 1,
        }
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Device::Cpu => write!(f, "cpu"),
            Device::Cuda(i) => write!(f, "cuda:{i}"),
            Device::Metal => write!(f, "metal"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_display() {
        assert_eq!(Device::Cpu.to_string(), "cpu");
        assert_eq!(Device::Cuda(1).to_string(), "cuda:1");
        assert_eq!(Device::Metal.to_string(), "metal");
        assert!(!Device::default().is_accelerated());
        assert!(Device::Cuda(0).is_accelerated());
        assert!(Device::Cpu.default_capacity() >= 1);
        assert_eq!(Device::Metal.default_capacity(), 1);
    }
}
