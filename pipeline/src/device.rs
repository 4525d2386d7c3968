//! Compute device selection and admission.
//!
//! The device is chosen once per process from a [`DeviceSelection`]
//! preference and a [`DeviceProbe`]. [`DeviceSlots`] bounds how many
//! conversions run on it at once.

use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

pub use voxclone_speech::Device;

/// Device selection preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum DeviceSelection {
    /// Pick the best device the probe reports.
    #[default]
    Auto,
    Cpu,
    Cuda(usize),
    Metal,
}

impl FromStr for DeviceSelection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_ascii_lowercase();
        match s.as_str() {
            "" | "auto" => Ok(DeviceSelection::Auto),
            "cpu" => Ok(DeviceSelection::Cpu),
            "metal" | "mps" => Ok(DeviceSelection::Metal),
            "cuda" | "gpu" => Ok(DeviceSelection::Cuda(0)),
            other => match other.strip_prefix("cuda:") {
                Some(index) => index
                    .parse()
                    .map(DeviceSelection::Cuda)
                    .map_err(|_| format!("invalid cuda device index: {index}")),
                None => Err(format!("unknown device: {other}")),
            },
        }
    }
}

impl TryFrom<String> for DeviceSelection {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<DeviceSelection> for String {
    fn from(d: DeviceSelection) -> Self {
        d.to_string()
    }
}

impl fmt::Display for DeviceSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceSelection::Auto => write!(f, "auto"),
            DeviceSelection::Cpu => write!(f, "cpu"),
            DeviceSelection::Cuda(i) => write!(f, "cuda:{i}"),
            DeviceSelection::Metal => write!(f, "metal"),
        }
    }
}

/// Accelerators visible to the process.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Capabilities {
    pub cuda_devices: usize,
    pub metal: bool,
}

/// Reports which accelerators are usable.
pub trait DeviceProbe {
    fn probe(&self) -> Result<Capabilities, String>;
}

/// Probes the host: NVIDIA driver nodes, `CUDA_VISIBLE_DEVICES`, and
/// Apple Silicon.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemProbe;

impl DeviceProbe for SystemProbe {
    fn probe(&self) -> Result<Capabilities, String> {
        let metal = cfg!(all(target_os = "macos", target_arch = "aarch64"));

        if !Path::new("/proc/driver/nvidia/version").exists() {
            return Ok(Capabilities {
                cuda_devices: 0,
                metal,
            });
        }

        let cuda_devices = match std::env::var("CUDA_VISIBLE_DEVICES") {
            Ok(v) => v
                .split(',')
                .map(str::trim)
                .take_while(|id| !id.is_empty() && !id.starts_with('-'))
                .count(),
            Err(_) => match std::fs::read_dir("/proc/driver/nvidia/gpus") {
                Ok(entries) => entries.filter_map(Result::ok).count(),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => 1,
                Err(e) => return Err(format!("read /proc/driver/nvidia/gpus: {e}")),
            },
        };

        Ok(Capabilities {
            cuda_devices,
            metal,
        })
    }
}

/// Selects the process-wide device.
///
/// A forced accelerator the probe does not report, or a failing probe,
/// falls back to [`Device::Cpu`] with a warning.
pub fn select_device(preference: DeviceSelection, probe: &dyn DeviceProbe) -> Device {
    let caps = match probe.probe() {
        Ok(caps) => caps,
        Err(e) => {
            warn!(error = %e, "device probe failed, falling back to cpu");
            return Device::Cpu;
        }
    };

    let device = match preference {
        DeviceSelection::Cpu => Device::Cpu,
        DeviceSelection::Cuda(i) if i < caps.cuda_devices => Device::Cuda(i),
        DeviceSelection::Cuda(i) => {
            warn!(index = i, available = caps.cuda_devices, "cuda device not available, falling back to cpu");
            Device::Cpu
        }
        DeviceSelection::Metal if caps.metal => Device::Metal,
        DeviceSelection::Metal => {
            warn!("metal not available, falling back to cpu");
            Device::Cpu
        }
        DeviceSelection::Auto if caps.cuda_devices > 0 => Device::Cuda(0),
        DeviceSelection::Auto if caps.metal => Device::Metal,
        DeviceSelection::Auto => Device::Cpu,
    };
    info!(preference = %preference, device = %device, "compute device selected");
    device
}

/// A bounded pool of permits for work on the selected device.
///
/// Acquisition waits up to the configured timeout; callers treat a
/// timeout as resource exhaustion.
pub struct DeviceSlots {
    in_use: Mutex<usize>,
    freed: Condvar,
    capacity: usize,
    timeout: Duration,
}

impl DeviceSlots {
    pub fn new(capacity: usize, timeout: Duration) -> Self {
        Self {
            in_use: Mutex::new(0),
            freed: Condvar::new(),
            capacity: capacity.max(1),
            timeout,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Returns the number of permits currently held.
    pub fn in_use(&self) -> usize {
        *self.in_use.lock()
    }

    /// Takes a permit, waiting at most the configured timeout.
    pub fn acquire(&self) -> Option<SlotGuard<'_>> {
        let deadline = Instant::now() + self.timeout;
        let mut in_use = self.in_use.lock();
        while *in_use >= self.capacity {
            if self.freed.wait_until(&mut in_use, deadline).timed_out() && *in_use >= self.capacity {
                return None;
            }
        }
        *in_use += 1;
        Some(SlotGuard { slots: self })
    }
}

/// A held device permit, released on drop.
pub struct SlotGuard<'a> {
    slots: &'a DeviceSlots,
}

impl Drop for SlotGuard<'_> {
    fn drop(&mut self) {
        let mut in_use = self.slots.in_use.lock();
        *in_use -= 1;
        self.slots.freed.notify_one();
    }
}
