//! Compute device capability
//!
//! Resolved once at startup and injected into every component that cares;
//! nothing re-derives device state ad hoc. The probe only shapes data-loading
//! options and run metadata: all arithmetic in this crate runs on the CPU.

use std::path::Path;

/// Resolved compute capability
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComputeDevice {
    /// Plain CPU execution
    Cpu,
    /// An accelerator (NVIDIA driver) is present on the host
    Accelerator,
}

impl ComputeDevice {
    /// Resolve the device once: accelerator when available and not disabled
    pub fn select(disable_accelerator: bool) -> Self {
        if !disable_accelerator && accelerator_available() {
            ComputeDevice::Accelerator
        } else {
            ComputeDevice::Cpu
        }
    }

    /// Whether accelerated hardware is in use
    pub fn is_accelerator(self) -> bool {
        self == ComputeDevice::Accelerator
    }

    /// Short name for logs and run tags
    pub fn name(self) -> &'static str {
        match self {
            ComputeDevice::Cpu => "cpu",
            ComputeDevice::Accelerator => "accelerator",
        }
    }
}

fn accelerator_available() -> bool {
    Path::new("/dev/nvidia0").exists() || Path::new("/proc/driver/nvidia/version").exists()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disable_forces_cpu() {
        assert_eq!(ComputeDevice::select(true), ComputeDevice::Cpu);
    }

    #[test]
    fn test_device_names() {
        assert_eq!(ComputeDevice::Cpu.name(), "cpu");
        assert_eq!(ComputeDevice::Accelerator.name(), "accelerator");
        assert!(!ComputeDevice::Cpu.is_accelerator());
        assert!(ComputeDevice::Accelerator.is_accelerator());
    }
}
