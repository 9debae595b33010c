//! NVIDIA Management Library (NVML) backed device queries

use std::collections::HashSet;

use error_stack::Report;
use nvml_wrapper::enums::device::UsedGpuMemory;
use nvml_wrapper::struct_wrappers::device::ProcessInfo;
use nvml_wrapper::Nvml;

use crate::device::DeviceQuery;
use crate::device::ProcessKind;
use crate::device::ProcessSample;
use crate::error::IdleError;
use crate::error::IdleResult;

const PROCESS_NAME_MAX_LEN: usize = 256;

pub struct NvmlDeviceQuery {
    nvml: Nvml,
}

impl NvmlDeviceQuery {
    /// Load NVML and log the devices it reports.
    pub fn init() -> IdleResult<Self> {
        let query = Self { nvml: init_nvml()? };

        let device_count = query.device_count()?;
        tracing::info!("Discovered {} GPU device(s)", device_count);
        for index in 0..device_count {
            let name = query
                .nvml
                .device_by_index(index)
                .and_then(|device| device.name());
            match name {
                Ok(name) => tracing::info!("Found GPU {}: {}", index, name),
                Err(e) => tracing::warn!("Failed to read name of GPU {}: {}", index, e),
            }
        }

        Ok(query)
    }

    fn process_name(&self, pid: u32) -> String {
        match self.nvml.sys_process_name(pid, PROCESS_NAME_MAX_LEN) {
            Ok(name) => name,
            // The pid can exit between the process listing and this lookup.
            // An empty name matches no ordinary pattern, so the GPU stays busy.
            Err(e) => {
                tracing::debug!("Failed to resolve name of pid {}: {}", pid, e);
                String::new()
            }
        }
    }

    fn sample(&self, info: &ProcessInfo, kind: ProcessKind) -> ProcessSample {
        ProcessSample {
            name: self.process_name(info.pid),
            pid: info.pid,
            memory_used: match info.used_gpu_memory {
                UsedGpuMemory::Used(bytes) => Some(bytes),
                UsedGpuMemory::Unavailable => None,
            },
            kind,
        }
    }
}

impl DeviceQuery for NvmlDeviceQuery {
    fn device_count(&self) -> IdleResult<u32> {
        self.nvml.device_count().map_err(|e| {
            Report::new(IdleError::Init).attach_printable(format!("nvmlDeviceGetCount: {e}"))
        })
    }

    fn running_processes(&self, index: u32) -> IdleResult<Vec<ProcessSample>> {
        let query_error = |call: &str, e: nvml_wrapper::error::NvmlError| {
            Report::new(IdleError::DeviceQuery { index }).attach_printable(format!("{call}: {e}"))
        };

        let device = self
            .nvml
            .device_by_index(index)
            .map_err(|e| query_error("nvmlDeviceGetHandleByIndex", e))?;
        let compute = device
            .running_compute_processes()
            .map_err(|e| query_error("nvmlDeviceGetComputeRunningProcesses", e))?;
        let graphics = device
            .running_graphics_processes()
            .map_err(|e| query_error("nvmlDeviceGetGraphicsRunningProcesses", e))?;

        let mut seen = HashSet::with_capacity(compute.len());
        let mut samples = Vec::with_capacity(compute.len() + graphics.len());
        for info in &compute {
            seen.insert(info.pid);
            samples.push(self.sample(info, ProcessKind::Compute));
        }
        for info in graphics.iter().filter(|info| !seen.contains(&info.pid)) {
            samples.push(self.sample(info, ProcessKind::Graphics));
        }

        Ok(samples)
    }
}

fn init_nvml() -> IdleResult<Nvml> {
    match Nvml::init() {
        Ok(nvml) => {
            tracing::info!("NVML initialized successfully");
            Ok(nvml)
        }
        Err(_) => {
            tracing::warn!("Standard NVML init failed, trying with explicit library path");
            let nvml = Nvml::builder()
                .lib_path(std::ffi::OsStr::new("libnvidia-ml.so.1"))
                .init()
                .map_err(|e| {
                    Report::new(IdleError::Init).attach_printable(format!("nvmlInit: {e}"))
                })?;
            tracing::info!("NVML initialized with explicit library path");
            Ok(nvml)
        }
    }
}
