//! Device-side data model and the query seam the monitor polls through.

use derive_more::Display;

use crate::error::IdleResult;

/// How a process uses the GPU.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum ProcessKind {
    #[display("compute")]
    Compute,
    #[display("graphics")]
    Graphics,
    #[display("unknown")]
    Unknown,
}

/// One process currently running on a device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessSample {
    pub name: String,
    pub pid: u32,
    /// Bytes, when the driver reports it
    pub memory_used: Option<u64>,
    pub kind: ProcessKind,
}

impl ProcessSample {
    pub fn new(name: impl Into<String>, pid: u32, kind: ProcessKind) -> Self {
        Self {
            name: name.into(),
            pid,
            memory_used: None,
            kind,
        }
    }

    pub fn with_memory_used(mut self, bytes: u64) -> Self {
        self.memory_used = Some(bytes);
        self
    }
}

/// Running processes of every device, indexed by device.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceSnapshot {
    pub devices: Vec<Vec<ProcessSample>>,
}

impl DeviceSnapshot {
    pub fn new(devices: Vec<Vec<ProcessSample>>) -> Self {
        Self { devices }
    }

    /// Query every device in index order.
    pub fn capture<Q: DeviceQuery + ?Sized>(query: &Q, device_count: u32) -> IdleResult<Self> {
        let devices = (0..device_count)
            .map(|index| query.running_processes(index))
            .collect::<IdleResult<Vec<_>>>()?;
        Ok(Self { devices })
    }

    pub fn device_count(&self) -> usize {
        self.devices.len()
    }
}

/// Source of GPU process information.
pub trait DeviceQuery {
    /// Number of devices; read once at startup.
    fn device_count(&self) -> IdleResult<u32>;

    /// Processes currently using the device at `index`.
    fn running_processes(&self, index: u32) -> IdleResult<Vec<ProcessSample>>;
}

impl<Q: DeviceQuery + ?Sized> DeviceQuery for Box<Q> {
    fn device_count(&self) -> IdleResult<u32> {
        (**self).device_count()
    }

    fn running_processes(&self, index: u32) -> IdleResult<Vec<ProcessSample>> {
        (**self).running_processes(index)
    }
}
