pub mod libvirt;

#[cfg(test)]
pub mod memory;

use crate::config::NetworkSettings;
use crate::error::LabError;

/// A domain as reported by the hypervisor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainRecord {
    pub name: String,
    /// Raw `<description>` text, empty when the domain has none.
    pub description: String,
    pub running: bool,
}

/// Primitive hypervisor operations the commands are built from.
///
/// Every lookup by name returns `LabError::DomainNotFound` when the domain
/// does not exist, and some other error for anything else.
pub trait Hypervisor {
    fn domains(&self) -> Result<Vec<DomainRecord>, LabError>;
    fn domain(&self, name: &str) -> Result<DomainRecord, LabError>;
    fn start(&self, name: &str) -> Result<(), LabError>;
    /// Hard power-off.
    fn destroy(&self, name: &str) -> Result<(), LabError>;
    fn undefine(&self, name: &str) -> Result<(), LabError>;
    /// Path of the domain's primary disk image, if it is file-backed.
    fn disk_path(&self, name: &str) -> Result<Option<String>, LabError>;
    fn delete_volume(&self, path: &str) -> Result<(), LabError>;
    /// Define the managed network if missing, then start it if inactive.
    fn ensure_network(&self, net: &NetworkSettings) -> Result<(), LabError>;
}

pub fn create_backend(uri: &str) -> Result<libvirt::LibvirtBackend, LabError> {
    libvirt::LibvirtBackend::connect(uri)
}
