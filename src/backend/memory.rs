//! In-process hypervisor used by command tests.

use std::cell::RefCell;

use super::{DomainRecord, Hypervisor};
use crate::config::NetworkSettings;
use crate::error::LabError;

#[derive(Debug, Clone)]
struct MemoryDomain {
    record: DomainRecord,
    disk: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryNetwork {
    pub name: String,
    pub active: bool,
    pub autostart: bool,
}

#[derive(Debug, Default)]
pub struct MemoryBackend {
    domains: RefCell<Vec<MemoryDomain>>,
    volumes: RefCell<Vec<String>>,
    network: RefCell<Option<MemoryNetwork>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a domain with a file-backed disk at `/images/<name>.qcow2`.
    pub fn add_domain(&self, name: &str, description: &str, running: bool) {
        let disk = format!("/images/{name}.qcow2");
        self.volumes.borrow_mut().push(disk.clone());
        self.domains.borrow_mut().push(MemoryDomain {
            record: DomainRecord {
                name: name.into(),
                description: description.into(),
                running,
            },
            disk: Some(disk),
        });
    }

    pub fn set_network(&self, network: MemoryNetwork) {
        *self.network.borrow_mut() = Some(network);
    }

    pub fn network(&self) -> Option<MemoryNetwork> {
        self.network.borrow().clone()
    }

    pub fn volumes(&self) -> Vec<String> {
        self.volumes.borrow().clone()
    }

    fn with_domain<T>(
        &self,
        name: &str,
        f: impl FnOnce(&mut MemoryDomain) -> T,
    ) -> Result<T, LabError> {
        let mut domains = self.domains.borrow_mut();
        let dom = domains
            .iter_mut()
            .find(|d| d.record.name == name)
            .ok_or_else(|| LabError::DomainNotFound { name: name.into() })?;
        Ok(f(dom))
    }
}

impl Hypervisor for MemoryBackend {
    fn domains(&self) -> Result<Vec<DomainRecord>, LabError> {
        Ok(self
            .domains
            .borrow()
            .iter()
            .map(|d| d.record.clone())
            .collect())
    }

    fn domain(&self, name: &str) -> Result<DomainRecord, LabError> {
        self.with_domain(name, |d| d.record.clone())
    }

    fn start(&self, name: &str) -> Result<(), LabError> {
        self.with_domain(name, |d| d.record.running = true)
    }

    fn destroy(&self, name: &str) -> Result<(), LabError> {
        self.with_domain(name, |d| d.record.running = false)
    }

    fn undefine(&self, name: &str) -> Result<(), LabError> {
        let running = self.with_domain(name, |d| d.record.running)?;
        if running {
            return Err(LabError::Libvirt {
                message: format!("cannot undefine running domain '{name}'"),
                hint: "stop it first".into(),
            });
        }
        self.domains.borrow_mut().retain(|d| d.record.name != name);
        Ok(())
    }

    fn disk_path(&self, name: &str) -> Result<Option<String>, LabError> {
        self.with_domain(name, |d| d.disk.clone())
    }

    fn delete_volume(&self, path: &str) -> Result<(), LabError> {
        let mut volumes = self.volumes.borrow_mut();
        let before = volumes.len();
        volumes.retain(|v| v != path);
        if volumes.len() == before {
            return Err(LabError::Libvirt {
                message: format!("no storage volume for {path}"),
                hint: String::new(),
            });
        }
        Ok(())
    }

    fn ensure_network(&self, net: &NetworkSettings) -> Result<(), LabError> {
        let mut network = self.network.borrow_mut();
        let network = network.get_or_insert_with(|| MemoryNetwork {
            name: net.name.clone(),
            active: false,
            autostart: true,
        });
        network.active = true;
        Ok(())
    }
}
