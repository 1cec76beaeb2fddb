use virt::connect::Connect;
use virt::domain::Domain;
use virt::error as virt_error;
use virt::network::Network;
use virt::storage_vol::StorageVol;

use crate::config::NetworkSettings;
use crate::domain_xml::DomainDef;
use crate::error::LabError;
use crate::network_xml;

struct ConnGuard(Connect);

impl std::ops::Deref for ConnGuard {
    type Target = Connect;
    fn deref(&self) -> &Connect {
        &self.0
    }
}

impl Drop for ConnGuard {
    fn drop(&mut self) {
        self.0.close().ok();
    }
}

/// Hypervisor backed by one libvirt connection, opened per command.
pub struct LibvirtBackend {
    conn: ConnGuard,
    uri: String,
}

impl LibvirtBackend {
    pub fn connect(uri: &str) -> Result<Self, LabError> {
        // Suppress libvirt's default error handler that prints to stderr.
        virt_error::clear_error_callback();

        let conn = Connect::open(Some(uri)).map_err(|e| LabError::Libvirt {
            message: format!("failed to connect to libvirt: {e}"),
            hint: format!("ensure libvirtd is running and you have access to {uri}"),
        })?;
        tracing::debug!(uri, "connected to libvirt");

        Ok(Self {
            conn: ConnGuard(conn),
            uri: uri.to_string(),
        })
    }

    fn lookup(&self, name: &str) -> Result<Domain, LabError> {
        Domain::lookup_by_name(&self.conn, name).map_err(|e| {
            if is_not_found(&e, "Domain not found") {
                LabError::DomainNotFound { name: name.into() }
            } else {
                LabError::Libvirt {
                    message: format!("domain lookup failed: {e}"),
                    hint: format!("check `virsh -c {} dominfo {name}`", self.uri),
                }
            }
        })
    }

    fn record(&self, dom: &Domain) -> Result<DomainRecordParts, LabError> {
        let name = dom.get_name().map_err(|e| LabError::Libvirt {
            message: format!("failed to read domain name: {e}"),
            hint: "check libvirt permissions".into(),
        })?;
        let xml = dom.get_xml_desc(0).map_err(|e| LabError::Libvirt {
            message: format!("failed to read XML of '{name}': {e}"),
            hint: "check libvirt permissions".into(),
        })?;
        let running = dom.is_active().map_err(|e| LabError::Libvirt {
            message: format!("failed to read state of '{name}': {e}"),
            hint: "check libvirt permissions".into(),
        })?;
        Ok(DomainRecordParts { name, xml, running })
    }
}

struct DomainRecordParts {
    name: String,
    xml: String,
    running: bool,
}

impl TryFrom<DomainRecordParts> for super::DomainRecord {
    type Error = LabError;

    fn try_from(parts: DomainRecordParts) -> Result<Self, LabError> {
        let def = DomainDef::parse(&parts.xml)?;
        Ok(Self {
            description: def.description().to_string(),
            name: parts.name,
            running: parts.running,
        })
    }
}

impl super::Hypervisor for LibvirtBackend {
    fn domains(&self) -> Result<Vec<super::DomainRecord>, LabError> {
        let domains = self.conn.list_all_domains(0).map_err(|e| LabError::Libvirt {
            message: format!("failed to list domains: {e}"),
            hint: format!("check `virsh -c {} list --all`", self.uri),
        })?;

        domains
            .iter()
            .map(|dom| super::DomainRecord::try_from(self.record(dom)?))
            .collect()
    }

    fn domain(&self, name: &str) -> Result<super::DomainRecord, LabError> {
        let dom = self.lookup(name)?;
        self.record(&dom)?.try_into()
    }

    fn start(&self, name: &str) -> Result<(), LabError> {
        self.lookup(name)?.create().map_err(|e| LabError::Libvirt {
            message: format!("failed to start '{name}': {e}"),
            hint: format!("check `virsh -c {} start {name}` for details", self.uri),
        })?;
        Ok(())
    }

    fn destroy(&self, name: &str) -> Result<(), LabError> {
        self.lookup(name)?.destroy().map_err(|e| LabError::Libvirt {
            message: format!("force stop of '{name}' failed: {e}"),
            hint: "check libvirt permissions".into(),
        })?;
        Ok(())
    }

    fn undefine(&self, name: &str) -> Result<(), LabError> {
        self.lookup(name)?.undefine().map_err(|e| LabError::Libvirt {
            message: format!("failed to undefine '{name}': {e}"),
            hint: "check libvirt permissions".into(),
        })?;
        Ok(())
    }

    fn disk_path(&self, name: &str) -> Result<Option<String>, LabError> {
        let dom = self.lookup(name)?;
        let parts = self.record(&dom)?;
        let def = DomainDef::parse(&parts.xml)?;
        Ok(def.disk_source().map(str::to_string))
    }

    fn delete_volume(&self, path: &str) -> Result<(), LabError> {
        let vol = StorageVol::lookup_by_path(&self.conn, path).map_err(|e| LabError::Libvirt {
            message: format!("no storage volume for {path}: {e}"),
            hint: "the disk may live outside a libvirt storage pool; remove it manually".into(),
        })?;
        vol.delete(0).map_err(|e| LabError::Libvirt {
            message: format!("failed to delete volume {path}: {e}"),
            hint: "check libvirt permissions".into(),
        })?;
        Ok(())
    }

    fn ensure_network(&self, net: &NetworkSettings) -> Result<(), LabError> {
        let network = match Network::lookup_by_name(&self.conn, &net.name) {
            Ok(network) => network,
            Err(e) if is_not_found(&e, "Network not found") => {
                tracing::info!(network = %net.name, "defining managed network");
                let xml = network_xml::generate_network_xml(net)?;
                let network =
                    Network::define_xml(&self.conn, &xml).map_err(|e| LabError::Libvirt {
                        message: format!("failed to define network '{}': {e}", net.name),
                        hint: format!(
                            "check that bridge {} and {} are not already in use",
                            net.bridge_name, net.address
                        ),
                    })?;
                network.set_autostart(true).map_err(|e| LabError::Libvirt {
                    message: format!("failed to mark network '{}' autostart: {e}", net.name),
                    hint: "check libvirt permissions".into(),
                })?;
                network
            }
            Err(e) => {
                return Err(LabError::Libvirt {
                    message: format!("network lookup failed: {e}"),
                    hint: format!("check `virsh -c {} net-list --all`", self.uri),
                });
            }
        };

        let active = network.is_active().map_err(|e| LabError::Libvirt {
            message: format!("failed to read state of network '{}': {e}", net.name),
            hint: "check libvirt permissions".into(),
        })?;
        if !active {
            tracing::info!(network = %net.name, "starting inactive network");
            network.create().map_err(|e| LabError::Libvirt {
                message: format!("failed to start network '{}': {e}", net.name),
                hint: format!("try `sudo virsh net-start {}`", net.name),
            })?;
        }

        Ok(())
    }
}

/// Libvirt reports missing objects through the message text, e.g.
/// "Domain not found: no domain with matching name 'web1'".
fn is_not_found(err: &virt_error::Error, marker: &str) -> bool {
    err.to_string().contains(marker)
}
