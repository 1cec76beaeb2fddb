use std::net::Ipv4Addr;
use std::path::{Path, PathBuf};

use facet::Facet;

use crate::address::AddressRange;
use crate::error::LabError;
use crate::paths;

// ── file model ────────────────────────────────────────────

/// On-disk config. Every key is optional; missing keys keep the defaults below.
#[derive(Debug, Clone, Facet)]
#[facet(default)]
pub struct Config {
    #[facet(default = "/usr/bin/virt-install")]
    pub virt_install_path: String,
    #[facet(default)]
    pub ansible_public_key: String,
    #[facet(default = "~/.ssh/labcli_private")]
    pub ansible_private_key_path: String,
    #[facet(default = "/usr/bin/ssh")]
    pub ssh_path: String,
    #[facet(default = "qemu:///system")]
    pub libvirt_uri: String,
    #[facet(default)]
    pub network: NetworkConfig,
    #[facet(default)]
    pub debian: DebianConfig,
    #[facet(default)]
    pub centos: CentosConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            virt_install_path: "/usr/bin/virt-install".into(),
            ansible_public_key: String::new(),
            ansible_private_key_path: "~/.ssh/labcli_private".into(),
            ssh_path: "/usr/bin/ssh".into(),
            libvirt_uri: "qemu:///system".into(),
            network: NetworkConfig::default(),
            debian: DebianConfig::default(),
            centos: CentosConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Facet)]
#[facet(default)]
pub struct NetworkConfig {
    #[facet(default = "labnet")]
    pub name: String,
    #[facet(default = "lab.local")]
    pub domain: String,
    #[facet(default = "virbr100")]
    pub bridge_name: String,
    #[facet(default = "192.168.100.1")]
    pub address: String,
    #[facet(default = "255.255.255.0")]
    pub netmask: String,
    #[facet(default = "192.168.100.10")]
    pub range_start: String,
    #[facet(default = "192.168.100.200")]
    pub range_end: String,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            name: "labnet".into(),
            domain: "lab.local".into(),
            bridge_name: "virbr100".into(),
            address: "192.168.100.1".into(),
            netmask: "255.255.255.0".into(),
            range_start: "192.168.100.10".into(),
            range_end: "192.168.100.200".into(),
        }
    }
}

/// Installer source for Debian-family guests.
#[derive(Debug, Clone, Facet)]
#[facet(default)]
pub struct DebianConfig {
    #[facet(default = "http://ftp.se.debian.org/debian/dists/buster/main/installer-amd64/")]
    pub location: String,
}

impl Default for DebianConfig {
    fn default() -> Self {
        Self {
            location: "http://ftp.se.debian.org/debian/dists/buster/main/installer-amd64/".into(),
        }
    }
}

/// Installer source for Red-Hat-family guests.
#[derive(Debug, Clone, Facet)]
#[facet(default)]
pub struct CentosConfig {
    #[facet(default = "http://mirror.nsc.liu.se/CentOS/8/BaseOS/x86_64/kickstart/")]
    pub location: String,
}

impl Default for CentosConfig {
    fn default() -> Self {
        Self {
            location: "http://mirror.nsc.liu.se/CentOS/8/BaseOS/x86_64/kickstart/".into(),
        }
    }
}

// ── Settings ──────────────────────────────────────────────

/// Resolved managed-network parameters with typed addresses.
#[derive(Debug, Clone)]
pub struct NetworkSettings {
    pub name: String,
    pub domain: String,
    pub bridge_name: String,
    /// Host side of the bridge; doubles as the guests' gateway.
    pub address: Ipv4Addr,
    pub netmask: Ipv4Addr,
    pub range: AddressRange,
}

/// Validated runtime config, built once at startup and passed by reference.
#[derive(Debug, Clone)]
pub struct Settings {
    pub libvirt_uri: String,
    pub virt_install_path: PathBuf,
    pub ssh_path: PathBuf,
    pub public_key: String,
    pub private_key_path: PathBuf,
    pub templates_dir: PathBuf,
    pub network: NetworkSettings,
    pub debian_location: String,
    pub centos_location: String,
}

impl Settings {
    /// Validate `config` and resolve it against the directory of `config_path`.
    pub fn resolve(config: Config, config_path: &Path) -> Result<Self, LabError> {
        let net = &config.network;
        if net.name.is_empty() {
            return Err(LabError::Validation {
                message: "network.name must not be empty".into(),
            });
        }

        let address = parse_ipv4("network.address", &net.address)?;
        let netmask = parse_ipv4("network.netmask", &net.netmask)?;
        let range = AddressRange::new(
            parse_ipv4("network.range_start", &net.range_start)?,
            parse_ipv4("network.range_end", &net.range_end)?,
        )?;
        if range.contains(address) {
            return Err(LabError::Validation {
                message: format!(
                    "network.address {address} lies inside the VM range {}-{}",
                    range.start, range.end
                ),
            });
        }

        if config.ansible_public_key.trim().is_empty() {
            tracing::warn!("ansible_public_key is empty; new VMs will not accept key logins");
        }

        Ok(Self {
            libvirt_uri: config.libvirt_uri,
            virt_install_path: paths::expand_home(&config.virt_install_path),
            ssh_path: paths::expand_home(&config.ssh_path),
            public_key: config.ansible_public_key.trim().to_string(),
            private_key_path: paths::expand_home(&config.ansible_private_key_path),
            templates_dir: paths::templates_dir(config_path),
            network: NetworkSettings {
                name: config.network.name,
                domain: config.network.domain,
                bridge_name: config.network.bridge_name,
                address,
                netmask,
                range,
            },
            debian_location: config.debian.location,
            centos_location: config.centos.location,
        })
    }
}

fn parse_ipv4(key: &str, value: &str) -> Result<Ipv4Addr, LabError> {
    value.trim().parse().map_err(|_| LabError::Validation {
        message: format!("{key} must be an IPv4 address (got '{value}')"),
    })
}

// ── public API ────────────────────────────────────────────

pub fn parse_config(contents: &str, path: &Path) -> Result<Config, LabError> {
    facet_toml::from_str(contents).map_err(|e| LabError::ConfigParse {
        path: path.display().to_string(),
        message: e.to_string(),
    })
}

pub fn load_config(path: &Path) -> Result<Settings, LabError> {
    let contents = std::fs::read_to_string(path).map_err(|source| LabError::ConfigLoad {
        path: path.display().to_string(),
        source,
    })?;

    let config = parse_config(&contents, path)?;
    tracing::debug!(path = %path.display(), "loaded config");
    Settings::resolve(config, path)
}
