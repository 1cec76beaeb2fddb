//! `create`: allocate an address, render the install config, run the installer.

use std::net::Ipv4Addr;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::address;
use crate::backend::Hypervisor;
use crate::config::Settings;
use crate::description::{self, DescriptionCodec};
use crate::error::LabError;
use crate::inventory;
use crate::template::{self, InstallVars};

/// Group assigned when `--groups` is not given.
pub const DEFAULT_GROUP: &str = "ungrouped";

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Distro {
    Debian,
    Centos,
}

impl Distro {
    /// Name of the rendered install config. Debian's installer only picks up
    /// an injected preseed when it is called exactly `preseed.cfg`.
    pub fn config_file_name(self) -> &'static str {
        match self {
            Distro::Debian => "preseed.cfg",
            Distro::Centos => "kickstart.cfg",
        }
    }

    fn location(self, settings: &Settings) -> &str {
        match self {
            Distro::Debian => &settings.debian_location,
            Distro::Centos => &settings.centos_location,
        }
    }

    fn extra_args(self) -> String {
        match self {
            Distro::Debian => "auto".into(),
            Distro::Centos => format!("inst.ks=file:/{}", self.config_file_name()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CreateRequest {
    pub name: String,
    pub distro: Distro,
    pub ram_mb: u32,
    pub vcpus: u32,
    pub disk_gb: u32,
    pub groups: Vec<String>,
}

impl CreateRequest {
    /// Fill in the default group and reject values the installer or the
    /// description format cannot carry.
    pub fn validated(mut self) -> Result<Self, LabError> {
        validate_name(&self.name)?;
        if self.ram_mb < 256 {
            return Err(LabError::Validation {
                message: format!("ram must be at least 256 MB (got {})", self.ram_mb),
            });
        }
        if self.vcpus < 1 {
            return Err(LabError::Validation {
                message: "vcpus must be at least 1".into(),
            });
        }
        if self.disk_gb < 1 {
            return Err(LabError::Validation {
                message: "disk must be at least 1 GB".into(),
            });
        }

        if self.groups.is_empty() {
            self.groups.push(DEFAULT_GROUP.into());
        }
        for group in &self.groups {
            description::validate_group(group)?;
        }
        Ok(self)
    }
}

fn validate_name(name: &str) -> Result<(), LabError> {
    let valid = name
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphanumeric())
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '_' || c == '-');
    if !valid {
        return Err(LabError::Validation {
            message: format!("VM name must match [a-zA-Z0-9][a-zA-Z0-9._-]* (got '{name}')"),
        });
    }
    Ok(())
}

// ── installer ─────────────────────────────────────────────

/// Runs the OS installer to completion and returns its combined output.
pub trait Installer {
    fn install(&self, args: &[String]) -> Result<String, LabError>;
}

/// `virt-install`, run as a blocking child process.
pub struct VirtInstall {
    path: PathBuf,
}

impl VirtInstall {
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }
}

impl Installer for VirtInstall {
    fn install(&self, args: &[String]) -> Result<String, LabError> {
        tracing::info!(installer = %self.path.display(), ?args, "running installer");
        let output = Command::new(&self.path)
            .args(args)
            .output()
            .map_err(|e| LabError::Io {
                context: format!("running {}", self.path.display()),
                source: e,
            })?;

        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));

        if !output.status.success() {
            return Err(LabError::InstallerFailed {
                status: output.status.to_string(),
                output: combined,
            });
        }
        Ok(combined)
    }
}

/// Arguments for `virt-install`.
pub fn installer_args(
    settings: &Settings,
    request: &CreateRequest,
    description: &str,
    install_config: &Path,
) -> Vec<String> {
    let mut args: Vec<String> = vec![
        "--connect".into(),
        settings.libvirt_uri.clone(),
        "--name".into(),
        request.name.clone(),
        "--ram".into(),
        request.ram_mb.to_string(),
        "--vcpus".into(),
        request.vcpus.to_string(),
        "--disk".into(),
        format!("size={}", request.disk_gb),
        "--network".into(),
        format!("network={}", settings.network.name),
        "--metadata".into(),
        format!("description={description}"),
        "--noautoconsole".into(),
        "--initrd-inject".into(),
        install_config.display().to_string(),
    ];
    args.extend([
        "--extra-args".into(),
        request.distro.extra_args(),
        "--location".into(),
        request.distro.location(settings).to_string(),
    ]);
    args
}

// ── create ────────────────────────────────────────────────

#[derive(Debug)]
pub struct CreateOutcome {
    pub address: Ipv4Addr,
    pub installer_output: String,
}

pub fn create(
    hv: &impl Hypervisor,
    installer: &impl Installer,
    codec: &impl DescriptionCodec,
    settings: &Settings,
    request: CreateRequest,
) -> Result<CreateOutcome, LabError> {
    let request = request.validated()?;
    let name = &request.name;

    match hv.domain(name) {
        Ok(_) => return Err(LabError::AlreadyExists { name: name.clone() }),
        Err(LabError::DomainNotFound { .. }) => {}
        Err(e) => return Err(e),
    }

    hv.ensure_network(&settings.network)?;

    let used = inventory::used_addresses(hv, codec)?;
    let address = address::next_available(settings.network.range, &used)?;
    tracing::info!(name, %address, "allocated address");

    // Removed on drop, whichever way this function returns.
    let work = tempfile::tempdir().map_err(|e| LabError::Io {
        context: "creating temporary directory".into(),
        source: e,
    })?;
    let file_name = request.distro.config_file_name();
    let install_config = work.path().join(file_name);
    template::render_file(
        &settings.templates_dir.join(format!("{file_name}.tmpl")),
        &install_config,
        &InstallVars {
            hostname: name,
            domain: &settings.network.domain,
            address,
            netmask: settings.network.netmask,
            gateway: settings.network.address,
            public_key: &settings.public_key,
        },
    )?;

    let description = codec.encode(address, &request.groups);
    let args = installer_args(settings, &request, &description, &install_config);
    let installer_output = installer.install(&args)?;

    Ok(CreateOutcome {
        address,
        installer_output,
    })
}
