use std::net::Ipv4Addr;
use std::path::Path;
use std::process::{Command, Stdio};

use crate::backend::Hypervisor;
use crate::config::Settings;
use crate::description::DescriptionCodec;
use crate::error::LabError;
use crate::inventory::{self, REMOTE_USER};

/// Arguments for an interactive `ssh` session to `address`.
pub fn ssh_args(private_key: &Path, address: Ipv4Addr) -> Vec<String> {
    vec![
        "-q".into(),
        "-o".into(),
        "StrictHostKeyChecking=no".into(),
        "-i".into(),
        private_key.display().to_string(),
        format!("{REMOTE_USER}@{address}"),
    ]
}

/// Address to connect to: the VM must exist, be running and carry a valid address.
pub fn target_address(
    hv: &impl Hypervisor,
    codec: &impl DescriptionCodec,
    name: &str,
) -> Result<Ipv4Addr, LabError> {
    let record = hv.domain(name)?;
    if !record.running {
        return Err(LabError::NotRunning { name: name.into() });
    }
    let vm = inventory::summarize(record, codec)?;
    vm.address.ok_or_else(|| LabError::Validation {
        message: format!("'{name}' has no valid IPv4 address in its description"),
    })
}

/// Open an interactive session to `address` and return ssh's exit code.
pub fn session(settings: &Settings, address: Ipv4Addr) -> Result<i32, LabError> {
    let args = ssh_args(&settings.private_key_path, address);
    tracing::debug!(ssh = %settings.ssh_path.display(), ?args, "opening ssh session");

    let status = Command::new(&settings.ssh_path)
        .args(&args)
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status()
        .map_err(|e| LabError::Io {
            context: format!("running {}", settings.ssh_path.display()),
            source: e,
        })?;

    // Killed by a signal: report the conventional shell code.
    Ok(status.code().unwrap_or(255))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::memory::MemoryBackend;
    use crate::description::TagCodec;

    #[test]
    fn args_use_key_and_fixed_user() {
        let args = ssh_args(
            Path::new("/home/ops/.ssh/labcli_private"),
            Ipv4Addr::new(192, 168, 100, 12),
        );
        assert_eq!(
            args,
            [
                "-q",
                "-o",
                "StrictHostKeyChecking=no",
                "-i",
                "/home/ops/.ssh/labcli_private",
                "ansible@192.168.100.12",
            ]
        );
    }

    #[test]
    fn target_of_running_vm() {
        let hv = MemoryBackend::new();
        hv.add_domain("web1", "labcli:192.168.100.12:web", true);
        let addr = target_address(&hv, &TagCodec::default(), "web1").unwrap();
        assert_eq!(addr, Ipv4Addr::new(192, 168, 100, 12));
    }

    #[test]
    fn stopped_vm_is_rejected() {
        let hv = MemoryBackend::new();
        hv.add_domain("web1", "labcli:192.168.100.12:web", false);
        let err = target_address(&hv, &TagCodec::default(), "web1").unwrap_err();
        assert!(matches!(err, LabError::NotRunning { .. }));
    }

    #[test]
    fn unmanaged_vm_is_rejected() {
        let hv = MemoryBackend::new();
        hv.add_domain("desktop", "", true);
        let err = target_address(&hv, &TagCodec::default(), "desktop").unwrap_err();
        assert!(matches!(err, LabError::DescriptionParse { .. }));
    }

    #[test]
    fn missing_vm_is_not_found() {
        let hv = MemoryBackend::new();
        let err = target_address(&hv, &TagCodec::default(), "ghost").unwrap_err();
        assert!(matches!(err, LabError::DomainNotFound { .. }));
    }
}
