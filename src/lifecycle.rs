//! Power and removal operations on existing VMs.

use crate::backend::Hypervisor;
use crate::error::LabError;

pub fn start(hv: &impl Hypervisor, name: &str) -> Result<(), LabError> {
    if hv.domain(name)?.running {
        return Err(LabError::AlreadyInState {
            name: name.into(),
            state: "running",
        });
    }
    hv.start(name)?;
    tracing::info!(name, "VM started");
    Ok(())
}

/// Hard power-off, same as pulling the plug.
pub fn stop(hv: &impl Hypervisor, name: &str) -> Result<(), LabError> {
    if !hv.domain(name)?.running {
        return Err(LabError::AlreadyInState {
            name: name.into(),
            state: "stopped",
        });
    }
    hv.destroy(name)?;
    tracing::info!(name, "VM stopped");
    Ok(())
}

/// Force-stop if needed, undefine, then delete the backing volume.
pub fn remove(hv: &impl Hypervisor, name: &str) -> Result<(), LabError> {
    let record = hv.domain(name)?;
    // Read before undefine; the XML is gone afterwards.
    let disk = hv.disk_path(name)?;

    if record.running {
        tracing::info!(name, "stopping VM before removal");
        hv.destroy(name)?;
    }
    hv.undefine(name)?;
    tracing::info!(name, "domain undefined");

    match disk {
        Some(path) => {
            hv.delete_volume(&path)?;
            tracing::info!(name, path = %path, "deleted disk volume");
        }
        None => tracing::warn!(name, "no file-backed disk found, nothing to delete"),
    }
    Ok(())
}
