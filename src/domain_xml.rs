//! Libvirt domain XML reading using facet-xml struct deserialization.
//!
//! Only the fields lab-cli reads back are modelled; every other element and
//! attribute libvirt emits is skipped by the deserializer.

use facet::Facet;
use facet_xml as xml;

use crate::error::LabError;

// ── XML model structs ──────────────────────────────────────

#[derive(Debug, Facet)]
#[facet(rename = "domain")]
pub struct DomainDef {
    #[facet(default)]
    description: Option<String>,
    #[facet(default)]
    devices: Option<Devices>,
}

#[derive(Debug, Facet)]
struct Devices {
    #[facet(xml::elements, rename = "disk")]
    #[facet(default)]
    disks: Vec<Disk>,
}

#[derive(Debug, Facet)]
struct Disk {
    #[facet(xml::attribute)]
    #[facet(default)]
    device: Option<String>,
    #[facet(default)]
    source: Option<DiskSource>,
}

#[derive(Debug, Facet)]
struct DiskSource {
    #[facet(xml::attribute)]
    #[facet(default)]
    file: Option<String>,
}

// ── public API ─────────────────────────────────────────────

impl DomainDef {
    pub fn parse(xml: &str) -> Result<Self, LabError> {
        facet_xml::from_str(xml).map_err(|e| LabError::DomainXml {
            message: e.to_string(),
        })
    }

    /// Text of the top-level `<description>`, or `""` when absent.
    pub fn description(&self) -> &str {
        self.description.as_deref().unwrap_or_default()
    }

    /// Source file of the first `<disk device='disk'>`; cdroms and floppies are skipped.
    pub fn disk_source(&self) -> Option<&str> {
        self.devices
            .iter()
            .flat_map(|d| &d.disks)
            .filter(|d| d.device.as_deref() == Some("disk"))
            .find_map(|d| d.source.as_ref()?.file.as_deref())
    }
}
