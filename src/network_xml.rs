//! Libvirt network XML generation using facet-xml struct serialization.

use facet::Facet;
use facet_xml as xml;

use crate::config::NetworkSettings;
use crate::error::LabError;

// ── XML model structs ──────────────────────────────────────

#[derive(Debug, Facet)]
#[facet(rename = "network")]
struct NetworkDef {
    name: String,
    forward: NetworkForward,
    bridge: NetworkBridge,
    ip: NetworkIp,
}

#[derive(Debug, Facet)]
struct NetworkForward {
    #[facet(xml::attribute)]
    mode: String,
}

#[derive(Debug, Facet)]
struct NetworkBridge {
    #[facet(xml::attribute)]
    name: String,
}

#[derive(Debug, Facet)]
struct NetworkIp {
    #[facet(xml::attribute)]
    address: String,
    #[facet(xml::attribute)]
    netmask: String,
}

// ── public API ─────────────────────────────────────────────

/// Generate libvirt network XML for the managed NAT network.
///
/// No DHCP range is declared: guests get static addresses from their
/// install config.
pub fn generate_network_xml(net: &NetworkSettings) -> Result<String, LabError> {
    let def = NetworkDef {
        name: net.name.clone(),
        forward: NetworkForward { mode: "nat".into() },
        bridge: NetworkBridge {
            name: net.bridge_name.clone(),
        },
        ip: NetworkIp {
            address: net.address.to_string(),
            netmask: net.netmask.to_string(),
        },
    };

    facet_xml::to_string(&def).map_err(|e| LabError::Serialize {
        what: "network XML",
        message: e.to_string(),
    })
}
