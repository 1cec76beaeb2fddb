//! Managed-VM listing, rebuilt from the hypervisor on every call.

use std::collections::{BTreeMap, HashSet};
use std::net::Ipv4Addr;

use facet::Facet;
use facet_value::{VArray, Value, value};

use crate::backend::{DomainRecord, Hypervisor};
use crate::description::DescriptionCodec;
use crate::error::LabError;

/// Remote user created by the install templates.
pub const REMOTE_USER: &str = "ansible";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagedVm {
    pub name: String,
    pub address: Option<Ipv4Addr>,
    pub groups: Vec<String>,
    pub running: bool,
}

/// Decode one domain record into a summary.
pub fn summarize(
    record: DomainRecord,
    codec: &impl DescriptionCodec,
) -> Result<ManagedVm, LabError> {
    let decoded = codec.decode(&record.description)?;
    Ok(ManagedVm {
        name: record.name,
        address: decoded.address,
        groups: decoded.groups,
        running: record.running,
    })
}

/// Every domain carrying our tag, in hypervisor enumeration order.
///
/// One undecodable description fails the whole listing.
pub fn list_managed(
    hv: &impl Hypervisor,
    codec: &impl DescriptionCodec,
) -> Result<Vec<ManagedVm>, LabError> {
    let vms = hv
        .domains()?
        .into_iter()
        .filter(|d| codec.is_managed(&d.description))
        .map(|d| summarize(d, codec))
        .collect::<Result<Vec<_>, _>>()?;
    tracing::debug!(count = vms.len(), "listed managed VMs");
    Ok(vms)
}

pub fn used_addresses(
    hv: &impl Hypervisor,
    codec: &impl DescriptionCodec,
) -> Result<HashSet<Ipv4Addr>, LabError> {
    Ok(list_managed(hv, codec)?
        .into_iter()
        .filter_map(|vm| vm.address)
        .collect())
}

// ── output ────────────────────────────────────────────────

fn address_cell(address: Option<Ipv4Addr>) -> String {
    address.map_or_else(|| "<invalid>".to_string(), |a| a.to_string())
}

/// Left-aligned table with the `list` columns.
pub fn render_table(vms: &[ManagedVm]) -> String {
    let header = ["Name", "Running", "IP Address", "Ansible groups"];
    let rows: Vec<[String; 4]> = vms
        .iter()
        .map(|vm| {
            [
                vm.name.clone(),
                vm.running.to_string(),
                address_cell(vm.address),
                vm.groups.join(", "),
            ]
        })
        .collect();

    let mut widths = header.map(|h| h.chars().count());
    for row in &rows {
        for (w, cell) in widths.iter_mut().zip(row) {
            *w = (*w).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    let mut push_row = |cells: [&str; 4]| {
        let line = cells
            .iter()
            .zip(widths)
            .map(|(cell, w)| format!("{cell:<w$}"))
            .collect::<Vec<_>>()
            .join("  ");
        out.push_str(line.trim_end());
        out.push('\n');
    };
    push_row(header);
    for row in &rows {
        push_row([&row[0], &row[1], &row[2], &row[3]]);
    }
    out
}

// ── Ansible dynamic inventory ─────────────────────────────

/// Reserved top-level key of an Ansible inventory document.
pub const META_KEY: &str = "_meta";

fn host_vars(vm: &ManagedVm) -> Option<Value> {
    let address = vm.address?.to_string();
    Some(value!({
        "ansible_host": (address.as_str()),
        "ansible_user": (REMOTE_USER),
    }))
}

fn to_json<'f, T: Facet<'f>>(what: &'static str, value: &T) -> Result<String, LabError> {
    facet_json::to_string(value).map_err(|e| LabError::Serialize {
        what,
        message: e.to_string(),
    })
}

/// Ansible `--list` document: one entry per group plus `_meta.hostvars`.
///
/// VMs without a usable address are left out; Ansible could not reach them.
pub fn ansible_inventory(vms: &[ManagedVm]) -> Result<String, LabError> {
    let mut groups: BTreeMap<&str, VArray> = BTreeMap::new();
    let mut hostvars = value!({});

    for vm in vms {
        let Some(vars) = host_vars(vm) else {
            tracing::warn!(name = %vm.name, "skipping VM without a valid address");
            continue;
        };
        if let Some(obj) = hostvars.as_object_mut() {
            obj.insert(vm.name.as_str(), vars);
        }
        for group in &vm.groups {
            if group == META_KEY {
                tracing::warn!(name = %vm.name, "ignoring reserved group name {META_KEY}");
                continue;
            }
            groups
                .entry(group.as_str())
                .or_insert_with(VArray::new)
                .push(Value::from(vm.name.as_str()));
        }
    }

    let mut inventory = value!({
        "_meta": (value!({ "hostvars": (hostvars) })),
    });
    if let Some(obj) = inventory.as_object_mut() {
        for (group, hosts) in groups {
            obj.insert(group, value!({ "hosts": (Value::from(hosts)) }));
        }
    }

    to_json("inventory", &inventory)
}

/// Ansible `--host <name>` document. Unknown hosts get `{}`.
pub fn ansible_host(vms: &[ManagedVm], name: &str) -> Result<String, LabError> {
    match vms.iter().find(|vm| vm.name == name).and_then(host_vars) {
        Some(vars) => to_json("host vars", &vars),
        None => Ok("{}".into()),
    }
}
