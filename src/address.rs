//! IPv4 address allocation over the managed network's range.

use std::collections::HashSet;
use std::net::{IpAddr, Ipv4Addr};

use crate::error::LabError;

/// Inclusive range of addresses handed out to managed VMs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddressRange {
    pub start: Ipv4Addr,
    pub end: Ipv4Addr,
}

impl AddressRange {
    pub fn new(start: Ipv4Addr, end: Ipv4Addr) -> Result<Self, LabError> {
        if u32::from(start) > u32::from(end) {
            return Err(LabError::Validation {
                message: format!("address range start {start} is after range end {end}"),
            });
        }
        Ok(Self { start, end })
    }

    pub fn contains(&self, addr: Ipv4Addr) -> bool {
        (u32::from(self.start)..=u32::from(self.end)).contains(&u32::from(addr))
    }
}

/// The address following `addr`, carrying byte-wise from the right.
///
/// `255.255.255.255` wraps to `0.0.0.0`. IPv4-mapped IPv6 addresses are
/// treated as their IPv4 form; any other IPv6 address yields `None`.
pub fn next_address(addr: IpAddr) -> Option<Ipv4Addr> {
    let v4 = match addr {
        IpAddr::V4(v4) => v4,
        IpAddr::V6(v6) => v6.to_ipv4_mapped()?,
    };

    let mut octets = v4.octets();
    for octet in octets.iter_mut().rev() {
        *octet = octet.wrapping_add(1);
        if *octet != 0 {
            break;
        }
    }
    Some(Ipv4Addr::from(octets))
}

/// First address in `range` (both ends included) that is not in `used`.
pub fn next_available(
    range: AddressRange,
    used: &HashSet<Ipv4Addr>,
) -> Result<Ipv4Addr, LabError> {
    let mut cursor = range.start;
    loop {
        if !used.contains(&cursor) {
            tracing::debug!(address = %cursor, "found free address");
            return Ok(cursor);
        }
        if cursor == range.end {
            break;
        }
        // start <= end is enforced by AddressRange::new, so this never wraps
        cursor = match next_address(IpAddr::V4(cursor)) {
            Some(next) => next,
            None => break,
        };
    }

    Err(LabError::AllocationExhausted {
        start: range.start.to_string(),
        end: range.end.to_string(),
    })
}
