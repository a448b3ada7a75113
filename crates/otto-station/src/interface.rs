// src/interface.rs
// Network interface summary, populated two ways: local stations walk
// the host's own interfaces; remote stations get this straight off
// the wire from the announcement JSON (see message.rs).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interface {
    pub name: String,
    pub mac: String,
    pub addrs: Vec<String>,
}

// sample_local_interfaces walks the host's network interfaces via
// if_addrs, grouping its per-address entries back into one Interface
// per interface name. MAC addresses aren't exposed by if_addrs, so
// that field is read straight from /sys/class/net on Linux and left
// empty elsewhere.
pub fn sample_local_interfaces() -> Vec<Interface> {
    let Ok(addrs) = if_addrs::get_if_addrs() else {
        return Vec::new();
    };

    let mut by_name: std::collections::BTreeMap<String, Vec<String>> = std::collections::BTreeMap::new();
    for addr in addrs {
        if addr.name == "lo" {
            continue;
        }
        by_name.entry(addr.name).or_default().push(addr.ip().to_string());
    }

    by_name
        .into_iter()
        .map(|(name, addrs)| {
            let mac = read_mac(&name);
            Interface { name, mac, addrs }
        })
        .collect()
}

#[cfg(target_os = "linux")]
fn read_mac(name: &str) -> String {
    std::fs::read_to_string(format!("/sys/class/net/{name}/address"))
        .map(|s| s.trim().to_string())
        .unwrap_or_default()
}

#[cfg(not(target_os = "linux"))]
fn read_mac(_name: &str) -> String {
    String::new()
}
