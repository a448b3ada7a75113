// src/device.rs
// Minimal device record a station carries. Device drivers themselves
// are out of scope (spec.md SS1 Non-goals); this is just the list a
// station reports alongside its own health.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    pub id: String,
    pub kind: String,
}
