// src/announcement.rs
// The single station-announcement JSON envelope (spec.md SS9 Open
// Question, resolved in SPEC_FULL.md SS3): every station, local or
// remote, publishes and is learned about through exactly this shape.

use serde::{Deserialize, Serialize};

use crate::interface::Interface;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Announcement {
    pub id: String,
    pub hostname: String,
    pub last_heard: i64,
    pub interfaces: Vec<Interface>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StationSummary {
    pub id: String,
    pub hostname: String,
    pub last_heard: i64,
}
