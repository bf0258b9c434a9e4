//! Per-cycle telemetry packet.
//!
//! Subsystems and commands add key/value pairs during a cycle; the driver
//! flushes the packet once at the end of the cycle as a single JSON line on
//! the `telemetry` tracing target.

use std::cell::RefCell;
use std::rc::Rc;

use serde_json::{Map, Value};
use tracing::debug;

use crate::subsystems::drivetrain::ChassisSpeeds;

#[derive(Debug, Default)]
struct Packets {
    current: Map<String, Value>,
    last: Map<String, Value>,
}

/// Shared telemetry sink. Clones write into the same packet.
#[derive(Debug, Clone, Default)]
pub struct Telemetry {
    packets: Rc<RefCell<Packets>>,
}

impl Telemetry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_data(&self, key: impl Into<String>, value: impl Into<Value>) {
        self.packets
            .borrow_mut()
            .current
            .insert(key.into(), value.into());
    }

    /// Add `speeds` under `path` as `path/.type`, `path/vx`, `path/vy` and
    /// `path/omega`.
    pub fn add_speeds(&self, path: &str, speeds: ChassisSpeeds) {
        self.add_data(format!("{path}/.type"), "ChassisSpeeds");
        self.add_data(format!("{path}/vx"), speeds.vx);
        self.add_data(format!("{path}/vy"), speeds.vy);
        self.add_data(format!("{path}/omega"), speeds.omega);
    }

    /// Emit and clear the current packet. Returns the JSON line, or `None`
    /// when nothing was added this cycle.
    pub fn flush(&self) -> Option<String> {
        let mut packets = self.packets.borrow_mut();
        if packets.current.is_empty() {
            return None;
        }
        let packet = std::mem::take(&mut packets.current);
        let line = Value::Object(packet.clone()).to_string();
        debug!(target: "telemetry", "{line}");
        packets.last = packet;
        Some(line)
    }

    /// Value of `key` in the most recently flushed packet.
    pub fn last(&self, key: &str) -> Option<Value> {
        self.packets.borrow().last.get(key).cloned()
    }

    /// Value of `key` in the packet being built.
    pub fn pending(&self, key: &str) -> Option<Value> {
        self.packets.borrow().current.get(key).cloned()
    }
}
