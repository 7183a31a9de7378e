//! Per-device operation lock for callers that act destructively on a
//! confirmed device record (flash, unlock). Keyed on device_uid, held
//! for the duration of the operation, expires after a bounded TTL so a
//! crashed holder cannot wedge the device forever. Scans never acquire
//! this lock.

use std::collections::HashMap;
use std::time::{Duration, Instant};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockTicket {
    pub ticket_id: Uuid,
    pub device_uid: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LockDenied {
    /// Another live holder owns this device.
    DeviceBusy(String),
    /// A live global lock serializes all destructive operations.
    GlobalHeld,
}

#[derive(Debug)]
struct Holder {
    ticket_id: Uuid,
    expires_at: Instant,
}

impl Holder {
    fn live(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

/// In-memory lock registry. One instance per process; callers share it
/// behind whatever synchronization their runtime already has.
#[derive(Debug, Default)]
pub struct LockRegistry {
    devices: HashMap<String, Holder>,
    global: Option<Holder>,
}

impl LockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the lock for one device uid. Expired holders, this uid's
    /// or any other's, are reclaimed on the spot so a long-lived
    /// registry does not accumulate dead entries.
    pub fn acquire(&mut self, device_uid: &str, ttl: Duration) -> Result<LockTicket, LockDenied> {
        let now = Instant::now();

        if let Some(holder) = &self.global {
            if holder.live(now) {
                return Err(LockDenied::GlobalHeld);
            }
            self.global = None;
        }

        self.devices.retain(|_, holder| holder.live(now));
        if self.devices.contains_key(device_uid) {
            return Err(LockDenied::DeviceBusy(device_uid.to_string()));
        }

        let ticket_id = Uuid::new_v4();
        self.devices.insert(
            device_uid.to_string(),
            Holder {
                ticket_id,
                expires_at: now + ttl,
            },
        );
        Ok(LockTicket {
            ticket_id,
            device_uid: Some(device_uid.to_string()),
        })
    }

    /// Acquire the global lock, serializing every destructive operation.
    /// Denied while any per-device holder is still live.
    pub fn acquire_global(&mut self, ttl: Duration) -> Result<LockTicket, LockDenied> {
        let now = Instant::now();

        if let Some(holder) = &self.global {
            if holder.live(now) {
                return Err(LockDenied::GlobalHeld);
            }
        }
        self.devices.retain(|_, holder| holder.live(now));
        if let Some(uid) = self.devices.keys().next() {
            return Err(LockDenied::DeviceBusy(uid.clone()));
        }

        let ticket_id = Uuid::new_v4();
        self.global = Some(Holder {
            ticket_id,
            expires_at: now + ttl,
        });
        Ok(LockTicket {
            ticket_id,
            device_uid: None,
        })
    }

    #[cfg(test)]
    fn tracked_holders(&self) -> usize {
        self.devices.len()
    }

    /// Release a held lock. Idempotent: a stale or already-released
    /// ticket is a no-op.
    pub fn release(&mut self, ticket: &LockTicket) {
        match &ticket.device_uid {
            Some(uid) => {
                if self
                    .devices
                    .get(uid)
                    .is_some_and(|holder| holder.ticket_id == ticket.ticket_id)
                {
                    self.devices.remove(uid);
                }
            }
            None => {
                if self
                    .global
                    .as_ref()
                    .is_some_and(|holder| holder.ticket_id == ticket.ticket_id)
                {
                    self.global = None;
                }
            }
        }
    }
}
