//! In-process stand-in for the platform, for tests and embedders that keep
//! guest records themselves.

use std::sync::{Mutex, MutexGuard, PoisonError};

use super::{GuestKind, GuestResource, Platform, ResolvedGuest, Selector, select_guest};
use crate::error::NotesError;

struct Entry {
    resource: GuestResource,
    notes: String,
}

#[derive(Default)]
pub struct MemoryPlatform {
    guests: Mutex<Vec<Entry>>,
    writes: Mutex<Vec<(GuestKind, u32)>>,
    fail_writes: bool,
}

impl MemoryPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_guest(
        self,
        kind: GuestKind,
        vmid: u32,
        name: &str,
        node: &str,
        notes: &str,
    ) -> Self {
        lock(&self.guests).push(Entry {
            resource: GuestResource {
                kind,
                vmid,
                name: Some(name.to_string()),
                node: node.to_string(),
            },
            notes: notes.to_string(),
        });
        self
    }

    /// Make every `set_notes` call fail, to exercise error propagation.
    pub fn failing_writes(mut self) -> Self {
        self.fail_writes = true;
        self
    }

    pub fn notes(&self, kind: GuestKind, vmid: u32) -> Option<String> {
        lock(&self.guests)
            .iter()
            .find(|e| e.resource.kind == kind && e.resource.vmid == vmid)
            .map(|e| e.notes.clone())
    }

    /// Guests written so far, in call order.
    pub fn writes(&self) -> Vec<(GuestKind, u32)> {
        lock(&self.writes).clone()
    }
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

fn missing(kind: GuestKind, node: &str, vmid: u32) -> NotesError {
    NotesError::GuestNotFound {
        kind: kind.to_string(),
        selector: format!("vmid={vmid} node={node}"),
    }
}

impl Platform for MemoryPlatform {
    async fn resolve(&self, selector: &Selector) -> Result<ResolvedGuest, NotesError> {
        let resources: Vec<GuestResource> =
            lock(&self.guests).iter().map(|e| e.resource.clone()).collect();
        select_guest(resources, selector)
    }

    async fn get_notes(&self, kind: GuestKind, node: &str, vmid: u32) -> Result<String, NotesError> {
        lock(&self.guests)
            .iter()
            .find(|e| e.resource.kind == kind && e.resource.vmid == vmid && e.resource.node == node)
            .map(|e| e.notes.clone())
            .ok_or_else(|| missing(kind, node, vmid))
    }

    async fn set_notes(
        &self,
        kind: GuestKind,
        node: &str,
        vmid: u32,
        text: &str,
    ) -> Result<String, NotesError> {
        if self.fail_writes {
            return Err(NotesError::PlatformStatus {
                status: 500,
                context: format!("setting notes on {kind} {vmid}"),
            });
        }
        let mut guests = lock(&self.guests);
        let entry = guests
            .iter_mut()
            .find(|e| e.resource.kind == kind && e.resource.vmid == vmid && e.resource.node == node)
            .ok_or_else(|| missing(kind, node, vmid))?;
        entry.notes = text.to_string();
        lock(&self.writes).push((kind, vmid));
        Ok("ok".into())
    }
}
