pub mod memory;
pub mod proxmox;

use std::fmt;

use crate::error::NotesError;

/// Guest types that carry a notes (description) field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GuestKind {
    Vm,
    Lxc,
}

impl GuestKind {
    pub fn as_str(self) -> &'static str {
        match self {
            GuestKind::Vm => "vm",
            GuestKind::Lxc => "lxc",
        }
    }

    /// Resource type as reported by the cluster resource listing and used in
    /// node API paths.
    pub fn api_type(self) -> &'static str {
        match self {
            GuestKind::Vm => "qemu",
            GuestKind::Lxc => "lxc",
        }
    }

    pub fn from_api_type(s: &str) -> Option<Self> {
        match s {
            "qemu" => Some(GuestKind::Vm),
            "lxc" => Some(GuestKind::Lxc),
            _ => None,
        }
    }
}

impl fmt::Display for GuestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            GuestKind::Vm => "VM",
            GuestKind::Lxc => "LXC",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuestRef {
    Id(u32),
    Name(String),
}

/// Caller-supplied identification of one guest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    pub kind: GuestKind,
    pub target: GuestRef,
    pub node: Option<String>,
}

impl Selector {
    pub fn vm(vmid: u32) -> Self {
        Self {
            kind: GuestKind::Vm,
            target: GuestRef::Id(vmid),
            node: None,
        }
    }

    pub fn named(kind: GuestKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            target: GuestRef::Name(name.into()),
            node: None,
        }
    }

    pub fn on_node(mut self, node: impl Into<String>) -> Self {
        self.node = Some(node.into());
        self
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.target {
            GuestRef::Id(id) => write!(f, "vmid={id}")?,
            GuestRef::Name(name) => write!(f, "name={name}")?,
        }
        if let Some(node) = &self.node {
            write!(f, " node={node}")?;
        }
        Ok(())
    }
}

/// One guest entry from the platform's resource listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuestResource {
    pub kind: GuestKind,
    pub vmid: u32,
    pub name: Option<String>,
    pub node: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedGuest {
    pub vmid: u32,
    pub node: String,
    pub descriptor: GuestResource,
}

/// Platform wrapper consumed by the notes service.
///
/// Implementations do no retrying; failures surface as-is.
#[allow(async_fn_in_trait)] // trait is internal-only
pub trait Platform {
    async fn resolve(&self, selector: &Selector) -> Result<ResolvedGuest, NotesError>;
    async fn get_notes(&self, kind: GuestKind, node: &str, vmid: u32) -> Result<String, NotesError>;
    async fn set_notes(
        &self,
        kind: GuestKind,
        node: &str,
        vmid: u32,
        text: &str,
    ) -> Result<String, NotesError>;
}

/// Pick the single guest a selector refers to.
///
/// Candidates are narrowed by kind, then id or exact name, then node. A name
/// matching guests on several nodes is only accepted with a node given.
pub fn select_guest<I>(resources: I, selector: &Selector) -> Result<ResolvedGuest, NotesError>
where
    I: IntoIterator<Item = GuestResource>,
{
    let candidates: Vec<GuestResource> = resources
        .into_iter()
        .filter(|r| r.kind == selector.kind)
        .filter(|r| match &selector.target {
            GuestRef::Id(id) => r.vmid == *id,
            GuestRef::Name(name) => r.name.as_deref() == Some(name.as_str()),
        })
        .filter(|r| selector.node.as_deref().is_none_or(|n| r.node == n))
        .collect();

    if candidates.len() > 1 && selector.node.is_none() {
        let name = match &selector.target {
            GuestRef::Id(id) => id.to_string(),
            GuestRef::Name(name) => name.clone(),
        };
        let nodes: Vec<&str> = candidates.iter().map(|c| c.node.as_str()).collect();
        return Err(NotesError::AmbiguousGuest {
            kind: selector.kind.to_string(),
            name,
            nodes: nodes.join(", "),
        });
    }

    let Some(guest) = candidates.into_iter().next() else {
        return Err(NotesError::GuestNotFound {
            kind: selector.kind.to_string(),
            selector: selector.to_string(),
        });
    };

    Ok(ResolvedGuest {
        vmid: guest.vmid,
        node: guest.node.clone(),
        descriptor: guest,
    })
}
