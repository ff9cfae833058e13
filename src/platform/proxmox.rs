use std::time::Duration;

use facet::Facet;

use super::{GuestKind, GuestResource, Platform, ResolvedGuest, Selector, select_guest};
use crate::config::PlatformConfig;
use crate::error::NotesError;

// ── API payloads ─────────────────────────────────────────

#[derive(Debug, Default, Facet)]
#[facet(default)]
struct ApiResource {
    #[facet(default)]
    #[facet(rename = "type")]
    kind: String,
    #[facet(default)]
    vmid: u32,
    #[facet(default)]
    name: Option<String>,
    #[facet(default)]
    node: String,
}

#[derive(Debug, Default, Facet)]
#[facet(default)]
struct ResourceList {
    #[facet(default)]
    data: Vec<ApiResource>,
}

#[derive(Debug, Default, Facet)]
#[facet(default)]
struct GuestConfig {
    #[facet(default)]
    description: String,
}

#[derive(Debug, Default, Facet)]
#[facet(default)]
struct ConfigResponse {
    #[facet(default)]
    data: GuestConfig,
}

#[derive(Debug, Default, Facet)]
#[facet(default)]
struct AckResponse {
    #[facet(default)]
    data: Option<String>,
}

// ── Client ───────────────────────────────────────────────

/// Proxmox VE REST client for guest lookup and description fields.
pub struct ProxmoxPlatform {
    client: reqwest::Client,
    base: String,
    auth: String,
}

impl ProxmoxPlatform {
    pub fn new(config: &PlatformConfig) -> Result<Self, NotesError> {
        let base = config.api_base()?;
        config.token_parts()?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_s))
            .danger_accept_invalid_certs(!config.verify_tls)
            .build()
            .map_err(|e| NotesError::Platform {
                message: "building HTTP client".into(),
                source: Box::new(e),
            })?;

        Ok(Self {
            client,
            base,
            auth: format!("PVEAPIToken={}={}", config.token_id, config.token_secret),
        })
    }

    fn config_url(&self, kind: GuestKind, node: &str, vmid: u32) -> String {
        format!("{}/nodes/{node}/{}/{vmid}/config", self.base, kind.api_type())
    }

    async fn send(&self, request: reqwest::RequestBuilder, context: &str) -> Result<String, NotesError> {
        tracing::debug!(context, "platform request");
        let response = request
            .header(reqwest::header::AUTHORIZATION, &self.auth)
            .send()
            .await
            .map_err(|e| NotesError::Platform {
                message: format!("{context} failed"),
                source: Box::new(e),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(NotesError::PlatformStatus {
                status: status.as_u16(),
                context: context.to_string(),
            });
        }

        response.text().await.map_err(|e| NotesError::Platform {
            message: format!("reading response of {context}"),
            source: Box::new(e),
        })
    }
}

fn unexpected(context: &str, message: String) -> NotesError {
    NotesError::Platform {
        message: format!("unexpected response from {context}"),
        source: message.into(),
    }
}

fn to_resources(list: ResourceList) -> Vec<GuestResource> {
    list.data
        .into_iter()
        .filter_map(|r| {
            let kind = GuestKind::from_api_type(&r.kind)?;
            Some(GuestResource {
                kind,
                vmid: r.vmid,
                name: r.name,
                node: r.node,
            })
        })
        .collect()
}

impl Platform for ProxmoxPlatform {
    async fn resolve(&self, selector: &Selector) -> Result<ResolvedGuest, NotesError> {
        let context = "listing cluster resources";
        let url = format!("{}/cluster/resources?type=vm", self.base);
        let body = self.send(self.client.get(url), context).await?;
        let list: ResourceList =
            facet_json::from_str(&body).map_err(|e| unexpected(context, e.to_string()))?;
        select_guest(to_resources(list), selector)
    }

    async fn get_notes(&self, kind: GuestKind, node: &str, vmid: u32) -> Result<String, NotesError> {
        let context = format!("reading {kind} {vmid} config");
        let body = self
            .send(self.client.get(self.config_url(kind, node, vmid)), &context)
            .await?;
        let config: ConfigResponse =
            facet_json::from_str(&body).map_err(|e| unexpected(&context, e.to_string()))?;
        Ok(config.data.description)
    }

    async fn set_notes(
        &self,
        kind: GuestKind,
        node: &str,
        vmid: u32,
        text: &str,
    ) -> Result<String, NotesError> {
        let context = format!("updating {kind} {vmid} description");
        let request = self
            .client
            .put(self.config_url(kind, node, vmid))
            .form(&[("description", text)]);
        let body = self.send(request, &context).await?;

        // Synchronous config updates answer `{"data":null}`; async ones a task id.
        let ack = facet_json::from_str::<AckResponse>(&body)
            .ok()
            .and_then(|r| r.data)
            .unwrap_or_else(|| "ok".into());
        tracing::info!(%kind, vmid, node, "description updated");
        Ok(ack)
    }
}
