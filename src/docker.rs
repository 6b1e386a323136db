//! Docker Engine API client - container listing with suggested service URLs.
//!
//! Queries `GET /containers/json?all=true` on the configured endpoint and
//! enriches each container with `http://<docker-host>:<public-port>` URL
//! suggestions, so the editor can offer one-click hrefs for running
//! services. Common web ports are suggested first.

use std::collections::HashSet;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::{Error, Result};

const DOCKER_TIMEOUT: Duration = Duration::from_secs(10);

/// Exposed container ports that most likely carry a web UI, in no
/// particular order; these are suggested before anything else.
const COMMON_WEB_PORTS: [u16; 5] = [80, 443, 8080, 8000, 3000];

#[derive(Debug, Deserialize)]
struct RawContainer {
    #[serde(rename = "Id", default)]
    id: String,
    #[serde(rename = "Names", default)]
    names: Vec<String>,
    #[serde(rename = "Image", default)]
    image: String,
    #[serde(rename = "State", default)]
    state: String,
    #[serde(rename = "Ports", default)]
    ports: Vec<RawPort>,
}

#[derive(Debug, Clone, Deserialize)]
struct RawPort {
    #[serde(rename = "PrivatePort")]
    private_port: Option<u16>,
    #[serde(rename = "PublicPort")]
    public_port: Option<u16>,
    #[serde(rename = "Type")]
    protocol: Option<String>,
}

/// Container fields the editor actually shows. Key casing follows the
/// Docker Engine API that the frontend already understands.
#[derive(Debug, Serialize)]
pub struct ContainerSummary {
    #[serde(rename = "Id")]
    pub id: String,
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Image")]
    pub image: String,
    #[serde(rename = "State")]
    pub state: String,
    pub suggested_urls: Vec<String>,
}

pub struct DockerClient {
    endpoint: Option<String>,
    client: reqwest::Client,
}

impl DockerClient {
    pub fn new(endpoint: Option<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(DOCKER_TIMEOUT)
            .build()
            .map_err(|e| Error::Upstream(e.to_string()))?;
        Ok(Self { endpoint, client })
    }

    pub async fn list_containers(&self) -> Result<Vec<ContainerSummary>> {
        let endpoint = self
            .endpoint
            .as_deref()
            .ok_or_else(|| Error::Upstream("Docker API endpoint is not configured".into()))?;

        let api_url = format!("{}/containers/json?all=true", endpoint.trim_end_matches('/'));
        let containers: Vec<RawContainer> = self
            .client
            .get(&api_url)
            .send()
            .await
            .map_err(|e| Error::Upstream(format!("Docker API request failed: {e}")))?
            .error_for_status()
            .map_err(|e| Error::Upstream(format!("Docker API request failed: {e}")))?
            .json()
            .await
            .map_err(|e| Error::Upstream(format!("Docker API response invalid: {e}")))?;

        let docker_host = Url::parse(endpoint)
            .ok()
            .and_then(|u| u.host_str().map(String::from))
            .unwrap_or_else(|| "localhost".to_string());

        Ok(containers
            .into_iter()
            .map(|c| summarize(c, &docker_host))
            .collect())
    }
}

fn summarize(container: RawContainer, docker_host: &str) -> ContainerSummary {
    let name = container
        .names
        .first()
        .map(|n| n.trim_start_matches('/').to_string())
        .unwrap_or_else(|| "unnamed".to_string());
    ContainerSummary {
        id: container.id.chars().take(12).collect(),
        name,
        image: container.image,
        state: container.state,
        suggested_urls: suggest_urls(docker_host, &container.ports),
    }
}

/// Published tcp ports become `http://<host>:<port>` suggestions, deduped,
/// common web ports first, then ascending by the container-side port.
fn suggest_urls(docker_host: &str, ports: &[RawPort]) -> Vec<String> {
    let mut sorted: Vec<&RawPort> = ports.iter().collect();
    sorted.sort_by_key(|p| {
        let private = p.private_port.unwrap_or(u16::MAX);
        (!COMMON_WEB_PORTS.contains(&private), private)
    });

    let mut seen = HashSet::new();
    let mut urls = Vec::new();
    for port in sorted {
        let Some(public) = port.public_port else { continue };
        if port.protocol.as_deref() != Some("tcp") || !seen.insert(public) {
            continue;
        }
        urls.push(format!("http://{docker_host}:{public}"));
    }
    urls
}

#[cfg(test)]
mod tests {
    use super::*;

    fn port(private: u16, public: Option<u16>, protocol: &str) -> RawPort {
        RawPort {
            private_port: Some(private),
            public_port: public,
            protocol: Some(protocol.to_string()),
        }
    }

    #[test]
    fn test_common_web_ports_suggested_first() {
        let ports = vec![
            port(9090, Some(19090), "tcp"),
            port(80, Some(8081), "tcp"),
            port(5432, Some(15432), "tcp"),
        ];
        let urls = suggest_urls("dock.lan", &ports);
        assert_eq!(
            urls,
            vec![
                "http://dock.lan:8081",
                "http://dock.lan:15432",
                "http://dock.lan:19090",
            ]
        );
    }

    #[test]
    fn test_udp_and_unpublished_ports_skipped() {
        let ports = vec![
            port(53, Some(53), "udp"),
            port(8080, None, "tcp"),
            port(3000, Some(3000), "tcp"),
            port(3000, Some(3000), "tcp"), // duplicate publication
        ];
        let urls = suggest_urls("dock.lan", &ports);
        assert_eq!(urls, vec!["http://dock.lan:3000"]);
    }

    #[test]
    fn test_summarize_trims_id_and_name() {
        let raw = RawContainer {
            id: "0123456789abcdef0123".to_string(),
            names: vec!["/jellyfin".to_string()],
            image: "jellyfin/jellyfin".to_string(),
            state: "running".to_string(),
            ports: vec![],
        };
        let summary = summarize(raw, "dock.lan");
        assert_eq!(summary.id, "0123456789ab");
        assert_eq!(summary.name, "jellyfin");
        assert!(summary.suggested_urls.is_empty());
    }
}
