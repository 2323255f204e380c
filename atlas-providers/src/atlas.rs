use crate::{inventory, ClusterManager};
use anyhow::Result;
use async_trait::async_trait;
use atlas_common::{InstanceTier, TlsProtocol};
use digest_auth::{AuthContext, HttpMethod};
use reqwest::header::{HeaderValue, AUTHORIZATION, WWW_AUTHENTICATE};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::json;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

// Atlas caps itemsPerPage at 500.
const ITEMS_PER_PAGE: usize = 500;
// Refresh the bearer token this long before Atlas says it expires.
const TOKEN_REFRESH_MARGIN: Duration = Duration::from_secs(60);

/// How requests to the Atlas Admin API are authenticated.
#[derive(Clone, Debug)]
pub enum Credentials {
    /// Programmatic API key pair, sent with HTTP digest auth.
    ApiKey {
        public_key: String,
        private_key: String,
    },
    /// Service account, exchanged for a bearer token (OAuth client credentials).
    ServiceAccount {
        client_id: String,
        client_secret: String,
    },
}

impl Credentials {
    fn trimmed(self) -> Self {
        match self {
            Credentials::ApiKey {
                public_key,
                private_key,
            } => Credentials::ApiKey {
                public_key: public_key.trim().to_string(),
                private_key: private_key.trim().to_string(),
            },
            Credentials::ServiceAccount {
                client_id,
                client_secret,
            } => Credentials::ServiceAccount {
                client_id: client_id.trim().to_string(),
                client_secret: client_secret.trim().to_string(),
            },
        }
    }
}

pub struct AtlasProvider {
    client: Client,
    base_url: String,
    group_id: String,
    credentials: Credentials,
    token: Mutex<Option<CachedToken>>,
}

struct CachedToken {
    access_token: String,
    expires_at: Instant,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: u64,
}

fn default_expires_in() -> u64 {
    3600
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ClustersPage {
    #[serde(default)]
    results: Vec<inventory::ClusterRecord>,
    #[serde(default)]
    total_count: Option<usize>,
}

impl AtlasProvider {
    /// The credentials need Project Cluster Manager rights on `group_id`.
    pub fn new(base_url: &str, group_id: String, credentials: Credentials) -> Result<Self> {
        // Default reqwest client has no overall timeout. A stalled PATCH would hang the whole run.
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(20))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim().trim_end_matches('/').to_string(),
            group_id: group_id.trim().to_string(),
            credentials: credentials.trimmed(),
            token: Mutex::new(None),
        })
    }

    fn headers(&self) -> reqwest::header::HeaderMap {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::ACCEPT,
            reqwest::header::HeaderValue::from_static("application/json"),
        );
        headers.insert(
            reqwest::header::CONTENT_TYPE,
            reqwest::header::HeaderValue::from_static("application/json"),
        );
        headers
    }

    fn clusters_url(&self) -> String {
        format!(
            "{}/api/atlas/v1.0/groups/{}/clusters",
            self.base_url, self.group_id
        )
    }

    fn cluster_url(&self, cluster: &str) -> String {
        format!("{}/{}", self.clusters_url(), cluster)
    }

    /// Client-credentials grant, cached until shortly before expiry.
    async fn access_token(&self, client_id: &str, client_secret: &str) -> Result<String> {
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref() {
            if Instant::now() < token.expires_at {
                return Ok(token.access_token.clone());
            }
        }

        let url = format!("{}/api/oauth/token", self.base_url);
        debug!("[Atlas API] POST {} - requesting service account token", url);
        let resp = self
            .client
            .post(&url)
            .basic_auth(client_id, Some(client_secret))
            .header(reqwest::header::ACCEPT, "application/json")
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await?;
        let resp = ensure_success(resp, "POST", &url).await?;
        let body: TokenResponse = resp.json().await?;

        let lifetime = Duration::from_secs(body.expires_in).saturating_sub(TOKEN_REFRESH_MARGIN);
        *cached = Some(CachedToken {
            access_token: body.access_token.clone(),
            expires_at: Instant::now() + lifetime,
        });
        Ok(body.access_token)
    }

    /// Send an authenticated request. `build` is called again for the digest
    /// retry, since a sent request cannot be replayed.
    async fn send<F>(&self, method: Method, build: F) -> Result<Response>
    where
        F: Fn() -> RequestBuilder,
    {
        match &self.credentials {
            Credentials::ServiceAccount {
                client_id,
                client_secret,
            } => {
                let token = self.access_token(client_id, client_secret).await?;
                Ok(build().bearer_auth(token).send().await?)
            }
            Credentials::ApiKey {
                public_key,
                private_key,
            } => {
                let resp = build().send().await?;
                if resp.status() != StatusCode::UNAUTHORIZED {
                    return Ok(resp);
                }
                let challenge = resp
                    .headers()
                    .get(WWW_AUTHENTICATE)
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_string)
                    .ok_or_else(|| anyhow::anyhow!("Atlas returned 401 without a digest challenge"))?;

                let mut request = build().build()?;
                let url = request.url();
                let uri = match url.query() {
                    Some(query) => format!("{}?{}", url.path(), query),
                    None => url.path().to_string(),
                };
                let answer =
                    digest_authorization(&challenge, public_key, private_key, method.as_str(), &uri)?;
                request
                    .headers_mut()
                    .insert(AUTHORIZATION, HeaderValue::from_str(&answer)?);
                Ok(self.client.execute(request).await?)
            }
        }
    }

    async fn patch(&self, url: &str, body: serde_json::Value) -> Result<()> {
        debug!("[Atlas API] PATCH {} payload={}", url, body);
        let resp = self
            .send(Method::PATCH, || {
                self.client.patch(url).headers(self.headers()).json(&body)
            })
            .await?;
        ensure_success(resp, "PATCH", url).await?;
        info!("✅ [Atlas API] PATCH {} accepted", url);
        Ok(())
    }
}

/// Answer a `WWW-Authenticate: Digest ...` challenge for one request.
fn digest_authorization(
    challenge: &str,
    username: &str,
    password: &str,
    method: &str,
    uri: &str,
) -> Result<String> {
    let mut prompt = digest_auth::parse(challenge)?;
    let context = AuthContext::new_with_method(
        username,
        password,
        uri,
        Option::<&[u8]>::None,
        HttpMethod::from(method),
    );
    Ok(prompt.respond(&context)?.to_header_string())
}

async fn ensure_success(resp: Response, method: &str, url: &str) -> Result<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let text = resp.text().await.unwrap_or_default();
    warn!(
        "❌ [Atlas API] {} {} failed: status={}, response={}",
        method,
        url,
        status.as_u16(),
        text
    );
    Err(anyhow::anyhow!(
        "Atlas {} {} failed: status={} body={}",
        method,
        url,
        status.as_u16(),
        text
    ))
}

/// Whether another page must be fetched after one that returned `fetched` items.
fn has_more_pages(fetched: usize, collected: usize, total_count: Option<usize>) -> bool {
    if fetched == 0 {
        return false;
    }
    match total_count {
        Some(total) => collected < total,
        None => fetched == ITEMS_PER_PAGE,
    }
}

#[async_trait]
impl ClusterManager for AtlasProvider {
    async fn list_clusters(&self) -> Result<Vec<inventory::ClusterRecord>> {
        let url = self.clusters_url();
        let mut clusters = Vec::new();
        let mut page_num = 1usize;

        loop {
            debug!("[Atlas API] GET {} pageNum={}", url, page_num);
            let query = [
                ("pageNum", page_num.to_string()),
                ("itemsPerPage", ITEMS_PER_PAGE.to_string()),
            ];
            let resp = self
                .send(Method::GET, || {
                    self.client.get(&url).headers(self.headers()).query(&query)
                })
                .await?;
            let resp = ensure_success(resp, "GET", &url).await?;
            let page: ClustersPage = resp.json().await?;

            let fetched = page.results.len();
            clusters.extend(page.results);
            if !has_more_pages(fetched, clusters.len(), page.total_count) {
                break;
            }
            page_num += 1;
        }

        info!(
            "[Atlas API] listed {} clusters in project {}",
            clusters.len(),
            self.group_id
        );
        Ok(clusters)
    }

    async fn modify_cluster_instance_size(
        &self,
        cluster: &str,
        provider_name: &str,
        new_size: InstanceTier,
    ) -> Result<()> {
        let body = json!({
            "providerSettings": {
                "providerName": provider_name,
                "instanceSizeName": new_size.as_str(),
            }
        });
        self.patch(&self.cluster_url(cluster), body).await
    }

    async fn modify_cluster_tls(&self, cluster: &str, protocol: TlsProtocol) -> Result<()> {
        let url = format!("{}/processArgs", self.cluster_url(cluster));
        let body = json!({ "minimumEnabledTlsProtocol": protocol.as_str() });
        self.patch(&url, body).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urls_are_scoped_to_the_group() {
        let p = AtlasProvider::new(
            "https://cloud.mongodb.com/",
            " 5f1a2b3c4d5e6f7a8b9c0d1e ".to_string(),
            Credentials::ApiKey {
                public_key: "abcdefgh".to_string(),
                private_key: "secret".to_string(),
            },
        )
        .unwrap();
        assert_eq!(
            p.clusters_url(),
            "https://cloud.mongodb.com/api/atlas/v1.0/groups/5f1a2b3c4d5e6f7a8b9c0d1e/clusters"
        );
        assert_eq!(
            p.cluster_url("orders"),
            "https://cloud.mongodb.com/api/atlas/v1.0/groups/5f1a2b3c4d5e6f7a8b9c0d1e/clusters/orders"
        );
    }

    #[test]
    fn paging_stops_on_total_count() {
        assert!(has_more_pages(500, 500, Some(720)));
        assert!(!has_more_pages(220, 720, Some(720)));
        assert!(!has_more_pages(3, 3, Some(3)));
    }

    #[test]
    fn paging_without_total_count() {
        assert!(has_more_pages(ITEMS_PER_PAGE, ITEMS_PER_PAGE, None));
        assert!(!has_more_pages(12, 512, None));
        assert!(!has_more_pages(0, 500, Some(900)));
    }

    #[test]
    fn clusters_page_decodes() {
        let raw = serde_json::json!({
            "links": [],
            "results": [
                {
                    "name": "a",
                    "clusterType": "REPLICASET",
                    "stateName": "IDLE",
                    "providerSettings": { "providerName": "AWS", "instanceSizeName": "M30" }
                },
                {
                    "name": "b",
                    "clusterType": "SHARDED",
                    "stateName": "UPDATING",
                    "providerSettings": { "providerName": "GCP", "instanceSizeName": "R40" }
                }
            ],
            "totalCount": 2
        });
        let page: ClustersPage = serde_json::from_value(raw).unwrap();
        assert_eq!(page.total_count, Some(2));
        assert_eq!(page.results.len(), 2);
        assert_eq!(page.results[1].name, "b");
    }

    #[test]
    fn token_response_defaults_expiry() {
        let body: TokenResponse =
            serde_json::from_str(r#"{"access_token":"abc","token_type":"Bearer"}"#).unwrap();
        assert_eq!(body.access_token, "abc");
        assert_eq!(body.expires_in, 3600);
    }

    #[test]
    fn digest_answer_without_qop_is_deterministic() {
        let challenge = r#"Digest realm="MMS Public API", nonce="dcd98b7102dd2f0e8b11d0f600bfb0c093""#;
        let uri = "/api/atlas/v1.0/groups/g1/clusters?pageNum=1&itemsPerPage=500";
        let header = digest_authorization(challenge, "abcdefgh", "s3cr3t-key", "GET", uri).unwrap();
        assert!(header.starts_with("Digest "));
        assert!(header.contains(r#"username="abcdefgh""#));
        assert!(header.contains(r#"realm="MMS Public API""#));
        assert!(header.contains(&format!(r#"uri="{}""#, uri)));
        assert!(header.contains(r#"response="b71f2621ba7d9db0f88b652ae41a537e""#));
    }

    #[test]
    fn digest_answer_to_atlas_challenge() {
        let challenge = r#"Digest realm="MMS Public API", domain="", nonce="OSf2ZAn1qLwC1m4dKd2Bct3o5ETEoKnf", algorithm=MD5, qop="auth", stale=false"#;
        let header = digest_authorization(
            challenge,
            "abcdefgh",
            "s3cr3t-key",
            "PATCH",
            "/api/atlas/v1.0/groups/g1/clusters/orders",
        )
        .unwrap();
        assert!(header.contains(r#"nonce="OSf2ZAn1qLwC1m4dKd2Bct3o5ETEoKnf""#));
        assert!(header.contains("qop=auth"));
        assert!(header.contains("nc=00000001"));
        assert!(header.contains("cnonce="));
        assert!(!header.contains("s3cr3t-key"));
    }

    #[test]
    fn basic_challenge_is_rejected() {
        assert!(digest_authorization(r#"Basic realm="x""#, "u", "p", "GET", "/").is_err());
    }

    #[test]
    fn credentials_are_trimmed() {
        let creds = Credentials::ServiceAccount {
            client_id: " mdb_sa_id ".to_string(),
            client_secret: "secret\n".to_string(),
        }
        .trimmed();
        assert!(matches!(
            creds,
            Credentials::ServiceAccount { ref client_id, ref client_secret }
                if client_id == "mdb_sa_id" && client_secret == "secret"
        ));
    }
}
