use std::collections::HashMap;
use serde::Deserialize;
use serde_json::json;
use reqwest::blocking::{Client, Response};
use reqwest::{StatusCode, Url};

pub const ES_PORT: u16 = 9200;

/// Name and major version of the HTTP client the cluster calls go through.
pub const CLIENT_VERSION: &str = "reqwest 0.11";

#[derive(Debug, thiserror::Error)]
pub enum EsError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid cluster url: {0}")]
    InvalidUrl(String),

    #[error("malformed response: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{method} {target} returned {status}: {body}")]
    Status {
        method: &'static str,
        target: String,
        status: StatusCode,
        body: String,
    },

    #[error("search on index {index} returned no hits")]
    NoHits { index: String },

    #[error("first document of index {index} has no label")]
    MissingLabel { index: String },
}

/// The four cluster calls the Newman tools need.
pub trait Cluster {
    fn index_names(&self) -> Result<Vec<String>, EsError>;

    /// Label stored in the first document matching the index name.
    fn first_label(&self, index: &str) -> Result<String, EsError>;

    /// Partial update of the `label` field of document `index` in index `index`.
    /// Never creates the document.
    fn update_label(&self, index: &str, label: &str) -> Result<(), EsError>;

    fn delete_index(&self, index: &str) -> Result<(), EsError>;
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    hits: Hits,
}

#[derive(Debug, Deserialize)]
struct Hits {
    #[serde(default)]
    hits: Vec<Hit>,
}

#[derive(Debug, Deserialize)]
struct Hit {
    #[serde(rename = "_source", default)]
    source: LabelDocument,
}

#[derive(Debug, Default, Deserialize)]
struct LabelDocument {
    #[serde(default)]
    label: Option<String>,
}

fn label_from_search(index: &str, resp: SearchResponse) -> Result<String, EsError> {
    let hit = resp.hits.hits.into_iter().next()
        .ok_or_else(|| EsError::NoHits { index: index.to_string() })?;
    hit.source.label
        .ok_or_else(|| EsError::MissingLabel { index: index.to_string() })
}

fn label_query(index: &str) -> serde_json::Value {
    json!({
        "query": {
            "bool": {
                "must": [{"query_string": {"default_field": "_all", "query": index}}],
                "must_not": [],
                "should": []
            }
        },
        "from": 0,
        "size": 1,
        "sort": [],
        "aggs": {}
    })
}

/// Handle on one cluster, reached over plain http on port 9200.
pub struct EsCluster {
    base_url: Url,
    client: Client,
}

impl EsCluster {
    /// Probes `http://<host>:9200` and returns a handle bound to it.
    /// Only transport failures are errors; any HTTP status counts as reachable.
    pub fn connect(host: &str) -> Result<Self, EsError> {
        let cluster = EsCluster::with_client(&format!("http://{}:{}", host, ES_PORT), Client::new())?;
        cluster.probe()?;
        log::info!("elasticsearch connection made!");
        Ok(cluster)
    }

    fn with_client(base_url: &str, client: Client) -> Result<Self, EsError> {
        let base_url = Url::parse(base_url)
            .map_err(|err| EsError::InvalidUrl(format!("{}: {}", base_url, err)))?;
        Ok(EsCluster { base_url, client })
    }

    fn probe(&self) -> Result<(), EsError> {
        let resp = self.client.get(self.base_url.clone()).send()?;
        log::info!("probe {} status: {:?}", self.base_url, resp.status());
        log::info!("request (res) content is: {}", resp.text()?);
        Ok(())
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    /// Base URL with `segments` appended, each percent-encoded on its own.
    fn url(&self, segments: &[&str]) -> Result<Url, EsError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| EsError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

impl Cluster for EsCluster {
    fn index_names(&self) -> Result<Vec<String>, EsError> {
        let url = self.url(&["*"])?;
        let resp = check("GET", url.as_str(), self.client.get(url.clone()).send()?)?;
        let indices: HashMap<String, serde_json::Value> = serde_json::from_str(&resp.text()?)?;
        Ok(indices.into_iter().map(|(name, _)| name).collect())
    }

    fn first_label(&self, index: &str) -> Result<String, EsError> {
        let url = self.url(&[index, "_search"])?;
        let resp = self.client.post(url.clone())
            .json::<serde_json::Value>(&label_query(index))
            .send()?;
        let resp = check("POST", url.as_str(), resp)?;
        let search: SearchResponse = serde_json::from_str(&resp.text()?)?;
        label_from_search(index, search)
    }

    fn update_label(&self, index: &str, label: &str) -> Result<(), EsError> {
        let url = self.url(&[index, index, index, "_update"])?;
        let resp = self.client.post(url.clone())
            .json::<serde_json::Value>(&json!({"doc": {"label": label}}))
            .send()?;
        check("POST", url.as_str(), resp)?;
        Ok(())
    }

    fn delete_index(&self, index: &str) -> Result<(), EsError> {
        let url = self.url(&[index])?;
        check("DELETE", url.as_str(), self.client.delete(url.clone()).send()?)?;
        Ok(())
    }
}

fn check(method: &'static str, target: &str, resp: Response) -> Result<Response, EsError> {
    log::debug!("method: {} target: {} status: {:?}", method, target, resp.status());
    let status = resp.status();
    if !status.is_success() {
        return Err(EsError::Status {
            method,
            target: target.to_string(),
            status,
            body: resp.text()?,
        });
    }
    Ok(resp)
}
