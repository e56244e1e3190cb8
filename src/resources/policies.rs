use reqwest::Method;

use super::{call, fetch, reject_blank};
use crate::error::Result;
use crate::http::{ApiClient, FileUpload, MultipartBody, RequestBody, RequestOptions};
use crate::types::Policy;

/// Policy documents: upload, browse, moderate.
#[derive(Debug, Clone)]
pub struct PolicyClient {
    client: ApiClient,
}

impl PolicyClient {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// Upload a policy document for analysis (broker or admin).
    pub async fn upload(
        &self,
        upload: FileUpload,
        name: Option<&str>,
        description: Option<&str>,
    ) -> Result<Policy> {
        let mut form = MultipartBody::new().file("file", upload);
        if let Some(name) = name {
            form = form.text("name", name);
        }
        if let Some(description) = description {
            form = form.text("description", description);
        }
        call(
            &self.client,
            Method::POST,
            "/api/policies/upload",
            RequestBody::Multipart(form),
            RequestOptions::default(),
            "Failed to upload policy",
        )
        .await
    }

    pub async fn list(&self) -> Result<Vec<Policy>> {
        fetch(&self.client, "/api/policies", "Failed to fetch policies").await
    }

    /// Active policies anyone may browse.
    pub async fn public(&self) -> Result<Vec<Policy>> {
        fetch(&self.client, "/api/policies/public", "Failed to fetch policies").await
    }

    pub async fn available(&self) -> Result<Vec<Policy>> {
        fetch(
            &self.client,
            "/api/policies/available",
            "Failed to fetch available policies",
        )
        .await
    }

    pub async fn pending(&self) -> Result<Vec<Policy>> {
        fetch(
            &self.client,
            "/api/policies/pending",
            "Failed to fetch pending policies",
        )
        .await
    }

    pub async fn by_status(&self, status: &str) -> Result<Vec<Policy>> {
        reject_blank(status, "status")?;
        fetch(
            &self.client,
            &format!("/api/policies/status/{}", status.trim()),
            "Failed to fetch policies",
        )
        .await
    }

    pub async fn by_type(&self, policy_type: &str) -> Result<Vec<Policy>> {
        reject_blank(policy_type, "policy type")?;
        fetch(
            &self.client,
            &format!("/api/policies/type/{}", policy_type.trim()),
            "Failed to fetch policies",
        )
        .await
    }

    pub async fn get(&self, id: i64) -> Result<Policy> {
        fetch(&self.client, &format!("/api/policies/{id}"), "Failed to fetch policy").await
    }

    pub async fn delete(&self, id: i64) -> Result<()> {
        call(
            &self.client,
            Method::DELETE,
            &format!("/api/policies/{id}"),
            RequestBody::Empty,
            RequestOptions::default(),
            "Failed to delete policy",
        )
        .await
    }

    pub async fn approve(&self, id: i64) -> Result<Policy> {
        call(
            &self.client,
            Method::PUT,
            &format!("/api/policies/{id}/approve"),
            RequestBody::Empty,
            RequestOptions::default(),
            "Failed to approve policy",
        )
        .await
    }

    /// Reject a pending policy; the reason travels as the request body.
    pub async fn reject(&self, id: i64, reason: &str) -> Result<Policy> {
        call(
            &self.client,
            Method::PUT,
            &format!("/api/policies/{id}/reject"),
            RequestBody::Json(serde_json::Value::String(reason.to_string())),
            RequestOptions::default(),
            "Failed to reject policy",
        )
        .await
    }
}
