use reqwest::Method;

use super::{call, fetch, reject_blank};
use crate::error::Result;
use crate::http::{ApiClient, FileUpload, MultipartBody, RequestBody, RequestOptions};
use crate::types::{Claim, ClaimApproval, ClaimStatus, ClaimSubmission};

/// Claim submission and review.
#[derive(Debug, Clone)]
pub struct ClaimClient {
    client: ApiClient,
}

impl ClaimClient {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn submit(&self, submission: &ClaimSubmission) -> Result<Claim> {
        call(
            &self.client,
            Method::POST,
            "/api/claims/submit",
            RequestBody::json(submission)?,
            RequestOptions::default(),
            "Failed to submit claim",
        )
        .await
    }

    /// Submit a claim document; the backend extracts the details itself.
    pub async fn submit_file(&self, upload: FileUpload, policy_id: i64) -> Result<Claim> {
        let form = MultipartBody::new()
            .file("file", upload)
            .text("policyId", policy_id);
        call(
            &self.client,
            Method::POST,
            "/api/claims/submit-file",
            RequestBody::Multipart(form),
            RequestOptions::default(),
            "Failed to submit claim",
        )
        .await
    }

    /// Claims of the current user.
    pub async fn list(&self) -> Result<Vec<Claim>> {
        fetch(&self.client, "/api/claims", "Failed to fetch claims").await
    }

    pub async fn list_all(&self) -> Result<Vec<Claim>> {
        fetch(&self.client, "/api/claims/all", "Failed to fetch claims").await
    }

    pub async fn pending_review(&self) -> Result<Vec<Claim>> {
        fetch(
            &self.client,
            "/api/claims/pending-review",
            "Failed to fetch claims pending review",
        )
        .await
    }

    pub async fn get(&self, id: i64) -> Result<Claim> {
        fetch(&self.client, &format!("/api/claims/{id}"), "Failed to fetch claim").await
    }

    pub async fn get_by_number(&self, claim_number: &str) -> Result<Claim> {
        reject_blank(claim_number, "claim number")?;
        fetch(
            &self.client,
            &format!("/api/claims/number/{}", claim_number.trim()),
            "Failed to fetch claim",
        )
        .await
    }

    /// Approve a claim. Without both amount and notes the backend applies
    /// its automatic approval.
    pub async fn approve(&self, id: i64, approval: &ClaimApproval) -> Result<()> {
        let options = RequestOptions::default()
            .with_optional("approvedAmount", approval.approved_amount)
            .with_optional("notes", approval.notes.as_deref());
        call(
            &self.client,
            Method::POST,
            &format!("/api/claims/{id}/approve"),
            RequestBody::Empty,
            options,
            "Failed to approve claim",
        )
        .await
    }

    pub async fn reject(&self, id: i64, reason: &str) -> Result<()> {
        reject_blank(reason, "rejection reason")?;
        call(
            &self.client,
            Method::POST,
            &format!("/api/claims/{id}/reject"),
            RequestBody::Empty,
            RequestOptions::query([("reason", reason)]),
            "Failed to reject claim",
        )
        .await
    }

    pub async fn update_status(&self, id: i64, status: ClaimStatus) -> Result<()> {
        call(
            &self.client,
            Method::PUT,
            &format!("/api/claims/{id}/status"),
            RequestBody::Empty,
            RequestOptions::query([("status", status)]),
            "Failed to update claim status",
        )
        .await
    }
}
