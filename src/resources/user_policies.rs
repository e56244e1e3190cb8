use reqwest::Method;
use serde_json::json;
use tracing::warn;

use super::{call, fetch, reject_blank};
use crate::error::{InsurError, Result};
use crate::http::{ApiClient, RequestBody, RequestOptions};
use crate::types::{PolicyApplication, UserPolicy};

/// Policy applications and the policies users hold.
#[derive(Debug, Clone)]
pub struct UserPolicyClient {
    client: ApiClient,
    demo_fallback: bool,
}

impl UserPolicyClient {
    pub fn new(client: ApiClient) -> Self {
        Self {
            client,
            demo_fallback: false,
        }
    }

    /// Serve placeholder listings instead of failing (development only).
    pub fn with_demo_fallback(mut self, enabled: bool) -> Self {
        self.demo_fallback = enabled;
        self
    }

    /// Apply for a policy. The application is validated locally first and
    /// never sent when it breaks a rule.
    pub async fn apply(&self, application: &PolicyApplication) -> Result<UserPolicy> {
        let errors = application.validate();
        if !errors.is_empty() {
            return Err(InsurError::InvalidArgument(errors.join("; ")));
        }
        call(
            &self.client,
            Method::POST,
            "/api/user-policies/apply",
            RequestBody::json(application)?,
            RequestOptions::default(),
            "Failed to apply for policy",
        )
        .await
    }

    /// Policies of the logged-in user.
    pub async fn current_user_policies(&self) -> Result<Vec<UserPolicy>> {
        let result = fetch(
            &self.client,
            "/api/user-policies/user",
            "Failed to fetch user policies",
        )
        .await;
        self.or_demo(result, demo_user_policies)
    }

    pub async fn for_user(&self, user_id: i64) -> Result<Vec<UserPolicy>> {
        fetch(
            &self.client,
            &format!("/api/user-policies/user/{user_id}"),
            "Failed to fetch user policies",
        )
        .await
    }

    pub async fn active_for_user(&self, user_id: i64) -> Result<Vec<UserPolicy>> {
        fetch(
            &self.client,
            &format!("/api/user-policies/active/{user_id}"),
            "Failed to fetch active policies",
        )
        .await
    }

    /// Applications waiting for an admin decision.
    pub async fn pending_approvals(&self) -> Result<Vec<UserPolicy>> {
        let result = fetch(
            &self.client,
            "/api/user-policies/pending-approvals",
            "Failed to fetch pending approvals",
        )
        .await;
        self.or_demo(result, demo_pending_approvals)
    }

    pub async fn approve(&self, id: i64, notes: Option<&str>) -> Result<UserPolicy> {
        call(
            &self.client,
            Method::POST,
            &format!("/api/user-policies/{id}/approve"),
            RequestBody::Empty,
            RequestOptions::query([("notes", notes.unwrap_or_default())]),
            "Failed to approve policy",
        )
        .await
    }

    pub async fn reject(&self, id: i64, reason: &str) -> Result<UserPolicy> {
        reject_blank(reason, "rejection reason")?;
        call(
            &self.client,
            Method::POST,
            &format!("/api/user-policies/{id}/reject"),
            RequestBody::Empty,
            RequestOptions::query([("reason", reason)]),
            "Failed to reject policy",
        )
        .await
    }

    fn or_demo(
        &self,
        result: Result<Vec<UserPolicy>>,
        placeholder: fn() -> serde_json::Value,
    ) -> Result<Vec<UserPolicy>> {
        match result {
            Ok(policies) => Ok(policies),
            // An expired session must still reach the host.
            Err(err @ InsurError::Auth(_)) => Err(err),
            Err(err) if self.demo_fallback => {
                warn!(error = %err, "serving placeholder user policies");
                Ok(serde_json::from_value(placeholder())?)
            }
            Err(err) => Err(err),
        }
    }
}

fn demo_user_policies() -> serde_json::Value {
    json!([
        {
            "id": 1,
            "status": "ACTIVE",
            "startDate": "2024-01-01",
            "endDate": "2024-12-31",
            "monthlyPremium": 150.0,
            "totalPremiumPaid": 1800.0,
            "nextPaymentDate": "2024-07-01",
            "paymentStatus": "CURRENT",
            "riskScore": 25.5,
            "policy": {
                "id": 1,
                "name": "Comprehensive Auto Insurance",
                "type": "AUTO",
                "coverage": 50000.0
            }
        },
        {
            "id": 2,
            "status": "PENDING_APPROVAL",
            "monthlyPremium": 200.0,
            "totalPremiumPaid": 0.0,
            "paymentStatus": "PENDING",
            "riskScore": 45.0,
            "policy": {
                "id": 2,
                "name": "Health Insurance Premium",
                "type": "HEALTH",
                "coverage": 100000.0
            }
        }
    ])
}

fn demo_pending_approvals() -> serde_json::Value {
    json!([
        {
            "id": 3,
            "status": "PENDING_APPROVAL",
            "riskScore": 65.0,
            "aiAssessment": "MEDIUM_RISK - Requires manual review due to previous claims history",
            "user": {
                "id": 2,
                "username": "john_doe",
                "email": "john@example.com",
                "firstName": "John",
                "lastName": "Doe"
            },
            "policy": {
                "id": 1,
                "name": "Premium Life Insurance",
                "type": "LIFE",
                "coverage": 500000.0
            }
        }
    ])
}
