use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use super::policy::UserPolicy;
use super::user::User;

/// Claim lifecycle states used by the backend.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Display, EnumString)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum ClaimStatus {
    Submitted,
    UnderReview,
    Approved,
    Rejected,
    Paid,
}

/// Claim record with the server-side AI and fraud assessment attached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct Claim {
    pub id: Option<i64>,
    pub claim_number: Option<String>,
    pub user_policy: Option<Box<UserPolicy>>,
    pub submitted_by: Option<User>,
    #[serde(rename = "type")]
    pub claim_type: Option<String>,
    pub status: Option<String>,
    pub claim_amount: Option<f64>,
    pub approved_amount: Option<f64>,
    pub incident_date: Option<NaiveDateTime>,
    pub incident_location: Option<String>,
    pub incident_description: Option<String>,
    pub supporting_documents: Option<Vec<String>>,
    pub ai_analysis_result: Option<String>,
    pub ai_confidence_score: Option<f64>,
    pub fraud_score: Option<f64>,
    pub reviewer_notes: Option<String>,
    pub rejection_reason: Option<String>,
    pub auto_approved: Option<bool>,
    pub requires_manual_review: Option<bool>,
    pub reviewed_by: Option<User>,
    pub reviewed_at: Option<NaiveDateTime>,
    pub created_at: Option<NaiveDateTime>,
    pub updated_at: Option<NaiveDateTime>,
}

impl Claim {
    /// Parsed status, `None` for values this client does not know.
    pub fn status(&self) -> Option<ClaimStatus> {
        self.status.as_deref()?.parse().ok()
    }
}

/// JSON body for `POST /api/claims/submit`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ClaimSubmission {
    pub user_policy_id: i64,
    #[serde(rename = "type")]
    pub claim_type: String,
    pub claim_amount: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub incident_date: Option<NaiveDateTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub incident_location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub incident_description: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub supporting_documents: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub police_report_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hospital_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doctor_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub witnesses: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub damage_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emergency_services: Option<String>,
}

/// Optional approval parameters; the backend auto-approves without them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClaimApproval {
    pub approved_amount: Option<f64>,
    pub notes: Option<String>,
}
