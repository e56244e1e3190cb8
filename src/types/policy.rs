use bon::Builder;
use chrono::{NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use super::user::User;

/// Policy document as stored by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct Policy {
    pub id: Option<i64>,
    pub name: Option<String>,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub policy_type: Option<String>,
    pub status: Option<String>,
    pub coverage: Option<f64>,
    pub file_name: Option<String>,
    pub analysis_result: Option<String>,
    pub uploaded_by: Option<serde_json::Value>,
}

/// Status of a user's subscription to a policy.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Display, EnumString)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum UserPolicyStatus {
    Active,
    PendingApproval,
    Applied,
    Rejected,
    Cancelled,
    Expired,
}

impl UserPolicyStatus {
    /// Label shown to end users.
    pub fn label(self) -> &'static str {
        match self {
            Self::Active => "Active",
            Self::PendingApproval => "Pending Approval",
            Self::Applied => "Applied",
            Self::Rejected => "Rejected",
            Self::Cancelled => "Cancelled",
            Self::Expired => "Expired",
        }
    }
}

/// Coarse risk band derived from the server's risk score (0-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum RiskLevel {
    #[strum(to_string = "Low Risk")]
    Low,
    #[strum(to_string = "Medium Risk")]
    Medium,
    #[strum(to_string = "High Risk")]
    High,
}

impl RiskLevel {
    pub fn from_score(score: f64) -> Self {
        if score <= 30.0 {
            Self::Low
        } else if score <= 70.0 {
            Self::Medium
        } else {
            Self::High
        }
    }
}

/// A policy held by (or applied for by) a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct UserPolicy {
    pub id: Option<i64>,
    pub user: Option<User>,
    pub policy: Option<Policy>,
    pub status: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub monthly_premium: Option<f64>,
    pub total_premium_paid: Option<f64>,
    pub next_payment_date: Option<NaiveDate>,
    pub payment_status: Option<String>,
    pub approval_notes: Option<String>,
    pub risk_score: Option<f64>,
    pub ai_assessment: Option<String>,
    pub application_data: Option<String>,
    pub created_at: Option<NaiveDateTime>,
    pub updated_at: Option<NaiveDateTime>,
    pub active_claims: Option<i32>,
    pub can_claim: Option<bool>,
}

impl UserPolicy {
    pub fn status(&self) -> Option<UserPolicyStatus> {
        self.status.as_deref()?.parse().ok()
    }

    pub fn risk_level(&self) -> Option<RiskLevel> {
        self.risk_score.map(RiskLevel::from_score)
    }

    /// Elapsed share of the coverage period in percent, 0 unless active.
    pub fn progress_on(&self, today: NaiveDate) -> u8 {
        if self.status() != Some(UserPolicyStatus::Active) {
            return 0;
        }
        let (Some(start), Some(end)) = (self.start_date, self.end_date) else {
            return 0;
        };
        if today < start {
            return 0;
        }
        if today > end {
            return 100;
        }
        let total = (end - start).num_days();
        if total <= 0 {
            return 100;
        }
        let elapsed = (today - start).num_days();
        ((elapsed as f64 / total as f64) * 100.0).round() as u8
    }

    pub fn progress(&self) -> u8 {
        self.progress_on(Utc::now().date_naive())
    }

    /// Active and ending within `1..=threshold_days` days of `today`.
    pub fn is_expiring_soon_on(&self, today: NaiveDate, threshold_days: i64) -> bool {
        if self.status() != Some(UserPolicyStatus::Active) {
            return false;
        }
        let Some(end) = self.end_date else {
            return false;
        };
        let remaining = (end - today).num_days();
        remaining > 0 && remaining <= threshold_days
    }

    pub fn is_expiring_soon(&self) -> bool {
        self.is_expiring_soon_on(Utc::now().date_naive(), 30)
    }
}

/// Application for a policy, `POST /api/user-policies/apply`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default, Builder)]
#[serde(rename_all = "camelCase")]
pub struct PolicyApplication {
    pub policy_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub application_data: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
    pub age: Option<i32>,
    pub occupation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub medical_history: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_claims: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_existing_policies: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub additional_information: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annual_salary: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vehicle_details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub property_details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub health_conditions: Option<String>,
}

impl PolicyApplication {
    /// Every rule the application violates; empty when it may be submitted.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.policy_id.is_none() {
            errors.push("Policy selection is required".to_string());
        }
        if !has_min_chars(&self.first_name, 2) {
            errors.push("First name must be at least 2 characters".to_string());
        }
        if !has_min_chars(&self.last_name, 2) {
            errors.push("Last name must be at least 2 characters".to_string());
        }
        if !self.email.as_deref().is_some_and(looks_like_email) {
            errors.push("Valid email address is required".to_string());
        }
        if !self.age.is_some_and(|age| (18..=100).contains(&age)) {
            errors.push("Age must be between 18 and 100".to_string());
        }
        if !has_min_chars(&self.occupation, 2) {
            errors.push("Occupation is required".to_string());
        }
        errors
    }
}

/// Lenient salary parsing for free-text form input; junk becomes `None`.
pub fn parse_annual_salary(input: &str) -> Option<f64> {
    let cleaned: String = input
        .trim()
        .chars()
        .filter(|c| !matches!(c, ',' | '$' | ' '))
        .collect();
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

fn has_min_chars(value: &Option<String>, min: usize) -> bool {
    value
        .as_deref()
        .is_some_and(|v| v.trim().chars().count() >= min)
}

fn looks_like_email(value: &str) -> bool {
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    let no_space = |s: &str| !s.is_empty() && !s.chars().any(char::is_whitespace);
    let Some((host, tld)) = domain.rsplit_once('.') else {
        return false;
    };
    no_space(local) && no_space(host) && no_space(tld)
}
