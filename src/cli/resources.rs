//! CLI handlers for claims, policies and user policies.

use super::{print_json, ClaimsCommands, PoliciesCommands, UserPoliciesCommands};
use crate::config::ClientConfig;
use crate::error::InsurError;
use crate::http::{ApiClient, FileUpload};
use crate::resources::{ClaimClient, PolicyClient, UserPolicyClient};
use crate::types::ClaimApproval;

pub async fn handle_claims(client: ApiClient, command: ClaimsCommands) -> Result<(), InsurError> {
    let claims = ClaimClient::new(client);
    match command {
        ClaimsCommands::List => print_json(&claims.list().await?),
        ClaimsCommands::All => print_json(&claims.list_all().await?),
        ClaimsCommands::Pending => print_json(&claims.pending_review().await?),
        ClaimsCommands::Get { id } => print_json(&claims.get(id).await?),
        ClaimsCommands::SubmitFile { path, policy } => {
            let upload = FileUpload::from_path(&path).await?;
            print_json(&claims.submit_file(upload, policy).await?)
        }
        ClaimsCommands::Approve { id, amount, notes } => {
            let approval = ClaimApproval {
                approved_amount: amount,
                notes,
            };
            claims.approve(id, &approval).await?;
            println!("Claim {id} approved");
            Ok(())
        }
        ClaimsCommands::Reject { id, reason } => {
            claims.reject(id, &reason).await?;
            println!("Claim {id} rejected");
            Ok(())
        }
    }
}

pub async fn handle_policies(
    client: ApiClient,
    command: PoliciesCommands,
) -> Result<(), InsurError> {
    let policies = PolicyClient::new(client);
    match command {
        PoliciesCommands::List => print_json(&policies.list().await?),
        PoliciesCommands::Public => print_json(&policies.public().await?),
        PoliciesCommands::Get { id } => print_json(&policies.get(id).await?),
        PoliciesCommands::Upload {
            path,
            name,
            description,
        } => {
            let upload = FileUpload::from_path(&path).await?;
            let policy = policies
                .upload(upload, name.as_deref(), description.as_deref())
                .await?;
            print_json(&policy)
        }
    }
}

pub async fn handle_user_policies(
    client: ApiClient,
    config: &ClientConfig,
    command: UserPoliciesCommands,
) -> Result<(), InsurError> {
    let user_policies = UserPolicyClient::new(client).with_demo_fallback(config.demo_fallback);
    match command {
        UserPoliciesCommands::Mine => print_json(&user_policies.current_user_policies().await?),
        UserPoliciesCommands::Pending => print_json(&user_policies.pending_approvals().await?),
        UserPoliciesCommands::Approve { id, notes } => {
            print_json(&user_policies.approve(id, notes.as_deref()).await?)
        }
        UserPoliciesCommands::Reject { id, reason } => {
            print_json(&user_policies.reject(id, &reason).await?)
        }
    }
}
