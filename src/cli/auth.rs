//! CLI auth command handlers for login, register, status, and logout.

use super::{print_json, AuthCommands};
use crate::auth::AuthService;
use crate::error::InsurError;
use crate::http::ApiClient;

pub async fn handle(client: ApiClient, command: AuthCommands) -> Result<(), InsurError> {
    let auth = AuthService::new(client);
    match command {
        AuthCommands::Login(args) => {
            let profile = auth.login(&args.username, &args.password).await?;
            println!("Logged in as {}", profile.display_name());
            if let Some(role) = profile.role {
                println!("Role: {role} (home: {})", role.landing_path());
            }
        }
        AuthCommands::Register(args) => {
            let account = auth
                .register(&args.username, &args.password, args.role)
                .await?;
            println!(
                "Registered {}. Log in with: insur auth login {}",
                account.username, account.username
            );
        }
        AuthCommands::Status => {
            let status = auth.status()?;
            print_json(&status)?;
        }
        AuthCommands::Logout => {
            auth.logout()?;
            println!("Logged out");
        }
    }
    Ok(())
}
