use asana::{AsanaClient, UserManager, WorkspaceManager};

use crate::cli::UserCommand;
use crate::output::{format_user, print_json, print_text};
use crate::utils::logging::log_error;
use crate::utils::AppResult;

pub async fn run(command: UserCommand, client: AsanaClient) -> AppResult<()> {
    match command {
        UserCommand::List { workspace } => match workspace.filter(|w| !w.is_empty()) {
            Some(workspace) => {
                let users = UserManager::new(client).list_in_workspace(&workspace).await?;
                for user in &users {
                    print_text(&format_user(user))?;
                }
                Ok(())
            }
            None => list_everywhere(client).await,
        },
        UserCommand::Me => print_json(&UserManager::new(client).me().await?),
    }
}

/// Users of every workspace the token sees; a failing workspace is reported
/// and skipped
async fn list_everywhere(client: AsanaClient) -> AppResult<()> {
    let workspaces = WorkspaceManager::new(client.clone()).list().await?;
    let users = UserManager::new(client);

    for workspace in &workspaces {
        print_text(&format!("\n{} ({}):\n", workspace.name, workspace.gid))?;
        match users.list_in_workspace(&workspace.gid).await {
            Ok(list) => {
                for user in &list {
                    print_text(&format!("  {}", format_user(user)))?;
                }
            }
            Err(e) => log_error(&format!(
                "Failed to list users of workspace {}: {}",
                workspace.gid, e
            )),
        }
    }
    Ok(())
}
