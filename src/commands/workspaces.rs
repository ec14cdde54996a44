use asana::{AsanaClient, WorkspaceManager};

use crate::cli::{GidArg, WorkspaceCommand};
use crate::output::{format_workspace, print_json, print_text};
use crate::utils::AppResult;

pub async fn run(command: WorkspaceCommand, client: AsanaClient) -> AppResult<()> {
    let manager = WorkspaceManager::new(client);

    match command {
        WorkspaceCommand::List => {
            let workspaces = manager.list().await?;
            if workspaces.is_empty() {
                print_text("No workspaces found.\n")?;
            }
            for workspace in &workspaces {
                print_text(&format_workspace(workspace))?;
            }
            Ok(())
        }
        WorkspaceCommand::Get(GidArg { gid }) => print_json(&manager.get(&gid).await?),
    }
}
