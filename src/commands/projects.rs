use asana::{AsanaClient, ProjectManager};

use crate::cli::{GidArg, ProjectCommand, ProjectListArgs};
use crate::output::{format_projects, print_json, print_text};
use crate::utils::{AppError, AppResult};

pub async fn run(command: ProjectCommand, client: AsanaClient) -> AppResult<()> {
    let manager = ProjectManager::new(client);

    match command {
        ProjectCommand::List(args) => list(&manager, &args).await,
        ProjectCommand::Get(GidArg { gid }) => print_json(&manager.get(&gid).await?),
    }
}

async fn list(manager: &ProjectManager, args: &ProjectListArgs) -> AppResult<()> {
    let workspace = args.workspace.as_deref().filter(|w| !w.is_empty());
    let team = args.team.as_deref().filter(|t| !t.is_empty());

    let projects = match (workspace, team) {
        (Some(workspace), None) => {
            manager
                .list_by_workspace(workspace, args.archived, args.limit)
                .await?
        }
        (None, Some(team)) => manager.list_by_team(team, args.archived, args.limit).await?,
        _ => {
            return Err(AppError::Validation(
                "exactly one of --workspace or --team is required".to_string(),
            ))
        }
    };

    if args.json {
        print_json(&projects)
    } else {
        print_text(&format_projects(&projects))
    }
}
