use asana::{AsanaClient, Task, TaskManager, TaskUpdate};
use chrono::NaiveDate;

use crate::cli::{GidArg, TaskCommand, TaskEditArgs, TaskListArgs};
use crate::output::{format_task, format_task_list, print_json, print_text};
use crate::utils::{AppError, AppResult};

/// Value that clears a nullable field in `task edit`
const CLEAR: &str = "null";

pub async fn run(command: TaskCommand, client: AsanaClient) -> AppResult<()> {
    let manager = TaskManager::new(client);

    match command {
        TaskCommand::List(args) => {
            let tasks = list(&manager, &args).await?;
            if args.json {
                print_json(&tasks)?;
            } else {
                print_text(&format_task_list(&tasks))?;
            }
        }
        TaskCommand::Get(GidArg { gid }) => {
            print_json(&manager.get(&gid).await?)?;
        }
        TaskCommand::Edit(args) => {
            let update = build_update(&args)?;
            let task = manager.update(&args.gid, &update).await?;
            print_text(&format!("✓ Task updated\n{}", format_task(&task)))?;
        }
        TaskCommand::Complete(GidArg { gid }) => {
            let task = manager.complete(&gid).await?;
            print_text(&format!("✓ Task completed: {}\n", task.name))?;
        }
        TaskCommand::Uncomplete(GidArg { gid }) => {
            let task = manager.uncomplete(&gid).await?;
            print_text(&format!("✓ Task marked as incomplete: {}\n", task.name))?;
        }
    }

    Ok(())
}

async fn list(manager: &TaskManager, args: &TaskListArgs) -> AppResult<Vec<Task>> {
    let project = non_empty(&args.project);
    let section = non_empty(&args.section);
    let assignee = non_empty(&args.assignee);

    let given = [project, section, assignee].iter().filter(|s| s.is_some()).count();
    if given != 1 {
        return Err(AppError::Validation(
            "exactly one of --project, --section or --assignee is required".to_string(),
        ));
    }

    let tasks = match (project, section, assignee) {
        (Some(project), _, _) => {
            manager
                .list_by_project(project, args.completed, args.limit)
                .await?
        }
        (_, Some(section), _) => {
            manager
                .list_by_section(section, args.completed, args.limit)
                .await?
        }
        (_, _, Some(assignee)) => {
            let workspace = non_empty(&args.workspace).ok_or_else(|| {
                AppError::Validation("--workspace is required with --assignee".to_string())
            })?;
            manager
                .list_by_assignee(assignee, workspace, args.completed, args.limit)
                .await?
        }
        (None, None, None) => Vec::new(),
    };

    Ok(tasks)
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Turns `task edit` flags into an update; only flags that were given count
fn build_update(args: &TaskEditArgs) -> AppResult<TaskUpdate> {
    let update = TaskUpdate {
        name: args.name.clone(),
        notes: args.notes.clone(),
        assignee: args.assignee.as_deref().map(clearable),
        due_on: args.due_date.as_deref().map(date).transpose()?,
        start_on: args.start_date.as_deref().map(date).transpose()?,
        completed: args.completed,
        tags: args
            .tags
            .iter()
            .map(|t| t.trim())
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect(),
    };

    if update.is_empty() {
        return Err(AppError::Validation(
            "nothing to update: pass at least one field flag".to_string(),
        ));
    }
    Ok(update)
}

fn clearable(value: &str) -> Option<String> {
    let value = value.trim();
    if value.is_empty() || value == CLEAR {
        None
    } else {
        Some(value.to_string())
    }
}

fn date(value: &str) -> AppResult<Option<String>> {
    match clearable(value) {
        Some(day) => {
            NaiveDate::parse_from_str(&day, "%Y-%m-%d").map_err(|_| {
                AppError::Validation(format!("invalid date '{}', expected YYYY-MM-DD", day))
            })?;
            Ok(Some(day))
        }
        None => Ok(None),
    }
}
