//! Terminal rendering of API resources
//!
//! Formatters return strings so commands decide where they go; JSON output
//! is always one pretty-printed document on stdout.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::io;

use asana::events::EventBatch;
use asana::{Project, Task, User, WebhookFilter, Workspace};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::utils::{preview, AppResult};

const NOTES_WIDTH: usize = 80;
const NO_SECTION: &str = "(no section)";

/// Pretty JSON on stdout; a closed pipe surfaces as `AppError::Io`
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> AppResult<()> {
    write_json(&mut std::io::stdout().lock(), value)
}

/// Text on stdout as given, without adding a newline
pub fn print_text(text: &str) -> AppResult<()> {
    write_text(&mut std::io::stdout().lock(), text)
}

fn write_json<W: io::Write, T: Serialize + ?Sized>(out: &mut W, value: &T) -> AppResult<()> {
    let json = serde_json::to_string_pretty(value)?;
    writeln!(out, "{}", json)?;
    out.flush()?;
    Ok(())
}

fn write_text<W: io::Write>(out: &mut W, text: &str) -> AppResult<()> {
    out.write_all(text.as_bytes())?;
    out.flush()?;
    Ok(())
}

/// Date part of an Asana timestamp, or the raw text when it does not parse
fn short_date(timestamp: &str) -> String {
    match timestamp.parse::<DateTime<Utc>>() {
        Ok(at) => at.format("%Y-%m-%d").to_string(),
        Err(_) => timestamp.chars().take(10).collect(),
    }
}

fn checkbox(completed: bool) -> &'static str {
    if completed {
        "[✓]"
    } else {
        "[ ]"
    }
}

/// Tasks grouped by section, sections in first-seen order
pub fn format_task_list(tasks: &[Task]) -> String {
    if tasks.is_empty() {
        return "No tasks found.\n".to_string();
    }

    let mut order: Vec<&str> = Vec::new();
    let mut groups: BTreeMap<&str, Vec<&Task>> = BTreeMap::new();
    for task in tasks {
        let section = task.section_name().unwrap_or(NO_SECTION);
        if !groups.contains_key(section) {
            order.push(section);
        }
        groups.entry(section).or_default().push(task);
    }

    let mut out = String::new();
    for section in order {
        let _ = writeln!(out, "## {}", section);
        for task in &groups[section] {
            let _ = writeln!(out, "{} {} ({})", checkbox(task.completed), task.name, task.gid);
            if let Some(assignee) = &task.assignee {
                let _ = writeln!(out, "    Assignee: {}", assignee.label());
            }
            if let Some(due) = task.due_on.as_deref().or(task.due_at.as_deref()) {
                let _ = writeln!(out, "    Due: {}", due);
            }
            if let Some(notes) = task.notes.as_deref().filter(|n| !n.trim().is_empty()) {
                let _ = writeln!(out, "    {}", preview(notes, NOTES_WIDTH));
            }
            if task.completed {
                if let Some(at) = &task.completed_at {
                    let by = task
                        .completed_by
                        .as_ref()
                        .map(|user| format!(" by {}", user.label()))
                        .unwrap_or_default();
                    let _ = writeln!(out, "    Completed: {}{}", short_date(at), by);
                }
            }
        }
        out.push('\n');
    }
    let _ = writeln!(out, "{} task(s)", tasks.len());
    out
}

pub fn format_task(task: &Task) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} {}", checkbox(task.completed), task.name);
    let _ = writeln!(out, "GID: {}", task.gid);
    if let Some(subtype) = &task.resource_subtype {
        let _ = writeln!(out, "Type: {}", subtype);
    }
    if let Some(assignee) = &task.assignee {
        let _ = writeln!(out, "Assignee: {}", assignee.label());
    }
    if let Some(start) = &task.start_on {
        let _ = writeln!(out, "Start: {}", start);
    }
    if let Some(due) = task.due_on.as_deref().or(task.due_at.as_deref()) {
        let _ = writeln!(out, "Due: {}", due);
    }
    if let Some(at) = &task.completed_at {
        let by = task
            .completed_by
            .as_ref()
            .map(|user| format!(" by {}", user.label()))
            .unwrap_or_default();
        let _ = writeln!(out, "Completed: {}{}", short_date(at), by);
    }
    if !task.projects.is_empty() {
        let names: Vec<&str> = task.projects.iter().map(|p| p.label()).collect();
        let _ = writeln!(out, "Projects: {}", names.join(", "));
    }
    if let Some(section) = task.section_name() {
        let _ = writeln!(out, "Section: {}", section);
    }
    if let Some(parent) = &task.parent {
        let _ = writeln!(out, "Parent: {} ({})", parent.label(), parent.gid);
    }
    if !task.tags.is_empty() {
        let names: Vec<&str> = task
            .tags
            .iter()
            .map(|t| t.name.as_deref().unwrap_or(&t.gid))
            .collect();
        let _ = writeln!(out, "Tags: {}", names.join(", "));
    }
    for field in &task.custom_fields {
        if let Some(value) = field.display_value.as_deref().filter(|v| !v.is_empty()) {
            let name = field.name.as_deref().unwrap_or(&field.gid);
            let _ = writeln!(out, "{}: {}", name, value);
        }
    }
    if let Some(count) = task.num_subtasks.filter(|n| *n > 0) {
        let _ = writeln!(out, "Subtasks: {}", count);
    }
    if let Some(notes) = task.notes.as_deref().filter(|n| !n.trim().is_empty()) {
        let _ = writeln!(out, "\n{}", notes);
    }
    out
}

pub fn format_project(project: &Project) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "• {}", project.name);
    let _ = writeln!(out, "  GID: {}", project.gid);
    if let Some(color) = &project.color {
        let _ = writeln!(out, "  Color: {}", color);
    }
    if let Some(owner) = &project.owner {
        let _ = writeln!(out, "  Owner: {}", owner.label());
    }
    if let Some(status) = &project.current_status {
        let title = status.title.as_deref().unwrap_or("");
        match &status.color {
            Some(color) => {
                let _ = writeln!(out, "  Status: {} ({})", title, color);
            }
            None => {
                let _ = writeln!(out, "  Status: {}", title);
            }
        }
    }
    if let Some(due) = &project.due_date {
        let _ = writeln!(out, "  Due: {}", due);
    }
    if project.archived {
        let _ = writeln!(out, "  Archived");
    }
    if let Some(notes) = project.notes.as_deref().filter(|n| !n.trim().is_empty()) {
        let _ = writeln!(out, "  Notes: {}", preview(notes, NOTES_WIDTH));
    }
    out
}

pub fn format_projects(projects: &[Project]) -> String {
    if projects.is_empty() {
        return "No projects found.\n".to_string();
    }
    let mut out: String = projects.iter().map(format_project).collect::<Vec<_>>().join("\n");
    let _ = writeln!(out, "\n{} project(s)", projects.len());
    out
}

pub fn format_workspace(workspace: &Workspace) -> String {
    format!("• {} ({}) - {}\n", workspace.name, workspace.kind(), workspace.gid)
}

pub fn format_user(user: &User) -> String {
    match user.email.as_deref().filter(|e| !e.is_empty()) {
        Some(email) => format!("• {} ({}) - {}\n", user.name, email, user.gid),
        None => format!("• {} - {}\n", user.name, user.gid),
    }
}

/// Numbered filter lines, as shown when choosing which filter to edit
pub fn format_filters(filters: &[WebhookFilter]) -> String {
    let mut out = String::new();
    for (i, filter) in filters.iter().enumerate() {
        let _ = write!(out, "{}. {}", i + 1, filter.resource_type);
        if let Some(subtype) = &filter.resource_subtype {
            let _ = write!(out, "/{}", subtype);
        }
        let _ = write!(out, " action={}", filter.action.as_deref().unwrap_or("all"));
        if !filter.fields.is_empty() {
            let _ = write!(out, " fields={}", filter.fields.join(","));
        }
        out.push('\n');
    }
    out
}

/// `events sync` summary: the fresh token and how many events came with it
pub fn format_sync(batch: &EventBatch) -> String {
    let mut out = format!("Sync token: {}\n", batch.sync);
    let _ = writeln!(out, "Events: {}", batch.events.len());
    if batch.expired {
        out.push_str("The previous token was invalid or expired.\n");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::AppError;
    use serde_json::json;

    struct ClosedPipe;

    impl io::Write for ClosedPipe {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::from(io::ErrorKind::BrokenPipe))
        }

        fn flush(&mut self) -> io::Result<()> {
            Err(io::Error::from(io::ErrorKind::BrokenPipe))
        }
    }

    #[test]
    fn test_json_written_with_trailing_newline() {
        let mut out = Vec::new();
        write_json(&mut out, &json!({"gid": "1"})).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "{\n  \"gid\": \"1\"\n}\n");
    }

    #[test]
    fn test_closed_stdout_is_an_io_error() {
        let err = write_json(&mut ClosedPipe, &json!({"gid": "1"})).unwrap_err();
        assert!(matches!(err, AppError::Io(ref e) if e.kind() == io::ErrorKind::BrokenPipe));

        let err = write_text(&mut ClosedPipe, "Task list\n").unwrap_err();
        assert!(matches!(err, AppError::Io(_)));
    }

    fn task(value: serde_json::Value) -> Task {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_task_list_grouped_by_section() {
        let tasks = vec![
            task(json!({
                "gid": "1", "name": "Write docs", "completed": false,
                "memberships": [{"section": {"gid": "s1", "name": "Doing"}}]
            })),
            task(json!({
                "gid": "2", "name": "Ship", "completed": true,
                "completed_at": "2024-03-05T10:00:00.000Z",
                "completed_by": {"gid": "u1", "name": "Ana"},
                "memberships": [{"section": {"gid": "s2", "name": "Done"}}]
            })),
            task(json!({
                "gid": "3", "name": "Review", "completed": false,
                "memberships": [{"section": {"gid": "s1", "name": "Doing"}}]
            })),
        ];

        let out = format_task_list(&tasks);
        let doing = out.find("## Doing").unwrap();
        let done = out.find("## Done").unwrap();
        assert!(doing < done);
        assert!(out.contains("[ ] Write docs (1)"));
        assert!(out.contains("[✓] Ship (2)"));
        assert!(out.contains("Completed: 2024-03-05 by Ana"));
        assert!(out.find("Review").unwrap() < done);
        assert!(out.ends_with("3 task(s)\n"));
    }

    #[test]
    fn test_task_list_notes_truncated() {
        let notes = "x".repeat(200);
        let tasks = vec![task(json!({"gid": "1", "name": "Long", "notes": notes}))];
        let out = format_task_list(&tasks);
        let line = out.lines().find(|l| l.trim_start().starts_with('x')).unwrap();
        assert!(line.trim().len() <= NOTES_WIDTH);
        assert!(line.ends_with("..."));
    }

    #[test]
    fn test_empty_lists() {
        assert_eq!(format_task_list(&[]), "No tasks found.\n");
        assert_eq!(format_projects(&[]), "No projects found.\n");
    }

    #[test]
    fn test_short_date_falls_back_to_prefix() {
        assert_eq!(short_date("2024-03-05T10:00:00.000Z"), "2024-03-05");
        assert_eq!(short_date("2024-03-05 sometime"), "2024-03-05");
    }

    #[test]
    fn test_project_format() {
        let project: Project = serde_json::from_value(json!({
            "gid": "p1", "name": "Roadmap", "color": "dark-green",
            "owner": {"gid": "u1", "name": "Ana"},
            "current_status": {"title": "On track", "color": "green"},
            "due_date": "2024-12-31"
        }))
        .unwrap();
        let out = format_project(&project);
        assert!(out.starts_with("• Roadmap\n"));
        assert!(out.contains("  GID: p1\n"));
        assert!(out.contains("  Owner: Ana\n"));
        assert!(out.contains("  Status: On track (green)\n"));
        assert!(out.contains("  Due: 2024-12-31\n"));
    }

    #[test]
    fn test_workspace_and_user_lines() {
        let workspace: Workspace = serde_json::from_value(json!({
            "gid": "w1", "name": "Acme", "is_organization": true
        }))
        .unwrap();
        assert_eq!(format_workspace(&workspace), "• Acme (organization) - w1\n");

        let user: User = serde_json::from_value(json!({
            "gid": "u1", "name": "Ana", "email": "ana@example.com"
        }))
        .unwrap();
        assert_eq!(format_user(&user), "• Ana (ana@example.com) - u1\n");
    }

    #[test]
    fn test_filters_numbered() {
        let filters: Vec<WebhookFilter> = serde_json::from_value(json!([
            {"resource_type": "task", "action": "changed", "fields": ["due_on"]},
            {"resource_type": "task", "resource_subtype": "milestone"}
        ]))
        .unwrap();
        assert_eq!(
            format_filters(&filters),
            "1. task action=changed fields=due_on\n2. task/milestone action=all\n"
        );
    }
}
