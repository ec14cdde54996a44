use asana::{WebhookDelivery, WebhookFilter, WebhookManager};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};

use super::{compile_filter, filter_events};
use crate::cli::{FilterArgs, GidArg, VerifyArgs, WebhookCommand, WebhookFilterCommand};
use crate::config::Settings;
use crate::output::{format_filters, print_json, print_text};
use crate::utils::{AppError, AppResult};

pub async fn run(command: WebhookCommand, settings: &Settings) -> AppResult<()> {
    // Verification is local; it must work without a token
    if let WebhookCommand::Verify(args) = command {
        return verify(args).await;
    }

    let manager = WebhookManager::new(settings.client()?);

    match command {
        WebhookCommand::List {
            workspace,
            resource,
        } => print_json(
            &manager
                .list(workspace.as_deref(), resource.as_deref())
                .await?,
        ),
        WebhookCommand::Get(GidArg { gid }) => print_json(&manager.get(&gid).await?),
        WebhookCommand::Create { resource, target } => {
            print_json(&manager.create(&resource, &target, &[]).await?)
        }
        WebhookCommand::Delete(GidArg { gid }) => {
            manager.delete(&gid).await?;
            print_text(&format!("Webhook {} deleted\n", gid))
        }
        WebhookCommand::Edit(GidArg { gid }) => {
            let webhook = manager.get(&gid).await?;
            eprintln!("Current configuration (use `webhook filter edit` to change filters):");
            print_json(&webhook)
        }
        WebhookCommand::Filter(WebhookFilterCommand::Add(args)) => {
            let mut filters = manager.get(&args.gid).await?.filters;
            filters.push(new_filter(&args)?);
            let webhook = manager.update_filters(&args.gid, &filters).await?;
            eprintln!("Filter added");
            print_json(&webhook)
        }
        WebhookCommand::Filter(WebhookFilterCommand::Edit { filter, index }) => {
            let mut filters = manager.get(&filter.gid).await?.filters;
            let slot = match resolve_slot(filters.len(), index)? {
                Some(slot) => slot,
                None => prompt_slot(&filters).await?,
            };
            edit_filters(&mut filters, slot, &filter)?;
            print_json(&manager.update_filters(&filter.gid, &filters).await?)
        }
        WebhookCommand::Verify(_) => Ok(()),
    }
}

/// Which filter `filter edit` changes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Append,
    Replace(usize),
}

/// Picks the filter to edit from the 1-based `--index`
///
/// Without an index a webhook with no filters gets a new one and a single
/// filter is edited in place. `None` means the user has to choose.
fn resolve_slot(len: usize, index: Option<usize>) -> AppResult<Option<Slot>> {
    match index {
        Some(0) => Ok(Some(Slot::Append)),
        Some(n) if n <= len => Ok(Some(Slot::Replace(n - 1))),
        Some(n) => Err(AppError::Validation(format!(
            "filter {} does not exist; the webhook has {}",
            n, len
        ))),
        None => Ok(match len {
            0 => Some(Slot::Append),
            1 => Some(Slot::Replace(0)),
            _ => None,
        }),
    }
}

async fn prompt_slot(filters: &[WebhookFilter]) -> AppResult<Slot> {
    eprintln!("Multiple filters found:");
    eprint!("{}", format_filters(filters));
    eprint!("Enter the number of the filter to edit (or 0 to add a new filter): ");

    let mut line = String::new();
    BufReader::new(tokio::io::stdin()).read_line(&mut line).await?;
    let choice = line
        .trim()
        .parse::<usize>()
        .map_err(|_| AppError::Validation(format!("invalid choice '{}'", line.trim())))?;

    resolve_slot(filters.len(), Some(choice))?
        .ok_or_else(|| AppError::Validation("invalid choice".to_string()))
}

fn edit_filters(filters: &mut Vec<WebhookFilter>, slot: Slot, args: &FilterArgs) -> AppResult<()> {
    match slot {
        Slot::Append => filters.push(new_filter(args)?),
        Slot::Replace(i) => {
            if given(&args.action).is_none()
                && given(&args.resource_type).is_none()
                && given(&args.resource_subtype).is_none()
            {
                return Err(AppError::Validation("no filter values provided".to_string()));
            }
            let filter = filters
                .get_mut(i)
                .ok_or_else(|| AppError::Validation(format!("filter {} does not exist", i + 1)))?;
            patch_filter(filter, args);
        }
    }
    Ok(())
}

fn new_filter(args: &FilterArgs) -> AppResult<WebhookFilter> {
    let resource_type = given(&args.resource_type).ok_or_else(|| {
        AppError::Validation("--resource-type is required for a new filter".to_string())
    })?;

    let mut filter = WebhookFilter::new(resource_type);
    patch_filter(&mut filter, args);
    Ok(filter)
}

/// Applies the flags that were given; `--action all` drops the action
fn patch_filter(filter: &mut WebhookFilter, args: &FilterArgs) {
    if let Some(action) = given(&args.action) {
        *filter = std::mem::take(filter).with_action(action);
    }
    if let Some(resource_type) = given(&args.resource_type) {
        filter.resource_type = resource_type.to_string();
    }
    if let Some(subtype) = given(&args.resource_subtype) {
        *filter = std::mem::take(filter).with_resource_subtype(subtype);
    }
}

fn given(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Checks a stored delivery against its signature and prints its events
async fn verify(args: VerifyArgs) -> AppResult<()> {
    let filter = compile_filter(args.filter.as_deref())?;

    let body = match &args.body {
        Some(path) => tokio::fs::read(path).await?,
        None => {
            let mut buf = Vec::new();
            tokio::io::stdin().read_to_end(&mut buf).await?;
            buf
        }
    };

    let delivery = WebhookDelivery::from_signed(&args.secret, &body, &args.signature)?;
    let events = filter_events(filter.as_ref(), delivery.events);
    print_json(&events)
}
