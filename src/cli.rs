use clap::{Args, Parser, Subcommand};

/// Asana from the command line: tasks, projects, webhooks and event streams
#[derive(Parser, Debug)]
#[command(name = "asana")]
#[command(version)]
#[command(about = "Command-line client for the Asana API", long_about = None)]
pub struct Cli {
    /// Personal access token
    #[arg(short = 't', long, env = "ASANA_PERSONAL_ACCESS_TOKEN", global = true, hide_env_values = true)]
    pub token: Option<String>,

    /// API base URL
    #[arg(long, env = "ASANA_BASE_URL", global = true)]
    pub base_url: Option<String>,

    /// Debug logging on stderr
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List, inspect and edit tasks
    #[command(subcommand)]
    Task(TaskCommand),

    /// List and inspect projects
    #[command(subcommand)]
    Project(ProjectCommand),

    /// List and inspect workspaces
    #[command(subcommand)]
    Workspace(WorkspaceCommand),

    /// List users
    #[command(subcommand)]
    User(UserCommand),

    /// Manage webhooks
    #[command(subcommand)]
    Webhook(WebhookCommand),

    /// Get, synchronize and poll resource events
    #[command(subcommand)]
    Events(EventsCommand),
}

#[derive(Args, Debug, Clone)]
pub struct GidArg {
    /// Resource GID
    #[arg(long)]
    pub gid: String,
}

#[derive(Subcommand, Debug)]
pub enum TaskCommand {
    /// List tasks of a project, a section or an assignee
    List(TaskListArgs),
    /// Show one task
    Get(GidArg),
    /// Update task fields
    Edit(TaskEditArgs),
    /// Mark a task as completed
    Complete(GidArg),
    /// Mark a task as not completed
    Uncomplete(GidArg),
}

#[derive(Args, Debug, Clone, Default)]
pub struct TaskListArgs {
    /// Project GID
    #[arg(long)]
    pub project: Option<String>,

    /// Section GID
    #[arg(long)]
    pub section: Option<String>,

    /// Assignee user GID (requires --workspace)
    #[arg(long)]
    pub assignee: Option<String>,

    /// Workspace GID
    #[arg(long)]
    pub workspace: Option<String>,

    /// Include completed tasks
    #[arg(long)]
    pub completed: bool,

    /// Page size sent to the API
    #[arg(long)]
    pub limit: Option<u32>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug, Clone, Default)]
pub struct TaskEditArgs {
    /// Task GID
    #[arg(long)]
    pub gid: String,

    #[arg(long)]
    pub name: Option<String>,

    #[arg(long)]
    pub notes: Option<String>,

    /// Assignee user GID, "me", or "null" to unassign
    #[arg(long)]
    pub assignee: Option<String>,

    /// Due date (YYYY-MM-DD), or "null" to clear
    #[arg(long)]
    pub due_date: Option<String>,

    /// Start date (YYYY-MM-DD), or "null" to clear
    #[arg(long)]
    pub start_date: Option<String>,

    #[arg(long)]
    pub completed: Option<bool>,

    /// Tag GIDs to add, comma separated
    #[arg(long, value_delimiter = ',')]
    pub tags: Vec<String>,
}

#[derive(Subcommand, Debug)]
pub enum ProjectCommand {
    /// List projects of a workspace or a team
    List(ProjectListArgs),
    /// Show one project
    Get(GidArg),
}

#[derive(Args, Debug, Clone, Default)]
pub struct ProjectListArgs {
    /// Workspace GID
    #[arg(long, conflicts_with = "team")]
    pub workspace: Option<String>,

    /// Team GID
    #[arg(long)]
    pub team: Option<String>,

    /// List archived projects instead of active ones
    #[arg(long)]
    pub archived: bool,

    /// Page size sent to the API
    #[arg(long)]
    pub limit: Option<u32>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Subcommand, Debug)]
pub enum WorkspaceCommand {
    /// List workspaces
    List,
    /// Show one workspace
    Get(GidArg),
}

#[derive(Subcommand, Debug)]
pub enum UserCommand {
    /// List users of a workspace, or of every workspace
    List {
        /// Workspace GID
        #[arg(long)]
        workspace: Option<String>,
    },
    /// Show the token's user
    Me,
}

#[derive(Subcommand, Debug)]
pub enum WebhookCommand {
    /// List webhooks
    List {
        /// Workspace GID
        #[arg(long)]
        workspace: Option<String>,

        /// Resource GID
        #[arg(long)]
        resource: Option<String>,
    },
    /// Show one webhook
    Get(GidArg),
    /// Create a webhook
    Create {
        /// Resource GID to watch
        #[arg(long)]
        resource: String,

        /// Target URL receiving deliveries
        #[arg(long)]
        target: String,
    },
    /// Delete a webhook
    Delete(GidArg),
    /// Show the current configuration (use `webhook filter edit` to change filters)
    Edit(GidArg),
    /// Manage webhook filters
    #[command(subcommand)]
    Filter(WebhookFilterCommand),
    /// Check the signature of a delivery and print its events
    Verify(VerifyArgs),
}

#[derive(Subcommand, Debug)]
pub enum WebhookFilterCommand {
    /// Append a filter
    Add(FilterArgs),
    /// Change one filter, prompting for which when there are several
    Edit {
        #[command(flatten)]
        filter: FilterArgs,

        /// 1-based position of the filter to edit; 0 appends a new one
        #[arg(long)]
        index: Option<usize>,
    },
}

#[derive(Args, Debug, Clone, Default)]
pub struct FilterArgs {
    /// Webhook GID
    #[arg(long)]
    pub gid: String,

    /// changed, added, removed, deleted, undeleted, or all (no action filter)
    #[arg(long)]
    pub action: Option<String>,

    /// Resource type, e.g. task
    #[arg(long)]
    pub resource_type: Option<String>,

    /// Resource subtype, e.g. milestone
    #[arg(long)]
    pub resource_subtype: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct VerifyArgs {
    /// Secret received in the X-Hook-Secret handshake
    #[arg(long, env = "ASANA_WEBHOOK_SECRET", hide_env_values = true)]
    pub secret: String,

    /// Value of the X-Hook-Signature header
    #[arg(long)]
    pub signature: String,

    /// File holding the raw delivery body (stdin when omitted)
    #[arg(long)]
    pub body: Option<std::path::PathBuf>,

    /// Filter expression applied to the delivered events
    #[arg(short = 'f', long)]
    pub filter: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum EventsCommand {
    /// Fetch every event since a sync token
    Get {
        /// Resource GID (project, task, portfolio...)
        #[arg(long)]
        gid: String,

        /// Sync token; omit it to get a fresh one
        #[arg(long)]
        sync: Option<String>,

        /// Filter expression over `event`, e.g. 'event.action == "changed"'
        #[arg(short = 'f', long)]
        filter: Option<String>,
    },
    /// Initialize or refresh the sync token of a resource
    Sync {
        /// Resource GID
        #[arg(long)]
        gid: String,
    },
    /// Poll events until interrupted
    Poll {
        /// Resource GID
        #[arg(long)]
        gid: String,

        /// Initial sync token; fetched automatically when omitted
        #[arg(long)]
        sync: Option<String>,

        /// Time between polls, e.g. 5s, 500ms, 1m
        #[arg(long)]
        interval: Option<String>,

        /// Filter expression over `event`
        #[arg(short = 'f', long)]
        filter: Option<String>,
    },
}

impl Commands {
    /// Short name used in logs
    pub fn name(&self) -> &'static str {
        match self {
            Commands::Task(_) => "task",
            Commands::Project(_) => "project",
            Commands::Workspace(_) => "workspace",
            Commands::User(_) => "user",
            Commands::Webhook(_) => "webhook",
            Commands::Events(_) => "events",
        }
    }
}
