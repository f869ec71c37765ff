//! Literacy Census CLI - sign in, record curriculum adoptions, report issues.
//!
//! # Usage
//!
//! ```bash
//! # Sign in (popup providers print a URL to open in a browser)
//! census login google
//! census login email -e teacher@example.org
//!
//! # Look up a school in the public directory
//! census states
//! census districts NJ
//! census schools 3400001
//!
//! # Record which curriculum a school uses
//! census school add --state NJ --district 3400001 --school 340000100123 \
//!     --provider "Wilson Language Training" --product Fundations --year 2023
//!
//! # Report a problem, and triage it as an admin
//! census issue new -t "District list is empty" --type data
//! census admin issues --status open
//! census issue status <ID> resolved
//! ```
//!
//! # Commands
//!
//! - `login`, `signup`, `logout`, `whoami` - Session management
//! - `providers`, `states`, `districts`, `schools` - Lookups for the add form
//! - `school` - School curriculum records
//! - `issue` - Issue reports
//! - `admin` - Admin views (issues, activity, users)
//! - `migrate` - Apply database migrations

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use literacy_census_client::config::AppConfig;
use literacy_census_client::identity::firebase::PopupPresenter;
use literacy_census_client::{AppState, Result, telemetry};
use literacy_census_core::{ActivityKind, IssuePriority, IssueType, ProviderKind};

mod commands;

#[derive(Parser)]
#[command(name = "census")]
#[command(author, version, about = "Literacy Census command-line client")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in
    Login {
        #[command(subcommand)]
        method: LoginMethod,
    },
    /// Create an email/password account
    Signup {
        /// Account email address
        #[arg(short, long)]
        email: String,
    },
    /// Sign out
    Logout,
    /// Show the signed-in user
    Whoami,
    /// List curriculum providers, or the products of one provider
    Providers {
        /// Provider name (exact)
        name: Option<String>,
    },
    /// List states in the schools directory
    States,
    /// List districts in a state
    Districts {
        /// Two-letter state abbreviation
        state: String,
    },
    /// List schools in a district
    Schools {
        /// District id (LEAID)
        leaid: String,
    },
    /// Manage school curriculum records
    School {
        #[command(subcommand)]
        action: SchoolAction,
    },
    /// Report and review issues
    Issue {
        #[command(subcommand)]
        action: IssueAction,
    },
    /// Admin views
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
    /// Apply database migrations
    Migrate,
}

#[derive(Subcommand)]
enum LoginMethod {
    /// Sign in with Google
    Google,
    /// Sign in with GitHub
    Github,
    /// Sign in with Microsoft
    Microsoft,
    /// Sign in with email and password
    Email {
        /// Account email address
        #[arg(short, long)]
        email: String,
    },
}

#[derive(Subcommand)]
enum SchoolAction {
    /// List every record, newest first
    List,
    /// Show one record
    Show {
        /// Record id
        id: String,
    },
    /// Add a record
    Add {
        /// Two-letter state abbreviation
        #[arg(long)]
        state: String,
        /// District id (LEAID)
        #[arg(long)]
        district: String,
        /// School id (NCESSCH)
        #[arg(long)]
        school: String,
        /// Curriculum provider
        #[arg(long)]
        provider: String,
        /// Product line
        #[arg(long)]
        product: String,
        /// Year the curriculum was adopted
        #[arg(long)]
        year: Option<u16>,
        /// Free-form notes
        #[arg(long)]
        notes: Option<String>,
    },
    /// Edit the curriculum fields of a record
    Edit {
        /// Record id
        id: String,
        #[command(flatten)]
        changes: commands::school::SchoolChanges,
    },
    /// Delete a record
    Delete {
        /// Record id
        id: String,
    },
}

#[derive(Subcommand)]
enum IssueAction {
    /// Report a new issue
    New {
        /// Short summary
        #[arg(short, long)]
        title: String,
        /// Details
        #[arg(short, long, default_value = "")]
        description: String,
        /// Issue type (`bug`, `feature`, `data`, `other`)
        #[arg(long = "type")]
        issue_type: Option<IssueType>,
        /// Priority (`low`, `medium`, `high`)
        #[arg(short, long)]
        priority: Option<IssuePriority>,
    },
    /// List issues you reported
    List,
    /// Set an issue's status (admin only)
    Status {
        /// Issue id
        id: String,
        /// New status, such as `in_progress` or `resolved`
        status: String,
    },
}

#[derive(Subcommand)]
enum AdminAction {
    /// All issues, newest first
    Issues {
        /// Only issues with this status (`all` for every issue)
        #[arg(short, long)]
        status: Option<String>,
    },
    /// Recent activity, newest first
    Activity {
        /// Only entries of this type
        #[arg(long = "type")]
        kind: Option<ActivityKind>,
        /// Maximum number of entries
        #[arg(short, long, default_value_t = 50)]
        limit: usize,
    },
    /// Registered users
    Users,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            #[allow(clippy::print_stderr)]
            {
                eprintln!("Error: {e}");
            }
            return ExitCode::FAILURE;
        }
    };

    // Initialize Sentry before tracing so the tracing layer can forward events
    let _sentry_guard = telemetry::init_sentry(&config);
    telemetry::init_tracing(&config);

    match run(cli, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            e.report();
            #[allow(clippy::print_stderr)]
            {
                eprintln!("Error: {}", e.user_message());
            }
            ExitCode::FAILURE
        }
    }
}

/// Show the consent-page URL for popup sign-in on stderr.
fn popup_presenter() -> PopupPresenter {
    Arc::new(|kind, url| {
        #[allow(clippy::print_stderr)]
        {
            eprintln!("Open this URL in your browser to sign in with {kind}:\n\n  {url}\n");
        }
    })
}

async fn run(cli: Cli, config: AppConfig) -> Result<()> {
    let state = AppState::connect(config, popup_presenter()).await?;
    state.session().wait_until_ready().await;

    match cli.command {
        Commands::Login { method } => match method {
            LoginMethod::Google => commands::auth::login(&state, ProviderKind::Google).await?,
            LoginMethod::Github => commands::auth::login(&state, ProviderKind::GitHub).await?,
            LoginMethod::Microsoft => {
                commands::auth::login(&state, ProviderKind::Microsoft).await?;
            }
            LoginMethod::Email { email } => commands::auth::login_email(&state, &email).await?,
        },
        Commands::Signup { email } => commands::auth::signup(&state, &email).await?,
        Commands::Logout => commands::auth::logout(&state).await?,
        Commands::Whoami => commands::auth::whoami(&state),
        Commands::Providers { name } => commands::lookup::providers(&state, name.as_deref())?,
        Commands::States => commands::lookup::states(&state).await?,
        Commands::Districts { state: abbr } => commands::lookup::districts(&state, &abbr).await?,
        Commands::Schools { leaid } => commands::lookup::schools(&state, &leaid).await?,
        Commands::School { action } => match action {
            SchoolAction::List => commands::school::list(&state).await?,
            SchoolAction::Show { id } => commands::school::show(&state, &id).await?,
            SchoolAction::Add {
                state: abbr,
                district,
                school,
                provider,
                product,
                year,
                notes,
            } => {
                let form = commands::school::AddForm {
                    state: abbr,
                    district_id: district,
                    school_id: school,
                    provider,
                    product,
                    year,
                    notes,
                };
                commands::school::add(&state, form).await?;
            }
            SchoolAction::Edit { id, changes } => {
                commands::school::edit(&state, &id, changes).await?;
            }
            SchoolAction::Delete { id } => commands::school::delete(&state, &id).await?,
        },
        Commands::Issue { action } => match action {
            IssueAction::New {
                title,
                description,
                issue_type,
                priority,
            } => {
                commands::issue::create(&state, &title, &description, issue_type, priority)
                    .await?;
            }
            IssueAction::List => commands::issue::list_own(&state).await?,
            IssueAction::Status { id, status } => {
                commands::issue::set_status(&state, &id, &status).await?;
            }
        },
        Commands::Admin { action } => match action {
            AdminAction::Issues { status } => {
                commands::admin::issues(&state, status.as_deref()).await?;
            }
            AdminAction::Activity { kind, limit } => {
                commands::admin::activity(&state, kind, limit).await?;
            }
            AdminAction::Users => commands::admin::users(&state).await?,
        },
        Commands::Migrate => commands::migrate::run(&state).await?,
    }
    Ok(())
}
