use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use serde::Serialize;

use taskboard::config::{ClientConfig, ConfigError};
use taskboard::net::types::{NewUser, Role, UserId, UserUpdate};
use taskboard::router::{RouteError, RouteName};
use taskboard::state::board::{Attachment, BoardError, Comment, NewTask, Priority, TaskPatch};
use taskboard::util::storage::{FileStorage, KeyValueStorage, MemoryStorage};
use taskboard::{ApiError, BoardStore, HttpApi, Navigation, Router, SessionStore};

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("{0}")]
    Api(#[from] ApiError),
    #[error("{0}")]
    Board(#[from] BoardError),
    #[error("{0}")]
    Route(#[from] RouteError),
    #[error("not signed in; run `taskboard login` first")]
    NotSignedIn,
    #[error("nothing to update; pass at least one field")]
    EmptyUpdate,
    #[error("user not found: {0}")]
    UserNotFound(UserId),
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(name = "taskboard", about = "Kanban board client: session, users, routes, board")]
struct Cli {
    /// Overrides `TASKBOARD_API_URL` from the environment.
    #[arg(long)]
    api_url: Option<String>,

    /// Keep the session in memory only for this invocation.
    #[arg(long, default_value_t = false)]
    ephemeral: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Login {
        #[arg(long, env = "TASKBOARD_EMAIL")]
        email: String,
        #[arg(long, env = "TASKBOARD_PASSWORD", hide_env_values = true)]
        password: String,
    },
    Logout,
    Whoami,
    Users(UsersCommand),
    /// Run the navigation guard for a path against the current session.
    Route {
        path: String,
    },
    Board(BoardCommand),
}

#[derive(Args, Debug)]
struct UsersCommand {
    #[command(subcommand)]
    command: UsersSubcommand,
}

#[derive(Subcommand, Debug)]
enum UsersSubcommand {
    List,
    Show {
        id: String,
    },
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long, env = "TASKBOARD_NEW_PASSWORD", hide_env_values = true)]
        password: String,
        #[arg(long, value_parser = parse_role, default_value = "WORKER")]
        role: Role,
    },
    Update {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        password: Option<String>,
        #[arg(long, value_parser = parse_role)]
        role: Option<Role>,
    },
    Delete {
        id: String,
    },
}

#[derive(Args, Debug)]
struct BoardCommand {
    #[command(subcommand)]
    command: BoardSubcommand,
}

#[derive(Subcommand, Debug)]
enum BoardSubcommand {
    Show,
    /// Tasks assigned to the signed-in user.
    Mine,
    AddTask {
        column_id: String,
        #[arg(long)]
        title: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long)]
        due_date: Option<String>,
        #[arg(long, value_parser = parse_priority, default_value = "medium")]
        priority: Priority,
        #[arg(long)]
        assign: Option<String>,
    },
    UpdateTask {
        task_id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        due_date: Option<String>,
        #[arg(long)]
        progress: Option<u8>,
        #[arg(long, value_parser = parse_priority)]
        priority: Option<Priority>,
        #[arg(long)]
        assign: Option<String>,
        #[arg(long, default_value_t = false, conflicts_with = "assign")]
        unassign: bool,
    },
    Comment {
        task_id: String,
        text: String,
    },
    Attach {
        task_id: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        url: String,
    },
}

fn parse_role(raw: &str) -> Result<Role, String> {
    Role::parse(raw).ok_or_else(|| format!("unknown role `{raw}` (expected ADMIN or WORKER)"))
}

fn parse_priority(raw: &str) -> Result<Priority, String> {
    match raw.to_ascii_lowercase().as_str() {
        "low" => Ok(Priority::Low),
        "medium" => Ok(Priority::Medium),
        "high" => Ok(Priority::High),
        _ => Err(format!("unknown priority `{raw}` (expected low, medium or high)")),
    }
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let cli = Cli::parse();
    let mut config = ClientConfig::from_env()?;
    if let Some(api_url) = cli.api_url.as_deref() {
        config = config.with_api_url(api_url)?;
    }

    let storage: Box<dyn KeyValueStorage> = if cli.ephemeral {
        Box::new(MemoryStorage::new())
    } else {
        Box::new(FileStorage::open(config.storage_path()))
    };
    let api = HttpApi::new(config.api_url.clone(), config.timeouts)?;
    let mut session = SessionStore::new(Arc::new(api), storage);

    match cli.command {
        Command::Login { email, password } => {
            let user = session.login(&email, &password).await?;
            print_json(&user)
        }
        Command::Logout => {
            session.logout();
            println!("signed out");
            Ok(())
        }
        Command::Whoami => {
            let user = session.current_user().ok_or(CliError::NotSignedIn)?;
            print_json(&serde_json::json!({
                "user": user,
                "isAuthenticated": session.is_authenticated(),
                "isAdmin": session.is_admin(),
            }))
        }
        Command::Users(users) => run_users(&mut session, users).await,
        Command::Route { path } => run_route(&session, &path),
        Command::Board(board) => {
            let store = BoardStore::sample(config.mock_latency);
            run_board(&session, store, board).await
        }
    }
}

async fn run_users(session: &mut SessionStore, users: UsersCommand) -> Result<(), CliError> {
    if !session.is_authenticated() {
        return Err(CliError::NotSignedIn);
    }

    match users.command {
        UsersSubcommand::List => {
            session.fetch_users().await;
            print_json(&session.users())
        }
        UsersSubcommand::Show { id } => {
            let user = session.fetch_user(&UserId::new(id)).await?;
            print_json(&user)
        }
        UsersSubcommand::Create { name, email, password, role } => {
            let created = session.create_user(&NewUser { name, email, password, role }).await?;
            print_json(&created)
        }
        UsersSubcommand::Update { id, name, email, password, role } => {
            let update = UserUpdate { name, email, password, role };
            if update.is_empty() {
                return Err(CliError::EmptyUpdate);
            }
            let id = UserId::new(id);
            let echoed = session.update_user(&id, &update).await?;
            let refreshed = session.users().iter().find(|u| u.id == id).cloned();
            match echoed.or(refreshed) {
                Some(user) => print_json(&user),
                None => Err(CliError::UserNotFound(id)),
            }
        }
        UsersSubcommand::Delete { id } => {
            let id = UserId::new(id);
            session.delete_user(&id).await?;
            println!("deleted {id}");
            Ok(())
        }
    }
}

fn run_route(session: &SessionStore, path: &str) -> Result<(), CliError> {
    let router = Router::default();
    let resolved = router.resolve(path)?;
    let decision = router.navigate(path, session.access())?;
    let (allowed, redirect) = match decision {
        Navigation::Allow => (true, None),
        Navigation::Redirect(target) => (false, Some(target)),
    };
    print_json(&serde_json::json!({
        "path": resolved.path,
        "route": resolved.name.as_str(),
        "params": resolved.params,
        "allowed": allowed,
        "redirect": redirect.map(RouteName::as_str),
        "redirectPath": redirect.and_then(|target| router.path_for(target)),
    }))
}

async fn run_board(session: &SessionStore, mut store: BoardStore, board: BoardCommand) -> Result<(), CliError> {
    match board.command {
        BoardSubcommand::Show => print_json(&store.fetch_board().await),
        BoardSubcommand::Mine => {
            let user = session.current_user().ok_or(CliError::NotSignedIn)?;
            let snapshot = store.fetch_board().await;
            print_json(&snapshot.tasks_assigned_to(&user.id))
        }
        BoardSubcommand::AddTask { column_id, title, description, due_date, priority, assign } => {
            let new_task = NewTask {
                title,
                description,
                due_date,
                priority,
                assigned_to: assign.map(UserId::new),
                labels: Vec::new(),
            };
            let task = store.add_task(&column_id, new_task).await?;
            print_json(&task)
        }
        BoardSubcommand::UpdateTask {
            task_id,
            title,
            description,
            due_date,
            progress,
            priority,
            assign,
            unassign,
        } => {
            let assigned_to = if unassign { Some(None) } else { assign.map(|id| Some(UserId::new(id))) };
            let patch = TaskPatch {
                id: task_id,
                title,
                description,
                due_date,
                progress,
                priority,
                assigned_to,
                labels: None,
            };
            let task = store.update_task(patch).await?;
            print_json(&task)
        }
        BoardSubcommand::Comment { task_id, text } => {
            let user = session.current_user().ok_or(CliError::NotSignedIn)?;
            let task = store.add_comment(&task_id, Comment::new(user.id.clone(), text)).await?;
            print_json(&task)
        }
        BoardSubcommand::Attach { task_id, name, url } => {
            let attachment = Attachment { id: format!("attachment-{}", uuid::Uuid::new_v4()), name, url };
            let task = store.add_attachment(&task_id, attachment).await?;
            print_json(&task)
        }
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}
