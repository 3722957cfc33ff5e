#[cfg(test)]
#[path = "cli_test.rs"]
mod tests;

use std::io;
use std::path;

use anyhow::bail;
use anyhow::Result;
use clap::value_parser;
use clap::Arg;
use clap::ArgAction;
use clap::ArgMatches;
use clap::Command;
use clap_complete::generate;
use clap_complete::Generator;
use clap_complete::Shell;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use yansi::Paint;

use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::services::actions::help_text;
use crate::domain::services::format_session;
use crate::domain::services::Sessions;
use crate::infrastructure::backends::BackendManager;

fn print_completions<G: Generator>(gen: G, cmd: &mut Command) {
    generate(gen, cmd, cmd.get_name().to_string(), &mut io::stdout());
    std::process::exit(0);
}

fn sessions_service() -> Result<Sessions> {
    return Ok(Sessions::new(BackendManager::get()?));
}

async fn print_sessions_list() -> Result<()> {
    let user_id = Config::get(ConfigKey::UserID);
    let sessions = sessions_service()?
        .list(&user_id)
        .await?
        .iter()
        .map(format_session)
        .collect::<Vec<String>>();

    if sessions.is_empty() {
        println!("There are no sessions available for {user_id}. You should start your first one!");
    } else {
        println!("{}", sessions.join("\n"));
    }

    return Ok(());
}

async fn create_session(title: &str) -> Result<()> {
    let created = sessions_service()?
        .create(&Config::get(ConfigKey::UserID), title)
        .await?;
    println!(
        "Created session \"{}\" with ID {}",
        created.title, created.session_id
    );

    return Ok(());
}

async fn open_session(session_id: &str) -> Result<()> {
    // Fails early on unknown ids instead of starting a chat on a dead session.
    let session = sessions_service()?.load(session_id).await?;
    Config::set(ConfigKey::SessionID, &session.session_id);

    return Ok(());
}

async fn create_config_file() -> Result<()> {
    let config_file_path_str = Config::default(ConfigKey::ConfigFile);
    let config_file_path = path::PathBuf::from(&config_file_path_str);
    if config_file_path.exists() {
        bail!(format!(
            "Config file already exists at {config_file_path_str}"
        ));
    }

    if let Some(parent) = config_file_path.parent() {
        if !parent.exists() {
            fs::create_dir_all(parent).await?;
        }
    }

    let mut file = fs::File::create(&config_file_path).await?;
    file.write_all(Config::serialize_default(build()).as_bytes())
        .await?;

    println!(
        "Created default config file at {}",
        config_file_path.to_string_lossy()
    );
    return Ok(());
}

fn subcommand_completions() -> Command {
    return Command::new("completions")
        .about("Generates shell completions.")
        .arg(
            clap::Arg::new("shell")
                .short('s')
                .long("shell")
                .help("Which shell to generate completions for.")
                .action(ArgAction::Set)
                .value_parser(value_parser!(Shell))
                .required(true),
        );
}

fn subcommand_config() -> Command {
    return Command::new("config")
        .about("Configuration file options.")
        .subcommand(
            Command::new("create").about("Saves the default config file to the configuration file path. This command will fail if the file exists already.")
        )
        .subcommand(
            Command::new("default").about("Outputs the default configuration file to stdout.")
        )
        .subcommand(
            Command::new("path").about("Returns the default path for the configuration file.")
        );
}

fn arg_session_id() -> Arg {
    return Arg::new(ConfigKey::SessionID.to_string())
        .short('i')
        .long("id")
        .help("Session ID")
        .num_args(1)
        .required(true);
}

fn arg_title(required: bool) -> Arg {
    return Arg::new("title")
        .short('t')
        .long("title")
        .help("Session title")
        .num_args(1)
        .required(required);
}

fn subcommand_sessions() -> Command {
    return Command::new("sessions")
        .about("Manage chat sessions stored on the crew backend.")
        .arg_required_else_help(true)
        .subcommand(
            Command::new("list").about("List your sessions, most recently updated first."),
        )
        .subcommand(
            Command::new("open")
                .about("Open a session by ID and continue chatting in it.")
                .arg(arg_session_id()),
        )
        .subcommand(
            Command::new("create")
                .about("Create an empty session. The title defaults to the current date and time.")
                .arg(arg_title(false)),
        )
        .subcommand(
            Command::new("rename")
                .about("Rename a session.")
                .arg(arg_session_id())
                .arg(arg_title(true)),
        )
        .subcommand(
            Command::new("delete")
                .about("Delete a session and its messages.")
                .arg(arg_session_id()),
        );
}

fn arg_config_key(key: ConfigKey, env: &'static str, help: &str) -> Arg {
    let mut help = help.to_string();
    let default = Config::default(key);
    if !default.is_empty() {
        help = format!("{help} [default: {default}]");
    }

    return Arg::new(key.to_string())
        .long(key.to_string())
        .env(env)
        .num_args(1)
        .help(help)
        .global(true);
}

pub fn build() -> Command {
    let commands_text = help_text()
        .split('\n')
        .map(|line| {
            if line.starts_with('-') {
                return format!("  {line}");
            }
            if line.starts_with("COMMANDS:") {
                return Paint::new(format!("CHAT {line}"))
                    .underline()
                    .bold()
                    .to_string();
            }
            return line.to_string();
        })
        .collect::<Vec<String>>()
        .join("\n");

    let about = format!(
        "{}\n\nVersion: {}\nCommit: {}",
        env!("CARGO_PKG_DESCRIPTION"),
        env!("CARGO_PKG_VERSION"),
        option_env!("VERGEN_GIT_DESCRIBE").unwrap_or("unknown")
    );

    return Command::new("crewchat")
        .about(about)
        .author(env!("CARGO_PKG_AUTHORS"))
        .version(env!("CARGO_PKG_VERSION"))
        .after_help(commands_text)
        .arg_required_else_help(false)
        .subcommand(Command::new("chat").about("Start a new chat. A session is created with your first message."))
        .subcommand(subcommand_completions())
        .subcommand(subcommand_config())
        .subcommand(subcommand_sessions())
        .arg(
            Arg::new(ConfigKey::ConfigFile.to_string())
                .short('c')
                .long(ConfigKey::ConfigFile.to_string())
                .env("CREWCHAT_CONFIG_FILE")
                .num_args(1)
                .help(format!("Path to configuration file [default: {}]", Config::default(ConfigKey::ConfigFile)))
                .global(true)
        )
        .arg(arg_config_key(
            ConfigKey::ApiURL,
            "CREWCHAT_API_URL",
            "Base URL of the crew backend API.",
        ))
        .arg(arg_config_key(
            ConfigKey::CustomerDomain,
            "CREWCHAT_CUSTOMER_DOMAIN",
            "Customer domain sent with a job when the message doesn't mention one.",
        ))
        .arg(arg_config_key(
            ConfigKey::PollInterval,
            "CREWCHAT_POLL_INTERVAL",
            "Time in milliseconds between job status checks.",
        ))
        .arg(arg_config_key(
            ConfigKey::PollTimeout,
            "CREWCHAT_POLL_TIMEOUT",
            "Time in milliseconds to wait for a job before giving up on it.",
        ))
        .arg(arg_config_key(
            ConfigKey::RequestTimeout,
            "CREWCHAT_REQUEST_TIMEOUT",
            "Time in milliseconds before a single HTTP request to the backend times out.",
        ))
        .arg(
            arg_config_key(
                ConfigKey::UserID,
                "CREWCHAT_USER_ID",
                "User id that owns your sessions.",
            )
            .short('u'),
        );
}

async fn load_config(matches: &ArgMatches, subcmd_matches: Option<&ArgMatches>) -> Result<()> {
    let mut all_matches = vec![matches];
    if let Some(subcmd_matches) = subcmd_matches {
        all_matches.push(subcmd_matches);
    }

    return Config::load(all_matches).await;
}

/// Returns true when the chat should start.
pub async fn parse() -> Result<bool> {
    let matches = build().get_matches();

    match matches.subcommand() {
        Some(("chat", subcmd_matches)) => {
            load_config(&matches, Some(subcmd_matches)).await?;
        }
        Some(("completions", subcmd_matches)) => {
            if let Some(completions) = subcmd_matches.get_one::<Shell>("shell").copied() {
                let mut app = build();
                print_completions(completions, &mut app);
            }
        }
        Some(("config", subcmd_matches)) => match subcmd_matches.subcommand() {
            Some(("create", _)) => {
                create_config_file().await?;
                return Ok(false);
            }
            Some(("default", _)) => {
                println!("{}", Config::serialize_default(build()));
                return Ok(false);
            }
            Some(("path", _)) => {
                println!("{}", Config::default(ConfigKey::ConfigFile));
                return Ok(false);
            }
            _ => {
                subcommand_config().print_long_help()?;
                return Ok(false);
            }
        },
        Some(("sessions", subcmd_matches)) => match subcmd_matches.subcommand() {
            Some(("list", list_matches)) => {
                load_config(&matches, Some(list_matches)).await?;
                print_sessions_list().await?;
                return Ok(false);
            }
            Some(("open", open_matches)) => {
                load_config(&matches, Some(open_matches)).await?;
                open_session(&Config::get(ConfigKey::SessionID)).await?;
            }
            Some(("create", create_matches)) => {
                load_config(&matches, Some(create_matches)).await?;
                let title = create_matches
                    .get_one::<String>("title")
                    .map(|title| return title.to_string())
                    .unwrap_or_default();
                create_session(&title).await?;
                return Ok(false);
            }
            Some(("rename", rename_matches)) => {
                load_config(&matches, Some(rename_matches)).await?;
                let session_id = Config::get(ConfigKey::SessionID);
                if let Some(title) = rename_matches.get_one::<String>("title") {
                    sessions_service()?.rename(&session_id, title).await?;
                    println!("Renamed session {session_id} to \"{title}\"");
                }
                return Ok(false);
            }
            Some(("delete", delete_matches)) => {
                load_config(&matches, Some(delete_matches)).await?;
                let session_id = Config::get(ConfigKey::SessionID);
                sessions_service()?.delete(&session_id).await?;
                println!("Deleted session {session_id}");
                return Ok(false);
            }
            _ => {
                subcommand_sessions().print_long_help()?;
                return Ok(false);
            }
        },
        _ => {
            load_config(&matches, None).await?;
        }
    }

    return Ok(true);
}
