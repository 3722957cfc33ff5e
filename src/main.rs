#![deny(clippy::implicit_return)]
#![allow(clippy::needless_return)]

mod application;
mod configuration;
mod domain;
mod infrastructure;

use std::env;
use std::process;

use anyhow::Error;
use anyhow::Result;
use domain::models::Action;
use domain::models::Event;
use infrastructure::backends::BackendManager;
use tokio::sync::mpsc;
use tokio::task;
use yansi::Paint;

use crate::application::cli;
use crate::application::ui;
use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::services::actions::ActionsService;
use crate::domain::services::JobPoller;

fn handle_error(err: Error) {
    eprintln!(
            "{}",
            Paint::red(format!(
                "Oh no! crewchat has failed with the following app version and error.\n\nVersion: {}\nCommit: {}\nError: {}",
                env!("CARGO_PKG_VERSION"),
                option_env!("VERGEN_GIT_DESCRIBE").unwrap_or("unknown"),
                err
            ))
        );

    let backtrace = err.backtrace();
    if backtrace.to_string() == "disabled backtrace" {
        let args = env::args().collect::<Vec<String>>().join(" ");
        eprintln!("\nRunning the following can help explain further what the issue is:");
        eprintln!("\nRUST_BACKTRACE=1 {args}");
    } else {
        eprintln!("\n{}", backtrace);
    }

    process::exit(1);
}

fn debug_log_dir() -> String {
    if let Ok(dir) = env::var("CREWCHAT_LOG_DIR") {
        return dir;
    }

    return dirs::cache_dir()
        .unwrap_or_else(env::temp_dir)
        .join("crewchat")
        .to_string_lossy()
        .to_string();
}

async fn run() -> Result<()> {
    let backend = BackendManager::get()?;
    let poller = JobPoller::new(
        backend.clone(),
        Config::duration(ConfigKey::PollInterval)?,
        Config::duration(ConfigKey::PollTimeout)?,
    );
    let user_id = Config::get(ConfigKey::UserID);

    let (action_tx, mut action_rx) = mpsc::unbounded_channel::<Action>();
    let (event_tx, event_rx) = mpsc::unbounded_channel::<Event>();

    let mut background_futures = task::JoinSet::new();
    let actions_backend = backend.clone();
    background_futures.spawn(async move {
        return ActionsService::start(
            actions_backend,
            poller,
            &user_id,
            event_tx,
            &mut action_rx,
        )
        .await;
    });

    // Returning drops the action sender, which shuts the actions service
    // down and cancels any job still being polled.
    ui::start(backend, action_tx, event_rx).await?;

    while let Some(res) = background_futures.join_next().await {
        res??;
    }

    return Ok(());
}

#[tokio::main]
async fn main() {
    std::panic::set_hook(Box::new(|panic_info| {
        better_panic::Settings::auto().create_panic_handler()(panic_info);
    }));

    let file_appender = tracing_appender::rolling::never(debug_log_dir(), "debug.log");
    let (writer, _guard) = tracing_appender::non_blocking(file_appender);
    if env::var("RUST_LOG")
        .unwrap_or_else(|_| return "".to_string())
        .contains("crewchat")
    {
        tracing_subscriber::fmt()
            .json()
            .with_max_level(tracing::Level::DEBUG)
            .with_writer(writer)
            .init();
    }

    let ready = match cli::parse().await {
        Ok(ready) => ready,
        Err(err) => {
            handle_error(err);
            return;
        }
    };
    if !ready {
        process::exit(0);
    }

    if let Err(err) = run().await {
        handle_error(err);
    }

    process::exit(0);
}
