use socialwall_backend::{Backend, BackendError, RestBackend};
use socialwall_client::{
    command::{Command, HELP},
    config::{ConfigError, get_env},
    profile::{ProfileError, ProfileStore},
    terminal::{PROMPT, TerminalUi},
    wall::{Flow, Wall},
};
use thiserror::Error;
use time::UtcOffset;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Error)]
enum InitError {
    #[error("{0}")]
    Config(#[from] ConfigError),
    #[error("Error setting up the backend client: {0}")]
    Backend(#[from] BackendError),
    #[error("Error opening local storage: {0}")]
    Profile(#[from] ProfileError),
}

fn install_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "socialwall_client=info,socialwall_backend=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

const SETUP_HINT: &str = "Set up your profile first: `avatar <path>` picks a picture, then \
                          `setup-complete` to save it or `setup-skip` to go without one.";

fn draw<B: Backend>(wall: &Wall<B, TerminalUi>) {
    println!("{}", wall.sidebar());
    println!();
    print!("{}", wall.view());
}

fn main() -> Result<(), InitError> {
    install_tracing();

    // The local offset can only be determined while the process is single
    // threaded.
    let offset = UtcOffset::current_local_offset().unwrap_or_else(|err| {
        warn!(error = %err, "Could not determine local time offset, using UTC");
        UtcOffset::UTC
    });

    run(offset)
}

#[tokio::main(flavor = "current_thread")]
async fn run(offset: UtcOffset) -> Result<(), InitError> {
    let env = get_env()?;

    let backend = RestBackend::new(&env.supabase_url, env.supabase_anon_key)?;
    let profiles = ProfileStore::open(&env.socialwall_data_dir)?;
    info!(path = %profiles.path().display(), "Using local storage");

    let mut wall = Wall::open(
        backend,
        TerminalUi::new(),
        profiles,
        env.socialwall_avatar_policy,
        offset,
    )
    .await;
    draw(&wall);
    println!("Type `help` for a list of commands.");

    while let Some(line) = wall.ui_mut().next_line(PROMPT) {
        if line.trim().is_empty() {
            continue;
        }

        let command = match line.parse::<Command>() {
            Ok(Command::Help) => {
                println!("{HELP}");
                continue;
            }
            Ok(command) => command,
            Err(err) => {
                println!("{err}");
                continue;
            }
        };

        match wall.execute(command).await {
            Flow::Quit => break,
            Flow::Redraw => draw(&wall),
            Flow::Continue => {}
        }
        if wall.composer().in_profile_setup() {
            println!("{SETUP_HINT}");
        }
    }

    Ok(())
}
