//! Atelier CLI - binary entry point for the founder session store.
//!
//! # Architecture
//!
//! One subcommand per session operation. Every run resolves the data
//! directory and opens the record store under it; the previously active
//! session is restored before the command executes.
//!
//! ```text
//! main() -> parse_command() -> run() -> SessionManager
//! ```
//!
//! # Exit Codes
//!
//! Rejected credentials and unknown identities are ordinary outcomes: the
//! command reports them on stdout and exits zero. A nonzero exit means the
//! invocation was malformed (2) or the record store itself failed (1).

use std::env;
use std::fs::{self, OpenOptions};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Mutex;

use anyhow::{Context, Result};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use atelier_session::{AuthError, DataDir, SessionManager};
use atelier_types::Progress;

const USAGE: &str = "\
Usage: atelier <command>

Commands:
  register <identity> <display-name>   create an account and sign in
  login <identity>                     sign in to an existing account
  status                               show the active session
  bump <progress>                      advance progress (0-100)
  logout                               sign out and forget the session

The secret is read from ATELIER_SECRET, never from arguments.";

#[derive(Debug)]
enum Command {
    Register {
        identity: String,
        display_name: String,
        secret: String,
    },
    Login {
        identity: String,
        secret: String,
    },
    Status,
    Bump {
        candidate: Progress,
    },
    Logout,
}

fn parse_command(args: Vec<String>, secret: Option<String>) -> Result<Command, String> {
    let mut args = args.into_iter();
    let Some(command) = args.next() else {
        return Err("missing command".to_string());
    };

    let command = match command.as_str() {
        "register" => {
            let identity = args
                .next()
                .ok_or_else(|| "register takes an identity and a display name".to_string())?;
            let display_name = args
                .next()
                .ok_or_else(|| "register takes an identity and a display name".to_string())?;
            Command::Register {
                identity,
                display_name,
                secret: require_secret(secret)?,
            }
        }
        "login" => {
            let identity = args
                .next()
                .ok_or_else(|| "login takes an identity".to_string())?;
            Command::Login {
                identity,
                secret: require_secret(secret)?,
            }
        }
        "status" => Command::Status,
        "bump" => {
            let raw = args
                .next()
                .ok_or_else(|| "bump takes a progress value".to_string())?;
            let value: u8 = raw
                .parse()
                .map_err(|_| format!("not a progress value: {raw}"))?;
            let candidate = Progress::new(value).map_err(|e| e.to_string())?;
            Command::Bump { candidate }
        }
        "logout" => Command::Logout,
        other => return Err(format!("unknown command: {other}")),
    };

    if let Some(extra) = args.next() {
        return Err(format!("unexpected argument: {extra}"));
    }
    Ok(command)
}

fn require_secret(secret: Option<String>) -> Result<String, String> {
    secret.ok_or_else(|| {
        "ATELIER_SECRET is not set; the secret is read from the environment, not from arguments"
            .to_string()
    })
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap_or_else(|_| EnvFilter::try_new("warn").expect("warn filter is valid"));

    let (log_file, init_warnings) = open_log_file();

    if let Some((log_path, file)) = log_file {
        tracing_subscriber::registry()
            .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
            .with(env_filter)
            .init();

        tracing::info!(path = %log_path.display(), "logging initialized");
        for warning in init_warnings {
            tracing::warn!("{warning}");
        }
        return;
    }

    // With no writable log file, no logs beats interleaving them with
    // command output.
    tracing_subscriber::registry().with(env_filter).init();
}

fn open_log_file() -> (Option<(PathBuf, std::fs::File)>, Vec<String>) {
    let mut warnings = Vec::new();

    for candidate in log_file_candidates() {
        if let Some(parent) = candidate.parent()
            && let Err(e) = fs::create_dir_all(parent)
        {
            warnings.push(format!(
                "Failed to create log dir {}: {e}",
                parent.display()
            ));
            continue;
        }

        match OpenOptions::new()
            .create(true)
            .append(true)
            .open(&candidate)
        {
            Ok(file) => return (Some((candidate, file)), warnings),
            Err(e) => {
                warnings.push(format!(
                    "Failed to open log file {}: {e}",
                    candidate.display()
                ));
            }
        }
    }

    (None, warnings)
}

fn log_file_candidates() -> Vec<PathBuf> {
    let data_dir = DataDir::resolve();
    vec![
        data_dir.join("logs").join("atelier.log"),
        PathBuf::from(".atelier").join("logs").join("atelier.log"),
    ]
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();

    let args: Vec<String> = env::args().skip(1).collect();
    let command = match parse_command(args, env::var("ATELIER_SECRET").ok()) {
        Ok(command) => command,
        Err(message) => {
            eprintln!("{message}");
            eprintln!();
            eprintln!("{USAGE}");
            return ExitCode::from(2);
        }
    };

    match run(command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:?}");
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Command) -> Result<()> {
    let data_dir = DataDir::resolve();
    if data_dir.is_fallback() {
        eprintln!(
            "warning: no platform data directory, using {}",
            data_dir.path.display()
        );
    }

    let mut manager = SessionManager::open(&data_dir)
        .with_context(|| format!("open record store under {}", data_dir.path.display()))?;
    manager.bootstrap().await;

    match command {
        Command::Register {
            identity,
            display_name,
            secret,
        } => register(&mut manager, &identity, &display_name, &secret).await,
        Command::Login { identity, secret } => login(&mut manager, &identity, &secret).await,
        Command::Status => {
            status(&manager);
            Ok(())
        }
        Command::Bump { candidate } => {
            bump(&mut manager, candidate).await;
            Ok(())
        }
        Command::Logout => {
            logout(&mut manager);
            Ok(())
        }
    }
}

async fn register(
    manager: &mut SessionManager,
    identity: &str,
    display_name: &str,
    secret: &str,
) -> Result<()> {
    if let Err(err) = manager.register(identity, display_name, secret).await {
        return report_rejection(err);
    }
    let Some(session) = manager.session() else {
        return Ok(());
    };
    println!("Welcome, {}. Foundation is open.", session.display_name);
    Ok(())
}

async fn login(manager: &mut SessionManager, identity: &str, secret: &str) -> Result<()> {
    if let Err(err) = manager.login(identity, secret).await {
        return report_rejection(err);
    }
    let Some(session) = manager.session() else {
        return Ok(());
    };
    println!(
        "Welcome back, {}. Progress {}/100.",
        session.display_name, session.progress
    );
    Ok(())
}

/// Rejections are ordinary outcomes reported on stdout. Only store trouble
/// escalates into an error exit.
fn report_rejection(err: AuthError) -> Result<()> {
    match err {
        AuthError::UnknownIdentity | AuthError::BadCredential | AuthError::IdentityExists => {
            println!("{err}");
            Ok(())
        }
        AuthError::Transient(_) => Err(err.into()),
    }
}

fn status(manager: &SessionManager) {
    let Some(session) = manager.session() else {
        println!("No active session. Try `atelier login <identity>`.");
        return;
    };

    println!("{} <{}>", session.display_name, session.identity_key);
    if let Some(brand) = &session.brand {
        println!("Brand: {}", brand.name);
    }
    if let Some(profile) = &session.profile {
        println!("Voice: {}", profile.archetype);
    }
    if !session.personas.is_empty() {
        println!("Personas: {}", session.personas.len());
    }
    println!("Progress: {}/100", session.progress);

    for status in session.phase_statuses() {
        let gate = if status.complete {
            "complete"
        } else if status.unlocked {
            "open"
        } else {
            "locked"
        };
        println!("  {:<10} {gate}", status.phase.display_name());
    }

    if !session.activities.is_empty() {
        println!("Recent:");
        for item in session.activities.iter().take(5) {
            println!("  [{}] {}", item.kind.as_str(), item.title);
        }
    }
}

async fn bump(manager: &mut SessionManager, candidate: Progress) {
    let Some(before) = manager.session().map(|session| session.progress) else {
        println!("No active session to advance.");
        return;
    };

    manager.bump_progress(candidate).await;
    let Some(session) = manager.session() else {
        return;
    };

    if session.progress == before {
        println!("Progress stays at {}/100.", session.progress);
        return;
    }

    println!("Progress {}/100.", session.progress);
    for status in session.phase_statuses() {
        if status.unlocked && status.phase.threshold() > before.value() {
            println!("{} unlocked.", status.phase.display_name());
        }
    }
}

fn logout(manager: &mut SessionManager) {
    manager.logout();
    println!("Signed out.");
}

#[cfg(test)]
mod tests {
    use super::{Command, parse_command};

    fn argv(parts: &[&str]) -> Vec<String> {
        parts.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn register_takes_identity_name_and_environment_secret() {
        let command = parse_command(
            argv(&["register", "ada@example.com", "Ada"]),
            Some("hunter2".to_string()),
        )
        .expect("parse");

        match command {
            Command::Register {
                identity,
                display_name,
                secret,
            } => {
                assert_eq!(identity, "ada@example.com");
                assert_eq!(display_name, "Ada");
                assert_eq!(secret, "hunter2");
            }
            other => panic!("expected register, got {other:?}"),
        }
    }

    #[test]
    fn credential_commands_demand_a_secret() {
        let err = parse_command(argv(&["login", "ada@example.com"]), None).expect_err("no secret");
        assert!(err.contains("ATELIER_SECRET"));
    }

    #[test]
    fn bump_validates_its_argument() {
        let err = parse_command(argv(&["bump", "120"]), None).expect_err("out of range");
        assert!(err.contains("120"));

        let err = parse_command(argv(&["bump", "soon"]), None).expect_err("not a number");
        assert!(err.contains("soon"));
    }

    #[test]
    fn surplus_arguments_are_rejected() {
        let err = parse_command(argv(&["status", "extra"]), None).expect_err("surplus");
        assert!(err.contains("extra"));
    }

    #[test]
    fn unknown_commands_name_themselves() {
        let err = parse_command(argv(&["dance"]), None).expect_err("unknown");
        assert_eq!(err, "unknown command: dance");
    }
}
