//! Command-line definition and argument resolution

use anyhow::{anyhow, Context, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use moodcheck_core::{ProfileDraft, Score, SurveyConfig, DEFAULT_AVATAR};
use std::path::PathBuf;

/// What the user asked for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Create a profile
    Profile(ProfileDraft),
    /// Submit one answer
    Answer {
        /// Answering profile
        user_id: i64,
        /// Question answered
        question_id: i64,
        /// Likert answer
        score: Score,
    },
    /// Print the admin report
    Report {
        /// Emit the raw snapshot as JSON
        json: bool,
        /// Append per-question summary
        summary: bool,
    },
    /// Wipe local data
    Clear,
}

/// Fully resolved invocation
#[derive(Debug, Clone)]
pub struct Invocation {
    /// Effective configuration
    pub config: SurveyConfig,
    /// Emit logs as JSON lines
    pub log_json: bool,
    /// Requested action
    pub action: Action,
}

/// Build the `moodcheck` command
#[must_use]
pub fn build_command() -> Command {
    Command::new("moodcheck")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Mood survey data gateway with offline fallback")
        .subcommand_required(true)
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("TOML configuration file"),
        )
        .arg(
            Arg::new("api-url")
                .long("api-url")
                .global(true)
                .help("Base URL of the survey server"),
        )
        .arg(
            Arg::new("data-dir")
                .long("data-dir")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("Directory for offline data"),
        )
        .arg(
            Arg::new("log-json")
                .long("log-json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON lines on stderr"),
        )
        .subcommand(
            Command::new("profile")
                .about("Create a child profile")
                .arg(Arg::new("name").long("name").required(true).help("Display name"))
                .arg(
                    Arg::new("avatar")
                        .long("avatar")
                        .default_value(DEFAULT_AVATAR)
                        .help("Emoji avatar"),
                )
                .arg(Arg::new("grade").long("grade").required(true).help("Grade label"))
                .arg(Arg::new("gender").long("gender").required(true).help("Gender label")),
        )
        .subcommand(
            Command::new("answer")
                .about("Submit an answer to one question")
                .arg(
                    Arg::new("user")
                        .long("user")
                        .required(true)
                        .allow_negative_numbers(true)
                        .value_parser(value_parser!(i64))
                        .help("Profile id"),
                )
                .arg(
                    Arg::new("question")
                        .long("question")
                        .required(true)
                        .value_parser(value_parser!(i64))
                        .help("Question id"),
                )
                .arg(
                    Arg::new("score")
                        .long("score")
                        .required(true)
                        .value_parser(value_parser!(i64))
                        .help("Answer on a 1-5 scale"),
                ),
        )
        .subcommand(
            Command::new("report")
                .about("Show every answer, newest first")
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Output as JSON"),
                )
                .arg(
                    Arg::new("summary")
                        .long("summary")
                        .action(ArgAction::SetTrue)
                        .help("Include per-question summary"),
                ),
        )
        .subcommand(Command::new("clear").about("Delete all offline data"))
}

/// Resolve matches into an invocation, reading the process environment
///
/// # Errors
/// Fails on unreadable configuration or invalid arguments.
pub fn resolve(matches: &ArgMatches) -> Result<Invocation> {
    resolve_with(matches, |key| std::env::var(key).ok())
}

/// Resolve matches into an invocation with an explicit variable lookup
///
/// Precedence: flags, then environment, then config file, then defaults.
///
/// # Errors
/// Fails on unreadable configuration or invalid arguments.
pub fn resolve_with<F>(matches: &ArgMatches, lookup: F) -> Result<Invocation>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = match matches.get_one::<PathBuf>("config") {
        Some(path) => SurveyConfig::load(path)?,
        None => SurveyConfig::default(),
    }
    .with_overrides_from(lookup);

    if let Some(url) = matches.get_one::<String>("api-url") {
        config = config.with_api_base_url(url.clone());
    }
    if let Some(dir) = matches.get_one::<PathBuf>("data-dir") {
        config = config.with_data_dir(dir.clone());
    }

    let action = match matches.subcommand() {
        Some(("profile", args)) => {
            let draft = ProfileDraft::new(
                required::<String>(args, "name")?,
                required::<String>(args, "avatar")?,
                required::<String>(args, "grade")?,
                required::<String>(args, "gender")?,
            );
            draft.validate()?;
            Action::Profile(draft)
        }
        Some(("answer", args)) => {
            let raw_score = required::<i64>(args, "score")?;
            Action::Answer {
                user_id: required(args, "user")?,
                question_id: required(args, "question")?,
                score: Score::new(raw_score).context("--score")?,
            }
        }
        Some(("report", args)) => Action::Report {
            json: args.get_flag("json"),
            summary: args.get_flag("summary"),
        },
        Some(("clear", _)) => Action::Clear,
        Some((other, _)) => return Err(anyhow!("unknown command: {other}")),
        None => return Err(anyhow!("no command given")),
    };

    Ok(Invocation {
        config,
        log_json: matches.get_flag("log-json"),
        action,
    })
}

fn required<T>(args: &ArgMatches, id: &str) -> Result<T>
where
    T: Clone + Send + Sync + 'static,
{
    args.get_one::<T>(id)
        .cloned()
        .ok_or_else(|| anyhow!("missing --{id}"))
}
