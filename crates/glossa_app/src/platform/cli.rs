use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};
use glossa_core::{RunInvocation, RunOverrides, TaskKind, UserChoice};
use glossa_engine::ServiceSettings;

use super::logging::LogDestination;

#[derive(Debug, Parser)]
#[command(name = "glossa", version, about = "Drive and follow a remote translation job")]
pub struct Cli {
    /// Base URL of the job service.
    #[arg(long, env = "GLOSSA_SERVER", default_value = "http://127.0.0.1:3388")]
    pub server: String,

    /// Client configuration file.
    #[arg(long, default_value = "glossa.json")]
    pub config: PathBuf,

    #[arg(long, value_enum, default_value_t = LogDestination::File)]
    pub log_to: LogDestination,

    /// Log at debug level.
    #[arg(short, long)]
    pub verbose: bool,

    /// Milliseconds between status polls.
    #[arg(long, default_value_t = 1000)]
    pub poll_interval: u64,

    /// Per-request timeout in seconds. No timeout when omitted.
    #[arg(long)]
    pub request_timeout: Option<u64>,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    pub fn service_settings(&self) -> ServiceSettings {
        ServiceSettings {
            base_url: self.server.clone(),
            request_timeout: self.request_timeout.map(Duration::from_secs),
            poll_interval: Duration::from_millis(self.poll_interval.max(1)),
            ..ServiceSettings::default()
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Recover the current job and follow it until it ends.
    Watch(WatchArgs),
    /// Start a job and follow it until it ends.
    Run(RunArgs),
    /// Ask the service to stop the current job.
    Stop,
    /// Report an interrupted job the service could resume.
    Breakpoint,
    /// Manage the configuration file.
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Also send a stop request when interrupted with Ctrl-C.
    #[arg(long)]
    pub stop_on_interrupt: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TaskArg {
    Translate,
    Polish,
    Export,
}

impl From<TaskArg> for TaskKind {
    fn from(task: TaskArg) -> Self {
        match task {
            TaskArg::Translate => TaskKind::Translate,
            TaskArg::Polish => TaskKind::Polish,
            TaskArg::Export => TaskKind::Export,
        }
    }
}

/// What to do when the temporary upload area is full.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OnFull {
    Ask,
    Evict,
    Keep,
}

impl OnFull {
    /// The fixed answer, or `None` when the user should be asked.
    pub fn fixed_choice(self) -> Option<UserChoice> {
        match self {
            OnFull::Ask => None,
            OnFull::Evict => Some(UserChoice::Evict),
            OnFull::Keep => Some(UserChoice::Keep),
        }
    }
}

#[derive(Debug, Args)]
pub struct RunArgs {
    #[arg(long, value_enum, default_value_t = TaskArg::Translate)]
    pub task: TaskArg,

    /// Input path as seen by the service.
    #[arg(long, required_unless_present = "upload")]
    pub input: Option<String>,

    /// Local file to upload first; its stored path becomes the input.
    #[arg(long, conflicts_with = "input")]
    pub upload: Option<PathBuf>,

    #[arg(long)]
    pub output: Option<String>,

    /// Produce a single combined output.
    #[arg(long)]
    pub all_in_one: bool,

    /// Ignore an interrupted job and start from the beginning.
    #[arg(long)]
    pub fresh: bool,

    #[arg(long, value_enum, default_value_t = OnFull::Ask)]
    pub on_full: OnFull,

    #[arg(long)]
    pub platform: Option<String>,

    #[arg(long)]
    pub model: Option<String>,

    #[arg(long)]
    pub target_language: Option<String>,

    #[arg(long)]
    pub threads: Option<u32>,

    #[command(flatten)]
    pub watch: WatchArgs,
}

impl RunArgs {
    pub fn invocation(&self, input_path: String) -> RunInvocation {
        RunInvocation {
            task: self.task.into(),
            input_path,
            output_path: self.output.clone(),
            run_all_in_one: self.all_in_one,
            overrides: RunOverrides {
                platform: self.platform.clone(),
                model: self.model.clone(),
                target_language: self.target_language.clone(),
                thread_count: self.threads,
            },
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Write a configuration template.
    Init {
        /// Replace an existing file.
        #[arg(long)]
        force: bool,
    },
    /// Print the effective configuration.
    Show,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_requires_input_or_upload() {
        assert!(Cli::try_parse_from(["glossa", "run"]).is_err());
        assert!(Cli::try_parse_from(["glossa", "run", "--input", "a", "--upload", "b"]).is_err());

        let cli = Cli::try_parse_from(["glossa", "run", "--upload", "book.txt", "--on-full", "keep"])
            .unwrap();
        match cli.command {
            Command::Run(args) => {
                assert_eq!(args.upload, Some(PathBuf::from("book.txt")));
                assert_eq!(args.on_full.fixed_choice(), Some(UserChoice::Keep));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn overrides_reach_the_invocation() {
        let cli = Cli::try_parse_from([
            "glossa", "run", "--task", "polish", "--input", "in/", "--threads", "4", "--model",
            "m1",
        ])
        .unwrap();
        let Command::Run(args) = cli.command else {
            panic!("expected run");
        };
        let invocation = args.invocation("in/".to_string());
        assert_eq!(invocation.task, TaskKind::Polish);
        assert_eq!(invocation.overrides.thread_count, Some(4));
        assert_eq!(invocation.overrides.model.as_deref(), Some("m1"));
        assert_eq!(invocation.overrides.platform, None);
    }

    #[test]
    fn settings_follow_flags() {
        let cli = Cli::try_parse_from([
            "glossa",
            "--server",
            "http://svc:9000/base",
            "--request-timeout",
            "30",
            "--poll-interval",
            "250",
            "stop",
        ])
        .unwrap();
        let settings = cli.service_settings();
        assert_eq!(settings.base_url, "http://svc:9000/base");
        assert_eq!(settings.request_timeout, Some(Duration::from_secs(30)));
        assert_eq!(settings.poll_interval, Duration::from_millis(250));
    }
}
