use std::io::IsTerminal;
use std::time::Duration;

use anyhow::{anyhow, bail, Context};
use clap::Parser;
use engine_logging::{engine_info, engine_warn};
use glossa_core::{update, ClientConfig, JobState, JobStatus, Msg, UserChoice};
use glossa_engine::{
    negotiate_upload, CapacityPrompt, EngineEvent, EngineHandle, FixedChoice, UploadFile,
};
use tokio::sync::mpsc::UnboundedReceiver;

use super::cli::{Cli, Command, ConfigCommand, RunArgs, WatchArgs};
use super::config::{load_config, save_config, template};
use super::effects::{now, to_msg, upload_msg};
use super::logging;
use super::ui::prompt::TerminalPrompt;
use super::ui::render::Console;

/// How long an interrupted session waits for the stop request to go out.
const STOP_GRACE: Duration = Duration::from_secs(5);

pub async fn run_app() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::initialize(cli.log_to, cli.verbose);
    engine_info!("glossa {} starting", env!("CARGO_PKG_VERSION"));

    match &cli.command {
        Command::Config(ConfigCommand::Init { force }) => {
            save_config(&cli.config, &template(), *force)?;
            println!("Wrote {}", cli.config.display());
            Ok(())
        }
        Command::Config(ConfigCommand::Show) => {
            let config = load_config(&cli.config)?;
            println!("{}", serde_json::to_string_pretty(&config)?);
            Ok(())
        }
        Command::Watch(args) => Session::connect(&cli)?.watch(args).await,
        Command::Run(args) => {
            let config = load_config(&cli.config)?;
            Session::connect(&cli)?.run(config, args).await
        }
        Command::Stop => Session::connect(&cli)?.stop().await,
        Command::Breakpoint => Session::connect(&cli)?.breakpoint().await,
    }
}

/// One client session: the reducer state, the engine executing its effects,
/// and the console showing it.
struct Session {
    state: JobState,
    engine: EngineHandle,
    events: UnboundedReceiver<EngineEvent>,
    console: Console,
}

impl Session {
    fn connect(cli: &Cli) -> anyhow::Result<Self> {
        let settings = cli.service_settings();
        let (engine, events) = EngineHandle::connect(&settings)
            .with_context(|| format!("cannot use service at {}", settings.base_url))?;
        Ok(Self {
            state: JobState::new(),
            engine,
            events,
            console: Console::new(),
        })
    }

    /// Runs one message through the reducer, renders when the state changed and
    /// hands the effects to the engine. Returns how many effects were issued.
    fn dispatch(&mut self, msg: Msg) -> usize {
        let state = std::mem::take(&mut self.state);
        let (mut state, effects) = update(state, msg);
        if state.consume_dirty() {
            for line in self.console.render(&state.view()) {
                println!("{line}");
            }
        }
        self.state = state;
        let issued = effects.len();
        self.engine.apply(effects);
        issued
    }

    /// Dispatches incoming events until one matching `done` was handled, and
    /// returns that event.
    async fn pump_until(
        &mut self,
        done: impl Fn(&EngineEvent) -> bool,
    ) -> anyhow::Result<EngineEvent> {
        loop {
            let event = self
                .events
                .recv()
                .await
                .ok_or_else(|| anyhow!("engine stopped reporting"))?;
            let matched = done(&event).then(|| event.clone());
            self.dispatch(to_msg(event));
            if let Some(event) = matched {
                return Ok(event);
            }
        }
    }

    /// Start-up recovery followed by the breakpoint check.
    async fn recover(&mut self) -> anyhow::Result<()> {
        self.engine.recover();
        self.pump_until(|event| matches!(event, EngineEvent::Recovered(_)))
            .await?;
        self.engine.check_breakpoint();
        self.pump_until(|event| matches!(event, EngineEvent::BreakpointChecked(_)))
            .await?;
        Ok(())
    }

    async fn watch(mut self, args: &WatchArgs) -> anyhow::Result<()> {
        self.recover().await?;
        if !self.state.is_tracking_run() {
            println!("No job is running (status {}).", self.state.status());
            return Ok(());
        }
        self.follow(args.stop_on_interrupt).await
    }

    async fn run(mut self, config: ClientConfig, args: &RunArgs) -> anyhow::Result<()> {
        self.recover().await?;
        if args.fresh {
            self.dispatch(Msg::ResumeCleared);
        }
        if self.state.is_busy() {
            println!(
                "A job is already {}; following it instead of starting a new one.",
                self.state.status()
            );
            return self.follow(args.watch.stop_on_interrupt).await;
        }

        let input_path = match (&args.upload, &args.input) {
            (Some(local), _) => self.upload(local, args).await?,
            (None, Some(input)) => input.clone(),
            (None, None) => bail!("either --input or --upload is required"),
        };

        let issued = self.dispatch(Msg::StartClicked {
            config: Box::new(config),
            invocation: args.invocation(input_path),
            at: now(),
        });
        if issued == 0 {
            bail!("the job was not started");
        }
        self.pump_until(|event| matches!(event, EngineEvent::RunAnswered(_)))
            .await?;
        if !self.state.is_tracking_run() {
            bail!("the service did not start the job");
        }
        self.follow(args.watch.stop_on_interrupt).await
    }

    async fn upload(&mut self, local: &std::path::Path, args: &RunArgs) -> anyhow::Result<String> {
        let file = UploadFile::from_path(local).await?;
        let prompt: Box<dyn CapacityPrompt> = match args.on_full.fixed_choice() {
            Some(choice) => Box::new(FixedChoice(choice)),
            None if std::io::stdin().is_terminal() => Box::new(TerminalPrompt),
            None => {
                engine_warn!("stdin is not a terminal; a full upload store keeps its files");
                Box::new(FixedChoice(UserChoice::Keep))
            }
        };
        let service = self.engine.service();
        let result = negotiate_upload(service.as_ref(), &file, prompt.as_ref()).await;
        self.dispatch(upload_msg(&result));
        let report = result.with_context(|| format!("cannot upload {}", local.display()))?;
        Ok(report.path)
    }

    /// Follows the tracked run until the service reports it over or the user
    /// interrupts.
    async fn follow(&mut self, stop_on_interrupt: bool) -> anyhow::Result<()> {
        let interrupt = tokio::signal::ctrl_c();
        tokio::pin!(interrupt);

        while self.state.is_tracking_run() || self.engine.is_polling() {
            tokio::select! {
                event = self.events.recv() => {
                    let Some(event) = event else { break };
                    self.dispatch(to_msg(event));
                }
                _ = &mut interrupt => {
                    self.engine.stop_polling();
                    println!("Interrupted; the job keeps running on the service.");
                    if stop_on_interrupt {
                        self.send_stop().await?;
                    }
                    return Ok(());
                }
            }
        }

        match self.state.status() {
            JobStatus::Error => bail!("the job ended with an error"),
            status => {
                println!("Job {status}.");
                Ok(())
            }
        }
    }

    async fn send_stop(&mut self) -> anyhow::Result<()> {
        self.dispatch(Msg::StopClicked);
        let answered = tokio::time::timeout(
            STOP_GRACE,
            self.pump_until(|event| matches!(event, EngineEvent::StopSent(_))),
        )
        .await
        .map_err(|_| anyhow!("no answer to the stop request"))??;
        if let EngineEvent::StopSent(Err(err)) = answered {
            bail!("stop request failed: {err}");
        }
        println!("Stop requested.");
        Ok(())
    }

    async fn stop(mut self) -> anyhow::Result<()> {
        self.send_stop().await
    }

    async fn breakpoint(mut self) -> anyhow::Result<()> {
        self.engine.check_breakpoint();
        let answered = self
            .pump_until(|event| matches!(event, EngineEvent::BreakpointChecked(_)))
            .await?;
        match answered {
            EngineEvent::BreakpointChecked(Ok(status)) if status.offers_resume() => Ok(()),
            EngineEvent::BreakpointChecked(Ok(_)) => {
                println!("No interrupted job.");
                Ok(())
            }
            EngineEvent::BreakpointChecked(Err(err)) => bail!("breakpoint query failed: {err}"),
            _ => Ok(()),
        }
    }
}
