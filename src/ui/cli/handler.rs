// Sat Feb 14 2026 - Alex

use super::args::{ApiArgs, Args, Command, RunArgs};
use crate::config::HostConfig;
use crate::scripting::api::HostApi;
use crate::scripting::behaviour::ScriptBehaviour;
use crate::scripting::builtins::{register_builtins, GameWorld, KeyCode, WorldSummary};
use crate::scripting::error::{ScriptError, ScriptErrorKind};
use crate::utils::logging::LoggingUtils;
use anyhow::{anyhow, bail, Context};
use colored::Colorize;
use log::{info, LevelFilter};
use std::cell::RefCell;
use std::fs;
use std::rc::Rc;

pub struct CommandHandler;

impl CommandHandler {
    pub fn new() -> Self {
        Self
    }

    pub fn execute(&self, args: Args) -> anyhow::Result<()> {
        if args.no_color {
            colored::control::set_override(false);
        }

        match &args.command {
            Command::Run(run_args) => self.handle_run(&args, run_args),
            Command::Api(api_args) => {
                self.setup_logging(&args, None)?;
                self.handle_api(api_args)
            }
        }
    }

    fn setup_logging(&self, args: &Args, config: Option<&HostConfig>) -> anyhow::Result<()> {
        let level = if args.verbose > 0 {
            LoggingUtils::level_from_verbosity(args.verbose)
        } else if let Some(name) = &args.log_level {
            LoggingUtils::level_from_str(name).ok_or_else(|| anyhow!("Unknown log level '{}'", name))?
        } else {
            config
                .and_then(|c| LoggingUtils::level_from_str(&c.log_level))
                .unwrap_or(LevelFilter::Warn)
        };

        LoggingUtils::init(level);
        Ok(())
    }

    fn load_config(&self, run_args: &RunArgs) -> anyhow::Result<HostConfig> {
        let mut config = match &run_args.config {
            Some(path) => HostConfig::load(path).with_context(|| format!("Loading {}", path.display()))?,
            None => HostConfig::default(),
        };
        if let Some(frames) = run_args.frames {
            config = config.with_frames(frames);
        }
        Ok(config)
    }

    fn handle_run(&self, args: &Args, run_args: &RunArgs) -> anyhow::Result<()> {
        run_args.validate().map_err(|e| anyhow!(e))?;
        let config = self.load_config(run_args)?;
        self.setup_logging(args, Some(&config))?;

        let source = fs::read_to_string(&run_args.file)
            .with_context(|| format!("Reading {}", run_args.file.display()))?;
        let language = run_args.language(&config);

        let world = GameWorld::new().with_delta_time(config.delta_time).shared();
        for name in &run_args.pressed {
            let key = KeyCode::from_name(name).ok_or_else(|| anyhow!("Unknown key '{}'", name))?;
            world.borrow_mut().input.press(key);
        }

        let mut api = HostApi::new();
        register_builtins(&mut api, &world);

        let mut behaviour = ScriptBehaviour::new(language, source, api)
            .with_update_function(&config.update_function)
            .with_event_table(&config.event_table);

        let failures = Rc::new(RefCell::new(Vec::new()));
        let sink = failures.clone();
        behaviour.errors().subscribe(move |e: &ScriptError| sink.borrow_mut().push(e.clone()));

        println!(
            "{} Running {} as {} for {} frame(s)",
            "[*]".blue(),
            run_args.file.display(),
            language,
            config.frames
        );

        behaviour.start().context("Failed to start script engine")?;
        for _ in 0..config.frames {
            world.borrow_mut().advance();
            behaviour.update();
        }
        for event_id in &run_args.triggers {
            info!("Triggering event {}", event_id);
            behaviour.trigger(*event_id);
        }
        behaviour.stop();

        let summary = world.borrow().summary();
        if run_args.json {
            println!("{}", serde_json::to_string_pretty(&summary)?);
        } else {
            print_summary(&summary);
        }

        let failures = failures.borrow();
        print_failures(&failures);
        if !failures.is_empty() {
            bail!("{} script error(s)", failures.len());
        }

        println!("{} Done", "[+]".green());
        Ok(())
    }

    fn handle_api(&self, api_args: &ApiArgs) -> anyhow::Result<()> {
        let mut api = HostApi::new();
        register_builtins(&mut api, &GameWorld::new().shared());

        match &api_args.function {
            Some(name) => {
                let help = api
                    .get_help(name)
                    .ok_or_else(|| anyhow!("No host function named '{}'", name))?;
                println!("{}", help);
            }
            None => println!("{}", api.help_text()),
        }
        Ok(())
    }
}

impl Default for CommandHandler {
    fn default() -> Self {
        Self::new()
    }
}

fn print_summary(summary: &WorldSummary) {
    println!();
    println!("{}", "World Summary".cyan().bold());
    println!("{}", "-".repeat(40).cyan());
    println!("  Frames: {}", summary.frame.to_string().green());
    println!("  Time: {:.3}s", summary.time);
    println!("  Objects: {}", summary.objects.len().to_string().green());
    for object in &summary.objects {
        println!(
            "    #{} {} at {} rot {}",
            object.id,
            object.prefab.yellow(),
            object.position,
            object.rotation
        );
    }

    if !summary.output.is_empty() {
        println!("{}", "Script output:".yellow().bold());
        for entry in &summary.output {
            println!("    [{:?}] {}", entry.level, entry.message);
        }
    }
    println!();
}

fn print_failures(failures: &[ScriptError]) {
    for failure in failures {
        let label = match failure.kind {
            ScriptErrorKind::SyntaxError => "[syntax]".red().bold(),
            ScriptErrorKind::RuntimeError => "[runtime]".red(),
            ScriptErrorKind::OtherError => "[other]".yellow(),
        };
        eprintln!("{} {}", label, failure.message);
    }
}
