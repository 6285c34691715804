// Sat Feb 14 2026 - Alex

use crate::config::HostConfig;
use crate::scripting::engine::ScriptLanguage;
use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "modbot")]
#[command(author = "Alex")]
#[command(version = "0.1.0")]
#[command(about = "Runs Mod-Bot scripts against an in-memory level", long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Overrides the configured log level
    #[arg(short, long, global = true)]
    pub log_level: Option<String>,

    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[arg(long, global = true)]
    pub no_color: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start a script, run its frames and fire events
    Run(RunArgs),
    /// Print the host API available to scripts
    Api(ApiArgs),
}

#[derive(Parser, Debug)]
pub struct RunArgs {
    pub file: PathBuf,

    /// Defaults to the config
    #[arg(long, value_enum)]
    pub language: Option<ScriptLanguage>,

    #[arg(short, long)]
    pub frames: Option<u32>,

    /// Event id to trigger after the frames have run. Repeatable
    #[arg(short, long = "trigger")]
    pub triggers: Vec<i64>,

    /// Key held for the whole run, by KeyCode name. Repeatable
    #[arg(short, long = "press")]
    pub pressed: Vec<String>,

    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Print the world summary as JSON
    #[arg(long)]
    pub json: bool,
}

impl RunArgs {
    pub fn validate(&self) -> Result<(), String> {
        if !self.file.is_file() {
            return Err(format!("Script file does not exist: {}", self.file.display()));
        }
        if let Some(config) = &self.config {
            if !config.is_file() {
                return Err(format!("Config file does not exist: {}", config.display()));
            }
        }
        Ok(())
    }

    /// `--language` if given, otherwise the configured default. The file name plays no part.
    pub fn language(&self, config: &HostConfig) -> ScriptLanguage {
        self.language.unwrap_or(config.default_language)
    }
}

#[derive(Parser, Debug)]
pub struct ApiArgs {
    /// Show a single function, as `name` or `Module.name`
    pub function: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_run() {
        let args = Args::parse_from([
            "modbot", "run", "mod.lua", "--frames", "5", "-t", "3", "-t", "7", "--press", "W", "-l", "debug",
        ]);
        let Command::Run(run) = args.command else {
            panic!("expected run");
        };
        assert_eq!(run.frames, Some(5));
        assert_eq!(run.triggers, vec![3, 7]);
        assert_eq!(run.pressed, vec!["W".to_string()]);
        assert_eq!(run.language, None);
        assert_eq!(args.log_level.as_deref(), Some("debug"));
    }

    #[test]
    fn test_language_alias() {
        let args = Args::parse_from(["modbot", "run", "bot.txt", "--language", "js"]);
        let Command::Run(run) = args.command else {
            panic!("expected run");
        };
        assert_eq!(run.language, Some(ScriptLanguage::Javascript));
        let config = HostConfig::default().with_language(ScriptLanguage::Lua);
        assert_eq!(run.language(&config), ScriptLanguage::Javascript);
    }

    #[test]
    fn test_language_ignores_file_extension() {
        let args = Args::parse_from(["modbot", "run", "mod.lua"]);
        let Command::Run(run) = args.command else {
            panic!("expected run");
        };
        let config = HostConfig::default().with_language(ScriptLanguage::Javascript);
        assert_eq!(run.language(&config), ScriptLanguage::Javascript);

        let config = HostConfig::default().with_language(ScriptLanguage::Lua);
        assert_eq!(run.language(&config), ScriptLanguage::Lua);
    }
}
