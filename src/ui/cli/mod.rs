// Sat Feb 14 2026 - Alex

pub mod args;
pub mod handler;

pub use args::{ApiArgs, Args, Command, RunArgs};
pub use handler::CommandHandler;

use clap::Parser;

pub fn run() -> anyhow::Result<()> {
    CommandHandler::new().execute(Args::parse())
}
