// Sat Feb 14 2026 - Alex

use colored::Colorize;

fn main() {
    if let Err(e) = modbot::ui::cli::run() {
        eprintln!("{} {:#}", "[!]".red(), e);
        std::process::exit(1);
    }
}
