// Sat Feb 14 2026 - Alex

pub mod logging;

pub use logging::LoggingUtils;
