// Command line library for netsot config context rendering
// Split from main.rs so the command layer can be tested without a process

// Module declarations
pub mod command; // Argument parsing and command execution
pub mod model; // Configuration
pub mod startup; // Logging and inventory bootstrap

pub use model::Configuration;
