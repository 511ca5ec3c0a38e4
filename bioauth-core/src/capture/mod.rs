pub mod backend;
pub mod orchestrator;
pub mod state;
