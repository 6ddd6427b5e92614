mod batch;
mod run;
mod state;

pub use batch::cmd_batch;
pub use run::cmd_run;
pub use state::cmd_state;
