use clap::{Parser, Subcommand};

use self::{default_model::DefaultModelArg, plan::PlanArg, simulate::SimulateArg};

mod agent_arg;
mod default_model;
mod plan;
mod simulate;

#[derive(Debug, Clone, Parser)]
#[command(author, version, about, long_about = None)]
pub struct CommandArgs {
    /// What mode to run the program in
    #[command(subcommand)]
    mode: Mode,
}

#[derive(Debug, Clone, Subcommand)]
enum Mode {
    /// Play headless games with a planning agent
    Simulate(#[clap(flatten)] SimulateArg),
    /// Choose a placement for one board and piece
    Plan(#[clap(flatten)] PlanArg),
    /// Write the built-in utility weights as a model file
    DefaultModel(#[clap(flatten)] DefaultModelArg),
}

pub fn run() -> anyhow::Result<()> {
    let args = CommandArgs::parse();
    match args.mode {
        Mode::Simulate(arg) => simulate::run(&arg)?,
        Mode::Plan(arg) => plan::run(&arg)?,
        Mode::DefaultModel(arg) => default_model::run(&arg)?,
    }
    Ok(())
}
