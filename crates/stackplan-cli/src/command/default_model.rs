use std::path::PathBuf;

use stackplan_evaluator::utility;

use crate::{model::utility_model::UtilityModelFile, util};

#[derive(Default, Debug, Clone, clap::Args)]
pub(crate) struct DefaultModelArg {
    /// Name stored in the model file
    #[arg(long, default_value = "default")]
    name: String,
    /// Output file path
    #[arg(long)]
    output: Option<PathBuf>,
}

pub(crate) fn run(arg: &DefaultModelArg) -> anyhow::Result<()> {
    let DefaultModelArg { name, output } = arg;
    let model = utility::default_utility_model();
    let file = UtilityModelFile::from_model(name.as_str(), &model);
    util::write_json(&file, output.as_deref())
}
