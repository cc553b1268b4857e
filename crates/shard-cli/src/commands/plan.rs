use std::error::Error;

use clap::Args;
use shard_merge::plan_campaign;

use super::{print_json, ConfigArgs};

#[derive(Args, Debug)]
pub struct PlanArgs {
    #[command(flatten)]
    pub options: ConfigArgs,
}

pub fn run(args: &PlanArgs) -> Result<(), Box<dyn Error>> {
    let config = args.options.resolve()?;
    let layout = config.layout(args.options.format.extension())?;
    let plan = plan_campaign(&layout)?;
    print_json(&plan)
}
