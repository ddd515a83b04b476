use clap::Args;
use insight_core::catalog::{Dialect, example_snippet};
use strum::IntoEnumIterator;

#[derive(Args, Debug)]
pub struct ExamplesArgs {
    /// Only print this system's example
    #[arg(long)]
    pub dialect: Option<Dialect>,
}

pub fn run(args: &ExamplesArgs) {
    match args.dialect {
        Some(dialect) => println!("{}", example_snippet(dialect)),
        None => {
            for dialect in Dialect::iter() {
                println!("-- {dialect}\n{}\n", example_snippet(dialect));
            }
        }
    }
}
