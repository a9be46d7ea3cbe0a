use clap::Parser;
use submerge::Cli;

fn main() {
    submerge::init_tracing();
    let cli = Cli::parse();
    std::process::exit(submerge::run(&cli));
}
