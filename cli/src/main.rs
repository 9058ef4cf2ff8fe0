mod commands;
mod terminal;

use commands::{CommandLine, Commands, resolve, strategies};
use terminal::{logging, print};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let commands = CommandLine::parse_args();

    logging::init_logging(commands.verbose);
    print::initialize();
    print::banner(commands.no_banner, commands.quiet);

    match commands.command {
        Commands::Resolve(args) => resolve::resolve(args, commands.quiet).await,
        Commands::Strategies => {
            let resolver = resolve::native_resolver(Default::default());
            strategies::strategies(&resolver, commands.quiet);
            Ok(())
        }
    }
}
