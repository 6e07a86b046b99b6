use clap::Parser;
use miette::Result;
use srcc::cli::commands;
use srcc::cli::{Cli, Commands};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    // Reset SIGPIPE so piping to `head` or `grep -q` exits quietly
    #[cfg(unix)]
    {
        unsafe {
            libc::signal(libc::SIGPIPE, libc::SIG_DFL);
        }
    }
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(2)
                .tab_width(4)
                .build(),
        )
    }))?;

    let cli = Cli::parse();
    let global = cli.global;

    // Logs go to stderr so stdout stays pipeable
    let default_filter = if global.verbose { "srcc=debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    match cli.command {
        Commands::Stage(args) => commands::stage::run(args, &global),
        Commands::Survival(args) => commands::survival::run(args, &global),
        Commands::Effectiveness(args) => commands::effectiveness::run(args, &global),
        Commands::Cohort(args) => commands::cohort::run(args, &global),
        Commands::Surgery(cmd) => commands::surgery::run(cmd, &global),
        Commands::Flot(cmd) => commands::flot::run(cmd, &global),
        Commands::Decide(cmd) => commands::decide::run(cmd, &global),
        Commands::Import(args) => commands::import::run(args, &global),
        Commands::Validate(args) => commands::validate::run(args, &global),
        Commands::Config(cmd) => commands::config::run(cmd, &global),
        Commands::Completions(args) => commands::completions::run(args),
    }
}
