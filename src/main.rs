use clap::Parser;
use miette::Result;
use mdi::cli::{Cli, Commands};

fn main() -> Result<()> {
    // Terminate quietly on a closed pipe (`mdi list | head`)
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

    // RUST_LOG wins over --verbose
    let default_level = if global.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .init();

    match cli.command {
        Commands::Init(args) => mdi::cli::commands::init::run(args),
        Commands::Import(args) => mdi::cli::commands::import::run(args, &global),
        Commands::List(args) => mdi::cli::commands::list::run(args, &global),
        Commands::Show(args) => mdi::cli::commands::show::run(args, &global),
        Commands::Report(cmd) => mdi::cli::commands::report::run(cmd, &global),
        Commands::Status(args) => mdi::cli::commands::status::run(args, &global),
        Commands::Export(args) => mdi::cli::commands::export::run(args, &global),
        Commands::Db(cmd) => mdi::cli::commands::db::run(cmd, &global),
        Commands::Completions(args) => mdi::cli::commands::completions::run(args),
    }
}
