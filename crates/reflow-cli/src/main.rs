mod cli;
mod convert_cmd;
mod elements_cmd;
mod page_range;

use clap::Parser;
use cli::Cli;

fn main() {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    let result = match cli.command {
        cli::Commands::Convert {
            ref file,
            to,
            ref output,
            ref config,
            ref font,
            font_size,
            margin,
        } => convert_cmd::run(
            file,
            to.into(),
            output.as_deref(),
            convert_cmd::Overrides {
                config: config.as_deref(),
                font: font.as_deref(),
                font_size,
                margin,
            },
        ),
        cli::Commands::Elements {
            ref file,
            ref pages,
            offset,
        } => elements_cmd::run(file, pages.as_deref(), offset),
    };

    if let Err(code) = result {
        std::process::exit(code);
    }
}
