use std::{fs, process::ExitCode, thread};

use blue::{
    config::Config,
    interpreter::host::{Host, INTERPRETER_STACK_SIZE},
    run_source,
};
use clap::Parser;
use tracing_subscriber::EnvFilter;

/// blue is a dynamically-typed scripting language with lightweight
/// processes and publish/subscribe messaging.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Tells blue to look at a file instead of a script.
    #[arg(short, long)]
    file: bool,

    /// Pipe mode automatically prints the value of the last statement.
    #[arg(short, long)]
    pipe_mode: bool,

    /// Disables colored diagnostics.
    #[arg(long)]
    no_color: bool,

    /// Node name used in process identities.
    #[arg(long, value_name = "NAME")]
    node: Option<String>,

    contents: String,
}

fn init_logging() {
    let filter = EnvFilter::try_from_env("BLUE_LOG").or_else(|_| EnvFilter::try_from_default_env())
                                                    .unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt().with_env_filter(filter)
                             .with_writer(std::io::stderr)
                             .init();
}

fn paint(text: &str, color: bool) -> String {
    if color { format!("\x1b[31m{text}\x1b[0m") } else { text.to_string() }
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging();

    let (script, file) = if args.file {
        match fs::read_to_string(&args.contents) {
            Ok(script) => (script, args.contents.clone()),
            Err(e) => {
                eprintln!("Failed to read the input file '{}': {e}", &args.contents);
                return ExitCode::FAILURE;
            },
        }
    } else {
        (args.contents.clone(), "main".to_string())
    };

    let mut config = Config::from_env();
    if args.no_color {
        config = config.with_color(false);
    }
    if let Some(node) = args.node {
        config = config.with_node_name(node);
    }
    let color = config.color;
    let pipe_mode = args.pipe_mode;

    let worker = thread::Builder::new().name("blue-main".to_string())
                                       .stack_size(INTERPRETER_STACK_SIZE)
                                       .spawn(move || {
                                           let host = Host::new(&config);
                                           run_source(&script, &file, config, host)
                                       });

    let result = match worker.map(thread::JoinHandle::join) {
        Ok(Ok(result)) => result,
        Ok(Err(_)) => {
            eprintln!("{}", paint("the interpreter thread panicked", color));
            return ExitCode::FAILURE;
        },
        Err(e) => {
            eprintln!("{}", paint(&format!("cannot start the interpreter thread: {e}"), color));
            return ExitCode::FAILURE;
        },
    };

    match result {
        Ok(value) => {
            if pipe_mode {
                println!("{}", value.inspect());
            }
            ExitCode::SUCCESS
        },
        Err(message) => {
            eprintln!("{}", paint(&message, color));
            ExitCode::FAILURE
        },
    }
}
