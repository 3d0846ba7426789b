use anyhow::Context;
use argh::FromArgs;
use simple_shell::{EditorSource, Interpreter, LineSource, ReaderSource, ShellConfig};
use std::io::{self, IsTerminal};
use tracing_subscriber::EnvFilter;

/// Environment variable holding the default log filter.
const LOG_ENV: &str = "SIMPLE_SHELL_LOG";

#[derive(FromArgs)]
/// Read lines of `;`-separated pipelines and run them as child processes.
struct Args {
    #[argh(option, short = 'c')]
    /// run this single line and exit with the status of its last stage.
    command: Option<String>,

    #[argh(option)]
    /// prompt printed before each line. Defaults to "$ ".
    prompt: Option<String>,

    #[argh(option)]
    /// command name that stops the interpreter. Defaults to "quit".
    quit: Option<String>,

    #[argh(option)]
    /// log filter directive such as "debug"; overrides SIMPLE_SHELL_LOG.
    log: Option<String>,
}

impl Args {
    fn config(&self) -> ShellConfig {
        let mut config = ShellConfig::default();
        if let Some(prompt) = &self.prompt {
            config = config.with_prompt(prompt.as_str());
        }
        if let Some(keyword) = &self.quit {
            config = config.with_terminate_keyword(keyword.as_str());
        }
        config
    }
}

fn init_logging(directive: Option<&str>) {
    let filter = match directive {
        Some(directive) => EnvFilter::new(directive),
        None => EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .init();
}

fn run(args: Args) -> anyhow::Result<i32> {
    let config = args.config();
    let mut sh = Interpreter::new(&config);

    if let Some(line) = args.command {
        sh.run_line(&line)
            .with_context(|| format!("running `{line}`"))?;
        return Ok(sh.last_exit_code());
    }

    let mut source: Box<dyn LineSource> = if io::stdin().is_terminal() {
        Box::new(EditorSource::new().context("starting line editor")?)
    } else {
        Box::new(ReaderSource::new(io::stdin().lock(), io::stdout()))
    };
    sh.repl(source.as_mut()).context("reading input")?;
    Ok(0)
}

fn main() {
    let args: Args = argh::from_env();
    init_logging(args.log.as_deref());

    match run(args) {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("simple_shell: {err:#}");
            std::process::exit(1);
        }
    }
}
