use crate::config::load_config;
use crate::llm::GeminiClient;
use crate::prompt::input_hint;
use crate::render::{ImageFormat, DOWNLOAD_FILE_NAME};
use crate::schema::DiagramType;
use crate::session::Session;
use anyhow::Result;
use clap::{Parser, ValueEnum};
use log::{debug, LevelFilter};
use std::io::{self, BufRead, Read, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

#[derive(Parser, Debug)]
#[command(
    name = "umlgen",
    version,
    about = "Generate UML diagrams from a prose description via an LLM, with chat-style refinement"
)]
pub struct Args {
    /// Diagram type to generate
    #[arg(short = 't', long = "type", value_enum, default_value = "activity")]
    pub diagram_type: DiagramKind,

    /// Description file, or '-' for stdin. Omitted: prompt interactively.
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,

    /// Root directory for rendered images; each session gets its own
    /// subdirectory underneath.
    #[arg(short = 'o', long = "output-dir", default_value = "out")]
    pub output_dir: PathBuf,

    /// Output format
    #[arg(short = 'f', long = "format", value_enum, default_value = "png")]
    pub format: OutputFormat,

    /// Config JSON file (LLM model, theme, layout tunables)
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// Keep a chat loop open for refinement messages after the first render
    #[arg(long)]
    pub chat: bool,

    /// Log filter (error, warn, info, debug, trace)
    #[arg(long = "log-level", default_value = "warn")]
    pub log_level: String,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum DiagramKind {
    Activity,
    Sequence,
    Class,
    UseCase,
}

impl From<DiagramKind> for DiagramType {
    fn from(kind: DiagramKind) -> Self {
        match kind {
            DiagramKind::Activity => DiagramType::Activity,
            DiagramKind::Sequence => DiagramType::Sequence,
            DiagramKind::Class => DiagramType::Class,
            DiagramKind::UseCase => DiagramType::UseCase,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum OutputFormat {
    Svg,
    Png,
}

impl From<OutputFormat> for ImageFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Svg => ImageFormat::Svg,
            OutputFormat::Png => ImageFormat::Png,
        }
    }
}

pub fn run() -> Result<()> {
    let args = Args::parse();

    let log_level = LevelFilter::from_str(&args.log_level).unwrap_or(LevelFilter::Warn);
    env_logger::Builder::from_env(env_logger::Env::default())
        .filter_level(log_level)
        .init();

    let config = load_config(args.config.as_deref())?;
    let backend = GeminiClient::new(config.llm.clone())?;

    let diagram_type: DiagramType = args.diagram_type.into();
    let mut session = Session::new(diagram_type, &args.output_dir, args.format.into());
    debug!("session {} started for {diagram_type} diagrams", session.id);

    let description = read_description(args.input.as_deref(), diagram_type)?;
    if description.trim().is_empty() {
        anyhow::bail!("empty description");
    }

    match session.process_message(&backend, &config, description.trim()) {
        Ok(path) => println!("rendered: {}", path.display()),
        Err(err) => {
            print_bubble(&session);
            if !args.chat {
                return Err(err.into());
            }
        }
    }

    if args.chat {
        chat_loop(&mut session, &backend, &config)?;
    }

    Ok(())
}

fn read_description(input: Option<&Path>, diagram_type: DiagramType) -> Result<String> {
    match input {
        Some(path) if path == Path::new("-") => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            Ok(buf)
        }
        Some(path) => Ok(std::fs::read_to_string(path)?),
        None => {
            println!("{}", input_hint(diagram_type));
            prompt_line("> ")
        }
    }
}

/// Refinement loop: plain lines are modification requests; `/`-prefixed
/// lines are commands.
fn chat_loop(
    session: &mut Session,
    backend: &GeminiClient,
    config: &crate::config::Config,
) -> Result<()> {
    println!("Modify or refine your diagram. Commands: /type <kind>, /download, /save <path>, /quit");

    loop {
        let line = match prompt_line("> ") {
            Ok(line) => line,
            // EOF ends the session like /quit.
            Err(_) => return Ok(()),
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(command) = line.strip_prefix('/') {
            if !handle_command(session, command)? {
                return Ok(());
            }
            continue;
        }

        match session.process_message(backend, config, line) {
            Ok(path) => {
                print_bubble(session);
                println!("rendered: {}", path.display());
            }
            Err(_) => print_bubble(session),
        }
    }
}

/// Returns false when the loop should end.
fn handle_command(session: &mut Session, command: &str) -> Result<bool> {
    let mut parts = command.splitn(2, ' ');
    let name = parts.next().unwrap_or_default();
    let rest = parts.next().unwrap_or("").trim();

    match name {
        "quit" | "exit" => return Ok(false),
        "type" => match DiagramKind::from_str(rest, true) {
            Ok(kind) => {
                session.set_diagram_type(kind.into());
                println!("diagram type set to {}; describe the diagram to regenerate", session.diagram_type);
            }
            Err(_) => println!("unknown diagram type `{rest}` (activity, sequence, class, use-case)"),
        },
        "download" => match session.download_data_uri() {
            Ok(uri) => println!("{DOWNLOAD_FILE_NAME}: {uri}"),
            Err(err) => println!("{}", err.user_message()),
        },
        "save" => {
            if rest.is_empty() {
                println!("usage: /save <path>");
            } else {
                std::fs::write(rest, session.to_transcript_json()?)?;
                println!("transcript saved to {rest}");
            }
        }
        other => println!("unknown command `/{other}`"),
    }
    Ok(true)
}

fn print_bubble(session: &Session) {
    if let Some(message) = session.messages.last() {
        println!("assistant: {}", message.content);
    }
}

fn prompt_line(prompt: &str) -> Result<String> {
    print!("{prompt}");
    io::stdout().flush()?;
    let mut line = String::new();
    let read = io::stdin().lock().read_line(&mut line)?;
    if read == 0 {
        anyhow::bail!("end of input");
    }
    Ok(line)
}
