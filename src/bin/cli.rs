use std::fs::File;
use std::io::{self, IsTerminal, Read};
use std::net::{SocketAddr, TcpListener};
use std::path::PathBuf;
use std::process;

use clap::{Args, CommandFactory, Parser as ClapParser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use reqstream::{
    ChunkedReader, ReaderConfig, Request, format_debug, format_headers_only, format_json,
    request_from_reader_with_config,
};

/// reqstream CLI: incremental HTTP/1.1 request parser.
///
/// Set RUST_LOG (e.g. RUST_LOG=reqstream=debug) to trace parser progress on
/// stderr.
#[derive(ClapParser)]
#[command(name = "reqstream-cli", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Parse one raw HTTP request from a file, --raw string, or stdin.
    ///
    /// Escape sequences (\r, \n, \t, \\) in the --raw value are interpreted
    /// so you can pass a full HTTP request as a single shell argument.
    Parse(ParseArgs),
    /// Accept TCP connections one at a time and print the request read from each.
    Listen(ListenArgs),
}

#[derive(Args)]
struct ParseArgs {
    /// Path to a file containing a raw HTTP request.
    /// Reads from stdin when neither FILE nor --raw is given.
    #[arg(value_name = "FILE")]
    file: Option<PathBuf>,

    /// Raw HTTP request string (escape sequences \r \n \t \\ are expanded).
    #[arg(long)]
    raw: Option<String>,

    /// Output format.
    #[arg(short, long, default_value = "json", value_enum)]
    format: OutputFormat,

    /// Pretty-print JSON output (ignored for other formats).
    #[arg(short, long)]
    pretty: bool,

    /// Cap every read from the input at this many bytes.
    #[arg(long, value_name = "BYTES")]
    read_size: Option<usize>,

    #[command(flatten)]
    buffer: BufferArgs,
}

#[derive(Args)]
struct ListenArgs {
    /// TCP port to listen on.
    #[arg(short, long, default_value = "42069", env = "REQSTREAM_PORT")]
    port: u16,

    #[command(flatten)]
    buffer: BufferArgs,
}

#[derive(Args)]
struct BufferArgs {
    /// Initial size of the read buffer in bytes.
    #[arg(long, default_value = "8", env = "REQSTREAM_BUFFER_SIZE")]
    buffer_size: usize,
}

impl BufferArgs {
    fn config(&self) -> ReaderConfig {
        ReaderConfig {
            initial_buffer_size: self.buffer_size,
        }
    }
}

#[derive(clap::ValueEnum, Clone, Debug)]
enum OutputFormat {
    /// JSON output
    Json,
    /// Human-readable debug output
    Debug,
    /// Request-line + headers only
    Headers,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let code = match cli.command {
        Command::Parse(args) => run_parse(&args),
        Command::Listen(args) => run_listen(&args),
    };
    process::exit(code);
}

fn run_parse(args: &ParseArgs) -> i32 {
    // When no input source is provided and stdin is a terminal (not piped),
    // show help instead of blocking.
    if args.file.is_none() && args.raw.is_none() && io::stdin().is_terminal() {
        let mut cmd = Cli::command();
        if let Some(sub) = cmd.find_subcommand_mut("parse") {
            sub.print_help().ok();
        }
        println!();
        return 0;
    }

    let source = match open_input(args) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error reading input: {e}");
            return 1;
        }
    };
    let source: Box<dyn Read> = match args.read_size {
        Some(size) => Box::new(ChunkedReader::new(source, size)),
        None => source,
    };

    let request = match request_from_reader_with_config(source, &args.buffer.config()) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Parse error: {e}");
            return 2;
        }
    };

    print!("{}", render(&request, &args.format, args.pretty));
    0
}

fn render(request: &Request, format: &OutputFormat, pretty: bool) -> String {
    match format {
        OutputFormat::Json => {
            let mut json = format_json(request, pretty);
            json.push('\n');
            json
        }
        OutputFormat::Debug => format_debug(request),
        OutputFormat::Headers => format_headers_only(request),
    }
}

/// Open the request source: --raw, a file, or stdin.
fn open_input(args: &ParseArgs) -> io::Result<Box<dyn Read>> {
    if let Some(raw) = &args.raw {
        return Ok(Box::new(io::Cursor::new(unescape(raw).into_bytes())));
    }
    match &args.file {
        Some(path) => Ok(Box::new(File::open(path)?)),
        None => Ok(Box::new(io::stdin())),
    }
}

fn run_listen(args: &ListenArgs) -> i32 {
    let addr = SocketAddr::from(([0, 0, 0, 0], args.port));
    let listener = match TcpListener::bind(addr) {
        Ok(l) => l,
        Err(e) => {
            eprintln!("Error listening on {addr}: {e}");
            return 1;
        }
    };
    println!("Listening for TCP traffic on {addr}");

    let config = args.buffer.config();
    for stream in listener.incoming() {
        let stream = match stream {
            Ok(s) => s,
            Err(e) => {
                warn!(error = %e, "failed to accept connection");
                continue;
            }
        };
        let peer = stream
            .peer_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| "unknown".to_string());
        info!(%peer, "connection accepted");

        match request_from_reader_with_config(&stream, &config) {
            Ok(request) => print!("{}", format_debug(&request)),
            Err(e) => warn!(%peer, error = %e, "failed to parse request"),
        }
        // Dropping the stream closes the connection.
        info!(%peer, "connection closed");
    }
    0
}

/// Expand C-style escape sequences (`\r`, `\n`, `\t`, `\\`) in a string.
///
/// Any other `\X` sequence is kept as-is (both the backslash and `X`).
fn unescape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(pos) = rest.find('\\') {
        out.push_str(&rest[..pos]);
        let expanded = match rest.as_bytes().get(pos + 1) {
            Some(b'r') => '\r',
            Some(b'n') => '\n',
            Some(b't') => '\t',
            Some(b'\\') => '\\',
            _ => {
                // Unknown escape: keep the backslash, re-scan from the next char.
                out.push('\\');
                rest = &rest[pos + 1..];
                continue;
            }
        };
        out.push(expanded);
        rest = &rest[pos + 2..];
    }
    out.push_str(rest);
    out
}
