use eddy::{Extent, FlowGraph, LayoutOptions, NodeAlign, NodePadding};
use serde::Serialize;
use std::io::Read;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Debug)]
enum CliError {
    Usage(&'static str),
    Io(std::io::Error),
    Layout(eddy::Error),
    Json(serde_json::Error),
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::Usage(msg) => write!(f, "{msg}"),
            CliError::Io(err) => write!(f, "I/O error: {err}"),
            CliError::Layout(err) => write!(f, "{err}"),
            CliError::Json(err) => write!(f, "JSON error: {err}"),
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<eddy::Error> for CliError {
    fn from(value: eddy::Error) -> Self {
        Self::Layout(value)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

#[derive(Debug, Clone, Copy, Default)]
enum Command {
    #[default]
    Layout,
    Paths,
}

#[derive(Debug, Default)]
struct Args {
    command: Command,
    input: Option<String>,
    pretty: bool,
    verbose: bool,
    csv: bool,
    config: Option<String>,
    width: Option<f64>,
    height: Option<f64>,
    node_width: Option<f64>,
    node_padding: Option<f64>,
    iterations: Option<usize>,
    gap: Option<f64>,
    align: Option<NodeAlign>,
    sort_nodes: bool,
}

fn usage() -> &'static str {
    "eddy-cli\n\
\n\
USAGE:\n\
  eddy-cli [layout] [--pretty] [OPTIONS] [<path>|-]\n\
  eddy-cli paths [OPTIONS] [<path>|-]\n\
\n\
OPTIONS:\n\
  --config <file>        layout options as JSON (camelCase keys)\n\
  --width <w>            extent width\n\
  --height <h>           extent height\n\
  --node-width <w>       node band width\n\
  --node-padding <p>     vertical gap between nodes in a column\n\
  --iterations <n>       relaxation passes\n\
  --gap <g>              gap between stacked circular links\n\
  --align left|right|justify|center\n\
  --sort-nodes           classify circular links by node rank\n\
  --csv                  read source,target,value records instead of JSON\n\
  --verbose              log pipeline stages to stderr\n\
\n\
NOTES:\n\
  - If <path> is omitted or '-', input is read from stdin.\n\
  - Files ending in .csv are read as CSV without --csv.\n\
  - layout prints the laid out graph as JSON; paths prints one SVG path per link.\n\
  - EDDY_LOG overrides the log filter (e.g. EDDY_LOG=eddy=trace).\n\
"
}

fn parse_value<T: std::str::FromStr>(value: Option<&String>) -> Result<T, CliError> {
    value
        .and_then(|v| v.parse::<T>().ok())
        .ok_or(CliError::Usage(usage()))
}

fn parse_args(argv: &[String]) -> Result<Args, CliError> {
    let mut args = Args::default();

    let mut it = argv.iter().skip(1);
    while let Some(a) = it.next() {
        match a.as_str() {
            "--help" | "-h" => return Err(CliError::Usage(usage())),
            "layout" => args.command = Command::Layout,
            "paths" => args.command = Command::Paths,
            "--pretty" => args.pretty = true,
            "--verbose" | "-v" => args.verbose = true,
            "--csv" => args.csv = true,
            "--sort-nodes" => args.sort_nodes = true,
            "--config" => {
                let Some(path) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.config = Some(path.clone());
            }
            "--width" => args.width = Some(parse_value(it.next())?),
            "--height" => args.height = Some(parse_value(it.next())?),
            "--node-width" => args.node_width = Some(parse_value(it.next())?),
            "--node-padding" => args.node_padding = Some(parse_value(it.next())?),
            "--iterations" => args.iterations = Some(parse_value(it.next())?),
            "--gap" => args.gap = Some(parse_value(it.next())?),
            "--align" => args.align = Some(parse_value(it.next())?),
            "--" => {
                if let Some(rest) = it.next() {
                    if args.input.is_some() {
                        return Err(CliError::Usage(usage()));
                    }
                    args.input = Some(rest.clone());
                }
                if it.next().is_some() {
                    return Err(CliError::Usage(usage()));
                }
            }
            other if other.starts_with('-') && other != "-" => {
                return Err(CliError::Usage(usage()));
            }
            path => {
                if args.input.is_some() {
                    return Err(CliError::Usage(usage()));
                }
                args.input = Some(path.to_string());
            }
        }
    }

    for v in [args.width, args.height, args.node_width, args.node_padding, args.gap]
        .into_iter()
        .flatten()
    {
        if !(v.is_finite() && v >= 0.0) {
            return Err(CliError::Usage(usage()));
        }
    }

    Ok(args)
}

fn read_input(input: Option<&str>) -> Result<String, CliError> {
    match input {
        None | Some("-") => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            Ok(buf)
        }
        Some(path) => Ok(std::fs::read_to_string(path)?),
    }
}

fn write_json(value: &impl Serialize, pretty: bool) -> Result<(), CliError> {
    if pretty {
        serde_json::to_writer_pretty(std::io::stdout().lock(), value)?;
    } else {
        serde_json::to_writer(std::io::stdout().lock(), value)?;
    }
    println!();
    Ok(())
}

/// Config file first, then individual flags on top.
fn layout_options(args: &Args) -> Result<LayoutOptions, CliError> {
    let mut options = match args.config.as_deref() {
        Some(path) => LayoutOptions::from_json_str(&std::fs::read_to_string(path)?)?,
        None => LayoutOptions::default(),
    };
    if args.width.is_some() || args.height.is_some() {
        let width = args.width.unwrap_or(options.extent.width());
        let height = args.height.unwrap_or(options.extent.height());
        options.extent = Extent::new(
            options.extent.x0,
            options.extent.y0,
            options.extent.x0 + width,
            options.extent.y0 + height,
        );
    }
    if let Some(w) = args.node_width {
        options.node_width = w;
    }
    if let Some(p) = args.node_padding {
        options.node_padding = NodePadding::Fixed(p);
    }
    if let Some(n) = args.iterations {
        options.iterations = n;
    }
    if let Some(g) = args.gap {
        options.circular_link_gap = g;
    }
    if let Some(align) = args.align {
        options.align = align;
    }
    if args.sort_nodes {
        options.sort_nodes = true;
    }
    Ok(options)
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_env("EDDY_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if verbose { "eddy=debug,info" } else { "warn" })
    });
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact().with_writer(std::io::stderr))
        .init();
}

fn run(args: Args) -> Result<(), CliError> {
    let text = read_input(args.input.as_deref())?;
    let csv = args.csv
        || args
            .input
            .as_deref()
            .is_some_and(|p| p.to_ascii_lowercase().ends_with(".csv"));
    let input = if csv {
        eddy::csv::parse_flow_csv(&text)?
    } else {
        FlowGraph::from_json_str(&text)?
    };
    let options = layout_options(&args)?;
    tracing::debug!(
        nodes = input.nodes.len(),
        links = input.links.len(),
        csv,
        "read flow graph"
    );

    let layout = eddy::layout(&input, &options)?;
    match args.command {
        Command::Layout => write_json(&layout, args.pretty),
        Command::Paths => {
            for link in layout.links() {
                println!("{}", link.path.to_svg_path());
            }
            Ok(())
        }
    }
}

fn main() {
    let args = match parse_args(&std::env::args().collect::<Vec<_>>()) {
        Ok(v) => v,
        Err(CliError::Usage(msg)) => {
            eprintln!("{msg}");
            std::process::exit(2);
        }
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    };
    init_tracing(args.verbose);

    if let Err(err) = run(args) {
        eprintln!("{err}");
        std::process::exit(1);
    }
}
