use std::{
    fs,
    io::{self, BufRead, Write},
    path::PathBuf,
};

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};
use grapher::{
    compile_equation,
    plot::{PlotPoint, ScreenPoint, ViewportConfig},
    Error as ParseError, EvalContext, Full, Graph,
};
use tracing::{debug, Level};

mod canvas;

use canvas::Canvas;

#[derive(Parser, Debug)]
#[command(name = "grapher", version, about = "Compile, evaluate and plot equations")]
struct Cli {
    /// More log output on stderr (-v debug, -vv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Evaluate an equation at one point.
    Eval(EvalArgs),
    /// Plot an equation as text.
    Plot(PlotArgs),
    /// List the grid lines for a viewport.
    Grid(ViewArgs),
    /// Read equations from stdin, one per line.
    Repl(ViewArgs),
}

#[derive(Args, Debug)]
struct EvalArgs {
    equation: String,

    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    x: f64,

    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    y: f64,

    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    t: f64,
}

#[derive(Args, Debug)]
struct PlotArgs {
    equation: String,

    #[command(flatten)]
    view: ViewArgs,

    /// Sample with native code (needs the `jit` feature).
    #[arg(long)]
    jit: bool,
}

#[derive(Args, Debug)]
struct ViewArgs {
    /// Viewport config JSON; the flags below override its fields.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Viewport width in pixels.
    #[arg(long)]
    width: Option<u32>,

    /// Viewport height in pixels.
    #[arg(long)]
    height: Option<u32>,

    #[arg(long, allow_hyphen_values = true)]
    center_x: Option<f64>,

    #[arg(long, allow_hyphen_values = true)]
    center_y: Option<f64>,

    /// Pixels per world unit.
    #[arg(long)]
    scale: Option<f64>,

    /// Text columns of the plot.
    #[arg(long, default_value_t = 100)]
    cols: usize,

    /// Text rows of the plot.
    #[arg(long, default_value_t = 30)]
    rows: usize,
}

impl ViewArgs {
    fn config(&self) -> anyhow::Result<ViewportConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let json = fs::read_to_string(path)
                    .with_context(|| format!("read viewport config '{}'", path.display()))?;
                ViewportConfig::from_json(&json)
                    .with_context(|| format!("parse viewport config '{}'", path.display()))?
            }
            None => ViewportConfig::default(),
        };
        config.width = self.width.unwrap_or(config.width);
        config.height = self.height.unwrap_or(config.height);
        config.center = PlotPoint::new(
            self.center_x.unwrap_or(config.center.x),
            self.center_y.unwrap_or(config.center.y),
        );
        config.scale = self.scale.unwrap_or(config.scale);
        config.validate().context("invalid viewport")?;
        Ok(config)
    }

    fn graph(&self) -> anyhow::Result<Graph> {
        let config = self.config()?;
        debug!(?config, "viewport");
        Ok(Graph::from_config(&config)?)
    }
}

fn report_errors(input: &str, errors: &[ParseError<Full>]) {
    let mut carets: Vec<char> = vec![' '; input.chars().count()];
    for e in errors {
        for i in e.span.clone() {
            if let Some(c) = carets.get_mut(i) {
                *c = '^';
            }
        }
    }
    let carets: String = carets.into_iter().collect();
    eprintln!("{input}\n{}", carets.trim_end());
    for e in errors {
        eprintln!("{e}");
    }
}

fn draw(graph: &mut Graph, cols: usize, rows: usize) -> bool {
    let frame = graph.frame();
    let mut canvas = Canvas::new(cols, rows, graph.viewport());
    for curve in frame.curves.iter().flatten() {
        canvas.shade(&curve.trace.shade_spans());
    }
    canvas.axes(&frame.grid);
    for curve in frame.curves.iter().flatten() {
        canvas.curve(&curve.trace);
    }
    for (i, equation) in graph.equations().enumerate() {
        if frame.curves[i].is_none() {
            report_errors(equation.text(), equation.errors());
        }
    }
    print!("{}", canvas.render());
    let bounds = graph.viewport().visible_bounds();
    println!(
        "[{:.2},{:.2}]x[{:.2},{:.2}]",
        bounds.min.x, bounds.max.x, bounds.min.y, bounds.max.y
    );
    frame.curves.iter().all(Option::is_some)
}

fn cmd_eval(args: EvalArgs) -> anyhow::Result<()> {
    let (relation, result) = compile_equation(&args.equation);
    let expr = match result {
        Ok(expr) => expr,
        Err(errors) => {
            report_errors(&args.equation, &errors);
            anyhow::bail!("equation does not compile");
        }
    };
    let ctx = EvalContext::new(args.x, args.y, args.t);
    println!("y {relation} {expr}");
    println!("= {}", expr.evaluate(&ctx));
    Ok(())
}

fn cmd_plot(args: PlotArgs) -> anyhow::Result<()> {
    let mut graph = args.view.graph()?;
    #[cfg(feature = "jit")]
    graph.set_jit(args.jit);
    #[cfg(not(feature = "jit"))]
    if args.jit {
        tracing::warn!("built without the `jit` feature, interpreting instead");
    }
    graph.push(args.equation);
    if !draw(&mut graph, args.view.cols, args.view.rows) {
        anyhow::bail!("equation does not compile");
    }
    Ok(())
}

fn cmd_grid(args: ViewArgs) -> anyhow::Result<()> {
    let mut graph = args.graph()?;
    let grid = graph.frame().grid;
    println!("step {}", grid.step);
    for (axis, lines) in [("x", &grid.vertical), ("y", &grid.horizontal)] {
        for line in lines {
            let label = line.label.as_deref().unwrap_or("");
            println!("{axis} {:>10} at {:.1}px  {label}", line.world, line.screen);
        }
    }
    Ok(())
}

fn cmd_repl(args: ViewArgs) -> anyhow::Result<()> {
    let mut graph = args.graph()?;
    let stdin = io::stdin();
    let mut input = String::new();
    loop {
        print!("> ");
        io::stdout().flush()?;
        input.clear();
        if stdin.lock().read_line(&mut input)? == 0 {
            break;
        }
        let input = input.trim();
        let mut words = input.split_whitespace();
        match words.next() {
            None => {}
            Some("quit") => break,
            Some("draw") => {
                if graph.is_empty() {
                    eprintln!("No equation to draw");
                } else {
                    draw(&mut graph, args.cols, args.rows);
                }
            }
            Some("zoom") => match words.next().map(str::parse::<f64>) {
                Some(Ok(notches)) => {
                    let vp = graph.viewport_mut();
                    let center =
                        ScreenPoint::new(vp.width() as f64 / 2.0, vp.height() as f64 / 2.0);
                    vp.zoom_at(center, notches);
                    println!("scale {}", vp.scale());
                }
                _ => eprintln!("usage: zoom <notches>"),
            },
            Some("pan") => {
                let dx = words.next().map(str::parse::<f64>);
                let dy = words.next().map(str::parse::<f64>);
                match (dx, dy) {
                    (Some(Ok(dx)), Some(Ok(dy))) => {
                        let vp = graph.viewport_mut();
                        vp.pan(dx, dy);
                        let c = vp.center();
                        println!("center ({}, {})", c.x, c.y);
                    }
                    _ => eprintln!("usage: pan <dx> <dy>"),
                }
            }
            Some(_) => {
                if graph.is_empty() {
                    graph.push(input);
                } else if let Some(equation) = graph.equation_mut(0) {
                    equation.set_text(input);
                }
                let (relation, result) = compile_equation(input);
                match result {
                    Ok(expr) => println!("y {relation} {}", expr.simplify()),
                    Err(errors) => report_errors(input, &errors),
                }
            }
        }
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(io::stderr)
        .init();

    match cli.cmd {
        Command::Eval(args) => cmd_eval(args),
        Command::Plot(args) => cmd_plot(args),
        Command::Grid(args) => cmd_grid(args),
        Command::Repl(args) => cmd_repl(args),
    }
}
