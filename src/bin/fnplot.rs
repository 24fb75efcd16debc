use std::path::PathBuf;
use std::process;

use clap::{Parser, ValueEnum};
use colored::Colorize;
use fnplot::{
    builder::get_clif_ir, convert::parse_expression, opt::optimize, Backend, PlotRequest,
    RenderOptions, Renderer,
};

#[derive(Parser)]
#[command(name = "fnplot")]
#[command(about = "Render plots of whitelisted expressions of x to PNG")]
#[command(version)]
struct Args {
    /// Expressions separated by ';', e.g. "sin(x); x^2 - 1"
    #[arg(short, long, default_value = "sin(x)")]
    function: String,

    /// Lower bound of the x range
    #[arg(long, default_value = "-10", allow_hyphen_values = true)]
    xmin: String,

    /// Upper bound of the x range
    #[arg(long, default_value = "10", allow_hyphen_values = true)]
    xmax: String,

    /// Where to write the PNG
    #[arg(short, long, default_value = "plot.png")]
    output: PathBuf,

    /// How expressions are evaluated
    #[arg(long, value_enum, default_value_t = BackendArg::Auto)]
    backend: BackendArg,

    /// Print the Cranelift IR of every expression instead of rendering
    #[arg(long)]
    clif: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum BackendArg {
    Auto,
    Jit,
    Interpreted,
}

impl From<BackendArg> for Backend {
    fn from(arg: BackendArg) -> Self {
        match arg {
            BackendArg::Auto => Backend::Auto,
            BackendArg::Jit => Backend::Jit,
            BackendArg::Interpreted => Backend::Interpreted,
        }
    }
}

fn main() {
    env_logger::init();
    let args = Args::parse();
    let request = PlotRequest::from_query(
        Some(&args.function),
        Some(&args.xmin),
        Some(&args.xmax),
    );

    if args.clif {
        if let Err(e) = print_clif_ir(&request) {
            eprintln!("{} {}", "Error:".red().bold(), e);
            process::exit(1);
        }
        return;
    }

    let renderer = Renderer::new(RenderOptions {
        backend: args.backend.into(),
    });
    let image = renderer.render(&request);

    if let Err(e) = std::fs::write(&args.output, image.bytes()) {
        eprintln!(
            "{} could not write {}: {}",
            "Error:".red().bold(),
            args.output.display(),
            e
        );
        process::exit(1);
    }

    match image.error() {
        Some(err) => {
            eprintln!(
                "{} wrote diagnostic image to {}: {}",
                "Warning:".yellow().bold(),
                args.output.display(),
                err
            );
            process::exit(2);
        }
        None => println!(
            "{} {} ({} bytes, {})",
            "Wrote".green(),
            args.output.display(),
            image.bytes().len(),
            image.content_type()
        ),
    }
}

fn print_clif_ir(request: &PlotRequest) -> Result<(), Box<dyn std::error::Error>> {
    for expression in request.expressions() {
        let program = optimize(parse_expression(expression.cleaned())?.flatten());
        println!("CLIF IR for expression '{}':", expression.cleaned());
        println!("{}", get_clif_ir(&program)?);
    }
    Ok(())
}
