use std::path::PathBuf;
use structopt::StructOpt;
use vmtrans::compiler::DEFAULT_ENTRY_POINT;
use vmtrans::driver::{self, Module, Options};

use tracing_subscriber::fmt;

fn main() {
    if let Err(ref e) = run() {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<(), anyhow::Error> {
    let opt = Opt::from_args();

    if let Some((_, filter)) = std::env::vars().find(|x| x.0 == "VMTRANS_TRACE") {
        fmt::Subscriber::builder()
            .with_ansi(true)
            .pretty()
            .with_env_filter(filter)
            .init();
    }

    let options = opt.options();
    let paths = driver::discover_modules(&opt.path)?;
    let modules = paths
        .iter()
        .map(|path| Module::load(path))
        .collect::<Result<Vec<_>, _>>()?;
    log::info!("translating {} module(s) from {}", modules.len(), opt.path.display());

    let output = driver::translate(&modules, &options)?;

    let out_file = opt
        .output
        .unwrap_or_else(|| driver::default_output_path(&opt.path));
    std::fs::write(&out_file, output)
        .map_err(|e| anyhow::anyhow!("could not write {}: {e}", out_file.display()))?;
    log::info!("wrote {}", out_file.display());

    Ok(())
}

#[derive(Debug, StructOpt)]
#[structopt(about = "Translates stack VM code into Hack assembly")]
struct Opt {
    /// A .vm file, or a directory searched recursively for .vm files
    #[structopt(parse(from_os_str))]
    path: PathBuf,
    /// The (optional) output file
    #[structopt(short = "o", long = "output", parse(from_os_str))]
    output: Option<PathBuf>,
    /// Precede the code of every command with the command itself, as a comment
    #[structopt(long)]
    annotate: bool,
    /// Always emit the bootstrap code
    #[structopt(long, conflicts_with = "no-bootstrap")]
    bootstrap: bool,
    /// Never emit the bootstrap code
    #[structopt(long)]
    no_bootstrap: bool,
    /// Function the bootstrap code calls
    #[structopt(long, default_value = DEFAULT_ENTRY_POINT)]
    entry: String,
}

impl Opt {
    fn options(&self) -> Options {
        let bootstrap = match (self.bootstrap, self.no_bootstrap) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        };
        Options {
            annotate: self.annotate,
            entry_point: self.entry.clone(),
            bootstrap,
        }
    }
}
