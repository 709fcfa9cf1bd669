//! Profiles a sample build.
//!
//! Prints one indented trace line per hook firing, then one timing line per
//! tap firing once the build is done.
//!
//! # Usage
//!
//! ```bash
//! profile-build [--hot] [--wasm] [--plain] [--json-logs]
//! ```
//!
//! Log verbosity follows `RUST_LOG`-style directives in `TAPSCOPE_LOG`,
//! e.g. `TAPSCOPE_LOG=tapscope::timing=debug`.

use example::{SampleOptions, apply_demo_plugins, sample_config};
use tapscope_pipeline::Compiler;
use tapscope_profiler::{ProfilingPlugin, TraceStyle, TracingFormat, TracingSetup};

#[tokio::main]
async fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let flag = |name: &str| args.iter().any(|arg| arg == name);

    if let Some(unknown) = args
        .iter()
        .find(|arg| !matches!(arg.as_str(), "--hot" | "--wasm" | "--plain" | "--json-logs"))
    {
        eprintln!("Unknown argument: {unknown}");
        eprintln!("Usage: profile-build [--hot] [--wasm] [--plain] [--json-logs]");
        std::process::exit(2);
    }

    let mut logging = TracingSetup::new().with_format(if flag("--json-logs") {
        TracingFormat::Json
    } else {
        TracingFormat::Compact
    });
    if let Ok(filter) = std::env::var("TAPSCOPE_LOG") {
        logging = logging.with_env_filter(filter);
    }
    logging.init();

    let options = SampleOptions {
        hot: flag("--hot"),
        webassembly: flag("--wasm"),
    };
    let style = if flag("--plain") {
        TraceStyle::Plain
    } else {
        TraceStyle::Colored
    };

    let compiler = Compiler::new(sample_config(options));
    let profiler = ProfilingPlugin::new().with_style(style);
    compiler.apply(&profiler);
    apply_demo_plugins(&compiler);

    match compiler.run().await {
        Ok(stats) => {
            tracing::info!(
                modules = stats.modules.len(),
                assets = ?stats.assets,
                timings = profiler.timings().len(),
                "build finished"
            );
        }
        Err(error) => {
            eprintln!("Error: {error}");
            std::process::exit(1);
        }
    }
}
