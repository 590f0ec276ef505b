//! glesh-bench - run GLES2 benchmarks on Wayland or fbdev
//!
//! Each selected benchmark gets a fresh window and rendering context, runs
//! for the configured duration (or until Ctrl+C) and reports its metrics
//! through the log.

mod bench;

use std::sync::OnceLock;

use anyhow::{anyhow, bail, Context, Result};
use log::{error, info, warn};

use glesh::config::{Config, Overrides};
use glesh::{Backend, CancelToken, LogSink, LoopOptions, RenderingContext};

/// Cancelled by SIGINT/SIGTERM
static CANCEL: OnceLock<CancelToken> = OnceLock::new();

/// Set up signal handlers for graceful shutdown (call once at startup)
fn setup_signal_handlers() {
    unsafe {
        libc::signal(
            libc::SIGTERM,
            shutdown_signal_handler as *const () as libc::sighandler_t,
        );
        libc::signal(
            libc::SIGINT,
            shutdown_signal_handler as *const () as libc::sighandler_t,
        );
    }
}

extern "C" fn shutdown_signal_handler(_signo: libc::c_int) {
    if let Some(token) = CANCEL.get() {
        token.cancel();
    }
}

#[derive(Debug, PartialEq)]
enum Command {
    Help,
    Version,
    List,
    Run(Overrides),
}

/// Value of `--name value` or `--name=value`
fn option_value<'a, I>(arg: &'a str, name: &str, rest: &mut I) -> Result<Option<String>>
where
    I: Iterator<Item = &'a String>,
{
    if arg == name {
        return rest
            .next()
            .cloned()
            .map(Some)
            .ok_or_else(|| anyhow!("{} requires a value", name));
    }
    Ok(arg
        .strip_prefix(name)
        .and_then(|s| s.strip_prefix('='))
        .map(str::to_string))
}

fn parse_number<T: std::str::FromStr>(name: &str, value: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| anyhow!("invalid value for {}: {}", name, value))
}

fn parse_args(args: &[String]) -> Result<Command> {
    let mut overrides = Overrides::default();
    let mut iter = args.iter();

    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "-h" | "--help" => return Ok(Command::Help),
            "-V" | "--version" => return Ok(Command::Version),
            "--list" => return Ok(Command::List),
            _ => {}
        }

        if let Some(v) = option_value(arg, "--backend", &mut iter)? {
            overrides.backend = Some(v.parse::<Backend>()?);
        } else if let Some(v) = option_value(arg, "--width", &mut iter)? {
            overrides.width = Some(parse_number("--width", &v)?);
        } else if let Some(v) = option_value(arg, "--height", &mut iter)? {
            overrides.height = Some(parse_number("--height", &v)?);
        } else if let Some(v) = option_value(arg, "--depth", &mut iter)? {
            overrides.depth = Some(parse_number("--depth", &v)?);
        } else if let Some(v) = option_value(arg, "--time", &mut iter)? {
            overrides.duration = Some(parse_number("--time", &v)?);
        } else if let Some(v) = option_value(arg, "--test", &mut iter)? {
            overrides.tests.push(v);
        } else {
            bail!("unknown argument: {}", arg);
        }
    }

    Ok(Command::Run(overrides))
}

fn print_help() {
    println!(
        r#"glesh-bench {} - GLES2 benchmarks for embedded Linux

USAGE:
    glesh-bench [OPTIONS]

OPTIONS:
    -h, --help              Print this help message
    -V, --version           Print version information
    --list                  List available benchmarks
    --backend <NAME>        Window system: wayland, fbdev
    --width <PX>            Surface width (0 = output size on Wayland)
    --height <PX>           Surface height (0 = output size on Wayland)
    --depth <BITS>          Color depth (0 = 32)
    --time <SECONDS>        Seconds per benchmark (0 = until Ctrl+C)
    --test <NAME>           Benchmark to run (repeatable)

EXAMPLES:
    glesh-bench                                   Run configured benchmarks
    glesh-bench --backend=fbdev --time 5          Five seconds on the framebuffer
    glesh-bench --test simple_tri --test textured_sphere

CONFIG FILE:
    $GLESH_CONFIG, ~/.config/glesh/config.toml or /etc/glesh/config.toml

Set RUST_LOG=debug for EGL and texture details.
"#,
        env!("CARGO_PKG_VERSION")
    );
}

fn print_list() {
    for b in bench::BENCHMARKS {
        println!("{:<18} {}", b.name, b.description);
    }
}

fn run_benchmark(config: &Config, bench: &bench::Benchmark, options: &LoopOptions) -> Result<()> {
    let backend = config.display.backend;
    let window = backend.window_system(config.wayland.readiness_timeout())?;
    let mut ctx = RenderingContext::create(
        window,
        bench.config_attribs,
        config.display.width,
        config.display.height,
        config.display.depth,
    )
    .with_context(|| format!("{}: context creation on {} failed", bench.name, backend))?;

    let result = (bench.run)(&mut ctx, &mut LogSink, options);
    ctx.destroy();
    result.with_context(|| format!("{} failed", bench.name))
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let overrides = match parse_args(&args) {
        Ok(Command::Help) => {
            print_help();
            return Ok(());
        }
        Ok(Command::Version) => {
            println!("glesh-bench {}", env!("CARGO_PKG_VERSION"));
            return Ok(());
        }
        Ok(Command::List) => {
            print_list();
            return Ok(());
        }
        Ok(Command::Run(overrides)) => overrides,
        Err(e) => {
            eprintln!("glesh-bench: {:#}", e);
            eprintln!("Try 'glesh-bench --help' for more information.");
            std::process::exit(2);
        }
    };

    let mut config = Config::load();
    config.apply(&overrides);

    // Resolve every name before opening a window
    let benches = config
        .run
        .tests
        .iter()
        .map(|name| bench::find(name).ok_or_else(|| anyhow!("unknown benchmark: {}", name)))
        .collect::<Result<Vec<_>>>()?;
    if benches.is_empty() {
        warn!("No benchmarks selected");
        return Ok(());
    }

    let cancel = CANCEL.get_or_init(CancelToken::new).clone();
    setup_signal_handlers();

    let options = LoopOptions::timed(config.run.duration()).with_cancel(cancel.clone());
    info!(
        "glesh-bench starting: {} benchmark(s) on {}",
        benches.len(),
        config.display.backend
    );

    let mut failures = 0;
    for bench in benches {
        if cancel.is_cancelled() {
            warn!("Interrupted, skipping {}", bench.name);
            continue;
        }
        info!("Running {}", bench.name);
        if let Err(e) = run_benchmark(&config, bench, &options) {
            error!("{:#}", e);
            failures += 1;
        }
    }

    if failures > 0 {
        error!("{} benchmark(s) failed", failures);
        std::process::exit(1);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_no_args_runs_with_empty_overrides() {
        assert_eq!(parse_args(&[]).unwrap(), Command::Run(Overrides::default()));
    }

    #[test]
    fn test_both_value_forms() {
        let cmd = parse_args(&args(&[
            "--backend=fbdev",
            "--width",
            "800",
            "--height=600",
            "--time",
            "2.5",
            "--test",
            "simple_tri",
            "--test=textured_sphere",
        ]))
        .unwrap();

        let Command::Run(o) = cmd else {
            panic!("expected run command");
        };
        assert_eq!(o.backend, Some(Backend::Fbdev));
        assert_eq!(o.width, Some(800));
        assert_eq!(o.height, Some(600));
        assert_eq!(o.depth, None);
        assert_eq!(o.duration, Some(2.5));
        assert_eq!(o.tests, vec!["simple_tri", "textured_sphere"]);
    }

    #[test]
    fn test_help_wins() {
        assert_eq!(parse_args(&args(&["--width", "1", "-h"])).unwrap(), Command::Help);
        assert_eq!(parse_args(&args(&["-V"])).unwrap(), Command::Version);
        assert_eq!(parse_args(&args(&["--list"])).unwrap(), Command::List);
    }

    #[test]
    fn test_bad_arguments() {
        assert!(parse_args(&args(&["--width"])).is_err());
        assert!(parse_args(&args(&["--width", "wide"])).is_err());
        assert!(parse_args(&args(&["--backend", "x11"])).is_err());
        assert!(parse_args(&args(&["--frobnicate"])).is_err());
        // Prefix alone is not a match
        assert!(parse_args(&args(&["--widthx=3"])).is_err());
    }
}
