// Command-line interface for jojodiff.
//
// Subcommands mirror the original jdiff/jpatch pair: `diff` encodes a patch,
// `patch` applies one, `print` lists the decoded instructions of a patch
// stream. Output paths default to stdout, matching jdiff's behavior when the
// patch argument is omitted.

use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::process;

use clap::{ArgAction, Args, Parser, Subcommand, ValueHint};

use crate::io::{DiffStats, PatchStats, diff_file, diff_to_writer, patch_file, patch_to_writer};
use crate::patch::{Instruction, InstructionIterator};

// ---------------------------------------------------------------------------
// Clap CLI definition
// ---------------------------------------------------------------------------

/// JojoDiff-compatible binary diff/patch tool.
#[derive(Parser, Debug)]
#[command(
    name = "jojodiff",
    version,
    about = "JojoDiff-compatible binary diff/patch",
    arg_required_else_help = true
)]
struct Cli {
    #[command(subcommand)]
    command: Cmd,

    /// Force overwrite existing output files.
    #[arg(short = 'f', long, global = true)]
    force: bool,

    /// Quiet mode (suppress non-error output).
    #[arg(short = 'q', long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Verbose mode (use multiple times for more detail).
    #[arg(short = 'v', long, global = true, action = ArgAction::Count)]
    verbose: u8,

    /// Output stats as JSON to stderr.
    #[arg(long = "json", global = true)]
    json_output: bool,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Create a patch transforming ORIGINAL into NEW.
    Diff(DiffArgs),
    /// Apply a patch to ORIGINAL, reconstructing the new file.
    Patch(PatchArgs),
    /// Print the instructions of a patch stream.
    Print(PrintArgs),
}

#[derive(Args, Debug)]
struct DiffArgs {
    /// Original file.
    #[arg(value_hint = ValueHint::FilePath)]
    original: PathBuf,

    /// New file.
    #[arg(value_hint = ValueHint::FilePath)]
    new: PathBuf,

    /// Output patch file (default or "-": stdout).
    #[arg(value_hint = ValueHint::FilePath)]
    patch: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct PatchArgs {
    /// Original file.
    #[arg(value_hint = ValueHint::FilePath)]
    original: PathBuf,

    /// Patch file ("-": stdin).
    #[arg(value_hint = ValueHint::FilePath)]
    patch: PathBuf,

    /// Output file (default or "-": stdout).
    #[arg(value_hint = ValueHint::FilePath)]
    output: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct PrintArgs {
    /// Patch file to inspect.
    #[arg(value_hint = ValueHint::FilePath)]
    patch: PathBuf,
}

fn is_stdio(path: Option<&PathBuf>) -> bool {
    match path {
        None => true,
        Some(p) => p.as_os_str() == "-",
    }
}

// ---------------------------------------------------------------------------
// Diff command
// ---------------------------------------------------------------------------

fn emit_diff_stats(cli: &Cli, stats: &DiffStats) {
    if cli.verbose > 0 && !cli.quiet {
        eprintln!(
            "jojodiff: diff: original size: {}, new size: {}, patch size: {}",
            stats.original_size, stats.new_size, stats.patch_size
        );
    }
    if cli.json_output {
        let json = serde_json::json!({
            "command": "diff",
            "original_size": stats.original_size,
            "new_size": stats.new_size,
            "patch_size": stats.patch_size,
        });
        eprintln!("{}", serde_json::to_string_pretty(&json).unwrap());
    }
}

fn cmd_diff(cli: &Cli, args: &DiffArgs) -> i32 {
    if is_stdio(args.patch.as_ref()) {
        let stdout = io::stdout();
        match diff_to_writer(&args.original, &args.new, stdout.lock()) {
            Ok((stats, mut out)) => {
                if let Err(e) = out.flush() {
                    eprintln!("jojodiff: write flush error: {e}");
                    return 1;
                }
                emit_diff_stats(cli, &stats);
                0
            }
            Err(e) => {
                eprintln!("jojodiff: diff error: {e}");
                1
            }
        }
    } else {
        let patch_path = args.patch.as_ref().unwrap();
        if patch_path.exists() && !cli.force {
            eprintln!(
                "jojodiff: output file exists, use -f to overwrite: {}",
                patch_path.display()
            );
            return 1;
        }
        match diff_file(&args.original, &args.new, patch_path) {
            Ok(stats) => {
                emit_diff_stats(cli, &stats);
                0
            }
            Err(e) => {
                eprintln!("jojodiff: diff error: {e}");
                1
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Patch command
// ---------------------------------------------------------------------------

fn emit_patch_stats(cli: &Cli, stats: &PatchStats) {
    if cli.verbose > 0 && !cli.quiet {
        eprintln!(
            "jojodiff: patch: original size: {}, patch size: {}, output size: {}",
            stats.original_size, stats.patch_size, stats.output_size
        );
    }
    if cli.json_output {
        let json = serde_json::json!({
            "command": "patch",
            "original_size": stats.original_size,
            "patch_size": stats.patch_size,
            "output_size": stats.output_size,
        });
        eprintln!("{}", serde_json::to_string_pretty(&json).unwrap());
    }
}

fn cmd_patch(cli: &Cli, args: &PatchArgs) -> i32 {
    if is_stdio(args.output.as_ref()) {
        let stdout = io::stdout();
        match patch_to_writer(&args.original, &args.patch, stdout.lock()) {
            Ok((stats, mut out)) => {
                if let Err(e) = out.flush() {
                    eprintln!("jojodiff: write flush error: {e}");
                    return 1;
                }
                emit_patch_stats(cli, &stats);
                0
            }
            Err(e) => {
                eprintln!("jojodiff: patch error: {e}");
                1
            }
        }
    } else {
        let output_path = args.output.as_ref().unwrap();
        if output_path.exists() && !cli.force {
            eprintln!(
                "jojodiff: output file exists, use -f to overwrite: {}",
                output_path.display()
            );
            return 1;
        }
        match patch_file(&args.original, &args.patch, output_path) {
            Ok(stats) => {
                emit_patch_stats(cli, &stats);
                0
            }
            Err(e) => {
                eprintln!("jojodiff: patch error: {e}");
                1
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Print command
// ---------------------------------------------------------------------------

fn cmd_print(args: &PrintArgs) -> i32 {
    let data = if args.patch.as_os_str() == "-" {
        let mut buf = Vec::new();
        if let Err(e) = io::stdin().read_to_end(&mut buf) {
            eprintln!("jojodiff: stdin: {e}");
            return 1;
        }
        buf
    } else {
        match std::fs::read(&args.patch) {
            Ok(d) => d,
            Err(e) => {
                eprintln!("jojodiff: {}: {e}", args.patch.display());
                return 1;
            }
        }
    };

    println!("  Offset Inst  Operand");
    let mut offset: u64 = 0;
    for result in InstructionIterator::new(&data) {
        match result {
            Ok(inst) => match inst {
                Instruction::Equal(len) => {
                    println!("  {offset:06} EQL   {len}");
                    offset += len;
                }
                Instruction::Delete(len) => {
                    println!("  {offset:06} DEL   {len}");
                }
                Instruction::Insert(b) => {
                    println!("  {offset:06} INS   {b:#04x}");
                    offset += 1;
                }
                Instruction::Mod(b) => {
                    println!("  {offset:06} MOD   {b:#04x}");
                    offset += 1;
                }
                Instruction::Backtrace(len) => {
                    println!("  {offset:06} BKT   {len}");
                }
            },
            Err(e) => {
                eprintln!("jojodiff: instruction decode: {e}");
                return 1;
            }
        }
    }

    0
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

#[cfg(any(test, feature = "fuzzing"))]
pub fn fuzz_try_parse_args(args: &[String]) {
    let argv: Vec<String> = std::iter::once("jojodiff".to_string())
        .chain(args.iter().cloned())
        .collect();
    let _ = Cli::try_parse_from(argv);
}

/// Main CLI entry point. Parses arguments via clap, dispatches commands.
pub fn run() -> ! {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .format_timestamp(None)
        .format_target(false)
        .init();

    let cli = Cli::parse();

    let exit_code = match &cli.command {
        Cmd::Diff(args) => cmd_diff(&cli, args),
        Cmd::Patch(args) => cmd_patch(&cli, args),
        Cmd::Print(args) => cmd_print(args),
    };

    process::exit(exit_code);
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        let argv: Vec<String> = std::iter::once("jojodiff".to_string())
            .chain(args.iter().map(|s| s.to_string()))
            .collect();
        Cli::try_parse_from(argv).expect("cli parse failed")
    }

    #[test]
    fn diff_subcommand_maps_correctly() {
        let cli = parse(&["diff", "orig.bin", "new.bin", "out.jdf"]);
        match cli.command {
            Cmd::Diff(args) => {
                assert_eq!(args.original, PathBuf::from("orig.bin"));
                assert_eq!(args.new, PathBuf::from("new.bin"));
                assert_eq!(args.patch, Some(PathBuf::from("out.jdf")));
            }
            _ => panic!("expected diff subcommand"),
        }
    }

    #[test]
    fn omitted_patch_means_stdout() {
        let cli = parse(&["diff", "orig.bin", "new.bin"]);
        match cli.command {
            Cmd::Diff(args) => assert!(is_stdio(args.patch.as_ref())),
            _ => panic!("expected diff subcommand"),
        }
    }

    #[test]
    fn dash_means_stdout() {
        let cli = parse(&["patch", "orig.bin", "p.jdf", "-"]);
        match cli.command {
            Cmd::Patch(args) => assert!(is_stdio(args.output.as_ref())),
            _ => panic!("expected patch subcommand"),
        }
    }

    #[test]
    fn global_flags_parse() {
        let cli = parse(&["--force", "--json", "diff", "a", "b"]);
        assert!(cli.force);
        assert!(cli.json_output);

        let cli = parse(&["-v", "-v", "diff", "a", "b"]);
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn quiet_conflicts_with_verbose() {
        let argv = ["jojodiff", "--quiet", "--verbose", "diff", "a", "b"];
        assert!(Cli::try_parse_from(argv).is_err());
    }

    #[test]
    fn print_subcommand_maps() {
        let cli = parse(&["print", "p.jdf"]);
        assert!(matches!(cli.command, Cmd::Print(_)));
    }
}
