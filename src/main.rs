//! cprl CLI: compile, assemble, run, and disassemble CPRL programs.

use std::env;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process;

use colored::Colorize;
use tracing_subscriber::EnvFilter;

use cprl::assembler::Assembler;
use cprl::bytecode::disassemble;
use cprl::config::{parse_switch, Config};
use cprl::error::CprlError;
use cprl::vm::Vm;

const VERSION: &str = env!("CARGO_PKG_VERSION");

const SOURCE_SUFFIX: &str = ".cprl";
const ASSEMBLY_SUFFIX: &str = ".asm";
const OBJECT_SUFFIX: &str = ".obj";
const LISTING_SUFFIX: &str = ".dis.txt";

/// CLI command to execute.
enum Command {
    /// Compile a source file to assembly
    Compile { file: String },
    /// Assemble an assembly file to object code
    Assemble { file: String },
    /// Run an object file
    Run { file: String },
    /// Write a disassembly listing of an object file
    Disassemble { file: String },
    /// Compile, assemble, and run a source file without writing files
    Exec { file: String },
}

/// Parsed command-line options.
struct Options {
    command: Command,
    config: Config,
}

fn print_usage() {
    eprintln!("cprl {} - CPRL compiler, assembler, and virtual machine", VERSION);
    eprintln!();
    eprintln!("Usage: cprl compile <file>[.cprl]");
    eprintln!("       cprl assemble [-opt:on|-opt:off] <file>[.asm]");
    eprintln!("       cprl run [--debug] <file>[.obj]");
    eprintln!("       cprl disassemble <file>[.obj]");
    eprintln!("       cprl exec [-opt:on|-opt:off] [--debug] <file>[.cprl]");
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  compile       Write <file>.asm next to the source file");
    eprintln!("  assemble      Write <file>.obj next to the assembly file");
    eprintln!("  run           Execute object code against stdin/stdout");
    eprintln!("  disassemble   Write <file>.dis.txt next to the object file");
    eprintln!("  exec          Compile, assemble, and run in memory");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  -opt:on|off   Enable or disable the peephole optimizer (default: on)");
    eprintln!("  --debug       Trace every executed instruction (set CPRL_LOG=trace)");
    eprintln!("  --help, -h    Show this help message");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  CPRL_LOG, CPRL_MAX_ERRORS, CPRL_MEMORY_SIZE, CPRL_OPTIMIZE");
}

fn usage_error(message: &str) -> ! {
    eprintln!("{} {}", "error:".red().bold(), message);
    eprintln!();
    print_usage();
    process::exit(1);
}

fn parse_args() -> Options {
    let args: Vec<String> = env::args().skip(1).collect();
    let mut config = Config::from_env();

    let Some(name) = args.first() else {
        print_usage();
        process::exit(1);
    };
    if name == "--help" || name == "-h" {
        print_usage();
        process::exit(0);
    }
    if name == "--version" || name == "-v" {
        println!("cprl {}", VERSION);
        process::exit(0);
    }

    let mut file = None;
    for arg in &args[1..] {
        match arg.as_str() {
            "--help" | "-h" => {
                print_usage();
                process::exit(0);
            }
            "--debug" if matches!(name.as_str(), "run" | "exec") => config.debug = true,
            opt if opt.starts_with("-opt:") && matches!(name.as_str(), "assemble" | "exec") => {
                match parse_switch(&opt["-opt:".len()..]) {
                    Some(on) => config.optimize = on,
                    None => usage_error(&format!("Invalid optimization switch: {}", opt)),
                }
            }
            opt if opt.starts_with('-') => {
                usage_error(&format!("Unknown option for {} command: {}", name, opt))
            }
            path => {
                if file.is_some() {
                    usage_error(&format!("Unexpected argument: {}", path));
                }
                file = Some(path.to_string());
            }
        }
    }

    let Some(file) = file else {
        usage_error(&format!("{} command requires a file name", name));
    };

    let command = match name.as_str() {
        "compile" => Command::Compile { file },
        "assemble" => Command::Assemble { file },
        "run" => Command::Run { file },
        "disassemble" => Command::Disassemble { file },
        "exec" => Command::Exec { file },
        other => usage_error(&format!("Unknown command: {}", other)),
    };

    Options { command, config }
}

fn init_logging() {
    let filter = EnvFilter::try_from_env("CPRL_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    init_logging();
    let options = parse_args();

    let ok = match &options.command {
        Command::Compile { file } => compile_file(file, &options.config),
        Command::Assemble { file } => assemble_file(file, &options.config),
        Command::Run { file } => run_file(file, &options.config),
        Command::Disassemble { file } => disassemble_file(file),
        Command::Exec { file } => exec_file(file, &options.config),
    };

    if !ok {
        process::exit(1);
    }
}

/// Append `suffix` to `file` unless it already ends with it.
fn with_suffix(file: &str, suffix: &str) -> PathBuf {
    if file.ends_with(suffix) {
        PathBuf::from(file)
    } else {
        PathBuf::from(format!("{}{}", file, suffix))
    }
}

/// Swap the `from` suffix of `path` for `to`, producing a sibling file name.
fn sibling(path: &Path, from: &str, to: &str) -> PathBuf {
    let name = path.to_string_lossy();
    let base = name.strip_suffix(from).unwrap_or(&name);
    PathBuf::from(format!("{}{}", base, to))
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn report_error(error: &CprlError) {
    match error {
        CprlError::Vm(_) => eprintln!("{}", error.to_string().red()),
        _ => {
            for diagnostic in error.diagnostics() {
                eprintln!("{} {}", "error:".red().bold(), diagnostic);
            }
        }
    }
}

fn read_text(path: &Path) -> Option<String> {
    match fs::read_to_string(path) {
        Ok(text) => Some(text),
        Err(e) => {
            eprintln!("{} cannot read {}: {}", "error:".red().bold(), path.display(), e);
            None
        }
    }
}

fn read_bytes(path: &Path) -> Option<Vec<u8>> {
    match fs::read(path) {
        Ok(bytes) => Some(bytes),
        Err(e) => {
            eprintln!("{} cannot read {}: {}", "error:".red().bold(), path.display(), e);
            None
        }
    }
}

fn write_output(path: &Path, contents: impl AsRef<[u8]>) -> bool {
    match fs::write(path, contents) {
        Ok(()) => true,
        Err(e) => {
            eprintln!("{} cannot write {}: {}", "error:".red().bold(), path.display(), e);
            false
        }
    }
}

fn compile_file(file: &str, config: &Config) -> bool {
    let path = with_suffix(file, SOURCE_SUFFIX);
    let Some(source) = read_text(&path) else {
        return false;
    };

    let name = file_name(&path);
    eprintln!("Starting compilation for {}...", name);
    match cprl::compile_source(&source, config) {
        Ok(assembly) => {
            let target = sibling(&path, SOURCE_SUFFIX, ASSEMBLY_SUFFIX);
            if !write_output(&target, assembly) {
                return false;
            }
            eprintln!("Compilation complete.");
            true
        }
        Err(e) => {
            report_error(&e);
            eprintln!("*** Errors detected in {} -- compilation terminated. ***", name);
            false
        }
    }
}

fn assemble_file(file: &str, config: &Config) -> bool {
    let path = with_suffix(file, ASSEMBLY_SUFFIX);
    let Some(source) = read_text(&path) else {
        return false;
    };

    let name = file_name(&path);
    eprintln!("Starting assembly for {}...", name);
    let assembler = Assembler::new(config);
    match assembler.assemble_with_progress(&source, |phase| eprintln!("{}", phase)) {
        Ok(code) => {
            let target = sibling(&path, ASSEMBLY_SUFFIX, OBJECT_SUFFIX);
            if !write_output(&target, code) {
                return false;
            }
            eprintln!("Assembly complete.");
            true
        }
        Err(e) => {
            report_error(&e);
            eprintln!("*** Errors detected in {} -- assembly terminated. ***", name);
            false
        }
    }
}

fn run_file(file: &str, config: &Config) -> bool {
    let path = with_suffix(file, OBJECT_SUFFIX);
    let Some(code) = read_bytes(&path) else {
        return false;
    };
    execute(&code, config)
}

fn disassemble_file(file: &str) -> bool {
    let path = with_suffix(file, OBJECT_SUFFIX);
    let Some(code) = read_bytes(&path) else {
        return false;
    };

    match disassemble(&code) {
        Ok(listing) => write_output(&sibling(&path, OBJECT_SUFFIX, LISTING_SUFFIX), listing),
        Err(e) => {
            report_error(&CprlError::from(e));
            false
        }
    }
}

fn exec_file(file: &str, config: &Config) -> bool {
    let path = with_suffix(file, SOURCE_SUFFIX);
    let Some(source) = read_text(&path) else {
        return false;
    };

    let name = file_name(&path);
    let code = cprl::compile_source(&source, config)
        .and_then(|assembly| cprl::assemble_source(&assembly, config));
    match code {
        Ok(code) => execute(&code, config),
        Err(e) => {
            report_error(&e);
            eprintln!("*** Errors detected in {} -- compilation terminated. ***", name);
            false
        }
    }
}

/// Run object code against stdin/stdout, dumping the machine state on a
/// fault when debugging.
fn execute(code: &[u8], config: &Config) -> bool {
    let mut vm = Vm::new(config);
    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut input = stdin.lock();
    let mut output = stdout.lock();

    let result = vm
        .load(code)
        .and_then(|()| vm.run(&mut input, &mut output));
    let _ = output.flush();

    match result {
        Ok(()) => true,
        Err(e) => {
            report_error(&CprlError::from(e));
            if config.debug {
                eprint!("{}", vm.dump_state());
            }
            false
        }
    }
}
