//! CPRL: a compiler, assembler, and stack virtual machine for a small
//! Pascal-like teaching language.
//!
//! # Pipeline
//!
//! - **Compile**: CPRL source to symbolic assembly text
//! - **Assemble**: assembly text to big-endian object code, with an optional
//!   peephole optimization pass
//! - **Run**: object code on the CPRL virtual machine
//!
//! Each phase is also available on its own through the module APIs.

#![allow(clippy::module_inception)]
#![allow(clippy::result_large_err)]
#![allow(clippy::new_without_default)]
#![allow(clippy::collapsible_if)]
#![allow(clippy::collapsible_else_if)]
#![allow(clippy::too_many_arguments)]
#![allow(clippy::len_zero)]

pub mod assembler;
pub mod ast;
pub mod bytecode;
pub mod codegen;
pub mod config;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod span;
pub mod types;
pub mod vm;

use std::io::{BufRead, Write};

use tracing::debug;

use assembler::Assembler;
use codegen::CodeGenerator;
use config::Config;
use error::{CompileError, CprlError};
use lexer::Scanner;
use parser::Parser;
use types::checker::ConstraintChecker;
use vm::Vm;

/// Compile CPRL source code to symbolic assembly text.
///
/// Lexer, parser, and constraint errors are reported together. No code is
/// generated if any error was found.
pub fn compile_source(source: &str, config: &Config) -> Result<String, CprlError> {
    debug!(bytes = source.len(), "scanning source");
    let tokens = Scanner::new(source)
        .scan_tokens()
        .map_err(|e| CprlError::Compile(vec![CompileError::from(e)]))?;

    debug!(tokens = tokens.len(), "parsing");
    let program = Parser::new(tokens, config).parse()?;

    debug!("checking constraints");
    let checked = ConstraintChecker::new(config)
        .check(program)
        .map_err(|errors| {
            CprlError::Compile(errors.into_iter().map(CompileError::from).collect())
        })?;

    debug!("generating assembly");
    let assembly = CodeGenerator::new().generate(checked)?;
    debug!(lines = assembly.lines().count(), "compilation complete");
    Ok(assembly)
}

/// Assemble symbolic assembly text into object code.
pub fn assemble_source(source: &str, config: &Config) -> Result<Vec<u8>, CprlError> {
    Assembler::new(config).assemble(source)
}

/// Load object code into a fresh machine and run it to completion.
pub fn run_object<R: BufRead, W: Write>(
    code: &[u8],
    config: &Config,
    input: &mut R,
    output: &mut W,
) -> Result<(), CprlError> {
    let mut vm = Vm::new(config);
    vm.load(code)?;
    vm.run(input, output)?;
    Ok(())
}

/// Compile, assemble, and run a CPRL program entirely in memory.
pub fn run_source<R: BufRead, W: Write>(
    source: &str,
    config: &Config,
    input: &mut R,
    output: &mut W,
) -> Result<(), CprlError> {
    let assembly = compile_source(source, config)?;
    let code = assemble_source(&assembly, config)?;
    run_object(&code, config, input, output)
}
