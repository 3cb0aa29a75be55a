//! Assembler for the CPRL virtual machine.
//!
//! Turns symbolic assembly into object code in four steps: parse, optional
//! peephole optimization, address assignment, and constraint checking.
//! Object code is produced only when every step succeeded.

pub mod encoder;
pub mod instruction;
pub mod optimizer;
pub mod parser;
pub mod resolve;
pub mod scanner;
pub mod token;

pub use encoder::encode;
pub use instruction::{listing, IntArg, Instruction, InstructionKind};
pub use optimizer::{optimize, verify_labels_preserved};
pub use parser::AsmParser;
pub use resolve::ResolutionContext;
pub use scanner::AsmScanner;
pub use token::{AsmToken, AsmTokenKind};

use tracing::debug;

use crate::config::Config;
use crate::error::{AsmError, CprlError, ErrorCollector};

pub struct Assembler {
    optimize: bool,
    max_errors: usize,
}

impl Assembler {
    pub fn new(config: &Config) -> Self {
        Self {
            optimize: config.optimize,
            max_errors: config.max_errors,
        }
    }

    pub fn with_optimize(mut self, optimize: bool) -> Self {
        self.optimize = optimize;
        self
    }

    /// Scan and parse assembly text.
    pub fn parse(&self, source: &str) -> Result<Vec<Instruction>, Vec<AsmError>> {
        let tokens = AsmScanner::new(source).scan_tokens().map_err(|e| vec![e])?;
        debug!(tokens = tokens.len(), "assembly scanned");
        let instructions = AsmParser::new(tokens, self.max_errors).parse()?;
        debug!(instructions = instructions.len(), "assembly parsed");
        Ok(instructions)
    }

    pub fn assemble(&self, source: &str) -> Result<Vec<u8>, CprlError> {
        self.assemble_with_progress(source, |_| {})
    }

    /// Assemble, reporting the start of each pass through `progress`.
    pub fn assemble_with_progress(
        &self,
        source: &str,
        mut progress: impl FnMut(&str),
    ) -> Result<Vec<u8>, CprlError> {
        let mut instructions = self.parse(source)?;

        if self.optimize {
            progress("Performing optimizations...");
            instructions = optimize(instructions);
        }

        progress("Setting memory addresses...");
        let mut context = ResolutionContext::new();
        let mut errors = ErrorCollector::new(self.max_errors);
        context.assign_addresses(&mut instructions, &mut errors);
        if errors.has_errors() {
            return Err(errors.into_errors().into());
        }

        progress("Checking constraints...");
        context.check_constraints(&instructions, &mut errors);
        let instructions = errors.into_result(instructions)?;

        progress("Generating code...");
        let code = encode(&instructions, &context)?;
        debug!(bytes = code.len(), "object code encoded");
        Ok(code)
    }
}
