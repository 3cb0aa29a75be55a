//! Peephole optimizer.
//!
//! Scans windows of two to four instructions and rewrites known patterns
//! until nothing changes. An instruction that carries labels is never
//! deleted: when the first instruction of a window goes away its labels
//! move to the instruction that takes its place, and any later instruction
//! in a window must be unlabeled for the pattern to apply.

use tracing::debug;

use crate::assembler::instruction::{IntArg, Instruction, InstructionKind};
use crate::bytecode::OpCode;

/// Result of matching one pattern at the start of a window.
struct Rewrite {
    replacement: Vec<Instruction>,
    /// Number of input instructions replaced
    consumed: usize,
}

type Pattern = fn(&[Instruction]) -> Option<Rewrite>;

const PATTERNS: &[Pattern] = &[
    fold_constants,
    increment,
    increment_variable,
    shift_left,
    shift_left_variable,
    reduce_branch,
    negate_constant,
    special_constant,
];

/// Optimize an instruction list.
pub fn optimize(instructions: Vec<Instruction>) -> Vec<Instruction> {
    let mut current = instructions;
    let mut rewrites = 0;

    loop {
        let mut changed = false;
        let mut next = Vec::with_capacity(current.len());
        let mut i = 0;

        while i < current.len() {
            let window = &current[i..];
            match PATTERNS.iter().find_map(|pattern| pattern(window)) {
                Some(rewrite) => {
                    next.extend(rewrite.replacement);
                    i += rewrite.consumed;
                    rewrites += 1;
                    changed = true;
                }
                None => {
                    next.push(current[i].clone());
                    i += 1;
                }
            }
        }

        current = next;
        if !changed {
            break;
        }
    }

    debug!(rewrites, instructions = current.len(), "peephole optimization done");
    current
}

/// Check that every label defined in `before` labels exactly one
/// instruction in `after`.
pub fn verify_labels_preserved(before: &[Instruction], after: &[Instruction]) -> Result<(), String> {
    for label in before.iter().flat_map(|i| i.labels.iter()) {
        let count = after.iter().filter(|i| i.has_label(label)).count();
        if count != 1 {
            return Err(format!(
                "label \"{}\" is attached to {} instructions after optimization",
                label, count
            ));
        }
    }
    Ok(())
}

/// Labels of `from` followed by those of `onto`, attached to a copy of `onto`.
fn carry_labels(from: &Instruction, onto: &Instruction) -> Instruction {
    let mut labels = from.labels.clone();
    labels.extend(onto.labels.iter().cloned());
    onto.clone().with_labels(labels)
}

fn replace(first: &Instruction, kind: InstructionKind) -> Instruction {
    Instruction::new(first.labels.clone(), kind, first.span)
}

fn load_int(value: i32) -> InstructionKind {
    InstructionKind::Int(OpCode::LdcInt, IntArg::Literal(value))
}

/// LDLADDR x or LDGADDR x followed by LOADW
fn is_variable_load(first: &Instruction, second: &Instruction) -> bool {
    (first.is(OpCode::LdlAddr) || first.is(OpCode::LdgAddr)) && second.is(OpCode::LoadW)
}

/// `n` if `value` is 2^n with n >= 1.
fn shift_amount(value: i32) -> Option<i32> {
    if value > 1 && value.count_ones() == 1 {
        Some(value.trailing_zeros() as i32)
    } else {
        None
    }
}

/// `LDCINT a; LDCINT b; op` becomes `LDCINT (a op b)`.
fn fold_constants(window: &[Instruction]) -> Option<Rewrite> {
    let [first, second, op, ..] = window else {
        return None;
    };
    let a = first.int_constant()?;
    let b = second.int_constant()?;
    if second.is_labeled() || op.is_labeled() {
        return None;
    }

    let value = match op.opcode()? {
        OpCode::Add => a.wrapping_add(b),
        OpCode::Sub => a.wrapping_sub(b),
        OpCode::Mul => a.wrapping_mul(b),
        OpCode::Div if b != 0 => a.wrapping_div(b),
        OpCode::Mod if b != 0 => a.wrapping_rem(b),
        _ => return None,
    };

    Some(Rewrite {
        replacement: vec![replace(first, load_int(value))],
        consumed: 3,
    })
}

/// `LDCINT 1; ADD|SUB` becomes `INC|DEC`.
fn increment(window: &[Instruction]) -> Option<Rewrite> {
    let [first, op, ..] = window else {
        return None;
    };
    if first.int_constant()? != 1 || op.is_labeled() {
        return None;
    }

    let replacement = match op.opcode()? {
        OpCode::Add => OpCode::Inc,
        OpCode::Sub => OpCode::Dec,
        _ => return None,
    };

    Some(Rewrite {
        replacement: vec![replace(first, InstructionKind::NoArg(replacement))],
        consumed: 2,
    })
}

/// `LDCINT 1; LDxADDR x; LOADW; ADD` becomes `LDxADDR x; LOADW; INC`.
///
/// Only ADD commutes: `1 - x` must stay a subtraction.
fn increment_variable(window: &[Instruction]) -> Option<Rewrite> {
    let [first, addr, load, op, ..] = window else {
        return None;
    };
    if first.int_constant()? != 1 || !is_variable_load(addr, load) || !op.is(OpCode::Add) {
        return None;
    }
    if addr.is_labeled() || load.is_labeled() || op.is_labeled() {
        return None;
    }

    Some(Rewrite {
        replacement: vec![
            carry_labels(first, addr),
            load.clone(),
            Instruction::new(Vec::new(), InstructionKind::NoArg(OpCode::Inc), op.span),
        ],
        consumed: 4,
    })
}

/// `LDCINT 2^n; MUL` becomes `SHL n`.
fn shift_left(window: &[Instruction]) -> Option<Rewrite> {
    let [first, op, ..] = window else {
        return None;
    };
    let n = shift_amount(first.int_constant()?)?;
    if !op.is(OpCode::Mul) || op.is_labeled() {
        return None;
    }

    Some(Rewrite {
        replacement: vec![replace(first, InstructionKind::Byte(OpCode::Shl, n))],
        consumed: 2,
    })
}

/// `LDCINT 2^n; LDxADDR x; LOADW; MUL` becomes `LDxADDR x; LOADW; SHL n`.
fn shift_left_variable(window: &[Instruction]) -> Option<Rewrite> {
    let [first, addr, load, op, ..] = window else {
        return None;
    };
    let n = shift_amount(first.int_constant()?)?;
    if !is_variable_load(addr, load) || !op.is(OpCode::Mul) {
        return None;
    }
    if addr.is_labeled() || load.is_labeled() || op.is_labeled() {
        return None;
    }

    Some(Rewrite {
        replacement: vec![
            carry_labels(first, addr),
            load.clone(),
            Instruction::new(Vec::new(), InstructionKind::Byte(OpCode::Shl, n), op.span),
        ],
        consumed: 4,
    })
}

/// `Bcc L1; BR L2; L1: ...` becomes `B!cc L2; L1: ...`.
fn reduce_branch(window: &[Instruction]) -> Option<Rewrite> {
    let [branch, jump, next, ..] = window else {
        return None;
    };
    let InstructionKind::Branch(cc, skip) = &branch.kind else {
        return None;
    };
    let InstructionKind::Branch(OpCode::Br, target) = &jump.kind else {
        return None;
    };
    let negated = cc.negated_branch()?;
    if jump.is_labeled() || !next.has_label(skip) {
        return None;
    }

    Some(Rewrite {
        replacement: vec![replace(
            branch,
            InstructionKind::Branch(negated, target.clone()),
        )],
        consumed: 2,
    })
}

/// `LDCINT x; NEG` becomes `LDCINT -x`.
fn negate_constant(window: &[Instruction]) -> Option<Rewrite> {
    let [first, op, ..] = window else {
        return None;
    };
    let value = first.int_constant()?;
    if !op.is(OpCode::Neg) || op.is_labeled() {
        return None;
    }

    Some(Rewrite {
        replacement: vec![replace(first, load_int(value.wrapping_neg()))],
        consumed: 2,
    })
}

/// `LDCINT 0|1` and `LDCB 0|1` use their one-byte forms.
fn special_constant(window: &[Instruction]) -> Option<Rewrite> {
    let first = window.first()?;
    let op = match &first.kind {
        InstructionKind::Int(OpCode::LdcInt, IntArg::Literal(0)) => OpCode::LdcInt0,
        InstructionKind::Int(OpCode::LdcInt, IntArg::Literal(1)) => OpCode::LdcInt1,
        InstructionKind::Byte(OpCode::Ldcb, 0) => OpCode::Ldcb0,
        InstructionKind::Byte(OpCode::Ldcb, 1) => OpCode::Ldcb1,
        _ => return None,
    };

    Some(Rewrite {
        replacement: vec![replace(first, InstructionKind::NoArg(op))],
        consumed: 1,
    })
}
