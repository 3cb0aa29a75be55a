//! End-to-end tests: CPRL source through the compiler, assembler, and VM.

use std::io::Cursor;

use cprl::config::Config;
use cprl::error::{CompileError, CprlError, VmError};
use pretty_assertions::assert_eq;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn run_with(source: &str, input: &str, optimize: bool) -> Result<String, CprlError> {
    let config = Config {
        optimize,
        ..Config::default()
    };
    let mut input = Cursor::new(input.as_bytes().to_vec());
    let mut output = Vec::new();
    cprl::run_source(source, &config, &mut input, &mut output)?;
    Ok(String::from_utf8_lossy(&output).into_owned())
}

fn run(source: &str) -> String {
    run_with(source, "", true).unwrap()
}

const FACTORIAL: &str = r#"
    function fact(n : Integer) return Integer is
    begin
        if n <= 1 then
            return 1;
        end if;
        return n * fact(n - 1);
    end fact;

    begin
        writeln fact(5);
        writeln fact(10);
    end.
"#;

const VAR_PARAMS: &str = r#"
    var total : Integer;

    procedure add(var t : Integer, n : Integer) is
    begin
        t := t + n;
    end add;

    function twice(n : Integer) return Integer is
        var r : Integer;
    begin
        r := n * 2;
        return r;
    end twice;

    begin
        add(total, twice(3));
        add(total, 4);
        writeln total;
    end.
"#;

const ARRAYS: &str = r#"
    const Size := 5;
    type Row = array[Size] of Integer;
    type Grid = array[2] of Row;
    var g : Grid;
    var i, j, sum : Integer;

    begin
        i := 0;
        while i < 2 loop
            j := 0;
            while j < Size loop
                g[i][j] := i * 10 + j;
                j := j + 1;
            end loop;
            i := i + 1;
        end loop;

        i := 0;
        loop
            exit when i = Size;
            sum := sum + g[1][i];
            i := i + 1;
        end loop;
        writeln sum;
    end.
"#;

const BRANCHES: &str = r#"
    var x : Integer;
    var c : Char;

    begin
        x := -7;
        if x < 0 then
            writeln "negative";
        elsif x = 0 then
            writeln "zero";
        else
            writeln "positive";
        end if;
        writeln x / 2, ' ', x mod 2, ' ', -x;
        c := 'q';
        writeln c, not (x > 0), x >= -7 and c = 'q';
    end.
"#;

#[test]
fn test_constant_times_two() {
    let source = "const N := 3; var x : Integer; begin x := N * 2; write x; end.";
    assert_eq!(run(source), "6");
}

#[test]
fn test_short_circuit_avoids_divide_by_zero() {
    let source = r#"
        var x : Integer;
        var ok : Boolean;
        begin
            x := 0;
            ok := x <> 0 and 10 / x > 1;
            write ok;
            ok := x = 0 or 10 / x > 1;
            write ok;
        end.
    "#;
    assert_eq!(run(source), "01");
}

#[test]
fn test_local_declaration_does_not_corrupt_global() {
    let source = r#"
        var x : Integer;

        procedure p is
            var x : Integer;
        begin
            x := 99;
            writeln x;
        end p;

        begin
            x := 1;
            p;
            writeln x;
        end.
    "#;
    assert_eq!(run(source), "99\n1\n");
}

#[test]
fn test_recursive_function() {
    assert_eq!(run(FACTORIAL), "120\n3628800\n");
}

#[test]
fn test_var_parameters() {
    assert_eq!(run(VAR_PARAMS), "10\n");
}

#[test]
fn test_nested_arrays() {
    // 10 + 11 + 12 + 13 + 14
    assert_eq!(run(ARRAYS), "60\n");
}

#[test]
fn test_branches_and_output_types() {
    assert_eq!(run(BRANCHES), "negative\n-3 -1 7\nq01\n");
}

#[test]
fn test_read_input() {
    let source = r#"
        var n : Integer;
        var c : Char;
        begin
            read n;
            read c;
            read c;
            writeln n * 2, c;
        end.
    "#;
    assert_eq!(run_with(source, "21 z\n", true).unwrap(), "42z\n");
}

#[test]
fn test_optimizer_preserves_behavior() {
    let constants = r#"
        var x : Integer;
        begin
            x := 2 + 3 * 4;
            x := x + 1;
            x := x * 8;
            writeln x, ' ', -5, ' ', 0, ' ', 1;
        end.
    "#;
    for source in [FACTORIAL, VAR_PARAMS, ARRAYS, BRANCHES, constants] {
        let optimized = run_with(source, "", true).unwrap();
        let plain = run_with(source, "", false).unwrap();
        assert_eq!(optimized, plain);
    }
    assert_eq!(run(constants), "120 -5 0 1\n");
}

#[test]
fn test_constant_minus_variable_with_optimizer() {
    let source = "var x, y : Integer; begin x := 5; y := 1 - x; writeln y; y := x - 1; writeln y; end.";
    assert_eq!(run_with(source, "", false).unwrap(), "-4\n4\n");
    assert_eq!(run_with(source, "", true).unwrap(), "-4\n4\n");
}

#[test]
fn test_short_circuit_skips_side_effects() {
    let source = r#"
        var count : Integer;
        var b : Boolean;

        function f(flag : Boolean) return Boolean is
        begin
            count := count + 1;
            return flag;
        end f;

        begin
            b := false and f(true);
            writeln count;
            b := true or f(true);
            writeln count;
            b := true and f(true);
            writeln count, b;
            b := false or f(false);
            writeln count, b;
        end.
    "#;
    for optimize in [true, false] {
        assert_eq!(run_with(source, "", optimize).unwrap(), "0\n0\n11\n20\n");
    }
}

/// Integer expressions over two variables, evaluated directly for comparison
/// with compiled code.
#[derive(Debug, Clone)]
enum Arith {
    Literal(i32),
    X,
    Y,
    Negate(Box<Arith>),
    Binary(&'static str, Box<Arith>, Box<Arith>),
}

const X_VALUE: i32 = 7;
const Y_VALUE: i32 = -3;
const LITERALS: [i32; 10] = [0, 1, 2, 3, 4, 7, 8, 16, 100, 1000];
const OPERATORS: [&str; 5] = ["+", "-", "*", "/", "mod"];

impl Arith {
    fn random(rng: &mut StdRng, depth: u32) -> Arith {
        if depth == 0 || rng.gen_bool(0.3) {
            return match rng.gen_range(0..4) {
                0 => Arith::X,
                1 => Arith::Y,
                _ => Arith::Literal(LITERALS[rng.gen_range(0..LITERALS.len())]),
            };
        }
        if rng.gen_bool(0.15) {
            return Arith::Negate(Box::new(Arith::random(rng, depth - 1)));
        }
        let op = OPERATORS[rng.gen_range(0..OPERATORS.len())];
        Arith::Binary(
            op,
            Box::new(Arith::random(rng, depth - 1)),
            Box::new(Arith::random(rng, depth - 1)),
        )
    }

    /// `None` when the expression divides by zero.
    fn eval(&self) -> Option<i32> {
        Some(match self {
            Arith::Literal(n) => *n,
            Arith::X => X_VALUE,
            Arith::Y => Y_VALUE,
            Arith::Negate(e) => e.eval()?.wrapping_neg(),
            Arith::Binary(op, l, r) => {
                let (a, b) = (l.eval()?, r.eval()?);
                match *op {
                    "+" => a.wrapping_add(b),
                    "-" => a.wrapping_sub(b),
                    "*" => a.wrapping_mul(b),
                    "/" if b != 0 => a.wrapping_div(b),
                    "mod" if b != 0 => a.wrapping_rem(b),
                    _ => return None,
                }
            }
        })
    }

    fn render(&self) -> String {
        match self {
            Arith::Literal(n) => n.to_string(),
            Arith::X => "x".to_string(),
            Arith::Y => "y".to_string(),
            Arith::Negate(e) => format!("(-{})", e.render()),
            Arith::Binary(op, l, r) => format!("({} {} {})", l.render(), op, r.render()),
        }
    }
}

#[test]
fn test_compiled_expressions_match_direct_evaluation() {
    let mut rng = StdRng::seed_from_u64(0xC9_2024);
    let mut source = format!(
        "var x, y : Integer;\nbegin\n    x := {};\n    y := {};\n",
        X_VALUE, Y_VALUE
    );
    let mut expected = String::new();

    // the patterns the optimizer rewrites, plus random trees
    let mut exprs = vec![
        Arith::Binary("-", Box::new(Arith::Literal(1)), Box::new(Arith::X)),
        Arith::Binary("+", Box::new(Arith::Literal(1)), Box::new(Arith::Y)),
        Arith::Binary("*", Box::new(Arith::Literal(8)), Box::new(Arith::X)),
        Arith::Binary("/", Box::new(Arith::Y), Box::new(Arith::Literal(2))),
        Arith::Negate(Box::new(Arith::Literal(16))),
    ];
    while exprs.len() < 300 {
        exprs.push(Arith::random(&mut rng, 4));
    }

    for expr in exprs {
        let Some(value) = expr.eval() else {
            continue;
        };
        source.push_str(&format!("    writeln {};\n", expr.render()));
        expected.push_str(&format!("{}\n", value));
    }
    source.push_str("end.\n");

    for optimize in [true, false] {
        assert_eq!(run_with(&source, "", optimize).unwrap(), expected);
    }
}

#[test]
fn test_divide_by_zero_faults() {
    let source = "var x : Integer; begin write 1; x := 10 / x; end.";
    let err = run_with(source, "", true).unwrap_err();
    assert!(matches!(err, CprlError::Vm(VmError::DivideByZero { .. })));
    assert!(err.to_string().starts_with("*** FAULT: Divide by zero"));
}

#[test]
fn test_compile_errors_are_collected() {
    let source = r#"
        var x : Integer;
        begin
            x := 'a';
            x := true;
        end.
    "#;
    let err = run_with(source, "", true).unwrap_err();
    match &err {
        CprlError::Compile(errors) => {
            assert_eq!(errors.len(), 2);
            assert!(errors
                .iter()
                .all(|e| matches!(e, CompileError::Constraint(_))));
        }
        other => panic!("Expected compile errors, got {:?}", other),
    }
    assert_eq!(err.diagnostics().len(), 2);
}

#[test]
fn test_generated_assembly_reassembles() {
    let config = Config::default();
    let assembly = cprl::compile_source(FACTORIAL, &config).unwrap();
    // no globals, so no PROGRAM instruction; branch over the function body
    assert!(assembly.starts_with("   BR L2\nL1:\n   PROC 0\n"));

    let code = cprl::assemble_source(&assembly, &config).unwrap();
    let listing = cprl::bytecode::disassemble(&code).unwrap();
    assert!(listing.contains("CALL"));
    assert!(listing.contains("RET"));
}
