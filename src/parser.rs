use std::{iter::Enumerate, str::Lines};

use nom::{
    branch::alt,
    bytes::complete::{tag, take_while1},
    character::complete::{alpha1, digit1, space1},
    combinator::{map, map_res, value, verify},
    sequence::tuple,
    IResult,
};

use crate::{
    ast::{Command::*, *},
    error::{Result, TranslateError},
};

const COMMENT: &str = "//";
const MAX_CONSTANT: u16 = 0x7fff;

const KEYWORDS: [&str; 16] = [
    "push", "pop", "add", "sub", "neg", "eq", "gt", "lt", "and", "or", "not", "label", "goto",
    "if-goto", "function", "call",
];

fn integer(input: &str) -> IResult<&str, u16> {
    map_res(digit1, |c: &str| c.parse())(input)
}

#[test]
fn test_integer() {
    assert_eq!(integer("65535"), Ok(("", 65535)));
    assert!(integer("65536").is_err());
    assert!(integer("-1").is_err());
}

fn segment(input: &str) -> IResult<&str, Segment> {
    map_res(alpha1, |seg: &str| seg.parse::<Segment>())(input)
}

fn push(input: &str) -> IResult<&str, Command> {
    verify(
        map(
            tuple((tag("push"), space1, segment, space1, integer)),
            |(_, _, segment, _, arg)| Push(segment, arg),
        ),
        |p: &Command| !matches!(p, Push(Segment::Constant, n) if *n > MAX_CONSTANT),
    )(input)
}

#[test]
fn test_push() {
    assert_eq!(push("push  pointer  32"), Ok(("", Push(Segment::Pointer, 32))));
    assert_eq!(push("push constant 32767"), Ok(("", Push(Segment::Constant, 32767))));
    assert!(push("push constant 32768").is_err());
    assert!(push("push heap 1").is_err());
}

fn pop(input: &str) -> IResult<&str, Command> {
    verify(
        map(
            tuple((tag("pop"), space1, segment, space1, integer)),
            |(_, _, segment, _, arg)| Pop(segment, arg),
        ),
        |p: &Command| !matches!(p, Pop(Segment::Constant, _)),
    )(input)
}

#[test]
fn test_pop() {
    assert_eq!(pop("pop\tstatic 3"), Ok(("", Pop(Segment::Static, 3))));
    assert!(pop("pop constant 3").is_err());
}

fn prim(input: &str) -> IResult<&str, Command> {
    map(
        map_res(alpha1, |prim: &str| prim.parse::<ArithmeticOp>()),
        Arithmetic,
    )(input)
}

#[test]
fn test_prim() {
    assert_eq!(prim("neg"), Ok(("", Arithmetic(ArithmeticOp::Neg))));
    assert!(prim("mul").is_err());
}

fn is_symbol_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | ':')
}

/// Labels and function names. `$` is left out so that scoped and generated
/// assembly labels can never be spelled by a VM program.
fn symbol(input: &str) -> IResult<&str, String> {
    map(
        verify(take_while1(is_symbol_char), |c: &str| {
            !c.starts_with(|ch: char| ch.is_ascii_digit())
        }),
        |sym: &str| sym.to_string(),
    )(input)
}

#[test]
fn test_symbol() {
    assert_eq!(symbol("Main.loop_1:x"), Ok(("", "Main.loop_1:x".to_string())));
    assert!(symbol("1abc").is_err());
    assert_eq!(symbol("A$B"), Ok(("$B", "A".to_string())));
}

fn branching(input: &str) -> IResult<&str, Command> {
    map(
        tuple((
            alt((tag("label"), tag("goto"), tag("if-goto"))),
            space1,
            symbol,
        )),
        |(op, _, sym)| match op {
            "label" => Label(sym),
            "goto" => Goto(sym),
            _ => IfGoto(sym),
        },
    )(input)
}

#[test]
fn test_branching() {
    assert_eq!(branching("if-goto LOOP"), Ok(("", IfGoto("LOOP".to_string()))));
    assert_eq!(branching("goto END"), Ok(("", Goto("END".to_string()))));
}

fn function_protocol(input: &str) -> IResult<&str, Command> {
    alt((
        map(
            tuple((
                alt((tag("function"), tag("call"))),
                space1,
                symbol,
                space1,
                integer,
            )),
            |(op, _, name, _, n)| match op {
                "function" => Function(name, n),
                _ => Call(name, n),
            },
        ),
        value(Return, tag("return")),
    ))(input)
}

#[test]
fn test_function_protocol() {
    assert_eq!(
        function_protocol("function Main.fibonacci 2"),
        Ok(("", Function("Main.fibonacci".to_string(), 2)))
    );
    assert_eq!(
        function_protocol("call Math.multiply 2"),
        Ok(("", Call("Math.multiply".to_string(), 2)))
    );
    assert_eq!(function_protocol("return"), Ok(("", Return)));
    assert!(function_protocol("call Main.f").is_err());
}

fn strip_comment(line: &str) -> &str {
    line.split_once(COMMENT).map(|(s, _)| s).unwrap_or(line).trim()
}

/// Classify a comment-free, trimmed line. The error is a human-readable reason.
fn classify(line: &str) -> std::result::Result<Command, String> {
    match alt((push, pop, branching, function_protocol, prim))(line) {
        Ok(("", command)) => Ok(command),
        Ok((remainder, _)) => Err(format!("unexpected trailing `{}`", remainder.trim())),
        Err(_) => {
            let keyword = line.split_whitespace().next().unwrap_or_default();
            if keyword == "return" {
                Err("`return` takes no arguments".to_string())
            } else if KEYWORDS.contains(&keyword) {
                Err(format!("missing or invalid arguments for `{}`", keyword))
            } else {
                Err(format!("unknown command `{}`", keyword))
            }
        }
    }
}

/// Lazily classifies one command per non-blank source line.
pub struct Commands<'a> {
    lines: Enumerate<Lines<'a>>,
}

impl<'a> Iterator for Commands<'a> {
    type Item = Result<Command>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let (idx, raw) = self.lines.next()?;
            let line = strip_comment(raw);
            if line.is_empty() {
                continue;
            }

            return Some(
                classify(line).map_err(|reason| TranslateError::MalformedCommand {
                    line_no: idx + 1,
                    line: line.to_string(),
                    reason,
                }),
            );
        }
    }
}

pub fn commands(input: &str) -> Commands<'_> {
    Commands {
        lines: input.lines().enumerate(),
    }
}

pub fn parse(input: &str) -> Result<Vec<Command>> {
    commands(input).collect()
}
