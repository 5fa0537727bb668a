use std::{fmt, str::FromStr};

use crate::error::{Result, TranslateError};

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Segment {
    Constant,
    Local,
    Static,
    Argument,
    This,
    That,
    Pointer,
    Temp,
}

impl Segment {
    /// Base pointer cell for the segments addressed through a pointer.
    pub fn base_pointer(self) -> Option<&'static str> {
        match self {
            Segment::Local => Some("LCL"),
            Segment::Argument => Some("ARG"),
            Segment::This => Some("THIS"),
            Segment::That => Some("THAT"),
            _ => None,
        }
    }

    /// Fixed RAM region for `temp` and `pointer`, as (base address, length).
    pub fn fixed_region(self) -> Option<(u16, u16)> {
        match self {
            Segment::Pointer => Some((3, 2)),
            Segment::Temp => Some((5, 8)),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Segment::Constant => "constant",
            Segment::Local => "local",
            Segment::Static => "static",
            Segment::Argument => "argument",
            Segment::This => "this",
            Segment::That => "that",
            Segment::Pointer => "pointer",
            Segment::Temp => "temp",
        }
    }
}

impl FromStr for Segment {
    type Err = TranslateError;

    fn from_str(s: &str) -> Result<Self> {
        Ok(match s {
            "constant" => Segment::Constant,
            "local" => Segment::Local,
            "static" => Segment::Static,
            "argument" => Segment::Argument,
            "this" => Segment::This,
            "that" => Segment::That,
            "pointer" => Segment::Pointer,
            "temp" => Segment::Temp,
            _ => return Err(TranslateError::unsupported(s, "unknown segment")),
        })
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum ArithmeticOp {
    Add,
    Sub,
    Neg,
    Eq,
    Gt,
    Lt,
    And,
    Or,
    Not,
}

impl ArithmeticOp {
    pub fn mnemonic(self) -> &'static str {
        match self {
            ArithmeticOp::Add => "add",
            ArithmeticOp::Sub => "sub",
            ArithmeticOp::Neg => "neg",
            ArithmeticOp::Eq => "eq",
            ArithmeticOp::Gt => "gt",
            ArithmeticOp::Lt => "lt",
            ArithmeticOp::And => "and",
            ArithmeticOp::Or => "or",
            ArithmeticOp::Not => "not",
        }
    }
}

impl FromStr for ArithmeticOp {
    type Err = TranslateError;

    fn from_str(s: &str) -> Result<Self> {
        Ok(match s {
            "add" => ArithmeticOp::Add,
            "sub" => ArithmeticOp::Sub,
            "neg" => ArithmeticOp::Neg,
            "eq" => ArithmeticOp::Eq,
            "gt" => ArithmeticOp::Gt,
            "lt" => ArithmeticOp::Lt,
            "and" => ArithmeticOp::And,
            "or" => ArithmeticOp::Or,
            "not" => ArithmeticOp::Not,
            _ => return Err(TranslateError::unsupported(s, "unknown arithmetic command")),
        })
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum CommandKind {
    Arithmetic,
    Push,
    Pop,
    Label,
    Goto,
    If,
    Function,
    Call,
    Return,
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub enum Command {
    // Stack Basics
    Arithmetic(ArithmeticOp),
    Push(Segment, u16),
    Pop(Segment, u16),

    // Control
    Label(String),
    Goto(String),
    IfGoto(String),

    // Functions
    Function(String, u16),
    Call(String, u16),
    Return,
}

impl Command {
    pub fn kind(&self) -> CommandKind {
        match self {
            Command::Arithmetic(_) => CommandKind::Arithmetic,
            Command::Push(..) => CommandKind::Push,
            Command::Pop(..) => CommandKind::Pop,
            Command::Label(_) => CommandKind::Label,
            Command::Goto(_) => CommandKind::Goto,
            Command::IfGoto(_) => CommandKind::If,
            Command::Function(..) => CommandKind::Function,
            Command::Call(..) => CommandKind::Call,
            Command::Return => CommandKind::Return,
        }
    }

    /// First argument; arithmetic commands answer with their own mnemonic.
    pub fn arg1(&self) -> Result<&str> {
        match self {
            Command::Arithmetic(op) => Ok(op.mnemonic()),
            Command::Push(seg, _) | Command::Pop(seg, _) => Ok(seg.name()),
            Command::Label(sym)
            | Command::Goto(sym)
            | Command::IfGoto(sym)
            | Command::Function(sym, _)
            | Command::Call(sym, _) => Ok(sym.as_str()),
            Command::Return => Err(TranslateError::ProtocolViolation(
                "arg1 requested for `return`".to_string(),
            )),
        }
    }

    pub fn arg2(&self) -> Result<u16> {
        match self {
            Command::Push(_, n) | Command::Pop(_, n) | Command::Function(_, n) | Command::Call(_, n) => {
                Ok(*n)
            }
            other => Err(TranslateError::ProtocolViolation(format!(
                "arg2 requested for `{}`",
                other
            ))),
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Arithmetic(op) => write!(f, "{}", op.mnemonic()),
            Command::Push(seg, arg) => write!(f, "push {} {}", seg.name(), arg),
            Command::Pop(seg, arg) => write!(f, "pop {} {}", seg.name(), arg),
            Command::Label(sym) => write!(f, "label {}", sym),
            Command::Goto(sym) => write!(f, "goto {}", sym),
            Command::IfGoto(sym) => write!(f, "if-goto {}", sym),
            Command::Function(name, locals) => write!(f, "function {} {}", name, locals),
            Command::Call(name, args) => write!(f, "call {} {}", name, args),
            Command::Return => write!(f, "return"),
        }
    }
}
