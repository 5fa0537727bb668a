use std::collections::HashSet;

use log::{debug, trace};

use crate::{
    ast::{Command::*, Segment::*, *},
    error::{Result, TranslateError},
    labels::LabelAllocator,
};

macro_rules! svec {
    ($($x:expr),* $(,)?) => (vec![$($x.to_string()),*]);
}

/// Largest value an A-instruction can load.
const MAX_ADDRESS: u32 = 0x7fff;

/// Scratch registers: R13 holds a pop destination or the frame end, R14 a
/// return address.
const SCRATCH_ADDR: &str = "R13";
const SCRATCH_RET: &str = "R14";

fn at_c(arg: u16) -> String {
    format!("@{}", arg)
}

fn at_s(arg: &str) -> String {
    format!("@{}", arg)
}

/// Push D, the single stack-growing primitive.
fn push_d() -> Vec<String> {
    svec![
        "@SP",
        "M=M+1",
        "A=M-1", // Don't need to refetch SP; this is safe
        "M=D"
    ]
}

/// Pop into D.
fn pop_d() -> Vec<String> {
    svec!["@SP", "AM=M-1", "D=M"]
}

/// Push microcode for the four pointer-backed segments
fn seg_push(seg: &str, arg: u16) -> Vec<String> {
    let mut out = svec![
        at_s(seg),
        "D=M",
        at_c(arg),
        "A=D+A", // A = SEG+arg
        "D=M"    // D = value to push
    ];
    out.extend(push_d());
    out
}

fn seg_push_direct(label: &str) -> Vec<String> {
    let mut out = svec![at_s(label), "D=M"];
    out.extend(push_d());
    out
}

fn seg_pop(seg: &str, arg: u16) -> Vec<String> {
    let mut out = svec![
        at_s(seg),
        "D=M",
        at_c(arg),
        "D=D+A", // D = SEG+arg
        at_s(SCRATCH_ADDR),
        "M=D" // Destination cached before SP moves
    ];
    out.extend(pop_d());
    out.extend(svec![
        at_s(SCRATCH_ADDR),
        "A=M", // At the destination...
        "M=D"  // ... store the popped val
    ]);
    out
}

fn seg_pop_direct(label: &str) -> Vec<String> {
    let mut out = pop_d();
    out.extend(svec![at_s(label), "M=D"]);
    out
}

fn simple_un_op(op: char) -> Vec<String> {
    svec!["@SP", "A=M-1", format!("M={}M", op)]
}

// i.e. no conditions or jumps, just pop and run
fn simple_bin_op(comp: &str) -> Vec<String> {
    svec![
        "@SP",
        "AM=M-1",             // SP--, looking at top of stack now
        "D=M",                // Right arg in D
        "A=A-1",              // Looking at second arg of stack, will overwrite
        format!("M={}", comp) // Op and overwrite second element
    ]
}

#[derive(Debug, Clone)]
pub struct TranslatorConfig {
    /// Initial stack pointer written by the bootstrap.
    pub stack_origin: u16,
    /// Function called by the bootstrap.
    pub entry_function: String,
    /// Precede each translated command with a comment restating it.
    pub annotate: bool,
}

impl Default for TranslatorConfig {
    fn default() -> Self {
        Self {
            stack_origin: 256,
            entry_function: "Sys.init".to_string(),
            annotate: true,
        }
    }
}

/// Hack code generator. One value lives for a whole run; source units are
/// switched with [`Translator::set_source_unit`].
pub struct Translator {
    config: TranslatorConfig,
    unit: String,
    function: Option<String>,
    labels: LabelAllocator,
    declared: HashSet<String>,
}

impl Default for Translator {
    fn default() -> Self {
        Self::new(TranslatorConfig::default())
    }
}

impl Translator {
    pub fn new(config: TranslatorConfig) -> Self {
        Translator {
            config,
            unit: String::new(),
            function: None,
            labels: LabelAllocator::new(),
            declared: HashSet::new(),
        }
    }

    pub fn config(&self) -> &TranslatorConfig {
        &self.config
    }

    /// Start a new source unit. Static symbols are keyed by this name and the
    /// enclosing function is cleared; generated labels keep counting.
    pub fn set_source_unit(&mut self, name: &str) {
        self.unit = name.to_string();
        self.function = None;
    }

    pub fn source_unit(&self) -> &str {
        &self.unit
    }

    pub fn current_function(&self) -> Option<&str> {
        self.function.as_deref()
    }

    /// Stack pointer initialisation followed by a call to the entry function.
    pub fn bootstrap(&mut self) -> Result<Vec<String>> {
        debug!(
            "bootstrap: SP={} then call {}",
            self.config.stack_origin, self.config.entry_function
        );
        if u32::from(self.config.stack_origin) > MAX_ADDRESS {
            return Err(TranslateError::unsupported(
                "bootstrap",
                format!("stack origin {} out of range", self.config.stack_origin),
            ));
        }
        let mut out = vec![];
        if self.config.annotate {
            out.push("// bootstrap".to_string());
        }
        out.extend(svec![at_c(self.config.stack_origin), "D=A", "@SP", "M=D"]);

        let entry = self.config.entry_function.clone();
        let call = Call(entry.clone(), 0);
        if self.config.annotate {
            out.push(format!("// {}", call));
        }
        out.extend(self.call(&entry, 0)?);
        Ok(out)
    }

    fn static_sym(&self, arg: u16) -> Result<String> {
        if self.unit.is_empty() {
            return Err(TranslateError::ProtocolViolation(
                "static segment used before a source unit was set".to_string(),
            ));
        }
        Ok(format!("{}.{}", self.unit, arg))
    }

    /// Address of `temp`/`pointer` slot, range checked.
    fn fixed_addr(command: &Command, segment: Segment, arg: u16) -> Result<String> {
        match segment.fixed_region() {
            Some((base, len)) if arg < len => Ok((base + arg).to_string()),
            Some((_, len)) => Err(TranslateError::unsupported(
                command,
                format!("{} index must be below {}", segment.name(), len),
            )),
            None => Err(TranslateError::unsupported(command, "not a fixed segment")),
        }
    }

    /// Base pointer of a pointer-backed segment; the index must fit an
    /// A-instruction.
    fn base(command: &Command, segment: Segment, arg: u16) -> Result<&'static str> {
        if u32::from(arg) > MAX_ADDRESS {
            return Err(TranslateError::unsupported(command, "index out of range"));
        }
        segment
            .base_pointer()
            .ok_or_else(|| TranslateError::unsupported(command, "no base pointer"))
    }

    fn push(&self, command: &Command, segment: Segment, arg: u16) -> Result<Vec<String>> {
        Ok(match segment {
            Constant => {
                if u32::from(arg) > MAX_ADDRESS {
                    return Err(TranslateError::unsupported(command, "constant out of range"));
                }
                let mut out = svec![at_c(arg), "D=A"];
                out.extend(push_d());
                out
            }
            Local | Argument | This | That => seg_push(Self::base(command, segment, arg)?, arg),
            Static => seg_push_direct(&self.static_sym(arg)?),
            Temp | Pointer => seg_push_direct(&Self::fixed_addr(command, segment, arg)?),
        })
    }

    fn pop(&self, command: &Command, segment: Segment, arg: u16) -> Result<Vec<String>> {
        Ok(match segment {
            Constant => {
                return Err(TranslateError::unsupported(
                    command,
                    "cannot pop into constant",
                ))
            }
            Local | Argument | This | That => seg_pop(Self::base(command, segment, arg)?, arg),
            Static => seg_pop_direct(&self.static_sym(arg)?),
            Temp | Pointer => seg_pop_direct(&Self::fixed_addr(command, segment, arg)?),
        })
    }

    fn compare(&mut self, jump: &str) -> Vec<String> {
        let branch = self.labels.allocate_branch();
        svec![
            "@SP",
            "AM=M-1", // SP--, looking at top of stack now
            "D=M",    // Right arg in D
            "A=A-1",  // Looking at second arg of stack, will overwrite
            "D=M-D",
            at_s(&branch.taken),
            format!("D;J{}", jump),
            "D=0",
            at_s(&branch.end),
            "0;JMP",
            format!("({})", branch.taken),
            "D=-1",
            format!("({})", branch.end),
            "@SP",
            "A=M-1",
            "M=D"
        ]
    }

    fn arithmetic(&mut self, op: ArithmeticOp) -> Vec<String> {
        match op {
            ArithmeticOp::Add => simple_bin_op("D+M"),
            ArithmeticOp::Sub => simple_bin_op("M-D"),
            ArithmeticOp::And => simple_bin_op("D&M"),
            ArithmeticOp::Or => simple_bin_op("D|M"),
            ArithmeticOp::Neg => simple_un_op('-'),
            ArithmeticOp::Not => simple_un_op('!'),
            ArithmeticOp::Eq => self.compare("EQ"),
            ArithmeticOp::Gt => self.compare("GT"),
            ArithmeticOp::Lt => self.compare("LT"),
        }
    }

    /// Convert VM label to Hack ASM symbol - for consistency across instructions
    fn label_to_sym(&self, label: &str) -> String {
        format!("{}${}", self.function.as_deref().unwrap_or_default(), label)
    }

    fn label(&mut self, label: &str) -> Result<Vec<String>> {
        let sym = self.label_to_sym(label);
        if !self.declared.insert(sym.clone()) {
            return Err(TranslateError::DuplicateLabel(sym));
        }
        Ok(svec![format!("({})", sym)])
    }

    fn goto(&self, label: &str) -> Vec<String> {
        svec![
            at_s(&self.label_to_sym(label)),
            "0;JMP" // Unconditional jump
        ]
    }

    fn if_goto(&self, label: &str) -> Vec<String> {
        let mut out = pop_d();
        out.extend(svec![
            at_s(&self.label_to_sym(label)),
            "D;JNE" // False is 0
        ]);
        out
    }

    fn function(&mut self, name: &str, locals: u16) -> Vec<String> {
        debug!("{}: function {} with {} locals", self.unit, name, locals);
        self.function = Some(name.to_string());

        let mut out = svec![format!("({})", name)];
        if locals > 0 {
            out.push("D=0".to_string());
            for _ in 0..locals {
                out.extend(push_d());
            }
        }
        out
    }

    fn call(&mut self, name: &str, args: u16) -> Result<Vec<String>> {
        let frame_offset = u32::from(args) + 5;
        if frame_offset > MAX_ADDRESS {
            return Err(TranslateError::unsupported(
                Call(name.to_string(), args),
                "too many arguments",
            ));
        }
        let ret = self.labels.allocate("RETURN");

        let mut out = svec![at_s(&ret), "D=A"];
        out.extend(push_d());
        for saved in ["LCL", "ARG", "THIS", "THAT"] {
            out.extend(svec![at_s(saved), "D=M"]);
            out.extend(push_d());
        }
        out.extend(svec![
            // ARG = SP - args - 5
            "@SP",
            "D=M",
            format!("@{}", frame_offset),
            "D=D-A",
            "@ARG",
            "M=D",
            // LCL = SP
            "@SP",
            "D=M",
            "@LCL",
            "M=D",
            at_s(name),
            "0;JMP",
            format!("({})", ret)
        ]);
        Ok(out)
    }

    fn ret(&self) -> Result<Vec<String>> {
        if self.function.is_none() {
            return Err(TranslateError::ProtocolViolation(format!(
                "`return` outside of any function in {}",
                self.unit
            )));
        }

        let mut out = svec![
            // frame end = LCL
            "@LCL",
            "D=M",
            at_s(SCRATCH_ADDR),
            "M=D",
            // return address = *(frame end - 5), read before *ARG is overwritten
            "@5",
            "A=D-A",
            "D=M",
            at_s(SCRATCH_RET),
            "M=D"
        ];
        out.extend(pop_d());
        out.extend(svec![
            // *ARG = pop()
            "@ARG",
            "A=M",
            "M=D",
            // SP = ARG + 1
            "@ARG",
            "D=M+1",
            "@SP",
            "M=D"
        ]);
        // Restore caller's pointers walking back from frame end
        for saved in ["THAT", "THIS", "ARG", "LCL"] {
            out.extend(svec![at_s(SCRATCH_ADDR), "AM=M-1", "D=M", at_s(saved), "M=D"]);
        }
        out.extend(svec![at_s(SCRATCH_RET), "A=M", "0;JMP"]);
        Ok(out)
    }

    /// Translate one command. Either every line of the command is returned or
    /// nothing is.
    pub fn translate_command(&mut self, command: &Command) -> Result<Vec<String>> {
        trace!("{}: {}", self.unit, command);
        let body = match command {
            Push(seg, arg) => self.push(command, *seg, *arg)?,
            Pop(seg, arg) => self.pop(command, *seg, *arg)?,
            Arithmetic(op) => self.arithmetic(*op),
            Label(sym) => self.label(sym)?,
            Goto(sym) => self.goto(sym),
            IfGoto(sym) => self.if_goto(sym),
            Function(name, locals) => self.function(name, *locals),
            Call(name, args) => self.call(name, *args)?,
            Return => self.ret()?,
        };

        if !self.config.annotate {
            return Ok(body);
        }
        let mut out = Vec::with_capacity(body.len() + 1);
        out.push(format!("// {}", command));
        out.extend(body);
        Ok(out)
    }

    pub fn translate(&mut self, commands: &[Command]) -> Result<Vec<String>> {
        let mut instructions: Vec<String> = vec![];

        for command in commands {
            instructions.extend(self.translate_command(command)?);
        }

        Ok(instructions)
    }
}
