//! Minimal Hack assembler and CPU used to execute translated programs.
#![allow(dead_code)]

use std::collections::HashMap;

use vm_translator::{translate_sources, TranslatorConfig};

pub const RAM_SIZE: usize = 32768;

pub const SP: usize = 0;
pub const LCL: usize = 1;
pub const ARG: usize = 2;
pub const THIS: usize = 3;
pub const THAT: usize = 4;

#[derive(Debug, Clone)]
pub enum Instr {
    A(u16),
    C {
        dest: String,
        comp: String,
        jump: String,
    },
}

pub struct Program {
    pub code: Vec<Instr>,
    pub symbols: HashMap<String, u16>,
}

fn predefined() -> HashMap<String, u16> {
    let mut symbols: HashMap<String, u16> = [
        ("SP", 0),
        ("LCL", 1),
        ("ARG", 2),
        ("THIS", 3),
        ("THAT", 4),
        ("SCREEN", 16384),
        ("KBD", 24576),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v))
    .collect();
    for r in 0..16 {
        symbols.insert(format!("R{}", r), r);
    }
    symbols
}

fn is_symbol(s: &str) -> bool {
    !s.is_empty()
        && !s.starts_with(|c: char| c.is_ascii_digit())
        && s.chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '$' | ':'))
}

/// Two-pass assembly into decoded instructions. Panics on anything the
/// standard Hack assembler would reject.
pub fn assemble(lines: &[String]) -> Program {
    let mut symbols = predefined();
    let mut raw = vec![];

    for line in lines {
        let line = line.split("//").next().unwrap_or_default().trim();
        if line.is_empty() {
            continue;
        }
        if let Some(label) = line.strip_prefix('(').and_then(|l| l.strip_suffix(')')) {
            assert!(is_symbol(label), "bad label {}", label);
            let prev = symbols.insert(label.to_string(), raw.len() as u16);
            assert!(prev.is_none(), "label {} defined twice", label);
        } else {
            raw.push(line.to_string());
        }
    }

    let mut next_var = 16;
    let mut code = vec![];
    for line in raw {
        if let Some(value) = line.strip_prefix('@') {
            let addr = if value.starts_with(|c: char| c.is_ascii_digit()) {
                let n: u16 = value.parse().expect("numeric A-instruction");
                assert!(n <= 0x7fff, "constant {} too large", n);
                n
            } else {
                assert!(is_symbol(value), "bad symbol {}", value);
                *symbols.entry(value.to_string()).or_insert_with(|| {
                    let v = next_var;
                    next_var += 1;
                    v
                })
            };
            code.push(Instr::A(addr));
        } else {
            let (dest, rest) = match line.split_once('=') {
                Some((d, r)) => (d.to_string(), r),
                None => (String::new(), line.as_str()),
            };
            let (comp, jump) = match rest.split_once(';') {
                Some((c, j)) => (c.to_string(), j.to_string()),
                None => (rest.to_string(), String::new()),
            };
            assert!(
                ["", "M", "D", "MD", "A", "AM", "AD", "AMD"].contains(&dest.as_str()),
                "bad dest in {}",
                line
            );
            assert!(
                ["", "JGT", "JEQ", "JGE", "JLT", "JNE", "JLE", "JMP"].contains(&jump.as_str()),
                "bad jump in {}",
                line
            );
            code.push(Instr::C { dest, comp, jump });
        }
    }

    Program { code, symbols }
}

fn compute(comp: &str, a: i16, d: i16, m: impl Fn() -> i16) -> i16 {
    match comp {
        "0" => 0,
        "1" => 1,
        "-1" => -1,
        "D" => d,
        "A" => a,
        "M" => m(),
        "!D" => !d,
        "!A" => !a,
        "!M" => !m(),
        "-D" => d.wrapping_neg(),
        "-A" => a.wrapping_neg(),
        "-M" => m().wrapping_neg(),
        "D+1" => d.wrapping_add(1),
        "A+1" => a.wrapping_add(1),
        "M+1" => m().wrapping_add(1),
        "D-1" => d.wrapping_sub(1),
        "A-1" => a.wrapping_sub(1),
        "M-1" => m().wrapping_sub(1),
        "D+A" => d.wrapping_add(a),
        "D+M" => d.wrapping_add(m()),
        "D-A" => d.wrapping_sub(a),
        "D-M" => d.wrapping_sub(m()),
        "A-D" => a.wrapping_sub(d),
        "M-D" => m().wrapping_sub(d),
        "D&A" => d & a,
        "D&M" => d & m(),
        "D|A" => d | a,
        "D|M" => d | m(),
        other => panic!("non-canonical comp {}", other),
    }
}

pub struct Machine {
    pub ram: Vec<i16>,
    pub program: Program,
    a: i16,
    d: i16,
    pc: usize,
}

impl Machine {
    pub fn new(program: Program) -> Self {
        Machine {
            ram: vec![0; RAM_SIZE],
            program,
            a: 0,
            d: 0,
            pc: 0,
        }
    }

    /// Segment pointers as the standard VM test scripts set them.
    pub fn with_frame(program: Program) -> Self {
        let mut machine = Machine::new(program);
        machine.ram[SP] = 256;
        machine.ram[LCL] = 300;
        machine.ram[ARG] = 400;
        machine.ram[THIS] = 3000;
        machine.ram[THAT] = 3010;
        machine
    }

    fn addr(&self) -> usize {
        let addr = self.a as u16 as usize;
        assert!(addr < RAM_SIZE, "address {} out of range", addr);
        addr
    }

    pub fn step(&mut self) {
        match self.program.code[self.pc].clone() {
            Instr::A(value) => {
                self.a = value as i16;
                self.pc += 1;
            }
            Instr::C { dest, comp, jump } => {
                let old_a = self.a;
                let value = if comp.contains('M') {
                    let m = self.ram[self.addr()];
                    compute(&comp, self.a, self.d, || m)
                } else {
                    compute(&comp, self.a, self.d, || 0)
                };
                if dest.contains('M') {
                    let addr = self.addr();
                    self.ram[addr] = value;
                }
                if dest.contains('A') {
                    self.a = value;
                }
                if dest.contains('D') {
                    self.d = value;
                }
                let taken = match jump.as_str() {
                    "JGT" => value > 0,
                    "JEQ" => value == 0,
                    "JGE" => value >= 0,
                    "JLT" => value < 0,
                    "JNE" => value != 0,
                    "JLE" => value <= 0,
                    "JMP" => true,
                    _ => false,
                };
                self.pc = if taken { old_a as u16 as usize } else { self.pc + 1 };
            }
        }
    }

    /// Run until execution falls off the end of the program.
    pub fn run(&mut self, max_steps: usize) {
        for _ in 0..max_steps {
            if self.pc >= self.program.code.len() {
                return;
            }
            self.step();
        }
        panic!("program did not finish in {} steps", max_steps);
    }

    /// Run until the program counter reaches `label`.
    pub fn run_until(&mut self, label: &str, max_steps: usize) {
        let target = self.symbol(label) as usize;
        for _ in 0..max_steps {
            if self.pc == target {
                return;
            }
            assert!(self.pc < self.program.code.len(), "fell off the end");
            self.step();
        }
        panic!("{} not reached in {} steps", label, max_steps);
    }

    pub fn symbol(&self, name: &str) -> u16 {
        *self
            .program
            .symbols
            .get(name)
            .unwrap_or_else(|| panic!("unknown symbol {}", name))
    }

    /// Values between the stack origin and SP.
    pub fn stack(&self, origin: usize) -> &[i16] {
        &self.ram[origin..self.ram[SP] as usize]
    }
}

pub fn translate(units: &[(&str, &str)], bootstrap: bool) -> Vec<String> {
    let mut buf = vec![];
    translate_sources(
        units.iter().copied(),
        bootstrap,
        TranslatorConfig::default(),
        &mut buf,
    )
    .expect("translation failed");
    String::from_utf8(buf)
        .expect("utf8 output")
        .lines()
        .map(str::to_string)
        .collect()
}

/// Translate a single unit and load it with the standard test frame.
pub fn load(src: &str) -> Machine {
    Machine::with_frame(assemble(&translate(&[("Test", src)], false)))
}
