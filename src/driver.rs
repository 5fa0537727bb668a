//! File-system front end: decides which units to translate, whether the
//! bootstrap is needed and where the assembly goes.

use std::{
    ffi::OsStr,
    fs,
    io::Write,
    path::{Path, PathBuf},
};

use log::{info, warn};

use crate::{
    error::{Result, TranslateError},
    parser,
    translator::{Translator, TranslatorConfig},
};

const SOURCE_EXT: &str = "vm";
const OUTPUT_EXT: &str = "asm";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BootstrapPolicy {
    /// Only for a directory holding more than one unit.
    #[default]
    Auto,
    Always,
    Never,
}

#[derive(Debug, Clone, Default)]
pub struct DriverOptions {
    pub bootstrap: BootstrapPolicy,
    pub output: Option<PathBuf>,
    pub translator: TranslatorConfig,
}

/// `.vm` inputs for a path, sorted so unit order is reproducible.
pub fn discover(input: &Path) -> Result<Vec<PathBuf>> {
    if input.is_file() {
        if input.extension() != Some(OsStr::new(SOURCE_EXT)) {
            return Err(TranslateError::NoSources(input.display().to_string()));
        }
        return Ok(vec![input.to_path_buf()]);
    }

    let mut sources = vec![];
    for entry in fs::read_dir(input)? {
        let path = entry?.path();
        if path.is_file() && path.extension() == Some(OsStr::new(SOURCE_EXT)) {
            sources.push(path);
        }
    }
    if sources.is_empty() {
        return Err(TranslateError::NoSources(input.display().to_string()));
    }
    sources.sort();
    Ok(sources)
}

/// Source-unit name used to key static symbols: the file stem.
pub fn unit_name(path: &Path) -> String {
    path.file_stem()
        .and_then(OsStr::to_str)
        .unwrap_or_default()
        .to_string()
}

/// `Foo.vm` becomes `Foo.asm`; a directory `Prog/` becomes `Prog/Prog.asm`.
pub fn default_output(input: &Path, sources: &[PathBuf]) -> PathBuf {
    match sources {
        [single] => single.with_extension(OUTPUT_EXT),
        _ => {
            let dir_name = input.file_name().and_then(OsStr::to_str).unwrap_or("out");
            input.join(format!("{}.{}", dir_name, OUTPUT_EXT))
        }
    }
}

fn write_lines<W: Write>(out: &mut W, lines: Vec<String>) -> Result<()> {
    for line in lines {
        writeln!(out, "{}", line)?;
    }
    Ok(())
}

/// Translate one unit's text, writing each command's lines as soon as the
/// command has been fully translated.
pub fn translate_unit<W: Write>(
    translator: &mut Translator,
    name: &str,
    text: &str,
    out: &mut W,
) -> Result<()> {
    translator.set_source_unit(name);
    for command in parser::commands(text) {
        write_lines(out, translator.translate_command(&command?)?)?;
    }
    Ok(())
}

/// Translate in-memory `(unit name, text)` pairs in order into `out`.
pub fn translate_sources<'a, W, I>(
    sources: I,
    bootstrap: bool,
    config: TranslatorConfig,
    out: &mut W,
) -> Result<()>
where
    W: Write,
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut translator = Translator::new(config);
    if bootstrap {
        write_lines(out, translator.bootstrap()?)?;
    }
    for (name, text) in sources {
        translate_unit(&mut translator, name, text, out)?;
    }
    out.flush()?;
    Ok(())
}

/// Translate a `.vm` file or a directory of them. Returns the output path.
pub fn translate_path(input: &Path, options: &DriverOptions) -> Result<PathBuf> {
    let sources = discover(input)?;
    let program = input.is_dir() && sources.len() > 1;
    if input.is_dir() && !program {
        warn!(
            "{} holds a single .vm file, translating it as a single unit",
            input.display()
        );
    }

    let bootstrap = match options.bootstrap {
        BootstrapPolicy::Auto => program,
        BootstrapPolicy::Always => true,
        BootstrapPolicy::Never => false,
    };
    let output = options
        .output
        .clone()
        .unwrap_or_else(|| default_output(input, &sources));

    let mut units = Vec::with_capacity(sources.len());
    for path in &sources {
        info!("translating {}", path.display());
        units.push((unit_name(path), fs::read_to_string(path)?));
    }

    // Nothing reaches the output path unless every unit translated.
    let mut buf = vec![];
    translate_sources(
        units.iter().map(|(name, text)| (name.as_str(), text.as_str())),
        bootstrap,
        options.translator.clone(),
        &mut buf,
    )?;
    fs::write(&output, buf)?;

    info!("wrote {}", output.display());
    Ok(output)
}
