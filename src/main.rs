//! Punto de entrada ("driver").
//!
//! Este módulo orquesta las diferentes fases de la traducción y
//! expone una CLI.

use anyhow::{self, bail, Context};
use bitflags::bitflags;
use clap::{crate_version, Arg, Command};
use cria::{
    error::{self, Diagnostics},
    lex::Lexer,
    parse,
    source::Source,
    stream,
};

use log::{info, warn};
use std::{
    fs::{self, File},
    io::{self, Write},
    path::Path,
};

bitflags! {
    /// Artefactos de depuración que se escriben junto a la salida.
    struct Artifacts: u32 {
        /// Listado de tokens (`.lex`).
        const TOKENS = 0x01;

        /// Reporte sintáctico (`.syn`).
        const REPORT = 0x02;
    }
}

fn main() -> anyhow::Result<()> {
    // Parsing de CLI
    let args = Command::new("cria")
        .version(crate_version!())
        .about("Translates C.R.I.A programs to Python")
        .arg(
            Arg::new("input")
                .required(true)
                .value_name("INPUT")
                .help("Source file, or token listing with --from-tokens"),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .takes_value(true)
                .value_name("FILE")
                .help("Output file ('-' for stdout), defaults to INPUT with .py"),
        )
        .arg(
            Arg::new("tokens")
                .short('t')
                .long("tokens")
                .help("Also write the token listing (.lex)"),
        )
        .arg(
            Arg::new("report")
                .short('r')
                .long("report")
                .help("Also write the syntax report (.syn)"),
        )
        .arg(
            Arg::new("from-tokens")
                .long("from-tokens")
                .help("Read INPUT as a token listing instead of source code"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .multiple_occurrences(true)
                .help("Increase log verbosity"),
        )
        .arg(
            Arg::new("quiet")
                .short('q')
                .long("quiet")
                .help("Disable log output"),
        )
        .get_matches();

    stderrlog::new()
        .module(module_path!())
        .quiet(args.is_present("quiet"))
        .verbosity(args.occurrences_of("verbose") as usize + 1)
        .init()
        .context("Failed to initialize logger")?;

    // Se extraen argumentos necesarios
    let input = args.value_of("input").context("Missing input file")?;
    let default_output = Path::new(input).with_extension("py");
    let output = args
        .value_of("output")
        .map(Path::new)
        .unwrap_or_else(|| default_output.as_path());

    let mut artifacts = Artifacts::empty();
    if args.is_present("tokens") {
        artifacts |= Artifacts::TOKENS;
    }

    if args.is_present("report") {
        artifacts |= Artifacts::REPORT;
    }

    let text = fs::read_to_string(input)
        .with_context(|| format!("Failed to open for reading: {}", input))?;

    let result = if args.is_present("from-tokens") {
        if artifacts.contains(Artifacts::TOKENS) {
            warn!("Input is already a token listing, not writing one");
        }

        let tokens = stream::decode(&text);
        info!("{}: {} tokens decoded", input, tokens.len());

        // El error informado por el listado prevalece sobre el token
        match stream::decode_error(&text) {
            Some(error) => Err(Diagnostics::from(error)),
            None => parse::translate(tokens).map(|program| program.serialize()),
        }
    } else {
        let source = Source::new(input, &text);
        translate(&source, input, artifacts)?.map_err(|diagnostics| diagnostics.with_source(source))
    };

    if artifacts.contains(Artifacts::REPORT) {
        let path = Path::new(input).with_extension("syn");
        let mut file = create(&path)?;

        error::write_syntax_report(&mut file, input, result.as_ref().err())
            .with_context(|| format!("Failed to write syntax report: {}", path.display()))?;

        info!("Wrote {}", path.display());
    }

    let contents = match &result {
        Ok(program) => program.clone(),
        Err(diagnostics) => diagnostics.report(),
    };

    match output.to_str() {
        // Salida a stdout
        Some("-") => io::stdout()
            .write_all(contents.as_bytes())
            .context("Failed to write to stdout")?,

        // Salida a archivo
        _ => {
            fs::write(output, contents)
                .with_context(|| format!("Failed to write output: {}", output.display()))?;

            info!("Wrote {}", output.display());
        }
    }

    if let Err(diagnostics) = result {
        eprint!("{}", diagnostics);
        bail!("Translation of {} failed", input);
    }

    Ok(())
}

/// Traduce desde código fuente, escribiendo el listado de tokens si
/// fue solicitado.
///
/// El error externo corresponde a fallas de E/S; el interno, a errores
/// del programa traducido.
fn translate(
    source: &Source,
    input: &str,
    artifacts: Artifacts,
) -> anyhow::Result<Result<String, Diagnostics>> {
    let mut lexer = Lexer::new(source);
    let tokens: Vec<_> = lexer.by_ref().collect();
    info!("{}: {} tokens", input, tokens.len());

    if artifacts.contains(Artifacts::TOKENS) {
        let path = Path::new(input).with_extension("lex");
        let mut file = create(&path)?;

        stream::write_listing(&mut file, input, &tokens, lexer.error())
            .with_context(|| format!("Failed to write token listing: {}", path.display()))?;

        info!("Wrote {}", path.display());
    }

    let result = match lexer.error() {
        Some(error) => Err(Diagnostics::from(error.clone())),
        None => parse::translate(tokens).map(|program| program.serialize()),
    };

    Ok(result)
}

fn create(path: &Path) -> anyhow::Result<File> {
    File::create(path).with_context(|| format!("Failed to open for writing: {}", path.display()))
}
