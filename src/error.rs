//! Reporte de errores de todas las fases.
//!
//! Los errores de cada fase son tipos distintos. [`Diagnostics`] los
//! agrupa detrás de [`LocatedError`] para reportarlos en conjunto, ya
//! sea en terminal (por medio de `Display`) o como comentarios dentro
//! del archivo de salida (por medio de [`Diagnostics::report()`]).

use crate::{
    lex::LexerError,
    parse::ParserError,
    semantic::SemanticError,
    source::{Located, Position, Source},
};

use std::{
    error::Error,
    fmt::{self, Debug, Display},
    io::{self, Write},
};

mod sealed {
    pub trait Sealed {}
}

/// Fase del traductor en la que se originó un error.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Phase {
    Lexical,
    Syntax,
    Semantic,
}

impl Phase {
    fn describe(self) -> &'static str {
        match self {
            Phase::Lexical => "erro léxico",
            Phase::Syntax => "erro sintático",
            Phase::Semantic => "erro semântico",
        }
    }
}

/// Tipos de error que pertenecen a una fase.
pub trait PhaseError: Error + 'static {
    const PHASE: Phase;
}

impl PhaseError for LexerError {
    const PHASE: Phase = Phase::Lexical;
}

impl PhaseError for ParserError {
    const PHASE: Phase = Phase::Syntax;
}

impl PhaseError for SemanticError {
    const PHASE: Phase = Phase::Semantic;
}

pub trait LocatedError: sealed::Sealed {
    fn source(&self) -> &dyn Error;
    fn position(&self) -> Position;
    fn phase(&self) -> Phase;

    /// Mensaje en el formato de una línea de cada fase.
    fn message(&self) -> String {
        let position = self.position();
        match self.phase() {
            Phase::Lexical => format!(
                "Erro Léxico na linha {}, coluna {}: {}",
                position.line(),
                position.column(),
                self.source()
            ),

            Phase::Syntax => format!(
                "Erro sintático na linha {}, coluna {}: {}",
                position.line(),
                position.column(),
                self.source()
            ),

            Phase::Semantic => {
                format!("Erro semântico: {}, linha: {}", self.source(), position.line())
            }
        }
    }
}

/// Conjunto ordenado de errores de una traducción.
#[derive(Default)]
pub struct Diagnostics {
    errors: Vec<Box<dyn 'static + LocatedError>>,
    source: Option<Source>,
}

impl Diagnostics {
    /// Asocia el código fuente, para que `Display` muestre extractos.
    pub fn with_source(self, source: Source) -> Self {
        Diagnostics {
            source: Some(source),
            ..self
        }
    }

    pub fn push<E: PhaseError>(&mut self, error: Located<E>) {
        self.errors.push(Box::new(error));
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn errors(&self) -> impl Iterator<Item = &(dyn 'static + LocatedError)> {
        self.errors.iter().map(|error| &**error)
    }

    /// Mensajes de una línea, en orden de ocurrencia.
    pub fn messages(&self) -> Vec<String> {
        self.errors().map(|error| error.message()).collect()
    }

    /// Reporte en forma de comentarios, apto como contenido del archivo
    /// de salida cuando la traducción falla.
    pub fn report(&self) -> String {
        let mut report = String::from("# Erros encontrados:\n");
        for message in self.messages() {
            report.push_str("# ");
            report.push_str(&message);
            report.push('\n');
        }

        report
    }
}

impl<E: PhaseError> From<Located<E>> for Diagnostics {
    fn from(error: Located<E>) -> Self {
        Diagnostics::from(vec![error])
    }
}

impl<E: PhaseError> From<Vec<Located<E>>> for Diagnostics {
    fn from(errors: Vec<Located<E>>) -> Self {
        let errors = errors
            .into_iter()
            .map(|error| {
                let error: Box<dyn LocatedError> = Box::new(error);
                error
            })
            .collect();

        Diagnostics {
            errors,
            source: None,
        }
    }
}

impl Display for Diagnostics {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.errors.is_empty() {
            return writeln!(fmt, "Nenhum erro encontrado");
        }

        for error in self.errors() {
            writeln!(fmt, "{}: {}", error.phase().describe(), error.source())?;

            let position = error.position();
            let name = self.source.as_ref().map_or("<entrada>", Source::name);
            writeln!(fmt, " --> {}:{}", name, position)?;

            let line = self
                .source
                .as_ref()
                .and_then(|source| source.line(position.line()));

            if let Some(line) = line {
                let digits = position.line().to_string().chars().count();
                writeln!(fmt, "{:digits$} |", "", digits = digits)?;
                writeln!(fmt, "{} | {}", position.line(), line)?;
                writeln!(
                    fmt,
                    "{:digits$} | {:skip$}^",
                    "",
                    "",
                    digits = digits,
                    skip = position.column() as usize
                )?;
            }

            writeln!(fmt)?;
        }

        let error_or_errors = if self.errors.len() == 1 { "erro" } else { "erros" };
        writeln!(
            fmt,
            "Tradução falhou com {} {}",
            self.errors.len(),
            error_or_errors
        )
    }
}

impl Debug for Diagnostics {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt.debug_list().entries(self.messages()).finish()
    }
}

impl Error for Diagnostics {}

/// Escribe un reporte de análisis sintático.
///
/// Solo los errores sintácticos y semánticos forman parte del reporte;
/// los léxicos corresponden al listado de tokens.
pub fn write_syntax_report<W: Write>(
    output: &mut W,
    name: &str,
    diagnostics: Option<&Diagnostics>,
) -> io::Result<()> {
    const RULE: &str = "----------------------------------------";

    writeln!(output, "Análise Sintática - Arquivo: {}", name)?;
    writeln!(output, "{}", RULE)?;

    let messages: Vec<_> = diagnostics
        .into_iter()
        .flat_map(Diagnostics::errors)
        .filter(|error| error.phase() != Phase::Lexical)
        .map(|error| error.message())
        .collect();

    if messages.is_empty() {
        writeln!(output, "Análise sintática terminada sem erros.")?;
    } else {
        writeln!(output, "Erros sintáticos encontrados:")?;
        for message in messages {
            writeln!(output, "{}", message)?;
        }
    }

    writeln!(output, "{}", RULE)
}

impl<E: PhaseError> sealed::Sealed for Located<E> {}

impl<E: PhaseError> LocatedError for Located<E> {
    fn source(&self) -> &dyn Error {
        self.as_ref()
    }

    fn position(&self) -> Position {
        Located::position(self)
    }

    fn phase(&self) -> Phase {
        E::PHASE
    }
}
