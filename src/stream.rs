//! Contrato de flujo de tokens.
//!
//! Entre el escáner y el traductor los tokens viajan en memoria, como
//! cualquier iterador que cumpla [`TokenStream`]. Como artefacto de
//! depuración e interoperabilidad existe además una codificación
//! textual, un token por línea:
//!
//! ```text
//! T_ID | X | linha 1 | coluna 15
//! ```
//!
//! La decodificación es permisiva: líneas vacías, líneas que no se
//! dividen en exactamente cuatro campos, clases desconocidas y campos
//! de posición que no tienen la forma `linha N` / `coluna M` se
//! descartan en silencio.
//!
//! # Limitaciones conocidas
//! No existe escape del delimitador. Un lexema que contenga ` | ` o un
//! salto de línea (posible en literales de string) no sobrevive la
//! codificación. Un lexema que termina en ` |` se codifica de forma
//! ambigua; su línea se descarta al decodificar en lugar de producir
//! un token distinto.

use crate::{
    lex::{LexerError, Token, TokenKind},
    source::{Located, Position},
};

use std::io::{self, Write};

/// Delimitador de campos.
const SEPARATOR: &str = " | ";

/// Divisor de secciones en listados.
const RULE: &str = "----------------------------------------";

/// Inicio de la línea final de un listado con error léxico.
const ERROR_PREFIX: &str = "Erro encontrado: Erro Léxico na linha ";

/// Cualquier secuencia de tokens consumible por el traductor,
/// independientemente de cómo fue producida.
pub trait TokenStream: Iterator<Item = Token> {}

impl<I: Iterator<Item = Token>> TokenStream for I {}

/// Codifica un token en su forma textual de una línea.
pub fn encode(token: &Token) -> String {
    token.to_string()
}

/// Decodifica una línea, o `None` si no corresponde a un token.
pub fn decode_line(line: &str) -> Option<Token> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    let fields: Vec<_> = line.split(SEPARATOR).collect();
    let (kind, lexeme, line, column) = match fields[..] {
        [kind, lexeme, line, column] => (kind, lexeme, line, column),
        _ => return None,
    };

    let kind = kind.parse::<TokenKind>().ok()?;
    let line = line.strip_prefix("linha ")?.parse().ok()?;
    let column = column.strip_prefix("coluna ")?.parse().ok()?;

    Some(Token::new(kind, lexeme, Position::new(line, column)))
}

/// Decodifica un texto completo, omitiendo las líneas que no son tokens.
pub fn decode(text: &str) -> Vec<Token> {
    text.lines().filter_map(decode_line).collect()
}

/// Recupera el error léxico informado al final de un listado.
pub fn decode_error(text: &str) -> Option<Located<LexerError>> {
    let report = text.lines().rev().find_map(|line| line.strip_prefix(ERROR_PREFIX))?;
    let (line, rest) = report.split_once(", coluna ")?;
    let (column, message) = rest.split_once(": ")?;
    let position = Position::new(line.parse().ok()?, column.parse().ok()?);

    let unterminated = LexerError::UnterminatedString;
    let error = match message.chars().last() {
        Some(c) if LexerError::BadChar(c).to_string() == message => LexerError::BadChar(c),
        _ if unterminated.to_string() == message => unterminated,
        _ => return None,
    };

    Some(Located::at(error, position))
}

/// Escribe un listado de análisis léxico.
///
/// El listado incluye un encabezado con el nombre del origen, los
/// tokens producidos y una línea final que indica el error léxico,
/// si lo hubo. Un listado es decodificable con [`decode`].
pub fn write_listing<W: Write>(
    output: &mut W,
    name: &str,
    tokens: &[Token],
    error: Option<&Located<LexerError>>,
) -> io::Result<()> {
    writeln!(output, "Análise Léxica - Arquivo: {}", name)?;
    writeln!(output, "{}", RULE)?;

    for token in tokens {
        writeln!(output, "{}", encode(token))?;
    }

    writeln!(output, "{}", RULE)?;
    match error {
        Some(error) => {
            let position = error.position();
            writeln!(
                output,
                "{}{}, coluna {}: {}",
                ERROR_PREFIX,
                position.line(),
                position.column(),
                error.val()
            )
        }

        None => writeln!(output, "Análise léxica terminada sem erros."),
    }
}
