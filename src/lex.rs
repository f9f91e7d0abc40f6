//! Análisis léxico.
//!
//! # Tokenization
//! Esta es la primera fase del traductor. Descompone un [`Source`]
//! (texto fuente dispuesto en líneas) en unidades léxicas denominadas
//! tokens. Los espacios en blanco se descartan durante esta operación.
//! Cada token emitido conserva su lexema exacto y la posición donde
//! comienza, lo cual permite rastrear errores tanto en el token como
//! en constructos de fases posteriores.
//!
//! # Modelo de tokens
//! El conjunto de clases de token ([`TokenKind`]) es cerrado y se
//! comparte tal cual entre todas las fases. Cada clase tiene un nombre
//! textual fijo (`T_ENOIS`, `T_SETA`, ...) que es el que aparece en
//! listados de tokens y mensajes de error.
//!
//! # Reglas importantes del lenguaje
//! - Las palabras clave son case-insensitive: `énois`, `Énois` y `ÉNOIS`
//!   resultan en [`TokenKind::Enois`].
//! - Los identificadores conservan su capitalización original.
//! - Las palabras pueden incluir letras acentuadas de una lista fija.
//! - Los literales de string no procesan secuencias de escape.
//!
//! # Errores
//! El primer error léxico es terminal: el lexer emite un token
//! [`TokenKind::ErroLex`] y no produce más tokens. El error se conserva
//! y puede consultarse con [`Lexer::error()`].

use crate::source::{Located, Position, Source};
use std::{
    fmt::{self, Display},
    str::FromStr,
};

use log::trace;
use thiserror::Error;
use unicase::UniCase;

/// Letras acentuadas admitidas en palabras, además de ASCII.
const ACCENTED: &str = "ÉÁÍÓÚÃÇÕÊÂÔÀÑéáíóúãçõêâôàñ";

/// Lexema del token de fin de fuente.
pub const EOF_LEXEME: &str = "<EOF>";

/// Error de escaneo.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LexerError {
    /// Un literal de string llegó al fin de la fuente sin cerrarse.
    #[error("String não fechada")]
    UnterminatedString,

    /// Carácter desconocido o inesperado en la entrada.
    #[error("símbolo inválido: {0}")]
    BadChar(char),
}

/// Clase léxica de un token.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Enois,
    Partiu,
    Bagulhos,
    Virgula,
    PontoVirgula,
    Sepa,
    NaoFoi,
    FimSepa,
    MandaEnquanto,
    ParaManda,
    MandaLembrar,
    Seta,
    AteAliLa,
    Desencana,
    Olha,
    AbrePar,
    FechaPar,
    Fala,
    Maior,
    Menor,
    MaiorIgual,
    MenorIgual,
    Igual,
    Diferente,
    Mais,
    Menos,
    Vezes,
    Dividido,
    Resto,
    Elevado,
    Numero,
    Id,
    Str,
    FimFonte,
    ErroLex,
    Nulo,
}

/// Nombre textual de cada clase, en el orden de declaración.
const KIND_NAMES: &[(&str, TokenKind)] = &[
    ("T_ENOIS",         TokenKind::Enois),
    ("T_PARTIU",        TokenKind::Partiu),
    ("T_BAGULHOS",      TokenKind::Bagulhos),
    ("T_VIRGULA",       TokenKind::Virgula),
    ("T_PONTO_VIRGULA", TokenKind::PontoVirgula),
    ("T_SEPA",          TokenKind::Sepa),
    ("T_NAOFOI",        TokenKind::NaoFoi),
    ("T_FIMSEPA",       TokenKind::FimSepa),
    ("T_MANDAENQUANTO", TokenKind::MandaEnquanto),
    ("T_PARAMANDA",     TokenKind::ParaManda),
    ("T_MANDALEMBRAR",  TokenKind::MandaLembrar),
    ("T_SETA",          TokenKind::Seta),
    ("T_ATEALILA",      TokenKind::AteAliLa),
    ("T_DESENCANA",     TokenKind::Desencana),
    ("T_OLHA",          TokenKind::Olha),
    ("T_ABRE_PAR",      TokenKind::AbrePar),
    ("T_FECHA_PAR",     TokenKind::FechaPar),
    ("T_FALA",          TokenKind::Fala),
    ("T_MAIOR",         TokenKind::Maior),
    ("T_MENOR",         TokenKind::Menor),
    ("T_MAIOR_IGUAL",   TokenKind::MaiorIgual),
    ("T_MENOR_IGUAL",   TokenKind::MenorIgual),
    ("T_IGUAL",         TokenKind::Igual),
    ("T_DIFERENTE",     TokenKind::Diferente),
    ("T_MAIS",          TokenKind::Mais),
    ("T_MENOS",         TokenKind::Menos),
    ("T_VEZES",         TokenKind::Vezes),
    ("T_DIVIDIDO",      TokenKind::Dividido),
    ("T_RESTO",         TokenKind::Resto),
    ("T_ELEVADO",       TokenKind::Elevado),
    ("T_NUMERO",        TokenKind::Numero),
    ("T_ID",            TokenKind::Id),
    ("T_STRING",        TokenKind::Str),
    ("T_FIM_FONTE",     TokenKind::FimFonte),
    ("T_ERRO_LEX",      TokenKind::ErroLex),
    ("T_NULO",          TokenKind::Nulo),
];

/// Palabras reservadas, en su forma canónica en mayúscula.
const KEYWORDS: &[(&str, TokenKind)] = &[
    ("ÉNOIS",         TokenKind::Enois),
    ("PARTIU",        TokenKind::Partiu),
    ("BAGULHOS",      TokenKind::Bagulhos),
    ("SEPA",          TokenKind::Sepa),
    ("NÃOFOI",        TokenKind::NaoFoi),
    ("FIMSEPA",       TokenKind::FimSepa),
    ("MANDAENQUANTO", TokenKind::MandaEnquanto),
    ("PARAMANDA",     TokenKind::ParaManda),
    ("MANDALEMBRAR",  TokenKind::MandaLembrar),
    ("ATEALILA",      TokenKind::AteAliLa),
    ("DESENCANA",     TokenKind::Desencana),
    ("OLHA",          TokenKind::Olha),
    ("FALA",          TokenKind::Fala),
];

impl TokenKind {
    /// Todas las clases, en orden de declaración.
    pub fn all() -> impl Iterator<Item = TokenKind> {
        KIND_NAMES.iter().map(|&(_, kind)| kind)
    }

    /// Nombre textual exacto de la clase.
    pub fn name(self) -> &'static str {
        KIND_NAMES
            .iter()
            .find(|&&(_, kind)| kind == self)
            .map(|&(name, _)| name)
            .unwrap_or("T_NULO")
    }

    /// Busca una palabra reservada. La comparación ignora mayúsculas.
    pub fn keyword(word: &str) -> Option<TokenKind> {
        let word = UniCase::new(word);
        KEYWORDS
            .iter()
            .find(|&&(name, _)| UniCase::new(name) == word)
            .map(|&(_, kind)| kind)
    }

    /// Determina si la clase cierra el flujo de tokens.
    pub fn is_terminal(self) -> bool {
        matches!(self, TokenKind::FimFonte | TokenKind::ErroLex)
    }
}

impl Display for TokenKind {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt.write_str(self.name())
    }
}

impl FromStr for TokenKind {
    type Err = ();

    fn from_str(string: &str) -> Result<Self, Self::Err> {
        KIND_NAMES
            .iter()
            .find(|&&(name, _)| name == string)
            .map(|&(_, kind)| kind)
            .ok_or(())
    }
}

/// Objeto resultante del análisis léxico.
///
/// Un token es inmutable una vez construido.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    kind: TokenKind,
    lexeme: String,
    position: Position,
}

impl Token {
    pub fn new<S: Into<String>>(kind: TokenKind, lexeme: S, position: Position) -> Self {
        Token {
            kind,
            lexeme: lexeme.into(),
            position,
        }
    }

    pub fn kind(&self) -> TokenKind {
        self.kind
    }

    pub fn lexeme(&self) -> &str {
        &self.lexeme
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn line(&self) -> u32 {
        self.position.line()
    }

    pub fn column(&self) -> u32 {
        self.position.column()
    }

    /// Reconstruye el error léxico que representa un token
    /// [`TokenKind::ErroLex`], o `None` para cualquier otra clase.
    ///
    /// Un símbolo inválido deja como lexema el carácter rechazado y una
    /// string sin cerrar deja el texto parcial. Un lexema de un solo
    /// carácter que no puede iniciar ningún token se lee como símbolo
    /// inválido; cualquier otro, como string sin cerrar.
    pub fn lexical_error(&self) -> Option<Located<LexerError>> {
        if self.kind != TokenKind::ErroLex {
            return None;
        }

        let mut chars = self.lexeme.chars();
        let error = match (chars.next(), chars.next()) {
            (Some(c), None) if !starts_token(c) => LexerError::BadChar(c),
            _ => LexerError::UnterminatedString,
        };

        Some(Located::at(error, self.position))
    }
}

impl Display for Token {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            fmt,
            "{} | {} | linha {} | coluna {}",
            self.kind,
            self.lexeme,
            self.line(),
            self.column()
        )
    }
}

/// Escáner de un solo sentido sobre un texto fuente.
///
/// El cursor (línea, columna) siempre señala el siguiente carácter
/// sin consumir. Al rebasar el largo de una línea, la columna vuelve
/// a cero y la línea avanza.
pub struct Lexer {
    lines: Vec<Vec<char>>,
    line: usize,
    column: usize,
    error: Option<Located<LexerError>>,
    terminal: Option<Token>,
}

impl Lexer {
    /// Crea un lexer con el cursor al inicio de la fuente.
    pub fn new(source: &Source) -> Self {
        Lexer {
            lines: source
                .lines()
                .iter()
                .map(|line| line.chars().collect())
                .collect(),
            line: 0,
            column: 0,
            error: None,
            terminal: None,
        }
    }

    /// Primer error léxico encontrado, si lo hubo.
    pub fn error(&self) -> Option<&Located<LexerError>> {
        self.error.as_ref()
    }

    /// Reduce la entrada completa a una secuencia de tokens,
    /// terminada en [`TokenKind::FimFonte`], o al primer error léxico.
    pub fn try_exhaustive(mut self) -> Result<Vec<Token>, Located<LexerError>> {
        let tokens: Vec<_> = self.by_ref().collect();
        match self.error {
            Some(error) => Err(error),
            None => Ok(tokens),
        }
    }

    /// Produce el siguiente token.
    ///
    /// Una vez emitido un token terminal, toda llamada posterior
    /// retorna ese mismo token.
    pub fn next_token(&mut self) -> Token {
        if let Some(terminal) = &self.terminal {
            return terminal.clone();
        }

        let token = self.lex();
        trace!("{}", token);

        if token.kind().is_terminal() {
            self.terminal = Some(token.clone());
        }

        token
    }

    fn lex(&mut self) -> Token {
        use TokenKind::*;

        while matches!(self.current(), Some(c) if c.is_whitespace()) {
            self.bump();
        }

        // La posición de inicio se toma antes de consumir el lexema
        let start = self.here();
        let c = match self.bump() {
            Some(c) => c,
            None => return Token::new(FimFonte, EOF_LEXEME, start),
        };

        let kind = match c {
            '"' => return self.string(start),
            c if is_word_start(c) => return self.word(c, start),
            c if c.is_ascii_digit() => return self.number(c, start),

            ',' => Virgula,
            ';' => PontoVirgula,
            '(' => AbrePar,
            ')' => FechaPar,
            '+' => Mais,
            '-' => Menos,
            '/' => Dividido,
            '%' => Resto,

            // Operadores de uno o dos caracteres, por lookahead
            '>' => self.follow(&[('=', MaiorIgual)], Maior),
            '<' => self.follow(&[('-', Seta), ('=', MenorIgual), ('>', Diferente)], Menor),
            '=' => self.follow(&[('=', Igual)], Igual),
            '*' => self.follow(&[('*', Elevado)], Vezes),

            bad => return self.fail(LexerError::BadChar(bad), bad.to_string(), start),
        };

        let lexeme = self.consumed_since(start);
        Token::new(kind, lexeme, start)
    }

    /// Literal de string, sin las comillas.
    fn string(&mut self, start: Position) -> Token {
        let mut lexeme = String::new();
        loop {
            match self.bump() {
                Some('"') => break Token::new(TokenKind::Str, lexeme, start),
                Some(c) => lexeme.push(c),
                None => break self.fail(LexerError::UnterminatedString, lexeme, start),
            }
        }
    }

    /// Identificador o palabra reservada.
    fn word(&mut self, first: char, start: Position) -> Token {
        let mut lexeme = first.to_string();
        while let Some(c) = self.current().filter(|&c| is_word_char(c)) {
            lexeme.push(c);
            self.bump();
        }

        let kind = TokenKind::keyword(&lexeme).unwrap_or(TokenKind::Id);
        Token::new(kind, lexeme, start)
    }

    /// Constante numérica, con parte decimal opcional.
    fn number(&mut self, first: char, start: Position) -> Token {
        let mut lexeme = first.to_string();
        self.digits(&mut lexeme);

        // Un punto sin dígitos a continuación no forma parte del número
        if self.current() == Some('.') && self.lookahead().map_or(false, |c| c.is_ascii_digit()) {
            lexeme.push('.');
            self.bump();
            self.digits(&mut lexeme);
        }

        Token::new(TokenKind::Numero, lexeme, start)
    }

    fn digits(&mut self, lexeme: &mut String) {
        while let Some(digit) = self.current().filter(char::is_ascii_digit) {
            lexeme.push(digit);
            self.bump();
        }
    }

    /// Extiende un operador de un carácter si le sigue alguno de los
    /// caracteres indicados en la misma línea.
    fn follow(&mut self, options: &[(char, TokenKind)], otherwise: TokenKind) -> TokenKind {
        let next = self.lines[self.line].get(self.column).copied();
        match options.iter().find(|&&(c, _)| Some(c) == next) {
            Some(&(_, kind)) => {
                self.column += 1;
                kind
            }

            None => otherwise,
        }
    }

    fn fail(&mut self, error: LexerError, lexeme: String, start: Position) -> Token {
        if self.error.is_none() {
            self.error = Some(Located::at(error, start));
        }

        Token::new(TokenKind::ErroLex, lexeme, start)
    }

    /// Texto consumido desde `start`, que debe estar en la línea actual.
    fn consumed_since(&self, start: Position) -> String {
        let line = start.line() as usize - 1;
        self.lines[line][start.column() as usize..self.column]
            .iter()
            .collect()
    }

    /// Normaliza el cursor y observa el carácter bajo el mismo.
    fn current(&mut self) -> Option<char> {
        loop {
            let line = self.lines.get(self.line)?;
            match line.get(self.column) {
                Some(&c) => break Some(c),
                None => {
                    self.line += 1;
                    self.column = 0;
                }
            }
        }
    }

    /// Carácter siguiente al actual, sin salir de la línea.
    fn lookahead(&self) -> Option<char> {
        self.lines
            .get(self.line)
            .and_then(|line| line.get(self.column + 1))
            .copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.current()?;
        self.column += 1;
        Some(c)
    }

    fn here(&mut self) -> Position {
        self.current();
        Position::new(self.line as u32 + 1, self.column as u32)
    }
}

impl Iterator for Lexer {
    type Item = Token;

    fn next(&mut self) -> Option<Self::Item> {
        if self.terminal.is_some() {
            None
        } else {
            Some(self.next_token())
        }
    }
}

/// Determina si un carácter puede iniciar una palabra.
fn is_word_start(c: char) -> bool {
    c.is_ascii_alphabetic() || ACCENTED.contains(c)
}

/// Determina si un carácter es aceptado al inicio de un token.
fn starts_token(c: char) -> bool {
    matches!(c, '"' | ',' | ';' | '(' | ')' | '+' | '-' | '/' | '%' | '>' | '<' | '=' | '*')
        || c.is_whitespace()
        || c.is_ascii_digit()
        || is_word_start(c)
}

/// Determina si un carácter puede pertenecer a una palabra.
fn is_word_char(c: char) -> bool {
    is_word_start(c) || c.is_ascii_digit() || c == '_'
}
