//! Análisis sintáctico dirigido por sintaxis.
//!
//! Parser descendente recursivo, sin retroceso, con un procedimiento
//! por no terminal. En puntos fijos de cada producción se disparan las
//! acciones semánticas de [`Session`], de modo que el análisis
//! sintáctico, el semántico y la generación de código ocurren en una
//! sola pasada.
//!
//! ```text
//! program      → ÉNOIS declarations block PARTIU
//! declarations → [ BAGULHOS id (',' id)* ';' ]
//! block        → command*
//! command      → assignment | if | while | for | read | write
//! condition    → expression relop expression
//! expression   → term (('+' | '-') term)*
//! term         → factor (('*' | '/' | '%') factor)*
//! factor       → '-' factor | base ('**' base)*
//! base         → id | number | '(' expression ')'
//! ```
//!
//! # Errores
//! No hay recuperación. El primer `expect` fallido registra un error y
//! la falla se propaga hasta la raíz. Un error semántico también aborta
//! la traducción completa.

use std::iter::Peekable;
use thiserror::Error;

use crate::{
    emit::Emitter,
    error::Diagnostics,
    lex::{Token, TokenKind, EOF_LEXEME},
    semantic::{ArithOp, RelOp, SemanticError, Session},
    source::{Located, Position},
    stream::TokenStream,
};

/// Error sintáctico.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParserError {
    #[error("Esperado {expected}, encontrado {found} ({lexeme})")]
    UnexpectedToken {
        expected: TokenKind,
        found: TokenKind,
        lexeme: String,
    },

    #[error("Esperado operador relacional, encontrado {0}")]
    ExpectedRelational(TokenKind),

    #[error("Esperado número, identificador ou '(', encontrado {0}")]
    ExpectedOperand(TokenKind),

    #[error("Comando inválido: {0} ({1})")]
    InvalidCommand(TokenKind, String),

    #[error("Esperado fim do arquivo, encontrado {0}")]
    TrailingInput(TokenKind),
}

/// Traduce un flujo de tokens a un programa emitido.
///
/// El flujo puede provenir directamente del lexer o de un listado
/// decodificado. Si se agota sin un token de fin de fuente, se
/// asume uno en la última posición conocida. Un token
/// [`TokenKind::ErroLex`] en cualquier punto del flujo impide la
/// traducción y se reporta como error léxico.
pub fn translate<I>(tokens: I) -> Result<Emitter, Diagnostics>
where
    I: IntoIterator,
    I::IntoIter: TokenStream,
{
    let tokens: Vec<_> = tokens.into_iter().collect();
    if let Some(error) = tokens.iter().find_map(Token::lexical_error) {
        return Err(Diagnostics::from(error));
    }

    let mut parser = Parser {
        tokens: tokens.into_iter().peekable(),
        last_known: Position::default(),
        session: Session::new(),
    };

    let result = parser.program();
    let (program, errors) = parser.session.finish();

    match result {
        Ok(()) if errors.is_empty() => Ok(program),
        Ok(()) | Err(Failure::Syntax) => Err(Diagnostics::from(errors)),

        Err(Failure::Semantic(error)) => {
            let mut diagnostics = Diagnostics::from(errors);
            diagnostics.push(error);
            Err(diagnostics)
        }
    }
}

struct Parser<I: TokenStream> {
    tokens: Peekable<I>,
    last_known: Position,
    session: Session,
}

/// Causa por la cual se abortó una producción.
enum Failure {
    /// El error ya fue registrado en la sesión.
    Syntax,

    Semantic(Located<SemanticError>),
}

impl From<Located<SemanticError>> for Failure {
    fn from(error: Located<SemanticError>) -> Self {
        Failure::Semantic(error)
    }
}

type Parse<T> = Result<T, Failure>;

impl<I: TokenStream> Parser<I> {
    fn program(&mut self) -> Parse<()> {
        self.expect(TokenKind::Enois)?;
        self.declarations()?;

        self.session.begin_program();
        self.block()?;

        self.expect(TokenKind::Partiu)?;
        self.session.end_program();

        let trailing = self.current();
        if trailing.kind() != TokenKind::FimFonte {
            return self.fail(
                ParserError::TrailingInput(trailing.kind()),
                trailing.position(),
            );
        }

        Ok(())
    }

    fn declarations(&mut self) -> Parse<()> {
        if self.peek_kind() != TokenKind::Bagulhos {
            return Ok(());
        }

        self.next();
        self.declaration()?;
        while self.peek_kind() == TokenKind::Virgula {
            self.next();
            self.declaration()?;
        }

        self.expect(TokenKind::PontoVirgula)?;
        Ok(())
    }

    fn declaration(&mut self) -> Parse<()> {
        let id = self.expect(TokenKind::Id)?;
        self.session.declare(&id)?;

        Ok(())
    }

    fn block(&mut self) -> Parse<()> {
        let mut empty = true;
        while starts_command(self.peek_kind()) {
            self.command()?;
            empty = false;
        }

        if empty {
            self.session.empty_block();
        }

        Ok(())
    }

    fn command(&mut self) -> Parse<()> {
        match self.peek_kind() {
            TokenKind::Id => self.assignment(),
            TokenKind::Sepa => self.if_command(),
            TokenKind::MandaEnquanto => self.while_command(),
            TokenKind::MandaLembrar => self.for_command(),
            TokenKind::Olha => self.read_command(),
            TokenKind::Fala => self.write_command(),

            _ => {
                let found = self.current();
                let error = ParserError::InvalidCommand(found.kind(), found.lexeme().to_owned());
                self.fail(error, found.position())
            }
        }
    }

    fn assignment(&mut self) -> Parse<()> {
        self.target()?;
        self.expect(TokenKind::Seta)?;
        self.expression()?;
        self.session.assign()?;
        self.expect(TokenKind::PontoVirgula)?;

        Ok(())
    }

    fn if_command(&mut self) -> Parse<()> {
        self.expect(TokenKind::Sepa)?;
        self.parenthesized_condition()?;
        self.session.begin_if()?;
        self.block()?;

        if self.peek_kind() == TokenKind::NaoFoi {
            self.next();
            self.session.begin_else();
            self.block()?;
        }

        self.session.end_block();
        self.expect(TokenKind::FimSepa)?;

        Ok(())
    }

    fn while_command(&mut self) -> Parse<()> {
        self.expect(TokenKind::MandaEnquanto)?;
        self.parenthesized_condition()?;
        self.session.begin_while()?;
        self.block()?;
        self.session.end_block();
        self.expect(TokenKind::ParaManda)?;

        Ok(())
    }

    fn for_command(&mut self) -> Parse<()> {
        self.expect(TokenKind::MandaLembrar)?;
        self.expect(TokenKind::AbrePar)?;

        // Variable y valor inicial
        self.target()?;
        self.expect(TokenKind::Seta)?;
        self.expression()?;
        self.expect(TokenKind::PontoVirgula)?;

        self.condition()?;
        self.expect(TokenKind::PontoVirgula)?;

        // Incremento; su destino se verifica pero no se apila
        let step = self.expect(TokenKind::Id)?;
        self.session.check(&step)?;
        self.expect(TokenKind::Seta)?;
        self.expression()?;
        self.expect(TokenKind::FechaPar)?;

        self.session.begin_for()?;
        self.block()?;
        self.session.end_block();
        self.expect(TokenKind::Desencana)?;

        Ok(())
    }

    fn read_command(&mut self) -> Parse<()> {
        self.expect(TokenKind::Olha)?;
        self.expect(TokenKind::AbrePar)?;
        self.target()?;
        self.session.read()?;
        self.expect(TokenKind::FechaPar)?;
        self.expect(TokenKind::PontoVirgula)?;

        Ok(())
    }

    fn write_command(&mut self) -> Parse<()> {
        self.expect(TokenKind::Fala)?;
        self.expect(TokenKind::AbrePar)?;

        if self.peek_kind() == TokenKind::Str {
            let string = self.next();
            self.session.string(&string);
        } else {
            self.expression()?;
        }

        self.session.write()?;
        self.expect(TokenKind::FechaPar)?;
        self.expect(TokenKind::PontoVirgula)?;

        Ok(())
    }

    fn parenthesized_condition(&mut self) -> Parse<()> {
        self.expect(TokenKind::AbrePar)?;
        self.condition()?;
        self.expect(TokenKind::FechaPar)?;

        Ok(())
    }

    fn condition(&mut self) -> Parse<()> {
        self.expression()?;

        let found = self.current();
        let op = match RelOp::from_kind(found.kind()) {
            Some(op) => op,
            None => {
                return self.fail(
                    ParserError::ExpectedRelational(found.kind()),
                    found.position(),
                )
            }
        };

        self.next();
        self.expression()?;
        self.session.compare(op)?;

        Ok(())
    }

    fn expression(&mut self) -> Parse<()> {
        self.term()?;
        while let Some(op) = additive(self.peek_kind()) {
            self.next();
            self.term()?;
            self.session.arithmetic(op)?;
        }

        Ok(())
    }

    fn term(&mut self) -> Parse<()> {
        self.factor()?;
        while let Some(op) = multiplicative(self.peek_kind()) {
            self.next();
            self.factor()?;
            self.session.arithmetic(op)?;
        }

        Ok(())
    }

    fn factor(&mut self) -> Parse<()> {
        if self.peek_kind() == TokenKind::Menos {
            self.next();
            self.factor()?;
            self.session.negate()?;

            return Ok(());
        }

        // La potencia se reduce de izquierda a derecha
        self.base()?;
        while self.peek_kind() == TokenKind::Elevado {
            self.next();
            self.base()?;
            self.session.arithmetic(ArithOp::Pow)?;
        }

        Ok(())
    }

    fn base(&mut self) -> Parse<()> {
        match self.peek_kind() {
            TokenKind::Id => {
                let id = self.next();
                self.session.reference(&id)?;
            }

            TokenKind::Numero => {
                let number = self.next();
                self.session.number(&number);
            }

            TokenKind::AbrePar => {
                self.next();
                self.expression()?;
                self.expect(TokenKind::FechaPar)?;
                self.session.group()?;
            }

            _ => {
                let found = self.current();
                return self.fail(ParserError::ExpectedOperand(found.kind()), found.position());
            }
        }

        Ok(())
    }

    /// Variable en posición de destino.
    fn target(&mut self) -> Parse<()> {
        let id = self.expect(TokenKind::Id)?;
        self.session.reference(&id)?;

        Ok(())
    }

    fn expect(&mut self, expected: TokenKind) -> Parse<Token> {
        if self.peek_kind() == expected {
            return Ok(self.next());
        }

        let found = self.current();
        let error = ParserError::UnexpectedToken {
            expected,
            found: found.kind(),
            lexeme: found.lexeme().to_owned(),
        };

        self.fail(error, found.position())
    }

    fn peek_kind(&mut self) -> TokenKind {
        self.tokens
            .peek()
            .map_or(TokenKind::FimFonte, Token::kind)
    }

    /// Token actual, sin consumirlo.
    fn current(&mut self) -> Token {
        match self.tokens.peek() {
            Some(token) => token.clone(),
            None => self.eof(),
        }
    }

    fn next(&mut self) -> Token {
        match self.tokens.next() {
            Some(token) => {
                self.last_known = token.position();
                self.session.advance_to(token.position());
                token
            }

            None => self.eof(),
        }
    }

    fn eof(&self) -> Token {
        Token::new(TokenKind::FimFonte, EOF_LEXEME, self.last_known)
    }

    fn fail<T>(&mut self, error: ParserError, position: Position) -> Parse<T> {
        self.session.record(Located::at(error, position));
        Err(Failure::Syntax)
    }
}

fn starts_command(kind: TokenKind) -> bool {
    use TokenKind::*;
    matches!(kind, Id | Sepa | MandaEnquanto | MandaLembrar | Olha | Fala)
}

fn additive(kind: TokenKind) -> Option<ArithOp> {
    ArithOp::from_kind(kind).filter(|op| matches!(op, ArithOp::Add | ArithOp::Sub))
}

fn multiplicative(kind: TokenKind) -> Option<ArithOp> {
    ArithOp::from_kind(kind).filter(|op| matches!(op, ArithOp::Mul | ArithOp::Div | ArithOp::Mod))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::{LocatedError, Phase},
        lex::Lexer,
        source::Source,
        stream,
    };

    fn tokens(text: &str) -> Vec<Token> {
        Lexer::new(&Source::new("<test>", text))
            .try_exhaustive()
            .unwrap()
    }

    fn body(text: &str) -> Vec<String> {
        let program = translate(tokens(text)).unwrap();
        program
            .serialize()
            .lines()
            .skip(3)
            .take_while(|line| !line.is_empty())
            .map(String::from)
            .collect()
    }

    fn syntax_error(text: &str) -> String {
        let diagnostics = translate(tokens(text)).unwrap_err();
        assert_eq!(diagnostics.len(), 1);
        diagnostics.messages().remove(0)
    }

    #[test]
    fn precedence() {
        let program = translate(tokens(
            "ÉNOIS BAGULHOS A, B; A <- 1 + 2 * B - (A - B) % 3; PARTIU",
        ))
        .unwrap();

        assert!(program
            .serialize()
            .contains("\n    a = 1 + 2 * b - (a - b) % 3\n"));
    }

    #[test]
    fn negation() {
        let program = translate(tokens("ÉNOIS BAGULHOS X; X <- -X * -2 ** 2; PARTIU")).unwrap();
        assert!(program.serialize().contains("\n    x = -x * -2 ** 2\n"));
    }

    #[test]
    fn preamble_in_declaration_order() {
        assert_eq!(
            body("ÉNOIS BAGULHOS Beta, alfa; PARTIU"),
            vec!["    beta = 0", "    alfa = 0"]
        );
    }

    #[test]
    fn read_and_write() {
        let program = translate(tokens(
            "ÉNOIS BAGULHOS Idade; OLHA(Idade); FALA(\"Idade:\"); FALA(Idade + 1); PARTIU",
        ))
        .unwrap();

        let text = program.serialize();
        assert!(text.contains("    idade = int(input('Informe a variável idade: '))\n"));
        assert!(text.contains("    print(\"Idade:\")\n"));
        assert!(text.contains("    print(idade + 1)\n"));
    }

    #[test]
    fn while_loop() {
        let program = translate(tokens(
            "ÉNOIS BAGULHOS I; MANDAENQUANTO (I < 3) I <- I + 1; PARAMANDA PARTIU",
        ))
        .unwrap();

        assert!(program
            .serialize()
            .contains("    while i < 3:\n        i = i + 1\n\nif __name__"));
    }

    #[test]
    fn for_loop_bound() {
        let program = translate(tokens(
            "ÉNOIS BAGULHOS I, N; \
             MANDALEMBRAR (I <- 1; I <= N * 2; I <- I + 1) FALA(I); DESENCANA \
             MANDALEMBRAR (I <- 0; I > N; I <- I + 1) DESENCANA \
             PARTIU",
        ))
        .unwrap();

        let text = program.serialize();
        assert!(text.contains("    for i in range(1, n * 2 + 1):\n        print(i)\n"));
        assert!(text.contains("    for i in range(0, 10 + 1):\n        pass\n"));
    }

    #[test]
    fn for_loop_checks_step_target() {
        let diagnostics = translate(tokens(
            "ÉNOIS BAGULHOS I; MANDALEMBRAR (I <- 1; I < 3; J <- I + 1) DESENCANA PARTIU",
        ))
        .unwrap_err();

        assert_eq!(
            diagnostics.messages(),
            vec!["Erro semântico: Variável J não está declarada!, linha: 1"]
        );
    }

    #[test]
    fn nested_empty_blocks() {
        let program = translate(tokens(
            "ÉNOIS BAGULHOS X; SEPA (X == 0) NÃOFOI FIMSEPA PARTIU",
        ))
        .unwrap();

        assert!(program
            .serialize()
            .contains("    if x == 0:\n        pass\n    else:\n        pass\n"));
    }

    #[test]
    fn empty_program_gets_placeholder() {
        let program = translate(tokens("ÉNOIS PARTIU")).unwrap();
        assert_eq!(
            program.serialize(),
            "def main():\n    # Compilador C.R.I.A\n\n    pass\n\n\
             if __name__ == '__main__':\n    main()\n"
        );
    }

    #[test]
    fn unexpected_token() {
        assert_eq!(
            syntax_error("ÉNOIS BAGULHOS X;\nX <- 1\nPARTIU"),
            "Erro sintático na linha 3, coluna 0: Esperado T_PONTO_VIRGULA, encontrado T_PARTIU (PARTIU)"
        );
    }

    #[test]
    fn missing_relational_operator() {
        assert_eq!(
            syntax_error("ÉNOIS BAGULHOS X; SEPA (X) FIMSEPA PARTIU"),
            "Erro sintático na linha 1, coluna 25: Esperado operador relacional, encontrado T_FECHA_PAR"
        );
    }

    #[test]
    fn missing_operand() {
        assert_eq!(
            syntax_error("ÉNOIS BAGULHOS X; X <- * 2; PARTIU"),
            "Erro sintático na linha 1, coluna 23: Esperado número, identificador ou '(', encontrado T_VEZES"
        );
    }

    #[test]
    fn trailing_input() {
        assert_eq!(
            syntax_error("ÉNOIS PARTIU PARTIU"),
            "Erro sintático na linha 1, coluna 13: Esperado fim do arquivo, encontrado T_PARTIU"
        );
    }

    #[test]
    fn exhausted_stream_reads_as_end_of_source() {
        let mut tokens = tokens("ÉNOIS PARTIU");
        tokens.pop();

        assert!(translate(tokens).is_ok());
    }

    #[test]
    fn lexical_error_token_stops_translation() {
        let tokens = vec![
            Token::new(TokenKind::Enois, "ÉNOIS", Position::new(1, 0)),
            Token::new(TokenKind::ErroLex, "$", Position::new(1, 6)),
        ];

        let diagnostics = translate(tokens).unwrap_err();
        let phases: Vec<_> = diagnostics.errors().map(|error| error.phase()).collect();
        assert_eq!(phases, vec![Phase::Lexical]);
        assert_eq!(
            diagnostics.messages(),
            vec!["Erro Léxico na linha 1, coluna 6: símbolo inválido: $"]
        );
    }

    #[test]
    fn lexical_error_in_listing_stops_translation() {
        let source = Source::new("<test>", "ÉNOIS BAGULHOS X; X <- 1 $ 2; PARTIU");
        let mut lexer = Lexer::new(&source);
        let tokens: Vec<_> = lexer.by_ref().collect();

        let mut listing = Vec::new();
        stream::write_listing(&mut listing, source.name(), &tokens, lexer.error()).unwrap();
        let listing = String::from_utf8(listing).unwrap();

        let diagnostics = translate(stream::decode(&listing)).unwrap_err();
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics.errors().next().map(|error| error.phase()), Some(Phase::Lexical));
        assert_eq!(
            diagnostics.messages(),
            vec!["Erro Léxico na linha 1, coluna 25: símbolo inválido: $"]
        );
    }
}
