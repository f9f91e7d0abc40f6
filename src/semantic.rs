//! Acciones semánticas y generación de código.
//!
//! El análisis semántico ocurre en la misma pasada que el sintáctico.
//! En puntos fijos de cada producción, el parser invoca una acción de
//! [`Session`] que consulta la tabla de símbolos, manipula la pila de
//! operandos o agrega sentencias terminadas al [`Emitter`].
//!
//! # Pila de operandos
//! Cada expresión se traduce de abajo hacia arriba. Los terminales
//! (variables, números, strings) apilan un operando; cada operador
//! binario desapila exactamente dos operandos (primero el derecho) y
//! apila uno combinado. Cada operando es consumido exactamente por la
//! regla que lo necesita.
//!
//! # Capitalización
//! Todo fragmento de expresión se emite en minúscula, incluyendo los
//! nombres de variable. Los literales de string son la única excepción.
//!
//! Los nombres en minúscula no se contrastan con las palabras clave ni
//! con los builtins de Python: `BAGULHOS IF;` emite `if = 0`, que no es
//! Python válido, y una variable `PRINT` oculta a `print`.

use log::{debug, trace};
use thiserror::Error;

use crate::{
    emit::{Emitter, Line, BODY_DEPTH},
    lex::{Token, TokenKind},
    parse::ParserError,
    source::{Located, Position},
    symbols::SymbolTable,
};

/// Cota de iteración cuando la condición de un ciclo `MANDALEMBRAR`
/// no compara con `<=` ni `<`.
pub const DEFAULT_LOOP_BOUND: &str = "10";

/// Cantidad de líneas finales que se inspeccionan para decidir si el
/// cuerpo del programa quedó vacío.
pub const RECENT_WINDOW: usize = 5;

pub type Semantic<T> = Result<T, Located<SemanticError>>;

/// Error semántico.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SemanticError {
    #[error("Variável {0} já declarada!")]
    Redeclared(String),

    #[error("Variável {0} não está declarada!")]
    Undeclared(String),

    /// La pila de operandos no contenía lo que una regla esperaba.
    #[error("Pilha semântica vazia")]
    MissingOperand,
}

/// Operador aritmético.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
}

impl ArithOp {
    pub fn from_kind(kind: TokenKind) -> Option<Self> {
        use ArithOp::*;

        match kind {
            TokenKind::Mais => Some(Add),
            TokenKind::Menos => Some(Sub),
            TokenKind::Vezes => Some(Mul),
            TokenKind::Dividido => Some(Div),
            TokenKind::Resto => Some(Mod),
            TokenKind::Elevado => Some(Pow),
            _ => None,
        }
    }

    /// Operador equivalente en Python.
    pub fn symbol(self) -> &'static str {
        use ArithOp::*;

        match self {
            Add => "+",
            Sub => "-",
            Mul => "*",
            Div => "//",
            Mod => "%",
            Pow => "**",
        }
    }
}

/// Operador relacional.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RelOp {
    Greater,
    Less,
    GreaterOrEqual,
    LessOrEqual,
    Equal,
    NotEqual,
}

impl RelOp {
    pub fn from_kind(kind: TokenKind) -> Option<Self> {
        use RelOp::*;

        match kind {
            TokenKind::Maior => Some(Greater),
            TokenKind::Menor => Some(Less),
            TokenKind::MaiorIgual => Some(GreaterOrEqual),
            TokenKind::MenorIgual => Some(LessOrEqual),
            TokenKind::Igual => Some(Equal),
            TokenKind::Diferente => Some(NotEqual),
            _ => None,
        }
    }

    /// Operador equivalente en Python.
    pub fn symbol(self) -> &'static str {
        use RelOp::*;

        match self {
            Greater => ">",
            Less => "<",
            GreaterOrEqual => ">=",
            LessOrEqual => "<=",
            Equal => "==",
            NotEqual => "!=",
        }
    }
}

/// Regla que produjo un operando.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OperandKind {
    Variable,
    Number,
    Str,
    Group,
    Negation,
    Arithmetic(ArithOp),

    /// Se conserva el lado derecho para deducir cotas de ciclos.
    Comparison { op: RelOp, rhs: String },
}

/// Fragmento de expresión parcialmente traducido.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Operand {
    code: String,
    kind: OperandKind,
}

impl Operand {
    pub fn new<S: Into<String>>(code: S, kind: OperandKind) -> Self {
        Operand {
            code: code.into(),
            kind,
        }
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn kind(&self) -> &OperandKind {
        &self.kind
    }

    /// Fragmento tal como se emite: en minúscula, salvo strings.
    pub fn emitted(&self) -> String {
        match self.kind {
            OperandKind::Str => self.code.clone(),
            _ => self.code.to_lowercase(),
        }
    }

    /// Fragmento apto para ser operando izquierdo de `op`.
    ///
    /// La potencia del lenguaje asocia a la izquierda, mientras que la
    /// de Python asocia a la derecha.
    fn as_left_of(&self, op: ArithOp) -> String {
        let grouped = matches!(
            (op, &self.kind),
            (ArithOp::Pow, OperandKind::Arithmetic(ArithOp::Pow))
                | (ArithOp::Pow, OperandKind::Negation)
        );

        if grouped {
            format!("({})", self.emitted())
        } else {
            self.emitted()
        }
    }
}

/// Pila de operandos (pila de atributos).
#[derive(Debug, Default)]
pub struct OperandStack(Vec<Operand>);

impl OperandStack {
    pub fn push(&mut self, operand: Operand) {
        trace!("push {:?}", operand);
        self.0.push(operand);
    }

    pub fn pop(&mut self) -> Option<Operand> {
        self.0.pop()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Deduce la cota superior de un ciclo `MANDALEMBRAR` a partir de su
/// condición.
///
/// Solo se reconocen comparaciones `<=` y `<`, cuyo lado derecho se
/// toma como cota inclusiva. Cualquier otra condición produce
/// [`DEFAULT_LOOP_BOUND`].
pub fn loop_bound(condition: &Operand) -> String {
    match condition.kind() {
        OperandKind::Comparison {
            op: RelOp::LessOrEqual,
            rhs,
        }
        | OperandKind::Comparison { op: RelOp::Less, rhs } => rhs.clone(),

        _ => DEFAULT_LOOP_BOUND.to_owned(),
    }
}

/// Estado de una única traducción.
///
/// Toda traducción construye su propia sesión; nada se comparte entre
/// ejecuciones.
#[derive(Debug, Default)]
pub struct Session {
    symbols: SymbolTable,
    operands: OperandStack,
    program: Emitter,
    errors: Vec<Located<ParserError>>,
    position: Position,
}

impl Session {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    pub fn operands(&self) -> &OperandStack {
        &self.operands
    }

    pub fn program(&self) -> &Emitter {
        &self.program
    }

    /// Errores sintácticos acumulados.
    pub fn errors(&self) -> &[Located<ParserError>] {
        &self.errors
    }

    /// Registra un error sintáctico.
    pub fn record(&mut self, error: Located<ParserError>) {
        debug!("{}: {}", error.position(), error.val());
        self.errors.push(error);
    }

    /// Actualiza la posición del último token consumido.
    pub fn advance_to(&mut self, position: Position) {
        self.position = position;
    }

    /// Descompone la sesión en el programa emitido y los errores sintácticos.
    pub fn finish(self) -> (Emitter, Vec<Located<ParserError>>) {
        (self.program, self.errors)
    }

    /// Inicio del programa: punto de entrada y preámbulo de variables.
    pub fn begin_program(&mut self) {
        self.program.append(Line::entry("def main():"), 0);
        self.program.set_depth(BODY_DEPTH);
        self.program.emit(Line::comment("Compilador C.R.I.A"));
        self.program.emit(Line::blank());

        for symbol in self.symbols.iter() {
            let init = format!("{} = 0", symbol.name().to_lowercase());
            self.program.emit(Line::statement(init));
        }

        if !self.symbols.is_empty() {
            self.program.emit(Line::blank());
        }

        self.symbols.initialize_all();
    }

    /// Fin del programa: relleno de cuerpo vacío e invocación de `main()`.
    pub fn end_program(&mut self) {
        if !self.program.has_recent_statement(RECENT_WINDOW) {
            self.program.emit(Line::placeholder());
        }

        self.program.set_depth(0);
        self.program.emit(Line::blank());
        self.program.emit(Line::entry("if __name__ == '__main__':"));
        self.program.append(Line::entry("main()"), 1);
    }

    /// Declaración de una variable.
    pub fn declare(&mut self, id: &Token) -> Semantic<()> {
        self.symbols.declare(id.lexeme(), id.position())?;
        Ok(())
    }

    /// Verifica que una variable esté declarada, sin apilarla.
    pub fn check(&self, id: &Token) -> Semantic<()> {
        self.symbols.lookup(id.lexeme(), id.position())?;
        Ok(())
    }

    /// Uso de una variable, ya sea como destino o dentro de una expresión.
    pub fn reference(&mut self, id: &Token) -> Semantic<()> {
        self.check(id)?;
        self.push(Operand::new(id.lexeme(), OperandKind::Variable));
        Ok(())
    }

    /// Constante numérica, tal cual.
    pub fn number(&mut self, number: &Token) {
        self.push(Operand::new(number.lexeme(), OperandKind::Number));
    }

    /// Literal de string como argumento de `FALA`.
    pub fn string(&mut self, string: &Token) {
        let code = format!("\"{}\"", string.lexeme());
        self.push(Operand::new(code, OperandKind::Str));
    }

    /// Subexpresión entre paréntesis.
    pub fn group(&mut self) -> Semantic<()> {
        let inner = self.pop()?;
        self.push(Operand::new(
            format!("({})", inner.emitted()),
            OperandKind::Group,
        ));

        Ok(())
    }

    /// Menos unario.
    pub fn negate(&mut self) -> Semantic<()> {
        let inner = self.pop()?;
        self.push(Operand::new(
            format!("-{}", inner.emitted()),
            OperandKind::Negation,
        ));

        Ok(())
    }

    /// Operador aritmético binario.
    pub fn arithmetic(&mut self, op: ArithOp) -> Semantic<()> {
        let right = self.pop()?;
        let left = self.pop()?;

        let code = format!("{} {} {}", left.as_left_of(op), op.symbol(), right.emitted());
        self.push(Operand::new(code, OperandKind::Arithmetic(op)));

        Ok(())
    }

    /// Operador relacional binario.
    pub fn compare(&mut self, op: RelOp) -> Semantic<()> {
        let right = self.pop()?;
        let left = self.pop()?;

        let rhs = right.emitted();
        let code = format!("{} {} {}", left.emitted(), op.symbol(), rhs);
        self.push(Operand::new(code, OperandKind::Comparison { op, rhs }));

        Ok(())
    }

    /// Asignación `destino <- valor`.
    pub fn assign(&mut self) -> Semantic<()> {
        let value = self.pop()?;
        let target = self.pop()?;

        let statement = format!("{} = {}", target.emitted(), value.emitted());
        self.program.emit(Line::statement(statement));

        Ok(())
    }

    /// Lectura `OLHA(destino)`.
    pub fn read(&mut self) -> Semantic<()> {
        let target = self.pop()?.emitted();
        let statement = format!(
            "{0} = int(input('Informe a variável {0}: '))",
            target
        );

        self.program.emit(Line::statement(statement));
        Ok(())
    }

    /// Escritura `FALA(...)`.
    pub fn write(&mut self) -> Semantic<()> {
        let value = self.pop()?;
        self.program
            .emit(Line::statement(format!("print({})", value.emitted())));

        Ok(())
    }

    /// Inicio de `SEPA`.
    pub fn begin_if(&mut self) -> Semantic<()> {
        self.open_block("if")
    }

    /// `NÃOFOI`: cierra la rama verdadera y abre la falsa.
    pub fn begin_else(&mut self) {
        self.program.dedent();
        self.program.emit(Line::header("else:"));
        self.program.indent();
    }

    /// Inicio de `MANDAENQUANTO`.
    pub fn begin_while(&mut self) -> Semantic<()> {
        self.open_block("while")
    }

    /// Inicio de `MANDALEMBRAR`.
    ///
    /// El incremento se descarta: el ciclo se emite como un recorrido
    /// de `range()` desde el valor inicial hasta la cota deducida.
    pub fn begin_for(&mut self) -> Semantic<()> {
        let step = self.pop()?;
        let condition = self.pop()?;
        let start = self.pop()?;
        let variable = self.pop()?;

        debug!("incremento descartado: {}", step.emitted());

        let header = format!(
            "for {} in range({}, {} + 1):",
            variable.emitted(),
            start.emitted(),
            loop_bound(&condition)
        );

        self.program.emit(Line::header(header));
        self.program.indent();

        Ok(())
    }

    /// Cuerpo de bloque sin comandos.
    pub fn empty_block(&mut self) {
        if self.program.depth() > BODY_DEPTH {
            self.program.emit(Line::placeholder());
        }
    }

    /// Fin de un bloque anidado.
    pub fn end_block(&mut self) {
        if self.program.last().map_or(false, Line::opens_block) {
            self.program.emit(Line::placeholder());
        }

        self.program.dedent();
    }

    fn open_block(&mut self, keyword: &str) -> Semantic<()> {
        let condition = self.pop()?;
        let header = format!("{} {}:", keyword, condition.emitted());

        self.program.emit(Line::header(header));
        self.program.indent();

        Ok(())
    }

    fn push(&mut self, operand: Operand) {
        self.operands.push(operand);
    }

    fn pop(&mut self) -> Semantic<Operand> {
        self.operands
            .pop()
            .ok_or_else(|| Located::at(SemanticError::MissingOperand, self.position))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(kind: TokenKind, lexeme: &str) -> Token {
        Token::new(kind, lexeme, Position::new(1, 0))
    }

    fn session_with(names: &[&str]) -> Session {
        let mut session = Session::new();
        for name in names {
            session.declare(&token(TokenKind::Id, name)).unwrap();
        }

        session
    }

    fn top(session: &mut Session) -> Operand {
        session.pop().unwrap()
    }

    #[test]
    fn binary_pops_right_then_left() {
        let mut session = session_with(&["A", "B"]);
        session.reference(&token(TokenKind::Id, "A")).unwrap();
        session.reference(&token(TokenKind::Id, "B")).unwrap();
        session.arithmetic(ArithOp::Sub).unwrap();

        let operand = top(&mut session);
        assert_eq!(operand.code(), "a - b");
        assert_eq!(operand.kind(), &OperandKind::Arithmetic(ArithOp::Sub));
        assert!(session.operands().is_empty());
    }

    #[test]
    fn python_operators() {
        let mut session = Session::new();
        for op in &[ArithOp::Div, ArithOp::Mod] {
            session.number(&token(TokenKind::Numero, "7"));
            session.number(&token(TokenKind::Numero, "2"));
            session.arithmetic(*op).unwrap();
        }

        assert_eq!(top(&mut session).code(), "7 % 2");
        assert_eq!(top(&mut session).code(), "7 // 2");

        session.number(&token(TokenKind::Numero, "1"));
        session.number(&token(TokenKind::Numero, "2"));
        session.compare(RelOp::NotEqual).unwrap();
        assert_eq!(top(&mut session).code(), "1 != 2");
    }

    #[test]
    fn power_chains_group_to_the_left() {
        let mut session = Session::new();
        session.number(&token(TokenKind::Numero, "2"));
        session.number(&token(TokenKind::Numero, "3"));
        session.arithmetic(ArithOp::Pow).unwrap();
        session.number(&token(TokenKind::Numero, "2"));
        session.arithmetic(ArithOp::Pow).unwrap();

        assert_eq!(top(&mut session).code(), "(2 ** 3) ** 2");
    }

    #[test]
    fn strings_keep_case() {
        let string = Operand::new("\"Olá MUNDO\"", OperandKind::Str);
        assert_eq!(string.emitted(), "\"Olá MUNDO\"");

        let variable = Operand::new("Total", OperandKind::Variable);
        assert_eq!(variable.emitted(), "total");
    }

    #[test]
    fn loop_bound_from_comparison() {
        let condition = |op: RelOp| {
            let rhs = "n + 1".to_owned();
            let code = format!("i {} {}", op.symbol(), rhs);
            Operand::new(code, OperandKind::Comparison { op, rhs })
        };

        assert_eq!(loop_bound(&condition(RelOp::LessOrEqual)), "n + 1");
        assert_eq!(loop_bound(&condition(RelOp::Less)), "n + 1");
        assert_eq!(loop_bound(&condition(RelOp::Greater)), DEFAULT_LOOP_BOUND);
        assert_eq!(loop_bound(&condition(RelOp::NotEqual)), DEFAULT_LOOP_BOUND);

        let number = Operand::new("1", OperandKind::Number);
        assert_eq!(loop_bound(&number), DEFAULT_LOOP_BOUND);
    }

    #[test]
    fn undeclared_reference_pushes_nothing() {
        let mut session = session_with(&["X"]);
        let error = session.reference(&token(TokenKind::Id, "Y")).unwrap_err();

        assert_eq!(error.val(), &SemanticError::Undeclared("Y".to_owned()));
        assert!(session.operands().is_empty());
    }

    #[test]
    fn underflow_is_reported() {
        let mut session = Session::new();
        session.advance_to(Position::new(4, 2));

        let error = session.assign().unwrap_err();
        assert_eq!(error.val(), &SemanticError::MissingOperand);
        assert_eq!(error.position(), Position::new(4, 2));
    }

    #[test]
    fn empty_blocks_get_placeholders() {
        let mut session = Session::new();
        session.begin_program();
        session.number(&token(TokenKind::Numero, "1"));
        session.begin_while().unwrap();
        session.end_block();

        let lines: Vec<_> = session.program().lines().map(Line::text).collect();
        assert_eq!(lines[lines.len() - 2..], ["while 1:", "pass"]);
        assert_eq!(session.program().depth(), BODY_DEPTH);
    }
}
