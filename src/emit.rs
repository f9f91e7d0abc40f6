//! Emisión de código Python.
//!
//! El emisor acumula líneas ya finalizadas en el orden en que el
//! traductor las produce. Cada línea se sangra según la profundidad
//! vigente al momento de agregarla. El emisor no valida el código
//! resultante; la corrección depende enteramente del traductor.

use log::debug;

/// Unidad de sangría.
pub const INDENT: &str = "    ";

/// Profundidad del cuerpo de `main()`, mínimo mientras haya un bloque abierto.
pub const BODY_DEPTH: usize = 1;

/// Clase de una línea emitida.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum LineKind {
    /// Definición del punto de entrada.
    Entry,

    /// Comentario.
    Comment,

    /// Línea vacía.
    Blank,

    /// Sentencia ejecutable simple: asignación, lectura, escritura.
    Statement,

    /// Encabezado que abre un bloque: `if`, `else`, `while`, `for`.
    Header,

    /// `pass`, para bloques que de otro modo quedarían vacíos.
    Placeholder,
}

/// Una línea de código objetivo, sin sangría.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Line {
    kind: LineKind,
    text: String,
}

impl Line {
    pub fn entry<S: Into<String>>(text: S) -> Self {
        Line::new(LineKind::Entry, text)
    }

    pub fn comment<S: AsRef<str>>(text: S) -> Self {
        Line::new(LineKind::Comment, format!("# {}", text.as_ref()))
    }

    pub fn blank() -> Self {
        Line::new(LineKind::Blank, "")
    }

    pub fn statement<S: Into<String>>(text: S) -> Self {
        Line::new(LineKind::Statement, text)
    }

    pub fn header<S: Into<String>>(text: S) -> Self {
        Line::new(LineKind::Header, text)
    }

    pub fn placeholder() -> Self {
        Line::new(LineKind::Placeholder, "pass")
    }

    pub fn kind(&self) -> LineKind {
        self.kind
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Determina si la línea abre un bloque que requiere cuerpo.
    pub fn opens_block(&self) -> bool {
        matches!(self.kind, LineKind::Entry | LineKind::Header)
    }

    /// Determina si la línea cuenta como código ejecutable.
    pub fn is_executable(&self) -> bool {
        matches!(
            self.kind,
            LineKind::Statement | LineKind::Header | LineKind::Placeholder
        )
    }

    fn new<S: Into<String>>(kind: LineKind, text: S) -> Self {
        Line {
            kind,
            text: text.into(),
        }
    }
}

/// Búfer de emisión y profundidad de sangría vigente.
#[derive(Debug, Default)]
pub struct Emitter {
    lines: Vec<(usize, Line)>,
    depth: usize,
}

impl Emitter {
    pub fn new() -> Self {
        Default::default()
    }

    /// Agrega una línea con la profundidad indicada.
    pub fn append(&mut self, line: Line, depth: usize) {
        debug!("{}{}", INDENT.repeat(depth), line.text());
        self.lines.push((depth, line));
    }

    /// Agrega una línea con la profundidad vigente.
    pub fn emit(&mut self, line: Line) {
        self.append(line, self.depth);
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Fija la profundidad, al iniciar o terminar el programa.
    pub fn set_depth(&mut self, depth: usize) {
        self.depth = depth;
    }

    /// Entra en un bloque anidado.
    pub fn indent(&mut self) {
        self.depth += 1;
    }

    /// Sale de un bloque anidado, sin bajar del cuerpo del programa.
    pub fn dedent(&mut self) {
        if self.depth > BODY_DEPTH {
            self.depth -= 1;
        }
    }

    /// Última línea emitida.
    pub fn last(&self) -> Option<&Line> {
        self.lines.last().map(|(_, line)| line)
    }

    /// Determina si alguna de las últimas `window` líneas es ejecutable.
    pub fn has_recent_statement(&self, window: usize) -> bool {
        self.lines
            .iter()
            .rev()
            .take(window)
            .any(|(_, line)| line.is_executable())
    }

    pub fn lines(&self) -> impl Iterator<Item = &Line> {
        self.lines.iter().map(|(_, line)| line)
    }

    /// Produce el texto final, una línea por sentencia.
    pub fn serialize(&self) -> String {
        let mut output = String::new();
        for (depth, line) in &self.lines {
            if line.kind() != LineKind::Blank {
                output.push_str(&INDENT.repeat(*depth));
                output.push_str(line.text());
            }

            output.push('\n');
        }

        output
    }
}
