//! Rastreo de ubicaciones originales en código fuente.
//!
//! Los distintos objetos internos que el traductor construye
//! deben llevar cuenta de la posición en el código fuente original
//! donde se originaron, lo cual permite señalar el punto exacto en
//! donde ocurre un error de cualquiera de las fases.

use std::fmt::{self, Debug, Display, Formatter};

/// Un objeto cualquiera con una posición original asociada.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Located<T> {
    position: Position,
    value: T,
}

impl<T> Located<T> {
    /// Obtiene el valor.
    pub fn val(&self) -> &T {
        &self.value
    }

    /// Obtiene la posición.
    pub fn position(&self) -> Position {
        self.position
    }

    /// Descarta la posición y toma ownership del valor.
    pub fn into_inner(self) -> T {
        self.value
    }

    /// Descompone y toma ownership de las dos partes.
    pub fn split(self) -> (Position, T) {
        (self.position, self.value)
    }

    /// Construye a partir de un valor y una posición.
    pub fn at(value: T, position: Position) -> Self {
        Located { value, position }
    }

    /// Transforma el valor con la misma posición.
    pub fn map<U, F>(self, map: F) -> Located<U>
    where
        F: FnOnce(T) -> U,
    {
        Located {
            value: map(self.value),
            position: self.position,
        }
    }
}

impl<T> AsRef<T> for Located<T> {
    fn as_ref(&self) -> &T {
        &self.value
    }
}

/// Una posición línea-columna en un archivo.
///
/// Las líneas se cuentan a partir de 1 y las columnas a partir de 0,
/// que es la forma en que se reportan en listados de tokens y en
/// mensajes de error.
#[derive(Copy, Clone, Eq, PartialEq, Hash)]
pub struct Position {
    line: u32,
    column: u32,
}

impl Position {
    /// Construye una posición a partir de línea (base 1) y columna (base 0).
    pub fn new(line: u32, column: u32) -> Self {
        Position { line, column }
    }

    /// Obtiene el número de línea.
    pub fn line(&self) -> u32 {
        self.line
    }

    /// Obtiene el número de columna.
    pub fn column(&self) -> u32 {
        self.column
    }
}

impl Default for Position {
    fn default() -> Self {
        Position { line: 1, column: 0 }
    }
}

impl Display for Position {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}:{}", self.line, self.column)
    }
}

impl Debug for Position {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        <Self as Display>::fmt(self, formatter)
    }
}

/// Texto fuente completo, dispuesto como secuencia de líneas.
///
/// Cada línea conserva su terminador, de modo que un literal de
/// string que abarque varias líneas preserve sus saltos de línea.
#[derive(Debug, Clone)]
pub struct Source {
    name: String,
    lines: Vec<String>,
}

impl Source {
    /// Construye un origen a partir de un nombre y su contenido.
    pub fn new<S: Into<String>>(name: S, text: &str) -> Self {
        Source {
            name: name.into(),
            lines: text.split_inclusive('\n').map(String::from).collect(),
        }
    }

    /// Nombre del origen, usualmente una ruta.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Líneas del origen, con terminadores.
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Obtiene una línea sin su terminador a partir de su número (base 1).
    pub fn line(&self, number: u32) -> Option<&str> {
        let index = (number as usize).checked_sub(1)?;
        self.lines
            .get(index)
            .map(|line| line.trim_end_matches(&['\r', '\n'][..]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lines_keep_terminators() {
        let source = Source::new("<test>", "ÉNOIS\r\nPARTIU");
        assert_eq!(source.lines(), &["ÉNOIS\r\n", "PARTIU"]);
        assert_eq!(source.line(1), Some("ÉNOIS"));
        assert_eq!(source.line(2), Some("PARTIU"));
        assert_eq!(source.line(0), None);
        assert_eq!(source.line(3), None);
    }

    #[test]
    fn located_map_keeps_position() {
        let located = Located::at(2, Position::new(3, 4)).map(|n| n * 10);
        assert_eq!(located.position(), Position::new(3, 4));
        assert_eq!(located.into_inner(), 20);
    }
}
