//! Tradutor del lenguaje de enseñanza C.R.I.A a Python.
//!
//! # Fases
//! Cada programa deriva de un único texto fuente. Este texto se
//! somete primero a análisis léxico en [`lex`], de lo cual se obtiene
//! un flujo de tokens. El flujo puede además codificarse como listado
//! textual y volver a leerse por medio de [`stream`].
//!
//! El traductor de [`parse`] consume el flujo en una sola pasada. El
//! análisis sintáctico dispara en puntos fijos las acciones de
//! [`semantic`], que validan declaraciones contra [`symbols`] y
//! construyen el programa Python en [`emit`]. Cualquier falla de
//! cualquier fase termina en un [`error::Diagnostics`].
//!
//! No se realiza ninguna optimización ni recuperación de errores.

pub mod emit;
pub mod error;
pub mod lex;
pub mod parse;
pub mod semantic;
pub mod source;
pub mod stream;
pub mod symbols;

use log::info;

use crate::{error::Diagnostics, lex::Lexer, source::Source};

/// Traduce un texto fuente completo a código Python.
pub fn translate(text: &str) -> Result<String, Diagnostics> {
    translate_source(&Source::new("<entrada>", text))
}

/// Traduce un origen a código Python.
///
/// Los diagnósticos resultantes llevan asociado el origen, de modo que
/// su representación en terminal incluye extractos del código fuente.
pub fn translate_source(source: &Source) -> Result<String, Diagnostics> {
    let attach = |diagnostics: Diagnostics| diagnostics.with_source(source.clone());

    let tokens = Lexer::new(source)
        .try_exhaustive()
        .map_err(|error| attach(Diagnostics::from(error)))?;

    info!("{}: {} tokens", source.name(), tokens.len());

    let program = parse::translate(tokens).map_err(attach)?;
    info!("{}: tradução concluída", source.name());

    Ok(program.serialize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lexical_errors_prevent_translation() {
        let diagnostics = translate("ÉNOIS BAGULHOS X; X <- 1 @ 2; PARTIU").unwrap_err();
        assert_eq!(
            diagnostics.messages(),
            vec!["Erro Léxico na linha 1, coluna 25: símbolo inválido: @"]
        );
    }

    #[test]
    fn diagnostics_carry_source() {
        let diagnostics = translate("ÉNOIS\nFALA(Y);\nPARTIU").unwrap_err();
        assert!(diagnostics.to_string().contains("2 | FALA(Y);\n"));
    }
}
