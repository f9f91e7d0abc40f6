use cria::{error::Diagnostics, lex::Lexer, parse, source::Source};
use std::io::Read;

fn main() {
    let mut text = String::new();
    if let Err(error) = std::io::stdin().read_to_string(&mut text) {
        eprintln!("{}", error);
        return;
    }

    let source = Source::new("<stdin>", &text);
    let lexer = Lexer::new(&source);

    let diagnostics = match lexer.try_exhaustive() {
        Err(error) => Diagnostics::from(error),

        Ok(tokens) => {
            print!("Tokens: {:#?}\n\n", tokens);

            match parse::translate(tokens) {
                Err(diagnostics) => diagnostics,

                Ok(program) => {
                    print!("{}", program.serialize());
                    Diagnostics::default()
                }
            }
        }
    };

    if !diagnostics.is_empty() {
        eprint!("{}", diagnostics.with_source(source));
    }
}
