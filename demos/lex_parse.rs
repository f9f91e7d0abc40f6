use cria::{lex::Lexer, parse, source::Source, stream};
use std::io::Read;

fn main() {
    let mut text = String::new();
    if let Err(error) = std::io::stdin().read_to_string(&mut text) {
        eprintln!("{}", error);
        return;
    }

    // Ida y vuelta por el listado textual
    let source = Source::new("<stdin>", &text);
    let mut lexer = Lexer::new(&source);
    let tokens: Vec<_> = lexer.by_ref().collect();

    let mut listing = Vec::new();
    if let Err(error) = stream::write_listing(&mut listing, source.name(), &tokens, lexer.error()) {
        eprintln!("{}", error);
        return;
    }

    let listing = String::from_utf8_lossy(&listing);
    println!("{}", listing);

    match parse::translate(stream::decode(&listing)) {
        Ok(program) => print!("{}", program.serialize()),
        Err(diagnostics) => eprintln!("{:#?}", diagnostics),
    }
}
