use cria::translate;

const EPILOGUE: &str = "\nif __name__ == '__main__':\n    main()\n";

fn assert_golden(src: &str, body: &str) {
    let got = translate(src).unwrap();
    let expected = format!("def main():\n    # Compilador C.R.I.A\n\n{}{}", body, EPILOGUE);
    assert_eq!(got, expected);
}

fn assert_fails(src: &str, messages: &[&str]) {
    let diagnostics = translate(src).unwrap_err();
    assert_eq!(diagnostics.messages(), messages);
}

#[test]
fn golden_assign_and_print() {
    assert_golden(
        "ÉNOIS BAGULHOS X; X <- 5; FALA(X); PARTIU",
        "    x = 0\n\n    x = 5\n    print(x)\n",
    );
}

#[test]
fn golden_left_associative_power() {
    assert_golden(
        "ÉNOIS BAGULHOS X; X <- 2 ** 3 ** 2; FALA(X); PARTIU",
        "    x = 0\n\n    x = (2 ** 3) ** 2\n    print(x)\n",
    );
}

#[test]
fn golden_if_else_same_depth() {
    assert_golden(
        "ÉNOIS BAGULHOS X;\n\
         SEPA (1 < 2)\n    X <- 1;\n\
         NÃOFOI\n    X <- 2;\n\
         FIMSEPA\n\
         PARTIU\n",
        "    x = 0\n\n    if 1 < 2:\n        x = 1\n    else:\n        x = 2\n",
    );
}

#[test]
fn golden_loops_and_io() {
    assert_golden(
        "ÉNOIS\n\
         BAGULHOS Contador, Total;\n\
         OLHA(Total);\n\
         MANDALEMBRAR (Contador <- 1; Contador <= Total; Contador <- Contador + 1)\n\
         \x20   FALA(Contador);\n\
         DESENCANA\n\
         MANDAENQUANTO (Total > 0)\n\
         \x20   Total <- Total - 1;\n\
         PARAMANDA\n\
         FALA(\"Fim\");\n\
         PARTIU\n",
        "    contador = 0\n\
         \x20   total = 0\n\
         \n\
         \x20   total = int(input('Informe a variável total: '))\n\
         \x20   for contador in range(1, total + 1):\n\
         \x20       print(contador)\n\
         \x20   while total > 0:\n\
         \x20       total = total - 1\n\
         \x20   print(\"Fim\")\n",
    );
}

#[test]
fn golden_nested_blocks() {
    assert_golden(
        "ÉNOIS BAGULHOS I, J;\n\
         MANDAENQUANTO (I < 3)\n\
         \x20   SEPA (I == 1) FALA(\"um\"); FIMSEPA\n\
         \x20   MANDALEMBRAR (J <- 0; J < I; J <- J + 1) FALA(J); DESENCANA\n\
         \x20   I <- I + 1;\n\
         PARAMANDA\n\
         PARTIU\n",
        "    i = 0\n    j = 0\n\n\
         \x20   while i < 3:\n\
         \x20       if i == 1:\n\
         \x20           print(\"um\")\n\
         \x20       for j in range(0, i + 1):\n\
         \x20           print(j)\n\
         \x20       i = i + 1\n",
    );
}

#[test]
fn golden_empty_bodies() {
    assert_golden(
        "ÉNOIS BAGULHOS X; MANDAENQUANTO (X < 1) PARAMANDA PARTIU",
        "    x = 0\n\n    while x < 1:\n        pass\n",
    );

    assert_golden("ÉNOIS PARTIU", "    pass\n");
}

#[test]
fn golden_declarations_only() {
    assert_golden("ÉNOIS BAGULHOS X, Y; PARTIU", "    x = 0\n    y = 0\n\n");
}

#[test]
fn golden_case_insensitive_keywords() {
    assert_golden(
        "énois bagulhos Valor; valor <- 1; partiu",
        "    valor = 0\n\n    valor = 1\n",
    );
}

#[test]
fn golden_strings_keep_case() {
    assert_golden(
        "ÉNOIS FALA(\"Olá, MUNDO\"); PARTIU",
        "    print(\"Olá, MUNDO\")\n",
    );
}

#[test]
fn golden_grouping_and_modulo() {
    assert_golden(
        "ÉNOIS BAGULHOS A, B; A <- (A + B) / 2 % -B; PARTIU",
        "    a = 0\n    b = 0\n\n    a = (a + b) // 2 % -b\n",
    );
}

#[test]
fn golden_names_shadow_python_builtins() {
    assert_golden(
        "ÉNOIS BAGULHOS Print; FALA(Print); PARTIU",
        "    print = 0\n\n    print(print)\n",
    );
}

#[test]
fn duplicate_declaration() {
    assert_fails(
        "ÉNOIS BAGULHOS X, X; PARTIU",
        &["Erro semântico: Variável X já declarada!, linha: 1"],
    );
}

#[test]
fn duplicate_declaration_report() {
    let diagnostics = translate("ÉNOIS BAGULHOS X, X; PARTIU").unwrap_err();
    assert_eq!(
        diagnostics.report(),
        "# Erros encontrados:\n# Erro semântico: Variável X já declarada!, linha: 1\n"
    );
}

#[test]
fn undeclared_variable() {
    assert_fails(
        "ÉNOIS BAGULHOS X;\nX <- 1;\nY <- X;\nPARTIU",
        &["Erro semântico: Variável Y não está declarada!, linha: 3"],
    );
}

#[test]
fn undeclared_variable_in_expression() {
    assert_fails(
        "ÉNOIS BAGULHOS X;\nFALA(X + Z);\nPARTIU",
        &["Erro semântico: Variável Z não está declarada!, linha: 2"],
    );
}

#[test]
fn unterminated_string() {
    assert_fails(
        "ÉNOIS FALA(\"abc",
        &["Erro Léxico na linha 1, coluna 11: String não fechada"],
    );
}

#[test]
fn invalid_symbol() {
    assert_fails(
        "ÉNOIS\nBAGULHOS X;\nX <- 3 & 4;\nPARTIU",
        &["Erro Léxico na linha 3, coluna 7: símbolo inválido: &"],
    );
}

#[test]
fn missing_semicolon() {
    assert_fails(
        "ÉNOIS BAGULHOS X;\nX <- 1\nPARTIU",
        &["Erro sintático na linha 3, coluna 0: Esperado T_PONTO_VIRGULA, encontrado T_PARTIU (PARTIU)"],
    );
}

#[test]
fn missing_program_start() {
    assert_fails(
        "BAGULHOS X; PARTIU",
        &["Erro sintático na linha 1, coluna 0: Esperado T_ENOIS, encontrado T_BAGULHOS (BAGULHOS)"],
    );
}

#[test]
fn missing_program_end() {
    assert_fails(
        "ÉNOIS BAGULHOS X; X <- 1;",
        &["Erro sintático na linha 2, coluna 0: Esperado T_PARTIU, encontrado T_FIM_FONTE (<EOF>)"],
    );
}
