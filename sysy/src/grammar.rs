//! The SysY grammar.
//!
//! ```text
//! source_file          -> item*
//! item                 -> function_definition | const_declaration | var_declaration
//! function_definition  -> type:primitive_type name:identifier parameters:parameter_list body:block
//! parameter            -> type:primitive_type name:identifier ("[" "]" ("[" dimension:expr "]")*)?
//! const_declaration    -> "const" type:primitive_type const_definition ("," const_definition)* ";"
//! const_definition     -> name:identifier ("[" dimension:expr "]")* "=" value:initializer
//! var_declaration      -> type:primitive_type var_definition ("," var_definition)* ";"
//! var_definition       -> name:identifier ("[" dimension:expr "]")* ("=" value:initializer)?
//! initializer          -> expr | initializer_list
//! block                -> "{" (declaration | statement)* "}"
//! statement            -> assignment_statement | expression_statement | block
//!                       | if_statement | while_statement | break_statement
//!                       | continue_statement | return_statement
//! expr                 -> binary_expression | unary_expression | call_expression
//!                       | lvalue | parenthesized_expression | literal
//! lvalue               -> name:identifier ("[" index:expr "]")*
//! ```
//!
//! Rules whose names start with `_` are hidden and flattened into their
//! parent, so lists and alternatives do not add tree levels.
//!
//! The compiled tables are built once per process and kept as a blob;
//! [`load_grammar`] validates that blob every time it hands out a
//! [`Language`].

use std::sync::{Arc, OnceLock};

use sysy_parser_core::{
    Grammar, GrammarBuilder, GrammarError, GrammarLoadError, KindId, Language, ParseTables,
    Precedence, Sym,
};
use tracing::debug;

use crate::lexer::SysyLexer;
use crate::terminal::Terminal as T;

/// Name recorded in the tables and in every tree's language.
pub const LANGUAGE_NAME: &str = "sysy";

// Binding strength, loosest first.
const PREC_ELSE: u16 = 0;
const PREC_OR: u16 = 1;
const PREC_AND: u16 = 2;
const PREC_EQUALITY: u16 = 3;
const PREC_RELATIONAL: u16 = 4;
const PREC_ADDITIVE: u16 = 5;
const PREC_MULTIPLICATIVE: u16 = 6;
const PREC_UNARY: u16 = 7;

const BINARY_OPERATORS: [(T, u16); 13] = [
    (T::OrOr, PREC_OR),
    (T::AndAnd, PREC_AND),
    (T::EqEq, PREC_EQUALITY),
    (T::NotEq, PREC_EQUALITY),
    (T::Lt, PREC_RELATIONAL),
    (T::Gt, PREC_RELATIONAL),
    (T::LtEq, PREC_RELATIONAL),
    (T::GtEq, PREC_RELATIONAL),
    (T::Plus, PREC_ADDITIVE),
    (T::Minus, PREC_ADDITIVE),
    (T::Star, PREC_MULTIPLICATIVE),
    (T::Slash, PREC_MULTIPLICATIVE),
    (T::Percent, PREC_MULTIPLICATIVE),
];

const UNARY_OPERATORS: [T; 3] = [T::Plus, T::Minus, T::Bang];

/// Builds the SysY grammar description.
pub fn grammar() -> Result<Grammar, GrammarError> {
    let mut g = GrammarBuilder::new(LANGUAGE_NAME);

    // Terminals in id order, after the reserved `end` and `ERROR`.
    for terminal in &T::ALL[2..] {
        let id = if terminal.is_lex_error() {
            g.error_terminal(terminal.name())?
        } else {
            g.terminal(terminal.name(), terminal.is_named())?
        };
        debug_assert_eq!(id, terminal.kind());
    }
    let t = T::kind;

    let source_file = g.nonterminal("source_file")?;
    let items = g.nonterminal("_items")?;
    let item = g.nonterminal("_item")?;
    let primitive_type = g.nonterminal("primitive_type")?;
    let function_definition = g.nonterminal("function_definition")?;
    let parameter_list = g.nonterminal("parameter_list")?;
    let parameters = g.nonterminal("_parameters")?;
    let parameter = g.nonterminal("parameter")?;
    let dimensions = g.nonterminal("_dimensions")?;
    let const_declaration = g.nonterminal("const_declaration")?;
    let const_definitions = g.nonterminal("_const_definitions")?;
    let const_definition = g.nonterminal("const_definition")?;
    let var_declaration = g.nonterminal("var_declaration")?;
    let var_definitions = g.nonterminal("_var_definitions")?;
    let var_definition = g.nonterminal("var_definition")?;
    let initializer = g.nonterminal("_initializer")?;
    let initializer_list = g.nonterminal("initializer_list")?;
    let initializers = g.nonterminal("_initializers")?;
    let block = g.nonterminal("block")?;
    let block_items = g.nonterminal("_block_items")?;
    let block_item = g.nonterminal("_block_item")?;
    let statement = g.nonterminal("_statement")?;
    let assignment_statement = g.nonterminal("assignment_statement")?;
    let expression_statement = g.nonterminal("expression_statement")?;
    let if_statement = g.nonterminal("if_statement")?;
    let while_statement = g.nonterminal("while_statement")?;
    let break_statement = g.nonterminal("break_statement")?;
    let continue_statement = g.nonterminal("continue_statement")?;
    let return_statement = g.nonterminal("return_statement")?;
    let expression = g.nonterminal("_expression")?;
    let lvalue = g.nonterminal("lvalue")?;
    let indices = g.nonterminal("_indices")?;
    let call_expression = g.nonterminal("call_expression")?;
    let argument_list = g.nonterminal("argument_list")?;
    let arguments = g.nonterminal("_arguments")?;
    let unary_expression = g.nonterminal("unary_expression")?;
    let binary_expression = g.nonterminal("binary_expression")?;
    let parenthesized_expression = g.nonterminal("parenthesized_expression")?;

    let type_ = g.field("type");
    let name = g.field("name");
    let parameters_field = g.field("parameters");
    let body = g.field("body");
    let dimension = g.field("dimension");
    let value = g.field("value");
    let left = g.field("left");
    let right = g.field("right");
    let operator = g.field("operator");
    let argument = g.field("argument");
    let condition = g.field("condition");
    let consequence = g.field("consequence");
    let alternative = g.field("alternative");
    let index = g.field("index");
    let function = g.field("function");
    let arguments_field = g.field("arguments");

    for (op, level) in BINARY_OPERATORS {
        g.token_precedence(t(op), Precedence::left(level));
    }
    g.token_precedence(t(T::Else), Precedence::right(PREC_ELSE));

    // Top level
    g.rule(source_file, std::iter::empty::<KindId>())?;
    g.rule(source_file, [items])?;
    g.rule(items, [items, item])?;
    g.rule(items, [item])?;
    g.rule(item, [function_definition])?;
    g.rule(item, [const_declaration])?;
    g.rule(item, [var_declaration])?;
    g.rule(primitive_type, [t(T::Int)])?;
    g.rule(primitive_type, [t(T::Void)])?;

    // Functions
    g.rule(
        function_definition,
        [
            type_.on(primitive_type),
            name.on(t(T::Identifier)),
            parameters_field.on(parameter_list),
            body.on(block),
        ],
    )?;
    g.rule(parameter_list, [t(T::LParen), t(T::RParen)])?;
    g.rule(parameter_list, [t(T::LParen), parameters, t(T::RParen)])?;
    g.rule(parameters, [parameters, t(T::Comma), parameter])?;
    g.rule(parameters, [parameter])?;
    let parameter_head = [type_.on(primitive_type), name.on(t(T::Identifier))];
    g.rule(parameter, parameter_head)?;
    g.rule(
        parameter,
        parameter_head
            .into_iter()
            .chain([Sym::from(t(T::LBracket)), Sym::from(t(T::RBracket))]),
    )?;
    g.rule(
        parameter,
        parameter_head.into_iter().chain([
            Sym::from(t(T::LBracket)),
            Sym::from(t(T::RBracket)),
            Sym::from(dimensions),
        ]),
    )?;
    g.rule(
        dimensions,
        [
            dimensions.into(),
            t(T::LBracket).into(),
            dimension.on(expression),
            t(T::RBracket).into(),
        ],
    )?;
    g.rule(
        dimensions,
        [
            t(T::LBracket).into(),
            dimension.on(expression),
            t(T::RBracket).into(),
        ],
    )?;

    // Declarations
    g.rule(
        const_declaration,
        [
            t(T::Const).into(),
            type_.on(primitive_type),
            const_definitions.into(),
            t(T::Semicolon).into(),
        ],
    )?;
    g.rule(
        const_definitions,
        [const_definitions, t(T::Comma), const_definition],
    )?;
    g.rule(const_definitions, [const_definition])?;
    g.rule(
        const_definition,
        [
            name.on(t(T::Identifier)),
            t(T::Assign).into(),
            value.on(initializer),
        ],
    )?;
    g.rule(
        const_definition,
        [
            name.on(t(T::Identifier)),
            dimensions.into(),
            t(T::Assign).into(),
            value.on(initializer),
        ],
    )?;
    g.rule(
        var_declaration,
        [
            type_.on(primitive_type),
            var_definitions.into(),
            t(T::Semicolon).into(),
        ],
    )?;
    g.rule(var_definitions, [var_definitions, t(T::Comma), var_definition])?;
    g.rule(var_definitions, [var_definition])?;
    g.rule(var_definition, [name.on(t(T::Identifier))])?;
    g.rule(var_definition, [name.on(t(T::Identifier)), dimensions.into()])?;
    g.rule(
        var_definition,
        [
            name.on(t(T::Identifier)),
            t(T::Assign).into(),
            value.on(initializer),
        ],
    )?;
    g.rule(
        var_definition,
        [
            name.on(t(T::Identifier)),
            dimensions.into(),
            t(T::Assign).into(),
            value.on(initializer),
        ],
    )?;
    g.rule(initializer, [expression])?;
    g.rule(initializer, [initializer_list])?;
    g.rule(initializer_list, [t(T::LBrace), t(T::RBrace)])?;
    g.rule(initializer_list, [t(T::LBrace), initializers, t(T::RBrace)])?;
    g.rule(initializers, [initializers, t(T::Comma), initializer])?;
    g.rule(initializers, [initializer])?;

    // Statements
    g.rule(block, [t(T::LBrace), t(T::RBrace)])?;
    g.rule(block, [t(T::LBrace), block_items, t(T::RBrace)])?;
    g.rule(block_items, [block_items, block_item])?;
    g.rule(block_items, [block_item])?;
    g.rule(block_item, [const_declaration])?;
    g.rule(block_item, [var_declaration])?;
    g.rule(block_item, [statement])?;
    for kind in [
        assignment_statement,
        expression_statement,
        block,
        if_statement,
        while_statement,
        break_statement,
        continue_statement,
        return_statement,
    ] {
        g.rule(statement, [kind])?;
    }
    g.rule(
        assignment_statement,
        [
            left.on(lvalue),
            t(T::Assign).into(),
            right.on(expression),
            t(T::Semicolon).into(),
        ],
    )?;
    g.rule(expression_statement, [expression, t(T::Semicolon)])?;
    g.rule(expression_statement, [t(T::Semicolon)])?;
    let if_head = [
        t(T::If).into(),
        t(T::LParen).into(),
        condition.on(expression),
        t(T::RParen).into(),
        consequence.on(statement),
    ];
    g.rule_with_precedence(if_statement, if_head, Precedence::right(PREC_ELSE))?;
    g.rule(
        if_statement,
        if_head
            .into_iter()
            .chain([t(T::Else).into(), alternative.on(statement)]),
    )?;
    g.rule(
        while_statement,
        [
            t(T::While).into(),
            t(T::LParen).into(),
            condition.on(expression),
            t(T::RParen).into(),
            body.on(statement),
        ],
    )?;
    g.rule(break_statement, [t(T::Break), t(T::Semicolon)])?;
    g.rule(continue_statement, [t(T::Continue), t(T::Semicolon)])?;
    g.rule(
        return_statement,
        [
            t(T::Return).into(),
            value.on(expression),
            t(T::Semicolon).into(),
        ],
    )?;
    g.rule(return_statement, [t(T::Return), t(T::Semicolon)])?;

    // Expressions
    for kind in [
        binary_expression,
        unary_expression,
        call_expression,
        lvalue,
        parenthesized_expression,
        t(T::DecimalLiteral),
        t(T::OctalLiteral),
        t(T::HexLiteral),
    ] {
        g.rule(expression, [kind])?;
    }
    g.rule(lvalue, [name.on(t(T::Identifier))])?;
    g.rule(lvalue, [name.on(t(T::Identifier)), indices.into()])?;
    g.rule(
        indices,
        [
            indices.into(),
            t(T::LBracket).into(),
            index.on(expression),
            t(T::RBracket).into(),
        ],
    )?;
    g.rule(
        indices,
        [
            t(T::LBracket).into(),
            index.on(expression),
            t(T::RBracket).into(),
        ],
    )?;
    g.rule(
        call_expression,
        [
            function.on(t(T::Identifier)),
            arguments_field.on(argument_list),
        ],
    )?;
    g.rule(argument_list, [t(T::LParen), t(T::RParen)])?;
    g.rule(argument_list, [t(T::LParen), arguments, t(T::RParen)])?;
    g.rule(arguments, [arguments, t(T::Comma), expression])?;
    g.rule(arguments, [expression])?;
    for op in UNARY_OPERATORS {
        g.rule_with_precedence(
            unary_expression,
            [operator.on(t(op)), argument.on(expression)],
            Precedence::right(PREC_UNARY),
        )?;
    }
    for (op, level) in BINARY_OPERATORS {
        g.rule_with_precedence(
            binary_expression,
            [left.on(expression), operator.on(t(op)), right.on(expression)],
            Precedence::left(level),
        )?;
    }
    g.rule(
        parenthesized_expression,
        [t(T::LParen), expression, t(T::RParen)],
    )?;

    g.start(source_file);
    g.build()
}

static BLOB: OnceLock<Result<Vec<u8>, GrammarError>> = OnceLock::new();

/// The serialized SysY tables, compiled on first use.
pub fn grammar_blob() -> Result<&'static [u8], GrammarError> {
    BLOB.get_or_init(|| {
        let tables = ParseTables::build(&grammar()?)?;
        debug!(
            states = tables.state_count(),
            symbols = tables.symbol_count(),
            rules = tables.rule_count(),
            "compiled sysy grammar"
        );
        Ok(tables.to_bytes())
    })
    .as_ref()
    .map(Vec::as_slice)
    .map_err(GrammarError::clone)
}

/// Loads the SysY language.
///
/// Every call decodes and validates the shared blob, so two handles are
/// independent values that compare equal and parse identically.
pub fn load_grammar() -> Result<Language, GrammarLoadError> {
    let blob = grammar_blob()?;
    let language = Language::from_blob(blob, Arc::new(SysyLexer))?;
    debug!(
        bytes = blob.len(),
        fingerprint = language.fingerprint(),
        "loaded sysy grammar"
    );
    Ok(language)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grammar_builds() {
        let grammar = grammar().unwrap();
        assert_eq!(grammar.name(), LANGUAGE_NAME);
        assert_eq!(grammar.terminal_count(), T::ALL.len());
        for terminal in T::ALL {
            assert_eq!(grammar.symbols()[terminal.kind().index()].name, terminal.name());
        }
    }

    #[test]
    fn test_blob_is_shared() {
        let a = grammar_blob().unwrap();
        let b = grammar_blob().unwrap();
        assert!(std::ptr::eq(a, b));
    }

    #[test]
    fn test_operator_precedence_table() {
        let tables = ParseTables::from_bytes(grammar_blob().unwrap()).unwrap();
        let level = |terminal: T| tables.token_precedence(terminal.kind()).map(|p| p.level);
        assert!(level(T::Star) > level(T::Plus));
        assert!(level(T::Plus) > level(T::Lt));
        assert!(level(T::Lt) > level(T::EqEq));
        assert!(level(T::EqEq) > level(T::AndAnd));
        assert!(level(T::AndAnd) > level(T::OrOr));
        assert_eq!(level(T::Semicolon), None);
    }
}
