//! S-expression parsing from text.
//!
//! The parser turns source into [`Value`] trees in one pass: atoms become
//! their value variants, `(keyword args...)` forms whose head is in the
//! primitive table compile to `PrimForm` nodes, and every other parenthesised
//! form stays a `List` (a procedure-call form for the evaluator). Quoted list
//! literals (`'(...)` and the longhand `(quote ...)`) are parsed with keyword
//! compilation off so their contents stay inert data.
//!
//! Comments (`;` to end of line) are stripped wherever whitespace is allowed.
//! Nesting is bounded by `MAX_PARSE_DEPTH`, and after parsing a whole-tree
//! pass validates the arity of every compiled form, so ill-formed operator
//! applications are rejected before evaluation starts.

use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::{tag, take_while1},
    character::complete::char,
    combinator::{opt, recognize, value},
    error::ErrorKind,
    multi::separated_list0,
    sequence::{pair, preceded},
};

use crate::ast::{FloatType, NumberType, SYMBOL_SPECIAL_CHARS, Value, is_valid_symbol};
use crate::builtinops::{find_op, get_quote_op};
use crate::{Error, MAX_PARSE_DEPTH, ParseError, ParseErrorKind};

/// Whether list heads should be compiled against the keyword table. Quoted
/// data is parsed with compilation off so its contents stay symbolic.
#[derive(Debug, Clone, Copy, PartialEq)]
enum CompileKeywords {
    Yes,
    No,
}

/// Skip whitespace and `;` line comments. Plain-function form for use
/// outside combinator position.
fn skip_ws(input: &str) -> &str {
    let mut rest = input;
    loop {
        let trimmed = rest.trim_start_matches([' ', '\t', '\r', '\n']);
        match trimmed.strip_prefix(';') {
            Some(comment) => {
                rest = match comment.find('\n') {
                    Some(eol) => &comment[eol + 1..],
                    None => "",
                };
            }
            None => return trimmed,
        }
    }
}

/// Whitespace-and-comments as a parser. Always succeeds.
fn ws(input: &str) -> IResult<&str, ()> {
    Ok((skip_ws(input), ()))
}

/// Like [`ws`], but requires at least one character of separation
fn ws1(input: &str) -> IResult<&str, ()> {
    let rest = skip_ws(input);
    if rest.len() == input.len() {
        Err(nom::Err::Error(nom::error::Error::new(
            input,
            ErrorKind::MultiSpace,
        )))
    } else {
        Ok((rest, ()))
    }
}

/// Parse a number: optional sign, digits, optional fractional part.
/// The token is a float exactly when it contains a `.`.
fn parse_number(input: &str) -> IResult<&str, Value> {
    let (rest, text) = recognize(pair(
        opt(char('-')),
        pair(
            take_while1(|c: char| c.is_ascii_digit()),
            opt(pair(char('.'), take_while1(|c: char| c.is_ascii_digit()))),
        ),
    ))
    .parse(input)?;

    if text.contains('.') {
        match text.parse::<FloatType>() {
            Ok(x) => Ok((rest, Value::Float(x))),
            Err(_) => Err(nom::Err::Error(nom::error::Error::new(
                input,
                ErrorKind::Float,
            ))),
        }
    } else {
        // Overflowing integer literals fail here; symbol parsing rejects
        // them too (leading digit), so the input is a syntax error.
        match text.parse::<NumberType>() {
            Ok(n) => Ok((rest, Value::Number(n))),
            Err(_) => Err(nom::Err::Error(nom::error::Error::new(
                input,
                ErrorKind::Digit,
            ))),
        }
    }
}

/// Parse a boolean (#t or #f)
fn parse_bool(input: &str) -> IResult<&str, Value> {
    alt((
        value(Value::Bool(true), tag("#t")),
        value(Value::Bool(false), tag("#f")),
    ))
    .parse(input)
}

/// Parse a symbol (identifier). The `nil` keyword parses as the nil literal.
fn parse_symbol(input: &str) -> IResult<&str, Value> {
    let mut symbol_chars =
        take_while1(|c: char| c.is_alphanumeric() || SYMBOL_SPECIAL_CHARS.contains(c));

    let (remaining, candidate) = symbol_chars.parse(input)?;

    if candidate == "nil" {
        Ok((remaining, Value::Nil))
    } else if is_valid_symbol(candidate) {
        Ok((remaining, Value::Symbol(candidate.into())))
    } else {
        Err(nom::Err::Error(nom::error::Error::new(
            input,
            ErrorKind::Alpha,
        )))
    }
}

/// Parse a string literal with escape sequences
fn parse_string(input: &str) -> IResult<&str, Value> {
    let (mut remaining, _) = char('"').parse(input)?;
    let mut chars = Vec::new();

    loop {
        let mut char_iter = remaining.chars();
        match char_iter.next() {
            Some('"') => {
                return Ok((
                    char_iter.as_str(),
                    Value::String(chars.into_iter().collect()),
                ));
            }
            Some('\\') => {
                match char_iter.next() {
                    Some('n') => chars.push('\n'),
                    Some('t') => chars.push('\t'),
                    Some('r') => chars.push('\r'),
                    Some('\\') => chars.push('\\'),
                    Some('"') => chars.push('"'),
                    // Unknown or incomplete escape sequence
                    Some(_) | None => {
                        return Err(nom::Err::Error(nom::error::Error::new(
                            remaining,
                            ErrorKind::Char,
                        )));
                    }
                }
                remaining = char_iter.as_str();
            }
            Some(ch) => {
                chars.push(ch);
                remaining = char_iter.as_str();
            }
            None => {
                // End of input without a closing quote
                return Err(nom::Err::Error(nom::error::Error::new(
                    remaining,
                    ErrorKind::Char,
                )));
            }
        }
    }
}

/// Wrap a datum in the quote operator form
fn make_quote_form(datum: Value) -> Value {
    Value::PrimForm {
        op: get_quote_op(),
        args: vec![datum],
    }
}

/// Parse a parenthesised form
fn parse_list(input: &str, compile: CompileKeywords, depth: usize) -> IResult<&str, Value> {
    let (input, _) = char('(').parse(input)?;
    let (input, ()) = ws(input)?;

    // Longhand quote: exactly one datum, parsed inert
    if compile == CompileKeywords::Yes {
        let head: IResult<&str, &str> = take_while1(|c: char| {
            c.is_alphanumeric() || SYMBOL_SPECIAL_CHARS.contains(c)
        })
        .parse(input);
        if let Ok((after_keyword, "quote")) = head {
            let (rest, ()) = ws1(after_keyword)?;
            let (rest, datum) = parse_sexpr(rest, CompileKeywords::No, depth + 1)?;
            let (rest, ()) = ws(rest)?;
            let (rest, _) = char(')').parse(rest)?;
            return Ok((rest, make_quote_form(datum)));
        }
    }

    let (input, elements) =
        separated_list0(ws1, |i| parse_sexpr(i, compile, depth + 1)).parse(input)?;

    let (input, ()) = ws(input)?;
    let (input, _) = char(')').parse(input)?;

    // Compile forms headed by a primitive keyword
    if compile == CompileKeywords::Yes
        && let [Value::Symbol(op_name), args @ ..] = elements.as_slice()
        && let Some(op) = find_op(op_name.as_str())
    {
        return Ok((
            input,
            Value::PrimForm {
                op,
                args: args.to_vec(),
            },
        ));
    }

    Ok((input, Value::List(elements)))
}

/// Parse a quoted list literal (`'(...)`). The grammar limits quote to
/// lists; a quote on an atom is a syntax error.
fn parse_quote(input: &str, compile: CompileKeywords, depth: usize) -> IResult<&str, Value> {
    let (input, _) = char('\'').parse(input)?;
    let (input, datum) = parse_list(input, CompileKeywords::No, depth + 1)?;

    match compile {
        CompileKeywords::Yes => Ok((input, make_quote_form(datum))),
        // A nested quote inside quoted data is transparent: the datum is
        // already inert.
        CompileKeywords::No => Ok((input, datum)),
    }
}

/// Parse one expression, dispatching over the token alternatives
fn parse_sexpr(input: &str, compile: CompileKeywords, depth: usize) -> IResult<&str, Value> {
    if depth >= MAX_PARSE_DEPTH {
        return Err(nom::Err::Error(nom::error::Error::new(
            input,
            ErrorKind::TooLarge,
        )));
    }
    preceded(
        ws,
        alt((
            |i| parse_quote(i, compile, depth),
            |i| parse_list(i, compile, depth),
            parse_number,
            parse_bool,
            parse_string,
            parse_symbol,
        )),
    )
    .parse(input)
}

/// Scan the input for a bracket imbalance, skipping strings and comments.
/// The combinator error that surfaces from a failed parse is often a
/// backtracked alternative, so unbalanced brackets are detected directly.
fn bracket_imbalance(input: &str) -> Option<ParseErrorKind> {
    let mut depth = 0i64;
    let mut chars = input.chars();
    while let Some(c) = chars.next() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth < 0 {
                    return Some(ParseErrorKind::UnmatchedClose);
                }
            }
            '"' => {
                while let Some(string_char) = chars.next() {
                    match string_char {
                        '\\' => {
                            chars.next();
                        }
                        '"' => break,
                        _ => {}
                    }
                }
            }
            ';' => {
                for comment_char in chars.by_ref() {
                    if comment_char == '\n' {
                        break;
                    }
                }
            }
            _ => {}
        }
    }
    (depth > 0).then_some(ParseErrorKind::UnmatchedBracket)
}

/// Convert nom parsing errors to structured parse errors
fn parse_failure(input: &str, error: nom::Err<nom::error::Error<&str>>) -> ParseError {
    match error {
        nom::Err::Error(e) | nom::Err::Failure(e) => {
            let position = input.len().saturating_sub(e.input.len());
            if e.code == ErrorKind::TooLarge {
                return ParseError::from_message(
                    ParseErrorKind::TooDeeplyNested,
                    format!("expression too deeply nested (max depth: {MAX_PARSE_DEPTH})"),
                );
            }
            match bracket_imbalance(input) {
                Some(ParseErrorKind::UnmatchedBracket) => ParseError::with_context(
                    ParseErrorKind::UnmatchedBracket,
                    "unexpected end of input, missing closing bracket",
                    input,
                    position,
                ),
                Some(_) => ParseError::with_context(
                    ParseErrorKind::UnmatchedClose,
                    "unexpected closing bracket",
                    input,
                    position,
                ),
                None => {
                    let rest = &input[position.min(input.len())..];
                    if rest.is_empty() {
                        ParseError::from_message(
                            ParseErrorKind::InvalidSyntax,
                            "unexpected end of input",
                        )
                    } else {
                        let found: String = rest.chars().take(10).collect();
                        ParseError::with_context(
                            ParseErrorKind::InvalidSyntax,
                            format!("invalid syntax near '{found}'"),
                            input,
                            position,
                        )
                    }
                }
            }
        }
        nom::Err::Incomplete(_) => {
            ParseError::from_message(ParseErrorKind::UnmatchedBracket, "incomplete input")
        }
    }
}

/// Recursively validate arity of compiled forms - simpler than threading the
/// check through the parser
fn validate_arity_in_tree(value: &Value) -> Result<(), Error> {
    match value {
        Value::PrimForm { op, args } => {
            if let Err(Error::Arity { expected, got, .. }) = op.validate_arity(args.len()) {
                return Err(Error::arity_with_expr(
                    expected,
                    got,
                    format!("{}", value.to_source_form()),
                ));
            }
            for arg in args {
                validate_arity_in_tree(arg)?;
            }
        }
        Value::List(elements) => {
            for element in elements {
                validate_arity_in_tree(element)?;
            }
        }
        _ => {} // Other value types don't need validation
    }
    Ok(())
}

/// Parse exactly one expression from the input. Trailing non-whitespace
/// content is an error.
pub fn parse_form(input: &str) -> Result<Value, Error> {
    if skip_ws(input).is_empty() {
        return Err(Error::Syntax(ParseError::from_message(
            ParseErrorKind::EmptyExpression,
            "empty input, expected an expression",
        )));
    }

    match parse_sexpr(input, CompileKeywords::Yes, 0) {
        Ok((rest, parsed)) => {
            let rest = skip_ws(rest);
            if rest.is_empty() {
                validate_arity_in_tree(&parsed)?;
                Ok(parsed)
            } else {
                let offset = input.len() - rest.len();
                let found: String = rest.chars().take(10).collect();
                Err(Error::Syntax(ParseError::with_context(
                    ParseErrorKind::TrailingContent,
                    format!("unexpected content after expression: '{found}'"),
                    input,
                    offset,
                )))
            }
        }
        Err(e) => Err(Error::Syntax(parse_failure(input, e))),
    }
}

/// Parse a whole source into its ordered sequence of top-level forms.
/// This is the file-mode entry point; an all-whitespace source is an error.
pub fn parse_program(input: &str) -> Result<Vec<Value>, Error> {
    let mut forms = Vec::new();
    let mut rest = skip_ws(input);

    while !rest.is_empty() {
        match parse_sexpr(rest, CompileKeywords::Yes, 0) {
            Ok((next, parsed)) => {
                validate_arity_in_tree(&parsed)?;
                forms.push(parsed);
                rest = skip_ws(next);
            }
            Err(e) => return Err(Error::Syntax(parse_failure(rest, e))),
        }
    }

    if forms.is_empty() {
        return Err(Error::Syntax(ParseError::from_message(
            ParseErrorKind::EmptyExpression,
            "empty source, expected at least one expression",
        )));
    }
    Ok(forms)
}

#[cfg(test)]
#[expect(clippy::unwrap_used)] // test code OK
mod tests {
    use super::*;
    use crate::Error;
    use crate::ast::{nil, sym, val};

    /// Test result variants for comprehensive parsing tests
    #[derive(Debug)]
    enum ParseTestResult {
        Success(Value), // Parsing should succeed with this value
        SuccessPrimForm(&'static str, Vec<Value>), // Should succeed with PrimForm(keyword, args)
        SpecificError(&'static str), // Parsing should fail with error containing this string
        Error,          // Parsing should fail (any error)
    }
    use ParseTestResult::*;

    /// Helper for successful parse test cases
    fn success<T: Into<Value>>(value: T) -> ParseTestResult {
        Success(value.into())
    }

    /// Helper for PrimForm test cases
    fn prim_form(keyword: &'static str, args: Vec<Value>) -> ParseTestResult {
        SuccessPrimForm(keyword, args)
    }

    /// Run comprehensive parse tests with simplified error reporting
    fn run_parse_tests(test_cases: Vec<(&str, ParseTestResult)>) {
        for (i, (input, expected)) in test_cases.iter().enumerate() {
            let test_id = format!("Parse test #{}", i + 1);
            let result = parse_form(input);

            match (result, expected) {
                (Ok(actual), Success(expected_val)) => {
                    assert_eq!(actual, *expected_val, "{test_id}: value mismatch for '{input}'");
                }

                (Ok(actual), SuccessPrimForm(expected_keyword, expected_args)) => {
                    if let Value::PrimForm { op, args } = &actual {
                        assert_eq!(op.keyword, *expected_keyword, "{test_id}: keyword mismatch");
                        assert_eq!(args, expected_args, "{test_id}: args mismatch");
                    } else {
                        panic!("{test_id}: expected PrimForm, got {actual:?}");
                    }
                }

                (Err(_), Error) => {} // Generic error case passes
                (Err(err), SpecificError(expected_text)) => {
                    let error_msg = format!("{err}");
                    assert!(
                        error_msg.contains(expected_text),
                        "{test_id}: error for '{input}' should contain '{expected_text}', got: {error_msg}"
                    );
                }

                (Ok(actual), Error) => {
                    panic!("{test_id}: expected error for '{input}', got {actual:?}");
                }
                (Ok(actual), SpecificError(expected_text)) => {
                    panic!(
                        "{test_id}: expected error containing '{expected_text}' for '{input}', got {actual:?}"
                    );
                }
                (Err(err), Success(_) | SuccessPrimForm(_, _)) => {
                    panic!("{test_id}: expected success for '{input}', got error {err:?}");
                }
            }
        }
    }

    #[test]
    #[expect(clippy::too_many_lines)] // Comprehensive test coverage is intentionally thorough
    fn test_parser_comprehensive() {
        let test_cases = vec![
            // ===== NUMBER PARSING =====
            ("42", success(42)),
            ("-5", success(-5)),
            ("0", success(0)),
            ("-0", success(0)),
            ("9223372036854775807", success(i64::MAX)),
            ("-9223372036854775808", success(i64::MIN)),
            // Floats require a dot with digits on both sides
            ("3.5", success(3.5)),
            ("-2.25", success(-2.25)),
            ("0.0", success(0.0)),
            ("3.", Error),
            (".5", Error),
            ("123abc", Error),
            ("99999999999999999999", Error),  // Too large for an integer
            ("-99999999999999999999", Error), // Too small for an integer
            ("1.2.3", Error),
            // ===== SYMBOL PARSING =====
            ("foo", success(sym("foo"))),
            ("+", success(sym("+"))),
            (">=", success(sym(">="))),
            ("test-name", success(sym("test-name"))),
            ("test?name", success(sym("test?name"))),
            ("test_name", success(sym("test_name"))),
            ("var123", success(sym("var123"))),
            ("-", success(sym("-"))),
            ("-abc", success(sym("-abc"))),
            // nil is a literal, but longer names are ordinary symbols
            ("nil", Success(Value::Nil)),
            ("nils", success(sym("nils"))),
            // Invalid symbols
            ("123var", Error),
            ("-42name", Error),
            ("test@home", Error),
            ("test#tag", Error),
            // ===== BOOLEAN PARSING =====
            ("#t", success(true)),
            ("#f", success(false)),
            ("#T", Error),
            ("#true", Error),
            // ===== STRING PARSING =====
            ("\"hello\"", success("hello")),
            ("\"hello world\"", success("hello world")),
            ("\"\"", success("")),
            (r#""line\nbreak""#, success("line\nbreak")),
            (r#""tab\there""#, success("tab\there")),
            (r#""quote\"test""#, success("quote\"test")),
            (r#""backslash\\test""#, success("backslash\\test")),
            (r#""other\xchar""#, Error), // Unknown escape
            (r#""unterminated"#, Error),
            (r#""trailing\"#, Error), // ends with a lone backslash
            // ===== LIST PARSING =====
            ("()", success(nil())),
            ("(42)", success([42])),
            ("(1 2 3)", success([1, 2, 3])),
            (
                "(1 hello \"world\" #t)",
                success(vec![val(1), sym("hello"), val("world"), val(true)]),
            ),
            // Forms headed by a keyword compile to PrimForm
            ("(+ 1 2)", prim_form("+", vec![val(1), val(2)])),
            ("(* 3 4 5)", prim_form("*", vec![val(3), val(4), val(5)])),
            ("(< 1 2)", prim_form("<", vec![val(1), val(2)])),
            (
                "(if #t 1 2)",
                prim_form("if", vec![val(true), val(1), val(2)]),
            ),
            ("(null? ())", prim_form("null?", vec![nil()])),
            ("(mod 10 3)", prim_form("mod", vec![val(10), val(3)])),
            // Non-keyword heads stay procedure-call lists
            ("(foo 1 2)", success(vec![sym("foo"), val(1), val(2)])),
            ("(a b c)", success(vec![sym("a"), sym("b"), sym("c")])),
            (
                "(42 is the answer)",
                success(vec![val(42), sym("is"), sym("the"), sym("answer")]),
            ),
            // Nested forms
            ("((1 2) (3 4))", success([[1, 2], [3, 4]])),
            (
                "(car (cdr x))",
                prim_form(
                    "car",
                    vec![Value::PrimForm {
                        op: find_op("cdr").unwrap(),
                        args: vec![sym("x")],
                    }],
                ),
            ),
            // ===== QUOTED LIST LITERALS =====
            ("'(1 2 3)", prim_form("quote", vec![val([1, 2, 3])])),
            ("'()", prim_form("quote", vec![nil()])),
            // Keywords inside quoted data stay symbolic
            (
                "'(+ 1 2)",
                prim_form("quote", vec![val(vec![sym("+"), val(1), val(2)])]),
            ),
            (
                "'(a (b c))",
                prim_form(
                    "quote",
                    vec![val(vec![sym("a"), val(vec![sym("b"), sym("c")])])],
                ),
            ),
            // A nested quote inside data is transparent
            (
                "'(a '(b))",
                prim_form(
                    "quote",
                    vec![val(vec![sym("a"), val(vec![sym("b")])])],
                ),
            ),
            // Longhand quote
            ("(quote x)", prim_form("quote", vec![sym("x")])),
            ("(quote (1 2))", prim_form("quote", vec![val([1, 2])])),
            (
                "(quote (+ 1 2))",
                prim_form("quote", vec![val(vec![sym("+"), val(1), val(2)])]),
            ),
            // Quote applies to lists only
            ("'x", Error),
            ("'42", Error),
            ("''(1)", Error),
            ("(quote)", Error),
            ("(quote a b)", Error),
            // ===== COMMENTS AND WHITESPACE =====
            ("  42  ", success(42)),
            ("\t#t\n", success(true)),
            ("( 1   2\t\n3 )", success([1, 2, 3])),
            ("(   )", success(nil())),
            ("42 ; trailing comment", success(42)),
            ("; leading comment\n42", success(42)),
            ("(+ 1 ; inline\n 2)", prim_form("+", vec![val(1), val(2)])),
            ("; nothing but a comment", SpecificError("empty")),
            // ===== GENERAL ERROR CASES =====
            ("(1 2 3", SpecificError("missing closing bracket")),
            ("((1 2)", SpecificError("missing closing bracket")),
            (")", SpecificError("unexpected closing bracket")),
            ("1 2 3)", SpecificError("unexpected content")),
            ("(1 2))", SpecificError("unexpected content")),
            ("", SpecificError("empty input")),
            ("   ", SpecificError("empty input")),
            ("@invalid", SpecificError("invalid syntax")),
            ("1 2", SpecificError("unexpected content")),
            ("(+ 1 2) (+ 3 4)", SpecificError("unexpected content")),
            // ===== PARSE-TIME ARITY ERRORS =====
            ("(if #t 1)", SpecificError("ArityMismatch")),
            ("(if #t 42 0 extra)", SpecificError("ArityMismatch")),
            ("(if)", SpecificError("ArityMismatch")),
            ("(define x)", SpecificError("ArityMismatch")),
            ("(define x 1 2)", SpecificError("ArityMismatch")),
            ("(set! x)", SpecificError("ArityMismatch")),
            ("(lambda (x))", SpecificError("ArityMismatch")),
            ("(car)", SpecificError("ArityMismatch")),
            ("(car x y)", SpecificError("ArityMismatch")),
            ("(cdr)", SpecificError("ArityMismatch")),
            ("(cons 1)", SpecificError("ArityMismatch")),
            ("(append x)", SpecificError("ArityMismatch")),
            ("(map f)", SpecificError("ArityMismatch")),
            ("(filter p l extra)", SpecificError("ArityMismatch")),
            ("(null? a b)", SpecificError("ArityMismatch")),
            ("(number?)", SpecificError("ArityMismatch")),
            ("(- 1)", SpecificError("ArityMismatch")),
            ("(/ 1 2 3)", SpecificError("ArityMismatch")),
            ("(> 1)", SpecificError("ArityMismatch")),
            // Nested arity errors are caught too
            ("(+ 1 (if #t 1))", SpecificError("ArityMismatch")),
            ("(list? (car))", SpecificError("ArityMismatch")),
            // Variadic folds accept anything, including nothing
            ("(+)", prim_form("+", vec![])),
            ("(*)", prim_form("*", vec![])),
        ];

        run_parse_tests(test_cases);
    }

    #[test]
    fn test_parser_depth_limits() {
        let parens_under_limit = format!(
            "{}x{}",
            "(".repeat(MAX_PARSE_DEPTH - 1),
            ")".repeat(MAX_PARSE_DEPTH - 1)
        );
        let parens_at_limit = format!(
            "{}1{}",
            "(".repeat(MAX_PARSE_DEPTH),
            ")".repeat(MAX_PARSE_DEPTH)
        );

        // The depth failure surfaces where the list parser gives up
        assert!(
            parse_form(&parens_at_limit).is_err(),
            "parens at depth limit should fail to parse"
        );
        assert!(
            parse_form(&parens_under_limit).is_ok(),
            "parens just under depth limit should parse successfully"
        );
    }

    #[test]
    fn test_parse_program_forms() {
        // Multiple top-level forms in source order
        let forms = parse_program("(define x 1)\n; a comment\n(+ x 2)\nx").unwrap();
        assert_eq!(forms.len(), 3);
        assert!(matches!(&forms[0], Value::PrimForm { op, .. } if op.keyword == "define"));
        assert!(matches!(&forms[1], Value::PrimForm { op, .. } if op.keyword == "+"));
        assert_eq!(forms[2], sym("x"));

        // A single form works too
        assert_eq!(parse_program("42").unwrap(), vec![val(42)]);

        // Empty and comment-only sources are errors
        match parse_program("").unwrap_err() {
            Error::Syntax(e) => assert_eq!(e.kind, ParseErrorKind::EmptyExpression),
            other => panic!("expected syntax error, got {other:?}"),
        }
        match parse_program("; just a comment\n").unwrap_err() {
            Error::Syntax(e) => assert_eq!(e.kind, ParseErrorKind::EmptyExpression),
            other => panic!("expected syntax error, got {other:?}"),
        }

        // A malformed form fails the whole program
        assert!(parse_program("(+ 1 2) (oops").is_err());
        // Arity validation applies to every form
        assert!(matches!(
            parse_program("(+ 1 2) (car)").unwrap_err(),
            Error::Arity { .. }
        ));
    }

    #[test]
    fn test_error_kind_classification() {
        let cases = [
            ("(1 2", ParseErrorKind::UnmatchedBracket),
            (")", ParseErrorKind::UnmatchedClose),
            ("", ParseErrorKind::EmptyExpression),
            ("1 2", ParseErrorKind::TrailingContent),
            ("@oops", ParseErrorKind::InvalidSyntax),
        ];
        for (input, expected_kind) in cases {
            match parse_form(input).unwrap_err() {
                Error::Syntax(e) => {
                    assert_eq!(e.kind, expected_kind, "kind mismatch for '{input}'");
                }
                other => panic!("expected syntax error for '{input}', got {other:?}"),
            }
        }
    }
}
