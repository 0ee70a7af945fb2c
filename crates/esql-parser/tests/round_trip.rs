//! Round-trip tests: rendering fixed points and re-parsing from spans.

mod common;
use common::*;

use esql_parser::ast::{Command, Field, QualifiedName};
use esql_parser::lexer::lookup_keyword;
use esql_parser::{LexMode, Parser, ParserConfig, Query};
use proptest::prelude::*;

/// Re-parses every field, sort key and projected name from its own span.
fn assert_node_spans(source: &str, query: &Query) {
    let config = ParserConfig::default();
    for command in &query.commands {
        let fields: &[Field] = match command {
            Command::Row(c) => &c.fields[..],
            Command::Eval(c) => &c.fields[..],
            Command::Stats(c) => &c.fields[..],
            _ => &[],
        };
        for field in fields {
            let reparsed = Parser::with_range(source, field.span, &config)
                .parse_field()
                .unwrap_or_else(|e| panic!("Field {:?}: {e}", field.span.slice(source)));
            assert_eq!(&reparsed, field);
        }

        if let Command::Sort(sort) = command {
            for order in &sort.orders {
                let reparsed = Parser::with_range(source, order.span, &config)
                    .parse_order_expression()
                    .unwrap_or_else(|e| panic!("Order {:?}: {e}", order.span.slice(source)));
                assert_eq!(&reparsed, order);
            }
        }

        let patterns: &[QualifiedName] = match command {
            Command::Keep(c) => &c.names[..],
            Command::Drop(c) => &c.names[..],
            _ => &[],
        };
        for pattern in patterns {
            let reparsed = Parser::with_range(source, pattern.span, &config)
                .parse_name_pattern()
                .unwrap_or_else(|e| panic!("Pattern {:?}: {e}", pattern.span.slice(source)));
            assert_eq!(&reparsed, pattern);
        }

        let names: &[QualifiedName] = match command {
            Command::MvExpand(c) => &c.names[..],
            Command::Stats(c) => &c.group_by[..],
            _ => &[],
        };
        for name in names {
            let reparsed = Parser::with_range(source, name.span, &config)
                .parse_qualified_name()
                .unwrap_or_else(|e| panic!("Name {:?}: {e}", name.span.slice(source)));
            assert_eq!(&reparsed, name);
        }
    }
}

// ===================================================================
// Rendering fixed points
// ===================================================================

#[test]
fn round_trip_commands() {
    round_trip("FROM logs-*, `my index` [METADATA _id] | LIMIT 1");
    round_trip("ROW a = 1, b = \"two\", c = [1.5, 2], d = null, 3 days");
    round_trip("SHOW functions");
    round_trip("EXPLAIN [FROM a | EXPLAIN [ROW x = 1]]");
    round_trip("FROM a | RENAME b AS c | DROP d.* | MV_EXPAND e");
    round_trip(r#"FROM a | DISSECT msg """%{a} "x" %{b}""" sep = "\t" | GROK msg "%{IP:ip}""#);
    round_trip("FROM a | STATS BY b | STATS | STATS c = count(*)");
    round_trip("FROM a | ENRICH `p` ON `k` WITH n = `s`, t");
    round_trip("FROM a | SORT b ASC NULLS FIRST, c + 1 DESC");
    round_trip("FROM a METADATA _id, _index | KEEP emp_*, *name | DROP tmp_*");
    round_trip("FROM a | INLINESTATS n = count(*) BY day | RENAME a* AS b*");
    round_trip("ROW year = 2024, info.x = [-1, +2], p = ? | DISSECT m \"%{a}\" n = -1");
}

#[test]
fn round_trip_expressions() {
    round_trip("ROW a = (1 + 2) * 3 - -4 % x");
    round_trip("ROW a = NOT (b OR c) AND NOT NOT d");
    round_trip("ROW a = round(b * 1.0, 2) > abs(c), `first` = host.`last`");
    round_trip("ROW a = f(g(), *, x OR y)");
    round_trip("ROW a = 1e-7, b = 12.0, c = 9223372036854775807");
    round_trip("ROW a = \"quote \\\" and backslash \\\\\"");
}

#[test]
fn rendering_normalizes() {
    let query = parse("from   logs\n|where(a)and   b\n|limit 5");
    assert_eq!(query.to_string(), "FROM logs | WHERE a AND b | LIMIT 5");
}

// ===================================================================
// Span re-parsing
// ===================================================================

#[test]
fn spans_reparse_to_equal_nodes() {
    let source = "FROM logs\n| EVAL a = b + 1, c = round(d, 2), x.y = 3\n| STATS n = count(*) BY host.name, zone\n\
                  | SORT n DESC NULLS LAST, a\n| KEEP n, host.*, emp_*\n| DROP `a b`, *_tmp";
    let query = parse(source);
    assert_node_spans(source, &query);
    assert_command_spans(source);
}

#[test]
fn field_span_covers_name_and_value() {
    let source = "ROW total = price * 2";
    let query = parse(source);
    let Command::Row(row) = &query.commands[0] else {
        panic!("Expected ROW");
    };
    assert_eq!(row.fields[0].span.slice(source), Some("total = price * 2"));
}

#[test]
fn spans_in_explain_are_absolute() {
    let source = "EXPLAIN [FROM a | LIMIT 3]";
    let query = parse(source);
    let Command::Explain(explain) = &query.commands[0] else {
        panic!("Expected EXPLAIN");
    };
    assert_eq!(explain.query.span.slice(source), Some("FROM a | LIMIT 3"));
    assert_eq!(explain.query.commands[1].span().slice(source), Some("LIMIT 3"));
}

// ===================================================================
// Generated queries
// ===================================================================

fn arb_name() -> impl Strategy<Value = String> {
    prop_oneof![
        4 => "[a-z][a-z0-9_]{0,6}"
            .prop_filter("keywords must be quoted", |s| {
                lookup_keyword(LexMode::Default, s).is_none()
            }),
        1 => Just("`first`".to_string()),
        1 => Just("host.name".to_string()),
        1 => Just("@timestamp".to_string()),
    ]
}

fn arb_literal() -> impl Strategy<Value = String> {
    prop_oneof![
        any::<u32>().prop_map(|n| n.to_string()),
        (0u32..10_000, 0u32..100).prop_map(|(a, b)| format!("{a}.{b}")),
        Just("null".to_string()),
        any::<bool>().prop_map(|b| b.to_string()),
        "[a-z %*]{0,8}".prop_map(|s| format!("\"{s}\"")),
        (1u32..100, prop_oneof![Just("days"), Just("hour"), Just("minutes")])
            .prop_map(|(n, unit)| format!("{n} {unit}")),
        Just("[1, 2.5]".to_string()),
    ]
}

fn arb_arith() -> impl Strategy<Value = String> {
    let leaf = prop_oneof![arb_name(), arb_literal()];
    leaf.prop_recursive(4, 24, 3, |inner| {
        prop_oneof![
            (
                inner.clone(),
                prop_oneof![Just("+"), Just("-"), Just("*"), Just("/"), Just("%")],
                inner.clone(),
            )
                .prop_map(|(l, op, r)| format!("{l} {op} {r}")),
            inner.clone().prop_map(|e| format!("-{e}")),
            inner.clone().prop_map(|e| format!("({e})")),
            prop::collection::vec(inner.clone(), 0..3)
                .prop_map(|args| format!("round({})", args.join(", "))),
            prop::collection::vec(inner, 0..3)
                .prop_map(|args| format!("my_udf({})", args.join(", "))),
        ]
    })
}

fn arb_expr() -> impl Strategy<Value = String> {
    let value = prop_oneof![
        3 => arb_arith(),
        2 => (
            arb_arith(),
            prop_oneof![Just("=="), Just("!="), Just("<"), Just("<="), Just(">"), Just(">=")],
            arb_arith(),
        )
            .prop_map(|(l, op, r)| format!("{l} {op} {r}")),
    ];
    value.prop_recursive(3, 16, 2, |inner| {
        prop_oneof![
            (inner.clone(), inner.clone()).prop_map(|(l, r)| format!("{l} AND {r}")),
            (inner.clone(), inner.clone()).prop_map(|(l, r)| format!("{l} OR {r}")),
            inner.clone().prop_map(|e| format!("NOT {e}")),
            inner.prop_map(|e| format!("({e})")),
        ]
    })
}

fn arb_processing() -> impl Strategy<Value = String> {
    prop_oneof![
        prop::collection::vec(arb_expr(), 1..3).prop_map(|values| {
            let fields: Vec<_> = values
                .iter()
                .enumerate()
                .map(|(i, value)| format!("c{i} = {value}"))
                .collect();
            format!("EVAL {}", fields.join(", "))
        }),
        arb_expr().prop_map(|e| format!("WHERE {e}")),
        (arb_expr(), prop_oneof![Just(""), Just(" ASC"), Just(" DESC NULLS FIRST")])
            .prop_map(|(e, dir)| format!("SORT {e}{dir}")),
        any::<u32>().prop_map(|n| format!("LIMIT {n}")),
        Just("KEEP a, b.*".to_string()),
        Just("STATS n = count(*) BY host".to_string()),
        Just("ENRICH policy ON key WITH x = y".to_string()),
    ]
}

fn arb_query() -> impl Strategy<Value = String> {
    let source = prop_oneof![
        Just("FROM logs-*".to_string()),
        arb_expr().prop_map(|e| format!("ROW x = {e}")),
    ];
    (source, prop::collection::vec(arb_processing(), 0..4)).prop_map(|(source, rest)| {
        let mut commands = vec![source];
        commands.extend(rest);
        commands.join(" | ")
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn generated_expressions_render_to_fixed_point(input in arb_expr()) {
        let first = Parser::new(&input).parse_expression();
        prop_assert!(first.is_ok(), "failed to parse {input}: {first:?}");
        let rendered = first.unwrap().to_string();
        let second = Parser::new(&rendered).parse_expression();
        prop_assert!(second.is_ok(), "failed to re-parse {rendered}: {second:?}");
        prop_assert_eq!(second.unwrap().to_string(), rendered);
    }

    #[test]
    fn generated_queries_render_to_fixed_point(input in arb_query()) {
        let first = esql_parser::parse(&input);
        prop_assert!(first.is_ok(), "failed to parse {input}: {first:?}");
        let first = first.unwrap();
        let rendered = first.to_string();
        let second = esql_parser::parse(&rendered);
        prop_assert!(second.is_ok(), "failed to re-parse {rendered}: {second:?}");
        let second = second.unwrap();
        prop_assert_eq!(second.commands.len(), first.commands.len());
        prop_assert_eq!(second.to_string(), rendered);
    }

    #[test]
    fn generated_query_spans_reparse(input in arb_query()) {
        let query = esql_parser::parse(&input);
        prop_assert!(query.is_ok(), "failed to parse {input}: {query:?}");
        assert_node_spans(&input, &query.unwrap());
        assert_command_spans(&input);
    }

    #[test]
    fn arbitrary_input_never_panics(input in "\\PC{0,64}") {
        let _ = esql_parser::parse(&input);
    }

    #[test]
    fn arbitrary_tokens_never_panic(
        words in prop::collection::vec(
            prop_oneof![
                Just("FROM"), Just("ROW"), Just("EXPLAIN"), Just("|"), Just("["), Just("]"),
                Just("("), Just(")"), Just("NOT"), Just("WHERE"), Just("ENRICH"), Just("ON"),
                Just("a"), Just("1"), Just(","), Just("="), Just("IN"), Just("\""),
            ],
            0..24,
        )
    ) {
        let input = words.join(" ");
        if let Err(err) = esql_parser::parse(&input) {
            prop_assert!(err.span.end <= input.len());
        }
    }
}
