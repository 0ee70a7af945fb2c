//! Tests for the shape of each source and processing command.

mod common;
use common::*;

use esql_parser::ast::{
    Arith, Command, Constant, Expr, NullsOrder, Number, Primary, QualifiedName, ShowTarget,
    SortDirection, Value,
};
use esql_parser::Span;

// ===================================================================
// Pipeline structure
// ===================================================================

#[test]
fn pipeline_source_then_processing() {
    let query = parse("FROM logs | EVAL a = 1 | WHERE a > 0 | KEEP a | LIMIT 5");
    assert_eq!(query.commands.len(), 5);
    assert!(query.commands[0].is_source());
    assert!(query.commands[1..].iter().all(Command::is_processing));
    let keywords: Vec<_> = query.commands.iter().map(Command::keyword).collect();
    assert_eq!(keywords, ["FROM", "EVAL", "WHERE", "KEEP", "LIMIT"]);
}

#[test]
fn pipeline_source_only() {
    let query = parse("ROW a = 1");
    assert_eq!(query.commands.len(), 1);
    assert_eq!(query.source().map(Command::keyword), Some("ROW"));
    assert!(query.processing().is_empty());
}

#[test]
fn pipeline_keywords_case_insensitive() {
    let query = parse("from logs | Where x == 1 | lImIt 3");
    assert_eq!(query.to_string(), "FROM logs | WHERE x == 1 | LIMIT 3");
}

#[test]
fn pipeline_comments_and_newlines() {
    let query = parse("FROM logs // all logs\n| /* keep it short */ LIMIT 1\n");
    assert_eq!(query.commands.len(), 2);
    assert_eq!(query.span, Span::new(0, 51));
}

// ===================================================================
// Source commands
// ===================================================================

#[test]
fn from_multiple_sources() {
    let Command::From(from) = command("FROM logs-*, remote:metrics, .ds-2024.01", 0) else {
        panic!("Expected FROM");
    };
    let names: Vec<_> = from.sources.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, ["logs-*", "remote:metrics", ".ds-2024.01"]);
    assert!(from.metadata.is_empty());
}

#[test]
fn from_with_metadata() {
    let Command::From(from) = command("FROM logs [METADATA _id, _index] | LIMIT 1", 0) else {
        panic!("Expected FROM");
    };
    let names: Vec<_> = from.metadata.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, ["_id", "_index"]);
}

#[test]
fn from_with_bare_metadata() {
    let Command::From(from) = command("FROM logs METADATA _id, _index | LIMIT 1", 0) else {
        panic!("Expected FROM");
    };
    let names: Vec<_> = from.metadata.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, ["_id", "_index"]);
    assert_eq!(
        parse("from logs metadata _id").to_string(),
        "FROM logs METADATA _id"
    );
    // The bracketed form renders in the bare form
    assert_eq!(
        parse("FROM a [METADATA _id]").to_string(),
        "FROM a METADATA _id"
    );
}

#[test]
fn from_quoted_source() {
    let Command::From(from) = command("FROM `my index`", 0) else {
        panic!("Expected FROM");
    };
    assert_eq!(from.sources[0].name, "my index");
    assert!(from.sources[0].quoted);
}

#[test]
fn from_source_keeps_keyword_like_names() {
    // Command keywords are not reserved inside FROM
    let Command::From(from) = command("FROM where, stats", 0) else {
        panic!("Expected FROM");
    };
    assert_eq!(from.sources.len(), 2);
    assert_eq!(from.sources[1].name, "stats");
}

#[test]
fn row_fields() {
    let Command::Row(row) = command("ROW a = 1, \"x\", c = [1, 2]", 0) else {
        panic!("Expected ROW");
    };
    assert_eq!(row.fields.len(), 3);
    assert_eq!(row.fields[0].name.as_ref().map(QualifiedName::dotted).as_deref(), Some("a"));
    assert!(row.fields[1].name.is_none());
    assert_eq!(row.fields[2].value.to_string(), "[1, 2]");
}

#[test]
fn show_targets() {
    let Command::Show(show) = command("SHOW info", 0) else {
        panic!("Expected SHOW");
    };
    assert_eq!(show.target, ShowTarget::Info);
    let Command::Show(show) = command("SHOW FUNCTIONS", 0) else {
        panic!("Expected SHOW");
    };
    assert_eq!(show.target, ShowTarget::Functions);
}

#[test]
fn explain_subquery() {
    let Command::Explain(explain) =
        command("EXPLAIN [FROM logs | STATS c = count(*) BY host] | LIMIT 1", 0)
    else {
        panic!("Expected EXPLAIN");
    };
    assert_eq!(explain.query.commands.len(), 2);
    assert_eq!(
        explain.query.to_string(),
        "FROM logs | STATS c = count(*) BY host"
    );
}

#[test]
fn explain_nested() {
    let query = parse("EXPLAIN [EXPLAIN [ROW a = 1]]");
    assert_eq!(query.to_string(), "EXPLAIN [EXPLAIN [ROW a = 1]]");
}

// ===================================================================
// Processing commands
// ===================================================================

#[test]
fn eval_fields() {
    let Command::Eval(eval) = command("FROM a | EVAL x = b * 2, upper = to_string(c)", 1) else {
        panic!("Expected EVAL");
    };
    assert_eq!(eval.fields.len(), 2);
    assert_eq!(eval.fields[1].to_string(), "upper = to_string(c)");
}

#[test]
fn limit_count() {
    let Command::Limit(limit) = command("FROM a | LIMIT 18446744073709551615", 1) else {
        panic!("Expected LIMIT");
    };
    assert_eq!(limit.count, u64::MAX);
}

#[test]
fn keep_and_project() {
    let Command::Keep(keep) = command("FROM a | KEEP host.*, `first`, msg", 1) else {
        panic!("Expected KEEP");
    };
    assert_eq!(keep.names.len(), 3);
    assert_eq!(keep.names[0].dotted(), "host.*");
    assert_eq!(keep.names[1].dotted(), "first");

    // PROJECT is accepted and renders as KEEP
    let query = parse("FROM a | PROJECT b");
    assert_eq!(query.to_string(), "FROM a | KEEP b");
}

#[test]
fn drop_names() {
    let Command::Drop(drop) = command("FROM a | DROP b, c.d", 1) else {
        panic!("Expected DROP");
    };
    assert_eq!(drop.names[1].dotted(), "c.d");
}

#[test]
fn rename_clauses() {
    let Command::Rename(rename) = command("FROM a | RENAME b AS c, d.e AS f", 1) else {
        panic!("Expected RENAME");
    };
    assert_eq!(rename.clauses.len(), 2);
    assert_eq!(rename.clauses[1].from.dotted(), "d.e");
    assert_eq!(rename.clauses[1].to.dotted(), "f");
}

#[test]
fn dissect_with_options() {
    let Command::Dissect(dissect) =
        command(r#"FROM a | DISSECT msg "%{a} %{b}" append_separator = "-""#, 1)
    else {
        panic!("Expected DISSECT");
    };
    assert_eq!(dissect.targets[0].dotted(), "msg");
    assert_eq!(dissect.pattern, "%{a} %{b}");
    assert_eq!(dissect.options.len(), 1);
    assert_eq!(dissect.options[0].key.name, "append_separator");
    assert_eq!(dissect.options[0].value, Constant::String("-".into()));
}

#[test]
fn dissect_without_options() {
    let Command::Dissect(dissect) = command(r#"FROM a | DISSECT msg """%{a}\n""" | LIMIT 1"#, 1)
    else {
        panic!("Expected DISSECT");
    };
    assert_eq!(dissect.pattern, r"%{a}\n");
    assert!(dissect.options.is_empty());
}

#[test]
fn grok_pattern() {
    let Command::Grok(grok) = command(r#"FROM a | GROK msg "%{IP:ip} \"x\"""#, 1) else {
        panic!("Expected GROK");
    };
    assert_eq!(grok.pattern, r#"%{IP:ip} "x""#);
}

#[test]
fn sort_orders() {
    let Command::Sort(sort) = command("FROM a | SORT b, c DESC, d ASC NULLS FIRST, e NULLS LAST", 1)
    else {
        panic!("Expected SORT");
    };
    let shapes: Vec<_> = sort.orders.iter().map(|o| (o.direction, o.nulls)).collect();
    assert_eq!(
        shapes,
        [
            (None, None),
            (Some(SortDirection::Desc), None),
            (Some(SortDirection::Asc), Some(NullsOrder::First)),
            (None, Some(NullsOrder::Last)),
        ]
    );
}

#[test]
fn stats_fields_and_group_by() {
    let Command::Stats(stats) = command("FROM a | STATS avg(x), m = max(y) BY host, zone", 1)
    else {
        panic!("Expected STATS");
    };
    assert_eq!(stats.fields.len(), 2);
    assert_eq!(stats.group_by.len(), 2);
}

#[test]
fn stats_optional_clauses() {
    let Command::Stats(stats) = command("FROM a | STATS BY host", 1) else {
        panic!("Expected STATS");
    };
    assert!(stats.fields.is_empty());
    assert_eq!(stats.group_by.len(), 1);

    let Command::Stats(stats) = command("FROM a | STATS count(*)", 1) else {
        panic!("Expected STATS");
    };
    assert!(stats.group_by.is_empty());

    let Command::Stats(stats) = command("FROM a | STATS | LIMIT 1", 1) else {
        panic!("Expected STATS");
    };
    assert!(stats.fields.is_empty() && stats.group_by.is_empty());
}

#[test]
fn mv_expand_names() {
    let Command::MvExpand(expand) = command("FROM a | MV_EXPAND tags", 1) else {
        panic!("Expected MV_EXPAND");
    };
    assert_eq!(expand.names[0].dotted(), "tags");
}

#[test]
fn enrich_full() {
    let Command::Enrich(enrich) =
        command("FROM a | ENRICH hosts-policy ON host.name WITH zone = region, owner", 1)
    else {
        panic!("Expected ENRICH");
    };
    assert_eq!(enrich.policy.name, "hosts-policy");
    assert_eq!(
        enrich.match_field.as_ref().map(|f| f.name.as_str()),
        Some("host.name")
    );
    assert_eq!(enrich.with.len(), 2);
    assert_eq!(
        enrich.with[0].new_name.as_ref().map(|n| n.name.as_str()),
        Some("zone")
    );
    assert_eq!(enrich.with[0].source_field.name, "region");
    assert!(enrich.with[1].new_name.is_none());
}

#[test]
fn enrich_policy_only() {
    let Command::Enrich(enrich) = command("FROM a | ENRICH languages | LIMIT 1", 1) else {
        panic!("Expected ENRICH");
    };
    assert!(enrich.match_field.is_none());
    assert!(enrich.with.is_empty());
}

// ===================================================================
// Time units and SHOW targets as names
// ===================================================================

#[test]
fn time_unit_as_field_name() {
    let Command::Row(row) = command("ROW year = 2024, 1 year", 0) else {
        panic!("Expected ROW");
    };
    assert_eq!(row.fields[0].name.as_ref().map(QualifiedName::dotted).as_deref(), Some("year"));
    assert_eq!(row.fields[0].value.to_string(), "2024");
    // After a number the word is still a time unit
    assert!(matches!(
        &row.fields[1].value,
        Expr::Value(Value::Arith(Arith::Primary(Primary::Date(_))))
    ));
}

#[test]
fn time_unit_as_group_key() {
    let Command::Stats(stats) = command("FROM a | STATS c = count(*) BY day", 1) else {
        panic!("Expected STATS");
    };
    assert_eq!(stats.group_by[0].dotted(), "day");

    let Command::Stats(stats) = command("FROM a | STATS hours = sum(h) BY month.name", 1) else {
        panic!("Expected STATS");
    };
    assert_eq!(stats.fields.len(), 1);
    assert_eq!(stats.group_by[0].dotted(), "month.name");
}

#[test]
fn show_targets_as_names() {
    let Command::Keep(keep) = command("FROM a | KEEP info, functions", 1) else {
        panic!("Expected KEEP");
    };
    let names: Vec<_> = keep.names.iter().map(QualifiedName::dotted).collect();
    assert_eq!(names, ["info", "functions"]);

    let Command::Eval(eval) = command("FROM a | EVAL functions = info + 1", 1) else {
        panic!("Expected EVAL");
    };
    assert_eq!(eval.fields[0].to_string(), "functions = info + 1");
}

// ===================================================================
// Name patterns
// ===================================================================

#[test]
fn keep_name_patterns() {
    let Command::Keep(keep) = command("FROM logs | KEEP first_name*, emp_*, *name*, a.*_id", 1)
    else {
        panic!("Expected KEEP");
    };
    let names: Vec<_> = keep.names.iter().map(QualifiedName::dotted).collect();
    assert_eq!(names, ["first_name*", "emp_*", "*name*", "a.*_id"]);
    assert!(keep.names.iter().all(|n| n.parts.iter().all(|p| !p.quoted)));
}

#[test]
fn drop_and_rename_patterns() {
    let query = parse("FROM logs | DROP tmp_* | RENAME emp_* AS employee_*");
    assert_eq!(
        query.to_string(),
        "FROM logs | DROP tmp_* | RENAME emp_* AS employee_*"
    );
}

#[test]
fn pattern_pieces_must_touch() {
    // `a *` is a name followed by a stray `*`
    let err = parse_err("FROM logs | KEEP a *");
    assert_eq!(err.found, esql_parser::TokenKind::Star);
}

// ===================================================================
// Signed constants, parameters, dotted field names and INLINESTATS
// ===================================================================

#[test]
fn signed_array_items() {
    let Command::Row(row) = command("ROW a = [-1, 2], b = [1.5, -2.5, +3]", 0) else {
        panic!("Expected ROW");
    };
    assert_eq!(
        row.fields[0].value,
        Expr::Value(Value::Arith(Arith::Primary(Primary::Constant(
            Constant::NumericArray(vec![Number::Integer(-1), Number::Integer(2)])
        ))))
    );
    assert_eq!(row.fields[1].value.to_string(), "[1.5, -2.5, 3]");
    assert!(esql_parser::parse("ROW a = [-9223372036854775808]").is_ok());
}

#[test]
fn signed_dissect_option() {
    let source = "FROM a | DISSECT m \"%{x}\" n = -1, r = -0.5";
    let query = parse(source);
    let Command::Dissect(dissect) = &query.commands[1] else {
        panic!("Expected DISSECT");
    };
    assert_eq!(dissect.options[0].value, Constant::Integer(-1));
    assert_eq!(dissect.options[1].value, Constant::Decimal(-0.5));
    assert_eq!(query.to_string(), source);
}

#[test]
fn input_parameters() {
    let Command::Row(row) = command("ROW a = ?, b = ? + 1", 0) else {
        panic!("Expected ROW");
    };
    assert_eq!(
        row.fields[0].value,
        Expr::Value(Value::Arith(Arith::Primary(Primary::Constant(Constant::Param))))
    );
    assert_eq!(
        parse("FROM a | WHERE b > ? AND c IN (?, 2)").to_string(),
        "FROM a | WHERE b > ? AND c IN (?, 2)"
    );
}

#[test]
fn dotted_field_names() {
    let Command::Eval(eval) = command("FROM a | EVAL a.b = 1, c.`d e` = 2, f.g", 1) else {
        panic!("Expected EVAL");
    };
    assert_eq!(eval.fields[0].name.as_ref().map(QualifiedName::dotted).as_deref(), Some("a.b"));
    assert_eq!(eval.fields[1].to_string(), "c.`d e` = 2");
    assert!(eval.fields[2].name.is_none());
    assert_eq!(eval.fields[2].value.to_string(), "f.g");
}

#[test]
fn inlinestats_command() {
    let query = parse("FROM a | INLINESTATS m = max(b) BY c | LIMIT 1");
    let Command::InlineStats(stats) = &query.commands[1] else {
        panic!("Expected INLINESTATS");
    };
    assert_eq!(stats.fields.len(), 1);
    assert_eq!(stats.group_by[0].dotted(), "c");
    assert_eq!(
        query.to_string(),
        "FROM a | INLINESTATS m = max(b) BY c | LIMIT 1"
    );
}

// ===================================================================
// Spans
// ===================================================================

#[test]
fn command_spans() {
    let source = "FROM logs | WHERE a > 1 | LIMIT 10";
    let query = parse(source);
    let slices: Vec<_> = query
        .commands
        .iter()
        .map(|c| c.span().slice(source).unwrap_or_default())
        .collect();
    assert_eq!(slices, ["FROM logs", "WHERE a > 1", "LIMIT 10"]);
}

#[test]
fn command_spans_reparse() {
    assert_command_spans(
        "FROM logs-*, other [METADATA _id] | WHERE a IN (1, 2) AND NOT b LIKE \"x*\" \
         | EVAL c = round(d * 2, 1) | STATS n = count(*) BY host | SORT n DESC NULLS LAST \
         | RENAME n AS total | DISSECT msg \"%{a}\" x = 1 | GROK msg \"%{b}\" \
         | ENRICH p ON a WITH b = c | MV_EXPAND tags | DROP x | KEEP total | LIMIT 10",
    );
    assert_command_spans("EXPLAIN [FROM a | LIMIT 1] | LIMIT 2");
    assert_command_spans("ROW a = 1 day, b = [true, false]");
    assert_command_spans("SHOW INFO");
}

#[test]
fn end_to_end_scenario() {
    let query = parse(
        "FROM logs | WHERE status >= 500 AND NOT (user IS NULL) \
         | STATS count = COUNT(*) BY user | SORT count DESC NULLS LAST | LIMIT 10",
    );
    assert_eq!(query.commands.len(), 5);

    let Command::From(from) = &query.commands[0] else {
        panic!("Expected FROM");
    };
    assert_eq!(from.sources.len(), 1);
    assert_eq!(from.sources[0].name, "logs");

    let Command::Where(filter) = &query.commands[1] else {
        panic!("Expected WHERE");
    };
    assert_eq!(
        where_sexpr(&filter.condition),
        "(and (>= status 500) (not [user IS NULL]))"
    );

    let Command::Stats(stats) = &query.commands[2] else {
        panic!("Expected STATS");
    };
    assert_eq!(stats.fields.len(), 1);
    assert_eq!(
        stats.fields[0].name.as_ref().map(QualifiedName::dotted).as_deref(),
        Some("count")
    );
    assert_eq!(stats.fields[0].value.to_string(), "COUNT(*)");
    assert_eq!(stats.group_by[0].dotted(), "user");

    let Command::Sort(sort) = &query.commands[3] else {
        panic!("Expected SORT");
    };
    assert_eq!(sort.orders[0].expr.to_string(), "count");
    assert_eq!(sort.orders[0].direction, Some(SortDirection::Desc));
    assert_eq!(sort.orders[0].nulls, Some(NullsOrder::Last));

    assert!(matches!(
        query.commands[4],
        Command::Limit(ref limit) if limit.count == 10
    ));
}

#[test]
fn row_decimal_constant() {
    let Command::Row(row) = command("ROW a = 1.5e3", 0) else {
        panic!("Expected ROW");
    };
    let Expr::Value(Value::Arith(Arith::Primary(Primary::Constant(constant)))) = &row.fields[0].value
    else {
        panic!("Expected constant");
    };
    assert_eq!(*constant, Constant::from(Number::Decimal(1500.0)));
    assert_eq!(row.fields[0].to_string(), "a = 1500.0");
}
