// ABOUTME: Integration tests for the expression language: parsing, evaluation and builtins.
// ABOUTME: Exercises method sugar, slicing, lambdas, lookups and JSON conversion.

use std::collections::BTreeMap;

use escape::expr::{
    MAX_NESTING, Script, ScriptEnvironment, ScriptError, builtin_name, parse_script,
};
use serde_json::json;

fn env_with(globals: &[(&str, Script)]) -> ScriptEnvironment {
    let globals: BTreeMap<String, Script> = globals
        .iter()
        .map(|(name, value)| (name.to_string(), value.clone()))
        .collect();
    ScriptEnvironment::with_globals(globals)
}

fn list(items: &[&str]) -> Script {
    Script::List(items.iter().map(|s| Script::string(*s)).collect())
}

fn eval(env: &ScriptEnvironment, source: &str) -> Script {
    env.eval_str(source)
        .unwrap_or_else(|e| panic!("'{source}' failed: {e}"))
}

// =============================================================================
// Literals
// =============================================================================

/// Test: A quoted string evaluates to its contents.
#[test]
fn quoted_string_literal() {
    let env = ScriptEnvironment::new();
    assert_eq!(eval(&env, r#""test""#), Script::string("test"));
}

/// Test: Plain strings are literals and are not parsed.
#[test]
fn plain_strings_pass_through() {
    let env = ScriptEnvironment::new();
    assert_eq!(eval(&env, "hello world"), Script::string("hello world"));
    assert_eq!(eval(&env, "a.b(c"), Script::string("a.b(c"));
}

/// Test: A leading `$$` escapes a literal dollar sign.
#[test]
fn double_dollar_is_an_escaped_literal() {
    let env = ScriptEnvironment::new();
    assert_eq!(eval(&env, "$$HOME"), Script::string("$HOME"));
    assert_eq!(eval(&env, "$$"), Script::string("$"));
}

/// Test: Escape sequences in quoted strings are decoded.
#[test]
fn string_escapes() {
    let env = ScriptEnvironment::new();
    assert_eq!(eval(&env, r#""a\"b\\c""#), Script::string(r#"a"b\c"#));
    assert_eq!(eval(&env, r#""line\nnext""#), Script::string("line\nnext"));
}

/// Test: Integer literals, including negative ones.
#[test]
fn integer_literals() {
    let env = ScriptEnvironment::new();
    assert_eq!(
        eval(&env, r#""x".length().add(-3)"#),
        Script::Integer(-2)
    );
}

/// Test: Parse failures report the input and a position.
#[test]
fn parse_errors_carry_position() {
    let err = parse_script("$name)").unwrap_err();
    assert_eq!(err.input, "$name)");
    assert_eq!(err.position, 5);

    assert!(parse_script(r#""unterminated"#).is_err());
    assert!(parse_script("$").is_err());
    assert!(parse_script("$lst[]").is_err());
}

// =============================================================================
// Globals, fields and method sugar
// =============================================================================

/// Test: `$name` looks up a global.
#[test]
fn global_lookup() {
    let env = env_with(&[("name", Script::string("archive"))]);
    assert_eq!(eval(&env, "$name"), Script::string("archive"));
}

/// Test: Field access walks nested dicts.
#[test]
fn nested_field_access() {
    let inner = Script::dict([("deployment", Script::string("archive-full"))]);
    let env = env_with(&[("this", Script::dict([("inner", inner)]))]);
    assert_eq!(
        eval(&env, "$this.inner.deployment"),
        Script::string("archive-full")
    );
}

/// Test: A method call passes the receiver as the first argument.
#[test]
fn method_call_sugar() {
    let env = env_with(&[("name", Script::string("escape"))]);
    assert_eq!(eval(&env, "$name.upper()"), Script::string("ESCAPE"));
    assert_eq!(
        eval(&env, r#"$name.concat("-", "v1")"#),
        Script::string("escape-v1")
    );
}

/// Test: Builtins can also be called by their prefixed global name.
#[test]
fn builtins_are_callable_directly() {
    let env = ScriptEnvironment::new();
    let source = format!(r#"${}("abc")"#, builtin_name("upper"));
    assert_eq!(eval(&env, &source), Script::string("ABC"));
}

/// Test: User globals shadow builtins with the same name.
#[test]
fn user_globals_shadow_builtins() {
    let name = builtin_name("upper");
    let env = env_with(&[(name.as_str(), Script::string("shadowed"))]);
    assert_eq!(
        eval(&env, &format!("${}", builtin_name("upper"))),
        Script::string("shadowed")
    );
}

/// Test: Unknown dict keys list the known keys.
#[test]
fn unknown_key_reports_known_keys() {
    let env = env_with(&[("this", Script::dict([("name", Script::string("x"))]))]);
    match env.eval_str("$this.version") {
        Err(ScriptError::UnknownKey { key, known }) => {
            assert_eq!(key, "version");
            assert_eq!(known, vec!["name".to_string()]);
        }
        other => panic!("expected UnknownKey, got {other:?}"),
    }
}

/// Test: Unknown globals are reported as missing keys of the globals dict.
#[test]
fn unknown_global_is_an_error() {
    let env = ScriptEnvironment::new();
    assert!(matches!(
        env.eval_str("$missing"),
        Err(ScriptError::UnknownKey { key, .. }) if key == "missing"
    ));
}

/// Test: Dict values are evaluated lazily on lookup.
#[test]
fn dict_values_are_evaluated_on_lookup() {
    let lazy = parse_script(r#""lazy".upper()"#).unwrap();
    let env = env_with(&[("d", Script::dict([("v", lazy)]))]);
    assert_eq!(eval(&env, "$d.v"), Script::string("LAZY"));
}

/// Test: Values that are not callable cannot be applied.
#[test]
fn applying_an_integer_fails() {
    let env = env_with(&[("n", Script::Integer(3))]);
    assert!(matches!(
        env.eval_str("$n.field"),
        Err(ScriptError::NotCallable("integer"))
    ));
}

// =============================================================================
// Lists
// =============================================================================

/// Test: Slicing then joining.
#[test]
fn slice_and_join() {
    let env = env_with(&[("lst", list(&["a", "b", "c"]))]);
    assert_eq!(eval(&env, r#"$lst[0:2].join(", ")"#), Script::string("a, b"));
}

/// Test: Slice bounds may be omitted or negative.
#[test]
fn slice_variants() {
    let env = env_with(&[("lst", list(&["a", "b", "c", "d"]))]);
    assert_eq!(eval(&env, "$lst[:2]"), list(&["a", "b"]));
    assert_eq!(eval(&env, "$lst[2:]"), list(&["c", "d"]));
    assert_eq!(eval(&env, "$lst[-2:]"), list(&["c", "d"]));
    assert_eq!(eval(&env, "$lst[1:-1]"), list(&["b", "c"]));
    assert_eq!(eval(&env, "$lst[3:1]"), list(&[]));
    assert_eq!(eval(&env, "$lst[0:100]"), list(&["a", "b", "c", "d"]));
}

/// Test: Indexing, including from the end.
#[test]
fn list_indexing() {
    let env = env_with(&[("lst", list(&["a", "b", "c"]))]);
    assert_eq!(eval(&env, "$lst[0]"), Script::string("a"));
    assert_eq!(eval(&env, "$lst[-1]"), Script::string("c"));
}

/// Test: Out of range indexes fail with the list length.
#[test]
fn index_out_of_bounds() {
    let env = env_with(&[("lst", list(&["a", "b", "c"]))]);
    assert_eq!(
        env.eval_str("$lst[3]"),
        Err(ScriptError::IndexOutOfBounds {
            index: 3,
            length: 3
        })
    );
    assert!(matches!(
        env.eval_str("$lst[-4]"),
        Err(ScriptError::IndexOutOfBounds { index: -4, .. })
    ));
}

/// Test: `length` works on lists, dicts and strings.
#[test]
fn length_of_containers() {
    let env = env_with(&[
        ("lst", list(&["a", "b"])),
        ("d", Script::dict([("k", Script::Bool(true))])),
    ]);
    assert_eq!(eval(&env, "$lst.length()"), Script::Integer(2));
    assert_eq!(eval(&env, "$d.length()"), Script::Integer(1));
    assert_eq!(eval(&env, r#""héllo".length()"#), Script::Integer(5));
}

// =============================================================================
// Builtins
// =============================================================================

/// Test: String transformations.
#[test]
fn string_builtins() {
    let env = env_with(&[("s", Script::string("  big world "))]);
    assert_eq!(eval(&env, "$s.trim()"), Script::string("big world"));
    assert_eq!(eval(&env, "$s.trim().title()"), Script::string("Big World"));
    assert_eq!(eval(&env, r#""ABC".lower()"#), Script::string("abc"));
    assert_eq!(
        eval(&env, r#""a-b-c".replace("-", "_")"#),
        Script::string("a_b_c")
    );
    assert_eq!(eval(&env, r#""a,b".split(",")"#), list(&["a", "b"]));
}

/// Test: Base64 encoding and decoding.
#[test]
fn base64_builtins() {
    let env = ScriptEnvironment::new();
    assert_eq!(
        eval(&env, r#""hello".base64_encode()"#),
        Script::string("aGVsbG8=")
    );
    assert_eq!(
        eval(&env, r#""aGVsbG8=".base64_decode()"#),
        Script::string("hello")
    );
    assert!(matches!(
        env.eval_str(r#""not base64!".base64_decode()"#),
        Err(ScriptError::Builtin { function, .. }) if function == "base64_decode"
    ));
}

/// Test: Arithmetic, negation and equality.
#[test]
fn logic_builtins() {
    let env = env_with(&[("flag", Script::Bool(false)), ("one", Script::Integer(1))]);
    assert_eq!(eval(&env, "$flag.not()"), Script::Bool(true));
    assert_eq!(eval(&env, "$one.add(2)"), Script::Integer(3));
    assert_eq!(eval(&env, "1.add(2)"), Script::string("1.add(2)"));
    assert_eq!(eval(&env, r#""a".equals("a")"#), Script::Bool(true));
    assert_eq!(eval(&env, r#""a".equals("b")"#), Script::Bool(false));
}

/// Test: Wrong argument counts are reported.
#[test]
fn arity_errors() {
    let env = ScriptEnvironment::new();
    match env.eval_str(r#""a".upper("b")"#) {
        Err(ScriptError::Arity {
            function,
            expected,
            got,
        }) => {
            assert_eq!(function, "upper");
            assert_eq!(expected, "1");
            assert_eq!(got, 2);
        }
        other => panic!("expected an arity error, got {other:?}"),
    }
}

/// Test: Integer overflow is a builtin error, not a panic or a wrapped value.
#[test]
fn add_overflow_is_an_error() {
    let env = env_with(&[("max", Script::Integer(i64::MAX))]);
    assert_eq!(
        eval(&env, "$max.add(-1)"),
        Script::Integer(i64::MAX - 1)
    );
    for source in [
        "$__add(9223372036854775807, 1)",
        "$max.add(1)",
        "$__add(-9223372036854775808, -1)",
    ] {
        match env.eval_str(source) {
            Err(ScriptError::Builtin { function, message }) => {
                assert_eq!(function, "add");
                assert_eq!(message, "integer overflow");
            }
            other => panic!("'{source}': expected an overflow error, got {other:?}"),
        }
    }
}

/// Test: Deeply nested expressions fail to parse instead of exhausting the stack.
#[test]
fn deep_nesting_is_a_parse_error() {
    let depth = 200_000;
    let source = format!("{}\"x\"{}", "$__upper(".repeat(depth), ")".repeat(depth));
    let err = parse_script(&source).unwrap_err();
    assert_eq!(err.message, "expression nested too deeply");

    let chain = format!("$s{}", ".trim()".repeat(depth));
    assert!(matches!(
        ScriptEnvironment::new().eval_str(&chain),
        Err(ScriptError::Parse(_))
    ));

    let shallow = MAX_NESTING / 4;
    let source = format!("{}\"x\"{}", "$__upper(".repeat(shallow), ")".repeat(shallow));
    assert_eq!(
        eval(&ScriptEnvironment::new(), &source),
        Script::string("X")
    );
}

/// Test: Wrong argument types are reported.
#[test]
fn type_errors() {
    let env = env_with(&[("n", Script::Integer(1))]);
    assert!(matches!(
        env.eval_str("$n.upper()"),
        Err(ScriptError::TypeMismatch { expected: "string", got: "integer", .. })
    ));
}

/// Test: Filesystem predicates.
#[test]
fn path_predicates() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("f.txt");
    std::fs::write(&file, "x").unwrap();
    let env = env_with(&[
        ("dir", Script::string(dir.path().display().to_string())),
        ("file", Script::string(file.display().to_string())),
    ]);

    assert_eq!(eval(&env, "$dir.dir_exists()"), Script::Bool(true));
    assert_eq!(eval(&env, "$dir.file_exists()"), Script::Bool(false));
    assert_eq!(eval(&env, "$file.file_exists()"), Script::Bool(true));
    assert_eq!(eval(&env, "$file.path_exists()"), Script::Bool(true));
}

/// Test: Timestamps are Unix seconds.
#[test]
fn timestamp_is_numeric() {
    let env = ScriptEnvironment::new();
    let Script::String(ts) = eval(&env, &format!("${}()", builtin_name("timestamp"))) else {
        panic!("timestamp should be a string");
    };
    assert!(ts.parse::<i64>().unwrap() > 0);
}

/// Test: Version tracking helpers.
#[test]
fn track_version_helpers() {
    let env = env_with(&[("v", Script::string("1.2.3"))]);
    assert_eq!(eval(&env, "$v.track_major_version()"), Script::string("1.@"));
    assert_eq!(eval(&env, "$v.track_minor_version()"), Script::string("1.2.@"));
    assert_eq!(
        eval(&env, "$v.track_patch_version()"),
        Script::string("1.2.3.@")
    );
    assert_eq!(eval(&env, "$v.track_version()"), Script::string("1.2.3.@"));
}

/// Test: User lambdas bind parameters over the globals.
#[test]
fn user_lambda() {
    let body = parse_script(r#"$greeting.concat(", ", $who)"#).unwrap();
    let env = env_with(&[
        ("greeting", Script::string("hello")),
        ("greet", Script::lambda(vec!["who".to_string()], body)),
    ]);
    assert_eq!(eval(&env, r#"$greet("world")"#), Script::string("hello, world"));
    assert!(matches!(
        env.eval_str("$greet()"),
        Err(ScriptError::Arity { got: 0, .. })
    ));
}

/// Test: The "file" string operation writes the contents to a temp file.
#[test]
fn string_file_operation() {
    let env = env_with(&[("contents", Script::string("secret"))]);
    let Script::String(path) = eval(&env, r#"$contents.file"#) else {
        panic!("file should return a path");
    };
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "secret");
    std::fs::remove_file(path).unwrap();

    assert!(matches!(
        env.eval_str("$contents.other"),
        Err(ScriptError::UnsupportedStringOperation(op)) if op == "other"
    ));
}

// =============================================================================
// JSON conversion
// =============================================================================

/// Test: JSON values lift into scripts and back.
#[test]
fn json_conversion() {
    let value = json!({"name": "x", "port": 80, "tags": ["a"], "on": true});
    let script = Script::from_json(&value);
    assert_eq!(script.to_json().unwrap(), value);
}

/// Test: Null becomes empty and fractional numbers become strings.
#[test]
fn json_lossy_values() {
    assert_eq!(Script::from_json(&json!(null)), Script::string(""));
    assert_eq!(Script::from_json(&json!(1.5)), Script::string("1.5"));
}

/// Test: Functions have no plain value.
#[test]
fn functions_are_not_values() {
    let env = ScriptEnvironment::new();
    let upper = eval(&env, &format!("${}", builtin_name("upper")));
    assert_eq!(upper.to_json(), Err(ScriptError::NotAValue("function")));
}
