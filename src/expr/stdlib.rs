// ABOUTME: Builtin function library available to every expression.
// ABOUTME: Builtins are wrapped through a small table of typed adapters, one per signature.

use std::collections::BTreeMap;
use std::path::Path;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;

use super::error::ScriptError;
use super::parser::parse_script;
use super::script::Script;

/// Builtins are stored in the globals under their name with this prefix.
pub const BUILTIN_PREFIX: &str = "__";

pub fn builtin_name(name: &str) -> String {
    format!("{BUILTIN_PREFIX}{name}")
}

/// Version-tracking helpers written in the expression language itself.
const TRACK_VERSION_LAMBDAS: &[(&str, &str)] = &[
    ("track_major_version", r#"$v.split(".")[:1].join(".").concat(".@")"#),
    ("track_minor_version", r#"$v.split(".")[:2].join(".").concat(".@")"#),
    ("track_patch_version", r#"$v.split(".")[:3].join(".").concat(".@")"#),
    ("track_version", r#"$v.concat(".@")"#),
];

/// The native function behind `$`: looks a name up in the environment itself.
pub(crate) fn env_lookup() -> Script {
    Script::function("env_lookup", |env, args| {
        let [key] = args else {
            return Err(ScriptError::arity("env_lookup", 1, args.len()));
        };
        let key = key.expect_string("env_lookup")?;
        env.get(key)
            .cloned()
            .ok_or_else(|| ScriptError::UnknownVariable {
                name: key.to_string(),
                known: env.names().map(str::to_string).collect(),
            })
    })
}

/// Every builtin keyed by its prefixed global name.
pub(crate) fn builtins() -> BTreeMap<String, Script> {
    let mut table = BTreeMap::new();
    let mut add = |name: &str, script: Script| {
        table.insert(builtin_name(name), script);
    };

    add("upper", string_to_string("upper", |s| s.to_uppercase()));
    add("lower", string_to_string("lower", |s| s.to_lowercase()));
    add("title", string_to_string("title", title_case));
    add("trim", string_to_string("trim", |s| s.trim().to_string()));
    add(
        "base64_encode",
        string_to_string("base64_encode", |s| BASE64.encode(s)),
    );
    add(
        "base64_decode",
        string_to_fallible_string("base64_decode", base64_decode),
    );
    add("split", string_pair_to_list("split", split));
    add("replace", replace());
    add("concat", concat());
    add("join", join());

    add("list_index", list_index());
    add("list_slice", list_slice());
    add("length", length());

    add("add", integer_pair_to_integer("add", i64::checked_add));
    add("not", bool_to_bool("not", |b| !b));
    add("equals", equals());

    add("path_exists", string_to_bool("path_exists", |p| Path::new(p).exists()));
    add("file_exists", string_to_bool("file_exists", |p| Path::new(p).is_file()));
    add("dir_exists", string_to_bool("dir_exists", |p| Path::new(p).is_dir()));
    add("timestamp", timestamp());

    for (name, source) in TRACK_VERSION_LAMBDAS {
        let body = parse_script(source).expect("builtin track-version expressions parse");
        add(name, Script::lambda(vec!["v".to_string()], body));
    }

    table
}

// =============================================================================
// Typed adapters
// =============================================================================

fn check_arity(name: &str, args: &[Script], expected: usize) -> Result<(), ScriptError> {
    if args.len() != expected {
        return Err(ScriptError::arity(name, expected, args.len()));
    }
    Ok(())
}

fn string_to_string(name: &'static str, f: fn(&str) -> String) -> Script {
    Script::function(name, move |_, args| {
        check_arity(name, args, 1)?;
        Ok(Script::String(f(args[0].expect_string(name)?)))
    })
}

fn string_to_fallible_string(name: &'static str, f: fn(&str) -> Result<String, String>) -> Script {
    Script::function(name, move |_, args| {
        check_arity(name, args, 1)?;
        f(args[0].expect_string(name)?)
            .map(Script::String)
            .map_err(|e| ScriptError::builtin(name, e))
    })
}

fn string_to_bool(name: &'static str, f: fn(&str) -> bool) -> Script {
    Script::function(name, move |_, args| {
        check_arity(name, args, 1)?;
        Ok(Script::Bool(f(args[0].expect_string(name)?)))
    })
}

fn string_pair_to_list(name: &'static str, f: fn(&str, &str) -> Vec<String>) -> Script {
    Script::function(name, move |_, args| {
        check_arity(name, args, 2)?;
        let items = f(args[0].expect_string(name)?, args[1].expect_string(name)?);
        Ok(Script::List(items.into_iter().map(Script::String).collect()))
    })
}

fn integer_pair_to_integer(name: &'static str, f: fn(i64, i64) -> Option<i64>) -> Script {
    Script::function(name, move |_, args| {
        check_arity(name, args, 2)?;
        f(args[0].expect_integer(name)?, args[1].expect_integer(name)?)
            .map(Script::Integer)
            .ok_or_else(|| ScriptError::builtin(name, "integer overflow"))
    })
}

fn bool_to_bool(name: &'static str, f: fn(bool) -> bool) -> Script {
    Script::function(name, move |_, args| {
        check_arity(name, args, 1)?;
        Ok(Script::Bool(f(args[0].expect_bool(name)?)))
    })
}

// =============================================================================
// Builtins with their own signatures
// =============================================================================

fn title_case(s: &str) -> String {
    s.split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn base64_decode(s: &str) -> Result<String, String> {
    let bytes = BASE64.decode(s).map_err(|e| e.to_string())?;
    String::from_utf8(bytes).map_err(|e| e.to_string())
}

fn split(s: &str, sep: &str) -> Vec<String> {
    s.split(sep).map(str::to_string).collect()
}

fn replace() -> Script {
    Script::function("replace", |_, args| {
        check_arity("replace", args, 3)?;
        let s = args[0].expect_string("replace")?;
        let from = args[1].expect_string("replace")?;
        let to = args[2].expect_string("replace")?;
        Ok(Script::String(s.replace(from, to)))
    })
}

fn concat() -> Script {
    Script::function("concat", |_, args| {
        if args.is_empty() {
            return Err(ScriptError::arity("concat", "at least 1", 0));
        }
        let mut out = String::new();
        for arg in args {
            out.push_str(arg.expect_string("concat")?);
        }
        Ok(Script::String(out))
    })
}

fn join() -> Script {
    Script::function("join", |_, args| {
        check_arity("join", args, 2)?;
        let items = args[0].expect_list("join")?;
        let sep = args[1].expect_string("join")?;
        let parts = items
            .iter()
            .map(|item| item.expect_string("join"))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Script::String(parts.join(sep)))
    })
}

/// Resolve a possibly negative index against a length.
fn normalize(index: i64, length: usize) -> i64 {
    if index < 0 {
        length as i64 + index
    } else {
        index
    }
}

fn list_index() -> Script {
    Script::function("list_index", |_, args| {
        check_arity("list_index", args, 2)?;
        let items = args[0].expect_list("list_index")?;
        let index = args[1].expect_integer("list_index")?;
        let position = normalize(index, items.len());
        usize::try_from(position)
            .ok()
            .and_then(|i| items.get(i))
            .cloned()
            .ok_or(ScriptError::IndexOutOfBounds {
                index,
                length: items.len(),
            })
    })
}

/// `list[start:end]`; negative bounds count from the end and bounds past the
/// end are clamped.
fn list_slice() -> Script {
    Script::function("list_slice", |_, args| {
        if args.len() != 2 && args.len() != 3 {
            return Err(ScriptError::arity("list_slice", "2 or 3", args.len()));
        }
        let items = args[0].expect_list("list_slice")?;
        let length = items.len() as i64;
        let start = normalize(args[1].expect_integer("list_slice")?, items.len()).clamp(0, length);
        let end = match args.get(2) {
            Some(end) => normalize(end.expect_integer("list_slice")?, items.len()).clamp(0, length),
            None => length,
        };
        let slice = if start >= end {
            Vec::new()
        } else {
            items[start as usize..end as usize].to_vec()
        };
        Ok(Script::List(slice))
    })
}

fn length() -> Script {
    Script::function("length", |_, args| {
        check_arity("length", args, 1)?;
        let len = match &args[0] {
            Script::List(items) => items.len(),
            Script::Dict(map) => map.len(),
            Script::String(s) => s.chars().count(),
            other => {
                return Err(ScriptError::TypeMismatch {
                    role: "length".to_string(),
                    expected: "list, dict or string",
                    got: other.type_name(),
                });
            }
        };
        Ok(Script::Integer(len as i64))
    })
}

fn equals() -> Script {
    Script::function("equals", |_, args| {
        check_arity("equals", args, 2)?;
        Ok(Script::Bool(args[0] == args[1]))
    })
}

fn timestamp() -> Script {
    Script::function("timestamp", |_, args| {
        check_arity("timestamp", args, 0)?;
        Ok(Script::String(chrono::Utc::now().timestamp().to_string()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_case_capitalizes_words() {
        assert_eq!(title_case("hello big world"), "Hello Big World");
    }

    #[test]
    fn every_builtin_is_prefixed() {
        assert!(builtins().keys().all(|k| k.starts_with(BUILTIN_PREFIX)));
    }

    #[test]
    fn negative_index_counts_from_end() {
        assert_eq!(normalize(-1, 3), 2);
        assert_eq!(normalize(1, 3), 1);
    }
}
