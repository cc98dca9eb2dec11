//! Interpreter lifecycle: loading, calling, globals, strictness, package paths

use std::fs;
use std::path::Path;

use moonbridge::*;
use pretty_assertions::assert_eq;
use tempfile::TempDir;

fn lua() -> Lua {
    Lua::new().expect("Lua state")
}

// ═══════════════════════════════════════════════════════════════════
// Load / Call
// ═══════════════════════════════════════════════════════════════════

#[test]
fn test_exec_returns_values_in_order() {
    let mut lua = lua();
    let values = lua.exec("return 1, 'two', true, nil").unwrap();
    assert_eq!(
        values,
        vec![
            Value::F64(1.0),
            Value::string("two"),
            Value::Bool(true),
            Value::Nil
        ]
    );
    assert_eq!(lua.stack_size(), 0);
}

#[test]
fn test_exec_without_results() {
    let mut lua = lua();
    assert_eq!(lua.exec("local x = 1").unwrap(), vec![]);
}

#[test]
fn test_load_then_run() {
    let mut lua = lua();
    lua.load("return 6 * 7").unwrap();
    assert_eq!(lua.stack_size(), 1);
    lua.run().unwrap();
    assert_eq!(lua.pop().unwrap(), Value::F64(42.0));
    assert_eq!(lua.stack_size(), 0);
}

#[test]
fn test_compile_error_is_load_error() {
    let mut lua = lua();
    let err = lua.load("return +").unwrap_err();
    assert!(matches!(err, Error::Load { .. }), "got {:?}", err);
    assert_eq!(lua.stack_size(), 0);
}

#[test]
fn test_runtime_error_message() {
    let mut lua = lua();
    let err = lua.exec("error('boom')").unwrap_err();
    match err {
        Error::Runtime { message } => assert!(message.contains("boom"), "{}", message),
        other => panic!("expected runtime error, got {:?}", other),
    }
    assert_eq!(lua.stack_size(), 0);
}

#[test]
fn test_runtime_error_with_table_object() {
    let mut lua = lua();
    let err = lua.exec("error({ code = 7 })").unwrap_err();
    match err {
        Error::Runtime { message } => assert!(message.contains("code"), "{}", message),
        other => panic!("expected runtime error, got {:?}", other),
    }
}

#[test]
fn test_call_with_arguments() {
    let mut lua = lua();
    lua.load("local a, b = ...; return a + b, a * b").unwrap();
    lua.push(&Value::I64(2));
    lua.push(&Value::I64(3));
    lua.call(2, 1).unwrap();
    assert_eq!(lua.stack_size(), 1);
    assert_eq!(lua.pop().unwrap(), Value::F64(5.0));
}

#[test]
fn test_call_keeps_all_results_with_multret() {
    let mut lua = lua();
    lua.load("return 1, 2, 3").unwrap();
    lua.call(0, MULTRET).unwrap();
    assert_eq!(lua.stack_size(), 3);
    lua.set_top(0).unwrap();
}

#[test]
fn test_call_grows_stack_for_many_results() {
    let mut lua = lua();
    lua.load("return 1").unwrap();
    lua.call(0, 100_000).unwrap();
    assert_eq!(lua.stack_size(), 100_000);
    assert_eq!(lua.get(1).unwrap(), Value::F64(1.0));
    assert_eq!(lua.get(-1).unwrap(), Value::Nil);
    lua.set_top(0).unwrap();
}

#[test]
fn test_call_rejects_result_counts_the_stack_cannot_hold() {
    let mut lua = lua();
    lua.load("return 1").unwrap();
    assert!(matches!(lua.call(0, 2_000_000), Err(Error::Runtime { .. })));
    assert!(matches!(lua.call(0, -5), Err(Error::Runtime { .. })));
    // nothing was called, the chunk is still there
    assert_eq!(lua.stack_size(), 1);
    lua.call(0, 1).unwrap();
    assert_eq!(lua.pop().unwrap(), Value::F64(1.0));
}

#[test]
fn test_call_without_function_is_an_error() {
    let mut lua = lua();
    lua.push(&Value::I64(1));
    assert!(matches!(lua.call(1, 0), Err(Error::Runtime { .. })));
    assert_eq!(lua.stack_size(), 1);
}

#[test]
fn test_exec_restores_stack_on_decode_error() {
    let mut lua = lua();
    lua.push(&Value::string("keep"));
    let err = lua.exec("return 1, print").unwrap_err();
    assert!(matches!(err, Error::Marshal(MarshalError::UnsupportedValueKind { .. })));
    assert_eq!(lua.stack_size(), 1);
    assert_eq!(lua.pop().unwrap(), Value::string("keep"));
}

// ═══════════════════════════════════════════════════════════════════
// Files
// ═══════════════════════════════════════════════════════════════════

#[test]
fn test_load_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("script.lua");
    fs::write(&path, "return 1, 'two'").unwrap();

    let mut lua = lua();
    lua.load_file(&path).unwrap();
    lua.run().unwrap();
    assert_eq!(lua.stack_size(), 2);
    assert_eq!(lua.pop().unwrap(), Value::string("two"));
    assert_eq!(lua.pop().unwrap(), Value::F64(1.0));
}

#[test]
fn test_load_missing_file() {
    let dir = TempDir::new().unwrap();
    let mut lua = lua();
    let err = lua.load_file(dir.path().join("missing.lua")).unwrap_err();
    assert!(matches!(err, Error::Load { .. }));
    assert_eq!(lua.stack_size(), 0);
}

#[test]
fn test_load_file_rejects_interior_nul() {
    let mut lua = lua();
    let err = lua.load_file(Path::new("bad\0name.lua")).unwrap_err();
    assert!(matches!(err, Error::InvalidName(_)));
}

// ═══════════════════════════════════════════════════════════════════
// Globals
// ═══════════════════════════════════════════════════════════════════

#[test]
fn test_set_and_get_global() {
    let mut lua = lua();
    lua.push(&Value::string("hello"));
    lua.set_global("greeting").unwrap();
    assert_eq!(lua.stack_size(), 0);

    lua.get_global("greeting");
    assert_eq!(lua.stack_size(), 1);
    assert_eq!(lua.pop().unwrap(), Value::string("hello"));

    assert_eq!(
        lua.exec("return greeting .. '!'").unwrap(),
        vec![Value::string("hello!")]
    );
}

#[test]
fn test_global_value_helpers() {
    let mut lua = lua();
    let config = Value::table([("retries", 3i64)]);
    lua.set_global_value("config", &config).unwrap();
    assert_eq!(
        lua.global("config").unwrap(),
        Value::table([("retries", 3.0f64)])
    );
    assert_eq!(lua.global("undefined_name").unwrap(), Value::Nil);
    assert_eq!(lua.stack_size(), 0);
}

#[test]
fn test_set_global_on_empty_stack() {
    let mut lua = lua();
    assert!(lua.set_global("x").is_err());
}

#[test]
fn test_check_function() {
    let mut lua = lua();
    lua.exec("function handler() end; not_a_function = 1").unwrap();
    assert!(lua.check_function("handler"));
    assert!(lua.check_function("print"));
    assert!(!lua.check_function("not_a_function"));
    assert!(!lua.check_function("missing"));
    assert_eq!(lua.stack_size(), 0);

    // the interpreter is still usable afterwards
    assert_eq!(lua.exec("return 1").unwrap(), vec![Value::F64(1.0)]);
}

// ═══════════════════════════════════════════════════════════════════
// Strictness
// ═══════════════════════════════════════════════════════════════════

#[test]
fn test_strict_read() {
    let mut lua = lua();
    lua.strict_read().unwrap();

    let err = lua.exec("return undefined_name").unwrap_err();
    match err {
        Error::Runtime { message } => {
            assert!(message.contains("undefined_name"), "{}", message)
        }
        other => panic!("expected runtime error, got {:?}", other),
    }

    // raw access from the host still works
    lua.get_global("undefined_name");
    assert_eq!(lua.pop().unwrap(), Value::Nil);

    lua.exec("declared = 5").unwrap();
    assert_eq!(lua.exec("return declared").unwrap(), vec![Value::F64(5.0)]);
}

#[test]
fn test_strict_write() {
    let mut lua = lua();
    lua.strict_write().unwrap();

    let err = lua.exec("undeclared = 1").unwrap_err();
    assert!(matches!(err, Error::Runtime { .. }));

    lua.set_global_value("declared", &Value::I64(1)).unwrap();
    lua.exec("declared = declared + 1").unwrap();
    assert_eq!(lua.global("declared").unwrap(), Value::F64(2.0));

    lua.exec("rawset(_G, 'via_rawset', true)").unwrap();
    assert_eq!(lua.global("via_rawset").unwrap(), Value::Bool(true));
}

#[test]
fn test_strict_config_enables_both() {
    let mut lua = Lua::with_config(LuaConfig::new().strict()).unwrap();
    assert!(lua.exec("return undefined_name").is_err());
    assert!(lua.exec("undeclared = 1").is_err());
    assert_eq!(lua.stack_size(), 0);
}

// ═══════════════════════════════════════════════════════════════════
// Package paths
// ═══════════════════════════════════════════════════════════════════

#[test]
fn test_add_package_path_allows_require() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("answer.lua"), "return { value = 42 }").unwrap();
    let pattern = format!("{}/?.lua", dir.path().display());

    let mut lua = lua();
    lua.add_package_path(&pattern).unwrap();
    assert_eq!(
        lua.exec("return require('answer').value").unwrap(),
        vec![Value::F64(42.0)]
    );
}

#[test]
fn test_package_paths_from_config() {
    let config = LuaConfig::new()
        .with_package_path("/opt/lua/?.lua")
        .with_package_cpath("/opt/lua/?.so");
    let mut lua = Lua::with_config(config).unwrap();
    let values = lua.exec("return package.path, package.cpath").unwrap();
    assert!(values[0].as_str().unwrap().ends_with(";/opt/lua/?.lua"));
    assert!(values[1].as_str().unwrap().ends_with(";/opt/lua/?.so"));
    assert_eq!(lua.stack_size(), 0);
}

#[test]
fn test_package_path_is_not_evaluated_as_code() {
    let mut lua = lua();
    let pattern = "'; error('injected') --";
    lua.add_package_path(pattern).unwrap();
    let values = lua.exec("return package.path").unwrap();
    assert!(values[0].as_str().unwrap().ends_with(pattern));
}

// ═══════════════════════════════════════════════════════════════════
// Configuration
// ═══════════════════════════════════════════════════════════════════

#[test]
fn test_without_standard_libraries() {
    let config = LuaConfig {
        open_libs: false,
        extensions: false,
        ..LuaConfig::default()
    };
    let mut lua = Lua::with_config(config).unwrap();
    assert_eq!(lua.exec("return string").unwrap(), vec![Value::Nil]);
}

#[test]
fn test_marshal_config_applies_to_state() {
    let mut lua = Lua::with_config(LuaConfig::new().with_max_depth(2)).unwrap();
    assert_eq!(lua.marshal_config().max_depth, 2);
    let err = lua.exec("return { a = { b = { c = 1 } } }").unwrap_err();
    match err {
        Error::Marshal(err) => assert_eq!(
            err.root_cause(),
            &MarshalError::DepthLimitExceeded { limit: 2 }
        ),
        other => panic!("expected marshal error, got {:?}", other),
    }
}

#[test]
fn test_guard_restores_top() {
    let mut lua = lua();
    {
        let mut guard = lua.guard();
        guard.push(&Value::I64(1));
        guard.push(&Value::I64(2));
        assert_eq!(guard.stack_size(), 2);
    }
    assert_eq!(lua.stack_size(), 0);
}
