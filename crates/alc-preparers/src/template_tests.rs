// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn escape_for_shell_single_quote() {
    assert_eq!(escape_for_shell("it's a test"), "it'\\''s a test");
}

#[test]
fn escape_for_shell_empty_string() {
    assert_eq!(escape_for_shell(""), "");
}

#[test]
fn interpolate_simple() {
    let vars: HashMap<String, String> =
        [("workspace.path".to_string(), "/workspace".to_string())].into_iter().collect();
    assert_eq!(interpolate("cd {workspace.path}", &vars), "cd /workspace");
}

#[test]
fn interpolate_multiple() {
    let vars: HashMap<String, String> = [
        ("worktree.branch".to_string(), "feature-x".to_string()),
        ("worktree.base_branch".to_string(), "main".to_string()),
    ]
    .into_iter()
    .collect();
    assert_eq!(
        interpolate("git checkout -b {worktree.branch} {worktree.base_branch}", &vars),
        "git checkout -b feature-x main"
    );
}

#[test]
fn interpolate_unknown_left_alone() {
    let vars: HashMap<String, String> = HashMap::new();
    assert_eq!(interpolate("echo {unknown.thing}", &vars), "echo {unknown.thing}");
}

#[test]
fn interpolate_shell_escapes_single_quotes() {
    let vars: HashMap<String, String> =
        [("repository.branch".to_string(), "feature/it's-mine".to_string())].into_iter().collect();
    assert_eq!(
        interpolate_shell("git checkout '{repository.branch}'", &vars),
        "git checkout 'feature/it'\\''s-mine'"
    );
}

#[test]
fn interpolate_env_var_with_default_uses_env() {
    std::env::set_var("TEMPLATE_TEST_VAR", "from_env");
    let vars: HashMap<String, String> = HashMap::new();
    assert_eq!(interpolate("${TEMPLATE_TEST_VAR:-default}", &vars), "from_env");
    std::env::remove_var("TEMPLATE_TEST_VAR");
}

#[test]
fn interpolate_env_var_with_default_uses_default() {
    std::env::remove_var("TEMPLATE_UNSET_VAR");
    let vars: HashMap<String, String> = HashMap::new();
    assert_eq!(interpolate("${TEMPLATE_UNSET_VAR:-fallback}", &vars), "fallback");
}

#[test]
fn interpolate_env_and_template_vars_together() {
    std::env::set_var("TEMPLATE_CMD_VAR", "custom_cmd");
    let vars: HashMap<String, String> =
        [("worktree.id".to_string(), "wt-1".to_string())].into_iter().collect();
    assert_eq!(
        interpolate("${TEMPLATE_CMD_VAR:-default} --worktree {worktree.id}", &vars),
        "custom_cmd --worktree wt-1"
    );
    std::env::remove_var("TEMPLATE_CMD_VAR");
}
