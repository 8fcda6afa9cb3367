//! External command specification and argument templating.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Serialize;

use crate::database::url::redact;

/// Placeholders accepted in `server.args`.
pub const SERVER_PLACEHOLDERS: &[&str] = &["app", "host", "port", "log_level", "service"];

/// A fully resolved external command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    /// Variables set on top of the inherited environment.
    pub env: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub working_dir: Option<PathBuf>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            env: BTreeMap::new(),
            working_dir: None,
        }
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    pub fn envs<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.env
            .extend(vars.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    pub fn working_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.working_dir = dir;
        self
    }

    /// Async command for a supervised child. The child is killed if the
    /// handle is dropped before it exits.
    pub fn to_tokio(&self) -> tokio::process::Command {
        let mut cmd = tokio::process::Command::new(&self.program);
        cmd.args(&self.args).envs(&self.env).kill_on_drop(true);
        if let Some(dir) = &self.working_dir {
            cmd.current_dir(dir);
        }
        cmd
    }

    /// Blocking command, used for `exec`.
    pub fn to_std(&self) -> std::process::Command {
        let mut cmd = std::process::Command::new(&self.program);
        cmd.args(&self.args).envs(&self.env);
        if let Some(dir) = &self.working_dir {
            cmd.current_dir(dir);
        }
        cmd
    }

    /// Copy safe to print: URLs lose their password, secrets are masked.
    pub fn redacted(&self) -> Self {
        let env = self
            .env
            .iter()
            .map(|(key, value)| {
                let upper = key.to_ascii_uppercase();
                let shown = if upper.ends_with("_URL") {
                    redact(value)
                } else if ["PASSWORD", "SECRET", "TOKEN", "KEY"]
                    .iter()
                    .any(|marker| upper.contains(marker))
                {
                    "***".to_string()
                } else {
                    value.clone()
                };
                (key.clone(), shown)
            })
            .collect();
        Self {
            env,
            ..self.clone()
        }
    }
}

impl std::fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", quote(&self.program))?;
        for arg in &self.args {
            write!(f, " {}", quote(arg))?;
        }
        Ok(())
    }
}

fn quote(word: &str) -> std::borrow::Cow<'_, str> {
    if !word.is_empty() && !word.chars().any(|c| c.is_whitespace() || c == '\'' || c == '"') {
        word.into()
    } else {
        format!("'{}'", word.replace('\'', r"'\''")).into()
    }
}

/// Expand `{name}` placeholders. `{{` and `}}` are literal braces; unknown
/// names are kept verbatim.
pub fn expand(template: &str, values: &BTreeMap<&str, String>) -> String {
    render(template, |name| values.get(name).cloned())
}

/// Names of placeholders in `args` that are not in `known`.
pub fn unknown_placeholders(args: &[String], known: &[&str]) -> Vec<String> {
    let mut unknown = Vec::new();
    for arg in args {
        render(arg, |name| {
            if !known.contains(&name) && !unknown.iter().any(|u: &String| u == name) {
                unknown.push(name.to_string());
            }
            None
        });
    }
    unknown
}

fn render(template: &str, mut lookup: impl FnMut(&str) -> Option<String>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(pos) = rest.find(['{', '}']) {
        out.push_str(&rest[..pos]);
        let brace = &rest[pos..];

        if brace.starts_with("{{") {
            out.push('{');
            rest = &brace[2..];
        } else if brace.starts_with("}}") {
            out.push('}');
            rest = &brace[2..];
        } else if brace.starts_with('{') {
            match brace[1..].find('}') {
                Some(end) if is_name(&brace[1..=end]) => {
                    let name = &brace[1..=end];
                    match lookup(name) {
                        Some(value) => out.push_str(&value),
                        None => out.push_str(&brace[..end + 2]),
                    }
                    rest = &brace[end + 2..];
                }
                _ => {
                    out.push('{');
                    rest = &brace[1..];
                }
            }
        } else {
            out.push('}');
            rest = &brace[1..];
        }
    }
    out.push_str(rest);
    out
}

fn is_name(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c == '_' || c.is_ascii_alphanumeric())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values() -> BTreeMap<&'static str, String> {
        BTreeMap::from([
            ("host", "0.0.0.0".to_string()),
            ("port", "8001".to_string()),
        ])
    }

    #[test]
    fn expands_known_placeholders() {
        assert_eq!(expand("{host}:{port}", &values()), "0.0.0.0:8001");
        assert_eq!(expand("--port={port}", &values()), "--port=8001");
    }

    #[test]
    fn keeps_unknown_and_escaped() {
        assert_eq!(expand("{workers}", &values()), "{workers}");
        assert_eq!(expand("{{host}}", &values()), "{host}");
        assert_eq!(expand("{not closed", &values()), "{not closed");
        assert_eq!(expand("{a b}", &values()), "{a b}");
    }

    #[test]
    fn finds_unknown_placeholders_once() {
        let args = vec!["{app}".to_string(), "{x}".to_string(), "{x}-{y}".to_string()];
        assert_eq!(unknown_placeholders(&args, SERVER_PLACEHOLDERS), vec!["x", "y"]);
    }

    #[test]
    fn display_quotes_when_needed() {
        let spec = CommandSpec::new("uvicorn").args(["src.app:app", "--root-path", "/a b"]);
        assert_eq!(spec.to_string(), "uvicorn src.app:app --root-path '/a b'");
    }

    #[test]
    fn redaction_masks_secrets() {
        let spec = CommandSpec::new("alembic")
            .env("DATABASE_URL", "postgresql://u:pw@db:5432/x")
            .env("DATABASE_PASSWORD", "pw")
            .env("APP_PORT", "8001");
        let shown = spec.redacted();
        assert_eq!(shown.env["DATABASE_URL"], "postgresql://u:***@db:5432/x");
        assert_eq!(shown.env["DATABASE_PASSWORD"], "***");
        assert_eq!(shown.env["APP_PORT"], "8001");
        assert_eq!(shown.program, "alembic");
    }
}
