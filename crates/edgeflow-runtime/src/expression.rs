//! Sandboxed expression and template evaluation.
//!
//! Node expressions (`transform`, `condition`) and templated configuration
//! values are evaluated with minijinja. Expressions may only read the values
//! they are given; there is no statement syntax and no host access.
//!
//! - Expressions see the input bag as `data`: `data.x > 5`, `data.items | length`
//! - Templates see the input bag's fields at the top level:
//!   `"https://api.example.com/users/{{ user_id }}"`

use minijinja::{Environment, Value, context};

use crate::error::RuntimeError;
use crate::input::Bag;

/// Expression evaluator shared by all handlers of a runtime.
pub struct Expressions {
  env: Environment<'static>,
}

impl Expressions {
  pub fn new() -> Self {
    Self {
      env: Environment::new(),
    }
  }

  /// Evaluate an expression with the bag bound to `data`.
  pub fn eval(&self, expression: &str, data: &Bag) -> Result<serde_json::Value, RuntimeError> {
    let value = self.eval_value(expression, context! { data => Value::from_serialize(data) })?;
    to_json(&value)
  }

  /// Evaluate an expression with the bag bound to `data`, as a truth value.
  pub fn eval_bool(&self, expression: &str, data: &Bag) -> Result<bool, RuntimeError> {
    let value = self.eval_value(expression, context! { data => Value::from_serialize(data) })?;
    Ok(value.is_true())
  }

  /// Render a template string against the bag's fields.
  ///
  /// A template that is a single `{{ expr }}` evaluates to the expression's
  /// value, keeping its JSON type. Anything else renders to a string.
  pub fn render(&self, template: &str, fields: &Bag) -> Result<serde_json::Value, RuntimeError> {
    let ctx = Value::from_serialize(fields);

    if let Some(expression) = single_expression(template) {
      let value = self.eval_value(expression, ctx)?;
      return to_json(&value);
    }

    self
      .env
      .render_str(template, ctx)
      .map(serde_json::Value::String)
      .map_err(|e| RuntimeError::Expression {
        message: e.to_string(),
      })
  }

  fn eval_value(&self, expression: &str, ctx: Value) -> Result<Value, RuntimeError> {
    let compiled = self
      .env
      .compile_expression(expression)
      .map_err(|e| RuntimeError::Expression {
        message: e.to_string(),
      })?;

    compiled.eval(ctx).map_err(|e| RuntimeError::Expression {
      message: e.to_string(),
    })
  }
}

impl Default for Expressions {
  fn default() -> Self {
    Self::new()
  }
}

/// Whether a string contains template syntax.
pub(crate) fn is_template(s: &str) -> bool {
  s.contains("{{")
}

fn single_expression(template: &str) -> Option<&str> {
  let inner = template.trim().strip_prefix("{{")?.strip_suffix("}}")?;
  if inner.contains("{{") || inner.contains("}}") {
    return None;
  }
  Some(inner.trim())
}

fn to_json(value: &Value) -> Result<serde_json::Value, RuntimeError> {
  if value.is_undefined() {
    return Ok(serde_json::Value::Null);
  }
  serde_json::to_value(value).map_err(|e| RuntimeError::Expression {
    message: e.to_string(),
  })
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  fn bag(value: serde_json::Value) -> Bag {
    value.as_object().cloned().unwrap_or_default()
  }

  #[test]
  fn test_comparison() {
    let expressions = Expressions::new();

    assert!(expressions.eval_bool("data.x > 5", &bag(json!({ "x": 10 }))).unwrap());
    assert!(!expressions.eval_bool("data.x > 5", &bag(json!({ "x": 1 }))).unwrap());
  }

  #[test]
  fn test_boolean_operators() {
    let expressions = Expressions::new();
    let data = bag(json!({ "status": "active", "count": 3 }));

    assert!(
      expressions
        .eval_bool("data.status == 'active' and data.count >= 3", &data)
        .unwrap()
    );
    assert!(
      !expressions
        .eval_bool("not (data.status == 'active')", &data)
        .unwrap()
    );
  }

  #[test]
  fn test_missing_field_is_falsy() {
    let expressions = Expressions::new();
    assert!(!expressions.eval_bool("data.missing", &Bag::new()).unwrap());
  }

  #[test]
  fn test_malformed_expression_is_error() {
    let expressions = Expressions::new();
    let result = expressions.eval_bool("data.x >", &bag(json!({ "x": 1 })));
    assert!(matches!(result, Err(RuntimeError::Expression { .. })));
  }

  #[test]
  fn test_eval_builds_values() {
    let expressions = Expressions::new();
    let data = bag(json!({ "items": [1, 2, 3], "name": "ada" }));

    assert_eq!(expressions.eval("data.items | length", &data).unwrap(), json!(3));
    assert_eq!(expressions.eval("data.name | upper", &data).unwrap(), json!("ADA"));
    assert_eq!(
      expressions
        .eval("{ 'total': data.items | length, 'first': data.items[0] }", &data)
        .unwrap(),
      json!({ "total": 3, "first": 1 })
    );
  }

  #[test]
  fn test_eval_undefined_is_null() {
    let expressions = Expressions::new();
    assert_eq!(expressions.eval("data.nope", &Bag::new()).unwrap(), json!(null));
  }

  #[test]
  fn test_render_string_template() {
    let expressions = Expressions::new();
    let fields = bag(json!({ "id": 42 }));

    assert_eq!(
      expressions
        .render("https://api.example.com/users/{{ id }}", &fields)
        .unwrap(),
      json!("https://api.example.com/users/42")
    );
  }

  #[test]
  fn test_render_single_expression_keeps_type() {
    let expressions = Expressions::new();
    let fields = bag(json!({ "payload": { "a": 1 }, "limit": 5 }));

    assert_eq!(expressions.render("{{ payload }}", &fields).unwrap(), json!({ "a": 1 }));
    assert_eq!(expressions.render(" {{ limit }} ", &fields).unwrap(), json!(5));
  }

  #[test]
  fn test_single_expression_detection() {
    assert_eq!(single_expression("{{ a }}"), Some("a"));
    assert_eq!(single_expression("{{ a }} and {{ b }}"), None);
    assert_eq!(single_expression("plain"), None);
    assert!(is_template("x {{ y }}"));
    assert!(!is_template("x"));
  }
}
