//! Chart theme CSS generation.
//!
//! Color values and selectors come from configuration and end up inside a
//! stylesheet, so both are sanitized before interpolation.

use regex::Regex;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt::Write;
use std::sync::LazyLock;

static HEX_COLOR: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"^#([A-Fa-f0-9]{3}|[A-Fa-f0-9]{6})$").expect("valid regex"));
static FUNCTIONAL_COLOR: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"^(hsl|rgb)a?\(\s*[\d.,\s%]+\s*\)$").expect("valid regex"));
static VALUE_DISALLOWED: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"[^a-zA-Z0-9\-.,()#% ]").expect("valid regex"));
static SELECTOR_DISALLOWED: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r#"[^a-zA-Z0-9\-_.\[\]="' ]"#).expect("valid regex"));

/// Color for one chart series: a base color and optional per-theme overrides
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ChartColor {
  #[serde(default)]
  pub color: Option<String>,
  #[serde(default)]
  pub theme: BTreeMap<String, String>,
}

impl ChartColor {
  pub fn solid(color: &str) -> Self {
    Self {
      color: Some(color.to_string()),
      theme: BTreeMap::new(),
    }
  }

  fn for_theme(&self, theme: &str) -> Option<&str> {
    self
      .theme
      .get(theme)
      .or(self.color.as_ref())
      .map(String::as_str)
  }
}

/// Sanitize a CSS color value.
///
/// Hex and `hsl()`/`rgb()` values must be well formed or are rejected as an
/// empty string. Anything else keeps only characters that cannot escape a
/// declaration.
pub fn sanitize_css_value(value: &str) -> String {
  let value = value.trim();
  if value.starts_with('#') {
    return if HEX_COLOR.is_match(value) {
      value.to_string()
    } else {
      String::new()
    };
  }
  if value.starts_with("hsl") || value.starts_with("rgb") {
    return if FUNCTIONAL_COLOR.is_match(value) {
      value.to_string()
    } else {
      String::new()
    };
  }
  VALUE_DISALLOWED.replace_all(value, "").into_owned()
}

pub fn sanitize_css_selector(selector: &str) -> String {
  SELECTOR_DISALLOWED.replace_all(selector, "").into_owned()
}

/// Render one rule block per theme with a `--color-<key>` custom property per
/// series. Themes without any usable color are left out.
pub fn generate_chart_css(
  themes: &BTreeMap<String, String>,
  chart_id: &str,
  colors: &BTreeMap<String, ChartColor>,
) -> String {
  let chart_id = sanitize_css_selector(chart_id);
  let mut css = String::new();

  for (theme, prefix) in themes {
    let declarations: Vec<String> = colors
      .iter()
      .filter_map(|(key, color)| {
        let value = sanitize_css_value(color.for_theme(theme)?);
        if value.is_empty() {
          return None;
        }
        Some(format!(
          "  --color-{}: {};",
          sanitize_css_selector(key).replace(' ', ""),
          value
        ))
      })
      .collect();

    if declarations.is_empty() {
      continue;
    }

    let prefix = sanitize_css_selector(prefix);
    let selector = format!("{} [data-chart=\"{}\"]", prefix.trim(), chart_id);
    let _ = writeln!(css, "{} {{", selector.trim_start());
    for declaration in declarations {
      let _ = writeln!(css, "{}", declaration);
    }
    let _ = writeln!(css, "}}");
  }

  css
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_hex_colors() {
    assert_eq!(sanitize_css_value("#fff"), "#fff");
    assert_eq!(sanitize_css_value("#0EA5E9"), "#0EA5E9");
    assert_eq!(sanitize_css_value("#ffff"), "");
    assert_eq!(sanitize_css_value("#gggggg"), "");
    assert_eq!(sanitize_css_value("#fff;}body{"), "");
  }

  #[test]
  fn test_functional_colors() {
    assert_eq!(sanitize_css_value("hsl(210, 40%, 50%)"), "hsl(210, 40%, 50%)");
    assert_eq!(sanitize_css_value("rgba(0, 0, 0, 0.5)"), "rgba(0, 0, 0, 0.5)");
    assert_eq!(sanitize_css_value("rgb(0,0,0); background: url(x)"), "");
    assert_eq!(sanitize_css_value("hsl(calc(1))"), "");
  }

  #[test]
  fn test_other_values_are_stripped() {
    assert_eq!(sanitize_css_value("red"), "red");
    assert_eq!(sanitize_css_value("red;}body{x:y"), "redbodyxy");
    assert_eq!(sanitize_css_value("var(--primary)"), "var(--primary)");
  }

  #[test]
  fn test_selector_sanitization() {
    assert_eq!(sanitize_css_selector(".dark"), ".dark");
    assert_eq!(sanitize_css_selector("[data-theme='dark']"), "[data-theme='dark']");
    assert_eq!(sanitize_css_selector(".dark{}</style>"), ".darkstyle");
  }

  #[test]
  fn test_generate_chart_css() {
    let themes = BTreeMap::from([
      ("dark".to_string(), ".dark".to_string()),
      ("light".to_string(), String::new()),
    ]);
    let colors = BTreeMap::from([
      ("wind".to_string(), ChartColor::solid("#0ea5e9")),
      (
        "solar".to_string(),
        ChartColor {
          color: None,
          theme: BTreeMap::from([
            ("light".to_string(), "#f59e0b".to_string()),
            ("dark".to_string(), "#fbbf24".to_string()),
          ]),
        },
      ),
    ]);

    let css = generate_chart_css(&themes, "capacity", &colors);
    assert_eq!(
      css,
      ".dark [data-chart=\"capacity\"] {\n  --color-solar: #fbbf24;\n  --color-wind: #0ea5e9;\n}\n\
       [data-chart=\"capacity\"] {\n  --color-solar: #f59e0b;\n  --color-wind: #0ea5e9;\n}\n"
    );
  }

  #[test]
  fn test_generate_skips_rejected_values_and_empty_themes() {
    let themes = BTreeMap::from([("light".to_string(), String::new())]);
    let colors = BTreeMap::from([("bad".to_string(), ChartColor::solid("#12"))]);
    assert_eq!(generate_chart_css(&themes, "c", &colors), "");
  }

  #[test]
  fn test_chart_id_is_sanitized() {
    let themes = BTreeMap::from([("light".to_string(), String::new())]);
    let colors = BTreeMap::from([("wind".to_string(), ChartColor::solid("blue"))]);
    let css = generate_chart_css(&themes, "x\"]{}<", &colors);
    assert!(css.starts_with("[data-chart=\"x\"]\"] {"));
    assert!(!css.contains('<'));
    assert_eq!(css.matches('{').count(), 1);
  }
}
