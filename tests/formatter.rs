//! Resilient formatter: canonical path properties and fallback safety.

use proptest::prelude::*;
use pyedit::format::{canonical, fallback};
use pyedit::{reformat, FormatOptions, FormatPath};

const BLOCKS: &[&str] = &[
    "x = 'a'",
    "def f(a, b):\n{I}return a + b",
    "class C:\n{I}def m(self):\n{I}{I}if self:\n{I}{I}{I}pass\n{I}{I}else:\n{I}{I}{I}return 1",
    "result = compute(alpha_value, beta_value, gamma_value, delta_value, epsilon_value, zeta_value, eta)",
    "s = '''\n  keep\n'''",
    "# comment",
    "try:\n{I}x = 1\nexcept ValueError:\n{I}x = 2\nfinally:\n{I}done()",
    "@decorator\ndef g(*args, **kwargs):\n{I}return {'k': [1, 2], \"v\": (3,)}",
    "value = call(\n{I}{I}first,\n{I}second)",
];

fn program() -> impl Strategy<Value = String> {
    (
        1usize..=8,
        prop::collection::vec((0..BLOCKS.len(), 0usize..4), 1..8),
    )
        .prop_map(|(width, blocks)| {
            let indent = " ".repeat(width);
            let mut text = String::new();
            for (block, blanks) in blocks {
                text.push_str(&BLOCKS[block].replace("{I}", &indent));
                text.push('\n');
                text.push_str(&"\n".repeat(blanks));
            }
            text
        })
}

#[test]
fn reformat_normalizes_a_messy_module() {
    let source = "import os\n\n\n\n\nclass Greeter :\n  def greet(self, name):\n        if name:\n              return 'hello ' + name   \n        return 'hello'\n\n\n\n  def part(self):\n      return os.sep\n";
    let out = reformat(source, &FormatOptions::default());
    assert_eq!(out.path, FormatPath::Canonical);
    assert_eq!(
        out.text,
        "import os\n\n\nclass Greeter :\n    def greet(self, name):\n        if name:\n            return \"hello \" + name\n        return \"hello\"\n\n    def part(self):\n        return os.sep\n"
    );
}

#[test]
fn indent_width_is_configurable() {
    let options = FormatOptions::with_widths(2, 88);
    let out = canonical::format("def f():\n    if x:\n        return 1\n", &options).unwrap();
    assert_eq!(out, "def f():\n  if x:\n    return 1\n");
}

#[test]
fn quote_normalization_can_be_disabled() {
    let options = FormatOptions {
        normalize_quotes: false,
        ..FormatOptions::default()
    };
    assert_eq!(canonical::format("x = 'a'\n", &options).unwrap(), "x = 'a'\n");
}

#[test]
fn unparsable_text_degrades_to_fallback() {
    let out = reformat("class A:\nx = (\n", &FormatOptions::default());
    assert_eq!(out.path, FormatPath::Fallback);
    assert_eq!(out.text, "class A:\n    x = (\n");
}

#[test]
fn empty_text_is_empty_on_both_paths() {
    assert_eq!(reformat("", &FormatOptions::default()).text, "");
    assert_eq!(fallback::reindent("", 4), "");
}

proptest! {
    #[test]
    fn canonical_reformat_is_idempotent(source in program(), line_width in 40usize..120) {
        let options = FormatOptions::with_widths(4, line_width);
        let once = reformat(&source, &options);
        prop_assert_eq!(once.path, FormatPath::Canonical);
        let twice = reformat(&once.text, &options);
        prop_assert_eq!(twice.path, FormatPath::Canonical);
        prop_assert_eq!(&twice.text, &once.text);
    }

    #[test]
    fn canonical_output_respects_width_where_splittable(source in program()) {
        let options = FormatOptions::with_widths(4, 60);
        let out = canonical::format(&source, &options).unwrap();
        prop_assert!(out.lines().all(|line| !line.starts_with("result = compute(alpha")));
    }

    #[test]
    fn fallback_never_panics_and_keeps_lines(text in "(?s).{0,400}", width in 1usize..9) {
        let out = fallback::reindent(&text, width);
        if text.is_empty() {
            prop_assert_eq!(out, "");
        } else {
            prop_assert_eq!(out.lines().count(), text.lines().count());
        }
    }

    #[test]
    fn fallback_on_python_like_lines(
        lines in prop::collection::vec("[ \t]{0,6}(def f\\(\\):|class C:|return x|else:|x = 1|\"\"\"|# c|)", 0..40)
    ) {
        let text = lines.join("\n");
        let out = fallback::reindent(&text, 4);
        prop_assert_eq!(out.lines().count(), text.lines().count());
    }
}

#[test]
fn bodiless_header_takes_the_fallback() {
    let out = reformat("class A:\n    def f(self):\n", &FormatOptions::default());
    assert_eq!(out.path, FormatPath::Fallback);
    assert_eq!(out.text, "class A:\n    def f(self):\n");
}

#[test]
fn inconsistent_indent_takes_the_fallback() {
    let out = reformat("def f():\n    a = 1\n        b = 2\n", &FormatOptions::default());
    assert_eq!(out.path, FormatPath::Fallback);
}

#[test]
fn fstring_interpolation_is_never_split() {
    let source = "x = f\"{compute(alpha_value, beta_value, gamma_value)}\"\n";
    let out = reformat(source, &FormatOptions::with_widths(4, 30));
    assert_eq!(out.path, FormatPath::Canonical);
    assert_eq!(out.text, source);
}
