// src/rules/escape.rs

//! Escaping for make identifiers, shell words and recipe lines

use std::borrow::Cow;
use std::fmt::Write;

/// Turn an arbitrary name into a make/shell variable identifier
///
/// ASCII letters and digits are kept; every other byte becomes `_xx` with
/// lowercase hex. `_` itself is encoded, so distinct names never collide:
/// `foo-man` → `foo_2dman`, `foo_man` → `foo_5fman`.
pub fn make_ident(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for byte in name.bytes() {
        if byte.is_ascii_alphanumeric() {
            out.push(byte as char);
        } else {
            let _ = write!(out, "_{byte:02x}");
        }
    }
    out
}

fn is_shell_safe(c: char) -> bool {
    c.is_ascii_alphanumeric() || "_-./=:+,@%^".contains(c)
}

/// Quote a word for POSIX sh
///
/// Words made only of safe characters are returned as is; everything else
/// is single-quoted with embedded quotes written as `'\''`.
pub fn shell_quote(word: &str) -> Cow<'_, str> {
    if !word.is_empty() && word.chars().all(is_shell_safe) {
        return Cow::Borrowed(word);
    }
    Cow::Owned(format!("'{}'", word.replace('\'', r"'\''")))
}

/// Double every `$` so make passes it through to the shell
pub fn escape_dollars(text: &str) -> Cow<'_, str> {
    if text.contains('$') {
        Cow::Owned(text.replace('$', "$$"))
    } else {
        Cow::Borrowed(text)
    }
}

/// A value interpolated into a make recipe line: shell quoted, then `$` doubled
pub fn recipe_word(word: &str) -> String {
    escape_dollars(&shell_quote(word)).into_owned()
}
