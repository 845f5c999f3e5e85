//! C++-safe identifier handling: reserved-word escaping for schema names
//! and canonicalization of filesystem-derived tokens.

use once_cell::sync::Lazy;
use std::collections::HashSet;

static CPP_RESERVED: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "alignas", "alignof", "and", "and_eq", "asm", "auto", "bitand", "bitor", "bool", "break",
        "case", "catch", "char", "char8_t", "char16_t", "char32_t", "class", "compl", "concept",
        "const", "consteval", "constexpr", "constinit", "const_cast", "continue", "co_await",
        "co_return", "co_yield", "decltype", "default", "delete", "do", "double", "dynamic_cast",
        "else", "enum", "explicit", "export", "extern", "false", "float", "for", "friend", "goto",
        "if", "import", "inline", "int", "long", "module", "mutable", "namespace", "new",
        "noexcept", "not", "not_eq", "nullptr", "operator", "or", "or_eq", "private", "protected",
        "public", "reflexpr", "register", "reinterpret_cast", "requires", "return", "short",
        "signed", "sizeof", "static", "static_assert", "static_cast", "struct", "switch",
        "synchronized", "template", "this", "thread_local", "throw", "true", "try", "typedef",
        "typeid", "typename", "union", "unsigned", "using", "virtual", "void", "volatile",
        "wchar_t", "while", "xor", "xor_eq",
    ]
    .into_iter()
    .collect()
});

/// Escape C++ reserved words by appending `_`; anything else passes
/// through unchanged.
pub fn decorate(name: &str) -> String {
    if CPP_RESERVED.contains(name) {
        format!("{name}_")
    } else {
        name.to_string()
    }
}

/// Map a filesystem-derived token to identifier-safe characters: letters
/// kept (upper-cased when `fold_case`), digits kept, everything else `_`.
pub fn make_canonical(s: &str, fold_case: bool) -> String {
    s.chars()
        .map(|c| {
            if c.is_alphabetic() {
                if fold_case {
                    c.to_ascii_uppercase()
                } else {
                    c
                }
            } else if c.is_ascii_digit() {
                c
            } else {
                '_'
            }
        })
        .collect()
}

// ------------------------------- Tests ------------------------------------ //
