//! Unit tests for prompt composition

use yacht_shot::prompt::{
    compose, PromptMode, COMPOSITE_BASE, EDIT_BASE, EXTRA_INSTRUCTIONS, SEPARATOR,
};

#[test]
fn test_edit_mode_default() {
    assert_eq!(
        compose("", false),
        [EDIT_BASE, EXTRA_INSTRUCTIONS].join(SEPARATOR)
    );
}

#[test]
fn test_composite_with_user_text() {
    assert_eq!(
        compose("smile more", true),
        [COMPOSITE_BASE, EXTRA_INSTRUCTIONS, "smile more"].join(SEPARATOR)
    );
}

#[test]
fn test_edit_with_user_text() {
    assert_eq!(
        compose("\tadd a sunset ", false),
        [EDIT_BASE, EXTRA_INSTRUCTIONS, "add a sunset"].join(SEPARATOR)
    );
}

#[test]
fn test_deterministic() {
    assert_eq!(compose("same", true), compose("same", true));
    assert_ne!(compose("same", true), compose("same", false));
}

#[test]
fn test_separator_is_em_dash() {
    assert_eq!(SEPARATOR, " \u{2014} ");
}

#[test]
fn test_mode_selection() {
    assert_eq!(PromptMode::for_user_image(true), PromptMode::Composite);
    assert_eq!(PromptMode::for_user_image(false), PromptMode::Edit);
    assert_eq!(PromptMode::Composite.base(), COMPOSITE_BASE);
}
