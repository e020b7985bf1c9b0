use listkeys_engine::{CommandName, Editor};
use pretty_assertions::assert_eq;

#[test]
fn list_buttons_are_available() {
    let editor = Editor::default();

    for name in ["bulletedList", "numberedList", "indent", "outdent"] {
        assert!(editor.ui().create(name).is_some(), "missing button {name}");
    }
}

#[test]
fn buttons_execute_their_commands() {
    let mut editor = Editor::from_fixture("[]foo").unwrap();

    editor.press("bulletedList").unwrap();
    editor.press("numberedList").unwrap();

    assert_eq!(
        editor.execution_log(),
        &[CommandName::BulletedList, CommandName::NumberedList]
    );
    assert_eq!(editor.document().to_fixture(), "1. []foo\n");
}

#[test]
fn bulleted_list_button_follows_command() {
    let mut editor = Editor::from_fixture("- []foo").unwrap();

    let button = editor.ui().create("bulletedList").unwrap();
    assert!(button.is_on);
    assert!(button.is_enabled);

    editor
        .commands_mut()
        .set_value(CommandName::BulletedList, false);
    editor.sync_ui();
    assert!(!editor.ui().create("bulletedList").unwrap().is_on);

    editor
        .commands_mut()
        .force_disabled(CommandName::BulletedList, "test");
    editor.sync_ui();
    assert!(!editor.ui().create("bulletedList").unwrap().is_enabled);
}

#[test]
fn numbered_list_button_follows_command() {
    let mut editor = Editor::from_fixture("- []foo").unwrap();

    // The caret is in a bulleted list, so the numbered list is off
    let button = editor.ui().create("numberedList").unwrap();
    assert!(!button.is_on);
    assert!(button.is_enabled);

    editor
        .commands_mut()
        .set_value(CommandName::NumberedList, true);
    editor.sync_ui();
    assert!(editor.ui().create("numberedList").unwrap().is_on);

    editor
        .commands_mut()
        .force_disabled(CommandName::NumberedList, "test");
    editor.sync_ui();
    assert!(!editor.ui().create("numberedList").unwrap().is_enabled);
}

#[test]
fn indent_buttons_follow_selection() {
    let mut editor = Editor::from_fixture("- foo\n- []bar").unwrap();
    assert!(editor.ui().create("indent").unwrap().is_enabled);

    editor.press("indent").unwrap();

    assert!(!editor.ui().create("indent").unwrap().is_enabled);
    assert!(editor.ui().create("outdent").unwrap().is_enabled);
    assert_eq!(editor.document().to_fixture(), "- foo\n  - []bar\n");
}
