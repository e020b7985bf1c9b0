use listkeys_engine::commands::{Command, CommandError, CommandState};
use listkeys_engine::input::{Decision, DispatchContext, InputListener, TargetRange};
use listkeys_engine::model::query::DocumentQuery;
use listkeys_engine::model::{AncestorChain, NodeId, NodeInfo};
use listkeys_engine::{
    CommandName, CommandRegistry, DeleteDirection, Document, Editor, EventKind, InputDispatcher,
    InputEvent, Keystroke, ListKeymap, Outcome, Position, Priority, Selection,
};
use pretty_assertions::assert_eq;
use rstest::rstest;

struct Dispatched {
    outcome: Outcome,
    event: InputEvent,
    editor: Editor,
}

fn dispatch(fixture: &str, mut event: InputEvent) -> Dispatched {
    let mut editor = Editor::from_fixture(fixture).unwrap();
    let mut dispatcher = InputDispatcher::with_list_rules(ListKeymap::default());
    let outcome = dispatcher.handle(&mut event, &mut editor);
    Dispatched {
        outcome,
        event,
        editor,
    }
}

fn key(keystroke: &str) -> InputEvent {
    InputEvent::key_down(keystroke.parse::<Keystroke>().unwrap())
}

fn backspace() -> InputEvent {
    InputEvent::delete(DeleteDirection::Backward)
}

fn assert_handled(result: &Dispatched, command: CommandName) {
    assert_eq!(result.outcome, Outcome::Handled(command));
    assert!(result.event.is_default_prevented());
    assert!(result.event.is_propagation_stopped());
    assert_eq!(result.editor.execution_log(), &[command]);
}

fn assert_untouched(result: &Dispatched) {
    assert_eq!(result.outcome, Outcome::PassThrough);
    assert!(!result.event.is_default_prevented());
    assert!(!result.event.is_propagation_stopped());
    assert!(result.editor.execution_log().is_empty());
}

// Tab

#[test]
fn tab_indents_item_with_previous_sibling() {
    let result = dispatch("- foo\n- []bar", key("Tab"));

    assert_handled(&result, CommandName::IndentList);
    assert_eq!(result.editor.document().to_fixture(), "- foo\n  - []bar\n");
}

#[test]
fn shift_tab_outdents_nested_item() {
    let result = dispatch("- foo\n  - []bar", key("Shift+Tab"));

    assert_handled(&result, CommandName::OutdentList);
    assert_eq!(result.editor.document().to_fixture(), "- foo\n- []bar\n");
}

#[rstest]
#[case::first_item("- []foo")]
#[case::paragraph("[]foo")]
#[case::other_list_type("- foo\n\n1. []bar")]
fn tab_with_disabled_indent_passes_through(#[case] fixture: &str) {
    let result = dispatch(fixture, key("Tab"));

    assert_untouched(&result);
}

#[test]
fn shift_tab_outside_list_passes_through() {
    assert_untouched(&dispatch("[]foo", key("Shift+Tab")));
}

#[rstest]
#[case("Alt+Tab")]
#[case("Alt+Shift+Tab")]
#[case("Ctrl+Tab")]
fn tab_with_other_modifiers_passes_through(#[case] keystroke: &str) {
    let result = dispatch("- foo\n  - []bar", key(keystroke));

    assert_untouched(&result);
    assert_eq!(result.editor.document().to_fixture(), "- foo\n  - []bar\n");
}

#[test]
fn configured_keystrokes_replace_tab() {
    let keymap = ListKeymap {
        indent: "Ctrl+M".parse().unwrap(),
        outdent: "Ctrl+Shift+M".parse().unwrap(),
    };
    let mut dispatcher = InputDispatcher::with_list_rules(keymap);
    let mut editor = Editor::from_fixture("- foo\n- []bar").unwrap();

    assert_eq!(
        dispatcher.handle(&mut key("Tab"), &mut editor),
        Outcome::PassThrough
    );
    assert_eq!(
        dispatcher.handle(&mut key("Ctrl+M"), &mut editor),
        Outcome::Handled(CommandName::IndentList)
    );
    assert_eq!(
        dispatcher.handle(&mut key("Ctrl+Shift+M"), &mut editor),
        Outcome::Handled(CommandName::OutdentList)
    );
}

// Enter

#[test]
fn enter_in_empty_item_outdents() {
    let result = dispatch("- []", InputEvent::enter());

    assert_handled(&result, CommandName::OutdentList);
    assert_eq!(result.editor.document().to_fixture(), "[]\n");
}

#[test]
fn enter_in_empty_nested_item_outdents_one_level() {
    let result = dispatch("- foo\n  - []", InputEvent::enter());

    assert_handled(&result, CommandName::OutdentList);
    assert_eq!(result.editor.document().to_fixture(), "- foo\n- []\n");
}

#[rstest]
#[case::non_empty_item("- foo[]")]
#[case::caret_at_start("- []foo")]
#[case::empty_paragraph("foo\n\n[]")]
fn enter_elsewhere_passes_through(#[case] fixture: &str) {
    assert_untouched(&dispatch(fixture, InputEvent::enter()));
}

#[test]
fn insert_paragraph_before_input_counts_as_enter() {
    let result = dispatch("- []", InputEvent::before_input("insertParagraph", None));

    assert_handled(&result, CommandName::OutdentList);
}

// Backspace

#[rstest]
#[case::first_item_of_document("- []foo", "[]foo\n")]
#[case::after_paragraph("foo\n\n- []foo", "foo\n\n[]foo\n")]
#[case::after_block_quote("> x\n\n- []foo", "> x\n\n[]foo\n")]
#[case::list_in_block_quote("x\n\n> - []foo", "x\n\n> []foo\n")]
#[case::list_in_nested_block_quote("x\n\n> > - []foo", "x\n\n> > []foo\n")]
#[case::quote_after_another_list("- a\n\n> - []foo", "- a\n\n> []foo\n")]
#[case::nested_items_follow("- []a\n  - b", "[]a\n\n- b\n")]
fn backspace_at_start_of_first_item_outdents(#[case] fixture: &str, #[case] expected: &str) {
    let result = dispatch(fixture, backspace());

    assert_handled(&result, CommandName::OutdentList);
    assert_eq!(result.editor.document().to_fixture(), expected);
}

#[rstest]
#[case::not_first_item("- foo\n- []foo")]
#[case::nested_under_item("- foo\n  - []bar")]
#[case::not_at_start("- fo[]o")]
#[case::not_collapsed("- [fo]o")]
#[case::not_in_list("[]foo")]
fn backspace_elsewhere_passes_through(#[case] fixture: &str) {
    assert_untouched(&dispatch(fixture, backspace()));
}

#[test]
fn forward_delete_never_outdents() {
    let result = dispatch("- []foo", InputEvent::delete(DeleteDirection::Forward));

    assert_untouched(&result);
}

#[rstest]
#[case("deleteContentBackward")]
#[case("deleteWordBackward")]
fn backward_delete_before_input_counts_as_backspace(#[case] input_type: &str) {
    let event = InputEvent::before_input(input_type, None);
    let result = dispatch("> x\n\n- []foo", event);

    assert_handled(&result, CommandName::OutdentList);
}

#[test]
fn forward_delete_before_input_never_outdents() {
    let event = InputEvent::before_input("deleteContentForward", None);

    assert_untouched(&dispatch("- []foo", event));
}

// Composition

#[test]
fn no_list_commands_while_composing() {
    let mut dispatcher = InputDispatcher::with_list_rules(ListKeymap::default());
    let mut editor = Editor::from_fixture("- foo\n- []").unwrap();

    dispatcher.handle(&mut InputEvent::composition_start(), &mut editor);
    for mut event in [key("Tab"), key("Shift+Tab"), InputEvent::enter(), backspace()] {
        assert_eq!(
            dispatcher.handle(&mut event, &mut editor),
            Outcome::PassThrough
        );
        assert!(!event.is_default_prevented());
    }
    dispatcher.handle(&mut InputEvent::composition_end(Some("x".into())), &mut editor);

    assert!(editor.execution_log().is_empty());
    assert_eq!(
        dispatcher.handle(&mut InputEvent::enter(), &mut editor),
        Outcome::Handled(CommandName::OutdentList)
    );
}

#[test]
fn events_tagged_as_composing_pass_through() {
    let result = dispatch("- foo\n- []bar", key("Tab").composing());

    assert_untouched(&result);
}

#[test]
fn composition_end_without_start_does_not_break_dispatch() {
    let mut dispatcher = InputDispatcher::with_list_rules(ListKeymap::default());
    let mut editor = Editor::from_fixture("- foo\n- []bar").unwrap();

    dispatcher.handle(&mut InputEvent::composition_end(None), &mut editor);

    assert_eq!(
        dispatcher.handle(&mut key("Tab"), &mut editor),
        Outcome::Handled(CommandName::IndentList)
    );
}

// Failure handling and idempotence

#[test]
fn repeated_pass_through_is_stable() {
    let mut dispatcher = InputDispatcher::with_list_rules(ListKeymap::default());
    let mut editor = Editor::from_fixture("- foo\n- []bar").unwrap();

    let first = dispatcher.handle(&mut backspace(), &mut editor);
    let second = dispatcher.handle(&mut backspace(), &mut editor);

    assert_eq!(first, Outcome::PassThrough);
    assert_eq!(second, first);
    assert_eq!(editor.document().to_fixture(), "- foo\n- []bar\n");
}

/// Document whose every lookup fails, as after the selection's block was removed
struct DetachedDocument;

impl DocumentQuery for DetachedDocument {
    fn selection(&self) -> Option<Selection> {
        Some(Selection::collapsed(Position::new(self.stale_node(), 0)))
    }

    fn node_info(&self, _node: NodeId) -> Option<NodeInfo> {
        None
    }

    fn ancestors(&self, _position: Position) -> Option<AncestorChain> {
        None
    }

    fn is_block_start(&self, _position: Position) -> Option<bool> {
        None
    }

    fn is_block_empty(&self, _node: NodeId) -> Option<bool> {
        None
    }

    fn preceding_siblings(&self, _node: NodeId) -> Option<Vec<NodeInfo>> {
        None
    }
}

impl DetachedDocument {
    fn stale_node(&self) -> NodeId {
        Document::new().root()
    }
}

#[rstest]
#[case(InputEvent::enter())]
#[case(backspace())]
fn failed_lookups_mean_no_match(#[case] event: InputEvent) {
    let commands = CommandRegistry::with_list_commands();
    let ctx = DispatchContext {
        document: &DetachedDocument,
        commands: &commands,
    };

    let enter = listkeys_engine::input::EnterListener;
    let backspace = listkeys_engine::input::BackspaceListener;
    assert_eq!(enter.classify(&event, &ctx), Decision::PassThrough);
    assert_eq!(backspace.classify(&event, &ctx), Decision::PassThrough);
}

/// Always enabled, always failing
struct BrokenCommand;

impl Command for BrokenCommand {
    fn refresh(&self, _doc: &Document) -> CommandState {
        CommandState::enabled(false)
    }

    fn execute(&mut self, _doc: &mut Document) -> Result<(), CommandError> {
        Err(CommandError::NoSelection)
    }
}

#[test]
fn failing_command_is_absorbed() {
    let mut commands = CommandRegistry::with_list_commands();
    commands.register(CommandName::IndentList, Box::new(BrokenCommand));
    let document = Document::from_fixture("- []foo").unwrap();
    let mut editor = Editor::with_commands(document, commands);
    let mut dispatcher = InputDispatcher::with_list_rules(ListKeymap::default());

    let mut tab = key("Tab");
    let outcome = dispatcher.handle(&mut tab, &mut editor);
    assert_eq!(outcome, Outcome::Handled(CommandName::IndentList));
    assert!(tab.is_default_prevented());
    assert!(editor.execution_log().is_empty());

    // Editing keeps working afterwards
    assert_eq!(
        dispatcher.handle(&mut backspace(), &mut editor),
        Outcome::Handled(CommandName::OutdentList)
    );
}

/// Listener asking for the indent command on every Enter
struct IndentOnEnter;

impl InputListener for IndentOnEnter {
    fn name(&self) -> &str {
        "indent-on-enter"
    }

    fn classify(&self, _event: &InputEvent, _ctx: &DispatchContext<'_>) -> Decision {
        Decision::Execute(CommandName::IndentList)
    }
}

#[test]
fn higher_priority_listener_runs_first() {
    let mut dispatcher = InputDispatcher::with_list_rules(ListKeymap::default());
    dispatcher.register(EventKind::Enter, Priority::Highest, Box::new(IndentOnEnter));
    let mut editor = Editor::from_fixture("- foo\n- []").unwrap();

    let outcome = dispatcher.handle(&mut InputEvent::enter(), &mut editor);

    assert_eq!(outcome, Outcome::Handled(CommandName::IndentList));
    assert_eq!(editor.document().to_fixture(), "- foo\n  - []\n");
}

#[test]
fn unregistered_command_is_never_run() {
    let mut dispatcher = InputDispatcher::new();
    dispatcher.register(EventKind::Enter, Priority::Normal, Box::new(IndentOnEnter));
    let mut editor = Editor::with_commands(
        Document::from_fixture("- foo\n- []").unwrap(),
        CommandRegistry::new(),
    );

    let mut event = InputEvent::enter();
    assert_eq!(dispatcher.handle(&mut event, &mut editor), Outcome::PassThrough);
    assert!(!event.is_default_prevented());
}

// Host defaults after dispatch

#[test]
fn default_applies_only_when_not_suppressed() {
    let mut dispatcher = InputDispatcher::with_list_rules(ListKeymap::default());
    let mut editor = Editor::from_fixture("- foo\n- []bar").unwrap();

    // Not the first item: backspace joins the items
    let mut event = InputEvent::before_input("deleteContentBackward", None);
    dispatcher.handle(&mut event, &mut editor);
    editor.apply_default(&event).unwrap();
    assert_eq!(editor.document().to_fixture(), "- foo[]bar\n");

    // First item now, at its start: backspace outdents and the default is skipped
    let start = Position::new(editor.document().blocks()[0], 0);
    editor.set_selection(Selection::collapsed(start)).unwrap();
    let mut event = InputEvent::before_input("deleteContentBackward", None)
        .with_target_range(TargetRange { start, end: start });
    dispatcher.handle(&mut event, &mut editor);
    editor.apply_default(&event).unwrap();
    assert_eq!(editor.document().to_fixture(), "[]foobar\n");
}
