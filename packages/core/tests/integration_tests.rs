//! Integration tests for the core editing engine

mod common;

use std::rc::Rc;

use common::*;
use hextant_core::{
    Accessor, CompileResult, Completion, CompletionItem, EditorError, EditorKind, EditorTree,
    ExpanderState, Snapshot, SnapshotState,
};

#[test]
fn test_expand_constant_key_and_reset() {
    let (mut tree, ctx, _) = setup();
    let e = tree.new_expander(expr(), &ctx);

    tree.set_text(e, "42").unwrap();
    assert!(!tree.is_expanded(e).unwrap());

    assert!(tree.expand(e).unwrap());
    assert!(tree.is_expanded(e).unwrap());
    assert_eq!(*tree.result(e).unwrap(), int_expr(42));

    let content = tree.expander_content(e).unwrap().unwrap();
    assert_eq!(tree.kind_of(content).unwrap(), EditorKind::Token);
    assert_eq!(tree.token_text(content).unwrap(), "42");

    tree.reset(e).unwrap();
    assert!(!tree.is_expanded(e).unwrap());
    assert_eq!(tree.expander_text(e).unwrap(), Some(""));
    assert_eq!(*tree.result(e).unwrap(), CompileResult::ok(Expr::Hole));
    assert!(!tree.contains(content));
}

#[test]
fn test_unknown_text_is_no_trigger() {
    let (mut tree, ctx, undo) = setup();
    let e = tree.new_expander(expr(), &ctx);

    tree.set_text(e, "foo").unwrap();
    let levels = undo.undo_levels();

    assert!(!tree.expand(e).unwrap());
    assert_eq!(tree.expander_text(e).unwrap(), Some("foo"));
    assert_eq!(undo.undo_levels(), levels);
    assert_eq!(*tree.result(e).unwrap(), CompileResult::ok(Expr::Hole));
}

#[test]
fn test_text_mode_compiles_once() {
    let (mut tree, ctx, _) = setup();
    let e = tree.new_expander(expr(), &ctx);

    tree.set_text(e, "17").unwrap();
    assert!(!tree.is_expanded(e).unwrap());
    assert_eq!(*tree.result(e).unwrap(), int_expr(17));
}

#[test]
fn test_interceptor_expands_integers() {
    let (mut tree, ctx, _) = setup();
    let e = tree.new_expander(expr(), &ctx);

    tree.set_text(e, "7").unwrap();
    assert!(tree.expand(e).unwrap());

    let content = tree.sub_editor(e, Accessor::ExpanderContent).unwrap();
    assert_eq!(tree.token_text(content).unwrap(), "7");
    assert_eq!(*tree.result(e).unwrap(), int_expr(7));
}

#[test]
fn test_results_propagate_through_nested_editors() {
    let (mut tree, ctx, _) = setup();
    let root = tree.new_expander(expr(), &ctx);
    tree.set_text(root, "+").unwrap();
    assert!(tree.expand(root).unwrap());
    assert_eq!(*tree.result(root).unwrap(), sum_expr(Expr::Hole, Expr::Hole));

    let sum = tree.expander_content(root).unwrap().unwrap();
    let lhs = tree.component(sum, 0).unwrap();
    let rhs = tree.component(sum, 1).unwrap();

    tree.set_text(lhs, "1").unwrap();
    tree.expand(lhs).unwrap();
    tree.set_text(rhs, "2").unwrap();
    assert_eq!(*tree.result(root).unwrap(), sum_expr(Expr::Int(1), Expr::Int(2)));

    // A broken leaf is a local error, its ancestors only see a child error
    let literal = tree.expander_content(lhs).unwrap().unwrap();
    tree.set_text(literal, "x").unwrap();
    assert!(tree.result(literal).unwrap().is_err());
    assert!(tree.result(lhs).unwrap().is_err());
    assert!(tree.result(sum).unwrap().is_child_err());
    assert!(tree.result(root).unwrap().is_child_err());

    tree.set_text(literal, "5").unwrap();
    assert_eq!(*tree.result(root).unwrap(), sum_expr(Expr::Int(5), Expr::Int(2)));
}

#[test]
fn test_complete_with_structured_item() {
    let (mut tree, ctx, _) = setup();
    let e = tree.new_expander(expr(), &ctx);
    let answer = Constant {
        name: "answer".into(),
        value: 42,
    };

    tree.complete(e, &Completion::of(&answer, "answer").unwrap())
        .unwrap();

    assert!(tree.is_expanded(e).unwrap());
    assert_eq!(*tree.result(e).unwrap(), int_expr(42));
}

#[test]
fn test_complete_falls_back_to_text() {
    let (mut tree, ctx, _) = setup();
    let e = tree.new_expander(expr(), &ctx);
    let completion = Completion::new(CompletionItem::raw("keyword", serde_json::json!("plus")), "+");

    tree.complete(e, &completion).unwrap();

    let sum = tree.expander_content(e).unwrap().unwrap();
    assert_eq!(tree.kind_of(sum).unwrap(), EditorKind::Compound);
}

#[test]
fn test_unmatched_completion_is_kept() {
    let (mut tree, ctx, _) = setup();
    let e = tree.new_expander(expr(), &ctx);
    let item = CompletionItem::raw("keyword", serde_json::json!("while"));

    tree.complete(e, &Completion::new(item.clone(), "while")).unwrap();

    assert!(!tree.is_expanded(e).unwrap());
    assert_eq!(
        *tree.expander_state(e).unwrap(),
        ExpanderState::Text {
            text: "while".into(),
            completion: Some(item),
        }
    );
}

#[test]
fn test_token_completion_prefers_item() {
    let (mut tree, ctx, _) = setup();
    let token = new_int(&mut tree, &ctx, "");
    let pi = Constant {
        name: "three".into(),
        value: 3,
    };

    tree.complete(token, &Completion::of(&pi, "three").unwrap())
        .unwrap();

    assert_eq!(tree.token_text(token).unwrap(), "three");
    assert_eq!(*tree.result(token).unwrap(), int_expr(3));
}

#[test]
fn test_views_receive_transitions() {
    let (mut tree, ctx, _) = setup();
    let e = tree.new_expander(expr(), &ctx);
    let (recorder, _view) = Recorder::attach(&mut tree, e);

    tree.set_text(e, "42").unwrap();
    tree.expand(e).unwrap();
    tree.reset(e).unwrap();

    assert_eq!(
        recorder.take(),
        vec![
            "text 42",
            "result Ok(Int(42))",
            "expanded",
            "result Ok(Hole)",
            "reset",
        ]
    );
}

#[test]
fn test_attach_view_pushes_list_items() {
    let (mut tree, ctx, _) = setup();
    let list = tree.new_list(Rc::new(ExprList), &ctx);
    tree.add_item(list, 0).unwrap();
    tree.add_item(list, 1).unwrap();

    let recorder = Rc::new(Recorder::default());
    let view: Rc<dyn hextant_core::EditorView<Expr>> = recorder.clone();
    tree.attach_view(list, &view).unwrap();

    assert_eq!(
        recorder.take(),
        vec!["result Ok(List([Hole, Hole]))", "added 0", "added 1"]
    );
}

#[test]
fn test_dropped_view_is_skipped() {
    let (mut tree, ctx, _) = setup();
    let e = tree.new_expander(expr(), &ctx);
    let (recorder, view) = Recorder::attach(&mut tree, e);
    drop(view);
    drop(recorder);

    tree.set_text(e, "1").unwrap();
    assert_eq!(tree.get(e).unwrap().view_count(), 0);
}

#[test]
fn test_list_separator_opens_new_item() {
    let (mut tree, ctx, _) = setup();
    let list = tree.new_list(Rc::new(ExprList), &ctx);
    let first = tree.add_item(list, 0).unwrap();

    tree.set_text(first, "12").unwrap();
    tree.set_text(first, "12,").unwrap();

    let items = tree.items(list).unwrap().to_vec();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0], first);
    assert_eq!(tree.expander_text(first).unwrap(), Some("12"));
    assert_eq!(tree.expander_text(items[1]).unwrap(), Some(""));
    assert_eq!(
        *tree.result(list).unwrap(),
        CompileResult::ok(Expr::List(vec![Expr::Int(12), Expr::Hole]))
    );
}

#[test]
fn test_separator_disabled_by_settings() {
    let (mut tree, ctx, _) = setup_with(hextant_core::Settings {
        list_separator: None,
        ..Default::default()
    });
    let list = tree.new_list(Rc::new(ExprList), &ctx);
    let first = tree.add_item(list, 0).unwrap();

    tree.set_text(first, "1,").unwrap();

    assert_eq!(tree.items(list).unwrap().len(), 1);
    assert_eq!(tree.expander_text(first).unwrap(), Some("1,"));
}

#[test]
fn test_separator_outside_list_is_plain_text() {
    let (mut tree, ctx, _) = setup();
    let e = tree.new_expander(expr(), &ctx);

    tree.set_text(e, "3,").unwrap();
    assert_eq!(tree.expander_text(e).unwrap(), Some("3,"));
}

#[test]
fn test_list_bounds_are_checked() {
    let (mut tree, ctx, _) = setup();
    let list = tree.new_list(Rc::new(ExprList), &ctx);

    assert_eq!(
        tree.add_item(list, 1).unwrap_err(),
        EditorError::IndexOutOfBounds { index: 1, len: 0 }
    );
    assert_eq!(
        tree.remove_item(list, 0).unwrap_err(),
        EditorError::IndexOutOfBounds { index: 0, len: 0 }
    );
}

#[test]
fn test_snapshot_round_trip_through_json() {
    let (mut tree, ctx, _) = setup();
    let root = tree.new_expander(expr(), &ctx);
    tree.set_text(root, "+").unwrap();
    tree.expand(root).unwrap();
    let sum = tree.expander_content(root).unwrap().unwrap();
    let lhs = tree.component(sum, 0).unwrap();
    tree.set_text(lhs, "42").unwrap();
    tree.expand(lhs).unwrap();
    tree.set_text(tree.component(sum, 1).unwrap(), "8").unwrap();

    let json = tree.snapshot(root).unwrap().encode().unwrap();
    let decoded = Snapshot::decode(&json).unwrap();

    let (mut other, other_ctx, _) = setup();
    let copy = other.reconstruct(&decoded, &other_ctx).unwrap();

    assert_eq!(other.result(copy).unwrap(), tree.result(root).unwrap());
    assert!(other.is_expanded(copy).unwrap());
    let copied_sum = other.expander_content(copy).unwrap().unwrap();
    assert!(other.is_expanded(other.component(copied_sum, 0).unwrap()).unwrap());
    assert_eq!(
        other.expander_text(other.component(copied_sum, 1).unwrap()).unwrap(),
        Some("8")
    );
}

#[test]
fn test_reconstruct_keeps_completion() {
    let (mut tree, ctx, _) = setup();
    let e = tree.new_expander(expr(), &ctx);
    let item = CompletionItem::raw("keyword", serde_json::json!("while"));
    tree.complete(e, &Completion::new(item.clone(), "while")).unwrap();

    let snapshot = tree.snapshot(e).unwrap();
    let copy = tree.reconstruct(&snapshot, &ctx).unwrap();

    assert_eq!(tree.expander_state(copy).unwrap(), tree.expander_state(e).unwrap());
}

#[test]
fn test_reconstruct_keeps_token_completion() {
    let (mut tree, ctx, _) = setup();
    let token = new_int(&mut tree, &ctx, "");
    let answer = Constant {
        name: "answer".into(),
        value: 42,
    };
    tree.complete(token, &Completion::of(&answer, "answer").unwrap())
        .unwrap();

    let json = tree.snapshot(token).unwrap().encode().unwrap();
    let copy = tree.reconstruct(&Snapshot::decode(&json).unwrap(), &ctx).unwrap();

    assert_eq!(tree.token_text(copy).unwrap(), "answer");
    assert_eq!(*tree.result(copy).unwrap(), int_expr(42));
}

#[test]
fn test_reconstruct_errors() {
    let (mut tree, ctx, _) = setup();
    let count = tree.len();

    let anonymous = Snapshot::new(None, SnapshotState::token("1"));
    assert_eq!(
        tree.reconstruct(&anonymous, &ctx).unwrap_err(),
        EditorError::MissingClass
    );

    let unknown = Snapshot::new(Some("float".into()), SnapshotState::token("1"));
    assert_eq!(
        tree.reconstruct(&unknown, &ctx).unwrap_err(),
        EditorError::UnknownClass("float".into())
    );

    let mismatched = Snapshot::new(Some("sum".into()), SnapshotState::token("1"));
    assert!(matches!(
        tree.reconstruct(&mismatched, &ctx),
        Err(EditorError::SnapshotMismatch { .. })
    ));

    // Failed reconstructions leave nothing behind
    assert_eq!(tree.len(), count);
}

#[test]
fn test_copy_paste_between_expanders() {
    let (mut tree, ctx, _) = setup();
    let source = tree.new_expander(expr(), &ctx);
    tree.set_text(source, "+").unwrap();
    tree.expand(source).unwrap();

    let target = tree.new_expander(expr(), &ctx);
    let clip = tree.copy(source).unwrap();
    assert!(tree.paste(target, &clip).unwrap());

    assert_eq!(tree.result(target).unwrap(), tree.result(source).unwrap());
    assert_ne!(tree.expander_content(target).unwrap(), tree.expander_content(source).unwrap());
}

#[test]
fn test_paste_token_into_expander() {
    let (mut tree, ctx, undo) = setup();
    let literal = new_int(&mut tree, &ctx, "9");
    let e = tree.new_expander(expr(), &ctx);

    let clip = tree.copy(literal).unwrap();
    assert!(tree.paste(e, &clip).unwrap());
    assert_eq!(*tree.result(e).unwrap(), int_expr(9));

    assert_eq!(undo.undo_text().as_deref(), Some("Undo Paste"));
    undo.undo(&mut tree).unwrap();
    assert!(!tree.is_expanded(e).unwrap());
}

#[test]
fn test_paste_rejects_unfitting_snapshot() {
    let (mut tree, ctx, _) = setup();
    let literal = new_int(&mut tree, &ctx, "1");
    let list = tree.new_list(Rc::new(ExprList), &ctx);
    let clip = tree.snapshot(list).unwrap();

    assert!(!tree.paste(literal, &clip).unwrap());
    assert_eq!(tree.token_text(literal).unwrap(), "1");

    let sum = tree.new_compound(Rc::new(Sum), &ctx);
    assert_eq!(tree.copy(sum).unwrap_err(), EditorError::CopyPasteUnsupported(sum));
    assert!(!tree.supports_copy_paste(list).unwrap());
}

#[test]
fn test_failed_paste_keeps_expanded_content() {
    let (mut tree, ctx, undo) = setup();
    let e = tree.new_expander(expr(), &ctx);
    tree.set_text(e, "42").unwrap();
    tree.expand(e).unwrap();
    let content = tree.expander_content(e).unwrap().unwrap();
    let levels = undo.undo_levels();
    let count = tree.len();

    let clip = Snapshot::decode(
        r#"{"_class":"expr","_type":"expander","editor":{"_class":"nope","_type":"token","text":"1"}}"#,
    )
    .unwrap();
    assert!(!tree.paste(e, &clip).unwrap());

    assert_eq!(tree.expander_content(e).unwrap(), Some(content));
    assert_eq!(*tree.result(e).unwrap(), int_expr(42));
    assert_eq!(undo.undo_levels(), levels);
    assert_eq!(tree.len(), count);
}

#[test]
fn test_paste_expanded_expander_replaces_content() {
    let (mut tree, ctx, _) = setup();
    let source = tree.new_expander(expr(), &ctx);
    tree.set_text(source, "+").unwrap();
    tree.expand(source).unwrap();
    let target = tree.new_expander(expr(), &ctx);
    tree.set_text(target, "42").unwrap();
    tree.expand(target).unwrap();

    let clip = tree.copy(source).unwrap();
    assert!(tree.paste(target, &clip).unwrap());
    assert_eq!(*tree.result(target).unwrap(), sum_expr(Expr::Hole, Expr::Hole));
}

#[test]
fn test_paste_into_token_is_undoable() {
    let (mut tree, ctx, undo) = setup();
    let source = new_int(&mut tree, &ctx, "5");
    let target = new_int(&mut tree, &ctx, "6");

    let clip = tree.copy(source).unwrap();
    assert!(tree.paste(target, &clip).unwrap());
    assert_eq!(tree.token_text(target).unwrap(), "5");

    undo.undo(&mut tree).unwrap();
    assert_eq!(tree.token_text(target).unwrap(), "6");
}

#[test]
fn test_move_to_other_context() {
    let (mut tree, ctx, _) = setup();
    let e = tree.new_expander(expr(), &ctx);
    tree.set_text(e, "42").unwrap();
    tree.expand(e).unwrap();

    assert_eq!(tree.move_to(e, &ctx).unwrap(), e);

    let scope = ctx.extend();
    let moved = tree.move_to(e, &scope).unwrap();
    assert_ne!(moved, e);
    assert!(!tree.contains(e));
    assert!(tree.context(moved).unwrap().ptr_eq(&scope));
    assert_eq!(*tree.result(moved).unwrap(), int_expr(42));
}

#[test]
fn test_expand_to_rejects_attached_editor() {
    let (mut tree, ctx, _) = setup();
    let sum = tree.new_compound(Rc::new(Sum), &ctx);
    let component = tree.component(sum, 0).unwrap();
    let e = tree.new_expander(expr(), &ctx);

    assert_eq!(
        tree.expand_to(e, component).unwrap_err(),
        EditorError::AlreadyAttached(component)
    );
    assert!(!tree.is_expanded(e).unwrap());
}

#[test]
fn test_remove_root_frees_subtree() {
    let mut tree: EditorTree<Expr> = EditorTree::new();
    let (_, ctx, _) = setup();
    let sum = tree.new_compound(Rc::new(Sum), &ctx);
    let lhs = tree.component(sum, 0).unwrap();
    assert_eq!(tree.len(), 3);

    tree.remove_root(sum).unwrap();
    assert!(tree.is_empty());
    assert_eq!(tree.result(lhs).unwrap_err(), EditorError::StaleEditor(lhs));
}
