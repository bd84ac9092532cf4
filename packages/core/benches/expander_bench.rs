//! Expander benchmarks
//!
//! Target: resolve and expand 1000 placeholders in <10ms

use std::rc::Rc;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use hextant_core::{
    default_context, CompileResult, ConfiguredExpander, Context, EditorClass, EditorRegistry,
    EditorTree, ExpanderConfig, ListKind, Settings, SimpleToken, TreeUndo,
};

fn number() -> Rc<SimpleToken<i64>> {
    Rc::new(SimpleToken::new("number", |text: &str| {
        text.parse::<i64>()
            .map(CompileResult::ok)
            .unwrap_or_else(|_| CompileResult::err("not a number"))
    }))
}

fn expander() -> Rc<ConfiguredExpander<i64>> {
    let mut config: ExpanderConfig<i64> = ExpanderConfig::new();
    for i in 0..100 {
        config.register_key(format!("key{}", i), move |tree, context| {
            tree.new_token_with_text(number(), context, &i.to_string())
        });
    }
    config.register_token_interceptor(number(), |tree, value, context| {
        tree.new_token_with_text(number(), context, &value.to_string())
    });
    Rc::new(ConfiguredExpander::new("number-expander", config).with_default_result(CompileResult::ok(0)))
}

struct Numbers(Rc<ConfiguredExpander<i64>>);

impl ListKind<i64> for Numbers {
    fn name(&self) -> &str {
        "numbers"
    }

    fn element(&self) -> EditorClass<i64> {
        EditorClass::Expander(self.0.clone())
    }

    fn compose(&self, values: Vec<i64>) -> CompileResult<i64> {
        CompileResult::ok(values.iter().sum())
    }
}

fn numbers() -> Rc<Numbers> {
    Rc::new(Numbers(expander()))
}

fn context(undo_levels: usize) -> Context {
    let registry = EditorRegistry::new()
        .with(EditorClass::Token(number()))
        .with(EditorClass::Expander(expander()))
        .with(EditorClass::List(numbers()));
    default_context(
        Settings {
            undo_levels,
            ..Default::default()
        },
        registry,
    )
}

fn expand_constant_keys(c: &mut Criterion) {
    let ctx = context(100);
    let kind = expander();

    c.bench_function("expand_constant_key", |b| {
        b.iter(|| {
            let mut tree: EditorTree<i64> = EditorTree::new();
            let e = tree.new_expander(kind.clone(), &ctx);
            tree.set_text(e, black_box("key99")).unwrap();
            tree.expand(e).unwrap()
        })
    });
}

fn expand_through_interceptor(c: &mut Criterion) {
    let ctx = context(100);
    let kind = expander();

    c.bench_function("expand_interceptor", |b| {
        b.iter(|| {
            let mut tree: EditorTree<i64> = EditorTree::new();
            let e = tree.new_expander(kind.clone(), &ctx);
            tree.set_text(e, black_box("12345")).unwrap();
            tree.expand(e).unwrap()
        })
    });
}

fn fill_large_list(c: &mut Criterion) {
    let ctx = context(0);
    let kind = numbers();

    c.bench_function("fill_list_1000_items", |b| {
        b.iter(|| {
            let mut tree: EditorTree<i64> = EditorTree::new();
            let list = tree.new_list(kind.clone(), &ctx);
            for index in 0..1000 {
                let item = tree.add_item(list, index).unwrap();
                tree.set_text(item, &index.to_string()).unwrap();
                tree.expand(item).unwrap();
            }
            black_box(tree.result(list).unwrap().clone())
        })
    });
}

fn undo_redo_throughput(c: &mut Criterion) {
    let ctx = context(0);
    let undo = ctx.require::<TreeUndo<i64>>().unwrap();
    let mut tree: EditorTree<i64> = EditorTree::new();
    let list = tree.new_list(numbers(), &ctx);
    for index in 0..100 {
        let item = tree.add_item(list, index).unwrap();
        tree.set_text(item, &index.to_string()).unwrap();
        tree.expand(item).unwrap();
    }

    c.bench_function("undo_redo_300_edits", |b| {
        b.iter(|| {
            while undo.undo(&mut tree).unwrap() {}
            while undo.redo(&mut tree).unwrap() {}
        })
    });
}

criterion_group!(
    benches,
    expand_constant_keys,
    expand_through_interceptor,
    fill_large_list,
    undo_redo_throughput
);
criterion_main!(benches);
