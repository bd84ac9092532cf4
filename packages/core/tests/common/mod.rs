//! A tiny expression language used by the integration tests
//!
//! - `int`: integer literal token, also completable with a [`Constant`]
//! - `sum`: compound of two `expr` expanders
//! - `expr`: expander with the key `42`, the key `+` and an integer interceptor
//! - `exprs`: list of `expr` expanders

#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;

use hextant_core::{
    default_context, CompileResult, CompletionItem, CompletionKind, CompoundKind,
    ConfiguredExpander, Context, EditorClass, EditorId, EditorRegistry, EditorTree, EditorView,
    ExpanderConfig, ListKind, Settings, TokenType, TreeUndo,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Int(i64),
    Sum(Box<Expr>, Box<Expr>),
    List(Vec<Expr>),
    Hole,
}

/// Completion candidate for a named constant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Constant {
    pub name: String,
    pub value: i64,
}

impl CompletionKind for Constant {
    const CLASS: &'static str = "constant";
}

pub struct IntLiteral;

impl TokenType<Expr> for IntLiteral {
    fn name(&self) -> &str {
        "int"
    }

    fn compile(&self, text: &str) -> CompileResult<Expr> {
        match text.parse::<i64>() {
            Ok(value) => CompileResult::ok(Expr::Int(value)),
            Err(_) => CompileResult::err(format!("'{}' is not an integer", text)),
        }
    }

    fn compile_item(&self, item: &CompletionItem) -> CompileResult<Expr> {
        match item.decode::<Constant>() {
            Ok(constant) => CompileResult::ok(Expr::Int(constant.value)),
            Err(error) => CompileResult::err(error.to_string()),
        }
    }
}

pub struct Sum;

impl CompoundKind<Expr> for Sum {
    fn name(&self) -> &str {
        "sum"
    }

    fn components(&self) -> Vec<EditorClass<Expr>> {
        vec![EditorClass::Expander(expr()), EditorClass::Expander(expr())]
    }

    fn compose(&self, values: &[Expr]) -> CompileResult<Expr> {
        match values {
            [lhs, rhs] => CompileResult::ok(Expr::Sum(Box::new(lhs.clone()), Box::new(rhs.clone()))),
            _ => CompileResult::err("a sum has two operands"),
        }
    }
}

pub struct ExprList;

impl ListKind<Expr> for ExprList {
    fn name(&self) -> &str {
        "exprs"
    }

    fn element(&self) -> EditorClass<Expr> {
        EditorClass::Expander(expr())
    }

    fn compose(&self, values: Vec<Expr>) -> CompileResult<Expr> {
        CompileResult::ok(Expr::List(values))
    }
}

pub fn int() -> Rc<IntLiteral> {
    Rc::new(IntLiteral)
}

pub fn new_int(tree: &mut EditorTree<Expr>, context: &Context, text: &str) -> EditorId {
    tree.new_token_with_text(int(), context, text)
}

pub fn expr_config() -> ExpanderConfig<Expr> {
    let mut config: ExpanderConfig<Expr> = ExpanderConfig::new();
    config.register_key("42", |tree, context| new_int(tree, context, "42"));
    config.register_key("+", |tree, context| tree.new_compound(Rc::new(Sum), context));
    config.register_token_interceptor(int(), |tree, value, context| {
        let text = match value {
            Expr::Int(value) => value.to_string(),
            _ => String::new(),
        };
        new_int(tree, context, &text)
    });
    config.register_item_interceptor(|tree, constant: Constant, context| {
        Some(new_int(tree, context, &constant.value.to_string()))
    });
    config
}

/// Unexpanded integers already compile; anything else is a hole
pub fn expr() -> Rc<ConfiguredExpander<Expr>> {
    Rc::new(
        ConfiguredExpander::new("expr", expr_config())
            .with_default_result(CompileResult::ok(Expr::Hole))
            .with_compiler(|text| IntLiteral.compile(text)),
    )
}

pub fn registry() -> EditorRegistry<Expr> {
    EditorRegistry::new()
        .with(EditorClass::Token(int()))
        .with(EditorClass::Expander(expr()))
        .with(EditorClass::Compound(Rc::new(Sum)))
        .with(EditorClass::List(Rc::new(ExprList)))
}

pub fn setup() -> (EditorTree<Expr>, Context, Rc<TreeUndo<Expr>>) {
    setup_with(Settings::default())
}

pub fn setup_with(settings: Settings) -> (EditorTree<Expr>, Context, Rc<TreeUndo<Expr>>) {
    let context = default_context(settings, registry());
    let undo = context.require::<TreeUndo<Expr>>().unwrap();
    (EditorTree::new(), context, undo)
}

pub fn int_expr(value: i64) -> CompileResult<Expr> {
    CompileResult::ok(Expr::Int(value))
}

pub fn sum_expr(lhs: Expr, rhs: Expr) -> CompileResult<Expr> {
    CompileResult::ok(Expr::Sum(Box::new(lhs), Box::new(rhs)))
}

/// View recording every notification as a line of text
#[derive(Default)]
pub struct Recorder {
    pub events: RefCell<Vec<String>>,
}

impl Recorder {
    pub fn attach(tree: &mut EditorTree<Expr>, id: EditorId) -> (Rc<Recorder>, Rc<dyn EditorView<Expr>>) {
        let recorder = Rc::new(Recorder::default());
        let view: Rc<dyn EditorView<Expr>> = recorder.clone();
        tree.attach_view(id, &view).unwrap();
        recorder.events.borrow_mut().clear();
        (recorder, view)
    }

    pub fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.events.borrow_mut())
    }
}

impl EditorView<Expr> for Recorder {
    fn display_text(&self, text: &str) {
        self.events.borrow_mut().push(format!("text {}", text));
    }

    fn expanded(&self, _content: EditorId) {
        self.events.borrow_mut().push("expanded".into());
    }

    fn reset(&self) {
        self.events.borrow_mut().push("reset".into());
    }

    fn result_changed(&self, result: &CompileResult<Expr>) {
        self.events.borrow_mut().push(format!("result {:?}", result));
    }

    fn item_added(&self, index: usize, _item: EditorId) {
        self.events.borrow_mut().push(format!("added {}", index));
    }

    fn item_removed(&self, index: usize) {
        self.events.borrow_mut().push(format!("removed {}", index));
    }
}
