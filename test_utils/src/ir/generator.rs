//! Module for generating random expression trees for property-based testing.
//!
//! This module defines the `GenExpr` enum which mirrors the optimizer's expression
//! variants. Generated trees are emitted in the optimizer's JSON input format
//! (`{"kind": ..., "source_ref": {...}, ...}`) so tests exercise the same
//! deserialization path as the command-line tool.
//!
//! Generation functions use a depth parameter to limit recursion. Attribute names
//! are drawn from a fixed vocabulary that mixes data attributes, methods and names
//! no constant type has, so folding rules actually fire.

use quickcheck::{Arbitrary, Gen};
use serde_json::{Value, json};

/// File name stamped into every generated source reference.
pub const GENERATED_FILE: &str = "generated.py";

/// Represents a compile-time constant value.
#[derive(Clone, Debug)]
pub enum GenConstant {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Tuple(Vec<GenConstant>),
    EmptyDict,
    Ellipsis,
}

/// Represents an expression node together with the line it was written on.
#[derive(Clone, Debug)]
pub enum GenExpr {
    AttributeLookup { line: u32, source: Box<GenExpr>, attribute_name: String },
    SpecialAttributeLookup { line: u32, source: Box<GenExpr>, attribute_name: String },
    BuiltinGetattr { line: u32, source: Box<GenExpr>, attribute: Box<GenExpr>, default: Option<Box<GenExpr>> },
    BuiltinSetattr { line: u32, source: Box<GenExpr>, attribute: Box<GenExpr>, value: Box<GenExpr> },
    BuiltinHasattr { line: u32, source: Box<GenExpr>, attribute: Box<GenExpr> },
    ConstantRef { line: u32, value: GenConstant },
    VariableRef { line: u32, variable_name: String },
    RaiseException { line: u32, exception: String, message: String },
    SideEffects { line: u32, side_effects: Vec<GenExpr>, expression: Box<GenExpr> },
    MakeTuple { line: u32, elements: Vec<GenExpr> },
    Call { line: u32, called: Box<GenExpr>, args: Box<GenExpr>, kw: Box<GenExpr> },
}

/// A constant paired with an attribute name, for `hasattr`/lookup folding properties.
#[derive(Clone, Debug)]
pub struct ConstantAttribute {
    pub value: GenConstant,
    pub attribute_name: String,
}

const MAX_DEPTH: usize = 5;

const ATTRIBUTE_NAMES: &[&str] = &[
    "real", "imag", "numerator", "denominator", "bit_length", "upper", "count", "index", "keys",
    "missing", "foo", "value",
];

const SPECIAL_ATTRIBUTE_NAMES: &[&str] = &["__class__", "__doc__", "__len__", "__missing__"];

const EXCEPTIONS: &[&str] = &["ValueError", "KeyError", "TypeError", "RuntimeError"];

/// Generates a random number in the range [min, max] inclusive.
fn gen_range(g: &mut Gen, min: u32, max: u32) -> u32 {
    min + (u32::arbitrary(g) % (max - min + 1))
}

fn gen_line(g: &mut Gen) -> u32 {
    gen_range(g, 1, 200)
}

/// Generates a random local variable name.
fn gen_var_name(g: &mut Gen) -> String {
    let starters: Vec<char> = "abcdefghijklmnopqrstuvwxyz_".chars().collect();
    let continuers: Vec<char> = "abcdefghijklmnopqrstuvwxyz0123456789_".chars().collect();
    let len = gen_range(g, 1, 6);
    let mut name = String::new();
    name.push(*g.choose(&starters).unwrap());
    for _ in 1..len {
        name.push(*g.choose(&continuers).unwrap());
    }
    name
}

fn gen_attribute_name(g: &mut Gen) -> String {
    g.choose(ATTRIBUTE_NAMES).unwrap().to_string()
}

/// Generates a random constant; tuples only nest scalars.
fn gen_constant(g: &mut Gen, allow_tuple: bool) -> GenConstant {
    const CHOICES: &[&str] = &["none", "bool", "int", "float", "str", "tuple", "ellipsis"];
    let choice = *g.choose(CHOICES).unwrap();
    match choice {
        "none" => GenConstant::None,
        "bool" => GenConstant::Bool(bool::arbitrary(g)),
        "int" => GenConstant::Int(i64::from(i16::arbitrary(g))),
        // Quarter steps keep values exact and finite so JSON round-trips compare equal.
        "float" => GenConstant::Float(f64::from(i16::arbitrary(g)) / 4.0),
        "str" => GenConstant::Str(gen_attribute_name(g)),
        "tuple" if allow_tuple => {
            GenConstant::Tuple((0..gen_range(g, 0, 3)).map(|_| gen_constant(g, false)).collect())
        }
        "tuple" | "ellipsis" => GenConstant::Ellipsis,
        _ => unreachable!(),
    }
}

/// Generates a leaf expression: constant, variable or raise.
fn gen_leaf(g: &mut Gen) -> GenExpr {
    const CHOICES: &[&str] = &["constant", "constant", "name", "variable", "raise"];
    let line = gen_line(g);
    match *g.choose(CHOICES).unwrap() {
        "constant" => GenExpr::ConstantRef { line, value: gen_constant(g, true) },
        "name" => GenExpr::ConstantRef { line, value: GenConstant::Str(gen_attribute_name(g)) },
        "variable" => GenExpr::VariableRef { line, variable_name: gen_var_name(g) },
        "raise" => GenExpr::RaiseException {
            line,
            exception: g.choose(EXCEPTIONS).unwrap().to_string(),
            message: gen_var_name(g),
        },
        _ => unreachable!(),
    }
}

/// Generates a call with positional and keyword arguments.
fn gen_call(g: &mut Gen, depth: usize) -> GenExpr {
    let line = gen_line(g);
    GenExpr::Call {
        line,
        called: Box::new(gen_expr(g, depth - 1)),
        args: Box::new(GenExpr::MakeTuple {
            line,
            elements: (0..gen_range(g, 0, 2)).map(|_| gen_expr(g, depth - 1)).collect(),
        }),
        kw: Box::new(GenExpr::ConstantRef { line, value: GenConstant::EmptyDict }),
    }
}

/// Generates a random expression with limited depth.
pub fn gen_expr(g: &mut Gen, depth: usize) -> GenExpr {
    let depth = depth.min(MAX_DEPTH);
    if depth == 0 {
        return gen_leaf(g);
    }
    const CHOICES: &[&str] = &[
        "leaf", "lookup", "special", "getattr", "setattr", "hasattr", "side_effects", "tuple", "call",
    ];
    let line = gen_line(g);
    match *g.choose(CHOICES).unwrap() {
        "leaf" => gen_leaf(g),
        "lookup" => GenExpr::AttributeLookup {
            line,
            source: Box::new(gen_expr(g, depth - 1)),
            attribute_name: gen_attribute_name(g),
        },
        "special" => GenExpr::SpecialAttributeLookup {
            line,
            source: Box::new(gen_expr(g, depth - 1)),
            attribute_name: g.choose(SPECIAL_ATTRIBUTE_NAMES).unwrap().to_string(),
        },
        "getattr" => GenExpr::BuiltinGetattr {
            line,
            source: Box::new(gen_expr(g, depth - 1)),
            attribute: Box::new(gen_expr(g, depth - 1)),
            default: if bool::arbitrary(g) { Some(Box::new(gen_expr(g, depth - 1))) } else { None },
        },
        "setattr" => GenExpr::BuiltinSetattr {
            line,
            source: Box::new(gen_expr(g, depth - 1)),
            attribute: Box::new(gen_expr(g, depth - 1)),
            value: Box::new(gen_expr(g, depth - 1)),
        },
        "hasattr" => GenExpr::BuiltinHasattr {
            line,
            source: Box::new(gen_expr(g, depth - 1)),
            attribute: Box::new(gen_expr(g, depth - 1)),
        },
        "side_effects" => GenExpr::SideEffects {
            line,
            side_effects: (0..gen_range(g, 1, 3)).map(|_| gen_expr(g, depth - 1)).collect(),
            expression: Box::new(gen_expr(g, depth - 1)),
        },
        "tuple" => GenExpr::MakeTuple {
            line,
            elements: (0..gen_range(g, 0, 3)).map(|_| gen_expr(g, depth - 1)).collect(),
        },
        "call" => gen_call(g, depth),
        _ => unreachable!(),
    }
}

impl Arbitrary for GenConstant {
    fn arbitrary(g: &mut Gen) -> Self {
        gen_constant(g, true)
    }
}

impl Arbitrary for GenExpr {
    fn arbitrary(g: &mut Gen) -> Self {
        gen_expr(g, g.size().min(MAX_DEPTH))
    }
}

impl Arbitrary for ConstantAttribute {
    fn arbitrary(g: &mut Gen) -> Self {
        let attribute_name = if bool::arbitrary(g) {
            gen_attribute_name(g)
        } else {
            g.choose(SPECIAL_ATTRIBUTE_NAMES).unwrap().to_string()
        };
        ConstantAttribute { value: gen_constant(g, true), attribute_name }
    }
}

fn source_ref(line: u32) -> Value {
    json!({ "file": GENERATED_FILE, "line": line })
}

impl GenConstant {
    /// Serialized form of the constant, matching the optimizer's `Constant`.
    pub fn to_json(&self) -> Value {
        match self {
            GenConstant::None => json!("None"),
            GenConstant::Bool(b) => json!({ "Bool": b }),
            GenConstant::Int(i) => json!({ "Int": i }),
            GenConstant::Float(x) => json!({ "Float": x }),
            GenConstant::Str(s) => json!({ "Str": s }),
            GenConstant::Tuple(items) => json!({ "Tuple": items.iter().map(|c| c.to_json()).collect::<Vec<_>>() }),
            GenConstant::EmptyDict => json!({ "Dict": [] }),
            GenConstant::Ellipsis => json!("Ellipsis"),
        }
    }
}

impl GenExpr {
    /// Serialized form of the tree, accepted by `serde_json::from_value::<Expression>`.
    pub fn to_json(&self) -> Value {
        match self {
            GenExpr::AttributeLookup { line, source, attribute_name } => json!({
                "kind": "AttributeLookup",
                "source_ref": source_ref(*line),
                "source": source.to_json(),
                "attribute_name": attribute_name,
            }),
            GenExpr::SpecialAttributeLookup { line, source, attribute_name } => json!({
                "kind": "SpecialAttributeLookup",
                "source_ref": source_ref(*line),
                "source": source.to_json(),
                "attribute_name": attribute_name,
            }),
            GenExpr::BuiltinGetattr { line, source, attribute, default } => json!({
                "kind": "BuiltinGetattr",
                "source_ref": source_ref(*line),
                "source": source.to_json(),
                "attribute": attribute.to_json(),
                "default": default.as_ref().map(|d| d.to_json()),
            }),
            GenExpr::BuiltinSetattr { line, source, attribute, value } => json!({
                "kind": "BuiltinSetattr",
                "source_ref": source_ref(*line),
                "source": source.to_json(),
                "attribute": attribute.to_json(),
                "value": value.to_json(),
            }),
            GenExpr::BuiltinHasattr { line, source, attribute } => json!({
                "kind": "BuiltinHasattr",
                "source_ref": source_ref(*line),
                "source": source.to_json(),
                "attribute": attribute.to_json(),
            }),
            GenExpr::ConstantRef { line, value } => json!({
                "kind": "ConstantRef",
                "source_ref": source_ref(*line),
                "value": value.to_json(),
            }),
            GenExpr::VariableRef { line, variable_name } => json!({
                "kind": "VariableRef",
                "source_ref": source_ref(*line),
                "variable_name": variable_name,
            }),
            GenExpr::RaiseException { line, exception, message } => json!({
                "kind": "RaiseException",
                "source_ref": source_ref(*line),
                "exception": { "kind": exception, "message": message },
            }),
            GenExpr::SideEffects { line, side_effects, expression } => json!({
                "kind": "SideEffects",
                "source_ref": source_ref(*line),
                "side_effects": side_effects.iter().map(|e| e.to_json()).collect::<Vec<_>>(),
                "expression": expression.to_json(),
            }),
            GenExpr::MakeTuple { line, elements } => json!({
                "kind": "MakeTuple",
                "source_ref": source_ref(*line),
                "elements": elements.iter().map(|e| e.to_json()).collect::<Vec<_>>(),
            }),
            GenExpr::Call { line, called, args, kw } => json!({
                "kind": "Call",
                "source_ref": source_ref(*line),
                "called": called.to_json(),
                "args": args.to_json(),
                "kw": kw.to_json(),
            }),
        }
    }
}
