//! Compile-time constant values and the attribute model used to fold
//! attribute access on them.
//!
//! Every value answers two questions without running user code: which
//! attributes its type exposes (`has_attribute`), and, for the handful of
//! data attributes whose value is itself a constant, what that value is
//! (`lookup_attribute`). Methods exist but are not representable as constants.

use std::collections::HashSet;
use std::fmt;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use super::exception::RuntimeException;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Constant {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Bytes(Vec<u8>),
    Tuple(Vec<Constant>),
    Dict(Vec<(Constant, Constant)>),
    Ellipsis,
}

const OBJECT_ATTRIBUTES: &[&str] = &[
    "__class__", "__delattr__", "__dir__", "__doc__", "__eq__", "__format__", "__ge__",
    "__getattribute__", "__gt__", "__hash__", "__init__", "__init_subclass__", "__le__",
    "__lt__", "__ne__", "__new__", "__reduce__", "__reduce_ex__", "__repr__", "__setattr__",
    "__sizeof__", "__str__", "__subclasshook__",
];

const INT_ATTRIBUTES: &[&str] = &[
    "__abs__", "__add__", "__and__", "__bool__", "__ceil__", "__divmod__", "__float__",
    "__floor__", "__floordiv__", "__getnewargs__", "__index__", "__int__", "__invert__",
    "__lshift__", "__mod__", "__mul__", "__neg__", "__or__", "__pos__", "__pow__", "__radd__",
    "__rand__", "__rdivmod__", "__rfloordiv__", "__rlshift__", "__rmod__", "__rmul__",
    "__ror__", "__round__", "__rpow__", "__rrshift__", "__rshift__", "__rsub__",
    "__rtruediv__", "__rxor__", "__sub__", "__truediv__", "__trunc__", "__xor__",
    "as_integer_ratio", "bit_count", "bit_length", "conjugate", "denominator", "from_bytes",
    "imag", "numerator", "real", "to_bytes",
];

const FLOAT_ATTRIBUTES: &[&str] = &[
    "__abs__", "__add__", "__bool__", "__ceil__", "__divmod__", "__float__", "__floor__",
    "__floordiv__", "__getformat__", "__getnewargs__", "__int__", "__mod__", "__mul__",
    "__neg__", "__pos__", "__pow__", "__radd__", "__rdivmod__", "__rfloordiv__", "__rmod__",
    "__rmul__", "__round__", "__rpow__", "__rsub__", "__rtruediv__", "__sub__",
    "__truediv__", "__trunc__", "as_integer_ratio", "conjugate", "fromhex", "hex", "imag",
    "is_integer", "real",
];

const SEQUENCE_ATTRIBUTES: &[&str] = &[
    "__add__", "__contains__", "__getitem__", "__getnewargs__", "__iter__", "__len__",
    "__mul__", "__rmul__", "count", "index",
];

const STR_ATTRIBUTES: &[&str] = &[
    "__mod__", "__rmod__", "capitalize", "casefold", "center", "encode", "endswith",
    "expandtabs", "find", "format", "format_map", "isalnum", "isalpha", "isascii",
    "isdecimal", "isdigit", "isidentifier", "islower", "isnumeric", "isprintable", "isspace",
    "istitle", "isupper", "join", "ljust", "lower", "lstrip", "maketrans", "partition",
    "removeprefix", "removesuffix", "replace", "rfind", "rindex", "rjust", "rpartition",
    "rsplit", "rstrip", "split", "splitlines", "startswith", "strip", "swapcase", "title",
    "translate", "upper", "zfill",
];

const BYTES_ATTRIBUTES: &[&str] = &[
    "__bytes__", "__mod__", "__rmod__", "capitalize", "center", "decode", "endswith",
    "expandtabs", "find", "fromhex", "hex", "isalnum", "isalpha", "isascii", "isdigit",
    "islower", "isspace", "istitle", "isupper", "join", "ljust", "lower", "lstrip",
    "maketrans", "partition", "removeprefix", "removesuffix", "replace", "rfind", "rindex",
    "rjust", "rpartition", "rsplit", "rstrip", "split", "splitlines", "startswith", "strip",
    "swapcase", "title", "translate", "upper", "zfill",
];

const DICT_ATTRIBUTES: &[&str] = &[
    "__contains__", "__delitem__", "__getitem__", "__ior__", "__iter__", "__len__", "__or__",
    "__reversed__", "__ror__", "__setitem__", "clear", "copy", "fromkeys", "get", "items",
    "keys", "pop", "popitem", "setdefault", "update", "values",
];

fn attribute_set(groups: &[&[&'static str]]) -> HashSet<&'static str> {
    groups.iter().flat_map(|group| group.iter().copied()).collect()
}

static NONE_TABLE: Lazy<HashSet<&'static str>> =
    Lazy::new(|| attribute_set(&[OBJECT_ATTRIBUTES, &["__bool__"]]));
static INT_TABLE: Lazy<HashSet<&'static str>> =
    Lazy::new(|| attribute_set(&[OBJECT_ATTRIBUTES, INT_ATTRIBUTES]));
static FLOAT_TABLE: Lazy<HashSet<&'static str>> =
    Lazy::new(|| attribute_set(&[OBJECT_ATTRIBUTES, FLOAT_ATTRIBUTES]));
static STR_TABLE: Lazy<HashSet<&'static str>> =
    Lazy::new(|| attribute_set(&[OBJECT_ATTRIBUTES, SEQUENCE_ATTRIBUTES, STR_ATTRIBUTES]));
static BYTES_TABLE: Lazy<HashSet<&'static str>> =
    Lazy::new(|| attribute_set(&[OBJECT_ATTRIBUTES, SEQUENCE_ATTRIBUTES, BYTES_ATTRIBUTES]));
static TUPLE_TABLE: Lazy<HashSet<&'static str>> =
    Lazy::new(|| attribute_set(&[OBJECT_ATTRIBUTES, SEQUENCE_ATTRIBUTES]));
static DICT_TABLE: Lazy<HashSet<&'static str>> =
    Lazy::new(|| attribute_set(&[OBJECT_ATTRIBUTES, DICT_ATTRIBUTES]));
static ELLIPSIS_TABLE: Lazy<HashSet<&'static str>> =
    Lazy::new(|| attribute_set(&[OBJECT_ATTRIBUTES]));

impl Constant {
    /// Name of the value's runtime type, as it appears in exception messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Constant::None => "NoneType",
            Constant::Bool(_) => "bool",
            Constant::Int(_) => "int",
            Constant::Float(_) => "float",
            Constant::Str(_) => "str",
            Constant::Bytes(_) => "bytes",
            Constant::Tuple(_) => "tuple",
            Constant::Dict(_) => "dict",
            Constant::Ellipsis => "ellipsis",
        }
    }

    fn attribute_table(&self) -> &'static HashSet<&'static str> {
        match self {
            Constant::None => &NONE_TABLE,
            // bool inherits everything from int
            Constant::Bool(_) | Constant::Int(_) => &INT_TABLE,
            Constant::Float(_) => &FLOAT_TABLE,
            Constant::Str(_) => &STR_TABLE,
            Constant::Bytes(_) => &BYTES_TABLE,
            Constant::Tuple(_) => &TUPLE_TABLE,
            Constant::Dict(_) => &DICT_TABLE,
            Constant::Ellipsis => &ELLIPSIS_TABLE,
        }
    }

    pub fn has_attribute(&self, attribute_name: &str) -> bool {
        self.attribute_table().contains(attribute_name)
    }

    /// Evaluates `self.<attribute_name>`.
    ///
    /// Returns `Ok(Some(value))` for data attributes, `Ok(None)` for attributes
    /// that exist but have no constant representation (methods), and the
    /// `AttributeError` the runtime would raise when the attribute is missing.
    pub fn lookup_attribute(&self, attribute_name: &str) -> Result<Option<Constant>, RuntimeException> {
        if !self.has_attribute(attribute_name) {
            return Err(RuntimeException::attribute_error(self.type_name(), attribute_name));
        }

        let value = match (self, attribute_name) {
            (Constant::Int(value), "real" | "numerator") => Some(Constant::Int(*value)),
            (Constant::Bool(value), "real" | "numerator") => Some(Constant::Int(i64::from(*value))),
            (Constant::Int(_) | Constant::Bool(_), "imag") => Some(Constant::Int(0)),
            (Constant::Int(_) | Constant::Bool(_), "denominator") => Some(Constant::Int(1)),
            (Constant::Float(value), "real") => Some(Constant::Float(*value)),
            (Constant::Float(_), "imag") => Some(Constant::Float(0.0)),
            _ => None,
        };
        Ok(value)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Constant::Str(value) => Some(value),
            _ => None,
        }
    }

    pub fn empty_tuple() -> Self {
        Constant::Tuple(Vec::new())
    }

    pub fn empty_dict() -> Self {
        Constant::Dict(Vec::new())
    }
}

impl fmt::Display for Constant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constant::None => write!(f, "None"),
            Constant::Bool(true) => write!(f, "True"),
            Constant::Bool(false) => write!(f, "False"),
            Constant::Int(value) => write!(f, "{}", value),
            Constant::Float(value) => write!(f, "{:?}", value),
            Constant::Str(value) => write!(f, "{:?}", value),
            Constant::Bytes(value) => write!(f, "b{:?}", String::from_utf8_lossy(value)),
            Constant::Tuple(elements) => {
                write!(f, "(")?;
                for (index, element) in elements.iter().enumerate() {
                    if index > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", element)?;
                }
                if elements.len() == 1 {
                    write!(f, ",")?;
                }
                write!(f, ")")
            }
            Constant::Dict(pairs) => {
                write!(f, "{{")?;
                for (index, (key, value)) in pairs.iter().enumerate() {
                    if index > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", key, value)?;
                }
                write!(f, "}}")
            }
            Constant::Ellipsis => write!(f, "Ellipsis"),
        }
    }
}
