//! Runtime exception classes known to the optimizer.
//!
//! Only the classes that attribute access, calls and constant evaluation can
//! produce are modelled. The hierarchy is a single-inheritance chain rooted at
//! `BaseException`, so subclass checks walk parents.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExceptionKind {
    BaseException,
    Exception,
    AttributeError,
    TypeError,
    NameError,
    LookupError,
    KeyError,
    IndexError,
    ArithmeticError,
    ZeroDivisionError,
    ValueError,
    RuntimeError,
}

impl ExceptionKind {
    /// Direct base class, `None` for the root.
    pub fn parent(self) -> Option<ExceptionKind> {
        use ExceptionKind::*;
        match self {
            BaseException => None,
            Exception => Some(BaseException),
            AttributeError | TypeError | NameError | LookupError | ArithmeticError | ValueError
            | RuntimeError => Some(Exception),
            KeyError | IndexError => Some(LookupError),
            ZeroDivisionError => Some(ArithmeticError),
        }
    }

    /// Returns true if `self` is `base` or derives from it.
    pub fn is_subclass_of(self, base: ExceptionKind) -> bool {
        let mut current = Some(self);
        while let Some(kind) = current {
            if kind == base {
                return true;
            }
            current = kind.parent();
        }
        false
    }

    pub fn name(self) -> &'static str {
        use ExceptionKind::*;
        match self {
            BaseException => "BaseException",
            Exception => "Exception",
            AttributeError => "AttributeError",
            TypeError => "TypeError",
            NameError => "NameError",
            LookupError => "LookupError",
            KeyError => "KeyError",
            IndexError => "IndexError",
            ArithmeticError => "ArithmeticError",
            ZeroDivisionError => "ZeroDivisionError",
            ValueError => "ValueError",
            RuntimeError => "RuntimeError",
        }
    }
}

impl fmt::Display for ExceptionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// An exception the compiled program would raise at runtime.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RuntimeException {
    pub kind: ExceptionKind,
    pub message: String,
}

impl RuntimeException {
    pub fn new(kind: ExceptionKind, message: impl Into<String>) -> Self {
        RuntimeException { kind, message: message.into() }
    }

    pub fn attribute_error(type_name: &str, attribute_name: &str) -> Self {
        RuntimeException::new(
            ExceptionKind::AttributeError,
            format!("'{}' object has no attribute '{}'", type_name, attribute_name),
        )
    }

    pub fn not_callable(type_name: &str) -> Self {
        RuntimeException::new(
            ExceptionKind::TypeError,
            format!("'{}' object is not callable", type_name),
        )
    }
}

impl fmt::Display for RuntimeException {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.message.is_empty() {
            write!(f, "{}", self.kind)
        } else {
            write!(f, "{}: {}", self.kind, self.message)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subclass_chain() {
        assert!(ExceptionKind::ZeroDivisionError.is_subclass_of(ExceptionKind::ArithmeticError));
        assert!(ExceptionKind::ZeroDivisionError.is_subclass_of(ExceptionKind::BaseException));
        assert!(ExceptionKind::KeyError.is_subclass_of(ExceptionKind::LookupError));
        assert!(!ExceptionKind::AttributeError.is_subclass_of(ExceptionKind::LookupError));
        assert!(!ExceptionKind::BaseException.is_subclass_of(ExceptionKind::Exception));
    }

    #[test]
    fn test_exception_display() {
        let exc = RuntimeException::attribute_error("int", "foo");
        assert_eq!(exc.to_string(), "AttributeError: 'int' object has no attribute 'foo'");
        assert_eq!(RuntimeException::new(ExceptionKind::RuntimeError, "").to_string(), "RuntimeError");
    }
}
