//! Dynamic tagged value with explicit coercions.
//!
//! Arrays are implemented *as* contexts ([`crate::context::Context`]) rather
//! than as a separate container type, so arbitrary maps/records fall out of
//! the same machinery that gives states their trace-variable scoping.

use crate::context::ContextRef;
use crate::errors::EngineError;
use std::fmt;

/// The seven dynamic type tags.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TypeId {
    Null,
    Array,
    Integer,
    Real,
    Boolean,
    String,
    /// Resolved only at runtime by inspecting the contained tag; never the
    /// tag of an actual `Variable` value itself.
    Dynamic,
}

impl TypeId {
    /// Static priority used by [`priority_cast`]:
    /// `Null < Array < Integer < Real < Boolean < String < Dynamic`.
    /// Reproduced exactly from the original `priority_cast.hpp` table.
    pub fn priority(self) -> u8 {
        match self {
            TypeId::Null => 0,
            TypeId::Array => 1,
            TypeId::Integer => 2,
            TypeId::Real => 3,
            TypeId::Boolean => 4,
            TypeId::String => 5,
            TypeId::Dynamic => 6,
        }
    }
}

#[derive(Clone, Debug)]
pub enum Variable {
    Null,
    Boolean(bool),
    Integer(i64),
    Real(f64),
    String(String),
    Array(ContextRef),
}

impl Default for Variable {
    fn default() -> Self {
        Variable::Null
    }
}

impl Variable {
    pub fn type_id(&self) -> TypeId {
        match self {
            Variable::Null => TypeId::Null,
            Variable::Boolean(_) => TypeId::Boolean,
            Variable::Integer(_) => TypeId::Integer,
            Variable::Real(_) => TypeId::Real,
            Variable::String(_) => TypeId::String,
            Variable::Array(_) => TypeId::Array,
        }
    }

    /// Alias for `type_id`, matching the original's `tag()` accessor name.
    pub fn tag(&self) -> TypeId {
        self.type_id()
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Variable::Null)
    }
    pub fn is_boolean(&self) -> bool {
        matches!(self, Variable::Boolean(_))
    }
    pub fn is_integer(&self) -> bool {
        matches!(self, Variable::Integer(_))
    }
    pub fn is_real(&self) -> bool {
        matches!(self, Variable::Real(_))
    }
    pub fn is_string(&self) -> bool {
        matches!(self, Variable::String(_))
    }
    pub fn is_array(&self) -> bool {
        matches!(self, Variable::Array(_))
    }

    pub fn swap(&mut self, other: &mut Variable) {
        std::mem::swap(self, other);
    }

    pub fn as_null(&self) -> Variable {
        Variable::Null
    }

    pub fn as_boolean(&self) -> Result<bool, EngineError> {
        match self {
            Variable::Null => Ok(false),
            Variable::Boolean(b) => Ok(*b),
            Variable::Integer(n) => Ok(*n != 0),
            Variable::Real(x) => Ok(*x != 0.0),
            Variable::String(s) => {
                let lower = s.to_lowercase();
                match lower.as_str() {
                    "" | "0" | "no" | "false" | "f" | "n" => Ok(false),
                    "1" | "yes" | "true" | "t" | "y" => Ok(true),
                    _ => Err(EngineError::BadCast { from: "string", to: "bool" }),
                }
            }
            Variable::Array(_) => Err(EngineError::BadCast { from: "array", to: "bool" }),
        }
    }

    pub fn as_integer(&self) -> Result<i64, EngineError> {
        match self {
            Variable::Null => Ok(0),
            Variable::Boolean(b) => Ok(if *b { 1 } else { 0 }),
            Variable::Integer(n) => Ok(*n),
            Variable::Real(x) => Ok(*x as i64),
            Variable::String(s) => {
                s.trim().parse::<i64>().map_err(|_| EngineError::BadCast { from: "string", to: "int" })
            }
            Variable::Array(_) => Err(EngineError::BadCast { from: "array", to: "int" }),
        }
    }

    pub fn as_real(&self) -> Result<f64, EngineError> {
        match self {
            Variable::Null => Ok(0.0),
            Variable::Boolean(b) => Ok(if *b { 1.0 } else { 0.0 }),
            Variable::Integer(n) => Ok(*n as f64),
            Variable::Real(x) => Ok(*x),
            Variable::String(s) => {
                s.trim().parse::<f64>().map_err(|_| EngineError::BadCast { from: "string", to: "real" })
            }
            Variable::Array(_) => Err(EngineError::BadCast { from: "array", to: "real" }),
        }
    }

    pub fn as_string(&self) -> Result<String, EngineError> {
        Ok(match self {
            Variable::Null => String::new(),
            Variable::Boolean(b) => if *b { "true" } else { "false" }.to_string(),
            Variable::Integer(n) => n.to_string(),
            Variable::Real(x) => format_scientific_6(*x),
            Variable::String(s) => s.clone(),
            Variable::Array(ctx) => ctx.borrow().list_format(),
        })
    }

    /// Coerce to an array: `Null` becomes empty, an array passes through,
    /// any scalar becomes a new array with key `""` mapped to the scalar.
    pub fn as_array(&self) -> ContextRef {
        match self {
            Variable::Array(ctx) => ctx.clone(),
            Variable::Null => crate::context::Context::new_root(),
            scalar => {
                let ctx = crate::context::Context::new_root();
                ctx.borrow_mut().set_raw(String::new(), scalar.clone());
                ctx
            }
        }
    }

    pub fn as_of(&self, target: TypeId) -> Result<Variable, EngineError> {
        Ok(match target {
            TypeId::Null => Variable::Null,
            TypeId::Boolean => Variable::Boolean(self.as_boolean()?),
            TypeId::Integer => Variable::Integer(self.as_integer()?),
            TypeId::Real => Variable::Real(self.as_real()?),
            TypeId::String => Variable::String(self.as_string()?),
            TypeId::Array => Variable::Array(self.as_array()),
            TypeId::Dynamic => self.clone(),
        })
    }
}

fn format_scientific_6(x: f64) -> String {
    format!("{x:.6e}")
}

impl Variable {
    /// `%`: integer or real operands only, `DivisionByZero` if the divisor
    /// is zero. Operand types are resolved first via [`priority_cast`].
    pub fn checked_rem(&self, other: &Variable) -> Result<Variable, EngineError> {
        let (a, b) = priority_cast(self, other)?;
        match (a, b) {
            (Variable::Integer(x), Variable::Integer(y)) => {
                if y == 0 {
                    return Err(EngineError::DivisionByZero);
                }
                Ok(Variable::Integer(x % y))
            }
            (Variable::Real(x), Variable::Real(y)) => {
                if y == 0.0 {
                    return Err(EngineError::DivisionByZero);
                }
                Ok(Variable::Real(x % y))
            }
            (a, _) => Err(EngineError::BadCast { from: "variable", to: type_name(a.type_id()) }),
        }
    }

    /// `/`: integer or real operands only, `DivisionByZero` if the divisor
    /// is zero.
    pub fn checked_div(&self, other: &Variable) -> Result<Variable, EngineError> {
        let (a, b) = priority_cast(self, other)?;
        match (a, b) {
            (Variable::Integer(x), Variable::Integer(y)) => {
                if y == 0 {
                    return Err(EngineError::DivisionByZero);
                }
                Ok(Variable::Integer(x / y))
            }
            (Variable::Real(x), Variable::Real(y)) => {
                if y == 0.0 {
                    return Err(EngineError::DivisionByZero);
                }
                Ok(Variable::Real(x / y))
            }
            (a, _) => Err(EngineError::BadCast { from: "variable", to: type_name(a.type_id()) }),
        }
    }

    /// Relational comparison after [`priority_cast`] type resolution.
    /// `Null` and `Array` operands are never comparable.
    pub fn compare(&self, other: &Variable) -> Result<std::cmp::Ordering, EngineError> {
        let (a, b) = priority_cast(self, other)?;
        match (a, b) {
            (Variable::Integer(x), Variable::Integer(y)) => Ok(x.cmp(&y)),
            (Variable::Real(x), Variable::Real(y)) => {
                x.partial_cmp(&y).ok_or(EngineError::IncomparableOperands)
            }
            (Variable::String(x), Variable::String(y)) => Ok(x.cmp(&y)),
            (Variable::Boolean(x), Variable::Boolean(y)) => Ok(x.cmp(&y)),
            _ => Err(EngineError::IncomparableOperands),
        }
    }
}

fn type_name(t: TypeId) -> &'static str {
    match t {
        TypeId::Null => "null",
        TypeId::Array => "array",
        TypeId::Integer => "int",
        TypeId::Real => "real",
        TypeId::Boolean => "bool",
        TypeId::String => "string",
        TypeId::Dynamic => "dynamic",
    }
}

/// Resolve the two higher/lower-priority operands of a binary operator,
/// coercing the lower-priority one up to the higher-priority type. Mirrors
/// `priority_cast`/`probe` from the original `anta/dsel/util/
/// priority_cast.hpp`: each `Variable` already carries its own runtime tag,
/// so "probing" a `Dynamic` operand is simply reading that tag.
pub fn priority_cast(left: &Variable, right: &Variable) -> Result<(Variable, Variable), EngineError> {
    let lp = left.type_id().priority();
    let rp = right.type_id().priority();
    if lp >= rp {
        Ok((left.clone(), right.as_of(left.type_id())?))
    } else {
        Ok((left.as_of(right.type_id())?, right.clone()))
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.as_string() {
            Ok(s) => write!(f, "{s}"),
            Err(_) => write!(f, "<unprintable>"),
        }
    }
}
