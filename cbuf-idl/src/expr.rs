//! Constant-expression folding for default values and array sizes.
//!
//! Integer arithmetic runs in `i128` so every `u64`/`s64` literal and
//! intermediate fits; the result is range-checked against the target type
//! when it is assigned. Mixing an integer with a float promotes the whole
//! expression to `f64`. Integer division truncates toward zero.

use crate::error::SchemaError;

/// A folded numeric constant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Num {
    Int(i128),
    Float(f64),
}

impl Num {
    pub fn as_f64(self) -> f64 {
        match self {
            Self::Int(v) => v as f64,
            Self::Float(v) => v,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
}

/// Unfolded constant expression as parsed from the token stream.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Int(u64),
    Float(f64),
    /// Reference to a previously declared `const`.
    Ident(String),
    Neg(Box<Expr>),
    Bin(BinOp, Box<Expr>, Box<Expr>),
}

/// Fold an expression. `lookup` resolves const identifiers (namespace
/// scoping is the caller's concern); `line`/`column` anchor diagnostics.
pub fn eval(
    expr: &Expr,
    lookup: &dyn Fn(&str) -> Option<Num>,
    line: u32,
    column: u32,
) -> Result<Num, SchemaError> {
    match expr {
        Expr::Int(v) => Ok(Num::Int(*v as i128)),
        Expr::Float(v) => Ok(Num::Float(*v)),
        Expr::Ident(name) => lookup(name).ok_or_else(|| {
            SchemaError::eval(line, column, format!("unknown constant '{name}'"))
        }),
        Expr::Neg(inner) => match eval(inner, lookup, line, column)? {
            Num::Int(v) => v
                .checked_neg()
                .map(Num::Int)
                .ok_or_else(|| SchemaError::eval(line, column, "integer overflow")),
            Num::Float(v) => Ok(Num::Float(-v)),
        },
        Expr::Bin(op, lhs, rhs) => {
            let lhs = eval(lhs, lookup, line, column)?;
            let rhs = eval(rhs, lookup, line, column)?;
            apply(*op, lhs, rhs, line, column)
        }
    }
}

fn apply(op: BinOp, lhs: Num, rhs: Num, line: u32, column: u32) -> Result<Num, SchemaError> {
    if let (Num::Int(a), Num::Int(b)) = (lhs, rhs) {
        let folded = match op {
            BinOp::Add => a.checked_add(b),
            BinOp::Sub => a.checked_sub(b),
            BinOp::Mul => a.checked_mul(b),
            BinOp::Div => {
                if b == 0 {
                    return Err(SchemaError::eval(line, column, "division by zero"));
                }
                a.checked_div(b)
            }
        };
        return folded
            .map(Num::Int)
            .ok_or_else(|| SchemaError::eval(line, column, "integer overflow"));
    }

    let (a, b) = (lhs.as_f64(), rhs.as_f64());
    Ok(Num::Float(match op {
        BinOp::Add => a + b,
        BinOp::Sub => a - b,
        BinOp::Mul => a * b,
        BinOp::Div => a / b,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fold(expr: &Expr) -> Num {
        eval(expr, &|_| None, 1, 1).expect("fold should succeed")
    }

    fn bin(op: BinOp, lhs: Expr, rhs: Expr) -> Expr {
        Expr::Bin(op, Box::new(lhs), Box::new(rhs))
    }

    #[test]
    fn folds_mixed_precedence_tree() {
        // 3*4*(12*23 + 70)/2 as the parser would shape it
        let inner = bin(
            BinOp::Add,
            bin(BinOp::Mul, Expr::Int(12), Expr::Int(23)),
            Expr::Int(70),
        );
        let expr = bin(
            BinOp::Div,
            bin(BinOp::Mul, bin(BinOp::Mul, Expr::Int(3), Expr::Int(4)), inner),
            Expr::Int(2),
        );
        assert_eq!(fold(&expr), Num::Int(2076));
    }

    #[test]
    fn integer_division_truncates_toward_zero() {
        assert_eq!(fold(&bin(BinOp::Div, Expr::Int(7), Expr::Int(2))), Num::Int(3));
        let neg = bin(
            BinOp::Div,
            Expr::Neg(Box::new(Expr::Int(7))),
            Expr::Int(2),
        );
        assert_eq!(fold(&neg), Num::Int(-3));
    }

    #[test]
    fn float_operand_promotes_expression() {
        let expr = bin(
            BinOp::Div,
            bin(BinOp::Mul, Expr::Float(2.0), Expr::Float(3.4)),
            Expr::Float(2.7),
        );
        let Num::Float(v) = fold(&expr) else {
            panic!("expected float result");
        };
        assert!((v - 2.0 * 3.4 / 2.7).abs() < f64::EPSILON);

        let mixed = bin(BinOp::Add, Expr::Int(1), Expr::Float(0.5));
        assert_eq!(fold(&mixed), Num::Float(1.5));
    }

    #[test]
    fn division_by_zero_fails() {
        let expr = bin(BinOp::Div, Expr::Int(1), Expr::Int(0));
        assert!(matches!(
            eval(&expr, &|_| None, 3, 9),
            Err(SchemaError::Eval { line: 3, column: 9, .. })
        ));
    }

    #[test]
    fn resolves_const_references() {
        let env = |name: &str| (name == "WIDTH").then_some(Num::Int(640));
        let expr = bin(BinOp::Mul, Expr::Ident("WIDTH".into()), Expr::Int(2));
        assert_eq!(eval(&expr, &env, 1, 1).expect("fold"), Num::Int(1280));
        assert!(matches!(
            eval(&Expr::Ident("HEIGHT".into()), &env, 1, 1),
            Err(SchemaError::Eval { .. })
        ));
    }
}
