//! Operator table
//!
//! Maps each operator marker symbol to its binding strength and category.
//! Higher precedence binds tighter. The table is a fixed `static` and is
//! never mutated.

/// Arithmetic and bitwise operators (produce a binary-op node).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    BitOr,
    BitXor,
    BitAnd,
    LShift,
    RShift,
    Add,
    Sub,
    Mult,
    Div,
    FloorDiv,
    Mod,
    MatMult,
    Pow,
}

/// Chainable comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    NotEq,
    GtE,
    Gt,
    LtE,
    Lt,
    IsNot,
    Is,
    NotIn,
    In,
}

/// Short-circuit boolean operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoolOp {
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Plus,
    Minus,
    Invert,
}

/// A binary operator together with its category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Bool(BoolOp),
    Compare(CmpOp),
    Binary(BinOp),
}

struct OperatorInfo {
    symbol: &'static str,
    precedence: u8,
    operator: Operator,
}

static BINARY_OPERATORS: &[OperatorInfo] = &[
    OperatorInfo { symbol: "or", precedence: 50, operator: Operator::Bool(BoolOp::Or) },
    OperatorInfo { symbol: "and", precedence: 60, operator: Operator::Bool(BoolOp::And) },
    OperatorInfo { symbol: "==", precedence: 80, operator: Operator::Compare(CmpOp::Eq) },
    OperatorInfo { symbol: "!=", precedence: 80, operator: Operator::Compare(CmpOp::NotEq) },
    OperatorInfo { symbol: ">=", precedence: 80, operator: Operator::Compare(CmpOp::GtE) },
    OperatorInfo { symbol: ">", precedence: 80, operator: Operator::Compare(CmpOp::Gt) },
    OperatorInfo { symbol: "<=", precedence: 80, operator: Operator::Compare(CmpOp::LtE) },
    OperatorInfo { symbol: "<", precedence: 80, operator: Operator::Compare(CmpOp::Lt) },
    OperatorInfo { symbol: "is not", precedence: 80, operator: Operator::Compare(CmpOp::IsNot) },
    OperatorInfo { symbol: "is", precedence: 80, operator: Operator::Compare(CmpOp::Is) },
    OperatorInfo { symbol: "not in", precedence: 80, operator: Operator::Compare(CmpOp::NotIn) },
    OperatorInfo { symbol: "in", precedence: 80, operator: Operator::Compare(CmpOp::In) },
    OperatorInfo { symbol: "|", precedence: 90, operator: Operator::Binary(BinOp::BitOr) },
    OperatorInfo { symbol: "^", precedence: 100, operator: Operator::Binary(BinOp::BitXor) },
    OperatorInfo { symbol: "&", precedence: 110, operator: Operator::Binary(BinOp::BitAnd) },
    OperatorInfo { symbol: "<<", precedence: 120, operator: Operator::Binary(BinOp::LShift) },
    OperatorInfo { symbol: ">>", precedence: 120, operator: Operator::Binary(BinOp::RShift) },
    OperatorInfo { symbol: "+", precedence: 130, operator: Operator::Binary(BinOp::Add) },
    OperatorInfo { symbol: "-", precedence: 130, operator: Operator::Binary(BinOp::Sub) },
    OperatorInfo { symbol: "*", precedence: 140, operator: Operator::Binary(BinOp::Mult) },
    OperatorInfo { symbol: "/", precedence: 140, operator: Operator::Binary(BinOp::Div) },
    OperatorInfo { symbol: "//", precedence: 140, operator: Operator::Binary(BinOp::FloorDiv) },
    OperatorInfo { symbol: "%", precedence: 140, operator: Operator::Binary(BinOp::Mod) },
    OperatorInfo { symbol: "@", precedence: 140, operator: Operator::Binary(BinOp::MatMult) },
    OperatorInfo { symbol: "**", precedence: 160, operator: Operator::Binary(BinOp::Pow) },
];

static UNARY_OPERATORS: &[(&str, u8, UnaryOp)] = &[
    ("not", 70, UnaryOp::Not),
    ("+", 150, UnaryOp::Plus),
    ("-", 150, UnaryOp::Minus),
    ("~", 150, UnaryOp::Invert),
];

impl Operator {
    /// Look up a binary operator marker.
    pub fn from_symbol(symbol: &str) -> Option<Operator> {
        BINARY_OPERATORS
            .iter()
            .find(|info| info.symbol == symbol)
            .map(|info| info.operator)
    }

    pub fn precedence(self) -> u8 {
        BINARY_OPERATORS
            .iter()
            .find(|info| info.operator == self)
            .map_or(0, |info| info.precedence)
    }

    /// `**` groups right to left; everything else groups left to right.
    pub fn is_right_associative(self) -> bool {
        matches!(self, Operator::Binary(BinOp::Pow))
    }

    pub fn symbol(self) -> &'static str {
        BINARY_OPERATORS
            .iter()
            .find(|info| info.operator == self)
            .map_or("?", |info| info.symbol)
    }
}

impl UnaryOp {
    /// Look up an operator marker usable in prefix position.
    pub fn from_symbol(symbol: &str) -> Option<UnaryOp> {
        UNARY_OPERATORS
            .iter()
            .find(|(s, _, _)| *s == symbol)
            .map(|(_, _, op)| *op)
    }

    pub fn precedence(self) -> u8 {
        UNARY_OPERATORS
            .iter()
            .find(|(_, _, op)| *op == self)
            .map_or(0, |(_, prec, _)| *prec)
    }

    pub fn symbol(self) -> &'static str {
        match self {
            UnaryOp::Not => "not",
            UnaryOp::Plus => "+",
            UnaryOp::Minus => "-",
            UnaryOp::Invert => "~",
        }
    }
}

impl BinOp {
    pub fn symbol(self) -> &'static str {
        Operator::Binary(self).symbol()
    }
}

impl CmpOp {
    pub fn symbol(self) -> &'static str {
        Operator::Compare(self).symbol()
    }
}

/// True when `symbol` is any operator marker the table knows.
pub fn is_operator_symbol(symbol: &str) -> bool {
    Operator::from_symbol(symbol).is_some() || UnaryOp::from_symbol(symbol).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_precedence_is_ordered() {
        let or = Operator::from_symbol("or").unwrap();
        let and = Operator::from_symbol("and").unwrap();
        let eq = Operator::from_symbol("==").unwrap();
        let add = Operator::from_symbol("+").unwrap();
        let mul = Operator::from_symbol("*").unwrap();
        let pow = Operator::from_symbol("**").unwrap();
        assert!(or.precedence() < and.precedence());
        assert!(and.precedence() < UnaryOp::Not.precedence());
        assert!(UnaryOp::Not.precedence() < eq.precedence());
        assert!(eq.precedence() < add.precedence());
        assert!(add.precedence() < mul.precedence());
        assert!(mul.precedence() < UnaryOp::Minus.precedence());
        assert!(UnaryOp::Minus.precedence() < pow.precedence());
    }

    #[test]
    fn test_two_word_operators() {
        assert_eq!(Operator::from_symbol("not in"), Some(Operator::Compare(CmpOp::NotIn)));
        assert_eq!(Operator::from_symbol("is not"), Some(Operator::Compare(CmpOp::IsNot)));
        assert_eq!(Operator::from_symbol("not"), None);
        assert_eq!(UnaryOp::from_symbol("not"), Some(UnaryOp::Not));
    }

    #[test]
    fn test_symbols_round_trip() {
        for info in BINARY_OPERATORS {
            assert_eq!(info.operator.symbol(), info.symbol);
        }
        assert!(is_operator_symbol("-"));
        assert!(!is_operator_symbol("=>"));
    }
}
