use crate::{ast::Comparator, value::Value};

/// Abstract Syntax Tree node representing a parsed expression.
///
/// Each node owns its children; the tree is immutable once the parser has
/// built it. Projection nodes carry a `projection` child: the right-hand
/// side applied to every element of the projected sequence (`Identity`
/// when nothing follows the projection).
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// The value currently being evaluated, implied rather than written.
    ///
    /// Produced for the empty expression and as the default right-hand
    /// side of projections.
    Identity,

    /// Current node (`@`)
    CurrentNode,

    /// Field lookup
    ///
    /// # Examples
    /// ```text
    /// foo
    /// "with space"
    /// ""
    /// ```
    Field(String),

    /// Array index, negative values count from the end
    ///
    /// # Examples
    /// ```text
    /// [0]
    /// [-1]
    /// ```
    Index(i64),

    /// Array slice
    ///
    /// # Examples
    /// ```text
    /// [1:3]
    /// [::-1]
    /// ```
    Slice {
        start: Option<i64>,
        stop: Option<i64>,
        step: Option<i64>,
    },

    /// JSON (`` `...` ``) or raw string (`'...'`) literal
    Literal(Value),

    /// Dot chaining: evaluate `right` against the result of `left`.
    ///
    /// Short-circuits to Null when `left` is Null.
    SubExpression {
        left: Box<Expr>,
        right: Box<Expr>,
    },

    /// Bracket chaining: `left` followed by an index or slice.
    IndexExpression {
        left: Box<Expr>,
        right: Box<Expr>,
    },

    /// Flatten projection (`[]`)
    ///
    /// # Example
    /// ```text
    /// reservations[].instances
    /// ```
    Flatten {
        child: Box<Expr>,
        projection: Box<Expr>,
    },

    /// Array wildcard projection (`[*]`), also used for slices
    ///
    /// # Example
    /// ```text
    /// people[*].name
    /// ```
    WildcardIndex {
        child: Box<Expr>,
        projection: Box<Expr>,
    },

    /// Object values projection (`*`)
    ///
    /// # Example
    /// ```text
    /// ops.*.numArgs
    /// ```
    WildcardValues {
        child: Box<Expr>,
        projection: Box<Expr>,
    },

    /// Filter projection (`[?predicate]`)
    ///
    /// # Example
    /// ```text
    /// machines[?state == 'running'].name
    /// ```
    FilterProjection {
        child: Box<Expr>,
        predicate: Box<Expr>,
        projection: Box<Expr>,
    },

    /// Pipe: evaluate `right` once against the whole result of `left`
    Pipe {
        left: Box<Expr>,
        right: Box<Expr>,
    },

    /// Logical OR (`||`)
    Or {
        left: Box<Expr>,
        right: Box<Expr>,
    },

    /// Logical AND (`&&`)
    And {
        left: Box<Expr>,
        right: Box<Expr>,
    },

    /// Logical NOT (`!`)
    Not(Box<Expr>),

    /// Comparison
    Comparator {
        op: Comparator,
        left: Box<Expr>,
        right: Box<Expr>,
    },

    /// Multi-select list
    ///
    /// # Example
    /// ```text
    /// [name, age]
    /// ```
    MultiSelectList(Vec<Expr>),

    /// Multi-select hash, pairs kept in declaration order
    ///
    /// # Example
    /// ```text
    /// {name: name, total: sum(items)}
    /// ```
    MultiSelectHash(Vec<(String, Expr)>),

    /// Function call
    ///
    /// # Example
    /// ```text
    /// sort_by(people, &age)
    /// ```
    Function { name: String, args: Vec<Expr> },

    /// Deferred sub-expression (`&expr`) handed to a function
    ExpressionRef(Box<Expr>),
}

impl Expr {
    /// Whether the tree rooted here is more than `limit` nodes deep.
    ///
    /// Never descends past `limit`, so it is safe to call on any tree.
    pub fn deeper_than(&self, limit: usize) -> bool {
        let Some(below) = limit.checked_sub(1) else {
            return true;
        };
        match self {
            Expr::Identity
            | Expr::CurrentNode
            | Expr::Field(_)
            | Expr::Index(_)
            | Expr::Slice { .. }
            | Expr::Literal(_) => false,
            Expr::SubExpression { left, right }
            | Expr::IndexExpression { left, right }
            | Expr::Pipe { left, right }
            | Expr::Or { left, right }
            | Expr::And { left, right }
            | Expr::Comparator { left, right, .. } => {
                left.deeper_than(below) || right.deeper_than(below)
            }
            Expr::Flatten { child, projection }
            | Expr::WildcardIndex { child, projection }
            | Expr::WildcardValues { child, projection } => {
                child.deeper_than(below) || projection.deeper_than(below)
            }
            Expr::FilterProjection {
                child,
                predicate,
                projection,
            } => {
                child.deeper_than(below)
                    || predicate.deeper_than(below)
                    || projection.deeper_than(below)
            }
            Expr::Not(child) | Expr::ExpressionRef(child) => child.deeper_than(below),
            Expr::MultiSelectList(items) | Expr::Function { args: items, .. } => {
                items.iter().any(|item| item.deeper_than(below))
            }
            Expr::MultiSelectHash(pairs) => pairs.iter().any(|(_, value)| value.deeper_than(below)),
        }
    }
}
