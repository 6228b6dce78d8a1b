//! Query nodes: `SELECT`, `SET` (union/intersect/...), and subqueries in
//! `FROM`.

use crate::core::IStr;
use crate::model::dict::OrderedDict;
use crate::model::ids::{NodeId, PathRefId, QueryId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryKind {
    Select,
    /// UNION / INTERSECT / EXCEPT / UNION ALL.
    Set,
    SubqueryInFrom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SetOp {
    Union,
    UnionAll,
    Intersect,
    Except,
}

/// A table-alias binding inside a query's `$tableAliases` map: either an
/// implicit alias (the last path item of a `FROM` ref) or an explicit one.
#[derive(Debug, Clone)]
pub struct TableAlias {
    pub name: IStr,
    pub explicit: bool,
    /// `FROM` target: either a resolved entity/view, or a nested subquery.
    pub source: TableAliasSource,
}

#[derive(Debug, Clone)]
pub enum TableAliasSource {
    Path(PathRefId),
    Subquery(QueryId),
    Join(Box<JoinClause>),
}

#[derive(Debug, Clone)]
pub struct JoinClause {
    pub kind: JoinKind,
    pub left: TableAliasSource,
    pub right: TableAliasSource,
    pub on: Option<PathRefId>,
    /// JOIN nodes carry their own `$tableAliases` to enforce name
    /// restrictions scoped to just the join's two sides.
    pub table_aliases: OrderedDict<IStr, TableAlias>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JoinKind {
    Inner,
    Left,
    Right,
    Full,
    Cross,
}

/// One column in the `SELECT` list: `*`, a bare ref, an aliased expression,
/// or an `expand`/`inline` continuation.
#[derive(Debug, Clone)]
pub struct ColumnItem {
    pub star: bool,
    pub expr: Option<PathRefId>,
    pub alias: Option<IStr>,
    pub excluding: Vec<IStr>,
}

impl ColumnItem {
    pub fn star_with_excluding(excluding: Vec<IStr>) -> Self {
        Self {
            star: true,
            expr: None,
            alias: None,
            excluding,
        }
    }

    pub fn expr(expr: PathRefId, alias: Option<IStr>) -> Self {
        Self {
            star: false,
            expr: Some(expr),
            alias,
            excluding: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

#[derive(Debug, Clone)]
pub struct OrderByItem {
    pub expr: PathRefId,
    pub direction: SortDirection,
}

/// One query node. `from`/`where`/`group_by`/`having`/`limit` are kept as
/// raw path references (their own context governs name resolution).
#[derive(Debug, Clone)]
pub struct QueryNode {
    pub kind: QueryKind,
    pub set_op: Option<SetOp>,
    /// `SET` arguments (the member `SELECT`s of a `UNION`); each shares the
    /// set query's `$self` identity.
    pub set_args: Vec<QueryId>,
    pub from: Option<TableAliasSource>,
    pub columns: Option<Vec<ColumnItem>>,
    pub where_: Option<PathRefId>,
    pub group_by: Vec<PathRefId>,
    pub having: Option<PathRefId>,
    pub order_by: Vec<OrderByItem>,
    /// Literal row cap (`limit` is always a literal, never an expression).
    pub limit: Option<u64>,
    pub mixins: OrderedDict<IStr, NodeId>,
    pub table_aliases: OrderedDict<IStr, TableAlias>,
    /// Set-queries share their cache with their leading `SELECT`.
    pub leading_query: Option<QueryId>,
    pub main: Option<NodeId>,
    /// `_$next`: lexical parent query, used for name search continuation
    /// from a nested subquery.
    pub next: Option<QueryId>,
}

impl QueryNode {
    pub fn new_select(main: NodeId) -> Self {
        Self {
            kind: QueryKind::Select,
            set_op: None,
            set_args: Vec::new(),
            from: None,
            columns: None,
            where_: None,
            group_by: Vec::new(),
            having: None,
            order_by: Vec::new(),
            limit: None,
            mixins: OrderedDict::new(),
            table_aliases: OrderedDict::new(),
            leading_query: None,
            main: Some(main),
            next: None,
        }
    }

    pub fn new_set(args: Vec<QueryId>) -> Self {
        Self {
            kind: QueryKind::Set,
            set_op: Some(SetOp::Union),
            set_args: args,
            from: None,
            columns: None,
            where_: None,
            group_by: Vec::new(),
            having: None,
            order_by: Vec::new(),
            limit: None,
            mixins: OrderedDict::new(),
            table_aliases: OrderedDict::new(),
            leading_query: None,
            main: None,
            next: None,
        }
    }
}
