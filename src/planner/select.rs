//! SELECT blocks, FROM sources and set operations.
//!
//! Clauses are planned in evaluation order: FROM, LET, WHERE, GROUP BY with
//! its aggregates, HAVING, ORDER BY, the projection, DISTINCT, OFFSET and
//! LIMIT. Each clause wraps the relation built so far.

use super::context::{path_key, GroupFrame, PlanContext};
use crate::ast::{
    CollectionKind, Expr, FromClause, FromSource, GroupBy, Join, JoinKind, LetBinding, Literal,
    PathStep, ProjectItem, Projection, Select, SetOpQuery, SetQuantifier, Span,
};
use crate::env::{ResolutionStrategy, ScopeKind};
use crate::error::PlanningError;
use crate::functions::{FunctionKind, FunctionRegistry};
use crate::plan::{Binding, Rel, RelOp, RelType, Rex, RexOp, SortSpec, StructField, VarRef};
use crate::types::{self, StaticType, StructType};
use smol_str::SmolStr;

/// Name of the single column of relations built over query results.
const ROW: &str = "$row";

impl PlanContext<'_> {
    /// Plans a SELECT block as a collection-typed expression.
    pub(super) fn plan_select(&mut self, select: &Select) -> Result<Rex, PlanningError> {
        let base = self.env.depth();

        let mut rel = match &select.from {
            Some(from) => {
                let mut position = 0;
                self.plan_from(from, &mut position)?
            }
            None => unit_rel(),
        };
        let from_span = select
            .from
            .as_ref()
            .map_or_else(|| select.span.clone(), FromClause::span);
        self.push_scope(ScopeKind::From, rel.ty.schema.clone(), &from_span);

        if !select.lets.is_empty() {
            rel = self.plan_lets(rel, &select.lets)?;
        }
        if let Some(predicate) = &select.where_clause {
            rel = self.plan_filter(rel, predicate, "WHERE")?;
        }

        let mut aggregates = Vec::new();
        collect_select_aggregates(self.registry, select, &mut aggregates);
        let grouped = select.group_by.is_some() || !aggregates.is_empty();
        if grouped {
            rel = self.plan_grouping(
                rel,
                select.group_by.as_ref(),
                &aggregates,
                base,
                &select.span,
            )?;
        }

        if let Some(having) = &select.having {
            rel = self.plan_filter(rel, having, "HAVING")?;
        }

        if !select.order_by.is_empty() {
            let mut specs = Vec::with_capacity(select.order_by.len());
            for item in &select.order_by {
                specs.push(SortSpec {
                    rex: self.plan_expr(&item.expr)?,
                    descending: item.descending,
                    // NULLS LAST ascending, NULLS FIRST descending.
                    nulls_first: item.nulls_first.unwrap_or(item.descending),
                });
            }
            let ty = RelType {
                schema: rel.ty.schema.clone(),
                ordered: true,
            };
            rel = Rel::new(
                ty,
                RelOp::Sort {
                    input: Box::new(rel),
                    specs,
                },
            );
        }

        let constructor = self.plan_projection(&select.projection, base)?;

        let pushed = self.env.depth() - base;
        self.pop_scopes(pushed);
        if grouped {
            self.pop_group();
        }

        let ordered = rel.ty.ordered;
        let (constructor, mut rel) = if select.quantifier == SetQuantifier::Distinct {
            let row = constructor.ty.clone();
            let values = Rex::new(
                collection_type(row.clone(), ordered),
                RexOp::Select {
                    constructor: Box::new(constructor),
                    rel: Box::new(rel),
                },
            );
            let ty = RelType {
                schema: vec![Binding::new(ROW, row.clone())],
                ordered,
            };
            let scan = Rel::new(ty.clone(), RelOp::Scan { rex: values });
            let distinct = Rel::new(
                ty,
                RelOp::Distinct {
                    input: Box::new(scan),
                },
            );
            (local(row, 0, 0), distinct)
        } else {
            (constructor, rel)
        };

        if let Some(offset) = &select.offset {
            let rex = self.plan_expr(offset)?;
            self.expect_type(&rex, "OFFSET", "INT", StaticType::is_integer, offset.span());
            rel = Rel::new(
                rel.ty.clone(),
                RelOp::Offset {
                    input: Box::new(rel),
                    offset: rex,
                },
            );
        }
        if let Some(limit) = &select.limit {
            let rex = self.plan_expr(limit)?;
            self.expect_type(&rex, "LIMIT", "INT", StaticType::is_integer, limit.span());
            rel = Rel::new(
                rel.ty.clone(),
                RelOp::Limit {
                    input: Box::new(rel),
                    limit: rex,
                },
            );
        }

        Ok(Rex::new(
            collection_type(constructor.ty.clone(), ordered),
            RexOp::Select {
                constructor: Box::new(constructor),
                rel: Box::new(rel),
            },
        ))
    }

    /// Plans `left UNION|INTERSECT|EXCEPT right` over the values of both
    /// queries.
    pub(super) fn plan_set_op(&mut self, query: &SetOpQuery) -> Result<Rex, PlanningError> {
        let left = self.plan_expr(&query.left)?;
        let right = self.plan_expr(&query.right)?;
        let element = StaticType::union([scan_element(&left.ty), scan_element(&right.ty)]);

        let scan = |rex: Rex| {
            let ty = RelType::unordered(vec![Binding::new(ROW, scan_element(&rex.ty))]);
            Box::new(Rel::new(ty, RelOp::Scan { rex }))
        };
        let rel = Rel::new(
            RelType::unordered(vec![Binding::new(ROW, element.clone())]),
            RelOp::SetOp {
                op: query.op,
                quantifier: query.quantifier,
                left: scan(left),
                right: scan(right),
            },
        );
        Ok(Rex::new(
            StaticType::bag(element.clone()),
            RexOp::Select {
                constructor: Box::new(local(element, 0, 0)),
                rel: Box::new(rel),
            },
        ))
    }

    // ========================================================================
    // FROM
    // ========================================================================

    fn plan_from(&mut self, from: &FromClause, position: &mut usize) -> Result<Rel, PlanningError> {
        match from {
            FromClause::Scan(source) => self.plan_scan(source, false, position),
            FromClause::Unpivot(source) => self.plan_scan(source, true, position),
            FromClause::Join(join) => self.plan_join(join, position),
        }
    }

    fn plan_scan(
        &mut self,
        source: &FromSource,
        unpivot: bool,
        position: &mut usize,
    ) -> Result<Rel, PlanningError> {
        *position += 1;
        let rex = match &source.expr {
            Expr::Var(var) => self.plan_var_path(var, &[], ResolutionStrategy::GlobalsFirst)?,
            Expr::Path(path) => self.plan_path(path, ResolutionStrategy::GlobalsFirst)?,
            other => self.plan_expr(other)?,
        };
        let alias = source
            .as_alias
            .as_ref()
            .map(|alias| alias.name.clone())
            .unwrap_or_else(|| derive_alias(&source.expr, *position));
        let at = source.at_alias.as_ref().map(|at| at.name.clone());

        let (schema, op) = if unpivot {
            let mut schema = vec![Binding::new(alias, unpivot_value(&rex.ty))];
            schema.extend(at.map(|at| Binding::new(at, StaticType::String)));
            (schema, RelOp::Unpivot { rex })
        } else {
            let mut schema = vec![Binding::new(alias, scan_element(&rex.ty))];
            match at {
                Some(at) => {
                    schema.push(Binding::new(at, StaticType::Int8));
                    (schema, RelOp::ScanIndexed { rex })
                }
                None => (schema, RelOp::Scan { rex }),
            }
        };
        Ok(Rel::new(RelType::unordered(schema), op))
    }

    fn plan_join(&mut self, join: &Join, position: &mut usize) -> Result<Rel, PlanningError> {
        let left = self.plan_from(&join.left, position)?;

        // The right side is lateral: its sources may refer to the left.
        self.env.push_scope(ScopeKind::From, left.ty.schema.clone());
        let right = self.plan_from(&join.right, position);
        self.env.pop_scope();
        let right = right?;

        let mut joined = left.ty.schema.clone();
        joined.extend(right.ty.schema.iter().cloned());

        let condition = match &join.on {
            Some(on) => {
                self.env.push_scope(ScopeKind::From, joined.clone());
                let condition = self.plan_expr(on);
                self.env.pop_scope();
                let condition = condition?;
                self.expect_condition(&condition, "ON", on.span());
                condition
            }
            None => Rex::lit(Literal::Bool(true)),
        };

        let (pad_left, pad_right) = match join.kind {
            JoinKind::Inner => (false, false),
            JoinKind::Left => (false, true),
            JoinKind::Right => (true, false),
            JoinKind::Full => (true, true),
        };
        let mut schema = padded(&left.ty.schema, pad_left);
        schema.extend(padded(&right.ty.schema, pad_right));

        Ok(Rel::new(
            RelType::unordered(schema),
            RelOp::Join {
                left: Box::new(left),
                right: Box::new(right),
                condition,
                kind: join.kind,
            },
        ))
    }

    // ========================================================================
    // LET, WHERE, HAVING
    // ========================================================================

    fn plan_lets(&mut self, rel: Rel, lets: &[LetBinding]) -> Result<Rel, PlanningError> {
        let mut projections = Vec::with_capacity(lets.len());
        let mut bindings = Vec::with_capacity(lets.len());
        for binding in lets {
            let rex = self.plan_expr(&binding.expr)?;
            bindings.push(Binding::new(binding.alias.name.clone(), rex.ty.clone()));
            projections.push(rex);
        }

        let mut schema = rel.ty.schema.clone();
        schema.extend(bindings.iter().cloned());
        let ty = RelType {
            schema,
            ordered: rel.ty.ordered,
        };
        let span = match (lets.first(), lets.last()) {
            (Some(first), Some(last)) => first.span.start..last.span.end,
            _ => Span::default(),
        };
        self.push_scope(ScopeKind::Let, bindings, &span);
        Ok(Rel::new(
            ty,
            RelOp::Project {
                input: Box::new(rel),
                projections,
            },
        ))
    }

    fn plan_filter(
        &mut self,
        rel: Rel,
        predicate: &Expr,
        clause: &str,
    ) -> Result<Rel, PlanningError> {
        let rex = self.plan_expr(predicate)?;
        self.expect_condition(&rex, clause, predicate.span());
        Ok(Rel::new(
            rel.ty.clone(),
            RelOp::Filter {
                input: Box::new(rel),
                predicate: rex,
            },
        ))
    }

    // ========================================================================
    // GROUP BY
    // ========================================================================

    /// Builds the Aggregate rel and replaces the scopes of this SELECT with
    /// one holding its columns.
    fn plan_grouping(
        &mut self,
        rel: Rel,
        group_by: Option<&GroupBy>,
        aggregates: &[&Expr],
        base: usize,
        span: &Span,
    ) -> Result<Rel, PlanningError> {
        let mut calls = Vec::with_capacity(aggregates.len());
        let mut schema = Vec::new();
        for (idx, aggregate) in aggregates.iter().enumerate() {
            let (call, ty) = self.plan_aggregate(aggregate)?;
            schema.push(Binding::new(format!("$agg_{}", idx), ty));
            calls.push(call);
        }

        let mut groups = Vec::new();
        let mut keys = Vec::new();
        let mut group_as = None;
        if let Some(group_by) = group_by {
            for (idx, key) in group_by.keys.iter().enumerate() {
                let rex = self.plan_expr(&key.expr)?;
                let alias = key
                    .alias
                    .as_ref()
                    .map(|alias| alias.name.clone())
                    .unwrap_or_else(|| derive_alias(&key.expr, idx + 1));
                if let Some(text) = path_key(&key.expr) {
                    keys.push((text, schema.len()));
                }
                schema.push(Binding::new(alias, rex.ty.clone()));
                groups.push(rex);
            }
            if let Some(name) = &group_by.group_as {
                schema.push(Binding::new(
                    name.name.clone(),
                    StaticType::bag(rel.ty.row_type()),
                ));
                group_as = Some(name.name.clone());
            }
        }

        let pushed = self.env.depth() - base;
        self.pop_scopes(pushed);
        let types = schema.iter().map(|b| b.ty.clone()).collect();
        let span = group_by.map_or_else(|| span.clone(), |g| g.span.clone());
        self.push_scope(ScopeKind::Group, schema.clone(), &span);
        let aggregates = aggregates.iter().map(|e| *e as *const Expr).collect();
        self.push_group(GroupFrame::new(self.env.depth(), aggregates, keys, types));

        Ok(Rel::new(
            RelType::unordered(schema),
            RelOp::Aggregate {
                input: Box::new(rel),
                calls,
                groups,
                group_as,
            },
        ))
    }

    // ========================================================================
    // Projection
    // ========================================================================

    fn plan_projection(
        &mut self,
        projection: &Projection,
        base: usize,
    ) -> Result<Rex, PlanningError> {
        match projection {
            Projection::Value(expr) => self.plan_expr(expr),
            Projection::Star(_) => Ok(self.plan_star(base)),
            Projection::Items(items) => {
                let mut parts = Vec::new();
                let mut fields = Vec::new();
                let mut merged = false;
                for (idx, item) in items.iter().enumerate() {
                    match item {
                        ProjectItem::Expr { expr, alias } => {
                            let value = self.plan_expr(expr)?;
                            let name = alias
                                .as_ref()
                                .map(|alias| alias.name.clone())
                                .unwrap_or_else(|| derive_alias(expr, idx + 1));
                            fields.push((name, value));
                        }
                        ProjectItem::AllFields(expr, span) => {
                            let value = self.plan_expr(expr)?;
                            self.expect_type(
                                &value,
                                "projection",
                                "STRUCT",
                                |t| matches!(t, StaticType::Struct(_)),
                                span.clone(),
                            );
                            if !fields.is_empty() {
                                parts.push(struct_rex(std::mem::take(&mut fields)));
                            }
                            parts.push(value);
                            merged = true;
                        }
                    }
                }
                if !merged {
                    return Ok(struct_rex(fields));
                }
                if !fields.is_empty() {
                    parts.push(struct_rex(fields));
                }
                Ok(tuple_union(parts))
            }
        }
    }

    /// `SELECT *`: the fields of every binding of this SELECT, with
    /// non-struct bindings nested under their own name.
    fn plan_star(&self, base: usize) -> Rex {
        let depth = self.env.depth();
        let mut parts = Vec::new();
        for (idx, scope) in self.env.scopes().iter().enumerate().skip(base) {
            for (offset, binding) in scope.bindings().iter().enumerate() {
                if binding.name.starts_with('$') {
                    continue;
                }
                let var = local(binding.ty.clone(), depth - 1 - idx, offset);
                if matches!(binding.ty, StaticType::Struct(_)) {
                    parts.push(var);
                } else {
                    parts.push(struct_rex(vec![(binding.name.clone(), var)]));
                }
            }
        }
        tuple_union(parts)
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn local(ty: StaticType, depth: usize, offset: usize) -> Rex {
    Rex::new(ty, RexOp::Var(VarRef::Local { depth, offset }))
}

fn collection_type(element: StaticType, ordered: bool) -> StaticType {
    if ordered {
        StaticType::array(element)
    } else {
        StaticType::bag(element)
    }
}

/// A relation of one row with no columns, the input of a SELECT without FROM.
fn unit_rel() -> Rel {
    let empty = StaticType::Struct(StructType::closed(vec![]));
    let row = Rex::new(empty.clone(), RexOp::Struct(vec![]));
    let rex = Rex::new(
        StaticType::bag(empty),
        RexOp::Collection {
            kind: CollectionKind::Bag,
            values: vec![row],
        },
    );
    Rel::new(RelType::unordered(vec![]), RelOp::Scan { rex })
}

/// Type of the rows produced by scanning a value of type `ty`. A value that
/// is not a collection is scanned as a bag of itself.
fn scan_element(ty: &StaticType) -> StaticType {
    StaticType::union(ty.members().iter().map(|member| match member.element_type() {
        Some(element) => element.clone(),
        None => member.clone(),
    }))
}

/// Type of the values produced by unpivoting a value of type `ty`.
fn unpivot_value(ty: &StaticType) -> StaticType {
    StaticType::union(ty.members().iter().map(|member| match member {
        StaticType::Struct(row) if row.closed && !row.fields.is_empty() => {
            StaticType::union(row.fields.iter().map(|f| f.ty.clone()))
        }
        StaticType::Struct(_) => StaticType::Dynamic,
        other => other.clone(),
    }))
}

fn padded(schema: &[Binding], pad: bool) -> Vec<Binding> {
    schema
        .iter()
        .map(|b| {
            if pad {
                Binding::new(b.name.clone(), b.ty.with(StaticType::Null))
            } else {
                b.clone()
            }
        })
        .collect()
}

/// Builds a struct constructor with literal keys.
fn struct_rex(fields: Vec<(SmolStr, Rex)>) -> Rex {
    let declared = fields
        .iter()
        .map(|(name, value)| types::StructField::new(name.clone(), value.ty.clone()))
        .collect();
    let fields = fields
        .into_iter()
        .map(|(name, value)| StructField {
            key: Rex::lit(Literal::String(name)),
            value,
        })
        .collect();
    Rex::new(
        StaticType::Struct(StructType::closed(declared)),
        RexOp::Struct(fields),
    )
}

/// Merges struct values; closed only when every part is a closed struct.
fn tuple_union(parts: Vec<Rex>) -> Rex {
    let mut fields = Vec::new();
    let mut closed = true;
    for part in &parts {
        match &part.ty {
            StaticType::Struct(row) => {
                fields.extend(row.fields.iter().cloned());
                closed &= row.closed;
            }
            _ => closed = false,
        }
    }
    let shape = if closed {
        StructType::closed(fields)
    } else {
        StructType::open(fields)
    };
    Rex::new(StaticType::Struct(shape), RexOp::TupleUnion(parts))
}

/// Name given to an unaliased projection or FROM source: the variable name,
/// the last path step, or `_N` for the N-th item.
pub(super) fn derive_alias(expr: &Expr, position: usize) -> SmolStr {
    match expr {
        Expr::Var(var) => var.name.name.clone(),
        Expr::Path(path) => match path.steps.last() {
            Some(PathStep::Symbol(name, _)) => name.name.clone(),
            Some(PathStep::Index(Expr::Lit(Literal::String(key), _))) => key.clone(),
            _ => SmolStr::new(format!("_{}", position)),
        },
        _ => SmolStr::new(format!("_{}", position)),
    }
}

/// Collects the aggregate calls of the clauses evaluated after grouping.
fn collect_select_aggregates<'e>(
    registry: &FunctionRegistry,
    select: &'e Select,
    out: &mut Vec<&'e Expr>,
) {
    match &select.projection {
        Projection::Star(_) => {}
        Projection::Value(expr) => collect_aggregates(registry, expr, out),
        Projection::Items(items) => {
            for item in items {
                match item {
                    ProjectItem::Expr { expr, .. } | ProjectItem::AllFields(expr, _) => {
                        collect_aggregates(registry, expr, out)
                    }
                }
            }
        }
    }
    if let Some(having) = &select.having {
        collect_aggregates(registry, having, out);
    }
    for item in &select.order_by {
        collect_aggregates(registry, &item.expr, out);
    }
}

fn collect_aggregates<'e>(registry: &FunctionRegistry, expr: &'e Expr, out: &mut Vec<&'e Expr>) {
    match expr {
        Expr::CountStar(_) => out.push(expr),
        Expr::Call(call) if is_aggregate_call(registry, call) => out.push(expr),
        _ => {
            for child in expr.children() {
                collect_aggregates(registry, child, out);
            }
        }
    }
}

/// A call is an aggregate when its name has aggregate overloads and no
/// scalar ones.
fn is_aggregate_call(registry: &FunctionRegistry, call: &crate::ast::CallExpr) -> bool {
    let namespace = call.name.namespace.as_ref();
    registry.is_aggregate(namespace, &call.name.name)
        && registry
            .lookup(namespace, FunctionKind::Scalar, &call.name.name)
            .is_none()
}
