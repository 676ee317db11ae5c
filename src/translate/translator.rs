//! Expression translator
//!
//! Walks a query chain from the outermost node inward and produces a
//! `CompiledQuery`. Pure and deterministic: same chain, same output.
//!
//! Resolution rules while unwinding:
//! - skip/take: the outermost (last-applied) value is kept
//! - sort: every sort node overwrites, so the innermost (first-chained) wins
//! - project: the outermost projection is kept
//! - filters: conjoined in chained order

use serde_json::Value;

use crate::query::{CompareOp, FieldRef, Operand, Predicate, Projection, QueryExpr};

use super::compiled::{CompiledFilter, CompiledQuery, SortSpec};
use super::errors::{TranslateError, TranslateResult};

/// Translates query chains into compiled queries
pub struct Translator;

impl Translator {
    /// Translates a chain. Fails on any node or predicate shape the target
    /// language cannot express.
    pub fn translate(expr: &QueryExpr) -> TranslateResult<CompiledQuery> {
        let mut compiled = CompiledQuery::default();
        let mut filters = Vec::new();
        let mut projection_seen = false;
        let mut outermost = true;
        let mut node = expr;

        loop {
            match node {
                QueryExpr::Source => break,
                QueryExpr::Filter { predicate, .. } => {
                    filters.push(Self::compile_predicate(predicate)?);
                }
                QueryExpr::Sort {
                    field, direction, ..
                } => {
                    compiled.sort = Some(SortSpec::new(field.name(), *direction));
                }
                QueryExpr::Skip { count, .. } => {
                    let count = Self::resolve_count("skip", *count)?;
                    compiled.skip.get_or_insert(count);
                }
                QueryExpr::Take { count, .. } => {
                    let count = Self::resolve_count("take", *count)?;
                    compiled.take.get_or_insert(count);
                }
                QueryExpr::Project { projection, .. } => {
                    let fields = Self::projected_fields(projection)?;
                    if !projection_seen {
                        compiled.projected_fields = fields;
                        projection_seen = true;
                    }
                }
                QueryExpr::Count { .. } => {
                    if !outermost {
                        return Err(TranslateError::invalid_argument(
                            "count must be the last operation in a query",
                        ));
                    }
                    compiled.track_total = true;
                }
                QueryExpr::GroupBy { key, .. } => {
                    return Err(TranslateError::unsupported(format!(
                        "method 'group_by' (key '{}')",
                        key
                    )));
                }
            }

            outermost = false;
            match node.inner() {
                Some(inner) => node = inner,
                None => break,
            }
        }

        // Collected outer to inner; restore chained order
        filters.reverse();
        compiled.filter = match filters.len() {
            0 => None,
            1 => filters.pop(),
            _ => Some(CompiledFilter::must(filters)),
        };

        Ok(compiled)
    }

    /// Compiles a predicate tree node for node
    pub fn compile_predicate(predicate: &Predicate) -> TranslateResult<CompiledFilter> {
        match predicate {
            Predicate::Compare { left, op, right } => Self::compile_compare(left, *op, right),
            Predicate::Contains { field, value } => {
                let value = Self::scalar(value)?;
                let query = Self::literal_text(value).ok_or_else(|| {
                    TranslateError::invalid_argument(format!(
                        "contains on '{}' requires a non-null value",
                        field
                    ))
                })?;
                Ok(CompiledFilter::matches(field.name(), query))
            }
            Predicate::Not(inner) => Ok(CompiledFilter::must_not(Self::compile_predicate(inner)?)),
            Predicate::And(left, right) => Ok(CompiledFilter::must(vec![
                Self::compile_predicate(left)?,
                Self::compile_predicate(right)?,
            ])),
            Predicate::Or(left, right) => Ok(CompiledFilter::should(vec![
                Self::compile_predicate(left)?,
                Self::compile_predicate(right)?,
            ])),
        }
    }

    fn compile_compare(
        left: &Operand,
        op: CompareOp,
        right: &Operand,
    ) -> TranslateResult<CompiledFilter> {
        let field = match left {
            Operand::Field(field) => field.name().to_string(),
            Operand::Literal(_) => {
                return Err(TranslateError::unsupported(format!(
                    "'{}' comparison whose left operand is not a field access",
                    op.as_str()
                )))
            }
        };
        let value = match right {
            Operand::Literal(value) => Self::scalar(value)?,
            Operand::Field(other) => {
                return Err(TranslateError::unsupported(format!(
                    "field-to-field comparison '{}' {} '{}'",
                    field,
                    op.as_str(),
                    other
                )))
            }
        };

        let filter = match op {
            CompareOp::Eq => CompiledFilter::term(field, value.clone()),
            CompareOp::Ne => CompiledFilter::must_not(CompiledFilter::term(field, value.clone())),
            CompareOp::Gt => CompiledFilter::Range {
                field,
                gt: Self::literal_text(value),
                gte: None,
                lt: None,
                lte: None,
            },
            CompareOp::Gte => CompiledFilter::Range {
                field,
                gt: None,
                gte: Self::literal_text(value),
                lt: None,
                lte: None,
            },
            CompareOp::Lt => CompiledFilter::Range {
                field,
                gt: None,
                gte: None,
                lt: Self::literal_text(value),
                lte: None,
            },
            CompareOp::Lte => CompiledFilter::Range {
                field,
                gt: None,
                gte: None,
                lt: None,
                lte: Self::literal_text(value),
            },
        };

        Ok(filter)
    }

    /// Literals must be scalars; arrays and objects have no term form
    fn scalar(value: &Value) -> TranslateResult<&Value> {
        match value {
            Value::Array(_) | Value::Object(_) => Err(TranslateError::unsupported(
                "non-scalar literal in predicate",
            )),
            scalar => Ok(scalar),
        }
    }

    /// Textual form used for range bounds and match queries.
    /// `null` yields no text.
    fn literal_text(value: &Value) -> Option<String> {
        match value {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            Value::Bool(b) => Some(b.to_string()),
            Value::Number(n) => Some(n.to_string()),
            other => Some(other.to_string()),
        }
    }

    fn resolve_count(op: &str, count: i64) -> TranslateResult<u64> {
        u64::try_from(count).map_err(|_| {
            TranslateError::invalid_argument(format!("{} count must be non-negative, got {}", op, count))
        })
    }

    fn projected_fields(projection: &Projection) -> TranslateResult<Vec<String>> {
        let fields: &[FieldRef] = match projection {
            Projection::Object(fields) => fields,
            Projection::Member(field) => {
                return Err(TranslateError::unsupported(format!(
                    "projection of bare member '{}'; only object projections of fields are supported",
                    field
                )))
            }
        };

        if fields.is_empty() {
            return Err(TranslateError::unsupported("projection with no fields"));
        }

        fields
            .iter()
            .map(|f| {
                if f.is_direct() {
                    Ok(f.name().to_string())
                } else {
                    Err(TranslateError::unsupported(format!(
                        "projection of nested or computed member '{}'",
                        f
                    )))
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::SortDirection;
    use serde_json::json;

    #[test]
    fn test_empty_chain_matches_all() {
        let compiled = Translator::translate(&QueryExpr::Source).unwrap();
        assert_eq!(compiled, CompiledQuery::default());
        assert!(compiled.filter.is_none());
    }

    #[test]
    fn test_filter_sort_skip_take() {
        let chain = QueryExpr::source()
            .filter(Predicate::gt("age", 18))
            .sort("name", SortDirection::Desc)
            .skip(10)
            .take(5);

        let compiled = Translator::translate(&chain).unwrap();

        assert_eq!(
            compiled.filter,
            Some(CompiledFilter::range("age").gt("18"))
        );
        assert_eq!(compiled.sort, Some(SortSpec::new("name", SortDirection::Desc)));
        assert_eq!(compiled.skip, Some(10));
        assert_eq!(compiled.take, Some(5));
        assert!(!compiled.track_total);
    }

    #[test]
    fn test_count_keeps_filter() {
        let chain = QueryExpr::source()
            .filter(Predicate::eq("status", "active"))
            .count();

        let compiled = Translator::translate(&chain).unwrap();

        assert_eq!(compiled.filter, Some(CompiledFilter::term("status", "active")));
        assert!(compiled.track_total);
    }

    #[test]
    fn test_group_by_unsupported() {
        let chain = QueryExpr::source().group_by("status");
        let err = Translator::translate(&chain).unwrap_err();
        assert!(err.is_unsupported());
        assert!(err.to_string().contains("group_by"));
    }

    #[test]
    fn test_group_by_anywhere_in_chain_unsupported() {
        let chain = QueryExpr::source().group_by("status").take(3);
        assert!(Translator::translate(&chain).unwrap_err().is_unsupported());
    }

    /// Documented quirk: the first-chained sort wins because every sort node
    /// overwrites while the chain is unwound from the outside in.
    #[test]
    fn test_first_chained_sort_wins() {
        let chain = QueryExpr::source()
            .sort("name", SortDirection::Asc)
            .sort("age", SortDirection::Desc);

        let compiled = Translator::translate(&chain).unwrap();
        assert_eq!(compiled.sort, Some(SortSpec::new("name", SortDirection::Asc)));
    }

    #[test]
    fn test_last_applied_skip_take_win() {
        let a = QueryExpr::source().skip(1).take(2).skip(3).take(4);
        let b = QueryExpr::source()
            .take(9)
            .filter(Predicate::eq("x", 1))
            .skip(7)
            .sort("y", SortDirection::Asc)
            .take(4)
            .skip(3);

        for chain in [a, b] {
            let compiled = Translator::translate(&chain).unwrap();
            assert_eq!(compiled.skip, Some(3));
            assert_eq!(compiled.take, Some(4));
        }
    }

    #[test]
    fn test_zero_skip_take_allowed() {
        let chain = QueryExpr::source().skip(0).take(0);
        let compiled = Translator::translate(&chain).unwrap();
        assert_eq!(compiled.skip, Some(0));
        assert_eq!(compiled.take, Some(0));
    }

    #[test]
    fn test_negative_skip_rejected() {
        let chain = QueryExpr::source().skip(-1);
        let err = Translator::translate(&chain).unwrap_err();
        assert_eq!(err.code(), "AERO_QUERY_INVALID");
    }

    #[test]
    fn test_negative_take_rejected_even_when_shadowed() {
        let chain = QueryExpr::source().take(-5).take(3);
        assert!(Translator::translate(&chain).is_err());
    }

    #[test]
    fn test_count_must_be_outermost() {
        let chain = QueryExpr::source().count().take(1);
        let err = Translator::translate(&chain).unwrap_err();
        assert_eq!(err.code(), "AERO_QUERY_INVALID");
    }

    #[test]
    fn test_and_of_equalities_leaf_count() {
        let fields = ["a", "b", "c", "d", "e"];
        for n in 1..=fields.len() {
            let mut pred = Predicate::eq(fields[0], 0);
            for (i, f) in fields.iter().enumerate().take(n).skip(1) {
                pred = pred.and(Predicate::eq(*f, i as i64));
            }

            let compiled = Translator::compile_predicate(&pred).unwrap();
            assert_eq!(compiled.leaf_count(), n);
            if n > 1 {
                assert!(matches!(compiled, CompiledFilter::Bool { ref must, .. } if must.len() == 2));
            }
        }
    }

    #[test]
    fn test_predicate_variants() {
        assert_eq!(
            Translator::compile_predicate(&Predicate::ne("status", "gone")).unwrap(),
            CompiledFilter::must_not(CompiledFilter::term("status", "gone"))
        );
        assert_eq!(
            Translator::compile_predicate(&Predicate::contains("title", "rust search")).unwrap(),
            CompiledFilter::matches("title", "rust search")
        );
        assert_eq!(
            Translator::compile_predicate(&Predicate::eq("a", 1).negate()).unwrap(),
            CompiledFilter::must_not(CompiledFilter::term("a", 1))
        );
        assert_eq!(
            Translator::compile_predicate(&Predicate::eq("a", 1).or(Predicate::lte("b", 2))).unwrap(),
            CompiledFilter::should(vec![
                CompiledFilter::term("a", 1),
                CompiledFilter::range("b").lte("2"),
            ])
        );
    }

    #[test]
    fn test_range_bounds_are_stringified() {
        let compiled = Translator::compile_predicate(&Predicate::gte("name", "m")).unwrap();
        assert_eq!(compiled, CompiledFilter::range("name").gte("m"));

        let compiled = Translator::compile_predicate(&Predicate::lt("score", 2.5)).unwrap();
        assert_eq!(compiled, CompiledFilter::range("score").lt("2.5"));

        let compiled = Translator::compile_predicate(&Predicate::gt("flag", false)).unwrap();
        assert_eq!(compiled, CompiledFilter::range("flag").gt("false"));

        // null produces an open range
        let compiled = Translator::compile_predicate(&Predicate::gt("age", Value::Null)).unwrap();
        assert_eq!(compiled, CompiledFilter::range("age"));
    }

    #[test]
    fn test_literal_left_operand_unsupported() {
        let pred = Predicate::Compare {
            left: Operand::Literal(json!(1)),
            op: CompareOp::Eq,
            right: Operand::Literal(json!(1)),
        };
        assert!(Translator::compile_predicate(&pred).unwrap_err().is_unsupported());
    }

    #[test]
    fn test_field_to_field_unsupported() {
        let pred = Predicate::Compare {
            left: Operand::Field("a".into()),
            op: CompareOp::Lt,
            right: Operand::Field("b".into()),
        };
        assert!(Translator::compile_predicate(&pred).unwrap_err().is_unsupported());
    }

    #[test]
    fn test_non_scalar_literal_unsupported() {
        let pred = Predicate::eq("tags", json!(["a", "b"]));
        assert!(Translator::compile_predicate(&pred).unwrap_err().is_unsupported());
    }

    #[test]
    fn test_projection_shapes() {
        let ok = QueryExpr::source().project(Projection::Object(vec!["id".into(), "name".into()]));
        assert_eq!(
            Translator::translate(&ok).unwrap().projected_fields,
            vec!["id".to_string(), "name".to_string()]
        );

        let member = QueryExpr::source().project(Projection::Member("name".into()));
        assert!(Translator::translate(&member).unwrap_err().is_unsupported());

        let nested = QueryExpr::source().project(Projection::Object(vec!["address.city".into()]));
        assert!(Translator::translate(&nested).unwrap_err().is_unsupported());

        let empty = QueryExpr::source().project(Projection::Object(Vec::new()));
        assert!(Translator::translate(&empty).unwrap_err().is_unsupported());
    }

    #[test]
    fn test_multiple_filters_conjoined_in_chain_order() {
        let chain = QueryExpr::source()
            .filter(Predicate::eq("a", 1))
            .take(3)
            .filter(Predicate::eq("b", 2));

        let compiled = Translator::translate(&chain).unwrap();
        assert_eq!(
            compiled.filter,
            Some(CompiledFilter::must(vec![
                CompiledFilter::term("a", 1),
                CompiledFilter::term("b", 2),
            ]))
        );
    }

    #[test]
    fn test_translation_is_deterministic() {
        let chain = QueryExpr::source()
            .filter(Predicate::contains("bio", "rust").or(Predicate::gt("age", 30)))
            .sort("age", SortDirection::Asc)
            .take(10);

        let first = Translator::translate(&chain).unwrap();
        let second = Translator::translate(&chain).unwrap();
        assert_eq!(first, second);
    }
}
