use bizdock_domain::{
    AccessClause, AccessField, AccessPredicate, AccessValue, FilterCondition, FilterGroup,
    FilterNode, FilterOperator, LogicalMode, QueryPlan, SortDirection,
};
use serde_json::Value;
use sqlx::{Postgres, QueryBuilder};

/// Appends `WHERE resource_type AND NOT deleted AND filter AND access AND guards`.
pub(super) fn push_plan_conditions(builder: &mut QueryBuilder<'_, Postgres>, plan: &QueryPlan) {
    builder.push(" WHERE resource_type = ");
    builder.push_bind(plan.resource_type().as_str());
    builder.push(" AND deleted = FALSE");

    if let Some(filter) = plan.filter() {
        builder.push(" AND ");
        push_filter_group(builder, filter);
    }

    builder.push(" AND ");
    push_access_predicate(builder, plan.access());

    for guard in plan.guards() {
        builder.push(" AND ");
        push_access_clause(builder, guard);
    }
}

/// Appends the caller order followed by the identifier tie-breaker.
pub(super) fn push_order_by(builder: &mut QueryBuilder<'_, Postgres>, plan: &QueryPlan) {
    builder.push(" ORDER BY ");

    for key in plan.order() {
        push_field_expression(builder, key.field());
        match key.direction() {
            SortDirection::Asc => builder.push(" ASC NULLS LAST, "),
            SortDirection::Desc => builder.push(" DESC NULLS LAST, "),
        };
    }

    builder.push("id ASC");
}

/// JSON value of a field, SQL `NULL` when missing or JSON `null`.
fn push_field_expression(builder: &mut QueryBuilder<'_, Postgres>, field: &str) {
    if field == AccessField::Id.as_str() {
        builder.push("to_jsonb(id)");
        return;
    }

    builder.push("NULLIF(data -> ");
    builder.push_bind(field.to_owned());
    builder.push(", 'null'::JSONB)");
}

fn push_access_predicate(builder: &mut QueryBuilder<'_, Postgres>, predicate: &AccessPredicate) {
    if predicate.is_deny_all() {
        builder.push("FALSE");
        return;
    }

    push_clause_list(builder, predicate.clauses(), " OR ");
}

fn push_clause_list(
    builder: &mut QueryBuilder<'_, Postgres>,
    clauses: &[AccessClause],
    separator: &str,
) {
    builder.push('(');
    for (index, clause) in clauses.iter().enumerate() {
        if index > 0 {
            builder.push(separator);
        }
        push_access_clause(builder, clause);
    }
    builder.push(')');
}

fn push_access_clause(builder: &mut QueryBuilder<'_, Postgres>, clause: &AccessClause) {
    match clause {
        AccessClause::BlanketPermission => {
            builder.push("TRUE");
        }
        AccessClause::FieldEquals { field, value } => {
            // Scalars compare directly, arrays match on any element.
            builder.push("COALESCE(");
            push_field_expression(builder, field.as_str());
            builder.push(" = ");
            builder.push_bind(value.to_json());
            builder.push(" OR (jsonb_typeof(");
            push_field_expression(builder, field.as_str());
            builder.push(") = 'array' AND ");
            push_field_expression(builder, field.as_str());
            builder.push(" @> jsonb_build_array(");
            builder.push_bind(value.to_json());
            builder.push(")), FALSE)");
        }
        AccessClause::FieldInCollection { field, values } => {
            if values.is_empty() {
                builder.push("FALSE");
                return;
            }

            builder.push("EXISTS (SELECT 1 FROM jsonb_array_elements(CASE WHEN jsonb_typeof(");
            push_field_expression(builder, field.as_str());
            builder.push(") = 'array' THEN ");
            push_field_expression(builder, field.as_str());
            builder.push(" ELSE jsonb_build_array(");
            push_field_expression(builder, field.as_str());
            builder.push(") END) AS element(value) WHERE element.value IN (SELECT jsonb_array_elements(");
            builder.push_bind(Value::Array(values.iter().map(AccessValue::to_json).collect()));
            builder.push(")))");
        }
        AccessClause::AllOf { clauses } => {
            if clauses.is_empty() {
                builder.push("FALSE");
                return;
            }
            push_clause_list(builder, clauses, " AND ");
        }
        AccessClause::AnyOf { clauses } => {
            if clauses.is_empty() {
                builder.push("FALSE");
                return;
            }
            push_clause_list(builder, clauses, " OR ");
        }
    }
}

fn push_filter_group(builder: &mut QueryBuilder<'_, Postgres>, group: &FilterGroup) {
    builder.push('(');

    for (index, node) in group.nodes().iter().enumerate() {
        if index > 0 {
            match group.logical_mode() {
                LogicalMode::And => builder.push(" AND "),
                LogicalMode::Or => builder.push(" OR "),
            };
        }

        match node {
            FilterNode::Condition(condition) => push_filter_condition(builder, condition),
            FilterNode::Group(nested_group) => push_filter_group(builder, nested_group),
        }
    }

    builder.push(')');
}

fn push_filter_condition(builder: &mut QueryBuilder<'_, Postgres>, condition: &FilterCondition) {
    builder.push("COALESCE(");

    match condition.operator() {
        FilterOperator::Eq | FilterOperator::Neq => {
            push_field_expression(builder, condition.field());
            builder.push(if condition.operator() == FilterOperator::Eq {
                " = "
            } else {
                " <> "
            });
            builder.push_bind(condition.value().clone());
        }
        FilterOperator::Gt | FilterOperator::Gte | FilterOperator::Lt | FilterOperator::Lte => {
            let operator = match condition.operator() {
                FilterOperator::Gt => " > ",
                FilterOperator::Gte => " >= ",
                FilterOperator::Lt => " < ",
                _ => " <= ",
            };

            // Only values of the same JSON type are ordered against each other.
            builder.push("(jsonb_typeof(");
            push_field_expression(builder, condition.field());
            builder.push(") = jsonb_typeof(");
            builder.push_bind(condition.value().clone());
            builder.push(") AND ");
            push_field_expression(builder, condition.field());
            builder.push(operator);
            builder.push_bind(condition.value().clone());
            builder.push(')');
        }
        FilterOperator::Contains => {
            builder.push("(jsonb_typeof(");
            push_field_expression(builder, condition.field());
            builder.push(") = 'string' AND strpos(");
            push_field_expression(builder, condition.field());
            builder.push(" #>> '{}', ");
            builder.push_bind(condition.value().as_str().unwrap_or_default().to_owned());
            builder.push(") > 0)");
        }
        FilterOperator::In => {
            push_field_expression(builder, condition.field());
            builder.push(" IN (SELECT jsonb_array_elements(");
            builder.push_bind(condition.value().clone());
            builder.push("))");
        }
    }

    builder.push(", FALSE)");
}
