use crate::db::search::escape::contains_pattern;
use crate::db::search::predicate::{Combinator, Condition, ConditionGroup};

use super::bind::{push_int, push_text};
use super::BindValue;

pub(super) fn build_condition_clause(
    condition: &Condition,
    bind_params: &mut Vec<BindValue>,
) -> String {
    match condition {
        Condition::Contains { column, needle } => {
            let idx = push_text(bind_params, contains_pattern(needle));
            format!("c.{} ILIKE ${} ESCAPE E'\\\\'", column, idx)
        }
        Condition::AtLeast { column, bound } => {
            let idx = push_int(bind_params, *bound);
            format!("c.{} >= ${}", column, idx)
        }
        Condition::AtMost { column, bound } => {
            let idx = push_int(bind_params, *bound);
            format!("c.{} <= ${}", column, idx)
        }
    }
}

pub(super) fn build_group_clause(
    group: &ConditionGroup,
    bind_params: &mut Vec<BindValue>,
) -> Option<String> {
    let mut parts: Vec<String> = group
        .conditions
        .iter()
        .map(|condition| build_condition_clause(condition, bind_params))
        .collect();

    let joiner = match group.combinator {
        Combinator::All => " AND ",
        Combinator::Any => " OR ",
    };

    if parts.is_empty() {
        None
    } else if parts.len() == 1 {
        Some(parts.remove(0))
    } else {
        Some(format!("({})", parts.join(joiner)))
    }
}
