//! Named filters offered by each workshop

use crate::table::{ConstraintColumn, EntityKind, ObjectiveColumn, VariableColumn};
use crate::types::{EmpiricalShape, FunctionShape, VariableType};

use super::predicate::RowPredicate;

/// A filter the user can pick by name
#[derive(Debug, Clone, PartialEq)]
pub struct NamedFilter {
    pub name: &'static str,
    pub predicate: RowPredicate,
}

impl NamedFilter {
    fn new(name: &'static str, predicate: RowPredicate) -> Self {
        Self { name, predicate }
    }
}

const EMPIRICAL_PRESETS: [EmpiricalShape; 3] = [
    EmpiricalShape::AlmostConvex,
    EmpiricalShape::AlmostConcave,
    EmpiricalShape::ConvexAndConcave,
];

/// Named filters for a workshop, `All` first
pub fn presets(kind: EntityKind) -> Vec<NamedFilter> {
    let mut filters = vec![NamedFilter::new("All", RowPredicate::All)];
    match kind {
        EntityKind::Variable => {
            let column = VariableColumn::Type.index();
            filters.extend(VariableType::ALL.into_iter().map(|ty| {
                NamedFilter::new(variable_type_name(ty), RowPredicate::equals(column, ty))
            }));
        }
        EntityKind::Constraint => function_presets(
            &mut filters,
            ConstraintColumn::AlgebraicShape.index(),
            ConstraintColumn::EmpiricalShape.index(),
        ),
        EntityKind::Objective => function_presets(
            &mut filters,
            ObjectiveColumn::AlgebraicShape.index(),
            ObjectiveColumn::EmpiricalShape.index(),
        ),
    }
    filters
}

fn function_presets(filters: &mut Vec<NamedFilter>, algebraic: usize, empirical: usize) {
    for shape in FunctionShape::ALL {
        filters.push(NamedFilter::new(
            function_shape_name(shape),
            RowPredicate::equals(algebraic, shape),
        ));
    }
    for shape in EMPIRICAL_PRESETS {
        filters.push(NamedFilter::new(
            empirical_shape_name(shape),
            RowPredicate::equals(empirical, shape),
        ));
    }
}

/// Look a preset up by name, ignoring ASCII case
pub fn preset(kind: EntityKind, name: &str) -> Option<RowPredicate> {
    presets(kind)
        .into_iter()
        .find(|f| f.name.eq_ignore_ascii_case(name))
        .map(|f| f.predicate)
}

fn variable_type_name(ty: VariableType) -> &'static str {
    match ty {
        VariableType::Real => "Real",
        VariableType::Integer => "Integer",
        VariableType::Binary => "Binary",
    }
}

fn function_shape_name(shape: FunctionShape) -> &'static str {
    match shape {
        FunctionShape::Linear => "Linear",
        FunctionShape::Quadratic => "Quadratic",
        FunctionShape::Nonlinear => "Nonlinear",
    }
}

fn empirical_shape_name(shape: EmpiricalShape) -> &'static str {
    match shape {
        EmpiricalShape::AlmostConvex => "Almost convex",
        EmpiricalShape::AlmostConcave => "Almost concave",
        _ => "Convex and concave",
    }
}
