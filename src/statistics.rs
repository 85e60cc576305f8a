//! Problem statistics
//!
//! Counts of variables by type, objectives by algebraic shape, constraints by
//! shape and constraint type, and non-zero counts. Entities whose queries fail
//! are logged and skipped, so one bad index never hides the whole summary.

use crate::backend::ProblemBackend;
use crate::error::Result;
use crate::types::{ConstraintType, FunctionKind, FunctionShape, VariableType};
use std::fmt;

/// Variables referenced by one function, by type
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VariableCounts {
    pub total: usize,
    pub real: usize,
    pub integer: usize,
    pub binary: usize,
}

impl VariableCounts {
    /// Count the variables in `variables` by type
    pub fn of(problem: &dyn ProblemBackend, variables: &[usize]) -> Result<Self> {
        let mut counts = VariableCounts::default();
        for &v in variables {
            counts.add(problem.variable_type(v)?);
        }
        Ok(counts)
    }

    fn add(&mut self, ty: VariableType) {
        self.total += 1;
        match ty {
            VariableType::Real => self.real += 1,
            VariableType::Integer => self.integer += 1,
            VariableType::Binary => self.binary += 1,
        }
    }

    /// Integer and binary variables together
    pub fn discrete(&self) -> usize {
        self.integer + self.binary
    }
}

/// Constraints of one algebraic shape, split by constraint type
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConstraintShapeCounts {
    pub total: usize,
    pub inequality: usize,
    pub range: usize,
    pub equality: usize,
}

impl ConstraintShapeCounts {
    fn add(&mut self, ty: ConstraintType) {
        self.total += 1;
        match ty {
            ConstraintType::Range => self.range += 1,
            ConstraintType::Equality => self.equality += 1,
            ConstraintType::LessOrEqual | ConstraintType::GreaterOrEqual => self.inequality += 1,
            ConstraintType::Unconstraining => {}
        }
    }
}

/// Summary of a loaded problem
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProblemStatistics {
    pub instance_name: String,
    pub variables: VariableCounts,
    pub objectives: usize,
    pub linear_objectives: usize,
    pub quadratic_objectives: usize,
    pub nonlinear_objectives: usize,
    pub constraints: usize,
    pub linear_constraints: ConstraintShapeCounts,
    pub quadratic_constraints: ConstraintShapeCounts,
    pub nonlinear_constraints: ConstraintShapeCounts,
    /// Variable references summed over all objectives
    pub objective_nonzeros: usize,
    /// Variable references summed over all constraints
    pub constraint_nonzeros: usize,
}

impl ProblemStatistics {
    /// Collect statistics from a problem
    ///
    /// Fails only when the entity counts cannot be read.
    pub fn collect(problem: &dyn ProblemBackend) -> Result<Self> {
        let mut stats = ProblemStatistics {
            instance_name: problem.instance_name().unwrap_or_default(),
            ..Default::default()
        };

        for v in 0..problem.variable_count()? {
            match problem.variable_type(v) {
                Ok(ty) => stats.variables.add(ty),
                Err(e) => {
                    stats.variables.total += 1;
                    tracing::warn!("Skipping type of variable {}: {}", v, e);
                }
            }
        }

        stats.objectives = problem.objective_count()?;
        for o in 0..stats.objectives {
            match problem.function_shape(FunctionKind::Objective, o) {
                Ok(FunctionShape::Linear) => stats.linear_objectives += 1,
                Ok(FunctionShape::Quadratic) => stats.quadratic_objectives += 1,
                Ok(FunctionShape::Nonlinear) => stats.nonlinear_objectives += 1,
                Err(e) => tracing::warn!("Skipping shape of objective {}: {}", o, e),
            }
            match problem.objective_variables(o) {
                Ok(vars) => stats.objective_nonzeros += vars.len(),
                Err(e) => tracing::warn!("Skipping variables of objective {}: {}", o, e),
            }
        }

        stats.constraints = problem.constraint_count()?;
        for c in 0..stats.constraints {
            let classified = problem
                .function_shape(FunctionKind::Constraint, c)
                .and_then(|shape| Ok((shape, problem.constraint_type(c)?)));
            match classified {
                Ok((shape, ty)) => stats.shape_counts_mut(shape).add(ty),
                Err(e) => tracing::warn!("Skipping shape of constraint {}: {}", c, e),
            }
            match problem.constraint_variables(c) {
                Ok(vars) => stats.constraint_nonzeros += vars.len(),
                Err(e) => tracing::warn!("Skipping variables of constraint {}: {}", c, e),
            }
        }

        Ok(stats)
    }

    fn shape_counts_mut(&mut self, shape: FunctionShape) -> &mut ConstraintShapeCounts {
        match shape {
            FunctionShape::Linear => &mut self.linear_constraints,
            FunctionShape::Quadratic => &mut self.quadratic_constraints,
            FunctionShape::Nonlinear => &mut self.nonlinear_constraints,
        }
    }

    pub fn constraints_of_shape(&self, shape: FunctionShape) -> &ConstraintShapeCounts {
        match shape {
            FunctionShape::Linear => &self.linear_constraints,
            FunctionShape::Quadratic => &self.quadratic_constraints,
            FunctionShape::Nonlinear => &self.nonlinear_constraints,
        }
    }

    /// Window title in the form `Statistics: <instance>`
    pub fn title(&self) -> String {
        if self.instance_name.is_empty() {
            "Statistics".to_string()
        } else {
            format!("Statistics: {}", self.instance_name)
        }
    }
}

impl fmt::Display for ProblemStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.title())?;
        writeln!(
            f,
            "Variables: {} (real {}, binary {}, integer {})",
            self.variables.total, self.variables.real, self.variables.binary, self.variables.integer
        )?;
        writeln!(
            f,
            "Objectives: {} (linear {}, quadratic {}, nonlinear {}), non-zeros {}",
            self.objectives,
            self.linear_objectives,
            self.quadratic_objectives,
            self.nonlinear_objectives,
            self.objective_nonzeros
        )?;
        writeln!(f, "Constraints: {}, non-zeros {}", self.constraints, self.constraint_nonzeros)?;
        for shape in FunctionShape::ALL {
            let counts = self.constraints_of_shape(shape);
            writeln!(
                f,
                "  {}: {} (inequality {}, range {}, equality {})",
                shape, counts.total, counts.inequality, counts.range, counts.equality
            )?;
        }
        Ok(())
    }
}


#[cfg(test)]
mod backend_mock_tests {
    use super::*;
    use crate::backend::library_trait::MockProblemBackend;
    use crate::error::WorkshopError;
    use mockall::predicate::eq;

    fn library_error() -> WorkshopError {
        WorkshopError::Library("query failed".to_string())
    }

    #[test]
    fn test_variable_counts_query_each_variable_once() {
        let mut problem = MockProblemBackend::new();
        problem
            .expect_variable_type()
            .with(eq(0))
            .times(1)
            .returning(|_| Ok(VariableType::Binary));
        problem
            .expect_variable_type()
            .with(eq(4))
            .times(1)
            .returning(|_| Ok(VariableType::Integer));

        let counts = VariableCounts::of(&problem, &[0, 4]).unwrap();
        assert_eq!(counts.total, 2);
        assert_eq!(counts.discrete(), 2);
    }

    #[test]
    fn test_failed_queries_are_skipped() {
        let mut problem = MockProblemBackend::new();
        problem
            .expect_instance_name()
            .returning(|| Err(library_error()));
        problem.expect_variable_count().returning(|| Ok(2));
        problem
            .expect_variable_type()
            .with(eq(0))
            .returning(|_| Ok(VariableType::Real));
        problem
            .expect_variable_type()
            .with(eq(1))
            .returning(|_| Err(library_error()));
        problem.expect_objective_count().returning(|| Ok(0));
        problem.expect_constraint_count().returning(|| Ok(2));
        problem
            .expect_function_shape()
            .with(eq(FunctionKind::Constraint), eq(0))
            .returning(|_, _| Ok(FunctionShape::Linear));
        problem
            .expect_function_shape()
            .with(eq(FunctionKind::Constraint), eq(1))
            .returning(|_, _| Err(library_error()));
        problem
            .expect_constraint_type()
            .returning(|_| Ok(ConstraintType::Equality));
        problem
            .expect_constraint_variables()
            .with(eq(0))
            .returning(|_| Ok(vec![0, 1]));
        problem
            .expect_constraint_variables()
            .with(eq(1))
            .returning(|_| Err(library_error()));

        let stats = ProblemStatistics::collect(&problem).unwrap();
        assert_eq!(stats.title(), "Statistics");
        assert_eq!(stats.variables.total, 2);
        assert_eq!(stats.variables.real, 1);
        assert_eq!(stats.constraints, 2);
        assert_eq!(stats.linear_constraints.equality, 1);
        assert_eq!(stats.constraint_nonzeros, 2);
    }

    #[test]
    fn test_count_failure_is_returned() {
        let mut problem = MockProblemBackend::new();
        problem
            .expect_instance_name()
            .returning(|| Ok("broken".to_string()));
        problem
            .expect_variable_count()
            .returning(|| Err(library_error()));

        assert!(matches!(
            ProblemStatistics::collect(&problem),
            Err(WorkshopError::Library(_))
        ));
    }
}
