//! Test data builders for creating test problems

use mprobe_workshop::backend::{MockConstraint, MockObjective, MockProblem};
use mprobe_workshop::types::{
    ConstraintType, EmpiricalShape, FunctionShape, ObjectiveType, VariableType,
};

/// Builder for problems with a chosen mix of constraint shapes
///
/// Every constraint uses all variables and, once sampled, reports an
/// empirical shape matching its algebraic shape.
pub struct ProblemBuilder {
    name: String,
    variables: usize,
    linear: usize,
    nonlinear: usize,
    objectives: usize,
}

impl ProblemBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            variables: 2,
            linear: 0,
            nonlinear: 0,
            objectives: 0,
        }
    }

    pub fn variables(mut self, count: usize) -> Self {
        self.variables = count;
        self
    }

    pub fn linear_constraints(mut self, count: usize) -> Self {
        self.linear = count;
        self
    }

    pub fn nonlinear_constraints(mut self, count: usize) -> Self {
        self.nonlinear = count;
        self
    }

    pub fn objectives(mut self, count: usize) -> Self {
        self.objectives = count;
        self
    }

    pub fn build(self) -> MockProblem {
        let all: Vec<usize> = (0..self.variables).collect();
        let mut problem = MockProblem::new(self.name);
        for v in 0..self.variables {
            problem = problem.variable(format!("v{}", v), VariableType::Real, -1.0, 1.0);
        }
        for c in 0..self.linear {
            problem = problem.constraint(
                MockConstraint::new(format!("lin{}", c), ConstraintType::LessOrEqual, FunctionShape::Linear)
                    .variables(&all)
                    .empirical(EmpiricalShape::Linear),
            );
        }
        for c in 0..self.nonlinear {
            problem = problem.constraint(
                MockConstraint::new(format!("nl{}", c), ConstraintType::LessOrEqual, FunctionShape::Nonlinear)
                    .variables(&all)
                    .empirical(EmpiricalShape::AlmostConvex),
            );
        }
        for o in 0..self.objectives {
            problem = problem.objective(
                MockObjective::new(format!("obj{}", o), ObjectiveType::Minimize, FunctionShape::Nonlinear)
                    .variables(&all)
                    .empirical(EmpiricalShape::Convex),
            );
        }
        problem
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_problem_builder() {
        let problem = ProblemBuilder::new("mix.nl")
            .variables(3)
            .linear_constraints(2)
            .nonlinear_constraints(1)
            .build();

        assert_eq!(problem.variables.len(), 3);
        assert_eq!(problem.constraints.len(), 3);
        assert_eq!(problem.constraints[2].shape, FunctionShape::Nonlinear);
        assert_eq!(problem.constraints[0].variables, vec![0, 1, 2]);
    }
}
