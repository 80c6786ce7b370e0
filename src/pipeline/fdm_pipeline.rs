// src/pipeline/fdm_pipeline.rs

//! A finite difference pipeline on axis-aligned boxes.

use crate::kernel::{Matrix, Vector};
use crate::pipeline::{LinearSolverKind, Pipeline, ProblemSetup};
use crate::{HarnessError, HarnessResult};
use ndarray::Array3;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Dense systems above this many unknowns are refused.
pub const MAX_DENSE_UNKNOWNS: usize = 4096;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Min,
    Max,
}

/// A named face of the box: all nodes whose `axis` coordinate sits at `side`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundarySubset {
    pub name: String,
    pub axis: usize,
    pub side: Side,
}

/// Grid file contents: a box `[0, extent]` split into `cells` per axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoxDomain {
    pub extent: [f64; 3],
    pub cells: [usize; 3],
    #[serde(default)]
    pub subsets: Vec<BoundarySubset>,
}

impl BoxDomain {
    fn validate(&self) -> HarnessResult<()> {
        for axis in 0..3 {
            if !(self.extent[axis].is_finite() && self.extent[axis] > 0.0) {
                return Err(HarnessError::Pipeline(format!(
                    "extent along axis {} must be positive, got {}",
                    axis, self.extent[axis]
                )));
            }
            if self.cells[axis] == 0 {
                return Err(HarnessError::Pipeline(format!("axis {} has no cells", axis)));
            }
        }
        if let Some(bad) = self.subsets.iter().find(|s| s.axis > 2) {
            return Err(HarnessError::Pipeline(format!(
                "subset {} refers to axis {}",
                bad.name, bad.axis
            )));
        }
        self.num_nodes()?;
        Ok(())
    }

    /// Total node count, or an error when it does not fit in `usize`.
    pub fn num_nodes(&self) -> HarnessResult<usize> {
        self.cells
            .iter()
            .try_fold(1usize, |acc, &c| c.checked_add(1).and_then(|n| acc.checked_mul(n)))
            .ok_or_else(|| HarnessError::Pipeline(format!("node count of cells {:?} overflows", self.cells)))
    }

    fn subset(&self, name: &str) -> Option<&BoundarySubset> {
        self.subsets.iter().find(|s| s.name == name)
    }

    /// Nodes per axis.
    pub fn nodes(&self) -> [usize; 3] {
        [self.cells[0] + 1, self.cells[1] + 1, self.cells[2] + 1]
    }

    /// Grid spacing per axis.
    pub fn spacing(&self) -> [f64; 3] {
        [
            self.extent[0] / self.cells[0] as f64,
            self.extent[1] / self.cells[1] as f64,
            self.extent[2] / self.cells[2] as f64,
        ]
    }
}

/// Solves scalar diffusion-reaction problems with the 7-point stencil.
///
/// Nodes are numbered lexicographically, `x` fastest. Faces without a
/// Dirichlet condition mirror the neighbouring node, which makes them
/// zero-flux.
#[derive(Debug, Default)]
pub struct FdmPipeline {
    domain: Option<BoxDomain>,
    field: Option<Array3<f64>>,
}

impl FdmPipeline {
    pub fn new() -> Self {
        FdmPipeline::default()
    }

    pub fn domain(&self) -> Option<&BoxDomain> {
        self.domain.as_ref()
    }

    /// Solved field indexed `[z, y, x]`.
    pub fn field(&self) -> Option<&Array3<f64>> {
        self.field.as_ref()
    }

    fn loaded_domain(&self, operation: &str) -> HarnessResult<&BoxDomain> {
        self.domain
            .as_ref()
            .ok_or_else(|| HarnessError::Pipeline(format!("{} called before load_domain", operation)))
    }
}

impl Pipeline for FdmPipeline {
    fn name(&self) -> &'static str {
        "FdmPipeline"
    }

    fn load_domain(&mut self, grid: &Path) -> HarnessResult<()> {
        let text = fs::read_to_string(grid).map_err(|e| HarnessError::io(grid, e))?;
        let domain: BoxDomain = serde_json::from_str(&text)?;
        domain.validate()?;

        tracing::info!(grid = %grid.display(), cells = ?domain.cells, "domain loaded");
        self.domain = Some(domain);
        self.field = None;
        Ok(())
    }

    fn refine(&mut self, num_refs: usize) -> HarnessResult<()> {
        let domain = self
            .domain
            .as_mut()
            .ok_or_else(|| HarnessError::Pipeline("refine called before load_domain".to_string()))?;

        let mut cells = domain.cells;
        for _ in 0..num_refs {
            for c in cells.iter_mut() {
                *c = c
                    .checked_mul(2)
                    .ok_or_else(|| HarnessError::Pipeline("refinement overflows the cell count".to_string()))?;
            }
        }

        let refined = BoxDomain {
            cells,
            ..domain.clone()
        };
        refined.num_nodes()?;

        *domain = refined;
        self.field = None;
        tracing::info!(num_refs, cells = ?cells, "domain refined");
        Ok(())
    }

    fn assemble_and_solve(&mut self, problem: &ProblemSetup) -> HarnessResult<()> {
        let domain = self.loaded_domain("assemble_and_solve")?;

        if !(problem.solver_settings.residual_tolerance > 0.0) {
            return Err(HarnessError::Config(format!(
                "residual tolerance must be positive, got {}",
                problem.solver_settings.residual_tolerance
            )));
        }

        let num_nodes = domain.num_nodes()?;
        let [nx, ny, nz] = domain.nodes();
        if num_nodes > MAX_DENSE_UNKNOWNS {
            return Err(HarnessError::Pipeline(format!(
                "{} unknowns exceed the dense solver limit of {}",
                num_nodes, MAX_DENSE_UNKNOWNS
            )));
        }
        let index = |i: usize, j: usize, k: usize| i + nx * (j + ny * k);

        // Collect prescribed values node by node; later conditions win on shared edges.
        let mut prescribed: Vec<Option<f64>> = vec![None; num_nodes];
        for condition in &problem.dirichlet {
            let subset = domain.subset(&condition.subset).ok_or_else(|| {
                HarnessError::Pipeline(format!("unknown boundary subset {}", condition.subset))
            })?;
            let fixed = match subset.side {
                Side::Min => 0,
                Side::Max => domain.nodes()[subset.axis] - 1,
            };
            for k in 0..nz {
                for j in 0..ny {
                    for i in 0..nx {
                        if [i, j, k][subset.axis] == fixed {
                            prescribed[index(i, j, k)] = Some(condition.value);
                        }
                    }
                }
            }
        }

        let h = domain.spacing();
        let coef = [
            problem.diffusion / (h[0] * h[0]),
            problem.diffusion / (h[1] * h[1]),
            problem.diffusion / (h[2] * h[2]),
        ];
        let dims = [nx, ny, nz];

        let mut a_global = Matrix::zeros(num_nodes, num_nodes);
        let mut b_global = Vector::zeros(num_nodes);

        for k in 0..nz {
            for j in 0..ny {
                for i in 0..nx {
                    let row = index(i, j, k);
                    if let Some(value) = prescribed[row] {
                        a_global[(row, row)] = 1.0;
                        b_global[row] = value;
                        continue;
                    }

                    let pos = [i, j, k];
                    a_global[(row, row)] += problem.reaction;
                    for axis in 0..3 {
                        for step in [-1isize, 1] {
                            // Off the box, reflect to the node on the other side.
                            let target = pos[axis] as isize + step;
                            let reflected = if target < 0 || target >= dims[axis] as isize {
                                pos[axis] as isize - step
                            } else {
                                target
                            };
                            let neighbour = reflected as usize;

                            let mut npos = pos;
                            npos[axis] = neighbour;
                            let col = index(npos[0], npos[1], npos[2]);

                            a_global[(row, row)] += coef[axis];
                            a_global[(row, col)] -= coef[axis];
                        }
                    }
                }
            }
        }

        tracing::debug!(unknowns = num_nodes, "system assembled");

        let solved = match problem.solver_settings.solver {
            LinearSolverKind::Lu => a_global.clone().lu().solve(&b_global),
            LinearSolverKind::FullPivLu => a_global.clone().full_piv_lu().solve(&b_global),
        };
        let u = solved.ok_or_else(|| HarnessError::SolverFailed("system matrix is singular".to_string()))?;

        let residual = (&a_global * &u - &b_global).norm();
        let scale = b_global.norm();
        let relative = if scale > 0.0 { residual / scale } else { residual };
        if !(relative <= problem.solver_settings.residual_tolerance) {
            return Err(HarnessError::SolverFailed(format!(
                "relative residual {:e} above tolerance {:e}",
                relative, problem.solver_settings.residual_tolerance
            )));
        }
        tracing::info!(unknowns = num_nodes, residual = relative, "system solved");

        let field = Array3::from_shape_vec((nz, ny, nx), u.iter().copied().collect())
            .map_err(|e| HarnessError::Pipeline(e.to_string()))?;
        self.field = Some(field);
        Ok(())
    }

    fn solution(&self) -> HarnessResult<Vec<f64>> {
        let field = self.field.as_ref().ok_or_else(|| {
            HarnessError::Pipeline("solution requested before assemble_and_solve".to_string())
        })?;
        Ok(field.iter().copied().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{DirichletCondition, SolverSettings};
    use approx::assert_abs_diff_eq;
    use std::path::PathBuf;

    fn write_grid(dir: &Path, json: &str) -> PathBuf {
        let path = dir.join("grid.json");
        fs::write(&path, json).expect("grid should be written");
        path
    }

    const BOX_GRID: &str = r#"{
        "extent": [1.0, 1.0, 1.0],
        "cells": [2, 1, 1],
        "subsets": [
            { "name": "bndNegative", "axis": 0, "side": "min" },
            { "name": "bndPositive", "axis": 0, "side": "max" }
        ]
    }"#;

    fn laplace_problem(reaction: f64) -> ProblemSetup {
        ProblemSetup {
            diffusion: 1.0,
            reaction,
            dirichlet: vec![
                DirichletCondition::new(-1.0, "bndNegative"),
                DirichletCondition::new(1.0, "bndPositive"),
            ],
            solver_settings: SolverSettings::default(),
        }
    }

    #[test]
    fn test_linear_profile_between_opposite_faces() {
        let dir = tempfile::tempdir().expect("tempdir should build");
        let mut pipeline = FdmPipeline::new();
        pipeline.load_domain(&write_grid(dir.path(), BOX_GRID)).unwrap();
        pipeline.refine(2).unwrap();
        assert_eq!(pipeline.domain().unwrap().cells, [8, 4, 4]);

        pipeline.assemble_and_solve(&laplace_problem(0.0)).unwrap();
        let solution = pipeline.solution().unwrap();
        assert_eq!(solution.len(), 9 * 5 * 5);

        // u(x) = -1 + 2x solves the problem exactly, so the stencil reproduces it.
        for (node, value) in solution.iter().enumerate() {
            let i = node % 9;
            assert_abs_diff_eq!(*value, -1.0 + 0.25 * i as f64, epsilon = 1e-10);
        }
    }

    #[test]
    fn test_reaction_keeps_antisymmetry() {
        let dir = tempfile::tempdir().expect("tempdir should build");
        let mut pipeline = FdmPipeline::new();
        pipeline.load_domain(&write_grid(dir.path(), BOX_GRID)).unwrap();
        pipeline.refine(1).unwrap();

        let mut problem = laplace_problem(10.0);
        problem.solver_settings.solver = LinearSolverKind::FullPivLu;
        pipeline.assemble_and_solve(&problem).unwrap();

        let field = pipeline.field().unwrap();
        assert_eq!(field.shape(), &[3, 3, 5]);
        assert_abs_diff_eq!(field[[1, 1, 2]], 0.0, epsilon = 1e-10);
        assert_abs_diff_eq!(field[[1, 1, 1]], -field[[1, 1, 3]], epsilon = 1e-10);
        // Reaction pulls the interior below the linear profile's magnitude.
        assert!(field[[1, 1, 3]] > 0.0 && field[[1, 1, 3]] < 0.5);
    }

    #[test]
    fn test_operations_out_of_order_are_rejected() {
        let mut pipeline = FdmPipeline::new();
        assert!(matches!(pipeline.refine(1), Err(HarnessError::Pipeline(_))));
        assert!(matches!(
            pipeline.assemble_and_solve(&laplace_problem(0.0)),
            Err(HarnessError::Pipeline(_))
        ));
        assert!(matches!(pipeline.solution(), Err(HarnessError::Pipeline(_))));
    }

    #[test]
    fn test_unknown_subset_is_rejected() {
        let dir = tempfile::tempdir().expect("tempdir should build");
        let mut pipeline = FdmPipeline::new();
        pipeline.load_domain(&write_grid(dir.path(), BOX_GRID)).unwrap();

        let mut problem = laplace_problem(0.0);
        problem.dirichlet.push(DirichletCondition::new(0.0, "bndTop"));
        match pipeline.assemble_and_solve(&problem) {
            Err(HarnessError::Pipeline(msg)) => assert!(msg.contains("bndTop")),
            other => panic!("expected a pipeline error, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_grid_files() {
        let dir = tempfile::tempdir().expect("tempdir should build");
        let mut pipeline = FdmPipeline::new();

        let no_cells = write_grid(dir.path(), r#"{ "extent": [1.0, 1.0, 1.0], "cells": [0, 1, 1] }"#);
        assert!(matches!(pipeline.load_domain(&no_cells), Err(HarnessError::Pipeline(_))));

        let not_json = write_grid(dir.path(), "cells = 3");
        assert!(matches!(pipeline.load_domain(&not_json), Err(HarnessError::Json(_))));

        let missing = dir.path().join("missing.json");
        assert!(matches!(pipeline.load_domain(&missing), Err(HarnessError::Io { .. })));
    }

    #[test]
    fn test_overflowing_cell_counts_are_rejected() {
        let dir = tempfile::tempdir().expect("tempdir should build");
        let mut pipeline = FdmPipeline::new();

        let huge = write_grid(
            dir.path(),
            r#"{ "extent": [1.0, 1.0, 1.0], "cells": [4294967296, 4294967296, 1] }"#,
        );
        match pipeline.load_domain(&huge) {
            Err(HarnessError::Pipeline(msg)) => assert!(msg.contains("overflows")),
            other => panic!("expected an overflow error, got {:?}", other),
        }

        let max = write_grid(
            dir.path(),
            &format!(r#"{{ "extent": [1.0, 1.0, 1.0], "cells": [{}, 1, 1] }}"#, usize::MAX),
        );
        assert!(matches!(pipeline.load_domain(&max), Err(HarnessError::Pipeline(_))));

        // Each axis fits on its own, the product does not once refined.
        let wide = write_grid(
            dir.path(),
            r#"{ "extent": [1.0, 1.0, 1.0], "cells": [65536, 65536, 65536] }"#,
        );
        pipeline.load_domain(&wide).unwrap();
        assert!(matches!(pipeline.refine(8), Err(HarnessError::Pipeline(_))));
        assert_eq!(pipeline.domain().unwrap().cells, [65536, 65536, 65536]);

        let direct = BoxDomain {
            extent: [1.0; 3],
            cells: [usize::MAX, 1, 1],
            subsets: Vec::new(),
        };
        assert!(direct.num_nodes().is_err());
    }

    #[test]
    fn test_refuses_oversized_dense_system() {
        let dir = tempfile::tempdir().expect("tempdir should build");
        let mut pipeline = FdmPipeline::new();
        pipeline.load_domain(&write_grid(dir.path(), BOX_GRID)).unwrap();
        pipeline.refine(4).unwrap();

        match pipeline.assemble_and_solve(&laplace_problem(0.0)) {
            Err(HarnessError::Pipeline(msg)) => assert!(msg.contains("dense solver limit")),
            other => panic!("expected a size error, got {:?}", other),
        }
    }
}
