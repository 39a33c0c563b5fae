//! Drives the locality experiments: reorder a graph every supported way and
//! replay a kernel's memory accesses against a fresh cache for each ordering.

use crate::cache::CacheModel;
use crate::config::Params;
use crate::degree::degree_order;
use crate::error::Result;
use crate::graph::{CSRGraph, Graph};
use crate::lpn::{Neighborhood, Selection};
use crate::permutation::Permutation;
use crate::spmv::spmv_hit_rate;
use crate::tc::TriangleView;
use crate::timer::ScopedTimer;
use rand::Rng;
use std::fmt;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Reordering {
    Input,
    Degrees,
    FreqLabelProp,
    DbFreqLabelProp,
    MinLabelProp,
    DbMinLabelProp,
}

impl Reordering {
    /// Every ordering that actually moves vertices.
    pub const ALL: [Reordering; 5] = [
        Reordering::Degrees,
        Reordering::FreqLabelProp,
        Reordering::DbFreqLabelProp,
        Reordering::MinLabelProp,
        Reordering::DbMinLabelProp,
    ];

    pub fn label_rule(self) -> Option<(Selection, Neighborhood)> {
        match self {
            Reordering::FreqLabelProp => Some((Selection::MaxFrequency, Neighborhood::All)),
            Reordering::DbFreqLabelProp => {
                Some((Selection::MaxFrequency, Neighborhood::DegreeBucketed))
            }
            Reordering::MinLabelProp => Some((Selection::MinLabel, Neighborhood::All)),
            Reordering::DbMinLabelProp => Some((Selection::MinLabel, Neighborhood::DegreeBucketed)),
            Reordering::Input | Reordering::Degrees => None,
        }
    }

    /// `perm[v]` is the new position of `v` under this ordering.
    pub fn compute<R: Rng>(self, graph: &Graph, params: &Params, rng: &mut R) -> Result<Permutation> {
        match (self, self.label_rule()) {
            (_, Some((selection, neighborhood))) => {
                params.propagator(selection, neighborhood)?.order(graph, rng)
            }
            (Reordering::Degrees, None) => Ok(degree_order(graph)),
            _ => Ok(Permutation::identity(graph.num_nodes())),
        }
    }
}

impl fmt::Display for Reordering {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Reordering::Input => "Input",
            Reordering::Degrees => "Degrees",
            Reordering::FreqLabelProp => "FreqLabelPropN",
            Reordering::DbFreqLabelProp => "DBFreqLabelPropN",
            Reordering::MinLabelProp => "MinLabelPropN",
            Reordering::DbMinLabelProp => "DBMinLabelPropN",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct KernelReport {
    pub ordering: Reordering,
    pub hit_rate: f64,
    /// Only set by the triangle-counting experiment
    pub triangles: Option<u64>,
}

/// SPMV hit rate of the input graph and of every reordering of it.
pub fn run_spmv<R: Rng>(graph: &Graph, params: &Params, rng: &mut R) -> Result<Vec<KernelReport>> {
    params.validate()?;
    graph.log_stats();

    let mut reports = Vec::with_capacity(Reordering::ALL.len() + 1);
    let mut input = graph.clone();
    if !params.nosort {
        input.sort_adjacencies();
    }
    reports.push(KernelReport {
        ordering: Reordering::Input,
        hit_rate: spmv_hit_rate(&input, &mut params.cache()?)?,
        triangles: None,
    });

    for &ordering in Reordering::ALL.iter() {
        let mut timer = ScopedTimer::new(&format!("{} spmv", ordering));
        timer.checkpoint("reorder");
        let perm = ordering.compute(graph, params, rng)?;
        let mut pgraph = graph.reorder(&perm)?;
        if !params.nosort {
            pgraph.sort_adjacencies();
        }
        timer.elapsed_since_checkpoint();

        timer.checkpoint("replay");
        let hit_rate = spmv_hit_rate(&pgraph, &mut params.cache()?)?;
        timer.elapsed_since_checkpoint();
        reports.push(KernelReport {
            ordering,
            hit_rate,
            triangles: None,
        });
    }

    for r in &reports {
        info!(ordering = %r.ordering, hit_rate = r.hit_rate, "SPMV");
    }
    Ok(reports)
}

/// Triangle-counting hit rate for every ordering.
///
/// The graph is first renumbered by increasing degree. The degree ordering is
/// then measured by visiting vertices in id order, and each label-propagation
/// ordering by visiting the degree-ordered graph in its own sequence. Rows are
/// always sorted here, whatever `params.nosort` says.
pub fn run_tc<R: Rng>(graph: &Graph, params: &Params, rng: &mut R) -> Result<Vec<KernelReport>> {
    params.validate()?;
    graph.log_stats();

    let mut pgraph = graph.reorder(&degree_order(graph))?;
    pgraph.sort_adjacencies();

    let mut reports: Vec<KernelReport> = Vec::with_capacity(Reordering::ALL.len());
    for &ordering in Reordering::ALL.iter() {
        let mut timer = ScopedTimer::new(&format!("{} tc", ordering));
        timer.checkpoint("reorder");
        let visit = match ordering {
            Reordering::Degrees => Permutation::identity(pgraph.num_nodes()),
            _ => ordering.compute(&pgraph, params, rng)?,
        };
        timer.elapsed_since_checkpoint();

        timer.checkpoint("count");
        let view = TriangleView::new(pgraph.clone())?;
        let mut cache = params.cache()?;
        let triangles = view.count(&visit, &mut cache)?;
        timer.elapsed_since_checkpoint();
        let hit_rate = cache.hit_rate();
        info!(ordering = %ordering, hit_rate, triangles, "TC");

        if let Some(first) = reports.first().and_then(|r| r.triangles) {
            if first != triangles {
                warn!(ordering = %ordering, triangles, expected = first, "triangle counts disagree");
            }
        }
        reports.push(KernelReport {
            ordering,
            hit_rate,
            triangles: Some(triangles),
        });
    }

    Ok(reports)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::BuilderBase;
    use crate::generator::Generator;
    use crate::tc::brute_force_count;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn small_graph() -> Graph {
        let edges = Generator::new(6, 4).with_seed(5).generate_edge_list();
        BuilderBase::new().make_graph_from_edge_list(&edges).unwrap()
    }

    #[test]
    fn names() {
        assert_eq!(Reordering::DbFreqLabelProp.to_string(), "DBFreqLabelPropN");
        assert_eq!(Reordering::Degrees.to_string(), "Degrees");
        assert!(Reordering::Degrees.label_rule().is_none());
    }

    #[test]
    fn tc_counts_agree_across_orderings() {
        let g = small_graph();
        let expected = brute_force_count(&g);
        let mut rng = StdRng::seed_from_u64(1);
        let reports = run_tc(&g, &Params::default(), &mut rng).unwrap();
        assert_eq!(reports.len(), 5);
        for r in &reports {
            assert_eq!(r.triangles, Some(expected));
            assert!(r.hit_rate >= 0.0 && r.hit_rate <= 1.0);
        }
    }

    #[test]
    fn spmv_reports_every_ordering() {
        let g = small_graph();
        let mut rng = StdRng::seed_from_u64(1);
        let params = Params {
            niter: 3,
            ..Params::default()
        };
        let reports = run_spmv(&g, &params, &mut rng).unwrap();
        assert_eq!(reports.len(), 6);
        assert_eq!(reports[0].ordering, Reordering::Input);
        assert!(reports.iter().all(|r| r.triangles.is_none()));
    }

    #[test]
    fn invalid_params_stop_the_run() {
        let g = small_graph();
        let mut rng = StdRng::seed_from_u64(1);
        let params = Params {
            niter: -1,
            ..Params::default()
        };
        assert!(run_tc(&g, &params, &mut rng).is_err());
        assert!(run_spmv(&g, &params, &mut rng).is_err());
    }

    #[test]
    fn compute_matches_direct_calls() {
        let g = small_graph();
        let params = Params::default();
        let mut rng = StdRng::seed_from_u64(1);
        assert!(Reordering::Input
            .compute(&g, &params, &mut rng)
            .unwrap()
            .is_identity());
        assert_eq!(
            Reordering::Degrees.compute(&g, &params, &mut rng).unwrap(),
            degree_order(&g)
        );
    }
}
