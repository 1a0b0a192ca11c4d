//! Dependency closure engine.
//!
//! What a package needs to build from source is its direct build
//! dependencies plus everything those dependencies need at run time,
//! transitively. Build dependencies of build dependencies are not included:
//! they are satisfied when that dependency itself is built.
//!
//! Names that are not catalog keys are treated as provided by the base
//! system and dropped at every level of the traversal.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::str::FromStr;

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::{Dfs, EdgeFiltered, EdgeRef};
use serde::{Deserialize, Serialize};

use crate::core::naming::NamingRule;
use crate::resolver::tables::DependencyTables;

/// Canonical package name → canonical names of its dependencies.
pub type DependencyMap = BTreeMap<String, BTreeSet<String>>;

/// Which dependencies make up a package's set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ClosureMode {
    /// Direct build dependencies plus their recursive runtime closure
    #[default]
    BuildClosure,
    /// Direct build and runtime dependencies only
    Direct,
}

impl FromStr for ClosureMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "build-closure" => Ok(ClosureMode::BuildClosure),
            "direct" => Ok(ClosureMode::Direct),
            _ => Err(format!(
                "invalid closure mode '{}'; expected 'build-closure' or 'direct'",
                s
            )),
        }
    }
}

impl fmt::Display for ClosureMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClosureMode::BuildClosure => write!(f, "build-closure"),
            ClosureMode::Direct => write!(f, "direct"),
        }
    }
}

/// Options for [`compute_closure`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ClosureOptions {
    pub mode: ClosureMode,

    /// Drop a package from its own dependency set
    pub prune_self: bool,
}

/// Kind of a declared dependency edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EdgeKind {
    Build,
    Runtime,
}

/// Declared dependencies between catalog keys.
///
/// Edges only connect catalog keys; names outside the catalog never become
/// nodes.
#[derive(Debug, Clone)]
pub struct DependencyGraph {
    graph: DiGraph<String, EdgeKind>,
    nodes: HashMap<String, NodeIndex>,
}

impl DependencyGraph {
    pub fn from_tables(tables: &DependencyTables) -> Self {
        let mut graph = DiGraph::new();
        let mut nodes = HashMap::new();

        for key in tables.keys() {
            let node = graph.add_node(key.to_string());
            nodes.insert(key.to_string(), node);
        }

        let mut edges = BTreeSet::new();
        for key in tables.keys() {
            let from = nodes[key];
            let declared = tables
                .build_dependencies(key)
                .iter()
                .map(|d| (d, EdgeKind::Build))
                .chain(
                    tables
                        .runtime_dependencies(key)
                        .iter()
                        .map(|d| (d, EdgeKind::Runtime)),
                );

            for (dep, kind) in declared {
                match nodes.get(dep.as_str()) {
                    Some(&to) => {
                        edges.insert((from, to, kind));
                    }
                    None => tracing::trace!("`{}` depends on `{}`, not in catalog", key, dep),
                }
            }
        }

        for (from, to, kind) in edges {
            graph.add_edge(from, to, kind);
        }

        DependencyGraph { graph, nodes }
    }

    fn node(&self, key: &str) -> Option<NodeIndex> {
        self.nodes.get(key).copied()
    }

    fn key(&self, node: NodeIndex) -> &str {
        &self.graph[node]
    }

    fn direct(&self, node: NodeIndex, kind: EdgeKind) -> BTreeSet<NodeIndex> {
        self.graph
            .edges(node)
            .filter(|e| *e.weight() == kind)
            .map(|e| e.target())
            .collect()
    }

    /// Every key reachable from `starts` over zero or more runtime edges.
    ///
    /// The visited set is shared across all start nodes, so cycles and
    /// diamonds are each walked once.
    fn runtime_reachable(&self, starts: &BTreeSet<NodeIndex>) -> BTreeSet<NodeIndex> {
        let runtime = EdgeFiltered::from_fn(&self.graph, |e| *e.weight() == EdgeKind::Runtime);
        let mut dfs = Dfs::empty(&runtime);
        let mut reached = BTreeSet::new();

        for &start in starts {
            dfs.move_to(start);
            while let Some(node) = dfs.next(&runtime) {
                reached.insert(node);
            }
        }

        reached
    }

    /// Catalog keys `key` needs, according to `mode`.
    pub fn dependencies_of(&self, key: &str, mode: ClosureMode) -> BTreeSet<&str> {
        let Some(node) = self.node(key) else {
            return BTreeSet::new();
        };

        let build = self.direct(node, EdgeKind::Build);
        let members = match mode {
            ClosureMode::BuildClosure => self.runtime_reachable(&build),
            ClosureMode::Direct => {
                let mut members = build;
                members.extend(self.direct(node, EdgeKind::Runtime));
                members
            }
        };

        members.into_iter().map(|n| self.key(n)).collect()
    }
}

/// Compute every package's dependency set.
///
/// Keys and members are rendered through `tables`' canonical names; members
/// are then passed through `naming` once more.
pub fn compute_closure(
    tables: &DependencyTables,
    naming: &dyn NamingRule,
    options: &ClosureOptions,
) -> DependencyMap {
    let graph = DependencyGraph::from_tables(tables);
    let mut result = DependencyMap::new();

    for key in tables.keys() {
        let Some(canonical) = tables.canonical(key) else {
            continue;
        };

        let mut members = graph.dependencies_of(key, options.mode);
        if members.contains(key) {
            if options.prune_self {
                tracing::warn!("`{}` depends on itself, pruning this dependency", key);
                members.remove(key);
            } else {
                tracing::debug!("`{}` depends on itself", key);
            }
        }

        let deps: BTreeSet<String> = members
            .into_iter()
            .filter_map(|d| tables.canonical(d))
            .map(|d| naming.package_name(d))
            .collect();

        tracing::debug!("{}: {} dependencies", canonical, deps.len());
        result.entry(canonical.to_string()).or_default().extend(deps);
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Identity naming so tests read in catalog keys.
    struct Plain;

    impl NamingRule for Plain {
        fn package_name(&self, name: &str) -> String {
            name.to_string()
        }
    }

    fn tables(entries: &[(&str, &[&str], &[&str])]) -> DependencyTables {
        let mut tables = DependencyTables::new();
        for (key, build, run) in entries {
            tables.insert(
                *key,
                *key,
                build.iter().map(|s| s.to_string()).collect(),
                run.iter().map(|s| s.to_string()).collect(),
            );
        }
        tables
    }

    fn set(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_build_deps_plus_runtime_closure() {
        // P is a placeholder with no deps
        let t = tables(&[("P", &[], &[]), ("Q", &[], &["P"]), ("R", &["Q"], &[])]);
        let result = compute_closure(&t, &Plain, &ClosureOptions::default());

        assert_eq!(result["R"], set(&["Q", "P"]));
        assert_eq!(result["Q"], set(&[]));
        assert_eq!(result["P"], set(&[]));
    }

    #[test]
    fn test_runtime_closure_is_transitive() {
        let t = tables(&[
            ("app", &["lib"], &["runtime_only"]),
            ("lib", &["lib_build"], &["a"]),
            ("a", &[], &["b"]),
            ("b", &[], &["c"]),
            ("c", &[], &[]),
            ("lib_build", &[], &[]),
            ("runtime_only", &[], &[]),
        ]);
        let result = compute_closure(&t, &Plain, &ClosureOptions::default());

        // build deps of build deps and own runtime deps are not included
        assert_eq!(result["app"], set(&["lib", "a", "b", "c"]));
    }

    #[test]
    fn test_unknown_names_dropped_everywhere() {
        let t = tables(&[
            ("app", &["lib", "cmake"], &[]),
            ("lib", &[], &["boost", "util"]),
            ("util", &[], &["libc"]),
        ]);
        let result = compute_closure(&t, &Plain, &ClosureOptions::default());

        assert_eq!(result["app"], set(&["lib", "util"]));
        for deps in result.values() {
            for unknown in ["cmake", "boost", "libc"] {
                assert!(!deps.contains(unknown));
            }
        }
    }

    #[test]
    fn test_runtime_cycle_terminates() {
        let t = tables(&[("A", &[], &["B"]), ("B", &[], &["A"]), ("C", &["A"], &[])]);
        let result = compute_closure(&t, &Plain, &ClosureOptions::default());

        assert_eq!(result["C"], set(&["A", "B"]));
        assert!(result["A"].is_empty());
    }

    #[test]
    fn test_self_dependency_through_cycle() {
        let t = tables(&[("A", &["B"], &[]), ("B", &[], &["A"])]);

        let kept = compute_closure(&t, &Plain, &ClosureOptions::default());
        assert_eq!(kept["A"], set(&["A", "B"]));

        let options = ClosureOptions {
            prune_self: true,
            ..Default::default()
        };
        let pruned = compute_closure(&t, &Plain, &options);
        assert_eq!(pruned["A"], set(&["B"]));
    }

    #[test]
    fn test_direct_mode() {
        let t = tables(&[
            ("app", &["lib"], &["rt"]),
            ("lib", &[], &["a"]),
            ("rt", &[], &[]),
            ("a", &[], &[]),
        ]);
        let options = ClosureOptions {
            mode: ClosureMode::Direct,
            ..Default::default()
        };
        let result = compute_closure(&t, &Plain, &options);
        assert_eq!(result["app"], set(&["lib", "rt"]));
    }

    #[test]
    fn test_members_are_renamed_again() {
        struct Prefix;
        impl NamingRule for Prefix {
            fn package_name(&self, name: &str) -> String {
                format!("x-{}", name)
            }
        }

        let mut t = DependencyTables::new();
        t.insert("app", "x-app", vec!["lib".to_string()], vec![]);
        t.insert("lib", "x-lib", vec![], vec![]);

        let result = compute_closure(&t, &Prefix, &ClosureOptions::default());
        assert_eq!(result["x-app"], set(&["x-x-lib"]));
    }

    #[test]
    fn test_closure_is_idempotent() {
        let t = tables(&[
            ("a", &["b", "c"], &[]),
            ("b", &[], &["c", "d"]),
            ("c", &[], &["b"]),
            ("d", &[], &[]),
        ]);
        let options = ClosureOptions::default();
        let first = compute_closure(&t, &Plain, &options);
        let second = compute_closure(&t, &Plain, &options);
        assert_eq!(first, second);
        assert_eq!(first["a"], set(&["b", "c", "d"]));
    }

    #[test]
    fn test_graph_queries() {
        let t = tables(&[("a", &["b", "zz"], &[]), ("b", &[], &[])]);
        let graph = DependencyGraph::from_tables(&t);
        assert_eq!(
            graph.dependencies_of("a", ClosureMode::Direct),
            BTreeSet::from(["b"])
        );
        assert!(graph.dependencies_of("missing", ClosureMode::BuildClosure).is_empty());
    }

    #[test]
    fn test_parse_mode() {
        assert_eq!("direct".parse::<ClosureMode>(), Ok(ClosureMode::Direct));
        assert_eq!(
            "Build-Closure".parse::<ClosureMode>(),
            Ok(ClosureMode::BuildClosure)
        );
        assert!("recursive".parse::<ClosureMode>().is_err());
    }
}
