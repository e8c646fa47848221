use super::{Plan, Resource};
use crate::utils::error::{ApiError, Result};
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::HashMap;

impl Plan {
    /// Edge `a -> b` means `a` must exist before `b`.
    fn dependency_graph(&self) -> Result<DiGraph<usize, ()>> {
        let mut graph = DiGraph::new();
        let mut index: HashMap<&str, NodeIndex> = HashMap::new();

        for (position, resource) in self.resources.iter().enumerate() {
            index.insert(resource.name.as_str(), graph.add_node(position));
        }

        for resource in &self.resources {
            let to = index[resource.name.as_str()];
            for dep in resource.dependencies() {
                let from = index.get(dep.as_str()).ok_or_else(|| ApiError::TopologyError {
                    resource: resource.name.clone(),
                    message: format!("Depends on undeclared resource '{}'", dep),
                })?;
                graph.add_edge(*from, to, ());
            }
        }

        Ok(graph)
    }

    /// Resources in an order that respects every dependency.
    pub fn creation_order(&self) -> Result<Vec<&Resource>> {
        let graph = self.dependency_graph()?;
        match toposort(&graph, None) {
            Ok(order) => Ok(order
                .into_iter()
                .map(|idx| &self.resources[graph[idx]])
                .collect()),
            Err(cycle) => {
                let resource = &self.resources[graph[cycle.node_id()]];
                Err(ApiError::TopologyError {
                    resource: resource.name.clone(),
                    message: "Dependency cycle detected".to_string(),
                })
            }
        }
    }

    /// Batches of resources whose dependencies all live in earlier batches.
    ///
    /// Within a batch resources keep their declaration order.
    pub fn waves(&self) -> Result<Vec<Vec<&Resource>>> {
        let order = self.creation_order()?;
        let mut level: HashMap<&str, usize> = HashMap::new();

        for resource in &order {
            let wave = resource
                .dependencies()
                .iter()
                .filter_map(|dep| level.get(dep.as_str()))
                .map(|l| l + 1)
                .max()
                .unwrap_or(0);
            level.insert(resource.name.as_str(), wave);
        }

        let depth = level.values().copied().max().map_or(0, |max| max + 1);
        let mut waves: Vec<Vec<&Resource>> = vec![Vec::new(); depth];
        for resource in &self.resources {
            waves[level[resource.name.as_str()]].push(resource);
        }
        Ok(waves)
    }
}
