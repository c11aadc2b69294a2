// ABOUTME: Provider/consumer graph over an environment's root deployments for one stage.
// ABOUTME: Produces an execution order where every provider runs before its consumers.

use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};

use super::deployment::DeploymentState;
use super::environment::EnvironmentState;
use super::error::StateError;
use crate::types::PATH_SEPARATOR;

/// A deployment in the graph together with the deployments that consume it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DagNode {
    deployment: String,
    and_then: Vec<String>,
}

impl DagNode {
    pub fn deployment(&self) -> &str {
        &self.deployment
    }

    /// Consumers that may only run once this deployment has run.
    pub fn and_then(&self) -> &[String] {
        &self.and_then
    }
}

/// The "must run before" graph derived from provider wiring.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeploymentDag {
    roots: Vec<String>,
    nodes: BTreeMap<String, DagNode>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    InProgress,
    Done,
}

impl DeploymentDag {
    /// Build the graph for `stage` from the `providers` wiring recorded in every
    /// root deployment that has that stage.
    pub fn build(env: &EnvironmentState, stage: &str) -> Result<Self, StateError> {
        let mut prerequisites: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();

        for deployment in env.deployments() {
            let Some(stage_state) = deployment.stage(stage) else {
                continue;
            };
            let name = deployment.name();
            let providers = prerequisites.entry(name).or_default();

            for provider_path in stage_state.providers().values() {
                // Nested providers order by the root deployment they live under.
                let provider = provider_path
                    .split(PATH_SEPARATOR)
                    .next()
                    .unwrap_or(provider_path.as_str());
                if provider == name {
                    return Err(StateError::SelfProvider(name.to_string()));
                }
                if env.resolve_deployment_path(provider_path, stage).is_err() {
                    return Err(StateError::ProviderNotFound {
                        consumer: name.to_string(),
                        provider: provider_path.clone(),
                        environment: env.name().to_string(),
                    });
                }
                providers.insert(provider);
            }
        }

        let mut nodes: BTreeMap<String, DagNode> = BTreeMap::new();
        let mut ensure = |name: &str| {
            nodes
                .entry(name.to_string())
                .or_insert_with(|| DagNode {
                    deployment: name.to_string(),
                    and_then: Vec::new(),
                });
        };
        for (consumer, providers) in &prerequisites {
            ensure(consumer);
            for provider in providers {
                ensure(provider);
            }
        }
        for (consumer, providers) in &prerequisites {
            for provider in providers {
                if let Some(node) = nodes.get_mut(*provider) {
                    node.and_then.push(consumer.to_string());
                }
            }
        }

        let roots: Vec<String> = nodes
            .keys()
            .filter(|name| {
                prerequisites
                    .get(name.as_str())
                    .is_none_or(|providers| providers.is_empty())
            })
            .cloned()
            .collect();

        let dag = Self { roots, nodes };
        let reachable = dag.reachable_from_roots();
        tracing::debug!(
            "Built {} graph: {} node(s), {} root(s), {} reachable",
            stage,
            dag.nodes.len(),
            dag.roots.len(),
            reachable
        );
        Ok(dag)
    }

    /// Breadth-first count of nodes reachable from the roots. Anything not
    /// reachable sits on or behind a cycle.
    fn reachable_from_roots(&self) -> usize {
        let mut seen: BTreeSet<&str> = self.roots.iter().map(String::as_str).collect();
        let mut queue: VecDeque<&str> = self.roots.iter().map(String::as_str).collect();
        while let Some(name) = queue.pop_front() {
            if let Some(node) = self.nodes.get(name) {
                for consumer in &node.and_then {
                    if seen.insert(consumer) {
                        queue.push_back(consumer);
                    }
                }
            }
        }
        seen.len()
    }

    /// Deployments with no unmet providers.
    pub fn roots(&self) -> impl Iterator<Item = &DagNode> {
        self.roots.iter().filter_map(|name| self.nodes.get(name))
    }

    pub fn node(&self, deployment: &str) -> Option<&DagNode> {
        self.nodes.get(deployment)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Reverse post-order depth-first walk: every provider precedes each of its
    /// consumers. Fails if the wiring contains a cycle.
    pub fn walk(&self) -> Result<Vec<String>, StateError> {
        let mut marks: HashMap<&str, Mark> = HashMap::new();
        let mut stack: Vec<&str> = Vec::new();
        let mut order: VecDeque<String> = VecDeque::new();

        // Roots first; the remaining nodes only matter when they are stuck on a
        // cycle, which the walk then reports. Visiting in reverse name order
        // keeps unrelated deployments in name order in the result.
        let starts = self
            .roots
            .iter()
            .rev()
            .map(String::as_str)
            .chain(self.nodes.keys().rev().map(String::as_str));
        for start in starts {
            self.visit(start, &mut marks, &mut stack, &mut order)?;
        }
        Ok(order.into())
    }

    fn visit<'a>(
        &'a self,
        name: &'a str,
        marks: &mut HashMap<&'a str, Mark>,
        stack: &mut Vec<&'a str>,
        order: &mut VecDeque<String>,
    ) -> Result<(), StateError> {
        match marks.get(name) {
            Some(Mark::Done) => return Ok(()),
            Some(Mark::InProgress) => {
                let from = stack.iter().position(|n| *n == name).unwrap_or(0);
                let mut cycle: Vec<String> = stack[from..].iter().map(|n| n.to_string()).collect();
                cycle.push(name.to_string());
                return Err(StateError::CircularProviderDependency(cycle));
            }
            None => {}
        }

        marks.insert(name, Mark::InProgress);
        stack.push(name);
        if let Some(node) = self.nodes.get(name) {
            for consumer in node.and_then.iter().rev() {
                self.visit(consumer, marks, stack, order)?;
            }
        }
        stack.pop();
        marks.insert(name, Mark::Done);
        order.push_front(name.to_string());
        Ok(())
    }
}

impl EnvironmentState {
    pub fn get_deployment_state_dag(&self, stage: &str) -> Result<DeploymentDag, StateError> {
        DeploymentDag::build(self, stage)
    }

    /// Root deployments in an order where providers come before consumers.
    pub fn get_deployment_state_topological_sort(
        &self,
        stage: &str,
    ) -> Result<Vec<&DeploymentState>, StateError> {
        let dag = self.get_deployment_state_dag(stage)?;
        dag.walk()?
            .iter()
            .map(|name| {
                self.get_deployment_state(name)
                    .ok_or_else(|| StateError::DeploymentNotFound(name.clone()))
            })
            .collect()
    }
}
