//! A [`Path`] implementation over a fixed control-flow graph, used for testing
//! the path group without a real execution engine.

use std::{collections::HashMap, rc::Rc};

use crate::{
    error::{execution, merge, path::Error as PathError},
    path::{Address, Path, StepOutcome, Successors},
};

/// How a node of the graph behaves when a path at it is stepped.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
enum Behaviour {
    #[default]
    Normal,
    Unreachable,
    Errored(String),
    Fails(String),
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
struct Node {
    successors:    Vec<Address>,
    unconstrained: Vec<Address>,
    unsat:         Vec<Address>,
    behaviour:     Behaviour,
    unmergeable:   bool,
}

/// A fixed control-flow graph. Addresses with no node have no successors.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub(crate) struct Graph {
    nodes: HashMap<Address, Node>,
}

impl Graph {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn in_rc(self) -> Rc<Self> {
        Rc::new(self)
    }

    fn node(&mut self, address: Address) -> &mut Node {
        self.nodes.entry(address).or_default()
    }

    pub(crate) fn edge(mut self, from: Address, to: Address) -> Self {
        self.node(from).successors.push(to);
        self
    }

    pub(crate) fn unconstrained_edge(mut self, from: Address, to: Address) -> Self {
        self.node(from).unconstrained.push(to);
        self
    }

    pub(crate) fn unsat_edge(mut self, from: Address, to: Address) -> Self {
        self.node(from).unsat.push(to);
        self
    }

    pub(crate) fn unreachable_at(mut self, address: Address) -> Self {
        self.node(address).behaviour = Behaviour::Unreachable;
        self
    }

    pub(crate) fn errored_at(mut self, address: Address, reason: &str) -> Self {
        self.node(address).behaviour = Behaviour::Errored(reason.to_string());
        self
    }

    pub(crate) fn failing_at(mut self, address: Address, message: &str) -> Self {
        self.node(address).behaviour = Behaviour::Fails(message.to_string());
        self
    }

    pub(crate) fn unmergeable_at(mut self, address: Address) -> Self {
        self.node(address).unmergeable = true;
        self
    }

    pub(crate) fn path_at(self: &Rc<Self>, address: Address) -> GraphPath {
        GraphPath {
            graph:       self.clone(),
            addr:        address,
            backtrace:   Vec::new(),
            error:       None,
            satisfiable: true,
            merged:      1,
        }
    }
}

/// A path that walks a [`Graph`].
#[derive(Clone, Debug)]
pub(crate) struct GraphPath {
    graph:       Rc<Graph>,
    addr:        Address,
    backtrace:   Vec<Address>,
    error:       Option<PathError>,
    satisfiable: bool,
    merged:      usize,
}

impl GraphPath {
    pub(crate) fn with_error(mut self, error: PathError) -> Self {
        self.error = Some(error);
        self
    }

    pub(crate) fn unsatisfiable(mut self) -> Self {
        self.satisfiable = false;
        self
    }

    /// The number of original paths that this path represents.
    pub(crate) fn merged(&self) -> usize {
        self.merged
    }

    fn children(&self, targets: &[Address]) -> Vec<Self> {
        let mut backtrace = self.backtrace.clone();
        backtrace.push(self.addr);
        targets
            .iter()
            .map(|target| Self {
                graph:       self.graph.clone(),
                addr:        *target,
                backtrace:   backtrace.clone(),
                error:       None,
                satisfiable: true,
                merged:      1,
            })
            .collect()
    }
}

impl PartialEq for GraphPath {
    fn eq(&self, other: &Self) -> bool {
        self.addr == other.addr
            && self.backtrace == other.backtrace
            && self.error == other.error
            && self.satisfiable == other.satisfiable
            && self.merged == other.merged
    }
}

impl Path for GraphPath {
    fn addr(&self) -> Address {
        self.addr
    }

    fn error(&self) -> Option<&PathError> {
        self.error.as_ref()
    }

    fn step(&self) -> execution::Result<StepOutcome<Self>> {
        let Some(node) = self.graph.nodes.get(&self.addr) else {
            return Ok(StepOutcome::Successors(Successors::none()));
        };

        match &node.behaviour {
            Behaviour::Normal => {
                let successors = Successors::new(self.children(&node.successors))
                    .with_unconstrained(self.children(&node.unconstrained))
                    .with_unsat(self.children(&node.unsat));
                Ok(StepOutcome::Successors(successors))
            }
            Behaviour::Unreachable => Ok(StepOutcome::Unreachable),
            Behaviour::Errored(reason) => Ok(StepOutcome::Errored(PathError::execution(reason))),
            Behaviour::Fails(message) => Err(execution::Error::engine(message)),
        }
    }

    fn merge(&self, others: &[Self]) -> merge::Result<Self> {
        if others.iter().any(|other| other.addr != self.addr) {
            let addresses = std::iter::once(self.addr)
                .chain(others.iter().map(|other| other.addr))
                .collect();
            return Err(merge::Error::MismatchedAddresses { addresses });
        }

        let unmergeable = self
            .graph
            .nodes
            .get(&self.addr)
            .is_some_and(|node| node.unmergeable);
        if unmergeable {
            return Err(merge::Error::incompatible("incompatible memory"));
        }

        let mut merged = self.clone();
        merged.merged += others.iter().map(|other| other.merged).sum::<usize>();
        merged.satisfiable = self.satisfiable || others.iter().any(|other| other.satisfiable);
        Ok(merged)
    }

    fn addr_backtrace(&self) -> &[Address] {
        &self.backtrace
    }

    fn satisfiable(&self) -> bool {
        self.satisfiable
    }
}
