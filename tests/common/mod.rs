//! This module contains common utilities for simplifying the writing of
//! integration tests for this library.

#![cfg(test)]

use std::{collections::HashMap, fs::File, io::Read, rc::Rc};

use anyhow::anyhow;
use path_group::{
    error::{execution, merge, path::Error as PathError},
    path::{Address, Path, StepOutcome, Successors},
    PathGroup,
};
use serde::{Deserialize, Serialize};

/// A wrapper for the JSON representation of a program on disk, which lists its
/// basic blocks with hex-encoded addresses.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgramRep {
    blocks: Vec<BlockRep>,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockRep {
    addr:          String,
    #[serde(default)]
    next:          Vec<String>,
    #[serde(default)]
    unconstrained: Vec<String>,
    #[serde(default)]
    exit:          Exit,
}

/// How a block behaves once execution reaches its end.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Exit {
    /// Continues to the block's successors.
    #[default]
    Jump,

    /// The path turns out to be infeasible.
    Unreachable,

    /// The path faults with the provided reason.
    Fault(String),

    /// The engine itself falls over with the provided message.
    Crash(String),
}

/// A single basic block of a [`Program`].
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Block {
    next:          Vec<Address>,
    unconstrained: Vec<Address>,
    exit:          Exit,
}

/// A program that can be explored by a [`PathGroup`].
///
/// Addresses without a block have no successors.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Program {
    blocks: HashMap<Address, Block>,
}

impl Program {
    /// Creates a state at `addr` in the program.
    pub fn start(self: &Rc<Self>, addr: Address) -> State {
        State {
            program: self.clone(),
            addr,
            trail: Vec::new(),
            weight: 1,
        }
    }

    /// Creates a path group with states at each of the `addresses` in its
    /// active stash.
    #[allow(unused)] // It is actually
    pub fn group_at(self: &Rc<Self>, addresses: &[Address]) -> PathGroup<State> {
        PathGroup::new(addresses.iter().map(|a| self.start(*a)).collect())
    }
}

/// An execution state in a [`Program`].
#[derive(Clone, Debug)]
pub struct State {
    program: Rc<Program>,
    addr:    Address,
    trail:   Vec<Address>,
    weight:  usize,
}

impl State {
    /// Gets the number of states that were merged to produce this state.
    #[allow(unused)] // It is actually
    pub fn weight(&self) -> usize {
        self.weight
    }

    fn successors(&self, targets: &[Address]) -> Vec<Self> {
        let mut trail = self.trail.clone();
        trail.push(self.addr);
        targets
            .iter()
            .map(|addr| Self {
                program: self.program.clone(),
                addr:    *addr,
                trail:   trail.clone(),
                weight:  1,
            })
            .collect()
    }
}

impl Path for State {
    fn addr(&self) -> Address {
        self.addr
    }

    fn error(&self) -> Option<&PathError> {
        None
    }

    fn step(&self) -> execution::Result<StepOutcome<Self>> {
        let Some(block) = self.program.blocks.get(&self.addr) else {
            return Ok(StepOutcome::Successors(Successors::none()));
        };

        match &block.exit {
            Exit::Jump => Ok(StepOutcome::Successors(
                Successors::new(self.successors(&block.next))
                    .with_unconstrained(self.successors(&block.unconstrained)),
            )),
            Exit::Unreachable => Ok(StepOutcome::Unreachable),
            Exit::Fault(reason) => Ok(StepOutcome::Errored(PathError::execution(reason))),
            Exit::Crash(message) => Err(execution::Error::engine(message)),
        }
    }

    fn merge(&self, others: &[Self]) -> merge::Result<Self> {
        let mut merged = self.clone();
        for other in others {
            if other.addr != self.addr {
                return Err(merge::Error::MismatchedAddresses {
                    addresses: vec![self.addr, other.addr],
                });
            }
            merged.weight += other.weight;
        }
        Ok(merged)
    }

    fn addr_backtrace(&self) -> &[Address] {
        &self.trail
    }

    fn satisfiable(&self) -> bool {
        true
    }
}

/// Loads the program described by the JSON file at the provided `path`.
pub fn new_program_from_file(path: impl Into<String>) -> anyhow::Result<Rc<Program>> {
    let path = path.into();
    let mut file = File::open(path).map_err(|_| anyhow!("File not available"))?;
    let mut contents = vec![];
    file.read_to_end(&mut contents)
        .map_err(|_| anyhow!("File could not be read"))?;

    let program_rep: ProgramRep = serde_json::from_slice(contents.as_slice())
        .map_err(|_| anyhow!("Could not parse program."))?;

    let mut blocks = HashMap::new();
    for block in program_rep.blocks {
        let addr = get_address_from_string(&block.addr)?;
        let next = get_addresses_from_strings(&block.next)?;
        let unconstrained = get_addresses_from_strings(&block.unconstrained)?;
        let exit = block.exit;
        blocks.insert(
            addr,
            Block {
                next,
                unconstrained,
                exit,
            },
        );
    }

    Ok(Rc::new(Program { blocks }))
}

/// Gets the address from the provided hex-encoded string `addr`.
///
/// This hex-encoded string may or may not start with the `0x` prefix. Both
/// cases will be handled.
pub fn get_address_from_string(addr: &str) -> anyhow::Result<Address> {
    // Remove the 0x if it is present
    let no_0x_prefix = addr.strip_prefix("0x").unwrap_or(addr);

    Address::from_str_radix(no_0x_prefix, 16).map_err(|_| anyhow!("Could not decode hex"))
}

fn get_addresses_from_strings(addrs: &[String]) -> anyhow::Result<Vec<Address>> {
    addrs.iter().map(|a| get_address_from_string(a)).collect()
}
