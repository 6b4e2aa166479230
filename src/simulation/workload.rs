//! Blocking workloads behind the resource and serialization simulations.
//!
//! Everything here is synchronous; callers move it onto the blocking pool.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::{Duration, Instant};

use serde::ser::{Error as _, SerializeStruct};
use serde::{Serialize, Serializer};

const MIB: usize = 1024 * 1024;
const PAGE: usize = 4096;

/// Keep one core busy until `duration` of wall-clock time has passed.
/// Returns the measured duration, never shorter than requested.
pub fn burn_cpu(duration: Duration) -> Duration {
    let start = Instant::now();
    let mut acc: u64 = 0x9E37_79B9_7F4A_7C15;
    while start.elapsed() < duration {
        for i in 0..10_000u64 {
            acc = acc.rotate_left(5) ^ i.wrapping_mul(0x0100_0000_01B3);
        }
        std::hint::black_box(acc);
    }
    start.elapsed()
}

/// Allocate `megabytes`, touch every page so it is resident, then free it.
/// Returns the size that was held.
pub fn allocate_and_release(megabytes: usize) -> usize {
    let mut block = vec![0u8; megabytes * MIB];
    for page in block.chunks_mut(PAGE) {
        page[0] = fastrand::u8(1..);
    }
    let held = std::hint::black_box(&block).len() / MIB;
    drop(block);
    held
}

/// Node of an object graph that may reference its own ancestors.
#[derive(Debug)]
pub struct Node {
    pub name: String,
    pub links: RefCell<Vec<Rc<Node>>>,
}

impl Node {
    pub fn new(name: impl Into<String>) -> Rc<Self> {
        Rc::new(Self {
            name: name.into(),
            links: RefCell::new(Vec::new()),
        })
    }

    pub fn link(&self, other: &Rc<Node>) {
        self.links.borrow_mut().push(Rc::clone(other));
    }
}

/// Serializes a node, failing when a link points back at an ancestor.
struct Guarded<'a> {
    node: &'a Node,
    ancestors: &'a RefCell<Vec<*const Node>>,
}

impl Serialize for Guarded<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let ptr: *const Node = self.node;
        if self.ancestors.borrow().contains(&ptr) {
            return Err(S::Error::custom(format!(
                "circular reference detected at '{}'",
                self.node.name
            )));
        }

        self.ancestors.borrow_mut().push(ptr);
        let links = self.node.links.borrow();
        let children: Vec<Guarded<'_>> = links
            .iter()
            .map(|child| Guarded {
                node: child.as_ref(),
                ancestors: self.ancestors,
            })
            .collect();

        let result = serializer.serialize_struct("Node", 2).and_then(|mut state| {
            state.serialize_field("name", &self.node.name)?;
            state.serialize_field("links", &children)?;
            state.end()
        });
        self.ancestors.borrow_mut().pop();
        result
    }
}

/// Serialize a node graph to JSON.
pub fn to_json(root: &Node) -> Result<String, serde_json::Error> {
    let ancestors = RefCell::new(Vec::new());
    serde_json::to_string(&Guarded {
        node: root,
        ancestors: &ancestors,
    })
}

/// Build an order ↔ customer cycle and try to serialize it.
pub fn serialize_cyclic_graph() -> Result<String, serde_json::Error> {
    let order = Node::new("order");
    let customer = Node::new("customer");
    order.link(&customer);
    customer.link(&order);

    let result = to_json(&order);

    // Break the cycle so both nodes are freed.
    customer.links.borrow_mut().clear();
    result
}
