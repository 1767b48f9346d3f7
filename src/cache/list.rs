//! Linked Store Module
//!
//! Recency-ordered doubly linked list stored in an index arena.
//!
//! Slot 0 is a sentinel: `sentinel.next` is the most recently used node and
//! `sentinel.prev` the least recently used one. Nodes refer to each other by
//! slot index, so the hash index of a cache can hold plain `NodeId`s.

// == Types ==
/// Stable handle of a node inside a [`LinkedStore`].
pub type NodeId = usize;

const SENTINEL: NodeId = 0;

/// Key/value pair held by a list node.
#[derive(Debug, Clone)]
pub struct Entry<V> {
    pub key: String,
    pub value: V,
}

#[derive(Debug)]
struct Node<V> {
    entry: Option<Entry<V>>,
    prev: NodeId,
    next: NodeId,
}

// == Linked Store ==
/// Circular doubly linked list with a sentinel, backed by a `Vec` arena.
///
/// Pure splice primitives; eviction policy lives in the caches built on top.
/// Every `NodeId` argument must belong to this list.
#[derive(Debug)]
pub struct LinkedStore<V> {
    nodes: Vec<Node<V>>,
    free: Vec<NodeId>,
    len: usize,
}

impl<V> LinkedStore<V> {
    // == Constructor ==
    /// Creates an empty list containing only the sentinel.
    pub fn new() -> Self {
        Self {
            nodes: vec![Node {
                entry: None,
                prev: SENTINEL,
                next: SENTINEL,
            }],
            free: Vec::new(),
            len: 0,
        }
    }

    // == Insert ==
    /// Inserts a new node at the front (most recently used position).
    pub fn insert(&mut self, key: String, value: V) -> NodeId {
        let node = Node {
            entry: Some(Entry { key, value }),
            prev: SENTINEL,
            next: SENTINEL,
        };
        let id = match self.free.pop() {
            Some(id) => {
                self.nodes[id] = node;
                id
            }
            None => {
                self.nodes.push(node);
                self.nodes.len() - 1
            }
        };
        self.link_front(id);
        self.len += 1;
        id
    }

    // == Remove ==
    /// Unlinks a node and releases its slot, returning the entry it held.
    pub fn remove(&mut self, id: NodeId) -> Option<Entry<V>> {
        let entry = self.nodes[id].entry.take()?;
        self.unlink(id);
        self.free.push(id);
        self.len -= 1;
        Some(entry)
    }

    // == Move To Front ==
    /// Marks a node as most recently used.
    pub fn move_to_front(&mut self, id: NodeId) {
        if self.nodes[SENTINEL].next == id {
            return;
        }
        self.unlink(id);
        self.link_front(id);
    }

    // == Victim ==
    /// Returns the least recently used node, or `None` when empty.
    pub fn victim(&self) -> Option<NodeId> {
        match self.nodes[SENTINEL].prev {
            SENTINEL => None,
            id => Some(id),
        }
    }

    // == Accessors ==
    pub fn entry(&self, id: NodeId) -> Option<&Entry<V>> {
        self.nodes.get(id).and_then(|n| n.entry.as_ref())
    }

    pub fn entry_mut(&mut self, id: NodeId) -> Option<&mut Entry<V>> {
        self.nodes.get_mut(id).and_then(|n| n.entry.as_mut())
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Iterates entries from most to least recently used.
    pub fn iter(&self) -> Iter<'_, V> {
        Iter {
            store: self,
            cursor: self.nodes[SENTINEL].next,
        }
    }

    fn unlink(&mut self, id: NodeId) {
        let (prev, next) = (self.nodes[id].prev, self.nodes[id].next);
        self.nodes[prev].next = next;
        self.nodes[next].prev = prev;
    }

    fn link_front(&mut self, id: NodeId) {
        let first = self.nodes[SENTINEL].next;
        self.nodes[id].prev = SENTINEL;
        self.nodes[id].next = first;
        self.nodes[first].prev = id;
        self.nodes[SENTINEL].next = id;
    }
}

impl<V> Default for LinkedStore<V> {
    fn default() -> Self {
        Self::new()
    }
}

/// Front-to-back iterator over a [`LinkedStore`].
pub struct Iter<'a, V> {
    store: &'a LinkedStore<V>,
    cursor: NodeId,
}

impl<'a, V> Iterator for Iter<'a, V> {
    type Item = &'a Entry<V>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.cursor == SENTINEL {
            return None;
        }
        let node = &self.store.nodes[self.cursor];
        self.cursor = node.next;
        node.entry.as_ref()
    }
}
