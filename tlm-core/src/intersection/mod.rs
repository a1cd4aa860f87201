//! Discovery of mesh-coincident ports and boundary references
//!
//! Every port is registered under the vertex ids of the face (3D), edge (2D) or
//! vertex (1D) it looks at. Ports and boundary elements that share the same
//! vertex set end up in the same bucket: an intersection. No adjacency list is
//! needed; two faces are neighbours exactly when their sorted vertex tuples are
//! equal.
//!
//! Lifecycle: [`IntersectionIndex::initiate`], any number of
//! [`IntersectionIndex::add`], then [`IntersectionIndex::compact`], after which
//! the index is a read-only array of buckets ordered by descending key.

use crate::error::{Result, TlmError};
use crate::mesh::{ElementId, ElementType, MeshTopology};
use smallvec::SmallVec;
use std::collections::HashMap;

/// Maximum number of vertices on a port's face
pub const MAX_LEVELS: usize = 4;

/// Vertex ids sorted in descending order, zero padded
pub type IntersectionKey = [usize; MAX_LEVELS];

/// Sequential port number assigned while scanning domain elements
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AbstractPort(pub usize);

/// One entry of an intersection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Member {
    /// A port of a domain element
    Port(AbstractPort),
    /// An element carrying a boundary tag; `boundary` indexes the boundary table
    Boundary { boundary: usize, element: ElementId },
}

/// Hash-indexed buckets of coincident members
#[derive(Debug)]
pub struct IntersectionIndex {
    level_count: usize,
    lookup: HashMap<IntersectionKey, u32>,
    keys: Vec<IntersectionKey>,
    buckets: Vec<SmallVec<[Member; 2]>>,
    compacted: bool,
}

impl IntersectionIndex {
    /// Number of key levels a mesh needs: 1 in 1D, 2 in 2D, 3 for simplicial
    /// 3D meshes and 4 as soon as a quadrangle face exists
    pub fn levels_for(mesh: &MeshTopology) -> usize {
        match mesh.dimension() {
            0 | 1 => 1,
            2 => 2,
            _ => {
                let quad_faces = mesh.elements.iter().any(|a| {
                    !a.is_empty()
                        && (a.element_type.has_quad_faces()
                            || a.element_type == ElementType::Quadrangle)
                });
                if quad_faces {
                    4
                } else {
                    3
                }
            }
        }
    }

    /// Create an empty index for keys of at most `level_count` vertices
    pub fn initiate(level_count: usize, capacity_hint: usize) -> Result<Self> {
        if level_count == 0 || level_count > MAX_LEVELS {
            return Err(TlmError::config(format!(
                "intersection level count must be in 1..={MAX_LEVELS}, got {level_count}"
            )));
        }
        let mut index = Self {
            level_count,
            lookup: HashMap::new(),
            keys: Vec::new(),
            buckets: Vec::new(),
            compacted: false,
        };
        index
            .lookup
            .try_reserve(capacity_hint)
            .map_err(|_| TlmError::Allocation {
                what: "intersection lookup",
                requested: capacity_hint,
            })?;
        index.reserve(capacity_hint)?;
        Ok(index)
    }

    fn reserve(&mut self, additional: usize) -> Result<()> {
        let requested = self.keys.len() + additional;
        self.keys
            .try_reserve(additional)
            .map_err(|_| TlmError::Allocation {
                what: "intersection keys",
                requested,
            })?;
        self.buckets
            .try_reserve(additional)
            .map_err(|_| TlmError::Allocation {
                what: "intersection buckets",
                requested,
            })
    }

    /// Sorted, zero-padded key of a vertex set
    pub fn make_key(&self, vertices: &[usize]) -> Result<IntersectionKey> {
        if vertices.is_empty() || vertices.len() > self.level_count {
            return Err(TlmError::config(format!(
                "intersection of {} vertices {:?} exceeds the {} levels of this index",
                vertices.len(),
                vertices,
                self.level_count
            )));
        }
        if vertices.contains(&0) {
            return Err(TlmError::config(format!(
                "node ids are 1-based, got vertices {vertices:?}"
            )));
        }
        let mut key = [0; MAX_LEVELS];
        key[..vertices.len()].copy_from_slice(vertices);
        key.sort_unstable_by(|a, b| b.cmp(a));
        Ok(key)
    }

    /// Register a member under the face with the given vertex ids
    pub fn add(&mut self, vertices: &[usize], member: Member) -> Result<()> {
        if self.compacted {
            return Err(TlmError::config("intersection index is already compacted"));
        }
        let key = self.make_key(vertices)?;

        let slot = match self.lookup.get(&key) {
            Some(&slot) => slot as usize,
            None => {
                if self.keys.len() == self.keys.capacity() {
                    self.reserve(self.keys.len().max(16))?;
                }
                let slot = self.keys.len();
                let slot_id = u32::try_from(slot).map_err(|_| TlmError::Allocation {
                    what: "intersection slots",
                    requested: slot + 1,
                })?;
                self.lookup
                    .try_reserve(1)
                    .map_err(|_| TlmError::Allocation {
                        what: "intersection lookup",
                        requested: slot + 1,
                    })?;
                self.lookup.insert(key, slot_id);
                self.keys.push(key);
                self.buckets.push(SmallVec::new());
                slot
            }
        };
        self.buckets[slot].push(member);
        Ok(())
    }

    /// Order buckets by descending key, release slack and drop the hash table
    pub fn compact(&mut self) {
        let mut order: Vec<usize> = (0..self.keys.len()).collect();
        order.sort_unstable_by(|&a, &b| self.keys[b].cmp(&self.keys[a]));

        let mut buckets: Vec<_> = self.buckets.drain(..).map(Some).collect();
        self.keys = order.iter().map(|&i| self.keys[i]).collect();
        self.buckets = order
            .iter()
            .map(|&i| buckets[i].take().unwrap_or_default())
            .collect();
        self.keys.shrink_to_fit();
        self.buckets.shrink_to_fit();
        self.lookup = HashMap::new();
        self.compacted = true;

        log::debug!("intersection index compacted to {} intersections", self.len());
    }

    /// Number of intersections
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn level_count(&self) -> usize {
        self.level_count
    }

    /// Members of intersection `i`
    pub fn get(&self, i: usize) -> &[Member] {
        &self.buckets[i]
    }

    /// Vertex ids of intersection `i`, in descending order
    pub fn key(&self, i: usize) -> &[usize] {
        let key = &self.keys[i];
        let len = key.iter().take_while(|&&v| v != 0).count();
        &key[..len]
    }

    /// Iterate over `(index, members)`
    pub fn iter(&self) -> impl Iterator<Item = (usize, &[Member])> + '_ {
        self.buckets.iter().enumerate().map(|(i, b)| (i, b.as_slice()))
    }
}
