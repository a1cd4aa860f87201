//! Compaction of abstract port and node numbers into dense matrix indices
//!
//! Domain elements are scanned type by type in [`ElementType::ALL`] order and
//! element by element; every port gets an abstract number and every element an
//! abstract node number. Only material elements survive into the real
//! numbering. Per type the allocator keeps running offsets plus a membership
//! record, so a translation is one addition for types whose elements are all
//! material and a binary search otherwise.
//!
//! Stub ports of hyperbolic materials are numbered after every geometric port.

use crate::config::{EquationConfig, TagClass, TagTable};
use crate::error::{Result, TlmError};
use crate::intersection::AbstractPort;
use crate::mesh::{ElementId, ElementType, MeshTopology};

/// Which elements of a type belong to a set (materials, stubs)
#[derive(Debug, Clone, PartialEq, Eq)]
enum Membership {
    None,
    All,
    /// Sorted element indices
    Sorted(Vec<usize>),
}

impl Membership {
    fn from_sorted(members: Vec<usize>, total: usize) -> Self {
        if members.is_empty() {
            Membership::None
        } else if members.len() == total {
            Membership::All
        } else {
            Membership::Sorted(members)
        }
    }

    /// Position of `index` among the members
    fn rank(&self, index: usize) -> Option<usize> {
        match self {
            Membership::None => None,
            Membership::All => Some(index),
            Membership::Sorted(members) => members.binary_search(&index).ok(),
        }
    }

    fn count(&self, total: usize) -> usize {
        match self {
            Membership::None => 0,
            Membership::All => total,
            Membership::Sorted(members) => members.len(),
        }
    }

    fn nth(&self, rank: usize) -> usize {
        match self {
            Membership::Sorted(members) => members[rank],
            _ => rank,
        }
    }
}

/// Running offsets of one domain element type
#[derive(Debug, Clone)]
struct TypeLayout {
    element_type: ElementType,
    count: usize,
    ports_per_element: usize,
    previous_maximum_abstract_node: usize,
    previous_maximum_abstract_port: usize,
    previous_maximum_real_node: usize,
    previous_maximum_real_port: usize,
    stub_offset: usize,
    materials: Membership,
    stubs: Membership,
}

impl TypeLayout {
    fn abstract_ports(&self) -> usize {
        self.count * self.ports_per_element
    }

    fn material_count(&self) -> usize {
        self.materials.count(self.count)
    }
}

/// How a domain element takes part in the system
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementClass {
    /// Owns real ports and a real node
    Material,
    /// Acts as a boundary reference for adjacent material ports
    Boundary,
}

/// An element whose tag selects a boundary specification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundaryReference {
    pub element: ElementId,
    /// Index into [`EquationConfig::boundaries`]
    pub boundary: usize,
    /// True for domain-dimension elements, whose faces become references
    pub region: bool,
}

/// Abstract → real numbering for ports, nodes and stubs
#[derive(Debug)]
pub struct PortAllocator {
    dimension: usize,
    layouts: Vec<TypeLayout>,
    boundary_references: Vec<BoundaryReference>,
    num_abstract_ports: usize,
    num_geometric_ports: usize,
    num_real_nodes: usize,
    num_stubs: usize,
}

fn grow<T>(buffer: &mut Vec<T>, what: &'static str) -> Result<()> {
    if buffer.len() == buffer.capacity() {
        let additional = buffer.len().max(8);
        buffer
            .try_reserve(additional)
            .map_err(|_| TlmError::Allocation {
                what,
                requested: buffer.len() + additional,
            })?;
    }
    Ok(())
}

impl PortAllocator {
    /// Scan the mesh against the declared tags and lay out the numbering
    pub fn initiate(
        mesh: &MeshTopology,
        equation: &EquationConfig,
        tags: &TagTable,
    ) -> Result<Self> {
        mesh.validate()?;
        let dimension = mesh.dimension();
        if dimension == 0 {
            return Err(TlmError::config("mesh has no element of dimension 1 or more"));
        }

        let mut allocator = Self {
            dimension,
            layouts: Vec::new(),
            boundary_references: Vec::new(),
            num_abstract_ports: 0,
            num_geometric_ports: 0,
            num_real_nodes: 0,
            num_stubs: 0,
        };

        let mut abstract_node = 0;
        let mut abstract_port = 0;
        let mut stub_offset = 0;

        for element_type in ElementType::ALL {
            let Some(array) = mesh.elements_of(element_type) else {
                continue;
            };
            let element_dim = element_type.dimension();

            if element_dim + 1 == dimension {
                allocator.scan_boundary_carriers(element_type, array.tags.as_slice(), tags)?;
                continue;
            }
            if element_dim != dimension {
                log::debug!(
                    "ignoring {} {} elements ({}D mesh)",
                    array.len(),
                    element_type.name(),
                    dimension
                );
                continue;
            }

            let mut materials = Vec::new();
            let mut stubs = Vec::new();
            for (index, &tag) in array.tags.iter().enumerate() {
                let element = ElementId::new(element_type, index);
                match tags.resolve(tag) {
                    Some(TagClass::Material(m)) => {
                        grow(&mut materials, "material membership")?;
                        materials.push(index);
                        if equation.materials[m].is_hyperbolic() {
                            grow(&mut stubs, "stub membership")?;
                            stubs.push(index);
                        }
                    }
                    Some(TagClass::Boundary(boundary)) => {
                        grow(&mut allocator.boundary_references, "boundary references")?;
                        allocator.boundary_references.push(BoundaryReference {
                            element,
                            boundary,
                            region: true,
                        });
                    }
                    None => return Err(TlmError::UndefinedTag { tag, element }),
                }
            }

            let count = array.len();
            let layout = TypeLayout {
                element_type,
                count,
                ports_per_element: element_type.num_ports(),
                previous_maximum_abstract_node: abstract_node,
                previous_maximum_abstract_port: abstract_port,
                previous_maximum_real_node: allocator.num_real_nodes,
                previous_maximum_real_port: allocator.num_geometric_ports,
                stub_offset,
                materials: Membership::from_sorted(materials, count),
                stubs: Membership::from_sorted(stubs, count),
            };

            abstract_node += count;
            abstract_port += layout.abstract_ports();
            stub_offset += layout.stubs.count(count);
            allocator.num_real_nodes += layout.material_count();
            allocator.num_geometric_ports += layout.material_count() * layout.ports_per_element;

            log::debug!(
                "{}: {} elements, {} material, {} stubs",
                element_type.name(),
                count,
                layout.material_count(),
                layout.stubs.count(count)
            );
            allocator.layouts.push(layout);
        }

        allocator.num_abstract_ports = abstract_port;
        allocator.num_stubs = stub_offset;
        Ok(allocator)
    }

    /// Elements one dimension below the domain carry boundary tags
    fn scan_boundary_carriers(
        &mut self,
        element_type: ElementType,
        tags: &[i32],
        table: &TagTable,
    ) -> Result<()> {
        for (index, &tag) in tags.iter().enumerate() {
            let element = ElementId::new(element_type, index);
            match table.resolve(tag) {
                Some(TagClass::Boundary(boundary)) => {
                    grow(&mut self.boundary_references, "boundary references")?;
                    self.boundary_references.push(BoundaryReference {
                        element,
                        boundary,
                        region: false,
                    });
                }
                Some(TagClass::Material(_)) => {
                    log::debug!("{element} has material tag {tag}; ignored as boundary carrier");
                }
                None => return Err(TlmError::UndefinedTag { tag, element }),
            }
        }
        Ok(())
    }

    fn layout(&self, element_type: ElementType) -> Option<&TypeLayout> {
        self.layouts.iter().find(|l| l.element_type == element_type)
    }

    /// Mesh dimension the numbering was built for
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Material or boundary class of a domain element, by abstract node number
    pub fn classify(
        &self,
        element_type: ElementType,
        abstract_node: usize,
    ) -> Option<ElementClass> {
        let layout = self.layout(element_type)?;
        let index = abstract_node.checked_sub(layout.previous_maximum_abstract_node)?;
        if index >= layout.count {
            return None;
        }
        Some(match layout.materials.rank(index) {
            Some(_) => ElementClass::Material,
            None => ElementClass::Boundary,
        })
    }

    /// Abstract node number of a domain element
    pub fn abstract_node(&self, element: ElementId) -> Option<usize> {
        let layout = self.layout(element.element_type)?;
        (element.index < layout.count)
            .then(|| layout.previous_maximum_abstract_node + element.index)
    }

    /// Abstract number of a port of a domain element
    pub fn abstract_port(&self, element: ElementId, local: usize) -> Option<AbstractPort> {
        let layout = self.layout(element.element_type)?;
        (element.index < layout.count && local < layout.ports_per_element).then(|| {
            let offset = element.index * layout.ports_per_element + local;
            AbstractPort(layout.previous_maximum_abstract_port + offset)
        })
    }

    /// Element and local index owning an abstract port
    pub fn locate(&self, port: AbstractPort) -> Option<(ElementId, usize)> {
        let layout = self.layouts.iter().find(|l| {
            port.0 >= l.previous_maximum_abstract_port
                && port.0 < l.previous_maximum_abstract_port + l.abstract_ports()
        })?;
        let offset = port.0 - layout.previous_maximum_abstract_port;
        Some((
            ElementId::new(layout.element_type, offset / layout.ports_per_element),
            offset % layout.ports_per_element,
        ))
    }

    /// Real port of an abstract port; `None` for ports of non-material elements
    pub fn to_real(&self, port: AbstractPort) -> Option<usize> {
        let (element, local) = self.locate(port)?;
        let (_, first_port) = self.real_node_and_port(element)?;
        Some(first_port + local)
    }

    /// Real node and first real port of a material element
    pub fn real_node_and_port(&self, element: ElementId) -> Option<(usize, usize)> {
        let layout = self.layout(element.element_type)?;
        if element.index >= layout.count {
            return None;
        }
        let rank = layout.materials.rank(element.index)?;
        Some((
            layout.previous_maximum_real_node + rank,
            layout.previous_maximum_real_port + rank * layout.ports_per_element,
        ))
    }

    /// Real port of the element's relaxation stub, if it has one
    pub fn stub_port(&self, element: ElementId) -> Option<usize> {
        let layout = self.layout(element.element_type)?;
        if element.index >= layout.count {
            return None;
        }
        let rank = layout.stubs.rank(element.index)?;
        Some(self.num_geometric_ports + layout.stub_offset + rank)
    }

    /// Material elements in real node order
    pub fn material_elements(&self) -> impl Iterator<Item = ElementId> + '_ {
        self.layouts.iter().flat_map(|layout| {
            (0..layout.material_count())
                .map(move |rank| ElementId::new(layout.element_type, layout.materials.nth(rank)))
        })
    }

    /// Boundary carriers and boundary regions, in scan order
    pub fn boundary_references(&self) -> &[BoundaryReference] {
        &self.boundary_references
    }

    /// Ports of every domain element, material or not
    pub fn num_abstract_ports(&self) -> usize {
        self.num_abstract_ports
    }

    /// Geometric ports of material elements
    pub fn num_geometric_ports(&self) -> usize {
        self.num_geometric_ports
    }

    /// Stub ports
    pub fn num_stubs(&self) -> usize {
        self.num_stubs
    }

    /// Size of the scattering matrix
    pub fn num_real_ports(&self) -> usize {
        self.num_geometric_ports + self.num_stubs
    }

    /// Number of material elements
    pub fn num_real_nodes(&self) -> usize {
        self.num_real_nodes
    }
}
