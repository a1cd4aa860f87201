//! Per-element network construction
//!
//! For every material element the builder resolves the material from the
//! element tag, computes the port geometry and derives the local block. The
//! elements are independent, so with the `parallel` feature the blocks are
//! built through rayon.

mod geometry;
mod local;

pub use geometry::*;
pub use local::*;

use crate::config::{EquationConfig, TagClass, TagTable};
use crate::error::{Result, TlmError};
use crate::mesh::{ElementId, MeshTopology};
use crate::ports::PortAllocator;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Builds [`LocalBlock`]s for material elements
pub struct ElementMatrixBuilder<'a> {
    mesh: &'a MeshTopology,
    equation: &'a EquationConfig,
    tags: &'a TagTable,
    allocator: &'a PortAllocator,
}

impl<'a> ElementMatrixBuilder<'a> {
    pub fn new(
        mesh: &'a MeshTopology,
        equation: &'a EquationConfig,
        tags: &'a TagTable,
        allocator: &'a PortAllocator,
    ) -> Self {
        Self {
            mesh,
            equation,
            tags,
            allocator,
        }
    }

    /// Local block of one material element
    pub fn build(&self, element: ElementId) -> Result<LocalBlock> {
        let array = self
            .mesh
            .elements_of(element.element_type)
            .ok_or_else(|| TlmError::config(format!("mesh has no element {element}")))?;
        let tag = array.tag(element.index);
        let material = match self.tags.resolve(tag) {
            Some(TagClass::Material(m)) => m,
            _ => {
                return Err(TlmError::config(format!(
                    "{element} (tag {tag}) is not a material element"
                )))
            }
        };
        let (real_node, first_port) = self
            .allocator
            .real_node_and_port(element)
            .ok_or_else(|| TlmError::config(format!("{element} has no real numbering")))?;
        let numbering = PortNumbering {
            real_node,
            first_port,
            stub_port: self.allocator.stub_port(element),
        };

        let vertices = self.mesh.vertex_coords(element)?;
        let geometry = ElementGeometry::new(element, &vertices)?;
        LocalBlock::build(
            element,
            material,
            &self.equation.materials[material],
            &geometry,
            numbering,
            self.equation.time_step,
            self.equation.initial_value_of(material),
        )
    }

    /// Local blocks of every material element, indexed by real node
    pub fn build_all(&self) -> Result<Vec<LocalBlock>> {
        let elements: Vec<ElementId> = self.allocator.material_elements().collect();

        #[cfg(feature = "parallel")]
        let blocks = elements
            .par_iter()
            .map(|&element| self.build(element))
            .collect::<Result<Vec<_>>>()?;
        #[cfg(not(feature = "parallel"))]
        let blocks = elements
            .iter()
            .map(|&element| self.build(element))
            .collect::<Result<Vec<_>>>()?;

        log::debug!("built {} local blocks", blocks.len());
        Ok(blocks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MaterialSpec;
    use crate::mesh::{strip_triangles, MATERIAL_TAG};
    use approx::assert_relative_eq;

    #[test]
    fn test_build_all_follows_real_nodes() {
        let mesh = strip_triangles(3);
        let equation = EquationConfig::new(0.01)
            .with_material(MaterialSpec::new(vec![MATERIAL_TAG], 1.0, 1.0));
        let tags = equation.tag_table().unwrap();
        let allocator = PortAllocator::initiate(&mesh, &equation, &tags).unwrap();
        let blocks = ElementMatrixBuilder::new(&mesh, &equation, &tags, &allocator)
            .build_all()
            .unwrap();

        assert_eq!(blocks.len(), 3);
        for (node, block) in blocks.iter().enumerate() {
            assert_eq!(block.real_node, node);
            assert_eq!(block.first_port, 3 * node);
            for p in 0..3 {
                assert_relative_eq!(block.row_sum(p), 1.0, epsilon = 1e-12);
            }
        }
    }
}
