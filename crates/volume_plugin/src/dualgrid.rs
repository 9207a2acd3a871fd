//! Dual-grid generation: octree dual contouring.
//!
//! Walks a completed octree with the classic face/edge/vertex recursion,
//! emitting "dual cells" (hexahedral cells spanning the centers of 8
//! mutually adjacent leaves) and triangulating each with Marching Cubes.
//! Where a dual cell touches the octree's own boundary and that boundary is
//! interior to the whole meshed volume, extra half-cells and Marching-Squares
//! "skirts" are emitted so neighboring chunks tile without cracks.
//!
//! The recursion order (all of a face's child pairs before the next face,
//! faces before edges, edges before the vertex) is load-bearing for the
//! border stitching and must not be reordered.

use glam::Vec3;

use crate::isosurface::{DualCellFace, IsoSurface};
use crate::mesh::MeshBuilder;
use crate::octree::OctreeNode;
use crate::types::{LineList, VolumeSample};

/// One emitted dual cell, retained only for debug visualization.
#[derive(Clone, Debug)]
pub struct DualCell {
  /// Corners in octant ring order.
  pub corners: [Vec3; 8],
}

/// Walks an octree and feeds dual cells to the iso-surface triangulator.
#[derive(Default)]
pub struct DualGridGenerator {
  dual_cells: Vec<DualCell>,
}

impl DualGridGenerator {
  pub fn new() -> Self {
    Self::default()
  }

  /// Generate the dual grid of `root` into `builder`.
  ///
  /// `total_from`/`total_to` are the bounds of the *whole* volume being
  /// meshed (across all chunks); octree faces coinciding with them get no
  /// seam geometry since there is no neighbor to stitch against.
  /// `max_ms_distance` limits how far from the surface seam triangles are
  /// still generated. With `save_dual_cells` the emitted cells are retained
  /// for [`DualGridGenerator::dual_grid`].
  #[allow(clippy::too_many_arguments)]
  pub fn generate_dual_grid(
    &mut self,
    root: &OctreeNode,
    iso: &IsoSurface<'_>,
    builder: &mut MeshBuilder,
    max_ms_distance: f32,
    total_from: Vec3,
    total_to: Vec3,
    save_dual_cells: bool,
  ) {
    let mut walker = Walker {
      root,
      iso,
      builder,
      max_ms_distance,
      total_from,
      total_to,
      save_dual_cells,
      dual_cells: &mut self.dual_cells,
    };

    walker.node_proc(root);

    // Build up a minimal dual grid for octrees without children: the 8
    // center-to-corner octants a subdivided root would have produced.
    if !root.is_subdivided() {
      let r = root;
      walker.add_dual_cell(
        [
          r.from(),
          r.center_back_bottom(),
          r.center_bottom(),
          r.center_left_bottom(),
          r.center_back_left(),
          r.center_back(),
          r.center(),
          r.center_left(),
        ],
        None,
      );
      walker.add_dual_cell(
        [
          r.center_back_bottom(),
          r.corner_1(),
          r.center_right_bottom(),
          r.center_bottom(),
          r.center_back(),
          r.center_back_right(),
          r.center_right(),
          r.center(),
        ],
        None,
      );
      walker.add_dual_cell(
        [
          r.center_bottom(),
          r.center_right_bottom(),
          r.corner_2(),
          r.center_front_bottom(),
          r.center(),
          r.center_right(),
          r.center_front_right(),
          r.center_front(),
        ],
        None,
      );
      walker.add_dual_cell(
        [
          r.center_left_bottom(),
          r.center_bottom(),
          r.center_front_bottom(),
          r.corner_3(),
          r.center_left(),
          r.center(),
          r.center_front(),
          r.center_front_left(),
        ],
        None,
      );
      walker.add_dual_cell(
        [
          r.center_back_left(),
          r.center_back(),
          r.center(),
          r.center_left(),
          r.corner_4(),
          r.center_back_top(),
          r.center_top(),
          r.center_left_top(),
        ],
        None,
      );
      walker.add_dual_cell(
        [
          r.center_back(),
          r.center_back_right(),
          r.center_right(),
          r.center(),
          r.center_back_top(),
          r.corner_5(),
          r.center_right_top(),
          r.center_top(),
        ],
        None,
      );
      walker.add_dual_cell(
        [
          r.center(),
          r.center_right(),
          r.center_front_right(),
          r.center_front(),
          r.center_top(),
          r.center_right_top(),
          r.to(),
          r.center_front_top(),
        ],
        None,
      );
      walker.add_dual_cell(
        [
          r.center_left(),
          r.center(),
          r.center_front(),
          r.center_front_left(),
          r.center_left_top(),
          r.center_top(),
          r.center_front_top(),
          r.corner_7(),
        ],
        None,
      );
    }
  }

  /// Number of dual cells retained (requires `save_dual_cells`).
  pub fn dual_cell_count(&self) -> usize {
    self.dual_cells.len()
  }

  /// Debug line list of every retained dual cell's edges.
  pub fn dual_grid(&self) -> LineList {
    let mut lines = LineList::new();
    for cell in &self.dual_cells {
      lines.add_box(&cell.corners);
    }
    lines
  }
}

/// Transient traversal state; lives for one `generate_dual_grid` call.
struct Walker<'a, 'b> {
  root: &'a OctreeNode,
  iso: &'a IsoSurface<'a>,
  builder: &'b mut MeshBuilder,
  max_ms_distance: f32,
  total_from: Vec3,
  total_to: Vec3,
  save_dual_cells: bool,
  dual_cells: &'b mut Vec<DualCell>,
}

impl<'a> Walker<'a, '_> {
  fn node_proc(&mut self, n: &'a OctreeNode) {
    let Some(c) = n.children() else {
      return;
    };

    for child in c.iter() {
      self.node_proc(child);
    }

    self.face_proc_xy(&c[0], &c[3]);
    self.face_proc_xy(&c[1], &c[2]);
    self.face_proc_xy(&c[4], &c[7]);
    self.face_proc_xy(&c[5], &c[6]);

    self.face_proc_zy(&c[0], &c[1]);
    self.face_proc_zy(&c[3], &c[2]);
    self.face_proc_zy(&c[4], &c[5]);
    self.face_proc_zy(&c[7], &c[6]);

    self.face_proc_xz(&c[4], &c[0]);
    self.face_proc_xz(&c[5], &c[1]);
    self.face_proc_xz(&c[7], &c[3]);
    self.face_proc_xz(&c[6], &c[2]);

    self.edge_proc_x(&c[0], &c[3], &c[7], &c[4]);
    self.edge_proc_x(&c[1], &c[2], &c[6], &c[5]);

    self.edge_proc_y(&c[0], &c[1], &c[2], &c[3]);
    self.edge_proc_y(&c[4], &c[5], &c[6], &c[7]);

    self.edge_proc_z(&c[7], &c[6], &c[2], &c[3]);
    self.edge_proc_z(&c[4], &c[5], &c[1], &c[0]);

    self.vert_proc(&c[0], &c[1], &c[2], &c[3], &c[4], &c[5], &c[6], &c[7]);
  }

  /// Shared face with normal along z, n0 behind n1 (in -z).
  fn face_proc_xy(&mut self, n0: &'a OctreeNode, n1: &'a OctreeNode) {
    if !n0.is_subdivided() && !n1.is_subdivided() {
      return;
    }

    let c0 = n0.child_or_self(3);
    let c1 = n0.child_or_self(2);
    let c2 = n1.child_or_self(1);
    let c3 = n1.child_or_self(0);
    let c4 = n0.child_or_self(7);
    let c5 = n0.child_or_self(6);
    let c6 = n1.child_or_self(5);
    let c7 = n1.child_or_self(4);

    self.face_proc_xy(c0, c3);
    self.face_proc_xy(c1, c2);
    self.face_proc_xy(c4, c7);
    self.face_proc_xy(c5, c6);

    self.edge_proc_x(c0, c3, c7, c4);
    self.edge_proc_x(c1, c2, c6, c5);
    self.edge_proc_y(c0, c1, c2, c3);
    self.edge_proc_y(c4, c5, c6, c7);

    self.vert_proc(c0, c1, c2, c3, c4, c5, c6, c7);
  }

  /// Shared face with normal along x, n0 left of n1 (in -x).
  fn face_proc_zy(&mut self, n0: &'a OctreeNode, n1: &'a OctreeNode) {
    if !n0.is_subdivided() && !n1.is_subdivided() {
      return;
    }

    let c0 = n0.child_or_self(1);
    let c1 = n1.child_or_self(0);
    let c2 = n1.child_or_self(3);
    let c3 = n0.child_or_self(2);
    let c4 = n0.child_or_self(5);
    let c5 = n1.child_or_self(4);
    let c6 = n1.child_or_self(7);
    let c7 = n0.child_or_self(6);

    self.face_proc_zy(c0, c1);
    self.face_proc_zy(c3, c2);
    self.face_proc_zy(c4, c5);
    self.face_proc_zy(c7, c6);

    self.edge_proc_y(c0, c1, c2, c3);
    self.edge_proc_y(c4, c5, c6, c7);
    self.edge_proc_z(c7, c6, c2, c3);
    self.edge_proc_z(c4, c5, c1, c0);

    self.vert_proc(c0, c1, c2, c3, c4, c5, c6, c7);
  }

  /// Shared face with normal along y, n0 above n1 (in +y).
  fn face_proc_xz(&mut self, n0: &'a OctreeNode, n1: &'a OctreeNode) {
    if !n0.is_subdivided() && !n1.is_subdivided() {
      return;
    }

    let c0 = n1.child_or_self(4);
    let c1 = n1.child_or_self(5);
    let c2 = n1.child_or_self(6);
    let c3 = n1.child_or_self(7);
    let c4 = n0.child_or_self(0);
    let c5 = n0.child_or_self(1);
    let c6 = n0.child_or_self(2);
    let c7 = n0.child_or_self(3);

    self.face_proc_xz(c4, c0);
    self.face_proc_xz(c5, c1);
    self.face_proc_xz(c7, c3);
    self.face_proc_xz(c6, c2);

    self.edge_proc_x(c0, c3, c7, c4);
    self.edge_proc_x(c1, c2, c6, c5);
    self.edge_proc_z(c7, c6, c2, c3);
    self.edge_proc_z(c4, c5, c1, c0);

    self.vert_proc(c0, c1, c2, c3, c4, c5, c6, c7);
  }

  fn edge_proc_x(
    &mut self,
    n0: &'a OctreeNode,
    n1: &'a OctreeNode,
    n2: &'a OctreeNode,
    n3: &'a OctreeNode,
  ) {
    if !n0.is_subdivided() && !n1.is_subdivided() && !n2.is_subdivided() && !n3.is_subdivided() {
      return;
    }

    let c0 = n0.child_or_self(7);
    let c1 = n0.child_or_self(6);
    let c2 = n1.child_or_self(5);
    let c3 = n1.child_or_self(4);
    let c4 = n3.child_or_self(3);
    let c5 = n3.child_or_self(2);
    let c6 = n2.child_or_self(1);
    let c7 = n2.child_or_self(0);

    self.edge_proc_x(c0, c3, c7, c4);
    self.edge_proc_x(c1, c2, c6, c5);

    self.vert_proc(c0, c1, c2, c3, c4, c5, c6, c7);
  }

  fn edge_proc_y(
    &mut self,
    n0: &'a OctreeNode,
    n1: &'a OctreeNode,
    n2: &'a OctreeNode,
    n3: &'a OctreeNode,
  ) {
    if !n0.is_subdivided() && !n1.is_subdivided() && !n2.is_subdivided() && !n3.is_subdivided() {
      return;
    }

    let c0 = n0.child_or_self(2);
    let c1 = n1.child_or_self(3);
    let c2 = n2.child_or_self(0);
    let c3 = n3.child_or_self(1);
    let c4 = n0.child_or_self(6);
    let c5 = n1.child_or_self(7);
    let c6 = n2.child_or_self(4);
    let c7 = n3.child_or_self(5);

    self.edge_proc_y(c0, c1, c2, c3);
    self.edge_proc_y(c4, c5, c6, c7);

    self.vert_proc(c0, c1, c2, c3, c4, c5, c6, c7);
  }

  fn edge_proc_z(
    &mut self,
    n0: &'a OctreeNode,
    n1: &'a OctreeNode,
    n2: &'a OctreeNode,
    n3: &'a OctreeNode,
  ) {
    if !n0.is_subdivided() && !n1.is_subdivided() && !n2.is_subdivided() && !n3.is_subdivided() {
      return;
    }

    let c0 = n3.child_or_self(5);
    let c1 = n2.child_or_self(4);
    let c2 = n2.child_or_self(7);
    let c3 = n3.child_or_self(6);
    let c4 = n0.child_or_self(1);
    let c5 = n1.child_or_self(0);
    let c6 = n1.child_or_self(3);
    let c7 = n0.child_or_self(2);

    self.edge_proc_z(c7, c6, c2, c3);
    self.edge_proc_z(c4, c5, c1, c0);

    self.vert_proc(c0, c1, c2, c3, c4, c5, c6, c7);
  }

  #[allow(clippy::too_many_arguments)]
  fn vert_proc(
    &mut self,
    n0: &'a OctreeNode,
    n1: &'a OctreeNode,
    n2: &'a OctreeNode,
    n3: &'a OctreeNode,
    n4: &'a OctreeNode,
    n5: &'a OctreeNode,
    n6: &'a OctreeNode,
    n7: &'a OctreeNode,
  ) {
    let any_subdivided = n0.is_subdivided()
      || n1.is_subdivided()
      || n2.is_subdivided()
      || n3.is_subdivided()
      || n4.is_subdivided()
      || n5.is_subdivided()
      || n6.is_subdivided()
      || n7.is_subdivided();

    if any_subdivided {
      // Substitute each subdivided node with its child touching the shared
      // vertex and keep descending.
      let c0 = n0.child_or_self(6);
      let c1 = n1.child_or_self(7);
      let c2 = n2.child_or_self(4);
      let c3 = n3.child_or_self(5);
      let c4 = n4.child_or_self(2);
      let c5 = n5.child_or_self(3);
      let c6 = n6.child_or_self(0);
      let c7 = n7.child_or_self(1);
      self.vert_proc(c0, c1, c2, c3, c4, c5, c6, c7);
      return;
    }

    // Genuine dual cell of 8 mutual leaf neighbors. Skip it when the
    // surface provably misses all of them; Marching Cubes would emit
    // nothing anyway.
    if !n0.is_iso_surface_near()
      && !n1.is_iso_surface_near()
      && !n2.is_iso_surface_near()
      && !n3.is_iso_surface_near()
      && !n4.is_iso_surface_near()
      && !n5.is_iso_surface_near()
      && !n6.is_iso_surface_near()
      && !n7.is_iso_surface_near()
    {
      return;
    }

    let values = [
      n0.center_value(),
      n1.center_value(),
      n2.center_value(),
      n3.center_value(),
      n4.center_value(),
      n5.center_value(),
      n6.center_value(),
      n7.center_value(),
    ];
    self.add_dual_cell(
      [
        n0.center(),
        n1.center(),
        n2.center(),
        n3.center(),
        n4.center(),
        n5.center(),
        n6.center(),
        n7.center(),
      ],
      Some(&values),
    );
    self.create_border_cells(n0, n1, n2, n3, n4, n5, n6, n7);
  }

  /// Emit the half-cell skirting geometry where this dual cell's leaves sit
  /// on the octree's own boundary faces, cascading into edge and corner
  /// cells where multiple boundary conditions coincide.
  #[allow(clippy::too_many_arguments)]
  fn create_border_cells(
    &mut self,
    n0: &'a OctreeNode,
    n1: &'a OctreeNode,
    n2: &'a OctreeNode,
    n3: &'a OctreeNode,
    n4: &'a OctreeNode,
    n5: &'a OctreeNode,
    n6: &'a OctreeNode,
    n7: &'a OctreeNode,
  ) {
    let root = self.root;
    if n0.is_border_back(root)
      && n1.is_border_back(root)
      && n4.is_border_back(root)
      && n5.is_border_back(root)
    {
      self.add_dual_cell(
        [
          n0.center_back(),
          n1.center_back(),
          n1.center(),
          n0.center(),
          n4.center_back(),
          n5.center_back(),
          n5.center(),
          n4.center(),
        ],
        None,
      );
      // Back edge border cells.
      if n4.is_border_top(root) && n5.is_border_top(root) {
        self.add_dual_cell(
          [
            n4.center_back(),
            n5.center_back(),
            n5.center(),
            n4.center(),
            n4.center_back_top(),
            n5.center_back_top(),
            n5.center_top(),
            n4.center_top(),
          ],
          None,
        );
        // Back top corner cells.
        if n4.is_border_left(root) {
          self.add_dual_cell(
            [
              n4.center_back_left(),
              n4.center_back(),
              n4.center(),
              n4.center_left(),
              n4.corner_4(),
              n4.center_back_top(),
              n4.center_top(),
              n4.center_left_top(),
            ],
            None,
          );
        }
        if n5.is_border_right(root) {
          self.add_dual_cell(
            [
              n5.center_back(),
              n5.center_back_right(),
              n5.center_right(),
              n5.center(),
              n5.center_back_top(),
              n5.corner_5(),
              n5.center_right_top(),
              n5.center_top(),
            ],
            None,
          );
        }
      }
      if n0.is_border_bottom(root) && n1.is_border_bottom(root) {
        self.add_dual_cell(
          [
            n0.center_back_bottom(),
            n1.center_back_bottom(),
            n1.center_bottom(),
            n0.center_bottom(),
            n0.center_back(),
            n1.center_back(),
            n1.center(),
            n0.center(),
          ],
          None,
        );
        // Back bottom corner cells.
        if n0.is_border_left(root) {
          self.add_dual_cell(
            [
              n0.from(),
              n0.center_back_bottom(),
              n0.center_bottom(),
              n0.center_left_bottom(),
              n0.center_back_left(),
              n0.center_back(),
              n0.center(),
              n0.center_left(),
            ],
            None,
          );
        }
        if n1.is_border_right(root) {
          self.add_dual_cell(
            [
              n1.center_back_bottom(),
              n1.corner_1(),
              n1.center_right_bottom(),
              n1.center_bottom(),
              n1.center_back(),
              n1.center_back_right(),
              n1.center_right(),
              n1.center(),
            ],
            None,
          );
        }
      }
    }
    if n2.is_border_front(root)
      && n3.is_border_front(root)
      && n6.is_border_front(root)
      && n7.is_border_front(root)
    {
      self.add_dual_cell(
        [
          n3.center(),
          n2.center(),
          n2.center_front(),
          n3.center_front(),
          n7.center(),
          n6.center(),
          n6.center_front(),
          n7.center_front(),
        ],
        None,
      );
      // Front edge border cells.
      if n6.is_border_top(root) && n7.is_border_top(root) {
        self.add_dual_cell(
          [
            n7.center(),
            n6.center(),
            n6.center_front(),
            n7.center_front(),
            n7.center_top(),
            n6.center_top(),
            n6.center_front_top(),
            n7.center_front_top(),
          ],
          None,
        );
        // Front top corner cells.
        if n7.is_border_left(root) {
          self.add_dual_cell(
            [
              n7.center_left(),
              n7.center(),
              n7.center_front(),
              n7.center_front_left(),
              n7.center_left_top(),
              n7.center_top(),
              n7.center_front_top(),
              n7.corner_7(),
            ],
            None,
          );
        }
        if n6.is_border_right(root) {
          self.add_dual_cell(
            [
              n6.center(),
              n6.center_right(),
              n6.center_front_right(),
              n6.center_front(),
              n6.center_top(),
              n6.center_right_top(),
              n6.to(),
              n6.center_front_top(),
            ],
            None,
          );
        }
      }
      if n3.is_border_bottom(root) && n2.is_border_bottom(root) {
        self.add_dual_cell(
          [
            n3.center_bottom(),
            n2.center_bottom(),
            n2.center_front_bottom(),
            n3.center_front_bottom(),
            n3.center(),
            n2.center(),
            n2.center_front(),
            n3.center_front(),
          ],
          None,
        );
        // Front bottom corner cells.
        if n3.is_border_left(root) {
          self.add_dual_cell(
            [
              n3.center_left_bottom(),
              n3.center_bottom(),
              n3.center_front_bottom(),
              n3.corner_3(),
              n3.center_left(),
              n3.center(),
              n3.center_front(),
              n3.center_front_left(),
            ],
            None,
          );
        }
        if n2.is_border_right(root) {
          self.add_dual_cell(
            [
              n2.center_bottom(),
              n2.center_right_bottom(),
              n2.corner_2(),
              n2.center_front_bottom(),
              n2.center(),
              n2.center_right(),
              n2.center_front_right(),
              n2.center_front(),
            ],
            None,
          );
        }
      }
    }
    if n0.is_border_left(root)
      && n3.is_border_left(root)
      && n4.is_border_left(root)
      && n7.is_border_left(root)
    {
      self.add_dual_cell(
        [
          n0.center_left(),
          n0.center(),
          n3.center(),
          n3.center_left(),
          n4.center_left(),
          n4.center(),
          n7.center(),
          n7.center_left(),
        ],
        None,
      );
      // Left edge border cells.
      if n4.is_border_top(root) && n7.is_border_top(root) {
        self.add_dual_cell(
          [
            n4.center_left(),
            n4.center(),
            n7.center(),
            n7.center_left(),
            n4.center_left_top(),
            n4.center_top(),
            n7.center_top(),
            n7.center_left_top(),
          ],
          None,
        );
      }
      if n0.is_border_bottom(root) && n3.is_border_bottom(root) {
        self.add_dual_cell(
          [
            n0.center_left_bottom(),
            n0.center_bottom(),
            n3.center_bottom(),
            n3.center_left_bottom(),
            n0.center_left(),
            n0.center(),
            n3.center(),
            n3.center_left(),
          ],
          None,
        );
      }
      if n0.is_border_back(root) && n4.is_border_back(root) {
        self.add_dual_cell(
          [
            n0.center_back_left(),
            n0.center_back(),
            n0.center(),
            n0.center_left(),
            n4.center_back_left(),
            n4.center_back(),
            n4.center(),
            n4.center_left(),
          ],
          None,
        );
      }
      if n3.is_border_front(root) && n7.is_border_front(root) {
        self.add_dual_cell(
          [
            n3.center_left(),
            n3.center(),
            n3.center_front(),
            n3.center_front_left(),
            n7.center_left(),
            n7.center(),
            n7.center_front(),
            n7.center_front_left(),
          ],
          None,
        );
      }
    }
    if n1.is_border_right(root)
      && n2.is_border_right(root)
      && n5.is_border_right(root)
      && n6.is_border_right(root)
    {
      self.add_dual_cell(
        [
          n1.center(),
          n1.center_right(),
          n2.center_right(),
          n2.center(),
          n5.center(),
          n5.center_right(),
          n6.center_right(),
          n6.center(),
        ],
        None,
      );
      // Right edge border cells.
      if n5.is_border_top(root) && n6.is_border_top(root) {
        self.add_dual_cell(
          [
            n5.center(),
            n5.center_right(),
            n6.center_right(),
            n6.center(),
            n5.center_top(),
            n5.center_right_top(),
            n6.center_right_top(),
            n6.center_top(),
          ],
          None,
        );
      }
      if n1.is_border_bottom(root) && n2.is_border_bottom(root) {
        self.add_dual_cell(
          [
            n1.center_bottom(),
            n1.center_right_bottom(),
            n2.center_right_bottom(),
            n2.center_bottom(),
            n1.center(),
            n1.center_right(),
            n2.center_right(),
            n2.center(),
          ],
          None,
        );
      }
      if n1.is_border_back(root) && n5.is_border_back(root) {
        self.add_dual_cell(
          [
            n1.center_back(),
            n1.center_back_right(),
            n1.center_right(),
            n1.center(),
            n5.center_back(),
            n5.center_back_right(),
            n5.center_right(),
            n5.center(),
          ],
          None,
        );
      }
      if n2.is_border_front(root) && n6.is_border_front(root) {
        self.add_dual_cell(
          [
            n2.center(),
            n2.center_right(),
            n2.center_front_right(),
            n2.center_front(),
            n6.center(),
            n6.center_right(),
            n6.center_front_right(),
            n6.center_front(),
          ],
          None,
        );
      }
    }
    if n4.is_border_top(root)
      && n5.is_border_top(root)
      && n6.is_border_top(root)
      && n7.is_border_top(root)
    {
      self.add_dual_cell(
        [
          n4.center(),
          n5.center(),
          n6.center(),
          n7.center(),
          n4.center_top(),
          n5.center_top(),
          n6.center_top(),
          n7.center_top(),
        ],
        None,
      );
    }
    if n0.is_border_bottom(root)
      && n1.is_border_bottom(root)
      && n2.is_border_bottom(root)
      && n3.is_border_bottom(root)
    {
      self.add_dual_cell(
        [
          n0.center_bottom(),
          n1.center_bottom(),
          n2.center_bottom(),
          n3.center_bottom(),
          n0.center(),
          n1.center(),
          n2.center(),
          n3.center(),
        ],
        None,
      );
    }
  }

  /// Triangulate one dual cell: full Marching Cubes, then a Marching-Squares
  /// seam on every face that lies on the octree's boundary but not on the
  /// whole volume's boundary.
  fn add_dual_cell(&mut self, corners: [Vec3; 8], values: Option<&[Option<VolumeSample>; 8]>) {
    if self.save_dual_cells {
      self.dual_cells.push(DualCell { corners });
    }

    self
      .iso
      .add_marching_cubes_triangles(&corners, values, self.builder);

    let root = self.root;
    let max_ms_distance = self.max_ms_distance;
    if corners[0].z == root.from().z && corners[0].z != self.total_from.z {
      self.iso.add_marching_squares_triangles(
        &corners,
        values,
        DualCellFace::Back,
        max_ms_distance,
        self.builder,
      );
    }
    if corners[2].z == root.to().z && corners[2].z != self.total_to.z {
      self.iso.add_marching_squares_triangles(
        &corners,
        values,
        DualCellFace::Front,
        max_ms_distance,
        self.builder,
      );
    }
    if corners[0].x == root.from().x && corners[0].x != self.total_from.x {
      self.iso.add_marching_squares_triangles(
        &corners,
        values,
        DualCellFace::Left,
        max_ms_distance,
        self.builder,
      );
    }
    if corners[1].x == root.to().x && corners[1].x != self.total_to.x {
      self.iso.add_marching_squares_triangles(
        &corners,
        values,
        DualCellFace::Right,
        max_ms_distance,
        self.builder,
      );
    }
    if corners[4].y == root.to().y && corners[4].y != self.total_to.y {
      self.iso.add_marching_squares_triangles(
        &corners,
        values,
        DualCellFace::Top,
        max_ms_distance,
        self.builder,
      );
    }
    if corners[0].y == root.from().y && corners[0].y != self.total_from.y {
      self.iso.add_marching_squares_triangles(
        &corners,
        values,
        DualCellFace::Bottom,
        max_ms_distance,
        self.builder,
      );
    }
  }
}

#[cfg(test)]
#[path = "dualgrid_test.rs"]
mod dualgrid_test;
