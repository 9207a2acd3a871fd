//! Chunk LOD tree with background geometry builds.
//!
//! A [`Chunk`] tree mirrors the spatial layout of the volume at every level
//! of detail: the root covers the whole volume at the coarsest error budget,
//! each level below it halves the cell size and the budget. Geometry for each
//! chunk is built on a worker thread (octree split + dual grid) and installed
//! back on the owning thread when its completion is drained through the
//! [`ChunkHandler`].
//!
//! Per-frame LOD selection ([`Chunk::frame_started`]) picks, along every path
//! from the root to a leaf, the coarsest chunk whose projected screen-space
//! error is under the configured budget, and hides everything below it.

pub mod handler;

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use glam::Vec3;
use thiserror::Error;
use tracing::{debug, trace};

use crate::camera::Camera;
use crate::dualgrid::DualGridGenerator;
use crate::mesh::{MeshBuilder, MeshBuilderCallback, MeshOwner};
use crate::octree::{children_dimensions, OctreeNode};
use crate::source::VolumeSource;
use crate::types::{Aabb, LineList, MeshOutput};

pub use handler::{ChunkHandler, ChunkRequest};

/// Identifies one chunk within its tree, used to route build completions.
pub type ChunkId = u64;

/// Errors from [`Chunk::load`].
#[derive(Debug, Error)]
pub enum LoadError {
  /// `base_error` or `error_multiplicator` was zero; the split policy and
  /// the LOD budgets are meaningless without them.
  #[error("base_error and error_multiplicator must be non-zero")]
  InvalidParameters,
}

/// Configuration of one chunk tree load.
#[derive(Clone)]
pub struct ChunkParameters {
  /// Density field to mesh. Sampled concurrently from worker threads.
  pub src: Arc<dyn VolumeSource>,
  /// Geometric error budget of the finest LOD level. Required, non-zero.
  pub base_error: f32,
  /// Per-level scale factor on the error budget.
  pub error_multiplicator: f32,
  /// Retain octree cell edges for debug rendering.
  pub create_octree_visualization: bool,
  /// Retain dual-grid cell edges for debug rendering.
  pub create_dual_grid_visualization: bool,
  /// Scales the maximum seam-generation distance. 0 disables skirts.
  pub skirt_factor: f32,
  /// Optional notification with the raw triangle data of every built level.
  pub lod_callback: Option<Arc<dyn MeshBuilderCallback>>,
  /// Uniform world scale of the whole tree.
  pub scale: f32,
  /// Visibility threshold in projected pixels.
  pub max_screen_space_error: f32,
  /// Skip geometry generation for levels coarser than this. 0 generates all.
  pub create_geometry_from_level: u32,
  /// When false, `load` blocks until every dispatched build has landed.
  pub async_load: bool,
}

impl ChunkParameters {
  pub fn new(src: Arc<dyn VolumeSource>, base_error: f32) -> Self {
    Self {
      src,
      base_error,
      error_multiplicator: 1.0,
      create_octree_visualization: false,
      create_dual_grid_visualization: false,
      skirt_factor: 0.0,
      lod_callback: None,
      scale: 1.0,
      max_screen_space_error: 0.0,
      create_geometry_from_level: 0,
      async_load: false,
    }
  }

  pub fn with_error_multiplicator(mut self, error_multiplicator: f32) -> Self {
    self.error_multiplicator = error_multiplicator;
    self
  }

  pub fn with_octree_visualization(mut self, enabled: bool) -> Self {
    self.create_octree_visualization = enabled;
    self
  }

  pub fn with_dual_grid_visualization(mut self, enabled: bool) -> Self {
    self.create_dual_grid_visualization = enabled;
    self
  }

  pub fn with_skirt_factor(mut self, skirt_factor: f32) -> Self {
    self.skirt_factor = skirt_factor;
    self
  }

  pub fn with_lod_callback(mut self, callback: Arc<dyn MeshBuilderCallback>) -> Self {
    self.lod_callback = Some(callback);
    self
  }

  pub fn with_scale(mut self, scale: f32) -> Self {
    self.scale = scale;
    self
  }

  pub fn with_max_screen_space_error(mut self, max_screen_space_error: f32) -> Self {
    self.max_screen_space_error = max_screen_space_error;
    self
  }

  pub fn with_create_geometry_from_level(mut self, level: u32) -> Self {
    self.create_geometry_from_level = level;
    self
  }

  pub fn with_async_load(mut self, async_load: bool) -> Self {
    self.async_load = async_load;
    self
  }

  fn validate(&self) -> Result<(), LoadError> {
    if self.base_error == 0.0 || self.error_multiplicator == 0.0 {
      return Err(LoadError::InvalidParameters);
    }
    Ok(())
  }
}

/// State shared by every chunk of one tree.
pub struct ChunkTreeShared {
  parameters: ChunkParameters,
  /// Builds dispatched but not yet finalized.
  chunks_being_processed: AtomicUsize,
  octree_visible: AtomicBool,
  dual_grid_visible: AtomicBool,
  volume_visible: AtomicBool,
  next_chunk_id: AtomicU64,
  /// Bumped on every reload; completions from earlier epochs are stale.
  load_epoch: AtomicU64,
}

impl ChunkTreeShared {
  fn new(parameters: ChunkParameters) -> Self {
    Self {
      parameters,
      chunks_being_processed: AtomicUsize::new(0),
      octree_visible: AtomicBool::new(false),
      dual_grid_visible: AtomicBool::new(false),
      volume_visible: AtomicBool::new(true),
      next_chunk_id: AtomicU64::new(0),
      load_epoch: AtomicU64::new(0),
    }
  }

  pub fn parameters(&self) -> &ChunkParameters {
    &self.parameters
  }

  fn next_id(&self) -> ChunkId {
    self.next_chunk_id.fetch_add(1, Ordering::Relaxed)
  }

  pub(crate) fn current_epoch(&self) -> u64 {
    self.load_epoch.load(Ordering::SeqCst)
  }

  pub(crate) fn builds_in_flight(&self) -> usize {
    self.chunks_being_processed.load(Ordering::SeqCst)
  }

  pub(crate) fn build_finished(&self) {
    self.chunks_being_processed.fetch_sub(1, Ordering::SeqCst);
  }
}

/// Children of a chunk.
///
/// At two remaining levels the tree degenerates to a single pass-through
/// child covering the same box one level finer, since the finest levels all
/// render at the same geometric size and need no further subdivision.
pub enum ChunkChildren {
  None,
  PassThrough(Box<Chunk>),
  Eight(Box<[Chunk; 8]>),
}

impl ChunkChildren {
  fn as_slice(&self) -> &[Chunk] {
    match self {
      ChunkChildren::None => &[],
      ChunkChildren::PassThrough(child) => std::slice::from_ref(child),
      ChunkChildren::Eight(children) => &children[..],
    }
  }

  fn as_mut_slice(&mut self) -> &mut [Chunk] {
    match self {
      ChunkChildren::None => &mut [],
      ChunkChildren::PassThrough(child) => std::slice::from_mut(child),
      ChunkChildren::Eight(children) => &mut children[..],
    }
  }
}

/// One node of the LOD tree.
pub struct Chunk {
  id: ChunkId,
  shared: Arc<ChunkTreeShared>,
  from: Vec3,
  to: Vec3,
  /// Remaining levels below and including this chunk; 1 is the finest.
  level: u32,
  /// Geometric error budget this chunk was built with.
  error: f32,
  /// Set when the build yielded zero triangles: the cell holds no surface.
  invisible: bool,
  /// Per-frame render visibility decided by LOD selection.
  visible: bool,
  mesh: Option<MeshOutput>,
  bounds: Aabb,
  material: Option<String>,
  octree_visualization: Option<LineList>,
  dual_grid_visualization: Option<LineList>,
  children: ChunkChildren,
}

impl Chunk {
  /// Build a chunk tree over `[from, to]` with `level_count` LOD levels.
  ///
  /// Dispatches one background build per contributing chunk. With
  /// `async_load` unset this blocks, draining completions, until every
  /// build has been finalized; otherwise the caller must pump
  /// [`ChunkHandler::process_work_queue`] until
  /// [`Chunk::builds_in_flight`] returns 0.
  pub fn load(
    from: Vec3,
    to: Vec3,
    level_count: u32,
    parameters: ChunkParameters,
    handler: &ChunkHandler,
  ) -> Result<Chunk, LoadError> {
    parameters.validate()?;
    let async_load = parameters.async_load;
    let shared = Arc::new(ChunkTreeShared::new(parameters));
    debug!(?from, ?to, level_count, "loading volume chunk tree");

    let mut root = Chunk::new_node(&shared);
    root.do_load(from, to, from, to, level_count, None, handler);

    if !async_load {
      handler.drain_until_idle(&mut root);
    }
    Ok(root)
  }

  /// Rebuild the parts of the tree whose boxes intersect `region`. Chunks
  /// outside the region keep their current geometry and children untouched.
  pub fn update(&mut self, region: Aabb, handler: &ChunkHandler) {
    let (from, to, level) = (self.from, self.to, self.level);
    debug!(?region, "updating volume chunk tree");
    // Builds dispatched before this update are obsolete: advance the epoch
    // so their completions are discarded, then restart the counter for the
    // builds of this load.
    self.shared.load_epoch.fetch_add(1, Ordering::SeqCst);
    self
      .shared
      .chunks_being_processed
      .store(0, Ordering::SeqCst);
    let shared = Arc::clone(&self.shared);
    self.do_load(from, to, from, to, level, Some(&region), handler);
    if !shared.parameters.async_load {
      handler.drain_until_idle(self);
    }
  }

  fn new_node(shared: &Arc<ChunkTreeShared>) -> Chunk {
    Chunk {
      id: shared.next_id(),
      shared: Arc::clone(shared),
      from: Vec3::ZERO,
      to: Vec3::ZERO,
      level: 0,
      error: 0.0,
      invisible: false,
      visible: false,
      mesh: None,
      bounds: Aabb::empty(),
      material: None,
      octree_visualization: None,
      dual_grid_visualization: None,
      children: ChunkChildren::None,
    }
  }

  #[allow(clippy::too_many_arguments)]
  fn do_load(
    &mut self,
    from: Vec3,
    to: Vec3,
    total_from: Vec3,
    total_to: Vec3,
    level: u32,
    update_region: Option<&Aabb>,
    handler: &ChunkHandler,
  ) {
    if let Some(region) = update_region {
      // Partial update: untouched chunks keep their state as-is.
      if !region.overlaps(&Aabb::new(from, to)) {
        return;
      }
      self.mesh = None;
      self.bounds = Aabb::empty();
    }

    self.from = from;
    self.to = to;
    self.level = level;
    self.visible = false;
    self.invisible = true;

    if !self.contributes_to_volume_mesh(from, to) {
      return;
    }

    self.load_chunk(from, to, total_from, total_to, level, handler);
    self.load_children(from, to, total_from, total_to, level, update_region, handler);
  }

  /// Cheap subtree cull: a cell whose center density exceeds its diagonal
  /// (in world units) cannot contain the surface anywhere inside it.
  fn contributes_to_volume_mesh(&self, from: Vec3, to: Vec3) -> bool {
    let src = &self.shared.parameters.src;
    let central = src.value((to - from) / 2.0 + from);
    central.abs() <= (to - from).length() * src.volume_space_to_world_space_factor()
  }

  fn load_chunk(
    &mut self,
    from: Vec3,
    to: Vec3,
    total_from: Vec3,
    total_to: Vec3,
    level: u32,
    handler: &ChunkHandler,
  ) {
    let parameters = &self.shared.parameters;
    if parameters.create_geometry_from_level == 0 || level <= parameters.create_geometry_from_level
    {
      self.error = level as f32 * parameters.error_multiplicator * parameters.base_error;
      self
        .shared
        .chunks_being_processed
        .fetch_add(1, Ordering::SeqCst);
      trace!(chunk = self.id, level, "dispatching chunk build");
      handler.add_request(ChunkRequest {
        chunk_id: self.id,
        level,
        total_from,
        total_to,
        root: OctreeNode::new(from, to),
        builder: MeshBuilder::new(),
        generator: DualGridGenerator::new(),
        shared: Arc::clone(&self.shared),
        epoch: self.shared.current_epoch(),
      });
    } else {
      // Coarser than the caller wants geometry for: a pass-through
      // placeholder that only exists to reach its children.
      self.invisible = false;
    }
  }

  #[allow(clippy::too_many_arguments)]
  fn load_children(
    &mut self,
    from: Vec3,
    to: Vec3,
    total_from: Vec3,
    total_to: Vec3,
    level: u32,
    update_region: Option<&Aabb>,
    handler: &ChunkHandler,
  ) {
    if level > 2 {
      if !matches!(self.children, ChunkChildren::Eight(_)) {
        let shared = &self.shared;
        self.children = ChunkChildren::Eight(Box::new(std::array::from_fn(|_| {
          Chunk::new_node(shared)
        })));
      }
      let ChunkChildren::Eight(children) = &mut self.children else {
        unreachable!();
      };
      let (center, xw, yw, zw) = children_dimensions(from, to);
      let octants = [
        (from, center),
        (from + xw, center + xw),
        (from + xw + zw, center + xw + zw),
        (from + zw, center + zw),
        (from + yw, center + yw),
        (from + yw + xw, center + yw + xw),
        (from + yw + xw + zw, center + yw + xw + zw),
        (from + yw + zw, center + yw + zw),
      ];
      for (child, (child_from, child_to)) in children.iter_mut().zip(octants) {
        child.do_load(
          child_from,
          child_to,
          total_from,
          total_to,
          level - 1,
          update_region,
          handler,
        );
      }
    } else if level > 1 {
      // The finest levels render at the same geometric size regardless of
      // depth; one child covering the parent's whole box suffices.
      if !matches!(self.children, ChunkChildren::PassThrough(_)) {
        self.children = ChunkChildren::PassThrough(Box::new(Chunk::new_node(&self.shared)));
      }
      let ChunkChildren::PassThrough(child) = &mut self.children else {
        unreachable!();
      };
      child.do_load(from, to, total_from, total_to, level - 1, update_region, handler);
    }
  }

  /// Install the finished geometry of one background build. Runs on the
  /// thread draining the handler's completion queue.
  pub(crate) fn finish_build(&mut self, request: ChunkRequest) {
    let shared = Arc::clone(&self.shared);
    let parameters = &shared.parameters;

    let mesh = request.builder.generate_buffers();
    let triangles = mesh.triangle_count();
    self.invisible = triangles == 0;
    trace!(chunk = self.id, level = request.level, triangles, "chunk build finished");

    if let Some(callback) = &parameters.lod_callback {
      request.builder.execute_callback(
        callback.as_ref(),
        MeshOwner {
          chunk_id: self.id,
          from: self.from,
          to: self.to,
        },
        request.level as usize,
        shared.builds_in_flight(),
      );
    }

    self.bounds = mesh.bounds;
    self.mesh = (!self.invisible).then_some(mesh);
    // Visibility is decided per frame, never at load time.
    self.visible = false;

    if parameters.create_dual_grid_visualization {
      self.dual_grid_visualization = Some(request.generator.dual_grid());
    }
    if parameters.create_octree_visualization {
      self.octree_visualization = Some(request.root.octree_grid());
    }

    shared.build_finished();
  }

  /// Find the chunk a completion belongs to.
  pub(crate) fn chunk_mut_by_id(&mut self, id: ChunkId) -> Option<&mut Chunk> {
    if self.id == id {
      return Some(self);
    }
    self
      .children
      .as_mut_slice()
      .iter_mut()
      .find_map(|child| child.chunk_mut_by_id(id))
  }

  pub(crate) fn shared(&self) -> &Arc<ChunkTreeShared> {
    &self.shared
  }

  // LOD selection -------------------------------------------------------------

  /// Per-frame screen-space-error LOD selection over the whole subtree.
  pub fn frame_started(&mut self, camera: &Camera) {
    if self.invisible {
      return;
    }

    // A chunk on a coarse level without geometry of its own just proceeds
    // to its children.
    if self.mesh.is_none() {
      for child in self.children.as_mut_slice() {
        child.frame_started(camera);
      }
      return;
    }

    let parameters = &self.shared.parameters;
    let k = camera.viewport_height / (2.0 * (camera.fov_y / 2.0).tan());
    let d = (self.bounds.center() * parameters.scale)
      .distance(camera.position)
      .max(1.0);
    let screen_space_error = self.error / d * k;

    if screen_space_error <= parameters.max_screen_space_error / parameters.scale {
      // Detailed enough at this distance; nothing below may also show.
      self.set_chunk_visible(true, false);
      for child in self.children.as_mut_slice() {
        child.set_chunk_visible(false, true);
      }
    } else if matches!(self.children, ChunkChildren::None) {
      // Too coarse, but the finest LOD available.
      self.set_chunk_visible(true, false);
    } else {
      self.set_chunk_visible(false, false);
      for child in self.children.as_mut_slice() {
        child.frame_started(camera);
      }
    }
  }

  fn set_chunk_visible(&mut self, visible: bool, apply_to_children: bool) {
    self.visible = visible && !self.invisible && self.shared.volume_visible.load(Ordering::SeqCst);
    if apply_to_children {
      for child in self.children.as_mut_slice() {
        child.set_chunk_visible(visible, true);
      }
    }
  }

  // Accessors -----------------------------------------------------------------

  /// Render visibility decided by the last [`Chunk::frame_started`].
  pub fn visible(&self) -> bool {
    self.visible
  }

  /// True when the last build produced no triangles for this cell.
  pub fn invisible(&self) -> bool {
    self.invisible
  }

  pub fn mesh(&self) -> Option<&MeshOutput> {
    self.mesh.as_ref()
  }

  pub fn bounds(&self) -> Aabb {
    self.bounds
  }

  pub fn from(&self) -> Vec3 {
    self.from
  }

  pub fn to(&self) -> Vec3 {
    self.to
  }

  /// Remaining LOD levels below and including this chunk; 1 is the finest.
  pub fn level(&self) -> u32 {
    self.level
  }

  /// Geometric error budget this chunk was built with.
  pub fn error(&self) -> f32 {
    self.error
  }

  pub fn children(&self) -> &ChunkChildren {
    &self.children
  }

  /// Background builds dispatched for this tree but not yet finalized.
  pub fn builds_in_flight(&self) -> usize {
    self.shared.builds_in_flight()
  }

  pub fn parameters(&self) -> &ChunkParameters {
    &self.shared.parameters
  }

  // Debug visualization and materials -----------------------------------------

  /// Octree cell edges, present when enabled in the parameters and toggled
  /// visible.
  pub fn octree_visualization(&self) -> Option<&LineList> {
    self
      .octree_visualization
      .as_ref()
      .filter(|_| self.shared.octree_visible.load(Ordering::SeqCst))
  }

  /// Dual-grid cell edges, present when enabled and toggled visible.
  pub fn dual_grid_visualization(&self) -> Option<&LineList> {
    self
      .dual_grid_visualization
      .as_ref()
      .filter(|_| self.shared.dual_grid_visible.load(Ordering::SeqCst))
  }

  pub fn set_octree_visible(&self, visible: bool) {
    self.shared.octree_visible.store(visible, Ordering::SeqCst);
  }

  pub fn octree_visible(&self) -> bool {
    self.shared.octree_visible.load(Ordering::SeqCst)
  }

  pub fn set_dual_grid_visible(&self, visible: bool) {
    self
      .shared
      .dual_grid_visible
      .store(visible, Ordering::SeqCst);
  }

  pub fn dual_grid_visible(&self) -> bool {
    self.shared.dual_grid_visible.load(Ordering::SeqCst)
  }

  /// Show or hide the whole volume, overriding per-frame LOD selection
  /// until the next [`Chunk::frame_started`].
  pub fn set_volume_visible(&mut self, visible: bool) {
    self.shared.volume_visible.store(visible, Ordering::SeqCst);
    self.apply_volume_visible(visible);
  }

  fn apply_volume_visible(&mut self, visible: bool) {
    self.visible = visible && !self.invisible;
    for child in self.children.as_mut_slice() {
      child.apply_volume_visible(visible);
    }
  }

  pub fn volume_visible(&self) -> bool {
    self.shared.volume_visible.load(Ordering::SeqCst)
  }

  /// Set the material of this chunk and all of its descendants.
  pub fn set_material(&mut self, name: &str) {
    self.material = Some(name.to_string());
    for child in self.children.as_mut_slice() {
      child.set_material(name);
    }
  }

  /// Set the material of every chunk at tree depth `level` (0 = coarsest),
  /// allowing progressively simpler materials on coarser LODs.
  pub fn set_material_of_level(&mut self, level: u32, name: &str) {
    if level == 0 {
      self.material = Some(name.to_string());
      return;
    }
    for child in self.children.as_mut_slice() {
      child.set_material_of_level(level - 1, name);
    }
  }

  pub fn material(&self) -> Option<&str> {
    self.material.as_deref()
  }

  /// Collect the non-empty chunks at tree depth `level` (0 = coarsest).
  pub fn get_chunks_of_level<'a>(&'a self, level: u32, result: &mut Vec<&'a Chunk>) {
    if level == 0 {
      if !self.invisible {
        result.push(self);
      }
      return;
    }
    for child in self.children.as_slice() {
      child.get_chunks_of_level(level - 1, result);
    }
  }
}

/// Worker-side geometry build for one chunk request: octree split with the
/// level's error budget, then dual-grid contouring into the request's own
/// mesh builder. Touches no chunk state; everything it needs travels in the
/// request and the shared parameters.
pub(crate) fn prepare_geometry(request: &mut ChunkRequest, shared: &ChunkTreeShared) {
  let parameters = &shared.parameters;
  let policy = crate::octree::OctreeNodeSplitPolicy::new(
    parameters.src.as_ref(),
    parameters.error_multiplicator * parameters.base_error,
  );
  let error = request.level as f32 * parameters.error_multiplicator * parameters.base_error;
  request.root.split(&policy, error);

  let max_ms_distance = error * parameters.skirt_factor;
  let iso = crate::isosurface::IsoSurface::new(parameters.src.as_ref());
  request.generator.generate_dual_grid(
    &request.root,
    &iso,
    &mut request.builder,
    max_ms_distance,
    request.total_from,
    request.total_to,
    parameters.create_dual_grid_visualization,
  );
}

#[cfg(test)]
#[path = "chunk_test.rs"]
mod chunk_test;
