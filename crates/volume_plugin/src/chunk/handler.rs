//! Background build dispatch and completion routing.
//!
//! A [`ChunkHandler`] serves one chunk tree: requests go onto rayon's
//! thread pool, finished payloads come back over a crossbeam channel and are
//! drained cooperatively on whichever thread calls
//! [`ChunkHandler::process_work_queue`]. The request owns its octree root,
//! mesh builder and dual-grid generator for the whole round trip; nothing
//! is shared between concurrent builds except the read-only tree state.
//!
//! Every request carries its tree's shared state and the load epoch it was
//! dispatched under. Completions from an earlier epoch (the tree was
//! reloaded meanwhile) are discarded, and a completion drained into the
//! wrong tree still balances the in-flight counter of its own tree, so no
//! wait loop can starve on a misdelivered payload.

use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use glam::Vec3;
use tracing::{trace, warn};

use crate::dualgrid::DualGridGenerator;
use crate::mesh::MeshBuilder;
use crate::octree::OctreeNode;

use super::{prepare_geometry, Chunk, ChunkId, ChunkTreeShared};

/// One chunk build: travels to a worker thread for geometry generation and
/// back to the draining thread for finalization, exclusively owning its
/// scratch data the whole way.
pub struct ChunkRequest {
  /// Chunk this build belongs to.
  pub chunk_id: ChunkId,
  /// LOD level being built; scales the error budget.
  pub level: u32,
  /// Bounds of the whole volume, for seam suppression at its outer faces.
  pub total_from: Vec3,
  /// See `total_from`.
  pub total_to: Vec3,
  /// Octree to split, rooted at the chunk's box.
  pub root: OctreeNode,
  /// Receives the triangulation.
  pub builder: MeshBuilder,
  /// Dual-grid walker, retains debug cells when enabled.
  pub generator: DualGridGenerator,
  /// Tree this build belongs to; routes the completion and balances the
  /// right in-flight counter.
  pub(crate) shared: Arc<ChunkTreeShared>,
  /// Load epoch the build was dispatched under.
  pub(crate) epoch: u64,
}

/// Dispatches chunk builds to rayon and hands completions back to the tree.
pub struct ChunkHandler {
  sender: Sender<ChunkRequest>,
  receiver: Receiver<ChunkRequest>,
}

impl Default for ChunkHandler {
  fn default() -> Self {
    Self::new()
  }
}

impl ChunkHandler {
  pub fn new() -> Self {
    let (sender, receiver) = crossbeam_channel::unbounded();
    Self { sender, receiver }
  }

  /// Run `request` on a worker thread. The finished payload is queued until
  /// the next [`ChunkHandler::process_work_queue`] call.
  pub(crate) fn add_request(&self, mut request: ChunkRequest) {
    let sender = self.sender.clone();
    rayon::spawn(move || {
      let shared = Arc::clone(&request.shared);
      prepare_geometry(&mut request, &shared);
      // The handler may be gone by the time a build finishes; the payload
      // is simply dropped then.
      let _ = sender.send(request);
    });
  }

  /// Drain all currently queued completions into `root`'s tree without
  /// blocking. Returns the number of builds finalized.
  pub fn process_work_queue(&self, root: &mut Chunk) -> usize {
    let mut finalized = 0;
    while let Ok(request) = self.receiver.try_recv() {
      Self::route(root, request);
      finalized += 1;
    }
    finalized
  }

  /// Block until every build dispatched for `root`'s tree has been
  /// finalized. Used by the synchronous load path.
  pub(crate) fn drain_until_idle(&self, root: &mut Chunk) {
    while root.shared().builds_in_flight() > 0 {
      match self.receiver.recv_timeout(Duration::from_millis(20)) {
        Ok(request) => Self::route(root, request),
        Err(RecvTimeoutError::Timeout) => {}
        Err(RecvTimeoutError::Disconnected) => return,
      }
    }
  }

  fn route(root: &mut Chunk, request: ChunkRequest) {
    if request.epoch != request.shared.current_epoch() {
      // Dispatched before the tree was reloaded; the counter was reset
      // along with the epoch, so there is nothing to decrement.
      trace!(chunk = request.chunk_id, "discarding completion from an earlier load");
      return;
    }
    if !Arc::ptr_eq(&request.shared, root.shared()) {
      // Drained into a tree the build does not belong to. The payload is
      // lost, but its own tree's wait loop must still terminate.
      warn!(chunk = request.chunk_id, "dropping completion belonging to another chunk tree");
      request.shared.build_finished();
      return;
    }
    match root.chunk_mut_by_id(request.chunk_id) {
      Some(chunk) => chunk.finish_build(request),
      None => {
        warn!(chunk = request.chunk_id, "dropping completion for unknown chunk");
        request.shared.build_finished();
      }
    }
  }
}
