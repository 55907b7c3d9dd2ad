//! GPU dispatch helpers and command batching.

mod dispatch;

pub(crate) use dispatch::{workgroup_grid, CommandBatch};

/// Workgroup size for the per-cell stages (downsample, max, render)
pub(crate) const WORKGROUP_SIZE: u32 = 256;

/// Workgroup size for the point generator (one invocation per chain)
pub(crate) const POINTS_WORKGROUP_SIZE: u32 = 64;

/// Maximum workgroups per dimension (GPU limit)
pub(crate) const MAX_WORKGROUPS_PER_DIM: u32 = 65535;
