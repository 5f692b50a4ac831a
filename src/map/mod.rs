//! Shared SLAM map state
//!
//! The map is an arena owning one mean vector and one covariance matrix for
//! every tracked entity. Each entity (robot, landmark) is a contiguous block of
//! that state, addressed by an [`ObjectId`]:
//!
//! ```text
//!            robot   lmk 0   lmk 1
//!          ┌───────┬───────┬───────┐
//!   robot  │ P_rr  │ P_r0  │ P_r1  │
//!          ├───────┼───────┼───────┤
//!   lmk 0  │ P_0r  │ P_00  │ P_01  │
//!          ├───────┼───────┼───────┤
//!   lmk 1  │ P_1r  │ P_10  │ P_11  │
//!          └───────┴───────┴───────┘
//! ```
//!
//! Cross-covariance blocks are plain sub-matrices `P[offset_i.., offset_j..]`;
//! nothing holds a pointer into the arena.

use alloc::vec::Vec;

use log::debug;
use nalgebra::{DMatrix, DVector, RealField};

use crate::types::gaussian::Gaussian;
use crate::types::handles::{MapId, ObjectId};
use crate::utils::{is_symmetric, min_eigenvalue, symmetrize};
use crate::{ensure_size, Result, SlamError};

// ============================================================================
// Map Objects
// ============================================================================

/// What a map block represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    Robot,
    Landmark,
}

/// Bookkeeping for one block of the map state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MapObject {
    pub id: ObjectId,
    pub kind: ObjectKind,
    /// First index of the block in the map state
    pub offset: usize,
    /// Dimension of the block
    pub size: usize,
}

impl MapObject {
    /// Index range covered by this block.
    #[inline]
    pub fn range(&self) -> ::core::ops::Range<usize> {
        self.offset..self.offset + self.size
    }
}

// ============================================================================
// SLAM Map
// ============================================================================

/// Arena owning the global mean and covariance of all tracked objects.
#[derive(Debug, Clone)]
pub struct SlamMap<T: RealField> {
    id: MapId,
    mean: DVector<T>,
    covariance: DMatrix<T>,
    /// Ordered by offset
    objects: Vec<MapObject>,
    robots: Vec<ObjectId>,
    next_object: usize,
}

impl<T: RealField + Copy> Default for SlamMap<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: RealField + Copy> SlamMap<T> {
    /// Creates an empty map.
    pub fn new() -> Self {
        Self {
            id: MapId::next(),
            mean: DVector::zeros(0),
            covariance: DMatrix::zeros(0, 0),
            objects: Vec::new(),
            robots: Vec::new(),
            next_object: 0,
        }
    }

    #[inline]
    pub fn id(&self) -> MapId {
        self.id
    }

    /// Total dimension of the map state.
    #[inline]
    pub fn state_size(&self) -> usize {
        self.mean.len()
    }

    /// Global mean vector.
    #[inline]
    pub fn mean(&self) -> &DVector<T> {
        &self.mean
    }

    /// Global covariance matrix.
    #[inline]
    pub fn covariance(&self) -> &DMatrix<T> {
        &self.covariance
    }

    /// All blocks, ordered by offset.
    #[inline]
    pub fn objects(&self) -> &[MapObject] {
        &self.objects
    }

    /// Robots that linked themselves to this map, in link order.
    #[inline]
    pub fn robots(&self) -> &[ObjectId] {
        &self.robots
    }

    #[inline]
    pub fn contains(&self, id: ObjectId) -> bool {
        self.objects.iter().any(|o| o.id == id)
    }

    /// Looks up the block named by `id`.
    pub fn object(&self, id: ObjectId) -> Result<&MapObject> {
        self.objects
            .iter()
            .find(|o| o.id == id)
            .ok_or(SlamError::UnknownObject(id))
    }

    /// Appends a new block initialised from `gaussian`.
    ///
    /// Cross-covariances with every existing block start at zero.
    pub fn allocate(&mut self, kind: ObjectKind, gaussian: &Gaussian<T>) -> Result<ObjectId> {
        let size = gaussian.size();
        let offset = self.state_size();
        let new_size = offset + size;

        self.mean.resize_vertically_mut(new_size, T::zero());
        self.covariance.resize_mut(new_size, new_size, T::zero());
        self.mean.rows_mut(offset, size).copy_from(gaussian.mean());
        self.covariance
            .view_mut((offset, offset), (size, size))
            .copy_from(gaussian.covariance());

        let id = ObjectId(self.next_object);
        self.next_object += 1;
        self.objects.push(MapObject {
            id,
            kind,
            offset,
            size,
        });
        debug!("map: allocated {:?} {} at [{}, {})", kind, id, offset, new_size);
        Ok(id)
    }

    /// Appends a landmark block.
    pub fn add_landmark(&mut self, gaussian: &Gaussian<T>) -> Result<ObjectId> {
        self.allocate(ObjectKind::Landmark, gaussian)
    }

    /// Removes a block and its rows/columns; later blocks shift down.
    pub fn remove(&mut self, id: ObjectId) -> Result<()> {
        let position = self
            .objects
            .iter()
            .position(|o| o.id == id)
            .ok_or(SlamError::UnknownObject(id))?;
        let removed = self.objects.remove(position);

        let mean = ::core::mem::replace(&mut self.mean, DVector::zeros(0));
        self.mean = mean.remove_rows(removed.offset, removed.size);
        let cov = ::core::mem::replace(&mut self.covariance, DMatrix::zeros(0, 0));
        self.covariance = cov
            .remove_rows(removed.offset, removed.size)
            .remove_columns(removed.offset, removed.size);

        for object in self.objects.iter_mut().skip(position) {
            object.offset -= removed.size;
        }
        self.robots.retain(|r| *r != id);
        debug!("map: removed {:?} {} ({} states)", removed.kind, id, removed.size);
        Ok(())
    }

    /// Records `robot` in the robot roster. Idempotent.
    pub(crate) fn register_robot(&mut self, robot: ObjectId) -> Result<()> {
        let object = self.object(robot)?;
        if object.kind != ObjectKind::Robot {
            return Err(SlamError::UnknownObject(robot));
        }
        if !self.robots.contains(&robot) {
            self.robots.push(robot);
        }
        Ok(())
    }

    /// Copies out the mean and own covariance block of `id`.
    pub fn gaussian(&self, id: ObjectId) -> Result<Gaussian<T>> {
        let o = *self.object(id)?;
        Gaussian::from_parts(
            self.mean.rows(o.offset, o.size).clone_owned(),
            self.covariance
                .view((o.offset, o.offset), (o.size, o.size))
                .clone_owned(),
        )
    }

    /// Overwrites the mean and own covariance block of `id`. Cross blocks are kept.
    pub fn set_gaussian(&mut self, id: ObjectId, gaussian: &Gaussian<T>) -> Result<()> {
        let o = *self.object(id)?;
        ensure_size("object gaussian", o.size, gaussian.size())?;
        self.mean.rows_mut(o.offset, o.size).copy_from(gaussian.mean());
        self.covariance
            .view_mut((o.offset, o.offset), (o.size, o.size))
            .copy_from(gaussian.covariance());
        Ok(())
    }

    /// Copies out the cross-covariance block `P_ab`.
    pub fn cross_covariance(&self, a: ObjectId, b: ObjectId) -> Result<DMatrix<T>> {
        let oa = *self.object(a)?;
        let ob = *self.object(b)?;
        Ok(self
            .covariance
            .view((oa.offset, ob.offset), (oa.size, ob.size))
            .clone_owned())
    }

    /// Writes `P_ab = block` and `P_ba = blockᵗ`.
    ///
    /// `a == b` is rejected with `SelfCrossCovariance`; an object's own block is
    /// written through [`SlamMap::set_gaussian`].
    pub fn set_cross_covariance(&mut self, a: ObjectId, b: ObjectId, block: &DMatrix<T>) -> Result<()> {
        let oa = *self.object(a)?;
        let ob = *self.object(b)?;
        if a == b {
            return Err(SlamError::SelfCrossCovariance(a));
        }
        ensure_size("cross-covariance rows", oa.size, block.nrows())?;
        ensure_size("cross-covariance columns", ob.size, block.ncols())?;
        self.covariance
            .view_mut((oa.offset, ob.offset), (oa.size, ob.size))
            .copy_from(block);
        self.covariance
            .view_mut((ob.offset, oa.offset), (ob.size, oa.size))
            .copy_from(&block.transpose());
        Ok(())
    }

    /// EKF time update of block `id`:
    ///
    /// - `x_r  ← xnew`
    /// - `P_rr ← F·P_rr·Fᵗ + Q`
    /// - `P_ro ← F·P_ro` and `P_or ← P_roᵗ` for every other block `o`
    ///
    /// Blocks not involving `id` are left unchanged. All shapes are validated
    /// before the first write, so a failure leaves the map untouched.
    pub fn predict_block(
        &mut self,
        id: ObjectId,
        xnew: &DVector<T>,
        f: &DMatrix<T>,
        q: &DMatrix<T>,
        enforce_symmetry: bool,
    ) -> Result<()> {
        let r = *self.object(id)?;
        let n = r.size;
        ensure_size("predicted mean", n, xnew.len())?;
        ensure_size("state jacobian rows", n, f.nrows())?;
        ensure_size("state jacobian columns", n, f.ncols())?;
        ensure_size("process noise rows", n, q.nrows())?;
        ensure_size("process noise columns", n, q.ncols())?;

        let p_rr = self.covariance.view((r.offset, r.offset), (n, n));
        let mut p_rr_new = f * p_rr * f.transpose() + q;
        if enforce_symmetry {
            symmetrize(&mut p_rr_new);
        }

        for o in self.objects.iter().filter(|o| o.id != id) {
            let p_ro = self.covariance.view((r.offset, o.offset), (n, o.size));
            let p_ro_new = f * p_ro;
            self.covariance
                .view_mut((o.offset, r.offset), (o.size, n))
                .copy_from(&p_ro_new.transpose());
            self.covariance
                .view_mut((r.offset, o.offset), (n, o.size))
                .copy_from(&p_ro_new);
        }

        self.covariance
            .view_mut((r.offset, r.offset), (n, n))
            .copy_from(&p_rr_new);
        self.mean.rows_mut(r.offset, n).copy_from(xnew);
        Ok(())
    }

    /// Verifies the global covariance is symmetric within `tolerance` and has
    /// no eigenvalue below `-tolerance`.
    pub fn check_consistency(&self, tolerance: T) -> Result<()> {
        if !is_symmetric(&self.covariance, tolerance) {
            return Err(SlamError::NumericalInstability {
                context: "map covariance is not symmetric",
            });
        }
        match min_eigenvalue(&self.covariance) {
            Some(lambda) if lambda < -tolerance => Err(SlamError::NumericalInstability {
                context: "map covariance is not positive semi-definite",
            }),
            _ => Ok(()),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
