//! Degree-of-freedom labels and the global equation numbering.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A translational degree of freedom at a node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Dof {
    /// Translation along the global X axis.
    X,
    /// Translation along the global Y axis.
    Y,
    /// Translation along the global Z axis.
    Z,
}

impl Dof {
    /// All labels in canonical order.
    pub const ALL: [Dof; 3] = [Dof::X, Dof::Y, Dof::Z];

    /// Zero-based position of the label in canonical order.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Dof::X => 0,
            Dof::Y => 1,
            Dof::Z => 2,
        }
    }

    /// One-based axis label, `1` for X through `3` for Z.
    #[must_use]
    pub const fn label(self) -> usize {
        self.index() + 1
    }

    /// Inverse of [`Dof::label`].
    #[must_use]
    pub const fn from_label(label: usize) -> Option<Dof> {
        match label {
            1 => Some(Dof::X),
            2 => Some(Dof::Y),
            3 => Some(Dof::Z),
            _ => None,
        }
    }
}

impl fmt::Display for Dof {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Dof::X => "ux",
            Dof::Y => "uy",
            Dof::Z => "uz",
        };
        f.write_str(name)
    }
}

/// A set of degree-of-freedom labels, iterated in canonical order.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DofSet {
    /// Membership flag per label.
    active: [bool; 3],
}

impl DofSet {
    /// The empty set.
    pub const EMPTY: DofSet = DofSet {
        active: [false; 3],
    };

    /// Set containing the supplied labels.
    #[must_use]
    pub fn of(dofs: &[Dof]) -> Self {
        let mut set = Self::EMPTY;
        for &dof in dofs {
            set.insert(dof);
        }
        set
    }

    /// Add a label to the set.
    pub fn insert(&mut self, dof: Dof) {
        self.active[dof.index()] = true;
    }

    /// Whether `dof` belongs to the set.
    #[must_use]
    pub fn contains(&self, dof: Dof) -> bool {
        self.active[dof.index()]
    }

    /// Number of labels in the set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.active.iter().filter(|&&active| active).count()
    }

    /// Whether the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Union of two sets.
    #[must_use]
    pub fn union(self, other: DofSet) -> DofSet {
        let mut active = self.active;
        for (flag, other) in active.iter_mut().zip(other.active) {
            *flag |= other;
        }
        DofSet { active }
    }

    /// Iterate over the labels in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = Dof> + '_ {
        Dof::ALL.into_iter().filter(|dof| self.contains(*dof))
    }
}

impl FromIterator<Dof> for DofSet {
    fn from_iter<I: IntoIterator<Item = Dof>>(iter: I) -> Self {
        let mut set = DofSet::EMPTY;
        for dof in iter {
            set.insert(dof);
        }
        set
    }
}

/// Global equation numbers of a single node, keyed by label.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct DofIndices {
    /// Equation number per label, `None` for inactive labels.
    slots: [Option<usize>; 3],
}

impl DofIndices {
    /// Global equation number for `dof`, if the node carries it.
    #[must_use]
    pub fn get(&self, dof: Dof) -> Option<usize> {
        self.slots[dof.index()]
    }

    /// Iterate over `(label, equation number)` pairs in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = (Dof, usize)> + '_ {
        Dof::ALL
            .into_iter()
            .filter_map(|dof| self.get(dof).map(|index| (dof, index)))
    }

    /// Number of assigned labels.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.iter().flatten().count()
    }

    /// Whether no label has been assigned.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Number every active degree of freedom of `nodes`, in the given node order.
///
/// Equation numbers run contiguously from zero: node by node, and within a node
/// in the canonical X, Y, Z order restricted to its active set. The returned
/// vector holds a freshly built [`DofIndices`] per node, so stale numbers from an
/// earlier pass can never survive. The second element is the system size.
///
/// # Examples
/// ```
/// use trussfea::{assign_dof_indices, Dof, DofSet};
///
/// let planar = DofSet::of(&[Dof::X, Dof::Y]);
/// let (indices, size) = assign_dof_indices(&[planar, DofSet::EMPTY, planar]);
/// assert_eq!(size, 4);
/// assert_eq!(indices[2].get(Dof::X), Some(2));
/// assert!(indices[1].is_empty());
/// ```
#[must_use]
pub fn assign_dof_indices(nodes: &[DofSet]) -> (Vec<DofIndices>, usize) {
    let mut next = 0;
    let indices = nodes
        .iter()
        .map(|dofs| {
            let mut numbering = DofIndices::default();
            for dof in dofs.iter() {
                numbering.slots[dof.index()] = Some(next);
                next += 1;
            }
            numbering
        })
        .collect();
    (indices, next)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_roundtrip() {
        for dof in Dof::ALL {
            assert_eq!(Dof::from_label(dof.label()), Some(dof));
        }
        assert_eq!(Dof::from_label(0), None);
        assert_eq!(Dof::from_label(4), None);
    }

    #[test]
    fn set_iterates_in_canonical_order() {
        let set: DofSet = [Dof::Z, Dof::X].into_iter().collect();
        assert_eq!(set.iter().collect::<Vec<_>>(), vec![Dof::X, Dof::Z]);
        assert_eq!(set.len(), 2);
        let union = set.union(DofSet::of(&[Dof::Y]));
        assert_eq!(union.iter().collect::<Vec<_>>(), Dof::ALL.to_vec());
    }

    #[test]
    fn numbering_is_contiguous_and_skips_inactive_labels() {
        let nodes = [
            DofSet::of(&[Dof::X, Dof::Y]),
            DofSet::of(&[Dof::Y]),
            DofSet::EMPTY,
            DofSet::of(&[Dof::X, Dof::Z]),
        ];
        let (indices, size) = assign_dof_indices(&nodes);
        assert_eq!(size, 5);
        assert_eq!(indices[0].iter().collect::<Vec<_>>(), vec![(Dof::X, 0), (Dof::Y, 1)]);
        assert_eq!(indices[1].iter().collect::<Vec<_>>(), vec![(Dof::Y, 2)]);
        assert!(indices[2].is_empty());
        assert_eq!(indices[3].get(Dof::X), Some(3));
        assert_eq!(indices[3].get(Dof::Y), None);
        assert_eq!(indices[3].get(Dof::Z), Some(4));
    }

    #[test]
    fn numbering_is_idempotent() {
        let nodes = [DofSet::of(&[Dof::X, Dof::Y]); 3];
        assert_eq!(assign_dof_indices(&nodes), assign_dof_indices(&nodes));
    }

    #[test]
    fn empty_model_has_no_equations() {
        let (indices, size) = assign_dof_indices(&[]);
        assert!(indices.is_empty());
        assert_eq!(size, 0);
    }
}
