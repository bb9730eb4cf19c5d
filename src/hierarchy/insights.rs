//! Insights over a built hierarchy
//!
//! Pure reductions over a [`HierarchyNode`] tree: member counts per role,
//! role distribution percentages and depth. No I/O.

use serde::Serialize;

use super::node::HierarchyNode;
use super::role::Role;
use super::HierarchyError;

/// Percentages are apportioned in tenths of a percent
const TENTHS_TOTAL: u64 = 1000;

/// Per-role member counts, indexed by rank
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RoleCounts([usize; 4]);

impl RoleCounts {
    fn with(mut self, role: Role) -> Self {
        self.0[role.rank() as usize] += 1;
        self
    }

    fn merge(mut self, other: RoleCounts) -> Self {
        for (mine, theirs) in self.0.iter_mut().zip(other.0) {
            *mine += theirs;
        }
        self
    }

    pub fn get(&self, role: Role) -> usize {
        self.0[role.rank() as usize]
    }

    pub fn total(&self) -> usize {
        self.0.iter().sum()
    }

    /// Roles with a non-zero count, root tier first
    pub fn present(&self) -> impl Iterator<Item = (Role, usize)> + '_ {
        Role::ALL
            .into_iter()
            .map(|role| (role, self.get(role)))
            .filter(|(_, count)| *count > 0)
    }
}

/// Count every node in the tree, root included, by role
pub fn count_by_role(node: &HierarchyNode) -> RoleCounts {
    node.children
        .iter()
        .fold(RoleCounts::default().with(node.role), |acc, child| {
            acc.merge(count_by_role(child))
        })
}

/// Longest root-to-leaf path in edges; 0 for a childless node
pub fn hierarchy_depth(node: &HierarchyNode) -> usize {
    node.children
        .iter()
        .map(|child| 1 + hierarchy_depth(child))
        .max()
        .unwrap_or(0)
}

/// One role's share of the tree
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoleShare {
    pub role: Role,
    pub count: usize,
    /// Percent of all members, one decimal place.
    ///
    /// Shares are apportioned in tenths by largest remainder so the
    /// distribution always totals exactly 100.0. Each value is within 0.1 of
    /// the exact share, but roles with equal counts may differ by 0.1: a
    /// leftover tenth goes to the higher tier first (1/1/1/13 members gives
    /// 6.3, 6.3, 6.2, 81.2).
    pub percentage: f64,
}

/// Structural statistics for one tree
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InsightsReport {
    /// Node count, root included
    pub total_members: usize,
    /// Roles present in the tree, root tier first
    pub distribution: Vec<RoleShare>,
    pub hierarchy_depth: usize,
    /// Tiers spanned by the tree (`hierarchy_depth + 1`)
    pub hierarchy_levels: usize,
}

impl InsightsReport {
    pub fn share(&self, role: Role) -> Option<&RoleShare> {
        self.distribution.iter().find(|s| s.role == role)
    }
}

/// Compute the insights report for a tree.
///
/// Fails with [`HierarchyError::EmptyTree`] if no members are counted, which
/// cannot happen for a tree with a root.
pub fn compute_insights(root: &HierarchyNode) -> Result<InsightsReport, HierarchyError> {
    let counts = count_by_role(root);
    let total = counts.total();
    if total == 0 {
        return Err(HierarchyError::EmptyTree);
    }

    let present: Vec<(Role, usize)> = counts.present().collect();
    let tenths = apportion_tenths(&present, total);

    let distribution = present
        .into_iter()
        .zip(tenths)
        .map(|((role, count), tenths)| RoleShare {
            role,
            count,
            percentage: tenths as f64 / 10.0,
        })
        .collect();

    let depth = hierarchy_depth(root);

    Ok(InsightsReport {
        total_members: total,
        distribution,
        hierarchy_depth: depth,
        hierarchy_levels: depth + 1,
    })
}

/// Split 100.0% into tenths by largest remainder.
///
/// Every share is its exact value rounded down or up to one decimal, and the
/// shares always add up to exactly 100.0. Leftover tenths go to the largest
/// remainders, ties to the higher tier.
fn apportion_tenths(counts: &[(Role, usize)], total: usize) -> Vec<u64> {
    let total = total as u64;
    let mut shares: Vec<u64> = counts
        .iter()
        .map(|(_, count)| *count as u64 * TENTHS_TOTAL / total)
        .collect();

    let assigned: u64 = shares.iter().sum();
    let mut order: Vec<usize> = (0..counts.len()).collect();
    order.sort_by_key(|&i| std::cmp::Reverse(counts[i].1 as u64 * TENTHS_TOTAL % total));

    for &i in order.iter().take((TENTHS_TOTAL - assigned) as usize) {
        shares[i] += 1;
    }

    shares
}
