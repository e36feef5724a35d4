//! Lane ("bin") assignment.

use std::collections::HashMap;

use crate::model::EventNode;

/// Assign every node a lane and return the lane count.
///
/// The lane count is the number of `From`/`Into` nodes, bumped to the next
/// odd number so there is a single center lane, and never less than 3. The
/// focal individual sits in the center lane. Every other individual takes
/// the next lane of the walk `+1, -2, +3, -4, …` from the center, in the
/// order its lane-claiming node appears; all of its nodes share that lane.
///
/// With an odd number of cross-links above one the walk runs one lane past
/// the computed count, so the returned count is widened to cover it.
pub(crate) fn assign_bins(nodes: &mut [EventNode], focal: &str) -> u32 {
  let crosslinks = nodes.iter().filter(|n| n.marker.is_crosslink()).count();
  let mut bins = crosslinks as u32;
  if bins % 2 == 0 {
    bins += 1;
  }
  if bins == 1 {
    bins = 3;
  }
  let center = i64::from(bins.div_ceil(2));

  let mut lanes: HashMap<String, i64> = HashMap::new();
  lanes.insert(focal.to_string(), center);

  let mut lane = center;
  let mut step = 0i64;
  for node in nodes.iter() {
    if !node.marker.claims_lane() || lanes.contains_key(&node.entity) {
      continue;
    }
    step += 1;
    lane += if step % 2 == 1 { step } else { -step };
    lanes.insert(node.entity.clone(), lane);
  }

  // Only reachable when `Component` nodes walk past the cross-link count.
  let lowest = lanes.values().copied().min().unwrap_or(center);
  let shift = (1 - lowest).max(0);
  let highest = lanes.values().copied().max().unwrap_or(center) + shift;

  for node in nodes.iter_mut() {
    let lane = lanes.get(&node.entity).copied().unwrap_or(center);
    node.bin = (lane + shift) as u32;
  }

  bins.max(highest as u32)
}
