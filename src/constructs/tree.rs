//! Tree construct builder
//!
//! Trees are the fallback construct: filled cells arranged by indentation,
//! either spatial (each level one column/row deeper) or textual (leading
//! spaces, two per level). Elements live in a flat arena and link to their
//! parent by index; the hierarchy comes from a level stack over the
//! traversal order. Parents own a domain region which may reparse into a
//! nested construct.
//!
//! Roles (anchor, parent, child, child header, peer, key, key-value) are
//! relations over the built hierarchy, not stored tags; the builder caches
//! them as id lists on the tree.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::constructs::detect::content_indent_level;
use crate::constructs::domain::{DomainRegion, build_nested, detect_domain_kind};
use crate::constructs::{Construct, Detection, Orientation};
use crate::error::{Result, TextruxError};
use crate::geometry::{GridPoint, GridRect};
use crate::parser::ParseContext;

/// Index of an element in its tree's arena.
pub type ElementId = usize;

/// One tree element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeElement {
    /// Cell position
    pub point: GridPoint,
    /// Trimmed content
    pub content: String,
    /// Nesting depth: the larger of content indent and spatial offset
    pub level: usize,
    /// Parent element, absent for top-level and value elements
    pub parent: Option<ElementId>,
    /// Direct children, in traversal order
    pub children: Vec<ElementId>,
    /// Elements sharing this element's parent and level
    pub peers: Vec<ElementId>,
    /// Trailing same-line elements holding this element's values
    pub value_elements: Vec<ElementId>,
    /// Domain region, present on elements with children or values
    pub domain: Option<DomainRegion>,
}

impl TreeElement {
    /// The nested construct variant this element's domain resolved to.
    pub fn domain_construct_kind(&self) -> Option<crate::constructs::ConstructKind> {
        self.domain.as_ref().and_then(|d| d.construct_kind)
    }
}

/// A built tree construct.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tree {
    /// Bounding rectangle
    pub bounds: GridRect,
    /// Detection key
    pub key: u8,
    /// Regular trees grow top-down, transposed trees left-right
    pub orientation: Orientation,
    /// Whether the top-left window indicated the child-header variant
    pub has_child_header: bool,
    /// Element arena; ids index into this vector
    pub elements: Vec<TreeElement>,
    /// The first top-level element
    pub anchor: Option<ElementId>,
    /// Elements with at least one child
    pub parent_elements: Vec<ElementId>,
    /// Elements with a parent
    pub child_elements: Vec<ElementId>,
    /// Same-line headers over a sibling group
    pub child_header_elements: Vec<ElementId>,
    /// Elements with at least one peer
    pub peer_elements: Vec<ElementId>,
    /// Elements carrying values and no children
    pub key_elements: Vec<ElementId>,
    /// Elements appearing in some element's value list
    pub key_value_elements: Vec<ElementId>,
    /// Nested constructs built inside parent domains, in element order
    pub child_constructs: Vec<Construct>,
}

impl Tree {
    /// The element with the given id.
    pub fn element(&self, id: ElementId) -> &TreeElement {
        &self.elements[id]
    }

    /// Id of the element at `point`, if any.
    pub fn element_at(&self, point: GridPoint) -> Option<ElementId> {
        self.elements.iter().position(|e| e.point == point)
    }

    /// Whether `id` is the anchor.
    pub fn is_anchor(&self, id: ElementId) -> bool {
        self.anchor == Some(id)
    }

    /// Whether `id` has at least one child.
    pub fn is_parent(&self, id: ElementId) -> bool {
        !self.elements[id].children.is_empty()
    }

    /// Whether `id` has a parent.
    pub fn is_child(&self, id: ElementId) -> bool {
        self.elements[id].parent.is_some()
    }

    /// Whether `id` heads a sibling group from its parent's line.
    pub fn is_child_header(&self, id: ElementId) -> bool {
        self.child_header_elements.contains(&id)
    }

    /// Whether some other element shares `id`'s parent and level.
    pub fn is_peer(&self, id: ElementId) -> bool {
        !self.elements[id].peers.is_empty()
    }

    /// Whether `id` carries values and no children.
    pub fn is_key(&self, id: ElementId) -> bool {
        self.key_elements.contains(&id)
    }

    /// Whether `id` is some element's value.
    pub fn is_key_value(&self, id: ElementId) -> bool {
        self.key_value_elements.contains(&id)
    }
}

/// Coordinate accessors for one orientation: `main` is the traversal/growth
/// axis (rows for regular trees), `cross` is the depth axis.
#[derive(Debug, Clone, Copy)]
struct Axes {
    orientation: Orientation,
}

impl Axes {
    fn main(&self, p: GridPoint) -> usize {
        match self.orientation {
            Orientation::Regular => p.row,
            Orientation::Transposed => p.col,
        }
    }

    fn cross(&self, p: GridPoint) -> usize {
        match self.orientation {
            Orientation::Regular => p.col,
            Orientation::Transposed => p.row,
        }
    }

    fn cross_origin(&self, bounds: GridRect) -> usize {
        match self.orientation {
            Orientation::Regular => bounds.left_col,
            Orientation::Transposed => bounds.top_row,
        }
    }

    fn main_end(&self, bounds: GridRect) -> usize {
        match self.orientation {
            Orientation::Regular => bounds.bottom_row,
            Orientation::Transposed => bounds.right_col,
        }
    }

    /// Decompose a rectangle into `(main range, cross range)`.
    fn ranges(&self, rect: GridRect) -> ((usize, usize), (usize, usize)) {
        match self.orientation {
            Orientation::Regular => (
                (rect.top_row, rect.bottom_row),
                (rect.left_col, rect.right_col),
            ),
            Orientation::Transposed => (
                (rect.left_col, rect.right_col),
                (rect.top_row, rect.bottom_row),
            ),
        }
    }

    /// Rectangle from main and cross ranges.
    fn rect(&self, main: (usize, usize), cross: (usize, usize)) -> GridRect {
        match self.orientation {
            Orientation::Regular => GridRect::new(main.0, main.1, cross.0, cross.1),
            Orientation::Transposed => GridRect::new(cross.0, cross.1, main.0, main.1),
        }
    }
}

/// Build a tree from the cluster's filled cells.
pub fn build_tree(
    bounds: GridRect,
    filled: &BTreeSet<GridPoint>,
    detection: &Detection,
    ctx: &ParseContext,
) -> Result<Tree> {
    if filled.is_empty() {
        return Err(TextruxError::EmptyCluster);
    }

    let axes = Axes {
        orientation: detection.orientation,
    };

    // Element collection, in traversal order: main axis first, then depth.
    let mut points: Vec<GridPoint> = filled.iter().copied().collect();
    points.sort_by_key(|&p| (axes.main(p), axes.cross(p)));

    let cross_origin = axes.cross_origin(bounds);
    let mut elements: Vec<TreeElement> = points
        .iter()
        .map(|&point| {
            let spatial = axes.cross(point) - cross_origin;
            let level = content_indent_level(ctx.content(point)).max(spatial);
            TreeElement {
                point,
                content: ctx.trimmed(point).to_string(),
                level,
                parent: None,
                children: Vec::new(),
                peers: Vec::new(),
                value_elements: Vec::new(),
                domain: None,
            }
        })
        .collect();

    link_hierarchy(&mut elements);
    let value_ids = extract_value_elements(&mut elements, axes);
    let anchor = find_anchor(&elements, &value_ids);

    // Role pass.
    let mut parent_elements = Vec::new();
    let mut child_elements = Vec::new();
    let mut child_header_elements = Vec::new();
    let mut key_elements = Vec::new();
    for id in 0..elements.len() {
        if !elements[id].children.is_empty() {
            parent_elements.push(id);
        }
        if elements[id].parent.is_some() {
            child_elements.push(id);
        }
        if is_child_header(&elements, axes, id) {
            child_header_elements.push(id);
        }
        if !elements[id].value_elements.is_empty() && elements[id].children.is_empty() {
            key_elements.push(id);
        }
    }
    let key_value_elements: Vec<ElementId> = value_ids.iter().copied().collect();

    link_peers(&mut elements, &value_ids, anchor);
    let peer_elements: Vec<ElementId> = (0..elements.len())
        .filter(|&id| !elements[id].peers.is_empty())
        .collect();

    // Domain pass: every element owning structure gets a region; detected
    // nested constructs are reparsed over a synthetic cluster.
    let mut child_constructs = Vec::new();
    for id in 0..elements.len() {
        if elements[id].children.is_empty() && elements[id].value_elements.is_empty() {
            continue;
        }
        let parent_point = elements[id].point;
        let Some(domain_bounds) = resolve_domain(&elements, axes, bounds, filled, id, &value_ids)
        else {
            continue;
        };
        let region = attach_nested(domain_bounds, parent_point, filled, axes, ctx);
        if let Some(construct) = &region.nested_construct {
            child_constructs.push(construct.as_ref().clone());
        }
        elements[id].domain = Some(region);
    }

    Ok(Tree {
        bounds,
        key: detection.key,
        orientation: detection.orientation,
        has_child_header: detection.has_child_header,
        elements,
        anchor,
        parent_elements,
        child_elements,
        child_header_elements,
        peer_elements,
        key_elements,
        key_value_elements,
        child_constructs,
    })
}

/// Level-stack hierarchy pass: each element pops levels >= its own and
/// attaches to whatever remains on top.
fn link_hierarchy(elements: &mut [TreeElement]) {
    let mut stack: Vec<ElementId> = Vec::new();
    for id in 0..elements.len() {
        while let Some(&top) = stack.last() {
            if elements[top].level >= elements[id].level {
                stack.pop();
            } else {
                break;
            }
        }
        if let Some(&top) = stack.last() {
            elements[id].parent = Some(top);
            elements[top].children.push(id);
        }
        stack.push(id);
    }
}

/// Transitive children of `id`, chain-ordered for single paths.
fn descendants(elements: &[TreeElement], id: ElementId) -> Vec<ElementId> {
    let mut out = Vec::new();
    let mut stack: Vec<ElementId> = elements[id].children.clone();
    stack.reverse();
    while let Some(next) = stack.pop() {
        out.push(next);
        for &child in elements[next].children.iter().rev() {
            stack.push(child);
        }
    }
    out
}

/// Detach same-line trailing chains into their owner's value list.
///
/// A child sitting on its parent's line, whose whole subtree stays on that
/// line and which has no sibling past it, is not structure: it and its
/// chain are the parent's values.
fn extract_value_elements(elements: &mut [TreeElement], axes: Axes) -> BTreeSet<ElementId> {
    let mut value_ids: BTreeSet<ElementId> = BTreeSet::new();

    for id in 0..elements.len() {
        if value_ids.contains(&id) {
            continue;
        }
        let Some(parent) = elements[id].parent else {
            continue;
        };
        let line = axes.main(elements[id].point);
        if line != axes.main(elements[parent].point) {
            continue;
        }

        let subtree = descendants(elements, id);
        if subtree.iter().any(|&d| axes.main(elements[d].point) != line) {
            continue;
        }
        let has_sibling_past = elements[parent]
            .children
            .iter()
            .any(|&s| s != id && axes.main(elements[s].point) > line);
        if has_sibling_past {
            // Header over a sibling group, not a value.
            continue;
        }

        let mut chain = vec![id];
        chain.extend(subtree);
        elements[parent].children.retain(|&c| c != id);
        for &member in &chain {
            elements[member].parent = None;
            elements[member].children.clear();
            value_ids.insert(member);
        }
        elements[parent].value_elements.extend(chain);
    }

    value_ids
}

/// The first structural element at the shallowest level.
fn find_anchor(elements: &[TreeElement], value_ids: &BTreeSet<ElementId>) -> Option<ElementId> {
    let min_level = elements
        .iter()
        .enumerate()
        .filter(|(id, _)| !value_ids.contains(id))
        .map(|(_, e)| e.level)
        .min()?;
    (0..elements.len()).find(|id| !value_ids.contains(id) && elements[*id].level == min_level)
}

/// A child header sits on its parent's line and either has children of its
/// own or heads siblings placed past it.
fn is_child_header(elements: &[TreeElement], axes: Axes, id: ElementId) -> bool {
    let Some(parent) = elements[id].parent else {
        return false;
    };
    let line = axes.main(elements[id].point);
    if line != axes.main(elements[parent].point) {
        return false;
    }
    !elements[id].children.is_empty()
        || elements[parent]
            .children
            .iter()
            .any(|&s| s != id && axes.main(elements[s].point) > line)
}

/// An element's peers are the other non-anchor structural elements sharing
/// both its parent link and its level.
fn link_peers(
    elements: &mut [TreeElement],
    value_ids: &BTreeSet<ElementId>,
    anchor: Option<ElementId>,
) {
    let n = elements.len();
    for id in 0..n {
        if value_ids.contains(&id) {
            continue;
        }
        let peers: Vec<ElementId> = (0..n)
            .filter(|&other| {
                other != id
                    && Some(other) != anchor
                    && !value_ids.contains(&other)
                    && elements[other].parent == elements[id].parent
                    && elements[other].level == elements[id].level
            })
            .collect();
        elements[id].peers = peers;
    }
}

/// Resolve a parent's domain rectangle.
///
/// The envelope of descendants and value elements is adjusted off the
/// parent's own cell, extended to the next peer-or-ancestor element along
/// the traversal order, and tightened to the last filled line in range.
fn resolve_domain(
    elements: &[TreeElement],
    axes: Axes,
    bounds: GridRect,
    filled: &BTreeSet<GridPoint>,
    id: ElementId,
    value_ids: &BTreeSet<ElementId>,
) -> Option<GridRect> {
    let element = &elements[id];
    let point = element.point;

    let mut members: Vec<GridPoint> = descendants(elements, id)
        .into_iter()
        .map(|d| elements[d].point)
        .collect();
    members.extend(element.value_elements.iter().map(|&v| elements[v].point));
    let envelope = GridRect::from_points(members)?;
    let ((_, env_main_max), (env_cross_min, env_cross_max)) = axes.ranges(envelope);

    // Exclude the parent's own cell: spatially indented subtrees lose the
    // parent's depth line, content-indented ones the parent's main line.
    let spatially_indented = env_cross_min > axes.cross(point);
    let (main_start, cross_start) = if spatially_indented {
        (axes.main(point), axes.cross(point) + 1)
    } else {
        (axes.main(point) + 1, env_cross_min)
    };

    let adjusted = axes.rect(
        (main_start, env_main_max.max(main_start)),
        (cross_start, env_cross_max.max(cross_start)),
    );

    // Far edge: the element after this one at the same or a shallower
    // level closes the range; otherwise the tree bounds do.
    let far_limit = ((id + 1)..elements.len())
        .filter(|next| !value_ids.contains(next))
        .find(|&next| elements[next].level <= element.level)
        .map(|next| axes.main(elements[next].point).saturating_sub(1))
        .unwrap_or_else(|| axes.main_end(bounds));

    // Tighten to the last filled line actually inside the range.
    let in_range: Vec<GridPoint> = filled
        .iter()
        .filter(|&&p| {
            axes.main(p) >= main_start && axes.main(p) <= far_limit && axes.cross(p) >= cross_start
        })
        .copied()
        .collect();
    if in_range.is_empty() {
        return Some(adjusted);
    }

    let tightened_main = in_range.iter().map(|&p| axes.main(p)).max()?;
    let far_cross = in_range.iter().map(|&p| axes.cross(p)).max()?;
    let range_rect = axes.rect(
        (main_start, tightened_main.max(main_start)),
        (cross_start, far_cross.max(cross_start)),
    );

    Some(adjusted.union(&range_rect))
}

/// Detect and, when indicated, build the nested construct of a domain.
fn attach_nested(
    domain_bounds: GridRect,
    parent: GridPoint,
    filled: &BTreeSet<GridPoint>,
    axes: Axes,
    ctx: &ParseContext,
) -> DomainRegion {
    let kind = detect_domain_kind(parent, &domain_bounds, filled, axes.orientation);
    let Some(kind) = kind else {
        return DomainRegion {
            bounds: domain_bounds,
            construct_kind: None,
            nested_construct: None,
            parsed_successfully: true,
        };
    };

    match build_nested(&domain_bounds, filled, kind, ctx) {
        Ok(construct) => DomainRegion {
            bounds: domain_bounds,
            construct_kind: Some(kind),
            nested_construct: Some(Box::new(construct)),
            parsed_successfully: true,
        },
        Err(err) => {
            tracing::debug!(%err, ?domain_bounds, "nested domain build failed");
            DomainRegion {
                bounds: domain_bounds,
                construct_kind: Some(kind),
                nested_construct: None,
                parsed_successfully: false,
            }
        }
    }
}
