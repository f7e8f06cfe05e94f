use crate::{Error, SkeletonData, Transform};
use glam::Mat4;
use std::collections::HashMap;
use std::sync::Arc;

/// Stamp identifying one weighted blend pass. Nodes compare it against their
/// `last_touched_by` field, so per-tick scratch state never needs an explicit clear.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TickId(u64);

impl TickId {
    /// Never handed out by a coordinator; freshly built nodes carry it.
    pub const NONE: Self = Self(0);

    pub fn get(self) -> u64 {
        self.0
    }

    pub(crate) fn next(self) -> Self {
        Self(self.0.wrapping_add(1).max(1))
    }
}

#[derive(Clone, Debug)]
pub struct Node {
    data_index: usize,
    name: String,
    parent: Option<usize>,

    pub local: Transform,
    pub world: Mat4,
    bind: Option<Mat4>,

    last_touched_by: TickId,
    accumulated_weight: f32,
}

impl Node {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data_index(&self) -> usize {
        self.data_index
    }

    pub fn parent_index(&self) -> Option<usize> {
        self.parent
    }

    pub fn bind(&self) -> Option<Mat4> {
        self.bind
    }

    /// World transform premultiplied with the inverse reference transform, or the plain world
    /// transform for nodes without one.
    pub fn skinning_transform(&self) -> Mat4 {
        match self.bind {
            Some(bind) => self.world * bind,
            None => self.world,
        }
    }

    pub fn last_touched_by(&self) -> TickId {
        self.last_touched_by
    }

    pub fn accumulated_weight(&self) -> f32 {
        self.accumulated_weight
    }

    /// Folds one track's pose into this node for the blend pass `tick` and returns the weight
    /// actually applied.
    ///
    /// The first track touching the node in a pass writes its pose outright and claims its own
    /// weight. Later tracks only fill what is left of the unit weight budget, interpolating the
    /// current local transform toward their pose by
    /// `contribution / (accumulated + contribution)`.
    pub fn blend(&mut self, pose: &Transform, weight: f32, tick: TickId) -> f32 {
        let weight = weight.clamp(0.0, 1.0);
        if self.last_touched_by != tick {
            self.local = *pose;
            self.last_touched_by = tick;
            self.accumulated_weight = weight;
            return weight;
        }

        if weight <= 0.0 || self.accumulated_weight >= 1.0 {
            return 0.0;
        }

        let contribution = weight.min(1.0 - self.accumulated_weight);
        let fraction = contribution / (self.accumulated_weight + contribution);
        self.local = self.local.lerp(pose, fraction);
        self.accumulated_weight = (self.accumulated_weight + contribution).min(1.0);
        contribution
    }
}

#[derive(Clone, Debug)]
pub struct Skeleton {
    pub data: Arc<SkeletonData>,
    /// Nodes in preorder: every parent precedes its children.
    pub nodes: Vec<Node>,
    name_index: HashMap<String, usize>,
}

impl Skeleton {
    pub fn new(data: Arc<SkeletonData>) -> Result<Self, Error> {
        let mut data_index_by_name = HashMap::with_capacity(data.nodes.len());
        for (i, node) in data.nodes.iter().enumerate() {
            if data_index_by_name.insert(node.name.as_str(), i).is_some() {
                return Err(Error::DuplicateNode {
                    name: node.name.clone(),
                });
            }
            if !node.transform.is_finite() || node.bind.is_some_and(|b| !b.is_finite()) {
                return Err(Error::InvalidValue {
                    message: format!(
                        "node '{}' has a non-finite setup or bind transform",
                        node.name
                    ),
                });
            }
        }

        let mut roots = Vec::new();
        let mut children = vec![Vec::new(); data.nodes.len()];
        for (i, node) in data.nodes.iter().enumerate() {
            match node.parent.as_deref() {
                None => roots.push(i),
                Some(parent) => {
                    let Some(&p) = data_index_by_name.get(parent) else {
                        return Err(Error::UnknownParent {
                            node: node.name.clone(),
                            parent: parent.to_string(),
                        });
                    };
                    children[p].push(i);
                }
            }
        }

        let order = preorder(&roots, &children);
        if order.len() != data.nodes.len() {
            let mut visited = vec![false; data.nodes.len()];
            for &i in &order {
                visited[i] = true;
            }
            let stuck = visited.iter().position(|v| !v).unwrap_or(0);
            return Err(Error::HierarchyCycle {
                node: data.nodes[stuck].name.clone(),
            });
        }

        let mut runtime_index = vec![0usize; data.nodes.len()];
        for (runtime, &data_index) in order.iter().enumerate() {
            runtime_index[data_index] = runtime;
        }

        let mut nodes = Vec::with_capacity(order.len());
        let mut name_index = HashMap::with_capacity(order.len());
        for &data_index in &order {
            let node_data = &data.nodes[data_index];
            let parent = node_data
                .parent
                .as_deref()
                .and_then(|p| data_index_by_name.get(p))
                .map(|&p| runtime_index[p]);
            name_index.insert(node_data.name.clone(), nodes.len());
            nodes.push(Node {
                data_index,
                name: node_data.name.clone(),
                parent,
                local: node_data.transform,
                world: Mat4::IDENTITY,
                bind: node_data.bind,
                last_touched_by: TickId::NONE,
                accumulated_weight: 0.0,
            });
        }

        let mut skeleton = Self {
            data,
            nodes,
            name_index,
        };
        skeleton.update_world_transforms();
        Ok(skeleton)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn find_node(&self, name: &str) -> Option<usize> {
        self.name_index.get(name).copied()
    }

    pub fn node(&self, index: usize) -> Option<&Node> {
        self.nodes.get(index)
    }

    pub fn node_mut(&mut self, index: usize) -> Option<&mut Node> {
        self.nodes.get_mut(index)
    }

    pub fn node_by_name(&self, name: &str) -> Option<&Node> {
        self.find_node(name).and_then(|i| self.nodes.get(i))
    }

    /// Resolves target names once. Unknown names bind to `None` and are skipped during playback.
    pub fn bind_targets(&self, track: &str, targets: &[String]) -> Vec<Option<usize>> {
        targets
            .iter()
            .map(|name| {
                let index = self.find_node(name);
                if index.is_none() {
                    log::warn!("track '{track}' targets unknown node '{name}'; it will be skipped");
                }
                index
            })
            .collect()
    }

    pub fn set_to_setup_pose(&mut self) {
        for node in &mut self.nodes {
            node.local = self.data.nodes[node.data_index].transform;
        }
    }

    /// Composes world transforms top-down. Relies on the preorder invariant.
    pub fn update_world_transforms(&mut self) {
        for i in 0..self.nodes.len() {
            let local = self.nodes[i].local.to_mat4();
            let world = match self.nodes[i].parent {
                Some(parent) => self.nodes[parent].world * local,
                None => local,
            };
            self.nodes[i].world = world;
        }
    }
}

fn preorder(roots: &[usize], children: &[Vec<usize>]) -> Vec<usize> {
    let mut order = Vec::with_capacity(children.len());
    let mut stack: Vec<usize> = roots.iter().rev().copied().collect();
    while let Some(i) = stack.pop() {
        order.push(i);
        stack.extend(children[i].iter().rev().copied());
    }
    order
}
