pub type NodeId = usize;
pub type DestId = NodeId;
pub type Label = NodeId;

pub type Edge = (NodeId, DestId);
pub type EdgeList = Vec<Edge>;
