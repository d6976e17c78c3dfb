use crate::codec::{ArrayHeader, CodecError, Result, encode_digit};

/// Index of a node inside its [`SchemaTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
	/// Position in the tree's node table.
	pub fn index(self) -> usize {
		self.0 as usize
	}
}

/// Shape of one schema node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaKind {
	/// Unit value, stored as one zero byte.
	Nil,
	/// One byte, 0 or 1.
	Bool,
	/// Two's-complement integer of the given byte width.
	SInt(u8),
	/// Unsigned integer of the given byte width.
	UInt(u8),
	/// IEEE-754 float of 4 or 8 bytes.
	Float(u8),
	/// Byte string behind an [`ArrayHeader`].
	String,
	/// Homogeneous sequence behind an [`ArrayHeader`].
	Array,
	/// Fixed-arity heterogeneous sequence stored inline.
	Tuple,
	/// Fixed set of named fields stored inline.
	Map,
}

impl SchemaKind {
	/// Stable lowercase label for diagnostics.
	pub fn name(self) -> &'static str {
		match self {
			SchemaKind::Nil => "nil",
			SchemaKind::Bool => "bool",
			SchemaKind::SInt(_) => "sint",
			SchemaKind::UInt(_) => "uint",
			SchemaKind::Float(_) => "float",
			SchemaKind::String => "string",
			SchemaKind::Array => "array",
			SchemaKind::Tuple => "tuple",
			SchemaKind::Map => "map",
		}
	}

	/// Build a scalar kind from its grammar character and width operand.
	pub(crate) fn scalar(code: char, width: usize, at: usize) -> Result<Self> {
		let (kind, allowed): (&'static str, &[usize]) = match code {
			'i' => ("sint", &[1, 2, 4, 8]),
			'u' => ("uint", &[1, 2, 4, 8]),
			'f' => ("float", &[4, 8]),
			_ => return Err(CodecError::UnknownType { found: code, at }),
		};
		if !allowed.contains(&width) {
			return Err(CodecError::InvalidWidth { kind, width, at });
		}

		let width = width as u8;
		Ok(match code {
			'i' => SchemaKind::SInt(width),
			'u' => SchemaKind::UInt(width),
			_ => SchemaKind::Float(width),
		})
	}
}

/// One immutable node of a parsed schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaNode {
	kind: SchemaKind,
	width: usize,
	children: Vec<NodeId>,
	offsets: Vec<usize>,
	keys: Vec<Box<str>>,
}

impl SchemaNode {
	/// Node shape.
	pub fn kind(&self) -> SchemaKind {
		self.kind
	}

	/// Bytes this node occupies inline in its parent.
	pub fn width(&self) -> usize {
		self.width
	}

	/// Arity: child count for tuples and maps, 1 for arrays, 0 otherwise.
	pub fn size(&self) -> usize {
		self.children.len()
	}

	/// Child node ids in declaration order.
	pub fn children(&self) -> &[NodeId] {
		&self.children
	}

	/// Byte offset of each child relative to this node's start.
	///
	/// Array elements live in a payload, so an array's single offset is 0.
	pub fn offsets(&self) -> &[usize] {
		&self.offsets
	}

	/// Map keys in declaration order; empty for other kinds.
	pub fn keys(&self) -> &[Box<str>] {
		&self.keys
	}

	/// Element node of an array.
	pub fn element(&self) -> Option<NodeId> {
		match self.kind {
			SchemaKind::Array => self.children.first().copied(),
			_ => None,
		}
	}

	/// Position of `key` among this map's keys.
	pub fn key_index(&self, key: &str) -> Option<usize> {
		self.keys.iter().position(|candidate| &**candidate == key)
	}
}

/// Parsed schema: a node table plus the root id.
///
/// Built once and never mutated, so it can be shared across threads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaTree {
	nodes: Vec<SchemaNode>,
	root: NodeId,
}

impl SchemaTree {
	/// Root node id.
	pub fn root(&self) -> NodeId {
		self.root
	}

	/// Root node.
	pub fn root_node(&self) -> &SchemaNode {
		self.node(self.root)
	}

	/// Look up a node.
	///
	/// # Panics
	///
	/// Panics if `id` was not produced for this tree.
	pub fn node(&self, id: NodeId) -> &SchemaNode {
		&self.nodes[id.index()]
	}

	/// Look up a node without panicking.
	pub fn get(&self, id: NodeId) -> Option<&SchemaNode> {
		self.nodes.get(id.index())
	}

	/// Number of nodes in the table.
	pub fn len(&self) -> usize {
		self.nodes.len()
	}

	/// Return `true` when the table holds no nodes.
	pub fn is_empty(&self) -> bool {
		self.nodes.is_empty()
	}

	/// Render the compact grammar form of this tree.
	pub fn encode(&self) -> Result<String> {
		let mut out = String::new();
		self.encode_node(self.root, &mut out)?;
		Ok(out)
	}

	fn encode_node(&self, id: NodeId, out: &mut String) -> Result<()> {
		let node = self.node(id);
		match node.kind {
			SchemaKind::Nil => out.push('z'),
			SchemaKind::Bool => out.push('b'),
			SchemaKind::SInt(width) => push_code(out, 'i', usize::from(width))?,
			SchemaKind::UInt(width) => push_code(out, 'u', usize::from(width))?,
			SchemaKind::Float(width) => push_code(out, 'f', usize::from(width))?,
			SchemaKind::String => out.push('s'),
			SchemaKind::Array => {
				out.push('a');
				for child in &node.children {
					self.encode_node(*child, out)?;
				}
			}
			SchemaKind::Tuple => {
				push_code(out, 't', node.size())?;
				for child in &node.children {
					self.encode_node(*child, out)?;
				}
			}
			SchemaKind::Map => {
				push_code(out, 'm', node.size())?;
				for (key, child) in node.keys.iter().zip(&node.children) {
					out.push(encode_digit(key.len())?);
					out.push_str(key);
					self.encode_node(*child, out)?;
				}
			}
		}
		Ok(())
	}
}

fn push_code(out: &mut String, code: char, operand: usize) -> Result<()> {
	out.push(code);
	out.push(encode_digit(operand)?);
	Ok(())
}

/// Incremental schema constructor.
///
/// Children must be built before their parent; widths and offsets are
/// computed as each composite node is added. Node ids are only meaningful
/// to the builder that returned them.
#[derive(Debug, Default)]
pub struct SchemaBuilder {
	nodes: Vec<SchemaNode>,
}

impl SchemaBuilder {
	/// Create an empty builder.
	pub fn new() -> Self {
		Self::default()
	}

	/// Add a nil node.
	pub fn nil(&mut self) -> NodeId {
		self.leaf(SchemaKind::Nil)
	}

	/// Add a bool node.
	pub fn bool(&mut self) -> NodeId {
		self.leaf(SchemaKind::Bool)
	}

	/// Add a signed integer node of 1, 2, 4 or 8 bytes.
	pub fn sint(&mut self, width: usize) -> Result<NodeId> {
		Ok(self.leaf(SchemaKind::scalar('i', width, 0)?))
	}

	/// Add an unsigned integer node of 1, 2, 4 or 8 bytes.
	pub fn uint(&mut self, width: usize) -> Result<NodeId> {
		Ok(self.leaf(SchemaKind::scalar('u', width, 0)?))
	}

	/// Add a float node of 4 or 8 bytes.
	pub fn float(&mut self, width: usize) -> Result<NodeId> {
		Ok(self.leaf(SchemaKind::scalar('f', width, 0)?))
	}

	/// Add a string node.
	pub fn string(&mut self) -> NodeId {
		self.leaf(SchemaKind::String)
	}

	/// Add an array node over `element`.
	///
	/// # Panics
	///
	/// Panics if `element` was not returned by this builder.
	pub fn array(&mut self, element: NodeId) -> NodeId {
		self.expect_built(element);
		self.push(SchemaNode {
			kind: SchemaKind::Array,
			width: ArrayHeader::WIDTH,
			children: vec![element],
			offsets: vec![0],
			keys: Vec::new(),
		})
	}

	/// Add a tuple node over `children` in order.
	///
	/// # Panics
	///
	/// Panics if a child was not returned by this builder.
	pub fn tuple(&mut self, children: Vec<NodeId>) -> NodeId {
		self.composite(SchemaKind::Tuple, children, Vec::new())
	}

	/// Add a map node over `(key, value)` fields in order.
	///
	/// Keys must be distinct; a repeated key is reported with its field
	/// position.
	///
	/// # Panics
	///
	/// Panics if a child was not returned by this builder.
	pub fn map<K: Into<Box<str>>>(&mut self, fields: impl IntoIterator<Item = (K, NodeId)>) -> Result<NodeId> {
		let (keys, children): (Vec<Box<str>>, Vec<NodeId>) =
			fields.into_iter().map(|(key, child)| (key.into(), child)).unzip();
		if let Some(at) = (1..keys.len()).find(|&index| keys[..index].contains(&keys[index])) {
			return Err(CodecError::DuplicateKey {
				key: keys[at].to_string(),
				at,
			});
		}
		Ok(self.composite(SchemaKind::Map, children, keys))
	}

	/// Width of an already-built node.
	///
	/// # Panics
	///
	/// Panics if `id` was not returned by this builder.
	pub fn width(&self, id: NodeId) -> usize {
		self.nodes[id.index()].width
	}

	/// Freeze the builder into a tree rooted at `root`.
	///
	/// # Panics
	///
	/// Panics if `root` was not returned by this builder.
	pub fn finish(self, root: NodeId) -> SchemaTree {
		self.expect_built(root);
		SchemaTree { nodes: self.nodes, root }
	}

	pub(crate) fn leaf(&mut self, kind: SchemaKind) -> NodeId {
		let width = match kind {
			SchemaKind::Nil | SchemaKind::Bool => 1,
			SchemaKind::SInt(width) | SchemaKind::UInt(width) | SchemaKind::Float(width) => usize::from(width),
			_ => ArrayHeader::WIDTH,
		};
		self.push(SchemaNode {
			kind,
			width,
			children: Vec::new(),
			offsets: Vec::new(),
			keys: Vec::new(),
		})
	}

	fn composite(&mut self, kind: SchemaKind, children: Vec<NodeId>, keys: Vec<Box<str>>) -> NodeId {
		let mut offsets = Vec::with_capacity(children.len());
		let mut width = 0_usize;
		for child in &children {
			offsets.push(width);
			width += self.width(*child);
		}
		self.push(SchemaNode {
			kind,
			width,
			children,
			offsets,
			keys,
		})
	}

	fn expect_built(&self, id: NodeId) {
		assert!(id.index() < self.nodes.len(), "node {} was not built by this builder", id.index());
	}

	fn push(&mut self, node: SchemaNode) -> NodeId {
		let id = NodeId(self.nodes.len() as u32);
		self.nodes.push(node);
		id
	}
}

#[cfg(test)]
mod tests;
