//! Block tree: every component lives in exactly one block.

use tether_expr::ids::BlockId;

use crate::model::Model;
use crate::model::error::ModelError;
use crate::types::BlockData;

impl Model {
    /// Add a child block under `parent`.
    pub fn add_block(&mut self, parent: BlockId, name: &str) -> Result<BlockId, ModelError> {
        self.ensure_block_exists(parent)?;
        let id = BlockId::new(self.blocks.len() as u32);
        self.blocks.push(BlockData {
            name: name.to_string(),
            parent: Some(parent),
        });
        tracing::debug!(
            component = "model",
            operation = "add_block",
            status = "success",
            block = id.inner(),
            parent = parent.inner(),
            name,
            "Added block"
        );
        Ok(id)
    }

    pub fn block_name(&self, id: BlockId) -> Option<&str> {
        self.blocks
            .get(id.inner() as usize)
            .map(|block| block.name.as_str())
    }

    pub fn block_parent(&self, id: BlockId) -> Option<BlockId> {
        self.blocks
            .get(id.inner() as usize)
            .and_then(|block| block.parent)
    }

    /// Whether `block` is `root` or one of its descendants.
    pub fn is_within(&self, block: BlockId, root: BlockId) -> bool {
        let mut current = Some(block);
        while let Some(id) = current {
            if id == root {
                return true;
            }
            current = self.block_parent(id);
        }
        false
    }
}
