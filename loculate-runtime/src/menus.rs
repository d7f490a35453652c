use loculate_engine::traits::{ContextMenuRegistry, MenuItem};
use std::sync::Mutex;

/// Menu registry kept in memory; re-creating an id replaces it in place.
#[derive(Debug, Default)]
pub struct MemoryMenuRegistry {
    items: Mutex<Vec<MenuItem>>,
}

impl MemoryMenuRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> Vec<MenuItem> {
        self.items.lock().map(|i| i.clone()).unwrap_or_default()
    }
}

impl ContextMenuRegistry for MemoryMenuRegistry {
    fn create(&self, item: MenuItem) -> anyhow::Result<()> {
        let mut items = self
            .items
            .lock()
            .map_err(|_| anyhow::anyhow!("menu registry lock poisoned"))?;
        match items.iter_mut().find(|i| i.id == item.id) {
            Some(existing) => *existing = item,
            None => {
                log::info!("registered context menu entry {:?}", item.id);
                items.push(item);
            }
        }
        Ok(())
    }
}
