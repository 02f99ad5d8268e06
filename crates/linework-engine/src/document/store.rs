use super::Entity;

/// Index of a layer inside a [`Document`].
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct LayerId(usize);

impl LayerId {
    #[inline]
    pub const fn index(self) -> usize {
        self.0
    }
}

/// Index of an entity slot inside a [`Document`]'s arena.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct EntityId(usize);

/// Named, toggleable group of entities.
#[derive(Debug, Clone)]
pub struct Layer {
    name: String,
    visible: bool,
    entities: Vec<EntityId>,
}

impl Layer {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            visible: true,
            entities: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Entity ids in insertion order. May contain ids whose slot was removed.
    pub fn entity_ids(&self) -> &[EntityId] {
        &self.entities
    }
}

/// Ordered layers over an entity arena.
#[derive(Debug, Clone, Default)]
pub struct Document {
    layers: Vec<Layer>,
    entities: Vec<Option<Entity>>,
}

impl Document {
    /// Creates a document with a single visible "Default" layer.
    pub fn new() -> Self {
        let mut doc = Self::empty();
        doc.add_layer("Default");
        doc
    }

    /// Creates a document without layers.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn add_layer(&mut self, name: impl Into<String>) -> LayerId {
        self.layers.push(Layer::new(name));
        LayerId(self.layers.len() - 1)
    }

    /// Appends `entity` to the end of `layer`.
    ///
    /// Returns `None` (and stores nothing) if `layer` does not exist.
    pub fn add_entity(&mut self, layer: LayerId, entity: impl Into<Entity>) -> Option<EntityId> {
        let target = self.layers.get_mut(layer.0)?;
        let id = EntityId(self.entities.len());
        self.entities.push(Some(entity.into()));
        target.entities.push(id);
        Some(id)
    }

    /// Invalidates the arena slot for `id` and returns what it held.
    ///
    /// Layers keep the stale id; lookups through it yield `None`.
    pub fn remove_entity(&mut self, id: EntityId) -> Option<Entity> {
        self.entities.get_mut(id.0)?.take()
    }

    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(id.0)?.as_ref()
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn layer(&self, id: LayerId) -> Option<&Layer> {
        self.layers.get(id.0)
    }

    pub fn layer_ids(&self) -> impl Iterator<Item = LayerId> + '_ {
        (0..self.layers.len()).map(LayerId)
    }

    /// Sets layer visibility. Returns `true` if the flag actually changed.
    pub fn set_layer_visible(&mut self, id: LayerId, visible: bool) -> bool {
        match self.layers.get_mut(id.0) {
            Some(layer) if layer.visible != visible => {
                layer.visible = visible;
                true
            }
            _ => false,
        }
    }

    /// Flips layer visibility and returns the new state.
    pub fn toggle_layer(&mut self, id: LayerId) -> Option<bool> {
        let layer = self.layers.get_mut(id.0)?;
        layer.visible = !layer.visible;
        Some(layer.visible)
    }

    /// Live entities of `layer` in insertion order; removed slots are skipped.
    pub fn layer_entities<'a>(&'a self, layer: &'a Layer) -> impl Iterator<Item = &'a Entity> + 'a {
        layer
            .entities
            .iter()
            .filter_map(move |id| self.entities.get(id.0).and_then(Option::as_ref))
    }

    /// Live entities of every visible layer, layer order first, then insertion order.
    pub fn visible_entities(&self) -> impl Iterator<Item = &Entity> + '_ {
        self.layers
            .iter()
            .filter(|layer| layer.visible)
            .flat_map(move |layer| self.layer_entities(layer))
    }
}
