use std::collections::HashMap;

use crate::color::Color;
use crate::data::CellId;

/// Sparse per-cell values. A present key is an active override; writing
/// `None` removes the key, so no entry ever means "unset".
#[derive(Clone, Debug, PartialEq)]
pub struct OverrideTable<T> {
    values: HashMap<CellId, T>,
}

impl<T> Default for OverrideTable<T> {
    fn default() -> Self {
        Self {
            values: HashMap::new(),
        }
    }
}

impl<T> OverrideTable<T> {
    /// Store `value` for `id`, or clear `id` when `value` is `None`
    pub fn set(&mut self, id: impl Into<CellId>, value: Option<T>) {
        let id = id.into();
        match value {
            Some(value) => {
                self.values.insert(id, value);
            }
            None => {
                self.values.remove(&id);
            }
        }
    }

    #[inline(always)]
    pub fn get(&self, id: &str) -> Option<&T> {
        self.values.get(id)
    }

    #[inline(always)]
    pub fn has(&self, id: &str) -> bool {
        self.values.contains_key(id)
    }

    /// Snapshot of every active override
    pub fn all(&self) -> &HashMap<CellId, T> {
        &self.values
    }

    pub fn reset_all(&mut self) {
        self.values.clear();
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// The four independent override tables consulted before computed values
#[derive(Clone, Debug, Default, PartialEq)]
pub struct OverrideLayer {
    pub color: OverrideTable<Color>,
    pub size: OverrideTable<f64>,
    pub contour_color: OverrideTable<Color>,
    pub contour_width: OverrideTable<f64>,
}

impl OverrideLayer {
    pub fn set_color(&mut self, id: impl Into<CellId>, color: Option<Color>) {
        self.color.set(id, color);
    }

    pub fn set_size(&mut self, id: impl Into<CellId>, size: Option<f64>) {
        self.size.set(id, size);
    }

    pub fn set_contour_color(&mut self, id: impl Into<CellId>, color: Option<Color>) {
        self.contour_color.set(id, color);
    }

    pub fn set_contour_width(&mut self, id: impl Into<CellId>, width: Option<f64>) {
        self.contour_width.set(id, width);
    }

    /// Clear all four tables
    pub fn reset_all(&mut self) {
        self.color.reset_all();
        self.size.reset_all();
        self.contour_color.reset_all();
        self.contour_width.reset_all();
    }
}
