//! Inline `style` attribute access, enough to hide and reveal nodes during a
//! splice.

use crate::{Document, DomError, NodeKey};

fn declarations(style: &str) -> impl Iterator<Item = (&str, &str)> {
    style.split(';').filter_map(|decl| {
        let (prop, value) = decl.split_once(':')?;
        let prop = prop.trim();
        (!prop.is_empty()).then(|| (prop, value.trim()))
    })
}

impl Document {
    pub fn style_property(&self, key: NodeKey, property: &str) -> Option<&str> {
        let style = self.attr(key, "style")?;
        declarations(style)
            .find(|(p, _)| p.eq_ignore_ascii_case(property))
            .map(|(_, v)| v)
    }

    pub fn set_style_property(
        &mut self,
        key: NodeKey,
        property: &str,
        value: &str,
    ) -> Result<(), DomError> {
        let mut decls = self.other_declarations(key, property);
        decls.push(format!("{property}: {value}"));
        self.set_attr(key, "style", &(decls.join("; ") + ";"))
    }

    /// Drops `property`; the `style` attribute goes away once it is empty.
    pub fn remove_style_property(&mut self, key: NodeKey, property: &str) -> Result<(), DomError> {
        if !self.has_attr(key, "style") {
            return Ok(());
        }
        let decls = self.other_declarations(key, property);
        if decls.is_empty() {
            self.remove_attr(key, "style")
        } else {
            self.set_attr(key, "style", &(decls.join("; ") + ";"))
        }
    }

    fn other_declarations(&self, key: NodeKey, property: &str) -> Vec<String> {
        self.attr(key, "style")
            .map(|style| {
                declarations(style)
                    .filter(|(p, _)| !p.eq_ignore_ascii_case(property))
                    .map(|(p, v)| format!("{p}: {v}"))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn hide(&mut self, key: NodeKey) -> Result<(), DomError> {
        self.set_style_property(key, "display", "none")
    }

    pub fn reveal(&mut self, key: NodeKey) -> Result<(), DomError> {
        self.remove_style_property(key, "display")
    }

    pub fn is_hidden(&self, key: NodeKey) -> bool {
        self.style_property(key, "display") == Some("none")
    }
}
