//! Tool selection.

use crate::element::ElementType;

/// Available tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ToolKind {
    #[default]
    Select,
    /// Place a new element of this type on the next canvas click.
    Create(ElementType),
}

impl ToolKind {
    /// The element type this tool places, if any.
    pub fn element_type(self) -> Option<ElementType> {
        match self {
            ToolKind::Select => None,
            ToolKind::Create(element_type) => Some(element_type),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_element_type() {
        assert_eq!(ToolKind::default().element_type(), None);
        assert_eq!(
            ToolKind::Create(ElementType::Circle).element_type(),
            Some(ElementType::Circle)
        );
    }
}
